use gridsim::{Circuit, GridSimulator, ProbabilityMap, SimError, SimulatorApi};
use serde::Serialize;
use wasm_bindgen::prelude::*;

// This allows Rust to log to the browser's developer console.
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console, js_name = error)]
    fn error(s: &str);
}

/// Represents the final results of the simulation to be sent back to JavaScript.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct SimulationResult {
    /// Bitstring -> probability, in basis-index order.
    probabilities: ProbabilityMap,
    /// The final state vector as a list of complex numbers (real, imaginary).
    state_vector: Vec<(f64, f64)>,
}

fn run_simulation_engine(circuit_json: &str) -> Result<SimulationResult, SimError> {
    let circuit = Circuit::from_json(circuit_json)?;
    let mut sim = GridSimulator::new(circuit.num_qubits());
    sim.run(&circuit)?;

    Ok(SimulationResult {
        probabilities: sim.probabilities(),
        state_vector: sim
            .statevector()
            .amplitudes
            .iter()
            .map(|c| (c.re, c.im))
            .collect(),
    })
}

fn respond(circuit_json: &str) -> Result<String, String> {
    let result = run_simulation_engine(circuit_json).map_err(|e| e.to_string())?;
    serde_json::to_string(&result).map_err(|e| format!("Failed to serialize result: {}", e))
}

/// The public function that will be callable from JavaScript.
/// It takes the circuit grid as JSON and returns a JSON string with the
/// simulation results, or `{ "error": ... }`.
#[wasm_bindgen]
pub fn simulate_circuit(circuit_json: &str) -> String {
    respond(circuit_json).unwrap_or_else(|e| {
        error(&format!("Simulation failed: {}", e));
        serde_json::json!({ "error": e }).to_string()
    })
}
