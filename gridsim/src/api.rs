// src/api.rs
use crate::StateVector;
use crate::circuit::Circuit;
use crate::events::Event;
use crate::probability::ProbabilityMap;
use crate::simulator::GridSimulator;
use rand::Rng;
use std::collections::BTreeMap;

/// A lightweight error enum so callers don't rely on engine internals.
#[derive(thiserror::Error, Debug)]
pub enum SimError {
    #[error("circuit JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("row {row} has {found} columns, expected {expected}")]
    RaggedGrid {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("column {column}: qubit {qubit} is outside a {num_qubits}-qubit register")]
    QubitOutOfRange {
        column: usize,
        qubit: usize,
        num_qubits: usize,
    },
    #[error("column {column}: qubit {qubit} appears twice in one gate")]
    DuplicateQubit { column: usize, qubit: usize },
    #[error("column {column}: row {row} does not carry the gate that references it")]
    InconsistentDescriptor { column: usize, row: usize },
    #[error("column {column}: qubit {qubit} is used by more than one gate")]
    OverlappingGates { column: usize, qubit: usize },
    #[error("sampling error: {0}")]
    Sampling(String),
}

/// Everything users typically want to do.
pub trait SimulatorApi {
    fn reset(&mut self, num_qubits: usize);
    /// Validates the circuit, then evolves |0...0⟩ through every column.
    fn run(&mut self, circuit: &Circuit) -> Result<(), SimError>;
    fn statevector(&self) -> &StateVector;
    fn probabilities(&self) -> ProbabilityMap;

    /// Sample computational-basis shots without disturbing the state.
    fn sample<R: Rng + ?Sized>(
        &self,
        shots: u32,
        rng: &mut R,
    ) -> Result<BTreeMap<String, u32>, SimError>;
}

/// Runs a circuit from |0...0⟩ and returns its measurement distribution.
pub fn simulate(circuit: &Circuit) -> Result<ProbabilityMap, SimError> {
    let mut sim = GridSimulator::new(circuit.num_qubits());
    sim.run(circuit)?;
    Ok(sim.probabilities())
}

pub fn simulate_with_trace(circuit: &Circuit) -> Result<(ProbabilityMap, Vec<Event>), SimError> {
    let mut sim = GridSimulator::new(circuit.num_qubits());
    let events = sim.run_with_trace(circuit)?;
    Ok((sim.probabilities(), events))
}

/// JSON grid in, JSON probability map out.
pub fn simulate_json(circuit_json: &str) -> Result<String, SimError> {
    let circuit = Circuit::from_json(circuit_json)?;
    let probabilities = simulate(&circuit)?;
    Ok(serde_json::to_string(&probabilities)?)
}
