use tracing::{debug, info};

use crate::api::{SimError, SimulatorApi};
use crate::circuit::{Circuit, GateCell};
use crate::controlled::{embed_ccx, embed_controlled};
use crate::events::{ColumnInfo, CompletionInfo, Event, SimulationStartInfo};
use crate::gates::{IDENTITY, Unitary, matrix_for_cell, to_unitary};
use crate::probability::ProbabilityMap;
use crate::state::StateVector;
use crate::tensor::compose_step;
use rand::Rng;
use std::collections::BTreeMap;

/// One piece of work inside a column.
#[derive(Debug, Clone)]
pub enum Operation {
    /// A multi-qubit gate, already embedded into a register-wide matrix.
    FullRegister {
        cell: GateCell,
        qubits: Vec<usize>,
        unitary: Unitary,
    },
    /// Whatever a lone qubit does this step, identity included.
    SingleQubit { qubit: usize, cell: GateCell },
}

impl Operation {
    pub fn lowest_qubit(&self) -> usize {
        match self {
            Operation::FullRegister { qubits, .. } => qubits.iter().copied().min().unwrap_or(0),
            Operation::SingleQubit { qubit, .. } => *qubit,
        }
    }

    pub fn label(&self) -> String {
        match self {
            Operation::FullRegister { cell, .. } => match *cell {
                GateCell::TwoQubitControlled {
                    kind,
                    control,
                    target,
                } => format!("{} q{}->q{}", kind, control, target),
                GateCell::DoublyControlled { controls, target } => {
                    format!("CCX q{},q{}->q{}", controls[0], controls[1], target)
                }
                GateCell::Empty | GateCell::SingleQubit(_) => format!("{:?}", cell),
            },
            Operation::SingleQubit { qubit, cell } => match cell {
                GateCell::SingleQubit(gate) => format!("{} q{}", gate, qubit),
                _ => format!("I q{}", qubit),
            },
        }
    }
}

/// Splits one column into register-wide gates and per-qubit gates, ordered
/// by lowest qubit.
///
/// Scanning rows top to bottom, the first row carrying a multi-qubit
/// descriptor claims all of that gate's qubits; its partner rows are skipped
/// afterwards. Rows left unclaimed get their single-qubit matrix, or the
/// identity. Expects a circuit that passed [`Circuit::validate`].
pub fn plan_column(circuit: &Circuit, column: usize) -> Vec<Operation> {
    let num_qubits = circuit.num_qubits();
    let mut claimed = vec![false; num_qubits];
    let mut operations = Vec::new();

    for qubit in 0..num_qubits {
        if claimed[qubit] {
            continue;
        }
        let cell = *circuit.cell(qubit, column);
        let qubits = cell.qubits();
        if qubits.is_empty() || qubits.iter().any(|&q| claimed[q]) {
            continue;
        }
        let unitary = match cell {
            GateCell::TwoQubitControlled {
                kind,
                control,
                target,
            } => embed_controlled(num_qubits, control, target, &kind.base_gate()),
            GateCell::DoublyControlled { controls, target } => {
                embed_ccx(num_qubits, controls, target)
            }
            GateCell::Empty | GateCell::SingleQubit(_) => continue,
        };
        for &q in &qubits {
            claimed[q] = true;
        }
        operations.push(Operation::FullRegister {
            cell,
            qubits,
            unitary,
        });
    }

    for qubit in 0..num_qubits {
        if !claimed[qubit] {
            claimed[qubit] = true;
            operations.push(Operation::SingleQubit {
                qubit,
                cell: *circuit.cell(qubit, column),
            });
        }
    }

    operations.sort_by_key(Operation::lowest_qubit);
    operations
}

/// The register-wide matrix for a planned column.
///
/// Single-qubit matrices are tensored in qubit order, with the identity on
/// rows a multi-qubit gate claimed. Multi-qubit embeddings act on disjoint
/// qubits, so they commute with each other and with that product.
pub fn column_unitary(num_qubits: usize, operations: &[Operation]) -> Unitary {
    let mut factors = vec![IDENTITY; num_qubits];
    let mut single_qubit_work = false;
    let mut embedded: Option<Unitary> = None;

    for operation in operations {
        match operation {
            Operation::SingleQubit { qubit, cell } => {
                let matrix = matrix_for_cell(cell);
                single_qubit_work |= matrix != IDENTITY;
                factors[*qubit] = matrix;
            }
            Operation::FullRegister { unitary, .. } => {
                embedded = Some(match embedded {
                    None => unitary.clone(),
                    Some(acc) => unitary * acc,
                });
            }
        }
    }

    match embedded {
        Some(unitary) if !single_qubit_work => unitary,
        embedded => {
            let factors: Vec<Unitary> = factors.iter().map(to_unitary).collect();
            let product = compose_step(&factors);
            match embedded {
                Some(unitary) => unitary * product,
                None => product,
            }
        }
    }
}

pub struct GridSimulator {
    num_qubits: usize,
    state: StateVector,
}

impl GridSimulator {
    pub fn new(num_qubits: usize) -> Self {
        GridSimulator {
            num_qubits,
            state: StateVector::new(num_qubits),
        }
    }

    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Applies one column to the current state and returns what was applied.
    pub fn apply_column(&mut self, circuit: &Circuit, column: usize) -> Vec<Operation> {
        let operations = plan_column(circuit, column);
        let unitary = column_unitary(self.num_qubits, &operations);
        self.state.apply_unitary(&unitary);
        debug!(
            column,
            operations = ?operations.iter().map(Operation::label).collect::<Vec<_>>(),
            "applied column"
        );
        operations
    }

    /// Same as [`SimulatorApi::run`], also recording an event per column.
    pub fn run_with_trace(&mut self, circuit: &Circuit) -> Result<Vec<Event>, SimError> {
        let mut events = vec![Event::SimulationStart(SimulationStartInfo {
            num_qubits: circuit.num_qubits(),
            num_slots: circuit.num_slots(),
        })];

        self.evolve(circuit, |column, operations, state| {
            events.push(Event::ColumnApplied(ColumnInfo {
                column,
                operations: operations.iter().map(Operation::label).collect(),
                state_vector: state.clone(),
            }));
        })?;

        events.push(Event::Completed(CompletionInfo {
            probabilities: self.probabilities(),
            total_probability: self.state.total_probability(),
        }));
        Ok(events)
    }

    fn evolve(
        &mut self,
        circuit: &Circuit,
        mut on_column: impl FnMut(usize, &[Operation], &StateVector),
    ) -> Result<(), SimError> {
        circuit.validate()?;
        self.reset(circuit.num_qubits());
        info!(
            num_qubits = circuit.num_qubits(),
            num_slots = circuit.num_slots(),
            "starting simulation"
        );

        for column in 0..circuit.num_slots() {
            let operations = self.apply_column(circuit, column);
            on_column(column, &operations, &self.state);
        }

        info!(
            total_probability = self.state.total_probability(),
            "simulation finished"
        );
        Ok(())
    }
}

impl SimulatorApi for GridSimulator {
    fn reset(&mut self, num_qubits: usize) {
        if self.num_qubits != num_qubits {
            self.num_qubits = num_qubits;
            self.state = StateVector::new(num_qubits);
        } else {
            self.state.reset();
        }
    }

    fn run(&mut self, circuit: &Circuit) -> Result<(), SimError> {
        self.evolve(circuit, |_, _, _| {})
    }

    fn statevector(&self) -> &StateVector {
        &self.state
    }

    fn probabilities(&self) -> ProbabilityMap {
        ProbabilityMap::from_state(&self.state)
    }

    fn sample<R: Rng + ?Sized>(
        &self,
        shots: u32,
        rng: &mut R,
    ) -> Result<BTreeMap<String, u32>, SimError> {
        self.state.sample_counts(shots, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gates::{ControlledKind, HADAMARD, PAULI_X, SingleQubitGate};
    use crate::tensor::kron;
    use num_complex::Complex;
    use std::f64::consts::FRAC_1_SQRT_2;

    const EPSILON: f64 = 1e-9;

    fn approx_eq(a: Complex<f64>, b: Complex<f64>) -> bool {
        (a.re - b.re).abs() < EPSILON && (a.im - b.im).abs() < EPSILON
    }

    fn approx_eq_unitary(a: &Unitary, b: &Unitary) -> bool {
        a.shape() == b.shape() && a.iter().zip(b.iter()).all(|(x, y)| (x - y).norm() < EPSILON)
    }

    #[test]
    fn test_bell_state_simulation() {
        let mut circuit = Circuit::new(2, 2);
        circuit.set_gate(0, 0, SingleQubitGate::H);
        circuit.place_controlled(1, ControlledKind::CX, 0, 1);

        let mut sim = GridSimulator::new(2);
        sim.run(&circuit).unwrap();
        let state = sim.statevector();
        let expected_amp = Complex::new(FRAC_1_SQRT_2, 0.0);
        assert!(approx_eq(state.amplitudes[0], expected_amp));
        assert!(approx_eq(state.amplitudes[1], Complex::new(0.0, 0.0)));
        assert!(approx_eq(state.amplitudes[2], Complex::new(0.0, 0.0)));
        assert!(approx_eq(state.amplitudes[3], expected_amp));
    }

    #[test]
    fn test_plan_claims_partner_rows_once() {
        let mut circuit = Circuit::new(3, 1);
        circuit.place_controlled(0, ControlledKind::CZ, 2, 0);
        circuit.set_gate(1, 0, SingleQubitGate::H);

        let operations = plan_column(&circuit, 0);
        assert_eq!(operations.len(), 2);
        assert!(matches!(
            &operations[0],
            Operation::FullRegister { qubits, .. } if qubits == &vec![2, 0]
        ));
        assert!(matches!(operations[1], Operation::SingleQubit { qubit: 1, .. }));
        assert_eq!(operations[0].label(), "CZ q2->q0");
        assert_eq!(operations[1].label(), "H q1");
    }

    #[test]
    fn test_plan_sorts_by_lowest_qubit() {
        let mut circuit = Circuit::new(4, 1);
        circuit.place_controlled(0, ControlledKind::CX, 3, 1);
        let operations = plan_column(&circuit, 0);
        let lowest: Vec<usize> = operations.iter().map(Operation::lowest_qubit).collect();
        assert_eq!(lowest, vec![0, 1, 2]);
    }

    #[test]
    fn test_empty_column_is_identity() {
        let circuit = Circuit::new(3, 1);
        let operations = plan_column(&circuit, 0);
        assert_eq!(operations.len(), 3);
        let u = column_unitary(3, &operations);
        assert!(approx_eq_unitary(&u, &Unitary::identity(8, 8)));
    }

    #[test]
    fn test_single_qubit_gates_beside_a_controlled_gate_still_apply() {
        let mut circuit = Circuit::new(3, 1);
        circuit.place_controlled(0, ControlledKind::CX, 0, 1);
        circuit.set_gate(2, 0, SingleQubitGate::X);

        let u = column_unitary(3, &plan_column(&circuit, 0));
        let expected = &embed_controlled(3, 0, 1, &PAULI_X)
            * kron(&Unitary::identity(4, 4), &to_unitary(&PAULI_X));
        assert!(approx_eq_unitary(&u, &expected));
    }

    #[test]
    fn test_disjoint_gates_in_one_column_both_apply() {
        // X on qubits 0 and 3 first, then CX 0->1 and CX 3->2 in the same column.
        let mut circuit = Circuit::new(4, 2);
        circuit.set_gate(0, 0, SingleQubitGate::X);
        circuit.set_gate(3, 0, SingleQubitGate::X);
        circuit.place_controlled(1, ControlledKind::CX, 0, 1);
        circuit.place_controlled(1, ControlledKind::CX, 3, 2);

        let mut sim = GridSimulator::new(4);
        sim.run(&circuit).unwrap();
        // |1001> -> |1111>
        assert!(approx_eq(sim.statevector().amplitudes[0b1111], Complex::new(1.0, 0.0)));
    }

    #[test]
    fn test_gate_order_within_column_does_not_matter() {
        let mut first = Circuit::new(5, 2);
        first.set_gate(0, 0, SingleQubitGate::H);
        first.set_gate(2, 0, SingleQubitGate::H);
        first.set_gate(4, 0, SingleQubitGate::H);
        let mut second = first.clone();

        first.place_controlled(1, ControlledKind::CH, 0, 3);
        first.place_ccx(1, [2, 4], 1);
        second.place_ccx(1, [4, 2], 1);
        second.place_controlled(1, ControlledKind::CH, 0, 3);

        let mut a = GridSimulator::new(5);
        a.run(&first).unwrap();
        let mut b = GridSimulator::new(5);
        b.run(&second).unwrap();
        for (x, y) in a.statevector().amplitudes.iter().zip(&b.statevector().amplitudes) {
            assert!(approx_eq(*x, *y));
        }
    }

    #[test]
    fn test_run_resets_between_circuits() {
        let mut flip = Circuit::new(1, 1);
        flip.set_gate(0, 0, SingleQubitGate::X);
        let mut hadamard = Circuit::new(2, 1);
        hadamard.set_gate(1, 0, SingleQubitGate::H);

        let mut sim = GridSimulator::new(1);
        sim.run(&flip).unwrap();
        assert!(approx_eq(sim.statevector().amplitudes[1], Complex::new(1.0, 0.0)));

        sim.run(&hadamard).unwrap();
        assert_eq!(sim.num_qubits(), 2);
        let h = HADAMARD[0][0];
        assert!(approx_eq(sim.statevector().amplitudes[0], h));
        assert!(approx_eq(sim.statevector().amplitudes[1], h));

        sim.run(&flip).unwrap();
        sim.run(&flip).unwrap();
        assert!(approx_eq(sim.statevector().amplitudes[1], Complex::new(1.0, 0.0)));
    }

    #[test]
    fn test_invalid_circuit_leaves_state_untouched() {
        let cell = GateCell::DoublyControlled {
            controls: [0, 1],
            target: 9,
        };
        let circuit = Circuit::from_rows(vec![vec![cell], vec![cell]]).unwrap();
        let mut sim = GridSimulator::new(2);
        assert!(matches!(sim.run(&circuit), Err(SimError::QubitOutOfRange { .. })));
        assert_eq!(*sim.statevector(), StateVector::new(2));
    }

    #[test]
    fn test_trace_records_every_column() {
        let mut circuit = Circuit::new(2, 3);
        circuit.set_gate(0, 0, SingleQubitGate::H);
        circuit.place_controlled(1, ControlledKind::CX, 0, 1);

        let mut sim = GridSimulator::new(2);
        let events = sim.run_with_trace(&circuit).unwrap();
        assert_eq!(events.len(), 5);
        assert!(matches!(
            &events[0],
            Event::SimulationStart(SimulationStartInfo { num_qubits: 2, num_slots: 3 })
        ));
        match &events[2] {
            Event::ColumnApplied(info) => {
                assert_eq!(info.column, 1);
                assert_eq!(info.operations, vec!["CX q0->q1".to_string()]);
                assert!(approx_eq(info.state_vector.amplitudes[3], HADAMARD[0][0]));
            }
            other => panic!("unexpected event {:?}", other),
        }
        match &events[4] {
            Event::Completed(info) => {
                assert!((info.total_probability - 1.0).abs() < EPSILON);
                assert!((info.probabilities.get("11").unwrap() - 0.5).abs() < EPSILON);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }
}
