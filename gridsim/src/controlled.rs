use nalgebra::DMatrix;
use tracing::trace;

use crate::gates::{GateMatrix, ONE, Unitary, ZERO};

/// Mask selecting `qubit`'s bit in a basis index. Qubit 0 is the most
/// significant bit.
fn qubit_mask(num_qubits: usize, qubit: usize) -> usize {
    1 << (num_qubits - 1 - qubit)
}

fn assert_distinct_in_range(num_qubits: usize, qubits: &[usize]) {
    for (i, &q) in qubits.iter().enumerate() {
        assert!(
            q < num_qubits,
            "qubit {} out of range for a {}-qubit register",
            q,
            num_qubits
        );
        assert!(!qubits[..i].contains(&q), "qubit {} used twice in one gate", q);
    }
}

/// Full-register matrix for `base_gate` on `target`, conditioned on `control`.
///
/// Built column by column: a basis state with the control bit clear maps to
/// itself, and one with the control bit set spreads over the two states that
/// differ only in the target bit, weighted by the matching column of
/// `base_gate`. Control and target may sit anywhere in the register.
///
/// Panics if either qubit is outside the register or they coincide.
pub fn embed_controlled(
    num_qubits: usize,
    control: usize,
    target: usize,
    base_gate: &GateMatrix,
) -> Unitary {
    assert_distinct_in_range(num_qubits, &[control, target]);

    let dim = 1usize << num_qubits;
    let control_mask = qubit_mask(num_qubits, control);
    let target_mask = qubit_mask(num_qubits, target);
    let mut unitary = DMatrix::from_element(dim, dim, ZERO);

    for i in 0..dim {
        if i & control_mask == 0 {
            unitary[(i, i)] = ONE;
            continue;
        }
        let target_bit = usize::from(i & target_mask != 0);
        for k in 0..2 {
            let j = if k == 1 { i | target_mask } else { i & !target_mask };
            unitary[(j, i)] = base_gate[k][target_bit];
        }
    }

    trace!(num_qubits, control, target, "embedded controlled gate");
    unitary
}

/// Full-register matrix for a Toffoli: flips `target` when both controls are set.
///
/// Panics if any qubit is outside the register or two of them coincide.
pub fn embed_ccx(num_qubits: usize, controls: [usize; 2], target: usize) -> Unitary {
    assert_distinct_in_range(num_qubits, &[controls[0], controls[1], target]);

    let dim = 1usize << num_qubits;
    let control_mask = qubit_mask(num_qubits, controls[0]) | qubit_mask(num_qubits, controls[1]);
    let target_mask = qubit_mask(num_qubits, target);
    let mut unitary = DMatrix::from_element(dim, dim, ZERO);

    for i in 0..dim {
        let j = if i & control_mask == control_mask {
            i ^ target_mask
        } else {
            i
        };
        unitary[(j, i)] = ONE;
    }

    trace!(num_qubits, ?controls, target, "embedded doubly-controlled gate");
    unitary
}
