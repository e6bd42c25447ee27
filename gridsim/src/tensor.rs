use nalgebra::DMatrix;

use crate::gates::{IDENTITY, ONE, Unitary, ZERO, to_unitary};

/// Kronecker product `a ⊗ b`.
///
/// For an `m×n` matrix `a` and a `p×q` matrix `b` the result is `(m·p)×(n·q)`,
/// with `a[(i, j)] · b` occupying the block at rows `i·p..`, columns `j·q..`.
pub fn kron(a: &Unitary, b: &Unitary) -> Unitary {
    let (m, n) = a.shape();
    let (p, q) = b.shape();
    let mut result = DMatrix::from_element(m * p, n * q, ZERO);

    for i in 0..m {
        for j in 0..n {
            let a_ij = a[(i, j)];
            if a_ij == ZERO {
                continue;
            }
            for k in 0..p {
                for l in 0..q {
                    result[(i * p + k, j * q + l)] = a_ij * b[(k, l)];
                }
            }
        }
    }
    result
}

/// Folds per-qubit operators into one register-wide operator.
///
/// `ordered[0]` acts on the lowest-numbered qubits and ends up as the
/// outermost factor, which keeps qubit 0 on the most significant bit of the
/// basis index. The operators must cover the register exactly once.
pub fn compose_step(ordered: &[Unitary]) -> Unitary {
    ordered
        .iter()
        .fold(DMatrix::from_element(1, 1, ONE), |acc, m| kron(&acc, m))
}

/// Places a `2^k×2^k` gate on the contiguous qubits `first_qubit..first_qubit + k`
/// and the identity everywhere else.
pub fn embed_block(num_qubits: usize, gate: &Unitary, first_qubit: usize) -> Unitary {
    assert!(
        gate.is_square() && gate.nrows().is_power_of_two(),
        "gate must be a square power-of-two matrix, got {:?}",
        gate.shape()
    );
    let span = gate.nrows().trailing_zeros() as usize;
    assert!(
        first_qubit + span <= num_qubits,
        "gate on qubits {}..{} does not fit a {}-qubit register",
        first_qubit,
        first_qubit + span,
        num_qubits
    );

    let identity = to_unitary(&IDENTITY);
    let mut factors = Vec::with_capacity(num_qubits - span + 1);
    factors.extend(std::iter::repeat_n(identity.clone(), first_qubit));
    factors.push(gate.clone());
    factors.extend(std::iter::repeat_n(identity, num_qubits - first_qubit - span));
    compose_step(&factors)
}

/// Checks `U · U† = I` entry by entry within `tolerance`.
pub fn is_unitary(matrix: &Unitary, tolerance: f64) -> bool {
    if !matrix.is_square() {
        return false;
    }
    let product = matrix * matrix.adjoint();
    let dim = matrix.nrows();
    (0..dim).all(|r| {
        (0..dim).all(|c| {
            let expected = if r == c { ONE } else { ZERO };
            (product[(r, c)] - expected).norm() <= tolerance
        })
    })
}
