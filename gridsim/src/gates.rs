use nalgebra::DMatrix;
use num_complex::Complex;
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_1_SQRT_2;
use std::fmt;

use crate::circuit::GateCell;

// custom type for gate matrices
pub type GateMatrix = [[Complex<f64>; 2]; 2];

/// A dense operator over some number of qubits.
pub type Unitary = DMatrix<Complex<f64>>;

pub(crate) const ZERO: Complex<f64> = Complex::new(0.0, 0.0);
pub(crate) const ONE: Complex<f64> = Complex::new(1.0, 0.0);
const NEG_ONE: Complex<f64> = Complex::new(-1.0, 0.0);
const HALF_ROOT: Complex<f64> = Complex::new(FRAC_1_SQRT_2, 0.0);
const NEG_HALF_ROOT: Complex<f64> = Complex::new(-FRAC_1_SQRT_2, 0.0);

pub const IDENTITY: GateMatrix = [[ONE, ZERO], [ZERO, ONE]];

pub const PAULI_X: GateMatrix = [[ZERO, ONE], [ONE, ZERO]];

pub const HADAMARD: GateMatrix = [[HALF_ROOT, HALF_ROOT], [HALF_ROOT, NEG_HALF_ROOT]];

pub const PAULI_Z: GateMatrix = [[ONE, ZERO], [ZERO, NEG_ONE]];

// Two-qubit controlled gates with the control on the first (more significant) qubit.
pub const CX: [[Complex<f64>; 4]; 4] = [
    [ONE, ZERO, ZERO, ZERO],
    [ZERO, ONE, ZERO, ZERO],
    [ZERO, ZERO, ZERO, ONE],
    [ZERO, ZERO, ONE, ZERO],
];

pub const CH: [[Complex<f64>; 4]; 4] = [
    [ONE, ZERO, ZERO, ZERO],
    [ZERO, ONE, ZERO, ZERO],
    [ZERO, ZERO, HALF_ROOT, HALF_ROOT],
    [ZERO, ZERO, HALF_ROOT, NEG_HALF_ROOT],
];

pub const CZ: [[Complex<f64>; 4]; 4] = [
    [ONE, ZERO, ZERO, ZERO],
    [ZERO, ONE, ZERO, ZERO],
    [ZERO, ZERO, ONE, ZERO],
    [ZERO, ZERO, ZERO, NEG_ONE],
];

// Toffoli with both controls ahead of the target.
pub const CCX: [[Complex<f64>; 8]; 8] = [
    [ONE, ZERO, ZERO, ZERO, ZERO, ZERO, ZERO, ZERO],
    [ZERO, ONE, ZERO, ZERO, ZERO, ZERO, ZERO, ZERO],
    [ZERO, ZERO, ONE, ZERO, ZERO, ZERO, ZERO, ZERO],
    [ZERO, ZERO, ZERO, ONE, ZERO, ZERO, ZERO, ZERO],
    [ZERO, ZERO, ZERO, ZERO, ONE, ZERO, ZERO, ZERO],
    [ZERO, ZERO, ZERO, ZERO, ZERO, ONE, ZERO, ZERO],
    [ZERO, ZERO, ZERO, ZERO, ZERO, ZERO, ZERO, ONE],
    [ZERO, ZERO, ZERO, ZERO, ZERO, ZERO, ONE, ZERO],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SingleQubitGate {
    #[default]
    I,
    X,
    H,
    Z,
}

impl SingleQubitGate {
    /// Reads a grid tag. Anything unrecognized is the identity.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "X" => SingleQubitGate::X,
            "H" => SingleQubitGate::H,
            "Z" => SingleQubitGate::Z,
            _ => SingleQubitGate::I,
        }
    }

    pub fn matrix(self) -> GateMatrix {
        match self {
            SingleQubitGate::I => IDENTITY,
            SingleQubitGate::X => PAULI_X,
            SingleQubitGate::H => HADAMARD,
            SingleQubitGate::Z => PAULI_Z,
        }
    }
}

impl fmt::Display for SingleQubitGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// The single-target gates that can be conditioned on one control qubit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlledKind {
    CX,
    CH,
    CZ,
}

impl ControlledKind {
    /// The 2x2 gate applied to the target when the control is set.
    pub fn base_gate(self) -> GateMatrix {
        match self {
            ControlledKind::CX => PAULI_X,
            ControlledKind::CH => HADAMARD,
            ControlledKind::CZ => PAULI_Z,
        }
    }

    /// The 4x4 form for a control sitting directly above its target.
    pub fn canonical(self) -> Unitary {
        match self {
            ControlledKind::CX => from_rows(&CX),
            ControlledKind::CH => from_rows(&CH),
            ControlledKind::CZ => from_rows(&CZ),
        }
    }
}

impl fmt::Display for ControlledKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Matrix for whatever a single grid cell asks of its own qubit.
///
/// Multi-qubit descriptors are embedded separately by the evaluator, so here
/// they fall back to the identity along with empty cells.
pub fn matrix_for_cell(cell: &GateCell) -> GateMatrix {
    match cell {
        GateCell::SingleQubit(gate) => gate.matrix(),
        GateCell::Empty
        | GateCell::TwoQubitControlled { .. }
        | GateCell::DoublyControlled { .. } => IDENTITY,
    }
}

pub fn to_unitary(matrix: &GateMatrix) -> Unitary {
    from_rows(matrix)
}

pub fn canonical_ccx() -> Unitary {
    from_rows(&CCX)
}

fn from_rows<const N: usize>(rows: &[[Complex<f64>; N]; N]) -> Unitary {
    DMatrix::from_fn(N, N, |r, c| rows[r][c])
}
