use serde::Deserialize;
use serde::de::IgnoredAny;

use crate::api::SimError;
use crate::gates::{ControlledKind, SingleQubitGate};

/// One cell of the circuit grid: what a qubit does during one time step.
///
/// Multi-qubit gates are written identically into every row they touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(from = "RawCell")]
pub enum GateCell {
    #[default]
    Empty,
    SingleQubit(SingleQubitGate),
    TwoQubitControlled {
        kind: ControlledKind,
        control: usize,
        target: usize,
    },
    DoublyControlled {
        controls: [usize; 2],
        target: usize,
    },
}

impl GateCell {
    /// Qubits a multi-qubit descriptor acts on, controls first. Empty for
    /// single-qubit and empty cells.
    pub fn qubits(&self) -> Vec<usize> {
        match *self {
            GateCell::TwoQubitControlled { control, target, .. } => vec![control, target],
            GateCell::DoublyControlled { controls, target } => {
                vec![controls[0], controls[1], target]
            }
            GateCell::Empty | GateCell::SingleQubit(_) => Vec::new(),
        }
    }

    pub fn is_multi_qubit(&self) -> bool {
        matches!(
            self,
            GateCell::TwoQubitControlled { .. } | GateCell::DoublyControlled { .. }
        )
    }
}

// The grid sends `null`, a tag string, or a `{ "type": ... }` object per cell.
// Whatever doesn't fit becomes an empty cell.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawCell {
    Tag(String),
    Gate(RawGate),
    Other(IgnoredAny),
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum RawGate {
    CX { control: usize, target: usize },
    CH { control: usize, target: usize },
    CZ { control: usize, target: usize },
    CCX { controls: [usize; 2], target: usize },
}

impl From<RawCell> for GateCell {
    fn from(raw: RawCell) -> Self {
        match raw {
            RawCell::Tag(tag) => match SingleQubitGate::from_tag(&tag) {
                SingleQubitGate::I => GateCell::Empty,
                gate => GateCell::SingleQubit(gate),
            },
            RawCell::Gate(RawGate::CX { control, target }) => GateCell::TwoQubitControlled {
                kind: ControlledKind::CX,
                control,
                target,
            },
            RawCell::Gate(RawGate::CH { control, target }) => GateCell::TwoQubitControlled {
                kind: ControlledKind::CH,
                control,
                target,
            },
            RawCell::Gate(RawGate::CZ { control, target }) => GateCell::TwoQubitControlled {
                kind: ControlledKind::CZ,
                control,
                target,
            },
            RawCell::Gate(RawGate::CCX { controls, target }) => {
                GateCell::DoublyControlled { controls, target }
            }
            RawCell::Other(_) => GateCell::Empty,
        }
    }
}

/// A rectangular grid of gate cells: one row per qubit, one column per time step.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Circuit {
    rows: Vec<Vec<GateCell>>,
}

impl Circuit {
    /// An all-empty grid.
    pub fn new(num_qubits: usize, num_slots: usize) -> Self {
        Self {
            rows: vec![vec![GateCell::Empty; num_slots]; num_qubits],
        }
    }

    pub fn from_rows(rows: Vec<Vec<GateCell>>) -> Result<Self, SimError> {
        let expected = rows.first().map_or(0, Vec::len);
        if let Some((row, found)) = rows
            .iter()
            .map(Vec::len)
            .enumerate()
            .find(|&(_, len)| len != expected)
        {
            return Err(SimError::RaggedGrid {
                row,
                expected,
                found,
            });
        }
        Ok(Self { rows })
    }

    /// Decodes the grid's JSON form: an array of rows of cells.
    pub fn from_json(json: &str) -> Result<Self, SimError> {
        let rows: Vec<Vec<GateCell>> = serde_json::from_str(json)?;
        Self::from_rows(rows)
    }

    pub fn num_qubits(&self) -> usize {
        self.rows.len()
    }

    pub fn num_slots(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    pub fn cell(&self, qubit: usize, column: usize) -> &GateCell {
        &self.rows[qubit][column]
    }

    pub fn rows(&self) -> &[Vec<GateCell>] {
        &self.rows
    }

    /// Puts a single-qubit gate on `qubit` at `column`, replacing what was there.
    pub fn set_gate(&mut self, qubit: usize, column: usize, gate: SingleQubitGate) {
        self.rows[qubit][column] = match gate {
            SingleQubitGate::I => GateCell::Empty,
            gate => GateCell::SingleQubit(gate),
        };
    }

    /// Places a controlled gate, writing its descriptor into both rows.
    pub fn place_controlled(
        &mut self,
        column: usize,
        kind: ControlledKind,
        control: usize,
        target: usize,
    ) {
        self.place(
            column,
            GateCell::TwoQubitControlled {
                kind,
                control,
                target,
            },
        );
    }

    /// Places a Toffoli, writing its descriptor into all three rows.
    pub fn place_ccx(&mut self, column: usize, controls: [usize; 2], target: usize) {
        self.place(column, GateCell::DoublyControlled { controls, target });
    }

    fn place(&mut self, column: usize, cell: GateCell) {
        for qubit in cell.qubits() {
            self.rows[qubit][column] = cell;
        }
    }

    /// Checks every multi-qubit descriptor: its qubits are distinct and inside
    /// the register, it sits on one of its own rows, and each row it touches
    /// carries the same descriptor (so no two gates share a qubit in a column).
    pub fn validate(&self) -> Result<(), SimError> {
        let num_qubits = self.num_qubits();
        for column in 0..self.num_slots() {
            for row in 0..num_qubits {
                let cell = self.rows[row][column];
                let qubits = cell.qubits();
                if qubits.is_empty() {
                    continue;
                }

                for (i, &qubit) in qubits.iter().enumerate() {
                    if qubit >= num_qubits {
                        return Err(SimError::QubitOutOfRange {
                            column,
                            qubit,
                            num_qubits,
                        });
                    }
                    if qubits[..i].contains(&qubit) {
                        return Err(SimError::DuplicateQubit { column, qubit });
                    }
                }
                if !qubits.contains(&row) {
                    return Err(SimError::InconsistentDescriptor { column, row });
                }

                for &qubit in &qubits {
                    let other = self.rows[qubit][column];
                    if other == cell {
                        continue;
                    }
                    return Err(if other.is_multi_qubit() {
                        SimError::OverlappingGates { column, qubit }
                    } else {
                        SimError::InconsistentDescriptor { column, row: qubit }
                    });
                }
            }
        }
        Ok(())
    }
}
