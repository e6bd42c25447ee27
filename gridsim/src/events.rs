use crate::probability::ProbabilityMap;
use crate::state::StateVector;
use serde::Serialize;
use std::io::{self, Write};

#[derive(Serialize, Debug, Clone)]
#[serde(tag = "eventType")]
pub enum Event {
    SimulationStart(SimulationStartInfo),
    ColumnApplied(ColumnInfo),
    Completed(CompletionInfo),
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SimulationStartInfo {
    pub num_qubits: usize,
    pub num_slots: usize,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ColumnInfo {
    pub column: usize,
    pub operations: Vec<String>,
    pub state_vector: StateVector,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CompletionInfo {
    pub probabilities: ProbabilityMap,
    pub total_probability: f64,
}

/// Writes one event as a single line of JSON.
pub fn emit_event(event: &Event, writer: &mut impl Write) -> io::Result<()> {
    serde_json::to_writer(&mut *writer, event)?;
    writeln!(writer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_are_tagged_json_lines() {
        let mut out = Vec::new();
        emit_event(
            &Event::SimulationStart(SimulationStartInfo {
                num_qubits: 2,
                num_slots: 3,
            }),
            &mut out,
        )
        .unwrap();
        emit_event(
            &Event::ColumnApplied(ColumnInfo {
                column: 0,
                operations: vec!["X q0".to_string()],
                state_vector: StateVector::new(1),
            }),
            &mut out,
        )
        .unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            r#"{"eventType":"SimulationStart","numQubits":2,"numSlots":3}"#
        );
        let column: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(column["eventType"], "ColumnApplied");
        assert_eq!(column["operations"][0], "X q0");
        assert_eq!(column["stateVector"]["amplitudes"][0][0], 1.0);
    }
}
