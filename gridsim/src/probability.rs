use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::state::StateVector;

/// Measurement probability of every basis state, keyed by its bitstring.
///
/// Keys share one width, so lexicographic order is basis-index order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProbabilityMap(BTreeMap<String, f64>);

impl ProbabilityMap {
    /// Born rule: `|amplitude_i|²` for each index. No renormalization.
    pub fn from_state(state: &StateVector) -> Self {
        let map = state
            .amplitudes
            .iter()
            .enumerate()
            .map(|(i, amp)| (bitstring(i, state.num_qubits), amp.norm_sqr()))
            .collect();
        ProbabilityMap(map)
    }

    pub fn get(&self, bitstring: &str) -> Option<f64> {
        self.0.get(bitstring).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }
}

/// `index` in binary, most significant bit first, padded to `width` digits.
pub fn bitstring(index: usize, width: usize) -> String {
    (0..width)
        .rev()
        .map(|bit| if (index >> bit) & 1 == 1 { '1' } else { '0' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex;

    #[test]
    fn test_bitstring_is_big_endian_and_padded() {
        assert_eq!(bitstring(0, 3), "000");
        assert_eq!(bitstring(1, 3), "001");
        assert_eq!(bitstring(4, 3), "100");
        assert_eq!(bitstring(5, 4), "0101");
        assert_eq!(bitstring(0, 0), "");
    }

    #[test]
    fn test_from_state_squares_magnitudes() {
        let state = StateVector {
            num_qubits: 1,
            amplitudes: vec![Complex::new(0.6, 0.0), Complex::new(0.0, -0.8)],
        };
        let probs = ProbabilityMap::from_state(&state);
        assert_eq!(probs.len(), 2);
        assert!((probs.get("0").unwrap() - 0.36).abs() < 1e-12);
        assert!((probs.get("1").unwrap() - 0.64).abs() < 1e-12);
        assert!((probs.total() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_drift_is_not_corrected() {
        let state = StateVector {
            num_qubits: 1,
            amplitudes: vec![Complex::new(1.0, 0.0), Complex::new(0.1, 0.0)],
        };
        let probs = ProbabilityMap::from_state(&state);
        assert!((probs.total() - 1.01).abs() < 1e-12);
    }

    #[test]
    fn test_serializes_as_flat_object_in_index_order() {
        let probs = ProbabilityMap::from_state(&StateVector::new(2));
        let json = serde_json::to_string(&probs).unwrap();
        assert_eq!(json, r#"{"00":1.0,"01":0.0,"10":0.0,"11":0.0}"#);
        let keys: Vec<&str> = probs.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["00", "01", "10", "11"]);
    }
}
