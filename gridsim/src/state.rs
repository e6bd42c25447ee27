use nalgebra::DVector;
use num_complex::Complex;
use rand::Rng;
use rand::distributions::{Distribution, WeightedIndex};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::api::SimError;
use crate::gates::Unitary;
use crate::probability::bitstring;

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct StateVector {
    pub num_qubits: usize,
    #[serde(rename = "amplitudes")]
    pub amplitudes: Vec<Complex<f64>>,
}

impl StateVector {
    /// |0...0⟩ over `num_qubits` qubits.
    pub fn new(num_qubits: usize) -> Self {
        let size = 1 << num_qubits; // 2^num_qubits
        let mut amplitudes = vec![Complex::new(0.0, 0.0); size];
        amplitudes[0] = Complex::new(1.0, 0.0);
        Self {
            num_qubits,
            amplitudes,
        }
    }

    pub fn dimension(&self) -> usize {
        self.amplitudes.len()
    }

    /// `state ← U · state`.
    pub fn apply_unitary(&mut self, unitary: &Unitary) {
        assert_eq!(
            unitary.shape(),
            (self.dimension(), self.dimension()),
            "operator does not match a {}-qubit state",
            self.num_qubits
        );
        let current = DVector::from_column_slice(&self.amplitudes);
        let next = unitary * current;
        self.amplitudes.copy_from_slice(next.as_slice());
    }

    /// Sum of squared magnitudes. Stays at 1 up to rounding.
    pub fn total_probability(&self) -> f64 {
        self.amplitudes.iter().map(|a| a.norm_sqr()).sum()
    }

    /// Draws `shots` basis-state outcomes without touching the state.
    pub fn sample_counts<R: Rng + ?Sized>(
        &self,
        shots: u32,
        rng: &mut R,
    ) -> Result<BTreeMap<String, u32>, SimError> {
        let probabilities: Vec<f64> = self.amplitudes.iter().map(|a| a.norm_sqr()).collect();
        let dist =
            WeightedIndex::new(&probabilities).map_err(|e| SimError::Sampling(e.to_string()))?;

        let mut counts = BTreeMap::new();
        for _ in 0..shots {
            let index = dist.sample(rng);
            *counts.entry(bitstring(index, self.num_qubits)).or_insert(0) += 1;
        }
        Ok(counts)
    }

    pub fn reset(&mut self) {
        for amp in &mut self.amplitudes {
            *amp = Complex::new(0.0, 0.0);
        }
        self.amplitudes[0] = Complex::new(1.0, 0.0);
    }
}
