//! Weighted combination of per-component sub-scores.

use crate::shared::config::{validate_weights, ConfigError};
use crate::shared::score::clamp_score;

/// Fixed-arity weighted sum. Each component is clamped to the score range
/// before weighting and the total is clamped again, so a non-finite or
/// out-of-range component can never push the fused value outside [0, 100].
#[derive(Clone, Debug)]
pub struct ScoreFusion<const N: usize> {
    names: [&'static str; N],
    weights: [f64; N],
}

impl<const N: usize> ScoreFusion<N> {
    pub fn new(signal: &'static str, table: [(&'static str, f64); N]) -> Result<Self, ConfigError> {
        validate_weights(signal, &table)?;
        Ok(Self {
            names: table.map(|(name, _)| name),
            weights: table.map(|(_, weight)| weight),
        })
    }

    pub fn fuse(&self, components: [f64; N]) -> f64 {
        let total: f64 = self
            .weights
            .iter()
            .zip(components)
            .map(|(w, c)| w * clamp_score(c))
            .sum();
        clamp_score(total)
    }

    pub fn weights(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        self.names.iter().copied().zip(self.weights.iter().copied())
    }
}
