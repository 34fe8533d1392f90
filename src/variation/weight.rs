use crate::dimension::ContentDimensionId;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-dimension weights in priority order, highest priority first
///
/// For a content subgraph the weight is the specialization depth of each of its values;
/// for a variation edge it is the depth delta between variant and fallback.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariationWeight {
    weights: IndexMap<ContentDimensionId, u32>,
}

impl VariationWeight {
    pub fn new<I, K>(weights: I) -> Self
    where
        I: IntoIterator<Item = (K, u32)>,
        K: Into<ContentDimensionId>,
    {
        Self {
            weights: weights
                .into_iter()
                .map(|(dimension, weight)| (dimension.into(), weight))
                .collect(),
        }
    }

    pub fn get(&self, dimension_id: &ContentDimensionId) -> Option<u32> {
        self.weights.get(dimension_id).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ContentDimensionId, u32)> {
        self.weights.iter().map(|(dimension, weight)| (dimension, *weight))
    }

    /// Whether variant and fallback agree on every dimension
    pub fn is_zero(&self) -> bool {
        self.weights.values().all(|weight| *weight == 0)
    }

    /// Combine the weights positionally: `Σ wᵢ · base^(n-1-i)`
    ///
    /// With `base` greater than any single weight, a difference in a higher-priority
    /// dimension always outweighs any difference in lower-priority ones. Saturates at
    /// `u64::MAX`.
    pub fn normalize(&self, base: u64) -> u64 {
        self.weights.values().fold(0u64, |normalized, weight| {
            normalized
                .saturating_mul(base)
                .saturating_add(u64::from(*weight))
        })
    }
}

impl fmt::Display for VariationWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (dimension, weight)) in self.weights.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{dimension}:{weight}")?;
        }
        write!(f, "}}")
    }
}
