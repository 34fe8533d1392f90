//! Inter-dimensional variation graph
//!
//! Every legal combination of dimension values is a content subgraph. Subgraphs are
//! connected by weighted variation edges pointing from a variant to each of its
//! fallbacks. The weights decide which fallback is preferred.

mod export;
mod graph;
mod weight;

pub use graph::{ContentSubgraph, InterDimensionalVariationGraph, VariantType, VariationEdge};
pub use weight::VariationWeight;

use crate::dimension::{ContentDimensionId, DimensionError};
use crate::dimension_space::DimensionSpacePoint;

/// Result type for variation graph operations
pub type VariationGraphResult<T> = Result<T, VariationGraphError>;

/// Errors raised while building or querying the variation graph
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VariationGraphError {
    #[error("Unknown content dimension \"{0}\"")]
    UnknownDimensionIdentifier(ContentDimensionId),

    #[error("Unknown value \"{value}\" in content dimension \"{dimension}\"")]
    UnknownDimensionValue {
        dimension: ContentDimensionId,
        value: String,
    },

    #[error("Dimension space point {point} has no value for dimension \"{dimension}\"")]
    IncompleteDimensionSpacePoint {
        point: DimensionSpacePoint,
        dimension: ContentDimensionId,
    },

    #[error("No content subgraph is registered for dimension space point {0}")]
    SubgraphNotRegistered(DimensionSpacePoint),

    #[error("Content subgraph {0} cannot fall back to itself")]
    SelfFallback(DimensionSpacePoint),

    #[error("Content subgraph {variant} is already connected to fallback {fallback}")]
    DuplicateVariationEdge {
        variant: DimensionSpacePoint,
        fallback: DimensionSpacePoint,
    },

    #[error("Content subgraph {fallback} does not generalize {variant}")]
    NotAFallback {
        variant: DimensionSpacePoint,
        fallback: DimensionSpacePoint,
    },

    #[error("Content subgraph {variant} has more than one fallback with normalized weight {weight}")]
    AmbiguousFallback {
        variant: DimensionSpacePoint,
        weight: u64,
    },

    #[error(transparent)]
    Dimension(DimensionError),
}

impl From<DimensionError> for VariationGraphError {
    fn from(error: DimensionError) -> Self {
        match error {
            DimensionError::UnknownDimensionIdentifier(dimension) => {
                Self::UnknownDimensionIdentifier(dimension)
            }
            DimensionError::UnknownDimensionValue { dimension, value } => {
                Self::UnknownDimensionValue { dimension, value }
            }
            other => Self::Dimension(other),
        }
    }
}
