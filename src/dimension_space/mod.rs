//! Dimension space
//!
//! A dimension space point assigns one value to each configured dimension. Sets of
//! points describe where a node aggregate exists ("coverage"). The zookeeper computes
//! which combinations of dimension values are legal at all.

mod point;
mod point_set;
mod zookeeper;

pub use point::DimensionSpacePoint;
pub use point_set::DimensionSpacePointSet;
pub use zookeeper::ContentDimensionZookeeper;
