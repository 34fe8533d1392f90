//! Content graph projections
//!
//! The read side of the content repository. Command handlers consult it through the
//! [`ContentGraph`] trait to check preconditions; it is kept up to date by applying
//! persisted events in stream order.

mod content_graph;
mod node_aggregate;

pub use content_graph::InMemoryContentGraph;
pub use node_aggregate::NodeAggregate;

use crate::dimension_space::DimensionSpacePointSet;
use crate::events::EventEnvelope;
use crate::value_objects::{ContentStreamId, NodeAggregateId, NodeName, NodeTypeName};
use async_trait::async_trait;

/// Result type for projection updates
pub type ProjectionResult<T> = Result<T, ProjectionError>;

/// Errors raised while applying events to a projection
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProjectionError {
    #[error("Content stream \"{0}\" is not known to the projection")]
    ContentStreamMissing(ContentStreamId),

    #[error("Content stream \"{content_stream_id}\" expected event version {expected}, got {actual}")]
    VersionGap {
        content_stream_id: ContentStreamId,
        expected: u64,
        actual: u64,
    },

    #[error("Node aggregate \"{node_aggregate_id}\" is not known in content stream \"{content_stream_id}\"")]
    NodeAggregateMissing {
        content_stream_id: ContentStreamId,
        node_aggregate_id: NodeAggregateId,
    },
}

/// Read-side queries the command handlers depend on
///
/// Implementations answer from their current state; they never block on pending events.
pub trait ContentGraph: Send + Sync {
    fn content_stream_exists(&self, content_stream_id: &ContentStreamId) -> bool;

    /// Version of the last event applied for the stream; `None` for unknown streams
    fn content_stream_version(&self, content_stream_id: &ContentStreamId) -> Option<u64>;

    fn find_node_aggregate_by_id(
        &self,
        content_stream_id: &ContentStreamId,
        node_aggregate_id: &NodeAggregateId,
    ) -> Option<&NodeAggregate>;

    fn find_root_node_aggregate_by_type(
        &self,
        content_stream_id: &ContentStreamId,
        node_type_name: &NodeTypeName,
    ) -> Option<&NodeAggregate>;

    /// Distinct parents of an aggregate across all points it covers
    fn find_parent_node_aggregates(
        &self,
        content_stream_id: &ContentStreamId,
        child_node_aggregate_id: &NodeAggregateId,
    ) -> Vec<&NodeAggregate>;

    /// The subset of `points` in which a child of the parent already carries `node_name`
    fn dimension_space_points_occupied_by_child_node_name(
        &self,
        content_stream_id: &ContentStreamId,
        parent_node_aggregate_id: &NodeAggregateId,
        node_name: &NodeName,
        points: &DimensionSpacePointSet,
    ) -> DimensionSpacePointSet;

    fn node_aggregate_exists(
        &self,
        content_stream_id: &ContentStreamId,
        node_aggregate_id: &NodeAggregateId,
    ) -> bool {
        self.find_node_aggregate_by_id(content_stream_id, node_aggregate_id)
            .is_some()
    }
}

/// Trait for projections fed from the event store
#[async_trait]
pub trait ContentGraphProjection: Send + Sync {
    /// Apply one persisted event; already applied events are skipped
    async fn handle_event(&mut self, envelope: &EventEnvelope) -> ProjectionResult<()>;

    /// Forget all state
    async fn reset(&mut self) -> ProjectionResult<()>;

    /// Store-wide sequence number of the last applied event
    fn checkpoint(&self) -> Option<u64>;
}
