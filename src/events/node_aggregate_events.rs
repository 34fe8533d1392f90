//! Content stream and node aggregate events

use crate::dimension_space::{DimensionSpacePoint, DimensionSpacePointSet};
use crate::value_objects::{
    ContentStreamId, NodeAggregateClassification, NodeAggregateId, NodeName, NodeTypeName,
    PropertyValues, UserId,
};
use serde::{Deserialize, Serialize};

/// Content stream created event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentStreamWasCreated {
    /// The new content stream
    pub content_stream_id: ContentStreamId,
    /// Who created it
    pub initiating_user_id: UserId,
}

/// Root node aggregate created event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RootNodeAggregateWithNodeWasCreated {
    /// The content stream the root was created in
    pub content_stream_id: ContentStreamId,
    /// The new root node aggregate
    pub node_aggregate_id: NodeAggregateId,
    /// A node type of type root
    pub node_type_name: NodeTypeName,
    /// The complete allowed dimension subspace at the time of creation
    pub covered_dimension_space_points: DimensionSpacePointSet,
    /// Always root
    pub node_aggregate_classification: NodeAggregateClassification,
    /// Who initiated the creation
    pub initiating_user_id: UserId,
}

/// Node aggregate with node created event
///
/// Emitted for explicitly created nodes, for their tethered descendants and for every
/// node of a duplicated subtree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeAggregateWithNodeWasCreated {
    /// The content stream the node was created in
    pub content_stream_id: ContentStreamId,
    /// The new node aggregate
    pub node_aggregate_id: NodeAggregateId,
    /// The node type of the new aggregate
    pub node_type_name: NodeTypeName,
    /// The point the node's content originates in
    pub origin_dimension_space_point: DimensionSpacePoint,
    /// Every point in which the node is visible
    pub covered_dimension_space_points: DimensionSpacePointSet,
    /// The parent in all covered points
    pub parent_node_aggregate_id: NodeAggregateId,
    /// Name below the parent, if any
    pub node_name: Option<NodeName>,
    /// Serialized initial property values, including node type defaults
    pub initial_property_values: PropertyValues,
    /// Whether the node is regular or tethered
    pub node_aggregate_classification: NodeAggregateClassification,
    /// Who initiated the creation
    pub initiating_user_id: UserId,
    /// The sibling the node is inserted before; appended as last child if absent
    pub succeeding_sibling_node_aggregate_id: Option<NodeAggregateId>,
}
