use super::{NodeAggregateIdMapping, NodeAggregateIdsByNodePaths, NodeSubtreeSnapshot};
use crate::dimension_space::DimensionSpacePoint;
use crate::node_type::NodeTypeManager;
use crate::value_objects::{
    ContentStreamId, NodeAggregateId, NodeName, NodeTypeName, PropertyValues, UserId,
};
use serde::{Deserialize, Serialize};

/// Open a new, empty content stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateContentStream {
    /// Id of the stream to open; must not exist yet
    pub content_stream_id: ContentStreamId,
    /// Who opens the stream
    pub initiating_user_id: UserId,
}

/// Create the root node aggregate of a content stream, covering every allowed point
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRootNodeAggregateWithNode {
    /// The content stream to create the root in
    pub content_stream_id: ContentStreamId,
    /// Id of the new root node aggregate
    pub node_aggregate_id: NodeAggregateId,
    /// Must be of type root and not yet used by another root in the stream
    pub node_type_name: NodeTypeName,
    /// Who initiated the creation
    pub initiating_user_id: UserId,
}

/// Create a node aggregate with one node originating in one dimension space point
///
/// The node covers every specialization of its origin that its parent covers.
/// Tethered descendants declared by the node type are created along with it; their
/// ids must all be assigned in `tethered_descendant_node_aggregate_ids`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNodeAggregateWithNode {
    /// The content stream to create the node in
    pub content_stream_id: ContentStreamId,
    /// Id of the new node aggregate; must not exist yet
    pub node_aggregate_id: NodeAggregateId,
    /// A concrete, non-root node type
    pub node_type_name: NodeTypeName,
    /// The point the node's content originates in
    pub origin_dimension_space_point: DimensionSpacePoint,
    /// The parent, which must cover the origin
    pub parent_node_aggregate_id: NodeAggregateId,
    /// Insert before this sibling; it must cover the origin. Appended if absent
    #[serde(default)]
    pub succeeding_sibling_node_aggregate_id: Option<NodeAggregateId>,
    /// Name below the parent, unique in every covered point
    #[serde(default)]
    pub node_name: Option<NodeName>,
    /// Property values, merged over the node type defaults
    #[serde(default)]
    pub initial_property_values: PropertyValues,
    /// Ids for the tethered descendants, by path below the new node
    #[serde(default)]
    pub tethered_descendant_node_aggregate_ids: NodeAggregateIdsByNodePaths,
    /// Who initiated the creation
    pub initiating_user_id: UserId,
}

impl CreateNodeAggregateWithNode {
    pub fn new(
        content_stream_id: ContentStreamId,
        node_aggregate_id: NodeAggregateId,
        node_type_name: NodeTypeName,
        origin_dimension_space_point: DimensionSpacePoint,
        parent_node_aggregate_id: NodeAggregateId,
    ) -> Self {
        Self {
            content_stream_id,
            node_aggregate_id,
            node_type_name,
            origin_dimension_space_point,
            parent_node_aggregate_id,
            succeeding_sibling_node_aggregate_id: None,
            node_name: None,
            initial_property_values: PropertyValues::new(),
            tethered_descendant_node_aggregate_ids: NodeAggregateIdsByNodePaths::default(),
            initiating_user_id: UserId::system(),
        }
    }

    pub fn with_node_name(mut self, node_name: NodeName) -> Self {
        self.node_name = Some(node_name);
        self
    }

    pub fn with_succeeding_sibling(mut self, sibling: NodeAggregateId) -> Self {
        self.succeeding_sibling_node_aggregate_id = Some(sibling);
        self
    }

    pub fn with_initial_property_values(mut self, values: PropertyValues) -> Self {
        self.initial_property_values = values;
        self
    }

    pub fn with_tethered_descendant_node_aggregate_ids(
        mut self,
        ids: NodeAggregateIdsByNodePaths,
    ) -> Self {
        self.tethered_descendant_node_aggregate_ids = ids;
        self
    }

    pub fn with_initiating_user_id(mut self, user_id: UserId) -> Self {
        self.initiating_user_id = user_id;
        self
    }

    /// Fill in fresh ids for every tethered descendant that has none yet
    ///
    /// Call this when building the command, so replaying it yields the same events.
    pub fn with_generated_tethered_descendant_ids(mut self, node_type_manager: &NodeTypeManager) -> Self {
        self.tethered_descendant_node_aggregate_ids = self
            .tethered_descendant_node_aggregate_ids
            .complete_for_node_type(&self.node_type_name, node_type_manager);
        self
    }
}

/// Duplicate a captured subtree below a new parent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyNodesRecursively {
    /// The content stream to copy into
    pub content_stream_id: ContentStreamId,
    /// The subtree to copy, root first
    pub node_to_insert: NodeSubtreeSnapshot,
    /// The point every copied node originates in
    pub target_dimension_space_point: DimensionSpacePoint,
    /// The new parent of the copied root
    pub target_parent_node_aggregate_id: NodeAggregateId,
    /// Insert the copied root before this sibling; it must cover the target point
    #[serde(default)]
    pub target_succeeding_sibling_node_aggregate_id: Option<NodeAggregateId>,
    /// Name for the copied root; the snapshot's name if absent
    #[serde(default)]
    pub target_node_name: Option<NodeName>,
    /// A new id for every node of the snapshot
    pub node_aggregate_id_mapping: NodeAggregateIdMapping,
    /// Who initiated the copy
    pub initiating_user_id: UserId,
}

impl CopyNodesRecursively {
    /// Build the command with a fresh id for every node of the snapshot
    pub fn create_from_snapshot(
        content_stream_id: ContentStreamId,
        node_to_insert: NodeSubtreeSnapshot,
        target_dimension_space_point: DimensionSpacePoint,
        target_parent_node_aggregate_id: NodeAggregateId,
    ) -> Self {
        let node_aggregate_id_mapping = NodeAggregateIdMapping::default().complete_for(&node_to_insert);
        Self {
            content_stream_id,
            node_to_insert,
            target_dimension_space_point,
            target_parent_node_aggregate_id,
            target_succeeding_sibling_node_aggregate_id: None,
            target_node_name: None,
            node_aggregate_id_mapping,
            initiating_user_id: UserId::system(),
        }
    }

    pub fn with_node_aggregate_id_mapping(mut self, mapping: NodeAggregateIdMapping) -> Self {
        self.node_aggregate_id_mapping = mapping;
        self
    }

    pub fn with_target_node_name(mut self, node_name: NodeName) -> Self {
        self.target_node_name = Some(node_name);
        self
    }

    pub fn with_target_succeeding_sibling(mut self, sibling: NodeAggregateId) -> Self {
        self.target_succeeding_sibling_node_aggregate_id = Some(sibling);
        self
    }

    pub fn with_initiating_user_id(mut self, user_id: UserId) -> Self {
        self.initiating_user_id = user_id;
        self
    }
}
