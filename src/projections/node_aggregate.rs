//! Node aggregate read model

use crate::dimension_space::{DimensionSpacePoint, DimensionSpacePointSet};
use crate::value_objects::{
    ContentStreamId, NodeAggregateClassification, NodeAggregateId, NodeName, NodeTypeName,
    PropertyValues,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A node aggregate as seen by the read side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeAggregate {
    pub content_stream_id: ContentStreamId,
    pub node_aggregate_id: NodeAggregateId,
    pub node_type_name: NodeTypeName,
    pub node_name: Option<NodeName>,
    pub classification: NodeAggregateClassification,
    /// Points the aggregate's nodes originate in, with their properties
    pub occupation: BTreeMap<DimensionSpacePoint, PropertyValues>,
    /// Points the aggregate is visible in, with the parent in each point
    pub coverage: BTreeMap<DimensionSpacePoint, Option<NodeAggregateId>>,
    /// Children in each covered point, in sibling order
    pub(crate) children: BTreeMap<DimensionSpacePoint, Vec<NodeAggregateId>>,
}

impl NodeAggregate {
    pub fn occupied_dimension_space_points(&self) -> DimensionSpacePointSet {
        self.occupation.keys().cloned().collect()
    }

    pub fn covered_dimension_space_points(&self) -> DimensionSpacePointSet {
        self.coverage.keys().cloned().collect()
    }

    pub fn covers(&self, point: &DimensionSpacePoint) -> bool {
        self.coverage.contains_key(point)
    }

    pub fn occupies(&self, point: &DimensionSpacePoint) -> bool {
        self.occupation.contains_key(point)
    }

    /// The parent in a covered point
    pub fn parent_in(&self, point: &DimensionSpacePoint) -> Option<&NodeAggregateId> {
        self.coverage.get(point).and_then(Option::as_ref)
    }

    /// Properties of the node originating in `origin`
    pub fn properties_in(&self, origin: &DimensionSpacePoint) -> Option<&PropertyValues> {
        self.occupation.get(origin)
    }

    /// Child ids in a covered point, in sibling order
    pub fn child_node_aggregate_ids_in(&self, point: &DimensionSpacePoint) -> &[NodeAggregateId] {
        self.children.get(point).map(Vec::as_slice).unwrap_or(&[])
    }
}
