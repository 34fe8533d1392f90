//! Guard clauses shared by the command handlers
//!
//! Every guard is a pure check against the variation graph, the node types and the
//! read-side content graph. None of them has side effects, so a command that fails
//! any guard leaves no trace.

use super::NodeAggregateCommandHandler;
use crate::commands::{CommandResult, NodeAggregateCommandError};
use crate::dimension_space::{DimensionSpacePoint, DimensionSpacePointSet};
use crate::node_type::NodeType;
use crate::projections::{ContentGraph, NodeAggregate};
use crate::value_objects::{ContentStreamId, NodeAggregateId, NodeName, NodeTypeName, PropertyValues};

impl NodeAggregateCommandHandler {
    pub fn require_content_stream_to_exist(
        &self,
        content_graph: &dyn ContentGraph,
        content_stream_id: &ContentStreamId,
    ) -> CommandResult<()> {
        if !content_graph.content_stream_exists(content_stream_id) {
            return Err(NodeAggregateCommandError::ContentStreamDoesNotExistYet(
                content_stream_id.clone(),
            ));
        }
        Ok(())
    }

    pub fn require_content_stream_to_not_exist(
        &self,
        content_graph: &dyn ContentGraph,
        content_stream_id: &ContentStreamId,
    ) -> CommandResult<()> {
        if content_graph.content_stream_exists(content_stream_id) {
            return Err(NodeAggregateCommandError::ContentStreamAlreadyExists(
                content_stream_id.clone(),
            ));
        }
        Ok(())
    }

    pub fn require_dimension_space_point_to_exist(
        &self,
        point: &DimensionSpacePoint,
    ) -> CommandResult<()> {
        if !self.variation_graph.allowed_subspace().contains(point) {
            return Err(NodeAggregateCommandError::DimensionSpacePointNotFound(
                point.clone(),
            ));
        }
        Ok(())
    }

    pub fn require_node_type(&self, node_type_name: &NodeTypeName) -> CommandResult<&NodeType> {
        Ok(self.node_type_manager.require_node_type(node_type_name)?)
    }

    pub fn require_node_type_to_not_be_abstract(&self, node_type: &NodeType) -> CommandResult<()> {
        if node_type.is_abstract() {
            return Err(NodeAggregateCommandError::NodeTypeIsAbstract(
                node_type.name().clone(),
            ));
        }
        Ok(())
    }

    pub fn require_node_type_to_be_of_type_root(&self, node_type: &NodeType) -> CommandResult<()> {
        if !node_type.is_of_type_root() {
            return Err(NodeAggregateCommandError::NodeTypeIsNotOfTypeRoot(
                node_type.name().clone(),
            ));
        }
        Ok(())
    }

    pub fn require_node_type_to_not_be_of_type_root(&self, node_type: &NodeType) -> CommandResult<()> {
        if node_type.is_of_type_root() {
            return Err(NodeAggregateCommandError::NodeTypeIsOfTypeRoot(
                node_type.name().clone(),
            ));
        }
        Ok(())
    }

    /// Every tethered descendant, at any depth, must have a configured node type
    pub fn require_tethered_descendant_node_types_to_exist(
        &self,
        node_type: &NodeType,
    ) -> CommandResult<()> {
        for (node_name, declaration) in node_type.tethered_nodes() {
            let Some(tethered_type) = self
                .node_type_manager
                .get_node_type(&declaration.node_type_name)
            else {
                return Err(NodeAggregateCommandError::TetheredNodeTypeNotFound {
                    node_type: node_type.name().clone(),
                    node_name: node_name.clone(),
                    tethered_node_type: declaration.node_type_name.clone(),
                });
            };
            self.require_tethered_descendant_node_types_to_exist(tethered_type)?;
        }
        Ok(())
    }

    pub fn require_tethered_descendant_node_types_to_not_be_of_type_root(
        &self,
        node_type: &NodeType,
    ) -> CommandResult<()> {
        for (node_name, declaration) in node_type.tethered_nodes() {
            let Some(tethered_type) = self
                .node_type_manager
                .get_node_type(&declaration.node_type_name)
            else {
                continue;
            };
            if tethered_type.is_of_type_root() {
                return Err(NodeAggregateCommandError::TetheredNodeTypeIsOfTypeRoot {
                    node_type: node_type.name().clone(),
                    node_name: node_name.clone(),
                });
            }
            self.require_tethered_descendant_node_types_to_not_be_of_type_root(tethered_type)?;
        }
        Ok(())
    }

    /// Child constraints of each parent and tethered-node constraints of each grandparent
    ///
    /// Parents or grandparents whose node type is no longer configured impose nothing.
    /// Tethered parents are constrained through their grandparent only.
    pub fn require_constraints_imposed_by_ancestors_are_met(
        &self,
        content_graph: &dyn ContentGraph,
        content_stream_id: &ContentStreamId,
        node_type: &NodeType,
        node_name: Option<&NodeName>,
        parent_node_aggregate_ids: &[&NodeAggregateId],
    ) -> CommandResult<()> {
        for parent_node_aggregate_id in parent_node_aggregate_ids {
            let parent = self.require_projected_node_aggregate(
                content_graph,
                content_stream_id,
                parent_node_aggregate_id,
            )?;
            if !parent.classification.is_tethered() {
                if let Some(parent_type) = self.node_type_manager.get_node_type(&parent.node_type_name) {
                    self.require_node_type_constraints_imposed_by_parent_to_be_met(
                        parent_type,
                        node_name,
                        node_type,
                    )?;
                }
            }

            for grandparent in
                content_graph.find_parent_node_aggregates(content_stream_id, parent_node_aggregate_id)
            {
                let Some(grandparent_type) = self
                    .node_type_manager
                    .get_node_type(&grandparent.node_type_name)
                else {
                    continue;
                };
                if let Some(parent_name) = &parent.node_name {
                    self.require_node_type_constraints_imposed_by_grandparent_to_be_met(
                        grandparent_type,
                        parent_name,
                        node_type,
                    )?;
                }
            }
        }
        Ok(())
    }

    fn require_node_type_constraints_imposed_by_parent_to_be_met(
        &self,
        parent_type: &NodeType,
        node_name: Option<&NodeName>,
        node_type: &NodeType,
    ) -> CommandResult<()> {
        if !parent_type.allows_child_node_type(node_type) {
            return Err(NodeAggregateCommandError::NodeTypeNotAllowedAsChild {
                parent_node_type: parent_type.name().clone(),
                node_type: node_type.name().clone(),
            });
        }
        let tethered = node_name.and_then(|name| {
            parent_type
                .tethered_node(name)
                .map(|declaration| (name, declaration))
        });
        if let Some((name, declaration)) = tethered {
            if &declaration.node_type_name != node_type.name() {
                return Err(NodeAggregateCommandError::TetheredNodeTypeMismatch {
                    parent_node_type: parent_type.name().clone(),
                    node_name: name.clone(),
                    expected: declaration.node_type_name.clone(),
                    node_type: node_type.name().clone(),
                });
            }
        }
        Ok(())
    }

    fn require_node_type_constraints_imposed_by_grandparent_to_be_met(
        &self,
        grandparent_type: &NodeType,
        parent_name: &NodeName,
        node_type: &NodeType,
    ) -> CommandResult<()> {
        if !self.node_type_manager.is_node_type_allowed_as_child_to_tethered_node(
            grandparent_type,
            parent_name,
            node_type,
        ) {
            return Err(NodeAggregateCommandError::NodeTypeNotAllowedBelowTetheredNode {
                grandparent_node_type: grandparent_type.name().clone(),
                tethered_node_name: parent_name.clone(),
                node_type: node_type.name().clone(),
            });
        }
        Ok(())
    }

    /// Regular children must not take a name the parent's node type reserves for a tethered node
    pub fn require_node_type_to_not_declare_tethered_child_node_name(
        &self,
        parent_node_type_name: &NodeTypeName,
        node_name: &NodeName,
    ) -> CommandResult<()> {
        let Some(parent_type) = self.node_type_manager.get_node_type(parent_node_type_name) else {
            return Ok(());
        };
        if parent_type.has_tethered_node(node_name) {
            return Err(NodeAggregateCommandError::NodeNameIsReservedForTetheredNode {
                parent_node_type: parent_node_type_name.clone(),
                node_name: node_name.clone(),
            });
        }
        Ok(())
    }

    pub fn require_node_aggregate_to_cover_dimension_space_point(
        &self,
        node_aggregate: &NodeAggregate,
        point: &DimensionSpacePoint,
    ) -> CommandResult<()> {
        if !node_aggregate.covers(point) {
            return Err(NodeAggregateCommandError::DimensionSpacePointNotCoveredByParent {
                node_aggregate_id: node_aggregate.node_aggregate_id.clone(),
                point: point.clone(),
            });
        }
        Ok(())
    }

    /// A succeeding sibling must be visible wherever the new node originates
    pub fn require_succeeding_sibling_to_cover_dimension_space_point(
        &self,
        sibling: &NodeAggregate,
        point: &DimensionSpacePoint,
    ) -> CommandResult<()> {
        if !sibling.covers(point) {
            return Err(NodeAggregateCommandError::DimensionSpacePointNotCoveredBySibling {
                node_aggregate_id: sibling.node_aggregate_id.clone(),
                point: point.clone(),
            });
        }
        Ok(())
    }

    /// The name must be free below the parent in every one of `points`
    ///
    /// `points` is the covered set of the new node, origin included, so the origin is not
    /// passed separately.
    pub fn require_node_name_to_be_unoccupied(
        &self,
        content_graph: &dyn ContentGraph,
        content_stream_id: &ContentStreamId,
        node_name: Option<&NodeName>,
        parent_node_aggregate_id: &NodeAggregateId,
        points: &DimensionSpacePointSet,
    ) -> CommandResult<()> {
        let Some(node_name) = node_name else {
            return Ok(());
        };
        let occupied = content_graph.dimension_space_points_occupied_by_child_node_name(
            content_stream_id,
            parent_node_aggregate_id,
            node_name,
            points,
        );
        if !occupied.is_empty() {
            return Err(NodeAggregateCommandError::NodeNameIsAlreadyOccupied {
                node_name: node_name.clone(),
                parent_node_aggregate_id: parent_node_aggregate_id.clone(),
                points: occupied,
            });
        }
        Ok(())
    }

    pub fn require_projected_node_aggregate<'g>(
        &self,
        content_graph: &'g dyn ContentGraph,
        content_stream_id: &ContentStreamId,
        node_aggregate_id: &NodeAggregateId,
    ) -> CommandResult<&'g NodeAggregate> {
        content_graph
            .find_node_aggregate_by_id(content_stream_id, node_aggregate_id)
            .ok_or_else(|| {
                NodeAggregateCommandError::NodeAggregateCurrentlyDoesNotExist(
                    node_aggregate_id.clone(),
                )
            })
    }

    pub fn require_projected_node_aggregate_to_not_exist(
        &self,
        content_graph: &dyn ContentGraph,
        content_stream_id: &ContentStreamId,
        node_aggregate_id: &NodeAggregateId,
    ) -> CommandResult<()> {
        if content_graph.node_aggregate_exists(content_stream_id, node_aggregate_id) {
            return Err(NodeAggregateCommandError::NodeAggregateCurrentlyExists(
                node_aggregate_id.clone(),
            ));
        }
        Ok(())
    }

    /// Every property must be declared by the node type and match its declared type
    pub fn require_property_values_to_match_node_type(
        &self,
        node_type: &NodeType,
        property_values: &PropertyValues,
    ) -> CommandResult<()> {
        for (property, value) in property_values {
            let Some(declaration) = node_type.property(property) else {
                return Err(NodeAggregateCommandError::PropertyCannotBeSet {
                    property: property.clone(),
                    node_type: node_type.name().clone(),
                    reason: "the property is not declared".to_string(),
                });
            };
            if !declaration.accepts(value) {
                return Err(NodeAggregateCommandError::PropertyCannotBeSet {
                    property: property.clone(),
                    node_type: node_type.name().clone(),
                    reason: format!(
                        "the value does not match the declared type \"{}\"",
                        declaration.property_type.as_deref().unwrap_or("any")
                    ),
                });
            }
        }
        Ok(())
    }
}
