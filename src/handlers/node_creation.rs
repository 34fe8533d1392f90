//! CreateNodeAggregateWithNode

use super::NodeAggregateCommandHandler;
use crate::commands::{
    CommandResult, CreateNodeAggregateWithNode, NodeAggregateCommandError,
    NodeAggregateIdsByNodePaths,
};
use crate::dimension_space::{DimensionSpacePoint, DimensionSpacePointSet};
use crate::events::{ContentRepositoryEvent, EventsToPublish, NodeAggregateWithNodeWasCreated};
use crate::node_type::NodeType;
use crate::projections::ContentGraph;
use crate::value_objects::{
    ContentStreamId, NodeAggregateClassification, NodeAggregateId, NodePath, PropertyValues,
    UserId,
};
use std::collections::BTreeSet;

/// What every event of one creation shares
struct CreationContext<'a> {
    content_stream_id: &'a ContentStreamId,
    origin: &'a DimensionSpacePoint,
    covered: &'a DimensionSpacePointSet,
    initiating_user_id: &'a UserId,
    tethered_ids: &'a NodeAggregateIdsByNodePaths,
}

impl NodeAggregateCommandHandler {
    pub(super) fn handle_create_node_aggregate_with_node(
        &self,
        command: &CreateNodeAggregateWithNode,
        content_graph: &dyn ContentGraph,
    ) -> CommandResult<EventsToPublish> {
        let content_stream_id = &command.content_stream_id;
        let origin = &command.origin_dimension_space_point;

        let node_type = self.require_node_type(&command.node_type_name)?;
        self.require_property_values_to_match_node_type(node_type, &command.initial_property_values)?;
        self.require_content_stream_to_exist(content_graph, content_stream_id)?;
        self.require_dimension_space_point_to_exist(origin)?;
        self.require_node_type_to_not_be_abstract(node_type)?;
        self.require_node_type_to_not_be_of_type_root(node_type)?;
        self.require_tethered_descendant_node_types_to_exist(node_type)?;
        self.require_tethered_descendant_node_types_to_not_be_of_type_root(node_type)?;
        if self.ancestor_node_type_constraint_checks {
            self.require_constraints_imposed_by_ancestors_are_met(
                content_graph,
                content_stream_id,
                node_type,
                command.node_name.as_ref(),
                &[&command.parent_node_aggregate_id],
            )?;
        }
        self.require_projected_node_aggregate_to_not_exist(
            content_graph,
            content_stream_id,
            &command.node_aggregate_id,
        )?;

        let parent = self.require_projected_node_aggregate(
            content_graph,
            content_stream_id,
            &command.parent_node_aggregate_id,
        )?;
        let sibling = match &command.succeeding_sibling_node_aggregate_id {
            Some(sibling) => Some(self.require_projected_node_aggregate(
                content_graph,
                content_stream_id,
                sibling,
            )?),
            None => None,
        };
        self.require_node_aggregate_to_cover_dimension_space_point(parent, origin)?;
        if let Some(sibling) = sibling {
            self.require_succeeding_sibling_to_cover_dimension_space_point(sibling, origin)?;
        }

        let covered = self
            .variation_graph
            .specialization_set(origin, true, None)?
            .intersection(&parent.covered_dimension_space_points());

        if let Some(node_name) = &command.node_name {
            self.require_node_name_to_be_unoccupied(
                content_graph,
                content_stream_id,
                Some(node_name),
                &command.parent_node_aggregate_id,
                &covered,
            )?;
            self.require_node_type_to_not_declare_tethered_child_node_name(
                &parent.node_type_name,
                node_name,
            )?;
        }

        self.require_tethered_descendant_ids_to_be_assigned(command, content_graph)?;

        let context = CreationContext {
            content_stream_id,
            origin,
            covered: &covered,
            initiating_user_id: &command.initiating_user_id,
            tethered_ids: &command.tethered_descendant_node_aggregate_ids,
        };
        let mut events: Vec<ContentRepositoryEvent> = vec![NodeAggregateWithNodeWasCreated {
            content_stream_id: content_stream_id.clone(),
            node_aggregate_id: command.node_aggregate_id.clone(),
            node_type_name: command.node_type_name.clone(),
            origin_dimension_space_point: origin.clone(),
            covered_dimension_space_points: covered.clone(),
            parent_node_aggregate_id: command.parent_node_aggregate_id.clone(),
            node_name: command.node_name.clone(),
            initial_property_values: merge_with_defaults(node_type, &command.initial_property_values),
            node_aggregate_classification: NodeAggregateClassification::Regular,
            initiating_user_id: command.initiating_user_id.clone(),
            succeeding_sibling_node_aggregate_id: command.succeeding_sibling_node_aggregate_id.clone(),
        }
        .into()];
        events.extend(self.tethered_descendant_events(
            &context,
            node_type,
            &command.node_aggregate_id,
            None,
        )?);

        tracing::debug!(
            node_aggregate = %command.node_aggregate_id,
            origin = %origin,
            covered = %covered,
            tethered = events.len() - 1,
            "Node aggregate creation decided"
        );
        Ok(self.events_for_content_stream(content_graph, content_stream_id, events))
    }

    /// Every tethered path needs a fresh id, distinct from all others in the command
    fn require_tethered_descendant_ids_to_be_assigned(
        &self,
        command: &CreateNodeAggregateWithNode,
        content_graph: &dyn ContentGraph,
    ) -> CommandResult<()> {
        let tethered_ids = &command.tethered_descendant_node_aggregate_ids;
        if let Some(path) = tethered_ids
            .missing_for_node_type(&command.node_type_name, &self.node_type_manager)
            .into_iter()
            .next()
        {
            return Err(NodeAggregateCommandError::MissingTetheredDescendantId(path));
        }

        let mut seen = BTreeSet::from([&command.node_aggregate_id]);
        for id in tethered_ids.node_aggregate_ids() {
            if !seen.insert(id) {
                return Err(NodeAggregateCommandError::NodeAggregateCurrentlyExists(
                    id.clone(),
                ));
            }
            self.require_projected_node_aggregate_to_not_exist(
                content_graph,
                &command.content_stream_id,
                id,
            )?;
        }
        Ok(())
    }

    /// One event per tethered descendant, parents before children, in declaration order
    fn tethered_descendant_events(
        &self,
        context: &CreationContext<'_>,
        node_type: &NodeType,
        parent_node_aggregate_id: &NodeAggregateId,
        parent_path: Option<&NodePath>,
    ) -> CommandResult<Vec<ContentRepositoryEvent>> {
        let mut events = Vec::new();
        for (node_name, declaration) in node_type.tethered_nodes() {
            let path = match parent_path {
                Some(parent_path) => parent_path.append(node_name),
                None => NodePath::from_name(node_name),
            };
            let node_aggregate_id = context
                .tethered_ids
                .get(&path)
                .ok_or_else(|| NodeAggregateCommandError::MissingTetheredDescendantId(path.clone()))?;
            let tethered_type = self.require_node_type(&declaration.node_type_name)?;

            events.push(
                NodeAggregateWithNodeWasCreated {
                    content_stream_id: context.content_stream_id.clone(),
                    node_aggregate_id: node_aggregate_id.clone(),
                    node_type_name: declaration.node_type_name.clone(),
                    origin_dimension_space_point: context.origin.clone(),
                    covered_dimension_space_points: context.covered.clone(),
                    parent_node_aggregate_id: parent_node_aggregate_id.clone(),
                    node_name: Some(node_name.clone()),
                    initial_property_values: merge_with_defaults(
                        tethered_type,
                        &PropertyValues::new(),
                    ),
                    node_aggregate_classification: NodeAggregateClassification::Tethered,
                    initiating_user_id: context.initiating_user_id.clone(),
                    succeeding_sibling_node_aggregate_id: None,
                }
                .into(),
            );
            events.extend(self.tethered_descendant_events(
                context,
                tethered_type,
                node_aggregate_id,
                Some(&path),
            )?);
        }
        Ok(events)
    }
}

/// Node type defaults, overridden by the given values
fn merge_with_defaults(node_type: &NodeType, values: &PropertyValues) -> PropertyValues {
    let mut merged: PropertyValues = node_type
        .default_property_values()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect();
    merged.extend(values.iter().map(|(name, value)| (name.clone(), value.clone())));
    merged
}
