//! CopyNodesRecursively

use super::NodeAggregateCommandHandler;
use crate::commands::{
    CommandResult, CopyNodesRecursively, NodeAggregateCommandError, NodeSubtreeSnapshot,
};
use crate::dimension_space::DimensionSpacePointSet;
use crate::events::{ContentRepositoryEvent, EventsToPublish, NodeAggregateWithNodeWasCreated};
use crate::projections::ContentGraph;
use crate::value_objects::NodeAggregateId;
use std::collections::BTreeSet;

impl NodeAggregateCommandHandler {
    pub(super) fn handle_copy_nodes_recursively(
        &self,
        command: &CopyNodesRecursively,
        content_graph: &dyn ContentGraph,
    ) -> CommandResult<EventsToPublish> {
        let content_stream_id = &command.content_stream_id;
        let target_point = &command.target_dimension_space_point;
        let root = &command.node_to_insert;

        self.require_content_stream_to_exist(content_graph, content_stream_id)?;
        self.require_dimension_space_point_to_exist(target_point)?;
        let node_type = self.require_node_type(&root.node_type_name)?;
        self.require_node_type_to_not_be_of_type_root(node_type)?;

        let node_name = command.target_node_name.as_ref().or(root.node_name.as_ref());
        if self.ancestor_node_type_constraint_checks {
            self.require_constraints_imposed_by_ancestors_are_met(
                content_graph,
                content_stream_id,
                node_type,
                node_name,
                &[&command.target_parent_node_aggregate_id],
            )?;
        }
        self.require_new_node_aggregate_ids_to_be_assigned(command, content_graph)?;

        let parent = self.require_projected_node_aggregate(
            content_graph,
            content_stream_id,
            &command.target_parent_node_aggregate_id,
        )?;
        let sibling = match &command.target_succeeding_sibling_node_aggregate_id {
            Some(sibling) => Some(self.require_projected_node_aggregate(
                content_graph,
                content_stream_id,
                sibling,
            )?),
            None => None,
        };
        self.require_node_aggregate_to_cover_dimension_space_point(parent, target_point)?;
        if let Some(sibling) = sibling {
            self.require_succeeding_sibling_to_cover_dimension_space_point(sibling, target_point)?;
        }

        let covered = self
            .variation_graph
            .specialization_set(target_point, true, None)?
            .intersection(&parent.covered_dimension_space_points());
        self.require_node_name_to_be_unoccupied(
            content_graph,
            content_stream_id,
            node_name,
            &command.target_parent_node_aggregate_id,
            &covered,
        )?;
        self.require_tethered_snapshot_nodes_to_be_declared(root)?;

        let events = copy_subtree_events(command, &covered)?;
        tracing::debug!(
            source = %root.node_aggregate_id,
            target_parent = %command.target_parent_node_aggregate_id,
            nodes = events.len(),
            "Subtree duplication decided"
        );
        Ok(self.events_for_content_stream(content_graph, content_stream_id, events))
    }

    /// Every snapshot node needs a new id that is unused and unique within the copy
    fn require_new_node_aggregate_ids_to_be_assigned(
        &self,
        command: &CopyNodesRecursively,
        content_graph: &dyn ContentGraph,
    ) -> CommandResult<()> {
        let mapping = &command.node_aggregate_id_mapping;
        let missing = mapping.missing_for(&command.node_to_insert);
        if !missing.is_empty() {
            return Err(NodeAggregateCommandError::IncompleteNodeAggregateIdMapping(
                missing.into_iter().cloned().collect(),
            ));
        }

        let mut seen = BTreeSet::new();
        for node in command.node_to_insert.iter() {
            let Some(new_id) = mapping.get_new_node_aggregate_id(&node.node_aggregate_id) else {
                continue;
            };
            if !seen.insert(new_id) {
                return Err(NodeAggregateCommandError::NodeAggregateCurrentlyExists(
                    new_id.clone(),
                ));
            }
            self.require_projected_node_aggregate_to_not_exist(
                content_graph,
                &command.content_stream_id,
                new_id,
            )?;
        }
        Ok(())
    }

    /// Tethered snapshot nodes must match a tethered declaration of their parent's type
    fn require_tethered_snapshot_nodes_to_be_declared(
        &self,
        snapshot: &NodeSubtreeSnapshot,
    ) -> CommandResult<()> {
        for node in snapshot.iter() {
            let Some(node_type) = self.node_type_manager.get_node_type(&node.node_type_name) else {
                continue;
            };
            for child in node
                .child_nodes
                .iter()
                .filter(|child| child.node_aggregate_classification.is_tethered())
            {
                let declared = child
                    .node_name
                    .as_ref()
                    .and_then(|name| node_type.tethered_node(name))
                    .is_some_and(|declaration| declaration.node_type_name == child.node_type_name);
                if !declared {
                    return Err(NodeAggregateCommandError::InvariantBug(format!(
                        "tethered node \"{}\" of type \"{}\" is not declared by \"{}\"",
                        child.node_aggregate_id, child.node_type_name, node.node_type_name
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Creation events for a subtree copy, parents before children
///
/// Every node originates in the target point and covers `covered`. Children are attached
/// to the new id of their snapshot parent; only the copied root is placed before the
/// target sibling and may be renamed. Fails if the id mapping misses a node.
pub fn copy_subtree_events(
    command: &CopyNodesRecursively,
    covered: &DimensionSpacePointSet,
) -> CommandResult<Vec<ContentRepositoryEvent>> {
    copy_events(
        command,
        covered,
        &command.node_to_insert,
        &command.target_parent_node_aggregate_id,
        true,
    )
}

/// The node's own event followed by the events of each child subtree
fn copy_events(
    command: &CopyNodesRecursively,
    covered: &DimensionSpacePointSet,
    node: &NodeSubtreeSnapshot,
    parent_node_aggregate_id: &NodeAggregateId,
    is_root: bool,
) -> CommandResult<Vec<ContentRepositoryEvent>> {
    let new_id = command
        .node_aggregate_id_mapping
        .get_new_node_aggregate_id(&node.node_aggregate_id)
        .ok_or_else(|| {
            NodeAggregateCommandError::IncompleteNodeAggregateIdMapping(vec![
                node.node_aggregate_id.clone(),
            ])
        })?;

    let (node_name, succeeding_sibling) = if is_root {
        (
            command.target_node_name.clone().or_else(|| node.node_name.clone()),
            command.target_succeeding_sibling_node_aggregate_id.clone(),
        )
    } else {
        (node.node_name.clone(), None)
    };

    let mut events: Vec<ContentRepositoryEvent> = vec![NodeAggregateWithNodeWasCreated {
        content_stream_id: command.content_stream_id.clone(),
        node_aggregate_id: new_id.clone(),
        node_type_name: node.node_type_name.clone(),
        origin_dimension_space_point: command.target_dimension_space_point.clone(),
        covered_dimension_space_points: covered.clone(),
        parent_node_aggregate_id: parent_node_aggregate_id.clone(),
        node_name,
        initial_property_values: node.property_values.clone(),
        node_aggregate_classification: node.node_aggregate_classification,
        initiating_user_id: command.initiating_user_id.clone(),
        succeeding_sibling_node_aggregate_id: succeeding_sibling,
    }
    .into()];

    for child in &node.child_nodes {
        events.extend(copy_events(command, covered, child, new_id, false)?);
    }
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::super::fixture::*;
    use super::*;
    use crate::commands::{ErrorKind, NodeAggregateIdMapping};
    use crate::value_objects::{NodeAggregateClassification, NodeName};
    use serde_json::json;

    /// Test Coverage
    ///
    /// ```mermaid
    /// graph TD
    ///     D[Duplicate Subtree] --> O[Pre-order Events]
    ///     O --> P[Parents Remapped]
    ///     D --> M[Id Mapping]
    ///     D --> N[Node Name Occupation]
    ///     D --> T[Tethered Invariant]
    /// ```

    fn snapshot() -> NodeSubtreeSnapshot {
        NodeSubtreeSnapshot::leaf("text", "Acme:Text", NodeName::new("intro").ok())
            .with_property("text", json!("Hallo"))
            .with_child(NodeSubtreeSnapshot::leaf("child", "Acme:Text", None))
    }

    fn mapping() -> NodeAggregateIdMapping {
        NodeAggregateIdMapping::new([
            ("text".into(), "text-copy".into()),
            ("child".into(), "child-copy".into()),
        ])
    }

    fn copy(snapshot: NodeSubtreeSnapshot, point: &str) -> CopyNodesRecursively {
        CopyNodesRecursively::create_from_snapshot(
            "cs".into(),
            snapshot,
            super::super::fixture::point(point),
            "home-main".into(),
        )
        .with_node_aggregate_id_mapping(mapping())
    }

    fn created(events: &[ContentRepositoryEvent]) -> Vec<&NodeAggregateWithNodeWasCreated> {
        events
            .iter()
            .filter_map(|event| match event {
                ContentRepositoryEvent::NodeAggregateWithNodeWasCreated(event) => Some(event),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_root_and_child_are_copied_in_order() {
        let (handler, content_graph) = site();
        let command = copy(snapshot(), "de");

        let events = handler.handle(&command.into(), &content_graph).unwrap();
        let events = created(&events.events);

        assert_eq!(events.len(), 2);
        let (root, child) = (events[0], events[1]);
        assert_eq!(root.node_aggregate_id.as_str(), "text-copy");
        assert_eq!(root.parent_node_aggregate_id.as_str(), "home-main");
        assert_eq!(root.initial_property_values["text"], json!("Hallo"));
        assert_eq!(child.node_aggregate_id.as_str(), "child-copy");
        assert_eq!(child.parent_node_aggregate_id.as_str(), "text-copy");
        assert_eq!(child.origin_dimension_space_point, point("de"));
        assert_eq!(
            child.covered_dimension_space_points,
            DimensionSpacePointSet::new([point("de"), point("gsw")])
        );
    }

    #[test]
    fn test_only_the_root_carries_sibling_and_target_name() {
        let command = copy(snapshot(), "de")
            .with_target_succeeding_sibling("sibling".into())
            .with_target_node_name(NodeName::new("renamed").unwrap());
        let covered = DimensionSpacePointSet::new([point("de")]);

        let events = copy_subtree_events(&command, &covered).unwrap();
        let events = created(&events);

        assert_eq!(
            events[0].succeeding_sibling_node_aggregate_id.as_ref().map(|id| id.as_str()),
            Some("sibling")
        );
        assert_eq!(events[0].node_name.as_ref().map(NodeName::as_str), Some("renamed"));
        assert_eq!(events[1].succeeding_sibling_node_aggregate_id, None);
        assert_eq!(events[1].node_name, None);
    }

    #[test]
    fn test_deep_subtree_is_emitted_in_pre_order() {
        let snapshot = NodeSubtreeSnapshot::leaf("a", "Acme:Text", None)
            .with_child(
                NodeSubtreeSnapshot::leaf("b", "Acme:Text", None)
                    .with_child(NodeSubtreeSnapshot::leaf("c", "Acme:Text", None)),
            )
            .with_child(NodeSubtreeSnapshot::leaf("d", "Acme:Text", None));
        let command = CopyNodesRecursively::create_from_snapshot(
            "cs".into(),
            snapshot,
            point("de"),
            "target".into(),
        );

        let events = copy_subtree_events(&command, &DimensionSpacePointSet::new([point("de")]))
            .unwrap();
        let mapping = &command.node_aggregate_id_mapping;
        let new_id = |old: &str| mapping.get_new_node_aggregate_id(&old.into()).unwrap().clone();

        let order: Vec<(NodeAggregateId, NodeAggregateId)> = created(&events)
            .iter()
            .map(|event| (event.node_aggregate_id.clone(), event.parent_node_aggregate_id.clone()))
            .collect();
        let expected: Vec<(NodeAggregateId, NodeAggregateId)> = vec![
            (new_id("a"), "target".into()),
            (new_id("b"), new_id("a")),
            (new_id("c"), new_id("b")),
            (new_id("d"), new_id("a")),
        ];
        assert_eq!(order, expected);
    }

    #[test]
    fn test_incomplete_mapping_is_rejected() {
        let (handler, content_graph) = site();
        let command = copy(snapshot(), "de").with_node_aggregate_id_mapping(
            NodeAggregateIdMapping::new([("text".into(), "text-copy".into())]),
        );

        let error = handler.handle(&command.into(), &content_graph).unwrap_err();
        assert_eq!(
            error,
            NodeAggregateCommandError::IncompleteNodeAggregateIdMapping(vec!["child".into()])
        );
        assert_eq!(error.kind(), ErrorKind::PreconditionViolation);
    }

    #[test]
    fn test_new_ids_must_not_exist() {
        let (handler, content_graph) = site();
        let command = copy(snapshot(), "de").with_node_aggregate_id_mapping(
            NodeAggregateIdMapping::new([
                ("text".into(), "text-copy".into()),
                ("child".into(), "home".into()),
            ]),
        );
        assert_eq!(
            handler.handle(&command.into(), &content_graph).unwrap_err(),
            NodeAggregateCommandError::NodeAggregateCurrentlyExists("home".into())
        );

        let duplicated = copy(snapshot(), "de").with_node_aggregate_id_mapping(
            NodeAggregateIdMapping::new([
                ("text".into(), "same".into()),
                ("child".into(), "same".into()),
            ]),
        );
        assert_eq!(
            handler.handle(&duplicated.into(), &content_graph).unwrap_err(),
            NodeAggregateCommandError::NodeAggregateCurrentlyExists("same".into())
        );
    }

    #[test]
    fn test_name_occupied_in_one_covered_point_emits_nothing() {
        let (handler, mut content_graph) = site();
        let existing = crate::commands::CreateNodeAggregateWithNode::new(
            "cs".into(),
            "swiss-intro".into(),
            "Acme:Text".into(),
            point("gsw"),
            "home-main".into(),
        )
        .with_node_name(NodeName::new("intro").unwrap());
        let to_publish = handler.handle(&existing.into(), &content_graph).unwrap();
        publish(&mut content_graph, to_publish);
        let version = content_graph.content_stream_version(&"cs".into());

        let result = handler.handle(&copy(snapshot(), "de").into(), &content_graph);

        assert!(matches!(
            result,
            Err(NodeAggregateCommandError::NodeNameIsAlreadyOccupied { ref points, .. })
                if points == &DimensionSpacePointSet::new([point("gsw")])
        ));
        assert_eq!(content_graph.content_stream_version(&"cs".into()), version);
    }

    #[test]
    fn test_target_sibling_must_cover_the_target_point() {
        let (handler, mut content_graph) = site();
        let swiss = crate::commands::CreateNodeAggregateWithNode::new(
            "cs".into(),
            "swiss".into(),
            "Acme:Text".into(),
            point("gsw"),
            "home-main".into(),
        );
        let to_publish = handler.handle(&swiss.into(), &content_graph).unwrap();
        publish(&mut content_graph, to_publish);

        let error = handler
            .handle(
                &copy(snapshot(), "de")
                    .with_target_succeeding_sibling("swiss".into())
                    .into(),
                &content_graph,
            )
            .unwrap_err();
        assert_eq!(
            error,
            NodeAggregateCommandError::DimensionSpacePointNotCoveredBySibling {
                node_aggregate_id: "swiss".into(),
                point: point("de"),
            }
        );
        assert_eq!(error.kind(), ErrorKind::ConstraintViolation);

        assert!(handler
            .handle(
                &copy(snapshot(), "gsw")
                    .with_target_succeeding_sibling("swiss".into())
                    .into(),
                &content_graph,
            )
            .is_ok());
    }

    #[test]
    fn test_root_type_cannot_be_copied() {
        let (handler, content_graph) = site();
        let command = CopyNodesRecursively::create_from_snapshot(
            "cs".into(),
            NodeSubtreeSnapshot::leaf("sites", "Acme:Sites", None),
            point("de"),
            "home-main".into(),
        );
        assert_eq!(
            handler.handle(&command.into(), &content_graph).unwrap_err(),
            NodeAggregateCommandError::NodeTypeIsOfTypeRoot("Acme:Sites".into())
        );
    }

    #[test]
    fn test_undeclared_tethered_node_is_an_invariant_bug() {
        let (handler, content_graph) = site();
        let mut stray = NodeSubtreeSnapshot::leaf("stray", "Acme:Text", NodeName::new("main").ok());
        stray.node_aggregate_classification = NodeAggregateClassification::Tethered;
        let command = CopyNodesRecursively::create_from_snapshot(
            "cs".into(),
            NodeSubtreeSnapshot::leaf("text", "Acme:Text", None).with_child(stray),
            point("de"),
            "home-main".into(),
        );

        let error = handler.handle(&command.into(), &content_graph).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvariantBug);
    }

    #[test]
    fn test_snapshot_from_projection_can_be_copied() {
        let (handler, mut content_graph) = site();
        let page = crate::commands::CreateNodeAggregateWithNode::new(
            "cs".into(),
            "about".into(),
            "Acme:Page".into(),
            point("mul"),
            "home".into(),
        )
        .with_node_name(NodeName::new("about").unwrap())
        .with_generated_tethered_descendant_ids(handler.node_type_manager());
        let to_publish = handler.handle(&page.into(), &content_graph).unwrap();
        publish(&mut content_graph, to_publish);

        let snapshot = content_graph
            .node_subtree_snapshot(&"cs".into(), &"about".into(), &point("mul"))
            .unwrap();
        let command = CopyNodesRecursively::create_from_snapshot(
            "cs".into(),
            snapshot,
            point("mul"),
            "home".into(),
        )
        .with_target_node_name(NodeName::new("about-copy").unwrap());

        let events = handler.handle(&command.into(), &content_graph).unwrap();
        let events = created(&events.events);
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].node_aggregate_classification, NodeAggregateClassification::Tethered);
        assert_eq!(events[1].node_name.as_ref().map(NodeName::as_str), Some("main"));
        assert_eq!(events[1].parent_node_aggregate_id, events[0].node_aggregate_id);
    }
}
