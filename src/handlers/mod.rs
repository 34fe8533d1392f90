//! Node aggregate command handling
//!
//! The handler decides which events a command produces. It reads the current state
//! through a [`ContentGraph`] and never writes anything itself: the returned
//! [`EventsToPublish`] carries the version the content stream must still be at when
//! the events are appended.

mod constraint_checks;
mod node_creation;
mod node_duplication;

pub use node_duplication::copy_subtree_events;

use crate::commands::{
    CommandResult, ContentRepositoryCommand, CreateContentStream, CreateRootNodeAggregateWithNode,
    NodeAggregateCommandError,
};
use crate::events::{
    ContentRepositoryEvent, ContentStreamWasCreated, EventStreamName, EventsToPublish,
    ExpectedVersion, RootNodeAggregateWithNodeWasCreated,
};
use crate::node_type::NodeTypeManager;
use crate::projections::ContentGraph;
use crate::value_objects::{ContentStreamId, NodeAggregateClassification};
use crate::variation::InterDimensionalVariationGraph;
use std::sync::Arc;
use tracing::{debug, warn};

/// Command handler for content streams and node aggregates
#[derive(Debug, Clone)]
pub struct NodeAggregateCommandHandler {
    variation_graph: Arc<InterDimensionalVariationGraph>,
    node_type_manager: Arc<NodeTypeManager>,
    ancestor_node_type_constraint_checks: bool,
}

impl NodeAggregateCommandHandler {
    /// Create a handler with ancestor node type constraint checks enabled
    pub fn new(
        variation_graph: Arc<InterDimensionalVariationGraph>,
        node_type_manager: Arc<NodeTypeManager>,
    ) -> Self {
        Self {
            variation_graph,
            node_type_manager,
            ancestor_node_type_constraint_checks: true,
        }
    }

    pub fn with_ancestor_node_type_constraint_checks(mut self, enabled: bool) -> Self {
        self.ancestor_node_type_constraint_checks = enabled;
        self
    }

    pub fn variation_graph(&self) -> &Arc<InterDimensionalVariationGraph> {
        &self.variation_graph
    }

    pub fn node_type_manager(&self) -> &Arc<NodeTypeManager> {
        &self.node_type_manager
    }

    pub fn ancestor_node_type_constraint_checks(&self) -> bool {
        self.ancestor_node_type_constraint_checks
    }

    /// Decide the events for a command, or reject it without side effects
    pub fn handle(
        &self,
        command: &ContentRepositoryCommand,
        content_graph: &dyn ContentGraph,
    ) -> CommandResult<EventsToPublish> {
        let result = match command {
            ContentRepositoryCommand::CreateContentStream(command) => {
                self.handle_create_content_stream(command, content_graph)
            }
            ContentRepositoryCommand::CreateRootNodeAggregateWithNode(command) => {
                self.handle_create_root_node_aggregate_with_node(command, content_graph)
            }
            ContentRepositoryCommand::CreateNodeAggregateWithNode(command) => {
                self.handle_create_node_aggregate_with_node(command, content_graph)
            }
            ContentRepositoryCommand::CopyNodesRecursively(command) => {
                self.handle_copy_nodes_recursively(command, content_graph)
            }
        };

        match &result {
            Ok(events) => debug!(
                command_type = command.command_type(),
                content_stream = %command.content_stream_id(),
                events = events.events.len(),
                "Command accepted"
            ),
            Err(error) => warn!(
                command_type = command.command_type(),
                content_stream = %command.content_stream_id(),
                kind = ?error.kind(),
                %error,
                "Command rejected"
            ),
        }
        result
    }

    fn handle_create_content_stream(
        &self,
        command: &CreateContentStream,
        content_graph: &dyn ContentGraph,
    ) -> CommandResult<EventsToPublish> {
        self.require_content_stream_to_not_exist(content_graph, &command.content_stream_id)?;

        Ok(EventsToPublish::new(
            EventStreamName::for_content_stream(&command.content_stream_id),
            vec![ContentStreamWasCreated {
                content_stream_id: command.content_stream_id.clone(),
                initiating_user_id: command.initiating_user_id.clone(),
            }
            .into()],
            ExpectedVersion::NoStream,
        ))
    }

    fn handle_create_root_node_aggregate_with_node(
        &self,
        command: &CreateRootNodeAggregateWithNode,
        content_graph: &dyn ContentGraph,
    ) -> CommandResult<EventsToPublish> {
        self.require_content_stream_to_exist(content_graph, &command.content_stream_id)?;
        let node_type = self.require_node_type(&command.node_type_name)?;
        self.require_node_type_to_be_of_type_root(node_type)?;
        self.require_root_node_type_to_be_unoccupied(content_graph, command)?;
        self.require_projected_node_aggregate_to_not_exist(
            content_graph,
            &command.content_stream_id,
            &command.node_aggregate_id,
        )?;

        let event = RootNodeAggregateWithNodeWasCreated {
            content_stream_id: command.content_stream_id.clone(),
            node_aggregate_id: command.node_aggregate_id.clone(),
            node_type_name: command.node_type_name.clone(),
            covered_dimension_space_points: self.variation_graph.allowed_subspace().clone(),
            node_aggregate_classification: NodeAggregateClassification::Root,
            initiating_user_id: command.initiating_user_id.clone(),
        };
        Ok(self.events_for_content_stream(
            content_graph,
            &command.content_stream_id,
            vec![event.into()],
        ))
    }

    fn require_root_node_type_to_be_unoccupied(
        &self,
        content_graph: &dyn ContentGraph,
        command: &CreateRootNodeAggregateWithNode,
    ) -> CommandResult<()> {
        if content_graph
            .find_root_node_aggregate_by_type(&command.content_stream_id, &command.node_type_name)
            .is_some()
        {
            return Err(NodeAggregateCommandError::RootNodeAggregateTypeIsAlreadyOccupied(
                command.node_type_name.clone(),
            ));
        }
        Ok(())
    }

    /// Events for an existing stream, expected to still be at the version the graph has seen
    fn events_for_content_stream(
        &self,
        content_graph: &dyn ContentGraph,
        content_stream_id: &ContentStreamId,
        events: Vec<ContentRepositoryEvent>,
    ) -> EventsToPublish {
        let expected_version = content_graph
            .content_stream_version(content_stream_id)
            .map(ExpectedVersion::Exactly)
            .unwrap_or(ExpectedVersion::NoStream);
        EventsToPublish::new(
            EventStreamName::for_content_stream(content_stream_id),
            events,
            expected_version,
        )
    }
}
