//! Content repository facade
//!
//! Commands for one content stream are handled one at a time; different streams proceed
//! in parallel. Each command is decided against the projection, appended with optimistic
//! concurrency and then applied to the projection before the stream lock is released.

use super::{
    ConfigurationError, ContentRepositoryConfiguration, EventStore, EventStoreError,
    InMemoryEventStore,
};
use crate::commands::{CommandResult, ContentRepositoryCommand, NodeAggregateCommandError};
use crate::events::{EventEnvelope, ExpectedVersion};
use crate::handlers::NodeAggregateCommandHandler;
use crate::projections::{
    ContentGraph, ContentGraphProjection, InMemoryContentGraph, ProjectionError,
};
use crate::value_objects::ContentStreamId;
use crate::variation::InterDimensionalVariationGraph;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};

/// Errors raised while rebuilding the projection
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RebuildError {
    #[error(transparent)]
    EventStore(#[from] EventStoreError),

    #[error(transparent)]
    Projection(#[from] ProjectionError),
}

/// Entry point for writing to and reading from a content repository
pub struct ContentRepository {
    handler: RwLock<Arc<NodeAggregateCommandHandler>>,
    event_store: Arc<dyn EventStore>,
    content_graph: RwLock<InMemoryContentGraph>,
    stream_locks: Mutex<HashMap<ContentStreamId, Arc<tokio::sync::Mutex<()>>>>,
}

impl ContentRepository {
    pub fn new(
        configuration: &ContentRepositoryConfiguration,
        event_store: Arc<dyn EventStore>,
    ) -> Result<Self, ConfigurationError> {
        Ok(Self::with_command_handler(
            configuration.build_command_handler()?,
            event_store,
        ))
    }

    /// A repository backed by an [`InMemoryEventStore`]
    pub fn in_memory(configuration: &ContentRepositoryConfiguration) -> Result<Self, ConfigurationError> {
        Self::new(configuration, Arc::new(InMemoryEventStore::new()))
    }

    pub fn with_command_handler(
        handler: NodeAggregateCommandHandler,
        event_store: Arc<dyn EventStore>,
    ) -> Self {
        Self {
            handler: RwLock::new(Arc::new(handler)),
            event_store,
            content_graph: RwLock::new(InMemoryContentGraph::new()),
            stream_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Handle a command and return the events it produced, as persisted
    #[instrument(skip_all, fields(command_type = command.command_type()))]
    pub async fn handle(
        &self,
        command: ContentRepositoryCommand,
    ) -> CommandResult<Vec<EventEnvelope>> {
        let content_stream_id = command.content_stream_id().clone();
        let stream_lock = self.stream_lock(&content_stream_id);
        let _guard = stream_lock.lock().await;

        let handler = self.command_handler();
        let events = {
            let content_graph = self.content_graph.read();
            handler.handle(&command, &*content_graph)?
        };

        let envelopes = self
            .event_store
            .append(events)
            .await
            .map_err(|error| match error {
                EventStoreError::ConcurrencyConflict {
                    expected, actual, ..
                } => NodeAggregateCommandError::ConcurrencyConflict {
                    content_stream_id: content_stream_id.clone(),
                    expected: expected.to_string(),
                    actual,
                },
                EventStoreError::EmptyBatch(stream) => NodeAggregateCommandError::InvariantBug(
                    format!("command produced no events for stream \"{stream}\""),
                ),
            })?;

        {
            let mut content_graph = self.content_graph.write();
            for envelope in &envelopes {
                content_graph.apply(envelope).map_err(|error| {
                    NodeAggregateCommandError::InvariantBug(format!(
                        "persisted event could not be projected: {error}"
                    ))
                })?;
            }
        }

        info!(
            content_stream = %content_stream_id,
            events = envelopes.len(),
            "Command handled"
        );
        Ok(envelopes)
    }

    /// Replace the variation graph and node types; commands already running keep the old ones
    pub fn reconfigure(
        &self,
        configuration: &ContentRepositoryConfiguration,
    ) -> Result<(), ConfigurationError> {
        let handler = configuration.build_command_handler()?;
        *self.handler.write() = Arc::new(handler);
        info!("Content repository reconfigured");
        Ok(())
    }

    /// Rebuild the projection from the event store and swap it in
    ///
    /// Holds no stream lock; call it while no commands are being handled.
    pub async fn rebuild_projection(&self) -> Result<usize, RebuildError> {
        let envelopes = self.event_store.load_all().await?;

        let mut projection = InMemoryContentGraph::new();
        projection.reset().await?;
        for envelope in &envelopes {
            projection.handle_event(envelope).await?;
        }
        info!(events = envelopes.len(), "Content graph projection rebuilt");
        *self.content_graph.write() = projection;
        Ok(envelopes.len())
    }

    pub fn command_handler(&self) -> Arc<NodeAggregateCommandHandler> {
        self.handler.read().clone()
    }

    pub fn variation_graph(&self) -> Arc<InterDimensionalVariationGraph> {
        self.command_handler().variation_graph().clone()
    }

    pub fn event_store(&self) -> &Arc<dyn EventStore> {
        &self.event_store
    }

    /// Run a query against the current projection
    pub fn read_content_graph<R>(&self, query: impl FnOnce(&InMemoryContentGraph) -> R) -> R {
        query(&self.content_graph.read())
    }

    /// The expected version a command decided now would carry
    pub fn expected_version(&self, content_stream_id: &ContentStreamId) -> ExpectedVersion {
        self.content_graph
            .read()
            .content_stream_version(content_stream_id)
            .map(ExpectedVersion::Exactly)
            .unwrap_or(ExpectedVersion::NoStream)
    }

    fn stream_lock(&self, content_stream_id: &ContentStreamId) -> Arc<tokio::sync::Mutex<()>> {
        self.stream_locks
            .lock()
            .entry(content_stream_id.clone())
            .or_default()
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::CreateContentStream;

    /// Test Coverage
    ///
    /// ```mermaid
    /// graph TD
    ///     R[Content Repository] --> H[Handle]
    ///     H --> P[Projection Updated]
    ///     R --> B[Rebuild Projection]
    ///     R --> C[Reconfigure]
    /// ```

    fn create_stream(id: &str) -> ContentRepositoryCommand {
        CreateContentStream {
            content_stream_id: id.into(),
            initiating_user_id: "editor".into(),
        }
        .into()
    }

    #[tokio::test]
    async fn test_handle_updates_the_projection() {
        let repository = ContentRepository::in_memory(&ContentRepositoryConfiguration::default()).unwrap();

        let envelopes = repository.handle(create_stream("cs")).await.unwrap();
        assert_eq!(envelopes.len(), 1);
        assert_eq!(envelopes[0].version, 1);
        assert_eq!(repository.expected_version(&"cs".into()), ExpectedVersion::Exactly(1));

        let error = repository.handle(create_stream("cs")).await.unwrap_err();
        assert_eq!(error, NodeAggregateCommandError::ContentStreamAlreadyExists("cs".into()));
    }

    #[tokio::test]
    async fn test_rebuild_projection_replays_the_store() {
        let event_store = Arc::new(InMemoryEventStore::new());
        let repository =
            ContentRepository::new(&ContentRepositoryConfiguration::default(), event_store.clone())
                .unwrap();
        repository.handle(create_stream("a")).await.unwrap();
        repository.handle(create_stream("b")).await.unwrap();

        let fresh = ContentRepository::new(&ContentRepositoryConfiguration::default(), event_store)
            .unwrap();
        assert_eq!(fresh.expected_version(&"a".into()), ExpectedVersion::NoStream);
        assert_eq!(fresh.rebuild_projection().await.unwrap(), 2);
        assert_eq!(fresh.expected_version(&"a".into()), ExpectedVersion::Exactly(1));
        assert_eq!(fresh.expected_version(&"b".into()), ExpectedVersion::Exactly(1));
    }

    #[tokio::test]
    async fn test_reconfigure_swaps_the_variation_graph() {
        let repository = ContentRepository::in_memory(&ContentRepositoryConfiguration::default()).unwrap();
        assert_eq!(repository.variation_graph().subgraph_count(), 1);

        let configuration = ContentRepositoryConfiguration::from_yaml_str(
            r#"
contentDimensions:
  language:
    defaultValue: mul
    values:
      mul:
        specializations:
          de: {}
"#,
        )
        .unwrap();
        repository.reconfigure(&configuration).unwrap();
        assert_eq!(repository.variation_graph().subgraph_count(), 2);
    }
}
