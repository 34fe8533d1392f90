//! Infrastructure layer implementations
//!
//! Event persistence, repository configuration and the [`ContentRepository`] facade that
//! wires the command handler, the event store and the content graph projection together.

mod configuration;
mod content_repository;
mod event_store_impl;

pub use configuration::{ConfigurationError, ContentRepositoryConfiguration};
pub use content_repository::{ContentRepository, RebuildError};
pub use event_store_impl::InMemoryEventStore;

use crate::events::{EventEnvelope, EventStreamName, EventsToPublish, ExpectedVersion};
use async_trait::async_trait;

/// Result type for event store operations
pub type EventStoreResult<T> = Result<T, EventStoreError>;

/// Errors raised by event stores
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EventStoreError {
    #[error("Stream \"{stream}\" expected version {expected}, found {actual}")]
    ConcurrencyConflict {
        stream: EventStreamName,
        expected: ExpectedVersion,
        actual: u64,
    },

    #[error("Cannot append an empty batch to stream \"{0}\"")]
    EmptyBatch(EventStreamName),
}

/// Append-only storage of event streams
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Append a batch atomically if the stream is at the expected version
    async fn append(&self, events: EventsToPublish) -> EventStoreResult<Vec<EventEnvelope>>;

    /// All events of one stream, in stream order
    async fn load(&self, stream: &EventStreamName) -> EventStoreResult<Vec<EventEnvelope>>;

    /// All events of the store, in append order
    async fn load_all(&self) -> EventStoreResult<Vec<EventEnvelope>>;

    /// Version of the stream's last event; 0 for an empty stream
    async fn current_version(&self, stream: &EventStreamName) -> EventStoreResult<u64>;
}
