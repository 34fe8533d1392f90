//! In-memory event store

use super::{EventStore, EventStoreError, EventStoreResult};
use crate::events::{EventEnvelope, EventStreamName, EventsToPublish};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Debug, Default)]
struct Storage {
    /// Every envelope in append order
    log: Vec<EventEnvelope>,
    /// Positions in `log` per stream
    streams: HashMap<EventStreamName, Vec<usize>>,
}

/// Event store keeping all streams in memory
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    storage: RwLock<Storage>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of events across all streams
    pub fn len(&self) -> usize {
        self.storage.read().log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn append(&self, events: EventsToPublish) -> EventStoreResult<Vec<EventEnvelope>> {
        if events.events.is_empty() {
            return Err(EventStoreError::EmptyBatch(events.stream_name));
        }

        let mut storage = self.storage.write();
        let current = storage
            .streams
            .get(&events.stream_name)
            .map(|positions| positions.len() as u64)
            .unwrap_or(0);
        if !events.expected_version.is_satisfied_by(current) {
            tracing::warn!(
                stream = %events.stream_name,
                expected = %events.expected_version,
                actual = current,
                "Rejected append with stale expected version"
            );
            return Err(EventStoreError::ConcurrencyConflict {
                stream: events.stream_name,
                expected: events.expected_version,
                actual: current,
            });
        }

        let recorded_at = Utc::now();
        let mut envelopes = Vec::with_capacity(events.events.len());
        for (offset, event) in events.events.into_iter().enumerate() {
            let position = storage.log.len();
            let envelope = EventEnvelope {
                stream_name: events.stream_name.clone(),
                version: current + offset as u64 + 1,
                sequence: position as u64 + 1,
                event,
                recorded_at,
            };
            storage.log.push(envelope.clone());
            storage
                .streams
                .entry(events.stream_name.clone())
                .or_default()
                .push(position);
            envelopes.push(envelope);
        }

        tracing::debug!(
            stream = %events.stream_name,
            events = envelopes.len(),
            version = current + envelopes.len() as u64,
            "Events appended"
        );
        Ok(envelopes)
    }

    async fn load(&self, stream: &EventStreamName) -> EventStoreResult<Vec<EventEnvelope>> {
        let storage = self.storage.read();
        Ok(storage
            .streams
            .get(stream)
            .map(|positions| {
                positions
                    .iter()
                    .map(|position| storage.log[*position].clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn load_all(&self) -> EventStoreResult<Vec<EventEnvelope>> {
        Ok(self.storage.read().log.clone())
    }

    async fn current_version(&self, stream: &EventStreamName) -> EventStoreResult<u64> {
        Ok(self
            .storage
            .read()
            .streams
            .get(stream)
            .map(|positions| positions.len() as u64)
            .unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{ContentStreamWasCreated, ExpectedVersion};

    /// Test Coverage
    ///
    /// ```mermaid
    /// graph TD
    ///     A[Append] --> V[Stream Versions]
    ///     A --> S[Store Sequence]
    ///     A --> C[Concurrency Conflict]
    ///     L[Load] --> O[Stream Order]
    /// ```

    fn batch(stream: &str, count: usize, expected_version: ExpectedVersion) -> EventsToPublish {
        let stream_name = EventStreamName::for_content_stream(&stream.into());
        let events = (0..count)
            .map(|_| {
                ContentStreamWasCreated {
                    content_stream_id: stream.into(),
                    initiating_user_id: "editor".into(),
                }
                .into()
            })
            .collect();
        EventsToPublish::new(stream_name, events, expected_version)
    }

    #[tokio::test]
    async fn test_append_assigns_versions_and_sequence() {
        let store = InMemoryEventStore::new();

        let first = store.append(batch("a", 2, ExpectedVersion::NoStream)).await.unwrap();
        let second = store.append(batch("b", 1, ExpectedVersion::NoStream)).await.unwrap();
        let third = store.append(batch("a", 1, ExpectedVersion::Exactly(2))).await.unwrap();

        assert_eq!(first.iter().map(|e| e.version).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(second[0].version, 1);
        assert_eq!(second[0].sequence, 3);
        assert_eq!(third[0].version, 3);
        assert_eq!(third[0].sequence, 4);

        let stream_a = EventStreamName::for_content_stream(&"a".into());
        assert_eq!(store.current_version(&stream_a).await.unwrap(), 3);
        let loaded = store.load(&stream_a).await.unwrap();
        assert_eq!(loaded.iter().map(|e| e.sequence).collect::<Vec<_>>(), vec![1, 2, 4]);
        assert_eq!(store.load_all().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_stale_writer_is_rejected() {
        let store = InMemoryEventStore::new();
        store.append(batch("a", 1, ExpectedVersion::NoStream)).await.unwrap();

        let result = store.append(batch("a", 1, ExpectedVersion::NoStream)).await;
        assert_eq!(
            result,
            Err(EventStoreError::ConcurrencyConflict {
                stream: EventStreamName::for_content_stream(&"a".into()),
                expected: ExpectedVersion::NoStream,
                actual: 1,
            })
        );
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_batch_is_rejected() {
        let store = InMemoryEventStore::new();
        assert!(matches!(
            store.append(batch("a", 0, ExpectedVersion::Any)).await,
            Err(EventStoreError::EmptyBatch(_))
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn test_unknown_stream_is_empty() {
        let store = InMemoryEventStore::new();
        let stream = EventStreamName::for_content_stream(&"missing".into());
        assert_eq!(tokio_test::block_on(store.current_version(&stream)).unwrap(), 0);
        assert!(tokio_test::block_on(store.load(&stream)).unwrap().is_empty());
    }
}
