//! Content repository events
//!
//! Events are immutable facts. Within one content stream their order is the only
//! consistency mechanism; payloads carry no timestamps so replaying them is
//! deterministic. Recording time lives on the [`EventEnvelope`].

mod node_aggregate_events;

pub use node_aggregate_events::{
    ContentStreamWasCreated, NodeAggregateWithNodeWasCreated, RootNodeAggregateWithNodeWasCreated,
};

use crate::value_objects::{ContentStreamId, NodeAggregateId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Enum wrapper for content repository events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ContentRepositoryEvent {
    /// A content stream was opened
    ContentStreamWasCreated(ContentStreamWasCreated),
    /// The root node aggregate of a content stream was created
    RootNodeAggregateWithNodeWasCreated(RootNodeAggregateWithNodeWasCreated),
    /// A node aggregate was created with its first node
    NodeAggregateWithNodeWasCreated(NodeAggregateWithNodeWasCreated),
}

impl ContentRepositoryEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::ContentStreamWasCreated(_) => "ContentStreamWasCreated",
            Self::RootNodeAggregateWithNodeWasCreated(_) => "RootNodeAggregateWithNodeWasCreated",
            Self::NodeAggregateWithNodeWasCreated(_) => "NodeAggregateWithNodeWasCreated",
        }
    }

    pub fn content_stream_id(&self) -> &ContentStreamId {
        match self {
            Self::ContentStreamWasCreated(e) => &e.content_stream_id,
            Self::RootNodeAggregateWithNodeWasCreated(e) => &e.content_stream_id,
            Self::NodeAggregateWithNodeWasCreated(e) => &e.content_stream_id,
        }
    }

    /// The node aggregate the event is about, if any
    pub fn node_aggregate_id(&self) -> Option<&NodeAggregateId> {
        match self {
            Self::ContentStreamWasCreated(_) => None,
            Self::RootNodeAggregateWithNodeWasCreated(e) => Some(&e.node_aggregate_id),
            Self::NodeAggregateWithNodeWasCreated(e) => Some(&e.node_aggregate_id),
        }
    }
}

impl From<ContentStreamWasCreated> for ContentRepositoryEvent {
    fn from(event: ContentStreamWasCreated) -> Self {
        Self::ContentStreamWasCreated(event)
    }
}

impl From<RootNodeAggregateWithNodeWasCreated> for ContentRepositoryEvent {
    fn from(event: RootNodeAggregateWithNodeWasCreated) -> Self {
        Self::RootNodeAggregateWithNodeWasCreated(event)
    }
}

impl From<NodeAggregateWithNodeWasCreated> for ContentRepositoryEvent {
    fn from(event: NodeAggregateWithNodeWasCreated) -> Self {
        Self::NodeAggregateWithNodeWasCreated(event)
    }
}

/// Name of an event stream, e.g. `ContentStream:cs-1`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventStreamName(String);

impl EventStreamName {
    pub fn for_content_stream(content_stream_id: &ContentStreamId) -> Self {
        Self(format!("ContentStream:{content_stream_id}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventStreamName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The stream version an append expects to find
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpectedVersion {
    /// Append regardless of the current version
    Any,
    /// The stream must not contain any events yet
    NoStream,
    /// The stream's last event must have exactly this version
    Exactly(u64),
}

impl ExpectedVersion {
    /// Check against the current version, 0 meaning an empty stream
    pub fn is_satisfied_by(&self, current: u64) -> bool {
        match self {
            Self::Any => true,
            Self::NoStream => current == 0,
            Self::Exactly(expected) => *expected == current,
        }
    }
}

impl fmt::Display for ExpectedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => write!(f, "any"),
            Self::NoStream => write!(f, "no stream"),
            Self::Exactly(version) => write!(f, "{version}"),
        }
    }
}

/// A command handler's decision: events to append atomically to one stream
#[derive(Debug, Clone, PartialEq)]
pub struct EventsToPublish {
    pub stream_name: EventStreamName,
    pub events: Vec<ContentRepositoryEvent>,
    pub expected_version: ExpectedVersion,
}

impl EventsToPublish {
    pub fn new(
        stream_name: EventStreamName,
        events: Vec<ContentRepositoryEvent>,
        expected_version: ExpectedVersion,
    ) -> Self {
        Self {
            stream_name,
            events,
            expected_version,
        }
    }
}

/// A persisted event with its position in the stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub stream_name: EventStreamName,
    /// 1-based position of the event in its stream
    pub version: u64,
    /// Position across all streams of the store
    pub sequence: u64,
    pub event: ContentRepositoryEvent,
    pub recorded_at: DateTime<Utc>,
}
