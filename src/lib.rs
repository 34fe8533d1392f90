//! Multi-dimensional, event-sourced content graph
//!
//! Content exists in variants along configurable dimensions such as language or market.
//! This crate builds the inter-dimensional variation graph from the dimension
//! configuration and uses it to decide how node aggregates are created and duplicated:
//! which dimension space points a new node covers and which constraints it must meet.
//! Decisions are emitted as events and appended to per-content-stream event streams.

pub mod commands;
pub mod dimension;
pub mod dimension_space;
pub mod events;
pub mod handlers;
pub mod infrastructure;
pub mod node_type;
pub mod projections;
pub mod value_objects;
pub mod variation;

// Re-export dimension types
pub use dimension::{
    ContentDimension, ContentDimensionId, ContentDimensionSource, ContentDimensionValue,
    DimensionError,
};
pub use dimension_space::{ContentDimensionZookeeper, DimensionSpacePoint, DimensionSpacePointSet};

// Re-export the variation graph
pub use variation::{
    ContentSubgraph, InterDimensionalVariationGraph, VariantType, VariationGraphError,
    VariationWeight,
};

// Re-export node types
pub use node_type::{NodeType, NodeTypeError, NodeTypeManager};

// Re-export commands and events
pub use commands::{
    CommandResult, ContentRepositoryCommand, CopyNodesRecursively, CreateContentStream,
    CreateNodeAggregateWithNode, CreateRootNodeAggregateWithNode, ErrorKind,
    NodeAggregateCommandError, NodeAggregateIdMapping, NodeAggregateIdsByNodePaths,
    NodeSubtreeSnapshot,
};
pub use events::{
    ContentRepositoryEvent, EventEnvelope, EventStreamName, EventsToPublish, ExpectedVersion,
};

// Re-export handlers, projections and infrastructure
pub use handlers::NodeAggregateCommandHandler;
pub use infrastructure::{
    ContentRepository, ContentRepositoryConfiguration, EventStore, EventStoreError,
    InMemoryEventStore,
};
pub use projections::{ContentGraph, ContentGraphProjection, InMemoryContentGraph, NodeAggregate};

// Re-export value objects
pub use value_objects::{
    ContentStreamId, NodeAggregateClassification, NodeAggregateId, NodeName, NodePath,
    NodeTypeName, PropertyValues, UserId,
};
