//! In-memory content graph projection
//!
//! Keeps every content stream's node aggregates with their coverage and hierarchy.
//! Events are applied in stream order; a redelivered event (version not newer than
//! the stream's) is skipped, so at-least-once delivery is safe.

use super::{
    ContentGraph, ContentGraphProjection, NodeAggregate, ProjectionError, ProjectionResult,
};
use crate::commands::NodeSubtreeSnapshot;
use crate::dimension_space::{DimensionSpacePoint, DimensionSpacePointSet};
use crate::events::{
    ContentRepositoryEvent, EventEnvelope, NodeAggregateWithNodeWasCreated,
    RootNodeAggregateWithNodeWasCreated,
};
use crate::value_objects::{
    ContentStreamId, NodeAggregateClassification, NodeAggregateId, NodeName, NodeTypeName,
};
use async_trait::async_trait;
use indexmap::IndexMap;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Default)]
struct ContentStreamGraph {
    version: u64,
    node_aggregates: IndexMap<NodeAggregateId, NodeAggregate>,
}

/// Read model of all content streams, kept in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryContentGraph {
    streams: HashMap<ContentStreamId, ContentStreamGraph>,
    checkpoint: Option<u64>,
}

impl InMemoryContentGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one persisted event; returns `false` if it had been applied before
    pub fn apply(&mut self, envelope: &EventEnvelope) -> ProjectionResult<bool> {
        let content_stream_id = envelope.event.content_stream_id().clone();
        let current = self
            .streams
            .get(&content_stream_id)
            .map(|stream| stream.version)
            .unwrap_or(0);
        if envelope.version <= current {
            tracing::debug!(
                content_stream = %content_stream_id,
                version = envelope.version,
                "Skipping already applied event"
            );
            return Ok(false);
        }
        if envelope.version != current + 1 {
            return Err(ProjectionError::VersionGap {
                content_stream_id,
                expected: current + 1,
                actual: envelope.version,
            });
        }

        match &envelope.event {
            ContentRepositoryEvent::ContentStreamWasCreated(_) => {
                self.streams
                    .insert(content_stream_id.clone(), ContentStreamGraph::default());
            }
            ContentRepositoryEvent::RootNodeAggregateWithNodeWasCreated(event) => {
                self.stream_mut(&content_stream_id)?.apply_root_created(event);
            }
            ContentRepositoryEvent::NodeAggregateWithNodeWasCreated(event) => {
                self.stream_mut(&content_stream_id)?.apply_node_created(event)?;
            }
        }

        self.stream_mut(&content_stream_id)?.version = envelope.version;
        self.checkpoint = Some(envelope.sequence);
        tracing::debug!(
            content_stream = %content_stream_id,
            version = envelope.version,
            event_type = envelope.event.event_type(),
            "Event applied to content graph"
        );
        Ok(true)
    }

    /// All aggregates of a content stream, in creation order
    pub fn node_aggregates(
        &self,
        content_stream_id: &ContentStreamId,
    ) -> impl Iterator<Item = &NodeAggregate> {
        self.streams
            .get(content_stream_id)
            .into_iter()
            .flat_map(|stream| stream.node_aggregates.values())
    }

    /// Children of a parent visible in `point`, in sibling order
    pub fn find_child_node_aggregates(
        &self,
        content_stream_id: &ContentStreamId,
        parent_node_aggregate_id: &NodeAggregateId,
        point: &DimensionSpacePoint,
    ) -> Vec<&NodeAggregate> {
        let Some(stream) = self.streams.get(content_stream_id) else {
            return Vec::new();
        };
        let Some(parent) = stream.node_aggregates.get(parent_node_aggregate_id) else {
            return Vec::new();
        };
        parent
            .child_node_aggregate_ids_in(point)
            .iter()
            .filter_map(|child| stream.node_aggregates.get(child))
            .collect()
    }

    /// Capture the subtree below (and including) an aggregate as visible in `point`
    ///
    /// Properties are taken from the node originating in `point` or, failing that, the
    /// first origin of the aggregate.
    pub fn node_subtree_snapshot(
        &self,
        content_stream_id: &ContentStreamId,
        node_aggregate_id: &NodeAggregateId,
        point: &DimensionSpacePoint,
    ) -> Option<NodeSubtreeSnapshot> {
        let aggregate = self.find_node_aggregate_by_id(content_stream_id, node_aggregate_id)?;
        if !aggregate.covers(point) {
            return None;
        }
        let property_values = aggregate
            .properties_in(point)
            .or_else(|| aggregate.occupation.values().next())
            .cloned()
            .unwrap_or_default();
        let child_nodes = aggregate
            .child_node_aggregate_ids_in(point)
            .iter()
            .filter_map(|child| self.node_subtree_snapshot(content_stream_id, child, point))
            .collect();

        Some(NodeSubtreeSnapshot {
            node_aggregate_id: aggregate.node_aggregate_id.clone(),
            node_type_name: aggregate.node_type_name.clone(),
            node_name: aggregate.node_name.clone(),
            node_aggregate_classification: aggregate.classification,
            property_values,
            child_nodes,
        })
    }

    fn stream_mut(
        &mut self,
        content_stream_id: &ContentStreamId,
    ) -> ProjectionResult<&mut ContentStreamGraph> {
        self.streams
            .get_mut(content_stream_id)
            .ok_or_else(|| ProjectionError::ContentStreamMissing(content_stream_id.clone()))
    }
}

impl ContentStreamGraph {
    fn apply_root_created(&mut self, event: &RootNodeAggregateWithNodeWasCreated) {
        let aggregate = NodeAggregate {
            content_stream_id: event.content_stream_id.clone(),
            node_aggregate_id: event.node_aggregate_id.clone(),
            node_type_name: event.node_type_name.clone(),
            node_name: None,
            classification: event.node_aggregate_classification,
            occupation: BTreeMap::new(),
            coverage: event
                .covered_dimension_space_points
                .iter()
                .map(|point| (point.clone(), None))
                .collect(),
            children: BTreeMap::new(),
        };
        self.node_aggregates
            .insert(event.node_aggregate_id.clone(), aggregate);
    }

    fn apply_node_created(&mut self, event: &NodeAggregateWithNodeWasCreated) -> ProjectionResult<()> {
        let parent = self
            .node_aggregates
            .get_mut(&event.parent_node_aggregate_id)
            .ok_or_else(|| ProjectionError::NodeAggregateMissing {
                content_stream_id: event.content_stream_id.clone(),
                node_aggregate_id: event.parent_node_aggregate_id.clone(),
            })?;
        for point in &event.covered_dimension_space_points {
            let siblings = parent.children.entry(point.clone()).or_default();
            let position = event
                .succeeding_sibling_node_aggregate_id
                .as_ref()
                .and_then(|sibling| siblings.iter().position(|id| id == sibling))
                .unwrap_or(siblings.len());
            siblings.insert(position, event.node_aggregate_id.clone());
        }

        let aggregate = self
            .node_aggregates
            .entry(event.node_aggregate_id.clone())
            .or_insert_with(|| NodeAggregate {
                content_stream_id: event.content_stream_id.clone(),
                node_aggregate_id: event.node_aggregate_id.clone(),
                node_type_name: event.node_type_name.clone(),
                node_name: event.node_name.clone(),
                classification: event.node_aggregate_classification,
                occupation: BTreeMap::new(),
                coverage: BTreeMap::new(),
                children: BTreeMap::new(),
            });
        aggregate.occupation.insert(
            event.origin_dimension_space_point.clone(),
            event.initial_property_values.clone(),
        );
        for point in &event.covered_dimension_space_points {
            aggregate
                .coverage
                .insert(point.clone(), Some(event.parent_node_aggregate_id.clone()));
        }
        Ok(())
    }
}

impl ContentGraph for InMemoryContentGraph {
    fn content_stream_exists(&self, content_stream_id: &ContentStreamId) -> bool {
        self.streams.contains_key(content_stream_id)
    }

    fn content_stream_version(&self, content_stream_id: &ContentStreamId) -> Option<u64> {
        self.streams
            .get(content_stream_id)
            .map(|stream| stream.version)
    }

    fn find_node_aggregate_by_id(
        &self,
        content_stream_id: &ContentStreamId,
        node_aggregate_id: &NodeAggregateId,
    ) -> Option<&NodeAggregate> {
        self.streams
            .get(content_stream_id)?
            .node_aggregates
            .get(node_aggregate_id)
    }

    fn find_root_node_aggregate_by_type(
        &self,
        content_stream_id: &ContentStreamId,
        node_type_name: &NodeTypeName,
    ) -> Option<&NodeAggregate> {
        self.node_aggregates(content_stream_id).find(|aggregate| {
            aggregate.classification == NodeAggregateClassification::Root
                && &aggregate.node_type_name == node_type_name
        })
    }

    fn find_parent_node_aggregates(
        &self,
        content_stream_id: &ContentStreamId,
        child_node_aggregate_id: &NodeAggregateId,
    ) -> Vec<&NodeAggregate> {
        let Some(child) = self.find_node_aggregate_by_id(content_stream_id, child_node_aggregate_id)
        else {
            return Vec::new();
        };
        let mut parent_ids: Vec<&NodeAggregateId> = child.coverage.values().flatten().collect();
        parent_ids.sort();
        parent_ids.dedup();
        parent_ids
            .into_iter()
            .filter_map(|parent| self.find_node_aggregate_by_id(content_stream_id, parent))
            .collect()
    }

    fn dimension_space_points_occupied_by_child_node_name(
        &self,
        content_stream_id: &ContentStreamId,
        parent_node_aggregate_id: &NodeAggregateId,
        node_name: &NodeName,
        points: &DimensionSpacePointSet,
    ) -> DimensionSpacePointSet {
        points
            .iter()
            .filter(|point| {
                self.find_child_node_aggregates(content_stream_id, parent_node_aggregate_id, point)
                    .iter()
                    .any(|child| child.node_name.as_ref() == Some(node_name))
            })
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ContentGraphProjection for InMemoryContentGraph {
    async fn handle_event(&mut self, envelope: &EventEnvelope) -> ProjectionResult<()> {
        self.apply(envelope).map(|_| ())
    }

    async fn reset(&mut self) -> ProjectionResult<()> {
        self.streams.clear();
        self.checkpoint = None;
        Ok(())
    }

    fn checkpoint(&self) -> Option<u64> {
        self.checkpoint
    }
}
