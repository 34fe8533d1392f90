use crate::node_type::NodeTypeManager;
use crate::value_objects::{
    NodeAggregateClassification, NodeAggregateId, NodeName, NodePath, NodeTypeName,
    PropertyValues,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A read-side subtree captured for duplication
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSubtreeSnapshot {
    pub node_aggregate_id: NodeAggregateId,
    pub node_type_name: NodeTypeName,
    pub node_name: Option<NodeName>,
    pub node_aggregate_classification: NodeAggregateClassification,
    #[serde(default)]
    pub property_values: PropertyValues,
    #[serde(default)]
    pub child_nodes: Vec<NodeSubtreeSnapshot>,
}

impl NodeSubtreeSnapshot {
    /// A snapshot without children
    pub fn leaf(
        node_aggregate_id: impl Into<NodeAggregateId>,
        node_type_name: impl Into<NodeTypeName>,
        node_name: Option<NodeName>,
    ) -> Self {
        Self {
            node_aggregate_id: node_aggregate_id.into(),
            node_type_name: node_type_name.into(),
            node_name,
            node_aggregate_classification: NodeAggregateClassification::Regular,
            property_values: PropertyValues::new(),
            child_nodes: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: NodeSubtreeSnapshot) -> Self {
        self.child_nodes.push(child);
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.property_values.insert(name.into(), value);
        self
    }

    /// All nodes of the subtree, parents before their children
    pub fn iter(&self) -> impl Iterator<Item = &NodeSubtreeSnapshot> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let next = stack.pop()?;
            stack.extend(next.child_nodes.iter().rev());
            Some(next)
        })
    }
}

/// Old-to-new node aggregate ids for a duplicated subtree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeAggregateIdMapping {
    mapping: BTreeMap<NodeAggregateId, NodeAggregateId>,
}

impl NodeAggregateIdMapping {
    pub fn new(mapping: impl IntoIterator<Item = (NodeAggregateId, NodeAggregateId)>) -> Self {
        Self {
            mapping: mapping.into_iter().collect(),
        }
    }

    pub fn get_new_node_aggregate_id(&self, old: &NodeAggregateId) -> Option<&NodeAggregateId> {
        self.mapping.get(old)
    }

    /// Assign fresh ids to every snapshot node without one; existing entries are kept
    pub fn complete_for(mut self, snapshot: &NodeSubtreeSnapshot) -> Self {
        for node in snapshot.iter() {
            self.mapping
                .entry(node.node_aggregate_id.clone())
                .or_insert_with(NodeAggregateId::new);
        }
        self
    }

    /// Snapshot node ids without a new id, in pre-order
    pub fn missing_for<'a>(&self, snapshot: &'a NodeSubtreeSnapshot) -> Vec<&'a NodeAggregateId> {
        snapshot
            .iter()
            .map(|node| &node.node_aggregate_id)
            .filter(|old| !self.mapping.contains_key(*old))
            .collect()
    }

    pub fn new_node_aggregate_ids(&self) -> impl Iterator<Item = &NodeAggregateId> {
        self.mapping.values()
    }

    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }
}

/// Node aggregate ids for tethered descendants, addressed by their path below the new node
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeAggregateIdsByNodePaths {
    ids: BTreeMap<NodePath, NodeAggregateId>,
}

impl NodeAggregateIdsByNodePaths {
    pub fn new(ids: impl IntoIterator<Item = (NodePath, NodeAggregateId)>) -> Self {
        Self {
            ids: ids.into_iter().collect(),
        }
    }

    pub fn get(&self, path: &NodePath) -> Option<&NodeAggregateId> {
        self.ids.get(path)
    }

    pub fn with(mut self, path: impl Into<NodePath>, id: impl Into<NodeAggregateId>) -> Self {
        self.ids.insert(path.into(), id.into());
        self
    }

    /// Assign fresh ids to every tethered descendant path of the node type without one
    pub fn complete_for_node_type(
        mut self,
        node_type_name: &NodeTypeName,
        node_type_manager: &NodeTypeManager,
    ) -> Self {
        for path in tethered_descendant_paths(node_type_name, node_type_manager) {
            self.ids.entry(path).or_insert_with(NodeAggregateId::new);
        }
        self
    }

    /// Tethered descendant paths of the node type without an id, in pre-order
    pub fn missing_for_node_type(
        &self,
        node_type_name: &NodeTypeName,
        node_type_manager: &NodeTypeManager,
    ) -> Vec<NodePath> {
        tethered_descendant_paths(node_type_name, node_type_manager)
            .into_iter()
            .filter(|path| !self.ids.contains_key(path))
            .collect()
    }

    pub fn node_aggregate_ids(&self) -> impl Iterator<Item = &NodeAggregateId> {
        self.ids.values()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Paths of all tethered descendants in declaration pre-order; unknown types end the walk
fn tethered_descendant_paths(
    node_type_name: &NodeTypeName,
    node_type_manager: &NodeTypeManager,
) -> Vec<NodePath> {
    let mut paths = Vec::new();
    collect_tethered_paths(node_type_name, None, node_type_manager, &mut paths);
    paths
}

fn collect_tethered_paths(
    node_type_name: &NodeTypeName,
    prefix: Option<&NodePath>,
    node_type_manager: &NodeTypeManager,
    paths: &mut Vec<NodePath>,
) {
    let Some(node_type) = node_type_manager.get_node_type(node_type_name) else {
        return;
    };
    for (name, declaration) in node_type.tethered_nodes() {
        let path = match prefix {
            Some(prefix) => prefix.append(name),
            None => NodePath::from_name(name),
        };
        paths.push(path.clone());
        collect_tethered_paths(
            &declaration.node_type_name,
            Some(&path),
            node_type_manager,
            paths,
        );
    }
}
