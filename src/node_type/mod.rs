//! Node types
//!
//! Node types declare which children a node may have, which children are created
//! together with it (tethered nodes) and which properties it accepts. Inheritance
//! between node types is resolved once when the configuration is loaded.

mod manager;

pub use manager::{
    NodeTypeConfiguration, NodeTypeConstraintsConfiguration, NodeTypeManager,
    PropertyConfiguration, TetheredNodeConfiguration,
};

use crate::value_objects::{NodeName, NodeTypeName};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Result type for node type operations
pub type NodeTypeResult<T> = Result<T, NodeTypeError>;

/// Errors raised while loading or looking up node types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NodeTypeError {
    #[error("Node type \"{0}\" is not configured")]
    NodeTypeNotFound(NodeTypeName),

    #[error("Node type \"{node_type}\" inherits from unknown node type \"{super_type}\"")]
    UnknownSuperType {
        node_type: NodeTypeName,
        super_type: NodeTypeName,
    },

    #[error("Node type \"{0}\" is part of a super type cycle")]
    SuperTypeCycle(NodeTypeName),

    #[error("Node type \"{node_type}\" declares tethered node \"{name}\" with an invalid name")]
    InvalidTetheredNodeName { node_type: NodeTypeName, name: String },

    #[error("Node type \"{node_type}\" declares tethered node \"{name}\" without a type")]
    MissingTetheredNodeType { node_type: NodeTypeName, name: NodeName },

    #[error("Node type \"{0}\" is part of a tethered node cycle")]
    TetheredNodeCycle(NodeTypeName),

    #[error("Node type configuration is malformed: {0}")]
    MalformedConfiguration(String),
}

/// Allow/deny rules for child node types
///
/// An exact entry for a type wins. Otherwise the closest constrained super type
/// decides, a deny winning over an allow at equal distance. Otherwise the `*` entry
/// decides. A type not matched by a non-empty rule set is denied; an empty rule set
/// allows everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeTypeConstraints {
    rules: IndexMap<String, bool>,
}

impl NodeTypeConstraints {
    pub const WILDCARD: &'static str = "*";

    pub fn new(rules: IndexMap<String, bool>) -> Self {
        Self { rules }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Overlay `other` on these rules; entries of `other` win
    pub fn overruled_by(&self, other: &NodeTypeConstraints) -> NodeTypeConstraints {
        let mut rules = self.rules.clone();
        for (name, allowed) in &other.rules {
            rules.insert(name.clone(), *allowed);
        }
        Self { rules }
    }

    pub fn allows(&self, node_type: &NodeType) -> bool {
        if self.rules.is_empty() {
            return true;
        }
        if let Some(allowed) = self.rules.get(node_type.name().as_str()) {
            return *allowed;
        }

        let mut closest_allow: Option<u32> = None;
        let mut closest_deny: Option<u32> = None;
        for (name, allowed) in &self.rules {
            let Some(distance) = node_type.super_type_distance(name) else {
                continue;
            };
            let closest = if *allowed {
                &mut closest_allow
            } else {
                &mut closest_deny
            };
            if closest.map_or(true, |current| distance < current) {
                *closest = Some(distance);
            }
        }
        match (closest_allow, closest_deny) {
            (Some(allow), Some(deny)) => return allow < deny,
            (Some(_), None) => return true,
            (None, Some(_)) => return false,
            (None, None) => {}
        }

        self.rules.get(Self::WILDCARD).copied().unwrap_or(false)
    }
}

/// A child node created together with its parent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TetheredNodeDeclaration {
    pub node_type_name: NodeTypeName,
    /// Constraints for children of the tethered node, overruling its own node type's
    pub constraints: NodeTypeConstraints,
}

/// A declared property with its type and optional default value
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDeclaration {
    pub property_type: Option<String>,
    pub default_value: Option<serde_json::Value>,
}

impl PropertyDeclaration {
    /// Whether a value fits the declared type; `null` always does
    pub fn accepts(&self, value: &serde_json::Value) -> bool {
        use serde_json::Value;

        if value.is_null() {
            return true;
        }
        let Some(property_type) = self.property_type.as_deref() else {
            return true;
        };
        match property_type {
            "string" | "DateTime" => value.is_string(),
            "boolean" => value.is_boolean(),
            "integer" => value.is_i64() || value.is_u64(),
            "float" => value.is_number(),
            t if t == "array" || t.starts_with("array<") => value.is_array(),
            "reference" => matches!(value, Value::String(_)),
            "references" => matches!(value, Value::Array(items) if items.iter().all(Value::is_string)),
            _ => true,
        }
    }
}

/// A fully resolved node type
#[derive(Debug, Clone, PartialEq)]
pub struct NodeType {
    name: NodeTypeName,
    is_abstract: bool,
    declared_super_types: Vec<NodeTypeName>,
    super_type_distances: IndexMap<NodeTypeName, u32>,
    child_node_constraints: NodeTypeConstraints,
    tethered_nodes: IndexMap<NodeName, TetheredNodeDeclaration>,
    properties: IndexMap<String, PropertyDeclaration>,
}

impl NodeType {
    pub fn name(&self) -> &NodeTypeName {
        &self.name
    }

    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    pub fn declared_super_types(&self) -> &[NodeTypeName] {
        &self.declared_super_types
    }

    /// Whether this type is `name` itself or inherits from it
    pub fn is_of_type(&self, name: &str) -> bool {
        self.name.as_str() == name || self.super_type_distance(name).is_some()
    }

    pub fn is_of_type_root(&self) -> bool {
        self.is_of_type(NodeTypeName::ROOT)
    }

    /// Inheritance levels between this type and a super type; `None` if unrelated
    pub fn super_type_distance(&self, name: &str) -> Option<u32> {
        self.super_type_distances
            .iter()
            .find(|(super_type, _)| super_type.as_str() == name)
            .map(|(_, distance)| *distance)
    }

    pub fn child_node_constraints(&self) -> &NodeTypeConstraints {
        &self.child_node_constraints
    }

    pub fn allows_child_node_type(&self, node_type: &NodeType) -> bool {
        self.child_node_constraints.allows(node_type)
    }

    /// Tethered nodes in declaration order
    pub fn tethered_nodes(&self) -> &IndexMap<NodeName, TetheredNodeDeclaration> {
        &self.tethered_nodes
    }

    pub fn has_tethered_node(&self, name: &NodeName) -> bool {
        self.tethered_nodes.contains_key(name)
    }

    pub fn tethered_node(&self, name: &NodeName) -> Option<&TetheredNodeDeclaration> {
        self.tethered_nodes.get(name)
    }

    pub fn properties(&self) -> &IndexMap<String, PropertyDeclaration> {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDeclaration> {
        self.properties.get(name)
    }

    /// Declared default values, for properties that have one
    pub fn default_property_values(&self) -> impl Iterator<Item = (&str, &serde_json::Value)> {
        self.properties.iter().filter_map(|(name, declaration)| {
            declaration
                .default_value
                .as_ref()
                .map(|value| (name.as_str(), value))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node_type(name: &str, super_types: &[(&str, u32)]) -> NodeType {
        NodeType {
            name: NodeTypeName::new(name),
            is_abstract: false,
            declared_super_types: Vec::new(),
            super_type_distances: super_types
                .iter()
                .map(|(name, distance)| (NodeTypeName::new(*name), *distance))
                .collect(),
            child_node_constraints: NodeTypeConstraints::default(),
            tethered_nodes: IndexMap::new(),
            properties: IndexMap::new(),
        }
    }

    fn constraints(rules: &[(&str, bool)]) -> NodeTypeConstraints {
        NodeTypeConstraints::new(
            rules
                .iter()
                .map(|(name, allowed)| (name.to_string(), *allowed))
                .collect(),
        )
    }

    #[test]
    fn test_empty_constraints_allow_everything() {
        assert!(NodeTypeConstraints::default().allows(&node_type("Acme:Text", &[])));
    }

    #[test]
    fn test_exact_match_wins_over_super_types_and_wildcard() {
        let text = node_type("Acme:Text", &[("Acme:Content", 1)]);
        let rules = constraints(&[("Acme:Content", false), ("*", false), ("Acme:Text", true)]);
        assert!(rules.allows(&text));
    }

    #[test]
    fn test_closest_super_type_decides() {
        let headline = node_type("Acme:Headline", &[("Acme:Text", 1), ("Acme:Content", 2)]);
        assert!(constraints(&[("Acme:Content", false), ("Acme:Text", true)]).allows(&headline));
        assert!(!constraints(&[("Acme:Content", true), ("Acme:Text", false)]).allows(&headline));
    }

    #[test]
    fn test_deny_wins_at_equal_distance() {
        let mixed = node_type("Acme:Mixed", &[("Acme:A", 1), ("Acme:B", 1)]);
        assert!(!constraints(&[("Acme:A", true), ("Acme:B", false)]).allows(&mixed));
    }

    #[test]
    fn test_wildcard_and_default_deny() {
        let text = node_type("Acme:Text", &[]);
        assert!(constraints(&[("*", true), ("Acme:Image", false)]).allows(&text));
        assert!(!constraints(&[("Acme:Image", true)]).allows(&text));
    }

    #[test]
    fn test_overruled_constraints() {
        let base = constraints(&[("*", false), ("Acme:Text", true)]);
        let merged = base.overruled_by(&constraints(&[("Acme:Text", false), ("Acme:Image", true)]));
        assert!(!merged.allows(&node_type("Acme:Text", &[])));
        assert!(merged.allows(&node_type("Acme:Image", &[])));
    }

    #[test]
    fn test_property_type_acceptance() {
        let declaration = |property_type: &str| PropertyDeclaration {
            property_type: Some(property_type.to_string()),
            default_value: None,
        };
        assert!(declaration("string").accepts(&serde_json::json!("text")));
        assert!(!declaration("string").accepts(&serde_json::json!(1)));
        assert!(declaration("integer").accepts(&serde_json::json!(3)));
        assert!(!declaration("integer").accepts(&serde_json::json!(3.5)));
        assert!(declaration("float").accepts(&serde_json::json!(3)));
        assert!(declaration("array<string>").accepts(&serde_json::json!(["a"])));
        assert!(declaration("boolean").accepts(&serde_json::Value::Null));
        assert!(declaration("Acme\\Custom").accepts(&serde_json::json!({"any": "thing"})));
    }
}
