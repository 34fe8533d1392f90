use super::{
    NodeType, NodeTypeConstraints, NodeTypeError, NodeTypeResult, PropertyDeclaration,
    TetheredNodeDeclaration,
};
use crate::value_objects::{NodeName, NodeTypeName};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Configuration of one node type
///
/// ```yaml
/// 'Acme:Page':
///   superTypes: { 'Acme:Document': true }
///   childNodes:
///     main:
///       type: 'Acme:ContentCollection'
///       constraints: { nodeTypes: { 'Acme:Text': true, '*': false } }
///   properties:
///     title: { type: string, defaultValue: '' }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeTypeConfiguration {
    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,
    /// Super types; entries set to `false` are ignored
    #[serde(default)]
    pub super_types: IndexMap<String, bool>,
    #[serde(default)]
    pub child_nodes: IndexMap<String, TetheredNodeConfiguration>,
    #[serde(default)]
    pub constraints: NodeTypeConstraintsConfiguration,
    #[serde(default)]
    pub properties: IndexMap<String, PropertyConfiguration>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TetheredNodeConfiguration {
    #[serde(default, rename = "type")]
    pub node_type: Option<String>,
    #[serde(default)]
    pub constraints: NodeTypeConstraintsConfiguration,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeTypeConstraintsConfiguration {
    #[serde(default)]
    pub node_types: IndexMap<String, bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyConfiguration {
    #[serde(default, rename = "type")]
    pub property_type: Option<String>,
    #[serde(default)]
    pub default_value: Option<serde_json::Value>,
}

/// Registry of resolved node types
///
/// The root node type is always present, even if not configured.
#[derive(Debug, Clone)]
pub struct NodeTypeManager {
    node_types: IndexMap<NodeTypeName, NodeType>,
}

impl Default for NodeTypeManager {
    fn default() -> Self {
        let root = resolve_without_super_types(NodeTypeName::root());
        Self {
            node_types: IndexMap::from([(root.name.clone(), root)]),
        }
    }
}

impl NodeTypeManager {
    /// Resolve inheritance for every configured node type; any error rejects the configuration
    pub fn from_configuration(
        configuration: &IndexMap<String, NodeTypeConfiguration>,
    ) -> NodeTypeResult<Self> {
        let mut configuration = configuration.clone();
        configuration
            .entry(NodeTypeName::ROOT.to_string())
            .or_default();

        let mut resolver = Resolver {
            configuration: &configuration,
            resolved: IndexMap::new(),
            visiting: Vec::new(),
        };
        for name in configuration.keys() {
            resolver.resolve(&NodeTypeName::new(name.clone()))?;
        }

        let manager = Self {
            node_types: resolver.resolved,
        };
        manager.check_tethered_node_cycles()?;
        tracing::debug!(
            node_types = manager.node_types.len(),
            "Node types resolved"
        );
        Ok(manager)
    }

    pub fn from_json_value(value: serde_json::Value) -> NodeTypeResult<Self> {
        let configuration: IndexMap<String, NodeTypeConfiguration> = serde_json::from_value(value)
            .map_err(|e| NodeTypeError::MalformedConfiguration(e.to_string()))?;
        Self::from_configuration(&configuration)
    }

    pub fn from_yaml_str(yaml: &str) -> NodeTypeResult<Self> {
        let configuration: IndexMap<String, NodeTypeConfiguration> = serde_yaml::from_str(yaml)
            .map_err(|e| NodeTypeError::MalformedConfiguration(e.to_string()))?;
        Self::from_configuration(&configuration)
    }

    pub fn get_node_type(&self, name: &NodeTypeName) -> Option<&NodeType> {
        self.node_types.get(name)
    }

    pub fn require_node_type(&self, name: &NodeTypeName) -> NodeTypeResult<&NodeType> {
        self.get_node_type(name)
            .ok_or_else(|| NodeTypeError::NodeTypeNotFound(name.clone()))
    }

    pub fn has_node_type(&self, name: &NodeTypeName) -> bool {
        self.node_types.contains_key(name)
    }

    pub fn node_types(&self) -> impl Iterator<Item = &NodeType> {
        self.node_types.values()
    }

    /// The node type of a parent's tethered child, if declared and configured
    pub fn tethered_node_type(&self, parent: &NodeType, name: &NodeName) -> Option<&NodeType> {
        parent
            .tethered_node(name)
            .and_then(|declaration| self.get_node_type(&declaration.node_type_name))
    }

    /// Whether `node_type` may be a child of the tethered node `tethered_name` of `grandparent`
    ///
    /// Names that are not tethered in `grandparent` impose nothing.
    pub fn is_node_type_allowed_as_child_to_tethered_node(
        &self,
        grandparent: &NodeType,
        tethered_name: &NodeName,
        node_type: &NodeType,
    ) -> bool {
        let Some(declaration) = grandparent.tethered_node(tethered_name) else {
            return true;
        };
        let constraints = match self.get_node_type(&declaration.node_type_name) {
            Some(tethered_type) => tethered_type
                .child_node_constraints()
                .overruled_by(&declaration.constraints),
            None => declaration.constraints.clone(),
        };
        constraints.allows(node_type)
    }

    fn check_tethered_node_cycles(&self) -> NodeTypeResult<()> {
        for node_type in self.node_types.values() {
            let mut stack: Vec<&NodeTypeName> = node_type
                .tethered_nodes()
                .values()
                .map(|declaration| &declaration.node_type_name)
                .collect();
            let mut seen = HashSet::new();
            while let Some(current) = stack.pop() {
                if current == node_type.name() {
                    return Err(NodeTypeError::TetheredNodeCycle(node_type.name().clone()));
                }
                if !seen.insert(current) {
                    continue;
                }
                if let Some(tethered_type) = self.get_node_type(current) {
                    stack.extend(
                        tethered_type
                            .tethered_nodes()
                            .values()
                            .map(|declaration| &declaration.node_type_name),
                    );
                }
            }
        }
        Ok(())
    }
}

struct Resolver<'a> {
    configuration: &'a IndexMap<String, NodeTypeConfiguration>,
    resolved: IndexMap<NodeTypeName, NodeType>,
    visiting: Vec<NodeTypeName>,
}

impl Resolver<'_> {
    fn resolve(&mut self, name: &NodeTypeName) -> NodeTypeResult<NodeType> {
        if let Some(node_type) = self.resolved.get(name) {
            return Ok(node_type.clone());
        }
        if self.visiting.contains(name) {
            return Err(NodeTypeError::SuperTypeCycle(name.clone()));
        }
        let configuration = self.configuration;
        let Some(local) = configuration.get(name.as_str()) else {
            return Err(NodeTypeError::NodeTypeNotFound(name.clone()));
        };

        self.visiting.push(name.clone());
        let mut node_type = resolve_without_super_types(name.clone());
        node_type.is_abstract = local.is_abstract;

        for (super_type_name, enabled) in &local.super_types {
            if !enabled {
                continue;
            }
            let super_type_name = NodeTypeName::new(super_type_name.clone());
            if !configuration.contains_key(super_type_name.as_str()) {
                return Err(NodeTypeError::UnknownSuperType {
                    node_type: name.clone(),
                    super_type: super_type_name,
                });
            }
            let super_type = self.resolve(&super_type_name)?;
            inherit(&mut node_type, &super_type);
            node_type.declared_super_types.push(super_type_name);
        }

        apply_local_configuration(&mut node_type, local)?;
        self.visiting.pop();
        self.resolved.insert(name.clone(), node_type.clone());
        Ok(node_type)
    }
}

fn resolve_without_super_types(name: NodeTypeName) -> NodeType {
    NodeType {
        name,
        is_abstract: false,
        declared_super_types: Vec::new(),
        super_type_distances: IndexMap::new(),
        child_node_constraints: NodeTypeConstraints::default(),
        tethered_nodes: IndexMap::new(),
        properties: IndexMap::new(),
    }
}

fn inherit(node_type: &mut NodeType, super_type: &NodeType) {
    let inherited = std::iter::once((super_type.name.clone(), 0))
        .chain(super_type.super_type_distances.clone());
    for (name, distance) in inherited {
        let distance = distance + 1;
        let entry = node_type.super_type_distances.entry(name).or_insert(distance);
        *entry = (*entry).min(distance);
    }
    node_type.child_node_constraints = node_type
        .child_node_constraints
        .overruled_by(&super_type.child_node_constraints);
    for (name, declaration) in &super_type.tethered_nodes {
        node_type.tethered_nodes.insert(name.clone(), declaration.clone());
    }
    for (name, declaration) in &super_type.properties {
        node_type.properties.insert(name.clone(), declaration.clone());
    }
}

fn apply_local_configuration(
    node_type: &mut NodeType,
    local: &NodeTypeConfiguration,
) -> NodeTypeResult<()> {
    node_type.child_node_constraints = node_type
        .child_node_constraints
        .overruled_by(&NodeTypeConstraints::new(local.constraints.node_types.clone()));

    for (raw_name, configuration) in &local.child_nodes {
        let name = NodeName::new(raw_name.clone()).map_err(|_| {
            NodeTypeError::InvalidTetheredNodeName {
                node_type: node_type.name.clone(),
                name: raw_name.clone(),
            }
        })?;
        let inherited = node_type.tethered_nodes.get(&name);
        let node_type_name = match (&configuration.node_type, inherited) {
            (Some(declared), _) => NodeTypeName::new(declared.clone()),
            (None, Some(inherited)) => inherited.node_type_name.clone(),
            (None, None) => {
                return Err(NodeTypeError::MissingTetheredNodeType {
                    node_type: node_type.name.clone(),
                    name,
                })
            }
        };
        let local_constraints =
            NodeTypeConstraints::new(configuration.constraints.node_types.clone());
        let constraints = match inherited {
            Some(inherited) => inherited.constraints.overruled_by(&local_constraints),
            None => local_constraints,
        };
        node_type.tethered_nodes.insert(
            name,
            TetheredNodeDeclaration {
                node_type_name,
                constraints,
            },
        );
    }

    for (name, configuration) in &local.properties {
        let declaration = node_type
            .properties
            .entry(name.clone())
            .or_insert(PropertyDeclaration {
                property_type: None,
                default_value: None,
            });
        if configuration.property_type.is_some() {
            declaration.property_type = configuration.property_type.clone();
        }
        if configuration.default_value.is_some() {
            declaration.default_value = configuration.default_value.clone();
        }
    }
    Ok(())
}
