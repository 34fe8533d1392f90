//! Content repository configuration
//!
//! One document holds the content dimensions and the node types:
//!
//! ```yaml
//! contentDimensions:
//!   language:
//!     defaultValue: mul
//!     values:
//!       mul:
//!         specializations:
//!           de: {}
//! nodeTypes:
//!   'Acme:Page': {}
//! ancestorNodeTypeConstraintChecks: true
//! ```

use crate::dimension::{ContentDimensionConfiguration, ContentDimensionSource, DimensionError};
use crate::handlers::NodeAggregateCommandHandler;
use crate::node_type::{NodeTypeConfiguration, NodeTypeError, NodeTypeManager};
use crate::variation::{InterDimensionalVariationGraph, VariationGraphError};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Errors that reject a configuration as a whole
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("Could not read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration is malformed: {0}")]
    Malformed(String),

    #[error(transparent)]
    Dimension(#[from] DimensionError),

    #[error(transparent)]
    VariationGraph(#[from] VariationGraphError),

    #[error(transparent)]
    NodeType(#[from] NodeTypeError),
}

fn default_true() -> bool {
    true
}

/// Everything a content repository is built from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentRepositoryConfiguration {
    #[serde(default)]
    pub content_dimensions: IndexMap<String, ContentDimensionConfiguration>,
    #[serde(default)]
    pub node_types: IndexMap<String, NodeTypeConfiguration>,
    #[serde(default = "default_true")]
    pub ancestor_node_type_constraint_checks: bool,
}

impl Default for ContentRepositoryConfiguration {
    fn default() -> Self {
        Self {
            content_dimensions: IndexMap::new(),
            node_types: IndexMap::new(),
            ancestor_node_type_constraint_checks: true,
        }
    }
}

impl ContentRepositoryConfiguration {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigurationError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigurationError::Malformed(e.to_string()))
    }

    pub fn from_json_value(value: serde_json::Value) -> Result<Self, ConfigurationError> {
        serde_json::from_value(value).map_err(|e| ConfigurationError::Malformed(e.to_string()))
    }

    /// Load a `.json` file as JSON and anything else as YAML
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        if path.extension().is_some_and(|extension| extension == "json") {
            serde_json::from_str(&contents).map_err(|e| ConfigurationError::Malformed(e.to_string()))
        } else {
            Self::from_yaml_str(&contents)
        }
    }

    pub fn content_dimension_source(&self) -> Result<ContentDimensionSource, ConfigurationError> {
        Ok(ContentDimensionSource::from_configuration(&self.content_dimensions)?)
    }

    pub fn variation_graph(&self) -> Result<InterDimensionalVariationGraph, ConfigurationError> {
        let source = self.content_dimension_source()?;
        Ok(InterDimensionalVariationGraph::new(Arc::new(source))?)
    }

    pub fn node_type_manager(&self) -> Result<NodeTypeManager, ConfigurationError> {
        Ok(NodeTypeManager::from_configuration(&self.node_types)?)
    }

    /// Build the variation graph and node types and hand them to a new command handler
    pub fn build_command_handler(&self) -> Result<NodeAggregateCommandHandler, ConfigurationError> {
        let handler = NodeAggregateCommandHandler::new(
            Arc::new(self.variation_graph()?),
            Arc::new(self.node_type_manager()?),
        )
        .with_ancestor_node_type_constraint_checks(self.ancestor_node_type_constraint_checks);
        tracing::info!(
            subgraphs = handler.variation_graph().subgraph_count(),
            node_types = handler.node_type_manager().node_types().count(),
            ancestor_checks = self.ancestor_node_type_constraint_checks,
            "Command handler configured"
        );
        Ok(handler)
    }
}
