//! Configuration-based content dimension source

use super::{
    ContentDimension, ContentDimensionConstraintSet, ContentDimensionConstraints,
    ContentDimensionId, DimensionError, DimensionResult,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Configuration of one content dimension
///
/// ```yaml
/// language:
///   defaultValue: mul
///   values:
///     mul:
///       specializations:
///         de:
///           constraints:
///             market: { '*': false, CH: true }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentDimensionConfiguration {
    #[serde(default)]
    pub default_value: Option<String>,
    #[serde(default)]
    pub values: IndexMap<String, ContentDimensionValueConfiguration>,
    /// Any further keys are kept as dimension configuration values
    #[serde(flatten)]
    pub configuration: serde_json::Map<String, serde_json::Value>,
}

/// Configuration of one dimension value and its nested specializations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentDimensionValueConfiguration {
    #[serde(default)]
    pub constraints: IndexMap<String, IndexMap<String, bool>>,
    #[serde(default)]
    pub specializations: IndexMap<String, ContentDimensionValueConfiguration>,
    /// Any further keys are kept as value configuration values
    #[serde(flatten)]
    pub configuration: serde_json::Map<String, serde_json::Value>,
}

/// The configured content dimensions, ordered by priority (configuration order)
#[derive(Debug, Clone, Default)]
pub struct ContentDimensionSource {
    dimensions: IndexMap<ContentDimensionId, ContentDimension>,
}

impl ContentDimensionSource {
    /// Create a source from already built dimensions, keeping their order as priority
    pub fn new(dimensions: impl IntoIterator<Item = ContentDimension>) -> Self {
        Self {
            dimensions: dimensions
                .into_iter()
                .map(|dimension| (dimension.id().clone(), dimension))
                .collect(),
        }
    }

    /// Build all dimensions from configuration; any error rejects the whole configuration
    pub fn from_configuration(
        configuration: &IndexMap<String, ContentDimensionConfiguration>,
    ) -> DimensionResult<Self> {
        let mut dimensions = Vec::with_capacity(configuration.len());
        for (raw_id, dimension_configuration) in configuration {
            let mut builder = ContentDimension::builder(ContentDimensionId::new(raw_id.clone()))
                .configuration(dimension_configuration.configuration.clone());
            if let Some(default_value) = &dimension_configuration.default_value {
                builder = builder.default_value(default_value.clone());
            }
            for (value, value_configuration) in &dimension_configuration.values {
                builder = add_value(builder, value, None, value_configuration);
            }
            dimensions.push(builder.build()?);
        }

        let source = Self::new(dimensions);
        source.require_constraint_targets_to_exist()?;
        tracing::debug!(
            dimensions = source.dimensions.len(),
            "Content dimension source initialized"
        );
        Ok(source)
    }

    pub fn from_json_value(value: serde_json::Value) -> DimensionResult<Self> {
        let configuration: IndexMap<String, ContentDimensionConfiguration> =
            serde_json::from_value(value)
                .map_err(|e| DimensionError::MalformedConfiguration(e.to_string()))?;
        Self::from_configuration(&configuration)
    }

    pub fn from_yaml_str(yaml: &str) -> DimensionResult<Self> {
        let configuration: IndexMap<String, ContentDimensionConfiguration> =
            serde_yaml::from_str(yaml)
                .map_err(|e| DimensionError::MalformedConfiguration(e.to_string()))?;
        Self::from_configuration(&configuration)
    }

    pub fn dimension(&self, id: &ContentDimensionId) -> Option<&ContentDimension> {
        self.dimensions.get(id)
    }

    pub fn require_dimension(&self, id: &ContentDimensionId) -> DimensionResult<&ContentDimension> {
        self.dimension(id)
            .ok_or_else(|| DimensionError::UnknownDimensionIdentifier(id.clone()))
    }

    /// Dimensions in priority order, highest priority first
    pub fn dimensions_ordered_by_priority(&self) -> impl Iterator<Item = &ContentDimension> {
        self.dimensions.values()
    }

    pub fn dimension_ids(&self) -> impl Iterator<Item = &ContentDimensionId> {
        self.dimensions.keys()
    }

    /// Position of a dimension in priority order, 0 being the highest
    pub fn priority_of(&self, id: &ContentDimensionId) -> Option<usize> {
        self.dimensions.get_index_of(id)
    }

    pub fn len(&self) -> usize {
        self.dimensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty()
    }

    fn require_constraint_targets_to_exist(&self) -> DimensionResult<()> {
        for dimension in self.dimensions.values() {
            for value in dimension.values() {
                if let Some((target, _)) = value
                    .constraints
                    .iter()
                    .find(|(target, _)| !self.dimensions.contains_key(*target))
                {
                    return Err(DimensionError::ConstraintOnUnknownDimension {
                        dimension: dimension.id().clone(),
                        value: value.value.clone(),
                        target: target.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

fn add_value(
    mut builder: super::ContentDimensionBuilder,
    value: &str,
    generalization: Option<&str>,
    configuration: &ContentDimensionValueConfiguration,
) -> super::ContentDimensionBuilder {
    let constraints = configuration
        .constraints
        .iter()
        .map(|(dimension_id, restrictions)| {
            (
                ContentDimensionId::new(dimension_id.clone()),
                ContentDimensionConstraints::from_configuration(restrictions),
            )
        })
        .collect();

    builder = builder.value_with(
        value,
        generalization.map(str::to_string),
        ContentDimensionConstraintSet::new(constraints),
        configuration.configuration.clone(),
    );
    for (specialization, specialization_configuration) in &configuration.specializations {
        builder = add_value(builder, specialization, Some(value), specialization_configuration);
    }
    builder
}
