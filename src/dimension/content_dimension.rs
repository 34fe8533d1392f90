//! Intra-dimensional value graph
//!
//! Values are stored in an arena; generalizations are arena indices and the
//! specialization lists are a reverse index derived once when the dimension is built.

use super::{
    configuration_value, ContentDimensionConstraintSet, ContentDimensionId, ContentDimensionValue,
    DimensionError, DimensionResult,
};
use std::collections::{HashMap, VecDeque};

/// A content dimension with its values and their specialization tree
#[derive(Debug, Clone)]
pub struct ContentDimension {
    id: ContentDimensionId,
    values: Vec<ContentDimensionValue>,
    index: HashMap<String, usize>,
    generalizations: Vec<Option<usize>>,
    specializations: Vec<Vec<usize>>,
    default_value: usize,
    maximum_depth: u32,
    configuration: serde_json::Map<String, serde_json::Value>,
}

impl ContentDimension {
    /// Start building a dimension
    pub fn builder(id: impl Into<ContentDimensionId>) -> ContentDimensionBuilder {
        ContentDimensionBuilder::new(id.into())
    }

    pub fn id(&self) -> &ContentDimensionId {
        &self.id
    }

    /// All values in configured order
    pub fn values(&self) -> impl Iterator<Item = &ContentDimensionValue> {
        self.values.iter()
    }

    pub fn value(&self, value: &str) -> Option<&ContentDimensionValue> {
        self.index.get(value).map(|position| &self.values[*position])
    }

    /// Like [`value`](Self::value), failing with `UnknownDimensionValue`
    pub fn require_value(&self, value: &str) -> DimensionResult<&ContentDimensionValue> {
        self.value(value)
            .ok_or_else(|| DimensionError::UnknownDimensionValue {
                dimension: self.id.clone(),
                value: value.to_string(),
            })
    }

    pub fn default_value(&self) -> &ContentDimensionValue {
        &self.values[self.default_value]
    }

    /// The deepest specialization depth of any value; 0 for a flat dimension
    pub fn maximum_depth(&self) -> u32 {
        self.maximum_depth
    }

    /// Direct specializations of a value
    pub fn specializations_of(&self, value: &str) -> DimensionResult<Vec<&ContentDimensionValue>> {
        let position = self.position_of(value)?;
        Ok(self.specializations[position]
            .iter()
            .map(|child| &self.values[*child])
            .collect())
    }

    /// All transitive specializations of a value, breadth first, excluding the value itself
    pub fn all_specializations_of(&self, value: &str) -> DimensionResult<Vec<&ContentDimensionValue>> {
        let position = self.position_of(value)?;
        let mut result = Vec::new();
        let mut queue: VecDeque<usize> = self.specializations[position].iter().copied().collect();
        while let Some(current) = queue.pop_front() {
            result.push(&self.values[current]);
            queue.extend(self.specializations[current].iter().copied());
        }
        Ok(result)
    }

    /// The direct generalization of a value; `None` at depth 0
    pub fn generalization_of(&self, value: &str) -> DimensionResult<Option<&ContentDimensionValue>> {
        let position = self.position_of(value)?;
        Ok(self.generalizations[position].map(|parent| &self.values[parent]))
    }

    /// Whether `general` is `special` itself or one of its (transitive) generalizations
    pub fn is_generalization_or_same(&self, general: &str, special: &str) -> DimensionResult<bool> {
        let target = self.position_of(general)?;
        let mut current = Some(self.position_of(special)?);
        while let Some(position) = current {
            if position == target {
                return Ok(true);
            }
            current = self.generalizations[position];
        }
        Ok(false)
    }

    pub fn depth_of(&self, value: &str) -> DimensionResult<u32> {
        Ok(self.require_value(value)?.specialization_depth)
    }

    /// Look up a dimension-level configuration value by dotted path
    pub fn configuration_value(&self, path: &str) -> Option<&serde_json::Value> {
        configuration_value(&self.configuration, path)
    }

    fn position_of(&self, value: &str) -> DimensionResult<usize> {
        self.index
            .get(value)
            .copied()
            .ok_or_else(|| DimensionError::UnknownDimensionValue {
                dimension: self.id.clone(),
                value: value.to_string(),
            })
    }
}

#[derive(Debug, Clone)]
struct ValueDefinition {
    value: String,
    generalization: Option<String>,
    constraints: ContentDimensionConstraintSet,
    configuration: serde_json::Map<String, serde_json::Value>,
}

/// Collects value definitions and validates them into a [`ContentDimension`]
#[derive(Debug, Clone)]
pub struct ContentDimensionBuilder {
    id: ContentDimensionId,
    definitions: Vec<ValueDefinition>,
    default_value: Option<String>,
    configuration: serde_json::Map<String, serde_json::Value>,
}

impl ContentDimensionBuilder {
    fn new(id: ContentDimensionId) -> Self {
        Self {
            id,
            definitions: Vec::new(),
            default_value: None,
            configuration: serde_json::Map::new(),
        }
    }

    /// Add a most general value
    pub fn value(self, value: impl Into<String>) -> Self {
        self.value_with(value, None, ContentDimensionConstraintSet::empty(), serde_json::Map::new())
    }

    /// Add a value specializing `generalization`
    pub fn specialization(self, value: impl Into<String>, generalization: impl Into<String>) -> Self {
        self.value_with(
            value,
            Some(generalization.into()),
            ContentDimensionConstraintSet::empty(),
            serde_json::Map::new(),
        )
    }

    /// Add a value with all of its attributes
    pub fn value_with(
        mut self,
        value: impl Into<String>,
        generalization: Option<String>,
        constraints: ContentDimensionConstraintSet,
        configuration: serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        self.definitions.push(ValueDefinition {
            value: value.into(),
            generalization,
            constraints,
            configuration,
        });
        self
    }

    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn configuration(mut self, configuration: serde_json::Map<String, serde_json::Value>) -> Self {
        self.configuration = configuration;
        self
    }

    /// Validate the definitions and derive depths and the specialization index
    pub fn build(self) -> DimensionResult<ContentDimension> {
        if self.id.as_str().trim().is_empty() {
            return Err(DimensionError::EmptyDimensionIdentifier);
        }

        let mut index = HashMap::with_capacity(self.definitions.len());
        for (position, definition) in self.definitions.iter().enumerate() {
            if definition.value.trim().is_empty() {
                return Err(DimensionError::EmptyDimensionValue {
                    dimension: self.id.clone(),
                });
            }
            if index.insert(definition.value.clone(), position).is_some() {
                return Err(DimensionError::DuplicateDimensionValue {
                    dimension: self.id.clone(),
                    value: definition.value.clone(),
                });
            }
        }

        let default_value = match self.default_value.as_deref().map(str::trim) {
            None | Some("") => {
                return Err(DimensionError::DefaultValueMissing {
                    dimension: self.id.clone(),
                })
            }
            Some(default_value) => *index.get(default_value).ok_or_else(|| {
                DimensionError::DefaultValueNotConfigured {
                    dimension: self.id.clone(),
                    value: default_value.to_string(),
                }
            })?,
        };

        let mut generalizations = Vec::with_capacity(self.definitions.len());
        for definition in &self.definitions {
            let generalization = match &definition.generalization {
                None => None,
                Some(generalization) => Some(*index.get(generalization).ok_or_else(|| {
                    DimensionError::UnknownGeneralization {
                        dimension: self.id.clone(),
                        value: definition.value.clone(),
                        generalization: generalization.clone(),
                    }
                })?),
            };
            generalizations.push(generalization);
        }

        // One pass over each chain: a chain longer than the value count must loop.
        let mut depths = Vec::with_capacity(self.definitions.len());
        for (position, definition) in self.definitions.iter().enumerate() {
            let mut depth = 0u32;
            let mut current = generalizations[position];
            while let Some(parent) = current {
                depth += 1;
                if parent == position || depth as usize > self.definitions.len() {
                    return Err(DimensionError::GeneralizationCycle {
                        dimension: self.id.clone(),
                        value: definition.value.clone(),
                    });
                }
                current = generalizations[parent];
            }
            depths.push(depth);
        }

        let mut specializations = vec![Vec::new(); self.definitions.len()];
        for (position, generalization) in generalizations.iter().enumerate() {
            if let Some(parent) = generalization {
                specializations[*parent].push(position);
            }
        }

        let maximum_depth = depths.iter().copied().max().unwrap_or(0);
        let values = self
            .definitions
            .into_iter()
            .zip(depths)
            .map(|(definition, depth)| ContentDimensionValue {
                value: definition.value,
                specialization_depth: depth,
                constraints: definition.constraints,
                configuration: definition.configuration,
            })
            .collect();

        Ok(ContentDimension {
            id: self.id,
            values,
            index,
            generalizations,
            specializations,
            default_value,
            maximum_depth,
            configuration: self.configuration,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test Coverage
    ///
    /// ```mermaid
    /// graph TD
    ///     B[Builder] --> V[Validation]
    ///     B --> D[Depths]
    ///     B --> S[Specialization Index]
    ///     S --> Q[Queries]
    ///     D --> M[Maximum Depth]
    /// ```

    fn language_dimension() -> ContentDimension {
        ContentDimension::builder("language")
            .value("mul")
            .specialization("de", "mul")
            .specialization("en", "mul")
            .specialization("gsw", "de")
            .specialization("en_US", "en")
            .value("fr")
            .default_value("mul")
            .build()
            .unwrap()
    }

    #[test]
    fn test_depths_and_maximum_depth() {
        let dimension = language_dimension();
        assert_eq!(dimension.depth_of("mul").unwrap(), 0);
        assert_eq!(dimension.depth_of("de").unwrap(), 1);
        assert_eq!(dimension.depth_of("gsw").unwrap(), 2);
        assert_eq!(dimension.maximum_depth(), 2);
        assert_eq!(dimension.default_value().value, "mul");
    }

    #[test]
    fn test_direct_and_transitive_specializations() {
        let dimension = language_dimension();
        let direct: Vec<_> = dimension
            .specializations_of("mul")
            .unwrap()
            .into_iter()
            .map(|v| v.value.as_str())
            .collect();
        assert_eq!(direct, vec!["de", "en"]);

        let all: Vec<_> = dimension
            .all_specializations_of("mul")
            .unwrap()
            .into_iter()
            .map(|v| v.value.as_str())
            .collect();
        assert_eq!(all, vec!["de", "en", "gsw", "en_US"]);
        assert!(dimension.specializations_of("fr").unwrap().is_empty());
    }

    #[test]
    fn test_generalization_round_trips_specializations() {
        let dimension = language_dimension();
        for value in dimension.values() {
            for specialization in dimension.specializations_of(&value.value).unwrap() {
                let generalization = dimension
                    .generalization_of(&specialization.value)
                    .unwrap()
                    .unwrap();
                assert_eq!(generalization.value, value.value);
            }
        }
        assert!(dimension.generalization_of("mul").unwrap().is_none());
    }

    #[test]
    fn test_is_generalization_or_same() {
        let dimension = language_dimension();
        assert!(dimension.is_generalization_or_same("mul", "gsw").unwrap());
        assert!(dimension.is_generalization_or_same("gsw", "gsw").unwrap());
        assert!(!dimension.is_generalization_or_same("en", "gsw").unwrap());
        assert!(!dimension.is_generalization_or_same("gsw", "de").unwrap());
    }

    #[test]
    fn test_missing_or_empty_default_value_is_rejected() {
        let missing = ContentDimension::builder("language").value("de").build();
        assert!(matches!(missing, Err(DimensionError::DefaultValueMissing { .. })));

        let empty = ContentDimension::builder("language")
            .value("de")
            .default_value("  ")
            .build();
        assert!(matches!(empty, Err(DimensionError::DefaultValueMissing { .. })));

        let unknown = ContentDimension::builder("language")
            .value("de")
            .default_value("fr")
            .build();
        assert!(matches!(
            unknown,
            Err(DimensionError::DefaultValueNotConfigured { .. })
        ));
    }

    #[test]
    fn test_duplicate_and_unknown_generalization_are_rejected() {
        let duplicate = ContentDimension::builder("language")
            .value("de")
            .value("de")
            .default_value("de")
            .build();
        assert!(matches!(
            duplicate,
            Err(DimensionError::DuplicateDimensionValue { .. })
        ));

        let unknown = ContentDimension::builder("language")
            .value("de")
            .specialization("gsw", "alemannic")
            .default_value("de")
            .build();
        assert!(matches!(
            unknown,
            Err(DimensionError::UnknownGeneralization { .. })
        ));
    }

    #[test]
    fn test_generalization_cycle_is_rejected() {
        let cyclic = ContentDimension::builder("language")
            .value("mul")
            .specialization("a", "b")
            .specialization("b", "a")
            .default_value("mul")
            .build();
        assert!(matches!(
            cyclic,
            Err(DimensionError::GeneralizationCycle { .. })
        ));

        let self_cycle = ContentDimension::builder("language")
            .specialization("a", "a")
            .default_value("a")
            .build();
        assert!(matches!(
            self_cycle,
            Err(DimensionError::GeneralizationCycle { .. })
        ));
    }

    #[test]
    fn test_unknown_value_lookup() {
        let dimension = language_dimension();
        assert!(matches!(
            dimension.specializations_of("xx"),
            Err(DimensionError::UnknownDimensionValue { .. })
        ));
    }
}
