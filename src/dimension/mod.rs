//! Content dimensions
//!
//! A content dimension is a named axis of content variation (e.g. "language") with a
//! set of discrete values. Values may specialize a more general value of the same
//! dimension (e.g. "de_CH" specializes "de"), forming one tree per dimension.

mod content_dimension;
mod source;

pub use content_dimension::{ContentDimension, ContentDimensionBuilder};
pub use source::{
    ContentDimensionConfiguration, ContentDimensionSource, ContentDimensionValueConfiguration,
};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a content dimension, unique within a content repository
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentDimensionId(String);

impl ContentDimensionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentDimensionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ContentDimensionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Constraints a dimension value imposes on the values of one other dimension
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentDimensionConstraints {
    /// Whether values without an explicit restriction may be combined
    pub is_wildcard_allowed: bool,
    /// Explicit allow (`true`) or deny (`false`) per foreign value
    pub identifier_restrictions: IndexMap<String, bool>,
}

impl ContentDimensionConstraints {
    pub fn new(is_wildcard_allowed: bool, identifier_restrictions: IndexMap<String, bool>) -> Self {
        Self {
            is_wildcard_allowed,
            identifier_restrictions,
        }
    }

    /// Build constraints from the configuration shape `{"*": bool, "<value>": bool}`
    pub fn from_configuration(configuration: &IndexMap<String, bool>) -> Self {
        let mut is_wildcard_allowed = true;
        let mut identifier_restrictions = IndexMap::new();
        for (key, allowed) in configuration {
            if key == "*" {
                is_wildcard_allowed = *allowed;
            } else {
                identifier_restrictions.insert(key.clone(), *allowed);
            }
        }
        Self::new(is_wildcard_allowed, identifier_restrictions)
    }

    /// An explicit restriction wins; otherwise the wildcard decides
    pub fn allows(&self, value: &str) -> bool {
        self.identifier_restrictions
            .get(value)
            .copied()
            .unwrap_or(self.is_wildcard_allowed)
    }
}

/// All constraints of one dimension value, indexed by the constrained dimension
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentDimensionConstraintSet(IndexMap<ContentDimensionId, ContentDimensionConstraints>);

impl ContentDimensionConstraintSet {
    pub fn new(constraints: IndexMap<ContentDimensionId, ContentDimensionConstraints>) -> Self {
        Self(constraints)
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, dimension_id: &ContentDimensionId) -> Option<&ContentDimensionConstraints> {
        self.0.get(dimension_id)
    }

    /// Dimensions without configured constraints allow every value
    pub fn allows_combination_with(&self, dimension_id: &ContentDimensionId, value: &str) -> bool {
        self.0
            .get(dimension_id)
            .map(|constraints| constraints.allows(value))
            .unwrap_or(true)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ContentDimensionId, &ContentDimensionConstraints)> {
        self.0.iter()
    }
}

/// One discrete value of a content dimension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentDimensionValue {
    /// The value token, unique within its dimension
    pub value: String,
    /// 0 for the most general values
    pub specialization_depth: u32,
    /// Compatibility with values of other dimensions
    pub constraints: ContentDimensionConstraintSet,
    /// Free-form configuration attached to the value
    #[serde(default)]
    pub configuration: serde_json::Map<String, serde_json::Value>,
}

impl ContentDimensionValue {
    pub fn constraints_for(&self, dimension_id: &ContentDimensionId) -> Option<&ContentDimensionConstraints> {
        self.constraints.get(dimension_id)
    }

    pub fn can_be_combined_with(&self, dimension_id: &ContentDimensionId, value: &str) -> bool {
        self.constraints.allows_combination_with(dimension_id, value)
    }

    /// Look up a configuration value by dotted path, e.g. `resolution.uriPathSegment`
    pub fn configuration_value(&self, path: &str) -> Option<&serde_json::Value> {
        configuration_value(&self.configuration, path)
    }
}

impl fmt::Display for ContentDimensionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

pub(crate) fn configuration_value<'a>(
    configuration: &'a serde_json::Map<String, serde_json::Value>,
    path: &str,
) -> Option<&'a serde_json::Value> {
    let mut segments = path.split('.');
    let mut current = configuration.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Result type for dimension operations
pub type DimensionResult<T> = Result<T, DimensionError>;

/// Errors raised while building or querying content dimensions
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DimensionError {
    #[error("Content dimension identifier must not be empty")]
    EmptyDimensionIdentifier,

    #[error("Content dimension \"{dimension}\" has an empty value token")]
    EmptyDimensionValue { dimension: ContentDimensionId },

    #[error("Content dimension \"{dimension}\" has no default value")]
    DefaultValueMissing { dimension: ContentDimensionId },

    #[error("Default value \"{value}\" of content dimension \"{dimension}\" is not a configured value")]
    DefaultValueNotConfigured {
        dimension: ContentDimensionId,
        value: String,
    },

    #[error("Content dimension \"{dimension}\" declares value \"{value}\" more than once")]
    DuplicateDimensionValue {
        dimension: ContentDimensionId,
        value: String,
    },

    #[error("Value \"{value}\" of content dimension \"{dimension}\" specializes unknown value \"{generalization}\"")]
    UnknownGeneralization {
        dimension: ContentDimensionId,
        value: String,
        generalization: String,
    },

    #[error("Value \"{value}\" of content dimension \"{dimension}\" is part of a generalization cycle")]
    GeneralizationCycle {
        dimension: ContentDimensionId,
        value: String,
    },

    #[error("Value \"{value}\" of content dimension \"{dimension}\" constrains unknown dimension \"{target}\"")]
    ConstraintOnUnknownDimension {
        dimension: ContentDimensionId,
        value: String,
        target: ContentDimensionId,
    },

    #[error("Content dimension configuration is malformed: {0}")]
    MalformedConfiguration(String),

    #[error("Unknown content dimension \"{0}\"")]
    UnknownDimensionIdentifier(ContentDimensionId),

    #[error("Unknown value \"{value}\" in content dimension \"{dimension}\"")]
    UnknownDimensionValue {
        dimension: ContentDimensionId,
        value: String,
    },
}

impl DimensionError {
    /// Whether the error stems from bad configuration rather than a bad lookup
    pub fn is_configuration_error(&self) -> bool {
        !matches!(
            self,
            Self::UnknownDimensionIdentifier(_) | Self::UnknownDimensionValue { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_constraints_explicit_restriction_wins_over_wildcard() {
        let mut configuration = IndexMap::new();
        configuration.insert("*".to_string(), false);
        configuration.insert("valueB1".to_string(), true);
        configuration.insert("valueB2".to_string(), false);
        let constraints = ContentDimensionConstraints::from_configuration(&configuration);

        assert!(!constraints.is_wildcard_allowed);
        assert!(constraints.allows("valueB1"));
        assert!(!constraints.allows("valueB2"));
        assert!(!constraints.allows("valueB3"));
    }

    #[test]
    fn test_wildcard_defaults_to_allowed() {
        let mut configuration = IndexMap::new();
        configuration.insert("valueB2".to_string(), false);
        let constraints = ContentDimensionConstraints::from_configuration(&configuration);

        assert!(constraints.is_wildcard_allowed);
        assert!(constraints.allows("valueB3"));
        assert!(!constraints.allows("valueB2"));
    }

    #[test]
    fn test_unconstrained_dimension_allows_everything() {
        let set = ContentDimensionConstraintSet::empty();
        assert!(set.allows_combination_with(&"market".into(), "CH"));
    }

    #[test]
    fn test_configuration_value_by_path() {
        let configuration = json!({"resolution": {"uriPathSegment": "de"}});
        let map = configuration.as_object().unwrap();
        assert_eq!(
            configuration_value(map, "resolution.uriPathSegment"),
            Some(&json!("de"))
        );
        assert_eq!(configuration_value(map, "resolution.missing"), None);
    }
}
