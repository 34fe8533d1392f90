//! Content graph value objects
//!
//! Value objects are immutable types that represent concepts in the content graph domain.
//! They are compared by value rather than identity and encapsulate domain validation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

macro_rules! string_identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new random identifier (UUID-based)
            pub fn new() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            /// Create an identifier from a string
            pub fn from_string(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the inner string value
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

string_identifier!(
    /// Identifies an isolated, ordered line of editorial history
    ContentStreamId
);

string_identifier!(
    /// Identifies a node aggregate across all dimension space points
    NodeAggregateId
);

string_identifier!(
    /// Identifies the user who initiated a command
    UserId
);

impl UserId {
    /// The user id used for system-initiated commands
    pub fn system() -> Self {
        Self::from_string("system")
    }
}

/// Name of a configured node type, e.g. `Acme.Site:Document.Page`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeTypeName(String);

impl NodeTypeName {
    /// The reserved node type every content stream's root aggregate is of
    pub const ROOT: &'static str = "Neos.ContentRepository:Root";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn root() -> Self {
        Self(Self::ROOT.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeTypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeTypeName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Name of a node below its parent
///
/// Names are case-insensitive and normalized to lower case.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodeName(String);

impl NodeName {
    /// Create a node name, rejecting empty names and names containing path separators
    pub fn new(name: impl Into<String>) -> Result<Self, InvalidNodeName> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(InvalidNodeName(name));
        }
        if trimmed.contains('/') {
            return Err(InvalidNodeName(name));
        }
        Ok(Self(trimmed.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for NodeName {
    type Error = InvalidNodeName;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<NodeName> for String {
    fn from(name: NodeName) -> Self {
        name.0
    }
}

/// Error for names that cannot be used as node names
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("\"{0}\" is not a valid node name")]
pub struct InvalidNodeName(pub String);

/// A relative path of node names, used to address tethered descendants
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodePath(String);

impl NodePath {
    pub fn from_name(name: &NodeName) -> Self {
        Self(name.as_str().to_string())
    }

    /// Append a path segment, e.g. `main` + `footer` = `main/footer`
    pub fn append(&self, name: &NodeName) -> Self {
        Self(format!("{}/{}", self.0, name.as_str()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodePath {
    fn from(s: &str) -> Self {
        Self(s.to_lowercase())
    }
}

/// How a node aggregate came into existence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeAggregateClassification {
    /// The single root aggregate of a content stream
    Root,
    /// A node created explicitly by a command
    Regular,
    /// A node auto-created together with its parent
    Tethered,
}

impl NodeAggregateClassification {
    pub fn is_root(&self) -> bool {
        matches!(self, Self::Root)
    }

    pub fn is_tethered(&self) -> bool {
        matches!(self, Self::Tethered)
    }
}

impl fmt::Display for NodeAggregateClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => write!(f, "root"),
            Self::Regular => write!(f, "regular"),
            Self::Tethered => write!(f, "tethered"),
        }
    }
}

/// Serialized property values, ordered by property name for replay-stable serialization
pub type PropertyValues = BTreeMap<String, serde_json::Value>;

#[cfg(test)]
mod tests {
    use super::*;

    /// Test Coverage
    ///
    /// ```mermaid
    /// graph TD
    ///     VO[Value Objects] --> ID[Identifiers]
    ///     VO --> NN[Node Names]
    ///     VO --> NP[Node Paths]
    ///     VO --> C[Classification]
    /// ```

    #[test]
    fn test_identifiers_compare_by_value() {
        let a = NodeAggregateId::from_string("sir-david");
        let b = NodeAggregateId::from("sir-david");
        assert_eq!(a, b);
        assert_ne!(NodeAggregateId::new(), NodeAggregateId::new());
    }

    #[test]
    fn test_node_name_is_normalized() {
        let name = NodeName::new(" Main ").unwrap();
        assert_eq!(name.as_str(), "main");
        assert!(NodeName::new("").is_err());
        assert!(NodeName::new("a/b").is_err());
    }

    #[test]
    fn test_node_name_deserialization_validates() {
        let name: NodeName = serde_json::from_str("\"Footer\"").unwrap();
        assert_eq!(name.as_str(), "footer");
        assert!(serde_json::from_str::<NodeName>("\"\"").is_err());
    }

    #[test]
    fn test_node_path_append() {
        let main = NodeName::new("main").unwrap();
        let footer = NodeName::new("footer").unwrap();
        let path = NodePath::from_name(&main).append(&footer);
        assert_eq!(path.as_str(), "main/footer");
    }

    #[test]
    fn test_classification_serialization() {
        let json = serde_json::to_string(&NodeAggregateClassification::Tethered).unwrap();
        assert_eq!(json, "\"tethered\"");
    }
}
