//! Content repository commands
//!
//! Commands represent intent to modify a content stream. They are processed by the
//! node aggregate command handler, which validates them against the read-side graph
//! and emits the corresponding events.

mod id_mapping;
mod node_aggregate;

pub use id_mapping::{NodeAggregateIdMapping, NodeAggregateIdsByNodePaths, NodeSubtreeSnapshot};
pub use node_aggregate::{
    CopyNodesRecursively, CreateContentStream, CreateNodeAggregateWithNode,
    CreateRootNodeAggregateWithNode,
};

use crate::dimension_space::{DimensionSpacePoint, DimensionSpacePointSet};
use crate::node_type::NodeTypeError;
use crate::value_objects::{ContentStreamId, NodeAggregateId, NodeName, NodePath, NodeTypeName};
use crate::variation::VariationGraphError;
use serde::{Deserialize, Serialize};

/// All commands the content repository accepts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ContentRepositoryCommand {
    CreateContentStream(CreateContentStream),
    CreateRootNodeAggregateWithNode(CreateRootNodeAggregateWithNode),
    CreateNodeAggregateWithNode(CreateNodeAggregateWithNode),
    CopyNodesRecursively(CopyNodesRecursively),
}

impl ContentRepositoryCommand {
    /// The content stream the command writes to
    pub fn content_stream_id(&self) -> &ContentStreamId {
        match self {
            Self::CreateContentStream(command) => &command.content_stream_id,
            Self::CreateRootNodeAggregateWithNode(command) => &command.content_stream_id,
            Self::CreateNodeAggregateWithNode(command) => &command.content_stream_id,
            Self::CopyNodesRecursively(command) => &command.content_stream_id,
        }
    }

    pub fn command_type(&self) -> &'static str {
        match self {
            Self::CreateContentStream(_) => "CreateContentStream",
            Self::CreateRootNodeAggregateWithNode(_) => "CreateRootNodeAggregateWithNode",
            Self::CreateNodeAggregateWithNode(_) => "CreateNodeAggregateWithNode",
            Self::CopyNodesRecursively(_) => "CopyNodesRecursively",
        }
    }
}

impl From<CreateContentStream> for ContentRepositoryCommand {
    fn from(command: CreateContentStream) -> Self {
        Self::CreateContentStream(command)
    }
}

impl From<CreateRootNodeAggregateWithNode> for ContentRepositoryCommand {
    fn from(command: CreateRootNodeAggregateWithNode) -> Self {
        Self::CreateRootNodeAggregateWithNode(command)
    }
}

impl From<CreateNodeAggregateWithNode> for ContentRepositoryCommand {
    fn from(command: CreateNodeAggregateWithNode) -> Self {
        Self::CreateNodeAggregateWithNode(command)
    }
}

impl From<CopyNodesRecursively> for ContentRepositoryCommand {
    fn from(command: CopyNodesRecursively) -> Self {
        Self::CopyNodesRecursively(command)
    }
}

/// Broad classification of command errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// The repository is misconfigured; fix the configuration and rebuild
    Configuration,
    /// The command refers to state that does not (or already does) exist
    PreconditionViolation,
    /// The command would break a structural rule of the content graph
    ConstraintViolation,
    /// Another writer appended to the content stream first
    ConcurrencyConflict,
    /// An internal invariant does not hold
    InvariantBug,
}

/// Result type for command handling
pub type CommandResult<T> = Result<T, NodeAggregateCommandError>;

/// Errors that can occur during command handling
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NodeAggregateCommandError {
    #[error("Variation graph error: {0}")]
    VariationGraph(#[from] VariationGraphError),

    #[error("Node type configuration error: {0}")]
    NodeTypeConfiguration(NodeTypeError),

    #[error("Content stream \"{0}\" does not exist yet")]
    ContentStreamDoesNotExistYet(ContentStreamId),

    #[error("Content stream \"{0}\" already exists")]
    ContentStreamAlreadyExists(ContentStreamId),

    #[error("Dimension space point {0} is not part of the allowed dimension subspace")]
    DimensionSpacePointNotFound(DimensionSpacePoint),

    #[error("Node type \"{0}\" is not configured")]
    NodeTypeNotFound(NodeTypeName),

    #[error("Node type \"{0}\" is abstract")]
    NodeTypeIsAbstract(NodeTypeName),

    #[error("Node type \"{0}\" is of type root")]
    NodeTypeIsOfTypeRoot(NodeTypeName),

    #[error("Node type \"{0}\" is not of type root")]
    NodeTypeIsNotOfTypeRoot(NodeTypeName),

    #[error("Tethered node \"{node_name}\" of node type \"{node_type}\" has unknown type \"{tethered_node_type}\"")]
    TetheredNodeTypeNotFound {
        node_type: NodeTypeName,
        node_name: NodeName,
        tethered_node_type: NodeTypeName,
    },

    #[error("Tethered node \"{node_name}\" of node type \"{node_type}\" is of type root")]
    TetheredNodeTypeIsOfTypeRoot {
        node_type: NodeTypeName,
        node_name: NodeName,
    },

    #[error("Root node aggregate of type \"{0}\" already exists in this content stream")]
    RootNodeAggregateTypeIsAlreadyOccupied(NodeTypeName),

    #[error("Node aggregate \"{0}\" already exists")]
    NodeAggregateCurrentlyExists(NodeAggregateId),

    #[error("Node aggregate \"{0}\" does currently not exist")]
    NodeAggregateCurrentlyDoesNotExist(NodeAggregateId),

    #[error("No new node aggregate id assigned for {} copied node(s)", .0.len())]
    IncompleteNodeAggregateIdMapping(Vec<NodeAggregateId>),

    #[error("No node aggregate id assigned for tethered descendant \"{0}\"")]
    MissingTetheredDescendantId(NodePath),

    #[error("Node aggregate \"{node_aggregate_id}\" does not cover dimension space point {point}")]
    DimensionSpacePointNotCoveredByParent {
        node_aggregate_id: NodeAggregateId,
        point: DimensionSpacePoint,
    },

    #[error("Succeeding sibling \"{node_aggregate_id}\" does not cover dimension space point {point}")]
    DimensionSpacePointNotCoveredBySibling {
        node_aggregate_id: NodeAggregateId,
        point: DimensionSpacePoint,
    },

    #[error("Node type \"{node_type}\" is not allowed for child nodes of type \"{parent_node_type}\"")]
    NodeTypeNotAllowedAsChild {
        parent_node_type: NodeTypeName,
        node_type: NodeTypeName,
    },

    #[error("Node type \"{node_type}\" does not match \"{expected}\" configured for tethered node \"{node_name}\" of \"{parent_node_type}\"")]
    TetheredNodeTypeMismatch {
        parent_node_type: NodeTypeName,
        node_name: NodeName,
        expected: NodeTypeName,
        node_type: NodeTypeName,
    },

    #[error("Node type \"{node_type}\" is not allowed below tethered node \"{tethered_node_name}\" of \"{grandparent_node_type}\"")]
    NodeTypeNotAllowedBelowTetheredNode {
        grandparent_node_type: NodeTypeName,
        tethered_node_name: NodeName,
        node_type: NodeTypeName,
    },

    #[error("Node name \"{node_name}\" is reserved for a tethered node of \"{parent_node_type}\"")]
    NodeNameIsReservedForTetheredNode {
        parent_node_type: NodeTypeName,
        node_name: NodeName,
    },

    #[error("Child node name \"{node_name}\" is already occupied for parent \"{parent_node_aggregate_id}\" in {points}")]
    NodeNameIsAlreadyOccupied {
        node_name: NodeName,
        parent_node_aggregate_id: NodeAggregateId,
        points: DimensionSpacePointSet,
    },

    #[error("Property \"{property}\" cannot be set on node type \"{node_type}\": {reason}")]
    PropertyCannotBeSet {
        property: String,
        node_type: NodeTypeName,
        reason: String,
    },

    #[error("Content stream \"{content_stream_id}\" expected version {expected}, found {actual}")]
    ConcurrencyConflict {
        content_stream_id: ContentStreamId,
        expected: String,
        actual: u64,
    },

    #[error("Invariant violated: {0}")]
    InvariantBug(String),
}

impl NodeAggregateCommandError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::VariationGraph(VariationGraphError::SubgraphNotRegistered(_)) => {
                ErrorKind::PreconditionViolation
            }
            Self::VariationGraph(_) | Self::NodeTypeConfiguration(_) => ErrorKind::Configuration,
            Self::ContentStreamDoesNotExistYet(_)
            | Self::ContentStreamAlreadyExists(_)
            | Self::DimensionSpacePointNotFound(_)
            | Self::NodeTypeNotFound(_)
            | Self::NodeTypeIsAbstract(_)
            | Self::NodeTypeIsOfTypeRoot(_)
            | Self::NodeTypeIsNotOfTypeRoot(_)
            | Self::TetheredNodeTypeNotFound { .. }
            | Self::TetheredNodeTypeIsOfTypeRoot { .. }
            | Self::RootNodeAggregateTypeIsAlreadyOccupied(_)
            | Self::NodeAggregateCurrentlyExists(_)
            | Self::NodeAggregateCurrentlyDoesNotExist(_)
            | Self::IncompleteNodeAggregateIdMapping(_)
            | Self::MissingTetheredDescendantId(_) => ErrorKind::PreconditionViolation,
            Self::DimensionSpacePointNotCoveredByParent { .. }
            | Self::DimensionSpacePointNotCoveredBySibling { .. }
            | Self::NodeTypeNotAllowedAsChild { .. }
            | Self::TetheredNodeTypeMismatch { .. }
            | Self::NodeTypeNotAllowedBelowTetheredNode { .. }
            | Self::NodeNameIsReservedForTetheredNode { .. }
            | Self::NodeNameIsAlreadyOccupied { .. }
            | Self::PropertyCannotBeSet { .. } => ErrorKind::ConstraintViolation,
            Self::ConcurrencyConflict { .. } => ErrorKind::ConcurrencyConflict,
            Self::InvariantBug(_) => ErrorKind::InvariantBug,
        }
    }
}

impl From<NodeTypeError> for NodeAggregateCommandError {
    fn from(error: NodeTypeError) -> Self {
        match error {
            NodeTypeError::NodeTypeNotFound(name) => Self::NodeTypeNotFound(name),
            other => Self::NodeTypeConfiguration(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test Coverage
    ///
    /// ```mermaid
    /// graph TD
    ///     C[Commands] --> E[Closed Enum]
    ///     E --> S[Serialization]
    ///     C --> K[Error Kinds]
    /// ```

    #[test]
    fn test_command_serialization() {
        let command: ContentRepositoryCommand = CreateContentStream {
            content_stream_id: ContentStreamId::from("cs-1"),
            initiating_user_id: "editor".into(),
        }
        .into();

        let serialized = serde_json::to_string(&command).unwrap();
        assert!(serialized.contains("\"type\":\"CreateContentStream\""));
        let deserialized: ContentRepositoryCommand = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized, command);
        assert_eq!(deserialized.content_stream_id().as_str(), "cs-1");
        assert_eq!(deserialized.command_type(), "CreateContentStream");
    }

    #[test]
    fn test_error_kinds() {
        let stream = ContentStreamId::from("cs-1");
        assert_eq!(
            NodeAggregateCommandError::ContentStreamDoesNotExistYet(stream.clone()).kind(),
            ErrorKind::PreconditionViolation
        );
        assert_eq!(
            NodeAggregateCommandError::DimensionSpacePointNotCoveredByParent {
                node_aggregate_id: "parent".into(),
                point: DimensionSpacePoint::empty(),
            }
            .kind(),
            ErrorKind::ConstraintViolation
        );
        assert_eq!(
            NodeAggregateCommandError::ConcurrencyConflict {
                content_stream_id: stream,
                expected: "3".to_string(),
                actual: 4,
            }
            .kind(),
            ErrorKind::ConcurrencyConflict
        );
        assert_eq!(
            NodeAggregateCommandError::from(VariationGraphError::AmbiguousFallback {
                variant: DimensionSpacePoint::empty(),
                weight: 1,
            })
            .kind(),
            ErrorKind::Configuration
        );
    }

    #[test]
    fn test_node_type_not_found_is_a_precondition_violation() {
        let error = NodeAggregateCommandError::from(NodeTypeError::NodeTypeNotFound(
            NodeTypeName::new("Acme:Missing"),
        ));
        assert_eq!(error, NodeAggregateCommandError::NodeTypeNotFound(NodeTypeName::new("Acme:Missing")));
        assert_eq!(error.kind(), ErrorKind::PreconditionViolation);
    }
}
