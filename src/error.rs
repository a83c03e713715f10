use crate::tree::NodeId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TreeError>;

/// Errors raised while loading a tree or placing sequences on it.
#[derive(Debug, Error)]
pub enum TreeError {
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Query '{query}' references unknown node id {node_id}")]
    UnknownAttachmentTarget { query: String, node_id: NodeId },

    #[error("Inconsistent mutation state on node '{node}': {detail}")]
    InconsistentMutationState { node: String, detail: String },

    #[error("Invalid tree structure: {0}")]
    InvalidStructure(String),

    #[error("Node id {0} is not part of the tree")]
    UnknownNode(NodeId),
}

impl TreeError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        TreeError::MalformedInput(message.into())
    }

    /// Per-query errors that a batch may skip over; everything else is fatal.
    pub fn is_per_query(&self) -> bool {
        matches!(self, TreeError::UnknownAttachmentTarget { .. })
    }
}

impl From<serde_json::Error> for TreeError {
    fn from(err: serde_json::Error) -> Self {
        TreeError::MalformedInput(err.to_string())
    }
}
