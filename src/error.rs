//! Error types for graph editing and catalog construction.

use thiserror::Error;

use crate::model::NodeId;

/// Errors raised while mutating the program graph.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditorError {
    #[error("unknown block type: {0}")]
    UnknownBlockType(String),

    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    #[error("node {0} already exists")]
    DuplicateNode(NodeId),

    #[error("node {node} has no socket named '{socket}'")]
    UnknownSocket { node: NodeId, socket: String },

    #[error("connection target of {0} is already occupied")]
    Occupied(String),

    #[error("node {child} cannot attach to {target}: {reason}")]
    Incompatible {
        child: NodeId,
        target: String,
        reason: &'static str,
    },

    #[error("node {0} is still connected")]
    NotDetached(NodeId),

    #[error("malformed structural state: {0}")]
    MalformedMutation(String),

    #[error("changing field '{field}' of {node} would drop a connected socket")]
    ShapeConflict { node: NodeId, field: String },
}

/// Errors raised when a legacy template cannot become a catalog option.
///
/// These are programming errors in the template tables: the offending
/// template is dropped and the catalog build continues.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("template has an empty display text")]
    MissingDisplayText,

    #[error("template '{0}' has no block type")]
    MissingBlockType(String),

    #[error("template '{display_text}': {source}")]
    Mutation {
        display_text: String,
        #[source]
        source: EditorError,
    },
}
