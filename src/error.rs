//! Error types for panel and host-tree operations.
//!
//! ERROR HANDLING
//! ==============
//! Every failure is synchronous and local to the call that raised it. The
//! panel keeps no error state and never retries. Forgiving cases (a bound key
//! missing from the model, a radio value with no matching option, disabling
//! an already-disabled control) are not errors at all.

use crate::host::NodeId;

/// Failure raised by the host tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    /// The node id was never allocated or its subtree was detached.
    #[error("unknown host node: {0}")]
    UnknownNode(NodeId),
    /// The node already has a parent and cannot be mounted twice.
    #[error("host node already mounted: {0}")]
    AlreadyMounted(NodeId),
}

/// Failure raised by a [`crate::panel::Panel`] operation.
#[derive(Debug, thiserror::Error)]
pub enum PanelError {
    /// The descriptor's kind is not one of the fixed control kinds.
    #[error("unknown control kind: {0}")]
    UnknownControlKind(String),
    /// The id or reference was never registered, or was removed.
    #[error("unknown control: {0}")]
    UnknownControl(String),
    /// An explicit id collides with a control that is still live.
    #[error("duplicate control id: {0}")]
    DuplicateControl(String),
    /// The descriptor JSON carries a known kind but malformed attributes.
    #[error("invalid descriptor: {0}")]
    InvalidDescriptor(#[from] serde_json::Error),
    /// Model text handed to `bind_to_json` is not a JSON object.
    #[error("invalid binding model: {0}")]
    InvalidModel(String),
    /// The host tree rejected a mutation.
    #[error("host error: {0}")]
    Host(#[from] HostError),
}
