use crate::NodeId;
use thiserror::Error;

/// Failure raised by an action capability's `execute`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ActionError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
}

/// Everything that can end a workflow execution in `failed`.
///
/// These never reach the trigger caller; the engine records the display
/// string on the execution row.
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("no starting node found")]
    NoStartNode,

    #[error("Unknown action type: {0}")]
    UnknownActionType(String),

    #[error("Action node {0} has no action type")]
    MissingActionType(NodeId),

    #[error("Invalid action configuration: {}", .0.join(", "))]
    InvalidActionConfig(Vec<String>),

    #[error("Action {node_id} failed: {source}")]
    ActionExecution {
        node_id: NodeId,
        #[source]
        source: ActionError,
    },

    #[error("Trigger payload uses reserved context key '{0}'")]
    ReservedContextKey(&'static str),

    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Cycle detected at node {0}")]
    CycleDetected(NodeId),

    #[error("Maximum traversal depth of {0} exceeded")]
    MaxDepthExceeded(usize),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{0}")]
    Unhandled(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

/// Authoring-time domain error surfaced to whatever layer called the
/// management service.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ManagementError {
    #[error("{}", .0.join(", "))]
    Validation(Vec<String>),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Invalid {kind}: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}
