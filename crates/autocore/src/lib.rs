//! Core abstractions for the automation engine
//!
//! This crate provides the workflow data model, the capability traits that
//! triggers and actions implement, the persistence trait the engine and the
//! management service share, and the execution event bus. It contains no
//! traversal logic.

mod capability;
mod error;
pub mod events;
mod execution;
pub mod store;
pub mod value;
mod workflow;

pub use capability::{Action, Config, ConfigField, Context, FieldType, Trigger, TriggerVariable};
pub use error::{ActionError, ExecutionError, ManagementError, ParseEnumError, StoreError};
pub use events::{EventBus, ExecutionEvent};
pub use execution::{ExecutionId, ExecutionStatus, WorkflowExecution, ACTIONS_KEY};
pub use store::{MemoryStore, WorkflowStore};
pub use value::ValueExt;
pub use workflow::{
    ConditionType, ConnectionId, NodeId, NodeType, OrganizationId, Position, TriggerType,
    UserId, Workflow, WorkflowConnection, WorkflowId, WorkflowNode, WorkflowStatus,
};
