//! Workflow execution runtime
//!
//! This crate provides the graph interpreter that runs workflows when a
//! trigger fires, the capability registry it dispatches through, and the
//! authoring service that maintains workflow graphs.

pub mod condition;
mod engine;
mod graph;
mod management;
mod registry;
mod runtime;

pub use engine::{EngineConfig, WorkflowEngine};
pub use graph::WorkflowGraph;
pub use management::{ConnectionInput, NodeInput, WorkflowInput, WorkflowService};
pub use registry::{Capability, CapabilityInfo, CapabilityKind, CapabilityRegistry};
pub use runtime::{AutomationRuntime, RuntimeConfig};
