use crate::{ExecutionId, NodeId, WorkflowId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Events emitted while a workflow executes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ExecutionEvent {
    ExecutionStarted {
        execution_id: ExecutionId,
        workflow_id: WorkflowId,
        trigger_type: String,
        timestamp: DateTime<Utc>,
    },
    NodeEntered {
        execution_id: ExecutionId,
        node_id: NodeId,
        node_type: String,
        depth: usize,
        timestamp: DateTime<Utc>,
    },
    ActionCompleted {
        execution_id: ExecutionId,
        node_id: NodeId,
        action_type: String,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },
    ConditionEvaluated {
        execution_id: ExecutionId,
        node_id: NodeId,
        result: bool,
        timestamp: DateTime<Utc>,
    },
    EdgeSkipped {
        execution_id: ExecutionId,
        from_node: NodeId,
        to_node: NodeId,
        timestamp: DateTime<Utc>,
    },
    ExecutionCompleted {
        execution_id: ExecutionId,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },
    ExecutionFailed {
        execution_id: ExecutionId,
        error: String,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },
}

impl ExecutionEvent {
    pub fn execution_id(&self) -> ExecutionId {
        match self {
            Self::ExecutionStarted { execution_id, .. }
            | Self::NodeEntered { execution_id, .. }
            | Self::ActionCompleted { execution_id, .. }
            | Self::ConditionEvaluated { execution_id, .. }
            | Self::EdgeSkipped { execution_id, .. }
            | Self::ExecutionCompleted { execution_id, .. }
            | Self::ExecutionFailed { execution_id, .. } => *execution_id,
        }
    }
}

/// Broadcast bus for execution events. Sending with no subscribers is not
/// an error.
pub struct EventBus {
    sender: broadcast::Sender<ExecutionEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ExecutionEvent> {
        self.sender.subscribe()
    }

    pub fn emit(&self, event: ExecutionEvent) {
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1000)
    }
}
