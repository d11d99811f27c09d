use crate::{NodeId, WorkflowId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

pub type ExecutionId = Uuid;

/// Context key under which action results are stored, keyed by node id.
pub const ACTIONS_KEY: &str = "actions";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Running,
    Completed,
    Failed,
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// One run of a workflow against one trigger firing.
///
/// Created `running` when the trigger fires and moved exactly once to
/// `completed` or `failed`. A terminal execution is never re-opened.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowExecution {
    pub id: ExecutionId,
    pub workflow_id: WorkflowId,
    pub trigger_type: String,
    pub trigger_data: Map<String, Value>,
    pub context: Map<String, Value>,
    pub status: ExecutionStatus,
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl WorkflowExecution {
    /// New `running` execution whose context starts as a copy of the payload.
    pub fn start(
        workflow_id: WorkflowId,
        trigger_type: impl Into<String>,
        trigger_data: Map<String, Value>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            workflow_id,
            trigger_type: trigger_type.into(),
            context: trigger_data.clone(),
            trigger_data,
            status: ExecutionStatus::Running,
            error: None,
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Store an action result at `context.actions[node_id]`.
    ///
    /// The engine refuses payloads that already carry [`ACTIONS_KEY`], so
    /// the key is always owned by this method.
    pub fn record_action(&mut self, node_id: NodeId, result: Value) {
        let actions = self
            .context
            .entry(ACTIONS_KEY)
            .or_insert_with(|| Value::Object(Map::new()));
        if !actions.is_object() {
            *actions = Value::Object(Map::new());
        }
        if let Value::Object(map) = actions {
            map.insert(node_id.to_string(), result);
        }
    }

    /// Action results recorded so far, in traversal order.
    pub fn actions(&self) -> Option<&Map<String, Value>> {
        self.context.get(ACTIONS_KEY).and_then(Value::as_object)
    }

    pub fn action_result(&self, node_id: NodeId) -> Option<&Value> {
        self.actions()?.get(&node_id.to_string())
    }

    pub fn complete(&mut self) {
        self.status = ExecutionStatus::Completed;
        self.completed_at = Some(Utc::now());
    }

    pub fn fail(&mut self, error: impl Into<String>) {
        self.status = ExecutionStatus::Failed;
        self.error = Some(error.into());
        self.completed_at = Some(Utc::now());
    }
}
