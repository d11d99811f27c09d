#![allow(dead_code)]

use async_trait::async_trait;
use autocore::{
    Action, ActionError, Config, ConfigField, Context, FieldType, OrganizationId, TriggerType,
    UserId, Workflow, WorkflowConnection, WorkflowNode, WorkflowStatus, WorkflowStore,
};
use autoruntime::CapabilityRegistry;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Shared log of (action id, node config) pairs, in call order
pub type CallLog = Arc<Mutex<Vec<(String, Config)>>>;

/// Action that records each call and returns `{ "ok": true, "seen": n }`
/// where `n` is the number of earlier action results in the context.
pub struct RecordingAction {
    pub id: &'static str,
    pub calls: CallLog,
}

#[async_trait]
impl Action for RecordingAction {
    fn id(&self) -> &str {
        self.id
    }

    fn name(&self) -> &str {
        self.id
    }

    fn category(&self) -> &str {
        "test"
    }

    async fn execute(&self, config: &Config, context: &Context) -> Result<Value, ActionError> {
        self.calls
            .lock()
            .unwrap()
            .push((self.id.to_string(), config.clone()));
        let seen = context
            .get("actions")
            .and_then(Value::as_object)
            .map_or(0, |a| a.len());
        Ok(json!({ "ok": true, "seen": seen }))
    }
}

/// Action requiring a string `to` field
pub struct EmailAction {
    pub calls: CallLog,
}

#[async_trait]
impl Action for EmailAction {
    fn id(&self) -> &str {
        "send_email"
    }

    fn name(&self) -> &str {
        "Send email"
    }

    fn category(&self) -> &str {
        "communication"
    }

    fn config_schema(&self) -> Vec<ConfigField> {
        vec![
            ConfigField::required("to", FieldType::String),
            ConfigField::optional("subject", FieldType::String),
        ]
    }

    async fn execute(&self, config: &Config, _context: &Context) -> Result<Value, ActionError> {
        self.calls
            .lock()
            .unwrap()
            .push(("send_email".to_string(), config.clone()));
        Ok(json!({ "sent": true }))
    }
}

pub struct FailingAction;

#[async_trait]
impl Action for FailingAction {
    fn id(&self) -> &str {
        "explode"
    }

    fn name(&self) -> &str {
        "Explode"
    }

    async fn execute(&self, _config: &Config, _context: &Context) -> Result<Value, ActionError> {
        Err(ActionError::ExecutionFailed("mail server unreachable".to_string()))
    }
}

pub struct PanickingAction;

#[async_trait]
impl Action for PanickingAction {
    fn id(&self) -> &str {
        "panic"
    }

    fn name(&self) -> &str {
        "Panic"
    }

    async fn execute(&self, _config: &Config, _context: &Context) -> Result<Value, ActionError> {
        panic!("capability bug")
    }
}

/// Action that sleeps for a while before succeeding
pub struct SlowAction {
    pub delay_ms: u64,
}

#[async_trait]
impl Action for SlowAction {
    fn id(&self) -> &str {
        "slow"
    }

    fn name(&self) -> &str {
        "Slow"
    }

    async fn execute(&self, _config: &Config, _context: &Context) -> Result<Value, ActionError> {
        tokio::time::sleep(std::time::Duration::from_millis(self.delay_ms)).await;
        Ok(json!({ "slept_ms": self.delay_ms }))
    }
}

pub fn test_registry(calls: &CallLog) -> CapabilityRegistry {
    let mut registry = CapabilityRegistry::new();
    registry.register_action(Arc::new(RecordingAction {
        id: "log",
        calls: calls.clone(),
    }));
    registry.register_action(Arc::new(RecordingAction {
        id: "tag",
        calls: calls.clone(),
    }));
    registry.register_action(Arc::new(EmailAction {
        calls: calls.clone(),
    }));
    registry.register_action(Arc::new(FailingAction));
    registry.register_action(Arc::new(PanickingAction));
    registry.register_action(Arc::new(SlowAction { delay_ms: 300 }));
    registry
}

pub fn called(calls: &CallLog) -> Vec<String> {
    calls.lock().unwrap().iter().map(|(id, _)| id.clone()).collect()
}

pub fn payload(value: Value) -> serde_json::Map<String, Value> {
    value.as_object().cloned().unwrap()
}

pub fn org() -> OrganizationId {
    Uuid::new_v4()
}

pub fn user() -> UserId {
    Uuid::new_v4()
}

pub async fn insert_workflow(
    store: &dyn WorkflowStore,
    organization: OrganizationId,
    trigger_type: TriggerType,
) -> Workflow {
    store
        .insert_workflow(
            Workflow::new(organization, user(), "Test workflow", trigger_type)
                .with_status(WorkflowStatus::Active),
        )
        .await
        .unwrap()
}

pub async fn insert_node(store: &dyn WorkflowStore, node: WorkflowNode) -> WorkflowNode {
    store.insert_node(node).await.unwrap()
}

pub async fn connect(store: &dyn WorkflowStore, connection: WorkflowConnection) {
    store.insert_connection(connection).await.unwrap();
}
