use crate::engine::{EngineConfig, WorkflowEngine};
use crate::management::WorkflowService;
use crate::registry::CapabilityRegistry;
use autocore::{
    EventBus, ExecutionEvent, ExecutionId, ExecutionStatus, MemoryStore, OrganizationId,
    StoreError, TriggerType, WorkflowId, WorkflowStore,
};
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Main entry point: registry, engine, authoring service and event bus over
/// one store
pub struct AutomationRuntime {
    registry: Arc<CapabilityRegistry>,
    store: Arc<dyn WorkflowStore>,
    events: Arc<EventBus>,
    engine: WorkflowEngine,
    service: WorkflowService,
}

impl AutomationRuntime {
    /// Runtime over an in-memory store
    pub fn new(registry: CapabilityRegistry) -> Self {
        Self::with_store(
            Arc::new(registry),
            Arc::new(MemoryStore::new()),
            RuntimeConfig::default(),
        )
    }

    pub fn with_store(
        registry: Arc<CapabilityRegistry>,
        store: Arc<dyn WorkflowStore>,
        config: RuntimeConfig,
    ) -> Self {
        let events = Arc::new(EventBus::new(config.event_buffer_size));
        let engine = WorkflowEngine::new(
            registry.clone(),
            store.clone(),
            events.clone(),
            config.engine,
        );
        let service = WorkflowService::new(store.clone(), registry.clone());

        Self {
            registry,
            store,
            events,
            engine,
            service,
        }
    }

    pub fn registry(&self) -> &Arc<CapabilityRegistry> {
        &self.registry
    }

    pub fn store(&self) -> &Arc<dyn WorkflowStore> {
        &self.store
    }

    pub fn engine(&self) -> &WorkflowEngine {
        &self.engine
    }

    pub fn workflows(&self) -> &WorkflowService {
        &self.service
    }

    /// Dispatch a business event: run every active workflow of the
    /// organization listening on `trigger_type`, once each.
    ///
    /// Returns the ids of the executions created, in workflow order.
    pub async fn fire(
        &self,
        organization: OrganizationId,
        trigger_type: TriggerType,
        payload: Map<String, Value>,
    ) -> Result<Vec<ExecutionId>, StoreError> {
        let workflows = self
            .store
            .find_active_workflows(organization, trigger_type)
            .await?;
        tracing::info!(
            "Trigger {} matched {} workflow(s) in organization {}",
            trigger_type,
            workflows.len(),
            organization
        );

        let mut executions = Vec::with_capacity(workflows.len());
        for workflow in &workflows {
            let id = self
                .engine
                .execute(workflow, trigger_type.as_str(), payload.clone())
                .await?;
            executions.push(id);
        }
        Ok(executions)
    }

    /// Mark executions of `workflow_id` still `running` after `older_than`
    /// as failed. A crash mid-run leaves such rows behind.
    pub async fn reap_stale(
        &self,
        workflow_id: WorkflowId,
        older_than: Duration,
    ) -> Result<Vec<ExecutionId>, StoreError> {
        let cutoff = Utc::now() - older_than;
        let mut reaped = Vec::new();
        for mut execution in self.store.list_executions(workflow_id).await? {
            if execution.status != ExecutionStatus::Running || execution.started_at > cutoff {
                continue;
            }
            execution.fail("Execution abandoned");
            match self.store.update_execution(&execution).await {
                Ok(()) => {
                    tracing::warn!("Reaped abandoned execution {}", execution.id);
                    reaped.push(execution.id);
                }
                // Finished between listing and reaping
                Err(StoreError::Conflict(_)) => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(reaped)
    }

    pub fn subscribe_events(&self) -> tokio::sync::broadcast::Receiver<ExecutionEvent> {
        self.events.subscribe()
    }
}

/// Configuration for the runtime
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub engine: EngineConfig,
    pub event_buffer_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            event_buffer_size: 1000,
        }
    }
}
