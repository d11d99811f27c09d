//! Persistence for workflow definitions and execution records.
//!
//! The management service writes definitions through [`WorkflowStore`], the
//! engine reads them and checkpoints [`WorkflowExecution`] rows. Soft-deleted
//! workflows and nodes are excluded from reads unless `include_deleted` is
//! set.

mod memory;

pub use memory::MemoryStore;

use crate::{
    ConnectionId, ExecutionId, NodeId, OrganizationId, StoreError, TriggerType, Workflow,
    WorkflowConnection, WorkflowExecution, WorkflowId, WorkflowNode,
};
use async_trait::async_trait;

#[async_trait]
pub trait WorkflowStore: Send + Sync {
    async fn insert_workflow(&self, workflow: Workflow) -> Result<Workflow, StoreError>;

    /// Overwrites the stored definition. The tombstone flag is only changed
    /// by the delete operations.
    async fn update_workflow(&self, workflow: Workflow) -> Result<Workflow, StoreError>;

    async fn get_workflow(
        &self,
        id: WorkflowId,
        include_deleted: bool,
    ) -> Result<Option<Workflow>, StoreError>;

    async fn list_workflows(
        &self,
        organization_id: OrganizationId,
        include_deleted: bool,
    ) -> Result<Vec<Workflow>, StoreError>;

    async fn soft_delete_workflow(&self, id: WorkflowId) -> Result<(), StoreError>;

    /// Removes the workflow with its nodes and connections. Execution rows
    /// are kept.
    async fn hard_delete_workflow(&self, id: WorkflowId) -> Result<(), StoreError>;

    async fn insert_node(&self, node: WorkflowNode) -> Result<WorkflowNode, StoreError>;

    async fn update_node(&self, node: WorkflowNode) -> Result<WorkflowNode, StoreError>;

    async fn get_node(
        &self,
        id: NodeId,
        include_deleted: bool,
    ) -> Result<Option<WorkflowNode>, StoreError>;

    async fn list_nodes(
        &self,
        workflow_id: WorkflowId,
        include_deleted: bool,
    ) -> Result<Vec<WorkflowNode>, StoreError>;

    async fn soft_delete_node(&self, id: NodeId) -> Result<(), StoreError>;

    /// Removes the node and every connection touching it.
    async fn hard_delete_node(&self, id: NodeId) -> Result<(), StoreError>;

    async fn insert_connection(
        &self,
        connection: WorkflowConnection,
    ) -> Result<WorkflowConnection, StoreError>;

    async fn list_connections(
        &self,
        workflow_id: WorkflowId,
    ) -> Result<Vec<WorkflowConnection>, StoreError>;

    async fn delete_connection(&self, id: ConnectionId) -> Result<(), StoreError>;

    async fn insert_execution(
        &self,
        execution: WorkflowExecution,
    ) -> Result<WorkflowExecution, StoreError>;

    /// Overwrites status, context, error and completion time. Fails with
    /// [`StoreError::Conflict`] once the stored row is terminal.
    async fn update_execution(&self, execution: &WorkflowExecution) -> Result<(), StoreError>;

    async fn get_execution(&self, id: ExecutionId)
        -> Result<Option<WorkflowExecution>, StoreError>;

    async fn list_executions(
        &self,
        workflow_id: WorkflowId,
    ) -> Result<Vec<WorkflowExecution>, StoreError>;

    /// Active, non-deleted workflows of an organization listening on a trigger.
    async fn find_active_workflows(
        &self,
        organization_id: OrganizationId,
        trigger_type: TriggerType,
    ) -> Result<Vec<Workflow>, StoreError> {
        Ok(self
            .list_workflows(organization_id, false)
            .await?
            .into_iter()
            .filter(|w| w.is_active() && w.trigger_type == trigger_type)
            .collect())
    }
}
