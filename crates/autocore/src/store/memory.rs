use super::WorkflowStore;
use crate::{
    ConnectionId, ExecutionId, NodeId, OrganizationId, StoreError, Workflow, WorkflowConnection,
    WorkflowExecution, WorkflowId, WorkflowNode,
};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

#[derive(Default)]
struct Tables {
    workflows: Vec<Workflow>,
    nodes: Vec<WorkflowNode>,
    connections: Vec<WorkflowConnection>,
    executions: Vec<WorkflowExecution>,
}

/// In-process store. Rows keep insertion order, which keeps traversal of
/// equal-priority edges deterministic.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WorkflowStore for MemoryStore {
    async fn insert_workflow(&self, workflow: Workflow) -> Result<Workflow, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.workflows.iter().any(|w| w.id == workflow.id) {
            return Err(StoreError::Conflict(format!("workflow {} exists", workflow.id)));
        }
        tables.workflows.push(workflow.clone());
        Ok(workflow)
    }

    async fn update_workflow(&self, mut workflow: Workflow) -> Result<Workflow, StoreError> {
        let mut tables = self.tables.write().await;
        let slot = tables
            .workflows
            .iter_mut()
            .find(|w| w.id == workflow.id)
            .ok_or_else(|| StoreError::not_found("Workflow", workflow.id))?;
        workflow.updated = Utc::now();
        workflow.deleted = slot.deleted;
        *slot = workflow.clone();
        Ok(workflow)
    }

    async fn get_workflow(
        &self,
        id: WorkflowId,
        include_deleted: bool,
    ) -> Result<Option<Workflow>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .workflows
            .iter()
            .find(|w| w.id == id && (include_deleted || !w.deleted))
            .cloned())
    }

    async fn list_workflows(
        &self,
        organization_id: OrganizationId,
        include_deleted: bool,
    ) -> Result<Vec<Workflow>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .workflows
            .iter()
            .filter(|w| w.organization_id == organization_id && (include_deleted || !w.deleted))
            .cloned()
            .collect())
    }

    async fn soft_delete_workflow(&self, id: WorkflowId) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let workflow = tables
            .workflows
            .iter_mut()
            .find(|w| w.id == id)
            .ok_or_else(|| StoreError::not_found("Workflow", id))?;
        workflow.deleted = true;
        workflow.updated = Utc::now();
        Ok(())
    }

    async fn hard_delete_workflow(&self, id: WorkflowId) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let before = tables.workflows.len();
        tables.workflows.retain(|w| w.id != id);
        if tables.workflows.len() == before {
            return Err(StoreError::not_found("Workflow", id));
        }
        tables.nodes.retain(|n| n.workflow_id != id);
        tables.connections.retain(|c| c.workflow_id != id);
        Ok(())
    }

    async fn insert_node(&self, node: WorkflowNode) -> Result<WorkflowNode, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.workflows.iter().any(|w| w.id == node.workflow_id) {
            return Err(StoreError::not_found("Workflow", node.workflow_id));
        }
        tables.nodes.push(node.clone());
        Ok(node)
    }

    async fn update_node(&self, mut node: WorkflowNode) -> Result<WorkflowNode, StoreError> {
        let mut tables = self.tables.write().await;
        let slot = tables
            .nodes
            .iter_mut()
            .find(|n| n.id == node.id)
            .ok_or_else(|| StoreError::not_found("Node", node.id))?;
        node.deleted = slot.deleted;
        *slot = node.clone();
        Ok(node)
    }

    async fn get_node(
        &self,
        id: NodeId,
        include_deleted: bool,
    ) -> Result<Option<WorkflowNode>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .nodes
            .iter()
            .find(|n| n.id == id && (include_deleted || !n.deleted))
            .cloned())
    }

    async fn list_nodes(
        &self,
        workflow_id: WorkflowId,
        include_deleted: bool,
    ) -> Result<Vec<WorkflowNode>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .nodes
            .iter()
            .filter(|n| n.workflow_id == workflow_id && (include_deleted || !n.deleted))
            .cloned()
            .collect())
    }

    async fn soft_delete_node(&self, id: NodeId) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let node = tables
            .nodes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| StoreError::not_found("Node", id))?;
        node.deleted = true;
        Ok(())
    }

    async fn hard_delete_node(&self, id: NodeId) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let before = tables.nodes.len();
        tables.nodes.retain(|n| n.id != id);
        if tables.nodes.len() == before {
            return Err(StoreError::not_found("Node", id));
        }
        tables
            .connections
            .retain(|c| c.to_node != id && c.from_node != Some(id));
        Ok(())
    }

    async fn insert_connection(
        &self,
        connection: WorkflowConnection,
    ) -> Result<WorkflowConnection, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.workflows.iter().any(|w| w.id == connection.workflow_id) {
            return Err(StoreError::not_found("Workflow", connection.workflow_id));
        }
        tables.connections.push(connection.clone());
        Ok(connection)
    }

    async fn list_connections(
        &self,
        workflow_id: WorkflowId,
    ) -> Result<Vec<WorkflowConnection>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .connections
            .iter()
            .filter(|c| c.workflow_id == workflow_id)
            .cloned()
            .collect())
    }

    async fn delete_connection(&self, id: ConnectionId) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let before = tables.connections.len();
        tables.connections.retain(|c| c.id != id);
        if tables.connections.len() == before {
            return Err(StoreError::not_found("Connection", id));
        }
        Ok(())
    }

    async fn insert_execution(
        &self,
        execution: WorkflowExecution,
    ) -> Result<WorkflowExecution, StoreError> {
        let mut tables = self.tables.write().await;
        tables.executions.push(execution.clone());
        Ok(execution)
    }

    async fn update_execution(&self, execution: &WorkflowExecution) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let slot = tables
            .executions
            .iter_mut()
            .find(|e| e.id == execution.id)
            .ok_or_else(|| StoreError::not_found("Execution", execution.id))?;
        if slot.status.is_terminal() {
            return Err(StoreError::Conflict(format!(
                "execution {} is already {}",
                execution.id,
                slot.status.as_str()
            )));
        }
        slot.context = execution.context.clone();
        slot.status = execution.status;
        slot.error = execution.error.clone();
        slot.completed_at = execution.completed_at;
        Ok(())
    }

    async fn get_execution(
        &self,
        id: ExecutionId,
    ) -> Result<Option<WorkflowExecution>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.executions.iter().find(|e| e.id == id).cloned())
    }

    async fn list_executions(
        &self,
        workflow_id: WorkflowId,
    ) -> Result<Vec<WorkflowExecution>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .executions
            .iter()
            .filter(|e| e.workflow_id == workflow_id)
            .cloned()
            .collect())
    }
}
