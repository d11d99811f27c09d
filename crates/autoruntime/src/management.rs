//! Authoring operations on workflow graphs.
//!
//! Inputs arrive as loosely typed patches (as an editor would post them) and
//! are checked against per-field constraint lists before anything is
//! written. Every violation is reported at once in a single
//! [`ManagementError::Validation`].

use crate::graph::WorkflowGraph;
use crate::registry::CapabilityRegistry;
use autocore::{
    ConnectionId, ManagementError, NodeId, NodeType, OrganizationId, Position, StoreError,
    TriggerType, UserId, Workflow, WorkflowConnection, WorkflowId, WorkflowNode, WorkflowStatus,
    WorkflowStore,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;

const TRIGGER_TYPES: &[&str] = &[
    "booking.created",
    "booking.confirmed",
    "booking.cancelled",
    "booking.reminder",
    "event.created",
    "event.updated",
    "event.deleted",
];
const STATUSES: &[&str] = &["active", "inactive", "draft"];
const NODE_TYPES: &[&str] = &["trigger", "action", "condition"];
const CONDITION_TYPES: &[&str] = &["true", "false"];

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkflowInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub trigger_type: Option<String>,
    pub trigger_config: Option<Map<String, Value>>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeInput {
    pub node_type: Option<String>,
    pub action_type: Option<String>,
    pub name: Option<String>,
    pub config: Option<Map<String, Value>>,
    pub position: Option<Position>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConnectionInput {
    pub from_node: Option<NodeId>,
    pub to_node: Option<NodeId>,
    pub condition_type: Option<String>,
    pub priority: Option<i32>,
}

/// Constraint on a single string field
enum Rule {
    Required,
    Length { min: usize, max: usize },
    OneOf(&'static [&'static str]),
}

/// One field under validation
struct Field<'a> {
    name: &'static str,
    value: Option<&'a str>,
    rules: &'a [Rule],
}

impl<'a> Field<'a> {
    fn new(name: &'static str, value: Option<&'a str>, rules: &'a [Rule]) -> Self {
        Self { name, value, rules }
    }
}

/// Check each field against its rules and collect every violation.
fn check(fields: &[Field<'_>]) -> Result<(), ManagementError> {
    let mut errors = Vec::new();
    for field in fields {
        let name = field.name;
        for rule in field.rules {
            match (rule, field.value) {
                (Rule::Required, None) => {
                    errors.push(format!("{name} is required"));
                    break;
                }
                (Rule::Required, Some(v)) if v.trim().is_empty() => {
                    errors.push(format!("{name} is required"));
                    break;
                }
                (Rule::Length { min, max }, Some(v)) => {
                    let len = v.chars().count();
                    if len < *min || len > *max {
                        errors.push(format!("{name} must be between {min} and {max} characters"));
                    }
                }
                (Rule::OneOf(choices), Some(v)) if !choices.contains(&v) => {
                    errors.push(format!("{name} must be one of: {}", choices.join(", ")));
                }
                _ => {}
            }
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ManagementError::Validation(errors))
    }
}

fn parse<T: std::str::FromStr>(value: &str) -> Result<T, ManagementError>
where
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e: T::Err| ManagementError::Validation(vec![e.to_string()]))
}

/// Authoring CRUD for workflows, nodes and connections
pub struct WorkflowService {
    store: Arc<dyn WorkflowStore>,
    registry: Arc<CapabilityRegistry>,
}

impl WorkflowService {
    pub fn new(store: Arc<dyn WorkflowStore>, registry: Arc<CapabilityRegistry>) -> Self {
        Self { store, registry }
    }

    pub async fn create(
        &self,
        data: WorkflowInput,
        organization: OrganizationId,
        user: UserId,
    ) -> Result<Workflow, ManagementError> {
        check(&[
            Field::new(
                "name",
                data.name.as_deref(),
                &[Rule::Required, Rule::Length { min: 2, max: 255 }],
            ),
            Field::new(
                "trigger_type",
                data.trigger_type.as_deref(),
                &[Rule::Required, Rule::OneOf(TRIGGER_TYPES)],
            ),
            Field::new("status", data.status.as_deref(), &[Rule::OneOf(STATUSES)]),
        ])?;

        let (Some(name), Some(trigger_type)) = (data.name, data.trigger_type) else {
            return Err(ManagementError::Validation(vec![
                "name and trigger_type are required".to_string(),
            ]));
        };
        let mut workflow = Workflow::new(
            organization,
            user,
            name,
            parse::<TriggerType>(&trigger_type)?,
        );
        workflow.description = data.description;
        if let Some(config) = data.trigger_config {
            workflow.trigger_config = config;
        }
        if let Some(status) = data.status {
            workflow.status = parse::<WorkflowStatus>(&status)?;
        }

        let workflow = self.store.insert_workflow(workflow).await?;
        tracing::info!("Created workflow {} ({})", workflow.id, workflow.name);
        Ok(workflow)
    }

    /// Apply a partial patch; absent fields are left unchanged.
    pub async fn update(
        &self,
        workflow: &Workflow,
        data: WorkflowInput,
    ) -> Result<Workflow, ManagementError> {
        check(&[
            Field::new("name", data.name.as_deref(), &[Rule::Length { min: 2, max: 255 }]),
            Field::new(
                "trigger_type",
                data.trigger_type.as_deref(),
                &[Rule::OneOf(TRIGGER_TYPES)],
            ),
            Field::new("status", data.status.as_deref(), &[Rule::OneOf(STATUSES)]),
        ])?;

        let mut updated = workflow.clone();
        if let Some(name) = data.name {
            updated.name = name;
        }
        if let Some(description) = data.description {
            updated.description = Some(description);
        }
        if let Some(trigger_type) = data.trigger_type {
            updated.trigger_type = parse(&trigger_type)?;
        }
        if let Some(config) = data.trigger_config {
            updated.trigger_config = config;
        }
        if let Some(status) = data.status {
            updated.status = parse(&status)?;
        }

        let updated = self.store.update_workflow(updated).await?;
        tracing::info!("Updated workflow {}", updated.id);
        Ok(updated)
    }

    pub async fn get(&self, id: WorkflowId) -> Result<Workflow, ManagementError> {
        self.store
            .get_workflow(id, false)
            .await?
            .ok_or_else(|| ManagementError::NotFound("Workflow not found".to_string()))
    }

    pub async fn list(&self, organization: OrganizationId) -> Result<Vec<Workflow>, ManagementError> {
        Ok(self.store.list_workflows(organization, false).await?)
    }

    /// Tombstone the workflow. It disappears from reads but its executions
    /// stay resolvable.
    pub async fn delete(&self, workflow: &Workflow) -> Result<(), ManagementError> {
        self.store.soft_delete_workflow(workflow.id).await?;
        tracing::info!("Soft-deleted workflow {}", workflow.id);
        Ok(())
    }

    pub async fn hard_delete(&self, workflow: &Workflow) -> Result<(), ManagementError> {
        self.store.hard_delete_workflow(workflow.id).await?;
        tracing::info!("Permanently deleted workflow {}", workflow.id);
        Ok(())
    }

    pub async fn create_node(
        &self,
        workflow: &Workflow,
        data: NodeInput,
    ) -> Result<WorkflowNode, ManagementError> {
        check(&[Field::new(
            "node_type",
            data.node_type.as_deref(),
            &[Rule::Required, Rule::OneOf(NODE_TYPES)],
        )])?;
        let Some(node_type) = data.node_type.as_deref() else {
            return Err(ManagementError::Validation(vec![
                "node_type is required".to_string(),
            ]));
        };

        let mut node = WorkflowNode::new(workflow.id, parse::<NodeType>(node_type)?);
        node.action_type = data.action_type;
        node.name = data.name;
        node.config = data.config.unwrap_or_default();
        node.position = data.position.unwrap_or_default();

        let node = self.store.insert_node(node).await?;
        tracing::debug!("Created {:?} node {} in workflow {}", node.node_type, node.id, workflow.id);
        Ok(node)
    }

    pub async fn update_node(
        &self,
        node: &WorkflowNode,
        data: NodeInput,
    ) -> Result<WorkflowNode, ManagementError> {
        check(&[Field::new(
            "node_type",
            data.node_type.as_deref(),
            &[Rule::OneOf(NODE_TYPES)],
        )])?;

        let mut updated = node.clone();
        if let Some(node_type) = data.node_type.as_deref() {
            updated.node_type = parse(node_type)?;
        }
        if let Some(action_type) = data.action_type {
            updated.action_type = Some(action_type);
        }
        if let Some(name) = data.name {
            updated.name = Some(name);
        }
        if let Some(config) = data.config {
            updated.config = config;
        }
        if let Some(position) = data.position {
            updated.position = position;
        }
        Ok(self.store.update_node(updated).await?)
    }

    pub async fn get_node(&self, id: NodeId) -> Result<WorkflowNode, ManagementError> {
        self.store
            .get_node(id, false)
            .await?
            .ok_or_else(|| ManagementError::NotFound("Node not found".to_string()))
    }

    pub async fn list_nodes(&self, workflow: &Workflow) -> Result<Vec<WorkflowNode>, ManagementError> {
        Ok(self.store.list_nodes(workflow.id, false).await?)
    }

    pub async fn delete_node(&self, node: &WorkflowNode) -> Result<(), ManagementError> {
        Ok(self.store.soft_delete_node(node.id).await?)
    }

    pub async fn hard_delete_node(&self, node: &WorkflowNode) -> Result<(), ManagementError> {
        Ok(self.store.hard_delete_node(node.id).await?)
    }

    pub async fn create_connection(
        &self,
        workflow: &Workflow,
        data: ConnectionInput,
    ) -> Result<WorkflowConnection, ManagementError> {
        check(&[Field::new(
            "condition_type",
            data.condition_type.as_deref(),
            &[Rule::OneOf(CONDITION_TYPES)],
        )])?;
        let Some(to_node) = data.to_node else {
            return Err(ManagementError::Validation(vec![
                "to_node is required".to_string(),
            ]));
        };

        self.resolve_node(workflow, to_node, "To node not found").await?;
        if let Some(from_node) = data.from_node {
            self.resolve_node(workflow, from_node, "From node not found")
                .await?;
        }

        let connection = WorkflowConnection {
            id: uuid::Uuid::new_v4(),
            workflow_id: workflow.id,
            from_node: data.from_node,
            to_node,
            condition_type: data
                .condition_type
                .as_deref()
                .map(parse)
                .transpose()?,
            priority: data.priority.unwrap_or(0),
        };

        let connection = self.store.insert_connection(connection).await?;
        tracing::debug!(
            "Connected {:?} -> {} in workflow {}",
            connection.from_node,
            connection.to_node,
            workflow.id
        );
        Ok(connection)
    }

    pub async fn list_connections(
        &self,
        workflow: &Workflow,
    ) -> Result<Vec<WorkflowConnection>, ManagementError> {
        Ok(self.store.list_connections(workflow.id).await?)
    }

    pub async fn delete_connection(&self, id: ConnectionId) -> Result<(), ManagementError> {
        Ok(self.store.delete_connection(id).await?)
    }

    /// Structural problems that would make an execution fail or do nothing.
    /// Does not execute anything.
    pub async fn validate_graph(&self, workflow: &Workflow) -> Result<Vec<String>, ManagementError> {
        let graph = WorkflowGraph::load(self.store.as_ref(), workflow.id).await?;
        let mut warnings = Vec::new();

        if graph.start_edges().is_empty() {
            warnings.push("Workflow has no starting node".to_string());
        }
        let mut nodes: Vec<&WorkflowNode> = graph.nodes().collect();
        nodes.sort_by_key(|n| n.id);
        for node in nodes {
            if node.node_type != NodeType::Action {
                continue;
            }
            match node.action_type.as_deref() {
                None => warnings.push(format!("Action node {} has no action type", node.label())),
                Some(id) => match self.registry.action(id) {
                    None => warnings.push(format!(
                        "Action node {} uses unknown action type {}",
                        node.label(),
                        id
                    )),
                    Some(action) => {
                        for error in action.validate(&node.config) {
                            warnings.push(format!("Action node {}: {}", node.label(), error));
                        }
                    }
                },
            }
        }
        if let Some(node) = graph.find_cycle() {
            warnings.push(format!("Graph contains a cycle through node {node}"));
        }
        for node in graph.unreachable_nodes() {
            warnings.push(format!("Node {node} is not reachable from the trigger"));
        }
        Ok(warnings)
    }

    async fn resolve_node(
        &self,
        workflow: &Workflow,
        id: NodeId,
        message: &str,
    ) -> Result<WorkflowNode, ManagementError> {
        match self.store.get_node(id, false).await {
            Ok(Some(node)) if node.workflow_id == workflow.id => Ok(node),
            Ok(_) | Err(StoreError::NotFound { .. }) => {
                Err(ManagementError::NotFound(message.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
