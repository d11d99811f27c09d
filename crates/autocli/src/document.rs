//! Workflow documents: a whole graph in one JSON file, with nodes
//! referenced by local keys instead of ids.

use anyhow::{anyhow, Context as _, Result};
use autocore::{NodeId, OrganizationId, UserId, Workflow, WorkflowNode};
use autoruntime::{ConnectionInput, NodeInput, WorkflowInput, WorkflowService};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowDocument {
    pub workflow: WorkflowSection,
    #[serde(default)]
    pub nodes: Vec<NodeSection>,
    #[serde(default)]
    pub connections: Vec<ConnectionSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowSection {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub trigger_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_config: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSection {
    pub key: String,
    pub node_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub config: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionSection {
    /// Source node key; absent for edges from the trigger
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition_type: Option<String>,
    #[serde(default)]
    pub priority: i32,
}

/// A document written to a store
pub struct LoadedWorkflow {
    pub workflow: Workflow,
    pub nodes: HashMap<String, WorkflowNode>,
}

impl LoadedWorkflow {
    pub fn key_of(&self, id: NodeId) -> Option<&str> {
        self.nodes
            .iter()
            .find(|(_, node)| node.id == id)
            .map(|(key, _)| key.as_str())
    }
}

impl WorkflowDocument {
    pub fn read(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_str(&json).with_context(|| format!("parsing {}", path.display()))
    }

    /// Author the document through the management service.
    pub async fn author(
        &self,
        service: &WorkflowService,
        organization: OrganizationId,
        user: UserId,
    ) -> Result<LoadedWorkflow> {
        let workflow = service
            .create(
                WorkflowInput {
                    name: Some(self.workflow.name.clone()),
                    description: self.workflow.description.clone(),
                    trigger_type: Some(self.workflow.trigger_type.clone()),
                    trigger_config: self.workflow.trigger_config.clone(),
                    status: self.workflow.status.clone(),
                },
                organization,
                user,
            )
            .await
            .context("invalid workflow")?;

        let mut nodes = HashMap::new();
        for section in &self.nodes {
            let node = service
                .create_node(
                    &workflow,
                    NodeInput {
                        node_type: Some(section.node_type.clone()),
                        action_type: section.action_type.clone(),
                        name: section.name.clone().or_else(|| Some(section.key.clone())),
                        config: Some(section.config.clone()),
                        position: None,
                    },
                )
                .await
                .with_context(|| format!("invalid node '{}'", section.key))?;
            if nodes.insert(section.key.clone(), node).is_some() {
                return Err(anyhow!("duplicate node key '{}'", section.key));
            }
        }

        let resolve = |key: &str| {
            nodes
                .get(key)
                .map(|n| n.id)
                .ok_or_else(|| anyhow!("unknown node key '{}'", key))
        };
        for section in &self.connections {
            let from_node = section.from.as_deref().map(resolve).transpose()?;
            service
                .create_connection(
                    &workflow,
                    ConnectionInput {
                        from_node,
                        to_node: Some(resolve(&section.to)?),
                        condition_type: section.condition_type.clone(),
                        priority: Some(section.priority),
                    },
                )
                .await
                .with_context(|| {
                    format!(
                        "invalid connection {} -> {}",
                        section.from.as_deref().unwrap_or("trigger"),
                        section.to
                    )
                })?;
        }

        Ok(LoadedWorkflow { workflow, nodes })
    }

    /// Confirmation example: mark confirmed bookings, log everything else.
    pub fn example() -> Self {
        let node = |key: &str, node_type: &str, action_type: Option<&str>, config: Value| {
            NodeSection {
                key: key.to_string(),
                node_type: node_type.to_string(),
                action_type: action_type.map(String::from),
                name: None,
                config: config.as_object().cloned().unwrap_or_default(),
            }
        };
        let edge = |from: Option<&str>, to: &str, condition_type: Option<&str>| ConnectionSection {
            from: from.map(String::from),
            to: to.to_string(),
            condition_type: condition_type.map(String::from),
            priority: 0,
        };

        Self {
            workflow: WorkflowSection {
                name: "Booking confirmation".to_string(),
                description: Some("Tag confirmed bookings, log the rest".to_string()),
                trigger_type: "booking.confirmed".to_string(),
                trigger_config: None,
                status: Some("active".to_string()),
            },
            nodes: vec![
                node(
                    "is_confirmed",
                    "condition",
                    None,
                    serde_json::json!({
                        "field": "booking.status",
                        "operator": "equals",
                        "value": "confirmed"
                    }),
                ),
                node(
                    "tag",
                    "action",
                    Some("set_variables"),
                    serde_json::json!({ "values": { "confirmed_ref": "B-{{ booking.id }}" } }),
                ),
                node(
                    "log_pending",
                    "action",
                    Some("log"),
                    serde_json::json!({ "message": "Booking {{ booking.id }} is {{ booking.status }}" }),
                ),
            ],
            connections: vec![
                edge(None, "is_confirmed", None),
                edge(Some("is_confirmed"), "tag", Some("true")),
                edge(Some("is_confirmed"), "log_pending", Some("false")),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autocore::MemoryStore;
    use autoruntime::CapabilityRegistry;
    use std::sync::Arc;
    use uuid::Uuid;

    fn service() -> WorkflowService {
        let mut registry = CapabilityRegistry::new();
        autonodes::register_all(&mut registry);
        WorkflowService::new(Arc::new(MemoryStore::new()), Arc::new(registry))
    }

    #[tokio::test]
    async fn example_document_authors_a_clean_graph() {
        let service = service();
        let document: WorkflowDocument =
            serde_json::from_str(&serde_json::to_string(&WorkflowDocument::example()).unwrap())
                .unwrap();

        let loaded = document
            .author(&service, Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap();

        assert_eq!(loaded.nodes.len(), 3);
        assert_eq!(service.list_connections(&loaded.workflow).await.unwrap().len(), 3);
        assert!(service.validate_graph(&loaded.workflow).await.unwrap().is_empty());
        let tag = loaded.nodes["tag"].id;
        assert_eq!(loaded.key_of(tag), Some("tag"));
    }

    #[tokio::test]
    async fn unknown_connection_key_is_rejected() {
        let mut document = WorkflowDocument::example();
        document.connections.push(ConnectionSection {
            from: Some("tag".to_string()),
            to: "nowhere".to_string(),
            condition_type: None,
            priority: 0,
        });

        let err = document
            .author(&service(), Uuid::new_v4(), Uuid::new_v4())
            .await
            .err()
            .unwrap();
        assert!(err.to_string().contains("unknown node key 'nowhere'"));
    }
}
