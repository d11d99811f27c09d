use crate::ParseEnumError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub type WorkflowId = Uuid;
pub type NodeId = Uuid;
pub type ConnectionId = Uuid;
pub type OrganizationId = Uuid;
pub type UserId = Uuid;

/// Business events a workflow can be started by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriggerType {
    #[serde(rename = "booking.created")]
    BookingCreated,
    #[serde(rename = "booking.confirmed")]
    BookingConfirmed,
    #[serde(rename = "booking.cancelled")]
    BookingCancelled,
    #[serde(rename = "booking.reminder")]
    BookingReminder,
    #[serde(rename = "event.created")]
    EventCreated,
    #[serde(rename = "event.updated")]
    EventUpdated,
    #[serde(rename = "event.deleted")]
    EventDeleted,
}

impl TriggerType {
    pub const ALL: [TriggerType; 7] = [
        TriggerType::BookingCreated,
        TriggerType::BookingConfirmed,
        TriggerType::BookingCancelled,
        TriggerType::BookingReminder,
        TriggerType::EventCreated,
        TriggerType::EventUpdated,
        TriggerType::EventDeleted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BookingCreated => "booking.created",
            Self::BookingConfirmed => "booking.confirmed",
            Self::BookingCancelled => "booking.cancelled",
            Self::BookingReminder => "booking.reminder",
            Self::EventCreated => "event.created",
            Self::EventUpdated => "event.updated",
            Self::EventDeleted => "event.deleted",
        }
    }
}

impl fmt::Display for TriggerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TriggerType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ParseEnumError {
                kind: "trigger type",
                value: s.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStatus {
    Active,
    Inactive,
    #[default]
    Draft,
}

impl WorkflowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Draft => "draft",
        }
    }
}

impl FromStr for WorkflowStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            "draft" => Ok(Self::Draft),
            other => Err(ParseEnumError {
                kind: "status",
                value: other.to_string(),
            }),
        }
    }
}

/// Workflow definition owned by an organization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    pub id: WorkflowId,
    pub organization_id: OrganizationId,
    pub created_by: UserId,
    pub name: String,
    pub description: Option<String>,
    pub trigger_type: TriggerType,
    #[serde(default)]
    pub trigger_config: Map<String, Value>,
    #[serde(default)]
    pub status: WorkflowStatus,
    #[serde(default)]
    pub deleted: bool,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl Workflow {
    pub fn new(
        organization_id: OrganizationId,
        created_by: UserId,
        name: impl Into<String>,
        trigger_type: TriggerType,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            organization_id,
            created_by,
            name: name.into(),
            description: None,
            trigger_type,
            trigger_config: Map::new(),
            status: WorkflowStatus::default(),
            deleted: false,
            created: now,
            updated: now,
        }
    }

    pub fn with_status(mut self, status: WorkflowStatus) -> Self {
        self.status = status;
        self
    }

    /// True when the workflow should react to its trigger.
    pub fn is_active(&self) -> bool {
        self.status == WorkflowStatus::Active && !self.deleted
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Trigger,
    Action,
    Condition,
}

impl FromStr for NodeType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "trigger" => Ok(Self::Trigger),
            "action" => Ok(Self::Action),
            "condition" => Ok(Self::Condition),
            other => Err(ParseEnumError {
                kind: "node type",
                value: other.to_string(),
            }),
        }
    }
}

/// Node position in the visual editor. Never read by the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Node in a workflow graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowNode {
    pub id: NodeId,
    pub workflow_id: WorkflowId,
    pub node_type: NodeType,
    pub action_type: Option<String>,
    pub name: Option<String>,
    #[serde(default)]
    pub config: Map<String, Value>,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub deleted: bool,
}

impl WorkflowNode {
    pub fn new(workflow_id: WorkflowId, node_type: NodeType) -> Self {
        Self {
            id: Uuid::new_v4(),
            workflow_id,
            node_type,
            action_type: None,
            name: None,
            config: Map::new(),
            position: Position::default(),
            deleted: false,
        }
    }

    pub fn trigger(workflow_id: WorkflowId) -> Self {
        Self::new(workflow_id, NodeType::Trigger)
    }

    pub fn action(workflow_id: WorkflowId, action_type: impl Into<String>) -> Self {
        let mut node = Self::new(workflow_id, NodeType::Action);
        node.action_type = Some(action_type.into());
        node
    }

    /// Condition node comparing `field` in the context against `value`.
    pub fn condition(
        workflow_id: WorkflowId,
        field: impl Into<String>,
        operator: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        Self::new(workflow_id, NodeType::Condition)
            .with_config("field", Value::String(field.into()))
            .with_config("operator", Value::String(operator.into()))
            .with_config("value", value)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_config(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }

    /// Name for logs: the explicit name or the id.
    pub fn label(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.id.to_string())
    }
}

/// Branch selector on an edge leaving a condition node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionType {
    True,
    False,
}

impl ConditionType {
    pub fn from_bool(value: bool) -> Self {
        if value {
            Self::True
        } else {
            Self::False
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::True => "true",
            Self::False => "false",
        }
    }
}

impl FromStr for ConditionType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "true" => Ok(Self::True),
            "false" => Ok(Self::False),
            other => Err(ParseEnumError {
                kind: "condition type",
                value: other.to_string(),
            }),
        }
    }
}

/// Directed edge between two nodes.
///
/// `from_node = None` is an edge from the implicit trigger; every
/// executable workflow has at least one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConnection {
    pub id: ConnectionId,
    pub workflow_id: WorkflowId,
    pub from_node: Option<NodeId>,
    pub to_node: NodeId,
    pub condition_type: Option<ConditionType>,
    #[serde(default)]
    pub priority: i32,
}

impl WorkflowConnection {
    pub fn start(workflow_id: WorkflowId, to_node: NodeId) -> Self {
        Self {
            id: Uuid::new_v4(),
            workflow_id,
            from_node: None,
            to_node,
            condition_type: None,
            priority: 0,
        }
    }

    pub fn between(workflow_id: WorkflowId, from_node: NodeId, to_node: NodeId) -> Self {
        Self {
            from_node: Some(from_node),
            ..Self::start(workflow_id, to_node)
        }
    }

    pub fn with_condition(mut self, condition: ConditionType) -> Self {
        self.condition_type = Some(condition);
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn is_start(&self) -> bool {
        self.from_node.is_none()
    }
}
