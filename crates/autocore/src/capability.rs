use crate::ActionError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Static configuration of a node
pub type Config = Map<String, Value>;

/// Accumulating key-value map threaded through one execution
pub type Context = Map<String, Value>;

/// Business event descriptor that can start a workflow
pub trait Trigger: Send + Sync {
    /// Unique identifier (e.g., "booking.created")
    fn id(&self) -> &str;

    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    fn category(&self) -> &str {
        "general"
    }

    /// Context fields this trigger seeds when it fires
    fn variables(&self) -> Vec<TriggerVariable> {
        Vec::new()
    }
}

/// Unit of side-effecting work the engine can run
#[async_trait]
pub trait Action: Send + Sync {
    /// Unique identifier (e.g., "send_email", "log")
    fn id(&self) -> &str;

    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    fn category(&self) -> &str {
        "general"
    }

    /// Fields accepted in the node config
    fn config_schema(&self) -> Vec<ConfigField> {
        Vec::new()
    }

    /// Check a node config before execution.
    ///
    /// The default checks every field of [`Action::config_schema`] for
    /// presence (when required) and type. An empty list means valid.
    fn validate(&self, config: &Config) -> Vec<String> {
        let mut errors = Vec::new();
        for field in self.config_schema() {
            match config.get(&field.name) {
                None | Some(Value::Null) if field.required => {
                    errors.push(format!("{} is required", field.name));
                }
                Some(value) if !value.is_null() && !field.field_type.accepts(value) => {
                    errors.push(format!(
                        "{} must be of type {}",
                        field.name,
                        field.field_type.as_str()
                    ));
                }
                _ => {}
            }
        }
        errors
    }

    /// Run the action. The returned value is stored in the execution
    /// context under this node's id.
    async fn execute(&self, config: &Config, context: &Context) -> Result<Value, ActionError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerVariable {
    pub path: String,
    pub description: String,
}

impl TriggerVariable {
    pub fn new(path: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigField {
    pub name: String,
    pub field_type: FieldType,
    pub required: bool,
    pub description: String,
}

impl ConfigField {
    pub fn required(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            required: true,
            description: String::new(),
        }
    }

    pub fn optional(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            required: false,
            ..Self::required(name, field_type)
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Object,
    Array,
    Any,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
            Self::Any => "any",
        }
    }

    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Object => value.is_object(),
            Self::Array => value.is_array(),
            Self::Any => true,
        }
    }
}
