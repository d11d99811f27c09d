use crate::transform::render_template;
use async_trait::async_trait;
use autocore::{Action, ActionError, Config, ConfigField, Context, FieldType};
use serde_json::{json, Value};

const LEVELS: &[&str] = &["debug", "info", "warn", "error"];

/// Writes a templated message to the application log
pub struct LogAction;

#[async_trait]
impl Action for LogAction {
    fn id(&self) -> &str {
        "log"
    }

    fn name(&self) -> &str {
        "Log message"
    }

    fn description(&self) -> &str {
        "Logs a message rendered against the execution context"
    }

    fn category(&self) -> &str {
        "debug"
    }

    fn config_schema(&self) -> Vec<ConfigField> {
        vec![
            ConfigField::optional("message", FieldType::String)
                .with_description("Message text; {{ path }} placeholders are filled from the context"),
            ConfigField::optional("level", FieldType::String)
                .with_description("One of debug, info, warn, error (default info)"),
        ]
    }

    fn validate(&self, config: &Config) -> Vec<String> {
        let mut errors = Vec::new();
        if let Some(message) = config.get("message") {
            if !message.is_string() {
                errors.push("message must be of type string".to_string());
            }
        }
        if let Some(level) = config.get("level") {
            if !level.as_str().is_some_and(|l| LEVELS.contains(&l)) {
                errors.push(format!("level must be one of: {}", LEVELS.join(", ")));
            }
        }
        errors
    }

    async fn execute(&self, config: &Config, context: &Context) -> Result<Value, ActionError> {
        let template = config
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("(no message)");
        let message = render_template(template, context);
        let level = config.get("level").and_then(Value::as_str).unwrap_or("info");

        match level {
            "debug" => tracing::debug!("workflow: {}", message),
            "warn" => tracing::warn!("workflow: {}", message),
            "error" => tracing::error!("workflow: {}", message),
            _ => tracing::info!("workflow: {}", message),
        }

        Ok(json!({ "message": message, "level": level }))
    }
}
