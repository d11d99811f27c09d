use async_trait::async_trait;
use autocore::{Action, ActionError, Config, ConfigField, Context, FieldType};
use serde_json::{json, Value};
use tokio::time::{sleep, Duration};

/// Longest pause a single node may request
const MAX_DELAY_MS: u64 = 60_000;

/// Pause the execution for a fixed duration
pub struct DelayAction;

#[async_trait]
impl Action for DelayAction {
    fn id(&self) -> &str {
        "delay"
    }

    fn name(&self) -> &str {
        "Delay"
    }

    fn description(&self) -> &str {
        "Delay execution for specified milliseconds"
    }

    fn category(&self) -> &str {
        "time"
    }

    fn config_schema(&self) -> Vec<ConfigField> {
        vec![ConfigField::required("delay_ms", FieldType::Number)]
    }

    fn validate(&self, config: &Config) -> Vec<String> {
        match config.get("delay_ms").map(Value::as_u64) {
            None => vec!["delay_ms is required".to_string()],
            Some(Some(ms)) if ms <= MAX_DELAY_MS => Vec::new(),
            Some(_) => vec![format!(
                "delay_ms must be a whole number between 0 and {MAX_DELAY_MS}"
            )],
        }
    }

    async fn execute(&self, config: &Config, _context: &Context) -> Result<Value, ActionError> {
        let delay_ms = config
            .get("delay_ms")
            .and_then(Value::as_u64)
            .ok_or_else(|| ActionError::Configuration("delay_ms must be a number".to_string()))?;

        sleep(Duration::from_millis(delay_ms)).await;

        Ok(json!({ "delayed_ms": delay_ms }))
    }
}
