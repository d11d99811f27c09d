use async_trait::async_trait;
use autocore::value::lookup_path;
use autocore::{Action, ActionError, Config, ConfigField, Context, FieldType, ValueExt};
use serde_json::Value;

/// Replace `{{ path }}` placeholders with context values.
///
/// Unresolvable paths render as an empty string; an unterminated `{{` is
/// kept verbatim.
pub(crate) fn render_template(template: &str, context: &Context) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            return out;
        };
        let path = after[..end].trim();
        if let Some(value) = lookup_path(context, path) {
            out.push_str(&value.coerce_string());
        }
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    out
}

/// Render string templates inside a JSON value, recursively
fn render_value(value: &Value, context: &Context) -> Value {
    match value {
        Value::String(s) => Value::String(render_template(s, context)),
        Value::Array(items) => Value::Array(items.iter().map(|v| render_value(v, context)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), render_value(v, context)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Store computed values in the context for later nodes
pub struct SetVariablesAction;

#[async_trait]
impl Action for SetVariablesAction {
    fn id(&self) -> &str {
        "set_variables"
    }

    fn name(&self) -> &str {
        "Set variables"
    }

    fn description(&self) -> &str {
        "Render the configured values against the context and store them"
    }

    fn category(&self) -> &str {
        "transform"
    }

    fn config_schema(&self) -> Vec<ConfigField> {
        vec![ConfigField::required("values", FieldType::Object)
            .with_description("Map of names to values; strings may use {{ path }} placeholders")]
    }

    async fn execute(&self, config: &Config, context: &Context) -> Result<Value, ActionError> {
        let values = config
            .get("values")
            .filter(|v| v.is_object())
            .ok_or_else(|| ActionError::Configuration("values must be an object".to_string()))?;
        Ok(render_value(values, context))
    }
}
