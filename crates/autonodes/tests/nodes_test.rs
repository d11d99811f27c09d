use autocore::{
    Action, ConditionType, ExecutionStatus, Trigger, TriggerType, Workflow, WorkflowConnection,
    WorkflowNode, WorkflowStatus, WorkflowStore,
};
use autonodes::{DelayAction, LogAction, SetVariablesAction};
use autoruntime::{AutomationRuntime, CapabilityRegistry};
use serde_json::{json, Map, Value};
use uuid::Uuid;

fn map(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap()
}

#[test]
fn register_all_populates_catalogue() {
    let mut registry = CapabilityRegistry::new();
    autonodes::register_all(&mut registry);

    assert_eq!(registry.list_triggers(None).len(), 7);
    assert_eq!(registry.list_triggers(Some("booking")).len(), 4);
    assert_eq!(registry.list_triggers(Some("event")).len(), 3);
    for id in ["log", "set_variables", "delay"] {
        assert!(registry.action(id).is_some(), "missing action {id}");
    }

    let reminder = registry.trigger("booking.reminder").unwrap();
    assert!(reminder
        .variables()
        .iter()
        .any(|v| v.path == "reminder.minutes_before"));
}

#[tokio::test]
async fn log_renders_placeholders() {
    let context = map(json!({ "booking": { "attendee": { "name": "Ada" } } }));
    let config = map(json!({ "message": "Booked by {{ booking.attendee.name }}{{missing}}!" }));

    assert!(LogAction.validate(&config).is_empty());
    let output = LogAction.execute(&config, &context).await.unwrap();

    assert_eq!(output, json!({ "message": "Booked by Ada!", "level": "info" }));
}

#[test]
fn log_rejects_unknown_level() {
    let config = map(json!({ "level": "shout" }));
    assert_eq!(
        LogAction.validate(&config),
        vec!["level must be one of: debug, info, warn, error"]
    );
}

#[tokio::test]
async fn set_variables_renders_nested_values() {
    let context = map(json!({ "booking": { "id": 9, "status": "confirmed" } }));
    let config = map(json!({
        "values": { "ref": "B-{{booking.id}}", "tags": ["{{ booking.status }}", 1] }
    }));

    let output = SetVariablesAction.execute(&config, &context).await.unwrap();

    assert_eq!(output, json!({ "ref": "B-9", "tags": ["confirmed", 1] }));
    assert_eq!(
        SetVariablesAction.validate(&map(json!({}))),
        vec!["values is required"]
    );
}

#[tokio::test]
async fn delay_validates_range() {
    assert!(DelayAction.validate(&map(json!({ "delay_ms": 5 }))).is_empty());
    assert_eq!(DelayAction.validate(&map(json!({}))).len(), 1);
    assert_eq!(DelayAction.validate(&map(json!({ "delay_ms": -1 }))).len(), 1);
    assert_eq!(DelayAction.validate(&map(json!({ "delay_ms": 600000 }))).len(), 1);

    let output = DelayAction
        .execute(&map(json!({ "delay_ms": 1 })), &Map::new())
        .await
        .unwrap();
    assert_eq!(output, json!({ "delayed_ms": 1 }));
}

#[tokio::test]
async fn confirmation_branching_end_to_end() {
    let mut registry = CapabilityRegistry::new();
    autonodes::register_all(&mut registry);
    let runtime = AutomationRuntime::new(registry);
    let store = runtime.store().clone();
    let organization = Uuid::new_v4();

    let wf = store
        .insert_workflow(
            Workflow::new(organization, Uuid::new_v4(), "Confirm", TriggerType::BookingConfirmed)
                .with_status(WorkflowStatus::Active),
        )
        .await
        .unwrap();
    store.insert_node(WorkflowNode::trigger(wf.id)).await.unwrap();
    let check = store
        .insert_node(WorkflowNode::condition(
            wf.id,
            "booking.status",
            "equals",
            "confirmed",
        ))
        .await
        .unwrap();
    let notify = store
        .insert_node(
            WorkflowNode::action(wf.id, "set_variables")
                .with_config("values", json!({ "notified": "{{ booking.id }}" })),
        )
        .await
        .unwrap();
    let audit = store
        .insert_node(
            WorkflowNode::action(wf.id, "log").with_config("message", "pending {{ booking.id }}"),
        )
        .await
        .unwrap();
    store
        .insert_connection(WorkflowConnection::start(wf.id, check.id))
        .await
        .unwrap();
    store
        .insert_connection(
            WorkflowConnection::between(wf.id, check.id, notify.id)
                .with_condition(ConditionType::True),
        )
        .await
        .unwrap();
    store
        .insert_connection(
            WorkflowConnection::between(wf.id, check.id, audit.id)
                .with_condition(ConditionType::False),
        )
        .await
        .unwrap();

    let confirmed = runtime
        .fire(
            organization,
            TriggerType::BookingConfirmed,
            map(json!({ "booking": { "id": 5, "status": "confirmed" } })),
        )
        .await
        .unwrap();
    let pending = runtime
        .fire(
            organization,
            TriggerType::BookingConfirmed,
            map(json!({ "booking": { "id": 6, "status": "pending" } })),
        )
        .await
        .unwrap();

    let confirmed = store.get_execution(confirmed[0]).await.unwrap().unwrap();
    assert_eq!(confirmed.status, ExecutionStatus::Completed);
    assert_eq!(
        confirmed.action_result(notify.id),
        Some(&json!({ "notified": "5" }))
    );
    assert!(confirmed.action_result(audit.id).is_none());

    let pending = store.get_execution(pending[0]).await.unwrap().unwrap();
    assert_eq!(pending.status, ExecutionStatus::Completed);
    assert!(pending.action_result(notify.id).is_none());
    assert_eq!(
        pending.action_result(audit.id),
        Some(&json!({ "message": "pending 6", "level": "info" }))
    );
}
