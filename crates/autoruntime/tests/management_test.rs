mod common;

use autocore::{
    ConditionType, ManagementError, MemoryStore, NodeType, TriggerType, WorkflowStatus,
    WorkflowStore,
};
use autoruntime::{ConnectionInput, NodeInput, WorkflowInput, WorkflowService};
use common::*;
use serde_json::json;
use std::sync::{Arc, Mutex};

fn service() -> (Arc<MemoryStore>, WorkflowService) {
    let calls: CallLog = Arc::new(Mutex::new(Vec::new()));
    let store = Arc::new(MemoryStore::new());
    let service = WorkflowService::new(store.clone(), Arc::new(test_registry(&calls)));
    (store, service)
}

fn input(name: &str, trigger_type: &str) -> WorkflowInput {
    WorkflowInput {
        name: Some(name.to_string()),
        trigger_type: Some(trigger_type.to_string()),
        ..Default::default()
    }
}

fn validation_errors(result: Result<impl std::fmt::Debug, ManagementError>) -> Vec<String> {
    match result {
        Err(ManagementError::Validation(errors)) => errors,
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn create_workflow_with_defaults() {
    let (_, service) = service();
    let organization = org();
    let author = user();

    let wf = service
        .create(input("Confirmation mail", "booking.confirmed"), organization, author)
        .await
        .unwrap();

    assert_eq!(wf.name, "Confirmation mail");
    assert_eq!(wf.trigger_type, TriggerType::BookingConfirmed);
    assert_eq!(wf.status, WorkflowStatus::Draft);
    assert_eq!(wf.organization_id, organization);
    assert_eq!(wf.created_by, author);
    assert!(wf.trigger_config.is_empty());
    assert_eq!(service.get(wf.id).await.unwrap().id, wf.id);
}

#[tokio::test]
async fn create_rejects_bad_fields_all_at_once() {
    let (_, service) = service();

    let errors = validation_errors(
        service
            .create(
                WorkflowInput {
                    name: Some("x".to_string()),
                    trigger_type: Some("booking.exploded".to_string()),
                    status: Some("paused".to_string()),
                    ..Default::default()
                },
                org(),
                user(),
            )
            .await,
    );

    assert_eq!(errors.len(), 3);
    assert!(errors[0].contains("name must be between 2 and 255"));
    assert!(errors[1].starts_with("trigger_type must be one of"));
    assert!(errors[2].starts_with("status must be one of"));
}

#[tokio::test]
async fn create_requires_name_and_trigger() {
    let (_, service) = service();

    let errors = validation_errors(service.create(WorkflowInput::default(), org(), user()).await);

    assert_eq!(errors, vec!["name is required", "trigger_type is required"]);
}

#[tokio::test]
async fn name_length_is_counted_in_characters() {
    let (_, service) = service();
    let long = "é".repeat(255);

    assert!(service
        .create(input(&long, "event.created"), org(), user())
        .await
        .is_ok());
    let too_long = "a".repeat(256);
    assert!(service
        .create(input(&too_long, "event.created"), org(), user())
        .await
        .is_err());
}

#[tokio::test]
async fn update_patches_only_given_fields() {
    let (_, service) = service();
    let wf = service
        .create(input("Reminder", "booking.reminder"), org(), user())
        .await
        .unwrap();

    let updated = service
        .update(
            &wf,
            WorkflowInput {
                status: Some("active".to_string()),
                trigger_config: Some(payload(json!({ "hours_before": 24 }))),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.name, "Reminder");
    assert_eq!(updated.trigger_type, TriggerType::BookingReminder);
    assert_eq!(updated.status, WorkflowStatus::Active);
    assert_eq!(updated.trigger_config["hours_before"], json!(24));

    let errors = validation_errors(
        service
            .update(
                &updated,
                WorkflowInput {
                    name: Some("a".to_string()),
                    ..Default::default()
                },
            )
            .await,
    );
    assert_eq!(errors.len(), 1);
}

#[tokio::test]
async fn soft_delete_hides_workflow_but_keeps_row() {
    let (store, service) = service();
    let organization = org();
    let wf = service
        .create(input("Cleanup", "event.deleted"), organization, user())
        .await
        .unwrap();

    service.delete(&wf).await.unwrap();

    assert!(matches!(
        service.get(wf.id).await,
        Err(ManagementError::NotFound(_))
    ));
    assert!(service.list(organization).await.unwrap().is_empty());
    let tombstone = store.get_workflow(wf.id, true).await.unwrap().unwrap();
    assert!(tombstone.deleted);
}

#[tokio::test]
async fn hard_delete_removes_graph() {
    let (store, service) = service();
    let wf = service
        .create(input("Temp", "event.updated"), org(), user())
        .await
        .unwrap();
    let node = service
        .create_node(
            &wf,
            NodeInput {
                node_type: Some("action".to_string()),
                action_type: Some("log".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    service
        .create_connection(
            &wf,
            ConnectionInput {
                to_node: Some(node.id),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    service.hard_delete(&wf).await.unwrap();

    assert!(store.get_workflow(wf.id, true).await.unwrap().is_none());
    assert!(store.list_nodes(wf.id, true).await.unwrap().is_empty());
    assert!(store.list_connections(wf.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn create_node_validates_type() {
    let (_, service) = service();
    let wf = service
        .create(input("Nodes", "booking.created"), org(), user())
        .await
        .unwrap();

    let errors = validation_errors(
        service
            .create_node(
                &wf,
                NodeInput {
                    node_type: Some("loop".to_string()),
                    ..Default::default()
                },
            )
            .await,
    );
    assert_eq!(errors, vec!["node_type must be one of: trigger, action, condition"]);

    let node = service
        .create_node(
            &wf,
            NodeInput {
                node_type: Some("condition".to_string()),
                name: Some("Is confirmed?".to_string()),
                config: Some(payload(json!({
                    "field": "booking.status",
                    "operator": "equals",
                    "value": "confirmed"
                }))),
                position: Some(autocore::Position { x: 120.0, y: 40.0 }),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(node.node_type, NodeType::Condition);
    assert_eq!(node.position.x, 120.0);
    assert_eq!(service.list_nodes(&wf).await.unwrap().len(), 1);
}

#[tokio::test]
async fn connection_target_must_belong_to_workflow() {
    let (_, service) = service();
    let organization = org();
    let wf = service
        .create(input("Main", "booking.created"), organization, user())
        .await
        .unwrap();
    let other = service
        .create(input("Other", "booking.created"), organization, user())
        .await
        .unwrap();
    let foreign = service
        .create_node(
            &other,
            NodeInput {
                node_type: Some("action".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let result = service
        .create_connection(
            &wf,
            ConnectionInput {
                to_node: Some(foreign.id),
                ..Default::default()
            },
        )
        .await;
    assert_eq!(
        result.unwrap_err(),
        ManagementError::NotFound("To node not found".to_string())
    );

    let missing = service
        .create_connection(&wf, ConnectionInput::default())
        .await;
    assert_eq!(validation_errors(missing), vec!["to_node is required"]);
}

#[tokio::test]
async fn connection_condition_type_is_parsed() {
    let (_, service) = service();
    let wf = service
        .create(input("Branches", "booking.created"), org(), user())
        .await
        .unwrap();
    let condition = service
        .create_node(
            &wf,
            NodeInput {
                node_type: Some("condition".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let action = service
        .create_node(
            &wf,
            NodeInput {
                node_type: Some("action".to_string()),
                action_type: Some("log".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let edge = service
        .create_connection(
            &wf,
            ConnectionInput {
                from_node: Some(condition.id),
                to_node: Some(action.id),
                condition_type: Some("false".to_string()),
                priority: Some(3),
            },
        )
        .await
        .unwrap();
    assert_eq!(edge.condition_type, Some(ConditionType::False));
    assert_eq!(edge.priority, 3);
    assert_eq!(edge.from_node, Some(condition.id));

    let bad = service
        .create_connection(
            &wf,
            ConnectionInput {
                to_node: Some(action.id),
                condition_type: Some("maybe".to_string()),
                ..Default::default()
            },
        )
        .await;
    assert_eq!(validation_errors(bad), vec!["condition_type must be one of: true, false"]);
}

#[tokio::test]
async fn validate_graph_reports_structural_problems() {
    let (_, service) = service();
    let wf = service
        .create(input("Broken", "booking.created"), org(), user())
        .await
        .unwrap();
    let unknown = service
        .create_node(
            &wf,
            NodeInput {
                node_type: Some("action".to_string()),
                action_type: Some("fax".to_string()),
                name: Some("Fax".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let email = service
        .create_node(
            &wf,
            NodeInput {
                node_type: Some("action".to_string()),
                action_type: Some("send_email".to_string()),
                name: Some("Mail".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    for (from, to) in [(unknown.id, email.id), (email.id, unknown.id)] {
        service
            .create_connection(
                &wf,
                ConnectionInput {
                    from_node: Some(from),
                    to_node: Some(to),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
    }

    let warnings = service.validate_graph(&wf).await.unwrap();

    assert!(warnings.contains(&"Workflow has no starting node".to_string()));
    assert!(warnings.iter().any(|w| w.contains("unknown action type fax")));
    assert!(warnings.iter().any(|w| w == "Action node Mail: to is required"));
    assert!(warnings.iter().any(|w| w.contains("cycle")));
    assert_eq!(
        warnings
            .iter()
            .filter(|w| w.contains("not reachable"))
            .count(),
        2
    );
}

#[tokio::test]
async fn deleted_nodes_are_hidden_from_listing() {
    let (store, service) = service();
    let wf = service
        .create(input("Nodes", "booking.created"), org(), user())
        .await
        .unwrap();
    let node = service
        .create_node(
            &wf,
            NodeInput {
                node_type: Some("trigger".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    service.delete_node(&node).await.unwrap();

    assert!(service.list_nodes(&wf).await.unwrap().is_empty());
    assert!(store.get_node(node.id, true).await.unwrap().unwrap().deleted);

    let renamed = service
        .update_node(
            &node,
            NodeInput {
                name: Some("Renamed".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.name.as_deref(), Some("Renamed"));
}
