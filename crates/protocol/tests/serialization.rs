use od_protocol::*;
use serde_json::json;

#[test]
fn test_pipeline_status_deserialization_from_server_json() {
    let value = json!({
        "pipelineId": "pl-9",
        "status": "IN_PROGRESS",
        "currentStep": 2,
        "totalSteps": 5,
        "progress": 40,
        "progressMessage": "Syncing products",
        "steps": [
            {
                "stepNumber": 1,
                "stepName": "connect_channel",
                "status": "COMPLETED",
                "itemsProcessed": 1,
                "itemsFailed": 0,
                "itemsTotal": 1
            },
            {
                "stepNumber": 2,
                "stepName": "sync_products",
                "stepDescription": "Import the product catalog",
                "status": "IN_PROGRESS",
                "itemsProcessed": 120,
                "itemsFailed": 0,
                "itemsTotal": 0
            }
        ],
        "startedAt": "2024-05-01T10:00:00Z"
    });

    let status: PipelineStatus =
        serde_json::from_value(value).expect("Failed to deserialize PipelineStatus");

    assert_eq!(status.pipeline_id, "pl-9");
    assert_eq!(status.status, PipelineRunStatus::InProgress);
    assert_eq!(status.total_steps, 5);
    assert_eq!(status.progress, 40.0);
    assert_eq!(status.steps.len(), 2);
    assert_eq!(status.steps[1].status, StepStatus::InProgress);
    assert_eq!(status.steps[1].items_total, 0);
    assert!(status.started_at.is_some());
    assert!(status.completed_at.is_none());
    assert!(status.last_error.is_none());
}

#[test]
fn test_pipeline_status_tolerates_missing_optional_fields() {
    let value = json!({
        "pipelineId": "pl-1",
        "status": "PENDING",
        "currentStep": 1,
        "totalSteps": 3,
        "progress": 0
    });

    let status: PipelineStatus = serde_json::from_value(value).expect("minimal status");
    assert!(status.steps.is_empty());
    assert!(status.progress_message.is_none());
}

#[test]
fn test_run_status_serialization() {
    let json = serde_json::to_value(PipelineRunStatus::InProgress).expect("serialize");
    assert_eq!(json, "IN_PROGRESS");

    let deserialized: StepStatus = serde_json::from_value(json!("SKIPPED")).expect("deserialize");
    assert_eq!(deserialized, StepStatus::Skipped);
}

#[test]
fn test_start_request_serialization_uses_camel_case() {
    let request = StartPipelineRequest::new("ch-1", "cl-7", SyncType::Incremental)
        .with_sync_from_date(chrono::NaiveDate::from_ymd_opt(2024, 1, 31).expect("date"));

    let json = serde_json::to_value(&request).expect("serialize");
    assert_eq!(
        json,
        json!({
            "channelId": "ch-1",
            "clientId": "cl-7",
            "syncFromDate": "2024-01-31",
            "syncType": "incremental"
        })
    );

    let without_date = StartPipelineRequest::new("ch-1", "cl-7", SyncType::Initial);
    let json = serde_json::to_value(&without_date).expect("serialize");
    assert!(json.get("syncFromDate").is_none());
}

#[test]
fn test_task_message_deserialization() {
    let value = json!({
        "id": "m1",
        "senderId": "u1",
        "senderName": "Ana",
        "content": "Package is ready",
        "timestamp": "2024-05-01T10:00:00Z",
        "isFromCurrentUser": true
    });

    let message: TaskMessage = serde_json::from_value(value).expect("deserialize");
    assert_eq!(message.id, "m1");
    assert!(message.sender_avatar.is_none());
    assert!(message.client_message_id.is_none());
    assert!(message.is_from_current_user);
}

#[test]
fn test_server_frame_tagging() {
    let value = json!({
        "type": "taskTyping",
        "payload": { "taskId": "T1", "user": { "name": "Ana" }, "isTyping": true }
    });

    let frame: ServerFrame = serde_json::from_value(value).expect("deserialize");
    assert_eq!(frame.task_id(), "T1");
    assert!(matches!(frame, ServerFrame::TaskTyping { is_typing: true, .. }));
}

#[test]
fn test_client_frame_serialization() {
    let frame = ClientFrame::JoinTaskRoom {
        task_id: "T1".to_string(),
    };
    let json = serde_json::to_value(&frame).expect("serialize");
    assert_eq!(json, json!({ "type": "joinTaskRoom", "payload": { "taskId": "T1" } }));
}

#[test]
fn test_op_serialization() {
    let op = Op::OpenTask {
        task_id: Some("T-1".to_string()),
    };

    let json = serde_json::to_string(&op).expect("Failed to serialize Op");
    let deserialized: Op = serde_json::from_str(&json).expect("Failed to deserialize Op");
    assert_eq!(deserialized, op);

    let value: serde_json::Value = serde_json::from_str(&json).expect("json");
    assert_eq!(value["type"], "openTask");
}

#[test]
fn test_event_serialization() {
    let event = Event::PipelineFailed {
        pipeline_id: "pl-1".to_string(),
        error: "token expired".to_string(),
    };

    let value = serde_json::to_value(&event).expect("Failed to serialize Event");
    assert_eq!(value["type"], "pipelineFailed");
    assert_eq!(value["payload"]["error"], "token expired");
}

#[test]
fn test_pipeline_view_state_default_is_loading() {
    let state = PipelineViewState::default();
    assert_eq!(state.phase, PipelinePhase::Loading);
    assert!(state.pending_action.is_idle());
    assert!(state.phase.status().is_none());
}

#[test]
fn test_client_config_from_partial_toml() {
    let toml_str = r#"
[api]
base-url = "https://ops.example.com/api"

[pipeline]
auto-start = true
default-sync-type = "full"
"#;

    let config: ClientConfig = toml::from_str(toml_str).expect("Failed to parse ClientConfig");

    assert_eq!(config.api.base_url, "https://ops.example.com/api");
    assert_eq!(config.api.request_timeout_ms, 10_000);
    assert!(config.pipeline.auto_start);
    assert_eq!(config.pipeline.poll_interval_ms, 2_000);
    assert_eq!(config.pipeline.default_sync_type, SyncType::Full);
    assert_eq!(config.chat.typing_timeout_ms, 3_000);
}
