//! Test fixtures for statuses, messages and frames.

use chrono::{TimeZone, Utc};
use od_protocol::message_models::{TaskMessage, TypingUser};
use od_protocol::pipeline_models::{PipelineRunStatus, PipelineStatus, PipelineStep, StepStatus};
use od_protocol::realtime::ServerFrame;

/// A five step status with the given run status and progress.
#[allow(dead_code)]
pub fn create_status(run: PipelineRunStatus, progress: f64) -> PipelineStatus {
    let names = [
        "validate_credentials",
        "sync_products",
        "sync_inventory",
        "sync_orders",
        "finalize",
    ];
    let steps = names
        .iter()
        .zip(1..)
        .map(|(name, number)| PipelineStep {
            step_number: number,
            step_name: (*name).to_string(),
            step_description: None,
            status: match number {
                1 => StepStatus::Completed,
                2 => StepStatus::InProgress,
                _ => StepStatus::Pending,
            },
            items_processed: 0,
            items_failed: 0,
            items_total: 0,
            error_message: None,
        })
        .collect();

    PipelineStatus {
        pipeline_id: "pl-1".to_string(),
        status: run,
        current_step: 2,
        total_steps: 5,
        progress,
        progress_message: None,
        steps,
        started_at: Some(Utc.with_ymd_and_hms(2026, 4, 2, 8, 0, 0).unwrap()),
        completed_at: None,
        last_error: (run == PipelineRunStatus::Failed).then(|| "inventory feed timed out".to_string()),
    }
}

/// A message from another user.
#[allow(dead_code)]
pub fn create_message(id: &str, content: &str) -> TaskMessage {
    TaskMessage {
        id: id.to_string(),
        sender_id: "user-2".to_string(),
        sender_name: "Dana".to_string(),
        sender_avatar: None,
        content: content.to_string(),
        timestamp: Utc.with_ymd_and_hms(2026, 4, 2, 9, 30, 0).unwrap(),
        is_from_current_user: false,
        client_message_id: None,
    }
}

#[allow(dead_code)]
pub fn message_frame(task_id: &str, message: TaskMessage) -> ServerFrame {
    ServerFrame::TaskMessage {
        task_id: task_id.to_string(),
        message,
    }
}

#[allow(dead_code)]
pub fn typing_frame(task_id: &str, name: &str, is_typing: bool) -> ServerFrame {
    ServerFrame::TaskTyping {
        task_id: task_id.to_string(),
        user: TypingUser {
            name: name.to_string(),
        },
        is_typing,
    }
}
