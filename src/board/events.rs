use serde::Serialize;

/// Notifications for the host, queued on the board and drained after each call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum BoardEvent {
    /// State differs from the last render
    StateChanged,
    /// A task entered the done column from another status
    Celebrate {
        #[serde(rename = "taskId")]
        task_id: String,
    },
    /// An operation failed or its result could not be saved
    Error { code: &'static str, message: String },
}
