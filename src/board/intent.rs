use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::task::Status;
use crate::ops::reorder::Placement;
use crate::ops::task_ops::TaskField;

/// A decoded user gesture. One variant per board operation; the JSON form is
/// tagged by `op`, e.g. `{"op":"moveTask","taskId":"..","targetStatus":"done"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Intent {
    SwitchView {
        key: String,
    },
    AddProject {
        name: String,
    },
    RenameProject {
        old_name: String,
        new_name: String,
    },
    DeleteProject {
        name: String,
    },
    TogglePin {
        name: String,
    },
    ArchiveProject {
        name: String,
    },
    RestoreProject {
        name: String,
    },
    AddTask {
        project_name: String,
        status: Status,
        name: String,
        #[serde(default)]
        description: String,
        #[serde(default)]
        due_date: Option<NaiveDate>,
        #[serde(default)]
        is_important: bool,
    },
    EditTaskField {
        task_id: String,
        field: TaskField,
        value: String,
    },
    DeleteTask {
        task_id: String,
    },
    DuplicateTask {
        task_id: String,
        #[serde(default)]
        project_name: Option<String>,
    },
    ToggleImportance {
        task_id: String,
    },
    AddSubtask {
        task_id: String,
        text: String,
    },
    ToggleSubtaskDone {
        task_id: String,
        subtask_id: String,
    },
    DeleteSubtask {
        task_id: String,
        subtask_id: String,
    },
    DuplicateSubtask {
        task_id: String,
        subtask_id: String,
    },
    ConvertSubtaskToTask {
        task_id: String,
        subtask_id: String,
    },
    MoveTask {
        task_id: String,
        target_status: Status,
        #[serde(default)]
        reference_task_id: Option<String>,
        #[serde(default)]
        placement: Placement,
    },
    MoveSubtask {
        subtask_id: String,
        source_task_id: String,
        target_task_id: String,
        #[serde(default)]
        reference_subtask_id: Option<String>,
        #[serde(default)]
        placement: Placement,
    },
    MoveProject {
        name: String,
        reference_name: String,
        #[serde(default)]
        placement: Placement,
    },
    Undo,
    Redo,
    SetMaxUndoDepth {
        depth: usize,
    },
}

/// What an applied intent produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "camelCase")]
pub enum Applied {
    /// Done; nothing to report
    Ok,
    /// A task or subtask was created with this id
    Created { id: String },
    /// A project was created under this (trimmed) name
    Project { name: String },
    /// A boolean flag now has this value
    Toggled { value: bool },
    /// Undo or redo; `moved` is false when the stack was empty
    Stepped { moved: bool },
    /// The undo depth now in effect
    Depth { depth: usize },
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn parses_camel_case_intents() {
        let intent: Intent = serde_json::from_value(json!({
            "op": "moveTask",
            "taskId": "t1",
            "targetStatus": "inprogress",
            "referenceTaskId": "t2",
            "placement": "after"
        }))
        .unwrap();
        assert_eq!(
            intent,
            Intent::MoveTask {
                task_id: "t1".into(),
                target_status: Status::InProgress,
                reference_task_id: Some("t2".into()),
                placement: Placement::After,
            }
        );
    }

    #[test]
    fn optional_fields_default() {
        let intent: Intent = serde_json::from_str(r#"{"op":"moveTask","taskId":"t1","targetStatus":"done"}"#).unwrap();
        assert_eq!(
            intent,
            Intent::MoveTask {
                task_id: "t1".into(),
                target_status: Status::Done,
                reference_task_id: None,
                placement: Placement::Before,
            }
        );
        let intent: Intent =
            serde_json::from_str(r#"{"op":"addTask","projectName":"Work","status":"todo","name":"x"}"#).unwrap();
        assert!(matches!(intent, Intent::AddTask { due_date: None, is_important: false, .. }));
    }

    #[test]
    fn unit_variants_and_field_names() {
        let undo: Intent = serde_json::from_str(r#"{"op":"undo"}"#).unwrap();
        assert_eq!(undo, Intent::Undo);
        let edit: Intent =
            serde_json::from_str(r#"{"op":"editTaskField","taskId":"t","field":"dueDate","value":""}"#).unwrap();
        assert!(matches!(edit, Intent::EditTaskField { field: TaskField::DueDate, .. }));
        assert!(serde_json::from_str::<Intent>(r#"{"op":"fly"}"#).is_err());
    }

    #[test]
    fn applied_serializes_with_result_tag() {
        let json = serde_json::to_value(Applied::Created { id: "x".into() }).unwrap();
        assert_eq!(json, json!({"result": "created", "id": "x"}));
    }
}
