use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::state::{BoardState, TaskLocation};
use crate::model::task::{Status, Task};
use crate::ops::reorder::{Placement, reposition};
use crate::util::id::new_id;

/// Error type for task and subtask operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    #[error("task not found: {0}")]
    NotFound(String),
    #[error("subtask not found: {0}")]
    SubtaskNotFound(String),
    #[error("project not found: {0}")]
    ProjectNotFound(String),
    #[error("project \"{0}\" is archived")]
    ProjectArchived(String),
    #[error("task name cannot be empty")]
    EmptyName,
    #[error("subtask text cannot be empty")]
    EmptyText,
    #[error("invalid due date '{0}' (expected YYYY-MM-DD)")]
    InvalidDueDate(String),
    #[error("cannot drop a {from} task onto a {onto} task; drop it on the column instead")]
    CrossColumnDrop { from: Status, onto: Status },
    #[error("items can only be moved within one project")]
    CrossProjectMove,
}

/// Fields for a new task besides its status
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewTask {
    pub name: String,
    pub description: String,
    pub due_date: Option<NaiveDate>,
    pub is_important: bool,
}

impl NewTask {
    pub fn named(name: impl Into<String>) -> Self {
        NewTask {
            name: name.into(),
            ..NewTask::default()
        }
    }
}

/// A task field editable in place
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskField {
    Name,
    Description,
    DueDate,
}

impl TaskField {
    pub fn parse(s: &str) -> Option<TaskField> {
        match s {
            "name" => Some(TaskField::Name),
            "description" | "desc" => Some(TaskField::Description),
            "dueDate" | "due" => Some(TaskField::DueDate),
            _ => None,
        }
    }
}

/// Resolve a task id to its location, or fail with `NotFound`
pub fn locate(state: &BoardState, task_id: &str) -> Result<TaskLocation, TaskError> {
    state
        .locate_task(task_id)
        .ok_or_else(|| TaskError::NotFound(task_id.to_string()))
}

pub(crate) fn tasks_at<'a>(state: &'a mut BoardState, project: &str) -> Result<&'a mut Vec<Task>, TaskError> {
    state
        .project_mut(project)
        .map(|p| &mut p.tasks)
        .ok_or_else(|| TaskError::ProjectNotFound(project.to_string()))
}

pub(crate) fn task_mut<'a>(state: &'a mut BoardState, task_id: &str) -> Result<&'a mut Task, TaskError> {
    state
        .find_task_mut(task_id)
        .ok_or_else(|| TaskError::NotFound(task_id.to_string()))
}

// ---------------------------------------------------------------------------
// Task CRUD
// ---------------------------------------------------------------------------

/// Append a task to a project. Returns the assigned id.
pub fn add_task(state: &mut BoardState, project: &str, status: Status, fields: NewTask) -> Result<String, TaskError> {
    let name = fields.name.trim();
    if name.is_empty() {
        return Err(TaskError::EmptyName);
    }
    let target = state
        .project(project)
        .ok_or_else(|| TaskError::ProjectNotFound(project.to_string()))?;
    if target.is_archived {
        return Err(TaskError::ProjectArchived(project.to_string()));
    }

    let id = new_id();
    let mut task = Task::new(id.clone(), name.to_string(), status);
    task.description = fields.description.trim().to_string();
    task.due_date = fields.due_date;
    task.is_important = fields.is_important;
    tasks_at(state, project)?.push(task);
    debug!(task = %id, project, %status, "added task");
    Ok(id)
}

/// Edit one field of a task. Setting a field to its current value changes
/// nothing.
pub fn edit_task_field(state: &mut BoardState, task_id: &str, field: TaskField, value: &str) -> Result<(), TaskError> {
    let task = task_mut(state, task_id)?;
    let value = value.trim();
    match field {
        TaskField::Name => {
            if value.is_empty() {
                return Err(TaskError::EmptyName);
            }
            task.name = value.to_string();
        }
        TaskField::Description => task.description = value.to_string(),
        TaskField::DueDate => task.due_date = parse_due_input(value)?,
    }
    Ok(())
}

/// Parse user input for a due date: empty clears it
pub fn parse_due_input(value: &str) -> Result<Option<NaiveDate>, TaskError> {
    if value.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| TaskError::InvalidDueDate(value.to_string()))
}

/// Remove a task and its subtasks. Returns the removed task.
pub fn delete_task(state: &mut BoardState, task_id: &str) -> Result<Task, TaskError> {
    let loc = locate(state, task_id)?;
    let task = tasks_at(state, &loc.project)?.remove(loc.index);
    debug!(task = task_id, project = %loc.project, "deleted task");
    Ok(task)
}

/// Copy a task right after the original with " (Copy)" appended and fresh
/// ids throughout. When `project` is given the task must live there.
/// Returns the new task's id.
pub fn duplicate_task(state: &mut BoardState, task_id: &str, project: Option<&str>) -> Result<String, TaskError> {
    let loc = locate(state, task_id)?;
    if project.is_some_and(|p| p != loc.project) {
        return Err(TaskError::NotFound(task_id.to_string()));
    }
    let tasks = tasks_at(state, &loc.project)?;

    let mut copy = tasks[loc.index].clone();
    copy.id = new_id();
    copy.name = format!("{} (Copy)", copy.name);
    for subtask in &mut copy.subtasks {
        subtask.id = new_id();
    }
    let id = copy.id.clone();
    tasks.insert(loc.index + 1, copy);
    Ok(id)
}

/// Flip a task's important flag. Returns the new value.
pub fn toggle_importance(state: &mut BoardState, task_id: &str) -> Result<bool, TaskError> {
    let task = task_mut(state, task_id)?;
    task.is_important = !task.is_important;
    Ok(task.is_important)
}

// ---------------------------------------------------------------------------
// Move operations
// ---------------------------------------------------------------------------

/// Move a task by drag intent.
///
/// Without a reference the task was dropped on a column: it leaves its slot,
/// takes the column's status and goes to the end of the project's task list.
/// With a reference it was dropped on a peer card: both must share the
/// column, and only the position changes.
///
/// Returns true when the task entered `done` from another status.
pub fn move_task(
    state: &mut BoardState,
    task_id: &str,
    status: Status,
    reference: Option<&str>,
    placement: Placement,
) -> Result<bool, TaskError> {
    let loc = locate(state, task_id)?;
    let target = match reference {
        Some(r) if r == task_id => return Ok(false),
        Some(r) => Some(locate(state, r)?),
        None => None,
    };
    let tasks = tasks_at(state, &loc.project)?;
    let old_status = tasks[loc.index].status;

    let Some(target) = target else {
        let mut task = tasks.remove(loc.index);
        task.status = status;
        tasks.push(task);
        return Ok(status == Status::Done && old_status != Status::Done);
    };

    if target.project != loc.project {
        return Err(TaskError::CrossProjectMove);
    }
    let target_status = tasks[target.index].status;
    if target_status != old_status || status != old_status {
        return Err(TaskError::CrossColumnDrop {
            from: old_status,
            onto: target_status,
        });
    }
    reposition(tasks, loc.index, target.index, placement);
    Ok(false)
}

// ---------------------------------------------------------------------------
// Subtask promotion
// ---------------------------------------------------------------------------

/// Turn a subtask into a backlog task at the end of the same project.
/// Returns the new task's id.
pub fn convert_subtask_to_task(state: &mut BoardState, task_id: &str, subtask_id: &str) -> Result<String, TaskError> {
    let loc = locate(state, task_id)?;
    let tasks = tasks_at(state, &loc.project)?;
    let parent = &mut tasks[loc.index];
    let index = parent
        .subtask_index(subtask_id)
        .ok_or_else(|| TaskError::SubtaskNotFound(subtask_id.to_string()))?;
    let subtask = parent.subtasks.remove(index);

    let id = new_id();
    let mut task = Task::new(id.clone(), subtask.text, Status::Backlog);
    task.description = format!("Converted from subtask of \"{}\"", parent.name);
    tasks.push(task);
    Ok(id)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
