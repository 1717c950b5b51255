//! Lenient validation of untrusted board records.
//!
//! Persisted and imported data arrive as a raw `serde_json::Value`. The only
//! fatal defect is a top level that is not an object; every other shape
//! problem is repaired and logged.

use std::collections::HashSet;

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::model::project::Project;
use crate::model::state::{ALL_IMPORTANT_KEY, BoardState, DEFAULT_PROJECT_NAME, View};
use crate::model::task::{Status, Subtask, Task};
use crate::ops::query::name_order;
use crate::util::id::{id_from_value, new_id};

/// Error type for normalization
#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("invalid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("expected an object at the top level, found {0}")]
    NotARecord(&'static str),
}

/// Parse text and normalize it
pub fn normalize_str(text: &str) -> Result<BoardState, NormalizeError> {
    let raw: Value = serde_json::from_str(text)?;
    normalize(&raw)
}

/// Turn an arbitrary record into a valid board state.
pub fn normalize(raw: &Value) -> Result<BoardState, NormalizeError> {
    let record = raw
        .as_object()
        .ok_or_else(|| NormalizeError::NotARecord(kind_of(raw)))?;

    let mut repairs = Repairs::default();

    let raw_projects = match record.get("projects") {
        Some(Value::Object(map)) => Some(map),
        Some(_) => {
            repairs.note("projects is not an object; starting empty");
            None
        }
        None => None,
    };

    let mut seen_ids = HashSet::new();
    let mut projects: IndexMap<String, Project> = IndexMap::new();
    for (name, value) in raw_projects.into_iter().flatten() {
        if name == ALL_IMPORTANT_KEY {
            repairs.note("dropped project keyed by the all-important sentinel");
            continue;
        }
        let project = normalize_project(name, value, &mut seen_ids, &mut repairs);
        projects.insert(name.clone(), project);
    }
    let was_empty = projects.is_empty();

    // The default project sits first, pinned and active
    match projects.get_index_of(DEFAULT_PROJECT_NAME) {
        Some(index) => {
            projects.move_index(index, 0);
            if let Some(default) = projects.get_mut(DEFAULT_PROJECT_NAME) {
                if !default.is_pinned || default.is_archived {
                    repairs.note("default project forced pinned and active");
                }
                default.is_pinned = true;
                default.is_archived = false;
            }
        }
        None => {
            if !was_empty {
                repairs.note("default project was missing");
            }
            projects.shift_insert(0, DEFAULT_PROJECT_NAME.to_string(), Project::pinned());
        }
    }

    let unpinned_order = rebuild_unpinned_order(record.get("projectOrder"), &projects, &mut repairs);

    let mut state = BoardState {
        current_view: View::project(DEFAULT_PROJECT_NAME),
        projects,
        unpinned_order,
    };
    state.current_view = if was_empty {
        View::project(DEFAULT_PROJECT_NAME)
    } else {
        let requested = match record.get("currentProject") {
            Some(Value::String(key)) => Some(View::from(key.clone())),
            _ => None,
        };
        match requested {
            Some(view) if state.view_is_valid(&view) => view,
            _ => {
                repairs.note("current view did not resolve");
                fallback_view(&state)
            }
        }
    };

    repairs.log();
    Ok(state)
}

/// The view to show when the current one is gone: the first unpinned project
/// in order, else the first pinned project alphabetically, else the
/// all-important view.
pub fn fallback_view(state: &BoardState) -> View {
    if let Some(name) = state
        .unpinned_order
        .iter()
        .find(|name| state.project(name).is_some_and(Project::is_unpinned_active))
    {
        return View::project(name.clone());
    }
    state
        .projects
        .iter()
        .filter(|(_, p)| p.is_pinned && p.is_active())
        .map(|(name, _)| name)
        .min_by(|a, b| name_order(a, b))
        .map(|name| View::project(name.clone()))
        .unwrap_or(View::AllImportant)
}

/// Keep listed names that are unpinned active projects (first occurrence
/// wins), then append the missing ones in mapping order.
fn rebuild_unpinned_order(
    raw: Option<&Value>,
    projects: &IndexMap<String, Project>,
    repairs: &mut Repairs,
) -> Vec<String> {
    let listed: Vec<&str> = match raw {
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
        Some(_) => {
            repairs.note("projectOrder is not an array; rebuilding");
            Vec::new()
        }
        None => Vec::new(),
    };

    let mut order: Vec<String> = Vec::new();
    for name in listed {
        let keep = projects.get(name).is_some_and(Project::is_unpinned_active)
            && !order.iter().any(|n| n == name);
        if keep {
            order.push(name.to_string());
        } else {
            repairs.note("dropped stale projectOrder entry");
        }
    }
    for (name, project) in projects {
        if project.is_unpinned_active() && !order.contains(name) {
            order.push(name.clone());
        }
    }
    order
}

fn normalize_project(
    name: &str,
    value: &Value,
    seen_ids: &mut HashSet<String>,
    repairs: &mut Repairs,
) -> Project {
    let empty = Map::new();
    let (record, raw_tasks) = match value {
        Value::Array(tasks) => {
            debug!(project = name, "migrating legacy task-list project");
            (&empty, Some(tasks))
        }
        Value::Object(record) => (record, None),
        _ => {
            repairs.note("project record was not an object; reset");
            return Project::new();
        }
    };

    let raw_tasks = raw_tasks.or_else(|| record.get("tasks").and_then(Value::as_array));
    let tasks = raw_tasks
        .into_iter()
        .flatten()
        .filter_map(|raw| {
            let task = raw.as_object().map(|r| normalize_task(r, seen_ids, repairs));
            if task.is_none() {
                repairs.note("discarded non-object task");
            }
            task
        })
        .collect();

    Project {
        tasks,
        is_archived: bool_field(record, "isArchived"),
        is_pinned: bool_field(record, "isPinned"),
    }
}

fn normalize_task(record: &Map<String, Value>, seen_ids: &mut HashSet<String>, repairs: &mut Repairs) -> Task {
    let id = unique_id(id_from_value(record.get("id")), seen_ids, repairs);
    let status = match record.get("status").and_then(Value::as_str).and_then(Status::parse) {
        Some(status) => status,
        None => {
            repairs.note("task status reset to backlog");
            Status::Backlog
        }
    };

    let subtasks = match record.get("subtasks") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|raw| {
                let subtask = raw.as_object().map(|r| normalize_subtask(r, seen_ids, repairs));
                if subtask.is_none() {
                    repairs.note("discarded non-object subtask");
                }
                subtask
            })
            .collect(),
        _ => Vec::new(),
    };

    Task {
        id,
        name: text_field(record, "name").unwrap_or_else(|| "Untitled Task".to_string()),
        description: text_field(record, "description").unwrap_or_default(),
        status,
        is_important: bool_field(record, "isImportant"),
        due_date: record.get("dueDate").and_then(Value::as_str).and_then(parse_due_date),
        subtasks,
    }
}

fn normalize_subtask(
    record: &Map<String, Value>,
    seen_ids: &mut HashSet<String>,
    repairs: &mut Repairs,
) -> Subtask {
    Subtask {
        id: unique_id(id_from_value(record.get("id")), seen_ids, repairs),
        text: text_field(record, "text").unwrap_or_else(|| "Untitled Subtask".to_string()),
        completed: bool_field(record, "completed"),
    }
}

/// Keep the given id unless it is missing or already taken
fn unique_id(candidate: Option<String>, seen_ids: &mut HashSet<String>, repairs: &mut Repairs) -> String {
    let id = match candidate {
        Some(id) if !seen_ids.contains(&id) => id,
        Some(_) => {
            repairs.note("duplicate id reassigned");
            new_id()
        }
        None => new_id(),
    };
    seen_ids.insert(id.clone());
    id
}

/// Parse a due date from the first ten characters (`YYYY-MM-DD`), so
/// full timestamps are accepted too
pub fn parse_due_date(text: &str) -> Option<NaiveDate> {
    let day = text.get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

fn text_field(record: &Map<String, Value>, key: &str) -> Option<String> {
    match record.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn bool_field(record: &Map<String, Value>, key: &str) -> bool {
    record.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[derive(Default)]
struct Repairs {
    count: usize,
    first: Option<&'static str>,
}

impl Repairs {
    fn note(&mut self, what: &'static str) {
        self.count += 1;
        if self.first.is_none() {
            self.first = Some(what);
        }
    }

    fn log(&self) {
        if let Some(first) = self.first {
            warn!(repairs = self.count, first, "repaired malformed board data");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn renormalize(state: &BoardState) -> BoardState {
        normalize(&serde_json::to_value(state).unwrap()).unwrap()
    }

    #[test]
    fn rejects_non_records() {
        for raw in [json!(null), json!([1, 2]), json!("x"), json!(3)] {
            assert!(matches!(normalize(&raw), Err(NormalizeError::NotARecord(_))));
        }
        assert!(matches!(normalize_str("{nope"), Err(NormalizeError::Parse(_))));
    }

    #[test]
    fn empty_record_gets_default_project() {
        let state = normalize(&json!({})).unwrap();
        assert_eq!(state, BoardState::empty());
    }

    #[test]
    fn invalid_projects_value_becomes_empty() {
        let state = normalize(&json!({"projects": "oops", "currentProject": "Work"})).unwrap();
        assert_eq!(state.projects.len(), 1);
        assert_eq!(state.current_view, View::project(DEFAULT_PROJECT_NAME));
    }

    #[test]
    fn migrates_legacy_array_projects() {
        let raw = json!({
            "currentProject": "Old",
            "projects": {"Old": [{"id": "t1", "name": "Legacy", "status": "todo"}]}
        });
        let state = normalize(&raw).unwrap();
        let old = &state.projects["Old"];
        assert!(!old.is_pinned);
        assert!(!old.is_archived);
        assert_eq!(old.tasks[0].name, "Legacy");
        assert_eq!(state.unpinned_order, vec!["Old".to_string()]);
        assert_eq!(state.current_view, View::project("Old"));
    }

    #[test]
    fn repairs_task_and_subtask_fields() {
        let raw = json!({
            "projects": {"P": {"tasks": [
                7,
                {"status": "doing", "isImportant": "yes", "dueDate": "2025-02-03T10:00:00Z",
                 "subtasks": [null, {"completed": 1}, {"id": 9, "text": "ok", "completed": true}]}
            ]}}
        });
        let state = normalize(&raw).unwrap();
        let tasks = &state.projects["P"].tasks;
        assert_eq!(tasks.len(), 1);
        let task = &tasks[0];
        assert!(!task.id.is_empty());
        assert_eq!(task.name, "Untitled Task");
        assert_eq!(task.description, "");
        assert_eq!(task.status, Status::Backlog);
        assert!(!task.is_important);
        assert_eq!(task.due_date, NaiveDate::from_ymd_opt(2025, 2, 3));
        assert_eq!(task.subtasks.len(), 2);
        assert_eq!(task.subtasks[0].text, "Untitled Subtask");
        assert!(!task.subtasks[0].completed);
        assert_eq!(task.subtasks[1].id, "9");
        assert!(task.subtasks[1].completed);
    }

    #[test]
    fn duplicate_ids_are_reassigned() {
        let raw = json!({"projects": {
            "A": {"tasks": [{"id": "x", "subtasks": [{"id": "x"}]}]},
            "B": {"tasks": [{"id": "x"}]}
        }});
        let state = normalize(&raw).unwrap();
        let a = &state.projects["A"].tasks[0];
        let b = &state.projects["B"].tasks[0];
        assert_eq!(a.id, "x");
        assert_ne!(a.subtasks[0].id, "x");
        assert_ne!(b.id, "x");
        assert_ne!(b.id, a.subtasks[0].id);
    }

    #[test]
    fn default_project_is_forced_first_and_pinned() {
        let raw = json!({
            "currentProject": "Default Project",
            "projects": {
                "Work": {"tasks": []},
                "Default Project": {"tasks": [], "isPinned": false, "isArchived": true}
            },
            "projectOrder": ["Default Project", "Work"]
        });
        let state = normalize(&raw).unwrap();
        let names: Vec<&str> = state.projects.keys().map(String::as_str).collect();
        assert_eq!(names, vec![DEFAULT_PROJECT_NAME, "Work"]);
        let default = &state.projects[DEFAULT_PROJECT_NAME];
        assert!(default.is_pinned);
        assert!(!default.is_archived);
        assert_eq!(state.unpinned_order, vec!["Work".to_string()]);
        assert_eq!(state.current_view, View::project(DEFAULT_PROJECT_NAME));
    }

    #[test]
    fn rebuilds_unpinned_order() {
        let raw = json!({
            "currentProject": "--all-important--",
            "projects": {
                "A": {}, "B": {}, "C": {"isPinned": true}, "D": {"isArchived": true}, "E": {}
            },
            "projectOrder": ["B", "ghost", "C", "D", "B", "A"]
        });
        let state = normalize(&raw).unwrap();
        assert_eq!(state.unpinned_order, vec!["B", "A", "E"]);
        assert_eq!(state.current_view, View::AllImportant);
    }

    #[test]
    fn unresolved_view_prefers_unpinned_then_pinned() {
        let raw = json!({
            "currentProject": "Gone",
            "projects": {"Zed": {"isPinned": true}, "Work": {}, "Home": {}},
            "projectOrder": ["Home", "Work"]
        });
        assert_eq!(normalize(&raw).unwrap().current_view, View::project("Home"));

        let raw = json!({
            "currentProject": "Zed",
            "projects": {"Zed": {"isPinned": true, "isArchived": true}, "Alpha": {"isPinned": true}}
        });
        // Alpha sorts before the default project
        assert_eq!(normalize(&raw).unwrap().current_view, View::project("Alpha"));
    }

    #[test]
    fn sentinel_keyed_project_is_dropped() {
        let raw = json!({"projects": {"--all-important--": {"tasks": []}, "Work": {}}});
        let state = normalize(&raw).unwrap();
        assert!(!state.projects.contains_key(ALL_IMPORTANT_KEY));
        assert!(state.projects.contains_key("Work"));
    }

    #[test]
    fn normalization_is_idempotent() {
        let inputs = [
            json!({}),
            json!({"projects": {"A": [{"name": "t"}], "B": 5}, "projectOrder": "bad"}),
            json!({
                "currentProject": "X",
                "projects": {
                    "X": {"isArchived": true, "tasks": [{"id": 1, "subtasks": [{}, {}]}]},
                    "Y": {"isPinned": true, "tasks": [{"id": 1}, {"status": "done", "dueDate": "junk"}]},
                    "Z": {}
                },
                "projectOrder": ["Z", "Z"]
            }),
        ];
        for raw in inputs {
            let once = normalize(&raw).unwrap();
            assert_eq!(renormalize(&once), once);
        }
    }

    #[test]
    fn parse_due_date_accepts_prefix() {
        assert_eq!(parse_due_date("2024-12-31"), NaiveDate::from_ymd_opt(2024, 12, 31));
        assert_eq!(parse_due_date("2024-12-31T23:59"), NaiveDate::from_ymd_opt(2024, 12, 31));
        assert_eq!(parse_due_date("12/31/2024"), None);
        assert_eq!(parse_due_date("short"), None);
    }
}
