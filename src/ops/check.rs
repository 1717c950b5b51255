use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::model::state::{ALL_IMPORTANT_KEY, BoardState, DEFAULT_PROJECT_NAME};

/// Structured result from `tb check`, suitable for --json output.
#[derive(Debug, Default, Serialize)]
pub struct CheckResult {
    pub valid: bool,
    pub errors: Vec<CheckError>,
    pub warnings: Vec<CheckWarning>,
}

/// A broken structural invariant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum CheckError {
    /// The same id is used by more than one task or subtask
    #[serde(rename = "duplicate_id")]
    DuplicateId { id: String, count: usize },
    /// The default project is missing, unpinned or archived
    #[serde(rename = "default_project")]
    DefaultProject { problem: String },
    /// The unpinned order lists a name that is not an unpinned active project
    #[serde(rename = "foreign_order_entry")]
    ForeignOrderEntry { project: String },
    /// An unpinned active project is missing from the unpinned order
    #[serde(rename = "missing_order_entry")]
    MissingOrderEntry { project: String },
    /// A name appears in the unpinned order more than once
    #[serde(rename = "duplicate_order_entry")]
    DuplicateOrderEntry { project: String },
    /// The current view names a missing or archived project
    #[serde(rename = "dangling_view")]
    DanglingView { view: String },
    /// A project is keyed by the all-important sentinel
    #[serde(rename = "sentinel_project")]
    SentinelProject,
    /// The saved text is not a board record at all
    #[serde(rename = "unreadable")]
    Unreadable { reason: String },
}

/// A non-critical finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum CheckWarning {
    /// Past due, not done, and not yet flagged important
    #[serde(rename = "overdue_unflagged")]
    OverdueUnflagged { project: String, task_id: String },
    /// Task name is blank
    #[serde(rename = "blank_name")]
    BlankName { project: String, task_id: String },
    /// Nothing has been saved yet
    #[serde(rename = "no_saved_board")]
    NoSavedBoard,
}

// ---------------------------------------------------------------------------
// Main check entry point
// ---------------------------------------------------------------------------

/// Validate a board state against its structural invariants.
///
/// Read-only. Checks performed:
/// 1. Task and subtask ids are globally unique
/// 2. The default project exists, is pinned and active
/// 3. The unpinned order holds exactly the unpinned active projects, once each
/// 4. The current view resolves
/// 5. Warnings for overdue unflagged tasks and blank names
pub fn check_state(state: &BoardState, today: chrono::NaiveDate) -> CheckResult {
    let mut result = CheckResult::default();

    check_ids(state, &mut result);
    check_default_project(state, &mut result);
    check_unpinned_order(state, &mut result);

    if !state.view_is_valid(&state.current_view) {
        result.errors.push(CheckError::DanglingView {
            view: state.current_view.key().to_string(),
        });
    }
    if state.projects.contains_key(ALL_IMPORTANT_KEY) {
        result.errors.push(CheckError::SentinelProject);
    }

    for (project, task) in state.tasks() {
        let active = state.project(project).is_some_and(|p| p.is_active());
        if active && task.is_overdue(today) && !task.is_important {
            result.warnings.push(CheckWarning::OverdueUnflagged {
                project: project.to_string(),
                task_id: task.id.clone(),
            });
        }
        if task.name.trim().is_empty() {
            result.warnings.push(CheckWarning::BlankName {
                project: project.to_string(),
                task_id: task.id.clone(),
            });
        }
    }

    result.valid = result.errors.is_empty();
    result
}

fn check_ids(state: &BoardState, result: &mut CheckResult) {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for (_, task) in state.tasks() {
        *counts.entry(task.id.as_str()).or_default() += 1;
        for subtask in &task.subtasks {
            *counts.entry(subtask.id.as_str()).or_default() += 1;
        }
    }
    let mut duplicates: Vec<(&str, usize)> = counts.into_iter().filter(|(_, n)| *n > 1).collect();
    duplicates.sort();
    for (id, count) in duplicates {
        result.errors.push(CheckError::DuplicateId {
            id: id.to_string(),
            count,
        });
    }
}

fn check_default_project(state: &BoardState, result: &mut CheckResult) {
    let problem = match state.project(DEFAULT_PROJECT_NAME) {
        None => Some("missing"),
        Some(p) if !p.is_pinned => Some("not pinned"),
        Some(p) if p.is_archived => Some("archived"),
        Some(_) => None,
    };
    if let Some(problem) = problem {
        result.errors.push(CheckError::DefaultProject {
            problem: problem.to_string(),
        });
    }
}

fn check_unpinned_order(state: &BoardState, result: &mut CheckResult) {
    let mut seen = HashSet::new();
    for name in &state.unpinned_order {
        if !seen.insert(name.as_str()) {
            result.errors.push(CheckError::DuplicateOrderEntry {
                project: name.clone(),
            });
        } else if !state.project(name).is_some_and(|p| p.is_unpinned_active()) {
            result.errors.push(CheckError::ForeignOrderEntry {
                project: name.clone(),
            });
        }
    }
    for (name, project) in &state.projects {
        if project.is_unpinned_active() && !seen.contains(name.as_str()) {
            result.errors.push(CheckError::MissingOrderEntry {
                project: name.clone(),
            });
        }
    }
}

/// Check saved board text exactly as stored. Nothing is repaired, so every
/// defect the loader would quietly fix shows up here.
pub fn check_saved(text: Option<&str>, today: chrono::NaiveDate) -> CheckResult {
    let Some(text) = text else {
        return CheckResult {
            valid: true,
            errors: Vec::new(),
            warnings: vec![CheckWarning::NoSavedBoard],
        };
    };
    match serde_json::from_str::<BoardState>(text) {
        Ok(state) => check_state(&state, today),
        Err(e) => CheckResult {
            valid: false,
            errors: vec![CheckError::Unreadable { reason: e.to_string() }],
            warnings: Vec::new(),
        },
    }
}

/// Shorthand used by tests and debug assertions
pub fn is_valid(state: &BoardState) -> bool {
    let today = chrono::Local::now().date_naive();
    check_state(state, today).valid
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Project, Status, Task, View};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 1).unwrap()
    }

    #[test]
    fn factory_state_is_valid() {
        let state = BoardState::factory(today());
        let result = check_state(&state, today());
        assert!(result.valid);
        // the sample overdue task is not flagged yet
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn detects_order_defects() {
        let mut state = BoardState::empty();
        state.projects.insert("Work".into(), Project::new());
        state.projects.insert("Home".into(), Project::new());
        state.unpinned_order = vec!["Work".into(), "Work".into(), "Ghost".into()];

        let result = check_state(&state, today());
        assert!(!result.valid);
        assert_eq!(
            result.errors,
            vec![
                CheckError::DuplicateOrderEntry { project: "Work".into() },
                CheckError::ForeignOrderEntry { project: "Ghost".into() },
                CheckError::MissingOrderEntry { project: "Home".into() },
            ]
        );
    }

    #[test]
    fn detects_duplicate_ids_and_default_problems() {
        let mut state = BoardState::empty();
        if let Some(default) = state.project_mut(DEFAULT_PROJECT_NAME) {
            default.is_pinned = false;
            default.tasks.push(Task::new("x".into(), "a".into(), Status::Todo));
            default.tasks.push(Task::new("x".into(), "b".into(), Status::Todo));
        }
        let result = check_state(&state, today());
        assert!(result.errors.contains(&CheckError::DuplicateId { id: "x".into(), count: 2 }));
        assert!(result.errors.contains(&CheckError::DefaultProject {
            problem: "not pinned".into()
        }));
    }

    #[test]
    fn detects_dangling_view() {
        let mut state = BoardState::empty();
        state.current_view = View::project("Nowhere");
        let result = check_state(&state, today());
        assert_eq!(
            result.errors,
            vec![CheckError::DanglingView { view: "Nowhere".into() }]
        );
    }

    #[test]
    fn serializes_with_type_tag() {
        let err = CheckError::MissingOrderEntry { project: "Work".into() };
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["type"], "missing_order_entry");
        assert_eq!(json["project"], "Work");
    }

    #[test]
    fn saved_text_is_checked_unrepaired() {
        let text = r#"{
            "currentProject": "Gone",
            "projects": {
                "Default Project": {"tasks": [], "isArchived": false, "isPinned": true},
                "Work": {
                    "tasks": [
                        {"id": "x", "name": "A", "description": "", "status": "todo",
                         "isImportant": false, "dueDate": null, "subtasks": []},
                        {"id": "x", "name": "B", "description": "", "status": "done",
                         "isImportant": false, "dueDate": null, "subtasks": []}
                    ],
                    "isArchived": false,
                    "isPinned": false
                }
            },
            "projectOrder": ["Work", "Work", "Ghost"]
        }"#;
        let result = check_saved(Some(text), today());
        assert!(!result.valid);
        assert_eq!(
            result.errors,
            vec![
                CheckError::DuplicateId { id: "x".into(), count: 2 },
                CheckError::DuplicateOrderEntry { project: "Work".into() },
                CheckError::ForeignOrderEntry { project: "Ghost".into() },
                CheckError::DanglingView { view: "Gone".into() },
            ]
        );
    }

    #[test]
    fn unreadable_and_missing_saved_text() {
        for bad in ["not json", "[1, 2, 3]"] {
            let result = check_saved(Some(bad), today());
            assert!(!result.valid);
            assert!(matches!(result.errors[..], [CheckError::Unreadable { .. }]));
        }
        let result = check_saved(None, today());
        assert!(result.valid);
        assert_eq!(result.warnings, vec![CheckWarning::NoSavedBoard]);
    }
}
