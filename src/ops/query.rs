//! Read-only projections over the board state.
//!
//! Everything here is pure except `sweep_overdue`, the one automatic
//! correction, which callers run outside of history.

use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::Serialize;

use crate::model::project::Project;
use crate::model::state::{BoardState, DEFAULT_PROJECT_NAME, View};
use crate::model::task::{Status, Subtask, Task};

/// A task together with the project it lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskRef<'a> {
    pub project: &'a str,
    pub task: &'a Task,
}

// ---------------------------------------------------------------------------
// Columns
// ---------------------------------------------------------------------------

/// A project's tasks split by status, each column in task-sequence order
pub fn columns(project: &Project) -> [(Status, Vec<&Task>); 4] {
    Status::ALL.map(|status| {
        let tasks = project.tasks.iter().filter(|t| t.status == status).collect();
        (status, tasks)
    })
}

/// Important tasks across all active projects, sorted by project name, then
/// important first, then task name.
pub fn all_important(state: &BoardState) -> Vec<TaskRef<'_>> {
    let mut found: Vec<TaskRef<'_>> = state
        .projects
        .iter()
        .filter(|(_, p)| p.is_active())
        .flat_map(|(name, p)| p.tasks.iter().map(move |task| TaskRef { project: name, task }))
        .filter(|r| r.task.is_important)
        .collect();
    found.sort_by(|a, b| {
        name_order(a.project, b.project)
            .then(b.task.is_important.cmp(&a.task.is_important))
            .then_with(|| name_order(&a.task.name, &b.task.name))
    });
    found
}

/// Alphabetical ignoring case; names differing only in case fall back to
/// byte order so the result is stable.
pub fn name_order(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
}

// ---------------------------------------------------------------------------
// Overdue
// ---------------------------------------------------------------------------

/// Tasks in active projects that are past due and not done
pub fn overdue_tasks(state: &BoardState, today: NaiveDate) -> Vec<TaskRef<'_>> {
    state
        .projects
        .iter()
        .filter(|(_, p)| p.is_active())
        .flat_map(|(name, p)| p.tasks.iter().map(move |task| TaskRef { project: name, task }))
        .filter(|r| r.task.is_overdue(today))
        .collect()
}

/// Flag every overdue, unflagged task in an active project as important.
/// Returns how many tasks changed.
pub fn sweep_overdue(state: &mut BoardState, today: NaiveDate) -> usize {
    let mut marked = 0;
    for project in state.projects.values_mut().filter(|p| p.is_active()) {
        for task in &mut project.tasks {
            if task.is_overdue(today) && !task.is_important {
                task.is_important = true;
                marked += 1;
            }
        }
    }
    marked
}

// ---------------------------------------------------------------------------
// Project lists
// ---------------------------------------------------------------------------

/// Pinned active projects: the default project first, then alphabetical
pub fn pinned_projects(state: &BoardState) -> Vec<&str> {
    let mut names: Vec<&str> = state
        .projects
        .iter()
        .filter(|(name, p)| p.is_pinned && p.is_active() && *name != DEFAULT_PROJECT_NAME)
        .map(|(name, _)| name.as_str())
        .collect();
    names.sort_unstable_by(|a, b| name_order(a, b));
    if state.project(DEFAULT_PROJECT_NAME).is_some() {
        names.insert(0, DEFAULT_PROJECT_NAME);
    }
    names
}

/// Unpinned active projects in their stored order
pub fn unpinned_projects(state: &BoardState) -> Vec<&str> {
    state.unpinned_order.iter().map(String::as_str).collect()
}

/// Archived projects in mapping order
pub fn archived_projects(state: &BoardState) -> Vec<&str> {
    state
        .projects
        .iter()
        .filter(|(_, p)| p.is_archived)
        .map(|(name, _)| name.as_str())
        .collect()
}

// ---------------------------------------------------------------------------
// Board projection
// ---------------------------------------------------------------------------

/// Everything needed to draw the current view
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardView {
    pub view: String,
    pub title: String,
    pub columns: Vec<ColumnView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnView {
    pub status: Status,
    pub title: String,
    pub cards: Vec<Card>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: String,
    pub project: String,
    pub name: String,
    pub description: String,
    pub is_important: bool,
    pub is_overdue: bool,
    pub due_date: Option<NaiveDate>,
    pub subtasks: Vec<Subtask>,
}

impl Card {
    fn new(project: &str, task: &Task, today: NaiveDate) -> Self {
        Card {
            id: task.id.clone(),
            project: project.to_string(),
            name: task.name.clone(),
            description: task.description.clone(),
            is_important: task.is_important,
            is_overdue: task.is_overdue(today),
            due_date: task.due_date,
            subtasks: task.subtasks.clone(),
        }
    }

    pub fn subtasks_done(&self) -> usize {
        self.subtasks.iter().filter(|s| s.completed).count()
    }
}

/// Project the state for `view`. A view naming a missing project yields
/// empty columns.
pub fn board_view(state: &BoardState, view: &View, today: NaiveDate) -> BoardView {
    let column_views: Vec<ColumnView> = match view {
        View::AllImportant => {
            let found = all_important(state);
            Status::ALL
                .iter()
                .map(|&status| {
                    let cards = found
                        .iter()
                        .filter(|r| r.task.status == status)
                        .map(|r| Card::new(r.project, r.task, today));
                    column_view(status, cards)
                })
                .collect()
        }
        View::Project(name) => {
            let empty = Project::new();
            let project = state.project(name).unwrap_or(&empty);
            columns(project)
                .into_iter()
                .map(|(status, tasks)| column_view(status, tasks.into_iter().map(|t| Card::new(name, t, today))))
                .collect()
        }
    };

    BoardView {
        view: view.key().to_string(),
        title: view.title().to_string(),
        columns: column_views,
    }
}

fn column_view(status: Status, cards: impl Iterator<Item = Card>) -> ColumnView {
    ColumnView {
        status,
        title: status.title().to_string(),
        cards: cards.collect(),
    }
}
