use std::fmt::Write as _;

use serde::Serialize;

use crate::board::Applied;
use crate::model::state::{ALL_IMPORTANT_KEY, BoardState};
use crate::ops::check::{CheckError, CheckResult, CheckWarning};
use crate::ops::query::{self, BoardView, Card};

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct ProjectsJson<'a> {
    pub current: &'a str,
    pub pinned: Vec<&'a str>,
    pub unpinned: Vec<&'a str>,
    pub archived: Vec<&'a str>,
}

impl<'a> ProjectsJson<'a> {
    pub fn new(state: &'a BoardState) -> Self {
        ProjectsJson {
            current: state.current_view.key(),
            pinned: query::pinned_projects(state),
            unpinned: query::unpinned_projects(state),
            archived: query::archived_projects(state),
        }
    }
}

/// One line of `tb apply` output
#[derive(Serialize)]
pub struct ApplyLineJson {
    pub line: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applied: Option<Applied>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorJson>,
}

#[derive(Serialize)]
pub struct ErrorJson {
    pub code: String,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Text rendering
// ---------------------------------------------------------------------------

/// Render a board projection as indented text, one column per block.
/// Cards show their id first so it can be pasted into other commands.
pub fn render_board(view: &BoardView) -> String {
    let cross_project = view.view == ALL_IMPORTANT_KEY;
    let mut out = String::new();
    let _ = writeln!(out, "{}", view.title);
    for column in &view.columns {
        let _ = writeln!(out, "  {} ({})", column.title, column.cards.len());
        for card in &column.cards {
            let _ = writeln!(out, "    {}", card_line(card, cross_project));
            for sub in &card.subtasks {
                let mark = if sub.completed { "x" } else { " " };
                let _ = writeln!(out, "      [{}] {}  {}", mark, sub.id, sub.text);
            }
        }
    }
    out
}

fn card_line(card: &Card, cross_project: bool) -> String {
    let mut line = card.id.clone();
    line.push_str("  ");
    if card.is_important {
        line.push_str("* ");
    }
    line.push_str(&card.name);
    if let Some(due) = card.due_date {
        let _ = write!(line, "  due {}", due);
        if card.is_overdue {
            line.push_str(" (overdue)");
        }
    }
    if !card.subtasks.is_empty() {
        let _ = write!(line, "  [{}/{}]", card.subtasks_done(), card.subtasks.len());
    }
    if cross_project {
        let _ = write!(line, "  @{}", card.project);
    }
    line
}

/// Render the project sidebar: pinned, then unpinned, then archived.
/// The current view is marked with `>`.
pub fn render_projects(state: &BoardState) -> String {
    let current = state.current_view.key();
    let mut out = String::new();
    let mut section = |title: &str, names: Vec<&str>| {
        if names.is_empty() {
            return;
        }
        let _ = writeln!(out, "{}:", title);
        for name in names {
            let mark = if name == current { ">" } else { " " };
            let _ = writeln!(out, "{} {}", mark, name);
        }
    };
    section("Pinned", query::pinned_projects(state));
    section("Projects", query::unpinned_projects(state));
    section("Archived", query::archived_projects(state));
    out
}

/// Render `tb check` results
pub fn render_check(result: &CheckResult) -> String {
    let mut out = String::new();
    if !result.errors.is_empty() {
        let _ = writeln!(out, "Errors:");
        for err in &result.errors {
            let _ = writeln!(out, "  {}", describe_error(err));
        }
    }
    if !result.warnings.is_empty() {
        if !result.errors.is_empty() {
            let _ = writeln!(out);
        }
        let _ = writeln!(out, "Warnings:");
        for warn in &result.warnings {
            let _ = writeln!(out, "  {}", describe_warning(warn));
        }
    }
    if result.valid {
        let _ = writeln!(out, "✓ board is valid");
    } else {
        let _ = writeln!(out, "✗ board has errors");
    }
    out
}

fn describe_error(err: &CheckError) -> String {
    match err {
        CheckError::DuplicateId { id, count } => format!("{} is used {} times", id, count),
        CheckError::DefaultProject { problem } => format!("default project {}", problem),
        CheckError::ForeignOrderEntry { project } => {
            format!("project order lists '{}', which is not an unpinned active project", project)
        }
        CheckError::MissingOrderEntry { project } => {
            format!("project order is missing '{}'", project)
        }
        CheckError::DuplicateOrderEntry { project } => {
            format!("project order lists '{}' more than once", project)
        }
        CheckError::DanglingView { view } => format!("current view '{}' does not resolve", view),
        CheckError::SentinelProject => "a project uses the reserved all-important key".to_string(),
        CheckError::Unreadable { reason } => format!("saved board is unreadable: {}", reason),
    }
}

fn describe_warning(warn: &CheckWarning) -> String {
    match warn {
        CheckWarning::OverdueUnflagged { project, task_id } => {
            format!("[{}] {} is overdue but not important", project, task_id)
        }
        CheckWarning::BlankName { project, task_id } => {
            format!("[{}] {} has a blank name", project, task_id)
        }
        CheckWarning::NoSavedBoard => "nothing saved yet".to_string(),
    }
}
