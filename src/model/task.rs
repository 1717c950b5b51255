use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Status column a task is shown in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Backlog,
    Todo,
    InProgress,
    Done,
}

impl Status {
    /// All statuses in column order
    pub const ALL: [Status; 4] = [Status::Backlog, Status::Todo, Status::InProgress, Status::Done];

    /// The wire/column key for this status
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Backlog => "backlog",
            Status::Todo => "todo",
            Status::InProgress => "inprogress",
            Status::Done => "done",
        }
    }

    /// Parse a column key into a status
    pub fn parse(s: &str) -> Option<Status> {
        match s {
            "backlog" => Some(Status::Backlog),
            "todo" => Some(Status::Todo),
            "inprogress" => Some(Status::InProgress),
            "done" => Some(Status::Done),
            _ => None,
        }
    }

    /// Human column heading
    pub fn title(self) -> &'static str {
        match self {
            Status::Backlog => "Backlog",
            Status::Todo => "To Do",
            Status::InProgress => "In Progress",
            Status::Done => "Done",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unknown status key
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown status '{0}' (expected backlog, todo, inprogress or done)")]
pub struct UnknownStatus(pub String);

impl FromStr for Status {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Status::parse(s).ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// A checklist item owned by exactly one task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    pub id: String,
    pub text: String,
    pub completed: bool,
}

impl Subtask {
    pub fn new(id: String, text: String) -> Self {
        Subtask {
            id,
            text,
            completed: false,
        }
    }
}

/// A unit of work. Its index in the owning project's task list is
/// the tiebreaker for column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub name: String,
    pub description: String,
    pub status: Status,
    pub is_important: bool,
    /// Serialized as `YYYY-MM-DD` or null
    pub due_date: Option<NaiveDate>,
    pub subtasks: Vec<Subtask>,
}

impl Task {
    /// Create a task with no description, due date or subtasks
    pub fn new(id: String, name: String, status: Status) -> Self {
        Task {
            id,
            name,
            description: String::new(),
            status,
            is_important: false,
            due_date: None,
            subtasks: Vec::new(),
        }
    }

    /// Overdue: has a due date strictly before `today` and is not done
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status != Status::Done && self.due_date.is_some_and(|due| due < today)
    }

    pub fn subtask_index(&self, subtask_id: &str) -> Option<usize> {
        self.subtasks.iter().position(|s| s.id == subtask_id)
    }
}
