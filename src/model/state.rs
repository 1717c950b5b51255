use std::fmt;

use chrono::{Days, NaiveDate};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::project::Project;
use super::task::{Status, Subtask, Task};
use crate::util::id::new_id;

/// Name of the project that always exists, is pinned and never archived
pub const DEFAULT_PROJECT_NAME: &str = "Default Project";
/// Wire key of the cross-project important-tasks view
pub const ALL_IMPORTANT_KEY: &str = "--all-important--";
/// Display title of the cross-project important-tasks view
pub const ALL_IMPORTANT_TITLE: &str = "All Important Tasks";

/// What the board is currently showing
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum View {
    AllImportant,
    Project(String),
}

impl View {
    pub fn project(name: impl Into<String>) -> Self {
        View::Project(name.into())
    }

    /// The wire key: the project name or the sentinel
    pub fn key(&self) -> &str {
        match self {
            View::AllImportant => ALL_IMPORTANT_KEY,
            View::Project(name) => name,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            View::AllImportant => ALL_IMPORTANT_TITLE,
            View::Project(name) => name,
        }
    }

    pub fn project_name(&self) -> Option<&str> {
        match self {
            View::AllImportant => None,
            View::Project(name) => Some(name),
        }
    }
}

impl From<String> for View {
    fn from(key: String) -> Self {
        if key == ALL_IMPORTANT_KEY {
            View::AllImportant
        } else {
            View::Project(key)
        }
    }
}

impl From<View> for String {
    fn from(view: View) -> Self {
        match view {
            View::AllImportant => ALL_IMPORTANT_KEY.to_string(),
            View::Project(name) => name,
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Location of a task inside the state tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskLocation {
    pub project: String,
    pub index: usize,
}

/// The state root. Plain data only, so a `clone()` is a full snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardState {
    #[serde(rename = "currentProject")]
    pub current_view: View,
    pub projects: IndexMap<String, Project>,
    /// Relative order of the unpinned, non-archived projects
    #[serde(rename = "projectOrder")]
    pub unpinned_order: Vec<String>,
}

impl BoardState {
    /// A state holding only the empty default project
    pub fn empty() -> Self {
        let mut projects = IndexMap::new();
        projects.insert(DEFAULT_PROJECT_NAME.to_string(), Project::pinned());
        BoardState {
            current_view: View::project(DEFAULT_PROJECT_NAME),
            projects,
            unpinned_order: Vec::new(),
        }
    }

    /// First-run state: the default project with a few sample tasks
    pub fn factory(today: NaiveDate) -> Self {
        let mut state = BoardState::empty();
        let tomorrow = today.checked_add_days(Days::new(1));
        let yesterday = today.checked_sub_days(Days::new(1));

        let mut welcome = Task::new(new_id(), "Welcome Task".into(), Status::Backlog);
        welcome.description = "Click the star to mark important!".into();

        let mut explore = Task::new(new_id(), "Explore Features".into(), Status::Todo);
        explore.description = "Try adding tasks & subtasks. Edit them in place.".into();
        explore.due_date = tomorrow;
        explore
            .subtasks
            .push(Subtask::new(new_id(), "Convert me to a task!".into()));

        let mut overdue = Task::new(new_id(), "Overdue Example".into(), Status::Todo);
        overdue.description = "This task is overdue.".into();
        overdue.due_date = yesterday;

        if let Some(default) = state.projects.get_mut(DEFAULT_PROJECT_NAME) {
            default.tasks = vec![welcome, explore, overdue];
        }
        state
    }

    pub fn project(&self, name: &str) -> Option<&Project> {
        self.projects.get(name)
    }

    pub fn project_mut(&mut self, name: &str) -> Option<&mut Project> {
        self.projects.get_mut(name)
    }

    /// Names of non-archived projects, in mapping order
    pub fn active_project_names(&self) -> Vec<&str> {
        self.projects
            .iter()
            .filter(|(_, p)| p.is_active())
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Whether `view` names the sentinel or an existing, non-archived project
    pub fn view_is_valid(&self, view: &View) -> bool {
        match view {
            View::AllImportant => true,
            View::Project(name) => self.projects.get(name).is_some_and(Project::is_active),
        }
    }

    /// Find which project holds a task and at which index
    pub fn locate_task(&self, task_id: &str) -> Option<TaskLocation> {
        self.projects.iter().find_map(|(name, project)| {
            project.task_index(task_id).map(|index| TaskLocation {
                project: name.clone(),
                index,
            })
        })
    }

    pub fn find_task(&self, task_id: &str) -> Option<&Task> {
        self.projects
            .values()
            .flat_map(|p| p.tasks.iter())
            .find(|t| t.id == task_id)
    }

    pub fn find_task_mut(&mut self, task_id: &str) -> Option<&mut Task> {
        self.projects
            .values_mut()
            .flat_map(|p| p.tasks.iter_mut())
            .find(|t| t.id == task_id)
    }

    /// Iterate every task with its project name
    pub fn tasks(&self) -> impl Iterator<Item = (&str, &Task)> {
        self.projects
            .iter()
            .flat_map(|(name, p)| p.tasks.iter().map(move |t| (name.as_str(), t)))
    }
}
