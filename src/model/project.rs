use serde::{Deserialize, Serialize};

use super::task::Task;

/// A named container of tasks. The name is the key in `BoardState::projects`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub tasks: Vec<Task>,
    pub is_archived: bool,
    pub is_pinned: bool,
}

impl Project {
    /// A new unpinned, active, empty project
    pub fn new() -> Self {
        Project::default()
    }

    /// A new pinned, active, empty project
    pub fn pinned() -> Self {
        Project {
            is_pinned: true,
            ..Project::default()
        }
    }

    /// Shown in the sidebar (not archived)
    pub fn is_active(&self) -> bool {
        !self.is_archived
    }

    /// Belongs in the unpinned order list
    pub fn is_unpinned_active(&self) -> bool {
        !self.is_archived && !self.is_pinned
    }

    pub fn task_index(&self, task_id: &str) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == task_id)
    }
}
