use tracing::debug;

use crate::model::project::Project;
use crate::model::state::{ALL_IMPORTANT_KEY, ALL_IMPORTANT_TITLE, BoardState, DEFAULT_PROJECT_NAME, View};
use crate::ops::normalize::fallback_view;
use crate::ops::reorder::{Placement, reposition};

/// Error type for project operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProjectError {
    #[error("project not found: {0}")]
    NotFound(String),
    #[error("project name cannot be empty")]
    EmptyName,
    #[error("a project named \"{0}\" already exists")]
    AlreadyExists(String),
    #[error("\"{0}\" is a reserved name")]
    Reserved(String),
    #[error("the default project cannot be {0}")]
    DefaultProtected(&'static str),
    #[error("cannot remove the last active project")]
    LastActiveProject,
    #[error("project \"{0}\" is archived")]
    Archived(String),
    #[error("cannot reorder a pinned project against an unpinned one")]
    CrossGroupMove,
}

/// Names that can never be used for a project
pub fn is_reserved_name(name: &str) -> bool {
    name == ALL_IMPORTANT_TITLE || name == ALL_IMPORTANT_KEY
}

// ---------------------------------------------------------------------------
// View selection
// ---------------------------------------------------------------------------

/// Show a project or the all-important view. Archived projects cannot be shown.
pub fn switch_view(state: &mut BoardState, view: View) -> Result<(), ProjectError> {
    if !state.view_is_valid(&view) {
        return Err(match state.project(view.key()) {
            Some(_) => ProjectError::Archived(view.key().to_string()),
            None => ProjectError::NotFound(view.key().to_string()),
        });
    }
    state.current_view = view;
    Ok(())
}

// ---------------------------------------------------------------------------
// Project CRUD
// ---------------------------------------------------------------------------

/// Create an unpinned project at the end of the unpinned order and show it.
/// Returns the trimmed name.
pub fn add_project(state: &mut BoardState, name: &str) -> Result<String, ProjectError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ProjectError::EmptyName);
    }
    if is_reserved_name(name) {
        return Err(ProjectError::Reserved(name.to_string()));
    }
    if state.projects.contains_key(name) {
        return Err(ProjectError::AlreadyExists(name.to_string()));
    }

    state.projects.insert(name.to_string(), Project::new());
    state.unpinned_order.push(name.to_string());
    state.current_view = View::project(name);
    debug!(project = name, "added project");
    Ok(name.to_string())
}

/// Rename a project in place, keeping its position everywhere.
pub fn rename_project(state: &mut BoardState, old: &str, new: &str) -> Result<(), ProjectError> {
    if !state.projects.contains_key(old) {
        return Err(ProjectError::NotFound(old.to_string()));
    }
    if old == DEFAULT_PROJECT_NAME {
        return Err(ProjectError::DefaultProtected("renamed"));
    }
    let new = new.trim();
    if new.is_empty() {
        return Err(ProjectError::EmptyName);
    }
    if new == old {
        return Ok(());
    }
    if is_reserved_name(new) || new == DEFAULT_PROJECT_NAME {
        return Err(ProjectError::Reserved(new.to_string()));
    }
    if state.projects.contains_key(new) {
        return Err(ProjectError::AlreadyExists(new.to_string()));
    }

    let (index, _, project) = state
        .projects
        .shift_remove_full(old)
        .ok_or_else(|| ProjectError::NotFound(old.to_string()))?;
    state.projects.shift_insert(index, new.to_string(), project);

    for entry in state.unpinned_order.iter_mut().filter(|n| n.as_str() == old) {
        *entry = new.to_string();
    }
    if state.current_view.project_name() == Some(old) {
        state.current_view = View::project(new);
    }
    debug!(from = old, to = new, "renamed project");
    Ok(())
}

/// Delete a project and everything in it.
pub fn delete_project(state: &mut BoardState, name: &str) -> Result<(), ProjectError> {
    let project = state
        .project(name)
        .ok_or_else(|| ProjectError::NotFound(name.to_string()))?;
    if name == DEFAULT_PROJECT_NAME {
        return Err(ProjectError::DefaultProtected("deleted"));
    }
    if project.is_active() && state.active_project_names().len() <= 1 {
        return Err(ProjectError::LastActiveProject);
    }

    state.projects.shift_remove(name);
    state.unpinned_order.retain(|n| n != name);
    if state.current_view.project_name() == Some(name) {
        state.current_view = fallback_view(state);
    }
    debug!(project = name, "deleted project");
    Ok(())
}

// ---------------------------------------------------------------------------
// Pinning and archiving
// ---------------------------------------------------------------------------

/// Flip a project's pinned flag. Returns the new value.
pub fn toggle_pin(state: &mut BoardState, name: &str) -> Result<bool, ProjectError> {
    if !state.projects.contains_key(name) {
        return Err(ProjectError::NotFound(name.to_string()));
    }
    if name == DEFAULT_PROJECT_NAME {
        return Err(ProjectError::DefaultProtected("unpinned"));
    }
    let project = state
        .project_mut(name)
        .ok_or_else(|| ProjectError::NotFound(name.to_string()))?;
    project.is_pinned = !project.is_pinned;
    let pinned = project.is_pinned;
    let active = project.is_active();

    if pinned {
        state.unpinned_order.retain(|n| n != name);
    } else if active {
        state.unpinned_order.push(name.to_string());
    }
    Ok(pinned)
}

/// Hide a project. Showing it is re-resolved if it was current.
pub fn archive_project(state: &mut BoardState, name: &str) -> Result<(), ProjectError> {
    let project = state
        .project(name)
        .ok_or_else(|| ProjectError::NotFound(name.to_string()))?;
    if name == DEFAULT_PROJECT_NAME {
        return Err(ProjectError::DefaultProtected("archived"));
    }
    if project.is_archived {
        return Ok(());
    }
    if state.active_project_names().len() <= 1 {
        return Err(ProjectError::LastActiveProject);
    }

    if let Some(project) = state.project_mut(name) {
        project.is_archived = true;
    }
    state.unpinned_order.retain(|n| n != name);
    if state.current_view.project_name() == Some(name) {
        state.current_view = fallback_view(state);
    }
    Ok(())
}

/// Bring an archived project back. Unpinned projects rejoin at the end of the
/// unpinned order.
pub fn restore_project(state: &mut BoardState, name: &str) -> Result<(), ProjectError> {
    let project = state
        .project_mut(name)
        .ok_or_else(|| ProjectError::NotFound(name.to_string()))?;
    if !project.is_archived {
        return Ok(());
    }
    project.is_archived = false;
    if !project.is_pinned {
        state.unpinned_order.push(name.to_string());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Reordering
// ---------------------------------------------------------------------------

/// Move a project before or after another one in the same group.
///
/// Only the unpinned group has a stored order; pinned projects always
/// display alphabetically, so a pinned-to-pinned move changes nothing.
pub fn move_project(
    state: &mut BoardState,
    name: &str,
    reference: &str,
    placement: Placement,
) -> Result<(), ProjectError> {
    let moving = state
        .project(name)
        .ok_or_else(|| ProjectError::NotFound(name.to_string()))?;
    let target = state
        .project(reference)
        .ok_or_else(|| ProjectError::NotFound(reference.to_string()))?;
    if name == reference {
        return Ok(());
    }
    if moving.is_archived {
        return Err(ProjectError::Archived(name.to_string()));
    }
    if target.is_archived {
        return Err(ProjectError::Archived(reference.to_string()));
    }
    if moving.is_pinned != target.is_pinned {
        return Err(ProjectError::CrossGroupMove);
    }
    if moving.is_pinned {
        return Ok(());
    }

    let order = &mut state.unpinned_order;
    let from = order
        .iter()
        .position(|n| n == name)
        .ok_or_else(|| ProjectError::NotFound(name.to_string()))?;
    let to = order
        .iter()
        .position(|n| n == reference)
        .ok_or_else(|| ProjectError::NotFound(reference.to_string()))?;
    reposition(order, from, to, placement);
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
