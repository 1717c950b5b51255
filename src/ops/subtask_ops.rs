use crate::model::state::BoardState;
use crate::model::task::{Subtask, Task};
use crate::ops::reorder::{Placement, reposition, transfer};
use crate::ops::task_ops::{TaskError, locate, task_mut, tasks_at};
use crate::util::id::new_id;

fn subtask_index(task: &Task, subtask_id: &str) -> Result<usize, TaskError> {
    task.subtask_index(subtask_id)
        .ok_or_else(|| TaskError::SubtaskNotFound(subtask_id.to_string()))
}

/// Append an uncompleted subtask. Returns the assigned id.
pub fn add_subtask(state: &mut BoardState, task_id: &str, text: &str) -> Result<String, TaskError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(TaskError::EmptyText);
    }
    let task = task_mut(state, task_id)?;
    let id = new_id();
    task.subtasks.push(Subtask::new(id.clone(), text.to_string()));
    Ok(id)
}

/// Flip a subtask's completed flag. Returns the new value.
pub fn toggle_subtask(state: &mut BoardState, task_id: &str, subtask_id: &str) -> Result<bool, TaskError> {
    let task = task_mut(state, task_id)?;
    let index = subtask_index(task, subtask_id)?;
    let subtask = &mut task.subtasks[index];
    subtask.completed = !subtask.completed;
    Ok(subtask.completed)
}

pub fn delete_subtask(state: &mut BoardState, task_id: &str, subtask_id: &str) -> Result<Subtask, TaskError> {
    let task = task_mut(state, task_id)?;
    let index = subtask_index(task, subtask_id)?;
    Ok(task.subtasks.remove(index))
}

/// Copy a subtask right after the original. Returns the new id.
pub fn duplicate_subtask(state: &mut BoardState, task_id: &str, subtask_id: &str) -> Result<String, TaskError> {
    let task = task_mut(state, task_id)?;
    let index = subtask_index(task, subtask_id)?;
    let mut copy = task.subtasks[index].clone();
    copy.id = new_id();
    copy.text = format!("{} (Copy)", copy.text);
    let id = copy.id.clone();
    task.subtasks.insert(index + 1, copy);
    Ok(id)
}

/// Move a subtask within its task or into another task of the same project.
///
/// With a reference subtask the moved one lands before or after it; without
/// one it goes to the end of the target task's list.
pub fn move_subtask(
    state: &mut BoardState,
    subtask_id: &str,
    source_task_id: &str,
    target_task_id: &str,
    reference: Option<&str>,
    placement: Placement,
) -> Result<(), TaskError> {
    if reference == Some(subtask_id) {
        return Ok(());
    }
    let source = locate(state, source_task_id)?;
    let target = locate(state, target_task_id)?;
    if source.project != target.project {
        return Err(TaskError::CrossProjectMove);
    }
    let tasks = tasks_at(state, &source.project)?;
    let from = subtask_index(&tasks[source.index], subtask_id)?;
    let to = match reference {
        Some(r) => Some(subtask_index(&tasks[target.index], r)?),
        None => None,
    };

    if source.index == target.index {
        let subtasks = &mut tasks[source.index].subtasks;
        match to {
            Some(to) => {
                reposition(subtasks, from, to, placement);
            }
            None => {
                let subtask = subtasks.remove(from);
                subtasks.push(subtask);
            }
        }
        return Ok(());
    }

    let (src, dst) = pair_mut(tasks, source.index, target.index);
    transfer(&mut src.subtasks, from, &mut dst.subtasks, to.map(|to| (to, placement)));
    Ok(())
}

/// Two distinct mutable elements of one slice
fn pair_mut<T>(items: &mut [T], a: usize, b: usize) -> (&mut T, &mut T) {
    if a < b {
        let (left, right) = items.split_at_mut(b);
        (&mut left[a], &mut right[0])
    } else {
        let (left, right) = items.split_at_mut(a);
        (&mut right[0], &mut left[b])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::project::Project;
    use crate::model::task::Status;
    use pretty_assertions::assert_eq;

    /// Work: t1 [s1, s2, s3], t2 [u1]; Home: h [x1]
    fn sample() -> BoardState {
        let mut state = BoardState::empty();
        let mut t1 = Task::new("t1".into(), "T1".into(), Status::Todo);
        for id in ["s1", "s2", "s3"] {
            t1.subtasks.push(Subtask::new(id.into(), id.into()));
        }
        let mut t2 = Task::new("t2".into(), "T2".into(), Status::Todo);
        t2.subtasks.push(Subtask::new("u1".into(), "u1".into()));
        let mut h = Task::new("h".into(), "H".into(), Status::Todo);
        h.subtasks.push(Subtask::new("x1".into(), "x1".into()));

        state.projects.insert(
            "Work".into(),
            Project {
                tasks: vec![t1, t2],
                ..Project::new()
            },
        );
        state.projects.insert(
            "Home".into(),
            Project {
                tasks: vec![h],
                ..Project::new()
            },
        );
        state.unpinned_order = vec!["Work".into(), "Home".into()];
        state
    }

    fn sub_ids(state: &BoardState, task_id: &str) -> Vec<String> {
        state
            .find_task(task_id)
            .unwrap()
            .subtasks
            .iter()
            .map(|s| s.id.clone())
            .collect()
    }

    #[test]
    fn add_toggle_delete() {
        let mut state = sample();
        let id = add_subtask(&mut state, "t2", "  check  ").unwrap();
        let task = state.find_task("t2").unwrap();
        assert_eq!(task.subtasks[1].text, "check");
        assert!(!task.subtasks[1].completed);

        assert_eq!(toggle_subtask(&mut state, "t2", &id), Ok(true));
        assert_eq!(toggle_subtask(&mut state, "t2", &id), Ok(false));
        assert_eq!(delete_subtask(&mut state, "t2", &id).unwrap().text, "check");
        assert_eq!(sub_ids(&state, "t2"), vec!["u1"]);

        assert_eq!(add_subtask(&mut state, "t2", " "), Err(TaskError::EmptyText));
        assert_eq!(
            toggle_subtask(&mut state, "t2", "nope"),
            Err(TaskError::SubtaskNotFound("nope".into()))
        );
    }

    #[test]
    fn duplicate_inserts_after_original() {
        let mut state = sample();
        let id = duplicate_subtask(&mut state, "t1", "s1").unwrap();
        assert_eq!(sub_ids(&state, "t1"), vec!["s1".to_string(), id, "s2".into(), "s3".into()]);
        assert_eq!(state.find_task("t1").unwrap().subtasks[1].text, "s1 (Copy)");
    }

    #[test]
    fn reorder_within_task() {
        let mut state = sample();
        move_subtask(&mut state, "s3", "t1", "t1", Some("s1"), Placement::Before).unwrap();
        assert_eq!(sub_ids(&state, "t1"), vec!["s3", "s1", "s2"]);
        move_subtask(&mut state, "s3", "t1", "t1", None, Placement::Before).unwrap();
        assert_eq!(sub_ids(&state, "t1"), vec!["s1", "s2", "s3"]);
    }

    #[test]
    fn move_to_other_task_appends_without_reference() {
        let mut state = sample();
        move_subtask(&mut state, "s1", "t1", "t2", None, Placement::Before).unwrap();
        assert_eq!(sub_ids(&state, "t1"), vec!["s2", "s3"]);
        assert_eq!(sub_ids(&state, "t2"), vec!["u1", "s1"]);
    }

    #[test]
    fn move_to_other_task_honors_reference() {
        let mut state = sample();
        move_subtask(&mut state, "s3", "t1", "t2", Some("u1"), Placement::Before).unwrap();
        assert_eq!(sub_ids(&state, "t2"), vec!["s3", "u1"]);

        // moving back from a later task to an earlier one
        move_subtask(&mut state, "u1", "t2", "t1", Some("s1"), Placement::After).unwrap();
        assert_eq!(sub_ids(&state, "t1"), vec!["s1", "u1", "s2"]);
    }

    #[test]
    fn move_rejects_other_project_and_stale_reference() {
        let mut state = sample();
        let before = state.clone();
        assert_eq!(
            move_subtask(&mut state, "s1", "t1", "h", None, Placement::Before),
            Err(TaskError::CrossProjectMove)
        );
        assert_eq!(
            move_subtask(&mut state, "s1", "t1", "t2", Some("gone"), Placement::Before),
            Err(TaskError::SubtaskNotFound("gone".into()))
        );
        assert_eq!(state, before);
    }
}
