//! The state store: one owned `BoardState`, its history, and the
//! persistence collaborator it saves through.
//!
//! Every data-changing entry point goes through `Board::mutate`, which
//! snapshots the state first, rolls back on error, and records history only
//! when something actually changed.

pub mod events;
pub mod history;
pub mod intent;

use chrono::{Local, NaiveDate};
use tracing::{debug, info, warn};

pub use events::BoardEvent;
pub use history::History;
pub use intent::{Applied, Intent};

use crate::io::persist::{self, LoadSource};
use crate::io::store::{KeyValueStore, StoreError};
use crate::model::config::BoardConfig;
use crate::model::state::{BoardState, View};
use crate::model::task::Status;
use crate::ops::check::is_valid;
use crate::ops::normalize::{self, NormalizeError};
use crate::ops::project_ops::{self, ProjectError};
use crate::ops::query::{self, BoardView};
use crate::ops::reorder::Placement;
use crate::ops::subtask_ops;
use crate::ops::task_ops::{self, NewTask, TaskError, TaskField};

/// Error type for board operations
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error(transparent)]
    Project(#[from] ProjectError),
    #[error(transparent)]
    Task(#[from] TaskError),
    #[error("import rejected: {0}")]
    Import(#[from] NormalizeError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl BoardError {
    /// Stable reason code for hosts
    pub fn code(&self) -> &'static str {
        match self {
            BoardError::Project(e) => match e {
                ProjectError::NotFound(_) => "not_found",
                ProjectError::EmptyName => "empty_name",
                ProjectError::AlreadyExists(_) => "duplicate_name",
                ProjectError::Reserved(_) => "reserved_name",
                ProjectError::DefaultProtected(_) => "default_project_protected",
                ProjectError::LastActiveProject => "last_active_project",
                ProjectError::Archived(_) => "project_archived",
                ProjectError::CrossGroupMove => "cross_group_move",
            },
            BoardError::Task(e) => match e {
                TaskError::NotFound(_) | TaskError::SubtaskNotFound(_) | TaskError::ProjectNotFound(_) => {
                    "not_found"
                }
                TaskError::ProjectArchived(_) => "project_archived",
                TaskError::EmptyName | TaskError::EmptyText => "empty_name",
                TaskError::InvalidDueDate(_) => "invalid_due_date",
                TaskError::CrossColumnDrop { .. } => "cross_column_drop",
                TaskError::CrossProjectMove => "cross_project_move",
            },
            BoardError::Import(_) => "import_rejected",
            BoardError::Store(_) => "persistence",
        }
    }
}

/// Source of "today" for overdue checks
pub type Clock = fn() -> NaiveDate;

/// Today's date on the local calendar
pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

pub struct Board<S: KeyValueStore> {
    state: BoardState,
    history: History,
    store: S,
    config: BoardConfig,
    events: Vec<BoardEvent>,
    clock: Clock,
}

impl<S: KeyValueStore> Board<S> {
    /// Load the board from `store`, using the local date for overdue checks
    pub fn open(store: S, config: BoardConfig) -> Result<Self, BoardError> {
        Self::open_with_clock(store, config, local_today)
    }

    /// Load the board from `store`. The normalized state is saved back
    /// immediately; history starts empty.
    pub fn open_with_clock(mut store: S, config: BoardConfig, clock: Clock) -> Result<Self, BoardError> {
        let depth = persist::load_depth(&store, config.history.default_depth)?;
        let (state, source) = persist::load_state(&mut store, clock())?;
        if source == LoadSource::Saved {
            debug!(projects = state.projects.len(), "loaded saved board");
        }
        let mut board = Board {
            state,
            history: History::new(depth),
            store,
            config,
            events: Vec::new(),
            clock,
        };
        board.refresh();
        Ok(board)
    }

    pub fn state(&self) -> &BoardState {
        &self.state
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn today(&self) -> NaiveDate {
        (self.clock)()
    }

    /// Take the queued events, oldest first
    pub fn drain_events(&mut self) -> Vec<BoardEvent> {
        std::mem::take(&mut self.events)
    }

    /// Projection of the current view
    pub fn view(&self) -> BoardView {
        query::board_view(&self.state, &self.state.current_view, self.today())
    }

    // -----------------------------------------------------------------------
    // Mutation plumbing
    // -----------------------------------------------------------------------

    /// Run `op` against the state as one undoable step.
    fn mutate<T, E>(&mut self, op: impl FnOnce(&mut BoardState) -> Result<T, E>) -> Result<T, BoardError>
    where
        BoardError: From<E>,
    {
        let before = self.state.clone();
        match op(&mut self.state) {
            Ok(value) => {
                if self.state != before {
                    self.auto_sweep();
                    // A change the sweep reverts (un-flagging an overdue task)
                    // leaves nothing to undo.
                    if self.state != before {
                        self.history.record(before);
                        self.commit();
                    }
                }
                Ok(value)
            }
            Err(e) => {
                self.state = before;
                Err(self.reject(BoardError::from(e)))
            }
        }
    }

    /// Post-change housekeeping: overdue sweep, save, notify
    fn refresh(&mut self) {
        self.auto_sweep();
        self.commit();
    }

    fn auto_sweep(&mut self) {
        if !self.config.overdue.auto_mark {
            return;
        }
        let today = self.today();
        let marked = query::sweep_overdue(&mut self.state, today);
        if marked > 0 {
            info!(marked, "flagged overdue tasks important");
        }
    }

    fn commit(&mut self) {
        debug_assert!(is_valid(&self.state), "board invariants broken");
        self.persist();
        self.events.push(BoardEvent::StateChanged);
    }

    fn persist(&mut self) {
        if let Err(e) = persist::save_state(&mut self.store, &self.state) {
            let err = BoardError::Store(e);
            warn!(error = %err, "could not save board");
            self.push_error(&err);
        }
    }

    fn reject(&mut self, err: BoardError) -> BoardError {
        debug!(code = err.code(), error = %err, "operation rejected");
        self.push_error(&err);
        err
    }

    fn push_error(&mut self, err: &BoardError) {
        self.events.push(BoardEvent::Error {
            code: err.code(),
            message: err.to_string(),
        });
    }

    // -----------------------------------------------------------------------
    // Views and projects
    // -----------------------------------------------------------------------

    /// Show a project by name, or the all-important view by its key.
    /// Not recorded in history.
    pub fn switch_view(&mut self, key: &str) -> Result<(), BoardError> {
        let view = View::from(key.to_string());
        if self.state.current_view == view {
            return Ok(());
        }
        match project_ops::switch_view(&mut self.state, view) {
            Ok(()) => {
                self.refresh();
                Ok(())
            }
            Err(e) => Err(self.reject(e.into())),
        }
    }

    pub fn add_project(&mut self, name: &str) -> Result<String, BoardError> {
        self.mutate(|s| project_ops::add_project(s, name))
    }

    pub fn rename_project(&mut self, old: &str, new: &str) -> Result<(), BoardError> {
        self.mutate(|s| project_ops::rename_project(s, old, new))
    }

    pub fn delete_project(&mut self, name: &str) -> Result<(), BoardError> {
        self.mutate(|s| project_ops::delete_project(s, name))
    }

    pub fn toggle_pin(&mut self, name: &str) -> Result<bool, BoardError> {
        self.mutate(|s| project_ops::toggle_pin(s, name))
    }

    pub fn archive_project(&mut self, name: &str) -> Result<(), BoardError> {
        self.mutate(|s| project_ops::archive_project(s, name))
    }

    pub fn restore_project(&mut self, name: &str) -> Result<(), BoardError> {
        self.mutate(|s| project_ops::restore_project(s, name))
    }

    pub fn move_project(&mut self, name: &str, reference: &str, placement: Placement) -> Result<(), BoardError> {
        self.mutate(|s| project_ops::move_project(s, name, reference, placement))
    }

    // -----------------------------------------------------------------------
    // Tasks
    // -----------------------------------------------------------------------

    pub fn add_task(&mut self, project: &str, status: Status, fields: NewTask) -> Result<String, BoardError> {
        self.mutate(|s| task_ops::add_task(s, project, status, fields))
    }

    pub fn edit_task_field(&mut self, task_id: &str, field: TaskField, value: &str) -> Result<(), BoardError> {
        self.mutate(|s| task_ops::edit_task_field(s, task_id, field, value))
    }

    pub fn delete_task(&mut self, task_id: &str) -> Result<(), BoardError> {
        self.mutate(|s| task_ops::delete_task(s, task_id).map(|_| ()))
    }

    pub fn duplicate_task(&mut self, task_id: &str, project: Option<&str>) -> Result<String, BoardError> {
        self.mutate(|s| task_ops::duplicate_task(s, task_id, project))
    }

    pub fn toggle_importance(&mut self, task_id: &str) -> Result<bool, BoardError> {
        self.mutate(|s| task_ops::toggle_importance(s, task_id))
    }

    /// Move a task by drag intent; see `task_ops::move_task`. Entering the
    /// done column queues a `Celebrate` event.
    pub fn move_task(
        &mut self,
        task_id: &str,
        status: Status,
        reference: Option<&str>,
        placement: Placement,
    ) -> Result<(), BoardError> {
        let celebrate = self.mutate(|s| task_ops::move_task(s, task_id, status, reference, placement))?;
        if celebrate {
            self.events.push(BoardEvent::Celebrate {
                task_id: task_id.to_string(),
            });
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Subtasks
    // -----------------------------------------------------------------------

    pub fn add_subtask(&mut self, task_id: &str, text: &str) -> Result<String, BoardError> {
        self.mutate(|s| subtask_ops::add_subtask(s, task_id, text))
    }

    pub fn toggle_subtask_done(&mut self, task_id: &str, subtask_id: &str) -> Result<bool, BoardError> {
        self.mutate(|s| subtask_ops::toggle_subtask(s, task_id, subtask_id))
    }

    pub fn delete_subtask(&mut self, task_id: &str, subtask_id: &str) -> Result<(), BoardError> {
        self.mutate(|s| subtask_ops::delete_subtask(s, task_id, subtask_id).map(|_| ()))
    }

    pub fn duplicate_subtask(&mut self, task_id: &str, subtask_id: &str) -> Result<String, BoardError> {
        self.mutate(|s| subtask_ops::duplicate_subtask(s, task_id, subtask_id))
    }

    pub fn convert_subtask_to_task(&mut self, task_id: &str, subtask_id: &str) -> Result<String, BoardError> {
        self.mutate(|s| task_ops::convert_subtask_to_task(s, task_id, subtask_id))
    }

    pub fn move_subtask(
        &mut self,
        subtask_id: &str,
        source_task_id: &str,
        target_task_id: &str,
        reference: Option<&str>,
        placement: Placement,
    ) -> Result<(), BoardError> {
        self.mutate(|s| {
            subtask_ops::move_subtask(s, subtask_id, source_task_id, target_task_id, reference, placement)
        })
    }

    // -----------------------------------------------------------------------
    // History
    // -----------------------------------------------------------------------

    /// Step back one snapshot. Returns false when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        let moved = self.history.undo(&mut self.state);
        if moved {
            self.refresh();
        }
        moved
    }

    /// Step forward one snapshot. Returns false when there is nothing to redo.
    pub fn redo(&mut self) -> bool {
        let moved = self.history.redo(&mut self.state);
        if moved {
            self.refresh();
        }
        moved
    }

    /// Change and save the undo depth. Returns the clamped value in effect.
    pub fn set_max_undo_depth(&mut self, depth: usize) -> usize {
        let depth = self.history.set_max_depth(depth);
        if let Err(e) = persist::save_depth(&mut self.store, depth) {
            let err = BoardError::Store(e);
            warn!(error = %err, "could not save undo depth");
            self.push_error(&err);
        }
        depth
    }

    // -----------------------------------------------------------------------
    // Import / export
    // -----------------------------------------------------------------------

    /// The full state as pretty JSON
    pub fn export(&self) -> Result<String, BoardError> {
        persist::export_json(&self.state).map_err(|e| BoardError::Store(e.into()))
    }

    /// Replace the whole state with normalized JSON text. Clears history.
    pub fn import_str(&mut self, text: &str) -> Result<(), BoardError> {
        match normalize::normalize_str(text) {
            Ok(state) => {
                self.install_import(state);
                Ok(())
            }
            Err(e) => Err(self.reject(e.into())),
        }
    }

    fn install_import(&mut self, state: BoardState) {
        self.state = state;
        self.history.clear();
        info!(projects = self.state.projects.len(), "imported board");
        self.refresh();
    }

    /// Run the overdue sweep now, outside of history. Returns how many tasks
    /// were flagged.
    pub fn sweep_overdue(&mut self) -> usize {
        let today = self.today();
        let marked = query::sweep_overdue(&mut self.state, today);
        if marked > 0 {
            self.persist();
            self.events.push(BoardEvent::StateChanged);
        }
        marked
    }

    // -----------------------------------------------------------------------
    // Intent dispatch
    // -----------------------------------------------------------------------

    /// Apply one decoded gesture
    pub fn apply(&mut self, intent: Intent) -> Result<Applied, BoardError> {
        debug!(?intent, "applying intent");
        let applied = match intent {
            Intent::SwitchView { key } => self.switch_view(&key).map(|_| Applied::Ok)?,
            Intent::AddProject { name } => Applied::Project {
                name: self.add_project(&name)?,
            },
            Intent::RenameProject { old_name, new_name } => {
                self.rename_project(&old_name, &new_name)?;
                Applied::Ok
            }
            Intent::DeleteProject { name } => {
                self.delete_project(&name)?;
                Applied::Ok
            }
            Intent::TogglePin { name } => Applied::Toggled {
                value: self.toggle_pin(&name)?,
            },
            Intent::ArchiveProject { name } => {
                self.archive_project(&name)?;
                Applied::Ok
            }
            Intent::RestoreProject { name } => {
                self.restore_project(&name)?;
                Applied::Ok
            }
            Intent::AddTask {
                project_name,
                status,
                name,
                description,
                due_date,
                is_important,
            } => {
                let fields = NewTask {
                    name,
                    description,
                    due_date,
                    is_important,
                };
                Applied::Created {
                    id: self.add_task(&project_name, status, fields)?,
                }
            }
            Intent::EditTaskField { task_id, field, value } => {
                self.edit_task_field(&task_id, field, &value)?;
                Applied::Ok
            }
            Intent::DeleteTask { task_id } => {
                self.delete_task(&task_id)?;
                Applied::Ok
            }
            Intent::DuplicateTask { task_id, project_name } => Applied::Created {
                id: self.duplicate_task(&task_id, project_name.as_deref())?,
            },
            Intent::ToggleImportance { task_id } => Applied::Toggled {
                value: self.toggle_importance(&task_id)?,
            },
            Intent::AddSubtask { task_id, text } => Applied::Created {
                id: self.add_subtask(&task_id, &text)?,
            },
            Intent::ToggleSubtaskDone { task_id, subtask_id } => Applied::Toggled {
                value: self.toggle_subtask_done(&task_id, &subtask_id)?,
            },
            Intent::DeleteSubtask { task_id, subtask_id } => {
                self.delete_subtask(&task_id, &subtask_id)?;
                Applied::Ok
            }
            Intent::DuplicateSubtask { task_id, subtask_id } => Applied::Created {
                id: self.duplicate_subtask(&task_id, &subtask_id)?,
            },
            Intent::ConvertSubtaskToTask { task_id, subtask_id } => Applied::Created {
                id: self.convert_subtask_to_task(&task_id, &subtask_id)?,
            },
            Intent::MoveTask {
                task_id,
                target_status,
                reference_task_id,
                placement,
            } => {
                self.move_task(&task_id, target_status, reference_task_id.as_deref(), placement)?;
                Applied::Ok
            }
            Intent::MoveSubtask {
                subtask_id,
                source_task_id,
                target_task_id,
                reference_subtask_id,
                placement,
            } => {
                self.move_subtask(
                    &subtask_id,
                    &source_task_id,
                    &target_task_id,
                    reference_subtask_id.as_deref(),
                    placement,
                )?;
                Applied::Ok
            }
            Intent::MoveProject {
                name,
                reference_name,
                placement,
            } => {
                self.move_project(&name, &reference_name, placement)?;
                Applied::Ok
            }
            Intent::Undo => Applied::Stepped { moved: self.undo() },
            Intent::Redo => Applied::Stepped { moved: self.redo() },
            Intent::SetMaxUndoDepth { depth } => Applied::Depth {
                depth: self.set_max_undo_depth(depth),
            },
        };
        Ok(applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::persist::{STATE_KEY, UNDO_DEPTH_KEY};
    use crate::io::store::MemoryStore;
    use crate::model::state::DEFAULT_PROJECT_NAME;
    use pretty_assertions::assert_eq;

    fn fixed_today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, 1).unwrap()
    }

    fn board() -> Board<MemoryStore> {
        let mut board = Board::open_with_clock(MemoryStore::new(), BoardConfig::default(), fixed_today).unwrap();
        board.drain_events();
        board
    }

    /// A store whose saves always fail
    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn load(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Ok(None)
        }

        fn save(&mut self, key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::InvalidKey(key.to_string()))
        }
    }

    #[test]
    fn open_saves_normalized_state_and_sweeps() {
        let board = board();
        let saved = board.store().get(STATE_KEY).unwrap();
        let reloaded = normalize::normalize_str(saved).unwrap();
        assert_eq!(&reloaded, board.state());

        // the sample overdue task was flagged on open, outside history
        let overdue = &board.state().projects[DEFAULT_PROJECT_NAME].tasks[2];
        assert!(overdue.is_important);
        assert!(!board.history().can_undo());
    }

    #[test]
    fn open_reads_saved_depth() {
        let store = MemoryStore::with(UNDO_DEPTH_KEY, "3");
        let board = Board::open_with_clock(store, BoardConfig::default(), fixed_today).unwrap();
        assert_eq!(board.history().max_depth(), 3);
    }

    #[test]
    fn failed_operation_leaves_state_and_history_alone() {
        let mut board = board();
        let before = board.state().clone();
        let err = board.delete_project(DEFAULT_PROJECT_NAME).unwrap_err();
        assert_eq!(err.code(), "default_project_protected");
        assert_eq!(board.state(), &before);
        assert!(!board.history().can_undo());
        assert_eq!(
            board.drain_events(),
            vec![BoardEvent::Error {
                code: "default_project_protected",
                message: "the default project cannot be deleted".into(),
            }]
        );
    }

    #[test]
    fn noop_operation_records_nothing() {
        let mut board = board();
        let id = board.state().projects[DEFAULT_PROJECT_NAME].tasks[0].id.clone();
        board.move_task(&id, Status::Backlog, Some(&id), Placement::Before).unwrap();
        board.edit_task_field(&id, TaskField::Name, "Welcome Task").unwrap();
        assert!(!board.history().can_undo());
        assert!(board.drain_events().is_empty());
    }

    #[test]
    fn unflagging_an_overdue_task_is_not_a_step() {
        let mut board = board();
        let overdue = board.state().projects[DEFAULT_PROJECT_NAME].tasks[2].id.clone();
        let welcome = board.state().projects[DEFAULT_PROJECT_NAME].tasks[0].id.clone();
        board.edit_task_field(&welcome, TaskField::Name, "Hello").unwrap();
        assert!(board.undo());
        board.drain_events();

        // the sweep flags it straight back, so nothing changed on net
        assert!(!board.toggle_importance(&overdue).unwrap());
        assert!(board.state().find_task(&overdue).unwrap().is_important);
        assert!(!board.history().can_undo());
        assert!(board.history().can_redo());
        assert!(board.drain_events().is_empty());
    }

    #[test]
    fn sweep_overdue_flags_outside_history() {
        let mut config = BoardConfig::default();
        config.overdue.auto_mark = false;
        let mut board = Board::open_with_clock(MemoryStore::new(), config, fixed_today).unwrap();
        board.drain_events();
        assert_eq!(board.sweep_overdue(), 1);
        assert_eq!(board.sweep_overdue(), 0);
        assert!(!board.history().can_undo());
        assert_eq!(board.drain_events(), vec![BoardEvent::StateChanged]);
    }

    #[test]
    fn move_to_done_celebrates() {
        let mut board = board();
        let id = board.state().projects[DEFAULT_PROJECT_NAME].tasks[0].id.clone();
        board.move_task(&id, Status::Done, None, Placement::Before).unwrap();
        assert_eq!(
            board.drain_events(),
            vec![BoardEvent::StateChanged, BoardEvent::Celebrate { task_id: id }]
        );
    }

    #[test]
    fn switch_view_is_not_undoable() {
        let mut board = board();
        board.switch_view("--all-important--").unwrap();
        assert_eq!(board.state().current_view, View::AllImportant);
        assert!(!board.history().can_undo());
        assert_eq!(board.switch_view("Nowhere").unwrap_err().code(), "not_found");
    }

    #[test]
    fn persistence_failure_keeps_change_and_reports() {
        let mut board = Board::open_with_clock(BrokenStore, BoardConfig::default(), fixed_today).unwrap();
        board.drain_events();
        board.add_project("Work").unwrap();
        assert!(board.state().projects.contains_key("Work"));
        let events = board.drain_events();
        assert!(matches!(events[0], BoardEvent::Error { code: "persistence", .. }));
        assert_eq!(events[1], BoardEvent::StateChanged);
    }

    #[test]
    fn rejected_import_keeps_state() {
        let mut board = board();
        let before = board.state().clone();
        let err = board.import_str("[1, 2]").unwrap_err();
        assert_eq!(err.code(), "import_rejected");
        assert_eq!(board.state(), &before);
    }

    #[test]
    fn apply_dispatches_intents() {
        let mut board = board();
        let applied = board
            .apply(Intent::AddProject {
                name: " Work ".into(),
            })
            .unwrap();
        assert_eq!(applied, Applied::Project { name: "Work".into() });
        let applied = board
            .apply(Intent::AddTask {
                project_name: "Work".into(),
                status: Status::Todo,
                name: "Plan".into(),
                description: String::new(),
                due_date: None,
                is_important: false,
            })
            .unwrap();
        let Applied::Created { id } = applied else {
            panic!("expected created, got {:?}", applied);
        };
        assert_eq!(board.state().find_task(&id).unwrap().name, "Plan");
        assert_eq!(board.apply(Intent::Undo).unwrap(), Applied::Stepped { moved: true });
        assert!(board.state().find_task(&id).is_none());
        assert_eq!(
            board.apply(Intent::SetMaxUndoDepth { depth: 0 }).unwrap(),
            Applied::Depth { depth: 1 }
        );
        assert_eq!(board.store().get(UNDO_DEPTH_KEY), Some("1"));
    }
}
