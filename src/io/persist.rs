use chrono::NaiveDate;
use tracing::{info, warn};

use super::store::{KeyValueStore, StoreError};
use crate::model::config::clamp_undo_depth;
use crate::model::state::BoardState;
use crate::ops::normalize::normalize_str;

/// Key of the serialized board state
pub const STATE_KEY: &str = "board-state-v1";
/// Where unreadable board state is kept before it is replaced
pub const BACKUP_KEY: &str = "board-state-v1.bak";
/// Key of the undo depth setting
pub const UNDO_DEPTH_KEY: &str = "undo-max-steps";

/// How the startup state was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    /// Normalized from the saved value
    Saved,
    /// Nothing saved yet; factory defaults
    Fresh,
    /// Saved value was unusable; backed up and replaced by factory defaults
    Recovered,
}

/// Load and normalize the saved board, falling back to factory data.
pub fn load_state<S: KeyValueStore>(store: &mut S, today: NaiveDate) -> Result<(BoardState, LoadSource), StoreError> {
    let Some(text) = store.load(STATE_KEY)? else {
        info!("no saved board; starting from sample data");
        return Ok((BoardState::factory(today), LoadSource::Fresh));
    };
    match normalize_str(&text) {
        Ok(state) => Ok((state, LoadSource::Saved)),
        Err(e) => {
            store.save(BACKUP_KEY, &text)?;
            warn!(error = %e, backup = BACKUP_KEY, "saved board is unusable; starting from sample data");
            Ok((BoardState::factory(today), LoadSource::Recovered))
        }
    }
}

pub fn save_state<S: KeyValueStore>(store: &mut S, state: &BoardState) -> Result<(), StoreError> {
    let text = export_json(state)?;
    store.save(STATE_KEY, &text)
}

/// Pretty JSON of the full state, as saved and exported
pub fn export_json(state: &BoardState) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(state)
}

/// The saved undo depth, or `default` when absent or unparseable.
/// Always within [1, 100].
pub fn load_depth<S: KeyValueStore>(store: &S, default: usize) -> Result<usize, StoreError> {
    let saved = store.load(UNDO_DEPTH_KEY)?;
    let depth = match saved.as_deref().map(str::trim).map(str::parse::<usize>) {
        Some(Ok(depth)) => depth,
        Some(Err(_)) => {
            warn!(key = UNDO_DEPTH_KEY, "ignoring unparseable undo depth");
            default
        }
        None => default,
    };
    Ok(clamp_undo_depth(depth))
}

pub fn save_depth<S: KeyValueStore>(store: &mut S, depth: usize) -> Result<(), StoreError> {
    store.save(UNDO_DEPTH_KEY, &depth.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::store::MemoryStore;
    use crate::model::state::{DEFAULT_PROJECT_NAME, View};
    use pretty_assertions::assert_eq;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 10).unwrap()
    }

    #[test]
    fn empty_store_gives_factory_data() {
        let mut store = MemoryStore::new();
        let (state, source) = load_state(&mut store, today()).unwrap();
        assert_eq!(source, LoadSource::Fresh);
        assert_eq!(state.projects[DEFAULT_PROJECT_NAME].tasks.len(), 3);
    }

    #[test]
    fn unusable_state_is_backed_up() {
        for bad in ["not json", "[1,2,3]"] {
            let mut store = MemoryStore::with(STATE_KEY, bad);
            let (state, source) = load_state(&mut store, today()).unwrap();
            assert_eq!(source, LoadSource::Recovered);
            assert_eq!(state.current_view, View::project(DEFAULT_PROJECT_NAME));
            assert_eq!(store.get(BACKUP_KEY), Some(bad));
        }
    }

    #[test]
    fn saved_state_round_trips() {
        let mut store = MemoryStore::new();
        let state = BoardState::factory(today());
        save_state(&mut store, &state).unwrap();
        let (loaded, source) = load_state(&mut store, today()).unwrap();
        assert_eq!(source, LoadSource::Saved);
        assert_eq!(loaded, state);
    }

    #[test]
    fn depth_defaults_and_clamps() {
        let mut store = MemoryStore::new();
        assert_eq!(load_depth(&store, 10).unwrap(), 10);
        save_depth(&mut store, 250).unwrap();
        assert_eq!(load_depth(&store, 10).unwrap(), 100);
        store.save(UNDO_DEPTH_KEY, " 7\n").unwrap();
        assert_eq!(load_depth(&store, 10).unwrap(), 7);
        store.save(UNDO_DEPTH_KEY, "lots").unwrap();
        assert_eq!(load_depth(&store, 3).unwrap(), 3);
    }
}
