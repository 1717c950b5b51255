use crate::model::config::clamp_undo_depth;
use crate::model::state::BoardState;

/// Bounded snapshot undo/redo.
///
/// `past` holds pre-mutation snapshots, newest last; `future` holds the
/// states undone since the last mutation. Each stack keeps at most
/// `max_depth` entries, evicting the oldest first.
#[derive(Debug, Clone)]
pub struct History {
    past: Vec<BoardState>,
    future: Vec<BoardState>,
    max_depth: usize,
}

impl History {
    pub fn new(max_depth: usize) -> Self {
        History {
            past: Vec::new(),
            future: Vec::new(),
            max_depth: clamp_undo_depth(max_depth),
        }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn undo_len(&self) -> usize {
        self.past.len()
    }

    pub fn redo_len(&self) -> usize {
        self.future.len()
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    /// Record the state as it was before a mutation. Clears redo.
    pub fn record(&mut self, before: BoardState) {
        self.future.clear();
        self.past.push(before);
        trim(&mut self.past, self.max_depth);
    }

    /// Swap `current` with the newest past snapshot. Returns false when there
    /// is nothing to undo.
    pub fn undo(&mut self, current: &mut BoardState) -> bool {
        let Some(previous) = self.past.pop() else {
            return false;
        };
        self.future.push(std::mem::replace(current, previous));
        trim(&mut self.future, self.max_depth);
        true
    }

    /// Swap `current` with the newest undone state. Returns false when there
    /// is nothing to redo.
    pub fn redo(&mut self, current: &mut BoardState) -> bool {
        let Some(next) = self.future.pop() else {
            return false;
        };
        self.past.push(std::mem::replace(current, next));
        trim(&mut self.past, self.max_depth);
        true
    }

    /// Change the bound, clamped to [1, 100]; both stacks shrink from the
    /// oldest end. Returns the depth in effect.
    pub fn set_max_depth(&mut self, depth: usize) -> usize {
        self.max_depth = clamp_undo_depth(depth);
        trim(&mut self.past, self.max_depth);
        trim(&mut self.future, self.max_depth);
        self.max_depth
    }

    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }
}

fn trim(stack: &mut Vec<BoardState>, max: usize) {
    if stack.len() > max {
        stack.drain(..stack.len() - max);
    }
}
