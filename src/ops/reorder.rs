//! Insertion-index arithmetic shared by every drag-style move.
//!
//! A move takes item X out of sequence A at `from` and drops it before or
//! after a reference item Y sitting at `target` in sequence B:
//!
//! 1. remove X from A at `from`
//! 2. if A and B are the same sequence and `from < target`, shift `target`
//!    left by one (the removal moved Y)
//! 3. for `After`, add one
//! 4. clamp to `[0, len(B)]`
//! 5. insert X into B at that index
//!
//! Task reordering within a column, subtask reordering and relocation, and
//! unpinned project reordering all go through these functions.

use serde::{Deserialize, Serialize};

/// Which side of the reference item the moved item lands on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    #[default]
    Before,
    After,
}

/// Compute the final index for a move.
///
/// `len_after_removal` is the length of the destination once the moved item
/// has been taken out of the source.
pub fn insertion_index(
    from: usize,
    target: usize,
    placement: Placement,
    same_sequence: bool,
    len_after_removal: usize,
) -> usize {
    let mut index = target;
    if same_sequence && from < target {
        index -= 1;
    }
    if placement == Placement::After {
        index += 1;
    }
    index.min(len_after_removal)
}

/// Move the item at `from` next to the item currently at `target` in the
/// same sequence. Returns the moved item's new index.
///
/// Both indices must be in bounds; `from == target` leaves the sequence as is.
pub fn reposition<T>(items: &mut Vec<T>, from: usize, target: usize, placement: Placement) -> usize {
    if from == target {
        return from;
    }
    let item = items.remove(from);
    let index = insertion_index(from, target, placement, true, items.len());
    items.insert(index, item);
    index
}

/// Move the item at `from` in `source` into `dest`, next to the item at
/// `target` when given, or at the end otherwise. Returns the new index in
/// `dest`.
pub fn transfer<T>(
    source: &mut Vec<T>,
    from: usize,
    dest: &mut Vec<T>,
    target: Option<(usize, Placement)>,
) -> usize {
    let item = source.remove(from);
    let index = match target {
        Some((target, placement)) => insertion_index(from, target, placement, false, dest.len()),
        None => dest.len(),
    };
    dest.insert(index, item);
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn letters() -> Vec<char> {
        vec!['a', 'b', 'c', 'd', 'e']
    }

    #[test]
    fn before_lands_on_target_or_one_left() {
        let len = letters().len();
        for i in 0..len {
            for j in 0..len {
                if i == j {
                    continue;
                }
                let mut items = letters();
                let moved = items[i];
                let idx = reposition(&mut items, i, j, Placement::Before);
                let expected = if i > j { j } else { j - 1 };
                assert_eq!(idx, expected, "move {} before {}", i, j);
                assert_eq!(items[idx], moved);
                assert_eq!(items.len(), len);
            }
        }
    }

    #[test]
    fn after_lands_one_past_before() {
        let len = letters().len();
        for i in 0..len {
            for j in 0..len {
                if i == j {
                    continue;
                }
                let mut items = letters();
                let idx = reposition(&mut items, i, j, Placement::After);
                let expected = if i > j { j + 1 } else { j };
                assert_eq!(idx, expected, "move {} after {}", i, j);
            }
        }
    }

    #[test]
    fn move_second_before_first() {
        let mut items = vec!["A", "B"];
        reposition(&mut items, 1, 0, Placement::Before);
        assert_eq!(items, vec!["B", "A"]);
    }

    #[test]
    fn move_first_after_last() {
        let mut items = letters();
        let idx = reposition(&mut items, 0, 4, Placement::After);
        assert_eq!(idx, 4);
        assert_eq!(items, vec!['b', 'c', 'd', 'e', 'a']);
    }

    #[test]
    fn move_onto_itself_is_noop() {
        let mut items = letters();
        assert_eq!(reposition(&mut items, 2, 2, Placement::After), 2);
        assert_eq!(items, letters());
    }

    #[test]
    fn transfer_appends_without_reference() {
        let mut a = vec![1, 2, 3];
        let mut b = vec![10, 20];
        let idx = transfer(&mut a, 0, &mut b, None);
        assert_eq!(idx, 2);
        assert_eq!(a, vec![2, 3]);
        assert_eq!(b, vec![10, 20, 1]);
    }

    #[test]
    fn transfer_does_not_shift_foreign_target() {
        let mut a = vec![1, 2, 3];
        let mut b = vec![10, 20, 30];
        let idx = transfer(&mut a, 2, &mut b, Some((1, Placement::Before)));
        assert_eq!(idx, 1);
        assert_eq!(b, vec![10, 3, 20, 30]);

        // from < target would shift within one sequence, not across two
        let idx = transfer(&mut a, 0, &mut b, Some((3, Placement::After)));
        assert_eq!(idx, 4);
        assert_eq!(b, vec![10, 3, 20, 30, 1]);
    }

    #[test]
    fn insertion_index_clamps_to_length() {
        assert_eq!(insertion_index(0, 9, Placement::After, false, 3), 3);
    }
}
