//! The ordered, shuffleable, selection-aware media queue

use crate::error::QueueError;
use crate::repeat::RepeatMode;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

struct State<T> {
    items: Vec<T>,
    selected: Option<T>,
    shuffled: bool,
    seed: u64,
    repeat_mode: RepeatMode,
    /// Permutation of `0..items.len()` used as navigation order while
    /// `shuffled` is set. Derived from `seed` on demand and invalidated by
    /// any structural mutation; `None` means "needs recomputing".
    permutation: Option<Vec<usize>>,
}

impl<T> State<T> {
    fn invalidate(&mut self) {
        self.permutation = None;
    }
}

/// An ordered list of items with shuffle, repeat, and selection navigation.
///
/// All operations are internally serialized behind a single lock; the queue
/// is safe to share behind an `Arc` and mutate from multiple callers.
///
/// Selection is tracked by value (`T: PartialEq`), matching the "first
/// match" semantics `delete`/`replace` use: if the item type can contain
/// duplicates, operations act on the first occurrence in insertion order.
pub struct MediaQueue<T> {
    state: Mutex<State<T>>,
}

impl<T> Default for MediaQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> MediaQueue<T> {
    /// Creates an empty queue: no items, no selection, shuffle disabled,
    /// repeat mode `None`.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                items: Vec::new(),
                selected: None,
                shuffled: false,
                seed: 0,
                repeat_mode: RepeatMode::None,
                permutation: None,
            }),
        }
    }
}

impl<T: Clone + PartialEq> MediaQueue<T> {
    /// Appends `item` to the end of the queue. Selection is unchanged.
    pub fn add(&self, item: T) {
        let mut state = self.state.lock();
        state.items.push(item);
        state.invalidate();
    }

    /// Removes the first item equal to `item`. If it was selected, the
    /// selection advances to the navigation-order successor, else the
    /// predecessor, else becomes absent. No-ops if `item` is not present.
    pub fn delete(&self, item: &T) {
        let mut state = self.state.lock();
        let Some(index) = state.items.iter().position(|i| i == item) else {
            return;
        };

        let was_selected = state.selected.as_ref() == Some(item);
        let replacement = if was_selected {
            let nav = Self::navigation_order(&mut state);
            let pos = nav.iter().position(|&i| i == index);
            pos.and_then(|pos| {
                nav.get(pos + 1)
                    .or_else(|| if pos > 0 { nav.get(pos - 1) } else { None })
                    .map(|&i| state.items[i].clone())
            })
        } else {
            None
        };

        state.items.remove(index);
        if was_selected {
            state.selected = replacement;
        }
        state.invalidate();
    }

    /// Substitutes `from` with `to` in place. Fails with
    /// [`QueueError::NotFound`] if `from` is not present. If `from` was
    /// selected, the selection becomes `to`.
    pub fn replace(&self, from: &T, to: T) -> Result<(), QueueError> {
        let mut state = self.state.lock();
        let index = state
            .items
            .iter()
            .position(|i| i == from)
            .ok_or(QueueError::NotFound)?;

        let was_selected = state.selected.as_ref() == Some(from);
        state.items[index] = to.clone();
        if was_selected {
            state.selected = Some(to);
        }
        state.invalidate();
        Ok(())
    }

    /// Empties the queue and clears the selection. Shuffle and repeat mode
    /// are retained.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.items.clear();
        state.selected = None;
        state.invalidate();
    }

    /// Sets the selection. `None`, or an item not present in the queue,
    /// clears the selection.
    pub fn select(&self, item: Option<T>) {
        let mut state = self.state.lock();
        state.selected = match item {
            Some(item) if state.items.contains(&item) => Some(item),
            _ => None,
        };
    }

    /// The current selection, if any.
    pub fn selected(&self) -> Option<T> {
        self.state.lock().selected.clone()
    }

    /// A snapshot of the queue's items in insertion order.
    pub fn items(&self) -> Vec<T> {
        self.state.lock().items.clone()
    }

    /// Number of items currently queued.
    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    /// Whether the queue currently holds no items.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current repeat mode.
    pub fn repeat_mode(&self) -> RepeatMode {
        self.state.lock().repeat_mode
    }

    /// Sets the repeat mode; does not otherwise affect queue state.
    pub fn set_repeat_mode(&self, mode: RepeatMode) {
        self.state.lock().repeat_mode = mode;
    }

    /// Whether shuffle is currently enabled.
    pub fn is_shuffled(&self) -> bool {
        self.state.lock().shuffled
    }

    /// Enables or disables shuffle. Enabling always draws a fresh random
    /// seed and, with it, a fresh navigation permutation; disabling reverts
    /// navigation to insertion order. The current selection is retained
    /// either way.
    pub fn set_shuffle_enabled(&self, enabled: bool) {
        let mut state = self.state.lock();
        if enabled {
            state.seed = rand::thread_rng().gen();
            state.shuffled = true;
        } else {
            state.shuffled = false;
        }
        state.invalidate();
    }

    /// Advances the selection per the current repeat mode. A no-op if the
    /// queue is empty or nothing is selected.
    pub fn next(&self) {
        self.step(1);
    }

    /// Moves the selection backward per the current repeat mode. A no-op if
    /// the queue is empty or nothing is selected.
    pub fn previous(&self) {
        self.step(-1);
    }

    fn step(&self, direction: isize) {
        let mut state = self.state.lock();
        if state.items.is_empty() {
            return;
        }
        let Some(current) = state.selected.clone() else {
            return;
        };
        let nav = Self::navigation_order(&mut state);
        let Some(index) = state.items.iter().position(|i| i == &current) else {
            return;
        };
        let Some(pos) = nav.iter().position(|&i| i == index) else {
            return;
        };

        let repeat_mode = state.repeat_mode;
        let len = nav.len() as isize;
        let next_pos = pos as isize + direction;

        let target = match repeat_mode {
            RepeatMode::Single => Some(pos),
            RepeatMode::Circular => Some(next_pos.rem_euclid(len) as usize),
            RepeatMode::None => {
                if (0..len).contains(&next_pos) {
                    Some(next_pos as usize)
                } else {
                    None
                }
            }
        };

        if let Some(target) = target {
            state.selected = Some(state.items[nav[target]].clone());
        }
    }

    /// Whether `previous()` would change the selection (or, for `Circular`/
    /// `Single`, remains meaningfully available).
    pub fn has_previous(&self) -> bool {
        self.has_direction(-1)
    }

    /// Whether `next()` would change the selection (or, for `Circular`/
    /// `Single`, remains meaningfully available).
    pub fn has_next(&self) -> bool {
        self.has_direction(1)
    }

    fn has_direction(&self, direction: isize) -> bool {
        let mut state = self.state.lock();
        if state.items.is_empty() {
            return false;
        }
        match state.repeat_mode {
            RepeatMode::Circular => true,
            RepeatMode::Single => state.selected.is_some(),
            RepeatMode::None => {
                let Some(current) = state.selected.clone() else {
                    return false;
                };
                let nav = Self::navigation_order(&mut state);
                let Some(index) = state.items.iter().position(|i| i == &current) else {
                    return false;
                };
                let Some(pos) = nav.iter().position(|&i| i == index) else {
                    return false;
                };
                let next_pos = pos as isize + direction;
                (0..nav.len() as isize).contains(&next_pos)
            }
        }
    }

    /// Returns the current navigation order (insertion order, or the
    /// shuffle permutation), computing and caching it if necessary.
    fn navigation_order(state: &mut State<T>) -> Vec<usize> {
        if !state.shuffled {
            return (0..state.items.len()).collect();
        }
        if let Some(permutation) = &state.permutation {
            if permutation.len() == state.items.len() {
                return permutation.clone();
            }
        }
        let mut indices: Vec<usize> = (0..state.items.len()).collect();
        let mut rng = StdRng::seed_from_u64(state.seed);
        // Fisher-Yates.
        for i in (1..indices.len()).rev() {
            let j = rng.gen_range(0..=i);
            indices.swap(i, j);
        }
        state.permutation = Some(indices.clone());
        indices
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queue_with(items: &[&str]) -> MediaQueue<String> {
        let queue = MediaQueue::new();
        for item in items {
            queue.add(item.to_string());
        }
        queue
    }

    #[test]
    fn add_appends_without_disturbing_selection() {
        let queue = queue_with(&["a", "b"]);
        queue.select(Some("a".to_string()));
        queue.add("c".to_string());
        assert_eq!(queue.items(), vec!["a", "b", "c"]);
        assert_eq!(queue.selected(), Some("a".to_string()));
    }

    #[test]
    fn select_none_or_missing_clears_selection() {
        let queue = queue_with(&["a", "b"]);
        queue.select(Some("a".to_string()));
        queue.select(Some("missing".to_string()));
        assert_eq!(queue.selected(), None);

        queue.select(Some("b".to_string()));
        queue.select(None);
        assert_eq!(queue.selected(), None);
    }

    #[test]
    fn next_in_none_mode_stops_at_end() {
        let queue = queue_with(&["a", "b", "c"]);
        queue.select(Some("a".to_string()));
        queue.next();
        assert_eq!(queue.selected(), Some("b".to_string()));
        queue.next();
        assert_eq!(queue.selected(), Some("c".to_string()));
        queue.next();
        assert_eq!(queue.selected(), Some("c".to_string()));
    }

    #[test]
    fn next_in_circular_mode_wraps() {
        let queue = queue_with(&["a", "b", "c"]);
        queue.set_repeat_mode(RepeatMode::Circular);
        queue.select(Some("c".to_string()));
        queue.next();
        assert_eq!(queue.selected(), Some("a".to_string()));
    }

    #[test]
    fn next_in_single_mode_reselects_same_item() {
        let queue = queue_with(&["a", "b", "c"]);
        queue.set_repeat_mode(RepeatMode::Single);
        queue.select(Some("c".to_string()));
        queue.next();
        assert_eq!(queue.selected(), Some("c".to_string()));
        queue.previous();
        assert_eq!(queue.selected(), Some("c".to_string()));
    }

    #[test]
    fn has_previous_and_has_next_in_circular_mode_are_always_true() {
        let queue = queue_with(&["a"]);
        queue.set_repeat_mode(RepeatMode::Circular);
        queue.select(Some("a".to_string()));
        assert!(queue.has_previous());
        assert!(queue.has_next());
    }

    #[test]
    fn has_previous_and_has_next_in_single_mode_track_selection_presence() {
        let queue = queue_with(&["a"]);
        queue.set_repeat_mode(RepeatMode::Single);
        assert!(!queue.has_next());
        queue.select(Some("a".to_string()));
        assert!(queue.has_next());
        assert!(queue.has_previous());
    }

    #[test]
    fn deleting_selected_item_advances_to_navigation_successor() {
        let queue = queue_with(&["a", "b", "c"]);
        queue.select(Some("b".to_string()));
        queue.delete(&"b".to_string());
        assert_eq!(queue.items(), vec!["a", "c"]);
        assert_eq!(queue.selected(), Some("c".to_string()));
    }

    #[test]
    fn deleting_selected_last_item_falls_back_to_predecessor() {
        let queue = queue_with(&["a", "b", "c"]);
        queue.select(Some("c".to_string()));
        queue.delete(&"c".to_string());
        assert_eq!(queue.selected(), Some("b".to_string()));
    }

    #[test]
    fn deleting_only_selected_item_leaves_selection_absent() {
        let queue = queue_with(&["a"]);
        queue.select(Some("a".to_string()));
        queue.delete(&"a".to_string());
        assert_eq!(queue.selected(), None);
        assert!(queue.is_empty());
    }

    #[test]
    fn deleting_unselected_item_leaves_selection_untouched() {
        let queue = queue_with(&["a", "b", "c"]);
        queue.select(Some("a".to_string()));
        queue.delete(&"c".to_string());
        assert_eq!(queue.selected(), Some("a".to_string()));
    }

    #[test]
    fn replace_missing_item_fails_with_not_found() {
        let queue = queue_with(&["a"]);
        assert_eq!(
            queue.replace(&"missing".to_string(), "z".to_string()),
            Err(QueueError::NotFound)
        );
    }

    #[test]
    fn replace_selected_item_updates_selection() {
        let queue = queue_with(&["a", "b"]);
        queue.select(Some("a".to_string()));
        queue.replace(&"a".to_string(), "z".to_string()).unwrap();
        assert_eq!(queue.items(), vec!["z", "b"]);
        assert_eq!(queue.selected(), Some("z".to_string()));
    }

    #[test]
    fn clear_empties_items_and_selection_but_retains_shuffle_and_repeat() {
        let queue = queue_with(&["a", "b"]);
        queue.select(Some("a".to_string()));
        queue.set_shuffle_enabled(true);
        queue.set_repeat_mode(RepeatMode::Circular);
        queue.clear();
        assert!(queue.is_empty());
        assert_eq!(queue.selected(), None);
        assert!(queue.is_shuffled());
        assert_eq!(queue.repeat_mode(), RepeatMode::Circular);
    }

    #[test]
    fn shuffle_stability_keeps_selection_across_deletion() {
        // S4: add [A,B,C,D]; select B; enable shuffle; delete C.
        let queue = queue_with(&["A", "B", "C", "D"]);
        queue.select(Some("B".to_string()));
        queue.set_shuffle_enabled(true);
        queue.delete(&"C".to_string());
        assert_eq!(queue.items(), vec!["A", "B", "D"]);
        assert_eq!(queue.selected(), Some("B".to_string()));
    }

    #[test]
    fn disabling_shuffle_reverts_to_insertion_order_navigation() {
        let queue = queue_with(&["a", "b", "c"]);
        queue.set_shuffle_enabled(true);
        queue.set_shuffle_enabled(false);
        queue.select(Some("a".to_string()));
        queue.next();
        assert_eq!(queue.selected(), Some("b".to_string()));
    }

    #[test]
    fn empty_queue_navigation_is_a_no_op() {
        let queue: MediaQueue<String> = MediaQueue::new();
        queue.next();
        queue.previous();
        assert_eq!(queue.selected(), None);
        assert!(!queue.has_next());
        assert!(!queue.has_previous());
    }
}
