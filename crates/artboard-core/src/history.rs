//! Bounded undo/redo history of element tree snapshots.

use crate::camera::Camera;
use crate::tree::ElementTree;

/// Default number of undo states to keep.
pub const MAX_UNDO_HISTORY: usize = 50;

/// Immutable snapshot of document state.
///
/// The camera is recorded for reference only; restoring an entry
/// replaces the tree and leaves the view where it is.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub tree: ElementTree,
    pub camera: Camera,
}

impl HistoryEntry {
    pub fn new(tree: ElementTree, camera: Camera) -> Self {
        Self { tree, camera }
    }
}

/// Undo and redo stacks.
#[derive(Debug, Clone)]
pub struct HistoryManager {
    undo_stack: Vec<HistoryEntry>,
    redo_stack: Vec<HistoryEntry>,
    max_entries: usize,
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(MAX_UNDO_HISTORY)
    }
}

impl HistoryManager {
    pub fn new(max_entries: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_entries: max_entries.max(1),
        }
    }

    /// Record the state before a change. Clears the redo stack.
    pub fn snapshot(&mut self, entry: HistoryEntry) {
        self.undo_stack.push(entry);
        self.redo_stack.clear();

        if self.undo_stack.len() > self.max_entries {
            self.undo_stack.remove(0);
        }
    }

    /// Pop the last recorded state, parking `current` for redo.
    pub fn undo(&mut self, current: HistoryEntry) -> Option<HistoryEntry> {
        let entry = self.undo_stack.pop()?;
        self.redo_stack.push(current);
        Some(entry)
    }

    /// Pop the last undone state, parking `current` for undo.
    pub fn redo(&mut self, current: HistoryEntry) -> Option<HistoryEntry> {
        let entry = self.redo_stack.pop()?;
        self.undo_stack.push(current);
        Some(entry)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Element, ElementId, ElementKind, ElementPatch};

    fn entry(tree: &ElementTree) -> HistoryEntry {
        HistoryEntry::new(tree.clone(), Camera::new())
    }

    #[test]
    fn test_undo_redo_round_trip() {
        let mut history = HistoryManager::default();
        let mut tree = ElementTree::from_elements([
            Element::with_id("a", ElementKind::Text).at(0.0, 0.0).sized(10.0, 10.0),
        ]);
        let original = tree.clone();

        history.snapshot(entry(&tree));
        tree.update(&ElementId::from("a"), &ElementPatch::position(40.0, 40.0));
        let edited = tree.clone();

        let restored = history.undo(entry(&tree)).unwrap();
        tree = restored.tree;
        assert_eq!(tree, original);
        assert!(history.can_redo());

        let reapplied = history.redo(entry(&tree)).unwrap();
        tree = reapplied.tree;
        assert_eq!(tree, edited);
        assert!(history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_snapshot_clears_redo() {
        let mut history = HistoryManager::default();
        let tree = ElementTree::new();
        history.snapshot(entry(&tree));
        history.undo(entry(&tree));
        assert!(history.can_redo());

        history.snapshot(entry(&tree));
        assert!(!history.can_redo());
    }

    #[test]
    fn test_history_is_bounded() {
        let mut history = HistoryManager::new(3);
        let tree = ElementTree::new();
        for _ in 0..10 {
            history.snapshot(entry(&tree));
        }
        assert_eq!(history.undo_len(), 3);
    }

    #[test]
    fn test_empty_stacks() {
        let mut history = HistoryManager::default();
        assert!(history.undo(entry(&ElementTree::new())).is_none());
        assert!(history.redo(entry(&ElementTree::new())).is_none());
        assert!(!history.can_redo());
    }
}
