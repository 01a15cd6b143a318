//! Widget manager for tracking selection, hover and editing.

use crate::element::ElementId;

use super::state::WidgetState;

/// Tracks which elements are selected, hovered or being edited.
///
/// Kept apart from the element tree so pure data never carries UI state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WidgetManager {
    selected: Option<ElementId>,
    /// Element being edited in place. Always the selected one.
    editing: Option<ElementId>,
    hovered: Option<ElementId>,
}

impl WidgetManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derived state of an element.
    pub fn state(&self, id: &ElementId) -> WidgetState {
        if self.editing.as_ref() == Some(id) {
            WidgetState::Editing
        } else if self.selected.as_ref() == Some(id) {
            WidgetState::Selected
        } else if self.hovered.as_ref() == Some(id) {
            WidgetState::Hovered
        } else {
            WidgetState::Normal
        }
    }

    pub fn selected(&self) -> Option<&ElementId> {
        self.selected.as_ref()
    }

    pub fn hovered(&self) -> Option<&ElementId> {
        self.hovered.as_ref()
    }

    pub fn editing(&self) -> Option<&ElementId> {
        self.editing.as_ref()
    }

    pub fn is_selected(&self, id: &ElementId) -> bool {
        self.selected.as_ref() == Some(id)
    }

    /// Replace the selection. Returns true if it changed.
    pub fn select(&mut self, id: Option<ElementId>) -> bool {
        if self.selected == id {
            return false;
        }
        if self.editing.is_some() && self.editing != id {
            self.editing = None;
        }
        self.selected = id;
        true
    }

    pub fn clear_selection(&mut self) -> bool {
        self.select(None)
    }

    /// Set the hovered element. Returns true if it changed.
    pub fn set_hovered(&mut self, id: Option<ElementId>) -> bool {
        if self.hovered == id {
            return false;
        }
        self.hovered = id;
        true
    }

    /// Enter editing mode, selecting the element first.
    pub fn enter_editing(&mut self, id: ElementId) {
        self.selected = Some(id.clone());
        self.editing = Some(id);
    }

    pub fn exit_editing(&mut self) {
        self.editing = None;
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    /// Drop every reference to removed elements.
    pub fn forget(&mut self, removed: &[ElementId]) -> bool {
        let mut selection_changed = false;
        for id in removed {
            if self.selected.as_ref() == Some(id) {
                self.selected = None;
                selection_changed = true;
            }
            if self.editing.as_ref() == Some(id) {
                self.editing = None;
            }
            if self.hovered.as_ref() == Some(id) {
                self.hovered = None;
            }
        }
        selection_changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(value: &str) -> ElementId {
        ElementId::from(value)
    }

    #[test]
    fn test_select_and_state() {
        let mut widgets = WidgetManager::new();
        assert!(widgets.select(Some(id("a"))));
        assert!(!widgets.select(Some(id("a"))));
        widgets.set_hovered(Some(id("b")));

        assert_eq!(widgets.state(&id("a")), WidgetState::Selected);
        assert_eq!(widgets.state(&id("b")), WidgetState::Hovered);
        assert_eq!(widgets.state(&id("c")), WidgetState::Normal);
    }

    #[test]
    fn test_selecting_other_exits_editing() {
        let mut widgets = WidgetManager::new();
        widgets.enter_editing(id("a"));
        assert_eq!(widgets.state(&id("a")), WidgetState::Editing);
        assert!(widgets.state(&id("a")).is_selected());

        widgets.select(Some(id("b")));
        assert!(!widgets.is_editing());
        assert_eq!(widgets.selected(), Some(&id("b")));
    }

    #[test]
    fn test_forget_clears_all_references() {
        let mut widgets = WidgetManager::new();
        widgets.enter_editing(id("a"));
        widgets.set_hovered(Some(id("a1")));

        assert!(widgets.forget(&[id("a"), id("a1")]));
        assert_eq!(widgets, WidgetManager::new());
        assert!(!widgets.forget(&[id("zzz")]));
    }
}
