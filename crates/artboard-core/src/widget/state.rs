//! Widget state definitions.

/// The UI state of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WidgetState {
    /// No interaction.
    #[default]
    Normal,
    /// Pointer is over the element.
    Hovered,
    /// Element is selected and shows resize handles.
    Selected,
    /// Element content is being edited in place.
    Editing,
}

impl WidgetState {
    /// Check if the element is selected (either just selected or editing).
    pub fn is_selected(self) -> bool {
        matches!(self, Self::Selected | Self::Editing)
    }

    pub fn is_editing(self) -> bool {
        self == Self::Editing
    }
}
