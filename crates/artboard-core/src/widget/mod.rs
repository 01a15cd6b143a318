//! Interactive state layered over elements.
//!
//! Elements stay pure data; this module tracks which one is selected,
//! hovered or being edited, and the resize handles drawn around the
//! selection.

mod handles;
mod manager;
mod state;

pub use handles::{
    CursorHint, HANDLE_HIT_TOLERANCE, Handle, ResizeHandle, handles_for_rect, hit_test_handles,
};
pub use manager::WidgetManager;
pub use state::WidgetState;
