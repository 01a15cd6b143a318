//! Gesture state for the interaction controller.

use std::collections::HashSet;

use kurbo::{Point, Rect, Vec2};
use serde::Serialize;

use crate::element::ElementId;
use crate::widget::ResizeHandle;

/// Which gesture is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum InteractionMode {
    #[default]
    Idle,
    Dragging,
    Resizing,
    Panning,
}

/// Read-only view of the active gesture, for rendering feedback.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InteractionState {
    pub mode: InteractionMode,
    /// Element being dragged or resized.
    pub active_id: Option<ElementId>,
    /// Container the dragged element would drop into.
    pub hovered_parent_id: Option<ElementId>,
    /// Insertion position within a flex drop target.
    pub insert_index: Option<usize>,
}

impl InteractionState {
    pub fn is_idle(&self) -> bool {
        self.mode == InteractionMode::Idle
    }
}

/// Move of one element and its subtree.
#[derive(Debug, Clone)]
pub(crate) struct DragState {
    pub id: ElementId,
    /// Pointer position at press, in screen coordinates.
    pub start_screen: Point,
    pub current_screen: Point,
    /// Parent-relative position when the move started.
    pub start_position: Point,
    /// Artboard rect when the move started, if known.
    pub start_rect: Option<Rect>,
    /// The element and all its descendants.
    pub subtree: HashSet<ElementId>,
    /// Set once the pointer crosses the drag threshold and the move is live.
    pub started: bool,
}

impl DragState {
    pub fn new(id: ElementId, start_screen: Point, start_position: Point, subtree: HashSet<ElementId>) -> Self {
        Self {
            id,
            start_screen,
            current_screen: start_screen,
            start_position,
            start_rect: None,
            subtree,
            started: false,
        }
    }

    /// Pointer travel since press, in screen pixels.
    pub fn screen_delta(&self) -> Vec2 {
        self.current_screen - self.start_screen
    }
}

/// Resize of one element through a handle.
#[derive(Debug, Clone)]
pub(crate) struct ResizeState {
    pub id: ElementId,
    pub handle: ResizeHandle,
    pub start_screen: Point,
    pub current_screen: Point,
    /// Stored parent-relative position at press.
    pub start_position: Point,
    /// Artboard rect at press.
    pub start_rect: Rect,
    /// Whether the history snapshot for this gesture has been recorded.
    pub recorded: bool,
}

impl ResizeState {
    pub fn screen_delta(&self) -> Vec2 {
        self.current_screen - self.start_screen
    }
}

/// Two-finger pan and zoom.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PinchState {
    pub last_midpoint: Point,
    pub last_distance: f64,
}

/// The single gesture that owns the pointer.
#[derive(Debug, Clone)]
pub(crate) enum Gesture {
    Panning { last_screen: Point },
    Pinching(PinchState),
    Dragging(DragState),
    Resizing(ResizeState),
}

impl Gesture {
    /// Mode reported to the host. A press that has not crossed the drag
    /// threshold still reads as idle.
    pub fn mode(&self) -> InteractionMode {
        match self {
            Gesture::Panning { .. } | Gesture::Pinching(_) => InteractionMode::Panning,
            Gesture::Dragging(drag) if drag.started => InteractionMode::Dragging,
            Gesture::Dragging(_) => InteractionMode::Idle,
            Gesture::Resizing(_) => InteractionMode::Resizing,
        }
    }

    pub fn active_id(&self) -> Option<&ElementId> {
        match self {
            Gesture::Dragging(drag) if drag.started => Some(&drag.id),
            Gesture::Resizing(resize) => Some(&resize.id),
            _ => None,
        }
    }

    /// Element the gesture writes to, including a drag still under threshold.
    pub fn target_id(&self) -> Option<&ElementId> {
        match self {
            Gesture::Dragging(drag) => Some(&drag.id),
            Gesture::Resizing(resize) => Some(&resize.id),
            _ => None,
        }
    }
}
