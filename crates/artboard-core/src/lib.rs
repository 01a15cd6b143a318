//! Artboard Core Library
//!
//! Platform-agnostic interaction engine for the artboard design surface:
//! element tree, camera, undo history, geometry resolution, snapping and
//! the pointer/touch/keyboard state machine. Rendering and layout stay with
//! the host, which forwards events to [`Engine`] and acts on the returned
//! [`Action`]s.

pub mod camera;
pub mod canvas;
pub mod config;
pub mod controller;
pub mod element;
pub mod engine;
pub mod geometry;
pub mod history;
pub mod input;
pub mod interaction;
pub mod scheduler;
pub mod snap;
pub mod tree;
pub mod widget;

pub use camera::Camera;
pub use canvas::{Canvas, DocumentSnapshot};
pub use config::{ConfigError, EngineConfig};
pub use controller::InteractionController;
pub use element::{Dimension, Display, Element, ElementId, ElementKind, ElementPatch, ElementProps, FlexDirection};
pub use engine::{Action, Engine};
pub use geometry::{GeometryResolver, LayoutMeasure};
pub use history::{HistoryEntry, HistoryManager};
pub use input::{Key, Modifiers, MouseButton, TouchPoint, WheelDelta};
pub use interaction::{InteractionMode, InteractionState};
pub use snap::{Axis, SnapLine, SnapResult, compute_snap};
pub use tree::{ElementTree, TreeError};
pub use widget::{CursorHint, ResizeHandle, WidgetManager, WidgetState};
