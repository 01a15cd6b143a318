//! Resize handles drawn around the selected element.

use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

use crate::snap::SnapEdges;

/// Handle hit tolerance in screen pixels.
pub const HANDLE_HIT_TOLERANCE: f64 = 8.0;

/// Compass position of a resize handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResizeHandle {
    N,
    S,
    E,
    W,
    NE,
    NW,
    SE,
    SW,
}

impl ResizeHandle {
    pub const ALL: [ResizeHandle; 8] = [
        ResizeHandle::NW,
        ResizeHandle::N,
        ResizeHandle::NE,
        ResizeHandle::E,
        ResizeHandle::SE,
        ResizeHandle::S,
        ResizeHandle::SW,
        ResizeHandle::W,
    ];

    pub fn moves_left(self) -> bool {
        matches!(self, Self::W | Self::NW | Self::SW)
    }

    pub fn moves_right(self) -> bool {
        matches!(self, Self::E | Self::NE | Self::SE)
    }

    pub fn moves_top(self) -> bool {
        matches!(self, Self::N | Self::NE | Self::NW)
    }

    pub fn moves_bottom(self) -> bool {
        matches!(self, Self::S | Self::SE | Self::SW)
    }

    /// Edges that may snap on the x axis while this handle is dragged.
    pub fn x_edges(self) -> SnapEdges {
        if self.moves_left() {
            SnapEdges::MIN
        } else if self.moves_right() {
            SnapEdges::MAX
        } else {
            SnapEdges::NONE
        }
    }

    /// Edges that may snap on the y axis while this handle is dragged.
    pub fn y_edges(self) -> SnapEdges {
        if self.moves_top() {
            SnapEdges::MIN
        } else if self.moves_bottom() {
            SnapEdges::MAX
        } else {
            SnapEdges::NONE
        }
    }

    /// Where the handle sits on `rect`.
    pub fn position(self, rect: Rect) -> Point {
        let center = rect.center();
        let x = if self.moves_left() {
            rect.x0
        } else if self.moves_right() {
            rect.x1
        } else {
            center.x
        };
        let y = if self.moves_top() {
            rect.y0
        } else if self.moves_bottom() {
            rect.y1
        } else {
            center.y
        };
        Point::new(x, y)
    }

    pub fn cursor(self) -> CursorHint {
        match self {
            Self::N | Self::S => CursorHint::ResizeNs,
            Self::E | Self::W => CursorHint::ResizeEw,
            Self::NE | Self::SW => CursorHint::ResizeNesw,
            Self::NW | Self::SE => CursorHint::ResizeNwse,
        }
    }

    /// Move the handle's edges by `delta` and enforce a minimum size.
    ///
    /// Edges the handle does not touch stay where they were.
    pub fn apply(self, start: Rect, delta: Vec2, min_size: f64) -> Rect {
        let mut rect = start;
        if self.moves_left() {
            rect.x0 += delta.x;
        }
        if self.moves_right() {
            rect.x1 += delta.x;
        }
        if self.moves_top() {
            rect.y0 += delta.y;
        }
        if self.moves_bottom() {
            rect.y1 += delta.y;
        }
        self.clamp(rect, min_size)
    }

    /// Grow `rect` to `min_size` by moving only this handle's edges.
    pub fn clamp(self, mut rect: Rect, min_size: f64) -> Rect {
        if rect.x1 - rect.x0 < min_size {
            if self.moves_left() {
                rect.x0 = rect.x1 - min_size;
            } else {
                rect.x1 = rect.x0 + min_size;
            }
        }
        if rect.y1 - rect.y0 < min_size {
            if self.moves_top() {
                rect.y0 = rect.y1 - min_size;
            } else {
                rect.y1 = rect.y0 + min_size;
            }
        }
        rect
    }
}

/// A resize handle and its position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Handle {
    pub kind: ResizeHandle,
    pub position: Point,
}

impl Handle {
    pub fn new(kind: ResizeHandle, position: Point) -> Self {
        Self { kind, position }
    }

    /// Check if a point hits this handle. Both must be in the same space.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let dx = point.x - self.position.x;
        let dy = point.y - self.position.y;
        dx * dx + dy * dy <= tolerance * tolerance
    }
}

/// All eight handles of a rect.
pub fn handles_for_rect(rect: Rect) -> Vec<Handle> {
    ResizeHandle::ALL
        .iter()
        .map(|&kind| Handle::new(kind, kind.position(rect)))
        .collect()
}

/// First handle of `rect` within `tolerance` of `point`.
///
/// Corners come first so they win over edges on small rects.
pub fn hit_test_handles(rect: Rect, point: Point, tolerance: f64) -> Option<ResizeHandle> {
    let handles = handles_for_rect(rect);
    let corners = handles.iter().filter(|h| is_corner(h.kind));
    let edges = handles.iter().filter(|h| !is_corner(h.kind));
    corners
        .chain(edges)
        .find(|handle| handle.hit_test(point, tolerance))
        .map(|handle| handle.kind)
}

fn is_corner(kind: ResizeHandle) -> bool {
    matches!(
        kind,
        ResizeHandle::NE | ResizeHandle::NW | ResizeHandle::SE | ResizeHandle::SW
    )
}

/// Cursor the host should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CursorHint {
    #[default]
    Default,
    Move,
    Grab,
    ResizeNs,
    ResizeEw,
    ResizeNesw,
    ResizeNwse,
}

impl CursorHint {
    /// CSS cursor keyword.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Move => "move",
            Self::Grab => "grab",
            Self::ResizeNs => "ns-resize",
            Self::ResizeEw => "ew-resize",
            Self::ResizeNesw => "nesw-resize",
            Self::ResizeNwse => "nwse-resize",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_east_resize_keeps_left_edge() {
        let start = Rect::new(0.0, 0.0, 100.0, 100.0);
        let rect = ResizeHandle::E.apply(start, Vec2::new(50.0, 30.0), 10.0);
        assert_eq!(rect, Rect::new(0.0, 0.0, 150.0, 100.0));
    }

    #[test]
    fn test_north_west_resize() {
        let start = Rect::new(10.0, 10.0, 110.0, 60.0);
        let rect = ResizeHandle::NW.apply(start, Vec2::new(-10.0, 5.0), 10.0);
        assert_eq!(rect, Rect::new(0.0, 15.0, 110.0, 60.0));
    }

    #[test]
    fn test_resize_clamps_to_min_size_from_fixed_edge() {
        let start = Rect::new(0.0, 0.0, 100.0, 100.0);

        let rect = ResizeHandle::W.apply(start, Vec2::new(150.0, 0.0), 10.0);
        assert_eq!(rect, Rect::new(90.0, 0.0, 100.0, 100.0));

        let rect = ResizeHandle::S.apply(start, Vec2::new(0.0, -200.0), 10.0);
        assert_eq!(rect, Rect::new(0.0, 0.0, 100.0, 10.0));
    }

    #[test]
    fn test_snap_edges_follow_handle() {
        assert_eq!(ResizeHandle::E.x_edges(), SnapEdges::MAX);
        assert_eq!(ResizeHandle::E.y_edges(), SnapEdges::NONE);
        assert_eq!(ResizeHandle::NW.x_edges(), SnapEdges::MIN);
        assert_eq!(ResizeHandle::NW.y_edges(), SnapEdges::MIN);
    }

    #[test]
    fn test_hit_test_handles() {
        let rect = Rect::new(100.0, 100.0, 300.0, 200.0);
        assert_eq!(
            hit_test_handles(rect, Point::new(302.0, 151.0), 8.0),
            Some(ResizeHandle::E)
        );
        assert_eq!(
            hit_test_handles(rect, Point::new(97.0, 96.0), 8.0),
            Some(ResizeHandle::NW)
        );
        assert_eq!(hit_test_handles(rect, Point::new(200.0, 150.0), 8.0), None);
    }

    #[test]
    fn test_cursor_names() {
        assert_eq!(ResizeHandle::SE.cursor().as_str(), "nwse-resize");
        assert_eq!(ResizeHandle::N.cursor().as_str(), "ns-resize");
    }
}
