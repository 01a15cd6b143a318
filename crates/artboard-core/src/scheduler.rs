//! Per-frame work queue.
//!
//! Input handlers only mark work as pending. The host calls the frame tick
//! once per display frame, which drains everything at once so measurement
//! and drop-target probing never run faster than the display.

use kurbo::Point;

/// Work deferred to the next frame tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameWork {
    pub measure: bool,
    /// Latest pointer position to check for a drop target.
    pub drop_check: Option<Point>,
}

impl FrameWork {
    pub fn is_empty(&self) -> bool {
        !self.measure && self.drop_check.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct FrameScheduler {
    pending: FrameWork,
    /// Whether a frame has been requested from the host and not yet run.
    requested: bool,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask for layout measurement. Returns true if the host must be asked for a frame.
    pub fn request_measure(&mut self) -> bool {
        self.pending.measure = true;
        self.request_frame()
    }

    /// Check for a drop target at `point`; later calls in the same frame replace it.
    pub fn request_drop_check(&mut self, point: Point) -> bool {
        self.pending.drop_check = Some(point);
        self.request_frame()
    }

    fn request_frame(&mut self) -> bool {
        if self.requested {
            false
        } else {
            self.requested = true;
            true
        }
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Take all pending work. Called at the start of the frame tick.
    pub fn take(&mut self) -> FrameWork {
        self.requested = false;
        std::mem::take(&mut self.pending)
    }

    /// Drop a pending drop-target check, e.g. when the drag ends first.
    pub fn cancel_drop_check(&mut self) {
        self.pending.drop_check = None;
    }
}
