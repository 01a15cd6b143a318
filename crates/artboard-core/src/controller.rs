//! Pointer, touch, wheel and keyboard handling.
//!
//! The controller turns raw host events into camera moves and tree edits.
//! At most one gesture owns the pointer at a time; it lives in
//! `InteractionController::gesture` and is taken out on every exit path
//! (release, cancel, reset), so nothing about it can outlive the gesture.

use std::collections::HashSet;

use kurbo::{Point, Vec2};

use crate::canvas::Canvas;
use crate::element::{Dimension, Display, ElementId, ElementPatch};
use crate::engine::Action;
use crate::geometry::LayoutMeasure;
use crate::input::{Key, Modifiers, MouseButton, TouchPoint, WheelDelta, pinch_metrics};
use crate::interaction::{DragState, Gesture, InteractionMode, InteractionState, PinchState, ResizeState};
use crate::scheduler::FrameScheduler;
use crate::snap::{SnapLine, compute_snap, compute_snap_edges};
use crate::widget::{CursorHint, ResizeHandle, hit_test_handles};

/// Push an action unless an identical one is already queued.
pub(crate) fn emit(actions: &mut Vec<Action>, action: Action) {
    if !actions.contains(&action) {
        actions.push(action);
    }
}

/// Interaction state machine: idle, panning, dragging or resizing.
#[derive(Debug, Default)]
pub struct InteractionController {
    gesture: Option<Gesture>,
    /// Drop target found by the last frame check.
    hovered_parent: Option<ElementId>,
    insert_index: Option<usize>,
    snap_lines: Vec<SnapLine>,
    scheduler: FrameScheduler,
    pointer_captured: bool,
    cursor: CursorHint,
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> InteractionState {
        let (mode, active_id) = match &self.gesture {
            Some(gesture) => (gesture.mode(), gesture.active_id().cloned()),
            None => (InteractionMode::Idle, None),
        };
        InteractionState {
            mode,
            active_id,
            hovered_parent_id: self.hovered_parent.clone(),
            insert_index: self.insert_index,
        }
    }

    pub fn snap_lines(&self) -> &[SnapLine] {
        &self.snap_lines
    }

    /// Element the current gesture would write to, started or not.
    pub(crate) fn gesture_target(&self) -> Option<&ElementId> {
        self.gesture.as_ref().and_then(Gesture::target_id)
    }

    pub fn cursor(&self) -> CursorHint {
        self.cursor
    }

    /// Ask for layout measurement on the next frame.
    pub fn request_measure(&mut self, actions: &mut Vec<Action>) {
        if self.scheduler.request_measure() {
            emit(actions, Action::RequestFrame);
        }
    }

    // --- pointer ---

    pub fn pointer_down(
        &mut self,
        canvas: &mut Canvas,
        point: Point,
        button: MouseButton,
        modifiers: Modifiers,
    ) -> Vec<Action> {
        let mut actions = Vec::new();
        if self.gesture.is_some() {
            return actions;
        }
        match button {
            MouseButton::Middle => self.start_pan(point, &mut actions),
            MouseButton::Left if modifiers.shift => self.start_pan(point, &mut actions),
            MouseButton::Left => self.press_primary(canvas, point, &mut actions),
            MouseButton::Right => {}
        }
        actions
    }

    pub fn pointer_move(&mut self, canvas: &mut Canvas, point: Point) -> Vec<Action> {
        let mut actions = Vec::new();
        if self.gesture.is_some() {
            self.move_gesture(canvas, point, &mut actions);
        } else {
            self.update_hover(canvas, point, &mut actions);
        }
        actions
    }

    pub fn pointer_up(&mut self, canvas: &mut Canvas, _point: Point) -> Vec<Action> {
        let mut actions = Vec::new();
        self.end_gesture(canvas, true, &mut actions);
        actions
    }

    pub fn pointer_cancel(&mut self, canvas: &mut Canvas) -> Vec<Action> {
        self.cancel(canvas)
    }

    /// End any gesture without committing a pending reparent or reorder.
    ///
    /// Writes already applied during the gesture stay in place.
    pub fn cancel(&mut self, canvas: &mut Canvas) -> Vec<Action> {
        let mut actions = Vec::new();
        self.end_gesture(canvas, false, &mut actions);
        actions
    }

    // --- touch ---

    /// `touches` holds every contact currently down.
    pub fn touch_start(&mut self, canvas: &mut Canvas, touches: &[TouchPoint]) -> Vec<Action> {
        let mut actions = Vec::new();
        // A live drag or resize keeps the pointer; extra fingers are ignored.
        let manipulating = match &self.gesture {
            Some(Gesture::Dragging(drag)) => drag.started,
            Some(Gesture::Resizing(_)) => true,
            _ => false,
        };
        match touches {
            [] => {}
            [touch] if self.gesture.is_none() => {
                self.press_primary(canvas, touch.position, &mut actions);
            }
            [_, _, ..] if !manipulating => self.start_pinch(touches, &mut actions),
            _ => {}
        }
        actions
    }

    pub fn touch_move(&mut self, canvas: &mut Canvas, touches: &[TouchPoint]) -> Vec<Action> {
        let mut actions = Vec::new();
        if let Some(Gesture::Pinching(pinch)) = &mut self.gesture {
            if let Some((midpoint, distance)) = pinch_metrics(touches) {
                canvas.camera.pan_by(midpoint - pinch.last_midpoint);
                if pinch.last_distance > 0.0 && distance > 0.0 {
                    canvas.camera.zoom_at(midpoint, distance / pinch.last_distance);
                }
                pinch.last_midpoint = midpoint;
                pinch.last_distance = distance;
                emit(&mut actions, Action::RenderNeeded);
            }
        } else if let Some(touch) = touches.first() {
            self.move_gesture(canvas, touch.position, &mut actions);
        }
        actions
    }

    /// `remaining` holds the contacts still down after the change.
    pub fn touch_end(&mut self, canvas: &mut Canvas, remaining: &[TouchPoint]) -> Vec<Action> {
        let mut actions = Vec::new();
        let pinching = matches!(self.gesture, Some(Gesture::Pinching(_)));
        match remaining {
            [] => self.end_gesture(canvas, true, &mut actions),
            [touch] if pinching => {
                self.gesture = Some(Gesture::Panning {
                    last_screen: touch.position,
                });
            }
            _ if pinching => self.start_pinch(remaining, &mut actions),
            _ => {}
        }
        actions
    }

    pub fn touch_cancel(&mut self, canvas: &mut Canvas) -> Vec<Action> {
        self.cancel(canvas)
    }

    // --- wheel & keys ---

    /// Plain scroll pans; scroll with ctrl/cmd zooms around the cursor.
    pub fn wheel(
        &mut self,
        canvas: &mut Canvas,
        point: Point,
        delta: WheelDelta,
        modifiers: Modifiers,
    ) -> Vec<Action> {
        if modifiers.command() {
            let factor = (-delta.y * canvas.config.wheel_zoom_speed).exp();
            canvas.camera.zoom_at(point, factor);
        } else {
            canvas.camera.pan_by(-delta);
        }
        vec![Action::RenderNeeded]
    }

    pub fn key_down(&mut self, canvas: &mut Canvas, key: &Key, modifiers: Modifiers) -> Vec<Action> {
        if *key == Key::Escape && self.gesture.is_some() {
            return self.cancel(canvas);
        }
        // The in-place editor owns the keyboard.
        if canvas.widgets.is_editing() {
            if *key == Key::Escape {
                canvas.widgets.exit_editing();
                return vec![Action::RenderNeeded];
            }
            return Vec::new();
        }
        if *key == Key::Escape {
            let mut actions = Vec::new();
            if canvas.widgets.clear_selection() {
                actions.push(Action::SelectionChanged(None));
                actions.push(Action::RenderNeeded);
            }
            return actions;
        }
        if self.gesture.is_some() {
            return Vec::new();
        }

        let mut actions = Vec::new();
        let selected = canvas.widgets.selected().cloned();
        let changed = match (key.character(), modifiers.command()) {
            (Some('z'), true) if modifiers.shift => canvas.redo(),
            (Some('z'), true) => canvas.undo(),
            (Some('y'), true) => canvas.redo(),
            (Some('d'), true) => match selected {
                Some(id) => {
                    let copy = canvas.duplicate_subtree(&id);
                    if copy.is_some() {
                        actions.push(Action::SelectionChanged(copy));
                    }
                    !actions.is_empty()
                }
                None => false,
            },
            _ => match (key, selected) {
                (Key::Delete | Key::Backspace, Some(id)) => {
                    let removed = canvas.remove_element(&id);
                    if !removed.is_empty() {
                        actions.push(Action::SelectionChanged(None));
                    }
                    !removed.is_empty()
                }
                (_, Some(id)) => match key.arrow_direction() {
                    Some(direction) => {
                        let step = if modifiers.shift {
                            canvas.config.nudge_step_large
                        } else {
                            canvas.config.nudge_step
                        };
                        canvas.nudge(&id, direction * step)
                    }
                    None => false,
                },
                _ => false,
            },
        };

        if changed {
            emit(&mut actions, Action::DocumentChanged);
            emit(&mut actions, Action::RenderNeeded);
            self.request_measure(&mut actions);
        }
        actions
    }

    // --- frame tick ---

    /// Drain deferred work: layout measurement, then the drop-target check.
    pub fn on_frame(&mut self, canvas: &mut Canvas, measure: Option<&dyn LayoutMeasure>) -> Vec<Action> {
        let mut actions = Vec::new();
        let work = self.scheduler.take();

        if work.measure {
            if let Some(measure) = measure {
                let count = canvas.refresh_measurements(measure);
                log::debug!("Measured {count} flow-positioned element(s)");
                emit(&mut actions, Action::RenderNeeded);

                // A drag may be waiting for its element to be measured.
                let waiting = match &self.gesture {
                    Some(Gesture::Dragging(drag)) if !drag.started => Some(drag.current_screen),
                    _ => None,
                };
                if let Some(point) = waiting {
                    self.move_gesture(canvas, point, &mut actions);
                }
            }
        }

        if let Some(point) = work.drop_check {
            self.resolve_drop_target(canvas, point, &mut actions);
        }
        actions
    }

    // --- gesture internals ---

    fn start_pan(&mut self, point: Point, actions: &mut Vec<Action>) {
        self.gesture = Some(Gesture::Panning { last_screen: point });
        self.capture(actions);
        self.set_cursor(CursorHint::Grab, actions);
    }

    fn start_pinch(&mut self, touches: &[TouchPoint], actions: &mut Vec<Action>) {
        let Some((midpoint, distance)) = pinch_metrics(touches) else {
            return;
        };
        self.gesture = Some(Gesture::Pinching(PinchState {
            last_midpoint: midpoint,
            last_distance: distance,
        }));
        self.capture(actions);
    }

    /// Left button or single touch: resize handle, element, or background.
    fn press_primary(&mut self, canvas: &mut Canvas, point: Point, actions: &mut Vec<Action>) {
        if let Some((id, handle)) = self.handle_at(canvas, point) {
            self.start_resize(canvas, id, handle, point, actions);
            return;
        }

        let artboard_point = canvas.camera.screen_to_artboard(point);
        match canvas.hit_test(artboard_point) {
            Some(id) => {
                if canvas.widgets.select(Some(id.clone())) {
                    actions.push(Action::SelectionChanged(Some(id.clone())));
                    emit(actions, Action::RenderNeeded);
                }
                let Some(element) = canvas.tree.get(&id) else {
                    return;
                };
                let start_position = Point::new(element.props.x, element.props.y);
                let subtree = canvas.tree.subtree(&id);
                log::debug!("Press on {id}, drag pending");
                self.gesture = Some(Gesture::Dragging(DragState::new(
                    id,
                    point,
                    start_position,
                    subtree,
                )));
                self.capture(actions);
            }
            None => {
                if canvas.widgets.clear_selection() {
                    actions.push(Action::SelectionChanged(None));
                    emit(actions, Action::RenderNeeded);
                }
                self.start_pan(point, actions);
            }
        }
    }

    /// Resize handle of the selected element under a screen point.
    fn handle_at(&self, canvas: &Canvas, point: Point) -> Option<(ElementId, ResizeHandle)> {
        let id = canvas.widgets.selected()?;
        let element = canvas.tree.get(id)?;
        if element.locked || !canvas.is_effectively_visible(id) {
            return None;
        }
        let rect = canvas.camera.artboard_rect_to_screen(canvas.resolve_rect(id)?);
        let handle = hit_test_handles(rect, point, canvas.config.handle_hit_tolerance)?;
        Some((id.clone(), handle))
    }

    fn start_resize(
        &mut self,
        canvas: &Canvas,
        id: ElementId,
        handle: ResizeHandle,
        point: Point,
        actions: &mut Vec<Action>,
    ) {
        let (Some(element), Some(start_rect)) = (canvas.tree.get(&id), canvas.resolve_rect(&id)) else {
            return;
        };
        log::debug!("Resize {id} from {handle:?}");
        self.gesture = Some(Gesture::Resizing(ResizeState {
            start_position: Point::new(element.props.x, element.props.y),
            id,
            handle,
            start_screen: point,
            current_screen: point,
            start_rect,
            recorded: false,
        }));
        self.capture(actions);
        self.set_cursor(handle.cursor(), actions);
    }

    fn move_gesture(&mut self, canvas: &mut Canvas, point: Point, actions: &mut Vec<Action>) {
        let Some(mut gesture) = self.gesture.take() else {
            return;
        };
        match &mut gesture {
            Gesture::Panning { last_screen } => {
                canvas.camera.pan_by(point - *last_screen);
                *last_screen = point;
                emit(actions, Action::RenderNeeded);
            }
            Gesture::Pinching(_) => {}
            Gesture::Dragging(drag) => self.drag_to(canvas, drag, point, actions),
            Gesture::Resizing(resize) => self.resize_to(canvas, resize, point, actions),
        }
        self.gesture = Some(gesture);
    }

    fn drag_to(&mut self, canvas: &mut Canvas, drag: &mut DragState, point: Point, actions: &mut Vec<Action>) {
        drag.current_screen = point;
        if !drag.started {
            if drag.screen_delta().hypot() < canvas.config.drag_threshold {
                return;
            }
            if !self.begin_drag(canvas, drag, actions) {
                return;
            }
        }

        let delta = drag.screen_delta() / canvas.camera.zoom;
        self.snap_lines.clear();
        let mut correction = Vec2::ZERO;
        if let Some(start_rect) = drag.start_rect {
            let parent = canvas.tree.parent_of(&drag.id).cloned();
            let peers = canvas.peer_rects(parent.as_ref(), &drag.subtree);
            let snap = compute_snap(
                start_rect + delta,
                canvas.artboard(),
                &peers,
                canvas.config.snap_threshold,
            );
            correction = snap.offset();
            self.snap_lines = snap.lines;
        }

        // Offsets are parent-relative, so moving the root carries the subtree.
        let target = drag.start_position + delta + correction;
        canvas
            .tree
            .update_many(&[(drag.id.clone(), ElementPatch::position(target.x, target.y))]);

        if self.scheduler.request_drop_check(point) {
            emit(actions, Action::RequestFrame);
        }
        emit(actions, Action::DocumentChanged);
        emit(actions, Action::RenderNeeded);
    }

    /// First real movement: record history and detach flow children.
    ///
    /// Returns false while a flow child still waits for its measurement.
    fn begin_drag(&mut self, canvas: &mut Canvas, drag: &mut DragState, actions: &mut Vec<Action>) -> bool {
        if !canvas.tree.contains(&drag.id) {
            log::debug!("Drag target {} no longer exists", drag.id);
            return false;
        }
        if canvas.is_flow_positioned(&drag.id) {
            let Some(measured) = canvas.resolve_rect(&drag.id) else {
                log::debug!("Drag of {} waiting for measurement", drag.id);
                self.request_measure(actions);
                return false;
            };
            canvas.record_history();
            if let Err(error) = canvas.detach_to_root(&drag.id, measured) {
                log::warn!("Could not detach {}: {error}", drag.id);
                return false;
            }
            drag.start_position = measured.origin();
            drag.start_rect = Some(measured);
            log::debug!("Detached flow child {} at {:?}", drag.id, measured.origin());
        } else {
            canvas.record_history();
            drag.start_rect = canvas.resolve_rect(&drag.id);
        }
        drag.started = true;
        self.set_cursor(CursorHint::Move, actions);
        log::debug!("Drag started for {}", drag.id);
        true
    }

    fn resize_to(&mut self, canvas: &mut Canvas, resize: &mut ResizeState, point: Point, actions: &mut Vec<Action>) {
        resize.current_screen = point;
        let delta = resize.screen_delta() / canvas.camera.zoom;
        if !canvas.tree.contains(&resize.id) {
            return;
        }
        if !resize.recorded {
            if delta == Vec2::ZERO {
                return;
            }
            canvas.record_history();
            resize.recorded = true;
        }

        let handle = resize.handle;
        let min_size = canvas.config.min_size;
        let mut rect = handle.apply(resize.start_rect, delta, min_size);

        self.snap_lines.clear();
        if canvas.tree.parent_of(&resize.id).is_none() {
            let exclude = HashSet::from([resize.id.clone()]);
            let peers = canvas.peer_rects(None, &exclude);
            let snap = compute_snap_edges(
                rect,
                handle.x_edges(),
                handle.y_edges(),
                canvas.artboard(),
                &peers,
                canvas.config.snap_threshold,
            );
            if handle.moves_left() {
                rect.x0 += snap.dx;
            } else if handle.moves_right() {
                rect.x1 += snap.dx;
            }
            if handle.moves_top() {
                rect.y0 += snap.dy;
            } else if handle.moves_bottom() {
                rect.y1 += snap.dy;
            }
            rect = handle.clamp(rect, min_size);
            self.snap_lines = snap.lines;
        }

        let mut patch = ElementPatch::default();
        if handle.moves_left() || handle.moves_right() {
            patch.width = Some(Dimension::Px(rect.width()));
        }
        if handle.moves_top() || handle.moves_bottom() {
            patch.height = Some(Dimension::Px(rect.height()));
        }
        if !canvas.is_flow_positioned(&resize.id) {
            patch.x = Some(resize.start_position.x + rect.x0 - resize.start_rect.x0);
            patch.y = Some(resize.start_position.y + rect.y0 - resize.start_rect.y0);
        }
        canvas.tree.update_many(&[(resize.id.clone(), patch)]);

        self.request_measure(actions);
        emit(actions, Action::DocumentChanged);
        emit(actions, Action::RenderNeeded);
    }

    fn resolve_drop_target(&mut self, canvas: &Canvas, point: Point, actions: &mut Vec<Action>) {
        let Some(Gesture::Dragging(drag)) = &self.gesture else {
            return;
        };
        if !drag.started {
            return;
        }
        let artboard_point = canvas.camera.screen_to_artboard(point);
        let target = canvas.drop_target_at(artboard_point, &drag.subtree);
        let insert_index = target
            .as_ref()
            .filter(|target| {
                canvas
                    .tree
                    .get(target)
                    .is_some_and(|element| element.props.display == Display::Flex)
            })
            .map(|target| canvas.insertion_index(target, artboard_point, &drag.id));

        if target != self.hovered_parent || insert_index != self.insert_index {
            emit(actions, Action::RenderNeeded);
        }
        self.hovered_parent = target;
        self.insert_index = insert_index;
    }

    /// Leave the current gesture. `commit` applies a pending drop.
    fn end_gesture(&mut self, canvas: &mut Canvas, commit: bool, actions: &mut Vec<Action>) {
        let Some(gesture) = self.gesture.take() else {
            return;
        };
        if let Gesture::Dragging(drag) = &gesture {
            if drag.started && commit {
                self.commit_drop(canvas, &drag.id, actions);
            } else if drag.started {
                log::debug!("Drag of {} cancelled", drag.id);
            }
        }

        self.snap_lines.clear();
        self.hovered_parent = None;
        self.insert_index = None;
        self.scheduler.cancel_drop_check();
        if self.pointer_captured {
            self.pointer_captured = false;
            actions.push(Action::ReleasePointer);
        }
        self.set_cursor(CursorHint::Default, actions);
        emit(actions, Action::RenderNeeded);
    }

    fn commit_drop(&mut self, canvas: &mut Canvas, id: &ElementId, actions: &mut Vec<Action>) {
        let result = match (self.hovered_parent.clone(), self.insert_index) {
            (Some(target), Some(index)) => canvas.reorder_keeping_position(id, Some(&target), index),
            (Some(target), None) => canvas.move_keeping_position(id, Some(&target)),
            (None, _) => canvas.move_keeping_position(id, None),
        };
        match result {
            Ok(()) => {
                log::debug!(
                    "Dropped {id} into {:?} at {:?}",
                    canvas.tree.parent_of(id),
                    self.insert_index
                );
                emit(actions, Action::DocumentChanged);
                self.request_measure(actions);
            }
            Err(error) => log::warn!("Drop of {id} ignored: {error}"),
        }
    }

    fn update_hover(&mut self, canvas: &mut Canvas, point: Point, actions: &mut Vec<Action>) {
        let hovered = canvas.hit_test(canvas.camera.screen_to_artboard(point));
        let cursor = match (self.handle_at(canvas, point), &hovered) {
            (Some((_, handle)), _) => handle.cursor(),
            (None, Some(_)) => CursorHint::Move,
            (None, None) => CursorHint::Default,
        };
        if canvas.widgets.set_hovered(hovered) {
            emit(actions, Action::RenderNeeded);
        }
        self.set_cursor(cursor, actions);
    }

    fn capture(&mut self, actions: &mut Vec<Action>) {
        if !self.pointer_captured {
            self.pointer_captured = true;
            actions.push(Action::CapturePointer);
        }
    }

    fn set_cursor(&mut self, cursor: CursorHint, actions: &mut Vec<Action>) {
        if self.cursor != cursor {
            self.cursor = cursor;
            actions.push(Action::SetCursor(cursor));
        }
    }
}
