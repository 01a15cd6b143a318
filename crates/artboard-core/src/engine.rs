//! Host-facing facade.
//!
//! The host forwards raw events and commands here and acts on the returned
//! [`Action`] list: repaint, persist, set the cursor, capture the pointer or
//! schedule a frame tick.

use kurbo::{Point, Rect, Size};

use crate::camera::Camera;
use crate::canvas::{Canvas, DocumentSnapshot};
use crate::config::EngineConfig;
use crate::controller::{InteractionController, emit};
use crate::element::{Element, ElementId, ElementPatch};
use crate::geometry::LayoutMeasure;
use crate::input::{Key, Modifiers, MouseButton, TouchPoint, WheelDelta};
use crate::interaction::InteractionState;
use crate::snap::SnapLine;
use crate::widget::CursorHint;

/// Side effects the host should carry out after a call.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    RenderNeeded,
    /// The element tree changed; persist it if needed.
    DocumentChanged,
    SetCursor(CursorHint),
    CapturePointer,
    ReleasePointer,
    /// Call [`Engine::on_frame`] on the next animation frame.
    RequestFrame,
    SelectionChanged(Option<ElementId>),
}

/// Canvas state plus the interaction controller driving it.
pub struct Engine {
    canvas: Canvas,
    controller: InteractionController,
    measure: Option<Box<dyn LayoutMeasure>>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Engine {
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            canvas: Canvas::new(config),
            controller: InteractionController::new(),
            measure: None,
        }
    }

    /// Start from an existing document without recording history.
    #[must_use]
    pub fn with_elements(config: EngineConfig, elements: impl IntoIterator<Item = Element>) -> Self {
        Self {
            canvas: Canvas::with_elements(config, elements),
            controller: InteractionController::new(),
            measure: None,
        }
    }

    // --- queries ---

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn element(&self, id: &ElementId) -> Option<&Element> {
        self.canvas.tree.get(id)
    }

    /// Children of `parent` (root when `None`) in sibling order.
    pub fn children(&self, parent: Option<&ElementId>) -> Vec<&Element> {
        self.canvas.tree.children(parent)
    }

    pub fn resolve_rect(&self, id: &ElementId) -> Option<Rect> {
        self.canvas.resolve_rect(id)
    }

    pub fn camera(&self) -> &Camera {
        &self.canvas.camera
    }

    pub fn interaction_state(&self) -> InteractionState {
        self.controller.state()
    }

    pub fn snap_lines(&self) -> &[SnapLine] {
        self.controller.snap_lines()
    }

    pub fn selected_id(&self) -> Option<&ElementId> {
        self.canvas.widgets.selected()
    }

    pub fn editing_id(&self) -> Option<&ElementId> {
        self.canvas.widgets.editing()
    }

    pub fn hovered_id(&self) -> Option<&ElementId> {
        self.canvas.widgets.hovered()
    }

    pub fn cursor(&self) -> CursorHint {
        self.controller.cursor()
    }

    pub fn can_undo(&self) -> bool {
        self.canvas.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.canvas.can_redo()
    }

    pub fn document_snapshot(&self) -> DocumentSnapshot {
        self.canvas.document_snapshot()
    }

    // --- commands ---

    /// Insert elements. Rejected ones are logged and skipped.
    pub fn add_elements(&mut self, elements: Vec<Element>) -> Vec<Action> {
        let count = elements.len();
        let errors = self.canvas.add_elements(elements);
        if errors.len() == count {
            return Vec::new();
        }
        self.document_changed(Vec::new())
    }

    pub fn update_element(&mut self, id: &ElementId, patch: &ElementPatch) -> Vec<Action> {
        if !self.canvas.update_element(id, patch) {
            return Vec::new();
        }
        self.document_changed(Vec::new())
    }

    pub fn remove_element(&mut self, id: &ElementId) -> Vec<Action> {
        let mut actions = Vec::new();
        let subtree = self.canvas.tree.subtree(id);
        if self
            .controller
            .gesture_target()
            .is_some_and(|target| subtree.contains(target))
        {
            actions.extend(self.controller.cancel(&mut self.canvas));
        }

        let had_selection = self.canvas.widgets.selected().is_some();
        let removed = self.canvas.remove_element(id);
        if removed.is_empty() {
            return actions;
        }
        if had_selection && self.canvas.widgets.selected().is_none() {
            actions.push(Action::SelectionChanged(None));
        }
        self.document_changed(actions)
    }

    /// Select an element, or clear the selection with `None`.
    pub fn set_selected_id(&mut self, id: Option<ElementId>) -> Vec<Action> {
        if id.as_ref().is_some_and(|id| !self.canvas.tree.contains(id)) {
            return Vec::new();
        }
        if !self.canvas.widgets.select(id.clone()) {
            return Vec::new();
        }
        vec![Action::SelectionChanged(id), Action::RenderNeeded]
    }

    /// Start in-place editing of an element, or stop with `None`.
    ///
    /// Editing selects the element. While it lasts, keyboard shortcuts
    /// are left to the host's editor.
    pub fn set_editing_id(&mut self, id: Option<ElementId>) -> Vec<Action> {
        if self.canvas.widgets.editing() == id.as_ref() {
            return Vec::new();
        }
        let Some(id) = id else {
            self.canvas.widgets.exit_editing();
            return vec![Action::RenderNeeded];
        };
        if !self.canvas.tree.contains(&id) {
            return Vec::new();
        }

        let mut actions = self.controller.cancel(&mut self.canvas);
        let selection_changed = !self.canvas.widgets.is_selected(&id);
        self.canvas.widgets.enter_editing(id.clone());
        if selection_changed {
            actions.push(Action::SelectionChanged(Some(id)));
        }
        emit(&mut actions, Action::RenderNeeded);
        actions
    }

    pub fn set_hovered_element_id(&mut self, id: Option<ElementId>) -> Vec<Action> {
        if id.as_ref().is_some_and(|id| !self.canvas.tree.contains(id)) {
            return Vec::new();
        }
        if self.canvas.widgets.set_hovered(id) {
            vec![Action::RenderNeeded]
        } else {
            Vec::new()
        }
    }

    pub fn undo(&mut self) -> Vec<Action> {
        let actions = self.controller.cancel(&mut self.canvas);
        if !self.canvas.undo() {
            return actions;
        }
        self.restored(actions)
    }

    pub fn redo(&mut self) -> Vec<Action> {
        let actions = self.controller.cancel(&mut self.canvas);
        if !self.canvas.redo() {
            return actions;
        }
        self.restored(actions)
    }

    /// Copy an element's subtree next to it and select the copy.
    pub fn duplicate_subtree(&mut self, id: &ElementId) -> Vec<Action> {
        match self.canvas.duplicate_subtree(id) {
            Some(copy) => self.document_changed(vec![Action::SelectionChanged(Some(copy))]),
            None => Vec::new(),
        }
    }

    pub fn reparent(&mut self, id: &ElementId, parent: Option<&ElementId>) -> Vec<Action> {
        match self.canvas.reparent(id, parent) {
            Ok(true) => self.document_changed(Vec::new()),
            Ok(false) => Vec::new(),
            Err(error) => {
                log::warn!("Reparent of {id} ignored: {error}");
                Vec::new()
            }
        }
    }

    pub fn reorder(&mut self, id: &ElementId, parent: Option<&ElementId>, index: usize) -> Vec<Action> {
        match self.canvas.reorder(id, parent, index) {
            Ok(()) => self.document_changed(Vec::new()),
            Err(error) => {
                log::warn!("Reorder of {id} ignored: {error}");
                Vec::new()
            }
        }
    }

    pub fn fit_to_view(&mut self) -> Vec<Action> {
        self.canvas.fit_to_view();
        let mut actions = vec![Action::RenderNeeded];
        self.controller.request_measure(&mut actions);
        actions
    }

    pub fn set_viewport_size(&mut self, size: Size) -> Vec<Action> {
        self.canvas.set_viewport_size(size);
        let mut actions = vec![Action::RenderNeeded];
        self.controller.request_measure(&mut actions);
        actions
    }

    /// Install the renderer's layout access and schedule a measurement.
    pub fn set_layout_measure(&mut self, measure: Box<dyn LayoutMeasure>) -> Vec<Action> {
        self.measure = Some(measure);
        let mut actions = Vec::new();
        self.controller.request_measure(&mut actions);
        actions
    }

    /// Replace the whole document. Any gesture is cancelled first.
    pub fn load_document(&mut self, snapshot: DocumentSnapshot) -> Vec<Action> {
        let mut actions = self.controller.cancel(&mut self.canvas);
        self.canvas.load_document(snapshot);
        actions.push(Action::SelectionChanged(None));
        self.document_changed(actions)
    }

    /// Abandon the current gesture without committing a drop.
    pub fn reset_interaction(&mut self) -> Vec<Action> {
        self.controller.cancel(&mut self.canvas)
    }

    /// Release everything the engine holds on the host.
    pub fn teardown(&mut self) -> Vec<Action> {
        let actions = self.controller.cancel(&mut self.canvas);
        self.measure = None;
        log::debug!("Engine torn down");
        actions
    }

    // --- events ---

    pub fn pointer_down(&mut self, point: Point, button: MouseButton, modifiers: Modifiers) -> Vec<Action> {
        let actions = self
            .controller
            .pointer_down(&mut self.canvas, point, button, modifiers);
        self.settle(actions)
    }

    pub fn pointer_move(&mut self, point: Point) -> Vec<Action> {
        let actions = self.controller.pointer_move(&mut self.canvas, point);
        self.settle(actions)
    }

    pub fn pointer_up(&mut self, point: Point) -> Vec<Action> {
        let actions = self.controller.pointer_up(&mut self.canvas, point);
        self.settle(actions)
    }

    pub fn pointer_cancel(&mut self) -> Vec<Action> {
        self.controller.pointer_cancel(&mut self.canvas)
    }

    pub fn touch_start(&mut self, touches: &[TouchPoint]) -> Vec<Action> {
        let actions = self.controller.touch_start(&mut self.canvas, touches);
        self.settle(actions)
    }

    pub fn touch_move(&mut self, touches: &[TouchPoint]) -> Vec<Action> {
        let actions = self.controller.touch_move(&mut self.canvas, touches);
        self.settle(actions)
    }

    pub fn touch_end(&mut self, remaining: &[TouchPoint]) -> Vec<Action> {
        let actions = self.controller.touch_end(&mut self.canvas, remaining);
        self.settle(actions)
    }

    pub fn touch_cancel(&mut self) -> Vec<Action> {
        self.controller.touch_cancel(&mut self.canvas)
    }

    pub fn wheel(&mut self, point: Point, delta: WheelDelta, modifiers: Modifiers) -> Vec<Action> {
        let actions = self
            .controller
            .wheel(&mut self.canvas, point, delta, modifiers);
        self.settle(actions)
    }

    pub fn key_down(&mut self, key: &Key, modifiers: Modifiers) -> Vec<Action> {
        let actions = self.controller.key_down(&mut self.canvas, key, modifiers);
        self.settle(actions)
    }

    /// Run deferred measurement and drop-target probing.
    pub fn on_frame(&mut self) -> Vec<Action> {
        self.controller
            .on_frame(&mut self.canvas, self.measure.as_deref())
    }

    // --- helpers ---

    fn document_changed(&mut self, mut actions: Vec<Action>) -> Vec<Action> {
        emit(&mut actions, Action::DocumentChanged);
        emit(&mut actions, Action::RenderNeeded);
        self.controller.request_measure(&mut actions);
        actions
    }

    fn restored(&mut self, mut actions: Vec<Action>) -> Vec<Action> {
        actions.push(Action::SelectionChanged(self.canvas.widgets.selected().cloned()));
        self.document_changed(actions)
    }

    /// Layout depends on the document and on the view.
    fn settle(&mut self, mut actions: Vec<Action>) -> Vec<Action> {
        if actions.contains(&Action::DocumentChanged) {
            self.controller.request_measure(&mut actions);
        }
        actions
    }
}
