//! Canvas state and discrete document edits.

use std::collections::{HashMap, HashSet};

use kurbo::{Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

use crate::camera::Camera;
use crate::config::EngineConfig;
use crate::element::{Element, ElementId, ElementPatch, FlexDirection};
use crate::geometry::{GeometryResolver, LayoutMeasure};
use crate::history::{HistoryEntry, HistoryManager};
use crate::tree::{ElementTree, TreeError};
use crate::widget::WidgetManager;

/// Serializable view of the document for persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSnapshot {
    /// Elements in insertion order.
    pub elements: Vec<Element>,
    pub camera: Camera,
    pub artboard: Size,
}

impl DocumentSnapshot {
    /// Serialize the document to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize a document from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// The canvas: element tree, view and UI state.
///
/// The tree and camera are the only state shared between the host and the
/// interaction controller. Every edit made through the methods here
/// records exactly one history snapshot before it mutates the tree.
#[derive(Debug, Clone)]
pub struct Canvas {
    pub tree: ElementTree,
    pub camera: Camera,
    pub history: HistoryManager,
    /// Selection, hover and editing state.
    pub widgets: WidgetManager,
    pub geometry: GeometryResolver,
    pub config: EngineConfig,
    pub viewport_size: Size,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Canvas {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            tree: ElementTree::new(),
            camera: Camera::with_limits(config.min_zoom, config.max_zoom),
            history: HistoryManager::new(config.max_history),
            widgets: WidgetManager::new(),
            geometry: GeometryResolver::new(),
            viewport_size: Size::new(800.0, 600.0),
            config,
        }
    }

    /// Create a canvas with existing elements. Nothing is recorded in history.
    pub fn with_elements(config: EngineConfig, elements: impl IntoIterator<Item = Element>) -> Self {
        let mut canvas = Self::new(config);
        canvas.tree = ElementTree::from_elements(elements);
        canvas
    }

    pub fn artboard(&self) -> Size {
        self.config.artboard
    }

    pub fn artboard_rect(&self) -> Rect {
        Rect::from_origin_size(Point::ZERO, self.config.artboard)
    }

    pub fn set_viewport_size(&mut self, size: Size) {
        self.viewport_size = size;
    }

    /// Fit the artboard into the viewport.
    pub fn fit_to_view(&mut self) {
        let bounds = self.artboard_rect();
        self.camera
            .fit_to_bounds(bounds, self.viewport_size, self.config.fit_padding);
    }

    // --- geometry ---

    /// Artboard rect of an element: analytic, else last measured.
    pub fn resolve_rect(&self, id: &ElementId) -> Option<Rect> {
        self.geometry.resolve(&self.tree, id)
    }

    /// Re-measure flow-positioned elements. Only call from the frame tick.
    pub fn refresh_measurements(&mut self, measure: &dyn LayoutMeasure) -> usize {
        self.geometry
            .refresh(&self.tree, measure, self.config.artboard, self.camera.zoom)
    }

    /// Whether the renderer, not the stored offset, positions this element.
    pub fn is_flow_positioned(&self, id: &ElementId) -> bool {
        self.tree
            .parent_of(id)
            .and_then(|parent| self.tree.get(parent))
            .is_some_and(|parent| parent.props.display.is_flow())
    }

    /// Visible itself and through every ancestor.
    pub fn is_effectively_visible(&self, id: &ElementId) -> bool {
        self.tree.get(id).is_some_and(|element| element.visible)
            && self.tree.ancestors(id).iter().all(|ancestor| ancestor.visible)
    }

    /// Topmost visible, unlocked element containing an artboard point.
    pub fn hit_test(&self, point: Point) -> Option<ElementId> {
        self.tree
            .paint_order()
            .into_iter()
            .rev()
            .filter(|element| !element.locked && self.is_effectively_visible(&element.id))
            .find(|element| {
                self.resolve_rect(&element.id)
                    .is_some_and(|rect| rect.contains(point))
            })
            .map(|element| element.id.clone())
    }

    /// Topmost container under a point that may receive a drop.
    pub fn drop_target_at(&self, point: Point, exclude: &HashSet<ElementId>) -> Option<ElementId> {
        self.tree
            .paint_order()
            .into_iter()
            .rev()
            .filter(|element| element.is_container() && !element.locked)
            .filter(|element| !exclude.contains(&element.id))
            .filter(|element| self.is_effectively_visible(&element.id))
            .find(|element| {
                self.resolve_rect(&element.id)
                    .is_some_and(|rect| rect.contains(point))
            })
            .map(|element| element.id.clone())
    }

    /// Where a dragged element would land among a flex container's children.
    ///
    /// The first sibling whose midpoint on the flow axis lies past the
    /// pointer; the end of the list when there is none.
    pub fn insertion_index(&self, parent: &ElementId, point: Point, dragged: &ElementId) -> usize {
        let direction = self
            .tree
            .get(parent)
            .map(|element| element.props.flex_direction)
            .unwrap_or_default();
        let siblings: Vec<&Element> = self
            .tree
            .children(Some(parent))
            .into_iter()
            .filter(|sibling| &sibling.id != dragged)
            .collect();

        for (position, sibling) in siblings.iter().enumerate() {
            let Some(rect) = self.resolve_rect(&sibling.id) else {
                continue;
            };
            let center = rect.center();
            let past = match direction {
                FlexDirection::Row => center.x > point.x,
                FlexDirection::Column => center.y > point.y,
            };
            if past {
                return position;
            }
        }
        siblings.len()
    }

    /// Visible children of `parent` with a known rect, minus `exclude`.
    pub fn peer_rects(&self, parent: Option<&ElementId>, exclude: &HashSet<ElementId>) -> Vec<Rect> {
        self.tree
            .children(parent)
            .into_iter()
            .filter(|element| element.visible && !exclude.contains(&element.id))
            .filter_map(|element| self.resolve_rect(&element.id))
            .collect()
    }

    // --- history ---

    /// Record the current state before a change.
    pub fn record_history(&mut self) {
        self.history
            .snapshot(HistoryEntry::new(self.tree.clone(), self.camera.clone()));
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Restore the tree from the last snapshot. The view is left alone.
    pub fn undo(&mut self) -> bool {
        let current = HistoryEntry::new(self.tree.clone(), self.camera.clone());
        match self.history.undo(current) {
            Some(entry) => {
                self.tree = entry.tree;
                self.after_restore();
                log::info!("Undo: {} elements", self.tree.len());
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        let current = HistoryEntry::new(self.tree.clone(), self.camera.clone());
        match self.history.redo(current) {
            Some(entry) => {
                self.tree = entry.tree;
                self.after_restore();
                log::info!("Redo: {} elements", self.tree.len());
                true
            }
            None => false,
        }
    }

    fn after_restore(&mut self) {
        let stale: Vec<ElementId> = [self.widgets.selected(), self.widgets.hovered(), self.widgets.editing()]
            .into_iter()
            .flatten()
            .filter(|id| !self.tree.contains(id))
            .cloned()
            .collect();
        self.widgets.forget(&stale);
        self.geometry.clear();
    }

    // --- discrete edits ---

    /// Insert elements as one undoable edit.
    ///
    /// Nothing is recorded when every element is rejected.
    pub fn add_elements(&mut self, elements: Vec<Element>) -> Vec<TreeError> {
        let before = HistoryEntry::new(self.tree.clone(), self.camera.clone());
        let count_before = self.tree.len();
        let errors = self.tree.add(elements);
        for error in &errors {
            log::warn!("Rejected element: {error}");
        }
        if self.tree.len() > count_before {
            self.history.snapshot(before);
        }
        errors
    }

    /// Apply a patch as one undoable edit. Invalid sizes reject the patch.
    pub fn update_element(&mut self, id: &ElementId, patch: &ElementPatch) -> bool {
        if !self.tree.contains(id) || patch.is_empty() {
            return false;
        }
        if !patch.is_valid() {
            log::warn!("Rejected update of {id}: negative or non-finite geometry");
            return false;
        }
        self.record_history();
        self.tree.update(id, patch)
    }

    /// Remove an element with its subtree and drop every UI reference to it.
    pub fn remove_element(&mut self, id: &ElementId) -> Vec<ElementId> {
        if !self.tree.contains(id) {
            return Vec::new();
        }
        self.record_history();
        let removed = self.tree.remove(id);
        self.widgets.forget(&removed);
        self.geometry.forget(&removed);
        log::info!("Removed {} element(s) under {id}", removed.len());
        removed
    }

    /// Move an element under a new parent, keeping it where it appears.
    ///
    /// Returns `Ok(false)` when `parent` already is the element's parent.
    pub fn reparent(&mut self, id: &ElementId, parent: Option<&ElementId>) -> Result<bool, TreeError> {
        self.tree.validate_move(id, parent)?;
        if self.tree.parent_of(id) == parent {
            return Ok(false);
        }
        self.record_history();
        self.move_keeping_position(id, parent)?;
        Ok(true)
    }

    /// Move an element to a sibling position under a parent.
    pub fn reorder(&mut self, id: &ElementId, parent: Option<&ElementId>, index: usize) -> Result<(), TreeError> {
        self.tree.validate_move(id, parent)?;
        self.record_history();
        self.reorder_keeping_position(id, parent, index)
    }

    /// Clone an element and its subtree with fresh ids.
    ///
    /// The copy is offset, placed right after the original among its
    /// siblings, and selected.
    pub fn duplicate_subtree(&mut self, id: &ElementId) -> Option<ElementId> {
        let original = self.tree.get(id)?.clone();

        let mut ids = vec![id.clone()];
        ids.extend(self.tree.descendants(id));
        let mapping: HashMap<ElementId, ElementId> =
            ids.iter().map(|old| (old.clone(), ElementId::new())).collect();

        let offset = self.config.duplicate_offset;
        let mut copies = Vec::with_capacity(ids.len());
        for old in &ids {
            let (Some(element), Some(new_id)) = (self.tree.get(old), mapping.get(old)) else {
                continue;
            };
            let mut copy = element.clone();
            copy.id = new_id.clone();
            if old == id {
                copy.parent_id = original.parent_id.clone();
                copy.props.x += offset;
                copy.props.y += offset;
            } else {
                copy.parent_id = element
                    .parent_id
                    .as_ref()
                    .and_then(|parent| mapping.get(parent))
                    .cloned();
            }
            copies.push(copy);
        }

        let new_id = mapping.get(id)?.clone();
        self.record_history();
        self.tree.add(copies);
        if let Err(error) = self.tree.insert_after(&new_id, id) {
            log::warn!("Could not place duplicate of {id}: {error}");
        }
        self.widgets.select(Some(new_id.clone()));
        log::info!("Duplicated {id} as {new_id} ({} element(s))", ids.len());
        Some(new_id)
    }

    /// Shift an absolutely positioned, unlocked element.
    pub fn nudge(&mut self, id: &ElementId, delta: Vec2) -> bool {
        let Some(element) = self.tree.get(id) else {
            return false;
        };
        if element.locked || self.is_flow_positioned(id) {
            return false;
        }
        let patch = ElementPatch::position(element.props.x + delta.x, element.props.y + delta.y);
        self.record_history();
        self.tree.update(id, &patch)
    }

    // --- structural moves used inside gestures (no history) ---

    /// Reparent, rewriting the offset so the artboard position is unchanged.
    pub(crate) fn move_keeping_position(
        &mut self,
        id: &ElementId,
        parent: Option<&ElementId>,
    ) -> Result<(), TreeError> {
        let before = self.resolve_rect(id);
        self.tree.reparent(id, parent)?;
        self.restore_position(id, before);
        Ok(())
    }

    pub(crate) fn reorder_keeping_position(
        &mut self,
        id: &ElementId,
        parent: Option<&ElementId>,
        index: usize,
    ) -> Result<(), TreeError> {
        let before = self.resolve_rect(id);
        self.tree.reorder(id, parent, index)?;
        self.restore_position(id, before);
        Ok(())
    }

    fn restore_position(&mut self, id: &ElementId, before: Option<Rect>) {
        if self.is_flow_positioned(id) {
            return;
        }
        let Some(before) = before else {
            return;
        };
        let parent_origin = match self.tree.parent_of(id).cloned() {
            None => Some(Point::ZERO),
            Some(parent) => self.resolve_rect(&parent).map(|rect| rect.origin()),
        };
        if let Some(origin) = parent_origin {
            let local = before.origin() - origin;
            self.tree.update(id, &ElementPatch::position(local.x, local.y));
        }
    }

    /// Pull a flow child out to the root at its measured rect.
    ///
    /// Auto sizes become the measured size so the element resolves
    /// analytically from now on.
    pub(crate) fn detach_to_root(&mut self, id: &ElementId, measured: Rect) -> Result<(), TreeError> {
        self.tree.reparent(id, None)?;
        let Some(element) = self.tree.get(id) else {
            return Err(TreeError::NotFound(id.clone()));
        };
        let mut patch = ElementPatch::position(measured.x0, measured.y0);
        if element.props.width.is_auto() {
            patch.width = Some(measured.width().into());
        }
        if element.props.height.is_auto() {
            patch.height = Some(measured.height().into());
        }
        self.tree.update(id, &patch);
        Ok(())
    }

    // --- persistence ---

    pub fn document_snapshot(&self) -> DocumentSnapshot {
        DocumentSnapshot {
            elements: self.tree.elements().into_iter().cloned().collect(),
            camera: self.camera.clone(),
            artboard: self.config.artboard,
        }
    }

    /// Replace the whole document. History and UI state are reset.
    ///
    /// Zoom limits always come from the config. A stored zoom outside them
    /// is clamped; an unusable one falls back to fit-to-view.
    pub fn load_document(&mut self, snapshot: DocumentSnapshot) {
        let DocumentSnapshot {
            elements,
            camera,
            artboard,
        } = snapshot;

        self.tree = ElementTree::from_elements(elements);
        if artboard.width.is_finite() && artboard.width > 0.0 && artboard.height.is_finite() && artboard.height > 0.0
        {
            self.config.artboard = artboard;
        } else {
            log::warn!("Ignoring stored artboard size {artboard:?}");
        }
        self.history.clear();
        self.widgets = WidgetManager::new();
        self.geometry.clear();

        self.camera = Camera::with_limits(self.config.min_zoom, self.config.max_zoom);
        let offset_ok = camera.offset.x.is_finite() && camera.offset.y.is_finite();
        if camera.zoom.is_finite() && camera.zoom > 0.0 && offset_ok {
            self.camera.offset = camera.offset;
            self.camera.zoom = camera.zoom.clamp(self.config.min_zoom, self.config.max_zoom);
        } else {
            log::warn!("Stored camera is unusable (zoom {}), fitting to view", camera.zoom);
            self.fit_to_view();
        }
        log::info!("Loaded document with {} elements", self.tree.len());
    }
}
