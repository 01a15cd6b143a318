//! Artboard-space geometry of elements.
//!
//! Elements placed with explicit offsets and sizes resolve analytically by
//! summing parent-relative offsets. Anything positioned by the renderer's
//! flow layout (flex/grid parents, auto sizes) can only be known by
//! measuring the rendered output, which happens once per frame through
//! [`LayoutMeasure`].

use std::collections::HashMap;

use kurbo::{Point, Rect, Size, Vec2};

use crate::element::ElementId;
use crate::tree::ElementTree;

/// Access to rendered layout boxes, in screen space.
pub trait LayoutMeasure {
    /// Rendered box of an element, if it is currently laid out.
    fn measure(&self, id: &ElementId) -> Option<Rect>;

    /// Rendered box of the artboard itself.
    fn artboard_box(&self) -> Option<Rect>;
}

/// Rect of `id` from stored offsets alone.
///
/// `None` when any ancestor lays out its children in flow, when a parent
/// link dangles, or when width or height is `Auto`.
pub fn resolve_analytic(tree: &ElementTree, id: &ElementId) -> Option<Rect> {
    let element = tree.get(id)?;
    let width = element.props.width.px()?;
    let height = element.props.height.px()?;

    let mut origin = Point::new(element.props.x, element.props.y);
    let mut depth = 0;
    let mut parent_id = element.parent_id.as_ref();
    while let Some(pid) = parent_id {
        // A longer chain than the tree has elements means a cycle.
        depth += 1;
        if depth > tree.len() {
            return None;
        }
        let parent = tree.get(pid)?;
        if parent.props.display.is_flow() {
            return None;
        }
        origin += Vec2::new(parent.props.x, parent.props.y);
        parent_id = parent.parent_id.as_ref();
    }

    Some(Rect::from_origin_size(origin, Size::new(width, height)))
}

/// Ratio between rendered pixels and artboard units.
///
/// Derived from the rendered artboard width, then height, then the camera
/// zoom when the rendered box is degenerate.
pub fn live_scale(artboard_box: Rect, artboard: Size, fallback: f64) -> f64 {
    if artboard.width > 0.0 && artboard_box.width() > 0.0 {
        artboard_box.width() / artboard.width
    } else if artboard.height > 0.0 && artboard_box.height() > 0.0 {
        artboard_box.height() / artboard.height
    } else {
        fallback
    }
}

/// Convert a rendered screen box into artboard space.
pub fn screen_box_to_artboard(node: Rect, artboard_box: Rect, scale: f64) -> Rect {
    let origin = Point::new(
        (node.x0 - artboard_box.x0) / scale,
        (node.y0 - artboard_box.y0) / scale,
    );
    Rect::from_origin_size(origin, Size::new(node.width() / scale, node.height() / scale))
}

/// Resolves element rects, falling back to the last frame's measurements.
#[derive(Debug, Clone, Default)]
pub struct GeometryResolver {
    measured: HashMap<ElementId, Rect>,
}

impl GeometryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Analytic rect if available, else the cached measurement.
    pub fn resolve(&self, tree: &ElementTree, id: &ElementId) -> Option<Rect> {
        resolve_analytic(tree, id).or_else(|| self.measured(id))
    }

    pub fn measured(&self, id: &ElementId) -> Option<Rect> {
        self.measured.get(id).copied()
    }

    /// Re-measure every element without an analytic rect.
    ///
    /// Must only run from the frame tick. Returns the number of elements
    /// that produced a measurement.
    pub fn refresh(
        &mut self,
        tree: &ElementTree,
        measure: &dyn LayoutMeasure,
        artboard: Size,
        camera_zoom: f64,
    ) -> usize {
        self.measured.clear();
        let Some(artboard_box) = measure.artboard_box() else {
            log::debug!("Artboard not laid out yet, skipping measurement");
            return 0;
        };
        let scale = live_scale(artboard_box, artboard, camera_zoom);
        if !(scale.is_finite() && scale > 0.0) {
            return 0;
        }

        for element in tree.iter() {
            if resolve_analytic(tree, &element.id).is_some() {
                continue;
            }
            if let Some(node) = measure.measure(&element.id) {
                self.measured
                    .insert(element.id.clone(), screen_box_to_artboard(node, artboard_box, scale));
            }
        }
        self.measured.len()
    }

    /// Drop cached measurements for removed elements.
    pub fn forget(&mut self, ids: &[ElementId]) {
        for id in ids {
            self.measured.remove(id);
        }
    }

    pub fn clear(&mut self) {
        self.measured.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Display, Element, ElementKind};

    struct FixedLayout {
        artboard: Rect,
        boxes: HashMap<ElementId, Rect>,
    }

    impl LayoutMeasure for FixedLayout {
        fn measure(&self, id: &ElementId) -> Option<Rect> {
            self.boxes.get(id).copied()
        }

        fn artboard_box(&self) -> Option<Rect> {
            Some(self.artboard)
        }
    }

    fn id(value: &str) -> ElementId {
        ElementId::from(value)
    }

    fn nested_tree() -> ElementTree {
        ElementTree::from_elements([
            Element::with_id("frame", ElementKind::Container).at(100.0, 50.0).sized(400.0, 300.0),
            Element::with_id("card", ElementKind::Container)
                .with_parent("frame")
                .at(20.0, 30.0)
                .sized(200.0, 100.0),
            Element::with_id("label", ElementKind::Text)
                .with_parent("card")
                .at(5.0, 5.0)
                .sized(50.0, 20.0),
            Element::with_id("row", ElementKind::Container)
                .with_parent("frame")
                .with_display(Display::Flex)
                .at(0.0, 200.0)
                .sized(400.0, 50.0),
            Element::with_id("chip", ElementKind::Button)
                .with_parent("row")
                .sized(60.0, 30.0),
            Element::with_id("auto", ElementKind::Text).at(10.0, 10.0),
        ])
    }

    #[test]
    fn test_analytic_sums_parent_offsets() {
        let tree = nested_tree();
        assert_eq!(
            resolve_analytic(&tree, &id("label")),
            Some(Rect::new(125.0, 85.0, 175.0, 105.0))
        );
        assert_eq!(
            resolve_analytic(&tree, &id("row")),
            Some(Rect::new(100.0, 250.0, 500.0, 300.0))
        );
    }

    #[test]
    fn test_analytic_none_for_flow_child_and_auto_size() {
        let tree = nested_tree();
        assert_eq!(resolve_analytic(&tree, &id("chip")), None);
        assert_eq!(resolve_analytic(&tree, &id("auto")), None);
        assert_eq!(resolve_analytic(&tree, &id("missing")), None);
    }

    #[test]
    fn test_analytic_none_for_dangling_parent() {
        let tree = ElementTree::from_elements([
            Element::with_id("orphan", ElementKind::Text).with_parent("ghost").sized(10.0, 10.0),
        ]);
        assert_eq!(resolve_analytic(&tree, &id("orphan")), None);
    }

    #[test]
    fn test_refresh_converts_screen_boxes() {
        let tree = nested_tree();
        let layout = FixedLayout {
            // Artboard of 1000 units rendered 500px wide at (40, 20).
            artboard: Rect::new(40.0, 20.0, 540.0, 420.0),
            boxes: HashMap::from([
                (id("chip"), Rect::new(90.0, 145.0, 120.0, 160.0)),
                (id("label"), Rect::new(0.0, 0.0, 1.0, 1.0)),
            ]),
        };
        let mut resolver = GeometryResolver::new();
        let count = resolver.refresh(&tree, &layout, Size::new(1000.0, 800.0), 1.0);

        // Analytic elements are not measured.
        assert_eq!(count, 1);
        assert_eq!(
            resolver.resolve(&tree, &id("chip")),
            Some(Rect::new(100.0, 250.0, 160.0, 280.0))
        );
        assert_eq!(
            resolver.resolve(&tree, &id("label")),
            Some(Rect::new(125.0, 85.0, 175.0, 105.0))
        );
    }

    #[test]
    fn test_live_scale_fallbacks() {
        let size = Size::new(1000.0, 500.0);
        assert!((live_scale(Rect::new(0.0, 0.0, 500.0, 250.0), size, 3.0) - 0.5).abs() < 1e-12);
        assert!((live_scale(Rect::new(0.0, 0.0, 0.0, 1000.0), size, 3.0) - 2.0).abs() < 1e-12);
        assert!((live_scale(Rect::ZERO, size, 3.0) - 3.0).abs() < 1e-12);
    }
}
