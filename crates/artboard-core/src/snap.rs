//! Alignment snapping against the artboard and peer rects.

use kurbo::{Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Snap distance in artboard units.
pub const DEFAULT_SNAP_THRESHOLD: f64 = 6.0;

/// Axis a guide line marks a position on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    /// An x position, drawn as a vertical line.
    X,
    /// A y position, drawn as a horizontal line.
    Y,
}

/// Alignment guide in artboard space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SnapLine {
    pub axis: Axis,
    /// Position along `axis`.
    pub position: f64,
    /// Extent on the cross axis.
    pub from: f64,
    pub to: f64,
}

/// Correction to apply to a moving rect, plus guides to draw.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapResult {
    pub dx: f64,
    pub dy: f64,
    pub lines: Vec<SnapLine>,
}

impl SnapResult {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_snapped(&self) -> bool {
        !self.lines.is_empty()
    }

    pub fn offset(&self) -> Vec2 {
        Vec2::new(self.dx, self.dy)
    }
}

/// Which edges of the moving rect may snap on one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapEdges {
    pub min: bool,
    pub mid: bool,
    pub max: bool,
}

impl SnapEdges {
    pub const ALL: Self = Self { min: true, mid: true, max: true };
    pub const NONE: Self = Self { min: false, mid: false, max: false };
    pub const MIN: Self = Self { min: true, mid: false, max: false };
    pub const MAX: Self = Self { min: false, mid: false, max: true };

    fn is_empty(self) -> bool {
        !(self.min || self.mid || self.max)
    }
}

/// Snap a moving rect against the artboard bounds and peers.
///
/// Every edge and the center of `candidate` are considered on both axes.
pub fn compute_snap(candidate: Rect, artboard: Size, peers: &[Rect], threshold: f64) -> SnapResult {
    compute_snap_edges(candidate, SnapEdges::ALL, SnapEdges::ALL, artboard, peers, threshold)
}

/// Snap with a restricted set of candidate edges per axis.
///
/// Used while resizing, where only the edges under the handle move. An
/// axis with no candidate edges is never corrected.
pub fn compute_snap_edges(
    candidate: Rect,
    x_edges: SnapEdges,
    y_edges: SnapEdges,
    artboard: Size,
    peers: &[Rect],
    threshold: f64,
) -> SnapResult {
    let x_targets = targets(0.0, artboard.width, peers.iter().map(|r| (r.x0, r.x1)));
    let y_targets = targets(0.0, artboard.height, peers.iter().map(|r| (r.y0, r.y1)));

    let x_match = best_match(&x_targets, &candidates(candidate.x0, candidate.x1, x_edges), threshold);
    let y_match = best_match(&y_targets, &candidates(candidate.y0, candidate.y1, y_edges), threshold);

    let dx = x_match.map_or(0.0, |(_, delta)| delta);
    let dy = y_match.map_or(0.0, |(_, delta)| delta);
    let corrected = candidate + Vec2::new(dx, dy);

    let mut lines = Vec::new();
    if let Some((position, _)) = x_match {
        let (from, to) = span(
            corrected.y0,
            corrected.y1,
            artboard.height,
            peers.iter().map(|r| (r.y0, r.y1)),
        );
        lines.push(SnapLine { axis: Axis::X, position, from, to });
    }
    if let Some((position, _)) = y_match {
        let (from, to) = span(
            corrected.x0,
            corrected.x1,
            artboard.width,
            peers.iter().map(|r| (r.x0, r.x1)),
        );
        lines.push(SnapLine { axis: Axis::Y, position, from, to });
    }

    SnapResult { dx, dy, lines }
}

/// Artboard start/center/end, then each peer's min/center/max, in order.
fn targets(start: f64, end: f64, peers: impl Iterator<Item = (f64, f64)>) -> Vec<f64> {
    let mut values = vec![start, (start + end) / 2.0, end];
    for (min, max) in peers {
        values.extend([min, (min + max) / 2.0, max]);
    }
    values
}

fn candidates(min: f64, max: f64, edges: SnapEdges) -> Vec<f64> {
    if edges.is_empty() {
        return Vec::new();
    }
    let mut values = Vec::with_capacity(3);
    if edges.min {
        values.push(min);
    }
    if edges.mid {
        values.push((min + max) / 2.0);
    }
    if edges.max {
        values.push(max);
    }
    values
}

/// Closest (target, delta) pair within threshold.
///
/// Only a strictly closer pair replaces the current best, so ties keep
/// the earliest target.
fn best_match(targets: &[f64], candidates: &[f64], threshold: f64) -> Option<(f64, f64)> {
    let mut best: Option<(f64, f64)> = None;
    for &target in targets {
        for &candidate in candidates {
            let delta = target - candidate;
            if delta.abs() > threshold {
                continue;
            }
            let closer = match best {
                Some((_, best_delta)) => delta.abs() < best_delta.abs(),
                None => true,
            };
            if closer {
                best = Some((target, delta));
            }
        }
    }
    best
}

fn span(
    min: f64,
    max: f64,
    artboard_extent: f64,
    peers: impl Iterator<Item = (f64, f64)>,
) -> (f64, f64) {
    peers.fold(
        (min.min(0.0), max.max(artboard_extent)),
        |(from, to), (peer_min, peer_max)| (from.min(peer_min), to.max(peer_max)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artboard() -> Size {
        Size::new(1000.0, 100.0)
    }

    #[test]
    fn test_sibling_edge_snap() {
        let r1 = Rect::new(0.0, 0.0, 100.0, 100.0);
        let proposed = Rect::new(104.0, 0.0, 204.0, 100.0);

        let result = compute_snap(proposed, artboard(), &[r1], DEFAULT_SNAP_THRESHOLD);

        assert!((result.dx + 4.0).abs() < f64::EPSILON);
        let vertical: Vec<&SnapLine> = result.lines.iter().filter(|l| l.axis == Axis::X).collect();
        assert_eq!(vertical.len(), 1);
        assert!((vertical[0].position - 100.0).abs() < f64::EPSILON);
        assert!((vertical[0].from - 0.0).abs() < f64::EPSILON);
        assert!((vertical[0].to - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_exact_alignment_is_idempotent() {
        let peer = Rect::new(200.0, 300.0, 260.0, 340.0);
        let moving = Rect::new(260.0, 500.0, 300.0, 520.0);
        let artboard = Size::new(2000.0, 2000.0);

        let result = compute_snap(moving, artboard, &[peer], DEFAULT_SNAP_THRESHOLD);
        assert_eq!(result.dx, 0.0);
        assert_eq!(result.dy, 0.0);
        assert_eq!(result.lines.len(), 1);
        assert_eq!(result.lines[0].axis, Axis::X);
        assert_eq!(result.lines[0].position, 260.0);
    }

    #[test]
    fn test_threshold_boundary() {
        let peer = Rect::new(0.0, 500.0, 100.0, 600.0);
        let artboard = Size::new(5000.0, 5000.0);

        let at_threshold = Rect::new(106.0, 700.0, 150.0, 800.0);
        let result = compute_snap(at_threshold, artboard, &[peer], 6.0);
        assert!((result.dx + 6.0).abs() < f64::EPSILON);

        let beyond = Rect::new(107.0, 700.0, 151.0, 800.0);
        let result = compute_snap(beyond, artboard, &[peer], 6.0);
        assert_eq!(result.dx, 0.0);
        assert!(result.lines.iter().all(|line| line.axis != Axis::X));
    }

    #[test]
    fn test_ties_keep_first_target() {
        // Artboard start (0) and peer max (10) are both 5 away from x0=5.
        let peer = Rect::new(-20.0, 400.0, 10.0, 420.0);
        let moving = Rect::new(5.0, 700.0, 45.0, 720.0);
        let result = compute_snap(moving, Size::new(3000.0, 3000.0), &[peer], 6.0);
        assert!((result.dx + 5.0).abs() < f64::EPSILON);
        assert_eq!(result.lines[0].position, 0.0);
    }

    #[test]
    fn test_center_alignment_with_artboard() {
        let moving = Rect::new(452.0, 900.0, 552.0, 950.0);
        let result = compute_snap(moving, Size::new(1000.0, 3000.0), &[], 6.0);
        assert!((result.dx + 2.0).abs() < f64::EPSILON);
        assert_eq!(result.lines[0].position, 500.0);
    }

    #[test]
    fn test_masked_edges_only_snap_moving_side() {
        let peer = Rect::new(300.0, 800.0, 400.0, 900.0);
        // Left edge sits 3 away from the artboard start but is fixed.
        let resized = Rect::new(3.0, 2000.0, 297.0, 2050.0);
        let result = compute_snap_edges(
            resized,
            SnapEdges::MAX,
            SnapEdges::NONE,
            Size::new(4000.0, 4000.0),
            &[peer],
            6.0,
        );
        assert!((result.dx - 3.0).abs() < f64::EPSILON);
        assert_eq!(result.dy, 0.0);
        assert_eq!(result.lines.len(), 1);
        assert_eq!(result.lines[0].position, 300.0);
    }

    #[test]
    fn test_no_targets_in_range() {
        let result = compute_snap(
            Rect::new(123.0, 457.0, 171.0, 489.0),
            Size::new(1000.0, 1000.0),
            &[Rect::new(700.0, 700.0, 800.0, 800.0)],
            6.0,
        );
        assert_eq!(result, SnapResult::none());
        assert!(!result.is_snapped());
    }
}
