//! Per-node geometry prepared once per pass and queried per point.
//!
//! Hit testing and compositing ask the same two questions of a node:
//! is this point inside it, and is it on its outline. Both are answered in
//! node-local coordinates through the inverse of the node's full transform.

use annota_core::model::{Layer, Node, NodeKind, Style};
use annota_core::NodeIndex;
use kurbo::{Affine, BezPath, ParamCurveNearest, PathSeg, Point, Rect, Shape};

const NEAREST_ACCURACY: f64 = 1e-3;

pub(crate) struct Prepared<'a> {
    pub node: &'a Node,
    /// Stage-container → node-local.
    inverse: Affine,
    outline: Option<BezPath>,
    segments: Vec<PathSeg>,
    /// Local bounds, inflated by the stroke so the cheap reject is safe.
    bounds: Rect,
}

impl<'a> Prepared<'a> {
    /// Prepare the node at `idx`; `layer_to_container` maps layer-local
    /// coordinates to the stage container.
    pub fn new(layer: &'a Layer, idx: NodeIndex, layer_to_container: Affine) -> Option<Self> {
        let node = &layer.graph[idx];
        if matches!(node.kind, NodeKind::Root | NodeKind::Group) {
            return None;
        }
        let affine = layer_to_container * layer.node_affine(idx);
        if affine.determinant().abs() < f64::EPSILON {
            return None;
        }
        let outline = node.outline();
        let segments = outline
            .as_ref()
            .map(|p| p.segments().collect())
            .unwrap_or_default();
        let bounds = node.local_bounds()?;
        let pad = node.style.stroke_width / 2.0 + crate::hit::HIT_TOLERANCE;

        Some(Self {
            node,
            inverse: affine.inverse(),
            outline,
            segments,
            bounds: bounds.inflate(pad, pad),
        })
    }

    pub fn style(&self) -> &Style {
        &self.node.style
    }

    pub fn to_local(&self, p: Point) -> Point {
        self.inverse * p
    }

    pub fn may_cover(&self, local: Point) -> bool {
        self.bounds.contains(local)
    }

    /// Point lies inside the closed area of the node.
    pub fn covers_area(&self, local: Point) -> bool {
        if let NodeKind::Text { .. } = self.node.kind {
            return self.node.local_bounds().is_some_and(|b| b.contains(local));
        }
        self.node.is_area() && self.outline.as_ref().is_some_and(|p| p.contains(local))
    }

    /// Point lies within `half_width` of the outline.
    pub fn covers_outline(&self, local: Point, half_width: f64) -> bool {
        if half_width <= 0.0 {
            return false;
        }
        let limit = half_width * half_width;
        self.segments
            .iter()
            .any(|seg| seg.nearest(local, NEAREST_ACCURACY).distance_sq <= limit)
    }

    /// Text boxes have no outline of their own; glyphs are the backend's job.
    pub fn is_text(&self) -> bool {
        matches!(self.node.kind, NodeKind::Text { .. })
    }
}
