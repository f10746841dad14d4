//! Hit testing: stage-container point → scene target.
//!
//! Walks the draw layer in reverse paint order (topmost first), then falls
//! back to the background image, then to the bare stage.

use crate::coverage::Prepared;
use annota_core::{HitTarget, NodeId, Point, Rect, Scene};

/// Slack around outlines, in node-local units, so thin strokes stay clickable.
pub const HIT_TOLERANCE: f64 = 3.0;

/// Find what is under `point`.
///
/// Closed shapes are hit on their whole area; open polylines only near
/// their stroke.
pub fn hit_test(scene: &Scene, point: Point) -> HitTarget {
    let layer = &scene.draw_layer;
    let to_container = scene.draw_layer_affine();

    for idx in layer.paint_order().into_iter().rev() {
        let Some(prepared) = Prepared::new(layer, idx, to_container) else {
            continue;
        };
        let local = prepared.to_local(point);
        if !prepared.may_cover(local) {
            continue;
        }
        let half = prepared.style().stroke_width / 2.0 + HIT_TOLERANCE;
        if prepared.covers_area(local) || prepared.covers_outline(local, half) {
            let node = prepared.node;
            log::trace!("hit {} at {point:?}", node.id);
            return HitTarget::Node {
                id: node.id,
                name: node.name.clone(),
            };
        }
    }

    let image_local = scene.image_affine().inverse() * point;
    if scene.image_layer.element.local_rect().contains(image_local) {
        return HitTarget::Image;
    }
    HitTarget::Stage
}

/// Every annotation whose stage-container bounding box intersects `rect`.
/// Useful for eraser- or marquee-style tools.
pub fn nodes_in_rect(scene: &Scene, rect: Rect) -> Vec<NodeId> {
    let layer = &scene.draw_layer;
    let to_container = scene.draw_layer_affine();

    layer
        .paint_order()
        .into_iter()
        .filter_map(|idx| {
            let node = &layer.graph[idx];
            let local = node.local_bounds()?;
            let bbox = (to_container * layer.node_affine(idx)).transform_rect_bbox(local);
            (bbox.intersect(rect).area() > 0.0).then_some(node.id)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use annota_core::model::{Node, NodeKind, Transform};
    use annota_core::RgbaImage;
    use std::sync::Arc;

    fn scene() -> Scene {
        Scene::fitted(Arc::new(RgbaImage::new(100, 100)), 200.0, 200.0, 100, 100, 1.0)
    }

    fn rect(id: &str, x: f64, y: f64) -> Node {
        Node::new(
            NodeId::intern(id),
            NodeKind::Rect {
                width: 20.0,
                height: 20.0,
            },
        )
        .with_name("rect")
        .with_transform(Transform::at(x, y))
    }

    #[test]
    fn topmost_node_wins() {
        let mut scene = scene();
        scene.draw_layer.add(rect("ht_low", 60.0, 60.0));
        scene.draw_layer.add(rect("ht_high", 70.0, 70.0));

        let hit = hit_test(&scene, Point::new(75.0, 75.0));
        assert_eq!(hit.node_id(), Some(NodeId::intern("ht_high")));
        assert_eq!(hit.shape_name(), Some("rect"));

        let hit = hit_test(&scene, Point::new(62.0, 62.0));
        assert_eq!(hit.node_id(), Some(NodeId::intern("ht_low")));
    }

    #[test]
    fn falls_back_to_image_then_stage() {
        let scene = scene();
        // Image is centered: occupies [50, 150]².
        assert_eq!(hit_test(&scene, Point::new(100.0, 100.0)), HitTarget::Image);
        assert_eq!(hit_test(&scene, Point::new(10.0, 10.0)), HitTarget::Stage);
    }

    #[test]
    fn open_line_is_hit_only_near_stroke() {
        let mut scene = scene();
        scene.draw_layer.add(Node::new(
            NodeId::intern("ht_line"),
            NodeKind::Line {
                points: vec![(0.0, 0.0), (100.0, 100.0)],
                closed: false,
            },
        ));
        assert_eq!(
            hit_test(&scene, Point::new(50.0, 51.0)).node_id(),
            Some(NodeId::intern("ht_line"))
        );
        assert_eq!(hit_test(&scene, Point::new(80.0, 60.0)), HitTarget::Image);
    }

    #[test]
    fn hits_follow_layer_zoom() {
        let mut scene = scene();
        scene.draw_layer.add(rect("ht_zoomed", 0.0, 0.0));
        scene.draw_layer.transform.set_scale(2.0);
        assert_eq!(
            hit_test(&scene, Point::new(38.0, 38.0)).node_id(),
            Some(NodeId::intern("ht_zoomed"))
        );
    }

    #[test]
    fn rect_query_collects_intersections() {
        let mut scene = scene();
        scene.draw_layer.add(rect("nr_a", 0.0, 0.0));
        scene.draw_layer.add(rect("nr_b", 100.0, 100.0));
        let found = nodes_in_rect(&scene, Rect::new(10.0, 10.0, 50.0, 50.0));
        assert_eq!(found, vec![NodeId::intern("nr_a")]);
    }
}
