//! Scene → RGBA raster, on the CPU.
//!
//! Samples a stage-container region at a pixel ratio: every output pixel
//! maps back to one container point, which is resolved against the image
//! element (nearest-neighbour from the native bitmap) and then against each
//! annotation in paint order (fill, then stroke, source-over).

use crate::coverage::Prepared;
use annota_core::{Color, Point, Rect, RgbaImage, Scene};
use image::{Pixel, Rgba};

fn rgba(color: Color) -> Rgba<u8> {
    Rgba(color.to_array())
}

/// Output size of `region` rendered at `pixel_ratio`, or `None` when the
/// region is degenerate.
pub fn output_size(region: Rect, pixel_ratio: f64) -> Option<(u32, u32)> {
    let w = (region.width() * pixel_ratio).round();
    let h = (region.height() * pixel_ratio).round();
    (w >= 1.0 && h >= 1.0).then_some((w as u32, h as u32))
}

/// Composite the part of the scene inside `region` (stage-container
/// coordinates) at `pixel_ratio`.
///
/// A zero-area region produces a single transparent pixel.
pub fn render_region(scene: &Scene, region: Rect, pixel_ratio: f64) -> RgbaImage {
    let Some((out_w, out_h)) = output_size(region, pixel_ratio) else {
        log::debug!("empty export region {region:?}, emitting 1x1 raster");
        return RgbaImage::new(1, 1);
    };

    let element = &scene.image_layer.element;
    let bitmap = &element.bitmap;
    let image_inverse = scene.image_affine().inverse();
    let (bw, bh) = (f64::from(bitmap.width()), f64::from(bitmap.height()));
    let has_pixels = bitmap.width() > 0 && bitmap.height() > 0;
    if !has_pixels {
        log::warn!("background bitmap is empty, rendering annotations only");
    }

    let layer = &scene.draw_layer;
    let to_container = scene.draw_layer_affine();
    let nodes: Vec<Prepared<'_>> = layer
        .paint_order()
        .into_iter()
        .filter_map(|idx| Prepared::new(layer, idx, to_container))
        .filter(|p| {
            if p.is_text() {
                // Glyph shaping needs a font context the CPU backend lacks.
                log::trace!("skipping text node {} in raster pass", p.node.id);
                return false;
            }
            true
        })
        .collect();

    log::trace!(
        "raster {out_w}x{out_h} from {region:?} at ratio {pixel_ratio}, {} nodes",
        nodes.len()
    );

    RgbaImage::from_fn(out_w, out_h, |px, py| {
        let p = Point::new(
            region.x0 + (f64::from(px) + 0.5) / pixel_ratio,
            region.y0 + (f64::from(py) + 0.5) / pixel_ratio,
        );
        let mut out = Rgba([0, 0, 0, 0]);

        let q = image_inverse * p;
        if has_pixels
            && q.x >= 0.0
            && q.y >= 0.0
            && q.x < element.width
            && q.y < element.height
        {
            let sx = ((q.x / element.width * bw) as u32).min(bitmap.width() - 1);
            let sy = ((q.y / element.height * bh) as u32).min(bitmap.height() - 1);
            out = *bitmap.get_pixel(sx, sy);
        }

        for node in &nodes {
            let local = node.to_local(p);
            if !node.may_cover(local) {
                continue;
            }
            let style = node.style();
            if let Some(fill) = style.fill
                && node.covers_area(local)
            {
                out.blend(&rgba(fill));
            }
            if style.stroke.a > 0 && node.covers_outline(local, style.stroke_width / 2.0) {
                out.blend(&rgba(style.stroke));
            }
        }
        out
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use annota_core::model::{Node, NodeKind, Style, Transform};
    use annota_core::NodeId;
    use std::sync::Arc;

    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

    /// 200×100 native image shown at half size in a 100×50 container.
    fn half_scale_scene() -> Scene {
        let bitmap = RgbaImage::from_fn(200, 100, |x, _| {
            if x < 100 { BLUE } else { Rgba([255, 255, 255, 255]) }
        });
        Scene::fitted(Arc::new(bitmap), 100.0, 50.0, 100, 50, 2.0)
    }

    #[test]
    fn pixel_ratio_recovers_native_resolution() {
        let scene = half_scale_scene();
        let img = render_region(&scene, Rect::new(0.0, 0.0, 100.0, 50.0), 2.0);
        assert_eq!(img.dimensions(), (200, 100));
        assert_eq!(*img.get_pixel(99, 50), BLUE);
        assert_eq!(*img.get_pixel(100, 50), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn filled_node_paints_over_image() {
        let mut scene = half_scale_scene();
        scene.draw_layer.add(
            Node::new(
                NodeId::intern("rs_fill"),
                NodeKind::Rect {
                    width: 10.0,
                    height: 10.0,
                },
            )
            .with_style(Style::filled(Color::rgba(0, 255, 0, 255)))
            .with_transform(Transform::at(20.0, 20.0)),
        );
        let img = render_region(&scene, Rect::new(0.0, 0.0, 100.0, 50.0), 1.0);
        assert_eq!(*img.get_pixel(25, 25), Rgba([0, 255, 0, 255]));
        assert_eq!(*img.get_pixel(5, 5), BLUE);
    }

    #[test]
    fn stroke_only_rect_leaves_interior_alone() {
        let mut scene = half_scale_scene();
        scene.draw_layer.add(
            Node::new(
                NodeId::intern("rs_stroke"),
                NodeKind::Rect {
                    width: 20.0,
                    height: 20.0,
                },
            )
            .with_style(Style::stroked(Color::rgba(255, 0, 0, 255), 2.0))
            .with_transform(Transform::at(10.0, 10.0)),
        );
        let img = render_region(&scene, Rect::new(0.0, 0.0, 100.0, 50.0), 1.0);
        assert_eq!(*img.get_pixel(10, 20), Rgba([255, 0, 0, 255]));
        assert_eq!(*img.get_pixel(20, 20), BLUE);
    }

    #[test]
    fn empty_region_yields_single_transparent_pixel() {
        let scene = half_scale_scene();
        let img = render_region(&scene, Rect::new(10.0, 10.0, 10.0, 40.0), 2.0);
        assert_eq!(img.dimensions(), (1, 1));
        assert_eq!(*img.get_pixel(0, 0), Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn empty_bitmap_renders_transparent_background() {
        let mut scene = half_scale_scene();
        scene.image_layer.element.bitmap = Arc::new(RgbaImage::new(0, 0));
        scene.draw_layer.add(
            Node::new(
                NodeId::intern("rs_empty_bg"),
                NodeKind::Rect {
                    width: 10.0,
                    height: 10.0,
                },
            )
            .with_style(Style::filled(Color::rgba(0, 255, 0, 255)))
            .with_transform(Transform::at(20.0, 20.0)),
        );
        let img = render_region(&scene, Rect::new(0.0, 0.0, 100.0, 50.0), 2.0);
        assert_eq!(img.dimensions(), (200, 100));
        assert_eq!(*img.get_pixel(10, 10), Rgba([0, 0, 0, 0]));
        assert_eq!(*img.get_pixel(50, 50), Rgba([0, 255, 0, 255]));
    }
}
