//! Crop: drag a region, then rebuild the editor around it.

use crate::params::DrawEventParams;
use crate::plugin::Plugin;
use annota_core::viewport::export_region;
use annota_core::{Color, Node, NodeId, NodeKind, Point, Rect, Style, Transform};
use annota_render::render_region;

/// Regions thinner than this (stage-container units) are treated as a
/// stray click.
const MIN_SIDE: f64 = 4.0;

/// The cropped result keeps the annotations drawn so far, baked into the
/// new background at native resolution.
#[derive(Debug, Default)]
pub struct CropPlugin {
    /// Drag origin in stage-container coordinates.
    start: Option<Point>,
    preview: Option<NodeId>,
}

impl CropPlugin {
    fn clear_preview(&mut self, params: &mut DrawEventParams<'_>) {
        if let Some(id) = self.preview.take() {
            params.draw_layer_mut().remove(id);
        }
    }

    fn update_preview(&mut self, params: &mut DrawEventParams<'_>, end: Point) {
        let Some(start) = self.start else {
            return;
        };
        let scene = params.scene();
        let a = scene.to_draw_layer(start);
        let b = scene.to_draw_layer(end);
        let kind = NodeKind::Rect {
            width: (b.x - a.x).abs(),
            height: (b.y - a.y).abs(),
        };
        let origin = Point::new(a.x.min(b.x), a.y.min(b.y));

        if let Some(id) = self.preview
            && let Some(node) = params.draw_layer_mut().get_mut(id)
        {
            node.kind = kind;
            node.transform.set_position(origin);
            return;
        }
        let id = NodeId::fresh("crop_preview");
        let node = Node::new(id, kind)
            .with_style(Style::stroked(Color::rgba(0x18, 0x90, 0xFF, 0xFF), 1.0))
            .with_transform(Transform::at(origin.x, origin.y));
        params.draw_layer_mut().add(node);
        self.preview = Some(id);
    }
}

impl Plugin for CropPlugin {
    fn name(&self) -> &str {
        "crop"
    }

    fn title(&self) -> Option<&str> {
        Some("Crop")
    }

    fn iconfont(&self) -> Option<&str> {
        Some("iconfont icon-crop")
    }

    fn on_draw_start(&mut self, params: &mut DrawEventParams<'_>) {
        self.clear_preview(params);
        self.start = params.pointer();
    }

    fn on_draw(&mut self, params: &mut DrawEventParams<'_>) {
        if let Some(end) = params.pointer() {
            self.update_preview(params, end);
        }
    }

    fn on_draw_end(&mut self, params: &mut DrawEventParams<'_>) {
        // The preview must not end up in the cropped pixels.
        self.clear_preview(params);
        let (Some(start), Some(end)) = (self.start.take(), params.pointer()) else {
            return;
        };
        let region = Rect::from_points(start, end).intersect(export_region(params.scene()));
        if region.width() < MIN_SIDE || region.height() < MIN_SIDE {
            log::debug!("crop region {region:?} too small, ignored");
            return;
        }

        let raster = render_region(params.scene(), region, params.pixel_ratio());
        let width = region.width().round() as u32;
        let height = region.height().round() as u32;
        if let Err(e) = params.reload(raster, width, height) {
            log::warn!("crop failed: {e}");
        }
    }

    fn on_leave(&mut self, params: &mut DrawEventParams<'_>) {
        self.clear_preview(params);
        self.start = None;
    }
}
