//! Coordinate and viewport math.
//!
//! - **Fit**: initial scale so the image fits the container without ever
//!   upscaling, plus the pixel ratio that recovers native resolution on export.
//! - **Wheel zoom**: zoom-to-cursor on the stage transform.
//! - **Pan**: free drag of the stage, or of both layers together.
//! - **Layer zoom**: programmatic zoom of the image and draw layers about a
//!   fixed pivot, independent of the stage transform.

use crate::model::Transform;
use crate::scene::Scene;
use kurbo::{Point, Rect, Vec2};

/// Result of fitting an image into a container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fit {
    pub scale: f64,
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub pixel_ratio: f64,
}

/// `scale = min(cw/iw, ch/ih, 1)`, canvas = `round(natural * scale)`,
/// `pixel_ratio = 1/scale`.
pub fn fit_to_container(
    container_width: f64,
    container_height: f64,
    image_width: u32,
    image_height: u32,
) -> Result<Fit, String> {
    if image_width == 0 || image_height == 0 {
        return Err(format!(
            "image has no pixels ({image_width}x{image_height})"
        ));
    }
    if !(container_width > 0.0 && container_height > 0.0) {
        return Err(format!(
            "container must have a positive size, got {container_width}x{container_height}"
        ));
    }

    let iw = f64::from(image_width);
    let ih = f64::from(image_height);
    let scale = (container_width / iw).min(container_height / ih).min(1.0);
    // Rounding can overshoot the container by a fraction of a pixel.
    let canvas_width = ((iw * scale).round() as u32).clamp(1, container_width.floor().max(1.0) as u32);
    let canvas_height =
        ((ih * scale).round() as u32).clamp(1, container_height.floor().max(1.0) as u32);

    Ok(Fit {
        scale,
        canvas_width,
        canvas_height,
        pixel_ratio: 1.0 / scale,
    })
}

/// Wheel input as seen by the zoom handler.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelStep {
    pub delta_y: f64,
    /// Set by browsers/OSes for trackpad pinch; inverts the direction.
    pub ctrl_key: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ZoomOutcome {
    Disabled,
    /// No pointer over the stage; the step was skipped.
    NoPointer,
    Zoomed { old_scale: f64, new_scale: f64 },
}

/// Stage-container point → stage content point.
pub fn content_point(stage: &Transform, pointer: Point) -> Point {
    stage.affine().inverse() * pointer
}

/// Zoom the stage one step toward or away from the pointer, keeping the
/// content point under the pointer fixed.
pub fn wheel_zoom(
    stage: &mut Transform,
    pointer: Option<Point>,
    step: WheelStep,
    zoom_ratio: f64,
    enabled: bool,
) -> ZoomOutcome {
    if !enabled || !(zoom_ratio.is_finite() && zoom_ratio > 0.0) {
        return ZoomOutcome::Disabled;
    }
    let Some(pointer) = pointer else {
        return ZoomOutcome::NoPointer;
    };

    let old_scale = stage.scale_x;
    let anchor = content_point(stage, pointer);

    let mut direction = if step.delta_y > 0.0 { 1.0 } else { -1.0 };
    if step.ctrl_key {
        direction = -direction;
    }
    let new_scale = if direction > 0.0 {
        old_scale * (1.0 + zoom_ratio)
    } else {
        old_scale / (1.0 + zoom_ratio)
    };

    stage.set_scale(new_scale);
    // position = pointer - scale * (anchor - offset)
    stage.x = pointer.x - new_scale * (anchor.x - stage.offset_x);
    stage.y = pointer.y - new_scale * (anchor.y - stage.offset_y);

    log::trace!("wheel zoom {old_scale:.4} -> {new_scale:.4} at {pointer:?}");
    ZoomOutcome::Zoomed {
        old_scale,
        new_scale,
    }
}

/// Translate a transform by a pointer delta.
pub fn pan(transform: &mut Transform, delta: Vec2) {
    transform.x += delta.x;
    transform.y += delta.y;
}

/// Scale `transform` by `factor` about `pivot` (in parent coordinates).
/// The content point at the pivot stays at the pivot.
pub fn zoom_about(transform: &mut Transform, pivot: Point, factor: f64) {
    let anchor = transform.affine().inverse() * pivot;
    transform.scale_x *= factor;
    transform.scale_y *= factor;
    transform.offset_x = anchor.x;
    transform.offset_y = anchor.y;
    transform.x = pivot.x;
    transform.y = pivot.y;
}

/// Programmatic zoom: scale the image and draw layers together about the
/// stage center.
pub fn zoom_layers(scene: &mut Scene, factor: f64) {
    let pivot = Point::new(scene.stage.width / 2.0, scene.stage.height / 2.0);
    zoom_about(&mut scene.image_layer.transform, pivot, factor);
    zoom_about(&mut scene.draw_layer.transform, pivot, factor);
    log::debug!(
        "layers zoomed by {factor:.3}, now {:.3}",
        scene.image_layer.transform.scale_x
    );
}

/// Region exported for the scene: the image element's client rect with a
/// negative origin and any overflow past the stage clipped away.
///
/// A fully off-stage image yields a zero-area rect rather than a negative one.
pub fn export_region(scene: &Scene) -> Rect {
    let client = scene.image_client_rect();
    let (mut x, mut y) = (client.x0, client.y0);
    let (mut width, mut height) = (client.width(), client.height());

    if x < 0.0 {
        width += x;
        x = 0.0;
    }
    if y < 0.0 {
        height += y;
        y = 0.0;
    }
    if x + width > scene.stage.width {
        width = scene.stage.width - x;
    }
    if y + height > scene.stage.height {
        height = scene.stage.height - y;
    }

    Rect::from_origin_size((x, y), (width.max(0.0), height.max(0.0)))
}
