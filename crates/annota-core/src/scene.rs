//! The two-layer scene: a stage holding a fixed image layer beneath a
//! mutable annotation layer.
//!
//! A [`Scene`] is built once at mount and replaced as a whole on reload;
//! each build gets a new `generation` so deferred work can tell whether the
//! scene it captured is still the live one.

use crate::id::NodeId;
use crate::model::{Layer, Transform};
use image::RgbaImage;
use image::imageops::{self, FilterType};
use kurbo::{Affine, Point, Rect};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::sync::Arc;

// ─── Stage & input bindings ──────────────────────────────────────────────

/// Gesture classes the stage can have a handler bound for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GestureClass {
    /// `click` / `tap`.
    Click,
    /// `mousedown` / `touchstart`.
    PointerDown,
    /// `mousemove` / `touchmove`.
    PointerMove,
    /// `mouseup` / `touchend`.
    PointerUp,
    Wheel,
}

impl GestureClass {
    pub const ALL: [GestureClass; 5] = [
        GestureClass::Click,
        GestureClass::PointerDown,
        GestureClass::PointerMove,
        GestureClass::PointerUp,
        GestureClass::Wheel,
    ];
}

/// Handle of one bound handler. Handles are unique per stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Binding {
    gesture: GestureClass,
    handler: HandlerId,
}

/// Root transformable surface of the scene.
#[derive(Debug, Clone)]
pub struct Stage {
    pub width: f64,
    pub height: f64,
    pub transform: Transform,
    /// Multiplier from stage units to native image pixels.
    pub pixel_ratio: f64,
    pub draggable: bool,
    bindings: SmallVec<[Binding; 5]>,
    next_handler: u32,
}

impl Stage {
    pub fn new(width: f64, height: f64, pixel_ratio: f64) -> Self {
        Self {
            width,
            height,
            transform: Transform::IDENTITY,
            pixel_ratio,
            draggable: false,
            bindings: SmallVec::new(),
            next_handler: 0,
        }
    }

    /// Bind a handler for `gesture`. Binding does not replace existing
    /// handlers; callers that want exactly one must `off` first.
    pub fn on(&mut self, gesture: GestureClass) -> HandlerId {
        let handler = HandlerId(self.next_handler);
        self.next_handler += 1;
        self.bindings.push(Binding { gesture, handler });
        handler
    }

    /// Unbind every handler of `gesture`.
    pub fn off(&mut self, gesture: GestureClass) {
        self.bindings.retain(|b| b.gesture != gesture);
    }

    pub fn off_all(&mut self) {
        self.bindings.clear();
    }

    pub fn is_bound(&self, gesture: GestureClass) -> bool {
        self.bindings.iter().any(|b| b.gesture == gesture)
    }

    pub fn handler_count(&self, gesture: GestureClass) -> usize {
        self.bindings.iter().filter(|b| b.gesture == gesture).count()
    }

    pub fn handler(&self, gesture: GestureClass) -> Option<HandlerId> {
        self.bindings
            .iter()
            .find(|b| b.gesture == gesture)
            .map(|b| b.handler)
    }

    pub fn scale(&self) -> f64 {
        self.transform.scale_x
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }
}

// ─── Image layer ─────────────────────────────────────────────────────────

/// The background raster node.
#[derive(Debug, Clone)]
pub struct ImageElement {
    pub bitmap: Arc<RgbaImage>,
    /// Displayed size in layer units (the working canvas size).
    pub width: f64,
    pub height: f64,
    pub transform: Transform,
}

impl ImageElement {
    pub fn local_rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }
}

#[derive(Debug, Clone)]
pub struct ImageLayer {
    pub transform: Transform,
    pub draggable: bool,
    pub element: ImageElement,
}

// ─── Pixel buffer ────────────────────────────────────────────────────────

/// CPU-readable RGBA copy of the background at the working resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl ImageData {
    /// Resample `bitmap` to `width × height`.
    pub fn from_bitmap(bitmap: &RgbaImage, width: u32, height: u32) -> Self {
        let data = if bitmap.width() == width && bitmap.height() == height {
            bitmap.as_raw().clone()
        } else if width == 0 || height == 0 {
            Vec::new()
        } else {
            imageops::resize(bitmap, width, height, FilterType::Triangle).into_raw()
        };
        Self {
            width,
            height,
            data,
        }
    }

    /// Byte offset of pixel `(x, y)`. Computed in `usize` so large buffers
    /// do not wrap.
    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = self.offset(x, y);
        let px = self.data.get(i..i + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Mean color of the block `[x, x+w) × [y, y+h)`, clipped to the buffer.
    /// Used by pixelation tools.
    pub fn average(&self, x: u32, y: u32, w: u32, h: u32) -> Option<[u8; 4]> {
        let x1 = x.saturating_add(w).min(self.width);
        let y1 = y.saturating_add(h).min(self.height);
        if x >= x1 || y >= y1 {
            return None;
        }
        let mut sum = [0u64; 4];
        for py in y..y1 {
            for px in x..x1 {
                let i = self.offset(px, py);
                let bytes = self.data.get(i..i + 4)?;
                for (s, b) in sum.iter_mut().zip(bytes) {
                    *s += u64::from(*b);
                }
            }
        }
        let n = u64::from(x1 - x) * u64::from(y1 - y);
        Some(sum.map(|s| (s / n) as u8))
    }
}

// ─── Scene ───────────────────────────────────────────────────────────────

/// What a pointer position resolves to.
#[derive(Debug, Clone, PartialEq)]
pub enum HitTarget {
    /// Empty stage area.
    Stage,
    /// The background image.
    Image,
    /// An annotation node, with its shape-identity name if it has one.
    Node { id: NodeId, name: Option<String> },
}

impl HitTarget {
    pub fn shape_name(&self) -> Option<&str> {
        match self {
            HitTarget::Node { name, .. } => name.as_deref(),
            _ => None,
        }
    }

    pub fn node_id(&self) -> Option<NodeId> {
        match self {
            HitTarget::Node { id, .. } => Some(*id),
            _ => None,
        }
    }
}

/// Stage + image layer + draw layer + pixel buffer, always built together.
///
/// Layer order is structural: the image layer is painted and hit-tested
/// beneath the draw layer.
#[derive(Debug, Clone)]
pub struct Scene {
    pub stage: Stage,
    pub image_layer: ImageLayer,
    pub draw_layer: Layer,
    pub image_data: ImageData,
    pub generation: u64,
}

impl Scene {
    /// Initial scene: a container-sized stage with the image centered at
    /// its working (fit) size.
    pub fn fitted(
        bitmap: Arc<RgbaImage>,
        container_width: f64,
        container_height: f64,
        canvas_width: u32,
        canvas_height: u32,
        pixel_ratio: f64,
    ) -> Self {
        let element = ImageElement {
            width: f64::from(canvas_width),
            height: f64::from(canvas_height),
            transform: Transform::at(
                (container_width - f64::from(canvas_width)) / 2.0,
                (container_height - f64::from(canvas_height)) / 2.0,
            ),
            bitmap,
        };
        let image_data = ImageData::from_bitmap(&element.bitmap, canvas_width, canvas_height);
        log::debug!(
            "scene built: stage {container_width}x{container_height}, canvas {canvas_width}x{canvas_height}, ratio {pixel_ratio}"
        );

        Self {
            stage: Stage::new(container_width, container_height, pixel_ratio),
            image_layer: ImageLayer {
                transform: Transform::IDENTITY,
                draggable: false,
                element,
            },
            draw_layer: Layer::new(),
            image_data,
            generation: 0,
        }
    }

    /// Scene rebuilt for a reload: stage sized to the new source, image at
    /// the origin and 1:1 with the stage.
    pub fn reloaded(
        bitmap: Arc<RgbaImage>,
        width: u32,
        height: u32,
        pixel_ratio: f64,
        generation: u64,
    ) -> Self {
        let element = ImageElement {
            width: f64::from(width),
            height: f64::from(height),
            transform: Transform::IDENTITY,
            bitmap,
        };
        let image_data = ImageData::from_bitmap(&element.bitmap, width, height);

        Self {
            stage: Stage::new(f64::from(width), f64::from(height), pixel_ratio),
            image_layer: ImageLayer {
                transform: Transform::IDENTITY,
                draggable: false,
                element,
            },
            draw_layer: Layer::new(),
            image_data,
            generation,
        }
    }

    /// Image-element-local → stage-container coordinates.
    pub fn image_affine(&self) -> Affine {
        self.stage.transform.affine()
            * self.image_layer.transform.affine()
            * self.image_layer.element.transform.affine()
    }

    /// Draw-layer-local → stage-container coordinates.
    pub fn draw_layer_affine(&self) -> Affine {
        self.stage.transform.affine() * self.draw_layer.transform.affine()
    }

    /// Convert a stage-container point (e.g. a pointer position) into
    /// draw-layer coordinates, where tools place their nodes.
    pub fn to_draw_layer(&self, p: Point) -> Point {
        self.draw_layer_affine().inverse() * p
    }

    /// Bounding box of the image element in stage-container coordinates.
    pub fn image_client_rect(&self) -> Rect {
        self.image_affine()
            .transform_rect_bbox(self.image_layer.element.local_rect())
    }
}
