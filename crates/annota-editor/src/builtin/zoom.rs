//! Programmatic zoom of the image and draw layers.

use crate::params::DrawEventParams;
use crate::plugin::{Plugin, PluginParamValue};
use annota_core::viewport::zoom_layers;

pub const DEFAULT_ZOOM_STEP: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomDirection {
    In,
    Out,
}

/// Scales both layers about the stage centre by `1 ± ratio` on enter, and
/// lets the user drag them around while active.
#[derive(Debug)]
pub struct ZoomPlugin {
    direction: ZoomDirection,
    /// Layer draggable flags from before `on_enter`.
    saved: Option<(bool, bool)>,
}

impl ZoomPlugin {
    pub fn zoom_in() -> Self {
        Self {
            direction: ZoomDirection::In,
            saved: None,
        }
    }

    pub fn zoom_out() -> Self {
        Self {
            direction: ZoomDirection::Out,
            saved: None,
        }
    }

    fn factor(&self, ratio: f64) -> f64 {
        match self.direction {
            ZoomDirection::In => 1.0 + ratio,
            // Never collapse the layers to nothing.
            ZoomDirection::Out => (1.0 - ratio).max(0.01),
        }
    }
}

impl Plugin for ZoomPlugin {
    fn name(&self) -> &str {
        match self.direction {
            ZoomDirection::In => "zoomIn",
            ZoomDirection::Out => "zoomOut",
        }
    }

    fn title(&self) -> Option<&str> {
        Some(match self.direction {
            ZoomDirection::In => "Zoom in",
            ZoomDirection::Out => "Zoom out",
        })
    }

    fn iconfont(&self) -> Option<&str> {
        Some(match self.direction {
            ZoomDirection::In => "iconfont icon-zoomIn",
            ZoomDirection::Out => "iconfont icon-zoomOut",
        })
    }

    fn default_param_value(&self) -> Option<PluginParamValue> {
        Some(PluginParamValue::Zoom {
            ratio: DEFAULT_ZOOM_STEP,
        })
    }

    fn on_enter(&mut self, params: &mut DrawEventParams<'_>) {
        let ratio = params.param_value().zoom_ratio().unwrap_or(DEFAULT_ZOOM_STEP);
        let factor = self.factor(ratio);
        zoom_layers(params.scene_mut(), factor);

        let scene = params.scene_mut();
        self.saved = Some((scene.image_layer.draggable, scene.draw_layer.draggable));
        scene.image_layer.draggable = true;
        scene.draw_layer.draggable = true;
    }

    fn on_leave(&mut self, params: &mut DrawEventParams<'_>) {
        let Some((image, draw)) = self.saved.take() else {
            return;
        };
        let scene = params.scene_mut();
        scene.image_layer.draggable = image;
        scene.draw_layer.draggable = draw;
    }
}
