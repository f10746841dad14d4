//! Per-call hook parameters.
//!
//! [`DrawEventParams`] is built fresh for every hook invocation from
//! exclusive borrows of the editor's state, so a plugin can mutate the
//! scene directly but cannot keep any of it past the call. Requests that
//! change the editor itself (switching plugins, params, toolbar) are
//! recorded and applied once the hook returns.

use crate::input::InputEvent;
use crate::plugin::{PluginInfo, PluginParamValue};
use crate::reinit::reload_scene;
use crate::tasks::{Task, TaskQueue};
use annota_core::{
    EditorConfig, HistoryChannel, HistoryMessage, HistoryStack, HitTarget, ImageData,
    ImageElement, ImageLayer, Layer, Point, RgbaImage, Scene, Stage, ToolbarItemConfig,
};
use annota_render::{ExportFormat, ExportedImage, export_stage};
use std::sync::Arc;

/// Editor state shared with the host shell: current tool, its parameters,
/// and the toolbar flags.
#[derive(Debug, Clone)]
pub struct EditorContext {
    pub config: EditorConfig,
    pub current: Option<usize>,
    pub param_value: PluginParamValue,
    pub toolbar: ToolbarItemConfig,
    pub(crate) requests: Requests,
}

impl EditorContext {
    pub(crate) fn new(config: EditorConfig, toolbar: ToolbarItemConfig) -> Self {
        Self {
            config,
            current: None,
            param_value: PluginParamValue::Empty,
            toolbar,
            requests: Requests::default(),
        }
    }
}

/// Editor changes asked for during a hook. Later requests of the same kind
/// replace earlier ones.
#[derive(Debug, Clone, Default)]
pub(crate) struct Requests {
    pub plugin: Option<(String, bool)>,
    pub param_value: Option<PluginParamValue>,
    pub toolbar: Option<ToolbarItemConfig>,
}

pub struct DrawEventParams<'a> {
    pub(crate) event: Option<&'a InputEvent>,
    pub(crate) target: Option<&'a HitTarget>,
    pub(crate) scene: &'a mut Scene,
    pub(crate) history: &'a mut HistoryStack,
    pub(crate) channel: &'a HistoryChannel,
    pub(crate) context: &'a mut EditorContext,
    pub(crate) plugins: &'a [PluginInfo],
    pub(crate) tasks: &'a mut TaskQueue,
    pub(crate) exports: &'a mut Vec<ExportedImage>,
    /// Plugin the hook belongs to.
    pub(crate) invoker: usize,
    /// Scene generation the call was captured in.
    pub(crate) origin_generation: u64,
    pub(crate) reloaded: bool,
}

impl<'a> DrawEventParams<'a> {
    // ─── Event ───────────────────────────────────────────────────────────

    /// `None` for lifecycle calls (`on_enter`, `on_leave`, deferred work).
    pub fn event(&self) -> Option<&InputEvent> {
        self.event
    }

    pub fn target(&self) -> Option<&HitTarget> {
        self.target
    }

    /// Event position in stage-container coordinates.
    pub fn pointer(&self) -> Option<Point> {
        self.event.and_then(InputEvent::position)
    }

    /// Event position in draw-layer coordinates, where nodes are placed.
    pub fn layer_pointer(&self) -> Option<Point> {
        self.pointer().map(|p| self.scene.to_draw_layer(p))
    }

    // ─── Scene ───────────────────────────────────────────────────────────

    pub fn scene(&self) -> &Scene {
        &*self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut *self.scene
    }

    pub fn stage(&self) -> &Stage {
        &self.scene.stage
    }

    pub fn stage_mut(&mut self) -> &mut Stage {
        &mut self.scene.stage
    }

    pub fn image_layer(&self) -> &ImageLayer {
        &self.scene.image_layer
    }

    pub fn image_layer_mut(&mut self) -> &mut ImageLayer {
        &mut self.scene.image_layer
    }

    pub fn image_element(&self) -> &ImageElement {
        &self.scene.image_layer.element
    }

    pub fn draw_layer(&self) -> &Layer {
        &self.scene.draw_layer
    }

    pub fn draw_layer_mut(&mut self) -> &mut Layer {
        &mut self.scene.draw_layer
    }

    pub fn image_data(&self) -> &ImageData {
        &self.scene.image_data
    }

    pub fn pixel_ratio(&self) -> f64 {
        self.scene.stage.pixel_ratio
    }

    /// The scene was rebuilt since this call was captured (a deferred task
    /// outliving a reload, or a reload earlier in this same hook).
    pub fn is_stale(&self) -> bool {
        self.origin_generation != self.scene.generation
    }

    /// Replace the whole scene with `bitmap` shown at `width × height`.
    /// Takes effect immediately; the rest of the hook sees the new scene.
    pub fn reload(
        &mut self,
        bitmap: impl Into<Arc<RgbaImage>>,
        width: u32,
        height: u32,
    ) -> Result<(), String> {
        reload_scene(self.scene, self.history, bitmap.into(), width, height)?;
        self.reloaded = true;
        Ok(())
    }

    // ─── History ─────────────────────────────────────────────────────────

    pub fn history(&self) -> &HistoryStack {
        &*self.history
    }

    /// For undo implementations: remove entries here, then announce the
    /// new state with [`HistoryMessage::Pop`].
    pub fn history_mut(&mut self) -> &mut HistoryStack {
        &mut *self.history
    }

    /// Delivered when the hook returns.
    pub fn publish(&self, message: HistoryMessage) {
        self.channel.publish(message);
    }

    // ─── Editor context ──────────────────────────────────────────────────

    pub fn config(&self) -> &EditorConfig {
        &self.context.config
    }

    pub fn zoom_ratio(&self) -> f64 {
        self.context.config.zoom_ratio
    }

    pub fn enable_zoom(&self) -> bool {
        self.context.config.enable_zoom
    }

    pub fn draggable(&self) -> bool {
        self.context.config.draggable
    }

    pub fn container_size(&self) -> (f64, f64) {
        (
            self.context.config.container_width,
            self.context.config.container_height,
        )
    }

    pub fn plugins(&self) -> &[PluginInfo] {
        self.plugins
    }

    pub fn current_plugin(&self) -> Option<&PluginInfo> {
        self.context.current.and_then(|i| self.plugins.get(i))
    }

    pub fn param_value(&self) -> &PluginParamValue {
        &self.context.param_value
    }

    pub fn toolbar_item_config(&self) -> &ToolbarItemConfig {
        &self.context.toolbar
    }

    pub fn handle_plugin_change(&mut self, name: impl Into<String>, toggle: bool) {
        self.context.requests.plugin = Some((name.into(), toggle));
    }

    pub fn handle_plugin_param_value_change(&mut self, value: PluginParamValue) {
        self.context.requests.param_value = Some(value);
    }

    pub fn update_toolbar_item_config(&mut self, config: ToolbarItemConfig) {
        self.context.requests.toolbar = Some(config);
    }

    // ─── Deferred work & export ──────────────────────────────────────────

    /// Run this plugin's `on_deferred(token)` on the next tick.
    pub fn schedule(&mut self, token: u64) {
        self.tasks.push(Task::Deferred {
            plugin: self.invoker,
            token,
            generation: self.scene.generation,
        });
    }

    /// Render and encode the visible image with its annotations.
    pub fn export(&self, format: ExportFormat) -> Result<ExportedImage, String> {
        export_stage(&*self.scene, format)
    }

    /// Hand an export to the host's outbox.
    pub fn emit_export(&mut self, image: ExportedImage) {
        self.exports.push(image);
    }
}
