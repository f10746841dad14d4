//! The editor: owns the scene, the plugins, and everything in between.
//!
//! State changes go through `&mut self`; plugins reach the same state
//! through the [`DrawEventParams`] borrowed for each hook call.
//!
//! ## Tool transitions
//!
//! `current` is updated first, then the previous plugin leaves (unless
//! both plugins own the same shape kind), then the stage's draggable flag
//! is derived, then the new plugin's handlers are bound and it enters.
//! Requests made by `on_leave` or `on_enter` wait until the transition is
//! complete, so a plugin switch never starts inside another one.

use crate::builtin;
use crate::input::InputEvent;
use crate::params::{DrawEventParams, EditorContext};
use crate::plugin::{Hook, Plugin, PluginInfo, PluginParamValue, PluginSet};
use crate::reinit::reload_scene;
use crate::router::{PointerState, bind_events};
use crate::tasks::{Task, TaskQueue};
use annota_core::history::deliver;
use annota_core::{
    EditorConfig, Fit, HistoryChannel, HistoryMessage, HistoryStack, HitTarget, RgbaImage, Scene,
    Stage, ToolbarItemConfig, UNDO_ITEM, fit_to_container,
};
use annota_render::{ExportFormat, ExportedImage, export_stage};
use std::sync::Arc;

/// Host-side notifications. All methods default to no-ops.
pub trait EditorObserver {
    /// A stage was built (mount) or rebuilt (reload).
    fn stage_changed(&mut self, _stage: &Stage) {}
    fn toolbar_config_changed(&mut self, _config: &ToolbarItemConfig) {}
    fn plugin_changed(&mut self, _current: Option<&PluginInfo>) {}
    fn param_value_changed(&mut self, _value: &PluginParamValue) {}
}

pub struct Editor {
    pub(crate) plugins: PluginSet,
    pub(crate) scene: Scene,
    pub(crate) history: HistoryStack,
    pub(crate) channel: HistoryChannel,
    pub(crate) context: EditorContext,
    pub(crate) tasks: TaskQueue,
    pub(crate) pointer: PointerState,
    pub(crate) exports: Vec<ExportedImage>,
    observer: Option<Box<dyn EditorObserver>>,
    fit: Fit,
}

impl Editor {
    /// Build an editor around `bitmap` with the built-in plugins followed
    /// by `host_plugins`.
    pub fn mount(
        bitmap: RgbaImage,
        config: EditorConfig,
        host_plugins: Vec<Box<dyn Plugin>>,
    ) -> Result<Self, String> {
        Self::build(bitmap, config, host_plugins, None)
    }

    pub fn mount_with(
        bitmap: RgbaImage,
        config: EditorConfig,
        host_plugins: Vec<Box<dyn Plugin>>,
        observer: Box<dyn EditorObserver>,
    ) -> Result<Self, String> {
        Self::build(bitmap, config, host_plugins, Some(observer))
    }

    fn build(
        bitmap: RgbaImage,
        config: EditorConfig,
        host_plugins: Vec<Box<dyn Plugin>>,
        observer: Option<Box<dyn EditorObserver>>,
    ) -> Result<Self, String> {
        config.validate()?;
        let fit = fit_to_container(
            config.container_width,
            config.container_height,
            bitmap.width(),
            bitmap.height(),
        )?;

        let mut all = builtin::plugins();
        all.extend(host_plugins);
        let plugins = PluginSet::new(all)?;
        let toolbar = ToolbarItemConfig::for_plugins(plugins.names());

        let mut context = EditorContext::new(config, toolbar);
        if let Some(name) = context.config.default_plugin.clone() {
            match plugins.position(&name) {
                Some(i) if context.config.lists_tool(&name) => {
                    context.current = Some(i);
                    if let Some(value) = plugins.info(i).and_then(|p| p.default_param_value.clone())
                    {
                        context.param_value = value;
                    }
                }
                Some(_) => log::debug!("default plugin `{name}` is not on the toolbar"),
                None => log::warn!("unknown default plugin `{name}`, starting idle"),
            }
        }

        let mut scene = Scene::fitted(
            Arc::new(bitmap),
            context.config.container_width,
            context.config.container_height,
            fit.canvas_width,
            fit.canvas_height,
            fit.pixel_ratio,
        );
        bind_events(&mut scene.stage);

        let mut editor = Self {
            plugins,
            scene,
            history: HistoryStack::new(),
            channel: HistoryChannel::new(),
            context,
            tasks: TaskQueue::new(),
            pointer: PointerState::default(),
            exports: Vec::new(),
            observer,
            fit,
        };
        editor.apply_draggable();
        log::debug!(
            "mounted: {} plugins, scale {:.3}, ratio {:.3}",
            editor.plugins.len(),
            fit.scale,
            fit.pixel_ratio
        );
        if let Some(obs) = editor.observer.as_mut() {
            obs.stage_changed(&editor.scene.stage);
        }
        if let Some(current) = editor.context.current {
            editor.invoke_lifecycle(current, Hook::Enter);
        }
        Ok(editor)
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn stage(&self) -> &Stage {
        &self.scene.stage
    }

    pub fn pixel_ratio(&self) -> f64 {
        self.scene.stage.pixel_ratio
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn fit(&self) -> Fit {
        self.fit
    }

    pub fn config(&self) -> &EditorConfig {
        &self.context.config
    }

    pub fn history(&self) -> &HistoryStack {
        &self.history
    }

    pub fn plugins(&self) -> &[PluginInfo] {
        self.plugins.infos()
    }

    pub fn current_plugin(&self) -> Option<&PluginInfo> {
        self.context.current.and_then(|i| self.plugins.info(i))
    }

    pub fn param_value(&self) -> &PluginParamValue {
        &self.context.param_value
    }

    pub fn toolbar_item_config(&self) -> &ToolbarItemConfig {
        &self.context.toolbar
    }

    pub fn pending_tasks(&self) -> usize {
        self.tasks.len()
    }

    // ─── Host surface ────────────────────────────────────────────────────

    /// Select `name`. With `toggle`, selecting the current plugin again
    /// deactivates it.
    pub fn handle_plugin_change(&mut self, name: &str, toggle: bool) -> Result<(), String> {
        let index = self
            .plugins
            .position(name)
            .ok_or_else(|| format!("unknown plugin: {name}"))?;
        self.change_plugin(index, toggle);
        Ok(())
    }

    pub fn handle_plugin_param_value_change(&mut self, value: PluginParamValue) {
        self.context.param_value = value;
        if let Some(obs) = self.observer.as_mut() {
            obs.param_value_changed(&self.context.param_value);
        }
    }

    pub fn update_toolbar_item_config(&mut self, config: ToolbarItemConfig) {
        self.context.toolbar = config;
        self.notify_toolbar();
    }

    /// Publish on this editor's history channel and deliver right away.
    pub fn publish_history(&mut self, message: HistoryMessage) {
        self.channel.publish(message);
        self.flush_history();
    }

    /// Replace the background and rebuild the scene.
    pub fn reload(&mut self, bitmap: RgbaImage, width: u32, height: u32) -> Result<(), String> {
        reload_scene(
            &mut self.scene,
            &mut self.history,
            Arc::new(bitmap),
            width,
            height,
        )?;
        self.finish_reload();
        Ok(())
    }

    pub fn export(&self, format: ExportFormat) -> Result<ExportedImage, String> {
        export_stage(&self.scene, format)
    }

    /// Let the current plugin tidy up (drop previews, finish edits) before
    /// exporting. The plugin stays current.
    pub fn clear_and_export(&mut self, format: ExportFormat) -> Result<ExportedImage, String> {
        if let Some(current) = self.context.current {
            self.invoke_lifecycle(current, Hook::Leave);
        }
        self.export(format)
    }

    /// Exports produced by plugins since the last call.
    pub fn take_exports(&mut self) -> Vec<ExportedImage> {
        std::mem::take(&mut self.exports)
    }

    /// Run every task queued before this call. Returns how many ran.
    pub fn tick(&mut self) -> usize {
        let ready = self.tasks.take_ready();
        let count = ready.len();
        for task in ready {
            match task {
                Task::ShapeClick {
                    plugin,
                    event,
                    target,
                    generation,
                } => self.invoke(plugin, Hook::Click, Some(&event), Some(&target), generation),
                Task::Deactivate { plugin } => {
                    if self.context.current == Some(plugin) {
                        self.set_current(None);
                    }
                }
                Task::Deferred {
                    plugin,
                    token,
                    generation,
                } => self.invoke(plugin, Hook::Deferred(token), None, None, generation),
            }
        }
        count
    }

    // ─── Transitions ─────────────────────────────────────────────────────

    pub(crate) fn change_plugin(&mut self, index: usize, toggle: bool) {
        let Some(info) = self.plugins.info(index) else {
            return;
        };
        let default_value = info.default_param_value.clone();
        let one_shot = info.disappear_immediately;
        let next = if toggle && self.context.current == Some(index) {
            None
        } else {
            Some(index)
        };

        if let Some(value) = default_value {
            self.handle_plugin_param_value_change(value);
        }
        if one_shot {
            self.tasks.push(Task::Deactivate { plugin: index });
        }
        self.set_current(next);
    }

    fn set_current(&mut self, next: Option<usize>) {
        let previous = self.context.current;
        if previous == next {
            return;
        }
        self.context.current = next;
        log::debug!(
            "plugin {:?} -> {:?}",
            previous.and_then(|i| self.plugins.info(i)).map(|p| &p.name),
            next.and_then(|i| self.plugins.info(i)).map(|p| &p.name)
        );

        if let Some(prev) = previous {
            let shared = match (self.plugins.info(prev), next.and_then(|n| self.plugins.info(n))) {
                (Some(a), Some(b)) => a.shares_selector(b),
                _ => false,
            };
            if !shared {
                self.transition_hook(prev, Hook::Leave);
            }
        }

        self.apply_draggable();
        if let Some(n) = next {
            bind_events(&mut self.scene.stage);
            self.transition_hook(n, Hook::Enter);
        }

        if let Some(obs) = self.observer.as_mut() {
            obs.plugin_changed(self.context.current.and_then(|i| self.plugins.info(i)));
        }
        self.apply_requests();
    }

    /// Free stage dragging only while no tool is active.
    fn apply_draggable(&mut self) {
        self.scene.stage.draggable = self.context.config.draggable && self.context.current.is_none();
    }

    // ─── Hook invocation ─────────────────────────────────────────────────

    fn invoke_lifecycle(&mut self, index: usize, hook: Hook) {
        let generation = self.scene.generation;
        self.invoke(index, hook, None, None, generation);
    }

    /// Lifecycle hook inside a transition. Requests stay pending until
    /// [`Self::set_current`] has finished.
    fn transition_hook(&mut self, index: usize, hook: Hook) {
        let generation = self.scene.generation;
        let reloaded = self.run_hook(index, hook, None, None, generation);
        self.settle(reloaded);
    }

    /// Run one hook, then apply what it asked for.
    pub(crate) fn invoke(
        &mut self,
        index: usize,
        hook: Hook,
        event: Option<&InputEvent>,
        target: Option<&HitTarget>,
        origin_generation: u64,
    ) {
        let reloaded = self.run_hook(index, hook, event, target, origin_generation);
        self.settle(reloaded);
        self.apply_requests();
    }

    /// Returns whether the hook reloaded the scene.
    fn run_hook(
        &mut self,
        index: usize,
        hook: Hook,
        event: Option<&InputEvent>,
        target: Option<&HitTarget>,
        origin_generation: u64,
    ) -> bool {
        let Editor {
            plugins,
            scene,
            history,
            channel,
            context,
            tasks,
            exports,
            ..
        } = self;
        let (entries, infos) = plugins.split_mut();
        let Some(plugin) = entries.get_mut(index) else {
            log::warn!("no plugin at index {index}");
            return false;
        };
        log::trace!("{hook:?} -> {}", plugin.name());

        let mut params = DrawEventParams {
            event,
            target,
            scene,
            history,
            channel,
            context,
            plugins: infos,
            tasks,
            exports,
            invoker: index,
            origin_generation,
            reloaded: false,
        };
        hook.call(&mut **plugin, &mut params);
        params.reloaded
    }

    /// Scene and history bookkeeping owed after any hook.
    fn settle(&mut self, reloaded: bool) {
        if reloaded {
            self.finish_reload();
        }
        self.flush_history();
    }

    /// Apply pending hook requests: plugin change, then param value, then
    /// toolbar.
    fn apply_requests(&mut self) {
        let requests = std::mem::take(&mut self.context.requests);
        if let Some((name, toggle)) = requests.plugin {
            match self.plugins.position(&name) {
                Some(index) => self.change_plugin(index, toggle),
                None => log::warn!("plugin change to unknown `{name}` ignored"),
            }
        }
        if let Some(value) = requests.param_value {
            self.handle_plugin_param_value_change(value);
        }
        if let Some(config) = requests.toolbar {
            self.update_toolbar_item_config(config);
        }
    }

    /// Post-reload bookkeeping shared by host and in-hook reloads.
    fn finish_reload(&mut self) {
        self.pointer.position = None;
        self.pointer.drag = None;
        self.apply_draggable();
        if self.context.toolbar.set_disabled(UNDO_ITEM, true) {
            self.notify_toolbar();
        }
        if let Some(obs) = self.observer.as_mut() {
            obs.stage_changed(&self.scene.stage);
        }
    }

    fn flush_history(&mut self) {
        let mut changed = false;
        for message in self.channel.drain() {
            changed |= deliver(message, &mut self.history, &mut self.context.toolbar);
        }
        if changed {
            self.notify_toolbar();
        }
    }

    fn notify_toolbar(&mut self) {
        if let Some(obs) = self.observer.as_mut() {
            obs.toolbar_config_changed(&self.context.toolbar);
        }
    }
}

impl Drop for Editor {
    fn drop(&mut self) {
        if let Some(current) = self.context.current {
            let generation = self.scene.generation;
            // Requests made while tearing down have nowhere to go.
            self.run_hook(current, Hook::Leave, None, None, generation);
            self.flush_history();
        }
    }
}

impl std::fmt::Debug for Editor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("plugins", &self.plugins)
            .field("current", &self.current_plugin().map(|p| &p.name))
            .field("generation", &self.scene.generation)
            .field("history", &self.history.len())
            .field("tasks", &self.tasks.len())
            .finish()
    }
}
