//! Tool plugin contract.
//!
//! A plugin is a named tool. The engine keeps at most one plugin active and
//! calls its lifecycle hooks as the user switches tools, and its drawing
//! hooks as pointer input arrives. Every hook receives a fresh
//! [`DrawEventParams`] scoped to that one call.
//!
//! ## Hooks
//!
//! | Hook | Called on |
//! |------|-----------|
//! | `on_enter` | becoming the active plugin |
//! | `on_leave` | being replaced, deactivated, or torn down |
//! | `on_click` | click / tap on the stage |
//! | `on_draw_start` | pointer down |
//! | `on_draw` | pointer move |
//! | `on_draw_end` | pointer up |
//! | `on_deferred` | a task the plugin scheduled itself comes due |

use crate::params::DrawEventParams;
use annota_core::Color;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Parameter bag shared between the toolbar and the active plugin.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PluginParamValue {
    #[default]
    Empty,
    /// Fraction per zoom step (`0.2` = 20%).
    Zoom { ratio: f64 },
    Stroke { color: Color, width: f64 },
    Mosaic { tile_size: u32 },
    Text { color: Color, font_size: f64 },
    /// Host plugins with their own parameter shapes.
    Custom(serde_json::Value),
}

impl PluginParamValue {
    pub fn zoom_ratio(&self) -> Option<f64> {
        match self {
            PluginParamValue::Zoom { ratio } if *ratio > 0.0 => Some(*ratio),
            _ => None,
        }
    }
}

/// A tool. Everything except `name` is optional.
pub trait Plugin {
    /// Unique within an editor.
    fn name(&self) -> &str;

    fn title(&self) -> Option<&str> {
        None
    }

    /// Opaque icon reference for the host toolbar.
    fn iconfont(&self) -> Option<&str> {
        None
    }

    /// Replaces the editor's param value whenever this plugin is selected.
    fn default_param_value(&self) -> Option<PluginParamValue> {
        None
    }

    /// Shape-identity name of the nodes this plugin owns. Clicking such a
    /// node switches to the plugin.
    fn shape_selector(&self) -> Option<&str> {
        None
    }

    /// One-shot tools deactivate on the next tick after being selected.
    fn disappear_immediately(&self) -> bool {
        false
    }

    fn on_enter(&mut self, _params: &mut DrawEventParams<'_>) {}
    fn on_leave(&mut self, _params: &mut DrawEventParams<'_>) {}
    fn on_click(&mut self, _params: &mut DrawEventParams<'_>) {}
    fn on_draw_start(&mut self, _params: &mut DrawEventParams<'_>) {}
    fn on_draw(&mut self, _params: &mut DrawEventParams<'_>) {}
    fn on_draw_end(&mut self, _params: &mut DrawEventParams<'_>) {}

    /// Work scheduled with [`DrawEventParams::schedule`]; `token` is the
    /// value passed there.
    fn on_deferred(&mut self, _token: u64, _params: &mut DrawEventParams<'_>) {}
}

/// Which hook to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hook {
    Enter,
    Leave,
    Click,
    DrawStart,
    Draw,
    DrawEnd,
    Deferred(u64),
}

impl Hook {
    pub(crate) fn call(self, plugin: &mut dyn Plugin, params: &mut DrawEventParams<'_>) {
        match self {
            Hook::Enter => plugin.on_enter(params),
            Hook::Leave => plugin.on_leave(params),
            Hook::Click => plugin.on_click(params),
            Hook::DrawStart => plugin.on_draw_start(params),
            Hook::Draw => plugin.on_draw(params),
            Hook::DrawEnd => plugin.on_draw_end(params),
            Hook::Deferred(token) => plugin.on_deferred(token, params),
        }
    }
}

/// Static description of a registered plugin, readable while the plugin
/// itself is borrowed for a hook call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginInfo {
    pub name: String,
    pub title: Option<String>,
    pub iconfont: Option<String>,
    pub default_param_value: Option<PluginParamValue>,
    pub shape_selector: Option<String>,
    pub disappear_immediately: bool,
}

impl PluginInfo {
    fn describe(plugin: &dyn Plugin) -> Self {
        Self {
            name: plugin.name().to_string(),
            title: plugin.title().map(str::to_string),
            iconfont: plugin.iconfont().map(str::to_string),
            default_param_value: plugin.default_param_value(),
            shape_selector: plugin
                .shape_selector()
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            disappear_immediately: plugin.disappear_immediately(),
        }
    }

    /// Both plugins own the same kind of shape.
    pub fn shares_selector(&self, other: &PluginInfo) -> bool {
        self.shape_selector.is_some() && self.shape_selector == other.shape_selector
    }
}

/// The registered plugins, fixed for the editor's lifetime.
pub struct PluginSet {
    entries: Vec<Box<dyn Plugin>>,
    infos: Vec<PluginInfo>,
}

impl std::fmt::Debug for PluginSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.infos.iter().map(|i| &i.name))
            .finish()
    }
}

impl PluginSet {
    /// Rejects empty and duplicate names.
    pub fn new(entries: Vec<Box<dyn Plugin>>) -> Result<Self, String> {
        let mut seen = HashSet::new();
        let mut infos = Vec::with_capacity(entries.len());
        for plugin in &entries {
            let info = PluginInfo::describe(plugin.as_ref());
            if info.name.is_empty() {
                return Err("plugin name must not be empty".to_string());
            }
            if !seen.insert(info.name.clone()) {
                return Err(format!("duplicate plugin name: {}", info.name));
            }
            infos.push(info);
        }
        Ok(Self { entries, infos })
    }

    pub fn len(&self) -> usize {
        self.infos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }

    pub fn infos(&self) -> &[PluginInfo] {
        &self.infos
    }

    pub fn info(&self, index: usize) -> Option<&PluginInfo> {
        self.infos.get(index)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.infos.iter().position(|i| i.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.infos.iter().map(|i| i.name.as_str())
    }

    /// Mutable plugins next to their descriptors, so one plugin can run
    /// while the others' descriptors are read.
    pub(crate) fn split_mut(&mut self) -> (&mut [Box<dyn Plugin>], &[PluginInfo]) {
        (&mut self.entries, &self.infos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct Named(&'static str, Option<&'static str>);

    impl Plugin for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn shape_selector(&self) -> Option<&str> {
            self.1
        }
    }

    fn set(plugins: Vec<Named>) -> Result<PluginSet, String> {
        PluginSet::new(
            plugins
                .into_iter()
                .map(|p| Box::new(p) as Box<dyn Plugin>)
                .collect(),
        )
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = set(vec![Named("pen", None), Named("pen", None)]).unwrap_err();
        assert_eq!(err, "duplicate plugin name: pen");
        assert!(set(vec![Named("", None)]).is_err());
    }

    #[test]
    fn descriptors_keep_registration_order() {
        let plugins = set(vec![Named("rect", Some("rect")), Named("pen", Some(""))]).unwrap();
        assert_eq!(plugins.names().collect::<Vec<_>>(), vec!["rect", "pen"]);
        assert_eq!(plugins.position("pen"), Some(1));
        // An empty selector owns nothing.
        assert_eq!(plugins.infos()[1].shape_selector, None);
    }

    #[test]
    fn selector_sharing_needs_a_selector() {
        let plugins = set(vec![
            Named("rect", Some("rect")),
            Named("rect2", Some("rect")),
            Named("pen", None),
            Named("eraser", None),
        ])
        .unwrap();
        let infos = plugins.infos();
        assert!(infos[0].shares_selector(&infos[1]));
        assert!(!infos[2].shares_selector(&infos[3]));
    }

    #[test]
    fn param_value_serializes_tagged() {
        let v = PluginParamValue::Zoom { ratio: 0.2 };
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json, serde_json::json!({ "kind": "zoom", "value": { "ratio": 0.2 } }));
        assert_eq!(v.zoom_ratio(), Some(0.2));
        assert_eq!(PluginParamValue::Empty.zoom_ratio(), None);
    }
}
