//! Editor construction parameters.

use serde::{Deserialize, Serialize};

/// Toolbar layout used when the host does not provide one. `"|"` entries
/// are separators for the host shell.
///
/// Only `rect`, `repeal`, `download`, `crop`, `zoomIn` and `zoomOut` ship
/// with the editor. The other names are slots for host plugins; while
/// nothing is registered under them they are inert, and naming one as
/// `default_plugin` starts the editor idle.
pub const DEFAULT_TOOLBAR: &[&str] = &[
    "pen", "eraser", "arrow", "rect", "circle", "mosaic", "text", "|", "repeal", "download",
    "crop", "|", "zoomIn", "zoomOut",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    pub container_width: f64,
    pub container_height: f64,
    /// Multiplicative step of one wheel notch.
    pub zoom_ratio: f64,
    pub enable_zoom: bool,
    /// Free-drag panning of the stage while no tool is active.
    pub draggable: bool,
    /// Plugin active right after mount.
    pub default_plugin: Option<String>,
    pub toolbar_items: Vec<String>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            container_width: 700.0,
            container_height: 500.0,
            zoom_ratio: 0.05,
            enable_zoom: false,
            draggable: false,
            default_plugin: None,
            toolbar_items: DEFAULT_TOOLBAR.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl EditorConfig {
    /// Parse a JSON config; absent fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, String> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| format!("invalid editor config: {e}"))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the viewport math cannot work with.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.zoom_ratio.is_finite() && self.zoom_ratio > 0.0) {
            return Err(format!(
                "invalid editor config: zoomRatio must be a positive number, got {}",
                self.zoom_ratio
            ));
        }
        if !(self.container_width.is_finite() && self.container_height.is_finite()) {
            return Err(format!(
                "invalid editor config: container must be finite, got {}x{}",
                self.container_width, self.container_height
            ));
        }
        Ok(())
    }

    pub fn with_container(mut self, width: f64, height: f64) -> Self {
        self.container_width = width;
        self.container_height = height;
        self
    }

    pub fn lists_tool(&self, name: &str) -> bool {
        self.toolbar_items.iter().any(|item| item == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_fields_take_defaults() {
        let cfg = EditorConfig::from_json(r#"{ "enableZoom": true, "defaultPlugin": "rect" }"#)
            .unwrap();
        assert!(cfg.enable_zoom);
        assert_eq!(cfg.default_plugin.as_deref(), Some("rect"));
        assert_eq!(cfg.zoom_ratio, 0.05);
        assert_eq!(cfg.container_width, 700.0);
        assert!(cfg.lists_tool("repeal"));
    }

    #[test]
    fn malformed_json_is_an_error() {
        let err = EditorConfig::from_json("{ zoomRatio: }").unwrap_err();
        assert!(err.starts_with("invalid editor config"));
    }

    #[test]
    fn non_positive_zoom_ratio_is_rejected() {
        for ratio in ["0", "-1", "-0.5"] {
            let json = format!(r#"{{ "zoomRatio": {ratio} }}"#);
            let err = EditorConfig::from_json(&json).unwrap_err();
            assert!(err.contains("zoomRatio"), "{ratio}: {err}");
        }
        let cfg = EditorConfig {
            zoom_ratio: f64::NAN,
            ..EditorConfig::default()
        };
        assert!(cfg.validate().is_err());
        assert!(EditorConfig::default().validate().is_ok());
    }
}
