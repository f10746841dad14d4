pub mod config;
pub mod history;
pub mod id;
pub mod model;
pub mod scene;
pub mod viewport;

pub use config::EditorConfig;
pub use history::{
    HistoryChannel, HistoryMessage, HistoryStack, ToolbarItemConfig, ToolbarItemState, UNDO_ITEM,
};
pub use id::NodeId;
pub use model::*;
pub use scene::{GestureClass, HitTarget, ImageData, ImageElement, ImageLayer, Scene, Stage};
pub use viewport::{Fit, WheelStep, ZoomOutcome, fit_to_container};

// Re-export so downstream crates don't need direct dependencies.
pub use image::RgbaImage;
pub use kurbo::{Point, Rect, Vec2};
pub use petgraph::graph::NodeIndex;
