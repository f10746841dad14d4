pub mod builtin;
pub mod editor;
pub mod input;
pub mod params;
pub mod plugin;
pub mod reinit;
pub mod router;
pub mod tasks;

pub use editor::{Editor, EditorObserver};
pub use input::InputEvent;
pub use params::{DrawEventParams, EditorContext};
pub use plugin::{Hook, Plugin, PluginInfo, PluginParamValue, PluginSet};
pub use router::DispatchOutcome;
pub use tasks::{Task, TaskQueue};

// Re-export the lower layers so hosts need only this crate.
pub use annota_core;
pub use annota_render;
