//! Plugins every editor ships with. Host plugins are registered after these.

pub mod crop;
pub mod download;
pub mod rect;
pub mod repeal;
pub mod zoom;

use crate::plugin::Plugin;

pub use crop::CropPlugin;
pub use download::DownloadPlugin;
pub use rect::RectPlugin;
pub use repeal::RepealPlugin;
pub use zoom::ZoomPlugin;

/// Fresh instances of every built-in plugin, in registration order.
pub fn plugins() -> Vec<Box<dyn Plugin>> {
    vec![
        Box::new(RepealPlugin),
        Box::new(DownloadPlugin::default()),
        Box::new(CropPlugin::default()),
        Box::new(ZoomPlugin::zoom_in()),
        Box::new(ZoomPlugin::zoom_out()),
        Box::new(RectPlugin::default()),
    ]
}
