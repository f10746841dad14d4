//! One-shot export into the host's outbox.

use crate::params::DrawEventParams;
use crate::plugin::Plugin;
use annota_render::ExportFormat;

const EXPORT: u64 = 1;

/// Exports on the tick after it is selected, once the previous tool has
/// left and cleaned up after itself.
#[derive(Debug, Default)]
pub struct DownloadPlugin {
    pub format: ExportFormat,
}

impl DownloadPlugin {
    pub fn new(format: ExportFormat) -> Self {
        Self { format }
    }
}

impl Plugin for DownloadPlugin {
    fn name(&self) -> &str {
        "download"
    }

    fn title(&self) -> Option<&str> {
        Some("Download image")
    }

    fn iconfont(&self) -> Option<&str> {
        Some("iconfont icon-download")
    }

    fn disappear_immediately(&self) -> bool {
        true
    }

    fn on_enter(&mut self, params: &mut DrawEventParams<'_>) {
        params.schedule(EXPORT);
    }

    fn on_deferred(&mut self, token: u64, params: &mut DrawEventParams<'_>) {
        if token != EXPORT {
            return;
        }
        if params.is_stale() {
            log::debug!("scene rebuilt before export ran, skipping");
            return;
        }
        match params.export(self.format) {
            Ok(image) => params.emit_export(image),
            Err(e) => log::warn!("download failed: {e}"),
        }
    }
}
