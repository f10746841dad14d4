//! Undo: drop the newest committed node.

use crate::params::DrawEventParams;
use crate::plugin::Plugin;
use annota_core::{HistoryMessage, UNDO_ITEM};

/// One-shot. Pops the newest history entry, removes the node it recorded,
/// and announces the remaining stack.
#[derive(Debug, Default)]
pub struct RepealPlugin;

impl Plugin for RepealPlugin {
    fn name(&self) -> &str {
        UNDO_ITEM
    }

    fn title(&self) -> Option<&str> {
        Some("Undo")
    }

    fn iconfont(&self) -> Option<&str> {
        Some("iconfont icon-repeal")
    }

    fn disappear_immediately(&self) -> bool {
        true
    }

    fn on_enter(&mut self, params: &mut DrawEventParams<'_>) {
        let Some(snapshot) = params.history_mut().pop() else {
            log::debug!("nothing to undo");
            return;
        };
        // The node may already be gone (removed by its tool, or the scene
        // was rebuilt); the stack still shrinks.
        if let Some(id) = snapshot.node_id()
            && params.draw_layer_mut().remove(id).is_none()
        {
            log::debug!("undo target {id} no longer in the draw layer");
        }
        let remaining = params.history().entries().to_vec();
        params.publish(HistoryMessage::Pop { remaining });
    }
}
