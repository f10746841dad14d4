//! Destructive re-initialization (crop and other tools that replace the
//! background).

use crate::router::{bind_events, unbind_events};
use annota_core::{HistoryStack, RgbaImage, Scene};
use std::sync::Arc;

/// Rebuild `scene` around `bitmap` shown at `width × height`.
///
/// Handlers are unbound before and rebound after, history is cleared, and
/// the new scene carries the next generation. The pixel ratio survives so
/// exports keep native resolution. Zero dimensions, or a bitmap without
/// pixels, leave everything as it was.
pub fn reload_scene(
    scene: &mut Scene,
    history: &mut HistoryStack,
    bitmap: Arc<RgbaImage>,
    width: u32,
    height: u32,
) -> Result<(), String> {
    if width == 0 || height == 0 {
        return Err(format!("cannot reload into a {width}x{height} stage"));
    }
    if bitmap.width() == 0 || bitmap.height() == 0 {
        return Err(format!(
            "cannot reload from an empty bitmap ({}x{})",
            bitmap.width(),
            bitmap.height()
        ));
    }

    unbind_events(&mut scene.stage);
    history.clear();
    let generation = scene.generation + 1;
    *scene = Scene::reloaded(bitmap, width, height, scene.stage.pixel_ratio, generation);
    bind_events(&mut scene.stage);

    log::debug!("scene reloaded at {width}x{height}, generation {generation}");
    Ok(())
}
