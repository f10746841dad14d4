//! Event router: stage bindings and input dispatch.
//!
//! The router owns one handler per gesture class on the stage. An event
//! whose class has no handler bound is dropped. Bound events are turned
//! into hook calls on the active plugin, with two pieces of engine-side
//! behaviour layered on top:
//!
//! - **Shape-click switching**: clicking a named node owned by another
//!   plugin switches to that plugin and hands it the click on the next tick.
//! - **Viewport gestures**: wheel zoom and drag panning of the stage (or of
//!   both layers while a zoom tool holds them).

use crate::editor::Editor;
use crate::input::InputEvent;
use crate::plugin::{Hook, PluginInfo};
use crate::tasks::Task;
use annota_core::viewport::{pan, wheel_zoom};
use annota_core::{GestureClass, HitTarget, Point, Stage, WheelStep};
use annota_render::hit_test;

/// Bind exactly one handler per gesture class.
pub fn bind_events(stage: &mut Stage) {
    stage.off_all();
    for gesture in GestureClass::ALL {
        stage.on(gesture);
    }
}

pub fn unbind_events(stage: &mut Stage) {
    stage.off_all();
}

/// Plugin that should take over a click on a shape named `name`, if any.
///
/// A plugin whose selector matches is skipped when the active plugin
/// already owns that shape kind; the active plugin handles the click.
pub fn shape_owner(plugins: &[PluginInfo], current: Option<usize>, name: &str) -> Option<usize> {
    let current_selector = current
        .and_then(|i| plugins.get(i))
        .and_then(|p| p.shape_selector.as_deref());
    if current_selector == Some(name) {
        return None;
    }
    plugins
        .iter()
        .position(|p| p.shape_selector.as_deref() == Some(name))
}

/// What is being dragged by the current gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragTarget {
    Stage,
    /// Image and draw layers together.
    Layers,
}

/// Pointer bookkeeping across events.
#[derive(Debug, Clone, Default)]
pub struct PointerState {
    /// Last known position in stage-container coordinates.
    pub position: Option<Point>,
    /// Scene generation the current press began in.
    pub(crate) gesture: Option<u64>,
    pub(crate) drag: Option<(DragTarget, Point)>,
}

impl PointerState {
    fn end_gesture(&mut self) {
        self.gesture = None;
        self.drag = None;
    }
}

/// Result of one [`Editor::dispatch`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// A handler was bound for the event.
    pub delivered: bool,
    /// The host should suppress its default action (page scroll on wheel).
    pub default_prevented: bool,
}

impl Editor {
    /// Route one input event.
    pub fn dispatch(&mut self, event: InputEvent) -> DispatchOutcome {
        let Some(gesture) = event.gesture() else {
            self.pointer.position = None;
            self.pointer.drag = None;
            return DispatchOutcome::default();
        };
        if !self.scene.stage.is_bound(gesture) {
            log::trace!("no handler bound for {gesture:?}, dropping {event:?}");
            return DispatchOutcome::default();
        }
        if let Some(p) = event.position() {
            self.pointer.position = Some(p);
        }

        let delivered = DispatchOutcome {
            delivered: true,
            default_prevented: false,
        };
        match gesture {
            GestureClass::Click => self.route_click(event),
            GestureClass::PointerDown => self.route_pointer_down(event),
            GestureClass::PointerMove | GestureClass::PointerUp => {
                if let Some(started) = self.pointer.gesture
                    && started != self.scene.generation
                {
                    log::debug!("dropping {gesture:?} from a gesture begun before reload");
                    if gesture == GestureClass::PointerUp {
                        self.pointer.end_gesture();
                    }
                    return delivered;
                }
                self.route_pointer(gesture, event);
            }
            GestureClass::Wheel => {
                self.route_wheel(&event);
                return DispatchOutcome {
                    delivered: true,
                    default_prevented: true,
                };
            }
        }
        delivered
    }

    fn hit(&self, event: &InputEvent) -> HitTarget {
        event
            .position()
            .map_or(HitTarget::Stage, |p| hit_test(&self.scene, p))
    }

    fn route_click(&mut self, event: InputEvent) {
        let target = self.hit(&event);

        if let Some(name) = target.shape_name()
            && let Some(owner) =
                shape_owner(self.plugins.infos(), self.context.current, name)
        {
            log::debug!(
                "click on `{name}` shape hands over to {:?}",
                self.plugins.info(owner).map(|p| p.name.as_str())
            );
            self.tasks.push(Task::ShapeClick {
                plugin: owner,
                event,
                target,
                generation: self.scene.generation,
            });
            self.change_plugin(owner, false);
            return;
        }

        if let Some(current) = self.context.current {
            let generation = self.scene.generation;
            self.invoke(current, Hook::Click, Some(&event), Some(&target), generation);
        }
    }

    fn route_pointer_down(&mut self, event: InputEvent) {
        self.pointer.gesture = Some(self.scene.generation);
        self.pointer.drag = event.position().and_then(|p| {
            if self.scene.stage.draggable {
                Some((DragTarget::Stage, p))
            } else if self.scene.image_layer.draggable && self.scene.draw_layer.draggable {
                Some((DragTarget::Layers, p))
            } else {
                None
            }
        });
        self.route_pointer(GestureClass::PointerDown, event);
    }

    fn route_pointer(&mut self, gesture: GestureClass, event: InputEvent) {
        if gesture == GestureClass::PointerMove
            && let Some((target, last)) = self.pointer.drag
            && let Some(p) = event.position()
        {
            let delta = p - last;
            match target {
                DragTarget::Stage => pan(&mut self.scene.stage.transform, delta),
                DragTarget::Layers => {
                    pan(&mut self.scene.image_layer.transform, delta);
                    pan(&mut self.scene.draw_layer.transform, delta);
                }
            }
            self.pointer.drag = Some((target, p));
        }
        if gesture == GestureClass::PointerUp {
            self.pointer.end_gesture();
        }

        let Some(current) = self.context.current else {
            return;
        };
        let hook = match gesture {
            GestureClass::PointerDown => Hook::DrawStart,
            GestureClass::PointerMove => Hook::Draw,
            _ => Hook::DrawEnd,
        };
        let target = self.hit(&event);
        let generation = self.scene.generation;
        self.invoke(current, hook, Some(&event), Some(&target), generation);
    }

    fn route_wheel(&mut self, event: &InputEvent) {
        let InputEvent::Wheel { delta_y, ctrl_key } = *event else {
            return;
        };
        let outcome = wheel_zoom(
            &mut self.scene.stage.transform,
            self.pointer.position,
            WheelStep { delta_y, ctrl_key },
            self.context.config.zoom_ratio,
            self.context.config.enable_zoom,
        );
        log::trace!("wheel: {outcome:?}");
    }
}
