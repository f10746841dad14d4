//! Input abstraction layer.
//!
//! Normalizes mouse, touch, and wheel events into a unified `InputEvent`.
//! Positions are in stage-container coordinates (CSS pixels relative to the
//! editor's drawing surface).

use annota_core::{GestureClass, Point};

#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Mouse click.
    Click { x: f64, y: f64 },
    /// Touch tap; routed exactly like a click.
    Tap { x: f64, y: f64 },

    /// Pointer pressed (mouse down, touch start).
    PointerDown {
        x: f64,
        y: f64,
        /// Pressure from 0.0 (none) to 1.0 (max). Mouse is always 1.0.
        pressure: f32,
    },

    /// Pointer moved (mouse move, touch move).
    PointerMove { x: f64, y: f64, pressure: f32 },

    /// Pointer released (mouse up, touch end).
    PointerUp { x: f64, y: f64 },

    /// Pointer left the drawing surface; forgets the tracked position.
    PointerLeave,

    /// Wheel notch. Zooms about the last tracked pointer position.
    Wheel {
        delta_y: f64,
        /// Trackpad pinch arrives as ctrl+wheel.
        ctrl_key: bool,
    },
}

impl InputEvent {
    pub fn click(x: f64, y: f64) -> Self {
        Self::Click { x, y }
    }

    pub fn pointer_down(x: f64, y: f64) -> Self {
        Self::PointerDown {
            x,
            y,
            pressure: 1.0,
        }
    }

    pub fn pointer_move(x: f64, y: f64) -> Self {
        Self::PointerMove {
            x,
            y,
            pressure: 1.0,
        }
    }

    pub fn pointer_up(x: f64, y: f64) -> Self {
        Self::PointerUp { x, y }
    }

    pub fn wheel(delta_y: f64) -> Self {
        Self::Wheel {
            delta_y,
            ctrl_key: false,
        }
    }

    /// Gesture class a stage handler must be bound for. `PointerLeave` is
    /// bookkeeping only and has none.
    pub fn gesture(&self) -> Option<GestureClass> {
        match self {
            Self::Click { .. } | Self::Tap { .. } => Some(GestureClass::Click),
            Self::PointerDown { .. } => Some(GestureClass::PointerDown),
            Self::PointerMove { .. } => Some(GestureClass::PointerMove),
            Self::PointerUp { .. } => Some(GestureClass::PointerUp),
            Self::Wheel { .. } => Some(GestureClass::Wheel),
            Self::PointerLeave => None,
        }
    }

    /// Extract position if this is a pointer event.
    pub fn position(&self) -> Option<Point> {
        match self {
            Self::Click { x, y }
            | Self::Tap { x, y }
            | Self::PointerDown { x, y, .. }
            | Self::PointerMove { x, y, .. }
            | Self::PointerUp { x, y } => Some(Point::new(*x, *y)),
            Self::PointerLeave | Self::Wheel { .. } => None,
        }
    }
}
