//! Input abstraction layer.
//!
//! Normalizes DOM mouse, wheel, and keyboard events into a unified
//! `InputEvent` enum. Pointer coordinates are in screen pixels relative to
//! the canvas element; the engine converts them to logical space.

/// Modifier keys held during an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub const SHIFT: Self = Self {
        shift: true,
        ..Self::NONE
    };

    pub const ALT: Self = Self {
        alt: true,
        ..Self::NONE
    };
}

/// A normalized input event.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Primary button pressed.
    PointerDown { x: f64, y: f64, modifiers: Modifiers },

    /// Pointer moved, with or without a button held.
    PointerMove { x: f64, y: f64, modifiers: Modifiers },

    /// Primary button released.
    PointerUp { x: f64, y: f64, modifiers: Modifiers },

    /// Double click on the canvas.
    DoubleClick { x: f64, y: f64 },

    /// Mouse wheel; negative `delta_y` zooms in.
    Wheel { x: f64, y: f64, delta_y: f64 },

    KeyDown { key: String, modifiers: Modifiers },

    KeyUp { key: String, modifiers: Modifiers },
}

impl InputEvent {
    pub fn pointer_down(x: f64, y: f64, modifiers: Modifiers) -> Self {
        Self::PointerDown { x, y, modifiers }
    }

    pub fn pointer_move(x: f64, y: f64, modifiers: Modifiers) -> Self {
        Self::PointerMove { x, y, modifiers }
    }

    pub fn pointer_up(x: f64, y: f64, modifiers: Modifiers) -> Self {
        Self::PointerUp { x, y, modifiers }
    }

    pub fn key_down(key: &str, modifiers: Modifiers) -> Self {
        Self::KeyDown {
            key: key.to_string(),
            modifiers,
        }
    }

    pub fn key_up(key: &str, modifiers: Modifiers) -> Self {
        Self::KeyUp {
            key: key.to_string(),
            modifiers,
        }
    }
}
