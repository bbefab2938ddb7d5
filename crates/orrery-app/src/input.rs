//! Frame-coherent pointer state.
//!
//! [`PointerState`] accumulates winit cursor, button and wheel events during a
//! frame; the orbit controls and hover picking read it, then
//! [`clear_transients`](PointerState::clear_transients) resets the per-frame
//! deltas.

use glam::Vec2;
use winit::event::{ElementState, MouseButton, MouseScrollDelta};

/// Pixels of a trackpad scroll that count as one wheel line.
const PIXELS_PER_LINE: f64 = 40.0;

#[derive(Debug, Clone, Copy, Default)]
struct ButtonFrame {
    pressed: bool,
    just_pressed: bool,
}

fn button_index(button: MouseButton) -> Option<usize> {
    match button {
        MouseButton::Left => Some(0),
        MouseButton::Right => Some(1),
        MouseButton::Middle => Some(2),
        _ => None,
    }
}

#[derive(Debug, Clone, Default)]
pub struct PointerState {
    position: Vec2,
    delta: Vec2,
    buttons: [ButtonFrame; 3],
    scroll: f32,
    in_window: bool,
}

impl PointerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_cursor_moved(&mut self, x: f64, y: f64) {
        let new_pos = Vec2::new(x as f32, y as f32);
        // The first position after entering is a jump, not a drag.
        if self.in_window {
            self.delta += new_pos - self.position;
        }
        self.position = new_pos;
        self.in_window = true;
    }

    pub fn on_button(&mut self, button: MouseButton, state: ElementState) {
        let Some(idx) = button_index(button) else {
            return;
        };
        match state {
            ElementState::Pressed => {
                self.buttons[idx].pressed = true;
                self.buttons[idx].just_pressed = true;
            }
            ElementState::Released => self.buttons[idx].pressed = false,
        }
    }

    pub fn on_scroll(&mut self, delta: MouseScrollDelta) {
        match delta {
            MouseScrollDelta::LineDelta(_x, y) => self.scroll += y,
            MouseScrollDelta::PixelDelta(pos) => self.scroll += (pos.y / PIXELS_PER_LINE) as f32,
        }
    }

    pub fn on_cursor_left(&mut self) {
        self.in_window = false;
        for b in &mut self.buttons {
            b.pressed = false;
        }
    }

    /// Clears delta, scroll and just-pressed flags.
    pub fn clear_transients(&mut self) {
        self.delta = Vec2::ZERO;
        self.scroll = 0.0;
        for b in &mut self.buttons {
            b.just_pressed = false;
        }
    }

    /// Cursor position in physical pixels.
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Movement since the last clear.
    pub fn delta(&self) -> Vec2 {
        self.delta
    }

    pub fn is_pressed(&self, button: MouseButton) -> bool {
        button_index(button).is_some_and(|i| self.buttons[i].pressed)
    }

    pub fn just_pressed(&self, button: MouseButton) -> bool {
        button_index(button).is_some_and(|i| self.buttons[i].just_pressed)
    }

    /// Wheel lines since the last clear; positive scrolls up.
    pub fn scroll(&self) -> f32 {
        self.scroll
    }

    pub fn in_window(&self) -> bool {
        self.in_window
    }
}
