//! Input handling for keyboard and mouse.
//!
//! Window events are funneled into [`InputState`] on the frame-loop thread;
//! simulation code only ever sees the snapshot it is handed for a tick.

use glam::Vec2;
use std::collections::HashSet;

/// The fixed set of actions the game reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Forward,
    Backward,
    Left,
    Right,
    Interact,
    Jump,
    Run,
}

impl Action {
    /// Physical keys bound to this action.
    pub fn keys(self) -> &'static [KeyCode] {
        match self {
            Action::Forward => &[KeyCode::KeyW, KeyCode::ArrowUp],
            Action::Backward => &[KeyCode::KeyS, KeyCode::ArrowDown],
            Action::Left => &[KeyCode::KeyA, KeyCode::ArrowLeft],
            Action::Right => &[KeyCode::KeyD, KeyCode::ArrowRight],
            Action::Interact => &[KeyCode::KeyE],
            Action::Jump => &[KeyCode::Space],
            Action::Run => &[KeyCode::ShiftLeft],
        }
    }
}

/// Directional intent sampled once per tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MovementIntent {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub run: bool,
}

impl MovementIntent {
    pub fn forward() -> Self {
        Self {
            forward: true,
            ..Default::default()
        }
    }

    pub fn any_direction(&self) -> bool {
        self.forward || self.backward || self.left || self.right
    }

    /// Intent as a normalized vector: x = right, y = forward.
    pub fn axis(&self) -> Vec2 {
        let mut movement = Vec2::ZERO;
        if self.forward {
            movement.y += 1.0;
        }
        if self.backward {
            movement.y -= 1.0;
        }
        if self.left {
            movement.x -= 1.0;
        }
        if self.right {
            movement.x += 1.0;
        }
        movement.normalize_or_zero()
    }
}

/// Manages input state between ticks.
#[derive(Debug, Default)]
pub struct InputState {
    /// Keys currently held down.
    keys_held: HashSet<KeyCode>,
    /// Keys pressed since the last tick.
    keys_pressed: HashSet<KeyCode>,
    /// Keys released since the last tick.
    keys_released: HashSet<KeyCode>,

    /// Mouse buttons currently held.
    mouse_held: HashSet<MouseButton>,
    /// Mouse buttons pressed since the last tick.
    mouse_pressed: HashSet<MouseButton>,

    /// Mouse movement accumulated since the last tick.
    mouse_delta: Vec2,

    /// Whether the cursor is captured/locked (pointer lock).
    cursor_locked: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear per-tick edges. Call after a simulation tick has consumed them.
    pub fn end_tick(&mut self) {
        self.keys_pressed.clear();
        self.keys_released.clear();
        self.mouse_pressed.clear();
        self.mouse_delta = Vec2::ZERO;
    }

    /// Process a keyboard event.
    pub fn process_keyboard(&mut self, key: KeyCode, state: ElementState) {
        match state {
            ElementState::Pressed => {
                if !self.keys_held.contains(&key) {
                    self.keys_pressed.insert(key);
                }
                self.keys_held.insert(key);
            }
            ElementState::Released => {
                self.keys_held.remove(&key);
                self.keys_released.insert(key);
            }
        }
    }

    /// Process a mouse button event.
    pub fn process_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        match state {
            ElementState::Pressed => {
                if !self.mouse_held.contains(&button) {
                    self.mouse_pressed.insert(button);
                }
                self.mouse_held.insert(button);
            }
            ElementState::Released => {
                self.mouse_held.remove(&button);
            }
        }
    }

    /// Process raw mouse movement.
    pub fn process_mouse_motion(&mut self, delta: (f64, f64)) {
        self.mouse_delta.x += delta.0 as f32;
        self.mouse_delta.y += delta.1 as f32;
    }

    /// Check if a key is currently held.
    pub fn is_key_held(&self, key: KeyCode) -> bool {
        self.keys_held.contains(&key)
    }

    /// Check if a key was pressed since the last tick.
    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    /// Check if a key was released since the last tick.
    pub fn is_key_released(&self, key: KeyCode) -> bool {
        self.keys_released.contains(&key)
    }

    pub fn is_action_held(&self, action: Action) -> bool {
        action.keys().iter().any(|&k| self.is_key_held(k))
    }

    pub fn is_action_pressed(&self, action: Action) -> bool {
        action.keys().iter().any(|&k| self.is_key_pressed(k))
    }

    /// Check if interact was pressed (E).
    pub fn is_interact_pressed(&self) -> bool {
        self.is_action_pressed(Action::Interact)
    }

    /// Check if jump was pressed (Space).
    pub fn is_jump_pressed(&self) -> bool {
        self.is_action_pressed(Action::Jump)
    }

    /// Check if the primary button was clicked since the last tick.
    pub fn is_click_pressed(&self) -> bool {
        self.mouse_pressed.contains(&MouseButton::Left)
    }

    /// Get the mouse movement accumulated since the last tick.
    pub fn mouse_delta(&self) -> Vec2 {
        self.mouse_delta
    }

    /// Check if the cursor is locked.
    pub fn is_cursor_locked(&self) -> bool {
        self.cursor_locked
    }

    /// Set cursor lock state.
    pub fn set_cursor_locked(&mut self, locked: bool) {
        if locked != self.cursor_locked {
            log::debug!("Pointer lock {}", if locked { "engaged" } else { "released" });
        }
        self.cursor_locked = locked;
    }

    /// Snapshot the held directional and run actions.
    pub fn movement_intent(&self) -> MovementIntent {
        MovementIntent {
            forward: self.is_action_held(Action::Forward),
            backward: self.is_action_held(Action::Backward),
            left: self.is_action_held(Action::Left),
            right: self.is_action_held(Action::Right),
            run: self.is_action_held(Action::Run),
        }
    }
}

// Re-export for convenience
pub use winit::event::{ElementState, MouseButton};
pub use winit::keyboard::KeyCode;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrows_and_wasd_share_actions() {
        let mut input = InputState::new();
        input.process_keyboard(KeyCode::ArrowUp, ElementState::Pressed);
        input.process_keyboard(KeyCode::KeyA, ElementState::Pressed);
        let intent = input.movement_intent();
        assert!(intent.forward && intent.left);
        assert!(!intent.backward && !intent.right);
    }

    #[test]
    fn pressed_edges_clear_at_end_of_tick() {
        let mut input = InputState::new();
        input.process_keyboard(KeyCode::KeyE, ElementState::Pressed);
        assert!(input.is_interact_pressed());
        input.end_tick();
        assert!(!input.is_interact_pressed());
        assert!(input.is_action_held(Action::Interact));

        // Key repeat while held is not a new edge.
        input.process_keyboard(KeyCode::KeyE, ElementState::Pressed);
        assert!(!input.is_interact_pressed());
    }

    #[test]
    fn click_edge_and_mouse_delta_accumulate_until_consumed() {
        let mut input = InputState::new();
        input.process_mouse_button(MouseButton::Left, ElementState::Pressed);
        input.process_mouse_motion((3.0, -1.0));
        input.process_mouse_motion((2.0, 1.0));
        assert!(input.is_click_pressed());
        assert_eq!(input.mouse_delta(), Vec2::new(5.0, 0.0));
        input.end_tick();
        assert!(!input.is_click_pressed());
        assert_eq!(input.mouse_delta(), Vec2::ZERO);
    }

    #[test]
    fn diagonal_axis_is_normalized() {
        let intent = MovementIntent {
            forward: true,
            right: true,
            ..Default::default()
        };
        assert!((intent.axis().length() - 1.0).abs() < 1e-6);
        assert_eq!(MovementIntent::default().axis(), Vec2::ZERO);
    }
}
