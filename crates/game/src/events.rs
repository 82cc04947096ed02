//! Window and device event handling for GameState.

use winit::event::{DeviceEvent, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::state::GameState;

impl GameState {
    /// Handle a window event. Returns true if the app should exit.
    pub(crate) fn handle_window_event(&mut self, event: WindowEvent) -> bool {
        match event {
            WindowEvent::CloseRequested => {
                self.running = false;
                true
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    self.input.process_keyboard(key, event.state);
                    if key == KeyCode::Escape && event.state.is_pressed() {
                        self.release_cursor();
                    }
                }
                false
            }
            WindowEvent::MouseInput { state, button, .. } => {
                // The click that takes the pointer lock is not a game click.
                if state.is_pressed() && !self.input.is_cursor_locked() {
                    self.lock_cursor();
                } else {
                    self.input.process_mouse_button(button, state);
                }
                false
            }
            WindowEvent::Focused(false) => {
                self.release_cursor();
                false
            }
            WindowEvent::RedrawRequested => {
                self.update();
                self.window.request_redraw();
                false
            }
            _ => false,
        }
    }

    /// Handle device events (raw mouse motion).
    pub(crate) fn handle_device_event(&mut self, event: DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta } = event {
            if self.input.is_cursor_locked() {
                self.input.process_mouse_motion(delta);
            }
        }
    }
}
