//! Window-side game state: the session plus the things only a live window has.

use crate::config::GameConfig;
use crate::session::Session;
use engine_core::{SceneTree, Time};
use input::InputState;
use std::sync::Arc;
use winit::window::{CursorGrabMode, Window};

pub const TITLE: &str = "Archipelago";

pub struct GameState {
    pub window: Arc<Window>,
    pub session: Session<SceneTree>,
    pub input: InputState,
    pub time: Time,
    pub running: bool,
    title: String,
}

impl GameState {
    pub fn new(window: Arc<Window>, config: GameConfig) -> Self {
        let session = Session::new(config, SceneTree::new(), audio::open_default());
        Self {
            window,
            session,
            input: InputState::new(),
            time: Time::new(),
            running: true,
            title: TITLE.to_string(),
        }
    }

    /// Run every fixed step that is due, then refresh the title.
    pub(crate) fn update(&mut self) {
        self.time.update();
        while self.time.should_fixed_update() {
            let dt_ms = self.time.fixed_timestep_millis();
            self.session.tick(&self.input, dt_ms);
            self.input.end_tick();
        }

        let title = match self.session.status() {
            Some(status) => format!("{} - {}", TITLE, status),
            None => TITLE.to_string(),
        };
        if title != self.title {
            self.window.set_title(&title);
            self.title = title;
        }

        if self.time.frame_count() % 600 == 0 {
            log::debug!(
                "{:.0} fps at {:.0} ms, {} scene instances",
                self.time.fps(),
                self.session.clock_ms(),
                self.session.scene().instances().len()
            );
        }
    }

    pub(crate) fn lock_cursor(&mut self) {
        let _ = self
            .window
            .set_cursor_grab(CursorGrabMode::Locked)
            .or_else(|_| self.window.set_cursor_grab(CursorGrabMode::Confined));
        self.window.set_cursor_visible(false);
        self.input.set_cursor_locked(true);
    }

    pub(crate) fn release_cursor(&mut self) {
        let _ = self.window.set_cursor_grab(CursorGrabMode::None);
        self.window.set_cursor_visible(true);
        self.input.set_cursor_locked(false);
    }
}
