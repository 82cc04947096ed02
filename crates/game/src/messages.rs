//! On-screen text: timed messages and the current interaction prompt.

/// One on-screen interaction prompt: "[key] action" (e.g. "[E] Board boat").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractPrompt {
    pub key: &'static str,
    pub action: String,
}

impl InteractPrompt {
    pub fn new(key: &'static str, action: impl Into<String>) -> Self {
        Self {
            key,
            action: action.into(),
        }
    }

    /// Full prompt string for the overlay.
    pub fn display_text(&self) -> String {
        format!("[{}] {}", self.key, self.action)
    }
}

#[derive(Debug, Clone)]
pub struct GameMessage {
    pub text: String,
    pub time_remaining: f32,
}

/// Message log with auto-hide timers.
#[derive(Debug)]
pub struct GameMessages {
    pub messages: Vec<GameMessage>,
    default_duration: f32,
}

impl Default for GameMessages {
    fn default() -> Self {
        Self::new()
    }
}

impl GameMessages {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            default_duration: 3.0,
        }
    }

    /// Post `text`. Returns false when it was already showing; its timer
    /// restarts instead of a second copy stacking up.
    pub fn push(&mut self, text: impl Into<String>) -> bool {
        let text = text.into();
        if let Some(existing) = self.messages.iter_mut().find(|m| m.text == text) {
            existing.time_remaining = self.default_duration;
            return false;
        }
        self.messages.push(GameMessage {
            text,
            time_remaining: self.default_duration,
        });
        if self.messages.len() > 50 {
            self.messages.remove(0);
        }
        true
    }

    pub fn info(&mut self, text: impl Into<String>) {
        let text = text.into();
        if self.push(text.clone()) {
            log::info!("{}", text);
        }
    }

    pub fn warning(&mut self, text: impl Into<String>) {
        let text = text.into();
        if self.push(text.clone()) {
            log::warn!("{}", text);
        }
    }

    /// Count down timers by `dt` seconds and drop expired messages.
    pub fn update(&mut self, dt: f32) {
        for msg in &mut self.messages {
            msg.time_remaining -= dt;
        }
        self.messages.retain(|m| m.time_remaining > 0.0);
    }

    pub fn latest(&self) -> Option<&str> {
        self.messages.last().map(|m| m.text.as_str())
    }
}
