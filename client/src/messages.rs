//! Append-only log of text notices.

use shared::MESSAGE_WINDOW;

pub struct MessageLog {
    history: Vec<String>,
    window: usize,
}

impl MessageLog {
    pub fn new(window: usize) -> Self {
        Self {
            history: Vec::new(),
            window,
        }
    }

    pub fn push(&mut self, message: impl Into<String>) {
        self.history.push(message.into());
    }

    /// The most recent messages, oldest first, at most `window` of them.
    pub fn visible(&self) -> &[String] {
        let start = self.history.len().saturating_sub(self.window);
        &self.history[start..]
    }

    /// Count of every message ever pushed.
    pub fn total(&self) -> usize {
        self.history.len()
    }

    pub fn title(&self) -> String {
        format!("Messages ({})", self.total())
    }
}

impl Default for MessageLog {
    fn default() -> Self {
        Self::new(MESSAGE_WINDOW)
    }
}
