//! Keyboard input: login text entry and movement intents.

use macroquad::input::{get_char_pressed, get_keys_pressed, is_key_pressed, KeyCode};
use shared::{ClientMessage, Direction, MAX_USERNAME_LEN};

/// Direction for a movement key. Both the top-row digits and the numeric
/// keypad are accepted; every other key maps to nothing.
pub fn direction_for_key(key: KeyCode) -> Option<Direction> {
    match key {
        KeyCode::Key1 | KeyCode::Kp1 => Some(Direction::SouthWest),
        KeyCode::Key2 | KeyCode::Kp2 => Some(Direction::South),
        KeyCode::Key3 | KeyCode::Kp3 => Some(Direction::SouthEast),
        KeyCode::Key4 | KeyCode::Kp4 => Some(Direction::West),
        KeyCode::Key6 | KeyCode::Kp6 => Some(Direction::East),
        KeyCode::Key7 | KeyCode::Kp7 => Some(Direction::NorthWest),
        KeyCode::Key8 | KeyCode::Kp8 => Some(Direction::North),
        KeyCode::Key9 | KeyCode::Kp9 => Some(Direction::NorthEast),
        _ => None,
    }
}

/// Turns key presses into movement intents. Holds no state: every key press
/// yields at most one message.
#[derive(Debug, Default, Clone, Copy)]
pub struct InputDispatcher;

impl InputDispatcher {
    pub fn new() -> Self {
        Self
    }

    pub fn dispatch(&self, key: KeyCode) -> Option<ClientMessage> {
        direction_for_key(key).map(ClientMessage::movement)
    }

    /// Intents for the keys pressed since the last frame.
    pub fn poll(&self) -> Vec<ClientMessage> {
        get_keys_pressed()
            .into_iter()
            .filter_map(|key| self.dispatch(key))
            .collect()
    }
}

/// Username entry shown before login.
#[derive(Debug, Default, Clone)]
pub struct LoginForm {
    username: String,
}

impl LoginForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn accepts(ch: char) -> bool {
        ch == ' ' || ch.is_ascii_alphanumeric()
    }

    /// Appends `ch` if it is allowed and the name is not full.
    pub fn type_char(&mut self, ch: char) -> bool {
        if !Self::accepts(ch) || self.username.len() >= MAX_USERNAME_LEN {
            return false;
        }
        self.username.push(ch);
        true
    }

    pub fn backspace(&mut self) {
        self.username.pop();
    }

    /// The login request for the entered name, if there is one.
    pub fn submit(&self) -> Option<ClientMessage> {
        if self.username.trim().is_empty() {
            return None;
        }
        Some(ClientMessage::Login(self.username.clone()))
    }

    /// Applies this frame's typing and returns a login request when Enter
    /// was pressed.
    pub fn poll(&mut self) -> Option<ClientMessage> {
        while let Some(ch) = get_char_pressed() {
            self.type_char(ch);
        }
        if is_key_pressed(KeyCode::Backspace) {
            self.backspace();
        }
        if is_key_pressed(KeyCode::Enter) || is_key_pressed(KeyCode::KpEnter) {
            return self.submit();
        }
        None
    }
}
