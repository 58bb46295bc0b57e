//! Top-level client state: connection phase, login, the level session and the
//! message log, fed by transport events and key presses.

use crate::backend::RenderBackend;
use crate::input::{InputDispatcher, LoginForm};
use crate::messages::MessageLog;
use crate::network::TransportEvent;
use crate::session::{LevelSession, UpdateOutcome};
use crate::tiles::{TileGridRenderer, Tilesets};
use log::{debug, error, info, warn};
use macroquad::input::KeyCode;
use shared::{ClientMessage, ServerMessage, MESSAGE_WINDOW};
use std::path::PathBuf;

/// Settings the library needs from the command line.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub asset_dir: PathBuf,
    pub message_window: usize,
    /// Logs in with this name as soon as the connection is up.
    pub username: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            asset_dir: PathBuf::from("assets"),
            message_window: MESSAGE_WINDOW,
            username: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Connecting,
    Login,
    InGame,
    Disconnected,
}

pub struct GameClient {
    phase: Phase,
    login: LoginForm,
    input: InputDispatcher,
    session: LevelSession,
    log: MessageLog,
    outbox: Vec<ClientMessage>,
    auto_login: Option<String>,
}

impl GameClient {
    pub fn new(config: ClientConfig) -> Self {
        let tilesets = Tilesets::from_dir(&config.asset_dir);
        Self::with_tilesets(tilesets, config)
    }

    pub fn with_tilesets(tilesets: Tilesets, config: ClientConfig) -> Self {
        Self {
            phase: Phase::Connecting,
            login: LoginForm::new(),
            input: InputDispatcher::new(),
            session: LevelSession::new(TileGridRenderer::new(tilesets)),
            log: MessageLog::new(config.message_window),
            outbox: Vec::new(),
            auto_login: config.username,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn session(&self) -> &LevelSession {
        &self.session
    }

    pub fn messages(&self) -> &MessageLog {
        &self.log
    }

    pub fn login_form(&self) -> &LoginForm {
        &self.login
    }

    /// Messages queued for the server since the last call.
    pub fn drain_outbox(&mut self) -> Vec<ClientMessage> {
        std::mem::take(&mut self.outbox)
    }

    pub fn handle_event<B: RenderBackend>(&mut self, event: TransportEvent, backend: &mut B) {
        match event {
            TransportEvent::Connected => self.on_connected(),
            TransportEvent::Message(message) => self.handle_message(message, backend),
            TransportEvent::Disconnected(reason) => self.on_disconnected(&reason),
        }
    }

    fn on_connected(&mut self) {
        info!("Connected to server");
        self.log.push("[Local] Connected to server");
        self.phase = Phase::Login;

        if let Some(username) = self.auto_login.take() {
            for ch in username.chars() {
                self.login.type_char(ch);
            }
            self.submit_login();
        }
    }

    fn on_disconnected(&mut self, reason: &str) {
        warn!("Disconnected: {}", reason);
        self.log.push(format!("[Local] Disconnected: {}", reason));
        self.phase = Phase::Disconnected;
        self.outbox.clear();
    }

    pub fn handle_message<B: RenderBackend>(&mut self, message: ServerMessage, backend: &mut B) {
        match message {
            ServerMessage::LoginSuccess => {
                info!("Logged in as '{}'", self.login.username());
                self.phase = Phase::InGame;
                self.outbox.push(ClientMessage::RequestPresentLevel);
            }

            ServerMessage::PresentLevel(snapshot) => {
                if let Err(e) = self.session.present_level(snapshot, backend) {
                    error!("Level tiles could not be drawn: {}", e);
                    self.log.push(format!("[Local] Level could not be drawn: {}", e));
                }
            }

            ServerMessage::UpdateEntities(updates) => {
                if let Some(outcome) = self.session.update_entities(updates, backend) {
                    log_outcome(&outcome);
                }
            }

            ServerMessage::LevelChange => {
                let request = self.session.level_changed();
                self.outbox.push(request);
            }

            ServerMessage::Message(text) => self.log.push(text),
        }
    }

    /// Queues the login request for the entered name, if any.
    pub fn submit_login(&mut self) {
        if self.phase != Phase::Login {
            return;
        }
        if let Some(request) = self.login.submit() {
            info!("Logging in as '{}'", self.login.username());
            self.outbox.push(request);
        }
    }

    /// Handles one key press made while in game.
    pub fn handle_key(&mut self, key: KeyCode) {
        if self.phase != Phase::InGame {
            return;
        }
        if let Some(intent) = self.input.dispatch(key) {
            debug!("Key {:?} -> {:?}", key, intent);
            self.outbox.push(intent);
        }
    }

    /// Reads this frame's keyboard state for the current phase.
    pub fn poll_input(&mut self) {
        match self.phase {
            Phase::Login => {
                if let Some(request) = self.login.poll() {
                    info!("Logging in as '{}'", self.login.username());
                    self.outbox.push(request);
                }
            }
            Phase::InGame => {
                let intents = self.input.poll();
                self.outbox.extend(intents);
            }
            Phase::Connecting | Phase::Disconnected => {}
        }
    }
}

fn log_outcome(outcome: &UpdateOutcome) {
    if outcome.applied.is_noop() && outcome.sync.backend_calls() == 0 {
        return;
    }
    debug!(
        "Reconciled: +{} ~{} -{} (visuals +{} ~{} -{})",
        outcome.applied.inserted,
        outcome.applied.replaced,
        outcome.applied.removed.len(),
        outcome.sync.created,
        outcome.sync.moved,
        outcome.sync.destroyed + outcome.released,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::RecordingBackend;
    use crate::tiles::Tileset;
    use shared::{Direction, TileCode};

    fn client(username: Option<&str>) -> GameClient {
        let mut tilesets = Tilesets::in_memory();
        tilesets.insert(Tileset::new(
            "t",
            [(TileCode::from(1), 0)].into_iter().collect(),
        ));
        GameClient::with_tilesets(
            tilesets,
            ClientConfig {
                username: username.map(str::to_string),
                ..ClientConfig::default()
            },
        )
    }

    #[test]
    fn test_connect_logs_local_notice() {
        let mut client = client(None);
        let mut backend = RecordingBackend::new();
        client.handle_event(TransportEvent::Connected, &mut backend);

        assert_eq!(client.phase(), Phase::Login);
        assert_eq!(client.messages().visible(), ["[Local] Connected to server".to_string()]);
        assert!(client.drain_outbox().is_empty());
    }

    #[test]
    fn test_auto_login_on_connect() {
        let mut client = client(Some("bob"));
        let mut backend = RecordingBackend::new();
        client.handle_event(TransportEvent::Connected, &mut backend);

        assert_eq!(client.drain_outbox(), vec![ClientMessage::Login("bob".to_string())]);
    }

    #[test]
    fn test_login_success_requests_level() {
        let mut client = client(Some("bob"));
        let mut backend = RecordingBackend::new();
        client.handle_event(TransportEvent::Connected, &mut backend);
        client.drain_outbox();

        client.handle_message(ServerMessage::LoginSuccess, &mut backend);

        assert_eq!(client.phase(), Phase::InGame);
        assert_eq!(client.drain_outbox(), vec![ClientMessage::RequestPresentLevel]);
    }

    #[test]
    fn test_keys_only_dispatch_in_game() {
        let mut client = client(None);
        let mut backend = RecordingBackend::new();
        client.handle_key(KeyCode::Key8);
        assert!(client.drain_outbox().is_empty());

        client.handle_event(TransportEvent::Connected, &mut backend);
        client.handle_message(ServerMessage::LoginSuccess, &mut backend);
        client.drain_outbox();

        client.handle_key(KeyCode::Key8);
        client.handle_key(KeyCode::Key5);
        assert_eq!(
            client.drain_outbox(),
            vec![ClientMessage::movement(Direction::North)]
        );
    }

    #[test]
    fn test_level_change_requests_fresh_level() {
        let mut client = client(None);
        let mut backend = RecordingBackend::new();
        client.handle_message(ServerMessage::LevelChange, &mut backend);

        assert_eq!(client.drain_outbox(), vec![ClientMessage::RequestPresentLevel]);
        assert!(!client.session().is_loaded());
    }

    #[test]
    fn test_server_messages_are_logged() {
        let mut client = client(None);
        let mut backend = RecordingBackend::new();
        client.handle_message(
            ServerMessage::Message("You rustle through the tall grass".to_string()),
            &mut backend,
        );

        assert_eq!(client.messages().total(), 1);
    }

    #[test]
    fn test_tile_error_becomes_local_notice() {
        let mut client = client(None);
        let mut backend = RecordingBackend::new();
        let snapshot = shared::LevelSnapshot {
            level: shared::Level {
                tile_width: 8,
                tile_height: 8,
                width: 1,
                height: 1,
                tileset: "t".to_string(),
                tiles: vec![TileCode::from("lava")],
                camera_zoom: 1.0,
            },
            entities: Vec::new(),
        };

        client.handle_message(ServerMessage::PresentLevel(snapshot), &mut backend);

        assert!(client.session().is_loaded());
        assert_eq!(client.messages().total(), 1);
        assert!(client.messages().visible()[0].contains("lava"));
    }

    #[test]
    fn test_disconnect_stops_sending() {
        let mut client = client(None);
        let mut backend = RecordingBackend::new();
        client.handle_message(ServerMessage::LevelChange, &mut backend);
        client.handle_event(TransportEvent::Disconnected("reset".to_string()), &mut backend);

        assert_eq!(client.phase(), Phase::Disconnected);
        assert!(client.drain_outbox().is_empty());
        assert_eq!(client.messages().visible(), ["[Local] Disconnected: reset".to_string()]);
    }
}
