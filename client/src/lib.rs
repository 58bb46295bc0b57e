//! # Game Client Library
//!
//! Client-side implementation of the tile-based multiplayer game. The server
//! is authoritative for everything in the world; the client mirrors what it
//! is told, draws it, and forwards the player's intents.
//!
//! ## Architecture Overview
//!
//! ### Passive Mirror
//! The client runs no simulation and makes no predictions. Every change to a
//! level or an entity arrives from the server, either as a full level
//! snapshot or as an incremental batch of entity updates, and is applied in
//! arrival order before the next message is looked at.
//!
//! ### Incremental Reconciliation
//! Entity update batches create, replace and retire entities by id without
//! rebuilding the whole set. Entities the batch does not mention are left
//! untouched, and so are their on-screen visuals.
//!
//! ### Visuals As Derived State
//! Every drawable entity (one with a `sprite` component) owns exactly one
//! visual in the graphics backend. Visuals are created lazily, moved in
//! place, and destroyed when their entity is retired or stops being
//! drawable. Re-syncing unchanged data costs no backend calls.
//!
//! ## Module Organization
//!
//! ### Tiles (`tiles`)
//! Tileset tables and the tile grid renderer: resolves every cell of a level
//! through its tileset and reports unknown tile types instead of guessing.
//!
//! ### Entities (`entities`)
//! The entity store and its update-batch reconciliation.
//!
//! ### Visuals (`visuals`)
//! Binding of entity ids to backend visual handles.
//!
//! ### Session (`session`)
//! The current-level state machine: full replacement on a level snapshot,
//! reconciliation on updates, and forgetting the level on a level change.
//!
//! ### Game (`game`)
//! Connection phase, login, the message log and routing of transport events
//! and key presses.
//!
//! ### Network (`network`)
//! Newline-delimited JSON over TCP on a background thread.
//!
//! ### Backend and Rendering (`backend`, `rendering`)
//! The drawing interface the core needs, a recording implementation for
//! tests and headless runs, and the macroquad implementation for the window.
//!
//! ## Usage Example
//!
//! ```no_run
//! use client::backend::RecordingBackend;
//! use client::game::{ClientConfig, GameClient};
//! use client::network::Connection;
//!
//! let mut connection = Connection::open("127.0.0.1:3000")?;
//! let mut game = GameClient::new(ClientConfig {
//!     username: Some("alice".to_string()),
//!     ..ClientConfig::default()
//! });
//! let mut backend = RecordingBackend::new();
//!
//! while let Some(event) = connection.recv_blocking() {
//!     game.handle_event(event, &mut backend);
//!     for message in game.drain_outbox() {
//!         connection.send(message)?;
//!     }
//! }
//! # Ok::<(), client::network::TransportError>(())
//! ```

pub mod backend;
pub mod entities;
pub mod game;
pub mod input;
pub mod messages;
pub mod network;
pub mod rendering;
pub mod session;
pub mod tiles;
pub mod visuals;
