//! # Shared Protocol Library
//!
//! Data model and wire protocol spoken between the game server and the
//! client. The server is the only source of truth for levels and entities;
//! these types describe what it sends and what the client may send back.
//!
//! - [`model`]: levels, entities, components and incremental updates
//! - [`protocol`]: named events and the newline-delimited JSON framing

pub mod model;
pub mod protocol;

pub use model::{
    Components, Entity, EntityId, EntityUpdate, Level, LevelSnapshot, Position, Sprite,
    TileCode, DEFAULT_SPRITE,
};
pub use protocol::{
    decode_frame, encode_frame, Action, ClientMessage, Direction, ServerMessage,
};

/// Number of messages shown in the message log.
pub const MESSAGE_WINDOW: usize = 20;

/// Longest username the login form accepts.
pub const MAX_USERNAME_LEN: usize = 20;

/// Port the reference server listens on.
pub const DEFAULT_PORT: u16 = 3000;
