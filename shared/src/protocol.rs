//! Named events exchanged with the server, and their line framing.
//!
//! Each frame is one JSON object on its own line:
//! `{"event": "<name>", "data": <payload>}`. Payload-less events omit `data`.

use crate::model::{lenient_seq, EntityUpdate, LevelSnapshot};
use serde::{Deserialize, Deserializer, Serialize};

/// Movement direction, named by its numeric keypad key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "1")]
    SouthWest,
    #[serde(rename = "2")]
    South,
    #[serde(rename = "3")]
    SouthEast,
    #[serde(rename = "4")]
    West,
    #[serde(rename = "6")]
    East,
    #[serde(rename = "7")]
    NorthWest,
    #[serde(rename = "8")]
    North,
    #[serde(rename = "9")]
    NorthEast,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::SouthWest,
        Direction::South,
        Direction::SouthEast,
        Direction::West,
        Direction::East,
        Direction::NorthWest,
        Direction::North,
        Direction::NorthEast,
    ];

    /// The keypad digit this direction is sent as.
    pub fn key(self) -> char {
        match self {
            Direction::SouthWest => '1',
            Direction::South => '2',
            Direction::SouthEast => '3',
            Direction::West => '4',
            Direction::East => '6',
            Direction::NorthWest => '7',
            Direction::North => '8',
            Direction::NorthEast => '9',
        }
    }

    pub fn from_key(key: char) -> Option<Direction> {
        Direction::ALL.into_iter().find(|dir| dir.key() == key)
    }
}

/// Player intent carried by an `action` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum Action {
    #[serde(rename = "move")]
    Move { dir: Direction },
}

/// Events sent by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientMessage {
    #[serde(rename = "login")]
    Login(String),
    #[serde(rename = "request present level")]
    RequestPresentLevel,
    #[serde(rename = "action")]
    Action(Action),
}

impl ClientMessage {
    pub fn movement(dir: Direction) -> Self {
        ClientMessage::Action(Action::Move { dir })
    }
}

/// Events sent by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerMessage {
    #[serde(rename = "present level")]
    PresentLevel(LevelSnapshot),
    #[serde(rename = "update entities")]
    UpdateEntities(#[serde(deserialize_with = "lenient_updates")] Vec<EntityUpdate>),
    #[serde(rename = "level change")]
    LevelChange,
    #[serde(rename = "message")]
    Message(String),
    #[serde(rename = "login success")]
    LoginSuccess,
}

fn lenient_updates<'de, D>(deserializer: D) -> Result<Vec<EntityUpdate>, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_seq(deserializer)
}

/// Serializes a message as one newline-terminated frame.
pub fn encode_frame<T: Serialize>(message: &T) -> Result<Vec<u8>, serde_json::Error> {
    let mut frame = serde_json::to_vec(message)?;
    frame.push(b'\n');
    Ok(frame)
}

/// Parses one frame. Surrounding whitespace (including the terminator) is
/// ignored.
pub fn decode_frame<T: for<'de> Deserialize<'de>>(line: &str) -> Result<T, serde_json::Error> {
    serde_json::from_str(line.trim())
}
