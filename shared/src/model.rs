//! Level and entity data as the server describes it.

use log::warn;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Sprite asset used when a `sprite` component does not name one.
pub const DEFAULT_SPRITE: &str = "player";

/// Opaque entity identifier. The server sends integers, but any JSON string
/// is accepted too; ids compare by value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Number(u64),
    Text(String),
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Number(n) => write!(f, "{}", n),
            EntityId::Text(s) => f.write_str(s),
        }
    }
}

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        EntityId::Number(id)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        EntityId::Text(id.to_string())
    }
}

/// A tile type code from the level grid, e.g. `"ground"` or `3`.
///
/// Codes are keys into a tileset table, so integer codes are normalized to
/// their decimal text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TileCode(String);

impl TileCode {
    pub fn new(code: impl Into<String>) -> Self {
        TileCode(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TileCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TileCode {
    fn from(code: &str) -> Self {
        TileCode::new(code)
    }
}

impl From<u32> for TileCode {
    fn from(code: u32) -> Self {
        TileCode(code.to_string())
    }
}

impl<'de> Deserialize<'de> for TileCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(i64),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Int(n) => TileCode(n.to_string()),
            Raw::Text(s) => TileCode(s),
        })
    }
}

fn default_zoom() -> f32 {
    1.0
}

/// Grid, tileset and camera description of the current level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub tile_width: u32,
    pub tile_height: u32,
    pub width: u32,
    pub height: u32,
    pub tileset: String,
    /// Row-major: the tile at `(x, y)` is `tiles[y * width + x]`.
    pub tiles: Vec<TileCode>,
    #[serde(default = "default_zoom")]
    pub camera_zoom: f32,
}

impl Level {
    pub fn cell_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn index_of(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    pub fn tile_at(&self, x: u32, y: u32) -> Option<&TileCode> {
        self.index_of(x, y).and_then(|index| self.tiles.get(index))
    }

    /// Top-left pixel of a grid position.
    pub fn pixel_position(&self, position: Position) -> (f32, f32) {
        (
            position.x * self.tile_width as f32,
            position.y * self.tile_height as f32,
        )
    }

    pub fn pixel_size(&self) -> (f32, f32) {
        (
            self.width as f32 * self.tile_width as f32,
            self.height as f32 * self.tile_height as f32,
        )
    }
}

/// Location in tile-grid units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Marks an entity as drawable. Any value under the `sprite` component key
/// counts as present; the optional inner `sprite` field names the asset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sprite {
    #[serde(rename = "sprite", default, skip_serializing_if = "Option::is_none")]
    pub asset: Option<String>,
}

impl Sprite {
    pub fn named(asset: impl Into<String>) -> Self {
        Self {
            asset: Some(asset.into()),
        }
    }

    pub fn asset(&self) -> &str {
        self.asset.as_deref().unwrap_or(DEFAULT_SPRITE)
    }
}

/// Component data of one entity.
///
/// `position` and `sprite` are the kinds the client interprets; every other
/// kind is carried verbatim in `extra`. On the wire this is a single JSON
/// object keyed by component kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, Value>", into = "BTreeMap<String, Value>")]
pub struct Components {
    pub position: Option<Position>,
    pub sprite: Option<Sprite>,
    pub extra: BTreeMap<String, Value>,
}

impl Components {
    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.position = Some(Position::new(x, y));
        self
    }

    pub fn with_sprite(mut self, sprite: Sprite) -> Self {
        self.sprite = Some(sprite);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.position.is_none() && self.sprite.is_none() && self.extra.is_empty()
    }
}

impl From<BTreeMap<String, Value>> for Components {
    fn from(mut raw: BTreeMap<String, Value>) -> Self {
        let position = match raw.remove("position") {
            Some(value) => match serde_json::from_value::<Position>(value.clone()) {
                Ok(position) => Some(position),
                Err(e) => {
                    warn!("Keeping unparseable position component opaque: {}", e);
                    raw.insert("position".to_string(), value);
                    None
                }
            },
            None => None,
        };

        let sprite = raw
            .remove("sprite")
            .map(|value| serde_json::from_value::<Sprite>(value).unwrap_or_default());

        Components {
            position,
            sprite,
            extra: raw,
        }
    }
}

impl From<Components> for BTreeMap<String, Value> {
    fn from(components: Components) -> Self {
        let mut raw = components.extra;
        if let Some(position) = components.position {
            if let Ok(value) = serde_json::to_value(position) {
                raw.insert("position".to_string(), value);
            }
        }
        if let Some(sprite) = components.sprite {
            if let Ok(value) = serde_json::to_value(sprite) {
                raw.insert("sprite".to_string(), value);
            }
        }
        raw
    }
}

fn default_active() -> bool {
    true
}

/// One server-tracked game object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub components: Components,
}

impl Entity {
    pub fn new(id: impl Into<EntityId>, components: Components) -> Self {
        Self {
            id: id.into(),
            active: true,
            components,
        }
    }
}

/// Incremental change to one entity.
///
/// `active: Some(false)` retires the entity. `components: None` leaves the
/// entity's data untouched; `Some` replaces the whole mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityUpdate {
    pub id: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<Components>,
}

impl EntityUpdate {
    pub fn components(id: impl Into<EntityId>, components: Components) -> Self {
        Self {
            id: id.into(),
            active: None,
            components: Some(components),
        }
    }

    pub fn retire(id: impl Into<EntityId>) -> Self {
        Self {
            id: id.into(),
            active: Some(false),
            components: None,
        }
    }

    pub fn is_retirement(&self) -> bool {
        self.active == Some(false)
    }
}

/// Full description of the level the player is on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelSnapshot {
    pub level: Level,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub entities: Vec<Entity>,
}

/// Deserializes a JSON array element by element, dropping (and logging) the
/// elements that do not fit `T` instead of failing the whole sequence.
pub fn lenient_seq<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Vec::<Value>::deserialize(deserializer)?;
    let mut items = Vec::with_capacity(raw.len());
    for (index, value) in raw.into_iter().enumerate() {
        match serde_json::from_value(value) {
            Ok(item) => items.push(item),
            Err(e) => warn!("Skipping malformed element {}: {}", index, e),
        }
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use serde_json::json;

    fn level_3x2() -> Level {
        Level {
            tile_width: 16,
            tile_height: 24,
            width: 3,
            height: 2,
            tileset: "t".to_string(),
            tiles: (0..6).map(TileCode::from).collect(),
            camera_zoom: 1.0,
        }
    }

    #[test]
    fn test_pixel_size_of_huge_level_does_not_overflow() {
        let level = Level {
            tile_width: 3_000_000_000,
            tile_height: 70_000,
            width: 2,
            height: 70_000,
            tileset: "t".to_string(),
            tiles: Vec::new(),
            camera_zoom: 1.0,
        };
        let (width, height) = level.pixel_size();
        assert_approx_eq!(width, 6.0e9, 1.0e3);
        assert_approx_eq!(height, 4.9e9, 1.0e3);
    }

    #[test]
    fn test_row_major_tile_lookup() {
        let level = level_3x2();
        assert_eq!(level.tile_at(2, 1), Some(&TileCode::from(5)));
        assert_eq!(level.tile_at(0, 1), Some(&TileCode::from(3)));
        assert_eq!(level.index_of(3, 0), None);
        assert_eq!(level.tile_at(0, 2), None);
    }

    #[test]
    fn test_pixel_position_scales_by_tile_size() {
        let level = level_3x2();
        let (px, py) = level.pixel_position(Position::new(1.5, 2.0));
        assert_approx_eq!(px, 24.0);
        assert_approx_eq!(py, 48.0);
        assert_eq!(level.pixel_size(), (48.0, 48.0));
    }

    #[test]
    fn test_tile_codes_accept_strings_and_integers() {
        let codes: Vec<TileCode> = serde_json::from_value(json!(["ground", 7])).unwrap();
        assert_eq!(codes, vec![TileCode::from("ground"), TileCode::from(7)]);
    }

    #[test]
    fn test_level_defaults_camera_zoom() {
        let level: Level = serde_json::from_value(json!({
            "tile_width": 32, "tile_height": 32, "width": 1, "height": 1,
            "tileset": "test", "tiles": ["ground"]
        }))
        .unwrap();
        assert_eq!(level.camera_zoom, 1.0);
    }

    #[test]
    fn test_components_split_known_kinds() {
        let components: Components = serde_json::from_value(json!({
            "position": {"x": 2, "y": 3},
            "sprite": {"sprite": "goblin"},
            "range": 4
        }))
        .unwrap();

        assert_eq!(components.position, Some(Position::new(2.0, 3.0)));
        assert_eq!(components.sprite.as_ref().map(Sprite::asset), Some("goblin"));
        assert_eq!(components.extra.get("range"), Some(&json!(4)));
    }

    #[test]
    fn test_empty_sprite_uses_default_asset() {
        let components: Components =
            serde_json::from_value(json!({"sprite": {}})).unwrap();
        assert_eq!(components.sprite.unwrap().asset(), DEFAULT_SPRITE);

        let odd: Components = serde_json::from_value(json!({"sprite": true})).unwrap();
        assert!(odd.sprite.is_some());
    }

    #[test]
    fn test_malformed_position_is_kept_opaque() {
        let components: Components =
            serde_json::from_value(json!({"position": {"x": 1}, "sprite": {}})).unwrap();
        assert!(components.position.is_none());
        assert_eq!(components.extra.get("position"), Some(&json!({"x": 1})));
        assert!(components.sprite.is_some());
    }

    #[test]
    fn test_components_serialize_as_one_object() {
        let components = Components::default()
            .with_position(1.0, 2.0)
            .with_sprite(Sprite::default());
        let value = serde_json::to_value(&components).unwrap();
        assert_eq!(value, json!({"position": {"x": 1.0, "y": 2.0}, "sprite": {}}));
    }

    #[test]
    fn test_entity_defaults() {
        let entity: Entity = serde_json::from_value(json!({"id": 9})).unwrap();
        assert_eq!(entity.id, EntityId::Number(9));
        assert!(entity.active);
        assert!(entity.components.is_empty());
    }

    #[test]
    fn test_entity_ids_accept_text() {
        let entity: Entity = serde_json::from_value(json!({"id": "npc-1"})).unwrap();
        assert_eq!(entity.id, EntityId::from("npc-1"));
        assert_eq!(entity.id.to_string(), "npc-1");
    }

    #[test]
    fn test_update_without_active_is_not_a_retirement() {
        let update: EntityUpdate =
            serde_json::from_value(json!({"id": 4, "components": {}})).unwrap();
        assert!(!update.is_retirement());
        assert!(update.components.is_some());

        let retire: EntityUpdate =
            serde_json::from_value(json!({"id": 2, "active": false})).unwrap();
        assert!(retire.is_retirement());
        assert!(retire.components.is_none());
    }

    #[test]
    fn test_snapshot_skips_malformed_entities() {
        let snapshot: LevelSnapshot = serde_json::from_value(json!({
            "level": {
                "tile_width": 8, "tile_height": 8, "width": 1, "height": 1,
                "tileset": "t", "tiles": [0]
            },
            "entities": [{"id": 1}, {"components": {}}, {"id": 3}]
        }))
        .unwrap();

        let ids: Vec<_> = snapshot.entities.iter().map(|e| e.id.clone()).collect();
        assert_eq!(ids, vec![EntityId::Number(1), EntityId::Number(3)]);
    }
}
