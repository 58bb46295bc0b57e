//! Turns a level's tile grid into tile placements.

use crate::backend::{LevelFrame, RenderBackend};
use log::{debug, info};
use shared::{Level, TileCode};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TileError {
    #[error("tileset name '{0}' is not a plain file name")]
    InvalidTilesetName(String),
    #[error("tileset '{0}' is not available")]
    UnknownTileset(String),
    #[error("failed to read tileset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("tileset {path} is not a valid tile table: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("tile type '{code}' at ({x}, {y}) has no entry in tileset '{tileset}'")]
    UnknownTileType {
        code: TileCode,
        tileset: String,
        x: u32,
        y: u32,
    },
    #[error("tile count mismatch: expected {expected}, got {actual}")]
    TileCountMismatch { expected: usize, actual: usize },
    #[error("level grid is empty ({width}x{height})")]
    EmptyGrid { width: u32, height: u32 },
}

/// Maps tile type codes to image indices within one tileset image.
#[derive(Debug, Clone, PartialEq)]
pub struct Tileset {
    pub name: String,
    indices: HashMap<TileCode, u32>,
}

impl Tileset {
    pub fn new(name: impl Into<String>, indices: HashMap<TileCode, u32>) -> Self {
        Self {
            name: name.into(),
            indices,
        }
    }

    /// Parses a tile table: a JSON object from tile type to image index.
    pub fn from_json(name: impl Into<String>, json: &str) -> Result<Self, serde_json::Error> {
        let raw: HashMap<String, u32> = serde_json::from_str(json)?;
        let indices = raw
            .into_iter()
            .map(|(code, index)| (TileCode::new(code), index))
            .collect();
        Ok(Self::new(name, indices))
    }

    pub fn image_index(&self, code: &TileCode) -> Option<u32> {
        self.indices.get(code).copied()
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Tile tables by tileset name, loaded from `<dir>/tilesets/<name>.json` the
/// first time each is needed.
#[derive(Debug, Default)]
pub struct Tilesets {
    asset_dir: Option<PathBuf>,
    loaded: HashMap<String, Tileset>,
}

impl Tilesets {
    /// A library with no backing directory; only inserted tilesets resolve.
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn from_dir(asset_dir: impl AsRef<Path>) -> Self {
        Self {
            asset_dir: Some(asset_dir.as_ref().to_path_buf()),
            loaded: HashMap::new(),
        }
    }

    pub fn insert(&mut self, tileset: Tileset) {
        self.loaded.insert(tileset.name.clone(), tileset);
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.loaded.contains_key(name)
    }

    pub fn get_or_load(&mut self, name: &str) -> Result<&Tileset, TileError> {
        if !self.loaded.contains_key(name) {
            let tileset = self.load(name)?;
            self.loaded.insert(name.to_string(), tileset);
        }
        self.loaded
            .get(name)
            .ok_or_else(|| TileError::UnknownTileset(name.to_string()))
    }

    fn load(&self, name: &str) -> Result<Tileset, TileError> {
        let dir = self
            .asset_dir
            .as_ref()
            .ok_or_else(|| TileError::UnknownTileset(name.to_string()))?;
        if !is_plain_name(name) {
            return Err(TileError::InvalidTilesetName(name.to_string()));
        }
        let path = dir.join("tilesets").join(format!("{}.json", name));

        let json = fs::read_to_string(&path).map_err(|source| TileError::Io {
            path: path.clone(),
            source,
        })?;
        let tileset =
            Tileset::from_json(name, &json).map_err(|source| TileError::Parse { path, source })?;

        info!("Loaded tileset '{}' ({} tile types)", name, tileset.len());
        Ok(tileset)
    }
}

/// Tileset names come from the server and must stay inside the asset directory.
fn is_plain_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(['/', '\\']) && !name.contains("..")
}

/// One tile to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TilePlacement {
    pub x: u32,
    pub y: u32,
    pub image_index: u32,
}

/// Resolves every grid cell of `level` through `tileset`.
///
/// Fails on the first cell whose tile type the tileset does not know; no
/// fallback index is ever substituted.
pub fn layout(level: &Level, tileset: &Tileset) -> Result<Vec<TilePlacement>, TileError> {
    if level.width == 0 || level.height == 0 {
        return Err(TileError::EmptyGrid {
            width: level.width,
            height: level.height,
        });
    }

    let expected = level.cell_count();
    if level.tiles.len() != expected {
        return Err(TileError::TileCountMismatch {
            expected,
            actual: level.tiles.len(),
        });
    }

    let mut placements = Vec::with_capacity(expected);
    for y in 0..level.height {
        for x in 0..level.width {
            let code = level
                .tile_at(x, y)
                .ok_or(TileError::TileCountMismatch {
                    expected,
                    actual: level.tiles.len(),
                })?;
            let image_index =
                tileset
                    .image_index(code)
                    .ok_or_else(|| TileError::UnknownTileType {
                        code: code.clone(),
                        tileset: tileset.name.clone(),
                        x,
                        y,
                    })?;
            placements.push(TilePlacement { x, y, image_index });
        }
    }
    Ok(placements)
}

/// Draws whole levels. Holds nothing between calls except the tileset cache.
pub struct TileGridRenderer {
    tilesets: Tilesets,
}

impl TileGridRenderer {
    pub fn new(tilesets: Tilesets) -> Self {
        Self { tilesets }
    }

    pub fn tilesets_mut(&mut self) -> &mut Tilesets {
        &mut self.tilesets
    }

    /// Frames the camera and places one tile per cell. Nothing is sent to the
    /// backend unless the whole grid resolves.
    pub fn render<B: RenderBackend>(
        &mut self,
        level: &Level,
        backend: &mut B,
    ) -> Result<usize, TileError> {
        let tileset = self.tilesets.get_or_load(&level.tileset)?;
        let placements = layout(level, tileset)?;

        let (pixel_width, pixel_height) = level.pixel_size();
        backend.begin_level(&LevelFrame {
            tileset: level.tileset.clone(),
            tile_width: level.tile_width,
            tile_height: level.tile_height,
            pixel_width,
            pixel_height,
            zoom: level.camera_zoom,
        });

        for placement in &placements {
            backend.place_tile(placement.image_index, placement.x, placement.y);
        }

        debug!(
            "Placed {} tiles from tileset '{}'",
            placements.len(),
            level.tileset
        );
        Ok(placements.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendCall, RecordingBackend};

    fn numeric_tileset(name: &str, codes: u32) -> Tileset {
        let indices = (0..codes).map(|c| (TileCode::from(c), c * 10)).collect();
        Tileset::new(name, indices)
    }

    fn level(width: u32, height: u32, tiles: Vec<TileCode>) -> Level {
        Level {
            tile_width: 32,
            tile_height: 32,
            width,
            height,
            tileset: "t".to_string(),
            tiles,
            camera_zoom: 2.0,
        }
    }

    #[test]
    fn test_layout_is_row_major() {
        let level = level(3, 2, (0..6).map(TileCode::from).collect());
        let placements = layout(&level, &numeric_tileset("t", 6)).unwrap();

        assert_eq!(placements.len(), 6);
        let cell = placements.iter().find(|p| p.x == 2 && p.y == 1).unwrap();
        assert_eq!(cell.image_index, 50);
        let cell = placements.iter().find(|p| p.x == 1 && p.y == 0).unwrap();
        assert_eq!(cell.image_index, 10);
    }

    #[test]
    fn test_unknown_tile_type_is_reported() {
        let level = level(2, 1, vec![TileCode::from(0), TileCode::from("lava")]);
        match layout(&level, &numeric_tileset("t", 1)) {
            Err(TileError::UnknownTileType { code, x, y, .. }) => {
                assert_eq!(code, TileCode::from("lava"));
                assert_eq!((x, y), (1, 0));
            }
            other => panic!("Expected unknown tile type, got {:?}", other),
        }
    }

    #[test]
    fn test_tile_count_mismatch() {
        let level = level(2, 2, vec![TileCode::from(0); 3]);
        assert!(matches!(
            layout(&level, &numeric_tileset("t", 1)),
            Err(TileError::TileCountMismatch {
                expected: 4,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_empty_grid_is_rejected() {
        let level = level(0, 4, Vec::new());
        assert!(matches!(
            layout(&level, &numeric_tileset("t", 1)),
            Err(TileError::EmptyGrid { .. })
        ));
    }

    #[test]
    fn test_render_frames_camera_then_places_tiles() {
        let mut tilesets = Tilesets::in_memory();
        tilesets.insert(numeric_tileset("t", 2));
        let mut renderer = TileGridRenderer::new(tilesets);
        let mut backend = RecordingBackend::new();

        let placed = renderer
            .render(&level(2, 1, vec![TileCode::from(1); 2]), &mut backend)
            .unwrap();

        assert_eq!(placed, 2);
        match &backend.calls()[0] {
            BackendCall::BeginLevel(frame) => {
                assert_eq!(frame.pixel_width, 64.0);
                assert_eq!(frame.pixel_height, 32.0);
                assert_eq!(frame.zoom, 2.0);
            }
            other => panic!("Expected camera framing first, got {:?}", other),
        }
        assert_eq!(backend.tiles_placed(), 2);
    }

    #[test]
    fn test_render_huge_tiles_without_overflow() {
        let mut tilesets = Tilesets::in_memory();
        tilesets.insert(numeric_tileset("t", 1));
        let mut renderer = TileGridRenderer::new(tilesets);
        let mut backend = RecordingBackend::new();
        let mut level = level(2, 1, vec![TileCode::from(0); 2]);
        level.tile_width = 3_000_000_000;

        assert_eq!(renderer.render(&level, &mut backend).unwrap(), 2);
        match &backend.calls()[0] {
            BackendCall::BeginLevel(frame) => assert_eq!(frame.pixel_width, 6.0e9),
            other => panic!("Expected camera framing first, got {:?}", other),
        }
    }

    #[test]
    fn test_render_places_nothing_on_error() {
        let mut tilesets = Tilesets::in_memory();
        tilesets.insert(numeric_tileset("t", 1));
        let mut renderer = TileGridRenderer::new(tilesets);
        let mut backend = RecordingBackend::new();

        let result = renderer.render(&level(2, 1, vec![TileCode::from(0), TileCode::from(9)]), &mut backend);

        assert!(result.is_err());
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn test_missing_tileset_without_asset_dir() {
        let mut tilesets = Tilesets::in_memory();
        assert!(matches!(
            tilesets.get_or_load("cave"),
            Err(TileError::UnknownTileset(name)) if name == "cave"
        ));
    }

    #[test]
    fn test_tileset_from_json() {
        let tileset = Tileset::from_json("test", r#"{"ground": 0, "wall": 3}"#).unwrap();
        assert_eq!(tileset.image_index(&TileCode::from("wall")), Some(3));
        assert_eq!(tileset.image_index(&TileCode::from("empty")), None);
        assert!(Tileset::from_json("bad", "[1, 2]").is_err());
    }

    #[test]
    fn test_tileset_names_cannot_leave_asset_dir() {
        let mut tilesets = Tilesets::from_dir(std::env::temp_dir());
        for name in ["../../x", "sub/cave", "..", "a\\b", ""] {
            assert!(matches!(
                tilesets.get_or_load(name),
                Err(TileError::InvalidTilesetName(n)) if n == name
            ));
        }
    }

    #[test]
    fn test_tilesets_load_from_disk_once() {
        let dir = std::env::temp_dir().join(format!("tileset-cache-{}", std::process::id()));
        fs::create_dir_all(dir.join("tilesets")).unwrap();
        fs::write(dir.join("tilesets").join("cave.json"), r#"{"ground": 4}"#).unwrap();

        let mut tilesets = Tilesets::from_dir(&dir);
        assert_eq!(
            tilesets
                .get_or_load("cave")
                .unwrap()
                .image_index(&TileCode::from("ground")),
            Some(4)
        );

        fs::remove_dir_all(&dir).unwrap();
        assert!(tilesets.is_loaded("cave"));
        assert!(tilesets.get_or_load("cave").is_ok());
    }
}
