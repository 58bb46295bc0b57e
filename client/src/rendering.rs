use crate::backend::{LevelFrame, RenderBackend, VisualHandle};
use crate::game::{GameClient, Phase};
use crate::input::LoginForm;
use crate::messages::MessageLog;
use log::warn;
use macroquad::prelude::*;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

const BACKGROUND: Color = Color::new(0.1, 0.1, 0.1, 1.0);
const TEXT_COLOR: Color = WHITE;
const TITLE_COLOR: Color = Color::new(0.53, 0.53, 0.53, 1.0);
const ENTRY_COLOR: Color = Color::new(1.0, 0.8, 0.53, 1.0);

#[derive(Debug, Clone, Copy)]
struct PlacedTile {
    image_index: u32,
    x: u32,
    y: u32,
}

#[derive(Debug, Clone)]
struct SpriteVisual {
    sprite: String,
    x: f32,
    y: f32,
}

/// Retained-mode macroquad renderer. The synchronization core edits the
/// scene through [`RenderBackend`]; [`Renderer::draw`] paints it each frame.
pub struct Renderer {
    asset_dir: PathBuf,
    frame: Option<LevelFrame>,
    tiles: Vec<PlacedTile>,
    visuals: HashMap<VisualHandle, SpriteVisual>,
    next_handle: u64,

    textures: HashMap<String, Texture2D>,
    missing: HashSet<String>,
    pending: Vec<String>,
}

impl Renderer {
    pub fn new(asset_dir: impl Into<PathBuf>) -> Self {
        Self {
            asset_dir: asset_dir.into(),
            frame: None,
            tiles: Vec::new(),
            visuals: HashMap::new(),
            next_handle: 0,
            textures: HashMap::new(),
            missing: HashSet::new(),
            pending: Vec::new(),
        }
    }

    fn request_texture(&mut self, key: String) {
        if !self.textures.contains_key(&key) && !self.missing.contains(&key) && !self.pending.contains(&key) {
            self.pending.push(key);
        }
    }

    /// Loads the images requested since the last frame. Images that fail to
    /// load are drawn as flat rectangles from then on.
    pub async fn load_pending_textures(&mut self) {
        for key in std::mem::take(&mut self.pending) {
            let path = self.asset_dir.join(format!("{}.png", key));
            match load_texture(&path.to_string_lossy()).await {
                Ok(texture) => {
                    texture.set_filter(FilterMode::Nearest);
                    self.textures.insert(key, texture);
                }
                Err(e) => {
                    warn!("Could not load {}: {}", path.display(), e);
                    self.missing.insert(key);
                }
            }
        }
    }

    pub fn draw(&self, client: &GameClient) {
        clear_background(BACKGROUND);

        match client.phase() {
            Phase::Connecting => self.draw_centered_text("Connecting..."),
            Phase::Login => self.draw_login(client.login_form()),
            Phase::InGame | Phase::Disconnected => {
                self.draw_world();
                self.draw_messages(client.messages());
            }
        }
    }

    fn draw_world(&self) {
        let frame = match &self.frame {
            Some(frame) => frame,
            None => return,
        };

        let zoom = frame.zoom.max(0.01);
        set_camera(&Camera2D {
            target: vec2(frame.pixel_width / 2.0, frame.pixel_height / 2.0),
            zoom: vec2(zoom * 2.0 / screen_width(), zoom * 2.0 / screen_height()),
            ..Default::default()
        });

        let tw = frame.tile_width as f32;
        let th = frame.tile_height as f32;
        let tileset = self.textures.get(&format!("tilesets/{}", frame.tileset));
        for tile in &self.tiles {
            let x = tile.x as f32 * tw;
            let y = tile.y as f32 * th;
            match tileset {
                Some(texture) => {
                    let columns = ((texture.width() / tw) as u32).max(1);
                    let source = Rect::new(
                        (tile.image_index % columns) as f32 * tw,
                        (tile.image_index / columns) as f32 * th,
                        tw,
                        th,
                    );
                    draw_texture_ex(
                        texture,
                        x,
                        y,
                        WHITE,
                        DrawTextureParams {
                            source: Some(source),
                            dest_size: Some(vec2(tw, th)),
                            ..Default::default()
                        },
                    );
                }
                None => draw_rectangle(x, y, tw, th, tile_color(tile.image_index)),
            }
        }

        let mut visuals: Vec<(&VisualHandle, &SpriteVisual)> = self.visuals.iter().collect();
        visuals.sort_by_key(|(handle, _)| **handle);
        for (_, visual) in visuals {
            match self.textures.get(&format!("sprites/{}", visual.sprite)) {
                Some(texture) => draw_texture(texture, visual.x, visual.y, WHITE),
                None => {
                    draw_rectangle(visual.x, visual.y, tw, th, Color::from_rgba(255, 68, 68, 255));
                    draw_rectangle_lines(visual.x, visual.y, tw, th, 1.0, WHITE);
                }
            }
        }

        set_default_camera();
    }

    fn draw_messages(&self, log: &MessageLog) {
        let x = screen_width() - 500.0;
        draw_text(&log.title(), x, 30.0, 20.0, TITLE_COLOR);

        for (i, line) in log.visible().iter().enumerate() {
            draw_text(line, x + 20.0, 52.0 + i as f32 * 14.0, 16.0, TEXT_COLOR);
        }
    }

    fn draw_login(&self, form: &LoginForm) {
        let cx = screen_width() / 2.0;

        let title = "Prismal Totality";
        let size = measure_text(title, None, 64, 1.0);
        draw_text(title, cx - size.width / 2.0, 110.0, 64.0, TEXT_COLOR);

        let prompt = "Type a username and press Enter to login";
        let size = measure_text(prompt, None, 16, 1.0);
        draw_text(prompt, cx - size.width / 2.0, 200.0, 16.0, TEXT_COLOR);

        draw_rectangle(cx - 100.0, 210.0, 200.0, 20.0, Color::new(0.0, 0.0, 0.0, 0.5));
        let size = measure_text(form.username(), None, 16, 1.0);
        draw_text(form.username(), cx - size.width / 2.0, 225.0, 16.0, ENTRY_COLOR);
    }

    fn draw_centered_text(&self, text: &str) {
        let size = measure_text(text, None, 20, 1.0);
        draw_text(
            text,
            (screen_width() - size.width) / 2.0,
            screen_height() / 2.0,
            20.0,
            TEXT_COLOR,
        );
    }
}

impl RenderBackend for Renderer {
    fn begin_level(&mut self, frame: &LevelFrame) {
        self.tiles.clear();
        self.request_texture(format!("tilesets/{}", frame.tileset));
        self.frame = Some(frame.clone());
    }

    fn place_tile(&mut self, image_index: u32, x: u32, y: u32) {
        self.tiles.push(PlacedTile { image_index, x, y });
    }

    fn create_visual(&mut self, sprite: &str, x: f32, y: f32) -> VisualHandle {
        let handle = VisualHandle(self.next_handle);
        self.next_handle += 1;
        self.request_texture(format!("sprites/{}", sprite));
        self.visuals.insert(
            handle,
            SpriteVisual {
                sprite: sprite.to_string(),
                x,
                y,
            },
        );
        handle
    }

    fn move_visual(&mut self, handle: VisualHandle, x: f32, y: f32) {
        if let Some(visual) = self.visuals.get_mut(&handle) {
            visual.x = x;
            visual.y = y;
        }
    }

    fn destroy_visual(&mut self, handle: VisualHandle) {
        self.visuals.remove(&handle);
    }
}

/// Stand-in color for a tile image index when the tileset image is missing.
fn tile_color(image_index: u32) -> Color {
    match image_index % 6 {
        0 => Color::from_rgba(68, 68, 68, 255),
        1 => Color::from_rgba(34, 102, 34, 255),
        2 => Color::from_rgba(136, 136, 136, 255),
        3 => Color::from_rgba(51, 51, 102, 255),
        4 => Color::from_rgba(102, 68, 34, 255),
        _ => Color::from_rgba(20, 20, 20, 255),
    }
}
