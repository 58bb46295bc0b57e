//! The seam between the synchronization core and whatever draws the world.

use std::collections::HashMap;

/// Handle to a visual owned by a [`RenderBackend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VisualHandle(pub u64);

/// Camera framing for a freshly presented level.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelFrame {
    pub tileset: String,
    pub tile_width: u32,
    pub tile_height: u32,
    pub pixel_width: f32,
    pub pixel_height: f32,
    pub zoom: f32,
}

/// Drawing operations the core needs from a graphics engine.
///
/// Coordinates are pixels, origin at the visual's top-left corner. Tile
/// coordinates are grid cells.
pub trait RenderBackend {
    /// Drops every placed tile and frames the camera for a new level.
    fn begin_level(&mut self, frame: &LevelFrame);

    fn place_tile(&mut self, image_index: u32, x: u32, y: u32);

    fn create_visual(&mut self, sprite: &str, x: f32, y: f32) -> VisualHandle;

    fn move_visual(&mut self, handle: VisualHandle, x: f32, y: f32);

    fn destroy_visual(&mut self, handle: VisualHandle);
}

/// A call made against a [`RecordingBackend`].
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    BeginLevel(LevelFrame),
    PlaceTile { image_index: u32, x: u32, y: u32 },
    CreateVisual { handle: VisualHandle, sprite: String, x: f32, y: f32 },
    MoveVisual { handle: VisualHandle, x: f32, y: f32 },
    DestroyVisual(VisualHandle),
}

/// Windowless backend that records every call and tracks live visuals.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    calls: Vec<BackendCall>,
    visuals: HashMap<VisualHandle, (String, f32, f32)>,
    next_handle: u64,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> &[BackendCall] {
        &self.calls
    }

    /// Returns the calls recorded so far and starts a fresh record.
    pub fn take_calls(&mut self) -> Vec<BackendCall> {
        std::mem::take(&mut self.calls)
    }

    pub fn live_visuals(&self) -> usize {
        self.visuals.len()
    }

    /// Sprite and pixel position of a live visual.
    pub fn visual(&self, handle: VisualHandle) -> Option<(&str, f32, f32)> {
        self.visuals
            .get(&handle)
            .map(|(sprite, x, y)| (sprite.as_str(), *x, *y))
    }

    pub fn count(&self, predicate: impl Fn(&BackendCall) -> bool) -> usize {
        self.calls.iter().filter(|call| predicate(call)).count()
    }

    pub fn tiles_placed(&self) -> usize {
        self.count(|call| matches!(call, BackendCall::PlaceTile { .. }))
    }

    pub fn visuals_created(&self) -> usize {
        self.count(|call| matches!(call, BackendCall::CreateVisual { .. }))
    }

    pub fn visuals_moved(&self) -> usize {
        self.count(|call| matches!(call, BackendCall::MoveVisual { .. }))
    }

    pub fn visuals_destroyed(&self) -> usize {
        self.count(|call| matches!(call, BackendCall::DestroyVisual(_)))
    }
}

impl RenderBackend for RecordingBackend {
    fn begin_level(&mut self, frame: &LevelFrame) {
        self.calls.push(BackendCall::BeginLevel(frame.clone()));
    }

    fn place_tile(&mut self, image_index: u32, x: u32, y: u32) {
        self.calls.push(BackendCall::PlaceTile { image_index, x, y });
    }

    fn create_visual(&mut self, sprite: &str, x: f32, y: f32) -> VisualHandle {
        let handle = VisualHandle(self.next_handle);
        self.next_handle += 1;
        self.visuals.insert(handle, (sprite.to_string(), x, y));
        self.calls.push(BackendCall::CreateVisual {
            handle,
            sprite: sprite.to_string(),
            x,
            y,
        });
        handle
    }

    fn move_visual(&mut self, handle: VisualHandle, x: f32, y: f32) {
        if let Some(visual) = self.visuals.get_mut(&handle) {
            visual.1 = x;
            visual.2 = y;
        }
        self.calls.push(BackendCall::MoveVisual { handle, x, y });
    }

    fn destroy_visual(&mut self, handle: VisualHandle) {
        self.visuals.remove(&handle);
        self.calls.push(BackendCall::DestroyVisual(handle));
    }
}
