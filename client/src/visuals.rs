//! Visual handles bound to entities.
//!
//! A binding exists for every active entity that has a `sprite` component and
//! a position. Bindings are created on first sync, moved in place afterwards,
//! and destroyed when their entity goes away or stops being drawable.

use crate::backend::{RenderBackend, VisualHandle};
use crate::entities::EntityStore;
use log::debug;
use shared::{Entity, EntityId, Level};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Binding {
    handle: VisualHandle,
    x: f32,
    y: f32,
}

/// Backend calls made by one [`VisualBindings::sync`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncReport {
    pub created: usize,
    pub moved: usize,
    pub destroyed: usize,
    /// Drawable entities skipped because they have no position.
    pub unplaced: usize,
}

impl SyncReport {
    pub fn backend_calls(&self) -> usize {
        self.created + self.moved + self.destroyed
    }
}

#[derive(Debug, Default)]
pub struct VisualBindings {
    bindings: HashMap<EntityId, Binding>,
}

impl VisualBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Brings visuals in line with `entities`. Calling it again with unchanged
    /// entities makes no backend calls.
    pub fn sync<B: RenderBackend>(
        &mut self,
        entities: &EntityStore,
        level: &Level,
        backend: &mut B,
    ) -> SyncReport {
        let mut report = SyncReport::default();

        let stale: Vec<EntityId> = self
            .bindings
            .keys()
            .filter(|id| !entities.get(id).map_or(false, is_drawable))
            .cloned()
            .collect();
        for id in stale {
            if self.release(&id, backend) {
                report.destroyed += 1;
            }
        }

        for entity in entities.iter().filter(|entity| is_drawable(entity)) {
            let sprite = match &entity.components.sprite {
                Some(sprite) => sprite,
                None => continue,
            };
            let position = match entity.components.position {
                Some(position) => position,
                None => {
                    debug!("Entity {} has a sprite but no position", entity.id);
                    report.unplaced += 1;
                    continue;
                }
            };
            let (x, y) = level.pixel_position(position);

            match self.bindings.get_mut(&entity.id) {
                Some(binding) => {
                    if binding.x != x || binding.y != y {
                        backend.move_visual(binding.handle, x, y);
                        binding.x = x;
                        binding.y = y;
                        report.moved += 1;
                    }
                }
                None => {
                    let handle = backend.create_visual(sprite.asset(), x, y);
                    self.bindings
                        .insert(entity.id.clone(), Binding { handle, x, y });
                    report.created += 1;
                }
            }
        }

        report
    }

    /// Destroys the visual bound to `id`, if any. Returns whether one existed.
    pub fn release<B: RenderBackend>(&mut self, id: &EntityId, backend: &mut B) -> bool {
        match self.bindings.remove(id) {
            Some(binding) => {
                backend.destroy_visual(binding.handle);
                true
            }
            None => false,
        }
    }

    /// Destroys every bound visual. Returns how many there were.
    pub fn release_all<B: RenderBackend>(&mut self, backend: &mut B) -> usize {
        let count = self.bindings.len();
        for (_, binding) in self.bindings.drain() {
            backend.destroy_visual(binding.handle);
        }
        count
    }

    pub fn handle_of(&self, id: &EntityId) -> Option<VisualHandle> {
        self.bindings.get(id).map(|binding| binding.handle)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

fn is_drawable(entity: &Entity) -> bool {
    entity.active && entity.components.sprite.is_some()
}
