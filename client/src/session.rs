//! Lifecycle of the level the player is currently on.

use crate::backend::RenderBackend;
use crate::entities::{ApplyReport, EntityStore};
use crate::tiles::{TileError, TileGridRenderer};
use crate::visuals::{SyncReport, VisualBindings};
use log::{debug, info, warn};
use shared::{ClientMessage, EntityUpdate, Level, LevelSnapshot};

/// Level plus the entities reconciled against it.
#[derive(Debug)]
pub struct LoadedLevel {
    pub level: Level,
    pub entities: EntityStore,
}

#[derive(Debug)]
pub enum LevelState {
    NoLevel,
    Loaded(LoadedLevel),
}

/// Result of reconciling one update batch.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct UpdateOutcome {
    pub applied: ApplyReport,
    pub released: usize,
    pub sync: SyncReport,
}

/// Routes level snapshots and entity updates into the store, tile grid and
/// visual bindings, in arrival order and each to completion.
pub struct LevelSession {
    state: LevelState,
    tiles: TileGridRenderer,
    visuals: VisualBindings,
}

impl LevelSession {
    pub fn new(tiles: TileGridRenderer) -> Self {
        Self {
            state: LevelState::NoLevel,
            tiles,
            visuals: VisualBindings::new(),
        }
    }

    pub fn state(&self) -> &LevelState {
        &self.state
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.state, LevelState::Loaded(_))
    }

    pub fn level(&self) -> Option<&Level> {
        match &self.state {
            LevelState::Loaded(loaded) => Some(&loaded.level),
            LevelState::NoLevel => None,
        }
    }

    pub fn entities(&self) -> Option<&EntityStore> {
        match &self.state {
            LevelState::Loaded(loaded) => Some(&loaded.entities),
            LevelState::NoLevel => None,
        }
    }

    pub fn visuals(&self) -> &VisualBindings {
        &self.visuals
    }

    /// Replaces the current level wholesale.
    ///
    /// Every existing visual is released before any new one is created. The
    /// entities are installed and synced even when the tile grid fails to
    /// resolve; the tile error is returned afterwards.
    pub fn present_level<B: RenderBackend>(
        &mut self,
        snapshot: LevelSnapshot,
        backend: &mut B,
    ) -> Result<SyncReport, TileError> {
        let LevelSnapshot { level, entities } = snapshot;
        info!(
            "Presenting level {}x{} (tileset '{}', {} entities)",
            level.width,
            level.height,
            level.tileset,
            entities.len()
        );

        let released = self.visuals.release_all(backend);
        debug!("Released {} visuals from the previous level", released);

        let tiles = self.tiles.render(&level, backend);

        let mut store = match std::mem::replace(&mut self.state, LevelState::NoLevel) {
            LevelState::Loaded(loaded) => loaded.entities,
            LevelState::NoLevel => EntityStore::new(),
        };
        store.replace_all(entities);

        let sync = self.visuals.sync(&store, &level, backend);
        debug!("Level sync: {:?}", sync);

        self.state = LevelState::Loaded(LoadedLevel {
            level,
            entities: store,
        });

        tiles.map(|_| sync)
    }

    /// Reconciles an update batch and re-syncs visuals. Returns `None`, having
    /// done nothing, when there is no level to reconcile against.
    pub fn update_entities<B: RenderBackend>(
        &mut self,
        updates: Vec<EntityUpdate>,
        backend: &mut B,
    ) -> Option<UpdateOutcome> {
        let loaded = match &mut self.state {
            LevelState::Loaded(loaded) => loaded,
            LevelState::NoLevel => {
                warn!("Dropping {} entity updates: no level loaded", updates.len());
                return None;
            }
        };

        let applied = loaded.entities.apply_updates(updates);

        let mut released = 0;
        for id in &applied.removed {
            if self.visuals.release(id, backend) {
                released += 1;
            }
        }

        let sync = self.visuals.sync(&loaded.entities, &loaded.level, backend);
        debug!("Applied {:?}, released {}, sync {:?}", applied, released, sync);

        Some(UpdateOutcome {
            applied,
            released,
            sync,
        })
    }

    /// The server says the current level is stale. Forgets it without
    /// touching what is on screen and returns the request for its
    /// replacement.
    pub fn level_changed(&mut self) -> ClientMessage {
        if self.is_loaded() {
            info!("Level changed; requesting the new one");
        }
        self.state = LevelState::NoLevel;
        ClientMessage::RequestPresentLevel
    }
}
