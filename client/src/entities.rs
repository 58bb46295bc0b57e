//! Local mirror of the server's entities for the current level.
//!
//! The store never invents state: entities appear, change and disappear only
//! because a full snapshot or an update batch said so.

use log::debug;
use shared::{Entity, EntityId, EntityUpdate};
use std::collections::HashMap;

/// What one update batch did to the store.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ApplyReport {
    pub inserted: usize,
    pub replaced: usize,
    /// Updates that named an existing entity without carrying components.
    pub unchanged: usize,
    /// Retirements of unknown ids, and updates to an id already retired
    /// earlier in the same batch.
    pub ignored: usize,
    /// Ids pruned at the end of the batch, in retirement order.
    pub removed: Vec<EntityId>,
}

impl ApplyReport {
    pub fn is_noop(&self) -> bool {
        self.inserted == 0 && self.replaced == 0 && self.removed.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct EntityStore {
    entities: HashMap<EntityId, Entity>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discards every entity and installs `entities` instead, returning the
    /// discarded ones.
    ///
    /// Entries already marked inactive are not installed. When an id is
    /// listed more than once, the last entry wins.
    pub fn replace_all(&mut self, entities: Vec<Entity>) -> Vec<Entity> {
        let previous: Vec<Entity> = self.entities.drain().map(|(_, entity)| entity).collect();

        for entity in entities {
            if !entity.active {
                debug!("Not installing inactive entity {}", entity.id);
                continue;
            }
            if let Some(duplicate) = self.entities.insert(entity.id.clone(), entity) {
                debug!("Entity {} listed twice; keeping the later entry", duplicate.id);
            }
        }

        previous
    }

    /// Applies an update batch in order, then prunes retired entities.
    ///
    /// Per update:
    /// - `active: false` on a known id marks it retired; every later update
    ///   for that id in the batch is ignored.
    /// - otherwise a known id gets its whole component mapping replaced (or
    ///   left alone when the update carries no components).
    /// - otherwise the update introduces a new, active entity.
    pub fn apply_updates(&mut self, updates: Vec<EntityUpdate>) -> ApplyReport {
        let mut report = ApplyReport::default();

        for update in updates {
            match self.entities.get_mut(&update.id) {
                Some(entity) if !entity.active => {
                    report.ignored += 1;
                }
                Some(entity) if update.is_retirement() => {
                    entity.active = false;
                    report.removed.push(update.id);
                }
                Some(entity) => match update.components {
                    Some(components) => {
                        entity.components = components;
                        report.replaced += 1;
                    }
                    None => report.unchanged += 1,
                },
                None if update.is_retirement() => {
                    debug!("Ignoring retirement of unknown entity {}", update.id);
                    report.ignored += 1;
                }
                None => {
                    let entity = Entity {
                        id: update.id.clone(),
                        active: true,
                        components: update.components.unwrap_or_default(),
                    };
                    self.entities.insert(update.id, entity);
                    report.inserted += 1;
                }
            }
        }

        self.entities.retain(|_, entity| entity.active);
        report
    }

    pub fn get(&self, id: &EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.entities.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Ids in ascending order.
    pub fn ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self.entities.keys().cloned().collect();
        ids.sort();
        ids
    }
}
