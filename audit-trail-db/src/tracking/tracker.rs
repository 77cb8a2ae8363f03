use std::collections::BTreeMap;
use std::fmt;

use crate::models::entity::{downcast_mut, downcast_ref, Entity};
use crate::models::value::{PropertyBag, PropertyValue};
use crate::repository::entity_store::{EntityWrite, WriteKind};

/// Stable handle of a tracked entity within one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryId(pub u64);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Pending-change state of a tracked entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Unchanged,
    Added,
    Modified,
    Deleted,
}

impl EntryState {
    pub fn is_pending(self) -> bool {
        self != EntryState::Unchanged
    }
}

#[derive(Debug)]
pub struct TrackedEntry {
    entity: Box<dyn Entity>,
    state: EntryState,
    /// Values as last loaded or written; `None` for added entities.
    original: Option<PropertyBag>,
}

impl TrackedEntry {
    pub fn entity(&self) -> &dyn Entity {
        self.entity.as_ref()
    }

    pub fn entity_mut(&mut self) -> &mut dyn Entity {
        self.entity.as_mut()
    }

    pub fn state(&self) -> EntryState {
        self.state
    }

    pub fn original_values(&self) -> Option<&PropertyBag> {
        self.original.as_ref()
    }

    pub fn current_values(&self) -> PropertyBag {
        self.entity.values()
    }
}

/// Identity map of the entities a session loads, adds and removes.
///
/// Entries are kept in insertion order. Original values are only available
/// until [`ChangeTracker::accept_all_changes`] runs after a write.
#[derive(Debug, Default)]
pub struct ChangeTracker {
    entries: BTreeMap<EntryId, TrackedEntry>,
    next_id: u64,
}

impl ChangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracks a new entity to be inserted.
    pub fn add(&mut self, entity: Box<dyn Entity>) -> EntryId {
        self.track(entity, EntryState::Added, None)
    }

    /// Tracks an existing entity, snapshotting its current values as the originals.
    pub fn attach(&mut self, entity: Box<dyn Entity>) -> EntryId {
        let original = entity.values();
        self.track(entity, EntryState::Unchanged, Some(original))
    }

    fn track(&mut self, entity: Box<dyn Entity>, state: EntryState, original: Option<PropertyBag>) -> EntryId {
        self.next_id += 1;
        let id = EntryId(self.next_id);
        self.entries.insert(
            id,
            TrackedEntry {
                entity,
                state,
                original,
            },
        );
        id
    }

    /// Marks an entity for deletion. Removing an added entity just forgets it.
    ///
    /// Returns false when the entry is unknown.
    pub fn remove(&mut self, id: EntryId) -> bool {
        let Some(state) = self.entries.get(&id).map(|e| e.state) else {
            return false;
        };
        if state == EntryState::Added {
            self.entries.remove(&id);
        } else {
            self.set_state(id, EntryState::Deleted);
        }
        true
    }

    pub fn entry(&self, id: EntryId) -> Option<&TrackedEntry> {
        self.entries.get(&id)
    }

    pub fn entry_mut(&mut self, id: EntryId) -> Option<&mut TrackedEntry> {
        self.entries.get_mut(&id)
    }

    pub fn entity<T: Entity>(&self, id: EntryId) -> Option<&T> {
        self.entries.get(&id).and_then(|e| downcast_ref::<T>(e.entity()))
    }

    pub fn entity_mut<T: Entity>(&mut self, id: EntryId) -> Option<&mut T> {
        self.entries
            .get_mut(&id)
            .and_then(|e| downcast_mut::<T>(e.entity_mut()))
    }

    pub(crate) fn set_state(&mut self, id: EntryId, state: EntryState) {
        if let Some(entry) = self.entries.get_mut(&id) {
            entry.state = state;
        }
    }

    /// Flags unchanged entries whose values differ from their snapshot as modified.
    pub fn detect_changes(&mut self) {
        for entry in self.entries.values_mut() {
            if entry.state == EntryState::Unchanged
                && entry.original.as_ref() != Some(&entry.entity.values())
            {
                entry.state = EntryState::Modified;
            }
        }
    }

    /// Settles the tracker after a successful write.
    ///
    /// Deleted entries are detached; the rest become unchanged with a fresh snapshot.
    pub fn accept_all_changes(&mut self) {
        self.entries.retain(|_, entry| entry.state != EntryState::Deleted);
        for entry in self.entries.values_mut() {
            entry.state = EntryState::Unchanged;
            entry.original = Some(entry.entity.values());
        }
    }

    /// Stops tracking an entry and hands the entity back.
    pub fn detach(&mut self, id: EntryId) -> Option<Box<dyn Entity>> {
        self.entries.remove(&id).map(|entry| entry.entity)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_pending_changes(&self) -> bool {
        self.entries.values().any(|e| e.state.is_pending())
    }

    pub fn entries(&self) -> impl Iterator<Item = (EntryId, &TrackedEntry)> {
        self.entries.iter().map(|(id, entry)| (*id, entry))
    }

    /// Added, modified and deleted entries.
    pub fn pending_entries(&self) -> impl Iterator<Item = (EntryId, &TrackedEntry)> {
        self.entries().filter(|(_, entry)| entry.state.is_pending())
    }

    pub(crate) fn pending_ids(&self) -> Vec<EntryId> {
        self.pending_entries().map(|(id, _)| id).collect()
    }

    /// Writes for every pending entry.
    pub fn pending_writes(&self) -> Vec<EntityWrite> {
        self.writes_for(&self.pending_ids())
    }

    /// Writes for the given entries, skipping unknown or unchanged ones.
    pub fn writes_for(&self, ids: &[EntryId]) -> Vec<EntityWrite> {
        ids.iter()
            .filter_map(|id| {
                let entry = self.entries.get(id)?;
                let kind = match entry.state {
                    EntryState::Added => WriteKind::Insert,
                    EntryState::Modified => WriteKind::Update,
                    EntryState::Deleted => WriteKind::Delete,
                    EntryState::Unchanged => return None,
                };
                Some(EntityWrite {
                    entry: *id,
                    entity_name: entry.entity.entity_name(),
                    kind,
                    key: entry.entity.key(),
                    values: entry.entity.values(),
                    generated_key: None,
                })
            })
            .collect()
    }

    /// Writes a store-generated key back onto the entity.
    pub fn set_generated_key(&mut self, id: EntryId, key: PropertyValue) -> bool {
        match self.entries.get_mut(&id) {
            Some(entry) => {
                entry.entity.set_key(key);
                true
            }
            None => false,
        }
    }
}
