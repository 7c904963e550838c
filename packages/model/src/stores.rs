//! # Shared definition stores
//!
//! Relation and object-type definitions are shared by every open document
//! in a workspace. Each store keeps an immutable index behind an `Arc` and
//! swaps in a rebuilt index on every write, so a reader holding a
//! [`snapshot`](RelationStore::snapshot) sees a whole batch or none of it.

use crate::details::{string_of, ObjectTypeRecord, RelationRecord, Struct};
use crate::relations::keys;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Immutable relation definitions, indexed by id and by relation key
#[derive(Debug, Clone, Default)]
pub struct RelationIndex {
    by_id: HashMap<String, Struct>,
    by_key: HashMap<String, String>,
}

impl RelationIndex {
    pub fn by_id(&self, id: &str) -> Option<RelationRecord<'_>> {
        self.by_id.get(id).map(RelationRecord::new)
    }

    pub fn by_key(&self, key: &str) -> Option<RelationRecord<'_>> {
        self.by_key.get(key).and_then(|id| self.by_id(id))
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    fn insert(&mut self, id: String, definition: Struct) {
        if let Some(previous) = self.by_id.get(&id) {
            if let Some(old_key) = string_of(previous, keys::RELATION_KEY) {
                self.by_key.remove(old_key);
            }
        }
        if let Some(key) = string_of(&definition, keys::RELATION_KEY) {
            self.by_key.insert(key.to_string(), id.clone());
        }
        self.by_id.insert(id, definition);
    }

    fn remove(&mut self, id: &str) {
        if let Some(previous) = self.by_id.remove(id) {
            if let Some(key) = string_of(&previous, keys::RELATION_KEY) {
                self.by_key.remove(key);
            }
        }
    }
}

/// Immutable object-type definitions, indexed by id and by unique key
#[derive(Debug, Clone, Default)]
pub struct ObjectTypeIndex {
    by_id: HashMap<String, Struct>,
    by_unique_key: HashMap<String, String>,
}

impl ObjectTypeIndex {
    pub fn by_id(&self, id: &str) -> Option<ObjectTypeRecord<'_>> {
        self.by_id.get(id).map(ObjectTypeRecord::new)
    }

    pub fn by_unique_key(&self, key: &str) -> Option<ObjectTypeRecord<'_>> {
        self.by_unique_key.get(key).and_then(|id| self.by_id(id))
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    fn insert(&mut self, id: String, definition: Struct) {
        if let Some(previous) = self.by_id.get(&id) {
            if let Some(old_key) = string_of(previous, keys::UNIQUE_KEY) {
                self.by_unique_key.remove(old_key);
            }
        }
        if let Some(key) = string_of(&definition, keys::UNIQUE_KEY) {
            self.by_unique_key.insert(key.to_string(), id.clone());
        }
        self.by_id.insert(id, definition);
    }

    fn remove(&mut self, id: &str) {
        if let Some(previous) = self.by_id.remove(id) {
            if let Some(key) = string_of(&previous, keys::UNIQUE_KEY) {
                self.by_unique_key.remove(key);
            }
        }
    }
}

trait DefinitionIndex: Clone + Default {
    fn put(&mut self, id: String, definition: Struct);
    fn drop_id(&mut self, id: &str);
}

impl DefinitionIndex for RelationIndex {
    fn put(&mut self, id: String, definition: Struct) {
        self.insert(id, definition)
    }

    fn drop_id(&mut self, id: &str) {
        self.remove(id)
    }
}

impl DefinitionIndex for ObjectTypeIndex {
    fn put(&mut self, id: String, definition: Struct) {
        self.insert(id, definition)
    }

    fn drop_id(&mut self, id: &str) {
        self.remove(id)
    }
}

/// Copy-on-write slot shared by both stores
#[derive(Debug, Default)]
struct Swap<T> {
    current: RwLock<Arc<T>>,
}

impl<T: DefinitionIndex> Swap<T> {
    fn snapshot(&self) -> Arc<T> {
        self.current.read().clone()
    }

    fn merge(&self, batch: Vec<Struct>) -> usize {
        let mut guard = self.current.write();
        let mut next = T::clone(&guard);
        let mut merged = 0;
        for definition in batch {
            match string_of(&definition, keys::ID).map(str::to_string) {
                Some(id) => {
                    next.put(id, definition);
                    merged += 1;
                }
                None => warn!("Skipping definition without an id"),
            }
        }
        *guard = Arc::new(next);
        merged
    }

    fn remove(&self, ids: &[String]) {
        let mut guard = self.current.write();
        let mut next = T::clone(&guard);
        for id in ids {
            next.drop_id(id);
        }
        *guard = Arc::new(next);
    }

    fn clear(&self) {
        *self.current.write() = Arc::new(T::default());
    }
}

/// Workspace-wide relation definitions
#[derive(Debug, Default)]
pub struct RelationStore {
    slot: Swap<RelationIndex>,
}

impl RelationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Arc<RelationIndex> {
        self.slot.snapshot()
    }

    /// Atomically merges a batch of definitions
    pub fn merge(&self, batch: Vec<Struct>) {
        let merged = self.slot.merge(batch);
        debug!(merged, "Merged relation definitions");
    }

    pub fn remove(&self, ids: &[String]) {
        self.slot.remove(ids);
    }

    pub fn clear(&self) {
        self.slot.clear();
    }
}

/// Workspace-wide object-type definitions
#[derive(Debug, Default)]
pub struct ObjectTypeStore {
    slot: Swap<ObjectTypeIndex>,
}

impl ObjectTypeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Arc<ObjectTypeIndex> {
        self.slot.snapshot()
    }

    /// Atomically merges a batch of definitions
    pub fn merge(&self, batch: Vec<Struct>) {
        let merged = self.slot.merge(batch);
        debug!(merged, "Merged object type definitions");
    }

    pub fn remove(&self, ids: &[String]) {
        self.slot.remove(ids);
    }

    pub fn clear(&self) {
        self.slot.clear();
    }
}
