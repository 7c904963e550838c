//! Object details: per-object key/value structs plus typed read-only views.
//!
//! Values arrive from the middleware loosely typed (numbers as floats,
//! id lists sometimes as a single string), so every accessor tolerates
//! the shapes actually seen on the wire.

use crate::block::BlockId;
use crate::layout::ObjectLayout;
use crate::relations::{keys, RelationFormat, TEMPLATE_TYPE_KEY};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Raw key/value details of one object
pub type Struct = BTreeMap<String, Value>;

/// Details of every object referenced by an open document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectViewDetails {
    pub details: BTreeMap<BlockId, Struct>,
}

impl ObjectViewDetails {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&Struct> {
        self.details.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.details.contains_key(id)
    }

    /// Typed view over an object's details, `None` when absent or invalid
    pub fn object(&self, id: &str) -> Option<ObjectRecord<'_>> {
        self.get(id)
            .map(ObjectRecord::new)
            .filter(|record| record.is_valid())
    }

    pub fn with(mut self, id: impl Into<BlockId>, details: Struct) -> Self {
        self.set(id, details);
        self
    }

    /// Replaces the whole struct
    pub fn set(&mut self, id: impl Into<BlockId>, details: Struct) {
        self.details.insert(id.into(), details);
    }

    /// Shallow merge into an existing struct, creating it when missing
    pub fn amend(&mut self, id: impl Into<BlockId>, details: &Struct) {
        let entry = self.details.entry(id.into()).or_default();
        for (key, value) in details {
            entry.insert(key.clone(), value.clone());
        }
    }

    pub fn unset(&mut self, id: &str, keys: &[String]) {
        if let Some(entry) = self.details.get_mut(id) {
            for key in keys {
                entry.remove(key);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.details.len()
    }

    pub fn is_empty(&self) -> bool {
        self.details.is_empty()
    }
}

pub(crate) fn string_of<'a>(map: &'a Struct, key: &str) -> Option<&'a str> {
    map.get(key).and_then(Value::as_str)
}

pub(crate) fn bool_of(map: &Struct, key: &str) -> bool {
    map.get(key).and_then(Value::as_bool).unwrap_or(false)
}

pub(crate) fn number_of(map: &Struct, key: &str) -> Option<f64> {
    map.get(key).and_then(Value::as_f64)
}

/// Accepts a single id, a list of ids, or a map whose values are ids.
pub(crate) fn id_list_of(map: &Struct, key: &str) -> Vec<String> {
    match map.get(key) {
        Some(Value::String(id)) => vec![id.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        Some(Value::Object(entries)) => entries
            .values()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

/// Read-only view over an ordinary object
#[derive(Debug, Clone, Copy)]
pub struct ObjectRecord<'a> {
    map: &'a Struct,
}

impl<'a> ObjectRecord<'a> {
    pub fn new(map: &'a Struct) -> Self {
        Self { map }
    }

    pub fn raw(&self) -> &'a Struct {
        self.map
    }

    /// An object without an id is a stub and must not be displayed
    pub fn is_valid(&self) -> bool {
        self.map.contains_key(keys::ID)
    }

    pub fn id(&self) -> Option<&'a str> {
        string_of(self.map, keys::ID)
    }

    pub fn name(&self) -> Option<&'a str> {
        string_of(self.map, keys::NAME)
    }

    pub fn description(&self) -> Option<&'a str> {
        string_of(self.map, keys::DESCRIPTION)
    }

    pub fn is_deleted(&self) -> bool {
        bool_of(self.map, keys::IS_DELETED)
    }

    pub fn is_archived(&self) -> bool {
        bool_of(self.map, keys::IS_ARCHIVED)
    }

    pub fn done(&self) -> bool {
        bool_of(self.map, keys::DONE)
    }

    pub fn type_ids(&self) -> Vec<String> {
        id_list_of(self.map, keys::TYPE)
    }

    pub fn type_id(&self) -> Option<String> {
        self.type_ids().into_iter().next()
    }

    /// Resolved layout, falling back to the legacy `layout` key
    pub fn layout(&self) -> Option<ObjectLayout> {
        number_of(self.map, keys::LAYOUT)
            .or_else(|| number_of(self.map, keys::LEGACY_LAYOUT))
            .and_then(|code| ObjectLayout::from_code(code as i64))
    }

    pub fn snippet(&self) -> Option<&'a str> {
        string_of(self.map, keys::SNIPPET)
    }

    pub fn file_ext(&self) -> Option<&'a str> {
        string_of(self.map, keys::FILE_EXT)
    }

    pub fn icon_emoji(&self) -> Option<&'a str> {
        string_of(self.map, keys::ICON_EMOJI).filter(|s| !s.is_empty())
    }

    pub fn icon_image(&self) -> Option<&'a str> {
        string_of(self.map, keys::ICON_IMAGE).filter(|s| !s.is_empty())
    }

    /// Seconds since the Unix epoch
    pub fn timestamp(&self) -> Option<i64> {
        number_of(self.map, keys::TIMESTAMP).map(|secs| secs as i64)
    }

    pub fn featured_relations(&self) -> Vec<String> {
        id_list_of(self.map, keys::FEATURED_RELATIONS)
    }

    pub fn backlinks(&self) -> Vec<String> {
        id_list_of(self.map, keys::BACKLINKS)
    }

    pub fn links(&self) -> Vec<String> {
        id_list_of(self.map, keys::LINKS)
    }

    pub fn target_object_type(&self) -> Option<&'a str> {
        string_of(self.map, keys::TARGET_OBJECT_TYPE)
    }

    pub fn value(&self, key: &str) -> Option<&'a Value> {
        self.map.get(key)
    }
}

/// Read-only view over an object type definition
#[derive(Debug, Clone, Copy)]
pub struct ObjectTypeRecord<'a> {
    map: &'a Struct,
}

impl<'a> ObjectTypeRecord<'a> {
    pub fn new(map: &'a Struct) -> Self {
        Self { map }
    }

    pub fn id(&self) -> Option<&'a str> {
        string_of(self.map, keys::ID)
    }

    pub fn unique_key(&self) -> Option<&'a str> {
        string_of(self.map, keys::UNIQUE_KEY)
    }

    pub fn name(&self) -> Option<&'a str> {
        string_of(self.map, keys::NAME)
    }

    pub fn is_deleted(&self) -> bool {
        bool_of(self.map, keys::IS_DELETED)
    }

    pub fn is_template(&self) -> bool {
        self.unique_key() == Some(TEMPLATE_TYPE_KEY)
    }

    /// Relation ids
    pub fn recommended_relations(&self) -> Vec<String> {
        id_list_of(self.map, keys::RECOMMENDED_RELATIONS)
    }

    /// Relation ids
    pub fn recommended_featured_relations(&self) -> Vec<String> {
        id_list_of(self.map, keys::RECOMMENDED_FEATURED_RELATIONS)
    }
}

/// Read-only view over a relation definition
#[derive(Debug, Clone, Copy)]
pub struct RelationRecord<'a> {
    map: &'a Struct,
}

impl<'a> RelationRecord<'a> {
    pub fn new(map: &'a Struct) -> Self {
        Self { map }
    }

    pub fn id(&self) -> Option<&'a str> {
        string_of(self.map, keys::ID)
    }

    pub fn key(&self) -> Option<&'a str> {
        string_of(self.map, keys::RELATION_KEY)
    }

    pub fn name(&self) -> &'a str {
        string_of(self.map, keys::NAME).unwrap_or_default()
    }

    pub fn format(&self) -> RelationFormat {
        number_of(self.map, keys::RELATION_FORMAT)
            .map(|code| RelationFormat::from_code(code as i64))
            .unwrap_or(RelationFormat::Undefined)
    }

    pub fn is_hidden(&self) -> bool {
        bool_of(self.map, keys::IS_HIDDEN)
    }

    pub fn is_deleted(&self) -> bool {
        bool_of(self.map, keys::IS_DELETED)
    }
}
