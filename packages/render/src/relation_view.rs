//! Render-ready relation values.
//!
//! One [`ObjectRelationView`] per relation shown on a document, either in the
//! featured row or in a relation block. The variant is chosen from the
//! relation's format; each variant carries its own value representation.

use crate::naming::ObjectNaming;
use blocktree_model::{
    keys, BlockId, ObjectLayout, ObjectRecord, ObjectViewDetails, RelationFormat, RelationRecord,
};
use chrono::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ObjectRelationView {
    Default {
        id: BlockId,
        key: String,
        name: String,
        value: Option<String>,
        format: RelationFormat,
    },
    Checkbox {
        id: BlockId,
        key: String,
        name: String,
        is_checked: bool,
    },
    Status {
        id: BlockId,
        key: String,
        name: String,
        status: Vec<StatusView>,
    },
    Tags {
        id: BlockId,
        key: String,
        name: String,
        tags: Vec<TagView>,
    },
    Object {
        id: BlockId,
        key: String,
        name: String,
        objects: Vec<ObjectView>,
    },
    File {
        id: BlockId,
        key: String,
        name: String,
        files: Vec<FileView>,
    },
    ObjectTypeBase {
        id: BlockId,
        key: String,
        name: String,
        type_id: BlockId,
    },
    ObjectTypeDeleted {
        id: BlockId,
        key: String,
        type_id: Option<BlockId>,
    },
    LinksBacklinks {
        id: BlockId,
        key: String,
        name: String,
        count: usize,
    },
    LinksFrom {
        id: BlockId,
        key: String,
        name: String,
        count: usize,
    },
}

impl ObjectRelationView {
    pub fn key(&self) -> &str {
        match self {
            ObjectRelationView::Default { key, .. }
            | ObjectRelationView::Checkbox { key, .. }
            | ObjectRelationView::Status { key, .. }
            | ObjectRelationView::Tags { key, .. }
            | ObjectRelationView::Object { key, .. }
            | ObjectRelationView::File { key, .. }
            | ObjectRelationView::ObjectTypeBase { key, .. }
            | ObjectRelationView::ObjectTypeDeleted { key, .. }
            | ObjectRelationView::LinksBacklinks { key, .. }
            | ObjectRelationView::LinksFrom { key, .. } => key,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ObjectRelationView::Default { name, .. }
            | ObjectRelationView::Checkbox { name, .. }
            | ObjectRelationView::Status { name, .. }
            | ObjectRelationView::Tags { name, .. }
            | ObjectRelationView::Object { name, .. }
            | ObjectRelationView::File { name, .. }
            | ObjectRelationView::ObjectTypeBase { name, .. }
            | ObjectRelationView::LinksBacklinks { name, .. }
            | ObjectRelationView::LinksFrom { name, .. } => name,
            ObjectRelationView::ObjectTypeDeleted { .. } => "",
        }
    }

    /// Compares only the value part, dispatching on the sub-type.
    /// Views of different sub-types always differ.
    pub fn value_differs(&self, other: &ObjectRelationView) -> bool {
        use ObjectRelationView as V;
        match (self, other) {
            (V::Default { value: a, .. }, V::Default { value: b, .. }) => a != b,
            (V::Checkbox { is_checked: a, .. }, V::Checkbox { is_checked: b, .. }) => a != b,
            (V::Status { status: a, .. }, V::Status { status: b, .. }) => a != b,
            (V::Tags { tags: a, .. }, V::Tags { tags: b, .. }) => a != b,
            (V::Object { objects: a, .. }, V::Object { objects: b, .. }) => a != b,
            (V::File { files: a, .. }, V::File { files: b, .. }) => a != b,
            (V::ObjectTypeBase { type_id: a, .. }, V::ObjectTypeBase { type_id: b, .. }) => a != b,
            (V::ObjectTypeDeleted { type_id: a, .. }, V::ObjectTypeDeleted { type_id: b, .. }) => {
                a != b
            }
            (V::LinksBacklinks { count: a, .. }, V::LinksBacklinks { count: b, .. })
            | (V::LinksFrom { count: a, .. }, V::LinksFrom { count: b, .. }) => a != b,
            _ => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusView {
    pub id: BlockId,
    pub status: String,
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagView {
    pub id: BlockId,
    pub tag: String,
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileView {
    pub id: BlockId,
    pub name: String,
    pub ext: Option<String>,
}

/// A referenced object as shown inside a relation value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum ObjectView {
    Default {
        id: BlockId,
        name: String,
        layout: Option<ObjectLayout>,
    },
    Deleted {
        id: BlockId,
    },
}

impl ObjectView {
    /// `None` when the object is missing from details or invalid
    pub fn resolve(id: &str, details: &ObjectViewDetails, naming: &ObjectNaming) -> Option<Self> {
        let Some(object) = details.object(id) else {
            debug!(object = id, "Skipping object missing from details");
            return None;
        };
        if object.is_deleted() {
            return Some(ObjectView::Deleted { id: id.to_string() });
        }
        Some(ObjectView::Default {
            id: id.to_string(),
            name: naming.object_name(&object),
            layout: object.layout(),
        })
    }
}

/// Builds the value view for `relation` on `object`
pub fn relation_view_for(
    relation: &RelationRecord<'_>,
    object: &ObjectRecord<'_>,
    details: &ObjectViewDetails,
    naming: &ObjectNaming,
) -> Option<ObjectRelationView> {
    let key = relation.key()?.to_string();
    let id = relation.id().unwrap_or(&key).to_string();
    let name = relation.name().to_string();
    let raw = object.value(&key);

    let view = match relation.format() {
        RelationFormat::Checkbox => ObjectRelationView::Checkbox {
            id,
            key,
            name,
            is_checked: raw.and_then(Value::as_bool).unwrap_or(false),
        },
        RelationFormat::Status => ObjectRelationView::Status {
            status: options_of(object, &key, details)
                .map(|(id, status, color)| StatusView { id, status, color })
                .collect(),
            id,
            key,
            name,
        },
        RelationFormat::Tag => ObjectRelationView::Tags {
            tags: options_of(object, &key, details)
                .map(|(id, tag, color)| TagView { id, tag, color })
                .collect(),
            id,
            key,
            name,
        },
        RelationFormat::Object => ObjectRelationView::Object {
            objects: ids_of(object, &key)
                .iter()
                .filter_map(|target| ObjectView::resolve(target, details, naming))
                .collect(),
            id,
            key,
            name,
        },
        RelationFormat::File => ObjectRelationView::File {
            files: ids_of(object, &key)
                .iter()
                .filter_map(|target| details.object(target))
                .map(|file| FileView {
                    id: file.id().unwrap_or_default().to_string(),
                    name: file.name().unwrap_or_default().to_string(),
                    ext: file.file_ext().map(str::to_string),
                })
                .collect(),
            id,
            key,
            name,
        },
        format => ObjectRelationView::Default {
            value: raw.and_then(|value| format_value(value, format, naming)),
            id,
            key,
            name,
            format,
        },
    };
    Some(view)
}

fn ids_of(object: &ObjectRecord<'_>, key: &str) -> Vec<String> {
    match object.value(key) {
        Some(Value::String(id)) => vec![id.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

/// Relation options (status/tag) referenced by the object, as (id, name, color)
fn options_of<'a>(
    object: &ObjectRecord<'_>,
    key: &str,
    details: &'a ObjectViewDetails,
) -> impl Iterator<Item = (String, String, Option<String>)> + 'a {
    ids_of(object, key).into_iter().filter_map(move |id| {
        let option = details.object(&id)?;
        let name = option.name().unwrap_or_default().to_string();
        let color = option
            .value(keys::RELATION_OPTION_COLOR)
            .and_then(Value::as_str)
            .map(str::to_string);
        Some((id, name, color))
    })
}

fn format_value(value: &Value, format: RelationFormat, naming: &ObjectNaming) -> Option<String> {
    match (format, value) {
        (_, Value::Null) => None,
        (RelationFormat::Date, Value::Number(n)) => n
            .as_f64()
            .and_then(|secs| DateTime::from_timestamp(secs as i64, 0))
            .map(|date| naming.format_date(date.date_naive())),
        (_, Value::Number(n)) => Some(match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            _ => n.to_string(),
        }),
        (_, Value::String(s)) if s.is_empty() => None,
        (_, Value::String(s)) => Some(s.clone()),
        (_, Value::Bool(b)) => Some(b.to_string()),
        (_, other) => Some(other.to_string()),
    }
}
