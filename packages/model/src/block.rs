use crate::mark::Mark;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Stable block identifier, unique within one document version.
pub type BlockId = String;

/// A node in the document tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: BlockId,
    pub content: Content,
    #[serde(default, skip_serializing_if = "Fields::is_empty")]
    pub fields: Fields,
    /// Ordered child ids. Order defines on-screen order and numbering.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<BlockId>,
}

impl Block {
    pub fn new(id: impl Into<BlockId>, content: Content) -> Self {
        Self {
            id: id.into(),
            content,
            fields: Fields::default(),
            children: Vec::new(),
        }
    }

    /// Page root container
    pub fn smart(id: impl Into<BlockId>) -> Self {
        Self::new(id, Content::Smart)
    }

    pub fn text(id: impl Into<BlockId>, style: TextStyle, text: impl Into<String>) -> Self {
        Self::new(id, Content::Text(Text::new(style, text)))
    }

    pub fn paragraph(id: impl Into<BlockId>, text: impl Into<String>) -> Self {
        Self::text(id, TextStyle::Paragraph, text)
    }

    pub fn layout(id: impl Into<BlockId>, kind: LayoutKind) -> Self {
        Self::new(id, Content::Layout { kind })
    }

    pub fn with_children<I, S>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<BlockId>,
    {
        self.children = children.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key, value);
        self
    }

    pub fn with_marks(mut self, marks: Vec<Mark>) -> Self {
        if let Content::Text(ref mut text) = self.content {
            text.marks = marks;
        }
        self
    }

    pub fn with_checked(mut self, checked: bool) -> Self {
        if let Content::Text(ref mut text) = self.content {
            text.checked = checked;
        }
        self
    }

    pub fn as_text(&self) -> Option<&Text> {
        match &self.content {
            Content::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut Text> {
        match &mut self.content {
            Content::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn is_title(&self) -> bool {
        matches!(self.as_text(), Some(text) if text.style == TextStyle::Title)
    }
}

/// Block content variants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Content {
    /// Page root
    Smart,
    Text(Text),
    Layout {
        kind: LayoutKind,
    },
    /// Table container with a TableColumns and a TableRows layout child
    Table,
    TableRow {
        #[serde(default)]
        header: bool,
    },
    TableColumn,
    /// Synthetic marker rendered as the featured relations row
    FeaturedRelations,
    Divider {
        style: DividerStyle,
    },
    File(File),
    Bookmark(Bookmark),
    Relation {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        key: Option<String>,
    },
    Link {
        target: BlockId,
    },
    Latex {
        #[serde(default)]
        latex: String,
    },
}

impl Content {
    /// Short name used in logs and contract-violation errors
    pub fn name(&self) -> &'static str {
        match self {
            Content::Smart => "smart",
            Content::Text(_) => "text",
            Content::Layout { .. } => "layout",
            Content::Table => "table",
            Content::TableRow { .. } => "tableRow",
            Content::TableColumn => "tableColumn",
            Content::FeaturedRelations => "featuredRelations",
            Content::Divider { .. } => "divider",
            Content::File(_) => "file",
            Content::Bookmark(_) => "bookmark",
            Content::Relation { .. } => "relation",
            Content::Link { .. } => "link",
            Content::Latex { .. } => "latex",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Text {
    #[serde(default)]
    pub text: String,
    pub style: TextStyle,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub marks: Vec<Mark>,
    #[serde(default)]
    pub checked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default)]
    pub align: Align,
    /// Callout icon
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_emoji: Option<String>,
}

impl Text {
    pub fn new(style: TextStyle, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style,
            marks: Vec::new(),
            checked: false,
            color: None,
            align: Align::default(),
            icon_emoji: None,
        }
    }

    /// Length in characters. Mark ranges index characters, not bytes.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TextStyle {
    Paragraph,
    Header1,
    Header2,
    Header3,
    Header4,
    Quote,
    Callout,
    Bulleted,
    Numbered,
    Toggle,
    Checkbox,
    Code,
    Description,
    Title,
}

impl TextStyle {
    pub fn is_header(self) -> bool {
        matches!(
            self,
            TextStyle::Header1 | TextStyle::Header2 | TextStyle::Header3 | TextStyle::Header4
        )
    }

    /// Styles that live inside the header layout rather than the body
    pub fn is_header_layout_member(self) -> bool {
        matches!(self, TextStyle::Title | TextStyle::Description)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Align {
    #[default]
    Start,
    Center,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LayoutKind {
    /// Wraps title, description and featured relations
    Header,
    Row,
    Column,
    Div,
    TableRows,
    TableColumns,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DividerStyle {
    #[default]
    Line,
    Dots,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MediaState {
    #[default]
    Empty,
    Uploading,
    Done,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FileKind {
    File,
    Image,
    Video,
    Audio,
    Pdf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct File {
    pub kind: FileKind,
    #[serde(default)]
    pub state: MediaState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Target file object id once uploaded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<BlockId>,
}

impl File {
    pub fn empty(kind: FileKind) -> Self {
        Self {
            kind,
            state: MediaState::Empty,
            name: None,
            mime: None,
            size: None,
            target: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favicon: Option<String>,
    #[serde(default)]
    pub state: MediaState,
}

/// Untyped block metadata. Opaque to the engine apart from a few
/// well-known keys read through accessors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fields(BTreeMap<String, Value>);

impl Fields {
    pub const BACKGROUND_COLOR: &'static str = "backgroundColor";
    pub const IS_LOCKED: &'static str = "isLocked";
    pub const LANG: &'static str = "lang";

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Shallow merge, incoming keys win. A `null` value removes the key.
    pub fn merge(&mut self, other: &Fields) {
        for (key, value) in &other.0 {
            if value.is_null() {
                self.0.remove(key);
            } else {
                self.0.insert(key.clone(), value.clone());
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn background_color(&self) -> Option<&str> {
        self.get(Self::BACKGROUND_COLOR)
            .and_then(Value::as_str)
            .filter(|color| !color.is_empty())
    }

    pub fn is_locked(&self) -> bool {
        self.get(Self::IS_LOCKED)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub fn lang(&self) -> Option<&str> {
        self.get(Self::LANG).and_then(Value::as_str)
    }
}

impl FromIterator<(String, Value)> for Fields {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
