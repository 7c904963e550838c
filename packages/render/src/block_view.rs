//! # Block views
//!
//! The flattened, render-ready projection of one block plus its transient
//! UI state (focus, cursor, selection, mode, search highlights).
//!
//! ## Design
//!
//! Each concrete kind of view is identified by a [`ViewType`]. Two views
//! with the same id but different view types are never patched in place:
//! the differ treats that as a full replace. Sub-kinds that carry their own
//! data (numbered items, toggles, title layouts...) are modeled as nested
//! enums so that variant-specific fields only exist where they apply.

use crate::relation_view::ObjectRelationView;
use blocktree_model::{Align, BlockId, DividerStyle, Mark, MediaState};
use serde::{Deserialize, Serialize};
use std::ops::Range;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Mode {
    #[default]
    Edit,
    Read,
}

/// Search matches inside one block's text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchField {
    pub highlights: Vec<Range<usize>>,
    /// Match the user is currently stepping through
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Range<usize>>,
}

/// Concrete view kind. Equality of view types is what makes two views
/// patchable in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewType {
    TitleBasic,
    TitleProfile,
    TitleTodo,
    TitleNote,
    Paragraph,
    HeaderOne,
    HeaderTwo,
    HeaderThree,
    HeaderFour,
    Quote,
    Callout,
    Bulleted,
    Numbered,
    Toggle,
    Checkbox,
    Code,
    Description,
    FeaturedRelation,
    DividerLine,
    DividerDots,
    MediaFile,
    MediaPicture,
    MediaVideo,
    MediaAudio,
    MediaPdf,
    MediaBookmark,
    RelationRelated,
    RelationPlaceholder,
    RelationDeleted,
    LinkDefault,
    LinkArchived,
    LinkDeleted,
    Latex,
    Table,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BlockView {
    Title(TitleView),
    Text(TextView),
    Description(DescriptionView),
    FeaturedRelation(FeaturedRelationView),
    Divider(DividerView),
    Media(MediaView),
    Relation(RelationBlockView),
    LinkToObject(LinkView),
    Latex(LatexView),
    Table(TableView),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "layout", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum TitleKind {
    Basic {
        emoji: Option<String>,
        image: Option<String>,
    },
    Profile {
        image: Option<String>,
    },
    Todo {
        is_checked: bool,
    },
    Note,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TitleView {
    pub id: BlockId,
    pub kind: TitleKind,
    pub text: String,
    pub mode: Mode,
    pub is_focused: bool,
    pub cursor: Option<usize>,
    pub background: Option<String>,
    pub search_fields: Vec<SearchField>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "style", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum TextKind {
    Paragraph,
    HeaderOne,
    HeaderTwo,
    HeaderThree,
    HeaderFour,
    Quote,
    Callout { icon: Option<String> },
    Bulleted,
    Numbered { number: u32 },
    Toggle { is_empty: bool, is_toggled: bool },
    Checkbox { is_checked: bool },
    Code { lang: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextView {
    pub id: BlockId,
    pub kind: TextKind,
    pub text: String,
    pub marks: Vec<Mark>,
    pub color: Option<String>,
    pub background: Option<String>,
    pub align: Align,
    pub indent: usize,
    pub mode: Mode,
    pub is_focused: bool,
    pub cursor: Option<usize>,
    pub is_selected: bool,
    pub search_fields: Vec<SearchField>,
}

impl TextView {
    pub fn new(id: impl Into<BlockId>, kind: TextKind, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            text: text.into(),
            marks: Vec::new(),
            color: None,
            background: None,
            align: Align::Start,
            indent: 0,
            mode: Mode::Edit,
            is_focused: false,
            cursor: None,
            is_selected: false,
            search_fields: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescriptionView {
    pub id: BlockId,
    pub text: String,
    pub mode: Mode,
    pub is_focused: bool,
    pub cursor: Option<usize>,
    pub search_fields: Vec<SearchField>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeaturedRelationView {
    pub id: BlockId,
    pub relations: Vec<ObjectRelationView>,
    pub has_feature_properties_conflict: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DividerView {
    pub id: BlockId,
    pub style: DividerStyle,
    pub indent: usize,
    pub is_selected: bool,
    pub background: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "media", rename_all = "camelCase")]
pub enum MediaKind {
    File {
        name: Option<String>,
        mime: Option<String>,
        size: Option<u64>,
        target: Option<BlockId>,
    },
    Picture {
        target: Option<BlockId>,
    },
    Video {
        target: Option<BlockId>,
    },
    Audio {
        name: Option<String>,
        target: Option<BlockId>,
    },
    Pdf {
        name: Option<String>,
        target: Option<BlockId>,
    },
    Bookmark {
        url: Option<String>,
        title: Option<String>,
        description: Option<String>,
        image: Option<String>,
        favicon: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaView {
    pub id: BlockId,
    pub kind: MediaKind,
    pub state: MediaState,
    pub indent: usize,
    pub mode: Mode,
    pub is_selected: bool,
    pub background: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum RelationState {
    Related { view: ObjectRelationView },
    Placeholder { key: Option<String> },
    Deleted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationBlockView {
    pub id: BlockId,
    pub state: RelationState,
    pub indent: usize,
    pub mode: Mode,
    pub is_selected: bool,
    pub background: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum LinkKind {
    Default {
        name: String,
        description: Option<String>,
        emoji: Option<String>,
        image: Option<String>,
        /// Target details have not arrived yet
        is_loading: bool,
    },
    Archived {
        name: String,
    },
    Deleted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkView {
    pub id: BlockId,
    pub target: BlockId,
    pub kind: LinkKind,
    pub indent: usize,
    pub mode: Mode,
    pub is_selected: bool,
    pub background: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatexView {
    pub id: BlockId,
    pub latex: String,
    pub indent: usize,
    pub mode: Mode,
    pub is_selected: bool,
    pub background: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRowView {
    pub id: BlockId,
    pub is_header: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableCellView {
    pub row: BlockId,
    pub column: BlockId,
    /// `None` for a cell with no block yet
    pub block: Option<BlockId>,
    pub text: String,
    pub marks: Vec<Mark>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableView {
    pub id: BlockId,
    pub columns: Vec<BlockId>,
    pub rows: Vec<TableRowView>,
    /// Row-major
    pub cells: Vec<TableCellView>,
    pub indent: usize,
    pub mode: Mode,
    pub is_selected: bool,
    pub background: Option<String>,
}

impl BlockView {
    pub fn id(&self) -> &str {
        match self {
            BlockView::Title(v) => &v.id,
            BlockView::Text(v) => &v.id,
            BlockView::Description(v) => &v.id,
            BlockView::FeaturedRelation(v) => &v.id,
            BlockView::Divider(v) => &v.id,
            BlockView::Media(v) => &v.id,
            BlockView::Relation(v) => &v.id,
            BlockView::LinkToObject(v) => &v.id,
            BlockView::Latex(v) => &v.id,
            BlockView::Table(v) => &v.id,
        }
    }

    pub fn view_type(&self) -> ViewType {
        match self {
            BlockView::Title(v) => match v.kind {
                TitleKind::Basic { .. } => ViewType::TitleBasic,
                TitleKind::Profile { .. } => ViewType::TitleProfile,
                TitleKind::Todo { .. } => ViewType::TitleTodo,
                TitleKind::Note => ViewType::TitleNote,
            },
            BlockView::Text(v) => match v.kind {
                TextKind::Paragraph => ViewType::Paragraph,
                TextKind::HeaderOne => ViewType::HeaderOne,
                TextKind::HeaderTwo => ViewType::HeaderTwo,
                TextKind::HeaderThree => ViewType::HeaderThree,
                TextKind::HeaderFour => ViewType::HeaderFour,
                TextKind::Quote => ViewType::Quote,
                TextKind::Callout { .. } => ViewType::Callout,
                TextKind::Bulleted => ViewType::Bulleted,
                TextKind::Numbered { .. } => ViewType::Numbered,
                TextKind::Toggle { .. } => ViewType::Toggle,
                TextKind::Checkbox { .. } => ViewType::Checkbox,
                TextKind::Code { .. } => ViewType::Code,
            },
            BlockView::Description(_) => ViewType::Description,
            BlockView::FeaturedRelation(_) => ViewType::FeaturedRelation,
            BlockView::Divider(v) => match v.style {
                DividerStyle::Line => ViewType::DividerLine,
                DividerStyle::Dots => ViewType::DividerDots,
            },
            BlockView::Media(v) => match v.kind {
                MediaKind::File { .. } => ViewType::MediaFile,
                MediaKind::Picture { .. } => ViewType::MediaPicture,
                MediaKind::Video { .. } => ViewType::MediaVideo,
                MediaKind::Audio { .. } => ViewType::MediaAudio,
                MediaKind::Pdf { .. } => ViewType::MediaPdf,
                MediaKind::Bookmark { .. } => ViewType::MediaBookmark,
            },
            BlockView::Relation(v) => match v.state {
                RelationState::Related { .. } => ViewType::RelationRelated,
                RelationState::Placeholder { .. } => ViewType::RelationPlaceholder,
                RelationState::Deleted => ViewType::RelationDeleted,
            },
            BlockView::LinkToObject(v) => match v.kind {
                LinkKind::Default { .. } => ViewType::LinkDefault,
                LinkKind::Archived { .. } => ViewType::LinkArchived,
                LinkKind::Deleted => ViewType::LinkDeleted,
            },
            BlockView::Latex(_) => ViewType::Latex,
            BlockView::Table(_) => ViewType::Table,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            BlockView::Title(v) => Some(&v.text),
            BlockView::Text(v) => Some(&v.text),
            BlockView::Description(v) => Some(&v.text),
            _ => None,
        }
    }

    pub fn marks(&self) -> Option<&[Mark]> {
        match self {
            BlockView::Text(v) => Some(&v.marks),
            _ => None,
        }
    }

    pub fn indent(&self) -> Option<usize> {
        match self {
            BlockView::Text(v) => Some(v.indent),
            BlockView::Divider(v) => Some(v.indent),
            BlockView::Media(v) => Some(v.indent),
            BlockView::Relation(v) => Some(v.indent),
            BlockView::LinkToObject(v) => Some(v.indent),
            BlockView::Latex(v) => Some(v.indent),
            BlockView::Table(v) => Some(v.indent),
            BlockView::Title(_) | BlockView::Description(_) | BlockView::FeaturedRelation(_) => {
                None
            }
        }
    }

    pub fn background(&self) -> Option<Option<&str>> {
        let background = match self {
            BlockView::Title(v) => &v.background,
            BlockView::Text(v) => &v.background,
            BlockView::Divider(v) => &v.background,
            BlockView::Media(v) => &v.background,
            BlockView::Relation(v) => &v.background,
            BlockView::LinkToObject(v) => &v.background,
            BlockView::Latex(v) => &v.background,
            BlockView::Table(v) => &v.background,
            BlockView::Description(_) | BlockView::FeaturedRelation(_) => return None,
        };
        Some(background.as_deref())
    }

    pub fn mode(&self) -> Option<Mode> {
        match self {
            BlockView::Title(v) => Some(v.mode),
            BlockView::Text(v) => Some(v.mode),
            BlockView::Description(v) => Some(v.mode),
            BlockView::Media(v) => Some(v.mode),
            BlockView::Relation(v) => Some(v.mode),
            BlockView::LinkToObject(v) => Some(v.mode),
            BlockView::Latex(v) => Some(v.mode),
            BlockView::Table(v) => Some(v.mode),
            BlockView::FeaturedRelation(_) | BlockView::Divider(_) => None,
        }
    }

    pub fn is_focused(&self) -> Option<bool> {
        match self {
            BlockView::Title(v) => Some(v.is_focused),
            BlockView::Text(v) => Some(v.is_focused),
            BlockView::Description(v) => Some(v.is_focused),
            _ => None,
        }
    }

    pub fn cursor(&self) -> Option<Option<usize>> {
        match self {
            BlockView::Title(v) => Some(v.cursor),
            BlockView::Text(v) => Some(v.cursor),
            BlockView::Description(v) => Some(v.cursor),
            _ => None,
        }
    }

    pub fn is_selected(&self) -> Option<bool> {
        match self {
            BlockView::Text(v) => Some(v.is_selected),
            BlockView::Divider(v) => Some(v.is_selected),
            BlockView::Media(v) => Some(v.is_selected),
            BlockView::Relation(v) => Some(v.is_selected),
            BlockView::LinkToObject(v) => Some(v.is_selected),
            BlockView::Latex(v) => Some(v.is_selected),
            BlockView::Table(v) => Some(v.is_selected),
            BlockView::Title(_) | BlockView::Description(_) | BlockView::FeaturedRelation(_) => {
                None
            }
        }
    }

    pub fn search_fields(&self) -> Option<&[SearchField]> {
        match self {
            BlockView::Title(v) => Some(&v.search_fields),
            BlockView::Text(v) => Some(&v.search_fields),
            BlockView::Description(v) => Some(&v.search_fields),
            _ => None,
        }
    }

    /// Text blocks the user can type into
    pub fn is_text_editable(&self) -> bool {
        matches!(self, BlockView::Title(_) | BlockView::Text(_) | BlockView::Description(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_type_follows_kind() {
        let paragraph = BlockView::Text(TextView::new("a", TextKind::Paragraph, "x"));
        let numbered = BlockView::Text(TextView::new("a", TextKind::Numbered { number: 1 }, "x"));
        assert_eq!(paragraph.view_type(), ViewType::Paragraph);
        assert_eq!(numbered.view_type(), ViewType::Numbered);
        assert_eq!(paragraph.id(), numbered.id());
    }

    #[test]
    fn test_field_accessors_absent_where_not_carried() {
        let featured = BlockView::FeaturedRelation(FeaturedRelationView {
            id: "f".into(),
            relations: vec![],
            has_feature_properties_conflict: false,
        });
        assert_eq!(featured.indent(), None);
        assert_eq!(featured.is_focused(), None);
        assert_eq!(featured.background(), None);
        assert!(!featured.is_text_editable());
    }

    #[test]
    fn test_serialized_shape() {
        let view = BlockView::Text(TextView::new(
            "a",
            TextKind::Toggle {
                is_empty: true,
                is_toggled: false,
            },
            "x",
        ));
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["type"], "text");
        assert_eq!(json["kind"]["style"], "toggle");
        assert_eq!(json["kind"]["isEmpty"], true);
        assert_eq!(json["isFocused"], false);
    }
}
