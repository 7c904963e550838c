//! # Tree flattener
//!
//! Walks a [`BlockTree`] depth-first from the `Smart` root and produces the
//! ordered list of [`BlockView`]s.
//!
//! ## Traversal
//!
//! - Children render in declared order.
//! - The header layout is transparent, with its title surfaced first.
//! - Row, column and div layouts are transparent at the current indent.
//! - Children of content blocks render one indent level deeper. A toggle's
//!   children only render while it is open.
//! - A table consumes its whole row/column subtree as one view.
//!
//! Numbered items are counted per contiguous run of numbered siblings;
//! any other sibling restarts the count.
//!
//! ## Failure policy
//!
//! Dangling children and cycles are skipped and reported as
//! [`RenderWarning`]s. Content in an impossible position (a nested page
//! root, table parts outside a table) aborts the pass with [`RenderError`].

use crate::block_view::*;
use crate::errors::{RenderError, RenderResult};
use crate::featured::FeaturedSources;
use crate::focus::Focus;
use crate::markup::{composite, highlights};
use crate::naming::{ObjectNaming, Placeholders};
use blocktree_model::restrictions::blocks_read_only;
use blocktree_model::{
    Block, BlockId, BlockTree, Bookmark, Content, File, FileKind, LayoutKind, ObjectLayout,
    ObjectRestriction, ObjectTypeIndex, ObjectViewDetails, RelationIndex, Text, TextStyle,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::ops::Range;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Active in-document search
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub query: String,
    /// Match currently stepped to, as (block, character range)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<(BlockId, Range<usize>)>,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            target: None,
        }
    }
}

/// Transient UI state and shared lookups for one render pass
#[derive(Debug, Clone, Default)]
pub struct RenderState {
    pub focus: Focus,
    /// Blocks selected in multi-select mode
    pub selected: BTreeSet<BlockId>,
    /// Open toggles
    pub toggled: BTreeSet<BlockId>,
    pub search: Option<SearchQuery>,
    pub restrictions: Vec<ObjectRestriction>,
    pub relations: Arc<RelationIndex>,
    pub object_types: Arc<ObjectTypeIndex>,
}

impl RenderState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_focus(mut self, focus: Focus) -> Self {
        self.focus = focus;
        self
    }

    pub fn with_selected<I: IntoIterator<Item = BlockId>>(mut self, ids: I) -> Self {
        self.selected = ids.into_iter().collect();
        self
    }

    pub fn with_toggled<I: IntoIterator<Item = BlockId>>(mut self, ids: I) -> Self {
        self.toggled = ids.into_iter().collect();
        self
    }

    pub fn with_search(mut self, search: SearchQuery) -> Self {
        self.search = Some(search);
        self
    }

    pub fn with_restrictions(mut self, restrictions: Vec<ObjectRestriction>) -> Self {
        self.restrictions = restrictions;
        self
    }

    pub fn with_relations(mut self, relations: Arc<RelationIndex>) -> Self {
        self.relations = relations;
        self
    }

    pub fn with_object_types(mut self, object_types: Arc<ObjectTypeIndex>) -> Self {
        self.object_types = object_types;
        self
    }
}

/// Non-fatal inconsistency met while rendering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RenderWarning {
    DanglingChild { parent: BlockId, child: BlockId },
    Cycle { id: BlockId },
    MissingRelation { key: String },
    MissingObjectType { id: BlockId },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderOutput {
    pub views: Vec<BlockView>,
    pub warnings: Vec<RenderWarning>,
    /// Featured relations listed on the object differ from its type's
    pub layout_conflict: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Renderer {
    naming: ObjectNaming,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_naming(mut self, naming: ObjectNaming) -> Self {
        self.naming = naming;
        self
    }

    pub fn with_placeholders(mut self, placeholders: Placeholders) -> Self {
        self.naming.placeholders = placeholders;
        self
    }

    pub fn naming(&self) -> &ObjectNaming {
        &self.naming
    }

    /// Flattens `tree` into views
    #[instrument(skip_all, fields(root = tree.root_id(), blocks = tree.len()))]
    pub fn render(
        &self,
        tree: &BlockTree,
        details: &ObjectViewDetails,
        state: &RenderState,
    ) -> RenderResult<RenderOutput> {
        let root = tree
            .root()
            .ok_or_else(|| RenderError::RootNotFound(tree.root_id().to_string()))?;
        if root.content != Content::Smart {
            return Err(RenderError::RootNotSmart {
                id: root.id.clone(),
                content: root.content.name(),
            });
        }

        let mode = if blocks_read_only(&state.restrictions) || root.fields.is_locked() {
            Mode::Read
        } else {
            Mode::Edit
        };

        let mut pass = Pass {
            tree,
            details,
            state,
            naming: &self.naming,
            mode,
            visited: HashSet::from([root.id.as_str()]),
            out: RenderOutput::default(),
        };
        pass.children(root, 0)?;

        debug!(
            views = pass.out.views.len(),
            warnings = pass.out.warnings.len(),
            "Rendered document"
        );
        Ok(pass.out)
    }
}

struct Pass<'a> {
    tree: &'a BlockTree,
    details: &'a ObjectViewDetails,
    state: &'a RenderState,
    naming: &'a ObjectNaming,
    mode: Mode,
    visited: HashSet<&'a str>,
    out: RenderOutput,
}

impl<'a> Pass<'a> {
    /// Resolves a child id, recording dangling references and cycles
    fn resolve(&mut self, parent: &Block, child: &'a str) -> Option<&'a Block> {
        let Some(block) = self.tree.get(child) else {
            warn!(parent = %parent.id, child, "Skipping dangling child");
            self.out.warnings.push(RenderWarning::DanglingChild {
                parent: parent.id.clone(),
                child: child.to_string(),
            });
            return None;
        };
        if !self.visited.insert(child) {
            warn!(id = child, "Skipping block reached twice");
            self.out.warnings.push(RenderWarning::Cycle {
                id: child.to_string(),
            });
            return None;
        }
        Some(block)
    }

    fn children(&mut self, parent: &'a Block, indent: usize) -> RenderResult<()> {
        self.ordered(parent, parent.children.iter().map(String::as_str), indent)
    }

    fn ordered<I>(&mut self, parent: &'a Block, ids: I, indent: usize) -> RenderResult<()>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut number = 0;
        for id in ids {
            let Some(block) = self.resolve(parent, id) else {
                continue;
            };
            number = match block.as_text() {
                Some(text) if text.style == TextStyle::Numbered => number + 1,
                _ => 0,
            };
            self.block(parent, block, indent, number)?;
        }
        Ok(())
    }

    fn block(
        &mut self,
        parent: &'a Block,
        block: &'a Block,
        indent: usize,
        number: u32,
    ) -> RenderResult<()> {
        match &block.content {
            Content::Smart
            | Content::TableRow { .. }
            | Content::TableColumn
            | Content::Layout {
                kind: LayoutKind::TableRows | LayoutKind::TableColumns,
            } => {
                return Err(RenderError::UnexpectedContent {
                    id: block.id.clone(),
                    content: block.content.name(),
                    parent: parent.id.clone(),
                })
            }
            Content::Layout {
                kind: LayoutKind::Header,
            } => {
                let (title, rest): (Vec<&BlockId>, Vec<&BlockId>) =
                    block.children.iter().partition(|id| {
                        self.tree.get(id).map_or(false, |b| b.is_title())
                    });
                let ids = title.into_iter().chain(rest).map(String::as_str);
                return self.ordered(block, ids, indent);
            }
            Content::Layout { .. } => return self.children(block, indent),
            Content::Table => {
                let view = self.table(block, indent);
                self.out.views.push(BlockView::Table(view));
                return Ok(());
            }
            Content::Text(text) => match text.style {
                TextStyle::Title => {
                    let view = self.title(block, text);
                    self.out.views.push(BlockView::Title(view));
                    return Ok(());
                }
                TextStyle::Description => {
                    let view = self.description(block, text);
                    self.out.views.push(BlockView::Description(view));
                    return Ok(());
                }
                _ => {
                    let view = self.text(block, text, indent, number);
                    let collapsed = text.style == TextStyle::Toggle
                        && !self.state.toggled.contains(&block.id);
                    self.out.views.push(BlockView::Text(view));
                    if collapsed {
                        return Ok(());
                    }
                }
            },
            Content::FeaturedRelations => {
                let sources = FeaturedSources {
                    details: self.details,
                    relations: &self.state.relations,
                    object_types: &self.state.object_types,
                    naming: self.naming,
                };
                let featured = sources.resolve(self.tree.root_id());
                self.out.layout_conflict = featured.conflict;
                self.out.warnings.extend(featured.warnings);
                if featured.relations.is_empty() {
                    debug!(id = %block.id, "Omitting empty featured relations");
                } else {
                    self.out
                        .views
                        .push(BlockView::FeaturedRelation(FeaturedRelationView {
                            id: block.id.clone(),
                            relations: featured.relations,
                            has_feature_properties_conflict: featured.conflict,
                        }));
                }
                return Ok(());
            }
            Content::Divider { style } => {
                self.out.views.push(BlockView::Divider(DividerView {
                    id: block.id.clone(),
                    style: *style,
                    indent,
                    is_selected: self.is_selected(block),
                    background: background_of(block),
                }));
            }
            Content::File(file) => {
                let view = self.file(block, file, indent);
                self.out.views.push(BlockView::Media(view));
            }
            Content::Bookmark(bookmark) => {
                let view = self.bookmark(block, bookmark, indent);
                self.out.views.push(BlockView::Media(view));
            }
            Content::Relation { key } => {
                let view = self.relation(block, key.as_deref(), indent);
                self.out.views.push(BlockView::Relation(view));
            }
            Content::Link { target } => {
                let view = self.link(block, target, indent);
                self.out.views.push(BlockView::LinkToObject(view));
            }
            Content::Latex { latex } => {
                self.out.views.push(BlockView::Latex(LatexView {
                    id: block.id.clone(),
                    latex: latex.clone(),
                    indent,
                    mode: self.mode,
                    is_selected: self.is_selected(block),
                    background: background_of(block),
                }));
            }
        }
        self.children(block, indent + 1)
    }

    fn is_selected(&self, block: &Block) -> bool {
        self.state.selected.contains(&block.id)
    }

    /// (is_focused, cursor) for an editable text of `len` characters
    fn focus_of(&self, block: &Block, len: usize) -> (bool, Option<usize>) {
        let focus = &self.state.focus;
        if focus.is_target(&block.id) {
            (true, focus.cursor.map(|cursor| cursor.resolve(len)))
        } else {
            (false, None)
        }
    }

    fn search_of(&self, block: &Block, text: &str) -> Vec<SearchField> {
        let Some(search) = &self.state.search else {
            return Vec::new();
        };
        let found = highlights(text, &search.query);
        if found.is_empty() {
            return Vec::new();
        }
        let target = search
            .target
            .as_ref()
            .filter(|(id, _)| *id == block.id)
            .map(|(_, range)| range.clone());
        vec![SearchField {
            highlights: found,
            target,
        }]
    }

    fn title(&self, block: &Block, text: &Text) -> TitleView {
        let object = self.details.object(self.tree.root_id());
        let kind = match object.as_ref().and_then(|o| o.layout()) {
            Some(ObjectLayout::Todo) => TitleKind::Todo {
                is_checked: object.map_or(false, |o| o.done()),
            },
            Some(ObjectLayout::Profile | ObjectLayout::Participant) => TitleKind::Profile {
                image: object.and_then(|o| o.icon_image()).map(str::to_string),
            },
            Some(ObjectLayout::Note) => TitleKind::Note,
            _ => TitleKind::Basic {
                emoji: object.and_then(|o| o.icon_emoji()).map(str::to_string),
                image: object.and_then(|o| o.icon_image()).map(str::to_string),
            },
        };
        let (is_focused, cursor) = self.focus_of(block, text.char_len());
        TitleView {
            id: block.id.clone(),
            kind,
            text: text.text.clone(),
            mode: self.mode,
            is_focused,
            cursor,
            background: background_of(block),
            search_fields: self.search_of(block, &text.text),
        }
    }

    fn description(&self, block: &Block, text: &Text) -> DescriptionView {
        let (is_focused, cursor) = self.focus_of(block, text.char_len());
        DescriptionView {
            id: block.id.clone(),
            text: text.text.clone(),
            mode: self.mode,
            is_focused,
            cursor,
            search_fields: self.search_of(block, &text.text),
        }
    }

    fn text(&self, block: &Block, text: &Text, indent: usize, number: u32) -> TextView {
        let kind = match text.style {
            TextStyle::Paragraph => TextKind::Paragraph,
            TextStyle::Header1 => TextKind::HeaderOne,
            TextStyle::Header2 => TextKind::HeaderTwo,
            TextStyle::Header3 => TextKind::HeaderThree,
            TextStyle::Header4 => TextKind::HeaderFour,
            TextStyle::Quote => TextKind::Quote,
            TextStyle::Callout => TextKind::Callout {
                icon: text.icon_emoji.clone(),
            },
            TextStyle::Bulleted => TextKind::Bulleted,
            TextStyle::Numbered => TextKind::Numbered { number },
            TextStyle::Toggle => TextKind::Toggle {
                is_empty: block.children.is_empty(),
                is_toggled: self.state.toggled.contains(&block.id),
            },
            TextStyle::Checkbox => TextKind::Checkbox {
                is_checked: text.checked,
            },
            TextStyle::Code => TextKind::Code {
                lang: block.fields.lang().map(str::to_string),
            },
            // Routed to their own views before reaching here
            TextStyle::Title | TextStyle::Description => TextKind::Paragraph,
        };
        let len = text.char_len();
        let (is_focused, cursor) = self.focus_of(block, len);
        TextView {
            id: block.id.clone(),
            kind,
            text: text.text.clone(),
            marks: composite(&text.marks, len),
            color: text.color.clone(),
            background: background_of(block),
            align: text.align,
            indent,
            mode: self.mode,
            is_focused,
            cursor,
            is_selected: self.is_selected(block),
            search_fields: self.search_of(block, &text.text),
        }
    }

    fn file(&self, block: &Block, file: &File, indent: usize) -> MediaView {
        let target = file.target.clone();
        let kind = match file.kind {
            FileKind::File => MediaKind::File {
                name: file.name.clone(),
                mime: file.mime.clone(),
                size: file.size,
                target,
            },
            FileKind::Image => MediaKind::Picture { target },
            FileKind::Video => MediaKind::Video { target },
            FileKind::Audio => MediaKind::Audio {
                name: file.name.clone(),
                target,
            },
            FileKind::Pdf => MediaKind::Pdf {
                name: file.name.clone(),
                target,
            },
        };
        MediaView {
            id: block.id.clone(),
            kind,
            state: file.state,
            indent,
            mode: self.mode,
            is_selected: self.is_selected(block),
            background: background_of(block),
        }
    }

    fn bookmark(&self, block: &Block, bookmark: &Bookmark, indent: usize) -> MediaView {
        MediaView {
            id: block.id.clone(),
            kind: MediaKind::Bookmark {
                url: bookmark.url.clone(),
                title: bookmark.title.clone(),
                description: bookmark.description.clone(),
                image: bookmark.image.clone(),
                favicon: bookmark.favicon.clone(),
            },
            state: bookmark.state,
            indent,
            mode: self.mode,
            is_selected: self.is_selected(block),
            background: background_of(block),
        }
    }

    fn relation(&mut self, block: &Block, key: Option<&str>, indent: usize) -> RelationBlockView {
        let state = match key.filter(|k| !k.is_empty()) {
            None => RelationState::Placeholder { key: None },
            Some(key) => {
                let definition = self
                    .state
                    .relations
                    .by_key(key)
                    .filter(|definition| !definition.is_deleted());
                let object = self.details.object(self.tree.root_id());
                match (definition, object) {
                    (Some(definition), Some(object)) => {
                        match crate::relation_view::relation_view_for(
                            &definition,
                            &object,
                            self.details,
                            self.naming,
                        ) {
                            Some(view) => RelationState::Related { view },
                            None => RelationState::Placeholder {
                                key: Some(key.to_string()),
                            },
                        }
                    }
                    (None, _) => {
                        warn!(key, "Relation block references an unknown relation");
                        self.out.warnings.push(RenderWarning::MissingRelation {
                            key: key.to_string(),
                        });
                        RelationState::Deleted
                    }
                    (Some(_), None) => RelationState::Placeholder {
                        key: Some(key.to_string()),
                    },
                }
            }
        };
        RelationBlockView {
            id: block.id.clone(),
            state,
            indent,
            mode: self.mode,
            is_selected: self.is_selected(block),
            background: background_of(block),
        }
    }

    fn link(&self, block: &Block, target: &str, indent: usize) -> LinkView {
        let kind = match self.details.object(target) {
            None => LinkKind::Default {
                name: String::new(),
                description: None,
                emoji: None,
                image: None,
                is_loading: true,
            },
            Some(object) if object.is_deleted() => LinkKind::Deleted,
            Some(object) if object.is_archived() => LinkKind::Archived {
                name: self.naming.object_name(&object),
            },
            Some(object) => LinkKind::Default {
                name: self.naming.object_name(&object),
                description: object
                    .description()
                    .filter(|d| !d.is_empty())
                    .map(str::to_string),
                emoji: object.icon_emoji().map(str::to_string),
                image: object.icon_image().map(str::to_string),
                is_loading: false,
            },
        };
        LinkView {
            id: block.id.clone(),
            target: target.to_string(),
            kind,
            indent,
            mode: self.mode,
            is_selected: self.is_selected(block),
            background: background_of(block),
        }
    }

    /// Consumes the table's column and row layouts
    fn table(&mut self, block: &'a Block, indent: usize) -> TableView {
        let mut columns = Vec::new();
        let mut rows: Vec<&'a Block> = Vec::new();

        for child in &block.children {
            let Some(layout) = self.resolve(block, child) else {
                continue;
            };
            match layout.content {
                Content::Layout {
                    kind: LayoutKind::TableColumns,
                } => {
                    for id in &layout.children {
                        if let Some(column) = self.resolve(layout, id) {
                            if column.content == Content::TableColumn {
                                columns.push(column.id.clone());
                            }
                        }
                    }
                }
                Content::Layout {
                    kind: LayoutKind::TableRows,
                } => {
                    for id in &layout.children {
                        if let Some(row) = self.resolve(layout, id) {
                            if matches!(row.content, Content::TableRow { .. }) {
                                rows.push(row);
                            }
                        }
                    }
                }
                _ => debug!(id = %layout.id, "Ignoring unexpected table child"),
            }
        }

        let mut cells = Vec::with_capacity(rows.len() * columns.len());
        for row in &rows {
            for column in &columns {
                let cell_id = format!("{}-{}", row.id, column);
                let text = row
                    .children
                    .iter()
                    .find(|id| **id == cell_id)
                    .and_then(|id| self.tree.get(id))
                    .and_then(|cell| cell.as_text().map(|text| (cell, text)));
                if let Some((cell, _)) = text {
                    self.visited.insert(cell.id.as_str());
                }
                cells.push(TableCellView {
                    row: row.id.clone(),
                    column: column.clone(),
                    block: text.map(|(cell, _)| cell.id.clone()),
                    text: text.map(|(_, t)| t.text.clone()).unwrap_or_default(),
                    marks: text
                        .map(|(_, t)| composite(&t.marks, t.char_len()))
                        .unwrap_or_default(),
                });
            }
        }

        TableView {
            id: block.id.clone(),
            columns,
            rows: rows
                .iter()
                .map(|row| TableRowView {
                    id: row.id.clone(),
                    is_header: matches!(row.content, Content::TableRow { header: true }),
                })
                .collect(),
            cells,
            indent,
            mode: self.mode,
            is_selected: self.is_selected(block),
            background: background_of(block),
        }
    }
}

fn background_of(block: &Block) -> Option<String> {
    block.fields.background_color().map(str::to_string)
}
