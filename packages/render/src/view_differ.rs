//! # View differ
//!
//! Compares two rendered view lists position by position and reports, for
//! each index, whether the entry kept its identity and which fields changed.
//!
//! ## Design
//!
//! ```text
//! old[i], new[i]
//!   │
//!   ├── ids differ ─────────────► Replace
//!   ├── fully equal ────────────► Unchanged
//!   ├── view types differ ──────► Update { payload: None }
//!   └── same view type ─────────► Update { payload: run COMPARATORS }
//! ```
//!
//! Each comparator contributes at most one [`ChangeFlag`]. Flags come out in
//! table order, so a payload is deterministic regardless of which field
//! changed first. A payload with no matching comparator is `None`, which
//! tells the consumer to rebind the entry from scratch.
//!
//! List alignment (moves, reorders) is the caller's concern: this differ
//! never searches for an entry at another index.

use crate::block_view::{BlockView, LinkKind, RelationState, TextKind, TitleKind};
use crate::relation_view::ObjectRelationView;
use blocktree_model::Align;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Field-level change detected between two views of the same type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeFlag {
    TextChanged,
    MarkupChanged,
    NumberChanged,
    BackgroundColorChanged,
    IndentChanged,
    ToggleEmptyStateChanged,
    FocusChanged,
    ReadWriteModeChanged,
    SelectionChanged,
    CursorChanged,
    TitleIconChanged,
    LoadingStateChanged,
    SearchHighlightChanged,
    TitleCheckboxChanged,
    LatexChanged,
    RelationNameChanged,
    RelationValueChanged,
    TextColorChanged,
    AlignmentChanged,
}

impl ChangeFlag {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeFlag::TextChanged => "TEXT_CHANGED",
            ChangeFlag::MarkupChanged => "MARKUP_CHANGED",
            ChangeFlag::NumberChanged => "NUMBER_CHANGED",
            ChangeFlag::BackgroundColorChanged => "BACKGROUND_COLOR_CHANGED",
            ChangeFlag::IndentChanged => "INDENT_CHANGED",
            ChangeFlag::ToggleEmptyStateChanged => "TOGGLE_EMPTY_STATE_CHANGED",
            ChangeFlag::FocusChanged => "FOCUS_CHANGED",
            ChangeFlag::ReadWriteModeChanged => "READ_WRITE_MODE_CHANGED",
            ChangeFlag::SelectionChanged => "SELECTION_CHANGED",
            ChangeFlag::CursorChanged => "CURSOR_CHANGED",
            ChangeFlag::TitleIconChanged => "TITLE_ICON_CHANGED",
            ChangeFlag::LoadingStateChanged => "LOADING_STATE_CHANGED",
            ChangeFlag::SearchHighlightChanged => "SEARCH_HIGHLIGHT_CHANGED",
            ChangeFlag::TitleCheckboxChanged => "TITLE_CHECKBOX_CHANGED",
            ChangeFlag::LatexChanged => "LATEX_CHANGED",
            ChangeFlag::RelationNameChanged => "RELATION_NAME_CHANGED",
            ChangeFlag::RelationValueChanged => "RELATION_VALUE_CHANGED",
            ChangeFlag::TextColorChanged => "TEXT_COLOR_CHANGED",
            ChangeFlag::AlignmentChanged => "ALIGNMENT_CHANGED",
        }
    }
}

impl fmt::Display for ChangeFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered, de-duplicated set of change flags
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangePayload(Vec<ChangeFlag>);

impl ChangePayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, flag: ChangeFlag) {
        if !self.0.contains(&flag) {
            self.0.push(flag);
        }
    }

    pub fn contains(&self, flag: ChangeFlag) -> bool {
        self.0.contains(&flag)
    }

    pub fn flags(&self) -> &[ChangeFlag] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<ChangeFlag> for ChangePayload {
    fn from_iter<I: IntoIterator<Item = ChangeFlag>>(iter: I) -> Self {
        let mut payload = ChangePayload::new();
        for flag in iter {
            payload.push(flag);
        }
        payload
    }
}

impl<const N: usize> From<[ChangeFlag; N]> for ChangePayload {
    fn from(flags: [ChangeFlag; N]) -> Self {
        flags.into_iter().collect()
    }
}

type Comparator = fn(&BlockView, &BlockView) -> bool;

/// Registration order is payload order
const COMPARATORS: [(ChangeFlag, Comparator); 19] = [
    (ChangeFlag::TextChanged, |a, b| a.text() != b.text()),
    (ChangeFlag::MarkupChanged, |a, b| a.marks() != b.marks()),
    (ChangeFlag::NumberChanged, |a, b| number_of(a) != number_of(b)),
    (ChangeFlag::BackgroundColorChanged, |a, b| {
        a.background() != b.background()
    }),
    (ChangeFlag::IndentChanged, |a, b| a.indent() != b.indent()),
    (ChangeFlag::ToggleEmptyStateChanged, |a, b| {
        toggle_empty_of(a) != toggle_empty_of(b)
    }),
    (ChangeFlag::FocusChanged, |a, b| a.is_focused() != b.is_focused()),
    (ChangeFlag::ReadWriteModeChanged, |a, b| a.mode() != b.mode()),
    (ChangeFlag::SelectionChanged, |a, b| {
        a.is_selected() != b.is_selected()
    }),
    (ChangeFlag::CursorChanged, |a, b| a.cursor() != b.cursor()),
    (ChangeFlag::TitleIconChanged, |a, b| title_icon_of(a) != title_icon_of(b)),
    (ChangeFlag::LoadingStateChanged, |a, b| loading_of(a) != loading_of(b)),
    (ChangeFlag::SearchHighlightChanged, |a, b| {
        a.search_fields() != b.search_fields()
    }),
    (ChangeFlag::TitleCheckboxChanged, |a, b| {
        title_checked_of(a) != title_checked_of(b)
    }),
    (ChangeFlag::LatexChanged, |a, b| latex_of(a) != latex_of(b)),
    (ChangeFlag::RelationNameChanged, relation_name_changed),
    (ChangeFlag::RelationValueChanged, relation_value_changed),
    (ChangeFlag::TextColorChanged, |a, b| text_color_of(a) != text_color_of(b)),
    (ChangeFlag::AlignmentChanged, |a, b| align_of(a) != align_of(b)),
];

fn number_of(view: &BlockView) -> Option<u32> {
    match view {
        BlockView::Text(v) => match v.kind {
            TextKind::Numbered { number } => Some(number),
            _ => None,
        },
        _ => None,
    }
}

fn toggle_empty_of(view: &BlockView) -> Option<bool> {
    match view {
        BlockView::Text(v) => match v.kind {
            TextKind::Toggle { is_empty, .. } => Some(is_empty),
            _ => None,
        },
        _ => None,
    }
}

/// (emoji, image) for titles that show an icon
fn title_icon_of(view: &BlockView) -> Option<(Option<&str>, Option<&str>)> {
    match view {
        BlockView::Title(v) => match &v.kind {
            TitleKind::Basic { emoji, image } => Some((emoji.as_deref(), image.as_deref())),
            TitleKind::Profile { image } => Some((None, image.as_deref())),
            TitleKind::Todo { .. } | TitleKind::Note => None,
        },
        _ => None,
    }
}

fn title_checked_of(view: &BlockView) -> Option<bool> {
    match view {
        BlockView::Title(v) => match v.kind {
            TitleKind::Todo { is_checked } => Some(is_checked),
            _ => None,
        },
        _ => None,
    }
}

fn loading_of(view: &BlockView) -> Option<bool> {
    match view {
        BlockView::LinkToObject(v) => match v.kind {
            LinkKind::Default { is_loading, .. } => Some(is_loading),
            _ => None,
        },
        _ => None,
    }
}

fn latex_of(view: &BlockView) -> Option<&str> {
    match view {
        BlockView::Latex(v) => Some(&v.latex),
        _ => None,
    }
}

fn text_color_of(view: &BlockView) -> Option<Option<&str>> {
    match view {
        BlockView::Text(v) => Some(v.color.as_deref()),
        _ => None,
    }
}

fn align_of(view: &BlockView) -> Option<Align> {
    match view {
        BlockView::Text(v) => Some(v.align),
        _ => None,
    }
}

/// Relation views carried by relation blocks and the featured row
fn relations_of(view: &BlockView) -> Option<Vec<&ObjectRelationView>> {
    match view {
        BlockView::Relation(v) => match &v.state {
            RelationState::Related { view } => Some(vec![view]),
            _ => None,
        },
        BlockView::FeaturedRelation(v) => Some(v.relations.iter().collect()),
        _ => None,
    }
}

fn relation_name_changed(a: &BlockView, b: &BlockView) -> bool {
    match (relations_of(a), relations_of(b)) {
        (Some(a), Some(b)) => {
            a.len() != b.len() || a.iter().zip(&b).any(|(x, y)| x.name() != y.name())
        }
        _ => false,
    }
}

fn relation_value_changed(a: &BlockView, b: &BlockView) -> bool {
    match (relations_of(a), relations_of(b)) {
        (Some(a), Some(b)) => {
            a.len() != b.len() || a.iter().zip(&b).any(|(x, y)| x.value_differs(y))
        }
        _ => false,
    }
}

/// Stable identity: same block id
pub fn same_identity(old: &BlockView, new: &BlockView) -> bool {
    old.id() == new.id()
}

/// Full field equality
pub fn same_content(old: &BlockView, new: &BlockView) -> bool {
    old == new
}

/// Change flags between two views of the same identity.
///
/// `None` when the view types differ or no comparator matched.
pub fn payload(old: &BlockView, new: &BlockView) -> Option<ChangePayload> {
    if old.view_type() != new.view_type() {
        return None;
    }
    let payload: ChangePayload = COMPARATORS
        .iter()
        .filter(|(_, changed)| changed(old, new))
        .map(|(flag, _)| *flag)
        .collect();
    (!payload.is_empty()).then_some(payload)
}

/// Per-position outcome of a diff pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ViewChange {
    Unchanged {
        index: usize,
    },
    Update {
        index: usize,
        payload: Option<ChangePayload>,
    },
    Replace {
        index: usize,
    },
    Insert {
        index: usize,
    },
    Remove {
        index: usize,
    },
}

impl ViewChange {
    pub fn index(&self) -> usize {
        match self {
            ViewChange::Unchanged { index }
            | ViewChange::Update { index, .. }
            | ViewChange::Replace { index }
            | ViewChange::Insert { index }
            | ViewChange::Remove { index } => *index,
        }
    }

    pub fn is_unchanged(&self) -> bool {
        matches!(self, ViewChange::Unchanged { .. })
    }
}

/// Index-addressed comparison of two view lists
#[derive(Debug, Clone, Copy)]
pub struct ViewDiff<'a> {
    old: &'a [BlockView],
    new: &'a [BlockView],
}

impl<'a> ViewDiff<'a> {
    pub fn new(old: &'a [BlockView], new: &'a [BlockView]) -> Self {
        Self { old, new }
    }

    pub fn old_len(&self) -> usize {
        self.old.len()
    }

    pub fn new_len(&self) -> usize {
        self.new.len()
    }

    pub fn same_identity(&self, old_index: usize, new_index: usize) -> bool {
        match (self.old.get(old_index), self.new.get(new_index)) {
            (Some(a), Some(b)) => same_identity(a, b),
            _ => false,
        }
    }

    pub fn same_content(&self, old_index: usize, new_index: usize) -> bool {
        match (self.old.get(old_index), self.new.get(new_index)) {
            (Some(a), Some(b)) => same_content(a, b),
            _ => false,
        }
    }

    pub fn payload(&self, old_index: usize, new_index: usize) -> Option<ChangePayload> {
        match (self.old.get(old_index), self.new.get(new_index)) {
            (Some(a), Some(b)) => payload(a, b),
            _ => None,
        }
    }

    /// Positional changes for every index of the longer list
    pub fn changes(&self) -> Vec<ViewChange> {
        let max_len = self.old.len().max(self.new.len());
        (0..max_len)
            .map(|index| match (self.old.get(index), self.new.get(index)) {
                (Some(a), Some(b)) if !same_identity(a, b) => ViewChange::Replace { index },
                (Some(a), Some(b)) if same_content(a, b) => ViewChange::Unchanged { index },
                (Some(a), Some(b)) => ViewChange::Update {
                    index,
                    payload: payload(a, b),
                },
                (None, Some(_)) => ViewChange::Insert { index },
                (Some(_), None) => ViewChange::Remove { index },
                (None, None) => unreachable!("index below max length"),
            })
            .collect()
    }
}

/// Positional diff of two view lists
pub fn diff_views(old: &[BlockView], new: &[BlockView]) -> Vec<ViewChange> {
    ViewDiff::new(old, new).changes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block_view::TextView;
    use blocktree_model::Mark;
    use pretty_assertions::assert_eq;

    fn paragraph(id: &str, text: &str) -> BlockView {
        BlockView::Text(TextView::new(id, TextKind::Paragraph, text))
    }

    #[test]
    fn test_payload_is_deduplicated_and_ordered() {
        let payload: ChangePayload = [
            ChangeFlag::MarkupChanged,
            ChangeFlag::TextChanged,
            ChangeFlag::MarkupChanged,
        ]
        .into();
        assert_eq!(
            payload.flags(),
            &[ChangeFlag::MarkupChanged, ChangeFlag::TextChanged]
        );
    }

    #[test]
    fn test_canonical_order_independent_of_edit_order() {
        let old = paragraph("a", "one");
        let BlockView::Text(mut edited) = old.clone() else {
            unreachable!()
        };
        edited.marks = vec![Mark::bold(0, 1)];
        edited.text = "two".into();
        assert_eq!(
            payload(&old, &BlockView::Text(edited)),
            Some([ChangeFlag::TextChanged, ChangeFlag::MarkupChanged].into())
        );
    }

    #[test]
    fn test_positional_changes() {
        let old = vec![paragraph("a", "x"), paragraph("b", "y"), paragraph("c", "z")];
        let new = vec![paragraph("a", "x"), paragraph("b", "changed"), paragraph("d", "z"), paragraph("e", "")];
        assert_eq!(
            diff_views(&old, &new),
            vec![
                ViewChange::Unchanged { index: 0 },
                ViewChange::Update {
                    index: 1,
                    payload: Some([ChangeFlag::TextChanged].into()),
                },
                ViewChange::Replace { index: 2 },
                ViewChange::Insert { index: 3 },
            ]
        );
        assert_eq!(
            diff_views(&new[..1], &old),
            vec![
                ViewChange::Unchanged { index: 0 },
                ViewChange::Insert { index: 1 },
                ViewChange::Insert { index: 2 },
            ]
        );
        assert_eq!(
            diff_views(&old, &[]),
            (0..3).map(|index| ViewChange::Remove { index }).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_flag_names() {
        assert_eq!(ChangeFlag::TextChanged.to_string(), "TEXT_CHANGED");
        assert_eq!(
            serde_json::to_value(ChangeFlag::ToggleEmptyStateChanged).unwrap(),
            "TOGGLE_EMPTY_STATE_CHANGED"
        );
    }
}
