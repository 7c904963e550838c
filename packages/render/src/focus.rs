use blocktree_model::BlockId;
use serde::{Deserialize, Serialize};
use std::ops::Range;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "camelCase")]
pub enum FocusTarget {
    #[default]
    None,
    Block(BlockId),
}

/// Requested caret placement inside the focused block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "position", rename_all = "camelCase")]
pub enum Cursor {
    Start,
    End,
    Position(usize),
}

impl Cursor {
    /// Character offset for a text of `len` characters
    pub fn resolve(self, len: usize) -> usize {
        match self {
            Cursor::Start => 0,
            Cursor::End => len,
            Cursor::Position(pos) => pos.min(len),
        }
    }
}

/// Which block holds keyboard focus. `Focus::empty()` means nothing does.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Focus {
    pub target: FocusTarget,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<Cursor>,
}

impl Focus {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn id(id: impl Into<BlockId>) -> Self {
        Self {
            target: FocusTarget::Block(id.into()),
            cursor: None,
        }
    }

    pub fn with_cursor(mut self, cursor: Cursor) -> Self {
        self.cursor = Some(cursor);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.target == FocusTarget::None
    }

    pub fn target_id(&self) -> Option<&str> {
        match &self.target {
            FocusTarget::Block(id) => Some(id),
            FocusTarget::None => None,
        }
    }

    pub fn is_target(&self, id: &str) -> bool {
        self.target_id() == Some(id)
    }
}

/// Text selection inside one block, in characters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSelection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<BlockId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<Range<usize>>,
}

impl TextSelection {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(id: impl Into<BlockId>, range: Range<usize>) -> Self {
        Self {
            id: Some(id.into()),
            range: Some(range),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_none()
    }

    /// True when at least one character is selected
    pub fn has_range(&self) -> bool {
        self.range.as_ref().map_or(false, |r| r.start < r.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_focus_is_distinguished() {
        let empty = Focus::empty();
        assert!(empty.is_empty());
        assert_eq!(empty.target_id(), None);

        let focused = Focus::id("title").with_cursor(Cursor::Start);
        assert!(!focused.is_empty());
        assert!(focused.is_target("title"));
        assert_ne!(focused, empty);
    }

    #[test]
    fn test_cursor_resolve_clamps() {
        assert_eq!(Cursor::Start.resolve(5), 0);
        assert_eq!(Cursor::End.resolve(5), 5);
        assert_eq!(Cursor::Position(9).resolve(5), 5);
    }
}
