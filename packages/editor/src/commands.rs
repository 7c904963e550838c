//! # Commands
//!
//! Typed editing intents sent to the remote. Each successful command comes
//! back as a [`Payload`](blocktree_model::Payload) describing the tree delta.
//!
//! ## Semantics
//!
//! ### Move
//! - Relocates every target next to (or inside) the drop target
//! - Fails when the drop target is one of the moved blocks or below one
//!
//! ### Merge
//! - Appends `next`'s text to `previous`, shifting its marks
//! - `next`'s children are adopted by `previous`, then `next` is removed
//!
//! ### Split
//! - Cuts the target's text at `range`, dropping the selected characters
//! - The tail becomes a new sibling placed right after the target
//!
//! ### UpdateText
//! - Atomic replacement of text and marks, last write wins

use blocktree_model::{
    Align, BlockId, Content, DividerStyle, Fields, Mark, ObjectRestriction, TextStyle,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::ops::Range;

/// Where a new or moved block lands relative to the target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Position {
    Top,
    Bottom,
    /// Appended as the target's last child
    Inner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CoverKind {
    Color,
    Gradient,
    Image,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Command {
    UpdateText {
        target: BlockId,
        text: String,
        #[serde(default)]
        marks: Vec<Mark>,
    },
    UpdateStyle {
        targets: Vec<BlockId>,
        style: TextStyle,
    },
    /// An empty color resets to the default
    UpdateTextColor {
        targets: Vec<BlockId>,
        color: String,
    },
    UpdateBackgroundColor {
        targets: Vec<BlockId>,
        #[serde(default)]
        color: Option<String>,
    },
    UpdateAlignment {
        targets: Vec<BlockId>,
        align: Align,
    },
    UpdateCheckbox {
        target: BlockId,
        is_checked: bool,
    },
    Create {
        target: BlockId,
        position: Position,
        content: Content,
    },
    /// Swaps the target for a fresh block with the given content
    Replace {
        target: BlockId,
        content: Content,
    },
    /// Deep-copies the targets, placing the copies after `target`
    Duplicate {
        target: BlockId,
        blocks: Vec<BlockId>,
    },
    Move {
        targets: Vec<BlockId>,
        target: BlockId,
        position: Position,
    },
    /// Removes the targets with their descendants
    Unlink {
        targets: Vec<BlockId>,
    },
    Merge {
        previous: BlockId,
        next: BlockId,
    },
    Split {
        target: BlockId,
        range: Range<usize>,
        #[serde(default)]
        style: Option<TextStyle>,
    },
    /// Converts text blocks to another style, normalizing style-bound state
    TurnInto {
        targets: Vec<BlockId>,
        style: TextStyle,
    },
    SetFields {
        target: BlockId,
        fields: Fields,
    },
    SetRelationKey {
        target: BlockId,
        key: String,
    },
    UpdateDivider {
        targets: Vec<BlockId>,
        style: DividerStyle,
    },
    UpdateLatex {
        target: BlockId,
        latex: String,
    },
    SetDocumentEmojiIcon {
        emoji: String,
    },
    SetDocumentImageIcon {
        hash: String,
    },
    SetDocumentCoverColor {
        color: String,
    },
    SetDocumentCoverGradient {
        gradient: String,
    },
    SetDocumentCoverImage {
        hash: String,
    },
    RemoveDocumentCover,
    /// Marks a file block uploaded and points it at the stored file object
    UploadBlock {
        target: BlockId,
        file_object: BlockId,
        #[serde(default)]
        name: Option<String>,
    },
    /// Replaces the visible properties of a data view block
    SetDataViewProperties {
        target: BlockId,
        properties: Vec<String>,
    },
    UpdateDetail {
        key: String,
        value: Value,
    },
}

impl Command {
    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Command::UpdateText { .. } => "updateText",
            Command::UpdateStyle { .. } => "updateStyle",
            Command::UpdateTextColor { .. } => "updateTextColor",
            Command::UpdateBackgroundColor { .. } => "updateBackgroundColor",
            Command::UpdateAlignment { .. } => "updateAlignment",
            Command::UpdateCheckbox { .. } => "updateCheckbox",
            Command::Create { .. } => "create",
            Command::Replace { .. } => "replace",
            Command::Duplicate { .. } => "duplicate",
            Command::Move { .. } => "move",
            Command::Unlink { .. } => "unlink",
            Command::Merge { .. } => "merge",
            Command::Split { .. } => "split",
            Command::TurnInto { .. } => "turnInto",
            Command::SetFields { .. } => "setFields",
            Command::SetRelationKey { .. } => "setRelationKey",
            Command::UpdateDivider { .. } => "updateDivider",
            Command::UpdateLatex { .. } => "updateLatex",
            Command::SetDocumentEmojiIcon { .. } => "setDocumentEmojiIcon",
            Command::SetDocumentImageIcon { .. } => "setDocumentImageIcon",
            Command::SetDocumentCoverColor { .. } => "setDocumentCoverColor",
            Command::SetDocumentCoverGradient { .. } => "setDocumentCoverGradient",
            Command::SetDocumentCoverImage { .. } => "setDocumentCoverImage",
            Command::RemoveDocumentCover => "removeDocumentCover",
            Command::UploadBlock { .. } => "uploadBlock",
            Command::SetDataViewProperties { .. } => "setDataViewProperties",
            Command::UpdateDetail { .. } => "updateDetail",
        }
    }

    /// Restriction that forbids this command
    pub fn restricted_by(&self) -> ObjectRestriction {
        match self {
            Command::SetDocumentEmojiIcon { .. }
            | Command::SetDocumentImageIcon { .. }
            | Command::SetDocumentCoverColor { .. }
            | Command::SetDocumentCoverGradient { .. }
            | Command::SetDocumentCoverImage { .. }
            | Command::RemoveDocumentCover
            | Command::UpdateDetail { .. } => ObjectRestriction::Details,
            _ => ObjectRestriction::Blocks,
        }
    }

    /// Structural commands reshape the tree rather than edit one block
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Command::Create { .. }
                | Command::Replace { .. }
                | Command::Duplicate { .. }
                | Command::Move { .. }
                | Command::Unlink { .. }
                | Command::Merge { .. }
                | Command::Split { .. }
                | Command::TurnInto { .. }
        )
    }
}
