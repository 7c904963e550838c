use crate::block::{Align, Block, BlockId, DividerStyle, Fields, File, TextStyle};
use crate::details::Struct;
use crate::mark::Mark;
use crate::restrictions::ObjectRestriction;
use serde::{Deserialize, Serialize};

/// Tree delta returned by a command or pushed by the remote event stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    /// Document the events belong to
    pub context: BlockId,
    pub events: Vec<Event>,
}

impl Payload {
    pub fn new(context: impl Into<BlockId>, events: Vec<Event>) -> Self {
        Self {
            context: context.into(),
            events,
        }
    }

    pub fn empty(context: impl Into<BlockId>) -> Self {
        Self::new(context, Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Event {
    AddBlock {
        blocks: Vec<Block>,
    },
    DeleteBlock {
        targets: Vec<BlockId>,
    },
    /// Replaces a block's children list
    UpdateStructure {
        id: BlockId,
        children: Vec<BlockId>,
    },
    /// Granular text change, absent fields are left untouched
    UpdateText {
        id: BlockId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        marks: Option<Vec<Mark>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        style: Option<TextStyle>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        checked: Option<bool>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        color: Option<String>,
    },
    UpdateFields {
        id: BlockId,
        fields: Fields,
    },
    UpdateBackgroundColor {
        id: BlockId,
        #[serde(default)]
        color: Option<String>,
    },
    UpdateAlignment {
        id: BlockId,
        align: Align,
    },
    UpdateLatex {
        id: BlockId,
        latex: String,
    },
    UpdateDivider {
        id: BlockId,
        style: DividerStyle,
    },
    UpdateRelationKey {
        id: BlockId,
        key: String,
    },
    UpdateFile {
        id: BlockId,
        file: File,
    },
    SetDetails {
        target: BlockId,
        details: Struct,
    },
    AmendDetails {
        target: BlockId,
        details: Struct,
    },
    UnsetDetails {
        target: BlockId,
        keys: Vec<String>,
    },
    SetRestrictions {
        restrictions: Vec<ObjectRestriction>,
    },
}

impl Event {
    /// Events applied to the block tree rather than details/restrictions
    pub fn is_structural(&self) -> bool {
        !matches!(
            self,
            Event::SetDetails { .. }
                | Event::AmendDetails { .. }
                | Event::UnsetDetails { .. }
                | Event::SetRestrictions { .. }
        )
    }
}
