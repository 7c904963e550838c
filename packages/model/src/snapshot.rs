use crate::block::{Block, BlockId};
use crate::details::{ObjectViewDetails, Struct};
use crate::restrictions::ObjectRestriction;
use crate::tree::BlockTree;
use serde::{Deserialize, Serialize};

/// Full document state delivered when a document is opened
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSnapshot {
    pub root: BlockId,
    pub blocks: Vec<Block>,
    #[serde(default)]
    pub details: ObjectViewDetails,
    #[serde(default)]
    pub restrictions: Vec<ObjectRestriction>,
    /// Relation definitions to merge into the shared store
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relations: Vec<Struct>,
    /// Object type definitions to merge into the shared store
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub object_types: Vec<Struct>,
}

impl DocumentSnapshot {
    pub fn new(root: impl Into<BlockId>, blocks: Vec<Block>) -> Self {
        Self {
            root: root.into(),
            blocks,
            details: ObjectViewDetails::default(),
            restrictions: Vec::new(),
            relations: Vec::new(),
            object_types: Vec::new(),
        }
    }

    pub fn with_details(mut self, details: ObjectViewDetails) -> Self {
        self.details = details;
        self
    }

    pub fn with_restrictions(mut self, restrictions: Vec<ObjectRestriction>) -> Self {
        self.restrictions = restrictions;
        self
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn tree(&self) -> BlockTree {
        BlockTree::new(self.root.clone(), self.blocks.iter().cloned())
    }
}
