use crate::block::BlockId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TreeError {
    #[error("Block not found: {0}")]
    BlockNotFound(BlockId),

    #[error("Block {0} is not a text block")]
    NotText(BlockId),

    #[error("Cannot remove the root block {0}")]
    RootRemoval(BlockId),

    #[error("Block {child} cannot be moved under its own descendant {target}")]
    CyclicMove { child: BlockId, target: BlockId },
}

pub type TreeResult<T> = Result<T, TreeError>;
