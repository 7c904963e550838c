use blocktree_model::BlockId;
use thiserror::Error;

/// Contract violations that abort a render pass.
///
/// Data inconsistencies (dangling children, missing definitions) are not
/// errors; they surface as [`RenderWarning`](crate::RenderWarning)s.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("Root block not found: {0}")]
    RootNotFound(BlockId),

    #[error("Root block {id} must be a smart block, found {content}")]
    RootNotSmart { id: BlockId, content: &'static str },

    #[error("Block {id} has {content} content, which cannot appear under {parent}")]
    UnexpectedContent {
        id: BlockId,
        content: &'static str,
        parent: BlockId,
    },
}

pub type RenderResult<T> = Result<T, RenderError>;
