//! Error types for the editor

use crate::coordinator::DomainError;
use blocktree_model::TreeError;
use blocktree_render::RenderError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Tree error: {0}")]
    Tree(#[from] TreeError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Payload for {payload} delivered to document {document}")]
    ContextMismatch { document: String, payload: String },

    #[error("Editor session is closed")]
    SessionClosed,
}

pub type EditorResult<T> = Result<T, EditorError>;
