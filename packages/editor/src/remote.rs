//! Boundary with the block middleware

use crate::commands::Command;
use async_trait::async_trait;
use blocktree_model::{BlockId, DocumentSnapshot, Payload, TreeError};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RemoteError {
    #[error("No more history in that direction")]
    UndoRedoExhausted,

    #[error("Document was written by a newer version and cannot be opened")]
    BackwardCompatibilityNotSupported,

    #[error("Object not found: {0}")]
    ObjectNotFound(BlockId),

    #[error("Command rejected: {0}")]
    Rejected(String),

    #[error("Transport failure: {0}")]
    Transport(String),
}

impl From<TreeError> for RemoteError {
    fn from(err: TreeError) -> Self {
        RemoteError::Rejected(err.to_string())
    }
}

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Repository the editor sends commands to.
///
/// Every call is scoped to one document through `context`.
#[async_trait]
pub trait BlockRemote: Send + Sync {
    async fn open_page(&self, context: &str) -> RemoteResult<DocumentSnapshot>;

    async fn close_page(&self, context: &str) -> RemoteResult<()>;

    async fn execute(&self, context: &str, command: Command) -> RemoteResult<Payload>;

    async fn undo(&self, context: &str) -> RemoteResult<Payload>;

    async fn redo(&self, context: &str) -> RemoteResult<Payload>;
}
