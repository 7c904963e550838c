//! # Command Coordinator
//!
//! Sends commands to the [`BlockRemote`] and translates its failures into
//! typed domain results.
//!
//! ```text
//! Command ──► Coordinator::dispatch ──► BlockRemote::execute
//!                                            │
//!                    Payload ◄───────────────┤
//!     DomainError::BackwardCompatibility ◄───┤  (named failure)
//!             HistoryResult::Exhausted ◄─────┘  (undo/redo only)
//! ```
//!
//! Merging the returned payload into the document is the session's job, so
//! the coordinator stays free of per-document state.

use crate::commands::Command;
use crate::remote::{BlockRemote, RemoteError};
use blocktree_model::{BlockId, DocumentSnapshot, Payload};
use std::sync::Arc;
use thiserror::Error;
use tracing::{instrument, warn};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("This object was created by a newer version and cannot be opened")]
    BackwardCompatibility,

    #[error("Object is invalid or missing: {0}")]
    ObjectInvalid(BlockId),

    #[error("Remote failure: {0}")]
    Remote(RemoteError),

    #[error("Session closed")]
    SessionClosed,
}

impl From<RemoteError> for DomainError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::BackwardCompatibilityNotSupported => DomainError::BackwardCompatibility,
            RemoteError::ObjectNotFound(id) => DomainError::ObjectInvalid(id),
            other => DomainError::Remote(other),
        }
    }
}

pub type DomainResult<T> = Result<T, DomainError>;

/// Outcome of undo and redo. Running out of history is not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryResult {
    Success(Payload),
    Exhausted,
}

impl HistoryResult {
    pub fn is_exhausted(&self) -> bool {
        matches!(self, HistoryResult::Exhausted)
    }
}

#[derive(Clone)]
pub struct Coordinator {
    remote: Arc<dyn BlockRemote>,
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator").finish_non_exhaustive()
    }
}

impl Coordinator {
    pub fn new(remote: Arc<dyn BlockRemote>) -> Self {
        Self { remote }
    }

    #[instrument(skip(self))]
    pub async fn open(&self, context: &str) -> DomainResult<DocumentSnapshot> {
        self.remote.open_page(context).await.map_err(|err| {
            warn!(%err, "Failed to open document");
            DomainError::from(err)
        })
    }

    #[instrument(skip(self))]
    pub async fn close(&self, context: &str) -> DomainResult<()> {
        Ok(self.remote.close_page(context).await?)
    }

    #[instrument(skip(self, command), fields(command = command.name()))]
    pub async fn dispatch(&self, context: &str, command: Command) -> DomainResult<Payload> {
        self.remote.execute(context, command).await.map_err(|err| {
            warn!(%err, "Command failed");
            DomainError::from(err)
        })
    }

    #[instrument(skip(self))]
    pub async fn undo(&self, context: &str) -> DomainResult<HistoryResult> {
        history(self.remote.undo(context).await)
    }

    #[instrument(skip(self))]
    pub async fn redo(&self, context: &str) -> DomainResult<HistoryResult> {
        history(self.remote.redo(context).await)
    }
}

fn history(result: Result<Payload, RemoteError>) -> DomainResult<HistoryResult> {
    match result {
        Ok(payload) => Ok(HistoryResult::Success(payload)),
        Err(RemoteError::UndoRedoExhausted) => Ok(HistoryResult::Exhausted),
        Err(err) => {
            warn!(%err, "History step failed");
            Err(err.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_errors_map_to_named_domain_errors() {
        assert_eq!(
            DomainError::from(RemoteError::BackwardCompatibilityNotSupported),
            DomainError::BackwardCompatibility
        );
        assert_eq!(
            DomainError::from(RemoteError::ObjectNotFound("o1".into())),
            DomainError::ObjectInvalid("o1".into())
        );
        assert_eq!(
            DomainError::from(RemoteError::Transport("reset".into())),
            DomainError::Remote(RemoteError::Transport("reset".into()))
        );
    }

    #[test]
    fn test_exhaustion_is_a_result_not_an_error() {
        assert_eq!(
            history(Err(RemoteError::UndoRedoExhausted)),
            Ok(HistoryResult::Exhausted)
        );
        let payload = Payload::empty("doc");
        assert_eq!(
            history(Ok(payload.clone())),
            Ok(HistoryResult::Success(payload))
        );
        assert!(history(Err(RemoteError::Rejected("no".into()))).is_err());
    }
}
