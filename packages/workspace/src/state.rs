use blocktree_editor::{
    Coordinator, EditorError, EditorSession, EditorSettings, SessionHandle, SharedStores,
};
use blocktree_model::{BlockId, Payload};
use futures::future::join_all;
use parking_lot::RwLock;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

#[derive(Error, Debug)]
pub enum WorkspaceError {
    #[error("Editor error: {0}")]
    Editor(#[from] EditorError),

    #[error("Document is not open: {0}")]
    NotOpen(BlockId),

    #[error("Workspace is shut down")]
    ShutDown,
}

pub type WorkspaceResult<T> = Result<T, WorkspaceError>;

/// Registry of open document sessions
///
/// Every session is opened against the same remote, the same settings and
/// the same shared relation/object-type stores. All sessions run under a
/// child of the workspace cancellation token, so `shutdown` stops them all.
#[derive(Debug)]
pub struct Workspace {
    coordinator: Coordinator,
    settings: EditorSettings,
    shared: SharedStores,
    sessions: RwLock<HashMap<BlockId, SessionHandle>>,
    cancel: CancellationToken,
}

impl Workspace {
    pub fn new(coordinator: Coordinator) -> Self {
        Self {
            coordinator,
            settings: EditorSettings::default(),
            shared: SharedStores::default(),
            sessions: RwLock::new(HashMap::new()),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_settings(mut self, settings: EditorSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_shared_stores(mut self, shared: SharedStores) -> Self {
        self.shared = shared;
        self
    }

    pub fn shared(&self) -> &SharedStores {
        &self.shared
    }

    pub fn is_shut_down(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Live session for a document, if one is open
    pub fn session(&self, id: &str) -> Option<SessionHandle> {
        self.sessions
            .read()
            .get(id)
            .filter(|handle| !handle.is_closed())
            .cloned()
    }

    /// Ids of open documents, sorted
    pub fn open_documents(&self) -> Vec<BlockId> {
        let mut ids: Vec<BlockId> = self
            .sessions
            .read()
            .iter()
            .filter(|(_, handle)| !handle.is_closed())
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Open a document, or return its running session
    #[instrument(skip(self))]
    pub async fn open(&self, id: &str) -> WorkspaceResult<SessionHandle> {
        if self.is_shut_down() {
            return Err(WorkspaceError::ShutDown);
        }
        if let Some(handle) = self.session(id) {
            return Ok(handle);
        }

        let handle = EditorSession::open(
            self.coordinator.clone(),
            id,
            &self.settings,
            self.shared.clone(),
            &self.cancel,
        )
        .await?;

        // Another caller may have opened the same document while we awaited
        let existing = {
            let mut sessions = self.sessions.write();
            match sessions.get(id) {
                Some(existing) if !existing.is_closed() => Some(existing.clone()),
                _ => {
                    sessions.insert(id.to_string(), handle.clone());
                    None
                }
            }
        };

        if let Some(existing) = existing {
            debug!(document = id, "Document opened concurrently, keeping first session");
            handle.close().await?;
            return Ok(existing);
        }

        info!(document = id, "Document opened");
        Ok(handle)
    }

    /// Close one document, flushing its pending edits
    #[instrument(skip(self))]
    pub async fn close(&self, id: &str) -> WorkspaceResult<()> {
        let handle = self
            .sessions
            .write()
            .remove(id)
            .ok_or_else(|| WorkspaceError::NotOpen(id.to_string()))?;
        handle.close().await?;
        info!(document = id, "Document closed");
        Ok(())
    }

    /// Close every open document. The workspace stays usable.
    pub async fn close_all(&self) {
        let handles: Vec<SessionHandle> = self
            .sessions
            .write()
            .drain()
            .map(|(_, handle)| handle)
            .collect();

        let count = handles.len();
        let results = join_all(handles.iter().map(|handle| handle.close())).await;
        for (handle, result) in handles.iter().zip(results) {
            if let Err(err) = result {
                warn!(document = handle.context(), error = %err, "Failed to close document");
            }
        }
        info!(count, "Closed all documents");
    }

    /// Close every document and refuse further opens
    pub async fn shutdown(&self) {
        self.close_all().await;
        self.cancel.cancel();
    }

    /// Deliver one payload to the session that owns its context.
    ///
    /// Returns `Ok(false)` when no live session owns it; such payloads are
    /// dropped.
    pub async fn route(&self, payload: Payload) -> WorkspaceResult<bool> {
        let context = payload.context.clone();
        let Some(handle) = self.sessions.read().get(&context).cloned() else {
            debug!(
                document = %context,
                events = payload.events.len(),
                "Dropping payload for unknown document"
            );
            return Ok(false);
        };

        match handle.push_remote(payload).await {
            Ok(()) => Ok(true),
            Err(EditorError::SessionClosed) => {
                self.sessions.write().remove(&context);
                debug!(document = %context, "Dropping payload for closed document");
                Ok(false)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Route an inbound payload stream until it ends or the workspace shuts
    /// down. Returns how many payloads reached a session.
    pub async fn run_router<S>(&self, stream: S) -> usize
    where
        S: Stream<Item = Payload>,
    {
        tokio::pin!(stream);
        let mut routed = 0;

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                next = stream.next() => match next {
                    Some(payload) => match self.route(payload).await {
                        Ok(true) => routed += 1,
                        Ok(false) => {}
                        Err(err) => warn!(error = %err, "Failed to route payload"),
                    },
                    None => break,
                },
            }
        }

        debug!(routed, "Router stopped");
        routed
    }
}

/// Adapt a broadcast receiver into a payload stream. Lagged receivers skip
/// the missed payloads with a warning.
pub fn payload_stream(receiver: broadcast::Receiver<Payload>) -> impl Stream<Item = Payload> {
    BroadcastStream::new(receiver).filter_map(|item| match item {
        Ok(payload) => Some(payload),
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            warn!(skipped, "Router lagged behind the remote event stream");
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use blocktree_editor::MemoryRemote;
    use blocktree_model::{Block, DocumentSnapshot, Event, LayoutKind, TextStyle};
    use std::sync::Arc;

    fn snapshot(root: &str) -> DocumentSnapshot {
        DocumentSnapshot::new(
            root,
            vec![
                Block::smart(root).with_children(["header", "p"]),
                Block::layout("header", LayoutKind::Header).with_children(["title"]),
                Block::text("title", TextStyle::Title, "Doc"),
                Block::paragraph("p", "text"),
            ],
        )
    }

    fn workspace(roots: &[&str]) -> (Arc<MemoryRemote>, Workspace) {
        let remote = Arc::new(MemoryRemote::default());
        for root in roots {
            remote.insert(snapshot(root));
        }
        let workspace = Workspace::new(Coordinator::new(remote.clone()));
        (remote, workspace)
    }

    fn retitle(context: &str) -> Payload {
        Payload::new(
            context,
            vec![Event::UpdateText {
                id: "title".into(),
                text: Some("Renamed".into()),
                marks: None,
                style: None,
                checked: None,
                color: None,
            }],
        )
    }

    #[tokio::test]
    async fn test_open_reuses_running_session() {
        let (_, workspace) = workspace(&["one"]);
        let first = workspace.open("one").await.unwrap();
        let second = workspace.open("one").await.unwrap();

        assert_eq!(first.context(), second.context());
        assert_eq!(workspace.open_documents(), vec!["one".to_string()]);
    }

    #[tokio::test]
    async fn test_open_missing_document_fails() {
        let (_, workspace) = workspace(&[]);
        let result = workspace.open("nowhere").await;
        assert!(matches!(result, Err(WorkspaceError::Editor(_))));
        assert!(workspace.open_documents().is_empty());
    }

    #[tokio::test]
    async fn test_route_to_unknown_document_is_dropped() {
        let (_, workspace) = workspace(&["one"]);
        workspace.open("one").await.unwrap();

        assert!(!workspace.route(retitle("other")).await.unwrap());
        assert!(workspace.route(retitle("one")).await.unwrap());
    }

    #[tokio::test]
    async fn test_close_removes_session() {
        let (_, workspace) = workspace(&["one"]);
        let handle = workspace.open("one").await.unwrap();

        workspace.close("one").await.unwrap();
        assert!(handle.is_closed());
        assert!(workspace.session("one").is_none());
        assert!(matches!(
            workspace.close("one").await,
            Err(WorkspaceError::NotOpen(id)) if id == "one"
        ));
    }

    #[tokio::test]
    async fn test_route_prunes_sessions_closed_elsewhere() {
        let (_, workspace) = workspace(&["one"]);
        let handle = workspace.open("one").await.unwrap();
        handle.close().await.unwrap();

        assert!(!workspace.route(retitle("one")).await.unwrap());
        assert!(workspace.sessions.read().is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_closes_everything() {
        let (_, workspace) = workspace(&["one", "two"]);
        let one = workspace.open("one").await.unwrap();
        let two = workspace.open("two").await.unwrap();

        workspace.shutdown().await;

        assert!(one.is_closed());
        assert!(two.is_closed());
        assert!(workspace.is_shut_down());
        assert!(matches!(
            workspace.open("one").await,
            Err(WorkspaceError::ShutDown)
        ));
    }

    #[tokio::test]
    async fn test_router_stops_when_stream_ends() {
        let (_, workspace) = workspace(&["one"]);
        workspace.open("one").await.unwrap();

        let stream = tokio_stream::iter(vec![retitle("one"), retitle("two")]);
        assert_eq!(workspace.run_router(stream).await, 1);
    }
}
