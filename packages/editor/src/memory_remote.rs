//! # In-memory remote
//!
//! A [`BlockRemote`] that keeps documents in process. Commands run against
//! a scratch copy of the stored document; the payload is the delta between
//! the stored and the scratch state, so a failing command changes nothing.
//!
//! Used by the CLI `replay` command and by tests.

use crate::commands::Command;
use crate::delta::delta;
use crate::document::Document;
use crate::history::History;
use crate::mutations::{self, BlockIds};
use crate::remote::{BlockRemote, RemoteError, RemoteResult};
use async_trait::async_trait;
use blocktree_model::{BlockId, DocumentSnapshot, Payload, Struct};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use tokio::sync::broadcast;
use tracing::{debug, warn};

const EVENT_CAPACITY: usize = 256;

#[derive(Debug)]
struct Page {
    document: Document,
    history: History,
    relations: Vec<Struct>,
    object_types: Vec<Struct>,
}

#[derive(Debug, Default)]
struct Inner {
    pages: HashMap<BlockId, Page>,
    incompatible: HashSet<BlockId>,
    ids: BlockIds,
    fail_next: Option<RemoteError>,
}

#[derive(Debug)]
pub struct MemoryRemote {
    inner: Mutex<Inner>,
    events: broadcast::Sender<Payload>,
    history_depth: usize,
}

impl Default for MemoryRemote {
    fn default() -> Self {
        Self::new(100)
    }
}

impl MemoryRemote {
    pub fn new(history_depth: usize) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Mutex::new(Inner::default()),
            events,
            history_depth,
        }
    }

    /// Store a document, replacing any previous one with the same root
    pub fn insert(&self, snapshot: DocumentSnapshot) {
        let page = Page {
            document: Document::from_snapshot(&snapshot),
            history: History::with_max_levels(self.history_depth),
            relations: snapshot.relations,
            object_types: snapshot.object_types,
        };
        self.inner.lock().pages.insert(snapshot.root, page);
    }

    /// Make opening `id` fail as if it came from a newer format
    pub fn mark_incompatible(&self, id: impl Into<BlockId>) {
        self.inner.lock().incompatible.insert(id.into());
    }

    /// Make the next command fail with `err`
    pub fn fail_next(&self, err: RemoteError) {
        self.inner.lock().fail_next = Some(err);
    }

    /// Current stored state of a document
    pub fn document(&self, id: &str) -> Option<Document> {
        self.inner.lock().pages.get(id).map(|page| page.document.clone())
    }

    /// Apply a change made elsewhere and announce it on the event stream.
    ///
    /// The document's undo history is cleared, since restoring an earlier
    /// snapshot would silently revert the external change.
    pub fn push_external(&self, payload: Payload) -> RemoteResult<()> {
        {
            let mut inner = self.inner.lock();
            let page = inner
                .pages
                .get_mut(&payload.context)
                .ok_or_else(|| RemoteError::ObjectNotFound(payload.context.clone()))?;
            page.document
                .apply(&payload)
                .map_err(|err| RemoteError::Rejected(err.to_string()))?;
            page.history.clear();
        }
        // No subscribers is fine
        let _ = self.events.send(payload);
        Ok(())
    }

    /// Payloads pushed from outside, for every document
    pub fn subscribe(&self) -> broadcast::Receiver<Payload> {
        self.events.subscribe()
    }
}

impl Inner {
    fn page(&mut self, context: &str) -> RemoteResult<&mut Page> {
        self.pages
            .get_mut(context)
            .ok_or_else(|| RemoteError::ObjectNotFound(context.to_string()))
    }
}

#[async_trait]
impl BlockRemote for MemoryRemote {
    async fn open_page(&self, context: &str) -> RemoteResult<DocumentSnapshot> {
        let mut inner = self.inner.lock();
        if inner.incompatible.contains(context) {
            return Err(RemoteError::BackwardCompatibilityNotSupported);
        }
        let page = inner.page(context)?;
        let mut snapshot = page.document.snapshot();
        snapshot.relations = page.relations.clone();
        snapshot.object_types = page.object_types.clone();
        debug!(context, blocks = snapshot.blocks.len(), "Page opened");
        Ok(snapshot)
    }

    async fn close_page(&self, context: &str) -> RemoteResult<()> {
        self.inner.lock().page(context)?;
        debug!(context, "Page closed");
        Ok(())
    }

    async fn execute(&self, context: &str, command: Command) -> RemoteResult<Payload> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        if let Some(err) = inner.fail_next.take() {
            warn!(context, command = command.name(), %err, "Injected failure");
            return Err(err);
        }

        let page = inner
            .pages
            .get_mut(context)
            .ok_or_else(|| RemoteError::ObjectNotFound(context.to_string()))?;
        let mut next = page.document.clone();
        mutations::apply(&mut next, &command, &mut inner.ids)?;

        let events = delta(&page.document, &next);
        if events.is_empty() {
            return Ok(Payload::empty(context));
        }
        next.version = page.document.version + 1;
        let previous = std::mem::replace(&mut page.document, next);
        page.history.record(previous);

        debug!(context, command = command.name(), events = events.len(), "Command applied");
        Ok(Payload::new(context, events))
    }

    async fn undo(&self, context: &str) -> RemoteResult<Payload> {
        let mut inner = self.inner.lock();
        let page = inner.page(context)?;
        let mut restored = page
            .history
            .undo(&page.document)
            .ok_or(RemoteError::UndoRedoExhausted)?;
        restored.version = page.document.version + 1;
        let events = delta(&page.document, &restored);
        page.document = restored;
        Ok(Payload::new(context, events))
    }

    async fn redo(&self, context: &str) -> RemoteResult<Payload> {
        let mut inner = self.inner.lock();
        let page = inner.page(context)?;
        let mut restored = page
            .history
            .redo(&page.document)
            .ok_or(RemoteError::UndoRedoExhausted)?;
        restored.version = page.document.version + 1;
        let events = delta(&page.document, &restored);
        page.document = restored;
        Ok(Payload::new(context, events))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blocktree_model::{Block, Event};

    fn remote() -> MemoryRemote {
        let remote = MemoryRemote::default();
        remote.insert(DocumentSnapshot::new(
            "page",
            vec![
                Block::smart("page").with_children(["a"]),
                Block::paragraph("a", "alpha"),
            ],
        ));
        remote
    }

    fn edit(text: &str) -> Command {
        Command::UpdateText {
            target: "a".into(),
            text: text.into(),
            marks: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_execute_returns_delta_and_records_history() {
        let remote = remote();
        let payload = remote.execute("page", edit("beta")).await.unwrap();
        assert!(matches!(
            payload.events.as_slice(),
            [Event::UpdateText { text: Some(text), .. }] if text == "beta"
        ));

        let undo = remote.undo("page").await.unwrap();
        assert_eq!(undo.events.len(), 1);
        let doc = remote.document("page").unwrap();
        assert_eq!(doc.tree.get("a").unwrap().as_text().unwrap().text, "alpha");

        assert_eq!(remote.undo("page").await, Err(RemoteError::UndoRedoExhausted));
        remote.redo("page").await.unwrap();
        assert_eq!(remote.redo("page").await, Err(RemoteError::UndoRedoExhausted));
    }

    #[tokio::test]
    async fn test_failed_command_leaves_no_trace() {
        let remote = remote();
        let result = remote
            .execute(
                "page",
                Command::UpdateCheckbox {
                    target: "missing".into(),
                    is_checked: true,
                },
            )
            .await;
        assert_eq!(result, Err(RemoteError::ObjectNotFound("missing".into())));
        assert_eq!(remote.undo("page").await, Err(RemoteError::UndoRedoExhausted));
    }

    #[tokio::test]
    async fn test_incompatible_page_refuses_to_open() {
        let remote = remote();
        remote.mark_incompatible("page");
        assert_eq!(
            remote.open_page("page").await,
            Err(RemoteError::BackwardCompatibilityNotSupported)
        );
        assert_eq!(
            remote.open_page("nope").await,
            Err(RemoteError::ObjectNotFound("nope".into()))
        );
    }

    #[tokio::test]
    async fn test_external_changes_are_broadcast() {
        let remote = remote();
        let mut events = remote.subscribe();
        let payload = Payload::new(
            "page",
            vec![Event::UpdateStructure {
                id: "page".into(),
                children: vec![],
            }],
        );
        remote.push_external(payload.clone()).unwrap();
        assert_eq!(events.recv().await.unwrap(), payload);
        assert!(remote.document("page").unwrap().tree.children_of("page").is_empty());
    }

    #[tokio::test]
    async fn test_external_change_survives_undo() {
        let remote = remote();
        remote.execute("page", edit("beta")).await.unwrap();
        remote
            .push_external(Payload::new(
                "page",
                vec![Event::UpdateStructure {
                    id: "page".into(),
                    children: vec![],
                }],
            ))
            .unwrap();

        assert_eq!(remote.undo("page").await, Err(RemoteError::UndoRedoExhausted));
        assert!(remote.document("page").unwrap().tree.children_of("page").is_empty());
    }
}
