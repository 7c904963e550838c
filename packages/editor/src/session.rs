//! # Editor Session
//!
//! One actor task per open document. Every mutation of the document, the
//! stores and the rendered views goes through the actor's inbox, so a
//! render pass always sees a fully merged tree and payloads apply in the
//! order they arrive.
//!
//! ## Architecture
//!
//! ```text
//! SessionHandle ──mpsc──► SessionActor ──► Coordinator ──► BlockRemote
//!                             │   ▲
//!                             │   └── debounce deadline (select!)
//!                             ▼
//!              Document ──► RenderPipeline
//!                             │
//!     watch<ViewState> ◄──────┼──────► broadcast<RenderUpdate>
//!     watch<ControlPanelState>└──────► broadcast<UiError>
//! ```
//!
//! Closing cancels the session token. Remote calls race against it, so a
//! payload that arrives after close is never applied.

use crate::commands::{Command, Position};
use crate::coordinator::{Coordinator, DomainError, HistoryResult};
use crate::debounce::{expired, TextDebouncer};
use crate::document::Document;
use crate::errors::{EditorError, EditorResult};
use crate::pipeline::{RenderPipeline, RenderUpdate};
use crate::settings::EditorSettings;
use crate::store::EditorStores;
use blocktree_model::{
    BlockId, Content, Event, Mark, ObjectTypeStore, Payload, RelationStore, Text, TextStyle,
};
use blocktree_render::{
    BlockView, Cursor, Focus, Mode, RenderState, Renderer, SearchQuery, TextSelection,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::future::Future;
use std::ops::Range;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

const INBOX_CAPACITY: usize = 64;
const BROADCAST_CAPACITY: usize = 64;

/// What the presentation layer should show for the document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum ViewState {
    Init,
    Success { views: Vec<BlockView> },
    Error { message: String },
}

/// Kind of block the main toolbar acts on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TargetBlockType {
    Any,
    Title,
    Cell,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MainToolbar {
    pub is_visible: bool,
    pub target: Option<TargetBlockType>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiSelect {
    pub is_visible: bool,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlPanelState {
    pub main_toolbar: MainToolbar,
    pub navigation_visible: bool,
    pub multi_select: MultiSelect,
}

impl ControlPanelState {
    /// Nothing focused, navigation bar shown
    pub fn init() -> Self {
        Self {
            main_toolbar: MainToolbar::default(),
            navigation_visible: true,
            multi_select: MultiSelect::default(),
        }
    }
}

/// Failure surfaced to the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum UiError {
    /// Needs an explicit blocking message
    BackwardCompatibility,
    ObjectInvalid { id: BlockId },
    /// Transient "something went wrong" notice
    CommandFailed { command: String, message: String },
}

impl UiError {
    pub fn is_blocking(&self) -> bool {
        matches!(self, UiError::BackwardCompatibility)
    }

    fn from_domain(command: &str, err: &DomainError) -> Self {
        match err {
            DomainError::BackwardCompatibility => UiError::BackwardCompatibility,
            DomainError::ObjectInvalid(id) => UiError::ObjectInvalid { id: id.clone() },
            other => UiError::CommandFailed {
                command: command.to_string(),
                message: other.to_string(),
            },
        }
    }
}

/// Shared definition stores a session renders against
#[derive(Debug, Clone, Default)]
pub struct SharedStores {
    pub relations: Arc<RelationStore>,
    pub object_types: Arc<ObjectTypeStore>,
}

/// User-interface events that do not reach the remote by themselves
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    FocusChanged { id: BlockId, has_focus: bool },
    TextChanged { id: BlockId, text: String, marks: Vec<Mark> },
    SelectionChanged { id: BlockId, range: Range<usize> },
    Toggle { id: BlockId },
    Search(Option<SearchQuery>),
    SelectBlocks(Vec<BlockId>),
    HideKeyboard,
    BackPressed,
    OutsideClick,
}

enum Message {
    Intent(Intent, oneshot::Sender<()>),
    Dispatch(Command, oneshot::Sender<EditorResult<Payload>>),
    Undo(oneshot::Sender<EditorResult<HistoryResult>>),
    Redo(oneshot::Sender<EditorResult<HistoryResult>>),
    Remote(Payload),
    Close(oneshot::Sender<()>),
}

/// Opens documents as sessions
pub struct EditorSession;

impl EditorSession {
    /// Open a document and spawn its actor. The first render has been
    /// published by the time this returns.
    #[instrument(skip(coordinator, settings, shared, parent))]
    pub async fn open(
        coordinator: Coordinator,
        context: &str,
        settings: &EditorSettings,
        shared: SharedStores,
        parent: &CancellationToken,
    ) -> EditorResult<SessionHandle> {
        let snapshot = coordinator.open(context).await?;

        shared.relations.merge(snapshot.relations.clone());
        shared.object_types.merge(snapshot.object_types.clone());

        let document = Document::from_snapshot(&snapshot);
        let stores = Arc::new(EditorStores::new());
        stores.details.update(document.details.clone());
        stores.restrictions.update(document.restrictions.clone());

        if let Some(title) = document.tree.title() {
            if title.as_text().is_some_and(|text| text.text.is_empty()) {
                stores.focus.update(Focus::id(title.id.clone()).with_cursor(Cursor::Start));
            }
        }

        let (inbox_tx, inbox) = mpsc::channel(INBOX_CAPACITY);
        let (view_state, _) = watch::channel(ViewState::Init);
        let (control_panel, _) = watch::channel(ControlPanelState::init());
        let (updates, _) = broadcast::channel(BROADCAST_CAPACITY);
        let (errors, _) = broadcast::channel(BROADCAST_CAPACITY);
        let cancel = parent.child_token();

        let handle = SessionHandle {
            context: document.id.clone(),
            inbox: inbox_tx,
            stores: Arc::clone(&stores),
            view_state: view_state.subscribe(),
            control_panel: control_panel.subscribe(),
            updates: updates.clone(),
            errors: errors.clone(),
            cancel: cancel.clone(),
        };

        let mut actor = SessionActor {
            coordinator,
            document,
            pipeline: RenderPipeline::new(Renderer::new().with_naming(settings.naming())),
            stores,
            shared,
            selected: BTreeSet::new(),
            toggled: BTreeSet::new(),
            search: None,
            debouncer: TextDebouncer::new(settings.text_debounce()),
            view_state,
            control_panel,
            updates,
            errors,
            cancel,
        };
        actor.render();

        info!(context = %actor.document.id, "Session opened");
        tokio::spawn(actor.run(inbox));
        Ok(handle)
    }
}

/// Cloneable handle to a running session
#[derive(Debug, Clone)]
pub struct SessionHandle {
    context: BlockId,
    inbox: mpsc::Sender<Message>,
    stores: Arc<EditorStores>,
    view_state: watch::Receiver<ViewState>,
    control_panel: watch::Receiver<ControlPanelState>,
    updates: broadcast::Sender<RenderUpdate>,
    errors: broadcast::Sender<UiError>,
    cancel: CancellationToken,
}

impl std::fmt::Debug for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Message::Intent(intent, _) => f.debug_tuple("Intent").field(intent).finish(),
            Message::Dispatch(command, _) => f.debug_tuple("Dispatch").field(command).finish(),
            Message::Undo(_) => f.write_str("Undo"),
            Message::Redo(_) => f.write_str("Redo"),
            Message::Remote(payload) => f.debug_tuple("Remote").field(payload).finish(),
            Message::Close(_) => f.write_str("Close"),
        }
    }
}

impl SessionHandle {
    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn stores(&self) -> &EditorStores {
        &self.stores
    }

    pub fn view_state(&self) -> watch::Receiver<ViewState> {
        self.view_state.clone()
    }

    pub fn current_view_state(&self) -> ViewState {
        self.view_state.borrow().clone()
    }

    pub fn control_panel(&self) -> ControlPanelState {
        self.control_panel.borrow().clone()
    }

    pub fn subscribe_control_panel(&self) -> watch::Receiver<ControlPanelState> {
        self.control_panel.clone()
    }

    pub fn updates(&self) -> broadcast::Receiver<RenderUpdate> {
        self.updates.subscribe()
    }

    pub fn errors(&self) -> broadcast::Receiver<UiError> {
        self.errors.subscribe()
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    async fn request<T>(&self, message: impl FnOnce(oneshot::Sender<T>) -> Message) -> EditorResult<T> {
        if self.is_closed() {
            return Err(EditorError::SessionClosed);
        }
        let (tx, rx) = oneshot::channel();
        self.inbox
            .send(message(tx))
            .await
            .map_err(|_| EditorError::SessionClosed)?;
        rx.await.map_err(|_| EditorError::SessionClosed)
    }

    /// Send an intent and wait until the session has processed it
    pub async fn send(&self, intent: Intent) -> EditorResult<()> {
        self.request(|ack| Message::Intent(intent, ack)).await
    }

    pub async fn dispatch(&self, command: Command) -> EditorResult<Payload> {
        self.request(|reply| Message::Dispatch(command, reply)).await?
    }

    pub async fn undo(&self) -> EditorResult<HistoryResult> {
        self.request(Message::Undo).await?
    }

    pub async fn redo(&self) -> EditorResult<HistoryResult> {
        self.request(Message::Redo).await?
    }

    pub async fn focus(&self, id: impl Into<BlockId>, has_focus: bool) -> EditorResult<()> {
        self.send(Intent::FocusChanged {
            id: id.into(),
            has_focus,
        })
        .await
    }

    pub async fn text_changed(
        &self,
        id: impl Into<BlockId>,
        text: impl Into<String>,
        marks: Vec<Mark>,
    ) -> EditorResult<()> {
        self.send(Intent::TextChanged {
            id: id.into(),
            text: text.into(),
            marks,
        })
        .await
    }

    pub async fn hide_keyboard(&self) -> EditorResult<()> {
        self.send(Intent::HideKeyboard).await
    }

    pub async fn outside_click(&self) -> EditorResult<()> {
        self.send(Intent::OutsideClick).await
    }

    /// Deliver a payload from the remote event stream
    pub async fn push_remote(&self, payload: Payload) -> EditorResult<()> {
        if self.is_closed() {
            return Err(EditorError::SessionClosed);
        }
        self.inbox
            .send(Message::Remote(payload))
            .await
            .map_err(|_| EditorError::SessionClosed)
    }

    /// Flush pending edits, close the page and stop the actor
    pub async fn close(&self) -> EditorResult<()> {
        if self.is_closed() {
            return Ok(());
        }
        self.request(Message::Close).await
    }
}

struct SessionActor {
    coordinator: Coordinator,
    document: Document,
    pipeline: RenderPipeline,
    stores: Arc<EditorStores>,
    shared: SharedStores,
    selected: BTreeSet<BlockId>,
    toggled: BTreeSet<BlockId>,
    search: Option<SearchQuery>,
    debouncer: TextDebouncer,
    view_state: watch::Sender<ViewState>,
    control_panel: watch::Sender<ControlPanelState>,
    updates: broadcast::Sender<RenderUpdate>,
    errors: broadcast::Sender<UiError>,
    cancel: CancellationToken,
}

impl SessionActor {
    async fn run(mut self, mut inbox: mpsc::Receiver<Message>) {
        loop {
            let deadline = self.debouncer.deadline();
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                message = inbox.recv() => {
                    let Some(message) = message else { break };
                    if !self.handle(message).await {
                        break;
                    }
                }
                _ = expired(deadline) => {
                    if self.flush_text().await {
                        self.render();
                    }
                }
            }
        }
        self.cancel.cancel();
        debug!(context = %self.document.id, "Session actor stopped");
    }

    /// Returns false once the session should stop
    async fn handle(&mut self, message: Message) -> bool {
        match message {
            Message::Intent(intent, ack) => {
                self.intent(intent).await;
                let _ = ack.send(());
            }
            Message::Dispatch(command, reply) => {
                self.flush_text().await;
                let result = self.dispatch(command).await;
                let _ = reply.send(result);
            }
            Message::Undo(reply) => {
                self.flush_text().await;
                let result = self.history(true).await;
                let _ = reply.send(result);
            }
            Message::Redo(reply) => {
                self.flush_text().await;
                let result = self.history(false).await;
                let _ = reply.send(result);
            }
            Message::Remote(payload) => {
                if self.merge(&payload) {
                    self.render();
                }
            }
            Message::Close(ack) => {
                self.flush_text().await;
                let context = self.document.id.clone();
                if let Err(err) = self.coordinator.close(&context).await {
                    warn!(%err, "Failed to close page");
                }
                self.cancel.cancel();
                info!(%context, "Session closed");
                let _ = ack.send(());
                return false;
            }
        }
        true
    }

    /// Await a remote call unless the session is cancelled first
    async fn remote<T>(&self, call: impl Future<Output = Result<T, DomainError>>) -> Result<T, DomainError> {
        tokio::select! {
            _ = self.cancel.cancelled() => Err(DomainError::SessionClosed),
            result = call => result,
        }
    }

    async fn intent(&mut self, intent: Intent) {
        match intent {
            Intent::FocusChanged { id, has_focus } => {
                if has_focus {
                    self.selected.clear();
                    self.stores.focus.update(Focus::id(id));
                } else if self.stores.focus.current().is_target(&id) {
                    self.flush_text().await;
                    self.stores.focus.update(Focus::empty());
                }
            }
            Intent::TextChanged { id, text, marks } => {
                let local = Payload::new(
                    self.document.id.clone(),
                    vec![Event::UpdateText {
                        id: id.clone(),
                        text: Some(text.clone()),
                        marks: Some(marks.clone()),
                        style: None,
                        checked: None,
                        color: None,
                    }],
                );
                if self.merge(&local) {
                    self.debouncer.push(id, text, marks);
                }
            }
            Intent::SelectionChanged { id, range } => {
                self.stores.text_selection.update(TextSelection::new(id, range));
            }
            Intent::Toggle { id } => {
                if !self.toggled.remove(&id) {
                    self.toggled.insert(id);
                }
            }
            Intent::Search(query) => self.search = query,
            Intent::SelectBlocks(ids) => {
                self.selected = ids.into_iter().collect();
                if !self.selected.is_empty() {
                    self.flush_text().await;
                    self.stores.focus.update(Focus::empty());
                }
            }
            Intent::HideKeyboard => {
                self.flush_text().await;
                self.stores.focus.update(Focus::empty());
            }
            Intent::BackPressed => {
                self.flush_text().await;
                self.selected.clear();
                self.stores.focus.update(Focus::empty());
            }
            Intent::OutsideClick => self.outside_click().await,
        }
        self.render();
    }

    /// Focus the last block when it is empty text, otherwise append one
    async fn outside_click(&mut self) {
        let last = self.pipeline.last_views().and_then(|views| views.last()).cloned();
        if let Some(BlockView::Text(text)) = last {
            if text.text.is_empty() && text.mode == Mode::Edit {
                self.stores
                    .focus
                    .update(Focus::id(text.id).with_cursor(Cursor::End));
                return;
            }
        }

        let root = self.document.id.clone();
        let command = Command::Create {
            target: root,
            position: Position::Bottom,
            content: Content::Text(Text::new(TextStyle::Paragraph, "")),
        };
        // Failures are already reported on the error stream
        let _ = self.dispatch(command).await;
    }

    async fn dispatch(&mut self, command: Command) -> EditorResult<Payload> {
        let name = command.name();
        let before = self.document.clone();
        let context = self.document.id.clone();
        let result = self
            .remote(self.coordinator.dispatch(&context, command.clone()))
            .await;

        let payload = match result {
            Ok(payload) => payload,
            Err(err) => {
                self.report(name, &err);
                return Err(err.into());
            }
        };
        if self.merge(&payload) {
            if let Some(focus) = focus_after(&command, &payload, &before) {
                self.stores.focus.update(focus);
            }
            self.render();
        }
        Ok(payload)
    }

    async fn history(&mut self, undo: bool) -> EditorResult<HistoryResult> {
        let context = self.document.id.clone();
        let result = if undo {
            self.remote(self.coordinator.undo(&context)).await
        } else {
            self.remote(self.coordinator.redo(&context)).await
        };
        match result {
            Ok(HistoryResult::Success(payload)) => {
                if self.merge(&payload) {
                    self.render();
                }
                Ok(HistoryResult::Success(payload))
            }
            Ok(HistoryResult::Exhausted) => {
                debug!(undo, "History exhausted");
                Ok(HistoryResult::Exhausted)
            }
            Err(err) => {
                self.report(if undo { "undo" } else { "redo" }, &err);
                Err(err.into())
            }
        }
    }

    /// Send buffered text edits, one command per block. Returns true when
    /// a returned payload was merged.
    async fn flush_text(&mut self) -> bool {
        let context = self.document.id.clone();
        let mut merged = false;
        for pending in self.debouncer.flush() {
            let command = Command::UpdateText {
                target: pending.block,
                text: pending.text,
                marks: pending.marks,
            };
            match self.remote(self.coordinator.dispatch(&context, command)).await {
                // The remote may store a different text than was typed
                Ok(payload) => merged |= self.merge(&payload),
                Err(err) => self.report("updateText", &err),
            }
        }
        merged
    }

    /// Merge a payload into the document. Returns false when nothing was
    /// applied.
    fn merge(&mut self, payload: &Payload) -> bool {
        if self.cancel.is_cancelled() {
            debug!(context = %payload.context, "Dropping payload for closed session");
            return false;
        }
        if payload.is_empty() {
            return false;
        }
        match self.document.apply(payload) {
            Ok(()) => {
                let tree = &self.document.tree;
                if let Some(target) = self.stores.focus.current().target_id() {
                    if !tree.contains(target) {
                        debug!(block = target, "Focused block removed");
                        self.stores.focus.update(Focus::empty());
                    }
                }
                self.selected.retain(|id| tree.contains(id));
                self.stores.details.update(self.document.details.clone());
                self.stores
                    .restrictions
                    .update(self.document.restrictions.clone());
                true
            }
            Err(err) => {
                warn!(%err, "Failed to apply payload");
                false
            }
        }
    }

    fn report(&self, command: &str, err: &DomainError) {
        if matches!(err, DomainError::SessionClosed) {
            return;
        }
        error!(command, %err, "Command failed");
        let _ = self.errors.send(UiError::from_domain(command, err));
    }

    fn render(&mut self) {
        let state = RenderState::new()
            .with_focus(self.stores.focus.current())
            .with_selected(self.selected.iter().cloned())
            .with_toggled(self.toggled.iter().cloned())
            .with_restrictions(self.document.restrictions.clone())
            .with_relations(self.shared.relations.snapshot())
            .with_object_types(self.shared.object_types.snapshot());
        let state = match &self.search {
            Some(search) => state.with_search(search.clone()),
            None => state,
        };

        match self.pipeline.render(&self.document, &state) {
            Ok(update) => {
                self.stores.screen.update(update.views.clone());
                self.stores.layout_conflict.update(update.layout_conflict);
                self.view_state.send_replace(ViewState::Success {
                    views: update.views.clone(),
                });
                if !update.is_unchanged() {
                    let _ = self.updates.send(update);
                }
            }
            Err(err) => {
                error!(%err, "Render failed");
                self.pipeline.reset();
                self.view_state.send_replace(ViewState::Error {
                    message: err.to_string(),
                });
            }
        }
        self.control_panel.send_replace(self.control_panel_state());
    }

    fn control_panel_state(&self) -> ControlPanelState {
        if !self.selected.is_empty() {
            return ControlPanelState {
                main_toolbar: MainToolbar::default(),
                navigation_visible: false,
                multi_select: MultiSelect {
                    is_visible: true,
                    count: self.selected.len(),
                },
            };
        }

        let focus = self.stores.focus.current();
        match focus.target_id() {
            Some(id) => {
                let tree = &self.document.tree;
                let target = if tree.get(id).is_some_and(|block| block.is_title()) {
                    TargetBlockType::Title
                } else if tree
                    .parent_of(id)
                    .is_some_and(|parent| matches!(parent.content, Content::TableRow { .. }))
                {
                    TargetBlockType::Cell
                } else {
                    TargetBlockType::Any
                };
                ControlPanelState {
                    main_toolbar: MainToolbar {
                        is_visible: true,
                        target: Some(target),
                    },
                    navigation_visible: false,
                    multi_select: MultiSelect::default(),
                }
            }
            None => ControlPanelState::init(),
        }
    }
}

/// Where focus goes after a structural command succeeds
fn focus_after(command: &Command, payload: &Payload, before: &Document) -> Option<Focus> {
    match command {
        Command::Create { .. } | Command::Split { .. } => {
            let created = payload.events.iter().find_map(|event| match event {
                Event::AddBlock { blocks } => blocks
                    .iter()
                    .find(|block| block.as_text().is_some() && !before.tree.contains(&block.id)),
                _ => None,
            })?;
            Some(Focus::id(created.id.clone()).with_cursor(Cursor::Start))
        }
        Command::Merge { previous, .. } => {
            let offset = before.tree.get(previous)?.as_text()?.char_len();
            Some(Focus::id(previous.clone()).with_cursor(Cursor::Position(offset)))
        }
        _ => None,
    }
}
