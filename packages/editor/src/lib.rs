//! # Block Tree Editor
//!
//! Per-document editing sessions on top of the block tree model and the
//! renderer.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ model: BlockTree, details, Payload events   │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: one session actor per document      │
//! │  - Reactive stores (focus, selection, ...)  │
//! │  - Commands via Coordinator → BlockRemote   │
//! │  - Debounced text edits                     │
//! │  - Merge payload → render → diff            │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ render: BlockTree → Vec<BlockView> + diff   │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Remote is source of truth**: every command returns a Payload that
//!    is merged before the next render
//! 2. **Single writer per document**: the session actor serializes all
//!    mutations of its document
//! 3. **Typed outcomes**: undo exhaustion and backward compatibility are
//!    results, not generic failures
//!
//! ## Usage
//!
//! ```rust,ignore
//! use blocktree_editor::{Coordinator, EditorSession, MemoryRemote, SharedStores};
//!
//! let remote = Arc::new(MemoryRemote::default());
//! remote.insert(snapshot);
//!
//! let session = EditorSession::open(
//!     Coordinator::new(remote),
//!     "page",
//!     &EditorSettings::default(),
//!     SharedStores::default(),
//!     &CancellationToken::new(),
//! )
//! .await?;
//!
//! session.text_changed("b1", "Hello", vec![]).await?;
//! session.close().await?;
//! ```

pub mod commands;
pub mod coordinator;
pub mod debounce;
pub mod delta;
pub mod document;
pub mod errors;
pub mod history;
pub mod memory_remote;
pub mod mutations;
pub mod pipeline;
pub mod remote;
pub mod session;
pub mod settings;
pub mod store;

pub use commands::{Command, CoverKind, Position};
pub use coordinator::{Coordinator, DomainError, DomainResult, HistoryResult};
pub use debounce::{PendingText, TextDebouncer};
pub use document::Document;
pub use errors::{EditorError, EditorResult};
pub use history::History;
pub use memory_remote::MemoryRemote;
pub use pipeline::{RenderPipeline, RenderUpdate};
pub use remote::{BlockRemote, RemoteError, RemoteResult};
pub use session::{
    ControlPanelState, EditorSession, Intent, MainToolbar, MultiSelect, SessionHandle,
    SharedStores, TargetBlockType, UiError, ViewState,
};
pub use settings::EditorSettings;
pub use store::{EditorStores, Store};
