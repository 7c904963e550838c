//! # Block Tree Workspace
//!
//! Owns every open document session of one client and routes the inbound
//! remote event stream to them.
//!
//! ```text
//!   remote event stream ──► Workspace::run_router
//!                                │  (documentId, Payload)
//!                 ┌──────────────┼──────────────┐
//!                 ▼              ▼              ▼
//!            session A      session B      (unknown: dropped)
//!                 └──── shared relation / object-type stores ────┘
//! ```

pub mod deep_link;
pub mod state;

pub use deep_link::{resolve, DeepLinkAction, Invite};
pub use state::{payload_stream, Workspace, WorkspaceError, WorkspaceResult};
