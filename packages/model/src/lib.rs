//! # Block Tree Model
//!
//! In-memory representation of one object document: a flat, id-indexed
//! collection of blocks forming a tree rooted at a `Smart` page block,
//! plus the object details and restrictions that travel with it.
//!
//! ## Architecture
//!
//! ```text
//! DocumentSnapshot ──► BlockTree ◄── Payload(Event...)   (remote patches)
//!        │                                │
//!        └──► ObjectViewDetails ◄─────────┘   (Set/Amend/UnsetDetails)
//!
//! RelationStore / ObjectTypeStore   (shared across documents, atomic merge)
//! ```
//!
//! Everything here is plain data. Rendering lives in `blocktree-render`,
//! sessions and commands in `blocktree-editor`.

pub mod block;
pub mod details;
pub mod errors;
pub mod layout;
pub mod mark;
pub mod payload;
pub mod relations;
pub mod restrictions;
pub mod snapshot;
pub mod stores;
pub mod tree;

pub use block::{
    Align, Block, BlockId, Bookmark, Content, DividerStyle, Fields, File, FileKind, LayoutKind,
    MediaState, Text, TextStyle,
};
pub use details::{ObjectRecord, ObjectTypeRecord, ObjectViewDetails, RelationRecord, Struct};
pub use errors::{TreeError, TreeResult};
pub use layout::ObjectLayout;
pub use mark::{Mark, MarkKind};
pub use payload::{Event, Payload};
pub use relations::{keys, RelationFormat};
pub use restrictions::ObjectRestriction;
pub use snapshot::DocumentSnapshot;
pub use stores::{ObjectTypeIndex, ObjectTypeStore, RelationIndex, RelationStore};
pub use tree::{BlockTree, TreeIssue};
