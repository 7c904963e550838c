//! # Block Tree Renderer
//!
//! Turns a [`BlockTree`](blocktree_model::BlockTree) into the flat, ordered
//! list of [`BlockView`]s the presentation layer draws, and computes
//! fine-grained change payloads between two such lists.
//!
//! ## Architecture
//!
//! ```text
//! BlockTree + ObjectViewDetails + RenderState
//!        │
//!        ▼
//!   Renderer (depth-first flatten)
//!        ├── naming     (object display names)
//!        ├── featured   (featured relations row)
//!        ├── markup     (mark compositing, search highlights)
//!        ▼
//!   Vec<BlockView> ──► view_differ ──► ViewChange + ChangePayload
//! ```
//!
//! A render pass never suspends and never mutates its inputs, so one pass
//! always observes a single consistent snapshot.

pub mod block_view;
pub mod errors;
pub mod featured;
pub mod focus;
pub mod markup;
pub mod naming;
pub mod relation_view;
pub mod renderer;
pub mod view_differ;

pub use block_view::{
    BlockView, DescriptionView, DividerView, FeaturedRelationView, LatexView, LinkKind, LinkView,
    MediaKind, MediaView, Mode, RelationBlockView, RelationState, SearchField, TableCellView,
    TableRowView, TableView, TextKind, TextView, TitleKind, TitleView, ViewType,
};
pub use errors::{RenderError, RenderResult};
pub use focus::{Cursor, Focus, FocusTarget, TextSelection};
pub use naming::{NamingRule, ObjectNaming, Placeholders};
pub use relation_view::{FileView, ObjectRelationView, ObjectView, StatusView, TagView};
pub use renderer::{RenderOutput, RenderState, RenderWarning, Renderer, SearchQuery};
pub use view_differ::{diff_views, ChangeFlag, ChangePayload, ViewChange, ViewDiff};
