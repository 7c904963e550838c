pub mod diff;
pub mod link;
pub mod render;
pub mod replay;

pub use diff::{diff, DiffArgs};
pub use link::{link, LinkArgs};
pub use render::{render, RenderArgs};
pub use replay::{replay, ReplayArgs};

use anyhow::{Context, Result};
use blocktree_model::{DocumentSnapshot, ObjectTypeStore, RelationStore};
use blocktree_render::{
    BlockView, LinkKind, ObjectNaming, RenderOutput, RenderState, RenderWarning, Renderer,
    ViewChange,
};
use colored::Colorize;
use std::path::Path;

/// Read a document snapshot from a JSON file
pub fn load_snapshot(path: &Path) -> Result<DocumentSnapshot> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    DocumentSnapshot::from_json(&content)
        .with_context(|| format!("Invalid snapshot in {}", path.display()))
}

/// Render a snapshot against its own relation and object-type definitions
pub fn render_snapshot(
    snapshot: &DocumentSnapshot,
    naming: ObjectNaming,
    state: RenderState,
) -> Result<RenderOutput> {
    let relations = RelationStore::new();
    relations.merge(snapshot.relations.clone());
    let object_types = ObjectTypeStore::new();
    object_types.merge(snapshot.object_types.clone());

    let state = state
        .with_restrictions(snapshot.restrictions.clone())
        .with_relations(relations.snapshot())
        .with_object_types(object_types.snapshot());

    let output = Renderer::new()
        .with_naming(naming)
        .render(&snapshot.tree(), &snapshot.details, &state)
        .with_context(|| format!("Failed to render document {}", snapshot.root))?;
    Ok(output)
}

/// One line per view: index, indent, view type, label
pub fn describe(index: usize, view: &BlockView) -> String {
    let indent = "  ".repeat(view.indent().unwrap_or(0));
    let marker = if view.is_focused() == Some(true) { "*" } else { " " };
    let label = match view {
        BlockView::LinkToObject(link) => match &link.kind {
            LinkKind::Default { name, .. } => format!("→ {name}"),
            _ => String::new(),
        },
        _ => view.text().map(|text| format!("{text:?}")).unwrap_or_default(),
    };
    format!(
        "{index:>3}{marker} {indent}{:?} [{}] {label}",
        view.view_type(),
        view.id()
    )
    .trim_end()
    .to_string()
}

pub fn print_views(views: &[BlockView]) {
    for (index, view) in views.iter().enumerate() {
        println!("{}", describe(index, view));
    }
}

pub fn print_warnings(warnings: &[RenderWarning]) {
    for warning in warnings {
        eprintln!("  {} {:?}", "⚠".yellow(), warning);
    }
}

/// Short form of a diff entry, e.g. `update 2 textChanged,focusChanged`
pub fn describe_change(change: &ViewChange) -> String {
    match change {
        ViewChange::Unchanged { index } => format!("unchanged {index}"),
        ViewChange::Update { index, payload } => {
            let flags = payload
                .as_ref()
                .map(|payload| {
                    payload
                        .flags()
                        .iter()
                        .map(|flag| flag.as_str())
                        .collect::<Vec<_>>()
                        .join(",")
                })
                .unwrap_or_else(|| "-".to_string());
            format!("update {index} {flags}")
        }
        ViewChange::Replace { index } => format!("replace {index}"),
        ViewChange::Insert { index } => format!("insert {index}"),
        ViewChange::Remove { index } => format!("remove {index}"),
    }
}
