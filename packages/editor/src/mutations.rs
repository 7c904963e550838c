//! # Command Engine
//!
//! Applies a [`Command`] directly to a [`Document`]. Used by the in-memory
//! remote, which runs it on a scratch copy and derives the payload from the
//! before/after states.
//!
//! ## Validation
//!
//! - Commands forbidden by the document's restrictions are rejected
//! - Text commands on non-text blocks fail with `NotText`
//! - Moves into the moved subtree fail with `CyclicMove`
//! - The root block can be neither moved nor removed

use crate::commands::{Command, CoverKind, Position};
use crate::document::Document;
use crate::remote::{RemoteError, RemoteResult};
use blocktree_model::{
    keys, Block, BlockId, BlockTree, Content, LayoutKind, Mark, MediaState, Struct, Text,
    TextStyle, TreeError,
};
use serde_json::{json, Value};

/// Allocates block ids that do not collide with the current tree
#[derive(Debug, Clone, Default)]
pub struct BlockIds {
    next: u64,
}

impl BlockIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&mut self, tree: &BlockTree) -> BlockId {
        loop {
            self.next += 1;
            let id = format!("block-{}", self.next);
            if !tree.contains(&id) {
                return id;
            }
        }
    }
}

impl CoverKind {
    /// Cover type code stored in the `coverType` detail
    pub fn code(self) -> i64 {
        match self {
            CoverKind::Image => 1,
            CoverKind::Color => 2,
            CoverKind::Gradient => 3,
        }
    }
}

/// Apply a command to the document
pub fn apply(doc: &mut Document, command: &Command, ids: &mut BlockIds) -> RemoteResult<()> {
    let restriction = command.restricted_by();
    if doc.restrictions.contains(&restriction) {
        return Err(RemoteError::Rejected(format!(
            "{} is restricted on {}",
            command.name(),
            doc.id
        )));
    }

    match command {
        Command::UpdateText {
            target,
            text,
            marks,
        } => {
            let content = text_mut(&mut doc.tree, target)?;
            content.text = text.clone();
            content.marks = marks.clone();
        }
        Command::UpdateStyle { targets, style } => {
            for target in targets {
                text_mut(&mut doc.tree, target)?.style = *style;
            }
        }
        Command::UpdateTextColor { targets, color } => {
            for target in targets {
                text_mut(&mut doc.tree, target)?.color =
                    Some(color.clone()).filter(|c| !c.is_empty());
            }
        }
        Command::UpdateBackgroundColor { targets, color } => {
            for target in targets {
                let fields = &mut block_mut(&mut doc.tree, target)?.fields;
                match color {
                    Some(color) => fields.insert(blocktree_model::Fields::BACKGROUND_COLOR, color.clone()),
                    None => {
                        fields.remove(blocktree_model::Fields::BACKGROUND_COLOR);
                    }
                }
            }
        }
        Command::UpdateAlignment { targets, align } => {
            for target in targets {
                text_mut(&mut doc.tree, target)?.align = *align;
            }
        }
        Command::UpdateCheckbox { target, is_checked } => {
            text_mut(&mut doc.tree, target)?.checked = *is_checked;
        }
        Command::Create {
            target,
            position,
            content,
        } => {
            let id = ids.next(&doc.tree);
            doc.tree.insert(Block::new(id.clone(), content.clone()));
            place(&mut doc.tree, target, *position, vec![id])?;
        }
        Command::Replace { target, content } => {
            let id = ids.next(&doc.tree);
            doc.tree.insert(Block::new(id.clone(), content.clone()));
            place(&mut doc.tree, target, Position::Bottom, vec![id])?;
            doc.tree.remove(target)?;
        }
        Command::Duplicate { target, blocks } => {
            let mut copies = Vec::with_capacity(blocks.len());
            for id in blocks {
                copies.push(copy_subtree(&mut doc.tree, id, ids)?);
            }
            place(&mut doc.tree, target, Position::Bottom, copies)?;
        }
        Command::Move {
            targets,
            target,
            position,
        } => {
            block_mut(&mut doc.tree, target)?;
            for moved in targets {
                if moved == doc.tree.root_id() {
                    return Err(TreeError::RootRemoval(moved.clone()).into());
                }
                block_mut(&mut doc.tree, moved)?;
                if doc.tree.is_descendant(target, moved) {
                    return Err(TreeError::CyclicMove {
                        child: moved.clone(),
                        target: target.clone(),
                    }
                    .into());
                }
            }
            detach(&mut doc.tree, targets);
            place(&mut doc.tree, target, *position, targets.clone())?;
        }
        Command::Unlink { targets } => {
            for target in targets {
                block_mut(&mut doc.tree, target)?;
            }
            for target in targets {
                // Already gone with an unlinked ancestor
                if doc.tree.contains(target) {
                    doc.tree.remove(target)?;
                }
            }
        }
        Command::Merge { previous, next } => merge(&mut doc.tree, previous, next)?,
        Command::Split {
            target,
            range,
            style,
        } => split(&mut doc.tree, target, range.clone(), *style, ids)?,
        Command::TurnInto { targets, style } => {
            for target in targets {
                let text = text_mut(&mut doc.tree, target)?;
                if text.style.is_header_layout_member() {
                    return Err(RemoteError::Rejected(format!(
                        "{target} cannot be turned into another style"
                    )));
                }
                text.style = *style;
                if *style != TextStyle::Checkbox {
                    text.checked = false;
                }
                if *style == TextStyle::Code {
                    text.marks.clear();
                }
                if *style != TextStyle::Callout {
                    text.icon_emoji = None;
                }
            }
        }
        Command::SetFields { target, fields } => {
            block_mut(&mut doc.tree, target)?.fields.merge(fields);
        }
        Command::SetRelationKey { target, key } => {
            let block = block_mut(&mut doc.tree, target)?;
            match block.content {
                Content::Relation { .. } => {
                    block.content = Content::Relation {
                        key: Some(key.clone()),
                    }
                }
                _ => return Err(unexpected(target, "relation")),
            }
        }
        Command::UpdateDivider { targets, style } => {
            for target in targets {
                let block = block_mut(&mut doc.tree, target)?;
                match block.content {
                    Content::Divider { .. } => block.content = Content::Divider { style: *style },
                    _ => return Err(unexpected(target, "divider")),
                }
            }
        }
        Command::UpdateLatex { target, latex } => {
            let block = block_mut(&mut doc.tree, target)?;
            match block.content {
                Content::Latex { .. } => {
                    block.content = Content::Latex {
                        latex: latex.clone(),
                    }
                }
                _ => return Err(unexpected(target, "latex")),
            }
        }
        Command::UploadBlock {
            target,
            file_object,
            name,
        } => {
            let block = block_mut(&mut doc.tree, target)?;
            let Content::File(file) = &mut block.content else {
                return Err(unexpected(target, "file"));
            };
            file.state = MediaState::Done;
            file.target = Some(file_object.clone());
            if name.is_some() {
                file.name = name.clone();
            }
        }
        Command::SetDataViewProperties { target, properties } => {
            block_mut(&mut doc.tree, target)?
                .fields
                .insert("properties", json!(properties));
        }
        Command::SetDocumentEmojiIcon { emoji } => {
            amend_details(doc, [(keys::ICON_EMOJI, json!(emoji))]);
            unset_details(doc, &[keys::ICON_IMAGE]);
        }
        Command::SetDocumentImageIcon { hash } => {
            amend_details(doc, [(keys::ICON_IMAGE, json!(hash))]);
            unset_details(doc, &[keys::ICON_EMOJI]);
        }
        Command::SetDocumentCoverColor { color } => set_cover(doc, CoverKind::Color, color),
        Command::SetDocumentCoverGradient { gradient } => {
            set_cover(doc, CoverKind::Gradient, gradient)
        }
        Command::SetDocumentCoverImage { hash } => set_cover(doc, CoverKind::Image, hash),
        Command::RemoveDocumentCover => unset_details(doc, &[keys::COVER_TYPE, keys::COVER_ID]),
        Command::UpdateDetail { key, value } => {
            amend_details(doc, [(key.as_str(), value.clone())]);
        }
    }
    Ok(())
}

fn block_mut<'a>(tree: &'a mut BlockTree, id: &str) -> RemoteResult<&'a mut Block> {
    tree.get_mut(id)
        .ok_or_else(|| RemoteError::ObjectNotFound(id.to_string()))
}

fn text_mut<'a>(tree: &'a mut BlockTree, id: &str) -> RemoteResult<&'a mut Text> {
    block_mut(tree, id)?
        .as_text_mut()
        .ok_or_else(|| TreeError::NotText(id.to_string()).into())
}

fn unexpected(id: &str, expected: &str) -> RemoteError {
    RemoteError::Rejected(format!("{id} is not a {expected} block"))
}

/// Inserts `ids` relative to `target`. Top/Bottom of the root mean its
/// first and last child positions.
fn place(
    tree: &mut BlockTree,
    target: &str,
    position: Position,
    ids: Vec<BlockId>,
) -> RemoteResult<()> {
    if position == Position::Inner || target == tree.root_id() {
        let children = &mut block_mut(tree, target)?.children;
        match position {
            Position::Top => {
                children.splice(0..0, ids);
            }
            Position::Bottom | Position::Inner => children.extend(ids),
        }
        return Ok(());
    }

    let parent = tree
        .parent_of(target)
        .map(|parent| parent.id.clone())
        .ok_or_else(|| RemoteError::Rejected(format!("{target} has no parent")))?;
    let children = &mut block_mut(tree, &parent)?.children;
    let index = children
        .iter()
        .position(|child| child == target)
        .unwrap_or(children.len());
    let at = match position {
        Position::Top => index,
        _ => (index + 1).min(children.len()),
    };
    children.splice(at..at, ids);
    Ok(())
}

fn detach(tree: &mut BlockTree, ids: &[BlockId]) {
    let parents: Vec<BlockId> = ids
        .iter()
        .filter_map(|id| tree.parent_of(id).map(|parent| parent.id.clone()))
        .collect();
    for parent in parents {
        if let Some(block) = tree.get_mut(&parent) {
            block.children.retain(|child| !ids.contains(child));
        }
    }
}

/// Copies `id` and its descendants under fresh ids, returning the new root
fn copy_subtree(tree: &mut BlockTree, id: &str, ids: &mut BlockIds) -> RemoteResult<BlockId> {
    let source = tree
        .get(id)
        .cloned()
        .ok_or_else(|| RemoteError::ObjectNotFound(id.to_string()))?;
    let copy_id = ids.next(tree);
    // Reserve the id before recursing
    tree.insert(Block::new(copy_id.clone(), source.content.clone()));

    let mut children = Vec::with_capacity(source.children.len());
    for child in &source.children {
        if tree.contains(child) {
            children.push(copy_subtree(tree, child, ids)?);
        }
    }

    tree.insert(Block {
        id: copy_id.clone(),
        children,
        ..source
    });
    Ok(copy_id)
}

fn merge(tree: &mut BlockTree, previous: &str, next: &str) -> RemoteResult<()> {
    let tail = text_mut(tree, next)?.clone();
    let adopted = std::mem::take(&mut block_mut(tree, next)?.children);

    let head = text_mut(tree, previous)?;
    let offset = head.char_len();
    head.text.push_str(&tail.text);
    head.marks.extend(
        tail.marks
            .into_iter()
            .map(|mark| Mark::new(mark.kind, mark.from + offset, mark.to + offset)),
    );
    block_mut(tree, previous)?.children.extend(adopted);
    tree.remove(next)?;
    Ok(())
}

fn split(
    tree: &mut BlockTree,
    target: &str,
    range: std::ops::Range<usize>,
    style: Option<TextStyle>,
    ids: &mut BlockIds,
) -> RemoteResult<()> {
    let text = text_mut(tree, target)?;
    let len = text.char_len();
    let start = range.start.min(len);
    let end = range.end.clamp(start, len);

    let head: String = text.text.chars().take(start).collect();
    let tail: String = text.text.chars().skip(end).collect();
    let tail_marks: Vec<Mark> = text
        .marks
        .iter()
        .filter(|mark| mark.to > end)
        .map(|mark| Mark::new(mark.kind.clone(), mark.from.max(end) - end, mark.to - end))
        .filter(|mark| !mark.is_empty())
        .collect();
    text.marks = text
        .marks
        .iter()
        .filter(|mark| mark.from < start)
        .map(|mark| Mark::new(mark.kind.clone(), mark.from, mark.to.min(start)))
        .filter(|mark| !mark.is_empty())
        .collect();
    text.text = head;

    let current = text.style;
    let new_style = style.unwrap_or(match current {
        TextStyle::Title | TextStyle::Description | TextStyle::Header1
        | TextStyle::Header2 | TextStyle::Header3 | TextStyle::Header4 => TextStyle::Paragraph,
        other => other,
    });

    let id = ids.next(tree);
    let mut block = Block::text(id.clone(), new_style, tail).with_marks(tail_marks);
    if let Some(color) = text_mut(tree, target)?.color.clone() {
        if let Some(new_text) = block.as_text_mut() {
            new_text.color = Some(color);
        }
    }
    tree.insert(block);

    // Text split out of the header lands at the top of the body
    let anchor = match tree.parent_of(target) {
        Some(parent) if matches!(parent.content, Content::Layout { kind: LayoutKind::Header }) => {
            parent.id.clone()
        }
        _ => target.to_string(),
    };
    place(tree, &anchor, Position::Bottom, vec![id])
}

fn amend_details<'a>(doc: &mut Document, entries: impl IntoIterator<Item = (&'a str, Value)>) {
    let details: Struct = entries
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect();
    let id = doc.id.clone();
    doc.details.amend(id, &details);
}

fn unset_details(doc: &mut Document, keys: &[&str]) {
    let keys: Vec<String> = keys.iter().map(|key| key.to_string()).collect();
    doc.details.unset(&doc.id.clone(), &keys);
}

fn set_cover(doc: &mut Document, kind: CoverKind, id: &str) {
    amend_details(
        doc,
        [(keys::COVER_TYPE, json!(kind.code())), (keys::COVER_ID, json!(id))],
    );
}
