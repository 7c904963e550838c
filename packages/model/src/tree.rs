//! # Block Tree
//!
//! Flat id-indexed block storage with a designated `Smart` root.
//!
//! ## Design
//!
//! The tree is stored flat, exactly as it arrives from the middleware.
//! Parent/child structure lives only in each block's `children` list, so
//! dangling ids, duplicate parents and cycles are representable. They are
//! reported by [`BlockTree::validate`] and tolerated by the renderer, never
//! repaired silently.

use crate::block::{Block, BlockId, Content};
use crate::errors::{TreeError, TreeResult};
use crate::payload::Event;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockTree {
    root: BlockId,
    blocks: HashMap<BlockId, Block>,
}

/// Structural inconsistency found by [`BlockTree::validate`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeIssue {
    Dangling { parent: BlockId, child: BlockId },
    DuplicateChild { parent: BlockId, child: BlockId },
    MultipleParents { child: BlockId, parents: Vec<BlockId> },
    Cycle { id: BlockId },
}

impl BlockTree {
    pub fn new(root: impl Into<BlockId>, blocks: impl IntoIterator<Item = Block>) -> Self {
        Self {
            root: root.into(),
            blocks: blocks.into_iter().map(|b| (b.id.clone(), b)).collect(),
        }
    }

    pub fn root_id(&self) -> &str {
        &self.root
    }

    pub fn root(&self) -> Option<&Block> {
        self.blocks.get(&self.root)
    }

    pub fn get(&self, id: &str) -> Option<&Block> {
        self.blocks.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Block> {
        self.blocks.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.blocks.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.values()
    }

    pub fn children_of(&self, id: &str) -> &[BlockId] {
        self.blocks
            .get(id)
            .map(|block| block.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn parent_of(&self, id: &str) -> Option<&Block> {
        self.blocks
            .values()
            .find(|block| block.children.iter().any(|child| child == id))
    }

    /// The title block, wherever the header layout placed it
    pub fn title(&self) -> Option<&Block> {
        self.blocks.values().find(|block| block.is_title())
    }

    /// True when `id` is `ancestor` or lies somewhere below it
    pub fn is_descendant(&self, id: &str, ancestor: &str) -> bool {
        let mut stack = vec![ancestor];
        let mut seen = HashSet::new();
        while let Some(current) = stack.pop() {
            if current == id {
                return true;
            }
            if !seen.insert(current) {
                continue;
            }
            stack.extend(self.children_of(current).iter().map(String::as_str));
        }
        false
    }

    pub fn insert(&mut self, block: Block) -> Option<Block> {
        self.blocks.insert(block.id.clone(), block)
    }

    /// Removes a block with its descendants and detaches it from its parent
    pub fn remove(&mut self, id: &str) -> TreeResult<Block> {
        if id == self.root {
            return Err(TreeError::RootRemoval(id.to_string()));
        }
        let block = self
            .blocks
            .remove(id)
            .ok_or_else(|| TreeError::BlockNotFound(id.to_string()))?;

        for parent in self.blocks.values_mut() {
            parent.children.retain(|child| child != id);
        }

        let mut pending = block.children.clone();
        while let Some(child) = pending.pop() {
            if let Some(removed) = self.blocks.remove(&child) {
                pending.extend(removed.children);
            }
        }
        Ok(block)
    }

    fn block_mut(&mut self, id: &str) -> TreeResult<&mut Block> {
        self.blocks
            .get_mut(id)
            .ok_or_else(|| TreeError::BlockNotFound(id.to_string()))
    }

    /// Merges one structural event. Detail and restriction events are ignored.
    pub fn apply(&mut self, event: &Event) -> TreeResult<()> {
        match event {
            Event::AddBlock { blocks } => {
                for block in blocks {
                    self.insert(block.clone());
                }
            }
            Event::DeleteBlock { targets } => {
                for target in targets {
                    // Descendants may already be gone with their parent
                    if self.contains(target) {
                        self.remove(target)?;
                    }
                }
            }
            Event::UpdateStructure { id, children } => {
                self.block_mut(id)?.children = children.clone();
            }
            Event::UpdateText {
                id,
                text,
                marks,
                style,
                checked,
                color,
            } => {
                let block = self.block_mut(id)?;
                let content = block
                    .as_text_mut()
                    .ok_or_else(|| TreeError::NotText(id.clone()))?;
                if let Some(text) = text {
                    content.text = text.clone();
                }
                if let Some(marks) = marks {
                    content.marks = marks.clone();
                }
                if let Some(style) = style {
                    content.style = *style;
                }
                if let Some(checked) = checked {
                    content.checked = *checked;
                }
                if let Some(color) = color {
                    content.color = Some(color.clone()).filter(|c| !c.is_empty());
                }
            }
            Event::UpdateFields { id, fields } => {
                self.block_mut(id)?.fields.merge(fields);
            }
            Event::UpdateBackgroundColor { id, color } => {
                let fields = &mut self.block_mut(id)?.fields;
                match color {
                    Some(color) => fields.insert(crate::Fields::BACKGROUND_COLOR, color.clone()),
                    None => {
                        fields.remove(crate::Fields::BACKGROUND_COLOR);
                    }
                }
            }
            Event::UpdateAlignment { id, align } => {
                let block = self.block_mut(id)?;
                let content = block
                    .as_text_mut()
                    .ok_or_else(|| TreeError::NotText(id.clone()))?;
                content.align = *align;
            }
            Event::UpdateLatex { id, latex } => {
                let block = self.block_mut(id)?;
                block.content = Content::Latex {
                    latex: latex.clone(),
                };
            }
            Event::UpdateDivider { id, style } => {
                self.block_mut(id)?.content = Content::Divider { style: *style };
            }
            Event::UpdateRelationKey { id, key } => {
                self.block_mut(id)?.content = Content::Relation {
                    key: Some(key.clone()),
                };
            }
            Event::UpdateFile { id, file } => {
                self.block_mut(id)?.content = Content::File(file.clone());
            }
            Event::SetDetails { .. }
            | Event::AmendDetails { .. }
            | Event::UnsetDetails { .. }
            | Event::SetRestrictions { .. } => {}
        }
        Ok(())
    }

    /// Walks the tree from the root and reports every inconsistency found
    pub fn validate(&self) -> Vec<TreeIssue> {
        let mut issues = Vec::new();
        let mut parents: HashMap<&str, Vec<&str>> = HashMap::new();

        for block in self.blocks.values() {
            let mut seen = HashSet::new();
            for child in &block.children {
                if !seen.insert(child.as_str()) {
                    issues.push(TreeIssue::DuplicateChild {
                        parent: block.id.clone(),
                        child: child.clone(),
                    });
                    continue;
                }
                if !self.contains(child) {
                    issues.push(TreeIssue::Dangling {
                        parent: block.id.clone(),
                        child: child.clone(),
                    });
                    continue;
                }
                parents.entry(child.as_str()).or_default().push(&block.id);
            }
        }

        let mut multi: Vec<_> = parents
            .into_iter()
            .filter(|(_, owners)| owners.len() > 1)
            .collect();
        multi.sort();
        for (child, mut owners) in multi {
            owners.sort();
            issues.push(TreeIssue::MultipleParents {
                child: child.to_string(),
                parents: owners.into_iter().map(str::to_string).collect(),
            });
        }

        let mut on_path = Vec::new();
        let mut done = HashSet::new();
        self.find_cycles(&self.root, &mut on_path, &mut done, &mut issues);
        issues
    }

    fn find_cycles<'a>(
        &'a self,
        id: &'a str,
        on_path: &mut Vec<&'a str>,
        done: &mut HashSet<&'a str>,
        issues: &mut Vec<TreeIssue>,
    ) {
        if on_path.contains(&id) {
            issues.push(TreeIssue::Cycle { id: id.to_string() });
            return;
        }
        if !done.insert(id) {
            return;
        }
        on_path.push(id);
        for child in self.children_of(id) {
            self.find_cycles(child, on_path, done, issues);
        }
        on_path.pop();
    }
}
