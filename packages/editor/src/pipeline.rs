//! # Render Pipeline
//!
//! Runs the render half of the editing loop: Flatten → Diff
//!
//! The pipeline keeps the previous view list so every pass returns the
//! per-index changes the presentation layer needs for partial redraw.

use crate::document::Document;
use crate::errors::EditorResult;
use blocktree_render::{
    diff_views, BlockView, RenderState, RenderWarning, Renderer, ViewChange,
};

/// Manages the document → views pipeline
#[derive(Debug, Default)]
pub struct RenderPipeline {
    renderer: Renderer,
    last_views: Option<Vec<BlockView>>,
}

/// Result of one render pass
#[derive(Debug, Clone, PartialEq)]
pub struct RenderUpdate {
    /// Document version the views were rendered from
    pub version: u64,

    pub views: Vec<BlockView>,

    /// Changes against the previous pass. Every entry is an insert on the
    /// first pass.
    pub changes: Vec<ViewChange>,

    pub warnings: Vec<RenderWarning>,

    pub layout_conflict: bool,
}

impl RenderUpdate {
    /// True when nothing on screen changed
    pub fn is_unchanged(&self) -> bool {
        self.changes.iter().all(ViewChange::is_unchanged)
    }
}

impl RenderPipeline {
    pub fn new(renderer: Renderer) -> Self {
        Self {
            renderer,
            last_views: None,
        }
    }

    /// Render the document and diff against the previous pass
    pub fn render(&mut self, document: &Document, state: &RenderState) -> EditorResult<RenderUpdate> {
        let output = self
            .renderer
            .render(&document.tree, &document.details, state)?;

        let previous = self.last_views.as_deref().unwrap_or(&[]);
        let changes = diff_views(previous, &output.views);

        self.last_views = Some(output.views.clone());

        Ok(RenderUpdate {
            version: document.version,
            views: output.views,
            changes,
            warnings: output.warnings,
            layout_conflict: output.layout_conflict,
        })
    }

    /// Views from the last successful pass
    pub fn last_views(&self) -> Option<&[BlockView]> {
        self.last_views.as_deref()
    }

    /// Forget the previous pass (next render diffs against nothing)
    pub fn reset(&mut self) {
        self.last_views = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blocktree_model::{Block, DocumentSnapshot, Payload, Event};
    use blocktree_render::{ChangeFlag, ChangePayload};

    fn document() -> Document {
        Document::from_snapshot(&DocumentSnapshot::new(
            "page",
            vec![
                Block::smart("page").with_children(["a", "b"]),
                Block::paragraph("a", "alpha"),
                Block::paragraph("b", "beta"),
            ],
        ))
    }

    #[test]
    fn test_first_pass_inserts_everything() {
        let mut pipeline = RenderPipeline::default();
        let update = pipeline.render(&document(), &RenderState::new()).unwrap();
        assert_eq!(
            update.changes,
            vec![ViewChange::Insert { index: 0 }, ViewChange::Insert { index: 1 }]
        );
    }

    #[test]
    fn test_second_pass_reports_field_changes() {
        let mut pipeline = RenderPipeline::default();
        let mut doc = document();
        pipeline.render(&doc, &RenderState::new()).unwrap();

        doc.apply(&Payload::new(
            "page",
            vec![Event::UpdateText {
                id: "b".into(),
                text: Some("gamma".into()),
                marks: None,
                style: None,
                checked: None,
                color: None,
            }],
        ))
        .unwrap();
        let update = pipeline.render(&doc, &RenderState::new()).unwrap();

        assert_eq!(update.version, 1);
        assert_eq!(
            update.changes,
            vec![
                ViewChange::Unchanged { index: 0 },
                ViewChange::Update {
                    index: 1,
                    payload: Some(ChangePayload::from([ChangeFlag::TextChanged])),
                },
            ]
        );

        pipeline.reset();
        let update = pipeline.render(&doc, &RenderState::new()).unwrap();
        assert!(!update.is_unchanged());
    }
}
