//! # Document Handle
//!
//! The editor's copy of one open object: block tree, details and
//! restrictions, merged from the open snapshot and every payload since.
//!
//! ## Lifecycle
//!
//! ```text
//! Open → Snapshot → Payload... → Render
//!   ↓        ↓          ↓           ↓
//! Remote  Document  apply()    BlockViews
//! ```

use crate::errors::{EditorError, EditorResult};
use blocktree_model::{
    BlockId, BlockTree, DocumentSnapshot, Event, ObjectRestriction, ObjectViewDetails, Payload,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Object id, also the root block id
    pub id: BlockId,

    /// Incremented on every applied payload
    pub version: u64,

    pub tree: BlockTree,
    pub details: ObjectViewDetails,
    pub restrictions: Vec<ObjectRestriction>,
}

impl Document {
    pub fn from_snapshot(snapshot: &DocumentSnapshot) -> Self {
        Self {
            id: snapshot.root.clone(),
            version: 0,
            tree: snapshot.tree(),
            details: snapshot.details.clone(),
            restrictions: snapshot.restrictions.clone(),
        }
    }

    /// Merge a payload. Either every event applies or the document is
    /// left untouched.
    pub fn apply(&mut self, payload: &Payload) -> EditorResult<()> {
        if payload.context != self.id {
            return Err(EditorError::ContextMismatch {
                document: self.id.clone(),
                payload: payload.context.clone(),
            });
        }
        if payload.is_empty() {
            return Ok(());
        }

        let mut next = self.clone();
        for event in &payload.events {
            next.apply_event(event)?;
        }
        next.version += 1;
        *self = next;
        Ok(())
    }

    fn apply_event(&mut self, event: &Event) -> EditorResult<()> {
        match event {
            Event::SetDetails { target, details } => self.details.set(target.clone(), details.clone()),
            Event::AmendDetails { target, details } => self.details.amend(target.clone(), details),
            Event::UnsetDetails { target, keys } => self.details.unset(target, keys),
            Event::SetRestrictions { restrictions } => self.restrictions = restrictions.clone(),
            structural => self.tree.apply(structural)?,
        }
        Ok(())
    }

    pub fn snapshot(&self) -> DocumentSnapshot {
        DocumentSnapshot::new(self.id.clone(), self.tree.blocks().cloned().collect())
            .with_details(self.details.clone())
            .with_restrictions(self.restrictions.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blocktree_model::{Block, Struct};
    use serde_json::json;

    fn document() -> Document {
        let snapshot = DocumentSnapshot::new(
            "page",
            vec![
                Block::smart("page").with_children(["a"]),
                Block::paragraph("a", "alpha"),
            ],
        );
        Document::from_snapshot(&snapshot)
    }

    #[test]
    fn test_apply_routes_detail_events() {
        let mut doc = document();
        let mut details = Struct::new();
        details.insert("name".into(), json!("Plan"));
        doc.apply(&Payload::new(
            "page",
            vec![
                Event::AmendDetails {
                    target: "page".into(),
                    details,
                },
                Event::SetRestrictions {
                    restrictions: vec![ObjectRestriction::Blocks],
                },
            ],
        ))
        .unwrap();

        assert_eq!(doc.version, 1);
        assert_eq!(doc.details.get("page").unwrap()["name"], json!("Plan"));
        assert_eq!(doc.restrictions, vec![ObjectRestriction::Blocks]);
    }

    #[test]
    fn test_failed_payload_leaves_document_untouched() {
        let mut doc = document();
        let before = doc.clone();
        let result = doc.apply(&Payload::new(
            "page",
            vec![
                Event::UpdateStructure {
                    id: "page".into(),
                    children: vec![],
                },
                Event::UpdateText {
                    id: "missing".into(),
                    text: Some("x".into()),
                    marks: None,
                    style: None,
                    checked: None,
                    color: None,
                },
            ],
        ));

        assert!(matches!(result, Err(EditorError::Tree(_))));
        assert_eq!(doc, before);
    }

    #[test]
    fn test_foreign_payload_is_rejected() {
        let mut doc = document();
        let result = doc.apply(&Payload::new("other", vec![]));
        assert!(matches!(result, Err(EditorError::ContextMismatch { .. })));
    }
}
