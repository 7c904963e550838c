//! Snapshot loading and payload merging over a realistic page

use blocktree_model::{
    Block, DocumentSnapshot, Event, LayoutKind, ObjectRestriction, Payload, TextStyle, TreeIssue,
};
use pretty_assertions::assert_eq;

const PAGE: &str = r#"{
    "root": "page",
    "blocks": [
        { "id": "page", "content": { "type": "smart" }, "children": ["header", "p1", "list"] },
        { "id": "header", "content": { "type": "layout", "kind": "header" }, "children": ["title", "featured"] },
        { "id": "title", "content": { "type": "text", "style": "title", "text": "Groceries" } },
        { "id": "featured", "content": { "type": "featuredRelations" } },
        { "id": "p1", "content": { "type": "text", "style": "paragraph", "text": "Buy:",
            "marks": [{ "from": 0, "to": 3, "type": "bold" }] },
          "fields": { "backgroundColor": "yellow" } },
        { "id": "list", "content": { "type": "text", "style": "numbered", "text": "Milk" } }
    ],
    "details": {
        "page": { "id": "page", "name": "Groceries", "type": ["t-page"], "resolvedLayout": 0 }
    },
    "restrictions": ["delete"]
}"#;

#[test]
fn test_load_page_snapshot() {
    let snapshot = DocumentSnapshot::from_json(PAGE).unwrap();
    let tree = snapshot.tree();

    assert_eq!(tree.len(), 6);
    assert!(tree.validate().is_empty());
    assert_eq!(tree.title().map(|b| b.id.as_str()), Some("title"));
    assert_eq!(
        tree.get("header").unwrap().content,
        blocktree_model::Content::Layout {
            kind: LayoutKind::Header
        }
    );
    assert_eq!(
        tree.get("p1").unwrap().fields.background_color(),
        Some("yellow")
    );
    assert_eq!(snapshot.restrictions, vec![ObjectRestriction::Delete]);
    assert_eq!(
        snapshot.details.object("page").unwrap().name(),
        Some("Groceries")
    );
}

#[test]
fn test_payload_sequence_keeps_tree_consistent() {
    let snapshot = DocumentSnapshot::from_json(PAGE).unwrap();
    let mut tree = snapshot.tree();

    let payload = Payload::new(
        "page",
        vec![
            Event::AddBlock {
                blocks: vec![Block::text("list2", TextStyle::Numbered, "Eggs")],
            },
            Event::UpdateStructure {
                id: "page".into(),
                children: vec!["header".into(), "p1".into(), "list".into(), "list2".into()],
            },
            Event::DeleteBlock {
                targets: vec!["p1".into()],
            },
        ],
    );

    for event in payload.events.iter().filter(|e| e.is_structural()) {
        tree.apply(event).unwrap();
    }

    assert_eq!(
        tree.children_of("page"),
        ["header".to_string(), "list".to_string(), "list2".to_string()]
    );
    assert_eq!(tree.validate(), Vec::<TreeIssue>::new());
}
