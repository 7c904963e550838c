//! End-to-end rendering of a snapshot, followed by patch and re-diff

use blocktree_model::{
    Block, DocumentSnapshot, Event, ObjectTypeStore, RelationStore, TextStyle,
};
use blocktree_render::{
    diff_views, BlockView, ChangeFlag, Cursor, Focus, ObjectRelationView, RelationState,
    RenderState, Renderer, TitleKind, ViewChange, ViewType,
};
use pretty_assertions::assert_eq;

const TASK: &str = r#"{
    "root": "task",
    "blocks": [
        { "id": "task", "content": { "type": "smart" }, "children": ["header", "intro", "n1", "n2", "status-block", "gone-block"] },
        { "id": "header", "content": { "type": "layout", "kind": "header" }, "children": ["featured", "title"] },
        { "id": "title", "content": { "type": "text", "style": "title", "text": "Ship it" } },
        { "id": "featured", "content": { "type": "featuredRelations" } },
        { "id": "intro", "content": { "type": "text", "style": "paragraph", "text": "Steps" } },
        { "id": "n1", "content": { "type": "text", "style": "numbered", "text": "Build" } },
        { "id": "n2", "content": { "type": "text", "style": "numbered", "text": "Test" } },
        { "id": "status-block", "content": { "type": "relation", "key": "status" } },
        { "id": "gone-block", "content": { "type": "relation", "key": "removed" } }
    ],
    "details": {
        "task": { "id": "task", "name": "Ship it", "type": "t-task", "resolvedLayout": 2,
                  "done": false, "status": "opt-open" },
        "opt-open": { "id": "opt-open", "name": "Open", "relationOptionColor": "blue" }
    },
    "relations": [
        { "id": "rel-type", "relationKey": "type", "name": "Object type", "relationFormat": 100 },
        { "id": "rel-status", "relationKey": "status", "name": "Status", "relationFormat": 3 }
    ],
    "objectTypes": [
        { "id": "t-task", "uniqueKey": "ot-task", "name": "Task",
          "recommendedFeaturedRelations": ["rel-type", "rel-status"] }
    ]
}"#;

struct Harness {
    snapshot: DocumentSnapshot,
    state: RenderState,
}

impl Harness {
    fn new() -> Self {
        let snapshot = DocumentSnapshot::from_json(TASK).unwrap();
        let relations = RelationStore::new();
        relations.merge(snapshot.relations.clone());
        let types = ObjectTypeStore::new();
        types.merge(snapshot.object_types.clone());
        let state = RenderState::new()
            .with_relations(relations.snapshot())
            .with_object_types(types.snapshot());
        Self { snapshot, state }
    }
}

#[test]
fn test_task_page_renders_in_document_order() {
    let harness = Harness::new();
    let output = Renderer::new()
        .render(&harness.snapshot.tree(), &harness.snapshot.details, &harness.state)
        .unwrap();

    let types: Vec<_> = output.views.iter().map(BlockView::view_type).collect();
    assert_eq!(
        types,
        vec![
            ViewType::TitleTodo,
            ViewType::FeaturedRelation,
            ViewType::Paragraph,
            ViewType::Numbered,
            ViewType::Numbered,
            ViewType::RelationRelated,
            ViewType::RelationDeleted,
        ]
    );
    assert!(!output.layout_conflict);

    let BlockView::FeaturedRelation(featured) = &output.views[1] else {
        panic!("expected featured relations");
    };
    let keys: Vec<_> = featured.relations.iter().map(ObjectRelationView::key).collect();
    assert_eq!(keys, vec!["type", "status"]);

    let BlockView::Relation(status) = &output.views[5] else {
        panic!("expected relation block");
    };
    let RelationState::Related {
        view: ObjectRelationView::Status { status, .. },
    } = &status.state
    else {
        panic!("expected a status value");
    };
    assert_eq!(status[0].status, "Open");
    assert_eq!(status[0].color.as_deref(), Some("blue"));
}

#[test]
fn test_edit_then_rerender_produces_minimal_changes() {
    let harness = Harness::new();
    let renderer = Renderer::new();
    let mut tree = harness.snapshot.tree();
    let mut details = harness.snapshot.details.clone();

    let before = renderer.render(&tree, &details, &harness.state).unwrap();

    tree.apply(&Event::UpdateText {
        id: "intro".into(),
        text: Some("Steps to ship".into()),
        marks: None,
        style: None,
        checked: None,
        color: None,
    })
    .unwrap();
    details.amend("task", &serde_json::from_str(r#"{ "done": true }"#).unwrap());
    let state = harness
        .state
        .clone()
        .with_focus(Focus::id("intro").with_cursor(Cursor::End));

    let after = renderer.render(&tree, &details, &state).unwrap();
    let changes = diff_views(&before.views, &after.views);

    assert_eq!(
        changes[0],
        ViewChange::Update {
            index: 0,
            payload: Some([ChangeFlag::TitleCheckboxChanged].into()),
        }
    );
    assert_eq!(
        changes[2],
        ViewChange::Update {
            index: 2,
            payload: Some(
                [
                    ChangeFlag::TextChanged,
                    ChangeFlag::FocusChanged,
                    ChangeFlag::CursorChanged,
                ]
                .into()
            ),
        }
    );
    assert!(changes
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != 0 && *i != 2)
        .all(|(_, change)| change.is_unchanged()));

    let BlockView::Title(title) = &after.views[0] else {
        panic!("expected title");
    };
    assert_eq!(title.kind, TitleKind::Todo { is_checked: true });
}

#[test]
fn test_prepended_numbered_item_extends_the_run() {
    let harness = Harness::new();
    let renderer = Renderer::new();
    let mut tree = harness.snapshot.tree();
    let details = &harness.snapshot.details;

    tree.insert(Block::text("n0", TextStyle::Numbered, "Plan"));
    tree.apply(&Event::UpdateStructure {
        id: "task".into(),
        children: ["header", "n0", "n1", "n2"].map(String::from).to_vec(),
    })
    .unwrap();

    let output = renderer.render(&tree, details, &harness.state).unwrap();
    let numbers: Vec<_> = output
        .views
        .iter()
        .filter_map(|view| match view {
            BlockView::Text(text) => Some((text.id.as_str(), text.kind.clone())),
            _ => None,
        })
        .collect();
    assert_eq!(
        numbers,
        vec![
            ("n0", blocktree_render::TextKind::Numbered { number: 1 }),
            ("n1", blocktree_render::TextKind::Numbered { number: 2 }),
            ("n2", blocktree_render::TextKind::Numbered { number: 3 }),
        ]
    );
}

#[test]
fn test_missing_relation_definition_is_reported() {
    let harness = Harness::new();
    let output = Renderer::new()
        .render(&harness.snapshot.tree(), &harness.snapshot.details, &harness.state)
        .unwrap();
    assert_eq!(
        output.warnings,
        vec![blocktree_render::RenderWarning::MissingRelation {
            key: "removed".into()
        }]
    );
}
