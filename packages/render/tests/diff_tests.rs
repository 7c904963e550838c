use blocktree_model::{Mark, MediaState, RelationFormat};
use blocktree_render::block_view::*;
use blocktree_render::view_differ::{payload, same_content, same_identity};
use blocktree_render::{
    ChangeFlag, ChangePayload, FileView, ObjectRelationView, ObjectView, StatusView, TagView,
    ViewDiff,
};
use pretty_assertions::assert_eq;

fn paragraph(id: &str, text: &str) -> TextView {
    TextView::new(id, TextKind::Paragraph, text)
}

fn title(id: &str, kind: TitleKind) -> TitleView {
    TitleView {
        id: id.into(),
        kind,
        text: "Title".into(),
        mode: Mode::Edit,
        is_focused: false,
        cursor: None,
        background: None,
        search_fields: vec![],
    }
}

fn basic_title(id: &str) -> TitleView {
    title(
        id,
        TitleKind::Basic {
            emoji: None,
            image: None,
        },
    )
}

fn description(id: &str) -> DescriptionView {
    DescriptionView {
        id: id.into(),
        text: "about".into(),
        mode: Mode::Edit,
        is_focused: false,
        cursor: None,
        search_fields: vec![],
    }
}

fn relation_block(id: &str, view: ObjectRelationView) -> BlockView {
    BlockView::Relation(RelationBlockView {
        id: id.into(),
        state: RelationState::Related { view },
        indent: 0,
        mode: Mode::Edit,
        is_selected: false,
        background: None,
    })
}

/// Payload at index 0 of single-entry lists
fn single(old: BlockView, new: BlockView) -> Option<ChangePayload> {
    ViewDiff::new(&[old], &[new]).payload(0, 0)
}

fn flags(flags: &[ChangeFlag]) -> Option<ChangePayload> {
    Some(flags.iter().copied().collect())
}

#[test]
fn test_different_ids_are_different_identity() {
    let old = BlockView::Text(paragraph("a", "same"));
    let new = BlockView::Text(paragraph("b", "same"));
    assert!(!same_identity(&old, &new));
}

#[test]
fn test_same_id_different_content() {
    let old = BlockView::Text(paragraph("a", "one"));
    let new = BlockView::Text(paragraph("a", "two"));
    assert!(same_identity(&old, &new));
    assert!(!same_content(&old, &new));
}

#[test]
fn test_same_id_different_view_type_has_no_payload() {
    let old = BlockView::Text(paragraph("a", "same"));
    let new = BlockView::Text(TextView::new("a", TextKind::HeaderOne, "same"));
    assert!(same_identity(&old, &new));
    assert!(!same_content(&old, &new));
    assert_eq!(payload(&old, &new), None);
}

#[test]
fn test_identical_entries() {
    let view = BlockView::Text(TextView::new("a", TextKind::HeaderOne, "same"));
    assert!(same_content(&view, &view.clone()));
    assert_eq!(payload(&view, &view.clone()), None);
}

#[test]
fn test_marks_only() {
    let old = paragraph("a", "text");
    let new = TextView {
        marks: vec![Mark::bold(0, 3)],
        ..old.clone()
    };
    assert_eq!(
        single(BlockView::Text(old), BlockView::Text(new)),
        flags(&[ChangeFlag::MarkupChanged])
    );
}

#[test]
fn test_text_only() {
    let old = paragraph("a", "a");
    let new = TextView {
        text: "b".into(),
        ..old.clone()
    };
    assert_eq!(
        single(BlockView::Text(old), BlockView::Text(new)),
        flags(&[ChangeFlag::TextChanged])
    );
}

#[test]
fn test_text_and_marks() {
    let old = paragraph("a", "a");
    let new = TextView {
        text: "b".into(),
        marks: vec![Mark::italic(0, 1)],
        ..old.clone()
    };
    assert_eq!(
        single(BlockView::Text(old), BlockView::Text(new)),
        flags(&[ChangeFlag::TextChanged, ChangeFlag::MarkupChanged])
    );
}

#[test]
fn test_number_bump() {
    let old = TextView::new("a", TextKind::Numbered { number: 1 }, "item");
    let new = TextView {
        kind: TextKind::Numbered { number: 2 },
        ..old.clone()
    };
    assert_eq!(
        single(BlockView::Text(old), BlockView::Text(new)),
        flags(&[ChangeFlag::NumberChanged])
    );
}

#[test]
fn test_background_color() {
    let old = paragraph("a", "x");
    let new = TextView {
        background: Some("red".into()),
        ..old.clone()
    };
    assert_eq!(
        single(BlockView::Text(old), BlockView::Text(new)),
        flags(&[ChangeFlag::BackgroundColorChanged])
    );
}

#[test]
fn test_indent() {
    let old = paragraph("a", "x");
    let new = TextView {
        indent: 1,
        ..old.clone()
    };
    assert_eq!(
        single(BlockView::Text(old), BlockView::Text(new)),
        flags(&[ChangeFlag::IndentChanged])
    );
}

#[test]
fn test_toggle_empty_state() {
    let old = TextView::new(
        "a",
        TextKind::Toggle {
            is_empty: true,
            is_toggled: false,
        },
        "x",
    );
    let new = TextView {
        kind: TextKind::Toggle {
            is_empty: false,
            is_toggled: false,
        },
        ..old.clone()
    };
    assert_eq!(
        single(BlockView::Text(old), BlockView::Text(new)),
        flags(&[ChangeFlag::ToggleEmptyStateChanged])
    );
}

#[test]
fn test_title_focus() {
    let old = basic_title("t");
    let new = TitleView {
        is_focused: true,
        ..old.clone()
    };
    assert_eq!(
        single(BlockView::Title(old), BlockView::Title(new)),
        flags(&[ChangeFlag::FocusChanged])
    );
}

#[test]
fn test_read_write_mode() {
    let old = paragraph("a", "x");
    let new = TextView {
        mode: Mode::Read,
        ..old.clone()
    };
    assert_eq!(
        single(BlockView::Text(old), BlockView::Text(new)),
        flags(&[ChangeFlag::ReadWriteModeChanged])
    );

    let old = basic_title("t");
    let new = TitleView {
        mode: Mode::Read,
        ..old.clone()
    };
    assert_eq!(
        single(BlockView::Title(old), BlockView::Title(new)),
        flags(&[ChangeFlag::ReadWriteModeChanged])
    );

    let old = description("d");
    let new = DescriptionView {
        mode: Mode::Read,
        ..old.clone()
    };
    assert_eq!(
        single(BlockView::Description(old), BlockView::Description(new)),
        flags(&[ChangeFlag::ReadWriteModeChanged])
    );
}

#[test]
fn test_selection_in_paragraph_and_media() {
    let old = paragraph("a", "x");
    let new = TextView {
        is_selected: true,
        ..old.clone()
    };
    assert_eq!(
        single(BlockView::Text(old), BlockView::Text(new)),
        flags(&[ChangeFlag::SelectionChanged])
    );

    let file = MediaView {
        id: "f".into(),
        kind: MediaKind::File {
            name: Some("report.pdf".into()),
            mime: None,
            size: Some(1024),
            target: Some("obj".into()),
        },
        state: MediaState::Done,
        indent: 0,
        mode: Mode::Edit,
        is_selected: false,
        background: None,
    };
    let selected = MediaView {
        is_selected: true,
        ..file.clone()
    };
    assert_eq!(
        single(BlockView::Media(file), BlockView::Media(selected)),
        flags(&[ChangeFlag::SelectionChanged])
    );
}

#[test]
fn test_selection_in_link_and_bookmark() {
    let link = LinkView {
        id: "l".into(),
        target: "obj".into(),
        kind: LinkKind::Default {
            name: "Page".into(),
            description: None,
            emoji: None,
            image: None,
            is_loading: false,
        },
        indent: 0,
        mode: Mode::Edit,
        is_selected: false,
        background: None,
    };
    let selected = LinkView {
        is_selected: true,
        ..link.clone()
    };
    assert_eq!(
        single(BlockView::LinkToObject(link), BlockView::LinkToObject(selected)),
        flags(&[ChangeFlag::SelectionChanged])
    );

    let bookmark = MediaView {
        id: "b".into(),
        kind: MediaKind::Bookmark {
            url: Some("https://example.org".into()),
            title: None,
            description: None,
            image: None,
            favicon: None,
        },
        state: MediaState::Done,
        indent: 0,
        mode: Mode::Edit,
        is_selected: true,
        background: None,
    };
    let deselected = MediaView {
        is_selected: false,
        ..bookmark.clone()
    };
    assert_eq!(
        single(BlockView::Media(bookmark), BlockView::Media(deselected)),
        flags(&[ChangeFlag::SelectionChanged])
    );
}

#[test]
fn test_cursor() {
    let old = paragraph("a", "hello");
    let new = TextView {
        cursor: Some(2),
        ..old.clone()
    };
    assert_eq!(
        single(BlockView::Text(old), BlockView::Text(new)),
        flags(&[ChangeFlag::CursorChanged])
    );

    let old = TitleView {
        is_focused: true,
        ..basic_title("t")
    };
    let new = TitleView {
        cursor: Some(2),
        ..old.clone()
    };
    assert_eq!(
        single(BlockView::Title(old), BlockView::Title(new)),
        flags(&[ChangeFlag::CursorChanged])
    );
}

#[test]
fn test_title_icon() {
    let old = title(
        "t",
        TitleKind::Basic {
            emoji: Some("🚀".into()),
            image: None,
        },
    );
    let new = title(
        "t",
        TitleKind::Basic {
            emoji: Some("🎉".into()),
            image: None,
        },
    );
    assert_eq!(
        single(BlockView::Title(old), BlockView::Title(new)),
        flags(&[ChangeFlag::TitleIconChanged])
    );

    let old = title("t", TitleKind::Profile { image: None });
    let new = title(
        "t",
        TitleKind::Profile {
            image: Some("avatar".into()),
        },
    );
    assert_eq!(
        single(BlockView::Title(old), BlockView::Title(new)),
        flags(&[ChangeFlag::TitleIconChanged])
    );
}

#[test]
fn test_link_loading_state() {
    let loading = LinkView {
        id: "l".into(),
        target: "obj".into(),
        kind: LinkKind::Default {
            name: String::new(),
            description: None,
            emoji: None,
            image: None,
            is_loading: true,
        },
        indent: 0,
        mode: Mode::Edit,
        is_selected: false,
        background: None,
    };
    let loaded = LinkView {
        kind: LinkKind::Default {
            name: String::new(),
            description: None,
            emoji: None,
            image: None,
            is_loading: false,
        },
        ..loading.clone()
    };
    assert_eq!(
        single(BlockView::LinkToObject(loading), BlockView::LinkToObject(loaded)),
        flags(&[ChangeFlag::LoadingStateChanged])
    );
}

#[test]
fn test_search_highlight() {
    let old = paragraph("a", "find me");
    let new = TextView {
        search_fields: vec![SearchField {
            highlights: vec![0..4],
            target: None,
        }],
        ..old.clone()
    };
    assert_eq!(
        single(BlockView::Text(old), BlockView::Text(new)),
        flags(&[ChangeFlag::SearchHighlightChanged])
    );
}

#[test]
fn test_todo_title_checkbox() {
    let old = title("t", TitleKind::Todo { is_checked: false });
    let new = title("t", TitleKind::Todo { is_checked: true });
    assert_eq!(
        single(BlockView::Title(old), BlockView::Title(new)),
        flags(&[ChangeFlag::TitleCheckboxChanged])
    );
}

#[test]
fn test_latex() {
    let old = LatexView {
        id: "l".into(),
        latex: "x^2".into(),
        indent: 0,
        mode: Mode::Edit,
        is_selected: false,
        background: None,
    };
    let new = LatexView {
        latex: "x^3".into(),
        ..old.clone()
    };
    assert_eq!(
        single(BlockView::Latex(old), BlockView::Latex(new)),
        flags(&[ChangeFlag::LatexChanged])
    );
}

fn default_relation(name: &str, value: Option<&str>) -> ObjectRelationView {
    ObjectRelationView::Default {
        id: "rel".into(),
        key: "rel".into(),
        name: name.into(),
        value: value.map(str::to_string),
        format: RelationFormat::ShortText,
    }
}

#[test]
fn test_relation_name() {
    assert_eq!(
        single(
            relation_block("r", default_relation("Name", Some("v"))),
            relation_block("r", default_relation("Renamed", Some("v"))),
        ),
        flags(&[ChangeFlag::RelationNameChanged])
    );
}

#[test]
fn test_relation_default_value() {
    assert_eq!(
        single(
            relation_block("r", default_relation("Name", Some("old"))),
            relation_block("r", default_relation("Name", Some("new"))),
        ),
        flags(&[ChangeFlag::RelationValueChanged])
    );
}

#[test]
fn test_relation_checkbox_value() {
    let checkbox = |is_checked| ObjectRelationView::Checkbox {
        id: "rel".into(),
        key: "done".into(),
        name: "Done".into(),
        is_checked,
    };
    assert_eq!(
        single(relation_block("r", checkbox(false)), relation_block("r", checkbox(true))),
        flags(&[ChangeFlag::RelationValueChanged])
    );
}

#[test]
fn test_relation_status_value() {
    let status = |name: &str| ObjectRelationView::Status {
        id: "rel".into(),
        key: "status".into(),
        name: "Status".into(),
        status: vec![StatusView {
            id: "opt".into(),
            status: name.into(),
            color: Some("teal".into()),
        }],
    };
    assert_eq!(
        single(relation_block("r", status("Open")), relation_block("r", status("Closed"))),
        flags(&[ChangeFlag::RelationValueChanged])
    );
}

#[test]
fn test_relation_tag_value() {
    let tags = |tags: Vec<TagView>| ObjectRelationView::Tags {
        id: "rel".into(),
        key: "tag".into(),
        name: "Tag".into(),
        tags,
    };
    let one = TagView {
        id: "t1".into(),
        tag: "rust".into(),
        color: None,
    };
    let two = TagView {
        id: "t2".into(),
        tag: "async".into(),
        color: Some("red".into()),
    };
    assert_eq!(
        single(
            relation_block("r", tags(vec![one.clone()])),
            relation_block("r", tags(vec![one, two])),
        ),
        flags(&[ChangeFlag::RelationValueChanged])
    );
}

#[test]
fn test_relation_object_value() {
    let objects = |objects: Vec<ObjectView>| ObjectRelationView::Object {
        id: "rel".into(),
        key: "assignee".into(),
        name: "Assignee".into(),
        objects,
    };
    assert_eq!(
        single(
            relation_block(
                "r",
                objects(vec![ObjectView::Default {
                    id: "o".into(),
                    name: "Ann".into(),
                    layout: None,
                }])
            ),
            relation_block("r", objects(vec![ObjectView::Deleted { id: "o".into() }])),
        ),
        flags(&[ChangeFlag::RelationValueChanged])
    );
}

#[test]
fn test_relation_file_value() {
    let files = |files: Vec<FileView>| ObjectRelationView::File {
        id: "rel".into(),
        key: "attachments".into(),
        name: "Attachments".into(),
        files,
    };
    assert_eq!(
        single(
            relation_block("r", files(vec![])),
            relation_block(
                "r",
                files(vec![FileView {
                    id: "f".into(),
                    name: "scan".into(),
                    ext: Some("pdf".into()),
                }])
            ),
        ),
        flags(&[ChangeFlag::RelationValueChanged])
    );
}

#[test]
fn test_featured_row_value_change() {
    let featured = |count| {
        BlockView::FeaturedRelation(FeaturedRelationView {
            id: "featured".into(),
            relations: vec![ObjectRelationView::LinksBacklinks {
                id: "rel-backlinks".into(),
                key: "backlinks".into(),
                name: "Backlinks".into(),
                count,
            }],
            has_feature_properties_conflict: false,
        })
    };
    assert_eq!(
        single(featured(1), featured(2)),
        flags(&[ChangeFlag::RelationValueChanged])
    );
}

#[test]
fn test_toggle_open_state_rebinds() {
    let closed = TextView::new(
        "a",
        TextKind::Toggle {
            is_empty: false,
            is_toggled: false,
        },
        "x",
    );
    let open = TextView {
        kind: TextKind::Toggle {
            is_empty: false,
            is_toggled: true,
        },
        ..closed.clone()
    };
    assert_eq!(single(BlockView::Text(closed), BlockView::Text(open)), None);
}
