//! # Document Delta
//!
//! Computes the events that turn one [`Document`] state into another.
//! Used to build command payloads and undo/redo restore payloads.
//!
//! ## Event order
//!
//! ```text
//! UpdateStructure (deleted parents keep only deleted children)
//! DeleteBlock     (removed ids)
//! AddBlock        (new blocks and blocks changed beyond a granular event)
//! UpdateStructure / UpdateText / UpdateAlignment / UpdateFields
//! AmendDetails / UnsetDetails / SetRestrictions
//! ```
//!
//! Deleting a block drops its descendants on the receiving side, so a
//! deleted block first loses any child that survives elsewhere.

use crate::document::Document;
use blocktree_model::{Block, BlockId, Content, Event, Fields, Struct};
use serde_json::Value;
use std::collections::{BTreeSet, HashSet};

pub fn delta(before: &Document, after: &Document) -> Vec<Event> {
    let mut events = Vec::new();

    let before_ids: BTreeSet<&str> = before.tree.blocks().map(|b| b.id.as_str()).collect();
    let after_ids: BTreeSet<&str> = after.tree.blocks().map(|b| b.id.as_str()).collect();

    let deleted: Vec<&str> = before_ids.difference(&after_ids).copied().collect();
    let deleted_set: HashSet<&str> = deleted.iter().copied().collect();

    for id in &deleted {
        let children = before.tree.children_of(id);
        if children.iter().any(|child| !deleted_set.contains(child.as_str())) {
            events.push(Event::UpdateStructure {
                id: id.to_string(),
                children: children
                    .iter()
                    .filter(|child| deleted_set.contains(child.as_str()))
                    .cloned()
                    .collect(),
            });
        }
    }
    if !deleted.is_empty() {
        events.push(Event::DeleteBlock {
            targets: deleted.iter().map(|id| id.to_string()).collect(),
        });
    }

    let mut replaced: Vec<Block> = Vec::new();
    let mut granular: Vec<Event> = Vec::new();

    for id in &after_ids {
        let Some(new) = after.tree.get(id) else {
            continue;
        };
        match before.tree.get(id) {
            None => replaced.push(new.clone()),
            Some(old) if old == new => {}
            Some(old) => match block_events(old, new) {
                Some(mut events) => granular.append(&mut events),
                None => replaced.push(new.clone()),
            },
        }
    }

    if !replaced.is_empty() {
        events.push(Event::AddBlock { blocks: replaced });
    }
    events.append(&mut granular);

    details_events(before, after, &mut events);

    if before.restrictions != after.restrictions {
        events.push(Event::SetRestrictions {
            restrictions: after.restrictions.clone(),
        });
    }

    events
}

/// Granular events for a changed block, `None` when only a full
/// replacement expresses the change
fn block_events(old: &Block, new: &Block) -> Option<Vec<Event>> {
    let mut events = Vec::new();

    if old.content != new.content {
        let (Content::Text(before), Content::Text(after)) = (&old.content, &new.content) else {
            return None;
        };
        if before.icon_emoji != after.icon_emoji {
            return None;
        }
        let text_changed = before.text != after.text
            || before.marks != after.marks
            || before.style != after.style
            || before.checked != after.checked
            || before.color != after.color;
        if text_changed {
            events.push(Event::UpdateText {
                id: new.id.clone(),
                text: (before.text != after.text).then(|| after.text.clone()),
                marks: (before.marks != after.marks).then(|| after.marks.clone()),
                style: (before.style != after.style).then_some(after.style),
                checked: (before.checked != after.checked).then_some(after.checked),
                color: (before.color != after.color)
                    .then(|| after.color.clone().unwrap_or_default()),
            });
        }
        if before.align != after.align {
            events.push(Event::UpdateAlignment {
                id: new.id.clone(),
                align: after.align,
            });
        }
    }

    if old.fields != new.fields {
        // A null value removes the key on merge
        let mut changed = Fields::default();
        for (key, value) in new.fields.iter() {
            if old.fields.get(key) != Some(value) {
                changed.insert(key.clone(), value.clone());
            }
        }
        for (key, _) in old.fields.iter() {
            if !new.fields.contains(key) {
                changed.insert(key.clone(), Value::Null);
            }
        }
        events.push(Event::UpdateFields {
            id: new.id.clone(),
            fields: changed,
        });
    }

    if old.children != new.children {
        events.push(Event::UpdateStructure {
            id: new.id.clone(),
            children: new.children.clone(),
        });
    }

    Some(events)
}

fn details_events(before: &Document, after: &Document, events: &mut Vec<Event>) {
    let empty = Struct::new();
    let targets: BTreeSet<&BlockId> = before
        .details
        .details
        .keys()
        .chain(after.details.details.keys())
        .collect();

    for target in targets {
        let old = before.details.get(target).unwrap_or(&empty);
        let new = after.details.get(target).unwrap_or(&empty);
        if old == new {
            continue;
        }
        let amended: Struct = new
            .iter()
            .filter(|(key, value)| old.get(*key) != Some(*value))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        let unset: Vec<String> = old
            .keys()
            .filter(|key| !new.contains_key(*key))
            .cloned()
            .collect();

        if !amended.is_empty() {
            events.push(Event::AmendDetails {
                target: target.clone(),
                details: amended,
            });
        }
        if !unset.is_empty() {
            events.push(Event::UnsetDetails {
                target: target.clone(),
                keys: unset,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blocktree_model::{DocumentSnapshot, Mark, Payload, TextStyle};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn document(blocks: Vec<Block>) -> Document {
        Document::from_snapshot(&DocumentSnapshot::new("page", blocks))
    }

    fn replay(before: &Document, after: &Document) -> Document {
        let mut doc = before.clone();
        doc.apply(&Payload::new("page", delta(before, after))).unwrap();
        doc
    }

    #[test]
    fn test_text_change_is_granular() {
        let before = document(vec![
            Block::smart("page").with_children(["a"]),
            Block::paragraph("a", "alpha"),
        ]);
        let mut after = before.clone();
        let text = after.tree.get_mut("a").unwrap().as_text_mut().unwrap();
        text.text = "alphabet".into();
        text.marks = vec![Mark::bold(0, 5)];

        assert_eq!(
            delta(&before, &after),
            vec![Event::UpdateText {
                id: "a".into(),
                text: Some("alphabet".into()),
                marks: Some(vec![Mark::bold(0, 5)]),
                style: None,
                checked: None,
                color: None,
            }]
        );
    }

    #[test]
    fn test_deleting_a_parent_keeps_adopted_children() {
        let before = document(vec![
            Block::smart("page").with_children(["a", "b"]),
            Block::paragraph("a", "alpha"),
            Block::text("b", TextStyle::Toggle, "beta").with_children(["c"]),
            Block::paragraph("c", "gamma"),
        ]);
        let mut after = before.clone();
        after.tree.get_mut("b").unwrap().children.clear();
        after.tree.get_mut("a").unwrap().children.push("c".into());
        after.tree.remove("b").unwrap();

        let restored = replay(&before, &after);
        assert_eq!(restored.tree, after.tree);
        assert!(restored.tree.contains("c"));
    }

    #[test]
    fn test_replay_reaches_target_state() {
        let before = document(vec![
            Block::smart("page").with_children(["a"]),
            Block::paragraph("a", "alpha").with_field("backgroundColor", "red"),
        ]);
        let mut after = before.clone();
        after.tree.get_mut("a").unwrap().fields.remove("backgroundColor");
        after.tree.insert(Block::new("d", Content::Latex { latex: "x^2".into() }));
        after.tree.get_mut("page").unwrap().children.push("d".into());
        after.details.amend("page", &Struct::from([("name".to_string(), json!("Plan"))]));

        assert_eq!(replay(&before, &after), Document { version: 1, ..after.clone() });

        // and back again
        let mut undone = after.clone();
        undone
            .apply(&Payload::new("page", delta(&after, &before)))
            .unwrap();
        assert_eq!(undone.tree, before.tree);
        assert_eq!(undone.details.get("page"), Some(&Struct::new()));
    }
}
