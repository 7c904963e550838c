//! Mark compositing and search highlighting.
//!
//! Stored marks may overlap, extend past the text or be empty. Rendering
//! normalizes them into a deterministic list: ranges are clamped to the
//! text, identical marks are merged, and the result is ordered by
//! `(from, to, layer)`.

use blocktree_model::{Mark, MarkKind};
use std::ops::Range;

/// Normalizes `marks` for a text of `len` characters
pub fn composite(marks: &[Mark], len: usize) -> Vec<Mark> {
    let mut groups: Vec<(&MarkKind, Vec<(usize, usize)>)> = Vec::new();

    for mark in marks {
        let from = mark.from.min(len);
        let to = mark.to.min(len);
        if from >= to {
            continue;
        }
        match groups.iter_mut().find(|(kind, _)| *kind == &mark.kind) {
            Some((_, ranges)) => ranges.push((from, to)),
            None => groups.push((&mark.kind, vec![(from, to)])),
        }
    }

    let mut result = Vec::new();
    for (kind, mut ranges) in groups {
        ranges.sort_unstable();
        let mut merged: Vec<(usize, usize)> = Vec::with_capacity(ranges.len());
        for (from, to) in ranges {
            match merged.last_mut() {
                Some(last) if from <= last.1 => last.1 = last.1.max(to),
                _ => merged.push((from, to)),
            }
        }
        result.extend(
            merged
                .into_iter()
                .map(|(from, to)| Mark::new(kind.clone(), from, to)),
        );
    }

    // Stable: equal keys keep first-seen order
    result.sort_by_key(|mark| (mark.from, mark.to, mark.kind.layer()));
    result
}

/// Case-insensitive, non-overlapping matches of `query` in `text`, as
/// character ranges
pub fn highlights(text: &str, query: &str) -> Vec<Range<usize>> {
    let needle: Vec<char> = query.chars().map(fold).collect();
    if needle.is_empty() {
        return Vec::new();
    }
    let folded: Vec<char> = text.chars().map(fold).collect();

    let mut found = Vec::new();
    let mut start = 0;
    while start + needle.len() <= folded.len() {
        if folded[start..start + needle.len()] == needle[..] {
            found.push(start..start + needle.len());
            start += needle.len();
        } else {
            start += 1;
        }
    }
    found
}

/// One char in, one char out, so folded positions stay character positions
fn fold(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_overlapping_identical_marks_merge() {
        let marks = vec![Mark::bold(4, 8), Mark::bold(0, 5), Mark::bold(8, 10)];
        assert_eq!(composite(&marks, 20), vec![Mark::bold(0, 10)]);
    }

    #[test]
    fn test_clamps_and_drops_empty() {
        let marks = vec![Mark::bold(2, 50), Mark::italic(3, 3), Mark::italic(9, 12)];
        assert_eq!(composite(&marks, 5), vec![Mark::bold(2, 5)]);
    }

    #[test]
    fn test_order_is_independent_of_input_order() {
        let color = Mark::new(
            MarkKind::TextColor {
                color: "red".into(),
            },
            0,
            4,
        );
        let a = composite(&[Mark::bold(0, 4), color.clone(), Mark::italic(1, 2)], 10);
        let b = composite(&[Mark::italic(1, 2), Mark::bold(0, 4), color.clone()], 10);
        assert_eq!(a, b);
        assert_eq!(a, vec![color, Mark::bold(0, 4), Mark::italic(1, 2)]);
    }

    #[test]
    fn test_highlights_case_insensitive() {
        assert_eq!(highlights("Hello hello HELLO", "hello"), vec![0..5, 6..11, 12..17]);
        assert_eq!(highlights("aaaa", "aa"), vec![0..2, 2..4]);
        assert!(highlights("text", "").is_empty());
    }

    #[test]
    fn test_highlights_count_characters() {
        assert_eq!(highlights("Ünïcode ünï", "ÜNÏ"), vec![0..3, 8..11]);
    }

    #[test]
    fn test_highlights_multi_char_lowercase() {
        // 'İ' lowercases to two chars
        assert_eq!(highlights("an İ", "İ"), vec![3..4]);
        assert_eq!(highlights("İİ x", "İİ"), vec![0..2]);
    }
}
