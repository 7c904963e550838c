use serde::{Deserialize, Serialize};

/// Inline decoration over the half-open character range `[from, to)`.
///
/// Marks may overlap freely. Compositing them into a stable order is done
/// at render time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Mark {
    pub from: usize,
    pub to: usize,
    #[serde(flatten)]
    pub kind: MarkKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum MarkKind {
    Bold,
    Italic,
    Strikethrough,
    Underline,
    Keyboard,
    TextColor { color: String },
    BackgroundColor { color: String },
    Link { url: String },
    Mention { target: String },
    Object { target: String },
    Emoji { emoji: String },
}

impl MarkKind {
    /// Layering order when marks cover the same range. Lower layers are
    /// applied first.
    pub fn layer(&self) -> u8 {
        match self {
            MarkKind::BackgroundColor { .. } => 0,
            MarkKind::TextColor { .. } => 1,
            MarkKind::Bold => 2,
            MarkKind::Italic => 3,
            MarkKind::Underline => 4,
            MarkKind::Strikethrough => 5,
            MarkKind::Keyboard => 6,
            MarkKind::Link { .. } => 7,
            MarkKind::Object { .. } => 8,
            MarkKind::Mention { .. } => 9,
            MarkKind::Emoji { .. } => 10,
        }
    }
}

impl Mark {
    pub fn new(kind: MarkKind, from: usize, to: usize) -> Self {
        Self { from, to, kind }
    }

    pub fn bold(from: usize, to: usize) -> Self {
        Self::new(MarkKind::Bold, from, to)
    }

    pub fn italic(from: usize, to: usize) -> Self {
        Self::new(MarkKind::Italic, from, to)
    }

    pub fn link(url: impl Into<String>, from: usize, to: usize) -> Self {
        Self::new(MarkKind::Link { url: url.into() }, from, to)
    }

    pub fn mention(target: impl Into<String>, from: usize, to: usize) -> Self {
        Self::new(
            MarkKind::Mention {
                target: target.into(),
            },
            from,
            to,
        )
    }

    pub fn is_empty(&self) -> bool {
        self.from >= self.to
    }

    pub fn overlaps(&self, other: &Mark) -> bool {
        self.from < other.to && other.from < self.to
    }
}
