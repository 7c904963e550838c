//! Editor tuning knobs

use blocktree_render::naming::DEFAULT_SNIPPET_MAX_LENGTH;
use blocktree_render::{ObjectNaming, Placeholders};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorSettings {
    /// Quiet period before buffered text edits are sent
    pub text_debounce_ms: u64,
    pub snippet_max_length: usize,
    /// Undo depth kept by the in-memory remote
    pub history_depth: usize,
    pub placeholders: Placeholders,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            text_debounce_ms: 300,
            snippet_max_length: DEFAULT_SNIPPET_MAX_LENGTH,
            history_depth: 100,
            placeholders: Placeholders::default(),
        }
    }
}

impl EditorSettings {
    pub fn with_text_debounce(mut self, window: Duration) -> Self {
        self.text_debounce_ms = window.as_millis() as u64;
        self
    }

    pub fn with_history_depth(mut self, depth: usize) -> Self {
        self.history_depth = depth;
        self
    }

    pub fn with_placeholders(mut self, placeholders: Placeholders) -> Self {
        self.placeholders = placeholders;
        self
    }

    pub fn text_debounce(&self) -> Duration {
        Duration::from_millis(self.text_debounce_ms)
    }

    pub fn naming(&self) -> ObjectNaming {
        ObjectNaming::new(self.placeholders.clone())
            .with_snippet_max_length(self.snippet_max_length)
    }
}
