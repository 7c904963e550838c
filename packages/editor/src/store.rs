//! # Reactive stores
//!
//! Per-document state cells. Each [`Store`] holds the current value and
//! notifies subscribers when it changes. Writing a value equal to the
//! current one is a no-op, so subscribers only wake on real transitions.

use blocktree_model::{ObjectRestriction, ObjectViewDetails};
use blocktree_render::{BlockView, Focus, TextSelection};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tracing::debug;

#[derive(Debug)]
pub struct Store<T> {
    name: &'static str,
    state: watch::Sender<T>,
}

impl<T> Store<T>
where
    T: Clone + PartialEq + Send + Sync + std::fmt::Debug + 'static,
{
    pub fn new(name: &'static str, initial: T) -> Self {
        let (state, _) = watch::channel(initial);
        Self { name, state }
    }

    pub fn current(&self) -> T {
        self.state.borrow().clone()
    }

    /// Returns whether the value changed
    pub fn update(&self, value: T) -> bool {
        let changed = self.state.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        });
        if changed {
            debug!(store = self.name, value = ?*self.state.borrow(), "Store updated");
        }
        changed
    }

    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.state.subscribe()
    }

    /// Current value followed by every change
    pub fn stream(&self) -> WatchStream<T> {
        WatchStream::new(self.state.subscribe())
    }
}

/// The stores scoped to one open document
#[derive(Debug)]
pub struct EditorStores {
    pub focus: Store<Focus>,
    pub text_selection: Store<TextSelection>,
    pub screen: Store<Vec<BlockView>>,
    pub details: Store<ObjectViewDetails>,
    pub restrictions: Store<Vec<ObjectRestriction>>,
    pub layout_conflict: Store<bool>,
}

impl Default for EditorStores {
    fn default() -> Self {
        Self {
            focus: Store::new("focus", Focus::empty()),
            text_selection: Store::new("textSelection", TextSelection::empty()),
            screen: Store::new("screen", Vec::new()),
            details: Store::new("details", ObjectViewDetails::new()),
            restrictions: Store::new("restrictions", Vec::new()),
            layout_conflict: Store::new("layoutConflict", false),
        }
    }
}

impl EditorStores {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blocktree_render::Cursor;
    use futures::StreamExt;

    #[test]
    fn test_update_with_same_value_is_noop() {
        let store = Store::new("flag", false);
        let mut rx = store.subscribe();
        assert!(!store.update(false));
        assert!(!rx.has_changed().unwrap());
        assert!(store.update(true));
        assert!(rx.has_changed().unwrap());
        assert!(store.current());
    }

    #[tokio::test]
    async fn test_stream_yields_current_then_changes() {
        let stores = EditorStores::new();
        let mut stream = stores.focus.stream();
        assert_eq!(stream.next().await, Some(Focus::empty()));

        let focus = Focus::id("a").with_cursor(Cursor::End);
        stores.focus.update(focus.clone());
        assert_eq!(stream.next().await, Some(focus));
    }
}
