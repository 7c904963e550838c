//! Keystroke batching for text edits.
//!
//! Every keystroke re-arms a single deadline. When it passes, or when the
//! session forces it (focus loss, close), the latest text of each edited
//! block is sent as one `UpdateText` command.

use blocktree_model::{BlockId, Mark};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, PartialEq)]
pub struct PendingText {
    pub block: BlockId,
    pub text: String,
    pub marks: Vec<Mark>,
}

#[derive(Debug)]
pub struct TextDebouncer {
    window: Duration,
    /// One entry per block, in order of first edit
    pending: Vec<PendingText>,
    deadline: Option<Instant>,
}

impl TextDebouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: Vec::new(),
            deadline: None,
        }
    }

    /// Buffer the latest text of a block and re-arm the deadline
    pub fn push(&mut self, block: impl Into<BlockId>, text: impl Into<String>, marks: Vec<Mark>) {
        let block = block.into();
        let text = text.into();
        match self.pending.iter_mut().find(|pending| pending.block == block) {
            Some(pending) => {
                pending.text = text;
                pending.marks = marks;
            }
            None => self.pending.push(PendingText { block, text, marks }),
        }
        self.deadline = Some(Instant::now() + self.window);
    }

    /// Drop everything buffered
    pub fn cancel(&mut self) {
        self.pending.clear();
        self.deadline = None;
    }

    /// Drain buffered edits in insertion order
    pub fn flush(&mut self) -> Vec<PendingText> {
        self.deadline = None;
        std::mem::take(&mut self.pending)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Completes at `deadline`, never when there is none
pub async fn expired(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_push_rearms_deadline_and_keeps_latest_text() {
        let mut debouncer = TextDebouncer::new(Duration::from_millis(300));
        debouncer.push("a", "h", vec![]);
        let first = debouncer.deadline().unwrap();

        tokio::time::advance(Duration::from_millis(200)).await;
        debouncer.push("b", "x", vec![]);
        debouncer.push("a", "hi", vec![Mark::bold(0, 2)]);
        assert!(debouncer.deadline().unwrap() > first);

        let flushed = debouncer.flush();
        assert_eq!(flushed.len(), 2);
        assert_eq!(flushed[0].block, "a");
        assert_eq!(flushed[0].text, "hi");
        assert_eq!(flushed[1].block, "b");
        assert!(debouncer.deadline().is_none());
        assert!(debouncer.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_waits_for_deadline() {
        let mut debouncer = TextDebouncer::new(Duration::from_millis(300));
        debouncer.push("a", "h", vec![]);
        let start = Instant::now();
        expired(debouncer.deadline()).await;
        assert!(start.elapsed() >= Duration::from_millis(300));

        debouncer.cancel();
        let never = tokio::time::timeout(Duration::from_secs(5), expired(debouncer.deadline()));
        assert!(never.await.is_err());
    }
}
