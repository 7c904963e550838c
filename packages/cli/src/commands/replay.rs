use super::{describe_change, load_snapshot, print_views};
use crate::config::Config;
use anyhow::{Context, Result};
use blocktree_editor::{
    Command, Coordinator, EditorResult, HistoryResult, Intent, MemoryRemote, RenderUpdate,
    SessionHandle,
};
use blocktree_model::{BlockId, DocumentSnapshot};
use blocktree_render::{BlockView, SearchQuery};
use blocktree_workspace::Workspace;
use clap::Args;
use colored::Colorize;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast;

#[derive(Debug, Args)]
pub struct ReplayArgs {
    /// Document snapshot (JSON)
    pub snapshot: PathBuf,

    /// Script of steps (JSON array)
    pub script: PathBuf,

    /// Only print the final views
    #[arg(short, long)]
    pub quiet: bool,
}

/// One scripted user action
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "step", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Step {
    Dispatch {
        command: Command,
    },
    Undo,
    Redo,
    Focus {
        id: BlockId,
        #[serde(default = "focused")]
        has_focus: bool,
    },
    Type {
        id: BlockId,
        text: String,
    },
    Toggle {
        id: BlockId,
    },
    Search {
        query: Option<String>,
    },
    HideKeyboard,
    OutsideClick,
}

fn focused() -> bool {
    true
}

impl Step {
    fn label(&self) -> String {
        match self {
            Step::Dispatch { command } => command.name().to_string(),
            Step::Undo => "undo".to_string(),
            Step::Redo => "redo".to_string(),
            Step::Focus { id, has_focus: true } => format!("focus {id}"),
            Step::Focus { id, has_focus: false } => format!("blur {id}"),
            Step::Type { id, text } => format!("type {id} {text:?}"),
            Step::Toggle { id } => format!("toggle {id}"),
            Step::Search { query: Some(query) } => format!("search {query:?}"),
            Step::Search { query: None } => "clear search".to_string(),
            Step::HideKeyboard => "hide keyboard".to_string(),
            Step::OutsideClick => "outside click".to_string(),
        }
    }
}

pub fn load_script(path: &Path) -> Result<Vec<Step>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid script in {}", path.display()))
}

pub fn replay(args: ReplayArgs, config: &Config) -> Result<()> {
    let snapshot = load_snapshot(&args.snapshot)?;
    let steps = load_script(&args.script)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    let views = runtime.block_on(run(snapshot, steps, config, args.quiet))?;

    println!();
    println!("{} Final document ({} views)", "✓".green(), views.len());
    print_views(&views);
    Ok(())
}

/// Open the snapshot in a session, play every step and return the views
/// left on screen after the session closed.
pub async fn run(
    snapshot: DocumentSnapshot,
    steps: Vec<Step>,
    config: &Config,
    quiet: bool,
) -> Result<Vec<BlockView>> {
    let root = snapshot.root.clone();
    let remote = Arc::new(MemoryRemote::new(config.editor.history_depth));
    remote.insert(snapshot);

    let workspace =
        Workspace::new(Coordinator::new(remote)).with_settings(config.editor.clone());
    let session = workspace
        .open(&root)
        .await
        .with_context(|| format!("Failed to open document {root}"))?;
    let mut updates = session.updates();

    if !quiet {
        println!("{} Opened {}", "✓".green(), root);
    }

    for (number, step) in steps.into_iter().enumerate() {
        let label = step.label();
        match play(&session, step).await {
            Ok(note) if !quiet => {
                println!("{} {:>3} {} {}", "▸".blue(), number + 1, label, note.dimmed())
            }
            Ok(_) => {}
            Err(err) => println!("{} {:>3} {} - {}", "✗".red(), number + 1, label, err),
        }
        print_updates(&mut updates, quiet);
    }

    workspace.shutdown().await;
    print_updates(&mut updates, quiet);

    Ok(session.stores().screen.current())
}

async fn play(session: &SessionHandle, step: Step) -> EditorResult<&'static str> {
    match step {
        Step::Dispatch { command } => session.dispatch(command).await.map(|payload| {
            if payload.is_empty() {
                "(no change)"
            } else {
                ""
            }
        }),
        Step::Undo => session.undo().await.map(history_note),
        Step::Redo => session.redo().await.map(history_note),
        Step::Focus { id, has_focus } => session.focus(id, has_focus).await.map(|_| ""),
        Step::Type { id, text } => session.text_changed(id, text, vec![]).await.map(|_| ""),
        Step::Toggle { id } => session.send(Intent::Toggle { id }).await.map(|_| ""),
        Step::Search { query } => session
            .send(Intent::Search(query.map(SearchQuery::new)))
            .await
            .map(|_| ""),
        Step::HideKeyboard => session.hide_keyboard().await.map(|_| ""),
        Step::OutsideClick => session.outside_click().await.map(|_| ""),
    }
}

fn history_note(result: HistoryResult) -> &'static str {
    if result.is_exhausted() {
        "(nothing left)"
    } else {
        ""
    }
}

fn print_updates(updates: &mut broadcast::Receiver<RenderUpdate>, quiet: bool) {
    while let Ok(update) = updates.try_recv() {
        if quiet || update.is_unchanged() {
            continue;
        }
        println!("      v{}", update.version);
        for change in update.changes.iter().filter(|change| !change.is_unchanged()) {
            println!("        {}", describe_change(change));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::snapshot;
    use blocktree_render::TextKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_script() {
        let script = r#"[
            { "step": "focus", "id": "a" },
            { "step": "type", "id": "a", "text": "alphabet" },
            { "step": "dispatch", "command": { "type": "updateCheckbox", "target": "a", "isChecked": true } },
            { "step": "undo" },
            { "step": "search", "query": null }
        ]"#;

        let steps: Vec<Step> = serde_json::from_str(script).unwrap();
        assert_eq!(
            steps[0],
            Step::Focus {
                id: "a".into(),
                has_focus: true
            }
        );
        assert_eq!(steps[2].label(), "updateCheckbox");
        assert_eq!(steps[3], Step::Undo);
        assert_eq!(steps[4].label(), "clear search");
    }

    #[tokio::test]
    async fn test_replay_applies_steps_in_order() {
        let steps: Vec<Step> = serde_json::from_str(
            r#"[
                { "step": "type", "id": "a", "text": "alphabet" },
                { "step": "dispatch", "command": { "type": "updateStyle", "targets": ["a"], "style": "header1" } },
                { "step": "dispatch", "command": { "type": "updateStyle", "targets": ["a"], "style": "quote" } },
                { "step": "undo" }
            ]"#,
        )
        .unwrap();

        let views = run(snapshot(), steps, &Config::default(), true).await.unwrap();

        let a = views.iter().find(|view| view.id() == "a").unwrap();
        assert_eq!(a.text(), Some("alphabet"));
        assert!(matches!(a, BlockView::Text(text) if text.kind == TextKind::HeaderOne));
    }
}
