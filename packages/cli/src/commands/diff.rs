use super::{describe, describe_change, load_snapshot, render_snapshot};
use crate::config::Config;
use anyhow::Result;
use blocktree_render::{diff_views, RenderState, ViewChange};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct DiffArgs {
    /// Snapshot before the change
    pub old: PathBuf,

    /// Snapshot after the change
    pub new: PathBuf,

    /// Include unchanged positions
    #[arg(short, long)]
    pub all: bool,

    /// Print changes as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn diff(args: DiffArgs, config: &Config) -> Result<()> {
    let old = render_snapshot(&load_snapshot(&args.old)?, config.editor.naming(), RenderState::new())?;
    let new = render_snapshot(&load_snapshot(&args.new)?, config.editor.naming(), RenderState::new())?;

    let changes = diff_views(&old.views, &new.views);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&changes)?);
        return Ok(());
    }

    let mut changed = 0;
    for change in &changes {
        if change.is_unchanged() {
            if args.all {
                println!("  {}", describe_change(change).as_str().dimmed());
            }
            continue;
        }
        changed += 1;

        let line = describe_change(change);
        let line = match change {
            ViewChange::Insert { .. } => line.as_str().green(),
            ViewChange::Remove { .. } => line.as_str().red(),
            ViewChange::Replace { .. } => line.as_str().yellow(),
            _ => line.as_str().normal(),
        };
        println!("  {line}");

        let view = match change {
            ViewChange::Remove { index } => old.views.get(*index),
            other => new.views.get(other.index()),
        };
        if let Some(view) = view {
            println!("      {}", describe(change.index(), view).trim_start());
        }
    }

    if changed == 0 {
        println!("{} No visible changes", "✓".green());
    } else {
        println!("{} {} of {} positions changed", "✓".green(), changed, changes.len());
    }

    Ok(())
}
