use super::{load_snapshot, print_views, print_warnings, render_snapshot};
use crate::config::Config;
use anyhow::Result;
use blocktree_render::{Focus, RenderState, SearchQuery};
use chrono::NaiveDate;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct RenderArgs {
    /// Document snapshot (JSON)
    pub snapshot: PathBuf,

    /// Block to render as focused
    #[arg(long)]
    pub focus: Option<String>,

    /// Highlight matches of a search query
    #[arg(short, long)]
    pub query: Option<String>,

    /// Toggle blocks to render open (repeatable)
    #[arg(long = "open")]
    pub open: Vec<String>,

    /// Reference day for relative date names (YYYY-MM-DD)
    #[arg(long)]
    pub today: Option<NaiveDate>,

    /// Print views as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn render(args: RenderArgs, config: &Config) -> Result<()> {
    let snapshot = load_snapshot(&args.snapshot)?;

    let issues = snapshot.tree().validate();
    for issue in &issues {
        eprintln!("  {} {:?}", "⚠".yellow(), issue);
    }

    let mut state = RenderState::new().with_toggled(args.open);
    if let Some(id) = args.focus {
        state = state.with_focus(Focus::id(id));
    }
    if let Some(query) = args.query {
        state = state.with_search(SearchQuery::new(query));
    }

    let mut naming = config.editor.naming();
    naming.today = args.today;

    let output = render_snapshot(&snapshot, naming, state)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&output.views)?);
        return Ok(());
    }

    println!(
        "{} {} ({} views)",
        "Rendered".green().bold(),
        snapshot.root,
        output.views.len()
    );
    print_views(&output.views);
    print_warnings(&output.warnings);
    if output.layout_conflict {
        println!(
            "  {} featured relations differ from the type's recommendation",
            "⚠".yellow()
        );
    }

    Ok(())
}
