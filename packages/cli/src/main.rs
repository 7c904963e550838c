mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{diff, link, render, replay, DiffArgs, LinkArgs, RenderArgs, ReplayArgs};
use config::Config;
use tracing_subscriber::EnvFilter;

/// Blocktree CLI - render, diff and replay block documents
#[derive(Parser, Debug)]
#[command(name = "blocktree")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a document snapshot into its view list
    Render(RenderArgs),

    /// Show the per-position view changes between two snapshots
    Diff(DiffArgs),

    /// Resolve a deep link into its action
    Link(LinkArgs),

    /// Open a snapshot in an editor session and play a script of steps
    Replay(ReplayArgs),
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?.display().to_string();
    let config = Config::load(&cwd)?;
    init_tracing(&config);

    match cli.command {
        Command::Render(args) => render(args, &config),
        Command::Diff(args) => diff(args, &config),
        Command::Link(args) => link(args),
        Command::Replay(args) => replay(args, &config),
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
