use anyhow::Result;
use blocktree_workspace::{resolve, DeepLinkAction};
use clap::Args;
use colored::Colorize;

#[derive(Debug, Args)]
pub struct LinkArgs {
    /// Deep link to resolve
    pub url: String,
}

pub fn link(args: LinkArgs) -> Result<()> {
    let action = resolve(&args.url);

    match &action {
        DeepLinkAction::Unknown => println!("{} Unrecognized link", "✗".yellow()),
        _ => println!("{}", serde_json::to_string_pretty(&action)?),
    }

    Ok(())
}
