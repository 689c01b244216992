//! hotplate CLI entry point
//!
//! Parses arguments, runs the command and prints failures with a suggestion
//! where one is known.
//!
//! - `list` - List template keys under a root
//! - `render` - Render a template, optionally inside a layout
//! - `watch` - Render and re-render on every change

use anyhow::Result;
use clap::Parser;
use hotplate::cli;
use hotplate::core::user_friendly_error;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    // Set up colored output for Windows
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute().await {
        Ok(()) => Ok(()),
        Err(e) => {
            user_friendly_error(e).display();
            std::process::exit(1);
        }
    }
}
