//! Command-line interface for hotplate.
//!
//! The `hotplate` binary exposes the engine for inspecting and previewing a
//! template directory from the shell.
//!
//! # Commands
//!
//! - `list` - Print the key of every template under a root
//! - `render` - Render one template (optionally inside a layout) to stdout
//! - `watch` - Render, then render again every time a template changes
//!
//! # Global Options
//!
//! - `--ext` - Template extension, repeatable (default `.html` and `.tera`)
//! - `--delims` - Custom expression delimiters as `LEFT,RIGHT`
//! - `--config` - TOML file with engine options; flags override it
//! - `--verbose` - Enable debug output
//! - `--quiet` - Suppress all output except errors
//!
//! # Examples
//!
//! ```bash
//! hotplate list views
//! hotplate render views index --var Title="Hello, World!"
//! hotplate render views index --layout layouts/main --data page.json
//! hotplate --delims '[[,]]' watch views index --data page.toml
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::config::{Delimiters, EngineOptions};

pub mod list;
pub mod render;
pub mod watch;


/// Settings derived from the global flags.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Log filter directive; `None` disables logging.
    pub log_level: Option<String>,

    /// Engine options file given with `--config`.
    pub options_path: Option<PathBuf>,

    /// Extensions given with `--ext`, replacing the configured set when non-empty.
    pub extensions: Vec<String>,

    /// Delimiters given with `--delims`.
    pub delimiters: Option<Delimiters>,
}

impl CliConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine options: the `--config` file (or defaults) with flag overrides applied.
    pub fn engine_options(&self) -> Result<EngineOptions> {
        let mut options = match &self.options_path {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read options file: {}", path.display()))?;
                EngineOptions::from_toml_str(&text)
                    .with_context(|| format!("Invalid options file: {}", path.display()))?
            }
            None => EngineOptions::default(),
        };

        if !self.extensions.is_empty() {
            options.extensions = self.extensions.clone();
        }
        if let Some(delimiters) = &self.delimiters {
            options.delimiters = delimiters.clone();
        }

        options.validate()?;
        Ok(options)
    }

    /// Install the global tracing subscriber, writing to stderr.
    ///
    /// `RUST_LOG` takes precedence over the verbosity flags.
    pub fn init_logging(&self) {
        let Some(level) = &self.log_level else {
            return;
        };

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("hotplate={level}")));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }
}

/// Parse `LEFT,RIGHT` into a delimiter pair.
fn parse_delimiters(value: &str) -> Result<Delimiters, String> {
    match value.split_once(',') {
        Some((left, right)) if !left.is_empty() && !right.is_empty() => {
            Ok(Delimiters::new(left, right))
        }
        _ => Err(format!("expected LEFT,RIGHT (for example '[[,]]'), got '{value}'")),
    }
}

/// Hot-reloading template renderer built on Tera.
#[derive(Parser)]
#[command(
    name = "hotplate",
    about = "Render and preview templates from a directory",
    version,
    long_about = "hotplate loads a directory of Tera templates, renders them with optional \
                  layouts, and re-renders as the files change."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// TOML file with engine options.
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Template extension, including the leading dot. Repeatable.
    #[arg(long = "ext", global = true, value_name = "EXT")]
    extensions: Vec<String>,

    /// Expression delimiters as LEFT,RIGHT.
    #[arg(long, global = true, value_name = "LEFT,RIGHT", value_parser = parse_delimiters)]
    delims: Option<Delimiters>,
}

#[derive(Subcommand)]
enum Commands {
    /// List template keys under a root.
    List(list::ListCommand),

    /// Render a template to stdout.
    Render(render::RenderCommand),

    /// Render a template, then re-render whenever a template changes.
    Watch(watch::WatchCommand),
}

impl Cli {
    /// Run the parsed command.
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        self.execute_with_config(config).await
    }

    /// Translate the global flags into a [`CliConfig`].
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            None
        } else {
            Some("warn".to_string())
        };

        CliConfig {
            log_level,
            options_path: self.config.clone(),
            extensions: self.extensions.clone(),
            delimiters: self.delims.clone(),
        }
    }

    /// Run the command with an explicit configuration.
    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        config.init_logging();

        match self.command {
            Commands::List(cmd) => cmd.execute(&config),
            Commands::Render(cmd) => cmd.execute(&config),
            Commands::Watch(cmd) => cmd.execute(&config).await,
        }
    }
}
