//! List the templates under a root.
//!
//! ```bash
//! hotplate list views
//! hotplate list views --format json
//! ```

use anyhow::{Result, bail};
use clap::{Args, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;

use super::CliConfig;
use crate::engine::Engine;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ListFormat {
    /// One key per line
    #[default]
    Text,
    /// A JSON array of keys
    Json,
}

/// Print every template key under a root.
#[derive(Args)]
pub struct ListCommand {
    /// Template root directory
    root: PathBuf,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = ListFormat::Text)]
    format: ListFormat,
}

impl ListCommand {
    pub fn execute(self, config: &CliConfig) -> Result<()> {
        let engine = Engine::new(&self.root, config.engine_options()?)?;
        let Some(names) = engine.template_names()? else {
            bail!("Template store for {} cannot be listed", self.root.display());
        };

        match self.format {
            ListFormat::Json => println!("{}", serde_json::to_string_pretty(&names)?),
            ListFormat::Text if names.is_empty() => {
                eprintln!("{}", format!("No templates found in {}", self.root.display()).yellow());
            }
            ListFormat::Text => {
                for name in names {
                    println!("{name}");
                }
            }
        }
        Ok(())
    }
}
