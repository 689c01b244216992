//! Render one template to stdout.
//!
//! Bindings come from a JSON or TOML data file and from `--var KEY=VALUE`
//! pairs. A `--var` value is parsed as JSON when it can be (`--var Count=3`
//! binds a number) and kept as a string otherwise; vars override keys read from
//! the data file.
//!
//! ```bash
//! hotplate render views index --var Title="Hello, World!"
//! hotplate render views pages/about --layout layouts/main --data about.toml
//! ```

use anyhow::{Context, Result, bail};
use clap::Args;
use serde_json::{Map, Value};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::CliConfig;
use crate::config::EngineOptions;
use crate::engine::Engine;
use crate::templating::Binding;

/// Arguments shared by `render` and `watch`.
#[derive(Args, Debug, Clone)]
pub struct RenderArgs {
    /// Template root directory
    pub root: PathBuf,

    /// Template key, e.g. `index` or `pages/about`
    pub name: String,

    /// Layout to render the template inside
    #[arg(short, long, value_name = "NAME")]
    pub layout: Option<String>,

    /// JSON or TOML file with the bindings
    #[arg(short, long, value_name = "FILE")]
    pub data: Option<PathBuf>,

    /// Binding as KEY=VALUE. Repeatable.
    #[arg(long = "var", value_name = "KEY=VALUE", value_parser = parse_var)]
    pub vars: Vec<(String, Value)>,
}

impl RenderArgs {
    /// Assemble the binding from the data file and `--var` pairs.
    pub fn binding(&self) -> Result<Binding> {
        let mut map = match &self.data {
            Some(path) => read_data_file(path)?,
            None => Map::new(),
        };
        for (key, value) in &self.vars {
            map.insert(key.clone(), value.clone());
        }
        Ok(Binding::from(map))
    }

    /// Build an engine for the root with the given options.
    pub fn engine(&self, options: EngineOptions) -> Result<Engine> {
        Engine::new(&self.root, options)
            .with_context(|| format!("Cannot use template root {}", self.root.display()))
    }

    /// Render into `out`, wrapping in the layout if one was given.
    pub fn render_into<W: Write>(&self, engine: &Engine, binding: &Binding, out: &mut W) -> Result<()> {
        engine.render(out, &self.name, binding, self.layout.as_deref())?;
        Ok(())
    }
}

/// Render a template once and print it.
#[derive(Args)]
pub struct RenderCommand {
    #[command(flatten)]
    args: RenderArgs,
}

impl RenderCommand {
    pub fn execute(self, config: &CliConfig) -> Result<()> {
        let engine = self.args.engine(config.engine_options()?)?;
        let binding = self.args.binding()?;

        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        self.args.render_into(&engine, &binding, &mut out)?;
        out.flush()?;
        Ok(())
    }
}

/// Parse `KEY=VALUE`, reading VALUE as JSON when possible.
pub(crate) fn parse_var(input: &str) -> Result<(String, Value), String> {
    let Some((key, raw)) = input.split_once('=') else {
        return Err(format!("expected KEY=VALUE, got '{input}'"));
    };
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in '{input}'"));
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((key.to_string(), value))
}

fn read_data_file(path: &Path) -> Result<Map<String, Value>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read data file: {}", path.display()))?;

    let value: Value = match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => toml::from_str(&text)
            .with_context(|| format!("Invalid TOML in {}", path.display()))?,
        Some("json") | None => serde_json::from_str(&text)
            .with_context(|| format!("Invalid JSON in {}", path.display()))?,
        Some(other) => bail!("Unsupported data file type '.{other}': use .json or .toml"),
    };

    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        _ => bail!("Data file {} must contain a table of bindings", path.display()),
    }
}
