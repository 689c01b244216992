//! Render a template and re-render it on every template change.
//!
//! Reloading is forced on regardless of the configured options, so the engine
//! subscribes to the root and every directory beneath it. Each change the
//! watcher applies wakes the command, which prints a separator and the fresh
//! output. Render failures are printed and the command keeps
//! waiting for the next edit. Ctrl-C exits.
//!
//! ```bash
//! hotplate watch views index --layout layouts/main --data page.json
//! ```

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::io::Write;
use std::sync::Arc;
use tokio::sync::mpsc;

use super::CliConfig;
use super::render::RenderArgs;
use crate::core::user_friendly_error;
use crate::engine::Engine;
use crate::observer::{EngineObserver, StoreChange, SwallowedError, TracingObserver};
use crate::templating::Binding;

/// Forwards store updates into a channel; logs everything else.
#[derive(Debug)]
struct ChannelObserver {
    tx: mpsc::UnboundedSender<StoreChange>,
}

impl EngineObserver for ChannelObserver {
    fn swallowed(&self, error: &SwallowedError) {
        TracingObserver.swallowed(error);
    }

    fn reconciled(&self, change: &StoreChange) {
        TracingObserver.reconciled(change);
        // Receiver gone means the command is shutting down.
        let _ = self.tx.send(change.clone());
    }
}

/// Keep rendering a template as its sources change.
#[derive(Args)]
pub struct WatchCommand {
    #[command(flatten)]
    args: RenderArgs,
}

impl WatchCommand {
    pub async fn execute(self, config: &CliConfig) -> Result<()> {
        let options = config.engine_options()?.with_reload(true);
        let (tx, mut rx) = mpsc::unbounded_channel();

        let engine = Engine::builder()
            .root(&self.args.root)
            .options(options)
            .observer(Arc::new(ChannelObserver { tx }))
            .build()?;
        let binding = self.args.binding()?;

        self.render_once(&engine, &binding);
        eprintln!(
            "{}",
            format!("Watching {} (Ctrl-C to stop)", self.args.root.display()).cyan()
        );

        loop {
            tokio::select! {
                change = rx.recv() => {
                    let Some(change) = change else { break };
                    // Drain the burst an editor save tends to produce.
                    while rx.try_recv().is_ok() {}
                    eprintln!("{}", format!("--- {} changed", change.key()).dimmed());
                    self.render_once(&engine, &binding);
                }
                _ = tokio::signal::ctrl_c() => {
                    eprintln!();
                    break;
                }
            }
        }

        Ok(())
    }

    fn render_once(&self, engine: &Engine, binding: &Binding) {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        let result = self
            .args
            .render_into(engine, binding, &mut out)
            .and_then(|()| {
                writeln!(out)?;
                out.flush()?;
                Ok(())
            });
        if let Err(e) = result {
            user_friendly_error(e).display();
        }
    }
}
