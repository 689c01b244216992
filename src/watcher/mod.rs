//! Directory watching for in-memory template stores.
//!
//! After the initial load, a [`DirectoryWatcher`] keeps the engine's store in step
//! with the template root. It subscribes to every directory found by the walk
//! (non-recursively, one subscription per directory) and feeds each notification
//! to the engine as a [`WatchEvent`].
//!
//! # Event Mapping
//!
//! `notify` reports rich event kinds; the engine only needs four operations:
//!
//! | notify event | [`WatchOp`] |
//! |--------------|-------------|
//! | `Create(_)` | `Create` |
//! | `Modify(Data \| Any \| Other)` | `Write` |
//! | `Modify(Name(From))` | `Rename` (the old path disappears) |
//! | `Modify(Name(To))` | `Create` (the new path appears) |
//! | `Modify(Name(Both))` | `Rename` of the first path, `Create` of the second |
//! | `Modify(Name(Any \| Other))` | `Create` if the path exists, `Rename` otherwise |
//! | `Remove(_)` | `Remove` |
//! | `Modify(Metadata)`, `Access(_)`, `Any`, `Other` | ignored |
//!
//! # Lifecycle
//!
//! The event loop runs on its own thread and holds only a weak reference to the
//! engine. It exits when the event channel closes, which happens when the engine
//! (and with it the `notify` watcher owning the sender) is dropped.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Weak};
use std::thread;

use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::engine::EngineInner;
use crate::observer::{ErrorOrigin, SwallowedError};

/// Name of the event loop thread.
const THREAD_NAME: &str = "hotplate-watch";

/// File-system operation reported for a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WatchOp {
    Create,
    Write,
    Remove,
    Rename,
}

/// One path-level change to reconcile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    pub path: PathBuf,
    pub op: WatchOp,
}

impl WatchEvent {
    pub fn new(path: impl Into<PathBuf>, op: WatchOp) -> Self {
        Self {
            path: path.into(),
            op,
        }
    }

    /// Whether the path no longer exists after this event.
    pub fn is_removal(&self) -> bool {
        matches!(self.op, WatchOp::Remove | WatchOp::Rename)
    }

    /// Translate a `notify` event into zero or more path events.
    pub fn from_notify(event: &Event) -> Vec<WatchEvent> {
        let each = |op: WatchOp| -> Vec<WatchEvent> {
            event.paths.iter().map(|p| WatchEvent::new(p.clone(), op)).collect()
        };

        match event.kind {
            EventKind::Create(_) => each(WatchOp::Create),
            EventKind::Remove(_) => each(WatchOp::Remove),
            EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Any | ModifyKind::Other) => {
                each(WatchOp::Write)
            }
            EventKind::Modify(ModifyKind::Name(mode)) => match mode {
                RenameMode::From => each(WatchOp::Rename),
                RenameMode::To => each(WatchOp::Create),
                RenameMode::Both => {
                    let mut events = Vec::with_capacity(2);
                    if let Some(from) = event.paths.first() {
                        events.push(WatchEvent::new(from.clone(), WatchOp::Rename));
                    }
                    if let Some(to) = event.paths.get(1) {
                        events.push(WatchEvent::new(to.clone(), WatchOp::Create));
                    }
                    events
                }
                RenameMode::Any | RenameMode::Other => event
                    .paths
                    .iter()
                    .map(|p| {
                        let op = if p.exists() { WatchOp::Create } else { WatchOp::Rename };
                        WatchEvent::new(p.clone(), op)
                    })
                    .collect(),
            },
            EventKind::Modify(ModifyKind::Metadata(_))
            | EventKind::Access(_)
            | EventKind::Any
            | EventKind::Other => Vec::new(),
        }
    }
}

/// A `notify` watcher plus the set of directories it is subscribed to.
#[derive(Debug)]
pub struct DirectoryWatcher {
    watcher: RecommendedWatcher,
    watched: BTreeSet<PathBuf>,
}

impl DirectoryWatcher {
    /// Create the watcher and start the event loop feeding `engine`.
    pub(crate) fn spawn(engine: Weak<EngineInner>) -> notify::Result<Self> {
        let (tx, rx) = mpsc::channel();
        let watcher = notify::recommended_watcher(tx)?;

        thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || run(engine, rx))
            .map_err(notify::Error::io)?;

        Ok(Self {
            watcher,
            watched: BTreeSet::new(),
        })
    }

    /// Subscribe to `dir`. Subscribing twice is a no-op.
    pub fn watch(&mut self, dir: &Path) -> notify::Result<()> {
        if self.watched.contains(dir) {
            return Ok(());
        }
        self.watcher.watch(dir, RecursiveMode::NonRecursive)?;
        self.watched.insert(dir.to_path_buf());
        tracing::debug!(dir = %dir.display(), "watching directory");
        Ok(())
    }

    /// Drop the subscription for `dir`.
    ///
    /// The directory is forgotten even when the backend refuses, which happens
    /// when the backend already dropped the subscription of a deleted directory.
    pub fn unwatch(&mut self, dir: &Path) -> notify::Result<()> {
        if !self.watched.remove(dir) {
            return Ok(());
        }
        tracing::debug!(dir = %dir.display(), "unwatching directory");
        self.watcher.unwatch(dir)
    }

    pub fn is_watching(&self, dir: &Path) -> bool {
        self.watched.contains(dir)
    }

    /// Watched directories in path order.
    pub fn directories(&self) -> impl Iterator<Item = &Path> {
        self.watched.iter().map(PathBuf::as_path)
    }
}

fn run(engine: Weak<EngineInner>, events: Receiver<notify::Result<Event>>) {
    tracing::debug!("watch loop started");

    for event in events {
        let Some(inner) = engine.upgrade() else {
            break;
        };
        dispatch(&inner, event);
    }

    tracing::debug!("watch loop stopped");
}

fn dispatch(inner: &Arc<EngineInner>, event: notify::Result<Event>) {
    match event {
        Ok(event) => {
            for change in WatchEvent::from_notify(&event) {
                inner.reconcile(&change);
            }
        }
        Err(error) => {
            let target = error
                .paths
                .first()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| inner.root().display().to_string());
            inner.observer().swallowed(&SwallowedError {
                origin: ErrorOrigin::WatchBackend,
                target,
                message: error.to_string(),
            });
        }
    }
}
