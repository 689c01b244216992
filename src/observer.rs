//! Hooks for errors the engine handles on its own and for watcher activity.
//!
//! Some failures have no caller to return to: a file that vanishes between the
//! watcher's event and its read, or a content template failing inside a layout
//! slot under [`SlotErrorPolicy::Swallow`](crate::SlotErrorPolicy::Swallow). The
//! engine reports those to an [`EngineObserver`] and carries on. The default
//! observer, [`TracingObserver`], logs them.

use std::path::PathBuf;

/// Where a swallowed error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorOrigin {
    /// Reading a file after a create or write event
    WatchRead,
    /// The notification backend reported an error
    WatchBackend,
    /// Adding or removing a directory subscription failed
    WatchSubscription,
    /// The content template failed inside a layout slot
    Slot,
}

impl std::fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ErrorOrigin::WatchRead => "watch read",
            ErrorOrigin::WatchBackend => "watch backend",
            ErrorOrigin::WatchSubscription => "watch subscription",
            ErrorOrigin::Slot => "layout slot",
        };
        f.write_str(label)
    }
}

/// An error the engine logged and dropped instead of returning.
#[derive(Debug, Clone)]
pub struct SwallowedError {
    pub origin: ErrorOrigin,
    /// Path or template name the error concerns
    pub target: String,
    /// Full error chain as text
    pub message: String,
}

/// A store mutation made by the watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreChange {
    Set { key: String, path: PathBuf },
    Deleted { key: String, path: PathBuf },
}

impl StoreChange {
    pub fn key(&self) -> &str {
        match self {
            StoreChange::Set { key, .. } | StoreChange::Deleted { key, .. } => key,
        }
    }
}

/// Receiver for engine events that are not returned to any caller.
///
/// Implementations are called from the watcher thread and from render calls, so
/// they must be cheap and must not call back into the engine.
pub trait EngineObserver: Send + Sync + std::fmt::Debug {
    /// An error was handled by logging and continuing.
    fn swallowed(&self, error: &SwallowedError) {
        TracingObserver.swallowed(error);
    }

    /// The watcher applied a change to the store.
    fn reconciled(&self, _change: &StoreChange) {}
}

/// Observer that logs through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl EngineObserver for TracingObserver {
    fn swallowed(&self, error: &SwallowedError) {
        match error.origin {
            ErrorOrigin::Slot => tracing::warn!(
                template = %error.target,
                "layout slot failed: {}",
                error.message
            ),
            origin => tracing::error!(
                target_path = %error.target,
                "{origin} error: {}",
                error.message
            ),
        }
    }

    fn reconciled(&self, change: &StoreChange) {
        tracing::debug!(key = change.key(), "template store updated");
    }
}
