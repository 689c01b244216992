//! Test utilities for hotplate
//!
//! Helpers shared by unit tests and the integration suite (enable the
//! `test-utils` feature to use them from `tests/`):
//! - [`TemplateTree`]: a temporary template root with file helpers
//! - [`CountingObserver`]: an observer recording swallowed errors and store changes
//! - [`wait_until`]: poll a condition with a deadline, for watcher tests
//!
//! # Example
//!
//! ```rust,ignore
//! use hotplate::test_utils::TemplateTree;
//! use hotplate::{Engine, EngineOptions};
//!
//! let tree = TemplateTree::new().unwrap();
//! tree.write("index.html", "<h1>{{ Title }}</h1>").unwrap();
//!
//! let engine = Engine::new(tree.path(), EngineOptions::default()).unwrap();
//! assert!(engine.exists("index"));
//! ```

pub mod fixtures;

pub use fixtures::{CountingObserver, TemplateTree};

use std::sync::Once;
use std::time::{Duration, Instant};
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// How long watcher tests wait for an event to be reconciled.
pub const WATCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Initialize logging for tests.
///
/// Initializes the tracing subscriber once no matter how often it is called.
/// Uses `level` when given, otherwise `RUST_LOG`; with neither, logging stays off.
///
/// ```bash
/// RUST_LOG=hotplate=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_names(true)
            .try_init();
    });
}

/// Poll `condition` every few milliseconds until it holds or `timeout` passes.
///
/// Returns whether the condition was met.
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
}
