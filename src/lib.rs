//! hotplate - hot-reloading template sources for Tera
//!
//! hotplate keeps a directory of templates in memory, keeps that copy in sync with
//! the disk through file-system notifications, and renders templates from it with
//! [Tera](https://keats.github.io/tera/), optionally wrapped in a layout.
//!
//! # Architecture Overview
//!
//! - A [`PathNormalizer`](normalize::PathNormalizer) maps file paths to storage
//!   keys: the root-relative path with the longest matching extension removed,
//!   so `views/errors/404.html` is stored as `errors/404`.
//! - A [`SourceStore`](store::SourceStore) holds sources by key. The in-memory
//!   [`MemoryStore`](store::MemoryStore) is filled by walking the root; the
//!   [`FileSystemStore`](store::FileSystemStore) reads through a caller-supplied
//!   [`FileSystem`](store::FileSystem) on every lookup.
//! - An [`Engine`] owns the store, the template functions and the load state. It
//!   loads on first use and, with reloading enabled, on every render.
//! - A [`DirectoryWatcher`](watcher::DirectoryWatcher) applies create, write,
//!   remove and rename events to the in-memory store in the background.
//! - Rendering compiles the requested template (and everything it includes or
//!   extends) from the store and executes it into any [`std::io::Write`].
//!
//! ## Key Features
//!
//! - **Hot reload**: edits show up without restarting the host
//! - **Layouts**: render content inside a layout through a `slot()` function
//! - **Custom delimiters**: write `[[ name ]]` instead of `{{ name }}`
//! - **Typed functions**: register Rust closures with declared signatures
//! - **Observable**: errors the engine handles itself go to an [`EngineObserver`]
//!
//! # Core Modules
//!
//! - [`config`] - Engine options, loadable from TOML
//! - [`core`] - Error types and user-facing error formatting
//! - [`engine`] - Loading, rendering and the load state machine
//! - [`normalize`] - Path to template key mapping
//! - [`observer`] - Hooks for swallowed errors and store updates
//! - [`store`] - Source store trait and its backings
//! - [`templating`] - Compilation, bindings, template functions, delimiters
//! - [`watcher`] - File-system event mapping and directory subscriptions
//! - [`cli`] - The `hotplate` command-line tool
//!
//! # Example
//!
//! ```rust,no_run
//! use hotplate::{Engine, EngineOptions};
//! use serde_json::json;
//!
//! // views/index.html:        <h1>{{ Title }}</h1>
//! // views/layouts/main.html: <body>{{ slot() }}</body>
//! let engine = Engine::new("views", EngineOptions::for_mode(cfg!(debug_assertions)))?;
//!
//! let page = engine.render_to_string("index", json!({"Title": "Hello, World!"}), Some("layouts/main"))?;
//! assert_eq!(page, "<body><h1>Hello, World!</h1></body>");
//! # Ok::<(), hotplate::EngineError>(())
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod engine;
pub mod normalize;
pub mod observer;
pub mod store;
pub mod templating;
pub mod watcher;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::{Delimiters, EngineOptions, SlotErrorPolicy};
pub use core::{EngineError, Result};
pub use engine::{Engine, EngineBuilder, LoadState};
pub use observer::{EngineObserver, ErrorOrigin, StoreChange, SwallowedError, TracingObserver};
pub use store::{DirFileSystem, FileSystem};
pub use templating::{Binding, FunctionError, Signature, TemplateFunction};
