//! The template engine: source loading, function registration and rendering.
//!
//! An [`Engine`] owns one template root (or one foreign [`FileSystem`]), the
//! [`SourceStore`] built from it, the function registry, and, when reloading is
//! enabled, a [`DirectoryWatcher`] keeping the store current. Engines are cheap
//! to clone; clones share all state.
//!
//! # Loading
//!
//! Loading is an explicit state machine ([`LoadState`]):
//!
//! ```text
//! Unloaded ──load──▶ Loading ──ok──▶ Loaded
//!                       │
//!                       └──err──▶ Failed ──load──▶ Loading ...
//! ```
//!
//! `Loading` is only ever entered with the write lock held, so concurrent callers
//! block until the transition finishes and then observe its outcome. A second
//! caller arriving while the first is loading finds `Loaded` and returns
//! immediately. A failed load keeps whatever it stored before failing; the next
//! attempt starts over with a fresh store.
//!
//! Every load builds a new store:
//!
//! 1. A [`FileSystemStore`] when a foreign filesystem was supplied, otherwise a
//!    [`MemoryStore`]
//! 2. A [`TemplateSet`] carrying the configured delimiters and every registered
//!    function
//! 3. For the in-memory store, a walk of the root: every directory is handed to
//!    the watcher and every template file is read into the store. When two files
//!    map to the same key (`page.html` and `page.tera`), the first one walked wins.
//!
//! Operations that need the store load on first use. With
//! [`EngineOptions::reload`] set, [`Engine::load`] and [`Engine::render`] reload on
//! every call.
//!
//! # Locking
//!
//! One reader/writer lock guards the load state, the store, the function registry
//! and the watcher. Loading, [`Engine::add_func`] and watcher reconciliation take
//! the write lock; lookups take the read lock. Rendering holds the read lock only
//! while compiling; templates execute after it is released.

mod reconcile;
mod render;


use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use walkdir::WalkDir;

use crate::config::EngineOptions;
use crate::core::{EngineError, Result, error_chain};
use crate::normalize::PathNormalizer;
use crate::observer::{EngineObserver, ErrorOrigin, SwallowedError, TracingObserver};
use crate::store::{FileSystem, FileSystemStore, MemoryStore, SourceStore};
use crate::templating::{FunctionRegistry, TemplateFunction, TemplateSet};
use crate::watcher::DirectoryWatcher;

/// Progress of an engine's source loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadState {
    /// No load has been attempted
    Unloaded,
    /// A load is running; only observable from inside the engine
    Loading,
    /// The last load succeeded
    Loaded,
    /// The last load failed; the next operation retries
    Failed,
}

/// A template engine bound to one template root.
///
/// # Examples
///
/// ```rust,no_run
/// use std::collections::HashMap;
/// use hotplate::{Engine, EngineOptions};
///
/// let engine = Engine::new("views", EngineOptions::for_mode(cfg!(debug_assertions)))?;
///
/// let mut out = Vec::new();
/// let data = HashMap::from([("Title", "Hello, World!")]);
/// engine.render(&mut out, "index", data, Some("layouts/main"))?;
/// # Ok::<(), hotplate::EngineError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

/// State shared between engine clones and the watch loop.
#[derive(Debug)]
pub(crate) struct EngineInner {
    root: PathBuf,
    filesystem: Option<Arc<dyn FileSystem>>,
    options: EngineOptions,
    normalizer: PathNormalizer,
    observer: Arc<dyn EngineObserver>,
    state: RwLock<EngineState>,
    /// One-shot guard for starting the watcher
    watch_started: AtomicBool,
}

#[derive(Debug)]
struct EngineState {
    load: LoadState,
    functions: FunctionRegistry,
    templates: TemplateSet,
    store: Box<dyn SourceStore>,
    watcher: Option<DirectoryWatcher>,
}

impl EngineInner {
    pub(crate) fn root(&self) -> &Path {
        &self.root
    }

    pub(crate) fn observer(&self) -> &dyn EngineObserver {
        self.observer.as_ref()
    }

    fn read_state(&self) -> RwLockReadGuard<'_, EngineState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, EngineState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn swallow(&self, origin: ErrorOrigin, target: &Path, error: &(dyn std::error::Error + 'static)) {
        self.observer.swallowed(&swallowed_error(origin, target, error));
    }

    /// Fill a fresh store, returning the directories found by the walk.
    fn populate(&self, state: &mut EngineState) -> Result<Vec<PathBuf>> {
        state.templates = TemplateSet::new(self.options.delimiters.clone(), state.functions.clone());

        if let Some(filesystem) = &self.filesystem {
            state.store =
                Box::new(FileSystemStore::new(Arc::clone(filesystem), &self.options.extensions)?);
            tracing::debug!("using pass-through filesystem store");
            return Ok(Vec::new());
        }

        let metadata = fs::metadata(&self.root).map_err(|source| EngineError::RootUnreadable {
            path: self.root.clone(),
            source,
        })?;
        if !metadata.is_dir() {
            return Err(EngineError::RootUnreadable {
                path: self.root.clone(),
                source: io::Error::new(io::ErrorKind::NotADirectory, "not a directory"),
            });
        }

        let store = &mut state.store;
        *store = Box::new(MemoryStore::new());
        let mut directories = Vec::new();
        let mut loaded = 0usize;

        for entry in WalkDir::new(&self.root).sort_by_file_name() {
            let entry = entry.map_err(|source| EngineError::Walk {
                source,
            })?;

            if entry.file_type().is_dir() {
                directories.push(entry.path().to_path_buf());
                continue;
            }

            let Some(template) = self.normalizer.normalize(entry.path()) else {
                continue;
            };

            if store.exists(&template.key) {
                if self.options.debug {
                    tracing::debug!(
                        key = %template.key,
                        path = %entry.path().display(),
                        "skipping duplicate template"
                    );
                }
                continue;
            }

            let source = fs::read_to_string(entry.path()).map_err(|source| EngineError::Read {
                path: entry.path().display().to_string(),
                source,
            })?;
            store.set(&template.key, source)?;
            loaded += 1;

            if self.options.debug {
                tracing::debug!(key = %template.key, "loaded template");
            }
        }

        tracing::debug!(
            root = %self.root.display(),
            templates = loaded,
            directories = directories.len(),
            "template root loaded"
        );
        Ok(directories)
    }
}

fn swallowed_error(
    origin: ErrorOrigin,
    target: &Path,
    error: &(dyn std::error::Error + 'static),
) -> SwallowedError {
    SwallowedError {
        origin,
        target: target.display().to_string(),
        message: error_chain(error),
    }
}

impl Engine {
    /// Engine over the template directory `root`, backed by an in-memory store.
    ///
    /// Nothing is read until the first load.
    pub fn new(root: impl Into<PathBuf>, options: EngineOptions) -> Result<Self> {
        Self::builder().root(root).options(options).build()
    }

    /// Engine reading every lookup through `filesystem`. The watcher is never started.
    pub fn with_filesystem(filesystem: Arc<dyn FileSystem>, options: EngineOptions) -> Result<Self> {
        Self::builder().filesystem(filesystem).options(options).build()
    }

    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn root(&self) -> &Path {
        &self.inner.root
    }

    pub fn options(&self) -> &EngineOptions {
        &self.inner.options
    }

    pub fn load_state(&self) -> LoadState {
        self.inner.read_state().load
    }

    /// Load template sources.
    ///
    /// Does nothing once loaded, unless [`EngineOptions::reload`] is set, in which
    /// case every call reloads.
    ///
    /// # Errors
    ///
    /// - [`EngineError::RootUnreadable`] if the root is missing or not a directory
    /// - [`EngineError::FileSystemUnavailable`] if the foreign filesystem is unusable
    /// - [`EngineError::Walk`] or [`EngineError::Read`] if a directory or file
    ///   cannot be read during the walk
    pub fn load(&self) -> Result<()> {
        self.load_with(self.inner.options.reload)
    }

    /// Load unless already loaded; `force` loads regardless.
    fn load_with(&self, force: bool) -> Result<()> {
        if !force && self.load_state() == LoadState::Loaded {
            return Ok(());
        }

        let mut state = self.inner.write_state();
        if !force && state.load == LoadState::Loaded {
            return Ok(());
        }

        state.load = LoadState::Loading;
        match self.inner.populate(&mut state) {
            Ok(directories) => {
                state.load = LoadState::Loaded;
                self.start_watching(state, &directories);
                Ok(())
            }
            Err(error) => {
                state.load = LoadState::Failed;
                tracing::warn!(root = %self.inner.root.display(), "template load failed: {error}");
                Err(error)
            }
        }
    }

    /// Start the watcher on first use and subscribe to `directories`.
    ///
    /// Consumes the write guard so failures reach the observer only after the
    /// lock is released; an observer may call back into the engine.
    fn start_watching(&self, mut state: RwLockWriteGuard<'_, EngineState>, directories: &[PathBuf]) {
        if !self.inner.options.reload || !state.store.is_in_memory() {
            return;
        }

        let mut failures = Vec::new();
        if state.watcher.is_none() {
            if self
                .inner
                .watch_started
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                return;
            }

            match DirectoryWatcher::spawn(Arc::downgrade(&self.inner)) {
                Ok(watcher) => state.watcher = Some(watcher),
                Err(error) => {
                    self.inner.watch_started.store(false, Ordering::Release);
                    failures.push(swallowed_error(ErrorOrigin::WatchBackend, &self.inner.root, &error));
                }
            }
        }

        if let Some(watcher) = state.watcher.as_mut() {
            for dir in directories {
                if let Err(error) = watcher.watch(dir) {
                    failures.push(swallowed_error(ErrorOrigin::WatchSubscription, dir, &error));
                }
            }
        }

        drop(state);
        for failure in &failures {
            self.inner.observer.swallowed(failure);
        }
    }

    /// Register `function` under `name` for all templates.
    ///
    /// Replaces any function of the same name, built-ins included. Takes effect for
    /// the next render whether or not the engine is loaded.
    pub fn add_func(&self, name: impl Into<String>, function: TemplateFunction) {
        let name = name.into();
        let mut state = self.inner.write_state();
        state.functions.insert(name.clone(), function);
        state.templates = TemplateSet::new(self.inner.options.delimiters.clone(), state.functions.clone());
        tracing::debug!(function = %name, "registered template function");
    }

    /// Whether a template named `name` exists. Loads on first use.
    ///
    /// Returns `false` when loading fails.
    pub fn exists(&self, name: &str) -> bool {
        if let Err(error) = self.load_with(false) {
            tracing::debug!(template = name, "exists check without a store: {error}");
            return false;
        }
        let key = self.inner.normalizer.lookup_key(name);
        self.inner.read_state().store.exists(&key)
    }

    /// Stored template keys in sorted order, loading on first use.
    ///
    /// Returns `None` for pass-through stores, which cannot enumerate.
    pub fn template_names(&self) -> Result<Option<Vec<String>>> {
        self.load_with(false)?;
        Ok(self.inner.read_state().store.keys())
    }

    /// Directories the watcher is subscribed to; empty when it is not running.
    pub fn watched_directories(&self) -> Vec<PathBuf> {
        self.inner
            .read_state()
            .watcher
            .as_ref()
            .map(|w| w.directories().map(Path::to_path_buf).collect())
            .unwrap_or_default()
    }

    /// Whether this engine's watcher has been started.
    pub fn is_watching(&self) -> bool {
        self.inner.watch_started.load(Ordering::Acquire)
    }
}

/// Step-by-step construction of an [`Engine`].
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use hotplate::{DirFileSystem, Engine, EngineOptions, Signature, TemplateFunction};
///
/// let engine = Engine::builder()
///     .filesystem(Arc::new(DirFileSystem::new("assets/views")))
///     .options(EngineOptions::default().with_delimiters("[[", "]]"))
///     .function("shout", TemplateFunction::new(Signature::new(["text"]), |args| {
///         Ok(args[0].as_str().unwrap_or_default().to_uppercase().into())
///     }))
///     .build()?;
/// # Ok::<(), hotplate::EngineError>(())
/// ```
#[derive(Debug, Default)]
pub struct EngineBuilder {
    root: Option<PathBuf>,
    filesystem: Option<Arc<dyn FileSystem>>,
    options: EngineOptions,
    observer: Option<Arc<dyn EngineObserver>>,
    functions: Vec<(String, TemplateFunction)>,
}

impl EngineBuilder {
    /// Template directory for the in-memory store.
    #[must_use]
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Read through `filesystem` instead of walking a directory.
    #[must_use]
    pub fn filesystem(mut self, filesystem: Arc<dyn FileSystem>) -> Self {
        self.filesystem = Some(filesystem);
        self
    }

    #[must_use]
    pub fn options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    /// Receiver for swallowed errors and watcher updates. Defaults to [`TracingObserver`].
    #[must_use]
    pub fn observer(mut self, observer: Arc<dyn EngineObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Register a template function in addition to the built-ins.
    #[must_use]
    pub fn function(mut self, name: impl Into<String>, function: TemplateFunction) -> Self {
        self.functions.push((name.into(), function));
        self
    }

    /// Validate the options and create the engine.
    pub fn build(self) -> Result<Engine> {
        self.options.validate()?;

        if self.root.is_none() && self.filesystem.is_none() {
            return Err(EngineError::InvalidOptions {
                reason: "either a template root or a filesystem is required".to_string(),
            });
        }

        let root = match (self.root, &self.filesystem) {
            (Some(root), None) => {
                std::path::absolute(&root).map_err(|source| EngineError::RootUnreadable {
                    path: root,
                    source,
                })?
            }
            (root, _) => root.unwrap_or_default(),
        };
        let normalizer = PathNormalizer::new(root.clone(), self.options.extensions.iter().cloned());

        let mut functions = FunctionRegistry::with_builtins();
        for (name, function) in self.functions {
            functions.insert(name, function);
        }

        let state = EngineState {
            load: LoadState::Unloaded,
            templates: TemplateSet::new(self.options.delimiters.clone(), functions.clone()),
            functions,
            store: Box::new(MemoryStore::new()),
            watcher: None,
        };

        Ok(Engine {
            inner: Arc::new(EngineInner {
                root,
                filesystem: self.filesystem,
                options: self.options,
                normalizer,
                observer: self.observer.unwrap_or_else(|| Arc::new(TracingObserver)),
                state: RwLock::new(state),
                watch_started: AtomicBool::new(false),
            }),
        })
    }
}
