//! Template source storage.
//!
//! The engine reads template source text through the [`SourceStore`] trait. Two
//! backings exist:
//!
//! - [`MemoryStore`]: a map filled by the initial directory walk and kept current
//!   by the watcher. Fast lookups; can go stale only between a file change and the
//!   watcher processing its event.
//! - [`FileSystemStore`]: a pass-through over a [`FileSystem`]. Every lookup hits
//!   the filesystem, so it is never stale, and it cannot be written.
//!
//! Stores carry no locking of their own. The engine keeps its store behind its
//! reader/writer lock and only mutates it with the write lock held.

mod filesystem;
mod memory;
mod passthrough;

pub use filesystem::{DirFileSystem, FileSystem};
pub use memory::MemoryStore;
pub use passthrough::FileSystemStore;

use crate::core::Result;

/// Key/value access to template sources, keyed by storage key.
pub trait SourceStore: Send + Sync + std::fmt::Debug {
    /// Whether a source is stored under `key`.
    fn exists(&self, key: &str) -> bool;

    /// The source stored under `key`, or `None` when there is none.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `source` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, source: String) -> Result<()>;

    /// Remove the entry for `key`, if any.
    fn delete(&mut self, key: &str) -> Result<()>;

    /// All stored keys, when the backing can enumerate them.
    fn keys(&self) -> Option<Vec<String>>;

    /// Whether this store is filled by walking the template root.
    fn is_in_memory(&self) -> bool;
}
