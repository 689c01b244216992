//! Template trees and observers for tests.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

use crate::observer::{EngineObserver, ErrorOrigin, StoreChange, SwallowedError};

/// A temporary directory of template files, removed on drop.
#[derive(Debug)]
pub struct TemplateTree {
    dir: TempDir,
}

impl TemplateTree {
    pub fn new() -> Result<Self> {
        Ok(Self {
            dir: TempDir::new().context("Failed to create temporary template root")?,
        })
    }

    /// A tree pre-filled with `(relative path, contents)` pairs.
    pub fn with_files(files: &[(&str, &str)]) -> Result<Self> {
        let tree = Self::new()?;
        for (path, contents) in files {
            tree.write(path, contents)?;
        }
        Ok(tree)
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn join(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    /// Write a file, creating parent directories as needed.
    pub fn write(&self, relative: &str, contents: &str) -> Result<PathBuf> {
        let path = self.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&path, contents).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    pub fn mkdir(&self, relative: &str) -> Result<PathBuf> {
        let path = self.join(relative);
        fs::create_dir_all(&path).with_context(|| format!("Failed to create {}", path.display()))?;
        Ok(path)
    }

    pub fn remove(&self, relative: &str) -> Result<()> {
        let path = self.join(relative);
        if path.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        }
        .with_context(|| format!("Failed to remove {}", path.display()))
    }

    pub fn rename(&self, from: &str, to: &str) -> Result<()> {
        fs::rename(self.join(from), self.join(to))
            .with_context(|| format!("Failed to rename {from} to {to}"))
    }
}

/// Observer that records everything it is told.
#[derive(Debug, Default)]
pub struct CountingObserver {
    swallowed: Mutex<Vec<SwallowedError>>,
    changes: Mutex<Vec<StoreChange>>,
}

impl CountingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of swallowed errors from `origin`.
    pub fn swallowed_count(&self, origin: ErrorOrigin) -> usize {
        self.swallowed_errors().iter().filter(|e| e.origin == origin).count()
    }

    pub fn swallowed_errors(&self) -> Vec<SwallowedError> {
        self.swallowed.lock().map(|v| v.clone()).unwrap_or_default()
    }

    pub fn changes(&self) -> Vec<StoreChange> {
        self.changes.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

impl EngineObserver for CountingObserver {
    fn swallowed(&self, error: &SwallowedError) {
        if let Ok(mut errors) = self.swallowed.lock() {
            errors.push(error.clone());
        }
    }

    fn reconciled(&self, change: &StoreChange) {
        if let Ok(mut changes) = self.changes.lock() {
            changes.push(change.clone());
        }
    }
}
