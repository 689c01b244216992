//! Foreign filesystem abstraction.
//!
//! Hosts that keep templates somewhere other than a local directory (embedded
//! assets, an archive, a virtual tree) implement [`FileSystem`] and hand it to the
//! engine. The engine then reads every template through it and never watches
//! anything.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};

/// Read-only access to a tree of files addressed by `/`-separated paths.
pub trait FileSystem: Send + Sync + std::fmt::Debug {
    /// Open the file at `path` for reading.
    fn open(&self, path: &str) -> io::Result<Box<dyn Read + Send>>;

    /// Verify the filesystem is usable before the engine starts reading from it.
    fn check(&self) -> io::Result<()> {
        Ok(())
    }
}

/// A [`FileSystem`] rooted at a local directory.
///
/// Paths are resolved relative to the root. A leading `/` is allowed and
/// ignored; `..` components are rejected so lookups cannot escape the root.
#[derive(Debug, Clone)]
pub struct DirFileSystem {
    root: PathBuf,
}

impl DirFileSystem {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> io::Result<PathBuf> {
        let mut resolved = self.root.clone();
        for component in Path::new(path.trim_start_matches('/')).components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(io::Error::new(
                        io::ErrorKind::PermissionDenied,
                        format!("path escapes filesystem root: {path}"),
                    ));
                }
            }
        }
        Ok(resolved)
    }
}

impl FileSystem for DirFileSystem {
    fn open(&self, path: &str) -> io::Result<Box<dyn Read + Send>> {
        let resolved = self.resolve(path)?;
        if resolved.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("not a file: {path}"),
            ));
        }
        Ok(Box::new(File::open(resolved)?))
    }

    fn check(&self) -> io::Result<()> {
        let metadata = std::fs::metadata(&self.root)?;
        if metadata.is_dir() {
            Ok(())
        } else {
            Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("not a directory: {}", self.root.display()),
            ))
        }
    }
}
