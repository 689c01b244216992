use std::io::{self, Read};
use std::sync::Arc;

use super::{FileSystem, SourceStore};
use crate::core::{EngineError, Result};

/// Pass-through store reading every lookup from a [`FileSystem`].
///
/// A key is resolved by trying `key` + each configured extension, longest
/// first. Files without a configured extension are never templates.
#[derive(Debug, Clone)]
pub struct FileSystemStore {
    fs: Arc<dyn FileSystem>,
    extensions: Vec<String>,
}

impl FileSystemStore {
    /// Wrap `fs`, failing if it reports itself unusable.
    pub fn new(fs: Arc<dyn FileSystem>, extensions: &[String]) -> Result<Self> {
        fs.check().map_err(|e| EngineError::FileSystemUnavailable {
            reason: e.to_string(),
        })?;

        let mut extensions = extensions.to_vec();
        extensions.sort_by(|a, b| b.len().cmp(&a.len()));
        Ok(Self {
            fs,
            extensions,
        })
    }

    fn candidates<'a>(&'a self, key: &'a str) -> impl Iterator<Item = String> + 'a {
        self.extensions.iter().map(move |ext| format!("{key}{ext}"))
    }

    /// Open the first candidate that exists. Errors other than absence are returned.
    fn open(&self, key: &str) -> Result<Option<(String, Box<dyn Read + Send>)>> {
        for path in self.candidates(key) {
            match self.fs.open(&path) {
                Ok(file) => return Ok(Some((path, file))),
                Err(error) if is_absent(&error) => continue,
                Err(source) => return Err(EngineError::Read { path, source }),
            }
        }
        Ok(None)
    }
}

/// Whether an open error means "no such template" rather than a failed read.
fn is_absent(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory | io::ErrorKind::InvalidInput
    )
}

impl SourceStore for FileSystemStore {
    fn exists(&self, key: &str) -> bool {
        match self.open(key) {
            Ok(found) => found.is_some(),
            Err(error) => {
                tracing::debug!(key, "treating unreadable template as missing: {error}");
                false
            }
        }
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        let Some((path, mut file)) = self.open(key)? else {
            return Ok(None);
        };

        let mut source = String::new();
        file.read_to_string(&mut source).map_err(|source| EngineError::Read {
            path,
            source,
        })?;
        Ok(Some(source))
    }

    fn set(&mut self, _key: &str, _source: String) -> Result<()> {
        Err(EngineError::ReadOnlyStore)
    }

    fn delete(&mut self, _key: &str) -> Result<()> {
        Err(EngineError::ReadOnlyStore)
    }

    fn keys(&self) -> Option<Vec<String>> {
        None
    }

    fn is_in_memory(&self) -> bool {
        false
    }
}
