use std::collections::HashMap;

use super::SourceStore;
use crate::core::Result;

/// In-memory template sources.
///
/// Entries are never evicted; they live until the watcher deletes them or the
/// engine replaces the whole store on reload.
#[derive(Debug, Default)]
pub struct MemoryStore {
    sources: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl SourceStore for MemoryStore {
    fn exists(&self, key: &str) -> bool {
        self.sources.contains_key(key)
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.sources.get(key).cloned())
    }

    fn set(&mut self, key: &str, source: String) -> Result<()> {
        self.sources.insert(key.to_string(), source);
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<()> {
        self.sources.remove(key);
        Ok(())
    }

    fn keys(&self) -> Option<Vec<String>> {
        let mut keys: Vec<String> = self.sources.keys().cloned().collect();
        keys.sort();
        Some(keys)
    }

    fn is_in_memory(&self) -> bool {
        true
    }
}
