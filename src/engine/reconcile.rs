//! Applying watcher events to the in-memory store.
//!
//! | op | directory | template file |
//! |----|-----------|---------------|
//! | create / write | subscribe | read and `set` |
//! | remove / rename | unsubscribe | `delete` |
//!
//! Whether a path is a directory is asked of the file system when the event is
//! handled. A removed path no longer exists, so for removals a path also counts
//! as a directory when the watcher is subscribed to it. Paths the normalizer
//! rejects are ignored.

use std::fs;

use super::EngineInner;
use crate::observer::{ErrorOrigin, StoreChange};
use crate::watcher::WatchEvent;

impl EngineInner {
    /// Bring the store in line with one file-system change.
    ///
    /// Never fails: errors go to the observer and the event is dropped, leaving
    /// the store at its last known value for the affected key.
    pub(crate) fn reconcile(&self, event: &WatchEvent) {
        let path = event.path.as_path();
        let on_disk_dir = path.is_dir();

        if !on_disk_dir && !event.is_removal() {
            let Some(template) = self.normalizer.normalize(path) else {
                return;
            };

            // Read before locking so slow reads do not block renders.
            let source = match fs::read_to_string(path) {
                Ok(source) => source,
                Err(error) => {
                    self.swallow(ErrorOrigin::WatchRead, path, &error);
                    return;
                }
            };

            let result = self.write_state().store.set(&template.key, source);
            match result {
                Ok(()) => {
                    tracing::debug!(key = %template.key, op = ?event.op, "template updated");
                    self.observer.reconciled(&StoreChange::Set {
                        key: template.key,
                        path: path.to_path_buf(),
                    });
                }
                Err(error) => self.swallow(ErrorOrigin::WatchRead, path, &error),
            }
            return;
        }

        let mut state = self.write_state();
        let watched = state.watcher.as_ref().is_some_and(|w| w.is_watching(path));

        if on_disk_dir || watched {
            let Some(watcher) = state.watcher.as_mut() else {
                return;
            };
            if event.is_removal() {
                if let Err(error) = watcher.unwatch(path) {
                    tracing::debug!(dir = %path.display(), "directory already unsubscribed: {error}");
                }
            } else if let Err(error) = watcher.watch(path) {
                drop(state);
                self.swallow(ErrorOrigin::WatchSubscription, path, &error);
            }
            return;
        }

        let Some(template) = self.normalizer.normalize(path) else {
            return;
        };

        let result = state.store.delete(&template.key);
        drop(state);
        match result {
            Ok(()) => {
                tracing::debug!(key = %template.key, op = ?event.op, "template removed");
                self.observer.reconciled(&StoreChange::Deleted {
                    key: template.key,
                    path: path.to_path_buf(),
                });
            }
            Err(error) => self.swallow(ErrorOrigin::WatchRead, path, &error),
        }
    }
}
