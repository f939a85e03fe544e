// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! In-memory [`ConfigStore`] for tests that should not touch the filesystem.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use vellum_app_core::config::{ConfigError, ConfigStore};

#[derive(Debug, Default)]
struct State {
    docs: BTreeMap<String, Vec<u8>>,
    reads: usize,
    writes: usize,
    offline: bool,
}

/// Shared in-memory document map. Clones see the same documents.
#[derive(Debug, Clone, Default)]
pub struct InMemoryConfigStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryConfigStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with one raw document.
    pub fn seeded(key: &str, doc: impl Into<Vec<u8>>) -> Self {
        let store = Self::new();
        store.lock().docs.insert(key.to_owned(), doc.into());
        store
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// While offline, every call fails with [`ConfigError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    /// Raw document under `key`.
    pub fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.lock().docs.get(key).cloned()
    }

    /// `load_raw` calls so far, failed ones included.
    pub fn reads(&self) -> usize {
        self.lock().reads
    }

    /// `save_raw` calls so far, failed ones included.
    pub fn writes(&self) -> usize {
        self.lock().writes
    }
}

impl ConfigStore for InMemoryConfigStore {
    fn load_raw(&self, key: &str) -> Result<Option<Vec<u8>>, ConfigError> {
        let mut state = self.lock();
        state.reads += 1;
        if state.offline {
            return Err(ConfigError::Unavailable("store offline".into()));
        }
        Ok(state.docs.get(key).cloned())
    }

    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
        let mut state = self.lock();
        state.writes += 1;
        if state.offline {
            return Err(ConfigError::Unavailable("store offline".into()));
        }
        state.docs.insert(key.to_owned(), data.to_vec());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_documents_and_counters() {
        let a = InMemoryConfigStore::new();
        let b = a.clone();
        a.save_raw("reader", b"{}").unwrap();
        assert_eq!(b.load_raw("reader").unwrap().as_deref(), Some(&b"{}"[..]));
        assert_eq!((b.writes(), a.reads()), (1, 1));
    }

    #[test]
    fn offline_store_rejects_writes_without_storing() {
        let store = InMemoryConfigStore::seeded("reader", "{}");
        store.set_offline(true);
        assert!(matches!(
            store.save_raw("other", b"x"),
            Err(ConfigError::Unavailable(_))
        ));
        store.set_offline(false);
        assert_eq!(store.raw("other"), None);
        assert_eq!(store.load_raw("missing").unwrap(), None);
    }
}
