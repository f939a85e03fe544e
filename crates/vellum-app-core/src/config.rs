// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Config service and storage port for Vellum tools.
//!
//! Documents are JSON blobs addressed by a short key (`reader`, ...). Keys are
//! restricted to `[a-z0-9_-]` so every adapter can map them onto file names.

use std::path::PathBuf;

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Storage port for raw config documents.
pub trait ConfigStore {
    /// Raw bytes stored under `key`, or `None` when nothing was saved.
    fn load_raw(&self, key: &str) -> Result<Option<Vec<u8>>, ConfigError>;
    /// Replaces the document under `key`.
    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError>;
}

/// Config failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Key outside `[a-z0-9_-]+`.
    #[error("invalid config key {0:?}")]
    InvalidKey(String),
    /// Filesystem failure.
    #[error("config io at {}", path.display())]
    Io {
        /// Path being read or written.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The stored document does not match the requested type.
    #[error("config {key:?} does not parse")]
    Serde {
        /// Document key.
        key: String,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },
    /// The backing store cannot serve requests.
    #[error("config store unavailable: {0}")]
    Unavailable(String),
}

/// Checks that `key` can be used by every store.
pub fn validate_key(key: &str) -> Result<(), ConfigError> {
    let ok = !key.is_empty()
        && key
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_' || b == b'-');
    if ok {
        Ok(())
    } else {
        Err(ConfigError::InvalidKey(key.to_owned()))
    }
}

/// Typed JSON documents on top of a [`ConfigStore`].
#[derive(Debug, Clone)]
pub struct ConfigService<S> {
    store: S,
}

impl<S> ConfigService<S> {
    /// Wraps `store`.
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// The wrapped store.
    pub const fn store(&self) -> &S {
        &self.store
    }
}

impl<S: ConfigStore> ConfigService<S> {
    /// Loads the document under `key`; `Ok(None)` when absent or empty.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        validate_key(key)?;
        match self.store.load_raw(key)? {
            Some(bytes) if !bytes.is_empty() => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|source| ConfigError::Serde {
                    key: key.to_owned(),
                    source,
                }),
            _ => Ok(None),
        }
    }

    /// Like [`load`](Self::load), with `T::default()` for a missing document.
    pub fn load_or_default<T: DeserializeOwned + Default>(
        &self,
        key: &str,
    ) -> Result<T, ConfigError> {
        Ok(self.load(key)?.unwrap_or_default())
    }

    /// Whether a non-empty document exists under `key`.
    pub fn contains(&self, key: &str) -> Result<bool, ConfigError> {
        validate_key(key)?;
        Ok(self.store.load_raw(key)?.is_some_and(|b| !b.is_empty()))
    }

    /// Saves `value` as pretty JSON under `key`.
    pub fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<(), ConfigError> {
        validate_key(key)?;
        let data = serde_json::to_vec_pretty(value).map_err(|source| ConfigError::Serde {
            key: key.to_owned(),
            source,
        })?;
        self.store.save_raw(key, &data)
    }
}
