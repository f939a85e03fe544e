// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Authorization gate that records every visibility it is asked about.
//!
//! The fold consults the gate only after fetch-hint inclusion passed, so a
//! visibility unique to an excluded column must never show up here.

use std::collections::BTreeMap;
use std::sync::Mutex;
use vellum_core::{AuthorizationGate, Authorizations, Visibility};

/// Wraps [`Authorizations`] and counts `can_read` calls per visibility.
#[derive(Debug, Default)]
pub struct CountingGate {
    authorizations: Authorizations,
    seen: Mutex<BTreeMap<String, usize>>,
}

impl CountingGate {
    /// Gate answering like `authorizations`.
    pub fn new(authorizations: Authorizations) -> Self {
        Self {
            authorizations,
            seen: Mutex::new(BTreeMap::new()),
        }
    }

    /// How often `visibility` was consulted.
    pub fn consulted(&self, visibility: &str) -> usize {
        self.seen
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(visibility)
            .copied()
            .unwrap_or(0)
    }

    /// Total number of consultations.
    pub fn total(&self) -> usize {
        self.seen
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .sum()
    }
}

impl AuthorizationGate for CountingGate {
    fn can_read(&self, visibility: &Visibility) -> bool {
        *self
            .seen
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(visibility.as_str().to_owned())
            .or_default() += 1;
        self.authorizations.can_read(visibility)
    }
}
