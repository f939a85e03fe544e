// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Soft-delete and hide-marker bookkeeping for one fold.
//!
//! Both ledgers record markers without consulting the authorization gate and
//! apply the gate only when asked whether a marker suppresses something.
use std::borrow::Borrow;
use std::collections::BTreeMap;

use crate::column::HiddenMarker;
use crate::ident::Timestamp;
use crate::visibility::{AuthorizationGate, Visibility};

/// Soft-delete timestamps keyed by target.
#[derive(Clone, Debug)]
pub struct TombstoneLedger<K> {
    entries: BTreeMap<K, Vec<(Timestamp, Visibility)>>,
}

impl<K> Default for TombstoneLedger<K> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<K: Ord> TombstoneLedger<K> {
    /// Records a soft delete of `target` at `timestamp`.
    ///
    /// Only the newest timestamp per (target, visibility) is kept.
    pub fn record(&mut self, target: K, timestamp: Timestamp, visibility: Visibility) {
        let slot = self.entries.entry(target).or_default();
        match slot.iter_mut().find(|(_, v)| *v == visibility) {
            Some((ts, _)) => *ts = (*ts).max(timestamp),
            None => slot.push((timestamp, visibility)),
        }
    }

    /// True if a readable tombstone at or after `timestamp` exists for `target`.
    pub fn suppresses<Q>(
        &self,
        target: &Q,
        timestamp: Timestamp,
        gate: &(dyn AuthorizationGate + Sync),
    ) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.entries.get(target).is_some_and(|slot| {
            slot.iter()
                .any(|(ts, vis)| *ts >= timestamp && gate.can_read(vis))
        })
    }

    /// Number of distinct targets with at least one tombstone.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MarkerState {
    Hidden,
    Reversed,
}

/// Hide markers keyed by target and hiding visibility.
///
/// Markers must be recorded newest first. The first marker seen for a
/// (target, hiding visibility) pair decides its state: a hide is kept, an
/// unhide drops the pair so that older hides beneath it are ignored.
#[derive(Clone, Debug)]
pub struct HiddenLedger<K> {
    markers: BTreeMap<K, BTreeMap<Visibility, MarkerState>>,
}

impl<K> Default for HiddenLedger<K> {
    fn default() -> Self {
        Self {
            markers: BTreeMap::new(),
        }
    }
}

impl<K: Ord> HiddenLedger<K> {
    /// Records `marker` on `target` under `hiding` visibility.
    pub fn record(&mut self, target: K, hiding: Visibility, marker: HiddenMarker) {
        let state = match marker {
            HiddenMarker::Hide => MarkerState::Hidden,
            HiddenMarker::Unhide => MarkerState::Reversed,
        };
        self.markers
            .entry(target)
            .or_default()
            .entry(hiding)
            .or_insert(state);
    }

    /// Hiding visibilities on `target` that the caller can read.
    ///
    /// A marker suppresses only for callers who can read it; callers who
    /// cannot read the hiding visibility still see the target.
    pub fn readable_hiders<Q>(
        &self,
        target: &Q,
        gate: &(dyn AuthorizationGate + Sync),
    ) -> Vec<Visibility>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.markers
            .get(target)
            .map(|by_vis| {
                by_vis
                    .iter()
                    .filter(|(vis, state)| **state == MarkerState::Hidden && gate.can_read(vis))
                    .map(|(vis, _)| vis.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// True if any readable hide marker applies to `target`.
    pub fn is_hidden<Q>(&self, target: &Q, gate: &(dyn AuthorizationGate + Sync)) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.markers.get(target).is_some_and(|by_vis| {
            by_vis
                .iter()
                .any(|(vis, state)| *state == MarkerState::Hidden && gate.can_read(vis))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visibility::Authorizations;

    #[test]
    fn tombstone_at_or_after_suppresses() {
        let auths = Authorizations::new(["A"]);
        let mut ledger = TombstoneLedger::default();
        ledger.record("age", 150, Visibility::from("A"));
        assert!(ledger.suppresses("age", 100, &auths));
        assert!(ledger.suppresses("age", 150, &auths));
        assert!(!ledger.suppresses("age", 151, &auths));
        assert!(!ledger.suppresses("name", 1, &auths));
    }

    #[test]
    fn unreadable_tombstones_do_not_count() {
        let mut ledger = TombstoneLedger::default();
        ledger.record("age", 150, Visibility::from("B"));
        assert!(!ledger.suppresses("age", 100, &Authorizations::new(["A"])));
        assert!(ledger.suppresses("age", 100, &Authorizations::new(["B"])));
    }

    #[test]
    fn newest_marker_decides() {
        let auths = Authorizations::new(["A"]);
        let mut ledger = HiddenLedger::default();
        // newest first: unhide@20 then hide@10
        ledger.record("p", Visibility::from("A"), HiddenMarker::Unhide);
        ledger.record("p", Visibility::from("A"), HiddenMarker::Hide);
        assert!(!ledger.is_hidden("p", &auths));

        let mut ledger = HiddenLedger::default();
        ledger.record("p", Visibility::from("A"), HiddenMarker::Hide);
        ledger.record("p", Visibility::from("A"), HiddenMarker::Unhide);
        assert!(ledger.is_hidden("p", &auths));
    }

    #[test]
    fn hide_polarity_follows_marker_readability() {
        let mut ledger = HiddenLedger::default();
        ledger.record("p", Visibility::from("SECRET"), HiddenMarker::Hide);
        assert!(ledger.is_hidden("p", &Authorizations::new(["SECRET"])));
        assert!(!ledger.is_hidden("p", &Authorizations::none()));
        assert_eq!(
            ledger.readable_hiders("p", &Authorizations::new(["SECRET"])),
            vec![Visibility::from("SECRET")]
        );
    }
}
