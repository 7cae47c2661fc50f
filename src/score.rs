//! Run and lifetime score bookkeeping
//!
//! Run points accumulate during a session. Committing folds them into the
//! lifetime total, which is only persisted when an identity (wallet address)
//! is connected. There is no anonymous progress.

use serde::{Deserialize, Serialize};

use crate::persistence::{KvStore, get_or_none};

/// Storage key prefix; the identity is appended
pub const SCORE_KEY_PREFIX: &str = "extol_score_";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreLedger {
    run_points: u64,
    total_points: u64,
    identity: Option<String>,
}

impl ScoreLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn storage_key(identity: &str) -> String {
        format!("{SCORE_KEY_PREFIX}{identity}")
    }

    pub fn run_points(&self) -> u64 {
        self.run_points
    }

    pub fn total_points(&self) -> u64 {
        self.total_points
    }

    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    /// Add to the current run. The ledger does not check the phase; callers
    /// only award points while a run is live.
    pub fn add_points(&mut self, points: u64) {
        self.run_points = self.run_points.saturating_add(points);
    }

    /// Start a fresh run
    pub fn begin_run(&mut self) {
        self.run_points = 0;
    }

    /// Fold the run into the total and persist it under the identity.
    ///
    /// Returns the new total when an identity is connected. The run is
    /// zeroed either way.
    pub fn commit_run(&mut self, store: &mut dyn KvStore) -> Option<u64> {
        let points = std::mem::take(&mut self.run_points);
        let identity = self.identity.as_deref()?;

        self.total_points = self.total_points.saturating_add(points);
        let key = Self::storage_key(identity);
        if let Err(e) = store.set(&key, &self.total_points.to_string()) {
            log::warn!("failed to persist score for {}: {}", identity, e);
        }
        log::info!(
            "Committed {} points for {} (total {})",
            points,
            identity,
            self.total_points
        );
        Some(self.total_points)
    }

    /// Switch to `identity` (or disconnect with `None`) and load its total.
    /// Missing or unreadable totals load as zero.
    pub fn load_score(&mut self, identity: Option<&str>, store: &dyn KvStore) {
        self.identity = identity.map(str::to_string);
        self.run_points = 0;
        self.total_points = match identity {
            Some(id) => {
                let key = Self::storage_key(id);
                get_or_none(store, &key)
                    .and_then(|raw| match raw.trim().parse::<u64>() {
                        Ok(total) => Some(total),
                        Err(_) => {
                            log::warn!("ignoring unparseable score {:?} for {}", raw, id);
                            None
                        }
                    })
                    .unwrap_or(0)
            }
            None => 0,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;
    use crate::persistence::tests::BrokenStore;

    const WALLET: &str = "7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU";

    #[test]
    fn test_commit_without_identity_keeps_total() {
        let mut store = MemoryStore::new();
        let mut ledger = ScoreLedger::new();
        ledger.add_points(300);
        assert_eq!(ledger.commit_run(&mut store), None);
        assert_eq!(ledger.run_points(), 0);
        assert_eq!(ledger.total_points(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_commit_with_identity_persists() {
        let mut store = MemoryStore::new();
        store.set(&ScoreLedger::storage_key(WALLET), "1000").unwrap();

        let mut ledger = ScoreLedger::new();
        ledger.load_score(Some(WALLET), &store);
        assert_eq!(ledger.total_points(), 1000);

        ledger.add_points(250);
        ledger.add_points(50);
        assert_eq!(ledger.commit_run(&mut store), Some(1300));
        assert_eq!(ledger.run_points(), 0);
        assert_eq!(
            store.get(&ScoreLedger::storage_key(WALLET)).unwrap().as_deref(),
            Some("1300")
        );
    }

    #[test]
    fn test_disconnect_zeroes_everything() {
        let mut store = MemoryStore::new();
        store.set(&ScoreLedger::storage_key(WALLET), "77").unwrap();
        let mut ledger = ScoreLedger::new();
        ledger.load_score(Some(WALLET), &store);
        ledger.add_points(5);

        ledger.load_score(None, &store);
        assert_eq!(ledger.identity(), None);
        assert_eq!(ledger.total_points(), 0);
        assert_eq!(ledger.run_points(), 0);
    }

    #[test]
    fn test_bad_stored_values_load_as_zero() {
        let mut store = MemoryStore::new();
        store.set(&ScoreLedger::storage_key("a"), "lots").unwrap();
        let mut ledger = ScoreLedger::new();
        ledger.load_score(Some("a"), &store);
        assert_eq!(ledger.total_points(), 0);

        ledger.load_score(Some("never-seen"), &store);
        assert_eq!(ledger.total_points(), 0);

        ledger.load_score(Some("a"), &BrokenStore);
        assert_eq!(ledger.total_points(), 0);
        assert_eq!(ledger.identity(), Some("a"));
    }

    #[test]
    fn test_failed_persist_still_updates_total() {
        let mut ledger = ScoreLedger::new();
        ledger.load_score(Some("a"), &BrokenStore);
        ledger.add_points(10);
        assert_eq!(ledger.commit_run(&mut BrokenStore), Some(10));
    }
}
