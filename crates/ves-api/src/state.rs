//! # Application State
//!
//! Everything the handlers share, cloned into each request through the
//! `State` extractor.
//!
//! ## Architecture
//!
//! One process owns one set of stores and one coordinator over them:
//! - **EvidenceStore** — certified records, batch assignment.
//! - **BatchStore** — anchoring runs and their receipts.
//! - **LedgerStore** — per-record custody chains.
//! - **Coordinator** — the batch anchoring orchestrator; handlers only
//!   ever call `run()`, serialization lives inside.
//! - **TSA** — the timestamping authority the certify route stamps
//!   provisional hashes with.
//!
//! Everything is cheaply cloneable; clones share the underlying maps.

use std::sync::Arc;

use ves_state::{
    BatchAnchorCoordinator, BatchStore, EvidenceStore, LedgerStore, MockAnchorTarget,
    MockTimestampAuthority,
};

use crate::config::AppConfig;

/// The coordinator type this process runs.
pub type Coordinator = BatchAnchorCoordinator<MockAnchorTarget>;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Certified evidence records.
    pub evidence: EvidenceStore,
    /// Anchoring batches.
    pub batches: BatchStore,
    /// Per-record custody chains.
    pub ledger: LedgerStore,
    /// The anchoring orchestrator over the stores above.
    pub coordinator: Arc<Coordinator>,
    /// Timestamping authority for certification stamps.
    pub tsa: Arc<MockTimestampAuthority>,
    /// Startup configuration.
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Build the process state from configuration.
    ///
    /// The coordinator is wired over clones of the same stores the
    /// handlers read, so a batch run and a record lookup always see one
    /// world.
    pub fn new(config: AppConfig) -> Self {
        let evidence = EvidenceStore::new();
        let batches = BatchStore::new();
        let ledger = LedgerStore::new();
        let coordinator = Arc::new(BatchAnchorCoordinator::new(
            evidence.clone(),
            batches.clone(),
            ledger.clone(),
            MockAnchorTarget::new(&config.chain_network),
            config.coordinator_config(),
        ));

        Self {
            evidence,
            batches,
            ledger,
            coordinator,
            tsa: Arc::new(MockTimestampAuthority::new()),
            config: Arc::new(config),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::test_config;

    #[test]
    fn coordinator_shares_stores_with_handlers() {
        let state = AppState::new(test_config("token"));
        // A clone of the state sees the same store contents.
        let clone = state.clone();
        assert_eq!(state.evidence.len(), clone.evidence.len());
        assert!(state.batches.is_empty());
        assert_eq!(
            state.coordinator.anchor_target().wallet_address(),
            clone.coordinator.anchor_target().wallet_address()
        );
    }
}
