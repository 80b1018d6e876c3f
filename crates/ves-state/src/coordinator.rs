//! # Batch Anchor Coordinator
//!
//! Orchestrates one anchoring run: admission control, oldest-first
//! selection of unbatched evidence, Merkle commitment, the external anchor
//! call, proof fan-out, and custody auditing.
//!
//! ## Security Invariant
//!
//! The pending batch row is persisted before the anchor call is made. A
//! crash between commitment and anchor confirmation leaves a durable
//! pending batch for reconciliation instead of a root that was anchored
//! but never recorded. The run gate is held from admission check through
//! that insert, closing the window where two concurrent triggers could
//! both pass admission; it is released before the anchor await so no lock
//! is ever held across the external call.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::Instrument;

use ves_core::{BatchId, CertificationId, ContentHash, Timestamp};
use ves_evidence::CustodyEventKind;
use ves_merkle::{MerkleError, MerkleTree};

use crate::anchor::{AnchorError, AnchorReceipt, AnchorTarget};
use crate::model::{BatchStatus, MerkleBatch};
use crate::store::{BatchStore, EvidenceStore, LedgerStore, StoreError};

/// Tunables for the anchoring protocol.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Minimum seconds between batch creations, of any outcome.
    pub min_batch_interval_secs: u64,
    /// Maximum evidence records committed per batch.
    pub max_batch_size: usize,
    /// Seconds the anchor call may take before the batch is failed.
    pub anchor_timeout_secs: u64,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            min_batch_interval_secs: 3600,
            max_batch_size: 1000,
            anchor_timeout_secs: 30,
        }
    }
}

/// Faults that abort a run. Expected conditions (rate limit, empty
/// selection, anchor failure) are [`RunOutcome`] variants, not errors.
#[derive(Error, Debug)]
pub enum CoordinatorError {
    /// A store operation violated its contract.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Tree construction failed.
    #[error(transparent)]
    Merkle(#[from] MerkleError),
}

/// Which fan-out stage a per-record failure occurred in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FanoutStage {
    /// Attaching the batch id and inclusion proof to the record.
    ProofAttach,
    /// Appending the `anchored_on_chain` custody event.
    CustodyAppend,
}

/// One record the fan-out could not fully process.
#[derive(Debug, Clone, Serialize)]
pub struct FanoutFailure {
    /// The affected record.
    pub certification_id: CertificationId,
    /// The stage that failed.
    pub stage: FanoutStage,
    /// Failure detail.
    pub reason: String,
}

/// Per-record results of the post-anchor fan-out.
///
/// Failures are collected and returned, never swallowed; the batch stays
/// anchored regardless.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FanoutReport {
    /// Records that received their batch assignment and proof.
    pub proofs_attached: u64,
    /// Records that received their `anchored_on_chain` custody event.
    pub custody_appended: u64,
    /// Records with at least one failed stage.
    pub failures: Vec<FanoutFailure>,
}

impl FanoutReport {
    /// Whether every record was fully processed.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Result of one coordinator run.
#[derive(Debug)]
pub enum RunOutcome {
    /// Admission refused: a batch was created too recently.
    RateLimited {
        /// Seconds until the next run is admissible.
        retry_after_secs: u64,
    },
    /// No eligible evidence; no batch row was created.
    NoOp,
    /// Batch committed and anchored.
    Anchored {
        /// The new batch.
        batch_id: BatchId,
        /// The batch's human-readable run key.
        batch_key: String,
        /// The committed root.
        merkle_root: ContentHash,
        /// Number of records committed under the root.
        evidence_count: u64,
        /// The anchor receipt.
        receipt: AnchorReceipt,
        /// Per-record fan-out results.
        fanout: FanoutReport,
    },
    /// Batch committed but the anchor call failed; the batch is marked
    /// failed and its records stay eligible for the next run.
    AnchorFailed {
        /// The failed batch.
        batch_id: BatchId,
        /// What the anchor call reported.
        error: AnchorError,
    },
}

/// The anchoring orchestrator. One instance per process; runs are
/// triggered externally and serialized by the run gate.
pub struct BatchAnchorCoordinator<A: AnchorTarget> {
    evidence: EvidenceStore,
    batches: BatchStore,
    ledger: LedgerStore,
    anchor_target: A,
    config: CoordinatorConfig,
    run_gate: Mutex<()>,
}

impl<A: AnchorTarget> BatchAnchorCoordinator<A> {
    /// Create a coordinator over the given stores and anchor target.
    pub fn new(
        evidence: EvidenceStore,
        batches: BatchStore,
        ledger: LedgerStore,
        anchor_target: A,
        config: CoordinatorConfig,
    ) -> Self {
        Self {
            evidence,
            batches,
            ledger,
            anchor_target,
            config,
            run_gate: Mutex::new(()),
        }
    }

    /// The anchor target this coordinator submits roots to.
    pub fn anchor_target(&self) -> &A {
        &self.anchor_target
    }

    /// Execute one anchoring run.
    ///
    /// # Errors
    ///
    /// Only store or tree contract violations error; every expected
    /// condition is a [`RunOutcome`] variant.
    pub async fn run(&self) -> Result<RunOutcome, CoordinatorError> {
        let now = Timestamp::now();
        let batch_key = batch_key_for(&now);
        let span = tracing::info_span!("batch_run", %batch_key);
        self.run_inner(now, batch_key).instrument(span).await
    }

    async fn run_inner(
        &self,
        now: Timestamp,
        batch_key: String,
    ) -> Result<RunOutcome, CoordinatorError> {
        // Admission through pending insert runs under the gate; the gate
        // drops before the anchor await.
        let (batch_id, merkle_root, tree, selected) = {
            let _gate = self.run_gate.lock().await;

            if let Some(latest) = self.batches.latest_created() {
                let interval =
                    i64::try_from(self.config.min_batch_interval_secs).unwrap_or(i64::MAX);
                let next_allowed = latest.created_at.plus_secs(interval);
                let wait = now.seconds_until(&next_allowed);
                if wait > 0 {
                    tracing::info!(retry_after_secs = wait, "batch run rate limited");
                    return Ok(RunOutcome::RateLimited {
                        retry_after_secs: wait as u64,
                    });
                }
            }

            let selected = self
                .evidence
                .unbatched_oldest_first(self.config.max_batch_size);
            if selected.is_empty() {
                tracing::info!("no eligible evidence, skipping batch");
                return Ok(RunOutcome::NoOp);
            }

            let leaves: Vec<ContentHash> = selected
                .iter()
                .map(|record| record.evidence_hash.clone())
                .collect();
            let tree = MerkleTree::build(&leaves)?;
            let merkle_root = tree.root().clone();
            let batch_id = BatchId::new();
            self.batches.insert(MerkleBatch {
                id: batch_id,
                batch_key: batch_key.clone(),
                merkle_root: merkle_root.clone(),
                certification_count: selected.len() as u64,
                status: BatchStatus::Pending,
                chain_tx_hash: None,
                chain_block_number: None,
                chain_network: None,
                anchored_at: None,
                created_at: now,
            })?;
            tracing::info!(
                count = selected.len(),
                root = %merkle_root,
                "pending batch committed"
            );
            (batch_id, merkle_root, tree, selected)
        };

        let timeout = Duration::from_secs(self.config.anchor_timeout_secs);
        let anchor_call = self.anchor_target.anchor(&merkle_root, &batch_key);
        let receipt = match tokio::time::timeout(timeout, anchor_call).await {
            Ok(Ok(receipt)) => receipt,
            Ok(Err(error)) => return self.fail_batch(batch_id, error),
            Err(_elapsed) => {
                return self.fail_batch(
                    batch_id,
                    AnchorError::Timeout {
                        secs: self.config.anchor_timeout_secs,
                    },
                )
            }
        };

        self.batches.mark_anchored(&batch_id, &receipt)?;
        tracing::info!(
            tx_hash = %receipt.tx_hash,
            block_number = receipt.block_number,
            "batch anchored"
        );

        // One proof map for the whole batch; every record gets its proof
        // and its audit event, and per-record failures go in the report.
        let proofs = tree.prove_all();
        let mut fanout = FanoutReport::default();
        for record in &selected {
            match proofs.get(&record.evidence_hash) {
                Some(proof) => {
                    match self.evidence.assign_batch(&record.id, batch_id, proof.clone()) {
                        Ok(()) => fanout.proofs_attached += 1,
                        Err(err) => fanout.failures.push(FanoutFailure {
                            certification_id: record.id,
                            stage: FanoutStage::ProofAttach,
                            reason: err.to_string(),
                        }),
                    }
                }
                None => fanout.failures.push(FanoutFailure {
                    certification_id: record.id,
                    stage: FanoutStage::ProofAttach,
                    reason: "no proof generated for leaf".to_string(),
                }),
            }

            let audit = CustodyEventKind::AnchoredOnChain {
                batch_id,
                merkle_root: merkle_root.clone(),
                tx_hash: receipt.tx_hash.clone(),
            };
            match self.ledger.append(record.id, audit, Timestamp::now()) {
                Ok(_) => fanout.custody_appended += 1,
                Err(err) => fanout.failures.push(FanoutFailure {
                    certification_id: record.id,
                    stage: FanoutStage::CustodyAppend,
                    reason: err.to_string(),
                }),
            }
        }
        if !fanout.is_clean() {
            tracing::warn!(failures = fanout.failures.len(), "batch fan-out had failures");
        }

        Ok(RunOutcome::Anchored {
            batch_id,
            batch_key,
            merkle_root,
            evidence_count: selected.len() as u64,
            receipt,
            fanout,
        })
    }

    fn fail_batch(
        &self,
        batch_id: BatchId,
        error: AnchorError,
    ) -> Result<RunOutcome, CoordinatorError> {
        self.batches.mark_failed(&batch_id)?;
        tracing::warn!(%batch_id, %error, "anchor call failed, batch marked failed");
        Ok(RunOutcome::AnchorFailed { batch_id, error })
    }
}

/// The human-readable run key for a batch created at `at`.
fn batch_key_for(at: &Timestamp) -> String {
    at.as_datetime().format("batch-%Y%m%d-%H%M%S").to_string()
}
