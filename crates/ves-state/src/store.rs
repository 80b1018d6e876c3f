//! # In-Memory Stores
//!
//! Thread-safe stores for evidence records, batch records, and the custody
//! ledger. All operations are synchronous (the locks are `parking_lot`, not
//! `tokio::sync`) because no guard is ever held across an `.await` point.
//! `parking_lot` locks are non-poisonable — a panicking writer does not
//! permanently corrupt a store.
//!
//! ## Security Invariant
//!
//! Mutations that back tamper-evidence guarantees run under a single write
//! lock: batch assignment is checked-and-set atomically (null to value,
//! once), and custody appends for one certification id read the previous
//! link and push the new event without releasing the lock, so a record's
//! chain can never fork.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;

use ves_core::{BatchId, CanonicalError, CertificationId, ContentHash, CreatorId, Timestamp};
use ves_evidence::{
    verify_chain, ChainViolation, CreatorContinuity, CustodyEvent, CustodyEventKind,
};
use ves_merkle::MerkleProof;

use crate::anchor::AnchorReceipt;
use crate::model::{BatchStatus, EvidenceRecord, EvidenceStatus, MerkleBatch};

// -- Errors -------------------------------------------------------------------

/// Store-level failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No record with the given id.
    #[error("record not found: {id}")]
    NotFound {
        /// Display form of the missing id.
        id: String,
    },

    /// Batch assignment attempted on an already-assigned record.
    #[error("evidence already batched: {id}")]
    AlreadyBatched {
        /// The record whose assignment was refused.
        id: CertificationId,
    },

    /// Insert attempted with an id that already exists.
    #[error("duplicate id: {id}")]
    DuplicateId {
        /// Display form of the colliding id.
        id: String,
    },
}

// -- Generic In-Memory Store --------------------------------------------------

/// Thread-safe, cloneable in-memory key-value store over typed ids.
#[derive(Debug)]
pub struct Store<K, T>
where
    K: Eq + Hash + Copy + Send + Sync,
    T: Clone + Send + Sync,
{
    data: Arc<RwLock<HashMap<K, T>>>,
}

impl<K, T> Clone for Store<K, T>
where
    K: Eq + Hash + Copy + Send + Sync,
    T: Clone + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

impl<K, T> Store<K, T>
where
    K: Eq + Hash + Copy + Send + Sync,
    T: Clone + Send + Sync,
{
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Insert a record only if the key is vacant. Returns `false` without
    /// touching the store when the key already exists.
    pub fn insert_if_absent(&self, id: K, value: T) -> bool {
        match self.data.write().entry(id) {
            Entry::Vacant(slot) => {
                slot.insert(value);
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    /// Retrieve a record by id.
    pub fn get(&self, id: &K) -> Option<T> {
        self.data.read().get(id).cloned()
    }

    /// List all records.
    pub fn list(&self) -> Vec<T> {
        self.data.read().values().cloned().collect()
    }

    /// List the records matching a predicate.
    pub fn filter(&self, pred: impl Fn(&T) -> bool) -> Vec<T> {
        self.data
            .read()
            .values()
            .filter(|value| pred(value))
            .cloned()
            .collect()
    }

    /// Update a record in place. Returns the updated record, or `None` if
    /// not found.
    pub fn update(&self, id: &K, f: impl FnOnce(&mut T)) -> Option<T> {
        let mut guard = self.data.write();
        if let Some(entry) = guard.get_mut(id) {
            f(entry);
            Some(entry.clone())
        } else {
            None
        }
    }

    /// Read, validate, and rewrite one record under a single lock hold.
    ///
    /// The closure may inspect current state, validate preconditions, mutate
    /// the record, and return `Ok(R)` or `Err(E)`. The whole operation runs
    /// under one write lock, eliminating TOCTOU races between read and
    /// update. Returns `None` if the record does not exist.
    pub fn try_update<R, E>(
        &self,
        id: &K,
        f: impl FnOnce(&mut T) -> Result<R, E>,
    ) -> Option<Result<R, E>> {
        self.data.write().get_mut(id).map(f)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, T> Default for Store<K, T>
where
    K: Eq + Hash + Copy + Send + Sync,
    T: Clone + Send + Sync,
{
    fn default() -> Self {
        Self::new()
    }
}

// -- Evidence Store -----------------------------------------------------------

/// Store of certified evidence records.
#[derive(Debug, Clone, Default)]
pub struct EvidenceStore {
    records: Store<CertificationId, EvidenceRecord>,
    next_seq: Arc<AtomicU64>,
}

impl EvidenceStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Persist a new record. Records are never overwritten.
    ///
    /// The store assigns `seq` on insert; whatever the caller set is
    /// replaced.
    pub fn insert(&self, mut record: EvidenceRecord) -> Result<(), StoreError> {
        let id = record.id;
        record.seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        if self.records.insert_if_absent(id, record) {
            Ok(())
        } else {
            Err(StoreError::DuplicateId { id: id.to_string() })
        }
    }

    /// Retrieve a record by certification id.
    pub fn get(&self, id: &CertificationId) -> Option<EvidenceRecord> {
        self.records.get(id)
    }

    /// The valid, not-yet-batched records, oldest first, capped at `limit`.
    ///
    /// Ties on `created_at` (whole-second resolution) break by insertion
    /// sequence, so same-second records select in certification order.
    pub fn unbatched_oldest_first(&self, limit: usize) -> Vec<EvidenceRecord> {
        let mut eligible = self.records.filter(|record| {
            record.status == EvidenceStatus::Valid && record.merkle_batch_id.is_none()
        });
        eligible.sort_by_key(|record| (record.created_at, record.seq));
        eligible.truncate(limit);
        eligible
    }

    /// Assign a record to a batch, attaching its inclusion proof.
    ///
    /// The assignment is monotonic one-time: a record whose
    /// `merkle_batch_id` is already set refuses re-assignment with
    /// `StoreError::AlreadyBatched`. Check and set run under one write lock.
    pub fn assign_batch(
        &self,
        id: &CertificationId,
        batch_id: BatchId,
        proof: MerkleProof,
    ) -> Result<(), StoreError> {
        match self.records.try_update(id, |record| {
            if record.merkle_batch_id.is_some() {
                return Err(StoreError::AlreadyBatched { id: *id });
            }
            record.merkle_batch_id = Some(batch_id);
            record.merkle_proof = Some(proof);
            Ok(())
        }) {
            Some(result) => result,
            None => Err(StoreError::NotFound { id: id.to_string() }),
        }
    }

    /// Soft-revoke a record. The evidence hash and custody chain are
    /// untouched; the record stops being eligible for batching.
    pub fn revoke(&self, id: &CertificationId) -> Result<EvidenceRecord, StoreError> {
        self.records
            .update(id, |record| {
                record.status = EvidenceStatus::Revoked;
            })
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })
    }

    /// Continuity facts for a creator's next record: the evidence hash of
    /// their latest valid record and the count of their valid records so
    /// far (which is the next record's 0-based chain position).
    pub fn creator_continuity(&self, creator: &CreatorId) -> CreatorContinuity {
        let mut earlier = self.records.filter(|record| {
            record.evidence.creator.user_id == *creator && record.status == EvidenceStatus::Valid
        });
        earlier.sort_by_key(|record| (record.created_at, record.seq));
        CreatorContinuity {
            previous_evidence_hash: earlier.last().map(|record| record.evidence_hash.clone()),
            chain_position: earlier.len() as u64,
        }
    }

    /// Continuity facts for an existing record: its stored previous link
    /// and how many of the creator's valid records precede it, under the
    /// same (created_at, seq) order selection uses.
    ///
    /// `record` must carry its store-assigned `seq`, i.e. come from a
    /// store read rather than a caller-built literal.
    pub fn continuity_of(&self, record: &EvidenceRecord) -> CreatorContinuity {
        let creator = record.evidence.creator.user_id;
        let position = (record.created_at, record.seq);
        let earlier = self.records.filter(|other| {
            other.evidence.creator.user_id == creator
                && other.status == EvidenceStatus::Valid
                && (other.created_at, other.seq) < position
        });
        CreatorContinuity {
            previous_evidence_hash: record.previous_evidence_hash.clone(),
            chain_position: earlier.len() as u64,
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// -- Batch Store --------------------------------------------------------------

/// Store of Merkle batch records.
#[derive(Debug, Clone, Default)]
pub struct BatchStore {
    batches: Store<BatchId, MerkleBatch>,
}

impl BatchStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Persist a new batch row.
    pub fn insert(&self, batch: MerkleBatch) -> Result<(), StoreError> {
        let id = batch.id;
        if self.batches.insert_if_absent(id, batch) {
            Ok(())
        } else {
            Err(StoreError::DuplicateId { id: id.to_string() })
        }
    }

    /// Retrieve a batch by id.
    pub fn get(&self, id: &BatchId) -> Option<MerkleBatch> {
        self.batches.get(id)
    }

    /// The most recently created batch of any status. Admission control
    /// rate-limits against this row, so a failed run still counts.
    pub fn latest_created(&self) -> Option<MerkleBatch> {
        self.batches
            .list()
            .into_iter()
            .max_by_key(|batch| (batch.created_at, *batch.id.as_uuid()))
    }

    /// All batches, newest first.
    pub fn list_newest_first(&self) -> Vec<MerkleBatch> {
        let mut all = self.batches.list();
        all.sort_by_key(|batch| (batch.created_at, *batch.id.as_uuid()));
        all.reverse();
        all
    }

    /// Transition a pending batch to anchored, recording the receipt.
    pub fn mark_anchored(
        &self,
        id: &BatchId,
        receipt: &AnchorReceipt,
    ) -> Result<MerkleBatch, StoreError> {
        self.batches
            .update(id, |batch| {
                batch.status = BatchStatus::Anchored;
                batch.chain_tx_hash = Some(receipt.tx_hash.clone());
                batch.chain_block_number = Some(receipt.block_number);
                batch.chain_network = Some(receipt.network.clone());
                batch.anchored_at = Some(receipt.anchored_at);
            })
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })
    }

    /// Transition a pending batch to failed.
    pub fn mark_failed(&self, id: &BatchId) -> Result<MerkleBatch, StoreError> {
        self.batches
            .update(id, |batch| {
                batch.status = BatchStatus::Failed;
            })
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })
    }

    /// Number of batches.
    pub fn len(&self) -> usize {
        self.batches.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }
}

// -- Custody Ledger Store -----------------------------------------------------

/// Append-only store of per-record custody chains.
///
/// Appends for one certification id are serialized by the write lock:
/// reading the previous link and pushing the new event happen under the
/// same guard. Appends for different ids interleave freely.
#[derive(Debug, Default)]
pub struct LedgerStore {
    chains: Arc<RwLock<HashMap<CertificationId, Vec<CustodyEvent>>>>,
}

impl Clone for LedgerStore {
    fn clone(&self) -> Self {
        Self {
            chains: Arc::clone(&self.chains),
        }
    }
}

impl LedgerStore {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event to a record's chain, linking it to the latest
    /// event's `log_hash` (or null for genesis). Returns the new event's
    /// `log_hash`.
    pub fn append(
        &self,
        certification_id: CertificationId,
        kind: CustodyEventKind,
        at: Timestamp,
    ) -> Result<ContentHash, CanonicalError> {
        let mut chains = self.chains.write();
        let chain = chains.entry(certification_id).or_default();
        let previous = chain.last().map(|event| event.log_hash.clone());
        let event = CustodyEvent::create(certification_id, kind, previous, at)?;
        let log_hash = event.log_hash.clone();
        chain.push(event);
        Ok(log_hash)
    }

    /// Append an event only if the chain has no event of the same type yet.
    ///
    /// Returns `Ok(None)` when an event with the same type tag already
    /// exists. Check and append run under one write lock, so concurrent
    /// callers cannot both append.
    pub fn append_once(
        &self,
        certification_id: CertificationId,
        kind: CustodyEventKind,
        at: Timestamp,
    ) -> Result<Option<ContentHash>, CanonicalError> {
        let mut chains = self.chains.write();
        let chain = chains.entry(certification_id).or_default();
        if chain
            .iter()
            .any(|event| event.kind.event_type() == kind.event_type())
        {
            return Ok(None);
        }
        let previous = chain.last().map(|event| event.log_hash.clone());
        let event = CustodyEvent::create(certification_id, kind, previous, at)?;
        let log_hash = event.log_hash.clone();
        chain.push(event);
        Ok(Some(log_hash))
    }

    /// The record's events in append order. Empty when the record has no
    /// chain.
    pub fn events(&self, certification_id: &CertificationId) -> Vec<CustodyEvent> {
        self.chains
            .read()
            .get(certification_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Replay a record's chain, returning every integrity violation found.
    pub fn verify(&self, certification_id: &CertificationId) -> Vec<ChainViolation> {
        verify_chain(&self.events(certification_id))
    }
}
