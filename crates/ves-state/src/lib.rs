//! # VeriStamp State — Stores, Coordinator, Collaborators
//!
//! The stateful layer of the VeriStamp stack: in-memory stores for
//! evidence and batch records, the append-only custody ledger, the batch
//! anchor coordinator, and the async collaborator traits for the external
//! ledger and timestamp authority.
//!
//! ## Architecture
//!
//! - [`store`]: `parking_lot`-backed stores; mutations that carry
//!   tamper-evidence guarantees (batch assignment, custody appends) are
//!   atomic under one write lock.
//! - [`coordinator`]: the anchoring protocol — admission, selection,
//!   commit, anchor, fan-out, audit.
//! - [`anchor`] / [`tsa`]: collaborator traits with deterministic in-tree
//!   mocks; real deployments supply their own implementations.
//!
//! Locks are never held across `.await`: the coordinator releases its run
//! gate before the anchor call and the stores are synchronous.

pub mod anchor;
pub mod coordinator;
pub mod model;
pub mod store;
pub mod tsa;

pub use anchor::{AnchorError, AnchorReceipt, AnchorTarget, MockAnchorTarget};
pub use coordinator::{
    BatchAnchorCoordinator, CoordinatorConfig, CoordinatorError, FanoutFailure, FanoutReport,
    FanoutStage, RunOutcome,
};
pub use model::{BatchStatus, EvidenceRecord, EvidenceStatus, MerkleBatch};
pub use store::{BatchStore, EvidenceStore, LedgerStore, Store, StoreError};
pub use tsa::{MockTimestampAuthority, TimestampAuthority, TsaError, TsaToken};
