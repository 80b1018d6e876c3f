//! # Batch Anchoring API
//!
//! Exposes the anchoring coordinator. Runs are triggered by an external
//! scheduler hitting the trigger endpoint; the process never
//! self-triggers.
//!
//! ## Endpoints
//!
//! - `POST /api/v1/batches/run` — execute one coordinator run
//! - `GET /api/v1/batches` — list batches, newest first
//! - `GET /api/v1/batches/{id}` — batch detail including anchor receipt

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use ves_core::{BatchId, ContentHash, Timestamp};
use ves_state::{FanoutFailure, MerkleBatch, RunOutcome};

use crate::error::AppError;
use crate::state::AppState;

// ── Response DTOs ───────────────────────────────────────────────────

/// Wire form of one coordinator run's outcome.
///
/// Rate limiting is the one outcome that surfaces as an error body
/// instead: 429 with a `Retry-After` header.
#[derive(Debug, Serialize, ToSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TriggerResponse {
    /// No eligible evidence; no batch row was created.
    Noop,
    /// A batch was committed and anchored.
    Anchored {
        batch_id: Uuid,
        batch_key: String,
        #[schema(value_type = String)]
        merkle_root: ContentHash,
        evidence_count: u64,
        /// Records the post-anchor fan-out could not finish.
        #[schema(value_type = Vec<Object>)]
        fanout_failures: Vec<FanoutFailure>,
    },
    /// The batch was committed but the anchor call failed; its records
    /// stay eligible for the next run.
    AnchorFailed { batch_id: Uuid, error: String },
}

/// One batch as reported by the list and detail endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub struct BatchSummary {
    pub batch_id: Uuid,
    pub batch_key: String,
    #[schema(value_type = String)]
    pub merkle_root: ContentHash,
    pub certification_count: u64,
    /// `pending`, `anchored`, or `failed`.
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_tx_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_block_number: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_network: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub anchored_at: Option<Timestamp>,
    #[schema(value_type = String)]
    pub created_at: Timestamp,
}

impl From<MerkleBatch> for BatchSummary {
    fn from(batch: MerkleBatch) -> Self {
        Self {
            batch_id: *batch.id.as_uuid(),
            batch_key: batch.batch_key,
            merkle_root: batch.merkle_root,
            certification_count: batch.certification_count,
            status: batch.status.as_str().to_string(),
            chain_tx_hash: batch.chain_tx_hash,
            chain_block_number: batch.chain_block_number,
            chain_network: batch.chain_network,
            anchored_at: batch.anchored_at,
            created_at: batch.created_at,
        }
    }
}

// ── Router ──────────────────────────────────────────────────────────

/// Build the batches router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/batches", get(list_batches))
        .route("/api/v1/batches/run", post(run_batch))
        .route("/api/v1/batches/{id}", get(get_batch))
}

// ── Handlers ────────────────────────────────────────────────────────

/// POST /api/v1/batches/run — Execute one anchoring run.
#[utoipa::path(
    post,
    path = "/api/v1/batches/run",
    responses(
        (status = 200, description = "No eligible evidence", body = TriggerResponse),
        (status = 201, description = "Batch committed and anchored", body = TriggerResponse),
        (status = 429, description = "A batch was created too recently", body = crate::error::ErrorBody),
        (status = 502, description = "Anchor submission failed", body = TriggerResponse),
    ),
    tag = "batches"
)]
pub(crate) async fn run_batch(State(state): State<AppState>) -> Result<Response, AppError> {
    match state.coordinator.run().await? {
        RunOutcome::RateLimited { retry_after_secs } => {
            Err(AppError::RateLimited { retry_after_secs })
        }
        RunOutcome::NoOp => Ok((StatusCode::OK, Json(TriggerResponse::Noop)).into_response()),
        RunOutcome::Anchored {
            batch_id,
            batch_key,
            merkle_root,
            evidence_count,
            fanout,
            ..
        } => Ok((
            StatusCode::CREATED,
            Json(TriggerResponse::Anchored {
                batch_id: *batch_id.as_uuid(),
                batch_key,
                merkle_root,
                evidence_count,
                fanout_failures: fanout.failures,
            }),
        )
            .into_response()),
        RunOutcome::AnchorFailed { batch_id, error } => Ok((
            StatusCode::BAD_GATEWAY,
            Json(TriggerResponse::AnchorFailed {
                batch_id: *batch_id.as_uuid(),
                error: error.to_string(),
            }),
        )
            .into_response()),
    }
}

/// GET /api/v1/batches — List all batches, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/batches",
    responses(
        (status = 200, description = "Batches, newest first", body = Vec<BatchSummary>),
    ),
    tag = "batches"
)]
pub(crate) async fn list_batches(State(state): State<AppState>) -> Json<Vec<BatchSummary>> {
    Json(
        state
            .batches
            .list_newest_first()
            .into_iter()
            .map(BatchSummary::from)
            .collect(),
    )
}

/// GET /api/v1/batches/{id} — Get a single batch.
#[utoipa::path(
    get,
    path = "/api/v1/batches/{id}",
    params(("id" = Uuid, Path, description = "Batch ID")),
    responses(
        (status = 200, description = "Batch found", body = BatchSummary),
        (status = 404, description = "Batch not found", body = crate::error::ErrorBody),
    ),
    tag = "batches"
)]
pub(crate) async fn get_batch(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BatchSummary>, AppError> {
    let id = BatchId(id);
    state
        .batches
        .get(&id)
        .map(|batch| Json(BatchSummary::from(batch)))
        .ok_or_else(|| AppError::NotFound(format!("batch {id} not found")))
}
