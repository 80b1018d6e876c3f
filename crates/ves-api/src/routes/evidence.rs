//! # Evidence Certification API
//!
//! Handles certification intake, record status, custody inspection, and
//! verifiable package export.
//!
//! ## Endpoints
//!
//! - `POST /api/v1/evidence` — certify uploaded content
//! - `GET /api/v1/evidence/{id}` — record status summary
//! - `GET /api/v1/evidence/{id}/package` — downloadable evidence package
//! - `GET /api/v1/evidence/{id}/custody` — custody events + chain findings

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use ves_core::{
    sha256_digest, CanonicalBytes, CanonicalError, CertificationId, ContentHash, CreatorId,
    Timestamp,
};
use ves_evidence::{
    BlockchainAnchor, ChainViolation, CustodyEvent, CustodyEventKind, EvidenceBuilder,
    EvidencePackage, IdentityLevel, PackageAssembly,
};
use ves_state::{BatchStatus, EvidenceRecord, EvidenceStatus, TimestampAuthority};

use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::state::AppState;

// ── Request/Response DTOs ───────────────────────────────────────────

/// Request to certify uploaded content.
///
/// All hashes arrive pre-computed from the upstream fingerprinting step
/// as SHA-256 hex strings; the builder validates their shape.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CertifyRequest {
    /// SHA-256 of the raw video file.
    pub file_hash: String,
    /// Stable creator identifier.
    pub creator_id: Uuid,
    /// Identity verification tier: `L0`..`L3`.
    #[schema(value_type = String, example = "L2")]
    pub identity_level: IdentityLevel,
    /// Work title.
    pub title: String,
    /// Client-reported upload file name, recorded in the custody trail.
    pub file_name: String,
    /// Upload size in bytes, recorded in the custody trail.
    pub size_bytes: u64,
    /// Playback length in whole seconds.
    #[serde(default)]
    pub duration_seconds: Option<u64>,
    /// Display resolution such as `1920x1080`.
    #[serde(default)]
    pub resolution: Option<String>,
    /// Per-frame sample hashes in extraction order.
    #[serde(default)]
    pub frame_hashes: Vec<String>,
    /// SHA-256 of the extracted audio track.
    #[serde(default)]
    pub audio_hash: Option<String>,
    /// Generative tool used, when declared.
    #[serde(default)]
    pub ai_tool: Option<String>,
    /// SHA-256 of the generation prompt, when declared.
    #[serde(default)]
    pub prompt_hash: Option<String>,
    /// Whether the work embeds third-party materials.
    #[serde(default)]
    pub has_third_party_materials: bool,
}

impl Validate for CertifyRequest {
    fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("title must not be empty".to_string());
        }
        if self.file_name.trim().is_empty() {
            return Err("file_name must not be empty".to_string());
        }
        Ok(())
    }
}

/// Successful certification.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CertifyResponse {
    /// Identifier of the new evidence record.
    pub certification_id: Uuid,
    /// Final evidence hash, the record's future Merkle leaf.
    #[schema(value_type = String)]
    pub evidence_hash: ContentHash,
    /// Whether a TSA token made it into the evidence before hashing.
    pub tsa_attached: bool,
}

/// Record status summary.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EvidenceSummary {
    pub certification_id: Uuid,
    #[schema(value_type = String)]
    pub evidence_hash: ContentHash,
    /// `valid` or `revoked`.
    pub status: String,
    /// Whether a batch has claimed the record.
    pub batched: bool,
    /// Whether the claiming batch reached the external ledger.
    pub anchored: bool,
}

/// A record's custody chain with verification findings.
#[derive(Debug, Serialize, ToSchema)]
pub struct CustodyResponse {
    pub certification_id: Uuid,
    /// Events in append order.
    #[schema(value_type = Vec<Object>)]
    pub events: Vec<CustodyEvent>,
    /// Broken chain invariants; empty means the chain is intact.
    #[schema(value_type = Vec<Object>)]
    pub violations: Vec<ChainViolation>,
}

// ── Router ──────────────────────────────────────────────────────────

/// Build the evidence router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/evidence", post(certify_evidence))
        .route("/api/v1/evidence/{id}", get(get_evidence))
        .route("/api/v1/evidence/{id}/package", get(export_package))
        .route("/api/v1/evidence/{id}/custody", get(get_custody))
}

// ── Handlers ────────────────────────────────────────────────────────

/// POST /api/v1/evidence — Certify uploaded content.
#[utoipa::path(
    post,
    path = "/api/v1/evidence",
    request_body = CertifyRequest,
    responses(
        (status = 201, description = "Evidence certified", body = CertifyResponse),
        (status = 400, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "evidence"
)]
pub(crate) async fn certify_evidence(
    State(state): State<AppState>,
    body: Result<Json<CertifyRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CertifyResponse>), AppError> {
    let req = extract_validated_json(body)?;
    let creator = CreatorId(req.creator_id);

    let mut builder = EvidenceBuilder::new(&req.file_hash, creator, req.identity_level, &req.title)
        .has_third_party_materials(req.has_third_party_materials);
    if let Some(secs) = req.duration_seconds {
        builder = builder.duration_seconds(secs);
    }
    if let Some(resolution) = &req.resolution {
        builder = builder.resolution(resolution);
    }
    if !req.frame_hashes.is_empty() {
        builder = builder.frame_hashes(req.frame_hashes.clone());
    }
    if let Some(hash) = &req.audio_hash {
        builder = builder.audio_hash(hash);
    }
    if let Some(tool) = &req.ai_tool {
        builder = builder.ai_tool(tool);
    }
    if let Some(hash) = &req.prompt_hash {
        builder = builder.prompt_hash(hash);
    }

    // Everything invalid is rejected here, before any state is touched.
    let built = builder.build()?;

    let id = CertificationId::new();
    let now = Timestamp::now();
    let provisional_hash = built.evidence_hash;
    let mut evidence = built.evidence;

    state.ledger.append(
        id,
        CustodyEventKind::UploadReceived {
            file_name: req.file_name.clone(),
            size_bytes: req.size_bytes,
        },
        now,
    )?;

    // TSA failure is non-fatal: the record certifies without a token and
    // the provisional hash becomes final.
    let (evidence_hash, tsa_attached) = match state.tsa.request_timestamp(&provisional_hash).await
    {
        Ok(token) => {
            state.ledger.append(
                id,
                CustodyEventKind::TimestampRequested {
                    hash: provisional_hash.clone(),
                },
                now,
            )?;
            let token_digest = digest_token(&token.token)?;
            let final_hash = evidence.attach_tsa_token(&token.token)?;
            state.ledger.append(
                id,
                CustodyEventKind::TimestampReceived { token_digest },
                now,
            )?;
            (final_hash, true)
        }
        Err(err) => {
            tracing::warn!(certification_id = %id, error = %err, "timestamp authority unavailable, certifying without token");
            (provisional_hash, false)
        }
    };

    state.ledger.append(
        id,
        CustodyEventKind::HashComputed {
            evidence_hash: evidence_hash.clone(),
        },
        now,
    )?;

    let continuity = state.evidence.creator_continuity(&creator);
    let record = EvidenceRecord {
        id,
        seq: 0, // store-assigned on insert
        evidence,
        evidence_hash: evidence_hash.clone(),
        status: EvidenceStatus::Valid,
        merkle_batch_id: None,
        merkle_proof: None,
        previous_evidence_hash: continuity.previous_evidence_hash,
        created_at: now,
    };
    state.evidence.insert(record)?;

    tracing::info!(certification_id = %id, evidence_hash = %evidence_hash, tsa_attached, "evidence certified");

    Ok((
        StatusCode::CREATED,
        Json(CertifyResponse {
            certification_id: *id.as_uuid(),
            evidence_hash,
            tsa_attached,
        }),
    ))
}

/// GET /api/v1/evidence/{id} — Record status summary.
#[utoipa::path(
    get,
    path = "/api/v1/evidence/{id}",
    params(("id" = Uuid, Path, description = "Certification ID")),
    responses(
        (status = 200, description = "Record found", body = EvidenceSummary),
        (status = 404, description = "Record not found", body = crate::error::ErrorBody),
    ),
    tag = "evidence"
)]
pub(crate) async fn get_evidence(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<EvidenceSummary>, AppError> {
    let id = CertificationId(id);
    let record = state
        .evidence
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("evidence {id} not found")))?;

    let anchored = record
        .merkle_batch_id
        .and_then(|batch_id| state.batches.get(&batch_id))
        .map(|batch| batch.status == BatchStatus::Anchored)
        .unwrap_or(false);

    Ok(Json(EvidenceSummary {
        certification_id: *id.as_uuid(),
        evidence_hash: record.evidence_hash.clone(),
        status: record.status.as_str().to_string(),
        batched: record.is_batched(),
        anchored,
    }))
}

/// GET /api/v1/evidence/{id}/package — Export the verifiable package.
///
/// The body is the package's canonical JCS bytes, served verbatim so the
/// download hashes to `package_hash`. The first successful export appends
/// a `certificate_issued` custody event; later exports do not.
#[utoipa::path(
    get,
    path = "/api/v1/evidence/{id}/package",
    params(("id" = Uuid, Path, description = "Certification ID")),
    responses(
        (status = 200, description = "Canonical package document", content_type = "application/json"),
        (status = 404, description = "Record not found", body = crate::error::ErrorBody),
    ),
    tag = "evidence"
)]
pub(crate) async fn export_package(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let id = CertificationId(id);
    let record = state
        .evidence
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("evidence {id} not found")))?;

    let package = EvidencePackage::assemble(PackageAssembly {
        certification_id: id,
        evidence: record.evidence.clone(),
        base_url: state.config.base_url.clone(),
        continuity: state.evidence.continuity_of(&record),
        blockchain: anchor_facts(&state, &record),
        custody: state.ledger.events(&id),
        exported_at: Timestamp::now(),
    })?;
    let bytes = package.to_canonical_bytes()?;

    if let Some(package_hash) = &package.package_hash {
        let appended = state.ledger.append_once(
            id,
            CustodyEventKind::CertificateIssued {
                package_hash: package_hash.clone(),
            },
            Timestamp::now(),
        )?;
        if appended.is_some() {
            tracing::info!(certification_id = %id, package_hash = %package_hash, "first package export recorded");
        }
    }

    Ok((
        [(header::CONTENT_TYPE, "application/json")],
        bytes.as_bytes().to_vec(),
    )
        .into_response())
}

/// GET /api/v1/evidence/{id}/custody — Custody chain with findings.
#[utoipa::path(
    get,
    path = "/api/v1/evidence/{id}/custody",
    params(("id" = Uuid, Path, description = "Certification ID")),
    responses(
        (status = 200, description = "Custody chain", body = CustodyResponse),
        (status = 404, description = "Record not found", body = crate::error::ErrorBody),
    ),
    tag = "evidence"
)]
pub(crate) async fn get_custody(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CustodyResponse>, AppError> {
    let id = CertificationId(id);
    if state.evidence.get(&id).is_none() {
        return Err(AppError::NotFound(format!("evidence {id} not found")));
    }

    Ok(Json(CustodyResponse {
        certification_id: *id.as_uuid(),
        events: state.ledger.events(&id),
        violations: state.ledger.verify(&id),
    }))
}

// ── Helpers ─────────────────────────────────────────────────────────

/// SHA-256 over the canonicalized token string, as recorded in
/// `timestamp_received` events.
fn digest_token(token: &str) -> Result<ContentHash, CanonicalError> {
    let bytes = CanonicalBytes::new(&token)?;
    Ok(sha256_digest(&bytes).to_content_hash())
}

/// Anchor facts for the record's batch, present only once that batch is
/// anchored. Proof and receipt travel together.
fn anchor_facts(state: &AppState, record: &EvidenceRecord) -> Option<BlockchainAnchor> {
    let batch_id = record.merkle_batch_id?;
    let merkle_proof = record.merkle_proof.clone()?;
    let batch = state.batches.get(&batch_id)?;
    if batch.status != BatchStatus::Anchored {
        return None;
    }
    Some(BlockchainAnchor {
        batch_key: batch.batch_key,
        merkle_root: batch.merkle_root,
        merkle_proof,
        tx_hash: batch.chain_tx_hash?,
        block_number: batch.chain_block_number?,
        network: batch.chain_network?,
        anchored_at: batch.anchored_at?,
    })
}
