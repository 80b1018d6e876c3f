//! # OpenAPI Document
//!
//! One `#[derive(OpenApi)]` struct collects every documented route and
//! schema; the result is served at `/openapi.json`. The document itself
//! is unauthenticated so integrators can discover the API before holding
//! a token.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::state::AppState;

/// Registers the bearer security scheme the protected routes reference.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .description(Some(
                            "Bearer token authentication. Set via VES_API_TOKEN env var.",
                        ))
                        .build(),
                ),
            );
        }
    }
}

/// Derive target that gathers every documented route and schema into
/// one OpenAPI 3.1 document.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "VeriStamp Evidence API",
        version = "0.1.0",
        description = "Certification, custody, anchoring, and export services for tamper-evident video evidence packages.\n\nProvides:\n- **Evidence certification**: canonicalize metadata, hash it, and record custody from the first byte\n- **Custody ledger** queries with hash-chain verification\n- **Batch anchoring**: Merkle-batch pending evidence and anchor the root on chain\n- **Evidence package export**: the self-contained verification artifact\n\nAuthentication: Bearer token via `Authorization: Bearer <token>` header.\nAll `/api/v1/*` endpoints require authentication. Health probes (`/health/*`) and this document are unauthenticated.",
        license(name = "AGPL-3.0-or-later")
    ),
    servers(
        (url = "http://localhost:8080", description = "Default local bind"),
    ),
    security(
        ("bearer_auth" = [])
    ),
    paths(
        // Evidence
        crate::routes::evidence::certify_evidence,
        crate::routes::evidence::get_evidence,
        crate::routes::evidence::export_package,
        crate::routes::evidence::get_custody,
        // Batches
        crate::routes::batches::run_batch,
        crate::routes::batches::list_batches,
        crate::routes::batches::get_batch,
    ),
    components(schemas(
        // Error types
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        // Evidence DTOs
        crate::routes::evidence::CertifyRequest,
        crate::routes::evidence::CertifyResponse,
        crate::routes::evidence::EvidenceSummary,
        crate::routes::evidence::CustodyResponse,
        // Batch DTOs
        crate::routes::batches::TriggerResponse,
        crate::routes::batches::BatchSummary,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "evidence", description = "Evidence certification, custody, and package export"),
        (name = "batches", description = "Merkle batch anchoring runs and batch queries"),
    )
)]
pub struct ApiDoc;

/// Router exposing the generated document at `/openapi.json`.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
