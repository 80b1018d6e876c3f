//! # Request Metrics
//!
//! In-process request counters plus accumulated handler latency, kept in
//! atomics and served as JSON at `/metrics`. No exporter dependency; an
//! external scraper reads the snapshot endpoint.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use axum::{Extension, Json};
use serde::Serialize;

/// Counter cell shared between the middleware and the snapshot handler.
#[derive(Debug, Clone, Default)]
pub struct ApiMetrics {
    inner: Arc<Counters>,
}

#[derive(Debug, Default)]
struct Counters {
    requests: AtomicU64,
    errors: AtomicU64,
    latency_micros: AtomicU64,
}

impl ApiMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one finished request.
    fn record(&self, failed: bool, elapsed_micros: u64) {
        self.inner.requests.fetch_add(1, Ordering::Relaxed);
        if failed {
            self.inner.errors.fetch_add(1, Ordering::Relaxed);
        }
        self.inner
            .latency_micros
            .fetch_add(elapsed_micros, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let requests_total = self.inner.requests.load(Ordering::Relaxed);
        let latency_micros_total = self.inner.latency_micros.load(Ordering::Relaxed);
        MetricsSnapshot {
            requests_total,
            errors_total: self.inner.errors.load(Ordering::Relaxed),
            latency_micros_total,
            avg_latency_micros: latency_micros_total
                .checked_div(requests_total)
                .unwrap_or_default(),
        }
    }
}

/// Snapshot served by the metrics endpoint.
#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    /// Requests seen since process start.
    pub requests_total: u64,
    /// 4xx/5xx responses since process start.
    pub errors_total: u64,
    /// Summed wall-clock handler time.
    pub latency_micros_total: u64,
    /// `latency_micros_total / requests_total`, 0 before any traffic.
    pub avg_latency_micros: u64,
}

/// Counts every response that passes through, with its handler latency.
/// A missing [`ApiMetrics`] extension means the stack was assembled
/// without metrics; the request proceeds uncounted.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let metrics = request.extensions().get::<ApiMetrics>().cloned();

    let started = Instant::now();
    let response = next.run(request).await;

    if let Some(metrics) = metrics {
        let failed = response.status().is_client_error() || response.status().is_server_error();
        let elapsed = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        metrics.record(failed, elapsed);
    }

    response
}

/// GET /metrics — current counter values.
pub async fn metrics_handler(Extension(metrics): Extension<ApiMetrics>) -> Json<MetricsSnapshot> {
    Json(metrics.snapshot())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request as HttpRequest, StatusCode};
    use axum::middleware::from_fn;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    fn counted_app(metrics: ApiMetrics) -> Router {
        Router::new()
            .route("/ok", get(|| async { "ok" }))
            .route(
                "/fail",
                get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
            )
            .layer(from_fn(metrics_middleware))
            .layer(Extension(metrics))
    }

    #[tokio::test]
    async fn counts_requests_and_errors() {
        let metrics = ApiMetrics::new();
        let app = counted_app(metrics.clone());

        let ok = HttpRequest::builder().uri("/ok").body(Body::empty()).unwrap();
        app.clone().oneshot(ok).await.unwrap();

        let fail = HttpRequest::builder()
            .uri("/fail")
            .body(Body::empty())
            .unwrap();
        app.oneshot(fail).await.unwrap();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.requests_total, 2);
        assert_eq!(snapshot.errors_total, 1);
    }

    #[test]
    fn snapshot_averages_latency() {
        let metrics = ApiMetrics::new();
        metrics.record(false, 100);
        metrics.record(true, 300);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.requests_total, 2);
        assert_eq!(snapshot.errors_total, 1);
        assert_eq!(snapshot.latency_micros_total, 400);
        assert_eq!(snapshot.avg_latency_micros, 200);
    }

    #[test]
    fn snapshot_is_zeroed_before_traffic() {
        let snapshot = ApiMetrics::new().snapshot();
        assert_eq!(snapshot.requests_total, 0);
        assert_eq!(snapshot.avg_latency_micros, 0);
    }
}
