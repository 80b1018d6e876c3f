//! Axum middleware layers.

pub mod metrics;
