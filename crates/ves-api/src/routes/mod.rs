//! HTTP route modules.

pub mod batches;
pub mod evidence;
