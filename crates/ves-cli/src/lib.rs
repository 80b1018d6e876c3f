//! # ves-cli — CLI Tool for VeriStamp Evidence
//!
//! Provides the `ves` command-line interface for working with exported
//! evidence packages offline.
//!
//! ## Subcommands
//!
//! - `ves verify-package` — Replay every integrity commitment in a package.
//! - `ves inspect` — Human-readable summary of a package.
//!
//! Both commands operate on nothing but the package file: everything a
//! verifier needs travels inside the document.

pub mod inspect;
pub mod verify;

use std::path::Path;

use anyhow::{Context, Result};

use ves_evidence::EvidencePackage;

/// Read and parse an exported package file.
pub fn load_package(path: &Path) -> Result<EvidencePackage> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse package: {}", path.display()))
}
