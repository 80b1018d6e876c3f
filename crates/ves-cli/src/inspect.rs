//! # Inspect Subcommand
//!
//! Human-readable summary of an exported evidence package. Prints the
//! declared facts exactly as stored; nothing is verified here — that is
//! `ves verify-package`.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use ves_evidence::EvidencePackage;

/// Arguments for the `ves inspect` subcommand.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Path to the exported package JSON file.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

/// Execute the inspect subcommand.
pub fn run_inspect(args: &InspectArgs) -> Result<u8> {
    let package = crate::load_package(&args.file)?;
    print_summary(&package);
    Ok(0)
}

fn print_summary(package: &EvidencePackage) {
    println!("Evidence package (schema {})", package.version);
    println!("  Certification: {}", package.certification_id);
    println!("  Title: {}", package.metadata.title);
    println!(
        "  Creator: {} ({})",
        package.creator.user_id, package.creator.identity_level
    );
    println!("  Certified: {}", package.timestamps.server_time_utc);
    println!(
        "  TSA token: {}",
        if package.timestamps.tsa_token.is_some() {
            "attached"
        } else {
            "absent"
        }
    );

    println!("  File hash: {}", package.video.file_hash);
    if let Some(duration) = package.video.duration_seconds {
        println!("  Duration: {duration}s");
    }
    if let Some(resolution) = &package.video.resolution {
        println!("  Resolution: {resolution}");
    }
    let frame_count = package.video.frame_hashes.as_ref().map_or(0, Vec::len);
    println!("  Frame samples: {frame_count}");
    if let Some(audio) = &package.video.audio_hash {
        println!("  Audio hash: {audio}");
    }
    if let Some(tool) = &package.metadata.ai_tool {
        println!("  AI tool: {tool}");
    }
    println!(
        "  Third-party materials: {}",
        if package.metadata.has_third_party_materials {
            "declared"
        } else {
            "none declared"
        }
    );
    println!("  Manifest entries: {}", package.manifest.len());

    println!("  Custody events: {}", package.chain_of_custody.len());
    for (i, event) in package.chain_of_custody.iter().enumerate() {
        println!("    [{i}] {} at {}", event.kind.event_type(), event.timestamp);
    }

    let continuity = &package.creator_continuity;
    match &continuity.previous_evidence_hash {
        Some(previous) => println!(
            "  Creator chain: position {}, previous {}",
            continuity.chain_position, previous
        ),
        None => println!(
            "  Creator chain: position {}, first record",
            continuity.chain_position
        ),
    }

    match &package.blockchain {
        Some(anchor) => {
            println!("  Anchor: batch {} on {}", anchor.batch_key, anchor.network);
            println!("    Root: {}", anchor.merkle_root);
            println!("    Tx: {} (block {})", anchor.tx_hash, anchor.block_number);
            println!("    Anchored: {}", anchor.anchored_at);
        }
        None => println!("  Anchor: not anchored yet"),
    }

    println!("  Exported: {}", package.exported_at);
    match &package.package_hash {
        Some(hash) => println!("  Package hash: {hash}"),
        None => println!("  Package hash: absent"),
    }
    println!("  Verify at: {}", package.verification_url);
}
