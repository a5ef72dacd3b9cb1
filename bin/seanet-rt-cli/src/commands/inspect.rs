// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `seanet-rt inspect` command: display checkpoint or artifact structure.
//!
//! Checkpoints print their resolved on-disk shape and the parameter
//! table; artifacts print the embedded graph manifest and a per-node
//! breakdown.

use super::truncate;
use deploy::checkpoint::{ResolvedCheckpoint, CHECKPOINT_EXTENSION};
use model_ir::artifact::ARTIFACT_EXTENSION;
use std::path::{Path, PathBuf};

pub fn execute(path: PathBuf) -> anyhow::Result<()> {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║               seanet-rt · Inspector                 ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    match path.extension().and_then(|e| e.to_str()) {
        Some(CHECKPOINT_EXTENSION) => inspect_checkpoint(&path),
        Some(ARTIFACT_EXTENSION) => inspect_artifact(&path),
        other => anyhow::bail!(
            "unsupported file type {:?}; expected .{CHECKPOINT_EXTENSION} or .{ARTIFACT_EXTENSION}",
            other.unwrap_or(""),
        ),
    }
}

fn inspect_checkpoint(path: &Path) -> anyhow::Result<()> {
    let resolved = ResolvedCheckpoint::read(path).map_err(|e| {
        anyhow::anyhow!("failed to read checkpoint '{}': {e}", path.display())
    })?;

    println!("  Checkpoint: {}", path.display());
    println!("  Shape:      {}", resolved.format_label());
    println!("  Tensors:    {}", resolved.num_parameters());

    let weights = resolved.into_weights();
    let total_bytes: usize = weights.values().map(|t| t.size_bytes()).sum();
    println!(
        "  Weights:    {:.2} MB",
        total_bytes as f64 / (1024.0 * 1024.0),
    );
    println!();

    println!("  {:<36} {:<20} {:>10}", "Parameter", "Shape", "KB");
    println!("  {}", "-".repeat(68));
    for (name, tensor) in &weights {
        println!(
            "  {:<36} {:<20} {:>10.1}",
            truncate(name, 36),
            format!("{}", tensor.shape()),
            tensor.size_bytes() as f64 / 1024.0,
        );
    }
    println!();
    Ok(())
}

fn inspect_artifact(path: &Path) -> anyhow::Result<()> {
    let graph = model_ir::artifact::read_manifest_from_file(path).map_err(|e| {
        anyhow::anyhow!("failed to read artifact '{}': {e}", path.display())
    })?;
    let file_size = std::fs::metadata(path)?.len();
    let manifest = graph.manifest();

    println!("  Artifact:   {}", path.display());
    println!("  Model:      {}", manifest.name);
    println!("  Version:    {}", manifest.format_version);
    println!("  Size:       {:.2} MB", file_size as f64 / (1024.0 * 1024.0));
    println!(
        "  Input:      '{}' {}x{}x{} (batch axis dynamic)",
        manifest.input_name, manifest.channels, manifest.height, manifest.width,
    );
    println!("  Output:     '{}'", manifest.output_name);
    println!("  Nodes:      {}", graph.num_nodes());
    println!("  Weights:    {} tensor(s)", manifest.total_weight_count());
    println!();

    println!("  {:<4} {:<24} {:<18} {:>4}", "Idx", "Name", "Op", "#W");
    println!("  {}", "-".repeat(54));
    for (idx, node) in graph.nodes().iter().enumerate() {
        println!(
            "  {:<4} {:<24} {:<18} {:>4}",
            idx,
            truncate(&node.name, 24),
            node.op.as_str(),
            node.weights.len(),
        );
    }
    println!();
    Ok(())
}
