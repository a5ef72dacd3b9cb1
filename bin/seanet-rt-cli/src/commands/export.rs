// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `seanet-rt export` command: batch-convert checkpoints to artifacts.
//!
//! Drives the export orchestrator over every `.ckpt` file in the
//! checkpoint directory and prints the per-model summary table. The
//! process exits non-zero only when the entire batch produced no
//! artifacts — per-item failures are logged and the batch continues.

use deploy::{DeployConfig, ExportOrchestrator, ModelAdapter};
use std::path::PathBuf;
use unet::Unet;

pub fn execute(
    mut config: DeployConfig,
    checkpoint_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    input_size: Option<(usize, usize)>,
    skip_verify: bool,
) -> anyhow::Result<()> {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║             seanet-rt · Batch Exporter              ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    if let Some(dir) = checkpoint_dir {
        config.checkpoint_dir = dir;
    }
    if let Some(dir) = output_dir {
        config.output_dir = dir;
    }
    if let Some(size) = input_size {
        config.input_size = size;
    }
    if skip_verify {
        config.verify = false;
    }

    println!("  Config:");
    println!("   Checkpoints: {}", config.checkpoint_dir.display());
    println!("   Artifacts:   {}", config.output_dir.display());
    println!(
        "   Resolution:  {}x{} (batch axis dynamic)",
        config.input_size.0, config.input_size.1,
    );
    println!("   Verify:      {}", if config.verify { "yes" } else { "no" });
    println!("   Device:      {}", config.device);
    println!();

    let adapter = ModelAdapter::<Unet>::default();
    let orchestrator = ExportOrchestrator::new(config, adapter)?;
    let report = orchestrator.run()?;

    println!("  Summary:");
    print!("{}", report.summary_table());
    println!();

    if report.total_models_exported == 0 {
        anyhow::bail!("no artifacts were produced");
    }
    Ok(())
}
