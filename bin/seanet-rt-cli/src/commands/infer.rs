// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `seanet-rt infer` command: enhance a folder of images.
//!
//! Loads one checkpoint (any of the three supported shapes), then runs
//! it over every image in the input directory, writing one enhanced
//! image per input under the original filename.

use deploy::{CheckpointLoader, DeployConfig, ImageFolder, ModelAdapter};
use std::path::PathBuf;
use unet::Unet;

pub fn execute(
    config: DeployConfig,
    checkpoint: PathBuf,
    input_dir: PathBuf,
    output_dir: PathBuf,
    resize: Option<(usize, usize)>,
) -> anyhow::Result<()> {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║            seanet-rt · Inference Runner             ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    let device = config.parse_device()?;
    let adapter = ModelAdapter::<Unet>::default();
    let loader = CheckpointLoader::new(&adapter, device);

    println!("  [1/3] Loading checkpoint '{}'...", checkpoint.display());
    let model = loader.load(&checkpoint)?;
    println!("        Model ready ({}).", adapter.spec());
    println!();

    println!("  [2/3] Scanning '{}'...", input_dir.display());
    let dataset = ImageFolder::open(&input_dir, resize)?;
    if dataset.is_empty() {
        anyhow::bail!("no supported images found in '{}'", input_dir.display());
    }
    println!("        {} image(s) found.", dataset.len());
    if let Some((h, w)) = resize {
        println!("        Inputs rescaled to {h}x{w}.");
    }
    println!();

    println!("  [3/3] Enhancing...");
    let summary = deploy::infer::run(&model, &dataset, &output_dir)?;
    println!();

    println!(
        "  {} image(s) written to '{}', {} skipped.",
        summary.images_written,
        summary.output_dir.display(),
        summary.images_skipped,
    );
    println!();
    Ok(())
}
