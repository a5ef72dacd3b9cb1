// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # seanet-rt
//!
//! Command-line interface for the seanet deployment pipeline.
//!
//! ## Usage
//! ```bash
//! # Convert every checkpoint in a directory into portable artifacts
//! seanet-rt export --checkpoint-dir ./snapshots --output-dir ./artifacts --input-size 512 512
//!
//! # Enhance a folder of images with a trained checkpoint
//! seanet-rt infer --checkpoint ./snapshots/unet_epoch_80.ckpt --input-dir ./test --output-dir ./enhanced
//!
//! # Inspect a checkpoint or an exported artifact
//! seanet-rt inspect ./artifacts/unet_epoch_80.sng
//! ```

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "seanet-rt",
    about = "Checkpoint conversion and batch inference for the seanet enhancement network",
    version,
    author
)]
struct Cli {
    /// Path to a TOML configuration file (CLI flags override its values).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging (repeat for more: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert every checkpoint in a directory into portable artifacts.
    Export {
        /// Directory scanned for .ckpt checkpoint files.
        #[arg(short = 'd', long)]
        checkpoint_dir: Option<PathBuf>,

        /// Directory artifacts and the export report are written to.
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Export resolution, baked into the artifacts.
        #[arg(long, num_args = 2, value_names = ["HEIGHT", "WIDTH"])]
        input_size: Option<Vec<usize>>,

        /// Skip artifact verification after export.
        #[arg(long)]
        skip_verify: bool,
    },

    /// Enhance every image in a directory with a trained checkpoint.
    Infer {
        /// Checkpoint file to load.
        #[arg(short = 'k', long)]
        checkpoint: PathBuf,

        /// Directory of input images.
        #[arg(short, long)]
        input_dir: PathBuf,

        /// Directory enhanced images are written to.
        #[arg(short, long)]
        output_dir: PathBuf,

        /// Rescale inputs to this resolution before inference.
        #[arg(long, num_args = 2, value_names = ["HEIGHT", "WIDTH"])]
        resize: Option<Vec<usize>>,
    },

    /// Inspect a checkpoint (.ckpt) or exported artifact (.sng).
    Inspect {
        /// Path to the file to inspect.
        path: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing/logging based on verbosity.
    commands::init_tracing(cli.verbose);

    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Export {
            checkpoint_dir,
            output_dir,
            input_size,
            skip_verify,
        } => commands::export::execute(
            config,
            checkpoint_dir,
            output_dir,
            input_size.map(|v| (v[0], v[1])),
            skip_verify,
        ),
        Commands::Infer {
            checkpoint,
            input_dir,
            output_dir,
            resize,
        } => commands::infer::execute(
            config,
            checkpoint,
            input_dir,
            output_dir,
            resize.map(|v| (v[0], v[1])),
        ),
        Commands::Inspect { path } => commands::inspect::execute(path),
    }
}
