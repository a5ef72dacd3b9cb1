// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # deploy
//!
//! Converts trained enhancement-network checkpoints into deployable
//! graph artifacts, cross-checks them, and runs batch inference.
//!
//! The pipeline, leaf to root:
//!
//! - [`checkpoint`] — resolves the three on-disk checkpoint shapes
//!   (full model snapshot, wrapped weights dict, bare weights map) into
//!   one tagged representation, decided once at load time.
//! - [`ModelAdapter`] — wraps architecture construction behind the fixed
//!   hyperparameters the checkpoint family was trained with.
//! - [`CheckpointLoader`] — checkpoint file → runnable model on the
//!   execution device, in evaluation mode.
//! - [`exporter`] — traces a model at a fixed resolution and writes the
//!   portable artifact (batch axis dynamic, height/width baked in).
//! - [`verifier`] — executes the artifact in the independent runtime and
//!   checks the shape contract. Built only with the `verifier` feature;
//!   otherwise verification reports as skipped, never failed.
//! - [`ExportOrchestrator`] — discovers checkpoints, drives
//!   load → export → verify per item with per-item fault isolation, and
//!   persists the machine-readable [`report::ExportReport`].
//! - [`infer`] — drives a runnable model over an image folder and writes
//!   one enhanced image per input.
//!
//! Everything is generic over [`model_ir::ImageModel`]; the concrete
//! network is wired in by the CLI.

mod adapter;
pub mod checkpoint;
mod config;
mod dataset;
mod error;
pub mod exporter;
pub mod infer;
mod loader;
mod orchestrator;
pub mod report;
pub mod verifier;

pub use adapter::ModelAdapter;
pub use checkpoint::{CheckpointError, ResolvedCheckpoint, CHECKPOINT_EXTENSION};
pub use config::DeployConfig;
pub use dataset::{ImageFolder, Sample};
pub use error::DeployError;
pub use loader::CheckpointLoader;
pub use orchestrator::ExportOrchestrator;
