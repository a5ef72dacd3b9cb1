// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Batch export orchestration.
//!
//! Discovers every checkpoint in the configured directory and drives
//! load → export → verify for each, strictly sequentially: the device
//! holds at most one model at a time, and each model is released before
//! the next checkpoint is touched. A failure at any per-item stage is
//! logged with the offending path and skipped — a single bad checkpoint
//! never aborts the batch. The run always ends with a persisted
//! [`ExportReport`], even when nothing succeeded.

use crate::report::{ExportRecord, ExportReport, REPORT_FILENAME};
use crate::{exporter, verifier, CheckpointLoader, DeployConfig, DeployError, ModelAdapter};
use model_ir::ImageModel;
use std::path::{Path, PathBuf};
use tensor_core::Device;

/// Drives the whole conversion batch for one architecture.
pub struct ExportOrchestrator<A: ImageModel> {
    config: DeployConfig,
    adapter: ModelAdapter<A>,
    device: Device,
}

impl<A: ImageModel> ExportOrchestrator<A> {
    /// Creates an orchestrator for `config`, constructing fresh models
    /// through `adapter`.
    pub fn new(config: DeployConfig, adapter: ModelAdapter<A>) -> Result<Self, DeployError> {
        let device = config.parse_device()?;
        Ok(Self {
            config,
            adapter,
            device,
        })
    }

    /// Runs the batch and returns the persisted report.
    ///
    /// Propagates only environment-level failures (unreadable checkpoint
    /// directory, unwritable output directory or report); per-item
    /// failures are logged and skipped.
    pub fn run(&self) -> Result<ExportReport, DeployError> {
        let checkpoints = self.discover_checkpoints()?;
        tracing::info!(
            "found {} checkpoint(s) under '{}'",
            checkpoints.len(),
            self.config.checkpoint_dir.display(),
        );

        std::fs::create_dir_all(&self.config.output_dir)?;

        let mut records = Vec::new();
        for path in &checkpoints {
            match self.process_checkpoint(path) {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!("skipping checkpoint '{}': {e}", path.display());
                }
            }
        }

        let report = ExportReport::new(records, self.config.input_size);
        report.write(&self.config.output_dir.join(REPORT_FILENAME))?;

        tracing::info!(
            "batch complete: {}/{} checkpoint(s) exported, {} verification(s) passed",
            report.total_models_exported,
            checkpoints.len(),
            report.summary.successful_tests,
        );
        Ok(report)
    }

    /// Enumerates `.ckpt` files in the checkpoint directory, sorted so
    /// batch order (and the report) is deterministic.
    fn discover_checkpoints(&self) -> Result<Vec<PathBuf>, DeployError> {
        let mut found = Vec::new();
        for entry in std::fs::read_dir(&self.config.checkpoint_dir)? {
            let path = entry?.path();
            let is_checkpoint = path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext == crate::CHECKPOINT_EXTENSION);
            if is_checkpoint {
                found.push(path);
            }
        }
        found.sort();
        Ok(found)
    }

    /// Full pipeline for one checkpoint: load → export → verify.
    fn process_checkpoint(&self, path: &Path) -> Result<ExportRecord, DeployError> {
        let model_name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "model".to_string());
        tracing::info!("processing '{model_name}'");

        let loader = CheckpointLoader::new(&self.adapter, self.device);
        let mut model = loader.load(path)?;

        let artifact_path = self
            .config
            .output_dir
            .join(&model_name)
            .with_extension(model_ir::artifact::ARTIFACT_EXTENSION);
        let exported = exporter::export(&mut model, &artifact_path, self.config.input_size)?;

        // Only one model is resident at a time: release it before the
        // verifier maps the artifact, and before the next iteration.
        let parameter_bytes: usize = model
            .named_parameters()
            .values()
            .map(|t| t.size_bytes())
            .sum();
        drop(model);
        tracing::debug!(
            "released model '{model_name}' ({:.2} MB of parameters)",
            parameter_bytes as f64 / (1024.0 * 1024.0),
        );

        let verification = if self.config.verify {
            verifier::verify(&artifact_path, self.config.input_size, self.device)
        } else {
            verifier::VerifyReport::skipped("verification disabled by configuration")
        };

        Ok(ExportRecord {
            model_name,
            checkpoint_path: path.to_path_buf(),
            artifact_path: exported.path.clone(),
            file_size_bytes: exported.size_bytes,
            file_size_mb: exported.size_mb(),
            input_size: self.config.input_size,
            test_status: verification.outcome,
            test_success: verification.outcome.is_success(),
            export_time: chrono::Utc::now().to_rfc3339(),
        })
    }

    /// Returns the configuration this orchestrator runs with.
    pub fn config(&self) -> &DeployConfig {
        &self.config
    }
}
