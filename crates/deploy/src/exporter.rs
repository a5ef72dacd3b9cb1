// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Model → portable artifact.
//!
//! The exporter runs the model once on a synthetic batch of the export
//! resolution (proving the forward pass works and preserves shape at
//! exactly the shape being baked in), traces the computation into a
//! graph manifest, validates it, and writes the single-file artifact
//! with all parameters embedded.
//!
//! Height and width are fixed at export time — deployment targets get a
//! simpler fixed-shape graph — while the batch axis stays dynamic so
//! multiple frames can be pushed through one execution.

use crate::DeployError;
use model_ir::{with_eval_mode, Graph, ImageModel};
use std::path::Path;
use tensor_core::{DType, Shape, Tensor};

/// A successfully written artifact.
#[derive(Debug, Clone)]
pub struct ExportedArtifact {
    /// Path the artifact was written to.
    pub path: std::path::PathBuf,
    /// Artifact file size in bytes.
    pub size_bytes: u64,
}

impl ExportedArtifact {
    /// File size in megabytes, as reported in export records.
    pub fn size_mb(&self) -> f64 {
        self.size_bytes as f64 / (1024.0 * 1024.0)
    }
}

/// Exports `model` at `resolution = (height, width)` into `target_path`.
///
/// The model is run in evaluation mode for the duration of the export;
/// its previous mode is restored afterwards. Failures (unsupported
/// resolution, broken forward pass, unwritable target) are returned to
/// the caller — the batch orchestrator logs them and moves on, so one
/// unexportable checkpoint never aborts a batch.
pub fn export<M: ImageModel>(
    model: &mut M,
    target_path: &Path,
    resolution: (usize, usize),
) -> Result<ExportedArtifact, DeployError> {
    let (height, width) = resolution;
    let name = target_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "model".to_string());

    with_eval_mode(model, |model| {
        // Representative input at the exact exported shape.
        let input = Tensor::zeros(
            Shape::nchw(1, model.spec().in_channels, height, width),
            DType::F32,
        );
        let output = model.forward(&input)?;
        if output.shape() != input.shape() {
            return Err(DeployError::ExportContract {
                path: target_path.display().to_string(),
                detail: format!(
                    "forward pass maps {} to {}, artifact contract requires shape preservation",
                    input.shape(),
                    output.shape(),
                ),
            });
        }

        let mut manifest = model.trace(height, width)?;
        manifest.name = name.clone();
        let graph = Graph::new(manifest).validate()?;

        let size_bytes = model_ir::artifact::write(target_path, &graph, model.named_parameters())?;
        tracing::info!(
            "exported '{}' at {height}x{width}: {} ({:.2} MB)",
            name,
            graph.summary(),
            size_bytes as f64 / (1024.0 * 1024.0),
        );

        Ok(ExportedArtifact {
            path: target_path.to_path_buf(),
            size_bytes,
        })
    })
}
