// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the deployment pipeline.
//!
//! Per-item failures (one bad checkpoint, one unexportable model) are
//! caught at the orchestrator loop and logged; they never abort a batch.
//! Only environment-level problems (unreadable directories, unwritable
//! report) propagate out of a batch run.

/// Errors that can occur in the conversion and inference pipeline.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// A checkpoint could not be read, parsed, or shape-resolved.
    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] crate::CheckpointError),

    /// A resolved weights map does not fit the architecture.
    #[error("weight binding failed: {0}")]
    Bind(#[from] model_ir::BindError),

    /// Graph tracing, validation, or artifact I/O failed.
    #[error("graph error: {0}")]
    Graph(#[from] model_ir::GraphError),

    /// A model forward pass failed.
    #[error("tensor error: {0}")]
    Tensor(#[from] tensor_core::TensorError),

    /// The exported model broke the shape-preservation contract.
    #[error("export contract violation for '{path}': {detail}")]
    ExportContract { path: String, detail: String },

    /// Filesystem-level failure (directory scan, report write).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The export report could not be serialized.
    #[error("report error: {0}")]
    Report(#[from] serde_json::Error),

    /// An input image could not be decoded or an output written.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// Configuration is invalid.
    #[error("configuration error: {0}")]
    Config(String),
}
