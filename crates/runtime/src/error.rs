// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for artifact execution.

use tensor_core::Shape;

/// Errors that can occur while opening or executing an artifact.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// The artifact file could not be opened or mapped.
    #[error("cannot open artifact '{path}': {detail}")]
    OpenError { path: String, detail: String },

    /// The artifact container or its manifest is invalid.
    #[error("artifact error: {0}")]
    ArtifactError(#[from] model_ir::GraphError),

    /// A weight tensor could not be extracted from the payload.
    #[error("weight loading failed for '{name}': {detail}")]
    WeightLoadError { name: String, detail: String },

    /// The provided input does not match the manifest's input contract.
    #[error("input shape {actual} does not match artifact contract {expected}")]
    InputMismatch { expected: Shape, actual: Shape },

    /// A kernel failed during node execution.
    #[error("execution error in node '{node}': {source}")]
    ExecutionError {
        node: String,
        #[source]
        source: tensor_core::TensorError,
    },
}
