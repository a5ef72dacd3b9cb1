// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for graph manifests and artifact I/O.

/// Errors that can occur when working with portable graph artifacts.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// The artifact file could not be read or written.
    #[error("artifact I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The manifest JSON is malformed.
    #[error("failed to parse graph manifest: {0}")]
    ManifestParseError(#[from] serde_json::Error),

    /// The SafeTensors payload could not be parsed or produced.
    #[error("safetensors error: {0}")]
    SafeTensorsError(String),

    /// The artifact carries a format version this build cannot execute.
    #[error("unsupported artifact format version {found} (supported: {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    /// A weight tensor referenced by a node is missing from the payload.
    #[error("weight tensor not found: {name}")]
    WeightNotFound { name: String },

    /// A node definition is invalid (bad wiring, wrong weight arity).
    #[error("invalid node '{node}': {detail}")]
    InvalidNode { node: String, detail: String },

    /// The graph as a whole is malformed.
    #[error("invalid graph: {0}")]
    InvalidGraph(String),
}
