// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Checkpoint documents and the three-way shape resolution.
//!
//! Training harnesses persisted checkpoints in three incompatible
//! shapes over the project's lifetime:
//!
//! 1. **Full model snapshot** — architecture hyperparameters plus the
//!    complete parameter map.
//! 2. **Wrapped weights** — a harness dict carrying arbitrary metadata
//!    (epoch counters, optimizer state, ...) with the weights nested
//!    under `model_state_dict` or `state_dict`.
//! 3. **Bare weights** — the parameter map itself, nothing else.
//!
//! Checkpoints are JSON (`.ckpt`), which is what makes the probe
//! possible: the document's own structure decides its shape, exactly
//! once, into the [`ResolvedCheckpoint`] tagged variant. Anything that
//! matches none of the three shapes fails loudly — there is no fourth
//! shape.

use model_ir::{ArchSpec, WeightsMap};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tensor_core::{Shape, Tensor};

/// File extension of checkpoint documents.
pub const CHECKPOINT_EXTENSION: &str = "ckpt";

/// Conventional wrapper keys, probed in priority order.
pub const WRAPPED_KEYS: [&str; 2] = ["model_state_dict", "state_dict"];

/// Errors that can occur while reading a checkpoint.
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    /// The file could not be read.
    #[error("failed to read checkpoint: {0}")]
    ReadError(#[from] std::io::Error),

    /// The document is not valid JSON, or a weights section does not
    /// decode as a parameter map.
    #[error("failed to parse checkpoint: {0}")]
    ParseError(#[from] serde_json::Error),

    /// A stored tensor's data length disagrees with its dims.
    #[error("invalid tensor '{name}': {detail}")]
    InvalidTensor { name: String, detail: String },

    /// The document matches none of the three supported shapes.
    #[error("unrecognized checkpoint shape: {detail}")]
    UnrecognizedShape { detail: String },
}

/// One parameter tensor as persisted in a checkpoint document.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct StoredTensor {
    /// Dimensions, outermost first.
    pub dims: Vec<usize>,
    /// Row-major element data.
    pub data: Vec<f32>,
}

impl StoredTensor {
    /// Snapshots an in-memory tensor.
    pub fn from_tensor(tensor: &Tensor) -> Self {
        Self {
            dims: tensor.shape().dims().to_vec(),
            data: tensor.as_f32_slice().to_vec(),
        }
    }

    /// Converts back into an owned tensor, validating the element count.
    pub fn into_tensor(self, name: &str) -> Result<Tensor, CheckpointError> {
        let shape = Shape::new(self.dims);
        if self.data.len() != shape.num_elements() {
            return Err(CheckpointError::InvalidTensor {
                name: name.to_string(),
                detail: format!(
                    "shape {shape} wants {} elements, data holds {}",
                    shape.num_elements(),
                    self.data.len(),
                ),
            });
        }
        // Element count was just validated; from_f32 cannot fail.
        Ok(Tensor::from_f32(shape, &self.data).expect("validated element count"))
    }
}

/// A full model snapshot: hyperparameters plus parameters.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct ModelSnapshot {
    /// Construction hyperparameters of the persisted model.
    pub architecture: ArchSpec,
    /// Complete parameter map.
    pub parameters: BTreeMap<String, StoredTensor>,
}

/// A checkpoint with its on-disk shape resolved, decided exactly once.
#[derive(Debug)]
pub enum ResolvedCheckpoint {
    /// A complete model snapshot carrying its own architecture.
    FullModel {
        architecture: ArchSpec,
        weights: WeightsMap,
    },
    /// A wrapper dict with the weights nested under `key`.
    WrappedWeights {
        key: &'static str,
        weights: WeightsMap,
    },
    /// The weights map itself.
    BareWeights { weights: WeightsMap },
}

impl ResolvedCheckpoint {
    /// Reads and shape-resolves the checkpoint at `path`.
    ///
    /// Resolution policy, in priority order:
    /// 1. A document carrying `architecture` + `parameters` is a full
    ///    model snapshot.
    /// 2. Otherwise, the first of `model_state_dict` / `state_dict`
    ///    present names the nested weights map.
    /// 3. Otherwise the entire document is taken as a bare weights map —
    ///    logged loudly, since a malformed wrapper with an unexpected
    ///    key lands here and will then fail at weight binding.
    ///
    /// Anything else (non-object document, values that are not stored
    /// tensors) is an [`CheckpointError::UnrecognizedShape`] error.
    pub fn read(path: &Path) -> Result<Self, CheckpointError> {
        let content = std::fs::read_to_string(path)?;
        let value: Value = serde_json::from_str(&content)?;

        let object = match &value {
            Value::Object(map) => map,
            other => {
                return Err(CheckpointError::UnrecognizedShape {
                    detail: format!(
                        "top-level JSON {} is not a checkpoint document",
                        json_type_name(other),
                    ),
                });
            }
        };

        if object.contains_key("architecture") && object.contains_key("parameters") {
            let snapshot: ModelSnapshot = serde_json::from_value(value)?;
            let weights = decode_parameters(snapshot.parameters)?;
            return Ok(ResolvedCheckpoint::FullModel {
                architecture: snapshot.architecture,
                weights,
            });
        }

        for key in WRAPPED_KEYS {
            if let Some(nested) = object.get(key) {
                let stored: BTreeMap<String, StoredTensor> =
                    serde_json::from_value(nested.clone())?;
                let weights = decode_parameters(stored)?;
                return Ok(ResolvedCheckpoint::WrappedWeights { key, weights });
            }
        }

        // Permissive fallback, kept for compatibility with older
        // harness output — but never silent.
        tracing::warn!(
            "checkpoint '{}' has neither {:?} key; treating the entire document as a bare weights map",
            path.display(),
            WRAPPED_KEYS,
        );
        let sample_keys: Vec<String> = object.keys().take(8).cloned().collect();
        let stored: BTreeMap<String, StoredTensor> =
            serde_json::from_value(value).map_err(|e| CheckpointError::UnrecognizedShape {
                detail: format!("document is not a weights map either ({e}); keys: {sample_keys:?}"),
            })?;
        let weights = decode_parameters(stored)?;
        Ok(ResolvedCheckpoint::BareWeights { weights })
    }

    /// Returns the resolved weights map, discarding the wrapper.
    pub fn into_weights(self) -> WeightsMap {
        match self {
            ResolvedCheckpoint::FullModel { weights, .. }
            | ResolvedCheckpoint::WrappedWeights { weights, .. }
            | ResolvedCheckpoint::BareWeights { weights } => weights,
        }
    }

    /// Label for logs and the `inspect` command.
    pub fn format_label(&self) -> &'static str {
        match self {
            ResolvedCheckpoint::FullModel { .. } => "full model snapshot",
            ResolvedCheckpoint::WrappedWeights { key, .. } => match *key {
                "model_state_dict" => "wrapped weights (model_state_dict)",
                _ => "wrapped weights (state_dict)",
            },
            ResolvedCheckpoint::BareWeights { .. } => "bare weights map",
        }
    }

    /// Number of parameter tensors.
    pub fn num_parameters(&self) -> usize {
        match self {
            ResolvedCheckpoint::FullModel { weights, .. }
            | ResolvedCheckpoint::WrappedWeights { weights, .. }
            | ResolvedCheckpoint::BareWeights { weights } => weights.len(),
        }
    }
}

/// Snapshots a weights map into its persisted form (used by fixtures
/// and the `inspect` round-trip).
pub fn snapshot_weights(weights: &WeightsMap) -> BTreeMap<String, StoredTensor> {
    weights
        .iter()
        .map(|(name, tensor)| (name.clone(), StoredTensor::from_tensor(tensor)))
        .collect()
}

fn decode_parameters(
    stored: BTreeMap<String, StoredTensor>,
) -> Result<WeightsMap, CheckpointError> {
    let mut weights = WeightsMap::new();
    for (name, tensor) in stored {
        let decoded = tensor.into_tensor(&name)?;
        weights.insert(name, decoded);
    }
    Ok(weights)
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
