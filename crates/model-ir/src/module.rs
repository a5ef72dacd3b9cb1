// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The model capability interface.
//!
//! The conversion pipeline never names a concrete network type. It works
//! against [`ImageModel`] — construct, bind weights, run, trace — so the
//! whole pipeline is testable against a minimal fake architecture, and
//! the real network stays an interchangeable collaborator.

use crate::{GraphError, GraphManifest};
use std::collections::BTreeMap;
use tensor_core::{Device, Shape, Tensor, TensorError};

/// Mapping from parameter name to its tensor value.
///
/// Ordered so exports and comparisons are deterministic.
pub type WeightsMap = BTreeMap<String, Tensor>;

/// Construction hyperparameters of the enhancement architecture.
///
/// The defaults match the trained checkpoint family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ArchSpec {
    /// Input image channels.
    pub in_channels: usize,
    /// Output image channels.
    pub out_channels: usize,
    /// Feature width of the first encoder level (doubles per level).
    pub init_features: usize,
}

impl Default for ArchSpec {
    fn default() -> Self {
        Self {
            in_channels: 3,
            out_channels: 3,
            init_features: 32,
        }
    }
}

impl std::fmt::Display for ArchSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "in={}, out={}, features={}",
            self.in_channels, self.out_channels, self.init_features,
        )
    }
}

/// Errors that can occur when binding a weights map onto a model.
///
/// Binding is all-or-nothing: any mismatch leaves the model untouched
/// and is reported to the caller — a partially-applied or silently
/// default-initialized model is never produced.
#[derive(Debug, thiserror::Error)]
pub enum BindError {
    /// The model expects a parameter the map does not provide.
    #[error("missing parameter '{name}' in weights map")]
    MissingParameter { name: String },

    /// The map provides a parameter the model does not define.
    #[error("unexpected parameter '{name}' in weights map")]
    UnexpectedParameter { name: String },

    /// A provided tensor's shape does not match the model's parameter.
    #[error("shape mismatch for parameter '{name}': expected {expected}, got {actual}")]
    ShapeMismatch {
        name: String,
        expected: Shape,
        actual: Shape,
    },

    /// A provided tensor has a non-weight dtype.
    #[error("parameter '{name}' has unsupported dtype {dtype}")]
    WrongDType {
        name: String,
        dtype: tensor_core::DType,
    },
}

/// The capability interface an image-enhancement architecture exposes to
/// the deployment pipeline.
///
/// Contract: [`forward`](ImageModel::forward) maps an NCHW `f32` batch
/// `(batch, in_channels, H, W)` to a batch of identical shape (with
/// `out_channels` channels). Output values carry no range guarantee
/// until a consumer clamps them.
pub trait ImageModel: Sized {
    /// Builds a fresh, zero-initialized instance for the given
    /// hyperparameters. Weights arrive only via
    /// [`bind_weights`](ImageModel::bind_weights).
    fn construct(spec: ArchSpec) -> Self;

    /// Returns the hyperparameters this instance was built with.
    fn spec(&self) -> &ArchSpec;

    /// Applies a complete weights map onto this instance.
    ///
    /// The map must cover the model's parameter set exactly — missing
    /// names, unknown names, and shape mismatches are each fatal.
    fn bind_weights(&mut self, weights: WeightsMap) -> Result<(), BindError>;

    /// Returns the model's parameters keyed by name.
    fn named_parameters(&self) -> &WeightsMap;

    /// Runs the network on an NCHW `f32` batch.
    fn forward(&self, input: &Tensor) -> Result<Tensor, TensorError>;

    /// Traces the computation at the given spatial resolution into a
    /// portable graph manifest (unvalidated — callers run it through
    /// [`crate::Graph::validate`]).
    fn trace(&self, height: usize, width: usize) -> Result<GraphManifest, GraphError>;

    /// Toggles training-only behavior (batch-statistics normalization).
    fn set_training(&mut self, training: bool);

    /// Returns `true` while in training mode.
    fn is_training(&self) -> bool;

    /// Moves the instance to the given device, consuming it: at most one
    /// resident copy exists per device.
    fn to_device(self, device: Device) -> Self;

    /// Returns the device this instance resides on.
    fn device(&self) -> Device;
}

/// Runs `f` with the model temporarily in evaluation mode.
///
/// The previous training flag is restored before returning, whatever it
/// was — a scoped state transition rather than a sticky global toggle.
pub fn with_eval_mode<M: ImageModel, R>(model: &mut M, f: impl FnOnce(&M) -> R) -> R {
    let was_training = model.is_training();
    model.set_training(false);
    let result = f(model);
    model.set_training(was_training);
    result
}
