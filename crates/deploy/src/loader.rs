// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Checkpoint file → runnable model.
//!
//! The loader is total over the three supported checkpoint shapes: any
//! of them yields a behaviorally identical model as long as the weights
//! match the architecture. Deserialization failures and binding
//! mismatches are fatal for the checkpoint and surface unmodified; the
//! source file is never touched.

use crate::{DeployError, ModelAdapter, ResolvedCheckpoint};
use model_ir::ImageModel;
use std::path::Path;
use tensor_core::Device;

/// Loads checkpoints into runnable models on a fixed device.
pub struct CheckpointLoader<'a, A: ImageModel> {
    adapter: &'a ModelAdapter<A>,
    device: Device,
}

impl<'a, A: ImageModel> CheckpointLoader<'a, A> {
    /// Creates a loader binding onto `adapter`-constructed instances.
    pub fn new(adapter: &'a ModelAdapter<A>, device: Device) -> Self {
        Self { adapter, device }
    }

    /// Loads the checkpoint at `path` into a runnable model.
    ///
    /// Steps:
    /// 1. Read and shape-resolve the document
    ///    ([`ResolvedCheckpoint::read`]).
    /// 2. Full snapshots construct from their own architecture;
    ///    state-dict shapes construct via the adapter's fixed spec.
    /// 3. Bind the weights (all-or-nothing).
    /// 4. Move to the execution device and enter evaluation mode.
    pub fn load(&self, path: &Path) -> Result<A, DeployError> {
        let resolved = ResolvedCheckpoint::read(path)?;
        tracing::info!(
            "checkpoint '{}' resolved as {} ({} tensors)",
            path.display(),
            resolved.format_label(),
            resolved.num_parameters(),
        );

        let model = match resolved {
            ResolvedCheckpoint::FullModel { architecture, weights } => {
                let mut model = A::construct(architecture);
                model.bind_weights(weights)?;
                model
            }
            other => self.adapter.bind_fresh(other.into_weights())?,
        };

        let mut model = model.to_device(self.device);
        model.set_training(false);
        Ok(model)
    }

    /// Returns the device models are placed on.
    pub fn device(&self) -> Device {
        self.device
    }
}
