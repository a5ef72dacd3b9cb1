// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Architecture construction behind fixed hyperparameters.
//!
//! State-dict checkpoints (wrapped or bare) carry no architecture
//! information, so the adapter supplies the construction parameters the
//! checkpoint family was trained with. It is a stateless factory; its
//! only failure mode is the bind step propagating a mismatch.

use model_ir::{ArchSpec, BindError, ImageModel, WeightsMap};

/// Constructs fresh architecture instances with a fixed [`ArchSpec`].
#[derive(Debug, Clone)]
pub struct ModelAdapter<A: ImageModel> {
    spec: ArchSpec,
    _marker: std::marker::PhantomData<A>,
}

impl<A: ImageModel> ModelAdapter<A> {
    /// Creates an adapter constructing with the given hyperparameters.
    pub fn new(spec: ArchSpec) -> Self {
        Self {
            spec,
            _marker: std::marker::PhantomData,
        }
    }

    /// Returns the construction hyperparameters.
    pub fn spec(&self) -> ArchSpec {
        self.spec
    }

    /// Builds a fresh, unbound instance.
    pub fn construct(&self) -> A {
        A::construct(self.spec)
    }

    /// Builds a fresh instance and binds `weights` onto it.
    ///
    /// Binding is all-or-nothing; a mismatched map surfaces as a
    /// [`BindError`] and no instance is returned.
    pub fn bind_fresh(&self, weights: WeightsMap) -> Result<A, BindError> {
        let mut model = self.construct();
        model.bind_weights(weights)?;
        Ok(model)
    }
}

impl<A: ImageModel> Default for ModelAdapter<A> {
    /// The trained checkpoint family's hyperparameters:
    /// `in_channels = 3`, `out_channels = 3`, `init_features = 32`.
    fn default() -> Self {
        Self::new(ArchSpec::default())
    }
}
