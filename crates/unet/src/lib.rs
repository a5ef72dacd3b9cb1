// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # unet
//!
//! The fixed encoder/decoder convolutional network the deployment
//! pipeline converts and runs: four encoder levels with feature widths
//! doubling from `init_features`, a bottleneck, four decoder levels with
//! skip concatenations, and a 1×1 sigmoid head mapping back to image
//! channels.
//!
//! The pipeline itself never depends on this crate directly — it works
//! through the [`model_ir::ImageModel`] capability interface, which
//! [`Unet`] implements. Spatial resolutions must be multiples of 16
//! (the encoder halves the resolution four times).
//!
//! # Example
//! ```
//! use model_ir::{ArchSpec, ImageModel};
//! use tensor_core::{DType, Shape, Tensor};
//! use unet::Unet;
//!
//! let spec = ArchSpec { in_channels: 3, out_channels: 3, init_features: 2 };
//! let net = Unet::construct(spec);
//! let input = Tensor::zeros(Shape::nchw(1, 3, 16, 16), DType::F32);
//! let output = net.forward(&input).unwrap();
//! assert_eq!(output.shape(), input.shape());
//! ```

mod model;

pub use model::{Unet, BN_EPSILON, SPATIAL_MULTIPLE};
