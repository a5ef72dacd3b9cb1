// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # tensor-core
//!
//! Tensor types and CPU op kernels for the seanet deployment pipeline.
//!
//! The pipeline works on image batches in NCHW layout, so everything here
//! is built around rank-4 tensors:
//!
//! - [`Tensor`] / [`TensorView`] — owned buffer and zero-copy view.
//! - [`Shape`] — dimension descriptor with NCHW accessors.
//! - [`DType`] — element types (`f32` activations/weights, `u8` images).
//! - [`Device`] — the execution device, passed explicitly (never ambient).
//! - [`ops`] — the convolutional kernel set the enhancement network and
//!   the artifact runtime both execute: `conv2d`, `conv_transpose2d`,
//!   `batch_norm`, `max_pool2d`, `relu`, `sigmoid`, `concat_channels`.
//!
//! # Example
//! ```
//! use tensor_core::{ops, DType, Shape, Tensor};
//!
//! let input = Tensor::zeros(Shape::nchw(1, 3, 8, 8), DType::F32);
//! let out = ops::relu(&input.view()).unwrap();
//! assert_eq!(out.shape(), input.shape());
//! ```

mod device;
mod dtype;
mod error;
pub mod ops;
mod shape;
mod tensor;

pub use device::Device;
pub use dtype::DType;
pub use error::TensorError;
pub use shape::Shape;
pub use tensor::{Tensor, TensorView};
