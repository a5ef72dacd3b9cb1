// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Tensor op kernels.
//!
//! Each op validates dtypes and shapes up front, then dispatches to a
//! portable f32 kernel. Ops allocate and return their output tensor:
//! the pipeline converts and verifies artifacts offline, so per-call
//! allocation is not on any latency-critical path.

mod activation;
mod batch_norm;
mod concat;
mod conv2d;
mod conv_transpose2d;
mod pool;

pub use activation::{relu, sigmoid};
pub use batch_norm::batch_norm;
pub use concat::concat_channels;
pub use conv2d::conv2d;
pub use conv_transpose2d::conv_transpose2d;
pub use pool::max_pool2d;

use crate::{DType, TensorError, TensorView};

/// Validates that a view is an F32 NCHW batch; returns `(n, c, h, w)`.
pub(crate) fn require_nchw_f32(
    op: &'static str,
    view: &TensorView<'_>,
) -> Result<(usize, usize, usize, usize), TensorError> {
    if view.dtype() != DType::F32 {
        return Err(TensorError::UnsupportedDType {
            op,
            dtype: view.dtype(),
        });
    }
    let shape = view.shape();
    if !shape.is_nchw() {
        return Err(TensorError::InvalidArgument {
            op,
            detail: format!("expected rank-4 NCHW input, got shape {shape}"),
        });
    }
    Ok((shape.batch(), shape.channels(), shape.height(), shape.width()))
}
