// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Channel-axis concatenation.

use super::require_nchw_f32;
use crate::{Shape, Tensor, TensorError, TensorView};

/// Concatenates two NCHW batches along the channel axis.
///
/// Both inputs must agree on batch, height, and width. This is the
/// skip-connection merge of the encoder/decoder architecture: the
/// upsampled decoder activation is joined with the matching encoder
/// activation before the decoder block convolves them together.
pub fn concat_channels(
    a: &TensorView<'_>,
    b: &TensorView<'_>,
) -> Result<Tensor, TensorError> {
    let (n, ca, h, w) = require_nchw_f32("concat_channels", a)?;
    let (nb, cb, hb, wb) = require_nchw_f32("concat_channels", b)?;

    if n != nb || h != hb || w != wb {
        return Err(TensorError::ShapeMismatch {
            op: "concat_channels",
            lhs: a.shape().clone(),
            rhs: b.shape().clone(),
        });
    }

    let mut output = Tensor::zeros(Shape::nchw(n, ca + cb, h, w), a.dtype());

    let xa = a.as_f32_slice();
    let xb = b.as_f32_slice();
    let y = output.as_f32_slice_mut();

    let plane = h * w;
    for bn in 0..n {
        let out_base = bn * (ca + cb) * plane;
        let a_base = bn * ca * plane;
        let b_base = bn * cb * plane;
        y[out_base..out_base + ca * plane]
            .copy_from_slice(&xa[a_base..a_base + ca * plane]);
        y[out_base + ca * plane..out_base + (ca + cb) * plane]
            .copy_from_slice(&xb[b_base..b_base + cb * plane]);
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DType;

    #[test]
    fn test_concat_order_preserved() {
        let a = Tensor::from_f32(Shape::nchw(1, 1, 1, 2), &[1.0, 2.0]).unwrap();
        let b = Tensor::from_f32(Shape::nchw(1, 2, 1, 2), &[3.0, 4.0, 5.0, 6.0]).unwrap();

        let out = concat_channels(&a.view(), &b.view()).unwrap();
        assert_eq!(out.shape(), &Shape::nchw(1, 3, 1, 2));
        assert_eq!(out.as_f32_slice(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_batch_interleaving() {
        // Two batch items: each output item must hold its own channels.
        let a = Tensor::from_f32(Shape::nchw(2, 1, 1, 1), &[1.0, 10.0]).unwrap();
        let b = Tensor::from_f32(Shape::nchw(2, 1, 1, 1), &[2.0, 20.0]).unwrap();

        let out = concat_channels(&a.view(), &b.view()).unwrap();
        assert_eq!(out.as_f32_slice(), &[1.0, 2.0, 10.0, 20.0]);
    }

    #[test]
    fn test_spatial_mismatch() {
        let a = Tensor::zeros(Shape::nchw(1, 1, 4, 4), DType::F32);
        let b = Tensor::zeros(Shape::nchw(1, 1, 2, 2), DType::F32);
        assert!(concat_channels(&a.view(), &b.view()).is_err());
    }
}
