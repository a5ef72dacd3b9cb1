// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Transposed 2-D convolution (fractionally-strided upsampling).

use super::require_nchw_f32;
use crate::{DType, Shape, Tensor, TensorError, TensorView};

/// Performs a transposed 2-D convolution over an NCHW batch.
///
/// `input` is `[N, C_in, H, W]`, `weight` is `[C_in, C_out, KH, KW]`
/// (input-channels first, the layout checkpoint weights use for
/// up-convolutions), and `bias` (if present) is `[C_out]`. The output is
/// `[N, C_out, OH, OW]` with `OH = (H - 1) * stride + KH` and likewise
/// for `OW` — no output padding.
///
/// Implemented as a scatter-add: every input element contributes its
/// weighted kernel patch to the output.
pub fn conv_transpose2d(
    input: &TensorView<'_>,
    weight: &TensorView<'_>,
    bias: Option<&TensorView<'_>>,
    stride: usize,
) -> Result<Tensor, TensorError> {
    let (n, c_in, h, w) = require_nchw_f32("conv_transpose2d", input)?;

    let wdims = weight.shape().dims();
    if weight.dtype() != DType::F32 || wdims.len() != 4 {
        return Err(TensorError::InvalidArgument {
            op: "conv_transpose2d",
            detail: format!("expected rank-4 f32 weight, got shape {}", weight.shape()),
        });
    }
    let (kc, c_out, kh, kw) = (wdims[0], wdims[1], wdims[2], wdims[3]);
    if kc != c_in {
        return Err(TensorError::ShapeMismatch {
            op: "conv_transpose2d",
            lhs: input.shape().clone(),
            rhs: weight.shape().clone(),
        });
    }
    if stride == 0 {
        return Err(TensorError::InvalidArgument {
            op: "conv_transpose2d",
            detail: "stride must be non-zero".into(),
        });
    }
    if let Some(b) = bias {
        if b.shape() != &Shape::vector(c_out) {
            return Err(TensorError::ShapeMismatch {
                op: "conv_transpose2d (bias)",
                lhs: Shape::vector(c_out),
                rhs: b.shape().clone(),
            });
        }
    }

    let oh = (h - 1) * stride + kh;
    let ow = (w - 1) * stride + kw;
    let mut output = Tensor::zeros(Shape::nchw(n, c_out, oh, ow), DType::F32);

    let x = input.as_f32_slice();
    let k = weight.as_f32_slice();
    let y = output.as_f32_slice_mut();

    // Bias first, then scatter-add the weighted patches.
    if let Some(b) = bias {
        let b = b.as_f32_slice();
        for bn in 0..n {
            for oc in 0..c_out {
                let base = ((bn * c_out + oc) * oh) * ow;
                y[base..base + oh * ow].iter_mut().for_each(|v| *v = b[oc]);
            }
        }
    }

    for bn in 0..n {
        for ic in 0..c_in {
            for iy in 0..h {
                for ix in 0..w {
                    let xv = x[((bn * c_in + ic) * h + iy) * w + ix];
                    if xv == 0.0 {
                        continue;
                    }
                    for oc in 0..c_out {
                        for ky in 0..kh {
                            let oy = iy * stride + ky;
                            for kx in 0..kw {
                                let ox = ix * stride + kx;
                                let ki = ((ic * c_out + oc) * kh + ky) * kw + kx;
                                y[((bn * c_out + oc) * oh + oy) * ow + ox] += xv * k[ki];
                            }
                        }
                    }
                }
            }
        }
    }

    Ok(output)
}
