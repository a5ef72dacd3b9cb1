// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! 2-D convolution.

use super::require_nchw_f32;
use crate::{DType, Shape, Tensor, TensorError, TensorView};

/// Performs a 2-D convolution over an NCHW batch.
///
/// `input` is `[N, C_in, H, W]`, `weight` is `[C_out, C_in, KH, KW]`,
/// and `bias` (if present) is `[C_out]`. The output is
/// `[N, C_out, OH, OW]` with `OH = (H + 2*padding - KH) / stride + 1`
/// (likewise for `OW`).
///
/// # Errors
/// Returns [`TensorError::ShapeMismatch`] if the weight's input-channel
/// count does not match the input, and [`TensorError::InvalidArgument`]
/// for zero strides or kernels larger than the padded input.
pub fn conv2d(
    input: &TensorView<'_>,
    weight: &TensorView<'_>,
    bias: Option<&TensorView<'_>>,
    stride: usize,
    padding: usize,
) -> Result<Tensor, TensorError> {
    let (n, c_in, h, w) = require_nchw_f32("conv2d", input)?;

    let wdims = weight.shape().dims();
    if weight.dtype() != DType::F32 || wdims.len() != 4 {
        return Err(TensorError::InvalidArgument {
            op: "conv2d",
            detail: format!("expected rank-4 f32 weight, got shape {}", weight.shape()),
        });
    }
    let (c_out, kc, kh, kw) = (wdims[0], wdims[1], wdims[2], wdims[3]);
    if kc != c_in {
        return Err(TensorError::ShapeMismatch {
            op: "conv2d",
            lhs: input.shape().clone(),
            rhs: weight.shape().clone(),
        });
    }
    if stride == 0 {
        return Err(TensorError::InvalidArgument {
            op: "conv2d",
            detail: "stride must be non-zero".into(),
        });
    }
    if h + 2 * padding < kh || w + 2 * padding < kw {
        return Err(TensorError::InvalidArgument {
            op: "conv2d",
            detail: format!(
                "kernel {kh}x{kw} larger than padded input {}x{}",
                h + 2 * padding,
                w + 2 * padding,
            ),
        });
    }
    if let Some(b) = bias {
        if b.shape() != &Shape::vector(c_out) {
            return Err(TensorError::ShapeMismatch {
                op: "conv2d (bias)",
                lhs: Shape::vector(c_out),
                rhs: b.shape().clone(),
            });
        }
    }

    let oh = (h + 2 * padding - kh) / stride + 1;
    let ow = (w + 2 * padding - kw) / stride + 1;
    let mut output = Tensor::zeros(Shape::nchw(n, c_out, oh, ow), DType::F32);

    let x = input.as_f32_slice();
    let k = weight.as_f32_slice();
    let b = bias.map(|b| b.as_f32_slice());
    let y = output.as_f32_slice_mut();

    for bn in 0..n {
        for oc in 0..c_out {
            let base_bias = b.map(|b| b[oc]).unwrap_or(0.0);
            for oy in 0..oh {
                for ox in 0..ow {
                    let mut acc = base_bias;
                    for ic in 0..c_in {
                        for ky in 0..kh {
                            // Signed arithmetic: padding can push the tap
                            // outside the input, which contributes zero.
                            let iy = (oy * stride + ky) as isize - padding as isize;
                            if iy < 0 || iy >= h as isize {
                                continue;
                            }
                            for kx in 0..kw {
                                let ix = (ox * stride + kx) as isize - padding as isize;
                                if ix < 0 || ix >= w as isize {
                                    continue;
                                }
                                let xi = ((bn * c_in + ic) * h + iy as usize) * w + ix as usize;
                                let ki = ((oc * c_in + ic) * kh + ky) * kw + kx;
                                acc += x[xi] * k[ki];
                            }
                        }
                    }
                    y[((bn * c_out + oc) * oh + oy) * ow + ox] = acc;
                }
            }
        }
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_kernel() {
        // A 1x1 kernel with weight 1.0 reproduces the input.
        let input = Tensor::from_f32(
            Shape::nchw(1, 1, 2, 2),
            &[1.0, 2.0, 3.0, 4.0],
        )
        .unwrap();
        let weight = Tensor::from_f32(Shape::new(vec![1, 1, 1, 1]), &[1.0]).unwrap();

        let out = conv2d(&input.view(), &weight.view(), None, 1, 0).unwrap();
        assert_eq!(out.shape(), &Shape::nchw(1, 1, 2, 2));
        assert_eq!(out.as_f32_slice(), &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_3x3_same_padding_sum() {
        // All-ones 3x3 kernel with padding 1 computes the neighborhood sum.
        let input = Tensor::from_f32(
            Shape::nchw(1, 1, 3, 3),
            &[1.0; 9],
        )
        .unwrap();
        let weight = Tensor::from_f32(Shape::new(vec![1, 1, 3, 3]), &[1.0; 9]).unwrap();

        let out = conv2d(&input.view(), &weight.view(), None, 1, 1).unwrap();
        assert_eq!(out.shape(), &Shape::nchw(1, 1, 3, 3));
        let y = out.as_f32_slice();
        // Corner sees 4 neighbors, edge 6, center 9.
        assert_eq!(y[0], 4.0);
        assert_eq!(y[1], 6.0);
        assert_eq!(y[4], 9.0);
    }

    #[test]
    fn test_bias_added() {
        let input = Tensor::from_f32(Shape::nchw(1, 1, 1, 1), &[2.0]).unwrap();
        let weight = Tensor::from_f32(Shape::new(vec![1, 1, 1, 1]), &[3.0]).unwrap();
        let bias = Tensor::from_f32(Shape::vector(1), &[0.5]).unwrap();

        let out = conv2d(&input.view(), &weight.view(), Some(&bias.view()), 1, 0).unwrap();
        assert_eq!(out.as_f32_slice(), &[6.5]);
    }

    #[test]
    fn test_multi_channel_accumulation() {
        // Two input channels, 1x1 kernels [1, 10] → output = a + 10*b.
        let input = Tensor::from_f32(
            Shape::nchw(1, 2, 1, 2),
            &[1.0, 2.0, 3.0, 4.0],
        )
        .unwrap();
        let weight = Tensor::from_f32(Shape::new(vec![1, 2, 1, 1]), &[1.0, 10.0]).unwrap();

        let out = conv2d(&input.view(), &weight.view(), None, 1, 0).unwrap();
        assert_eq!(out.as_f32_slice(), &[31.0, 42.0]);
    }

    #[test]
    fn test_stride_two_output_shape() {
        let input = Tensor::zeros(Shape::nchw(1, 1, 8, 8), DType::F32);
        let weight = Tensor::zeros(Shape::new(vec![4, 1, 3, 3]), DType::F32);

        let out = conv2d(&input.view(), &weight.view(), None, 2, 1).unwrap();
        assert_eq!(out.shape(), &Shape::nchw(1, 4, 4, 4));
    }

    #[test]
    fn test_channel_mismatch() {
        let input = Tensor::zeros(Shape::nchw(1, 3, 4, 4), DType::F32);
        let weight = Tensor::zeros(Shape::new(vec![8, 2, 3, 3]), DType::F32);
        assert!(conv2d(&input.view(), &weight.view(), None, 1, 1).is_err());
    }
}
