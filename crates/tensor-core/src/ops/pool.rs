// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! 2-D max pooling.

use super::require_nchw_f32;
use crate::{Shape, Tensor, TensorError, TensorView};

/// Max-pools an NCHW batch with a square window.
///
/// The output is `[N, C, OH, OW]` with `OH = (H - kernel) / stride + 1`
/// (floor division — trailing rows/columns that do not fill a window are
/// dropped, matching the downsampling convention the checkpoints were
/// trained with).
pub fn max_pool2d(
    input: &TensorView<'_>,
    kernel: usize,
    stride: usize,
) -> Result<Tensor, TensorError> {
    let (n, c, h, w) = require_nchw_f32("max_pool2d", input)?;

    if kernel == 0 || stride == 0 {
        return Err(TensorError::InvalidArgument {
            op: "max_pool2d",
            detail: "kernel and stride must be non-zero".into(),
        });
    }
    if h < kernel || w < kernel {
        return Err(TensorError::InvalidArgument {
            op: "max_pool2d",
            detail: format!("window {kernel}x{kernel} larger than input {h}x{w}"),
        });
    }

    let oh = (h - kernel) / stride + 1;
    let ow = (w - kernel) / stride + 1;
    let mut output = Tensor::zeros(Shape::nchw(n, c, oh, ow), input.dtype());

    let x = input.as_f32_slice();
    let y = output.as_f32_slice_mut();

    for bn in 0..n {
        for ch in 0..c {
            let in_base = (bn * c + ch) * h * w;
            let out_base = (bn * c + ch) * oh * ow;
            for oy in 0..oh {
                for ox in 0..ow {
                    let mut best = f32::NEG_INFINITY;
                    for ky in 0..kernel {
                        for kx in 0..kernel {
                            let v = x[in_base + (oy * stride + ky) * w + (ox * stride + kx)];
                            if v > best {
                                best = v;
                            }
                        }
                    }
                    y[out_base + oy * ow + ox] = best;
                }
            }
        }
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DType;

    #[test]
    fn test_2x2_pooling() {
        let input = Tensor::from_f32(
            Shape::nchw(1, 1, 4, 4),
            &[
                1.0, 2.0, 3.0, 4.0, //
                5.0, 6.0, 7.0, 8.0, //
                9.0, 10.0, 11.0, 12.0, //
                13.0, 14.0, 15.0, 16.0,
            ],
        )
        .unwrap();

        let out = max_pool2d(&input.view(), 2, 2).unwrap();
        assert_eq!(out.shape(), &Shape::nchw(1, 1, 2, 2));
        assert_eq!(out.as_f32_slice(), &[6.0, 8.0, 14.0, 16.0]);
    }

    #[test]
    fn test_negative_values() {
        let input =
            Tensor::from_f32(Shape::nchw(1, 1, 2, 2), &[-4.0, -3.0, -2.0, -1.0]).unwrap();
        let out = max_pool2d(&input.view(), 2, 2).unwrap();
        assert_eq!(out.as_f32_slice(), &[-1.0]);
    }

    #[test]
    fn test_odd_input_truncates() {
        // 5x5 input, 2x2 window, stride 2 → 2x2 output (last row/col dropped).
        let input = Tensor::zeros(Shape::nchw(1, 1, 5, 5), DType::F32);
        let out = max_pool2d(&input.view(), 2, 2).unwrap();
        assert_eq!(out.shape(), &Shape::nchw(1, 1, 2, 2));
    }

    #[test]
    fn test_window_too_large() {
        let input = Tensor::zeros(Shape::nchw(1, 1, 2, 2), DType::F32);
        assert!(max_pool2d(&input.view(), 3, 2).is_err());
    }
}
