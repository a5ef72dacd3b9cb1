// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Per-channel batch normalization using precomputed statistics.

use super::require_nchw_f32;
use crate::{Shape, Tensor, TensorError, TensorView};

/// Normalizes an NCHW batch per channel with the given statistics:
/// `y = (x - mean) / sqrt(var + epsilon) * gamma + beta`.
///
/// `gamma`, `beta`, `mean`, and `var` are all `[C]` vectors. Callers in
/// evaluation mode pass the running statistics carried in the weights
/// map; training-mode callers compute batch statistics first and pass
/// those instead — the kernel itself is stateless.
pub fn batch_norm(
    input: &TensorView<'_>,
    gamma: &TensorView<'_>,
    beta: &TensorView<'_>,
    mean: &TensorView<'_>,
    var: &TensorView<'_>,
    epsilon: f32,
) -> Result<Tensor, TensorError> {
    let (n, c, h, w) = require_nchw_f32("batch_norm", input)?;

    let expected = Shape::vector(c);
    for v in [gamma, beta, mean, var] {
        if v.shape() != &expected {
            return Err(TensorError::ShapeMismatch {
                op: "batch_norm",
                lhs: expected,
                rhs: v.shape().clone(),
            });
        }
    }

    let x = input.as_f32_slice();
    let g = gamma.as_f32_slice();
    let b = beta.as_f32_slice();
    let m = mean.as_f32_slice();
    let v = var.as_f32_slice();

    let mut output = Tensor::zeros(input.shape().clone(), input.dtype());
    let y = output.as_f32_slice_mut();

    let plane = h * w;
    for bn in 0..n {
        for ch in 0..c {
            let scale = g[ch] / (v[ch] + epsilon).sqrt();
            let shift = b[ch] - m[ch] * scale;
            let base = (bn * c + ch) * plane;
            for i in 0..plane {
                y[base + i] = x[base + i] * scale + shift;
            }
        }
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DType;

    fn vec1(c: usize, value: f32) -> Tensor {
        Tensor::from_f32(Shape::vector(c), &vec![value; c]).unwrap()
    }

    #[test]
    fn test_identity_normalization() {
        // gamma=1, beta=0, mean=0, var=1, eps=0 → y == x.
        let input = Tensor::from_f32(Shape::nchw(1, 1, 2, 2), &[1.0, 2.0, 3.0, 4.0]).unwrap();
        let gamma = vec1(1, 1.0);
        let beta = vec1(1, 0.0);
        let mean = vec1(1, 0.0);
        let var = vec1(1, 1.0);

        let out = batch_norm(
            &input.view(),
            &gamma.view(),
            &beta.view(),
            &mean.view(),
            &var.view(),
            0.0,
        )
        .unwrap();
        assert_eq!(out.as_f32_slice(), &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_shift_and_scale() {
        let input = Tensor::from_f32(Shape::nchw(1, 1, 1, 2), &[4.0, 8.0]).unwrap();
        let gamma = vec1(1, 2.0);
        let beta = vec1(1, 1.0);
        let mean = vec1(1, 4.0);
        let var = vec1(1, 4.0);

        // (x - 4) / 2 * 2 + 1 = x - 3.
        let out = batch_norm(
            &input.view(),
            &gamma.view(),
            &beta.view(),
            &mean.view(),
            &var.view(),
            0.0,
        )
        .unwrap();
        assert_eq!(out.as_f32_slice(), &[1.0, 5.0]);
    }

    #[test]
    fn test_per_channel_statistics() {
        let input =
            Tensor::from_f32(Shape::nchw(1, 2, 1, 1), &[10.0, 10.0]).unwrap();
        let gamma = vec1(2, 1.0);
        let beta = vec1(2, 0.0);
        let mean = Tensor::from_f32(Shape::vector(2), &[10.0, 0.0]).unwrap();
        let var = vec1(2, 1.0);

        let out = batch_norm(
            &input.view(),
            &gamma.view(),
            &beta.view(),
            &mean.view(),
            &var.view(),
            0.0,
        )
        .unwrap();
        assert_eq!(out.as_f32_slice(), &[0.0, 10.0]);
    }

    #[test]
    fn test_stat_shape_mismatch() {
        let input = Tensor::zeros(Shape::nchw(1, 3, 2, 2), DType::F32);
        let bad = vec1(2, 1.0);
        let ok = vec1(3, 1.0);
        assert!(batch_norm(
            &input.view(),
            &bad.view(),
            &ok.view(),
            &ok.view(),
            &ok.view(),
            1e-5,
        )
        .is_err());
    }
}
