// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Elementwise activation functions.

use crate::{DType, Tensor, TensorError, TensorView};

/// Rectified linear unit: `max(x, 0)` elementwise.
pub fn relu(input: &TensorView<'_>) -> Result<Tensor, TensorError> {
    elementwise("relu", input, |x| x.max(0.0))
}

/// Logistic sigmoid: `1 / (1 + e^-x)` elementwise.
///
/// The enhancement network's output head uses this to land activations
/// in `(0, 1)` so they map directly onto normalized image intensities.
pub fn sigmoid(input: &TensorView<'_>) -> Result<Tensor, TensorError> {
    elementwise("sigmoid", input, |x| 1.0 / (1.0 + (-x).exp()))
}

fn elementwise(
    op: &'static str,
    input: &TensorView<'_>,
    f: impl Fn(f32) -> f32,
) -> Result<Tensor, TensorError> {
    if input.dtype() != DType::F32 {
        return Err(TensorError::UnsupportedDType {
            op,
            dtype: input.dtype(),
        });
    }
    let values: Vec<f32> = input.as_f32_slice().iter().map(|&x| f(x)).collect();
    Tensor::from_f32(input.shape().clone(), &values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Shape;

    #[test]
    fn test_relu() {
        let t = Tensor::from_f32(Shape::vector(4), &[-2.0, -0.5, 0.0, 3.0]).unwrap();
        let out = relu(&t.view()).unwrap();
        assert_eq!(out.as_f32_slice(), &[0.0, 0.0, 0.0, 3.0]);
    }

    #[test]
    fn test_sigmoid_midpoint() {
        let t = Tensor::from_f32(Shape::vector(1), &[0.0]).unwrap();
        let out = sigmoid(&t.view()).unwrap();
        assert!((out.as_f32_slice()[0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_sigmoid_saturation() {
        let t = Tensor::from_f32(Shape::vector(2), &[-20.0, 20.0]).unwrap();
        let out = sigmoid(&t.view()).unwrap();
        let y = out.as_f32_slice();
        assert!(y[0] < 1e-6);
        assert!(y[1] > 1.0 - 1e-6);
    }

    #[test]
    fn test_dtype_rejected() {
        let t = Tensor::zeros(Shape::vector(4), DType::U8);
        assert!(relu(&t.view()).is_err());
    }
}
