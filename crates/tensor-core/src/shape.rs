// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Tensor shape descriptors and dimension utilities.

use std::fmt;

/// Describes the dimensionality of a [`crate::Tensor`].
///
/// Shapes are immutable once created. Most tensors in the pipeline are
/// rank-4 NCHW image batches, so accessors for those axes are provided
/// directly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Shape {
    dims: Vec<usize>,
}

impl Shape {
    /// Creates a new shape from the given dimensions.
    ///
    /// # Examples
    /// ```
    /// use tensor_core::Shape;
    /// let s = Shape::new(vec![2, 3, 4]);
    /// assert_eq!(s.rank(), 3);
    /// assert_eq!(s.num_elements(), 24);
    /// ```
    pub fn new(dims: Vec<usize>) -> Self {
        Self { dims }
    }

    /// Creates a 1-D shape.
    pub fn vector(len: usize) -> Self {
        Self { dims: vec![len] }
    }

    /// Creates a rank-4 image-batch shape `[batch, channels, height, width]`.
    pub fn nchw(batch: usize, channels: usize, height: usize, width: usize) -> Self {
        Self {
            dims: vec![batch, channels, height, width],
        }
    }

    /// Returns the number of dimensions (rank).
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Returns the total number of elements.
    pub fn num_elements(&self) -> usize {
        if self.dims.is_empty() {
            1
        } else {
            self.dims.iter().product()
        }
    }

    /// Returns the dimensions as a slice.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Returns the size of a specific dimension, or `None` if out of bounds.
    pub fn dim(&self, index: usize) -> Option<usize> {
        self.dims.get(index).copied()
    }

    /// Returns `true` if this is a rank-4 shape usable as an NCHW batch.
    pub fn is_nchw(&self) -> bool {
        self.rank() == 4
    }

    /// Batch size (axis 0) of an NCHW shape.
    ///
    /// # Panics
    /// Panics if the shape is not rank 4.
    pub fn batch(&self) -> usize {
        assert!(self.is_nchw(), "batch() on non-NCHW shape {self}");
        self.dims[0]
    }

    /// Channel count (axis 1) of an NCHW shape.
    ///
    /// # Panics
    /// Panics if the shape is not rank 4.
    pub fn channels(&self) -> usize {
        assert!(self.is_nchw(), "channels() on non-NCHW shape {self}");
        self.dims[1]
    }

    /// Height (axis 2) of an NCHW shape.
    ///
    /// # Panics
    /// Panics if the shape is not rank 4.
    pub fn height(&self) -> usize {
        assert!(self.is_nchw(), "height() on non-NCHW shape {self}");
        self.dims[2]
    }

    /// Width (axis 3) of an NCHW shape.
    ///
    /// # Panics
    /// Panics if the shape is not rank 4.
    pub fn width(&self) -> usize {
        assert!(self.is_nchw(), "width() on non-NCHW shape {self}");
        self.dims[3]
    }

    /// Computes the memory footprint in bytes for a given [`crate::DType`].
    pub fn size_bytes(&self, dtype: super::DType) -> usize {
        self.num_elements() * dtype.size_bytes()
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, d) in self.dims.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{d}")?;
        }
        write!(f, "]")
    }
}

/// Convenience: `Shape::from(vec![1, 3, 64, 64])`.
impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Self::new(dims)
    }
}

/// Convenience: `Shape::from(&[1, 3, 64, 64][..])`.
impl From<&[usize]> for Shape {
    fn from(dims: &[usize]) -> Self {
        Self::new(dims.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DType;

    #[test]
    fn test_nchw_accessors() {
        let s = Shape::nchw(2, 3, 64, 48);
        assert_eq!(s.rank(), 4);
        assert_eq!(s.batch(), 2);
        assert_eq!(s.channels(), 3);
        assert_eq!(s.height(), 64);
        assert_eq!(s.width(), 48);
        assert_eq!(s.num_elements(), 2 * 3 * 64 * 48);
    }

    #[test]
    fn test_vector_shape() {
        let s = Shape::vector(32);
        assert_eq!(s.rank(), 1);
        assert_eq!(s.num_elements(), 32);
        assert!(!s.is_nchw());
    }

    #[test]
    #[should_panic]
    fn test_nchw_accessor_on_vector_panics() {
        Shape::vector(3).channels();
    }

    #[test]
    fn test_size_bytes() {
        let s = Shape::nchw(1, 3, 16, 16);
        assert_eq!(s.size_bytes(DType::F32), 3 * 16 * 16 * 4);
        assert_eq!(s.size_bytes(DType::U8), 3 * 16 * 16);
    }

    #[test]
    fn test_display() {
        let s = Shape::nchw(1, 3, 256, 256);
        assert_eq!(format!("{s}"), "[1, 3, 256, 256]");
    }

    #[test]
    fn test_from_conversions() {
        let s1: Shape = vec![1, 3, 8, 8].into();
        let s2: Shape = (&[1usize, 3, 8, 8][..]).into();
        assert_eq!(s1, s2);
    }

    #[test]
    fn test_serde_roundtrip() {
        let s = Shape::nchw(1, 3, 32, 32);
        let json = serde_json::to_string(&s).unwrap();
        let back: Shape = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }
}
