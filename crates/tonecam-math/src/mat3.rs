//! 3x3 matrix type for linear color transforms.
//!
//! [`Mat3`] holds one entry of the transfer matrix table (RGB, XYZ, LMS,
//! IPT inter-conversions) and applies it to every pixel of an interleaved
//! buffer.
//!
//! # Convention
//!
//! Matrices are stored in **row-major** order and use **column vectors**:
//!
//! ```text
//! | m00 m01 m02 |   | x |   | m00*x + m01*y + m02*z |
//! | m10 m11 m12 | * | y | = | m10*x + m11*y + m12*z |
//! | m20 m21 m22 |   | z |   | m20*x + m21*y + m22*z |
//! ```
//!
//! # Usage
//!
//! ```rust
//! use tonecam_math::Mat3;
//!
//! // Linear sRGB to XYZ (D65)
//! let rgb_to_xyz = Mat3::from_rows([
//!     [0.4124564, 0.3575761, 0.1804375],
//!     [0.2126729, 0.7151522, 0.0721750],
//!     [0.0193339, 0.1191920, 0.9503041],
//! ]);
//!
//! let mut pixels = [1.0, 1.0, 1.0, 0.5, 0.5, 0.5];
//! rgb_to_xyz.transform_interleaved(&mut pixels, 3);
//! assert!((pixels[1] - 1.0).abs() < 1e-6);
//! ```

use crate::Vec3;
use std::ops::{Index, Mul};

/// A 3x3 matrix for color transforms.
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(C)]
pub struct Mat3 {
    /// Matrix elements in row-major order: [row0, row1, row2]
    pub m: [[f32; 3]; 3],
}

impl Mat3 {
    /// Identity matrix.
    pub const IDENTITY: Self = Self {
        m: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
    };

    /// Creates a matrix from row arrays.
    #[inline]
    pub const fn from_rows(rows: [[f32; 3]; 3]) -> Self {
        Self { m: rows }
    }

    /// Computes the inverse.
    ///
    /// Returns `None` if the matrix is singular (|determinant| < 1e-10).
    ///
    /// ```rust
    /// use tonecam_math::Mat3;
    ///
    /// let m = Mat3::from_rows([[2.0, 0.0, 0.0], [0.0, 4.0, 0.0], [0.0, 0.0, 0.5]]);
    /// let inv = m.inverse().unwrap();
    /// assert_eq!(inv.m[1][1], 0.25);
    /// ```
    pub fn inverse(&self) -> Option<Self> {
        let g = self.to_glam();
        if g.determinant().abs() < 1e-10 {
            return None;
        }
        Some(Self::from_glam(g.inverse()))
    }

    /// Transforms one triple.
    #[inline]
    pub fn transform(&self, v: [f32; 3]) -> [f32; 3] {
        let m = &self.m;
        [
            m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2],
            m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2],
            m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2],
        ]
    }

    /// Transforms the first three elements of every `stride`-sized pixel in place.
    ///
    /// Extra channels (alpha) are left untouched; a trailing partial pixel is ignored.
    /// Does nothing when `stride < 3`.
    pub fn transform_interleaved(&self, data: &mut [f32], stride: usize) {
        if stride < 3 {
            return;
        }
        for px in data.chunks_exact_mut(stride) {
            let out = self.transform([px[0], px[1], px[2]]);
            px[..3].copy_from_slice(&out);
        }
    }

    /// Multiplies two matrices: `self * other` applies `other` first.
    #[inline]
    pub fn mul_mat(&self, other: &Self) -> Self {
        Self::from_glam(self.to_glam() * other.to_glam())
    }

    /// Returns true if all elements are finite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.m.iter().flatten().all(|x| x.is_finite())
    }

    /// Converts to glam Mat3 (column-major).
    #[inline]
    pub fn to_glam(&self) -> glam::Mat3 {
        glam::Mat3::from_cols_array_2d(&self.m).transpose()
    }

    /// Creates from glam Mat3.
    #[inline]
    pub fn from_glam(m: glam::Mat3) -> Self {
        Self::from_rows(m.transpose().to_cols_array_2d())
    }
}

impl Default for Mat3 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul<Vec3> for Mat3 {
    type Output = Vec3;

    #[inline]
    fn mul(self, rhs: Vec3) -> Vec3 {
        Vec3::from_array(self.transform(rhs.to_array()))
    }
}

impl Mul for Mat3 {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        self.mul_mat(&rhs)
    }
}

impl Index<usize> for Mat3 {
    type Output = [f32; 3];

    #[inline]
    fn index(&self, i: usize) -> &[f32; 3] {
        &self.m[i]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn sample() -> Mat3 {
        Mat3::from_rows([[1.0, 2.0, 3.0], [0.0, 1.0, 4.0], [5.0, 6.0, 0.0]])
    }

    #[test]
    fn test_glam_roundtrip_keeps_layout() {
        let m = sample();
        assert_eq!(Mat3::from_glam(m.to_glam()), m);
        let v = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(m * v, m.to_glam() * v);
    }

    #[test]
    fn test_inverse() {
        let m = sample();
        let result = m * m.inverse().unwrap();
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_abs_diff_eq!(result[i][j], expected, epsilon = 1e-5);
            }
        }
    }

    #[test]
    fn test_singular() {
        let m = Mat3::from_rows([[1.0, 2.0, 3.0], [2.0, 4.0, 6.0], [1.0, 1.0, 1.0]]);
        assert!(m.inverse().is_none());
    }

    #[test]
    fn test_transform_interleaved_skips_alpha() {
        let m = Mat3::from_rows([[2.0, 0.0, 0.0], [0.0, 3.0, 0.0], [0.0, 0.0, 4.0]]);
        let mut px = [1.0, 1.0, 1.0, 0.5, 2.0, 2.0, 2.0, 0.25];
        m.transform_interleaved(&mut px, 4);
        assert_eq!(px, [2.0, 3.0, 4.0, 0.5, 4.0, 6.0, 8.0, 0.25]);
    }

    #[test]
    fn test_mul_order() {
        let a = Mat3::from_rows([[0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]]);
        let b = Mat3::from_rows([[2.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);
        // b first, then swap
        assert_eq!((a * b).transform([1.0, 1.0, 1.0]), [1.0, 2.0, 1.0]);
    }
}
