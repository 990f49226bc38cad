//! CIE XYZ <-> L*a*b* conversion.
//!
//! The one nonlinear edge of the color-space graph reachable from the matrix
//! spaces. Images are converted relative to [`D65`](crate::D65); the triple
//! functions take any [`Illuminant`].
//!
//! # Formula
//!
//! ```text
//! f(t) = cbrt(t)               if t > 0.008856
//!      = 7.787 * t + 16 / 116  otherwise
//!
//! L = 116 * f(Y / Yn) - 16
//! a = 500 * (f(X / Xn) - f(Y / Yn))
//! b = 200 * (f(Y / Yn) - f(Z / Zn))
//! ```

use crate::illuminant::{Illuminant, D65};

const EPSILON: f32 = 0.008856;
const KAPPA: f32 = 7.787;
const OFFSET: f32 = 16.0 / 116.0;

/// Forward companding function.
#[inline]
pub fn lab_f(t: f32) -> f32 {
    if t > EPSILON {
        t.cbrt()
    } else {
        KAPPA * t + OFFSET
    }
}

/// Inverse of [`lab_f`].
#[inline]
pub fn lab_f_inv(v: f32) -> f32 {
    let cubed = v * v * v;
    if cubed > EPSILON {
        cubed
    } else {
        (v - OFFSET) / KAPPA
    }
}

/// XYZ triple to Lab relative to `white`.
#[inline]
pub fn lab_from_xyz_with(xyz: [f32; 3], white: Illuminant) -> [f32; 3] {
    let x = lab_f(xyz[0] / white.x);
    let y = lab_f(xyz[1] / white.y);
    let z = lab_f(xyz[2] / white.z);
    [116.0 * y - 16.0, 500.0 * (x - y), 200.0 * (y - z)]
}

/// Lab triple to XYZ relative to `white`.
#[inline]
pub fn xyz_from_lab_with(lab: [f32; 3], white: Illuminant) -> [f32; 3] {
    let vy = (lab[0] + 16.0) / 116.0;
    let vx = lab[1] / 500.0 + vy;
    let vz = vy - lab[2] / 200.0;
    [
        lab_f_inv(vx) * white.x,
        lab_f_inv(vy) * white.y,
        lab_f_inv(vz) * white.z,
    ]
}

/// XYZ triple to Lab, D65.
#[inline]
pub fn lab_from_xyz(xyz: [f32; 3]) -> [f32; 3] {
    lab_from_xyz_with(xyz, D65)
}

/// Lab triple to XYZ, D65.
#[inline]
pub fn xyz_from_lab(lab: [f32; 3]) -> [f32; 3] {
    xyz_from_lab_with(lab, D65)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::illuminant::D50;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_white_point() {
        let lab = lab_from_xyz([D65.x, D65.y, D65.z]);
        assert_abs_diff_eq!(lab[0], 100.0, epsilon = 1e-3);
        assert_abs_diff_eq!(lab[1], 0.0, epsilon = 1e-3);
        assert_abs_diff_eq!(lab[2], 0.0, epsilon = 1e-3);
        assert_abs_diff_eq!(lab_from_xyz([0.0; 3])[0], 0.0, epsilon = 1e-3);
    }

    #[test]
    fn test_roundtrip_d65() {
        let steps = [0.001f32, 0.005, 0.02, 0.1, 0.18, 0.35, 0.5, 0.75, 0.99];
        for &x in &steps {
            for &y in &steps {
                for &z in &steps {
                    let xyz = [x * D65.x, y, z * D65.z];
                    let back = xyz_from_lab(lab_from_xyz(xyz));
                    for k in 0..3 {
                        assert_abs_diff_eq!(back[k], xyz[k], epsilon = 1e-4);
                    }
                }
            }
        }
    }

    #[test]
    fn test_roundtrip_d50() {
        let xyz = [0.3, 0.42, 0.2];
        let back = xyz_from_lab_with(lab_from_xyz_with(xyz, D50), D50);
        for k in 0..3 {
            assert_abs_diff_eq!(back[k], xyz[k], epsilon = 1e-4);
        }
    }
}
