//! Transfer matrix table for the linear color spaces.
//!
//! Linear RGB, XYZ, LMS and IPT are related by 3x3 matrices. Three base
//! matrices are defined here; every other ordered pair is derived once, on
//! first use, by going through XYZ:
//!
//! ```text
//! RGB --XYZ_FROM_RGB--> XYZ --LMS_FROM_XYZ--> LMS --IPT_FROM_LMS--> IPT
//! ```
//!
//! The table is keyed by `(destination, source)` and never mutated after
//! construction.
//!
//! # Example
//!
//! ```rust
//! use tonecam_color::transfer_matrix;
//! use tonecam_core::ColorSpace;
//!
//! let m = transfer_matrix(ColorSpace::Xyz, ColorSpace::Rgb).unwrap();
//! let white = m.transform([1.0, 1.0, 1.0]);
//! assert!((white[1] - 1.0).abs() < 1e-6);
//! assert!(transfer_matrix(ColorSpace::Lab, ColorSpace::Xyz).is_none());
//! ```

use std::collections::HashMap;
use std::sync::OnceLock;
use tonecam_core::ColorSpace;
use tonecam_math::Mat3;

/// Linear sRGB (Rec.709 primaries) to CIE XYZ, D65.
pub const XYZ_FROM_RGB: Mat3 = Mat3::from_rows([
    [0.4124564, 0.3575761, 0.1804375],
    [0.2126729, 0.7151522, 0.0721750],
    [0.0193339, 0.1191920, 0.9503041],
]);

/// XYZ to Hunt-Pointer-Estevez cone responses, D65-normalized (IPT variant).
pub const LMS_FROM_XYZ: Mat3 = Mat3::from_rows([
    [0.4002, 0.7075, -0.0807],
    [-0.2280, 1.1500, 0.0612],
    [0.0, 0.0, 0.9184],
]);

/// Nonlinear LMS to IPT opponent axes.
pub const IPT_FROM_LMS: Mat3 = Mat3::from_rows([
    [0.4000, 0.4000, 0.2000],
    [4.4550, -4.8510, 0.3960],
    [0.8056, 0.3572, -1.1628],
]);

const LINEAR_SPACES: [ColorSpace; 4] = [
    ColorSpace::Rgb,
    ColorSpace::Xyz,
    ColorSpace::Lms,
    ColorSpace::Ipt,
];

type Table = HashMap<(ColorSpace, ColorSpace), Mat3>;

static TABLE: OnceLock<Table> = OnceLock::new();

/// Matrix taking `space` to XYZ.
fn to_xyz(space: ColorSpace) -> Option<Mat3> {
    match space {
        ColorSpace::Xyz => Some(Mat3::IDENTITY),
        ColorSpace::Rgb => Some(XYZ_FROM_RGB),
        ColorSpace::Lms => LMS_FROM_XYZ.inverse(),
        ColorSpace::Ipt => {
            let lms_from_ipt = IPT_FROM_LMS.inverse()?;
            Some(LMS_FROM_XYZ.inverse()? * lms_from_ipt)
        }
        _ => None,
    }
}

fn build_table() -> Table {
    let mut table = Table::new();
    for &src in &LINEAR_SPACES {
        for &dst in &LINEAR_SPACES {
            if src == dst {
                continue;
            }
            let m = match (dst, src) {
                // Keep the published base matrices exact.
                (ColorSpace::Xyz, ColorSpace::Rgb) => Some(XYZ_FROM_RGB),
                (ColorSpace::Lms, ColorSpace::Xyz) => Some(LMS_FROM_XYZ),
                (ColorSpace::Ipt, ColorSpace::Lms) => Some(IPT_FROM_LMS),
                _ => to_xyz(dst)
                    .and_then(|m| m.inverse())
                    .zip(to_xyz(src))
                    .map(|(from_xyz, to)| from_xyz * to),
            };
            if let Some(m) = m.filter(Mat3::is_finite) {
                table.insert((dst, src), m);
            }
        }
    }
    table
}

/// The full `(destination, source) -> matrix` table.
pub fn transfer_table() -> &'static HashMap<(ColorSpace, ColorSpace), Mat3> {
    TABLE.get_or_init(build_table)
}

/// Direct linear transform from `src` to `dst`, if one exists.
///
/// Identity pairs are not in the table.
pub fn transfer_matrix(dst: ColorSpace, src: ColorSpace) -> Option<Mat3> {
    transfer_table().get(&(dst, src)).copied()
}
