//! Color-space labels carried by tagged images.
//!
//! Unlike a compile-time marker, the label here is runtime state: the
//! tone-mapping pipeline walks one image through several spaces in place,
//! so the tag changes as the data does.
//!
//! # Value ranges
//!
//! These are conventions, not enforced:
//!
//! | label               | range                          |
//! |---------------------|--------------------------------|
//! | [`ColorSpace::Srgb`] | 0..=255 (8-bit encoded)       |
//! | [`ColorSpace::Rgb`], [`ColorSpace::Xyz`], [`ColorSpace::Lms`], [`ColorSpace::Ipt`] | 0..=1 |
//! | [`ColorSpace::Lab`]  | L in 0..=100, a/b in -100..=100 |
//!
//! The only enforced range is linear RGB: any conversion landing there is
//! clipped to `[0, 1]`.

use std::fmt;

/// Color-space tag of an [`Image`](crate::Image).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ColorSpace {
    /// Gamma-encoded sRGB, 8-bit.
    Srgb,
    /// Linear RGB with sRGB primaries.
    Rgb,
    /// CIE 1931 XYZ, D65-relative.
    Xyz,
    /// CIE L*a*b*.
    Lab,
    /// Cone response space (Hunt-Pointer-Estevez).
    Lms,
    /// IPT opponent space.
    Ipt,
}

impl ColorSpace {
    /// All labels in declaration order.
    pub const ALL: [ColorSpace; 6] = [
        ColorSpace::Srgb,
        ColorSpace::Rgb,
        ColorSpace::Xyz,
        ColorSpace::Lab,
        ColorSpace::Lms,
        ColorSpace::Ipt,
    ];

    /// Short display name.
    pub const fn name(self) -> &'static str {
        match self {
            ColorSpace::Srgb => "sRGB",
            ColorSpace::Rgb => "RGB",
            ColorSpace::Xyz => "XYZ",
            ColorSpace::Lab => "Lab",
            ColorSpace::Lms => "LMS",
            ColorSpace::Ipt => "IPT",
        }
    }

    /// True for the spaces related to each other by a 3x3 matrix.
    pub const fn is_linear(self) -> bool {
        matches!(
            self,
            ColorSpace::Rgb | ColorSpace::Xyz | ColorSpace::Lms | ColorSpace::Ipt
        )
    }
}

impl fmt::Display for ColorSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
