//! 8-bit sRGB encode/decode.
//!
//! Decoding goes through a 256-entry table built once on first use; encoding
//! evaluates the piecewise curve directly, rounding half up and saturating to
//! `0..=255`.
//!
//! # Formula
//!
//! ```text
//! encode(L) = 255 * (1.055 * L^(1/2.4) - 0.055)   if L > 0.0031308
//!           = 255 * 12.92 * L                      otherwise
//! decode(n) = inverse curve at n / 255
//! ```
//!
//! # Reference
//!
//! IEC 61966-2-1:1999

use crate::error::ColorResult;
use std::sync::OnceLock;
use tonecam_core::{ColorSpace, Error, Image};
use tracing::trace;

static DECODE_TABLE: OnceLock<[f32; 256]> = OnceLock::new();

fn eotf(v: f64) -> f64 {
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

/// The decode table: linear value for every encoded byte.
pub fn decode_table() -> &'static [f32; 256] {
    DECODE_TABLE.get_or_init(|| std::array::from_fn(|n| eotf(n as f64 / 255.0) as f32))
}

/// Encoded byte to linear `[0, 1]`.
#[inline]
pub fn decode(value: u8) -> f32 {
    decode_table()[value as usize]
}

/// Linear value to encoded byte.
///
/// ```rust
/// use tonecam_color::srgb::{decode, encode};
///
/// assert_eq!(encode(0.0), 0);
/// assert_eq!(encode(1.0), 255);
/// assert_eq!(encode(decode(128)), 128);
/// ```
#[inline]
pub fn encode(value: f32) -> u8 {
    let v = if value > 0.0031308 {
        255.0 * (1.055 * value.powf(1.0 / 2.4) - 0.055) + 0.5
    } else {
        12.92 * value * 255.0 + 0.5
    };
    // `as` saturates and truncates.
    v as u8
}

/// Decodes an sRGB image into a new linear RGB image.
///
/// Every element (alpha included) goes through the table.
///
/// # Errors
///
/// [`Error::InvalidColorSpace`] unless `src` is tagged sRGB.
pub fn linear_from_srgb(src: &Image<u8>) -> ColorResult<Image<f32>> {
    let mut dst = Image::new(ColorSpace::Rgb, src.width(), src.height(), src.channels());
    linear_from_srgb_into(&mut dst, src)?;
    Ok(dst)
}

/// Encodes a linear RGB image into a new sRGB image.
///
/// # Errors
///
/// [`Error::InvalidColorSpace`] unless `src` is tagged linear RGB.
pub fn srgb_from_linear(src: &Image<f32>) -> ColorResult<Image<u8>> {
    let mut dst = Image::new(ColorSpace::Srgb, src.width(), src.height(), src.channels());
    srgb_from_linear_into(&mut dst, src)?;
    Ok(dst)
}

/// Decodes into an existing linear RGB image.
///
/// # Errors
///
/// - [`Error::InvalidColorSpace`] if `src` is not sRGB or `dst` not linear RGB
/// - [`Error::DimensionMismatch`] if the shapes differ
pub fn linear_from_srgb_into(dst: &mut Image<f32>, src: &Image<u8>) -> ColorResult<()> {
    src.require(ColorSpace::Srgb)?;
    dst.require(ColorSpace::Rgb)?;
    check_shape(dst, src)?;
    trace!(width = src.width(), height = src.height(), "linear_from_srgb");
    let table = decode_table();
    for (out, &v) in dst.as_mut_slice().iter_mut().zip(src.as_slice()) {
        *out = table[v as usize];
    }
    Ok(())
}

/// Encodes into an existing sRGB image.
///
/// # Errors
///
/// - [`Error::InvalidColorSpace`] if `src` is not linear RGB or `dst` not sRGB
/// - [`Error::DimensionMismatch`] if the shapes differ
pub fn srgb_from_linear_into(dst: &mut Image<u8>, src: &Image<f32>) -> ColorResult<()> {
    src.require(ColorSpace::Rgb)?;
    dst.require(ColorSpace::Srgb)?;
    check_shape(dst, src)?;
    trace!(width = src.width(), height = src.height(), "srgb_from_linear");
    for (out, &v) in dst.as_mut_slice().iter_mut().zip(src.as_slice()) {
        *out = encode(v);
    }
    Ok(())
}

fn check_shape<A, B>(a: &Image<A>, b: &Image<B>) -> Result<(), Error>
where
    A: tonecam_core::Element,
    B: tonecam_core::Element,
{
    if a.same_dimensions(b) {
        Ok(())
    } else if a.channels() != b.channels() {
        Err(Error::channel_mismatch(a.channels(), b.channels()))
    } else {
        Err(Error::dimension_mismatch(a.dimensions(), b.dimensions()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_roundtrip_all_bytes() {
        for n in 0..=255u8 {
            assert_eq!(encode(decode(n)), n, "byte {n}");
        }
    }

    #[test]
    fn test_threshold_neighbours() {
        // 10 decodes just below the linear-segment threshold, 11 just above.
        assert!(decode(10) <= 0.0031308);
        assert!(decode(11) > 0.0031308);
        assert_eq!(encode(decode(10)), 10);
        assert_eq!(encode(decode(11)), 11);
        assert_eq!(encode(0.0031308), 10);
    }

    #[test]
    fn test_endpoints_and_saturation() {
        assert_eq!(decode(0), 0.0);
        assert_abs_diff_eq!(decode(255), 1.0, epsilon = 1e-6);
        assert_eq!(encode(-0.5), 0);
        assert_eq!(encode(4.0), 255);
    }

    #[test]
    fn test_image_conversion_checks_tags() {
        let src = Image::<u8>::new(ColorSpace::Rgb, 2, 2, 3);
        assert!(linear_from_srgb(&src).unwrap_err().is_color_space_error());

        let mut lin = Image::<f32>::new(ColorSpace::Rgb, 2, 2, 3);
        let wrong = Image::<u8>::new(ColorSpace::Srgb, 3, 2, 3);
        assert!(linear_from_srgb_into(&mut lin, &wrong)
            .unwrap_err()
            .is_dimension_error());
    }

    #[test]
    fn test_image_roundtrip() {
        let data: Vec<u8> = (0..48).map(|v| (v * 5) as u8).collect();
        let src = Image::from_vec(ColorSpace::Srgb, 4, 3, 4, data).unwrap();
        let lin = linear_from_srgb(&src).unwrap();
        assert_eq!(lin.color_space(), ColorSpace::Rgb);
        let back = srgb_from_linear(&lin).unwrap();
        assert_eq!(back, src);
    }
}
