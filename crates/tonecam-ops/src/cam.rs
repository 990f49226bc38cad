//! Cone-response compression and the adaptation field.
//!
//! Building blocks of the appearance model, all parameter-explicit:
//!
//! - [`adaptation_field`] - `FL` from a luminance field
//! - [`cam_compress`] / [`cam_decompress`] - hyperbolic cone-response curve
//! - [`correct_color_temperature`] - remove a global a/b cast in Lab
//!
//! # Formulas
//!
//! ```text
//! k  = 1 / (white + 1)
//! FL = 0.2 * k^4 * white + 0.1 * (1 - k^4)^2 * cbrt(white)
//!
//! v   = (|x| * FL / white)^gamma
//! out = sign(x) * 400 * v / (v + 27.13) + 0.1
//! ```

use crate::OpsResult;
use tonecam_core::{expr, Channel, ColorSpace, Error, Image};
use tracing::trace;

/// Saturation level of the compression curve.
const CAM_SCALE: f32 = 400.0;
/// Half-saturation constant.
const CAM_KNEE: f32 = 27.13;
/// Noise floor added after compression.
const CAM_OFFSET: f32 = 0.1;

/// Luminance-adaptation factor `FL` for every sample of `white`.
///
/// ```rust
/// use tonecam_core::Channel;
/// use tonecam_ops::cam::adaptation_field;
///
/// let white = Channel::from_vec(2, 1, vec![0.0f32, 16250.0]).unwrap();
/// let fl = adaptation_field(&white).unwrap();
/// assert_eq!(fl[0], 0.0);
/// assert!(fl[1] > 1.0);
/// ```
pub fn adaptation_field(white: &Channel<f32>) -> OpsResult<Channel<f32>> {
    let (w, h) = white.dimensions();
    trace!(width = w, height = h, "adaptation_field");
    let mut k4 = Channel::new(w, h);
    k4.assign(expr::pow4(1.0f32 / (white + 1.0f32)))?;
    let mut fl = Channel::new(w, h);
    fl.assign(0.2f32 * &k4 * white + 0.1f32 * expr::square(1.0f32 - &k4) * expr::cbrt(white))?;
    Ok(fl)
}

fn require_color_channels(img: &Image<f32>) -> OpsResult<usize> {
    let channels = img.channels();
    if channels < 3 {
        return Err(Error::channel_mismatch(3, channels).into());
    }
    Ok(channels)
}

/// Compresses cone responses relative to a local white.
///
/// Applied to the first three channels; extra channels are copied. Where
/// the white field is not positive the ratio is taken as 0, so those pixels
/// land on the response offset.
///
/// # Errors
///
/// - [`Error::InvalidColorSpace`] unless `lms` is tagged LMS
/// - [`Error::DimensionMismatch`] if `adapt` or `white` differ in extent
pub fn cam_compress(
    lms: &Image<f32>,
    adapt: &Channel<f32>,
    white: &Channel<f32>,
    gamma: f32,
) -> OpsResult<Image<f32>> {
    lms.require(ColorSpace::Lms)?;
    lms.check_extent(adapt)?;
    lms.check_extent(white)?;
    let channels = require_color_channels(lms)?;
    trace!(width = lms.width(), height = lms.height(), gamma, "cam_compress");

    let mut out = lms.clone();
    for ((px, &a), &wt) in out
        .as_mut_slice()
        .chunks_exact_mut(channels)
        .zip(adapt.iter())
        .zip(white.iter())
    {
        // No local light, no adaptation.
        let ratio = if wt > 0.0 { a / wt } else { 0.0 };
        let ratio = if ratio.is_finite() { ratio } else { 0.0 };
        for v in &mut px[..3] {
            *v = if *v < 0.0 {
                let r = (-ratio * *v).powf(gamma);
                r / (r + CAM_KNEE) * -CAM_SCALE + CAM_OFFSET
            } else {
                let r = (ratio * *v).powf(gamma);
                r / (r + CAM_KNEE) * CAM_SCALE + CAM_OFFSET
            };
        }
    }
    Ok(out)
}

/// Inverse of [`cam_compress`] up to the adaptation ratio.
///
/// # Errors
///
/// [`Error::InvalidColorSpace`] unless `lms` is tagged LMS.
pub fn cam_decompress(lms: &Image<f32>, gamma: f32) -> OpsResult<Image<f32>> {
    lms.require(ColorSpace::Lms)?;
    let channels = require_color_channels(lms)?;
    trace!(width = lms.width(), height = lms.height(), gamma, "cam_decompress");

    let mut out = lms.clone();
    for px in out.as_mut_slice().chunks_exact_mut(channels) {
        for v in &mut px[..3] {
            let val = *v - CAM_OFFSET;
            let sign = if val > 0.0 {
                1.0
            } else if val < 0.0 {
                -1.0
            } else {
                0.0
            };
            let mag = val.abs();
            *v = sign * (CAM_KNEE * mag / (CAM_SCALE - mag)).powf(1.0 / gamma);
        }
    }
    Ok(out)
}

/// Removes a global color cast from a Lab image.
///
/// The lightness-weighted means of `a` and `b` are subtracted, again
/// weighted by each pixel's lightness, so dark pixels barely move.
///
/// # Errors
///
/// [`Error::InvalidColorSpace`] unless `lab` is tagged Lab.
pub fn correct_color_temperature(lab: &Image<f32>) -> OpsResult<Image<f32>> {
    lab.require(ColorSpace::Lab)?;
    let channels = require_color_channels(lab)?;
    let n = lab.pixel_count();
    let mut out = lab.clone();
    if n == 0 {
        return Ok(out);
    }

    let (mut sum_a, mut sum_b) = (0.0f64, 0.0f64);
    for px in lab.as_slice().chunks_exact(channels) {
        let l = (px[0] / 100.0) as f64;
        sum_a += px[1] as f64 * l;
        sum_b += px[2] as f64 * l;
    }
    let mean_a = (sum_a / n as f64) as f32;
    let mean_b = (sum_b / n as f64) as f32;
    trace!(mean_a, mean_b, "correct_color_temperature");

    for px in out.as_mut_slice().chunks_exact_mut(channels) {
        let l = px[0] / 100.0;
        px[1] -= mean_a * l;
        px[2] -= mean_b * l;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn lms(data: Vec<f32>, w: usize, h: usize) -> Image<f32> {
        Image::from_vec(ColorSpace::Lms, w, h, 3, data).unwrap()
    }

    #[test]
    fn test_adaptation_field_formula() {
        let values = [0.0f32, 0.5, 1.0, 20.0, 16250.0];
        let white = Channel::from_vec(5, 1, values.to_vec()).unwrap();
        let fl = adaptation_field(&white).unwrap();
        for (&w, &f) in values.iter().zip(fl.iter()) {
            let k = 1.0 / (w + 1.0);
            let k4 = k * k * k * k;
            let expected = 0.2 * k4 * w + 0.1 * (1.0 - k4) * (1.0 - k4) * w.cbrt();
            assert_relative_eq!(f, expected, max_relative = 1e-5);
        }
    }

    #[test]
    fn test_compress_is_odd_around_offset() {
        let src = lms(vec![2.0, -2.0, 0.0], 1, 1);
        let ones = Channel::from_vec(1, 1, vec![1.0]).unwrap();
        let out = cam_compress(&src, &ones, &ones, 0.7).unwrap();
        assert_relative_eq!(out[0] - 0.1, -(out[1] - 0.1), max_relative = 1e-6);
        assert_eq!(out[2], 0.1);
        assert!(out[0] < 400.1);
    }

    #[test]
    fn test_compress_without_light_sits_on_offset() {
        let src = lms(vec![0.0, 0.0, 0.0, 3.0, -1.0, 0.5], 2, 1);
        let zeros = Channel::<f32>::new(2, 1);
        let out = cam_compress(&src, &zeros, &zeros, 0.7).unwrap();
        assert!(!out.has_nan());
        assert!(out.iter().all(|&v| v == 0.1));
    }

    #[test]
    fn test_decompress_inverts_compress() {
        let data: Vec<f32> = (-10..8).map(|v| v as f32 * 3.7).collect();
        let src = lms(data, 3, 2);
        let mut white = Channel::<f32>::new(3, 2);
        white.fill(500.0);
        let adapt = white.clone();
        let packed = cam_compress(&src, &adapt, &white, 0.7).unwrap();
        let back = cam_decompress(&packed, 0.7).unwrap();
        for (b, s) in back.iter().zip(src.iter()) {
            assert_relative_eq!(*b, *s, epsilon = 1e-3, max_relative = 1e-3);
        }
    }

    #[test]
    fn test_compress_checks_inputs() {
        let src = lms(vec![1.0; 12], 2, 2);
        let small = Channel::<f32>::new(1, 2);
        let ok = Channel::<f32>::new(2, 2);
        assert!(cam_compress(&src, &small, &ok, 0.7).unwrap_err().is_dimension_error());

        let xyz = Image::from_vec(ColorSpace::Xyz, 2, 2, 3, vec![1.0; 12]).unwrap();
        assert!(cam_compress(&xyz, &ok, &ok, 0.7).unwrap_err().is_color_space_error());
        assert!(cam_decompress(&xyz, 0.7).unwrap_err().is_color_space_error());
    }

    #[test]
    fn test_color_temperature_removes_cast() {
        let data = vec![
            50.0, 10.0, -4.0, //
            100.0, 12.0, -6.0, //
            0.0, 30.0, 30.0, //
            80.0, 8.0, -2.0,
        ];
        let src = Image::from_vec(ColorSpace::Lab, 2, 2, 3, data).unwrap();
        let out = correct_color_temperature(&src).unwrap();
        // mean_a = 5.85, mean_b = -2.4; a black pixel keeps its chroma.
        let expected = [
            50.0, 7.075, -2.8, //
            100.0, 6.15, -3.6, //
            0.0, 30.0, 30.0, //
            80.0, 3.32, -0.08,
        ];
        for (o, e) in out.iter().zip(expected) {
            assert_relative_eq!(*o, e, epsilon = 1e-4, max_relative = 1e-5);
        }
    }

    #[test]
    fn test_color_temperature_requires_lab() {
        let img = Image::<f32>::new(ColorSpace::Xyz, 2, 2, 3);
        assert!(correct_color_temperature(&img).unwrap_err().is_color_space_error());
    }
}
