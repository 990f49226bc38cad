//! Tone-mapping pipelines.
//!
//! [`ToneMapper`] chains the color-space engine, the blur, the appearance
//! model and the equalizer into the two entry points callers use:
//!
//! ```text
//! linear RGB --XYZ--> loc_light_adapt --> ipt_adapt --Lab--> percentile rescale of L
//!                                                              |  rgb_to_bw_corrected_lab
//!                                                              v
//!                                  equalize L --> XYZ            equalized_xyz_from_lab
//! ```
//!
//! [`ToneMapper::render_variants`] derives the four finished products from
//! those two steps. The free functions at the bottom run a default mapper.
//!
//! # Example
//!
//! ```rust
//! use tonecam_core::{ColorSpace, Image};
//! use tonecam_ops::ToneMapper;
//!
//! let mut img = Image::<f32>::new(ColorSpace::Rgb, 8, 8, 3);
//! img.fill(0.4);
//! let variants = ToneMapper::default().render_variants(&img).unwrap();
//! assert_eq!(variants.equalized.color_space(), ColorSpace::Rgb);
//! ```

use crate::cam::{adaptation_field, cam_compress, correct_color_temperature};
use crate::equalize::Equalizer;
use crate::fft::{downscale, gaussian_blur};
use crate::params::ToneMapParams;
use crate::resize::{resize_channel, Filter, Resampler};
use crate::OpsResult;
use tonecam_color::ColorConvert;
use tonecam_core::{copy_channel, load_from_channel, Channel, ColorSpace, Error, Image};
use tracing::{debug, warn};

/// Chroma-correction curve of the IPT adaptation.
const CHROMA_A: f32 = 1.29;
const CHROMA_B: f32 = 0.27;
const CHROMA_C: f32 = 0.42;
const CHROMA_D: f32 = 0.31;
/// Exponent of the lightness factor `(FL + 1)^0.15`.
const LIGHTNESS_EXPONENT: f32 = 0.15;

/// The four finished renderings, all linear RGB.
#[derive(Debug, Clone, PartialEq)]
pub struct Variants {
    /// Locally adapted, black and white points stretched.
    pub exposure_corrected: Image<f32>,
    /// As above, with the color cast removed.
    pub color_corrected: Image<f32>,
    /// Lightness histogram-equalized.
    pub equalized: Image<f32>,
    /// Equalized, with the color cast removed.
    pub equalized_color_corrected: Image<f32>,
}

/// Tone-mapping pipelines with their parameters.
#[derive(Debug, Clone)]
pub struct ToneMapper<R: Resampler = Filter> {
    params: ToneMapParams,
    resampler: R,
}

impl Default for ToneMapper<Filter> {
    fn default() -> Self {
        let params = ToneMapParams::default();
        Self {
            resampler: params.filter,
            params,
        }
    }
}

impl ToneMapper<Filter> {
    /// Mapper using `params.filter` for resampling.
    ///
    /// # Errors
    ///
    /// Whatever [`ToneMapParams::validate`] reports.
    pub fn new(params: ToneMapParams) -> OpsResult<Self> {
        params.validate()?;
        Ok(Self {
            resampler: params.filter,
            params,
        })
    }
}

impl<R: Resampler> ToneMapper<R> {
    /// Mapper with a caller-supplied resize primitive.
    ///
    /// # Errors
    ///
    /// Whatever [`ToneMapParams::validate`] reports.
    pub fn with_resampler(params: ToneMapParams, resampler: R) -> OpsResult<Self> {
        params.validate()?;
        Ok(Self { params, resampler })
    }

    /// Parameters in use.
    pub fn params(&self) -> &ToneMapParams {
        &self.params
    }

    /// Resize primitive in use.
    pub fn resampler(&self) -> &R {
        &self.resampler
    }

    /// Smoothed local white of an XYZ image, in absolute luminance.
    ///
    /// Luminance is scaled so its maximum is `max_luminance`, block-averaged
    /// down, blurred and resized back to the image size.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidColorSpace`] unless `xyz` is tagged XYZ.
    pub fn local_white(&self, xyz: &Image<f32>) -> OpsResult<Channel<f32>> {
        xyz.require(ColorSpace::Xyz)?;
        let scale = luminance_scale(xyz, self.params.max_luminance)?;
        let (w, h) = xyz.dimensions();
        let mut white = copy_channel(xyz, 1)?;
        *white *= scale;
        let small = downscale(&white, self.params.downscale_target)?;
        let small = gaussian_blur(&small, self.params.blur_scale)?;
        resize_channel(&small, w, h, &self.resampler)
    }

    /// Local light adaptation: cone compression against the local white.
    ///
    /// The result is XYZ, on the compressed response scale.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidColorSpace`] unless `xyz` is tagged XYZ.
    pub fn loc_light_adapt(&self, xyz: &Image<f32>) -> OpsResult<Image<f32>> {
        xyz.require(ColorSpace::Xyz)?;
        debug!(width = xyz.width(), height = xyz.height(), "loc_light_adapt");
        let white = self.local_white(xyz)?;
        let fl = adaptation_field(&white)?;

        let mut scaled = xyz.clone();
        scale_color(&mut scaled, luminance_scale(xyz, self.params.max_luminance)?);
        scaled.change_color_space(ColorSpace::Lms)?;
        let mut result = cam_compress(&scaled, &fl, &white, self.params.cam_gamma)?;
        result.change_color_space(ColorSpace::Xyz)?;
        Ok(result)
    }

    /// IPT chroma adaptation; the result's maximum luminance is 1.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidColorSpace`] unless `xyz` is tagged XYZ.
    pub fn ipt_adapt(&self, xyz: &Image<f32>, max_luminance: f32) -> OpsResult<Image<f32>> {
        xyz.require(ColorSpace::Xyz)?;
        debug!(width = xyz.width(), height = xyz.height(), max_luminance, "ipt_adapt");
        let exponent = self.params.ipt_exponent;

        let mut result = xyz.clone();
        scale_color(&mut result, luminance_scale(xyz, max_luminance)?);
        let fl = adaptation_field(&copy_channel(&result, 1)?)?;

        result.change_color_space(ColorSpace::Lms)?;
        signed_pow(&mut result, exponent);
        result.change_color_space(ColorSpace::Ipt)?;

        let channels = result.channels();
        for (px, &f) in result.as_mut_slice().chunks_exact_mut(channels).zip(fl.iter()) {
            let (m, s) = (px[1], px[2]);
            let c = (m * m + s * s).sqrt();
            let correction =
                (CHROMA_A * c * c - CHROMA_B * c + CHROMA_C) / (c * c - CHROMA_D * c + CHROMA_C);
            let factor = (f + 1.0).powf(LIGHTNESS_EXPONENT) * correction;
            px[1] = m * factor;
            px[2] = s * factor;
        }

        result.change_color_space(ColorSpace::Lms)?;
        signed_pow(&mut result, 1.0 / exponent);
        result.change_color_space(ColorSpace::Xyz)?;
        let normalize = luminance_scale(&result, 1.0)?;
        scale_color(&mut result, normalize);
        Ok(result)
    }

    /// Exposure correction of a linear RGB image, in place.
    ///
    /// The image ends up in Lab with its lightness stretched between the
    /// configured percentiles; the stretched lightness is also returned.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidColorSpace`] unless `img` is tagged linear RGB. On any
    /// error `img` is left in an unspecified intermediate state.
    pub fn rgb_to_bw_corrected_lab(&self, img: &mut Image<f32>) -> OpsResult<Channel<f32>> {
        img.require(ColorSpace::Rgb)?;
        img.change_color_space(ColorSpace::Xyz)?;
        *img = self.loc_light_adapt(img)?;
        *img = self.ipt_adapt(img, self.params.max_luminance)?;
        img.change_color_space(ColorSpace::Lab)?;

        let mut lightness = copy_channel(img, 0)?;
        let eq = Equalizer::build(&lightness, self.params.quantize_levels)?;
        let lower = eq.lower_percentile(self.params.lower_percentile)?;
        let upper = eq.upper_percentile(self.params.upper_percentile)?;
        debug!(lower, upper, "lightness percentiles");

        let (out_min, out_max) = self.params.lightness_range;
        lightness.rescale(lower, upper, out_min, out_max);
        load_from_channel(img, &lightness, 0)?;
        Ok(lightness)
    }

    /// Equalizes `lightness` in place and returns a copy of `lab` carrying
    /// it, converted to XYZ.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidColorSpace`] unless `lab` is tagged Lab
    /// - [`Error::DimensionMismatch`] if `lightness` does not match `lab`
    pub fn equalized_xyz_from_lab(
        &self,
        lab: &Image<f32>,
        lightness: &mut Channel<f32>,
    ) -> OpsResult<Image<f32>> {
        lab.require(ColorSpace::Lab)?;
        lab.check_extent(lightness)?;
        let mut result = lab.clone();
        let eq = Equalizer::build(lightness, self.params.quantize_levels)?;
        let (out_min, out_max) = self.params.lightness_range;
        eq.export_equalized(lightness, out_min, out_max)?;
        load_from_channel(&mut result, lightness, 0)?;
        result.change_color_space(ColorSpace::Xyz)?;
        Ok(result)
    }

    /// Renders all four variants of a linear RGB image.
    ///
    /// The corrected and equalized branches each work on their own copies;
    /// with the `parallel` feature they run on the rayon pool.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidColorSpace`] unless `linear_rgb` is tagged linear RGB.
    pub fn render_variants(&self, linear_rgb: &Image<f32>) -> OpsResult<Variants>
    where
        R: Sync,
    {
        let mut lab = linear_rgb.clone();
        let lightness = self.rgb_to_bw_corrected_lab(&mut lab)?;
        let lab = &lab;

        let corrected = || -> OpsResult<(Image<f32>, Image<f32>)> {
            let exposure = to_linear_rgb(lab.clone())?;
            let color = to_linear_rgb(correct_color_temperature(lab)?)?;
            Ok((exposure, color))
        };
        let equalized = move || -> OpsResult<(Image<f32>, Image<f32>)> {
            let mut lightness = lightness;
            let xyz = self.equalized_xyz_from_lab(lab, &mut lightness)?;
            let xyz = self.ipt_adapt(&xyz, 1.0)?;
            let equalized = xyz.converted(ColorSpace::Rgb)?;
            let mut both = xyz;
            both.change_color_space(ColorSpace::Lab)?;
            let both = to_linear_rgb(correct_color_temperature(&both)?)?;
            Ok((equalized, both))
        };

        #[cfg(feature = "parallel")]
        let (first, second) = rayon::join(corrected, equalized);
        #[cfg(not(feature = "parallel"))]
        let (first, second) = (corrected(), equalized());

        let (exposure_corrected, color_corrected) = first?;
        let (equalized, equalized_color_corrected) = second?;
        Ok(Variants {
            exposure_corrected,
            color_corrected,
            equalized,
            equalized_color_corrected,
        })
    }
}

/// Lab to linear RGB through XYZ.
fn to_linear_rgb(mut img: Image<f32>) -> OpsResult<Image<f32>> {
    img.change_color_space(ColorSpace::Xyz)?;
    img.change_color_space(ColorSpace::Rgb)?;
    Ok(img)
}

/// Factor bringing the maximum of channel 1 to `target`.
///
/// A non-positive maximum leaves the image unscaled.
fn luminance_scale(img: &Image<f32>, target: f32) -> OpsResult<f32> {
    let ranges = img.min_max_values();
    if ranges.is_empty() {
        return Ok(1.0);
    }
    let Some(&(_, max_y)) = ranges.get(1) else {
        return Err(Error::channel_mismatch(3, img.channels()).into());
    };
    if max_y > 0.0 {
        Ok(target / max_y)
    } else {
        warn!(max_y, "non-positive maximum luminance, skipping normalization");
        Ok(1.0)
    }
}

/// Multiplies the three color channels, leaving any extra channel alone.
fn scale_color(img: &mut Image<f32>, factor: f32) {
    let channels = img.channels();
    if channels < 3 {
        return;
    }
    for px in img.as_mut_slice().chunks_exact_mut(channels) {
        for v in &mut px[..3] {
            *v *= factor;
        }
    }
}

/// `sign(v) * |v|^exp` over the three color channels.
fn signed_pow(img: &mut Image<f32>, exp: f32) {
    let channels = img.channels();
    if channels < 3 {
        return;
    }
    for px in img.as_mut_slice().chunks_exact_mut(channels) {
        for v in &mut px[..3] {
            *v = v.abs().powf(exp).copysign(*v);
        }
    }
}

/// [`ToneMapper::loc_light_adapt`] with default parameters.
pub fn loc_light_adapt(xyz: &Image<f32>) -> OpsResult<Image<f32>> {
    ToneMapper::default().loc_light_adapt(xyz)
}

/// [`ToneMapper::ipt_adapt`] with default parameters.
pub fn ipt_adapt(xyz: &Image<f32>, max_luminance: f32) -> OpsResult<Image<f32>> {
    ToneMapper::default().ipt_adapt(xyz, max_luminance)
}

/// [`ToneMapper::rgb_to_bw_corrected_lab`] with default parameters.
pub fn rgb_to_bw_corrected_lab(img: &mut Image<f32>) -> OpsResult<Channel<f32>> {
    ToneMapper::default().rgb_to_bw_corrected_lab(img)
}

/// [`ToneMapper::equalized_xyz_from_lab`] with default parameters.
pub fn equalized_xyz_from_lab(lab: &Image<f32>, lightness: &mut Channel<f32>) -> OpsResult<Image<f32>> {
    ToneMapper::default().equalized_xyz_from_lab(lab, lightness)
}

/// [`ToneMapper::render_variants`] with default parameters.
pub fn render_variants(linear_rgb: &Image<f32>) -> OpsResult<Variants> {
    ToneMapper::default().render_variants(linear_rgb)
}
