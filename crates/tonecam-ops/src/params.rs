//! Pipeline parameters.
//!
//! [`ToneMapParams`] collects every constant the tone-mapping pipelines use.
//! The defaults reproduce the reference behavior; the builder methods exist
//! for experiments and tests.
//!
//! # Example
//!
//! ```rust
//! use tonecam_ops::{Filter, ToneMapParams};
//!
//! let params = ToneMapParams::default()
//!     .with_downscale_target(64)
//!     .with_filter(Filter::Bilinear);
//! params.validate().unwrap();
//! assert_eq!(params.max_luminance, 16250.0);
//! ```

use crate::equalize::DEFAULT_QUANTIZE_LEVELS;
use crate::fft::{DEFAULT_BLUR_SCALE, DEFAULT_DOWNSCALE_TARGET};
use crate::resize::Filter;
use crate::{OpsError, OpsResult};

/// Absolute luminance the local white field is scaled to.
pub const DEFAULT_MAX_LUMINANCE: f32 = 16250.0;

/// Parameters of the tone-mapping pipelines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneMapParams {
    /// Luminance target for local adaptation (cd/m^2 scale).
    pub max_luminance: f32,
    /// Exponent of the cone-response compression.
    pub cam_gamma: f32,
    /// Exponent applied to LMS before the IPT transform.
    pub ipt_exponent: f32,
    /// Gaussian scale of the surround blur.
    pub blur_scale: f32,
    /// Smaller side of the field the blur runs on.
    pub downscale_target: usize,
    /// Equalizer bucket count.
    pub quantize_levels: usize,
    /// Black-point percentile.
    pub lower_percentile: f32,
    /// White-point percentile.
    pub upper_percentile: f32,
    /// Output range of the lightness rescale and equalization.
    pub lightness_range: (f32, f32),
    /// Filter used to bring the blurred white field back to full size.
    pub filter: Filter,
}

impl Default for ToneMapParams {
    fn default() -> Self {
        Self {
            max_luminance: DEFAULT_MAX_LUMINANCE,
            cam_gamma: 0.7,
            ipt_exponent: 0.43,
            blur_scale: DEFAULT_BLUR_SCALE,
            downscale_target: DEFAULT_DOWNSCALE_TARGET,
            quantize_levels: DEFAULT_QUANTIZE_LEVELS,
            lower_percentile: 0.2 / 256.0,
            upper_percentile: 255.8 / 256.0,
            lightness_range: (0.0, 100.0),
            filter: Filter::default(),
        }
    }
}

impl ToneMapParams {
    /// Sets the luminance target.
    pub fn with_max_luminance(mut self, value: f32) -> Self {
        self.max_luminance = value;
        self
    }

    /// Sets the compression exponent.
    pub fn with_cam_gamma(mut self, value: f32) -> Self {
        self.cam_gamma = value;
        self
    }

    /// Sets the IPT exponent.
    pub fn with_ipt_exponent(mut self, value: f32) -> Self {
        self.ipt_exponent = value;
        self
    }

    /// Sets the blur scale.
    pub fn with_blur_scale(mut self, value: f32) -> Self {
        self.blur_scale = value;
        self
    }

    /// Sets the downscale target.
    pub fn with_downscale_target(mut self, value: usize) -> Self {
        self.downscale_target = value;
        self
    }

    /// Sets the equalizer bucket count.
    pub fn with_quantize_levels(mut self, value: usize) -> Self {
        self.quantize_levels = value;
        self
    }

    /// Sets both percentile bounds.
    pub fn with_percentiles(mut self, lower: f32, upper: f32) -> Self {
        self.lower_percentile = lower;
        self.upper_percentile = upper;
        self
    }

    /// Sets the lightness output range.
    pub fn with_lightness_range(mut self, min: f32, max: f32) -> Self {
        self.lightness_range = (min, max);
        self
    }

    /// Sets the upsampling filter.
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    /// Checks every field.
    ///
    /// # Errors
    ///
    /// - [`OpsError::InvalidBound`] for a percentile outside `[0, 1]`
    /// - [`OpsError::InvalidParameter`] for anything else out of range
    pub fn validate(&self) -> OpsResult<()> {
        let positive = [
            ("max_luminance", self.max_luminance),
            ("cam_gamma", self.cam_gamma),
            ("ipt_exponent", self.ipt_exponent),
            ("blur_scale", self.blur_scale),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(OpsError::InvalidParameter(format!(
                    "{name} must be finite and positive, got {value}"
                )));
            }
        }
        if self.downscale_target == 0 {
            return Err(OpsError::InvalidParameter("downscale_target must be > 0".into()));
        }
        if self.quantize_levels == 0 {
            return Err(OpsError::InvalidParameter("quantize_levels must be > 0".into()));
        }
        for bound in [self.lower_percentile, self.upper_percentile] {
            if !(0.0..=1.0).contains(&bound) {
                return Err(OpsError::InvalidBound(bound));
            }
        }
        let (min, max) = self.lightness_range;
        if !(min.is_finite() && max.is_finite() && min < max) {
            return Err(OpsError::InvalidParameter(format!(
                "lightness_range must be increasing, got ({min}, {max})"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let p = ToneMapParams::default();
        p.validate().unwrap();
        assert_eq!(p.quantize_levels, 1000);
        assert_eq!(p.blur_scale, 2.0);
        assert_eq!(p.downscale_target, 128);
        assert_eq!(p.lower_percentile, 0.2 / 256.0);
        assert_eq!(p.filter, Filter::Bicubic);
    }

    #[test]
    fn test_rejects_bad_values() {
        let bad = [
            ToneMapParams::default().with_cam_gamma(0.0),
            ToneMapParams::default().with_max_luminance(f32::NAN),
            ToneMapParams::default().with_downscale_target(0),
            ToneMapParams::default().with_quantize_levels(0),
            ToneMapParams::default().with_lightness_range(100.0, 0.0),
        ];
        for p in bad {
            assert!(matches!(p.validate(), Err(OpsError::InvalidParameter(_))), "{p:?}");
        }
        let p = ToneMapParams::default().with_percentiles(-0.1, 1.0);
        assert!(matches!(p.validate(), Err(OpsError::InvalidBound(_))));
    }
}
