//! # tonecam-ops
//!
//! Local tone mapping and color-appearance operations.
//!
//! # Modules
//!
//! - [`equalize`] - percentile search and histogram equalization
//! - [`fft`] - real 2D FFT, reflect padding, wide Gaussian blur, downscale
//! - [`resize`] - separable resampling behind the [`Resampler`] trait
//! - [`cam`] - cone-response compression, adaptation field, cast removal
//! - [`tonemap`] - the exposure-correction and equalization pipelines
//!
//! # Example
//!
//! ```rust
//! use tonecam_core::{ColorSpace, Image};
//! use tonecam_ops::{equalized_xyz_from_lab, rgb_to_bw_corrected_lab};
//!
//! let mut img = Image::<f32>::new(ColorSpace::Rgb, 16, 16, 3);
//! img.fill(0.25);
//! let mut lightness = rgb_to_bw_corrected_lab(&mut img).unwrap();
//! assert_eq!(img.color_space(), ColorSpace::Lab);
//! let xyz = equalized_xyz_from_lab(&img, &mut lightness).unwrap();
//! assert_eq!(xyz.color_space(), ColorSpace::Xyz);
//! ```
//!
//! # Features
//!
//! - `parallel` - run the independent branches of
//!   [`ToneMapper::render_variants`] on the rayon pool. Off by default; every
//!   other operation runs on the calling thread.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
pub mod cam;
pub mod equalize;
pub mod fft;
pub mod params;
pub mod resize;
pub mod tonemap;

pub use cam::{adaptation_field, cam_compress, cam_decompress, correct_color_temperature};
pub use equalize::{EqualizeExt, Equalizer};
pub use error::{OpsError, OpsResult};
pub use fft::{downscale, gaussian_blur, pad_reflect, RealFft2d};
pub use params::ToneMapParams;
pub use resize::{Filter, Resampler};
pub use tonemap::{
    equalized_xyz_from_lab, ipt_adapt, loc_light_adapt, render_variants, rgb_to_bw_corrected_lab,
    ToneMapper, Variants,
};
