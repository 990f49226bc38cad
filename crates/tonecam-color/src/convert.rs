//! In-place color-space changes for tagged float images.
//!
//! [`ColorConvert::change_color_space`] walks one edge of the color-space
//! graph:
//!
//! 1. a direct matrix from the [transfer table](crate::transfer_table)
//!    (RGB, XYZ, LMS, IPT in any direction), applied to every pixel;
//! 2. otherwise the Lab formula, for XYZ -> Lab and Lab -> XYZ;
//! 3. otherwise [`ColorError::UnsupportedTransform`].
//!
//! Whenever the result is linear RGB, every element is clipped to `[0, 1]`.
//! Requesting the space an image is already in is a no-op (apart from that
//! clip).
//!
//! 8-bit sRGB is not part of this graph; see [`crate::srgb`].
//!
//! # Example
//!
//! ```rust
//! use tonecam_color::ColorConvert;
//! use tonecam_core::{ColorSpace, Image};
//!
//! let mut img = Image::<f32>::new(ColorSpace::Rgb, 4, 4, 3);
//! img.fill(0.5);
//! img.change_color_space(ColorSpace::Xyz).unwrap();
//! img.change_color_space(ColorSpace::Lab).unwrap();
//! assert_eq!(img.color_space(), ColorSpace::Lab);
//! assert!(img.change_color_space(ColorSpace::Lms).is_err());
//! ```

use crate::error::{ColorError, ColorResult};
use crate::lab::{lab_from_xyz, xyz_from_lab};
use crate::matrices::transfer_matrix;
use tonecam_core::{ColorSpace, Error, Image};
use tonecam_math::Mat3;
use tracing::trace;

/// Color-space conversion for tagged images.
pub trait ColorConvert: Sized {
    /// Converts in place and retags.
    ///
    /// # Errors
    ///
    /// - [`ColorError::UnsupportedTransform`] when no edge connects the spaces
    /// - [`Error::ChannelMismatch`] for images with fewer than three channels
    fn change_color_space(&mut self, target: ColorSpace) -> ColorResult<()>;

    /// Deep copy expressed in `target`; a plain copy if already there.
    fn converted(&self, target: ColorSpace) -> ColorResult<Self>;
}

enum Edge {
    Linear(Mat3),
    Nonlinear(fn([f32; 3]) -> [f32; 3]),
}

fn edge(source: ColorSpace, target: ColorSpace) -> ColorResult<Edge> {
    match (source, target) {
        (ColorSpace::Xyz, ColorSpace::Lab) => Ok(Edge::Nonlinear(lab_from_xyz)),
        (ColorSpace::Lab, ColorSpace::Xyz) => Ok(Edge::Nonlinear(xyz_from_lab)),
        _ => transfer_matrix(target, source)
            .map(Edge::Linear)
            .ok_or_else(|| ColorError::unsupported(source, target)),
    }
}

impl ColorConvert for Image<f32> {
    fn change_color_space(&mut self, target: ColorSpace) -> ColorResult<()> {
        let source = self.color_space();
        if source != target {
            let edge = edge(source, target)?;
            let channels = self.channels();
            if channels < 3 {
                return Err(Error::channel_mismatch(3, channels).into());
            }
            trace!(
                from = %source,
                to = %target,
                width = self.width(),
                height = self.height(),
                "change_color_space"
            );
            let data = self.as_mut_slice();
            match edge {
                Edge::Linear(m) => m.transform_interleaved(data, channels),
                Edge::Nonlinear(f) => {
                    for px in data.chunks_exact_mut(channels) {
                        let out = f([px[0], px[1], px[2]]);
                        px[..3].copy_from_slice(&out);
                    }
                }
            }
            self.set_color_space(target);
        }
        if target == ColorSpace::Rgb {
            self.clip(0.0, 1.0);
        }
        Ok(())
    }

    fn converted(&self, target: ColorSpace) -> ColorResult<Self> {
        let mut copy = self.clone();
        copy.change_color_space(target)?;
        Ok(copy)
    }
}
