//! Separable resampling.
//!
//! Used to bring the low-resolution blurred white field back to image size.
//! The pipelines only depend on the [`Resampler`] trait, so a host can plug
//! in its own resize primitive. [`Filter`] is the stand-in used when none is
//! supplied: a two-pass (horizontal, then vertical) weighted resize with
//! precomputed per-axis contributions.
//!
//! # Filters
//!
//! - [`Filter::Nearest`] - box of width 1
//! - [`Filter::Bilinear`] - triangle
//! - [`Filter::Bicubic`] - Mitchell-Netravali, B = C = 1/3
//! - [`Filter::Lanczos3`] - windowed sinc
//!
//! # Example
//!
//! ```rust
//! use tonecam_ops::resize::{Filter, Resampler};
//!
//! let src = vec![0.5f32; 16 * 8];
//! let dst = Filter::Bilinear.resize(&src, 16, 8, 1, 32, 16).unwrap();
//! assert_eq!(dst.len(), 32 * 16);
//! ```

use crate::{OpsError, OpsResult};
use tonecam_core::{Channel, Element, PixelBuffer};
use tracing::trace;

/// A 2D resize primitive over interleaved `f32` data.
pub trait Resampler {
    /// Resamples `src` (`src_w x src_h`, `channels` interleaved) to
    /// `dst_w x dst_h`, keeping the channel count.
    fn resize(
        &self,
        src: &[f32],
        src_w: usize,
        src_h: usize,
        channels: usize,
        dst_w: usize,
        dst_h: usize,
    ) -> OpsResult<Vec<f32>>;
}

/// Resampling filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Filter {
    /// Nearest neighbor.
    Nearest,
    /// Linear interpolation.
    Bilinear,
    /// Mitchell-Netravali cubic.
    #[default]
    Bicubic,
    /// Lanczos, three lobes.
    Lanczos3,
}

impl Filter {
    /// Support radius at unit scale.
    #[inline]
    pub fn support(&self) -> f32 {
        match self {
            Filter::Nearest => 0.5,
            Filter::Bilinear => 1.0,
            Filter::Bicubic => 2.0,
            Filter::Lanczos3 => 3.0,
        }
    }

    /// Kernel value at distance `x`.
    #[inline]
    pub fn weight(&self, x: f32) -> f32 {
        let ax = x.abs();
        match self {
            Filter::Nearest => {
                if ax < 0.5 {
                    1.0
                } else {
                    0.0
                }
            }
            Filter::Bilinear => (1.0 - ax).max(0.0),
            Filter::Bicubic => mitchell(ax),
            Filter::Lanczos3 => lanczos(ax, 3.0),
        }
    }
}

/// Mitchell-Netravali with B = C = 1/3, coefficients expanded.
fn mitchell(ax: f32) -> f32 {
    if ax < 1.0 {
        (7.0 / 6.0 * ax - 2.0) * ax * ax + 8.0 / 9.0
    } else if ax < 2.0 {
        ((-7.0 / 18.0 * ax + 2.0) * ax - 10.0 / 3.0) * ax + 16.0 / 9.0
    } else {
        0.0
    }
}

/// Normalized sinc.
fn sinc(x: f32) -> f32 {
    if x.abs() < 1e-8 {
        return 1.0;
    }
    let t = std::f32::consts::PI * x;
    t.sin() / t
}

fn lanczos(ax: f32, lobes: f32) -> f32 {
    if ax < lobes {
        sinc(ax) * sinc(ax / lobes)
    } else {
        0.0
    }
}

/// Source taps of one output sample: first index plus normalized weights.
struct Taps {
    first: usize,
    weights: Vec<f32>,
}

/// Contribution table for one axis.
fn contributions(filter: Filter, src_len: usize, dst_len: usize) -> Vec<Taps> {
    let scale = src_len as f32 / dst_len as f32;
    let stretch = scale.max(1.0);
    let support = filter.support() * stretch;
    (0..dst_len)
        .map(|x| {
            let center = (x as f32 + 0.5) * scale - 0.5;
            let first = ((center - support).floor() as isize).max(0) as usize;
            let last = ((center + support).ceil().max(0.0) as usize).min(src_len - 1);
            let mut weights: Vec<f32> = (first..=last)
                .map(|s| filter.weight((s as f32 - center) / stretch))
                .collect();
            let sum: f32 = weights.iter().sum();
            if sum > 0.0 {
                weights.iter_mut().for_each(|w| *w /= sum);
            } else {
                // Degenerate window (nearest at an exact half): take the closest tap.
                let nearest = (center.round().max(0.0) as usize).clamp(first, last);
                weights.iter_mut().for_each(|w| *w = 0.0);
                weights[nearest - first] = 1.0;
            }
            Taps { first, weights }
        })
        .collect()
}

impl Resampler for Filter {
    fn resize(
        &self,
        src: &[f32],
        src_w: usize,
        src_h: usize,
        channels: usize,
        dst_w: usize,
        dst_h: usize,
    ) -> OpsResult<Vec<f32>> {
        let expected = src_w * src_h * channels;
        if src.len() != expected {
            return Err(OpsError::InvalidDimensions(format!(
                "expected {} elements, got {}",
                expected,
                src.len()
            )));
        }
        if src_w == 0 || src_h == 0 || dst_w == 0 || dst_h == 0 {
            return Err(OpsError::InvalidDimensions(format!(
                "cannot resize {src_w}x{src_h} to {dst_w}x{dst_h}"
            )));
        }
        trace!(src_w, src_h, dst_w, dst_h, filter = ?self, "resize");
        if (src_w, src_h) == (dst_w, dst_h) {
            return Ok(src.to_vec());
        }

        // Horizontal pass: src_h rows of dst_w.
        let cols = contributions(*self, src_w, dst_w);
        let mut temp = vec![0.0f32; dst_w * src_h * channels];
        for (src_row, tmp_row) in src
            .chunks_exact(src_w * channels)
            .zip(temp.chunks_exact_mut(dst_w * channels))
        {
            for (taps, out) in cols.iter().zip(tmp_row.chunks_exact_mut(channels)) {
                for (k, &w) in taps.weights.iter().enumerate() {
                    let px = &src_row[(taps.first + k) * channels..][..channels];
                    for (o, &v) in out.iter_mut().zip(px) {
                        *o += v * w;
                    }
                }
            }
        }

        // Vertical pass.
        let rows = contributions(*self, src_h, dst_h);
        let stride = dst_w * channels;
        let mut dst = vec![0.0f32; dst_w * dst_h * channels];
        for (taps, out_row) in rows.iter().zip(dst.chunks_exact_mut(stride)) {
            for (k, &w) in taps.weights.iter().enumerate() {
                let tmp_row = &temp[(taps.first + k) * stride..][..stride];
                for (o, &v) in out_row.iter_mut().zip(tmp_row) {
                    *o += v * w;
                }
            }
        }
        Ok(dst)
    }
}

/// Resizes any buffer through `resampler`, converting elements via `f64`.
pub fn resize_buffer<T: Element>(
    src: &PixelBuffer<T>,
    dst_w: usize,
    dst_h: usize,
    resampler: &impl Resampler,
) -> OpsResult<PixelBuffer<T>> {
    let data: Vec<f32> = src.iter().map(|&v| v.to_f64() as f32).collect();
    let out = resampler.resize(&data, src.width(), src.height(), src.channels(), dst_w, dst_h)?;
    let out = out.into_iter().map(|v| T::from_f64(v as f64)).collect();
    Ok(PixelBuffer::from_vec(dst_w, dst_h, src.channels(), out)?)
}

/// Resizes a float channel.
pub fn resize_channel(
    src: &Channel<f32>,
    dst_w: usize,
    dst_h: usize,
    resampler: &impl Resampler,
) -> OpsResult<Channel<f32>> {
    let out = resampler.resize(src.as_slice(), src.width(), src.height(), 1, dst_w, dst_h)?;
    Ok(Channel::from_vec(dst_w, dst_h, out)?)
}
