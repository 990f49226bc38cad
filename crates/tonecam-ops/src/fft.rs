//! Frequency-domain blur.
//!
//! The surround of local adaptation is a very wide Gaussian, so it is applied
//! as a product in the frequency domain instead of a direct convolution.
//!
//! # Pipeline
//!
//! ```text
//! field -> pad_reflect(W/2, H/2) -> forward --+
//!                                              * kernel spectrum -> inverse / N -> crop
//! distance_map -> exp(-(d*s/max)^2) -> forward, real part >= 0, / DC
//! ```
//!
//! [`RealFft2d`] is a thin real-to-complex 2D transform over `rustfft`:
//! row transforms, then column transforms over the non-redundant half
//! spectrum (`height x (width/2 + 1)` bins). The inverse is unnormalized.
//!
//! # Example
//!
//! ```rust
//! use tonecam_core::Channel;
//! use tonecam_ops::fft::gaussian_blur;
//!
//! let mut flat = Channel::<f32>::new(12, 9);
//! flat.fill(0.5);
//! let blurred = gaussian_blur(&flat, 2.0).unwrap();
//! assert!(blurred.iter().all(|v| (v - 0.5).abs() < 1e-4));
//! ```

use crate::{OpsError, OpsResult};
use rustfft::num_complex::{Complex, Complex32};
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;
use tonecam_core::{crop, Channel, Error};
use tracing::{trace, warn};

/// Default Gaussian scale of [`gaussian_blur`].
pub const DEFAULT_BLUR_SCALE: f32 = 2.0;

/// Default target of [`downscale`].
pub const DEFAULT_DOWNSCALE_TARGET: usize = 128;

/// Planned real 2D FFT of a fixed size.
pub struct RealFft2d {
    width: usize,
    height: usize,
    spectrum_width: usize,
    row_forward: Arc<dyn Fft<f32>>,
    row_inverse: Arc<dyn Fft<f32>>,
    col_forward: Arc<dyn Fft<f32>>,
    col_inverse: Arc<dyn Fft<f32>>,
    scratch_len: usize,
}

impl RealFft2d {
    /// Plans transforms for a `width x height` real field.
    ///
    /// # Errors
    ///
    /// [`OpsError::InvalidDimensions`] for a zero-sized field.
    pub fn new(width: usize, height: usize) -> OpsResult<Self> {
        if width == 0 || height == 0 {
            return Err(OpsError::InvalidDimensions(format!(
                "cannot transform a {width}x{height} field"
            )));
        }
        let mut planner = FftPlanner::<f32>::new();
        let row_forward = planner.plan_fft_forward(width);
        let row_inverse = planner.plan_fft_inverse(width);
        let col_forward = planner.plan_fft_forward(height);
        let col_inverse = planner.plan_fft_inverse(height);
        let scratch_len = [&row_forward, &row_inverse, &col_forward, &col_inverse]
            .iter()
            .map(|f| f.get_inplace_scratch_len())
            .max()
            .unwrap_or(0);
        Ok(Self {
            width,
            height,
            spectrum_width: width / 2 + 1,
            row_forward,
            row_inverse,
            col_forward,
            col_inverse,
            scratch_len,
        })
    }

    /// Field width.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Field height.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Bins per spectrum row, `width / 2 + 1`.
    pub fn spectrum_width(&self) -> usize {
        self.spectrum_width
    }

    /// Number of complex bins, `height * (width / 2 + 1)`.
    pub fn spectrum_len(&self) -> usize {
        self.height * self.spectrum_width
    }

    /// Zeroed spectrum buffer of the right size.
    pub fn make_spectrum(&self) -> Vec<Complex32> {
        vec![Complex::new(0.0, 0.0); self.spectrum_len()]
    }

    /// Forward transform of `input` into `output`.
    ///
    /// # Errors
    ///
    /// [`Error::SizeMismatch`] if either buffer has the wrong length.
    pub fn forward(&self, input: &[f32], output: &mut [Complex32]) -> OpsResult<()> {
        let (w, h, wc) = (self.width, self.height, self.spectrum_width);
        check_len(w * h, input.len())?;
        check_len(h * wc, output.len())?;

        let mut scratch = vec![Complex::new(0.0, 0.0); self.scratch_len];
        let mut row = vec![Complex::new(0.0, 0.0); w];
        for (src, dst) in input.chunks_exact(w).zip(output.chunks_exact_mut(wc)) {
            for (c, &v) in row.iter_mut().zip(src) {
                *c = Complex::new(v, 0.0);
            }
            self.row_forward.process_with_scratch(&mut row, &mut scratch);
            dst.copy_from_slice(&row[..wc]);
        }
        self.columns(output, &*self.col_forward, &mut scratch);
        Ok(())
    }

    /// Inverse transform of `spectrum` into `output`, scaled by `width * height`.
    ///
    /// `spectrum` is used as a work area and holds column-inverted data
    /// afterwards.
    ///
    /// # Errors
    ///
    /// [`Error::SizeMismatch`] if either buffer has the wrong length.
    pub fn inverse(&self, spectrum: &mut [Complex32], output: &mut [f32]) -> OpsResult<()> {
        let (w, h, wc) = (self.width, self.height, self.spectrum_width);
        check_len(h * wc, spectrum.len())?;
        check_len(w * h, output.len())?;

        let mut scratch = vec![Complex::new(0.0, 0.0); self.scratch_len];
        self.columns(spectrum, &*self.col_inverse, &mut scratch);

        let mut row = vec![Complex::new(0.0, 0.0); w];
        for (half, dst) in spectrum.chunks_exact(wc).zip(output.chunks_exact_mut(w)) {
            row[..wc].copy_from_slice(half);
            // A real row has a conjugate-symmetric spectrum.
            for k in wc..w {
                row[k] = half[w - k].conj();
            }
            self.row_inverse.process_with_scratch(&mut row, &mut scratch);
            for (out, c) in dst.iter_mut().zip(&row) {
                *out = c.re;
            }
        }
        Ok(())
    }

    /// Transforms every column of a `height x spectrum_width` buffer in place.
    fn columns(&self, data: &mut [Complex32], fft: &dyn Fft<f32>, scratch: &mut [Complex32]) {
        let (h, wc) = (self.height, self.spectrum_width);
        let mut col = vec![Complex::new(0.0, 0.0); h];
        for x in 0..wc {
            for (y, c) in col.iter_mut().enumerate() {
                *c = data[y * wc + x];
            }
            fft.process_with_scratch(&mut col, scratch);
            for (y, c) in col.iter().enumerate() {
                data[y * wc + x] = *c;
            }
        }
    }
}

fn check_len(expected: usize, got: usize) -> OpsResult<()> {
    if expected != got {
        return Err(Error::size_mismatch(expected, got).into());
    }
    Ok(())
}

/// Zeroes every imaginary part.
pub fn reduce_imaginary(spectrum: &mut [Complex32]) {
    for c in spectrum {
        c.im = 0.0;
    }
}

/// Clamps negative real parts to zero.
pub fn clip_negative_real(spectrum: &mut [Complex32]) {
    for c in spectrum {
        if c.re < 0.0 {
            c.re = 0.0;
        }
    }
}

/// Divides every real part by the real part of the DC bin.
///
/// Leaves the spectrum untouched (and logs a warning) if the DC bin is zero.
pub fn normalize_by_dc(spectrum: &mut [Complex32]) {
    let Some(dc) = spectrum.first().map(|c| c.re) else {
        return;
    };
    if dc == 0.0 {
        warn!("kernel spectrum has a zero DC bin, skipping normalization");
        return;
    }
    for c in spectrum {
        c.re /= dc;
    }
}

/// Multiplies each bin of `spectrum` by the real part of the matching `kernel` bin.
///
/// # Errors
///
/// [`Error::SizeMismatch`] if the lengths differ.
pub fn multiply_by_real(spectrum: &mut [Complex32], kernel: &[Complex32]) -> OpsResult<()> {
    check_len(spectrum.len(), kernel.len())?;
    for (c, k) in spectrum.iter_mut().zip(kernel) {
        *c *= k.re;
    }
    Ok(())
}

/// Mirrors index `i` into `0..n` without repeating the edge sample.
#[inline]
fn reflect(i: isize, n: usize) -> usize {
    let n = n as isize;
    let r = if i < 0 {
        -i
    } else if i >= n {
        2 * (n - 1) - i
    } else {
        i
    };
    r as usize
}

/// Extends `src` by `add_width` columns on each side and `add_height` rows on
/// top and bottom, mirroring interior samples.
///
/// # Errors
///
/// [`OpsError::InvalidDimensions`] if a border is as wide as the field itself.
pub fn pad_reflect(src: &Channel<f32>, add_width: usize, add_height: usize) -> OpsResult<Channel<f32>> {
    let (w, h) = src.dimensions();
    if (add_width > 0 && add_width >= w) || (add_height > 0 && add_height >= h) {
        return Err(OpsError::InvalidDimensions(format!(
            "cannot reflect-pad {w}x{h} by {add_width}x{add_height}"
        )));
    }
    trace!(width = w, height = h, add_width, add_height, "pad_reflect");
    let pw = w + 2 * add_width;
    let ph = h + 2 * add_height;
    let data = src.as_slice();
    let mut out = Vec::with_capacity(pw * ph);
    for y in 0..ph {
        let sy = reflect(y as isize - add_height as isize, h);
        let row = &data[sy * w..(sy + 1) * w];
        out.extend((0..pw).map(|x| row[reflect(x as isize - add_width as isize, w)]));
    }
    Ok(Channel::from_vec(pw, ph, out)?)
}

/// Toroidal distance of every sample from the origin:
/// `sqrt(min(x, W - x)^2 + min(y, H - y)^2)`.
pub fn distance_map(width: usize, height: usize) -> Channel<f32> {
    let mut map = Channel::new(width, height);
    if width == 0 {
        return map;
    }
    for (y, row) in map.as_mut_slice().chunks_exact_mut(width).enumerate() {
        let dy = y.min(height - y) as f32;
        for (x, v) in row.iter_mut().enumerate() {
            let dx = x.min(width - x) as f32;
            *v = (dx * dx + dy * dy).sqrt();
        }
    }
    map
}

/// Wide Gaussian blur of a single-channel field.
///
/// The kernel is `exp(-(d * scale / max(W, H))^2)` over the padded field,
/// normalized to unit gain, so a constant field comes back unchanged
/// (bit for bit).
///
/// # Errors
///
/// [`OpsError::InvalidDimensions`] for an empty channel,
/// [`OpsError::InvalidParameter`] for a non-positive scale.
pub fn gaussian_blur(src: &Channel<f32>, scale: f32) -> OpsResult<Channel<f32>> {
    let (w, h) = src.dimensions();
    if w == 0 || h == 0 {
        return Err(OpsError::InvalidDimensions("cannot blur an empty field".into()));
    }
    if !(scale.is_finite() && scale > 0.0) {
        return Err(OpsError::InvalidParameter(format!("blur scale {scale}")));
    }
    trace!(width = w, height = h, scale, "gaussian_blur");

    let (add_w, add_h) = (w / 2, h / 2);
    let mut padded = pad_reflect(src, add_w, add_h)?;
    let (pw, ph) = padded.dimensions();
    // The kernel has unit gain, so blurring relative to one sample changes
    // nothing except that a flat field transforms to exact zeros.
    let offset = src[0];
    *padded -= offset;
    let max_dim = w.max(h) as f32;

    let mut kernel = distance_map(pw, ph);
    kernel.map_in_place(|d| {
        let t = d * scale / max_dim;
        (-(t * t)).exp()
    });

    let fft = RealFft2d::new(pw, ph)?;
    let mut kernel_spectrum = fft.make_spectrum();
    fft.forward(kernel.as_slice(), &mut kernel_spectrum)?;
    reduce_imaginary(&mut kernel_spectrum);
    clip_negative_real(&mut kernel_spectrum);
    normalize_by_dc(&mut kernel_spectrum);

    let mut spectrum = fft.make_spectrum();
    fft.forward(padded.as_slice(), &mut spectrum)?;
    multiply_by_real(&mut spectrum, &kernel_spectrum)?;

    let mut blurred = Channel::new(pw, ph);
    fft.inverse(&mut spectrum, blurred.as_mut_slice())?;
    *blurred /= (pw * ph) as f32;
    *blurred += offset;
    Ok(crop(&blurred, add_w, add_h)?)
}

/// Block-averages `src` so its smaller side is about `target`.
///
/// The stride is `min(W, H) / target`; a field already at or below `target`
/// is copied. Columns and rows left over after the last full block are
/// dropped.
///
/// # Errors
///
/// [`OpsError::InvalidParameter`] for a zero target.
pub fn downscale(src: &Channel<f32>, target: usize) -> OpsResult<Channel<f32>> {
    if target == 0 {
        return Err(OpsError::InvalidParameter("downscale target must be > 0".into()));
    }
    let (w, h) = src.dimensions();
    let min_dim = w.min(h);
    let step = if min_dim > target { min_dim / target } else { 1 };
    trace!(width = w, height = h, step, "downscale");
    if step == 1 {
        return Ok(src.clone());
    }

    let (dw, dh) = (w / step, h / step);
    let data = src.as_slice();
    let mut out = Channel::new(dw, dh);
    let norm = step as f32;
    for (oy, row) in out.as_mut_slice().chunks_exact_mut(dw).enumerate() {
        for (ox, v) in row.iter_mut().enumerate() {
            let mut sum = 0.0f32;
            for y in oy * step..(oy + 1) * step {
                let line = &data[y * w + ox * step..y * w + (ox + 1) * step];
                sum += line.iter().sum::<f32>();
            }
            *v = sum / norm / norm;
        }
    }
    Ok(out)
}
