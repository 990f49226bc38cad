//! Single-channel fields and channel shuffling.
//!
//! A [`Channel`] is a one-channel [`PixelBuffer`]: a luminance plane, an
//! adaptation field, a blur input. The free functions move data between
//! interleaved buffers and channels.
//!
//! # Operations
//!
//! - [`copy_channel`] - extract one interleaved channel
//! - [`load_from_channel`] - write a channel back into one slot
//! - [`load_from_channels`] - interleave a full set of channels
//! - [`crop`] - strip a border from every side
//! - [`Channel::rescale`] - linear remap with clamping

use crate::buffer::{PixelBuffer, ReleaseFn};
use crate::element::{Element, Numeric};
use crate::error::{Error, Result};
use std::ops::{Deref, DerefMut};
use tracing::trace;

/// Single-channel pixel buffer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Channel<T: Element> {
    buffer: PixelBuffer<T>,
}

impl<T: Element> Channel<T> {
    /// Creates a zero-filled channel.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            buffer: PixelBuffer::new(width, height, 1),
        }
    }

    /// Adopts `width * height` values.
    pub fn from_vec(width: usize, height: usize, data: Vec<T>) -> Result<Self> {
        Ok(Self {
            buffer: PixelBuffer::from_vec(width, height, 1, data)?,
        })
    }

    /// Wraps externally owned memory.
    ///
    /// # Safety
    ///
    /// Same contract as [`PixelBuffer::from_raw_parts`] with one channel.
    pub unsafe fn from_raw_parts(
        ptr: *mut T,
        width: usize,
        height: usize,
        release: Option<ReleaseFn<T>>,
    ) -> Result<Self> {
        // SAFETY: forwarded to the caller.
        let buffer = unsafe { PixelBuffer::from_raw_parts(ptr, width, height, 1, release)? };
        Ok(Self { buffer })
    }

    /// Underlying buffer.
    pub fn into_buffer(self) -> PixelBuffer<T> {
        self.buffer
    }

    /// Moves the contents out, leaving an empty channel.
    pub fn take(&mut self) -> Self {
        Self {
            buffer: self.buffer.take(),
        }
    }
}

impl<T: Numeric> Channel<T> {
    /// Maps `[in_min, in_max]` linearly onto `[out_min, out_max]`.
    ///
    /// Values at or below `in_min` become `out_min`, values at or above
    /// `in_max` become `out_max`.
    pub fn rescale(&mut self, in_min: T, in_max: T, out_min: T, out_max: T) {
        trace!(len = self.len(), "rescale");
        self.map_in_place(|v| {
            if v <= in_min {
                out_min
            } else if v >= in_max {
                out_max
            } else {
                (v - in_min) / (in_max - in_min) * (out_max - out_min) + out_min
            }
        });
    }
}

impl<T: Element> TryFrom<PixelBuffer<T>> for Channel<T> {
    type Error = Error;

    fn try_from(buffer: PixelBuffer<T>) -> Result<Self> {
        if buffer.channels() != 1 && !buffer.is_empty() {
            return Err(Error::channel_mismatch(1, buffer.channels()));
        }
        Ok(Self { buffer })
    }
}

impl<T: Element> Deref for Channel<T> {
    type Target = PixelBuffer<T>;

    #[inline]
    fn deref(&self) -> &PixelBuffer<T> {
        &self.buffer
    }
}

impl<T: Element> DerefMut for Channel<T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut PixelBuffer<T> {
        &mut self.buffer
    }
}

/// Copies interleaved channel `index` of `src` into a new channel.
///
/// # Errors
///
/// [`Error::ChannelOutOfRange`] if `index >= src.channels()`.
pub fn copy_channel<T: Element>(src: &PixelBuffer<T>, index: usize) -> Result<Channel<T>> {
    let channels = src.channels();
    if index >= channels {
        return Err(Error::channel_out_of_range(index, channels));
    }
    let data = src
        .as_slice()
        .iter()
        .skip(index)
        .step_by(channels)
        .copied()
        .collect();
    Channel::from_vec(src.width(), src.height(), data)
}

/// Writes `src` into interleaved channel `index` of `dst`.
///
/// # Errors
///
/// - [`Error::ChannelOutOfRange`] if `index >= dst.channels()`
/// - [`Error::DimensionMismatch`] if width or height differ
pub fn load_from_channel<T: Element>(
    dst: &mut PixelBuffer<T>,
    src: &Channel<T>,
    index: usize,
) -> Result<()> {
    let channels = dst.channels();
    if index >= channels {
        return Err(Error::channel_out_of_range(index, channels));
    }
    dst.check_extent(src)?;
    for (out, &v) in dst
        .as_mut_slice()
        .iter_mut()
        .skip(index)
        .step_by(channels)
        .zip(src.as_slice())
    {
        *out = v;
    }
    Ok(())
}

/// Interleaves `channels` into `dst`, first channel first.
///
/// # Errors
///
/// - [`Error::ChannelMismatch`] if `channels.len() != dst.channels()`
/// - [`Error::DimensionMismatch`] if any channel's extent differs from `dst`
pub fn load_from_channels<T: Element>(dst: &mut PixelBuffer<T>, channels: &[Channel<T>]) -> Result<()> {
    if channels.len() != dst.channels() {
        return Err(Error::channel_mismatch(dst.channels(), channels.len()));
    }
    for ch in channels {
        dst.check_extent(ch)?;
    }
    let stride = channels.len();
    if stride == 0 {
        return Ok(());
    }
    for (i, pixel) in dst.as_mut_slice().chunks_exact_mut(stride).enumerate() {
        for (out, ch) in pixel.iter_mut().zip(channels) {
            *out = ch[i];
        }
    }
    Ok(())
}

/// Removes `width_field` columns on the left and right and `height_field`
/// rows on the top and bottom.
///
/// # Errors
///
/// [`Error::InvalidDimensions`] if the border consumes the whole channel.
pub fn crop<T: Element>(src: &Channel<T>, width_field: usize, height_field: usize) -> Result<Channel<T>> {
    let (w, h) = src.dimensions();
    if 2 * width_field > w || 2 * height_field > h {
        return Err(Error::invalid_dimensions(
            w,
            h,
            format!("cannot crop {width_field}x{height_field} from every side"),
        ));
    }
    let dst_w = w - 2 * width_field;
    let dst_h = h - 2 * height_field;
    let data = src.as_slice();
    let mut out = Vec::with_capacity(dst_w * dst_h);
    for y in height_field..height_field + dst_h {
        let start = y * w + width_field;
        out.extend_from_slice(&data[start..start + dst_w]);
    }
    Channel::from_vec(dst_w, dst_h, out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn rgb_ramp() -> PixelBuffer<f32> {
        let data = (0..12).map(|v| v as f32).collect();
        PixelBuffer::from_vec(2, 2, 3, data).unwrap()
    }

    #[test]
    fn test_copy_channel() {
        let src = rgb_ramp();
        let g = copy_channel(&src, 1).unwrap();
        assert_eq!(g.as_slice(), &[1.0, 4.0, 7.0, 10.0]);
        assert_eq!(g.dimensions(), (2, 2));
        assert!(matches!(
            copy_channel(&src, 3),
            Err(Error::ChannelOutOfRange { index: 3, channels: 3 })
        ));
    }

    #[test]
    fn test_load_from_channel() {
        let mut dst = rgb_ramp();
        let ch = Channel::from_vec(2, 2, vec![-1.0f32; 4]).unwrap();
        load_from_channel(&mut dst, &ch, 2).unwrap();
        assert_eq!(dst.as_slice()[2], -1.0);
        assert_eq!(dst.as_slice()[11], -1.0);
        assert_eq!(dst.as_slice()[10], 10.0);

        let wrong = Channel::<f32>::new(4, 1);
        assert!(load_from_channel(&mut dst, &wrong, 0).unwrap_err().is_dimension_error());
    }

    #[test]
    fn test_load_from_channels_roundtrip() {
        let src = rgb_ramp();
        let split: Vec<_> = (0..3).map(|i| copy_channel(&src, i).unwrap()).collect();
        let mut dst = PixelBuffer::<f32>::new(2, 2, 3);
        load_from_channels(&mut dst, &split).unwrap();
        assert_eq!(dst, src);

        assert!(matches!(
            load_from_channels(&mut dst, &split[..2]),
            Err(Error::ChannelMismatch { expected: 3, got: 2 })
        ));
    }

    #[test]
    fn test_crop() {
        let data = (0..20).collect();
        let src = Channel::from_vec(5, 4, data).unwrap();
        let c = crop(&src, 1, 1).unwrap();
        assert_eq!(c.dimensions(), (3, 2));
        assert_eq!(c.as_slice(), &[6, 7, 8, 11, 12, 13]);
        assert!(crop(&src, 3, 0).is_err());
    }

    #[test]
    fn test_rescale_clamps_ends() {
        let mut ch = Channel::from_vec(5, 1, vec![-1.0f32, 0.0, 0.5, 1.0, 2.0]).unwrap();
        ch.rescale(0.0, 1.0, 0.0, 100.0);
        let expected = [0.0, 0.0, 50.0, 100.0, 100.0];
        for (a, b) in ch.iter().zip(expected) {
            assert_relative_eq!(*a, b);
        }
    }

    #[test]
    fn test_try_from_buffer() {
        assert!(Channel::try_from(PixelBuffer::<f32>::new(2, 2, 1)).is_ok());
        assert!(Channel::try_from(PixelBuffer::<f32>::new(2, 2, 3)).is_err());
    }
}
