//! Color-tagged images.
//!
//! An [`Image`] is a [`PixelBuffer`] plus the [`ColorSpace`] its values are
//! expressed in. It derefs to the buffer, so every buffer operation
//! (arithmetic, fill, clip, expressions) is available directly.
//!
//! Conversions between spaces live in `tonecam-color`; this module only
//! carries the tag and checks it.
//!
//! # Example
//!
//! ```rust
//! use tonecam_core::{ColorSpace, Image};
//!
//! let mut img = Image::<f32>::new(ColorSpace::Rgb, 8, 4, 3);
//! img.fill(0.25);
//! assert!(img.require(ColorSpace::Rgb).is_ok());
//! assert!(img.require(ColorSpace::Lab).is_err());
//! ```

use crate::buffer::{PixelBuffer, ReleaseFn};
use crate::colorspace::ColorSpace;
use crate::element::Element;
use crate::error::{Error, Result};
use std::ops::{Deref, DerefMut};

/// Pixel buffer tagged with a color space.
#[derive(Debug, Clone, PartialEq)]
pub struct Image<T: Element> {
    buffer: PixelBuffer<T>,
    color_space: ColorSpace,
}

impl<T: Element> Image<T> {
    /// Creates a zero-filled owned image.
    pub fn new(color_space: ColorSpace, width: usize, height: usize, channels: usize) -> Self {
        Self {
            buffer: PixelBuffer::new(width, height, channels),
            color_space,
        }
    }

    /// Tags an existing buffer.
    pub fn from_buffer(color_space: ColorSpace, buffer: PixelBuffer<T>) -> Self {
        Self { buffer, color_space }
    }

    /// Adopts interleaved data without copying.
    pub fn from_vec(
        color_space: ColorSpace,
        width: usize,
        height: usize,
        channels: usize,
        data: Vec<T>,
    ) -> Result<Self> {
        Ok(Self::from_buffer(
            color_space,
            PixelBuffer::from_vec(width, height, channels, data)?,
        ))
    }

    /// Wraps codec- or host-owned memory.
    ///
    /// # Safety
    ///
    /// Same contract as [`PixelBuffer::from_raw_parts`].
    pub unsafe fn from_raw_parts(
        color_space: ColorSpace,
        ptr: *mut T,
        width: usize,
        height: usize,
        channels: usize,
        release: Option<ReleaseFn<T>>,
    ) -> Result<Self> {
        // SAFETY: forwarded to the caller.
        let buffer = unsafe { PixelBuffer::from_raw_parts(ptr, width, height, channels, release)? };
        Ok(Self::from_buffer(color_space, buffer))
    }

    /// Current color-space tag.
    #[inline]
    pub fn color_space(&self) -> ColorSpace {
        self.color_space
    }

    /// Retags the image without touching the data.
    ///
    /// Intended for converters that have just rewritten the values.
    #[inline]
    pub fn set_color_space(&mut self, color_space: ColorSpace) {
        self.color_space = color_space;
    }

    /// Fails with [`Error::InvalidColorSpace`] unless tagged `expected`.
    pub fn require(&self, expected: ColorSpace) -> Result<()> {
        if self.color_space == expected {
            Ok(())
        } else {
            Err(Error::invalid_color_space(expected, self.color_space))
        }
    }

    /// Underlying buffer.
    #[inline]
    pub fn buffer(&self) -> &PixelBuffer<T> {
        &self.buffer
    }

    /// Underlying buffer, mutable.
    #[inline]
    pub fn buffer_mut(&mut self) -> &mut PixelBuffer<T> {
        &mut self.buffer
    }

    /// Splits into buffer and tag.
    pub fn into_parts(self) -> (PixelBuffer<T>, ColorSpace) {
        (self.buffer, self.color_space)
    }

    /// Moves the contents out, leaving an empty image with the same tag.
    pub fn take(&mut self) -> Self {
        Self {
            buffer: self.buffer.take(),
            color_space: self.color_space,
        }
    }
}

impl<T: Element> Default for Image<T> {
    fn default() -> Self {
        Self {
            buffer: PixelBuffer::default(),
            color_space: ColorSpace::Rgb,
        }
    }
}

impl<T: Element> Deref for Image<T> {
    type Target = PixelBuffer<T>;

    #[inline]
    fn deref(&self) -> &PixelBuffer<T> {
        &self.buffer
    }
}

impl<T: Element> DerefMut for Image<T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut PixelBuffer<T> {
        &mut self.buffer
    }
}
