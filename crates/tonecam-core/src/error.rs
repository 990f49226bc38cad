//! Error types for tonecam-core operations.
//!
//! One error enum covers every failure that buffer, expression and
//! tagged-image operations can report. Higher crates wrap it with
//! `#[from]` so a pipeline call surfaces a single error chain.
//!
//! # Usage
//!
//! ```rust
//! use tonecam_core::{Error, Result};
//!
//! fn check_len(expected: usize, got: usize) -> Result<()> {
//!     if expected != got {
//!         return Err(Error::size_mismatch(expected, got));
//!     }
//!     Ok(())
//! }
//! assert!(check_len(3, 4).unwrap_err().is_dimension_error());
//! ```
//!
//! # Dependencies
//!
//! - [`thiserror`] - For derive macro error implementation
//!
//! # Used By
//!
//! - [`crate::buffer::PixelBuffer`] - expression assignment, equality helpers
//! - [`crate::image`] - color-space tags and channel loading
//! - `tonecam-color`, `tonecam-ops` - wrapped in their own error enums

use crate::colorspace::ColorSpace;
use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during buffer and tagged-image operations.
///
/// # Categories
///
/// - **Dimension errors**: [`DimensionMismatch`](Error::DimensionMismatch),
///   [`SizeMismatch`](Error::SizeMismatch), [`InvalidDimensions`](Error::InvalidDimensions)
/// - **Channel errors**: [`ChannelMismatch`](Error::ChannelMismatch),
///   [`ChannelOutOfRange`](Error::ChannelOutOfRange)
/// - **Color errors**: [`InvalidColorSpace`](Error::InvalidColorSpace)
/// - **I/O errors**: [`Io`](Error::Io)
#[derive(Debug, Error)]
pub enum Error {
    /// Two operands were required to share width and height but do not.
    #[error("dimension mismatch: {a_width}x{a_height} vs {b_width}x{b_height}")]
    DimensionMismatch {
        /// First operand width
        a_width: usize,
        /// First operand height
        a_height: usize,
        /// Second operand width
        b_width: usize,
        /// Second operand height
        b_height: usize,
    },

    /// Element counts differ.
    ///
    /// Returned when assigning an expression into a destination of another
    /// size, or when an expression combines two operands of different sizes.
    #[error("size mismatch: expected {expected} elements, got {got}")]
    SizeMismatch {
        /// Element count required by the operation
        expected: usize,
        /// Element count actually supplied
        got: usize,
    },

    /// The operand carries a color-space tag the operation does not accept.
    #[error("invalid color space: expected {expected}, got {got}")]
    InvalidColorSpace {
        /// Required color space
        expected: ColorSpace,
        /// Color space the operand is tagged with
        got: ColorSpace,
    },

    /// Channel count mismatch between source and destination.
    #[error("channel mismatch: expected {expected}, got {got}")]
    ChannelMismatch {
        /// Expected channel count
        expected: usize,
        /// Actual channel count
        got: usize,
    },

    /// A channel index past the buffer's channel count.
    #[error("channel {index} out of range for {channels}-channel buffer")]
    ChannelOutOfRange {
        /// Requested channel
        index: usize,
        /// Channels available
        channels: usize,
    },

    /// Invalid buffer dimensions.
    ///
    /// Returned when a supplied slice cannot hold `width * height * channels`
    /// elements, or when the element count overflows.
    #[error("invalid dimensions: {width}x{height} ({reason})")]
    InvalidDimensions {
        /// Requested width
        width: usize,
        /// Requested height
        height: usize,
        /// Reason why dimensions are invalid
        reason: String,
    },

    /// I/O error raised by a collaborator (codec, host application).
    ///
    /// Never produced by tonecam itself.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with custom message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Creates an [`Error::DimensionMismatch`] error.
    #[inline]
    pub fn dimension_mismatch(a: (usize, usize), b: (usize, usize)) -> Self {
        Self::DimensionMismatch {
            a_width: a.0,
            a_height: a.1,
            b_width: b.0,
            b_height: b.1,
        }
    }

    /// Creates an [`Error::SizeMismatch`] error.
    #[inline]
    pub fn size_mismatch(expected: usize, got: usize) -> Self {
        Self::SizeMismatch { expected, got }
    }

    /// Creates an [`Error::InvalidColorSpace`] error.
    #[inline]
    pub fn invalid_color_space(expected: ColorSpace, got: ColorSpace) -> Self {
        Self::InvalidColorSpace { expected, got }
    }

    /// Creates an [`Error::ChannelMismatch`] error.
    #[inline]
    pub fn channel_mismatch(expected: usize, got: usize) -> Self {
        Self::ChannelMismatch { expected, got }
    }

    /// Creates an [`Error::ChannelOutOfRange`] error.
    #[inline]
    pub fn channel_out_of_range(index: usize, channels: usize) -> Self {
        Self::ChannelOutOfRange { index, channels }
    }

    /// Creates an [`Error::InvalidDimensions`] error.
    #[inline]
    pub fn invalid_dimensions(width: usize, height: usize, reason: impl Into<String>) -> Self {
        Self::InvalidDimensions {
            width,
            height,
            reason: reason.into(),
        }
    }

    /// Creates an [`Error::Other`] error.
    #[inline]
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Returns `true` for dimension, size and channel-count errors.
    #[inline]
    pub fn is_dimension_error(&self) -> bool {
        matches!(
            self,
            Self::DimensionMismatch { .. }
                | Self::SizeMismatch { .. }
                | Self::InvalidDimensions { .. }
                | Self::ChannelMismatch { .. }
        )
    }

    /// Returns `true` if the operand had the wrong color-space tag.
    #[inline]
    pub fn is_color_space_error(&self) -> bool {
        matches!(self, Self::InvalidColorSpace { .. })
    }

    /// Returns `true` if this is an I/O error.
    #[inline]
    pub fn is_io_error(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_mismatch() {
        let err = Error::dimension_mismatch((600, 400), (300, 200));
        let msg = err.to_string();
        assert!(msg.contains("600x400"));
        assert!(msg.contains("300x200"));
        assert!(err.is_dimension_error());
    }

    #[test]
    fn test_size_mismatch() {
        let err = Error::size_mismatch(12, 9);
        assert!(err.to_string().contains("12"));
        assert!(err.is_dimension_error());
        assert!(!err.is_color_space_error());
    }

    #[test]
    fn test_invalid_color_space() {
        let err = Error::invalid_color_space(ColorSpace::Lms, ColorSpace::Xyz);
        let msg = err.to_string();
        assert!(msg.contains("LMS"));
        assert!(msg.contains("XYZ"));
        assert!(err.is_color_space_error());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.is_io_error());
    }
}
