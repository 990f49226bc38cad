//! Error types for color-space conversions.

use tonecam_core::ColorSpace;
use thiserror::Error;

/// Color operation error.
///
/// Either no conversion path exists between two spaces, or a buffer-level
/// precondition (tag, dimensions, channel count) failed.
#[derive(Debug, Error)]
pub enum ColorError {
    /// No linear matrix and no dedicated nonlinear formula connects the spaces.
    #[error("unsupported transform: {from} -> {to}")]
    UnsupportedTransform {
        /// Source color space.
        from: ColorSpace,
        /// Requested color space.
        to: ColorSpace,
    },

    /// Buffer or tag precondition failed.
    #[error(transparent)]
    Core(#[from] tonecam_core::Error),
}

impl ColorError {
    /// Creates an [`ColorError::UnsupportedTransform`] error.
    #[inline]
    pub fn unsupported(from: ColorSpace, to: ColorSpace) -> Self {
        Self::UnsupportedTransform { from, to }
    }

    /// Returns `true` for [`ColorError::UnsupportedTransform`].
    #[inline]
    pub fn is_unsupported_transform(&self) -> bool {
        matches!(self, Self::UnsupportedTransform { .. })
    }

    /// Returns `true` if an operand carried the wrong color-space tag.
    #[inline]
    pub fn is_color_space_error(&self) -> bool {
        matches!(self, Self::Core(e) if e.is_color_space_error())
    }

    /// Returns `true` for dimension, size and channel-count errors.
    #[inline]
    pub fn is_dimension_error(&self) -> bool {
        matches!(self, Self::Core(e) if e.is_dimension_error())
    }
}

/// Result type for color operations.
pub type ColorResult<T> = Result<T, ColorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_message() {
        let err = ColorError::unsupported(ColorSpace::Lab, ColorSpace::Lms);
        assert_eq!(err.to_string(), "unsupported transform: Lab -> LMS");
        assert!(err.is_unsupported_transform());
    }

    #[test]
    fn test_core_passthrough() {
        let err: ColorError =
            tonecam_core::Error::invalid_color_space(ColorSpace::Rgb, ColorSpace::Srgb).into();
        assert!(err.is_color_space_error());
        assert!(!err.is_dimension_error());
    }
}
