//! Error types for tone-mapping operations.

use tonecam_color::ColorError;
use tonecam_core::Error;
use thiserror::Error;

/// Error type for tone-mapping operations.
#[derive(Error, Debug)]
pub enum OpsError {
    /// Invalid dimensions specified.
    #[error("invalid dimensions: {0}")]
    InvalidDimensions(String),

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Percentile bound outside `[0, 1]`.
    #[error("invalid bound: {0} is outside [0, 1]")]
    InvalidBound(f32),

    /// Color-space conversion failed.
    #[error(transparent)]
    Color(#[from] ColorError),

    /// Buffer or tag precondition failed.
    #[error(transparent)]
    Core(#[from] Error),
}

impl OpsError {
    /// Returns `true` if an operand carried the wrong color-space tag.
    pub fn is_color_space_error(&self) -> bool {
        match self {
            Self::Color(e) => e.is_color_space_error(),
            Self::Core(e) => e.is_color_space_error(),
            _ => false,
        }
    }

    /// Returns `true` for dimension, size and channel-count errors.
    pub fn is_dimension_error(&self) -> bool {
        match self {
            Self::InvalidDimensions(_) => true,
            Self::Color(e) => e.is_dimension_error(),
            Self::Core(e) => e.is_dimension_error(),
            _ => false,
        }
    }

    /// Returns `true` when no conversion path exists.
    pub fn is_unsupported_transform(&self) -> bool {
        matches!(self, Self::Color(e) if e.is_unsupported_transform())
    }
}

/// Result type for tone-mapping operations.
pub type OpsResult<T> = Result<T, OpsError>;

#[cfg(test)]
mod tests {
    use super::*;
    use tonecam_core::ColorSpace;

    #[test]
    fn test_layers_are_visible() {
        let err: OpsError = Error::invalid_color_space(ColorSpace::Lms, ColorSpace::Xyz).into();
        assert!(err.is_color_space_error());

        let err: OpsError = ColorError::from(Error::dimension_mismatch((2, 2), (3, 2))).into();
        assert!(err.is_dimension_error());
        assert!(!err.is_unsupported_transform());

        let err: OpsError = ColorError::unsupported(ColorSpace::Lab, ColorSpace::Ipt).into();
        assert!(err.is_unsupported_transform());
    }

    #[test]
    fn test_bound_message() {
        assert_eq!(
            OpsError::InvalidBound(1.5).to_string(),
            "invalid bound: 1.5 is outside [0, 1]"
        );
    }
}
