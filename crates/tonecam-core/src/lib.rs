//! # tonecam-core
//!
//! Core types for the tonecam color-appearance and tone-mapping engine.
//!
//! - [`PixelBuffer`] - flat, interleaved storage, owned or borrowed
//! - [`Expr`] - lazy elementwise arithmetic assigned in one pass
//! - [`Image`] - buffer tagged with a [`ColorSpace`]
//! - [`Channel`] - single-channel field, plus channel copy/load/crop helpers
//! - [`Element`], [`Numeric`] - element type traits
//!
//! ## Crate Structure
//!
//! ```text
//! tonecam-core (this crate)
//!    ^
//!    +-- tonecam-math  (3x3 matrices)
//!    +-- tonecam-color (color-space engine)
//!    +-- tonecam-ops   (equalizer, FFT blur, tone mapping)
//! ```
//!
//! Everything operates on fully materialized, in-memory buffers. Nothing
//! here spawns threads; a buffer is `Send + Sync` and clones deeply, so
//! independent copies can be processed in parallel by the caller.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod buffer;
pub mod channel;
pub mod colorspace;
pub mod element;
pub mod error;
pub mod expr;
pub mod image;

// Re-exports for convenience
pub use buffer::{same_dimensions, PixelBuffer, ReleaseFn};
pub use channel::{copy_channel, crop, load_from_channel, load_from_channels, Channel};
pub use colorspace::ColorSpace;
pub use element::{Element, Numeric};
pub use error::{Error, Result};
pub use expr::Expr;
pub use image::Image;

/// Prelude module for convenient imports.
///
/// ```
/// use tonecam_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::buffer::PixelBuffer;
    pub use crate::channel::{copy_channel, load_from_channel, Channel};
    pub use crate::colorspace::ColorSpace;
    pub use crate::element::{Element, Numeric};
    pub use crate::error::{Error, Result};
    pub use crate::expr::Expr;
    pub use crate::image::Image;
}
