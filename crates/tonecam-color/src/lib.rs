//! # tonecam-color
//!
//! Color-space engine for tonecam.
//!
//! - [`transfer_matrix`] - immutable table of 3x3 transforms between linear
//!   RGB, XYZ, LMS and IPT
//! - [`lab`] - XYZ <-> Lab against a reference [`Illuminant`]
//! - [`srgb`] - 8-bit sRGB decode table and encoder
//! - [`ColorConvert`] - in-place `change_color_space` on tagged images
//!
//! # Color-space graph
//!
//! ```text
//!            matrix          matrix          matrix
//!   RGB <----------> XYZ <----------> LMS <----------> IPT
//!    ^                ^
//!    | srgb (u8/f32)  | lab formula
//!    v                v
//!  sRGB              Lab
//! ```
//!
//! Every matrix pair is available directly (RGB -> IPT is one matrix).
//! Results landing in linear RGB are clipped to `[0, 1]`.
//!
//! # Dependencies
//!
//! - `tonecam-core` - images, tags, errors
//! - `tonecam-math` - [`Mat3`](tonecam_math::Mat3)
//!
//! # Used By
//!
//! - `tonecam-ops` - the tone-mapping pipelines

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod convert;
pub mod error;
pub mod illuminant;
pub mod lab;
pub mod matrices;
pub mod srgb;

pub use convert::ColorConvert;
pub use error::{ColorError, ColorResult};
pub use illuminant::{Illuminant, D50, D65};
pub use matrices::{transfer_matrix, transfer_table};
pub use srgb::{linear_from_srgb, linear_from_srgb_into, srgb_from_linear, srgb_from_linear_into};
