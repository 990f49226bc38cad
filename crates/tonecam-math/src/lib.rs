//! # tonecam-math
//!
//! Matrix math for the tonecam color-space engine.
//!
//! - [`Mat3`] - row-major 3x3 matrix applied to interleaved pixel triples
//! - [`Vec3`] - re-export of [`glam::Vec3`] for single-triple work
//!
//! All matrix operations assume **row-major** storage and **column vectors**:
//!
//! ```text
//! result = matrix * vector
//! ```
//!
//! # Dependencies
//!
//! - [`glam`] - inversion and vector arithmetic
//!
//! # Used By
//!
//! - `tonecam-color` - the transfer matrix table

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod mat3;

pub use glam::Vec3;
pub use mat3::*;
