//! Element types stored in a [`PixelBuffer`](crate::PixelBuffer).
//!
//! Two layers:
//!
//! - [`Element`] - anything a buffer can hold: `u8`, `u16`, `i32`, `i64`,
//!   `f16`, `f32`, `f64`. Enough for fill, clip, equality, NaN checks.
//! - [`Numeric`] - elements that take part in arithmetic and the lazy
//!   expression functions: `i32`, `i64`, `f32`, `f64`.
//!
//! Integer elements evaluate `pow`, `sqrt` and `cbrt` in `f64` and truncate
//! the result back, the same promotion C-style integer code performs.
//!
//! # Example
//!
//! ```
//! use tonecam_core::{Element, Numeric};
//!
//! assert_eq!(Numeric::pow(3i32, 4), 81);
//! assert_eq!(Numeric::cbrt(-27i32), -3);
//! assert!(Element::is_nan(f32::NAN));
//! assert!(!Element::is_nan(7u8));
//! ```

use half::f16;
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// Trait for element types a buffer can store.
pub trait Element: Copy + Default + PartialOrd + fmt::Debug + Send + Sync + 'static {
    /// Whether this is a floating-point type.
    const IS_FLOAT: bool;

    /// Short type name for logs.
    const NAME: &'static str;

    /// Zero value.
    fn zero() -> Self;

    /// Widen to `f64`.
    fn to_f64(self) -> f64;

    /// Narrow from `f64` (saturating `as` semantics for integers).
    fn from_f64(v: f64) -> Self;

    /// IEEE self-inequality test. Always `false` for integers.
    #[inline]
    #[allow(clippy::eq_op)]
    fn is_nan(self) -> bool {
        self != self
    }
}

/// Element types supporting arithmetic and the expression functions.
pub trait Numeric:
    Element
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
{
    /// Absolute value.
    fn abs(self) -> Self;

    /// Real exponentiation.
    fn pow(self, exp: Self) -> Self;

    /// Square root.
    fn sqrt(self) -> Self;

    /// Cube root.
    fn cbrt(self) -> Self;
}

macro_rules! impl_int_element {
    ($($t:ty),*) => {$(
        impl Element for $t {
            const IS_FLOAT: bool = false;
            const NAME: &'static str = stringify!($t);

            #[inline]
            fn zero() -> Self {
                0
            }

            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }

            #[inline]
            fn from_f64(v: f64) -> Self {
                v as $t
            }
        }
    )*};
}

impl_int_element!(u8, u16, i32, i64);

macro_rules! impl_int_numeric {
    ($($t:ty),*) => {$(
        impl Numeric for $t {
            #[inline]
            fn abs(self) -> Self {
                <$t>::abs(self)
            }

            #[inline]
            fn pow(self, exp: Self) -> Self {
                (self as f64).powf(exp as f64) as $t
            }

            #[inline]
            fn sqrt(self) -> Self {
                (self as f64).sqrt() as $t
            }

            #[inline]
            fn cbrt(self) -> Self {
                (self as f64).cbrt() as $t
            }
        }
    )*};
}

impl_int_numeric!(i32, i64);

macro_rules! impl_float {
    ($($t:ty),*) => {$(
        impl Element for $t {
            const IS_FLOAT: bool = true;
            const NAME: &'static str = stringify!($t);

            #[inline]
            fn zero() -> Self {
                0.0
            }

            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }

            #[inline]
            fn from_f64(v: f64) -> Self {
                v as $t
            }
        }

        impl Numeric for $t {
            #[inline]
            fn abs(self) -> Self {
                <$t>::abs(self)
            }

            #[inline]
            fn pow(self, exp: Self) -> Self {
                self.powf(exp)
            }

            #[inline]
            fn sqrt(self) -> Self {
                <$t>::sqrt(self)
            }

            #[inline]
            fn cbrt(self) -> Self {
                <$t>::cbrt(self)
            }
        }
    )*};
}

impl_float!(f32, f64);

// Storage-only: half floats come from codecs and are widened before any math.
impl Element for f16 {
    const IS_FLOAT: bool = true;
    const NAME: &'static str = "f16";

    #[inline]
    fn zero() -> Self {
        f16::ZERO
    }

    #[inline]
    fn to_f64(self) -> f64 {
        f16::to_f64(self)
    }

    #[inline]
    fn from_f64(v: f64) -> Self {
        f16::from_f64(v)
    }

    #[inline]
    fn is_nan(self) -> bool {
        f16::is_nan(self)
    }
}
