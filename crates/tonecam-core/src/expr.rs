//! Lazy elementwise expressions over buffers, slices and scalars.
//!
//! Arithmetic on `&PixelBuffer`, `&Channel`, `&Image`, `&[T]`, `&Vec<T>`
//! and scalars builds an [`Expr`] instead of a temporary buffer. Nothing is
//! computed until the expression is assigned into a destination with
//! [`PixelBuffer::assign`](crate::PixelBuffer::assign), which evaluates the
//! whole tree once per destination index, left to right.
//!
//! # Operations
//!
//! - binary: `+`, `-`, `*`, `/`, [`pow`]
//! - unary: `-`, [`abs`], [`square`], [`pow3`], [`pow4`], [`sqrt`], [`cbrt`]
//!
//! # Example
//!
//! ```rust
//! use tonecam_core::{expr, PixelBuffer};
//!
//! let mut src = PixelBuffer::<f32>::new(3, 2, 3);
//! src.fill(4.0);
//! let mut dst = PixelBuffer::<f32>::new(3, 2, 3);
//! dst.assign(expr::sqrt(&src) * 2.0 - 1.0).unwrap();
//! assert!(dst.iter().all(|&v| v == 3.0));
//! ```
//!
//! # Sizes
//!
//! Buffer and slice operands have a size, scalars do not. Combining two sized
//! operands of different sizes does not fail immediately; the mismatch is
//! recorded and reported as [`Error::SizeMismatch`] on assignment, before any
//! element is evaluated.

use crate::buffer::PixelBuffer;
use crate::channel::Channel;
use crate::element::Numeric;
use crate::error::{Error, Result};
use crate::image::Image;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// A composed elementwise computation.
pub struct Expr<'a, T> {
    len: Option<usize>,
    mismatch: Option<(usize, usize)>,
    eval: Box<dyn Fn(usize) -> T + 'a>,
}

impl<'a, T: Numeric> Expr<'a, T> {
    /// Expression yielding `value` at every index.
    pub fn scalar(value: T) -> Self {
        Self {
            len: None,
            mismatch: None,
            eval: Box::new(move |_| value),
        }
    }

    /// Expression reading `data[i]`.
    pub fn slice(data: &'a [T]) -> Self {
        Self {
            len: Some(data.len()),
            mismatch: None,
            eval: Box::new(move |i| data[i]),
        }
    }

    /// Declared element count; `None` for scalar-only expressions.
    pub fn len(&self) -> Option<usize> {
        self.len
    }

    /// True when the declared size is zero.
    pub fn is_empty(&self) -> bool {
        self.len == Some(0)
    }

    /// Declared element count, or the first size conflict found while composing.
    pub fn checked_len(&self) -> Result<Option<usize>> {
        match self.mismatch {
            Some((a, b)) => Err(Error::size_mismatch(a, b)),
            None => Ok(self.len),
        }
    }

    /// Value at index `i`. Panics if `i` is past a sized operand.
    #[inline]
    pub fn eval(&self, i: usize) -> T {
        (self.eval)(i)
    }

    /// Applies a scalar function to each result.
    pub fn map(self, f: impl Fn(T) -> T + 'a) -> Self {
        let inner = self.eval;
        Self {
            len: self.len,
            mismatch: self.mismatch,
            eval: Box::new(move |i| f(inner(i))),
        }
    }

    /// Combines two expressions elementwise.
    pub fn zip(self, rhs: impl Into<Expr<'a, T>>, f: impl Fn(T, T) -> T + 'a) -> Self {
        let rhs = rhs.into();
        let (len, conflict) = match (self.len, rhs.len) {
            (Some(a), Some(b)) if a != b => (Some(a), Some((a, b))),
            (Some(a), _) => (Some(a), None),
            (None, b) => (b, None),
        };
        let (lhs_eval, rhs_eval) = (self.eval, rhs.eval);
        Self {
            len,
            mismatch: self.mismatch.or(rhs.mismatch).or(conflict),
            eval: Box::new(move |i| f(lhs_eval(i), rhs_eval(i))),
        }
    }

    /// `|x|`
    pub fn abs(self) -> Self {
        self.map(Numeric::abs)
    }

    /// `x * x`
    pub fn square(self) -> Self {
        self.map(|v| v * v)
    }

    /// `x * x * x`
    pub fn pow3(self) -> Self {
        self.map(|v| v * v * v)
    }

    /// `x^4`, computed as two squarings.
    pub fn pow4(self) -> Self {
        self.map(|v| {
            let sq = v * v;
            sq * sq
        })
    }

    /// Square root.
    pub fn sqrt(self) -> Self {
        self.map(Numeric::sqrt)
    }

    /// Cube root.
    pub fn cbrt(self) -> Self {
        self.map(Numeric::cbrt)
    }

    /// `x^exp`, where `exp` is a scalar or another operand.
    pub fn pow(self, exp: impl Into<Expr<'a, T>>) -> Self {
        self.zip(exp, Numeric::pow)
    }
}

impl<'a, T: Numeric> From<T> for Expr<'a, T> {
    fn from(value: T) -> Self {
        Expr::scalar(value)
    }
}


impl<'a, T: Numeric> From<&'a [T]> for Expr<'a, T> {
    fn from(data: &'a [T]) -> Self {
        Expr::slice(data)
    }
}

impl<'a, T: Numeric> From<&'a Vec<T>> for Expr<'a, T> {
    fn from(data: &'a Vec<T>) -> Self {
        Expr::slice(data.as_slice())
    }
}

/// `|x|`
pub fn abs<'a, T: Numeric>(x: impl Into<Expr<'a, T>>) -> Expr<'a, T> {
    x.into().abs()
}

/// `x * x`
pub fn square<'a, T: Numeric>(x: impl Into<Expr<'a, T>>) -> Expr<'a, T> {
    x.into().square()
}

/// `x * x * x`
pub fn pow3<'a, T: Numeric>(x: impl Into<Expr<'a, T>>) -> Expr<'a, T> {
    x.into().pow3()
}

/// `x^4`
pub fn pow4<'a, T: Numeric>(x: impl Into<Expr<'a, T>>) -> Expr<'a, T> {
    x.into().pow4()
}

/// Square root.
pub fn sqrt<'a, T: Numeric>(x: impl Into<Expr<'a, T>>) -> Expr<'a, T> {
    x.into().sqrt()
}

/// Cube root.
pub fn cbrt<'a, T: Numeric>(x: impl Into<Expr<'a, T>>) -> Expr<'a, T> {
    x.into().cbrt()
}

/// `base^exp`
pub fn pow<'a, T: Numeric>(base: impl Into<Expr<'a, T>>, exp: impl Into<Expr<'a, T>>) -> Expr<'a, T> {
    base.into().pow(exp)
}

macro_rules! impl_binary_op {
    (@operand $operand:ident, $trait:ident, $method:ident, $op:tt) => {
        impl<'a, T: Numeric, R: Into<Expr<'a, T>>> $trait<R> for &'a $operand<T> {
            type Output = Expr<'a, T>;

            fn $method(self, rhs: R) -> Expr<'a, T> {
                Expr::from(self).zip(rhs, |a, b| a $op b)
            }
        }
    };
    ($trait:ident, $method:ident, $op:tt) => {
        impl<'a, T: Numeric, R: Into<Expr<'a, T>>> $trait<R> for Expr<'a, T> {
            type Output = Expr<'a, T>;

            fn $method(self, rhs: R) -> Expr<'a, T> {
                self.zip(rhs, |a, b| a $op b)
            }
        }
    };
}

impl_binary_op!(Add, add, +);
impl_binary_op!(Sub, sub, -);
impl_binary_op!(Mul, mul, *);
impl_binary_op!(Div, div, /);

impl<'a, T: Numeric> Neg for Expr<'a, T> {
    type Output = Expr<'a, T>;

    fn neg(self) -> Expr<'a, T> {
        self.map(|v| -v)
    }
}

// Buffers, channels and images all read as their flat element slice.
macro_rules! impl_operand {
    ($($operand:ident),*) => {$(
        impl<'a, T: Numeric> From<&'a $operand<T>> for Expr<'a, T> {
            fn from(v: &'a $operand<T>) -> Self {
                Expr::slice(v.as_slice())
            }
        }

        impl_binary_op!(@operand $operand, Add, add, +);
        impl_binary_op!(@operand $operand, Sub, sub, -);
        impl_binary_op!(@operand $operand, Mul, mul, *);
        impl_binary_op!(@operand $operand, Div, div, /);

        impl<'a, T: Numeric> Neg for &'a $operand<T> {
            type Output = Expr<'a, T>;

            fn neg(self) -> Expr<'a, T> {
                Expr::from(self).map(|v| -v)
            }
        }
    )*};
}

impl_operand!(PixelBuffer, Channel, Image);

// Scalar on the left: one impl per concrete element type and operand.
macro_rules! impl_scalar_lhs {
    (@rhs $t:ty, $operand:ident, $trait:ident, $method:ident, $op:tt) => {
        impl<'a> $trait<&'a $operand<$t>> for $t {
            type Output = Expr<'a, $t>;

            fn $method(self, rhs: &'a $operand<$t>) -> Expr<'a, $t> {
                Expr::scalar(self).zip(rhs, |a, b| a $op b)
            }
        }
    };
    (@op $t:ty, $trait:ident, $method:ident, $op:tt) => {
        impl<'a> $trait<Expr<'a, $t>> for $t {
            type Output = Expr<'a, $t>;

            fn $method(self, rhs: Expr<'a, $t>) -> Expr<'a, $t> {
                Expr::scalar(self).zip(rhs, |a, b| a $op b)
            }
        }

        impl_scalar_lhs!(@rhs $t, PixelBuffer, $trait, $method, $op);
        impl_scalar_lhs!(@rhs $t, Channel, $trait, $method, $op);
        impl_scalar_lhs!(@rhs $t, Image, $trait, $method, $op);
    };
    ($($t:ty),*) => {$(
        impl_scalar_lhs!(@op $t, Add, add, +);
        impl_scalar_lhs!(@op $t, Sub, sub, -);
        impl_scalar_lhs!(@op $t, Mul, mul, *);
        impl_scalar_lhs!(@op $t, Div, div, /);
    )*};
}

impl_scalar_lhs!(i32, i64, f32, f64);

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::cell::Cell;

    fn filled<T: Numeric>(w: usize, h: usize, c: usize, v: T) -> PixelBuffer<T> {
        let mut buf = PixelBuffer::new(w, h, c);
        buf.fill(v);
        buf
    }

    #[test]
    fn test_value_expression_matches_scalar_formula() {
        for v in -100..100 {
            let src = filled(6, 4, 3, v);
            let mut dst = PixelBuffer::<i32>::new(6, 4, 3);
            dst.assign(-((&src + 2) / 3 * 5 - 16)).unwrap();
            let expected = -((v + 2) / 3 * 5 - 16);
            assert!(dst.iter().all(|&x| x == expected), "v = {v}");
        }
    }

    #[test]
    fn test_array_expression_matches_scalar_formula() {
        for v in -100..100 {
            let l = filled(5, 5, 3, v);
            let r = filled(5, 5, 3, v + 150);
            let mut dst = PixelBuffer::<i32>::new(5, 5, 3);
            dst.assign(-((&l + &r) / &r * &r - &r)).unwrap();
            let expected = -((v + v + 150) / (v + 150) * (v + 150) - (v + 150));
            assert!(dst.iter().all(|&x| x == expected), "v = {v}");

            let mut powed = PixelBuffer::<i32>::new(5, 5, 3);
            powed.assign(pow(&dst, &r / 3)).unwrap();
            let expected_pow = Numeric::pow(expected, (v + 150) / 3);
            assert!(powed.iter().all(|&x| x == expected_pow), "v = {v}");
        }
    }

    #[test]
    fn test_function_chain() {
        for v in [-3.0f64, -0.5, 0.0, 1.25, 7.0] {
            let src = filled(4, 3, 1, v);
            let mut dst = PixelBuffer::<f64>::new(4, 3, 1);
            dst.assign(pow(cbrt(pow4(sqrt(abs(-square(&src)) + 24.0)) - 14.0), 2.0))
                .unwrap();
            let s = ((v * v).abs() + 24.0).sqrt();
            let expected = ((s * s) * (s * s) - 14.0).cbrt().powf(2.0);
            for &x in dst.iter() {
                assert_relative_eq!(x, expected, max_relative = 1e-12);
            }
        }
    }

    #[test]
    fn test_scalar_on_left() {
        let src = filled(2, 2, 1, 4.0f32);
        let mut dst = PixelBuffer::<f32>::new(2, 2, 1);
        dst.assign(10.0 - &src / 2.0).unwrap();
        assert!(dst.iter().all(|&x| x == 8.0));
        dst.assign(1.0 / (2.0 * Expr::from(&src))).unwrap();
        assert!(dst.iter().all(|&x| x == 0.125));
    }

    #[test]
    fn test_vector_operands() {
        let v = vec![1.0f32, 2.0, 3.0];
        let mut dst = PixelBuffer::<f32>::new(3, 1, 1);
        dst.assign(pow3(&v) + v.as_slice()).unwrap();
        assert_eq!(dst.as_slice(), &[2.0, 10.0, 30.0]);
    }

    #[test]
    fn test_empty_operands_evaluate_nothing() {
        let calls = Cell::new(0usize);
        let src = PixelBuffer::<f32>::new(0, 0, 3);
        let mut dst = PixelBuffer::<f32>::new(0, 0, 3);
        let expr = (-(&src + 2.0) * 5.0).map(|v| {
            calls.set(calls.get() + 1);
            v
        });
        assert!(expr.is_empty());
        dst.assign(expr).unwrap();
        assert_eq!(calls.get(), 0);

        let mut default_dst = PixelBuffer::<f32>::default();
        default_dst.assign(&PixelBuffer::<f32>::default() * 2.0).unwrap();
        assert!(default_dst.is_empty());
    }

    #[test]
    fn test_size_mismatch_between_operands() {
        let a = filled(2, 2, 1, 1i32);
        let b = filled(3, 2, 1, 1i32);
        let mut dst = PixelBuffer::<i32>::new(2, 2, 1);
        let err = dst.assign(&a + &b).unwrap_err();
        assert!(matches!(err, Error::SizeMismatch { expected: 4, got: 6 }));
        // Nothing was written.
        assert!(dst.iter().all(|&x| x == 0));
    }

    #[test]
    fn test_size_mismatch_with_destination() {
        let a = filled(2, 2, 3, 1.0f32);
        let mut dst = PixelBuffer::<f32>::new(2, 2, 1);
        let err = dst.assign(&a * 2.0).unwrap_err();
        assert!(matches!(err, Error::SizeMismatch { expected: 4, got: 12 }));
    }

    #[test]
    fn test_channel_operands() {
        let white = Channel::from_vec(2, 1, vec![0.0f32, 3.0]).unwrap();
        let mut k = Channel::<f32>::new(2, 1);
        k.assign(1.0 / (&white + 1.0)).unwrap();
        assert_eq!(k.as_slice(), &[1.0, 0.25]);
        let mut out = Channel::<f32>::new(2, 1);
        out.assign(2.0 * &k * &white - &white).unwrap();
        assert_eq!(out.as_slice(), &[0.0, -1.5]);
    }

    #[test]
    fn test_scalar_expression_fills() {
        let mut dst = PixelBuffer::<f64>::new(3, 3, 2);
        dst.assign(Expr::scalar(2.0).pow(3.0)).unwrap();
        assert!(dst.iter().all(|&x| x == 8.0));
    }
}
