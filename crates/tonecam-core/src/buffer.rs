//! Flat, row-major, channel-interleaved pixel storage.
//!
//! [`PixelBuffer`] is the foundation of every image and channel in tonecam.
//! Elements are laid out as `R, G, B, R, G, B, ...` with no stride padding,
//! so element `c` of pixel `(x, y)` lives at `(y * width + x) * channels + c`.
//!
//! # Ownership
//!
//! A buffer either owns its memory (`Vec<T>`) or borrows memory handed in
//! by a codec or host application through [`PixelBuffer::from_raw_parts`].
//! A borrowed buffer may carry a release callback; it fires exactly once,
//! when the buffer is dropped, and never for owned storage.
//!
//! - `clone()` always produces an owned deep copy.
//! - [`PixelBuffer::take`] moves the storage out and leaves the source empty.
//!
//! # Example
//!
//! ```rust
//! use tonecam_core::PixelBuffer;
//!
//! let mut a = PixelBuffer::<f32>::new(4, 2, 3);
//! a.fill(0.5);
//! a *= 2.0;
//! let b = a.clone();
//! a += 1.0;
//! assert_eq!(b[0], 1.0);
//! assert_eq!(a[0], 2.0);
//! ```
//!
//! # Modification tracking
//!
//! Every mutable access stamps the buffer with a fresh, process-unique
//! [`generation`](PixelBuffer::generation). Derived indices (the percentile
//! equalizer) record the stamp to tell whether they still describe the data.

use crate::element::{Element, Numeric};
use crate::error::{Error, Result};
use crate::expr::Expr;
use std::fmt;
use std::ops::{AddAssign, DivAssign, Index, IndexMut, MulAssign, SubAssign};
use std::ptr::NonNull;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

/// Callback releasing borrowed memory, called with the buffer's base pointer.
pub type ReleaseFn<T> = Box<dyn FnOnce(*mut T) + Send>;

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

#[inline]
fn next_generation() -> u64 {
    NEXT_GENERATION.fetch_add(1, Ordering::Relaxed)
}

enum Storage<T> {
    Empty,
    Owned(Vec<T>),
    Borrowed {
        ptr: NonNull<T>,
        len: usize,
        release: Option<ReleaseFn<T>>,
    },
}

impl<T> Drop for Storage<T> {
    fn drop(&mut self) {
        if let Storage::Borrowed { ptr, release, .. } = self {
            if let Some(release) = release.take() {
                release(ptr.as_ptr());
            }
        }
    }
}

/// Pixel storage with width, height and interleaved channels.
///
/// Invariant: the storage always holds exactly
/// `width * height * channels` elements.
pub struct PixelBuffer<T: Element> {
    width: usize,
    height: usize,
    channels: usize,
    storage: Storage<T>,
    generation: u64,
}

// SAFETY: owned storage is a Vec<T>. Borrowed storage is only created through
// `from_raw_parts`, whose contract makes the memory exclusively ours for the
// buffer's lifetime, so it can move and be shared exactly like a Vec<T>.
unsafe impl<T: Element> Send for PixelBuffer<T> {}
unsafe impl<T: Element> Sync for PixelBuffer<T> {}

impl<T: Element> PixelBuffer<T> {
    /// Creates an owned buffer filled with zeros.
    pub fn new(width: usize, height: usize, channels: usize) -> Self {
        let len = width * height * channels;
        Self {
            width,
            height,
            channels,
            storage: Storage::Owned(vec![T::zero(); len]),
            generation: next_generation(),
        }
    }

    /// Adopts a vector as owned storage without copying.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidDimensions`] if `data.len() != width * height * channels`.
    pub fn from_vec(width: usize, height: usize, channels: usize, data: Vec<T>) -> Result<Self> {
        let len = element_count(width, height, channels)?;
        if data.len() != len {
            return Err(Error::invalid_dimensions(
                width,
                height,
                format!("{} elements supplied, {} channels need {}", data.len(), channels, len),
            ));
        }
        Ok(Self {
            width,
            height,
            channels,
            storage: Storage::Owned(data),
            generation: next_generation(),
        })
    }

    /// Wraps memory owned by someone else.
    ///
    /// `release`, if given, is called once with `ptr` when the buffer drops.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidDimensions`] if the element count overflows or `ptr`
    /// is null for a non-empty buffer.
    ///
    /// # Safety
    ///
    /// `ptr` must point to `width * height * channels` initialized, contiguous,
    /// interleaved elements that stay valid, and are not accessed through any
    /// other path, until the buffer is dropped.
    pub unsafe fn from_raw_parts(
        ptr: *mut T,
        width: usize,
        height: usize,
        channels: usize,
        release: Option<ReleaseFn<T>>,
    ) -> Result<Self> {
        let len = element_count(width, height, channels)?;
        let ptr = match NonNull::new(ptr) {
            Some(p) => p,
            None if len == 0 => NonNull::dangling(),
            None => return Err(Error::invalid_dimensions(width, height, "null buffer pointer")),
        };
        Ok(Self {
            width,
            height,
            channels,
            storage: Storage::Borrowed { ptr, len, release },
            generation: next_generation(),
        })
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Interleaved channels per pixel.
    #[inline]
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// `(width, height)`.
    #[inline]
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// `width * height`.
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    /// Element count, `pixel_count() * channels()`.
    #[inline]
    pub fn len(&self) -> usize {
        self.pixel_count() * self.channels
    }

    /// True when the buffer holds no storage at all (default or moved-from).
    ///
    /// A `0x0` buffer created with [`new`](Self::new) has storage and is not empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self.storage, Storage::Empty)
    }

    /// True when the memory belongs to an external owner.
    #[inline]
    pub fn is_borrowed(&self) -> bool {
        matches!(self.storage, Storage::Borrowed { .. })
    }

    /// Modification stamp, refreshed by every mutable access.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Elements as a slice.
    pub fn as_slice(&self) -> &[T] {
        match &self.storage {
            Storage::Empty => &[],
            Storage::Owned(v) => v,
            // SAFETY: upheld by the `from_raw_parts` contract.
            Storage::Borrowed { ptr, len, .. } => unsafe {
                std::slice::from_raw_parts(ptr.as_ptr(), *len)
            },
        }
    }

    /// Elements as a mutable slice. Refreshes the generation.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        self.generation = next_generation();
        match &mut self.storage {
            Storage::Empty => &mut [],
            Storage::Owned(v) => v,
            // SAFETY: upheld by the `from_raw_parts` contract; `&mut self`
            // guarantees exclusivity on our side.
            Storage::Borrowed { ptr, len, .. } => unsafe {
                std::slice::from_raw_parts_mut(ptr.as_ptr(), *len)
            },
        }
    }

    /// Checked element access.
    #[inline]
    pub fn get(&self, index: usize) -> Option<T> {
        self.as_slice().get(index).copied()
    }

    /// Iterates over elements.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    /// Moves the contents out, leaving `self` empty.
    ///
    /// A borrowed buffer's release callback travels with the returned value.
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }

    /// Sets every element to `value`.
    pub fn fill(&mut self, value: T) {
        self.as_mut_slice().fill(value);
    }

    /// Clamps every element to `[lower, upper]`.
    pub fn clip(&mut self, lower: T, upper: T) {
        trace!(len = self.len(), "clip");
        for v in self.as_mut_slice() {
            if *v < lower {
                *v = lower;
            } else if *v > upper {
                *v = upper;
            }
        }
    }

    /// Applies `f` to every element in place.
    pub fn map_in_place(&mut self, mut f: impl FnMut(T) -> T) {
        for v in self.as_mut_slice() {
            *v = f(*v);
        }
    }

    /// True if any element compares unequal to itself.
    pub fn has_nan(&self) -> bool {
        T::IS_FLOAT && self.iter().any(|v| v.is_nan())
    }

    /// Per-channel `(min, max)` over the whole buffer, in channel order.
    ///
    /// Returns an empty vector for a buffer without pixels.
    pub fn min_max_values(&self) -> Vec<(T, T)> {
        if self.pixel_count() == 0 || self.channels == 0 {
            return Vec::new();
        }
        let data = self.as_slice();
        let mut ranges: Vec<(T, T)> = data[..self.channels].iter().map(|&v| (v, v)).collect();
        for pixel in data.chunks_exact(self.channels).skip(1) {
            for (range, &v) in ranges.iter_mut().zip(pixel) {
                if v < range.0 {
                    range.0 = v;
                }
                if v > range.1 {
                    range.1 = v;
                }
            }
        }
        ranges
    }

    /// Same width, height and channel count.
    #[inline]
    pub fn same_dimensions<U: Element>(&self, other: &PixelBuffer<U>) -> bool {
        self.width == other.width && self.height == other.height && self.channels == other.channels
    }

    /// Same width and height, channel counts may differ.
    #[inline]
    pub fn same_extent<U: Element>(&self, other: &PixelBuffer<U>) -> bool {
        self.width == other.width && self.height == other.height
    }

    /// Fails with [`Error::DimensionMismatch`] unless [`same_extent`](Self::same_extent).
    pub fn check_extent<U: Element>(&self, other: &PixelBuffer<U>) -> Result<()> {
        if self.same_extent(other) {
            Ok(())
        } else {
            Err(Error::dimension_mismatch(self.dimensions(), other.dimensions()))
        }
    }
}

impl<T: Numeric> PixelBuffer<T> {
    /// Raises every element to `exp`.
    pub fn pow(&mut self, exp: T) {
        self.map_in_place(|v| v.pow(exp));
    }

    /// Replaces every element with its absolute value.
    pub fn abs(&mut self) {
        self.map_in_place(Numeric::abs);
    }

    /// Evaluates `expr` once per element into this buffer.
    ///
    /// A scalar-only expression fills the buffer. No element is evaluated
    /// for a zero-length destination.
    ///
    /// # Errors
    ///
    /// [`Error::SizeMismatch`] if the expression combined operands of different
    /// sizes, or its size differs from `self.len()`.
    pub fn assign<'a>(&mut self, expr: impl Into<Expr<'a, T>>) -> Result<()> {
        let expr = expr.into();
        if let Some(n) = expr.checked_len()? {
            if n != self.len() {
                return Err(Error::size_mismatch(self.len(), n));
            }
        }
        for (i, out) in self.as_mut_slice().iter_mut().enumerate() {
            *out = expr.eval(i);
        }
        Ok(())
    }
}

/// Computes `width * height * channels`, rejecting overflow.
fn element_count(width: usize, height: usize, channels: usize) -> Result<usize> {
    width
        .checked_mul(height)
        .and_then(|n| n.checked_mul(channels))
        .ok_or_else(|| Error::invalid_dimensions(width, height, "element count overflows"))
}

/// True if both buffers share width, height and channel count.
#[inline]
pub fn same_dimensions<T: Element, U: Element>(a: &PixelBuffer<T>, b: &PixelBuffer<U>) -> bool {
    a.same_dimensions(b)
}

impl<T: Element> Default for PixelBuffer<T> {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            channels: 0,
            storage: Storage::Empty,
            generation: next_generation(),
        }
    }
}

impl<T: Element> Clone for PixelBuffer<T> {
    fn clone(&self) -> Self {
        let storage = match self.storage {
            Storage::Empty => Storage::Empty,
            _ => Storage::Owned(self.as_slice().to_vec()),
        };
        Self {
            width: self.width,
            height: self.height,
            channels: self.channels,
            storage,
            generation: next_generation(),
        }
    }
}

impl<T: Element> PartialEq for PixelBuffer<T> {
    fn eq(&self, other: &Self) -> bool {
        self.same_dimensions(other) && self.as_slice() == other.as_slice()
    }
}

impl<T: Element> fmt::Debug for PixelBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let storage = match self.storage {
            Storage::Empty => "empty",
            Storage::Owned(_) => "owned",
            Storage::Borrowed { .. } => "borrowed",
        };
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("channels", &self.channels)
            .field("element", &T::NAME)
            .field("storage", &storage)
            .finish()
    }
}

impl<T: Element> Index<usize> for PixelBuffer<T> {
    type Output = T;

    #[inline]
    fn index(&self, index: usize) -> &T {
        &self.as_slice()[index]
    }
}

impl<T: Element> IndexMut<usize> for PixelBuffer<T> {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut T {
        &mut self.as_mut_slice()[index]
    }
}

impl<'a, T: Element> IntoIterator for &'a PixelBuffer<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

macro_rules! impl_scalar_assign {
    ($trait:ident, $method:ident, $op:tt) => {
        impl<T: Numeric> $trait<T> for PixelBuffer<T> {
            fn $method(&mut self, rhs: T) {
                for v in self.as_mut_slice() {
                    *v = *v $op rhs;
                }
            }
        }
    };
}

impl_scalar_assign!(AddAssign, add_assign, +);
impl_scalar_assign!(SubAssign, sub_assign, -);
impl_scalar_assign!(MulAssign, mul_assign, *);
impl_scalar_assign!(DivAssign, div_assign, /);
