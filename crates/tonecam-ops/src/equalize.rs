//! Percentile search and histogram equalization.
//!
//! An [`Equalizer`] indexes one channel by quantized value: bucket
//! `floor(v / max * levels)` holds the positions of every element that falls
//! into it, plus the bucket's own min and max. Percentile queries walk the
//! buckets by cumulative count; equalization writes each bucket's
//! cumulative rank back into a destination channel.
//!
//! The index is built explicitly and remembers the source channel's
//! [`generation`](tonecam_core::PixelBuffer::generation), so a caller holding
//! one across mutations can ask [`Equalizer::is_stale_for`]. The
//! [`EqualizeExt`] helpers always build a fresh index.
//!
//! # Example
//!
//! ```rust
//! use tonecam_core::Channel;
//! use tonecam_ops::equalize::{EqualizeExt, Equalizer};
//!
//! let mut ch = Channel::from_vec(4, 1, vec![0.0f32, 1.0, 2.0, 3.0]).unwrap();
//! let (lo, hi) = ch.percentile(0.0, 1.0).unwrap();
//! assert_eq!((lo, hi), (0.0, 3.0));
//!
//! let eq = Equalizer::build(&ch, 1000).unwrap();
//! ch.fill(5.0);
//! assert!(eq.is_stale_for(&ch));
//! ```

use crate::{OpsError, OpsResult};
use std::collections::BTreeMap;
use tonecam_core::{Channel, Error};
use tracing::{debug, trace};

/// Default number of quantization levels.
pub const DEFAULT_QUANTIZE_LEVELS: usize = 1000;

#[derive(Debug, Clone)]
struct Bucket {
    positions: Vec<usize>,
    min: f32,
    max: f32,
}

/// Quantized histogram index over one channel.
#[derive(Debug, Clone)]
pub struct Equalizer {
    buckets: BTreeMap<i64, Bucket>,
    len: usize,
    min: f32,
    max: f32,
    quantize_levels: usize,
    generation: u64,
}

impl Equalizer {
    /// Indexes `src`.
    ///
    /// # Errors
    ///
    /// - [`OpsError::InvalidDimensions`] for an empty channel
    /// - [`OpsError::InvalidParameter`] for zero `quantize_levels`
    pub fn build(src: &Channel<f32>, quantize_levels: usize) -> OpsResult<Self> {
        if quantize_levels == 0 {
            return Err(OpsError::InvalidParameter("quantize_levels must be > 0".into()));
        }
        let Some(&(min, max)) = src.min_max_values().first() else {
            return Err(OpsError::InvalidDimensions("cannot index an empty channel".into()));
        };
        trace!(len = src.len(), quantize_levels, "equalizer_build");

        // Dividing by |max| keeps bucket order monotone for negative data.
        let divisor = if max != 0.0 { max.abs() } else { 1.0 };
        let levels = quantize_levels as f32;
        let mut buckets: BTreeMap<i64, Bucket> = BTreeMap::new();
        for (i, &v) in src.iter().enumerate() {
            let key = (v / divisor * levels).floor() as i64;
            let bucket = buckets.entry(key).or_insert(Bucket {
                positions: Vec::new(),
                min: v,
                max: v,
            });
            bucket.positions.push(i);
            bucket.min = bucket.min.min(v);
            bucket.max = bucket.max.max(v);
        }
        Ok(Self {
            buckets,
            len: src.len(),
            min,
            max,
            quantize_levels,
            generation: src.generation(),
        })
    }

    /// Element count of the indexed channel.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always `false`; empty channels are rejected by [`build`](Self::build).
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Global minimum.
    pub fn min(&self) -> f32 {
        self.min
    }

    /// Global maximum.
    pub fn max(&self) -> f32 {
        self.max
    }

    /// Number of non-empty buckets.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Quantization levels the index was built with.
    pub fn quantize_levels(&self) -> usize {
        self.quantize_levels
    }

    /// Generation of the channel at build time.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// True if `channel` is not the exact data this index was built from.
    pub fn is_stale_for(&self, channel: &Channel<f32>) -> bool {
        channel.generation() != self.generation || channel.len() != self.len
    }

    /// Value below which about `bound` of the elements lie.
    ///
    /// Returns the global minimum when the first bucket already covers
    /// `bound`, and the global maximum when no bucket does. Otherwise picks
    /// the previous bucket's max or this bucket's min, whichever side of the
    /// crossing `bound` is closer to.
    ///
    /// # Errors
    ///
    /// [`OpsError::InvalidBound`] if `bound` is outside `[0, 1]`.
    pub fn lower_percentile(&self, bound: f32) -> OpsResult<f32> {
        check_bound(bound)?;
        let found = self.crossing(self.buckets.values(), bound as f64);
        Ok(match found {
            Crossing::First => self.min,
            Crossing::Previous(prev) => prev.max,
            Crossing::Current(cur) => cur.min,
            Crossing::None => self.max,
        })
    }

    /// Value above which about `1 - bound` of the elements lie.
    ///
    /// Mirror image of [`lower_percentile`](Self::lower_percentile),
    /// scanning from the brightest bucket.
    ///
    /// # Errors
    ///
    /// [`OpsError::InvalidBound`] if `bound` is outside `[0, 1]`.
    pub fn upper_percentile(&self, bound: f32) -> OpsResult<f32> {
        check_bound(bound)?;
        let found = self.crossing(self.buckets.values().rev(), 1.0 - bound as f64);
        Ok(match found {
            Crossing::First => self.max,
            Crossing::Previous(prev) => prev.min,
            Crossing::Current(cur) => cur.max,
            Crossing::None => self.min,
        })
    }

    /// Walks `buckets` until the cumulative fraction exceeds `bound`.
    fn crossing<'a>(&self, buckets: impl Iterator<Item = &'a Bucket>, bound: f64) -> Crossing<'a> {
        let total = self.len as f64;
        let mut count = 0usize;
        let mut prev: Option<&Bucket> = None;
        for bucket in buckets {
            let before = count as f64 / total;
            count += bucket.positions.len();
            let after = count as f64 / total;
            if after > bound {
                return match prev {
                    None => Crossing::First,
                    Some(p) if bound - before < after - bound => Crossing::Previous(p),
                    Some(_) => Crossing::Current(bucket),
                };
            }
            prev = Some(bucket);
        }
        Crossing::None
    }

    /// Writes the equalized channel into `dst`.
    ///
    /// Every element of a bucket gets the fraction of elements in strictly
    /// darker buckets, mapped onto `[out_min, out_max]`; the darkest bucket
    /// lands exactly on `out_min`.
    ///
    /// # Errors
    ///
    /// [`Error::SizeMismatch`] if `dst` has a different element count.
    pub fn export_equalized(&self, dst: &mut Channel<f32>, out_min: f32, out_max: f32) -> OpsResult<()> {
        if dst.len() != self.len {
            return Err(Error::size_mismatch(self.len, dst.len()).into());
        }
        debug!(buckets = self.buckets.len(), out_min, out_max, "export_equalized");
        let total = self.len as f64;
        let span = (out_max - out_min) as f64;
        let data = dst.as_mut_slice();
        let mut before = 0usize;
        for bucket in self.buckets.values() {
            let value = (before as f64 / total * span + out_min as f64) as f32;
            for &i in &bucket.positions {
                data[i] = value;
            }
            before += bucket.positions.len();
        }
        Ok(())
    }
}

enum Crossing<'a> {
    First,
    Previous(&'a Bucket),
    Current(&'a Bucket),
    None,
}

fn check_bound(bound: f32) -> OpsResult<()> {
    if (0.0..=1.0).contains(&bound) {
        Ok(())
    } else {
        Err(OpsError::InvalidBound(bound))
    }
}

/// One-shot percentile and equalization on float channels.
pub trait EqualizeExt {
    /// `(lower, upper)` percentile values from a fresh index.
    fn percentile(&self, lower: f32, upper: f32) -> OpsResult<(f32, f32)>;

    /// Equalizes in place onto `[out_min, out_max]`.
    fn equalize(&mut self, out_min: f32, out_max: f32) -> OpsResult<()>;
}

impl EqualizeExt for Channel<f32> {
    fn percentile(&self, lower: f32, upper: f32) -> OpsResult<(f32, f32)> {
        let eq = Equalizer::build(self, DEFAULT_QUANTIZE_LEVELS)?;
        Ok((eq.lower_percentile(lower)?, eq.upper_percentile(upper)?))
    }

    fn equalize(&mut self, out_min: f32, out_max: f32) -> OpsResult<()> {
        let eq = Equalizer::build(self, DEFAULT_QUANTIZE_LEVELS)?;
        eq.export_equalized(self, out_min, out_max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn steps() -> Channel<f32> {
        // Ten distinct buckets, one element each, shuffled.
        let data = vec![3.0, 7.0, 0.0, 9.0, 1.0, 5.0, 8.0, 2.0, 6.0, 4.0];
        Channel::from_vec(5, 2, data).unwrap()
    }

    #[test]
    fn test_extreme_bounds_hit_global_range() {
        let ch = steps();
        let eq = Equalizer::build(&ch, 1000).unwrap();
        assert_eq!(eq.bucket_count(), 10);
        assert_eq!(eq.lower_percentile(0.0).unwrap(), 0.0);
        assert_eq!(eq.upper_percentile(1.0).unwrap(), 9.0);
        // Nothing ever exceeds a full bound.
        assert_eq!(eq.lower_percentile(1.0).unwrap(), 9.0);
        assert_eq!(eq.upper_percentile(0.0).unwrap(), 0.0);
    }

    #[test]
    fn test_nearest_side_of_crossing() {
        let eq = Equalizer::build(&steps(), 1000).unwrap();
        // Crossing in the bucket of 2.0: 0.2 before, 0.3 after.
        assert_eq!(eq.lower_percentile(0.22).unwrap(), 1.0);
        assert_eq!(eq.lower_percentile(0.28).unwrap(), 2.0);
        // Mirror: crossing in the bucket of 7.0 from the top.
        assert_eq!(eq.upper_percentile(0.78).unwrap(), 8.0);
        assert_eq!(eq.upper_percentile(0.72).unwrap(), 7.0);
    }

    #[test]
    fn test_constant_channel() {
        let mut ch = Channel::<f32>::new(6, 3);
        ch.fill(42.5);
        let eq = Equalizer::build(&ch, 1000).unwrap();
        for i in 0..=20 {
            let bound = i as f32 / 20.0;
            assert_eq!(eq.lower_percentile(bound).unwrap(), 42.5);
            assert_eq!(eq.upper_percentile(bound).unwrap(), 42.5);
        }
    }

    #[test]
    fn test_invalid_bound() {
        let eq = Equalizer::build(&steps(), 1000).unwrap();
        for bound in [-0.01, 1.01, f32::NAN] {
            assert!(matches!(eq.lower_percentile(bound), Err(OpsError::InvalidBound(_))));
            assert!(matches!(eq.upper_percentile(bound), Err(OpsError::InvalidBound(_))));
        }
    }

    #[test]
    fn test_export_range_and_darkest() {
        let src = steps();
        let eq = Equalizer::build(&src, 1000).unwrap();
        let mut dst = Channel::new(5, 2);
        eq.export_equalized(&mut dst, 10.0, 20.0).unwrap();
        assert!(dst.iter().all(|&v| (10.0..=20.0).contains(&v)));
        // 0.0 sits at index 2, 9.0 at index 3.
        assert_eq!(dst[2], 10.0);
        assert_eq!(dst[3], 19.0);
        // Order is preserved.
        for i in 0..10 {
            for j in 0..10 {
                if src[i] < src[j] {
                    assert!(dst[i] < dst[j]);
                }
            }
        }
    }

    #[test]
    fn test_export_size_mismatch() {
        let eq = Equalizer::build(&steps(), 1000).unwrap();
        let mut dst = Channel::new(3, 3);
        let err = eq.export_equalized(&mut dst, 0.0, 1.0).unwrap_err();
        assert!(err.is_dimension_error());
    }

    #[test]
    fn test_negative_values_keep_order() {
        let ch = Channel::from_vec(4, 1, vec![-4.0, -1.0, -3.0, -2.0]).unwrap();
        let eq = Equalizer::build(&ch, 1000).unwrap();
        assert_eq!(eq.lower_percentile(0.0).unwrap(), -4.0);
        assert_eq!(eq.upper_percentile(1.0).unwrap(), -1.0);
        let mut out = ch.clone();
        eq.export_equalized(&mut out, 0.0, 100.0).unwrap();
        assert_eq!(out.as_slice(), &[0.0, 75.0, 25.0, 50.0]);
    }

    #[test]
    fn test_staleness_tracks_generation() {
        let mut ch = steps();
        let eq = Equalizer::build(&ch, 1000).unwrap();
        assert!(!eq.is_stale_for(&ch));
        assert!(eq.is_stale_for(&ch.clone()));
        ch.rescale(0.0, 9.0, 0.0, 1.0);
        assert!(eq.is_stale_for(&ch));
    }

    #[test]
    fn test_ext_helpers() {
        let mut ch = steps();
        assert_eq!(ch.percentile(0.0, 1.0).unwrap(), (0.0, 9.0));
        ch.equalize(0.0, 100.0).unwrap();
        assert_eq!(ch.min_max_values()[0], (0.0, 90.0));
    }

    #[test]
    fn test_empty_channel_rejected() {
        assert!(Equalizer::build(&Channel::default(), 1000).is_err());
        assert!(Equalizer::build(&steps(), 0).is_err());
    }
}
