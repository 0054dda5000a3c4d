//! Raw-data sources and per-sample streams.
//!
//! [`RawSource`] is the contract an ingestion backend implements so the
//! label organizer can search it by absolute time: report the covered
//! span and answer interval queries with the slice actually held.
//! [`MemorySource`] is the in-memory implementation used throughout the
//! tests and for data already loaded by other readers.
//!
//! [`RawStream`] / [`LabelStream`] are the simpler per-sample streams
//! consumed by the segment organizer, where alignment is by pointwise
//! timestamp equality instead of interval search.
use chrono::{Duration, NaiveDateTime};
use ndarray::{s, Array2};

use crate::label::secs_between;

/// The absolute-time interval actually covered by a returned slice.
pub type Interval = (NaiveDateTime, NaiveDateTime);

// ── RawSource ─────────────────────────────────────────────────────────────

/// One raw source file (or equivalent) addressable by absolute time.
pub trait RawSource {
    /// Sampling rate in Hz.
    fn sample_rate(&self) -> f64;

    /// Absolute time of the first sample.
    fn start(&self) -> NaiveDateTime;

    /// Absolute time just past the last sample.
    fn end(&self) -> NaiveDateTime;

    /// Fetch the slice covering `[start - front_lag_s, end + post_lag_s]`,
    /// clamped to what this source holds.
    ///
    /// Returns the `[channels, samples]` slice and the interval it
    /// actually covers, or `None` when the source holds no overlapping
    /// samples at all.
    fn find_interval(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
        front_lag_s: f64,
        post_lag_s: f64,
    ) -> Option<(Array2<f64>, Interval)>;
}

// ── MemorySource ──────────────────────────────────────────────────────────

/// A raw recording held in memory: first-sample time + rate + `[C, T]`.
#[derive(Debug, Clone)]
pub struct MemorySource {
    start: NaiveDateTime,
    srate: f64,
    data: Array2<f64>,
}

impl MemorySource {
    pub fn new(start: NaiveDateTime, srate: f64, data: Array2<f64>) -> Self {
        Self { start, srate, data }
    }

    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    /// Absolute time of sample index `i`.
    fn time_at(&self, i: usize) -> NaiveDateTime {
        let us = (i as f64 / self.srate * 1e6).round() as i64;
        self.start + Duration::microseconds(us)
    }
}

impl RawSource for MemorySource {
    fn sample_rate(&self) -> f64 {
        self.srate
    }

    fn start(&self) -> NaiveDateTime {
        self.start
    }

    fn end(&self) -> NaiveDateTime {
        self.time_at(self.data.ncols())
    }

    fn find_interval(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
        front_lag_s: f64,
        post_lag_s: f64,
    ) -> Option<(Array2<f64>, Interval)> {
        let want_start = start - Duration::microseconds((front_lag_s * 1e6).round() as i64);
        let want_end = end + Duration::microseconds((post_lag_s * 1e6).round() as i64);
        if want_end <= self.start() || want_start >= self.end() {
            return None;
        }

        let lo = want_start.max(self.start());
        let hi = want_end.min(self.end());
        // Snap to the sample grid; the epsilon absorbs float rounding in
        // the seconds→samples conversion.
        let i0 = ((secs_between(self.start, lo) * self.srate + 1e-6).floor() as usize)
            .min(self.data.ncols());
        let i1 = ((secs_between(self.start, hi) * self.srate - 1e-6).ceil() as usize)
            .min(self.data.ncols());
        if i0 >= i1 {
            return None;
        }

        let slice = self.data.slice(s![.., i0..i1]).to_owned();
        Some((slice, (self.time_at(i0), self.time_at(i1))))
    }
}

// ── Per-sample streams ────────────────────────────────────────────────────

/// A raw multichannel stream with one timestamp per sample.
#[derive(Debug, Clone)]
pub struct RawStream<T> {
    pub srate: f64,
    pub timestamps: Vec<T>,
    /// `[channels, samples]`; one column per timestamp.
    pub data: Array2<f64>,
}

/// A label stream aligned sample-for-sample with a [`RawStream`].
#[derive(Debug, Clone)]
pub struct LabelStream<T> {
    pub timestamps: Vec<T>,
    /// `[classes, samples]` stimulus indicator array.
    pub stimuli: Array2<f64>,
    /// Name of each stimulus class row.
    pub classes: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn t0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2019, 10, 9)
            .unwrap()
            .and_hms_opt(15, 0, 0)
            .unwrap()
    }

    fn ramp_source(start_offset_s: i64, n_samples: usize, srate: f64) -> MemorySource {
        let data = Array2::from_shape_fn((2, n_samples), |(c, t)| (c * 1000 + t) as f64);
        MemorySource::new(t0() + Duration::seconds(start_offset_s), srate, data)
    }

    #[test]
    fn covered_span() {
        let src = ramp_source(0, 100, 10.0);
        assert_eq!(src.start(), t0());
        assert_eq!(src.end(), t0() + Duration::seconds(10));
    }

    #[test]
    fn full_containment_includes_lags() {
        let src = ramp_source(0, 100, 10.0);
        // Label [2 s, 4 s] with 1 s lags → [1 s, 5 s] → 40 samples.
        let (data, iv) = src
            .find_interval(
                t0() + Duration::seconds(2),
                t0() + Duration::seconds(4),
                1.0,
                1.0,
            )
            .unwrap();
        assert_eq!(data.ncols(), 40);
        assert_eq!(data[[0, 0]], 10.0); // sample at 1 s
        assert_eq!(iv.0, t0() + Duration::seconds(1));
        assert_eq!(iv.1, t0() + Duration::seconds(5));
    }

    #[test]
    fn clamped_at_source_end() {
        let src = ramp_source(0, 100, 10.0);
        // Label tail extends past the 10 s of data held.
        let (data, iv) = src
            .find_interval(
                t0() + Duration::seconds(8),
                t0() + Duration::seconds(12),
                1.0,
                1.0,
            )
            .unwrap();
        assert_eq!(data.ncols(), 30); // [7 s, 10 s]
        assert_eq!(iv.1, src.end());
    }

    #[test]
    fn disjoint_interval_is_none() {
        let src = ramp_source(0, 100, 10.0);
        assert!(src
            .find_interval(
                t0() + Duration::seconds(20),
                t0() + Duration::seconds(25),
                1.0,
                1.0,
            )
            .is_none());
    }
}
