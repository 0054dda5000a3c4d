/// Shared helpers for building synthetic recordings.
use chrono::{NaiveDate, NaiveDateTime};
use ndarray::Array2;
use neuroepoch::{Label, MemorySource, StimulusTrack};

#[allow(unused)]
pub const SRATE: f64 = 10.0;

#[allow(unused)]
pub fn t0() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2019, 10, 9)
        .unwrap()
        .and_hms_opt(15, 0, 0)
        .unwrap()
}

#[allow(unused)]
pub fn at(secs: i64) -> NaiveDateTime {
    t0() + chrono::Duration::seconds(secs)
}

#[allow(unused)]
/// `[C, T]` ramp whose value encodes channel and global sample index:
/// `value = channel * 1000 + offset + t`.
pub fn ramp(channels: usize, samples: usize, offset: f64) -> Array2<f64> {
    Array2::from_shape_fn((channels, samples), |(c, t)| {
        c as f64 * 1000.0 + offset + t as f64
    })
}

#[allow(unused)]
/// A 2-channel source covering `[start_s, start_s + seconds)` at [`SRATE`],
/// with values continuing the global ramp so merged slices are seamless.
pub fn source(start_s: i64, seconds: usize) -> MemorySource {
    let n = (seconds as f64 * SRATE) as usize;
    MemorySource::new(at(start_s), SRATE, ramp(2, n, start_s as f64 * SRATE))
}

#[allow(unused)]
pub fn label(name: &str, ordinal: usize, start_s: i64, end_s: i64) -> Label {
    Label::new(name, ordinal, at(start_s), at(end_s))
}

#[allow(unused)]
/// Label with a one-row stimulus track of `stim_samples` ramp values.
pub fn label_with_stimulus(
    name: &str,
    ordinal: usize,
    start_s: i64,
    end_s: i64,
    stim_samples: usize,
) -> Label {
    label(name, ordinal, start_s, end_s).with_stimulus(StimulusTrack::new(
        vec!["onset".into()],
        ramp(1, stim_samples, 0.0),
    ))
}

#[allow(unused)]
pub fn channels() -> Vec<String> {
    vec!["C3".into(), "C4".into()]
}
