//! Labels: named, time-bounded markers that align raw recordings with
//! stimulus metadata.
//!
//! A [`Label`]'s identity is its name + absolute time span + ordinal
//! index; equality and hashing ignore everything else (aliases, type tag,
//! attached stimulus). Organizers key their payload tables on an explicit
//! [`LabelId`] assigned at insertion rather than on the full label value.
use chrono::{Days, NaiveDate, NaiveDateTime};
use ndarray::{s, Array2};
use serde::{Deserialize, Serialize};

// ── Label identity ────────────────────────────────────────────────────────

/// Stable identifier assigned by an organizer when a label is inserted.
///
/// Monotonically increasing per organizer; never reused, even after a
/// label is dropped for missing data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LabelId(pub u32);

/// A named marker spanning `[start, end]` in absolute time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    /// Position of this label within its source bundle.
    pub ordinal: usize,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    /// Aliases for the label name.
    pub other_names: Vec<String>,
    /// Type tag of the bundle this label came from.
    pub kind: String,
    /// Stimulus stream associated with this label, if any.
    pub stimulus: Option<StimulusTrack>,
}

impl Label {
    pub fn new(
        name: impl Into<String>,
        ordinal: usize,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Self {
        Self {
            name: name.into(),
            ordinal,
            start,
            end,
            other_names: Vec::new(),
            kind: String::new(),
            stimulus: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.other_names.push(alias.into());
        self
    }

    pub fn with_stimulus(mut self, stimulus: StimulusTrack) -> Self {
        self.stimulus = Some(stimulus);
        self
    }

    /// Label span in seconds.
    pub fn duration_s(&self) -> f64 {
        secs_between(self.start, self.end)
    }
}

// Identity = name + time span + ordinal. Payloads and stimuli never
// participate in equality or hashing.
impl PartialEq for Label {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.ordinal == other.ordinal
            && self.start == other.start
            && self.end == other.end
    }
}

impl Eq for Label {}

impl std::hash::Hash for Label {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.ordinal.hash(state);
        self.start.hash(state);
        self.end.hash(state);
    }
}

/// Seconds from `a` to `b`, microsecond resolution.
pub(crate) fn secs_between(a: NaiveDateTime, b: NaiveDateTime) -> f64 {
    let delta = b - a;
    match delta.num_microseconds() {
        Some(us) => us as f64 / 1e6,
        None => delta.num_seconds() as f64,
    }
}

// ── LabelBundle ───────────────────────────────────────────────────────────

/// A label stream as handed over by ingestion code.
///
/// Ingestion may produce labels whose timestamps carry only a time of day
/// (on a placeholder date). [`LabelBundle::enhance_timestamps`] promotes
/// them to absolute datetimes on the bundle's recording date, exactly
/// once; crossing midnight advances the date.
#[derive(Debug, Clone)]
pub struct LabelBundle {
    pub labels: Vec<Label>,
    /// Type tag applied to every label (e.g. `"auditory"`).
    pub kind: String,
    /// Recording date the clock times belong to.
    pub date: NaiveDate,
    promoted: bool,
}

impl LabelBundle {
    pub fn new(kind: impl Into<String>, date: NaiveDate, labels: Vec<Label>) -> Self {
        Self {
            labels,
            kind: kind.into(),
            date,
            promoted: false,
        }
    }

    /// Build a bundle whose timestamps are already absolute.
    pub fn promoted(kind: impl Into<String>, date: NaiveDate, labels: Vec<Label>) -> Self {
        Self {
            labels,
            kind: kind.into(),
            date,
            promoted: true,
        }
    }

    pub fn is_promoted(&self) -> bool {
        self.promoted
    }

    /// Rebase every label's clock time onto the recording date.
    ///
    /// Times are assumed non-decreasing across the bundle; a drop in time
    /// of day means the recording crossed midnight and the date advances.
    /// Calling this on an already promoted bundle is a no-op.
    pub fn enhance_timestamps(&mut self) {
        if self.promoted {
            return;
        }
        let mut date = self.date;
        let mut prev = None;
        for label in &mut self.labels {
            for ts in [&mut label.start, &mut label.end] {
                let time = ts.time();
                if let Some(p) = prev {
                    if time < p {
                        date = date.checked_add_days(Days::new(1)).unwrap_or(date);
                    }
                }
                prev = Some(time);
                *ts = date.and_time(time);
            }
            label.kind = self.kind.clone();
        }
        self.promoted = true;
    }
}

// ── StimulusTrack ─────────────────────────────────────────────────────────

/// The stimulus stream associated with one label.
///
/// `data` is `[classes, samples]` at the organizer's sample rate; `classes`
/// names each row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StimulusTrack {
    pub classes: Vec<String>,
    pub data: Array2<f64>,
}

impl StimulusTrack {
    pub fn new(classes: Vec<String>, data: Array2<f64>) -> Self {
        Self { classes, data }
    }

    /// Cut up to `n` consecutive column chunks of exactly `seg_len`
    /// samples each. Stops early when the track runs out of full chunks.
    pub fn segments(&self, seg_len: usize, n: usize) -> Vec<Array2<f64>> {
        if seg_len == 0 {
            return Vec::new();
        }
        let total = self.data.ncols();
        (0..n)
            .map_while(|i| {
                let start = i * seg_len;
                let end = start + seg_len;
                (end <= total).then(|| self.data.slice(s![.., start..end]).to_owned())
            })
            .collect()
    }
}
