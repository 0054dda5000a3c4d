//! Data records and the operation log.
//!
//! A [`DataRecord`] pairs one data segment with its per-sample stimulus
//! segment and the provenance of every processing step applied so far.
//! Records are value objects: the organizers copy arrays before
//! constructing one, and nothing mutates a record after creation.
use ndarray::Array2;
use serde::{Deserialize, Serialize};

// ── Operation log ─────────────────────────────────────────────────────────

/// A processing step applied to a data segment.
///
/// The crate does not implement any of these transforms; it only records
/// that they happened so downstream analysis can trace provenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    Resample,
    HighPass,
    LowPass,
    BandPass,
    Transform,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Resample => "resample",
            Operation::HighPass => "highPass",
            Operation::LowPass => "lowPass",
            Operation::BandPass => "bandPass",
            Operation::Transform => "transform",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One applied transform: which channel, which operation, which parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpEntry {
    pub channel: String,
    pub op: Operation,
    pub params: Vec<f64>,
}

/// Ordered log of applied transforms.
///
/// Always an explicit value handed into each [`DataRecord`] at
/// construction, never ambient state shared behind the caller's back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpLog(Vec<OpEntry>);

impl OpLog {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, channel: &str, op: Operation, params: Vec<f64>) {
        self.0.push(OpEntry {
            channel: channel.to_string(),
            op,
            params,
        });
    }

    pub fn entries(&self) -> &[OpEntry] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ── DataRecord ────────────────────────────────────────────────────────────

/// One data segment with its aligned stimulus segment.
///
/// * `data`    — `[channels, samples]`.
/// * `stimuli` — `[classes, samples]`, aligned sample-for-sample with
///   `data`: `data.ncols() == stimuli.ncols()`.
/// * `stimuli_des` — name of each stimulus class row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataRecord {
    pub data: Array2<f64>,
    pub stimuli: Array2<f64>,
    pub stimuli_des: Vec<String>,
    pub srate: f64,
    pub op_log: OpLog,
}

impl DataRecord {
    /// Build a record with an empty operation log.
    pub fn new(
        data: Array2<f64>,
        stimuli: Array2<f64>,
        stimuli_des: Vec<String>,
        srate: f64,
    ) -> Self {
        Self::with_log(data, stimuli, stimuli_des, srate, OpLog::new())
    }

    /// Build a record carrying the operations accumulated so far.
    pub fn with_log(
        data: Array2<f64>,
        stimuli: Array2<f64>,
        stimuli_des: Vec<String>,
        srate: f64,
        op_log: OpLog,
    ) -> Self {
        debug_assert_eq!(
            data.ncols(),
            stimuli.ncols(),
            "data and stimuli must have the same sample count"
        );
        Self {
            data,
            stimuli,
            stimuli_des,
            srate,
            op_log,
        }
    }

    /// Number of samples along the time axis.
    #[inline]
    pub fn n_samples(&self) -> usize {
        self.data.ncols()
    }

    /// Number of data channels.
    #[inline]
    pub fn n_channels(&self) -> usize {
        self.data.nrows()
    }

    /// Segment duration in seconds.
    #[inline]
    pub fn duration_secs(&self) -> f64 {
        self.n_samples() as f64 / self.srate
    }
}
