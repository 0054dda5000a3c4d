//! Crate-wide error type.
//!
//! One closed set of failure kinds: alignment validation failures
//! (sample-rate, timestamp, overlap), key lookups on absent records, and
//! the serialization failures of the persistence layer. Validation
//! failures abort the current operation with no partial result;
//! the only recoverable conditions (missing or partial raw data during
//! target assignment) are handled in [`crate::align`] by logging, not by
//! error returns.
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Raw stream sampled at a different rate than the organizer.
    #[error("sample rate mismatch: organizer at {expected} Hz, data at {actual} Hz")]
    SampleRateMismatch { expected: f64, actual: f64 },

    /// Label and raw streams diverge; reports the first divergent index
    /// and both values.
    #[error("timestamp mismatch at sample {index}: data has {data}, label has {label}")]
    TimestampMismatch {
        index: usize,
        data: String,
        label: String,
    },

    /// Two stored record ranges intersect in time.
    #[error("overlapping record ranges: {first} intersects {second}")]
    OverlappingRecords { first: String, second: String },

    /// Lookup on a key, stimulus class, or label that is not present.
    #[error("no entry for key: {0}")]
    MissingKey(String),

    /// Encoding a dataset or label file failed.
    #[error("serialization failed: {detail}")]
    Serialize { detail: String },

    /// A persisted file is corrupt, truncated, or of the wrong format.
    #[error("failed to deserialize {what}: {detail}")]
    Deserialize { what: String, detail: String },

    /// Array dimensions incompatible (e.g. channel counts differ across
    /// records being concatenated).
    #[error("array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
