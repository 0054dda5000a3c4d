//! # neuroepoch — organize EEG recordings into epoch datasets
//!
//! `neuroepoch` matches raw multichannel time-series data to
//! stimulus/label streams by timestamp or absolute time, merges data
//! spanning multiple source files, and re-cuts continuous recordings into
//! fixed-length or condition-selected epochs for downstream analysis.
//!
//! ## Pipeline overview
//!
//! ```text
//! raw sources + label bundle
//!   │
//!   ├─ LabelOrganizer::add_labels          promote timestamps, register labels
//!   ├─ LabelOrganizer::assign_target_data  interval search & merge across files
//!   ├─ LabelOrganizer::get_epoch_dataset   fixed-length segmentation
//!   │
//!   │  — or, for per-sample timestamp streams —
//!   │
//!   ├─ SegmentOrganizer::insert            pointwise-aligned record store
//!   ├─ SegmentOrganizer::continuous_record sorted reconstruction
//!   ├─ SegmentOrganizer::dataset_by_stimulus  condition-selected runs
//!   │
//!   └─→ DataSet ── save / load_from        Postcard round trip
//! ```
//!
//! ## Quick start
//!
//! ```no_run
//! use chrono::NaiveDate;
//! use ndarray::Array2;
//! use neuroepoch::{Label, LabelBundle, LabelOrganizer, MemorySource, StimulusTrack};
//!
//! let date = NaiveDate::from_ymd_opt(2019, 10, 9).unwrap();
//! let start = date.and_hms_opt(15, 0, 0).unwrap();
//!
//! // One 60 s source file: 8 channels at 128 Hz.
//! let source = MemorySource::new(start, 128.0, Array2::zeros((8, 60 * 128)));
//!
//! // One 20 s label with its stimulus stream.
//! let label = Label::new("story", 0, start + chrono::Duration::seconds(5),
//!                        start + chrono::Duration::seconds(25))
//!     .with_stimulus(StimulusTrack::new(vec!["onset".into()],
//!                                       Array2::zeros((1, 20 * 128))));
//! let mut bundle = LabelBundle::promoted("audio", date, vec![label]);
//!
//! let channels = (1..=8).map(|i| format!("ch{i}")).collect();
//! let mut org = LabelOrganizer::new(128.0, channels);
//! org.add_labels(&mut bundle);
//! org.assign_target_data(&[source], 1.0, 1.0);
//!
//! // 4 epochs of 5 s each.
//! let set = org.get_epoch_dataset(5.0).unwrap();
//! set.save("out".as_ref(), None).unwrap();
//! ```
//!
//! Timestamp alignment and segmentation live in [`segment`] and
//! [`align`]; everything else (record/dataset containers, persistence,
//! the per-label interchange files) is thin glue around them.

pub mod align;
pub mod dataset;
pub mod error;
pub mod interchange;
pub mod label;
pub mod record;
pub mod segment;
pub mod source;

// ── Crate-root re-exports ─────────────────────────────────────────────────
//
// Everything a downstream user is likely to need is available directly as
// `neuroepoch::Foo` without having to know the internal module layout.

pub use align::LabelOrganizer;
pub use dataset::DataSet;
pub use error::{Error, Result};
pub use interchange::{read_label_file, write_label_file, ArrayPayload, LabelFileRecord};
pub use label::{Label, LabelBundle, LabelId, StimulusTrack};
pub use record::{DataRecord, OpEntry, OpLog, Operation};
pub use segment::SegmentOrganizer;
pub use source::{Interval, LabelStream, MemorySource, RawSource, RawStream};
