//! Per-label structured record files.
//!
//! One JSON document per label with a fixed field layout: `LabelName`,
//! `OtherLabelNames`, `Label` (main stimulus stream), `OtherLabel`
//! (secondary streams), `ChannelList`, `Type`, `SamplingRate`, `Time`
//! (two formatted timestamps), `Data` (the assigned payload).
//!
//! Timestamps use the fixed pattern `%Y-%m-%d %H-%M-%S%.6f` — dashes
//! instead of colons so the same strings are safe inside file names.
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::label::Label;

/// Timestamp pattern used in the `Time` field and in file names.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H-%M-%S%.6f";

// ── Array payload ─────────────────────────────────────────────────────────

/// A 2-D array flattened row-major with its shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayPayload {
    pub shape: [usize; 2],
    pub values: Vec<f64>,
}

impl ArrayPayload {
    pub fn from_array(arr: &Array2<f64>) -> Self {
        Self {
            shape: [arr.nrows(), arr.ncols()],
            values: arr.iter().copied().collect(),
        }
    }

    pub fn to_array(&self) -> Result<Array2<f64>> {
        Ok(Array2::from_shape_vec(
            (self.shape[0], self.shape[1]),
            self.values.clone(),
        )?)
    }
}

// ── Label file record ─────────────────────────────────────────────────────

/// The on-disk layout of one per-label record file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelFileRecord {
    #[serde(rename = "LabelName")]
    pub label_name: String,
    #[serde(rename = "OtherLabelNames", default)]
    pub other_label_names: Vec<String>,
    /// Main stimulus stream, when the label carries one.
    #[serde(rename = "Label", default)]
    pub label: Option<Vec<f64>>,
    /// Secondary stimulus streams.
    #[serde(rename = "OtherLabel", default)]
    pub other_label: Option<ArrayPayload>,
    #[serde(rename = "ChannelList")]
    pub channel_list: Vec<String>,
    #[serde(rename = "Type")]
    pub kind: String,
    #[serde(rename = "SamplingRate")]
    pub sampling_rate: f64,
    /// Start and end timestamps, formatted with [`TIME_FORMAT`].
    #[serde(rename = "Time")]
    pub time: [String; 2],
    /// Assigned raw data payload; `null` when none was assigned.
    #[serde(rename = "Data", default)]
    pub data: Option<ArrayPayload>,
}

impl LabelFileRecord {
    /// Assemble the record for one label and its (optional) payload.
    pub fn from_parts(
        label: &Label,
        payload: Option<&Array2<f64>>,
        channels: &[String],
        kind: &str,
        sampling_rate: f64,
    ) -> Self {
        let (main, other) = match &label.stimulus {
            Some(track) if track.data.nrows() > 0 => {
                let main = track.data.row(0).to_vec();
                let other = (track.data.nrows() > 1).then(|| {
                    ArrayPayload::from_array(
                        &track.data.slice(ndarray::s![1.., ..]).to_owned(),
                    )
                });
                (Some(main), other)
            }
            _ => (None, None),
        };
        Self {
            label_name: label.name.clone(),
            other_label_names: label.other_names.clone(),
            label: main,
            other_label: other,
            channel_list: channels.to_vec(),
            kind: kind.to_string(),
            sampling_rate,
            time: [
                label.start.format(TIME_FORMAT).to_string(),
                label.end.format(TIME_FORMAT).to_string(),
            ],
            data: payload.map(ArrayPayload::from_array),
        }
    }

    /// Parse the `Time` field back into absolute timestamps.
    pub fn time_span(&self) -> Result<(NaiveDateTime, NaiveDateTime)> {
        let parse = |s: &str| {
            NaiveDateTime::parse_from_str(s, TIME_FORMAT).map_err(|e| Error::Deserialize {
                what: format!("timestamp '{s}'"),
                detail: e.to_string(),
            })
        };
        Ok((parse(&self.time[0])?, parse(&self.time[1])?))
    }

    /// Reconstruct the assigned payload array, if the file holds one.
    pub fn payload(&self) -> Result<Option<Array2<f64>>> {
        self.data.as_ref().map(ArrayPayload::to_array).transpose()
    }

    /// `[<Type>]<start>_<end>_<LabelName>.json`, spaces replaced.
    pub fn file_name(&self) -> String {
        format!(
            "[{}]{}_{}_{}.json",
            self.kind, self.time[0], self.time[1], self.label_name
        )
        .replace(' ', "_")
    }
}

// ── File operations ───────────────────────────────────────────────────────

/// Write one label record into `folder`; the file name is derived from
/// the record. Returns the written path. Not atomic.
pub fn write_label_file(folder: &Path, record: &LabelFileRecord) -> Result<PathBuf> {
    let path = folder.join(record.file_name());
    let bytes = serde_json::to_vec_pretty(record).map_err(|e| Error::Serialize {
        detail: e.to_string(),
    })?;
    fs::write(&path, bytes)?;
    Ok(path)
}

/// Read one label record back.
pub fn read_label_file(path: &Path) -> Result<LabelFileRecord> {
    let bytes = fs::read(path)?;
    serde_json::from_slice(&bytes).map_err(|e| Error::Deserialize {
        what: path.display().to_string(),
        detail: e.to_string(),
    })
}
