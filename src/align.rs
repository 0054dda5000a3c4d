//! Label-driven organization of raw recordings.
//!
//! [`LabelOrganizer`] maps labels to raw data payloads. Payloads are
//! filled by searching a list of raw sources by absolute time
//! ([`LabelOrganizer::assign_target_data`]), merging continuations when a
//! label's span is fragmented across several source files, and the result
//! is cut into fixed-length epochs
//! ([`LabelOrganizer::get_epoch_dataset`]).
//!
//! Missing data is a recoverable, per-label condition here: a label whose
//! span exists in no source is dropped (logged), a label only partially
//! covered keeps the truncated payload (logged). Everything else in this
//! crate fails fast instead.
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use log::{debug, warn};
use ndarray::{concatenate, s, Array2, Axis};

use crate::dataset::DataSet;
use crate::error::{Error, Result};
use crate::interchange::{self, LabelFileRecord};
use crate::label::{Label, LabelBundle, LabelId};
use crate::record::{DataRecord, OpLog, Operation};
use crate::source::RawSource;

/// Slim identity key for the label→id table.
///
/// Mirrors [`Label`] equality (name + span + ordinal) without holding the
/// stimulus track, so the table stays cheap to clone into.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct LabelKey {
    name: String,
    ordinal: usize,
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl From<&Label> for LabelKey {
    fn from(label: &Label) -> Self {
        Self {
            name: label.name.clone(),
            ordinal: label.ordinal,
            start: label.start,
            end: label.end,
        }
    }
}

/// Maps labels to raw data payloads and segments them into epoch datasets.
pub struct LabelOrganizer {
    /// Insertion-ordered labels with their stable ids.
    labels: Vec<(LabelId, Label)>,
    /// Identity → id table; ids are never reused.
    ids: HashMap<LabelKey, LabelId>,
    /// Assigned payloads, `[channels, samples]`. Absent entry = empty
    /// placeholder (not yet assigned, or dropped).
    payloads: HashMap<LabelId, Array2<f64>>,
    /// Type tag taken from the last added bundle (or the first label
    /// file on import).
    kind: String,
    srate: f64,
    channels: Vec<String>,
    /// Operations applied so far, shared across all channels; each
    /// produced record receives a clone.
    op_log: OpLog,
    next_id: u32,
}

impl LabelOrganizer {
    pub fn new(srate: f64, channels: Vec<String>) -> Self {
        Self {
            labels: Vec::new(),
            ids: HashMap::new(),
            payloads: HashMap::new(),
            kind: String::new(),
            srate,
            channels,
            op_log: OpLog::new(),
            next_id: 0,
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn srate(&self) -> f64 {
        self.srate
    }

    pub fn channels(&self) -> &[String] {
        &self.channels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = &Label> + '_ {
        self.labels.iter().map(|(_, l)| l)
    }

    /// Stable id of a label previously added, by identity.
    pub fn id_of(&self, label: &Label) -> Option<LabelId> {
        self.ids.get(&LabelKey::from(label)).copied()
    }

    /// The payload currently assigned to a label, if any.
    pub fn payload(&self, label: &Label) -> Option<&Array2<f64>> {
        self.id_of(label).and_then(|id| self.payloads.get(&id))
    }

    /// Record one applied transform in the shared operation log.
    pub fn log_op(&mut self, channel: &str, op: Operation, params: Vec<f64>) {
        self.op_log.push(channel, op, params);
    }

    pub fn op_log(&self) -> &OpLog {
        &self.op_log
    }

    /// Add every label of a bundle with an empty placeholder payload.
    ///
    /// Promotes the bundle's timestamps to absolute form first if that
    /// has not happened yet, and adopts the bundle's type tag. Insertion
    /// order is preserved; re-adding a label that is already present
    /// resets its payload to the empty placeholder.
    pub fn add_labels(&mut self, bundle: &mut LabelBundle) {
        if !bundle.is_promoted() {
            bundle.enhance_timestamps();
        }
        self.kind = bundle.kind.clone();
        for label in &bundle.labels {
            let id = self.insert_label(label.clone());
            self.payloads.remove(&id);
        }
    }

    fn insert_label(&mut self, label: Label) -> LabelId {
        let key = LabelKey::from(&label);
        if let Some(id) = self.ids.get(&key) {
            return *id;
        }
        let id = LabelId(self.next_id);
        self.next_id += 1;
        self.ids.insert(key, id);
        self.labels.push((id, label));
        id
    }

    /// Fill every label's payload from a list of raw sources, searched by
    /// absolute time.
    ///
    /// `front_lag_s` / `post_lag_s` widen each label's span before the
    /// lookup. The source cursor persists across labels and never moves
    /// backward (sources and labels are both in time order), except that
    /// a label found in no source restores the cursor to where that
    /// label's search began.
    ///
    /// Matching per label:
    /// * the covering source is found → the slice is assigned;
    /// * a source covers only the head of the span → continuations are
    ///   merged from as many subsequent sources as contribute, until the
    ///   span is covered or the sources run dry (truncated payload kept,
    ///   logged);
    /// * no source holds anything → the label is dropped (logged).
    ///
    /// Dropped labels are removed in one batch after the full pass.
    pub fn assign_target_data<S: RawSource>(
        &mut self,
        sources: &[S],
        front_lag_s: f64,
        post_lag_s: f64,
    ) {
        let labels = &self.labels;
        let payloads = &mut self.payloads;
        let mut cursor = 0usize;
        let mut lost: Vec<LabelId> = Vec::new();

        for (id, label) in labels {
            let cursor_hist = cursor;
            let mut found = None;
            while cursor < sources.len() {
                if let Some(hit) =
                    sources[cursor].find_interval(label.start, label.end, front_lag_s, post_lag_s)
                {
                    found = Some(hit);
                    break;
                }
                cursor += 1;
            }
            let Some((mut data, mut interval)) = found else {
                warn!(
                    "total data lost: data between {} and {} is not found in any source file",
                    label.start, label.end
                );
                lost.push(*id);
                cursor = cursor_hist;
                continue;
            };

            // Merge continuations while the tail of the span is uncovered.
            while interval.1 < label.end {
                let next = sources.get(cursor + 1).and_then(|s| {
                    s.find_interval(label.start, label.end, front_lag_s, post_lag_s)
                });
                match next {
                    Some((more, iv)) => {
                        match concatenate(Axis(1), &[data.view(), more.view()]) {
                            Ok(joined) => data = joined,
                            Err(e) => {
                                warn!("cannot merge continuation for label '{}': {e}", label.name);
                                break;
                            }
                        }
                        interval.1 = iv.1;
                        cursor += 1;
                    }
                    None => {
                        warn!(
                            "part of the data lost: data between {} and {} is not found in the source files",
                            interval.1, label.end
                        );
                        break;
                    }
                }
            }
            if interval.0 > label.start {
                warn!(
                    "part of the data lost: data between {} and {} is not found in the source files",
                    label.start, interval.0
                );
            }
            payloads.insert(*id, data);
        }

        if !lost.is_empty() {
            self.labels.retain(|(id, _)| !lost.contains(id));
            self.ids.retain(|_, id| !lost.contains(id));
            for id in &lost {
                self.payloads.remove(id);
            }
        }
    }

    /// Cut every assigned payload into fixed-length epochs.
    ///
    /// Per label: `num = round(duration / epoch_len_s)` chunks of
    /// `epoch_len_s * srate` samples (integer-truncated), each paired
    /// with the matching equal-length segment of the label's stimulus
    /// track. Chunk bounds are clamped to the assigned data; a chunk
    /// starting past the data, or clamping short of the full epoch
    /// length, is dropped (debug-logged) so every record keeps its
    /// data/stimuli alignment. Labels without an assigned payload are
    /// skipped; a label without a stimulus track is an error.
    ///
    /// Every produced record carries a copy of the operation log
    /// accumulated so far.
    pub fn get_epoch_dataset(&self, epoch_len_s: f64) -> Result<DataSet> {
        let (_, first_label) = self
            .labels
            .first()
            .ok_or_else(|| Error::MissingKey("organizer holds no labels".into()))?;
        let mut set = DataSet::new(format!("{}{}", self.kind, first_label.start));

        let seg_len = (epoch_len_s * self.srate) as usize;
        for (id, label) in &self.labels {
            let Some(data) = self.payloads.get(id) else {
                continue;
            };
            let track = label.stimulus.as_ref().ok_or_else(|| {
                Error::MissingKey(format!("label '{}' has no stimulus track", label.name))
            })?;
            let num = (label.duration_s() / epoch_len_s).round() as usize;
            let segs = track.segments(seg_len, num);
            let stimuli_des = vec![
                label.name.clone(),
                label.other_names.first().cloned().unwrap_or_default(),
            ];

            let n_t = data.ncols();
            for (i, stim) in segs.iter().enumerate() {
                let start = (i as f64 * epoch_len_s * self.srate) as usize;
                let end = ((i + 1) as f64 * epoch_len_s * self.srate) as usize;
                if start >= n_t {
                    debug!(
                        "label '{}': epoch {i} starts past the assigned data, dropped",
                        label.name
                    );
                    break;
                }
                let end = end.min(n_t);
                if end - start < seg_len {
                    debug!(
                        "label '{}': short final epoch ({} of {seg_len} samples) dropped",
                        label.name,
                        end - start
                    );
                    continue;
                }
                set.append(DataRecord::with_log(
                    data.slice(s![.., start..end]).to_owned(),
                    stim.clone(),
                    stimuli_des.clone(),
                    self.srate,
                    self.op_log.clone(),
                ));
            }
        }
        Ok(set)
    }

    /// Export every label with its payload as one structured record file
    /// per label. Returns the written paths.
    pub fn save_label_files(&self, folder: &Path) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(folder)?;
        let mut paths = Vec::with_capacity(self.labels.len());
        for (id, label) in &self.labels {
            let record = LabelFileRecord::from_parts(
                label,
                self.payloads.get(id),
                &self.channels,
                &self.kind,
                self.srate,
            );
            paths.push(interchange::write_label_file(folder, &record)?);
        }
        Ok(paths)
    }

    /// Import labels and payloads from structured record files.
    ///
    /// The first file fixes the channel list, type tag, and sampling rate
    /// for the whole organizer (the files of one export all agree).
    pub fn read_label_files(&mut self, files: &[PathBuf]) -> Result<()> {
        for (idx, file) in files.iter().enumerate() {
            let rec = interchange::read_label_file(file)?;
            if idx == 0 {
                self.channels = rec.channel_list.clone();
                self.kind = rec.kind.clone();
                self.srate = rec.sampling_rate;
            }
            let (start, end) = rec.time_span()?;
            let mut label = Label::new(rec.label_name.clone(), idx, start, end);
            label.other_names = rec.other_label_names.clone();
            label.kind = rec.kind.clone();
            let payload = rec.payload()?;
            let id = self.insert_label(label);
            if let Some(data) = payload {
                self.payloads.insert(id, data);
            }
        }
        Ok(())
    }
}
