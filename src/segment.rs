//! Timeline-keyed record store with condition-based re-segmentation.
//!
//! [`SegmentOrganizer`] indexes non-overlapping [`DataRecord`]s by their
//! (first, last) label timestamp. Records are validated against the
//! no-overlap invariant before any read that reconstructs continuous
//! data, and can be re-cut into a [`DataSet`] of maximal runs where one
//! stimulus row holds a selected value.
//!
//! The timestamp type is generic: sample counters, microsecond ticks, or
//! anything orderable. A custom comparator can be injected for timestamp
//! types whose natural order is not the timeline order.
use std::cmp::Ordering;
use std::fmt;

use ndarray::{concatenate, s, Axis};

use crate::dataset::DataSet;
use crate::error::{Error, Result};
use crate::record::DataRecord;
use crate::source::{LabelStream, RawStream};

/// Ordered store of non-overlapping records keyed by timestamp range.
pub struct SegmentOrganizer<T> {
    /// Insertion-ordered (key, record) pairs; keys are (first, last)
    /// label timestamps, ranges inclusive on both ends.
    records: Vec<((T, T), DataRecord)>,
    srate: f64,
    channels: Vec<String>,
    compare: Option<Box<dyn Fn(&T, &T) -> Ordering>>,
}

impl<T> SegmentOrganizer<T>
where
    T: Clone + PartialEq + PartialOrd + fmt::Debug,
{
    pub fn new(srate: f64, channels: Vec<String>) -> Self {
        Self {
            records: Vec::new(),
            srate,
            channels,
            compare: None,
        }
    }

    /// Inject a comparator for timestamp types whose natural order is not
    /// the timeline order.
    pub fn with_comparator(mut self, cmp: impl Fn(&T, &T) -> Ordering + 'static) -> Self {
        self.compare = Some(Box::new(cmp));
        self
    }

    pub fn srate(&self) -> f64 {
        self.srate
    }

    pub fn channels(&self) -> &[String] {
        &self.channels
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn cmp_t(&self, a: &T, b: &T) -> Ordering {
        match &self.compare {
            Some(f) => f(a, b),
            None => a.partial_cmp(b).unwrap_or(Ordering::Equal),
        }
    }

    fn cmp_key(&self, a: &(T, T), b: &(T, T)) -> Ordering {
        self.cmp_t(&a.0, &b.0).then_with(|| self.cmp_t(&a.1, &b.1))
    }

    /// Store one raw/label stream pair as a record.
    ///
    /// The label stream must be aligned sample-for-sample with the raw
    /// stream: same sampling rate, pointwise-equal timestamps over the
    /// label's span. Both arrays are copied, so the caller's originals
    /// may be freely mutated afterwards. On any mismatch the organizer
    /// is left untouched.
    ///
    /// The record key is the label's (first, last) timestamp; inserting
    /// under an existing key replaces the stored record (last insert
    /// wins).
    pub fn insert(&mut self, raw: &RawStream<T>, labels: &LabelStream<T>) -> Result<()> {
        if raw.srate != self.srate {
            return Err(Error::SampleRateMismatch {
                expected: self.srate,
                actual: raw.srate,
            });
        }
        let (Some(first), Some(last)) = (labels.timestamps.first(), labels.timestamps.last())
        else {
            return Err(Error::MissingKey("label stream has no timestamps".into()));
        };
        for (index, ts) in labels.timestamps.iter().enumerate() {
            match raw.timestamps.get(index) {
                Some(raw_ts) if raw_ts == ts => {}
                other => {
                    return Err(Error::TimestampMismatch {
                        index,
                        data: other.map_or_else(|| "<missing>".into(), |v| format!("{v:?}")),
                        label: format!("{ts:?}"),
                    });
                }
            }
        }

        let key = (first.clone(), last.clone());
        let record = DataRecord::new(
            raw.data.clone(),
            labels.stimuli.clone(),
            labels.classes.clone(),
            self.srate,
        );
        match self.records.iter().position(|entry| entry.0 == key) {
            Some(i) => self.records[i].1 = record,
            None => self.records.push((key, record)),
        }
        Ok(())
    }

    /// Look up the record stored under `key`.
    pub fn get(&self, key: &(T, T)) -> Result<&DataRecord> {
        self.records
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, rec)| rec)
            .ok_or_else(|| Error::MissingKey(format!("{key:?}")))
    }

    /// All keys in ascending timeline order.
    ///
    /// The `reverse` flag is accepted for call-site symmetry but has no
    /// effect: keys always come back ascending.
    pub fn sorted_keys(&self, _reverse: bool) -> Vec<(T, T)> {
        let mut keys: Vec<(T, T)> = self.records.iter().map(|(k, _)| k.clone()).collect();
        keys.sort_by(|a, b| self.cmp_key(a, b));
        keys
    }

    /// Check the structural invariant: no two stored ranges overlap.
    pub fn validate(&self) -> Result<()> {
        let keys = self.sorted_keys(false);
        for pair in keys.windows(2) {
            // Ranges are inclusive: the next range must start strictly
            // after the previous one ends.
            if self.cmp_t(&pair[1].0, &pair[0].1) != Ordering::Greater {
                return Err(Error::OverlappingRecords {
                    first: format!("{:?}", pair[0]),
                    second: format!("{:?}", pair[1]),
                });
            }
        }
        Ok(())
    }

    /// Concatenate every record into one continuous [`DataRecord`] in
    /// sorted-key order.
    ///
    /// Fails with [`Error::OverlappingRecords`] if the no-overlap
    /// invariant is violated, and with [`Error::MissingKey`] on an empty
    /// organizer. Stimulus description and sampling rate come from the
    /// first record.
    pub fn continuous_record(&self) -> Result<DataRecord> {
        self.validate()?;
        let keys = self.sorted_keys(false);
        let first_key = keys
            .first()
            .ok_or_else(|| Error::MissingKey("organizer holds no records".into()))?;

        let mut data_views = Vec::with_capacity(keys.len());
        let mut stim_views = Vec::with_capacity(keys.len());
        for key in &keys {
            let rec = self.get(key)?;
            data_views.push(rec.data.view());
            stim_views.push(rec.stimuli.view());
        }
        let data = concatenate(Axis(1), &data_views)?;
        let stimuli = concatenate(Axis(1), &stim_views)?;

        let template = self.get(first_key)?;
        Ok(DataRecord::new(
            data,
            stimuli,
            template.stimuli_des.clone(),
            template.srate,
        ))
    }

    /// Re-cut the stored records into a [`DataSet`] of maximal runs where
    /// the stimulus row named `label_class` equals `select_value`.
    ///
    /// A run opens at a rising edge (previous sample differs, current
    /// equals) and closes at a falling edge (previous equals, current
    /// differs); the falling-edge index is the exclusive end. A run still
    /// open at the last sample is never emitted. Also returns
    /// `select_value` repeated once per produced record.
    pub fn dataset_by_stimulus(
        &self,
        label_class: &str,
        select_value: f64,
    ) -> Result<(DataSet, Vec<f64>)> {
        self.validate()?;
        let mut set = DataSet::new(label_class);

        for ((_, _), rec) in &self.records {
            let row = rec
                .stimuli_des
                .iter()
                .position(|c| c == label_class)
                .ok_or_else(|| {
                    Error::MissingKey(format!("stimulus class '{label_class}' not in record"))
                })?;
            let stim_row = rec.stimuli.row(row);
            let n = stim_row.len();

            let mut start_idx = 0usize;
            let mut idx = 0usize;
            while idx + 1 < n {
                let prev = stim_row[idx];
                let curr = stim_row[idx + 1];
                if prev != select_value && curr == select_value {
                    start_idx = idx + 1;
                }
                if prev == select_value && curr != select_value {
                    let end_idx = idx + 1;
                    set.append(DataRecord::new(
                        rec.data.slice(s![.., start_idx..end_idx]).to_owned(),
                        rec.stimuli.slice(s![.., start_idx..end_idx]).to_owned(),
                        rec.stimuli_des.clone(),
                        rec.srate,
                    ));
                    start_idx = 0;
                }
                idx += 1;
            }
        }

        let events = vec![select_value; set.len()];
        Ok((set, events))
    }
}
