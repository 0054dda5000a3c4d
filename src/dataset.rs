//! Named, ordered collections of [`DataRecord`]s with binary persistence.
//!
//! A dataset serializes as one Postcard-encoded file holding the whole
//! object graph (`name` + every record). Save-then-load reproduces every
//! field bit-exactly.
//!
//! Writes are not atomic (no temp-file-then-rename): a crash mid-write can
//! leave a corrupt file behind. Acceptable for offline batch processing;
//! a corrupt file fails on load with [`Error::Deserialize`].
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::record::DataRecord;

/// Named ordered list of data records.
///
/// No invariant links the records: each segment is independent, and
/// [`DataSet::append`] performs no cross-record validation (that is the
/// organizers' job).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataSet {
    pub name: String,
    pub records: Vec<DataRecord>,
}

impl DataSet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            records: Vec::new(),
        }
    }

    /// Append a record to the ordered list.
    pub fn append(&mut self, record: DataRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Serialize the whole dataset to `<folder>/<stem>.bin`.
    ///
    /// The file stem comes from `name` if given, otherwise from
    /// `self.name` with path-unsafe characters replaced by `_`.
    /// The folder is created if missing. Returns the written path.
    pub fn save(&self, folder: &Path, name: Option<&str>) -> Result<PathBuf> {
        fs::create_dir_all(folder)?;
        let stem = match name {
            Some(n) => n.to_string(),
            None => sanitize_stem(&self.name),
        };
        let path = folder.join(format!("{stem}.bin"));
        let bytes = postcard::to_allocvec(self).map_err(|e| Error::Serialize {
            detail: e.to_string(),
        })?;
        fs::write(&path, bytes)?;
        Ok(path)
    }

    /// Deserialize a dataset previously written by [`DataSet::save`].
    pub fn load_from(file: &Path) -> Result<Self> {
        let bytes = fs::read(file)?;
        postcard::from_bytes(&bytes).map_err(|e| Error::Deserialize {
            what: file.display().to_string(),
            detail: e.to_string(),
        })
    }
}

/// Replace characters that are unsafe in file names.
fn sanitize_stem(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            ':' | '/' | '\\' | ' ' => '_',
            other => other,
        })
        .collect()
}
