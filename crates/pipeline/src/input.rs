//! Reading import input from disk.
//!
//! An input path is either a single JSON file or a directory whose `*.json`
//! files are each read as one source batch. Only an input path that cannot be
//! opened fails the load; a file that cannot be read or parsed, and an element
//! that is not a valid record, are carried in the batch for the runner to
//! report.

use std::path::{Path, PathBuf};

use gigboard_core::raw_event::{parse_record_entries, MalformedRecord, RawEventRecord};

use crate::error::PipelineError;

/// Records read from one input file.
#[derive(Debug, Clone)]
pub struct SourceBatch {
    /// Where the records came from, for reports and logs.
    pub origin: Option<String>,
    /// One entry per element, in file order.
    pub entries: Vec<Result<RawEventRecord, MalformedRecord>>,
    /// Why the file as a whole could not be read.
    pub failure: Option<String>,
}

impl SourceBatch {
    pub fn from_records(origin: Option<String>, records: Vec<RawEventRecord>) -> Self {
        Self {
            origin,
            entries: records.into_iter().map(Ok).collect(),
            failure: None,
        }
    }

    fn unreadable(origin: Option<String>, failure: String) -> Self {
        Self {
            origin,
            entries: Vec::new(),
            failure: Some(failure),
        }
    }

    /// Number of elements read, valid or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Load every batch under `path`, in file-name order.
pub fn load_input(path: &Path) -> Result<Vec<SourceBatch>, PipelineError> {
    let metadata = std::fs::metadata(path).map_err(|source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    if !metadata.is_dir() {
        return Ok(vec![load_file(path)]);
    }

    let mut files: Vec<PathBuf> = std::fs::read_dir(path)
        .map_err(|source| PipelineError::Io {
            path: path.to_path_buf(),
            source,
        })?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();

    Ok(files.iter().map(|file| load_file(file)).collect())
}

fn load_file(path: &Path) -> SourceBatch {
    let origin = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned());

    let parsed = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {e}", path.display()))
        .and_then(|json| parse_record_entries(&json).map_err(|e| e.to_string()));

    match parsed {
        Ok(entries) => {
            let malformed = entries.iter().filter(|e| e.is_err()).count();
            tracing::debug!(
                path = %path.display(),
                records = entries.len(),
                malformed,
                "Read input file"
            );
            SourceBatch {
                origin,
                entries,
                failure: None,
            }
        }
        Err(failure) => {
            tracing::warn!(path = %path.display(), error = %failure, "Input file unreadable");
            SourceBatch::unreadable(origin, failure)
        }
    }
}
