/*!
 * Persisted translation progress.
 *
 * One small JSON record per input file, `<input>.progress.json`, holding the
 * count of chunks already flushed to the output sink. An absent or corrupt
 * record means "start over"; a failed save is logged and the run continues
 * in memory, at the cost of resumability after a crash.
 */

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};

/// Suffix appended to the input path to derive the progress file path
pub const PROGRESS_FILE_SUFFIX: &str = ".progress.json";

/// On-disk record format
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProgressRecord {
    /// Chunks durably flushed to the output sink, in order, starting from 0
    pub completed_chunks: usize,
}

/// Reads and writes the progress record for one input file
#[derive(Debug, Clone)]
pub struct ProgressStore {
    path: PathBuf,
}

impl ProgressStore {
    /// Store keyed by the input file: `<input>.progress.json`
    pub fn for_input(input_path: &Path) -> Self {
        let mut name = input_path.as_os_str().to_os_string();
        name.push(PROGRESS_FILE_SUFFIX);
        Self { path: PathBuf::from(name) }
    }

    /// Build a store over an explicit record path
    pub fn at_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// Path of the underlying record file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True if a record currently exists on disk
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Number of completed chunks, or 0 if the record is absent or unreadable.
    ///
    /// A corrupt record is never fatal: it is reported and treated as a fresh
    /// start.
    pub fn load(&self) -> usize {
        if !self.path.is_file() {
            return 0;
        }

        match fs::read_to_string(&self.path) {
            Ok(content) => match serde_json::from_str::<ProgressRecord>(&content) {
                Ok(record) => record.completed_chunks,
                Err(e) => {
                    warn!(
                        "Progress file {:?} is corrupt ({}), starting from scratch",
                        self.path, e
                    );
                    0
                }
            },
            Err(e) => {
                warn!("Could not read progress file {:?} ({}), starting from scratch", self.path, e);
                0
            }
        }
    }

    /// Overwrite the record with the new completed-chunk count.
    ///
    /// Written atomically via a temp file in the same directory so a crash
    /// mid-save never leaves a truncated record behind.
    pub fn save(&self, completed_chunks: usize) -> Result<()> {
        let record = ProgressRecord { completed_chunks };
        let payload = serde_json::to_string(&record)
            .context("Failed to serialize progress record")?;

        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .with_context(|| format!("Failed to create temp file next to {:?}", self.path))?;
        tmp.write_all(payload.as_bytes())
            .context("Failed to write progress record")?;
        tmp.persist(&self.path)
            .with_context(|| format!("Failed to persist progress file {:?}", self.path))?;

        Ok(())
    }

    /// Remove the record; called only once every chunk has been flushed
    pub fn clear(&self) -> Result<()> {
        if self.path.is_file() {
            fs::remove_file(&self.path)
                .with_context(|| format!("Failed to remove progress file {:?}", self.path))?;
        }
        Ok(())
    }
}
