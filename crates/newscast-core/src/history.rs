//! Bounded script history log.
//!
//! Each bulletin run appends one record to a JSON file; only the most recent
//! [`MAX_HISTORY_ENTRIES`] records are retained. The log is a convenience for
//! operators, not a durable store.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::digest::NewsDigest;
use crate::text::preview_snippet;
use crate::time::{beijing_now, format_date_cn};

/// Number of records retained in the history file.
pub const MAX_HISTORY_ENTRIES: usize = 30;

const PREVIEW_CHARS: usize = 200;

/// Errors that can occur during history operations.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One recorded bulletin run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<FixedOffset>,
    pub date: String,
    pub time: String,
    pub word_count: usize,
    pub keyword_groups: usize,
    pub total_titles: u64,
    pub file_path: String,
    pub preview: String,
}

/// Rolling history of generated scripts backed by a single JSON file.
pub struct ScriptHistory {
    path: PathBuf,
}

impl ScriptHistory {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Append a record for a finished script, trimming to the retention cap.
    pub fn record(
        &self,
        script: &str,
        script_path: &Path,
        digest: &NewsDigest,
    ) -> Result<(), HistoryError> {
        let now = beijing_now();
        let entry = HistoryEntry {
            timestamp: now,
            date: format_date_cn(&now),
            time: now.format("%H:%M:%S").to_string(),
            word_count: script.chars().count(),
            keyword_groups: digest.stats.len(),
            total_titles: digest.total_titles(),
            file_path: script_path.display().to_string(),
            preview: preview_snippet(script, PREVIEW_CHARS),
        };

        let mut entries = self.entries()?;
        entries.push(entry);
        if entries.len() > MAX_HISTORY_ENTRIES {
            entries.drain(..entries.len() - MAX_HISTORY_ENTRIES);
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        // Write through a temp file so a crash never leaves a corrupt log.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(&entries)?)?;
        fs::rename(&tmp, &self.path)?;

        info!(path = %self.path.display(), entries = entries.len(), "script history updated");
        Ok(())
    }

    /// All retained records, oldest first. An absent file is an empty history.
    pub fn entries(&self) -> Result<Vec<HistoryEntry>, HistoryError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// The most recent `limit` records, newest first.
    pub fn recent(&self, limit: usize) -> Result<Vec<HistoryEntry>, HistoryError> {
        let mut entries = self.entries()?;
        entries.reverse();
        entries.truncate(limit);
        Ok(entries)
    }
}
