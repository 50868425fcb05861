/*!
 * Subtitle entry model and file export.
 *
 * Entries carry times as `f64` seconds; only the SRT formatting converts to
 * milliseconds. Exports are atomic: content is written to a temp file in the
 * target directory and persisted into place on success.
 */

use anyhow::{anyhow, Context, Result};
use log::debug;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

use crate::errors::ExportError;

// @struct: Single display cue
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleEntry {
    // @field: Start time in seconds
    pub start: f64,

    // @field: End time in seconds
    pub end: f64,

    // @field: Colloquial display text, always present
    pub colloquial: String,

    // @field: Formal variant, present when a written register was requested
    pub formal: Option<String>,
}

impl SubtitleEntry {
    /// Creates a new subtitle entry without validation.
    pub fn new(start: f64, end: f64, colloquial: String, formal: Option<String>) -> Self {
        SubtitleEntry {
            start,
            end,
            colloquial,
            formal,
        }
    }

    // @creates: Validated subtitle entry
    // @validates: Time range and non-empty text
    pub fn new_validated(
        start: f64,
        end: f64,
        colloquial: String,
        formal: Option<String>,
    ) -> Result<Self> {
        if end <= start || !start.is_finite() || !end.is_finite() {
            return Err(anyhow!(
                "Invalid time range: end time {} <= start time {}",
                end,
                start
            ));
        }

        let trimmed = colloquial.trim();
        if trimmed.is_empty() {
            return Err(anyhow!("Empty subtitle text at {:.3}s", start));
        }

        Ok(SubtitleEntry {
            start,
            end,
            colloquial: trimmed.to_string(),
            formal,
        })
    }

    /// Entry duration in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Parse an SRT timestamp (HH:MM:SS,mmm) to seconds.
    pub fn parse_timestamp(timestamp: &str) -> Result<f64> {
        let parts: Vec<&str> = timestamp.split(&[':', ',', '.'][..]).collect();

        if parts.len() != 4 {
            return Err(anyhow!("Invalid timestamp format: {}", timestamp));
        }

        let hours: u64 = parts[0].parse().context("Failed to parse hours")?;
        let minutes: u64 = parts[1].parse().context("Failed to parse minutes")?;
        let seconds: u64 = parts[2].parse().context("Failed to parse seconds")?;
        let millis: u64 = parts[3].parse().context("Failed to parse milliseconds")?;

        if minutes >= 60 || seconds >= 60 || millis >= 1000 {
            return Err(anyhow!("Invalid time components in timestamp: {}", timestamp));
        }

        let total_ms = hours * 3_600_000 + minutes * 60_000 + seconds * 1_000 + millis;
        Ok(total_ms as f64 / 1000.0)
    }

    /// Format seconds as an SRT timestamp (HH:MM:SS,mmm).
    pub fn format_timestamp(seconds: f64) -> String {
        let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
        let hours = total_ms / 3_600_000;
        let minutes = (total_ms % 3_600_000) / 60_000;
        let secs = (total_ms % 60_000) / 1_000;
        let millis = total_ms % 1_000;

        format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
    }

    /// One SRT cue block: sequence, time range, colloquial line, then the
    /// formal line when present, and a blank separator.
    fn to_srt_block(&self, seq: usize) -> String {
        let mut block = format!(
            "{}\n{} --> {}\n{}\n",
            seq,
            Self::format_timestamp(self.start),
            Self::format_timestamp(self.end),
            self.colloquial
        );
        if let Some(formal) = &self.formal {
            block.push_str(formal);
            block.push('\n');
        }
        block.push('\n');
        block
    }
}

impl fmt::Display for SubtitleEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "[{:.2}s - {:.2}s] {}",
            self.start, self.end, self.colloquial
        )?;
        if let Some(formal) = &self.formal {
            write!(f, " / {}", formal)?;
        }
        Ok(())
    }
}

/// Ordered list of subtitle entries ready for export.
#[derive(Debug, Default, Clone)]
pub struct SubtitleCollection {
    /// List of subtitle entries
    pub entries: Vec<SubtitleEntry>,
}

impl SubtitleCollection {
    /// Create a collection from an ordered entry list.
    pub fn new(entries: Vec<SubtitleEntry>) -> Self {
        SubtitleCollection { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write the collection as an SRT file.
    pub fn write_to_srt<P: AsRef<Path>>(&self, path: P) -> Result<(), ExportError> {
        let path = path.as_ref();
        let mut contents = String::new();

        for (index, entry) in self.entries.iter().enumerate() {
            if !entry.start.is_finite() || !entry.end.is_finite() {
                return Err(ExportError::InvalidEntry(format!(
                    "Non-finite time range in entry {}",
                    index + 1
                )));
            }
            contents.push_str(&entry.to_srt_block(index + 1));
        }

        Self::atomic_write(path, &contents)?;
        debug!("Wrote {} SRT entries to {}", self.entries.len(), path.display());
        Ok(())
    }

    /// Write the collection as timestamped plain text, one entry per line.
    pub fn write_to_txt<P: AsRef<Path>>(&self, path: P) -> Result<(), ExportError> {
        let path = path.as_ref();
        let mut contents = String::new();

        for entry in &self.entries {
            contents.push_str(&entry.to_string());
            contents.push('\n');
        }

        Self::atomic_write(path, &contents)?;
        debug!("Wrote {} text entries to {}", self.entries.len(), path.display());
        Ok(())
    }

    fn atomic_write(path: &Path, contents: &str) -> Result<(), ExportError> {
        let parent = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent)?;

        let mut temp = NamedTempFile::new_in(parent)?;
        temp.write_all(contents.as_bytes())?;
        temp.persist(path).map_err(|e| ExportError::Io(e.error))?;
        Ok(())
    }
}
