/*!
 * Transcript and voice-activity input documents.
 *
 * Both documents are JSON arrays (a wrapping object with a `segments` /
 * `intervals` key is also accepted, matching common recognizer output).
 * Malformed records are rejected individually with a warning; one bad record
 * never aborts the whole document.
 */

use anyhow::{anyhow, Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;

use crate::segment_merger::{TimedWord, VoiceInterval};

// @struct: One recognizer segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    // @field: Start time in seconds
    pub start: f64,

    // @field: End time in seconds
    pub end: f64,

    // @field: Segment text
    #[serde(default)]
    pub text: String,

    // @field: Word-level timestamps, optional
    #[serde(default)]
    pub words: Vec<TimedWord>,
}

impl TranscriptSegment {
    /// The words of this segment for the merger.
    ///
    /// A segment without word timing is treated as one atomic unit spanning
    /// the whole segment.
    pub fn word_group(&self) -> Vec<TimedWord> {
        if self.words.is_empty() {
            if self.text.trim().is_empty() {
                return Vec::new();
            }
            return vec![TimedWord::new(self.text.clone(), self.start, self.end)];
        }
        self.words.clone()
    }
}

/// The transcript input document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranscriptDocument {
    /// Ordered recognizer segments
    pub segments: Vec<TranscriptSegment>,
}

impl TranscriptDocument {
    /// Load a transcript document from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read transcript file: {:?}", path.as_ref()))?;
        Self::from_json(&content)
    }

    /// Parse a transcript document from JSON text.
    pub fn from_json(content: &str) -> Result<Self> {
        let raw: Value =
            serde_json::from_str(content).context("Transcript document is not valid JSON")?;
        let items = document_items(&raw, "segments")?;

        let mut segments = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            match serde_json::from_value::<TranscriptSegment>(item.clone()) {
                Ok(segment) => segments.push(segment),
                Err(e) => warn!("Skipping malformed transcript segment {}: {}", index, e),
            }
        }

        Ok(Self { segments })
    }

    /// Word groups in document order, ready for the merger.
    pub fn word_groups(&self) -> Vec<Vec<TimedWord>> {
        self.segments
            .iter()
            .map(TranscriptSegment::word_group)
            .collect()
    }
}

/// The voice-activity input document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VadDocument {
    /// Ordered, non-overlapping speech intervals
    pub intervals: Vec<VoiceInterval>,
}

impl VadDocument {
    /// Load a voice-activity document from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read voice-activity file: {:?}", path.as_ref()))?;
        Self::from_json(&content)
    }

    /// Parse a voice-activity document from JSON text. Extra per-interval
    /// fields such as a confidence score are tolerated and ignored.
    pub fn from_json(content: &str) -> Result<Self> {
        let raw: Value =
            serde_json::from_str(content).context("Voice-activity document is not valid JSON")?;
        let items = document_items(&raw, "intervals")?;

        let mut intervals = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            match serde_json::from_value::<VoiceInterval>(item.clone()) {
                Ok(interval) => intervals.push(interval),
                Err(e) => warn!("Skipping malformed voice interval {}: {}", index, e),
            }
        }

        Ok(Self { intervals })
    }
}

/// A document is either a bare array or an object wrapping one under `key`.
fn document_items<'a>(raw: &'a Value, key: &str) -> Result<&'a Vec<Value>> {
    match raw {
        Value::Array(items) => Ok(items),
        Value::Object(map) => map
            .get(key)
            .and_then(|v| v.as_array())
            .ok_or_else(|| anyhow!("Document object has no '{}' array", key)),
        _ => Err(anyhow!("Document must be a JSON array")),
    }
}
