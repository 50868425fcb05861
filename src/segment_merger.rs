/*!
 * Segment merger reconciling voice-activity intervals with transcript
 * word timings.
 *
 * The merger assigns each transcript word to the voice interval it overlaps
 * most (earlier interval wins ties), partitions the words of every interval
 * greedily under the gap and character-budget rules, then coalesces adjacent
 * segments that still fit together. Words that overlap no interval at all
 * are treated as recognizer hallucinations in silence and dropped.
 *
 * Output segments are ordered by start time and never overlap.
 */

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::errors::MergeError;

/// A transcript word with its timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedWord {
    /// The word text as produced by the recognizer
    #[serde(alias = "word")]
    pub text: String,
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
}

impl TimedWord {
    /// Create a new timed word without validation.
    pub fn new<S: Into<String>>(text: S, start: f64, end: f64) -> Self {
        Self {
            text: text.into(),
            start,
            end,
        }
    }

    /// Create a timed word, rejecting inverted time ranges.
    pub fn new_validated<S: Into<String>>(text: S, start: f64, end: f64) -> Result<Self, MergeError> {
        let text = text.into();
        if start > end || !start.is_finite() || !end.is_finite() {
            return Err(MergeError::InvalidWord { text, start, end });
        }
        Ok(Self { text, start, end })
    }

    fn is_valid(&self) -> bool {
        self.start.is_finite() && self.end.is_finite() && self.start <= self.end && self.start >= 0.0
    }
}

/// A speech interval reported by the voice-activity detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoiceInterval {
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
}

impl VoiceInterval {
    /// Create a new voice interval without validation.
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Create a voice interval, rejecting empty or inverted ranges.
    pub fn new_validated(start: f64, end: f64) -> Result<Self, MergeError> {
        if start >= end || !start.is_finite() || !end.is_finite() {
            return Err(MergeError::InvalidInterval { start, end });
        }
        Ok(Self { start, end })
    }

    fn is_valid(&self) -> bool {
        self.start.is_finite() && self.end.is_finite() && self.start < self.end && self.start >= 0.0
    }

    /// Inclusive overlap test: touching ranges count as overlapping.
    fn touches(&self, start: f64, end: f64) -> bool {
        self.start <= end && start <= self.end
    }

    /// Overlap duration with the given range, zero when merely touching.
    fn overlap_duration(&self, start: f64, end: f64) -> f64 {
        (self.end.min(end) - self.start.max(start)).max(0.0)
    }
}

/// A merged subtitle segment candidate.
///
/// Start and end come from the first and last word (or the interval bounds
/// for a kept silent interval); the text is the concatenation of the word
/// texts.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateSegment {
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
    /// Words assigned to this segment, in time order
    pub words: Vec<TimedWord>,
    /// Display text
    pub text: String,
}

impl CandidateSegment {
    fn from_words(words: Vec<TimedWord>) -> Option<Self> {
        let first = words.first()?;
        let last = words.last()?;
        let start = first.start;
        let end = last.end;
        let text = words
            .iter()
            .map(|w| w.text.as_str())
            .collect::<String>()
            .trim()
            .to_string();
        Some(Self {
            start,
            end,
            words,
            text,
        })
    }

    fn from_silent_interval(interval: &VoiceInterval) -> Self {
        Self {
            start: interval.start,
            end: interval.end,
            words: Vec::new(),
            text: String::new(),
        }
    }

    /// Segment duration in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Display length in characters.
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// Tunable limits for the merge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MergeOptions {
    /// Maximum silence between words of one segment, in seconds
    #[serde(default = "default_max_gap")]
    pub max_gap: f64,

    /// Maximum characters of display text per segment
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,

    /// Keep voice intervals that received no words as empty segments
    #[serde(default)]
    pub keep_silent: bool,

    /// Segments shorter than this are dropped as noise, in seconds
    #[serde(default = "default_min_duration")]
    pub min_duration: f64,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            max_gap: default_max_gap(),
            max_chars: default_max_chars(),
            keep_silent: false,
            min_duration: default_min_duration(),
        }
    }
}

fn default_max_gap() -> f64 {
    0.8
}

fn default_max_chars() -> usize {
    30
}

fn default_min_duration() -> f64 {
    0.2
}

/// Reconciles transcript words with voice intervals into candidate segments.
#[derive(Debug, Clone)]
pub struct SegmentMerger {
    options: MergeOptions,
}

impl SegmentMerger {
    /// Create a merger with the given limits.
    pub fn new(options: MergeOptions) -> Self {
        Self { options }
    }

    /// Create a merger with the default limits.
    pub fn with_defaults() -> Self {
        Self::new(MergeOptions::default())
    }

    /// The limits this merger applies.
    pub fn options(&self) -> &MergeOptions {
        &self.options
    }

    /// Merge transcript word groups with voice intervals.
    ///
    /// With no voice intervals the words are segmented purely by transcript
    /// gaps. An empty transcript yields an empty output.
    pub fn merge(
        &self,
        transcript_groups: &[Vec<TimedWord>],
        intervals: &[VoiceInterval],
    ) -> Vec<CandidateSegment> {
        let never = AtomicBool::new(false);
        self.merge_cancellable(transcript_groups, intervals, &never)
            .unwrap_or_default()
    }

    /// Merge, checking the cancellation flag at iteration boundaries.
    ///
    /// Returns `None` once cancellation is observed; no partial output is
    /// produced.
    pub fn merge_cancellable(
        &self,
        transcript_groups: &[Vec<TimedWord>],
        intervals: &[VoiceInterval],
        cancel: &AtomicBool,
    ) -> Option<Vec<CandidateSegment>> {
        let words = self.sanitize_words(transcript_groups);
        let intervals = self.sanitize_intervals(intervals);

        if words.is_empty() && intervals.is_empty() {
            return Some(Vec::new());
        }

        let segments = if intervals.is_empty() {
            // Pure transcript-gap segmentation fallback.
            self.greedy_partition(&words, cancel)?
        } else {
            let buckets = self.assign_words(&words, &intervals, cancel)?;

            let mut segments = Vec::new();
            for (interval, bucket) in intervals.iter().zip(buckets) {
                if cancel.load(Ordering::SeqCst) {
                    return None;
                }
                if bucket.is_empty() {
                    if self.options.keep_silent {
                        segments.push(CandidateSegment::from_silent_interval(interval));
                    }
                    continue;
                }
                segments.extend(self.greedy_partition(&bucket, cancel)?);
            }
            self.coalesce(segments)
        };

        Some(self.enforce_output_invariants(segments))
    }

    /// Flatten word groups, dropping malformed words individually.
    fn sanitize_words(&self, groups: &[Vec<TimedWord>]) -> Vec<TimedWord> {
        let mut words: Vec<TimedWord> = Vec::new();
        for group in groups {
            for word in group {
                if word.is_valid() && !word.text.trim().is_empty() {
                    words.push(word.clone());
                } else {
                    warn!(
                        "Skipping malformed word '{}' [{:.3}-{:.3}]",
                        word.text, word.start, word.end
                    );
                }
            }
        }
        words.sort_by(|a, b| a.start.partial_cmp(&b.start).unwrap_or(std::cmp::Ordering::Equal));
        words
    }

    /// Drop malformed intervals individually and normalize ordering.
    fn sanitize_intervals(&self, intervals: &[VoiceInterval]) -> Vec<VoiceInterval> {
        let mut sanitized: Vec<VoiceInterval> = Vec::new();
        for interval in intervals {
            if interval.is_valid() {
                sanitized.push(*interval);
            } else {
                warn!(
                    "Skipping malformed voice interval [{:.3}-{:.3}]",
                    interval.start, interval.end
                );
            }
        }
        sanitized.sort_by(|a, b| a.start.partial_cmp(&b.start).unwrap_or(std::cmp::Ordering::Equal));
        sanitized
    }

    /// Assign every word to the interval it overlaps most.
    ///
    /// Ties go to the earlier interval. Words overlapping no interval are
    /// dropped as hallucinations in silence.
    fn assign_words(
        &self,
        words: &[TimedWord],
        intervals: &[VoiceInterval],
        cancel: &AtomicBool,
    ) -> Option<Vec<Vec<TimedWord>>> {
        let mut buckets: Vec<Vec<TimedWord>> = vec![Vec::new(); intervals.len()];
        let mut base = 0usize;

        for word in words {
            if cancel.load(Ordering::SeqCst) {
                return None;
            }

            while base < intervals.len() && intervals[base].end < word.start {
                base += 1;
            }

            let mut best: Option<(usize, f64)> = None;
            let mut idx = base;
            while idx < intervals.len() && intervals[idx].start <= word.end {
                let interval = &intervals[idx];
                if interval.touches(word.start, word.end) {
                    let overlap = interval.overlap_duration(word.start, word.end);
                    // Strictly greater keeps the earlier interval on ties.
                    if best.map_or(true, |(_, b)| overlap > b) {
                        best = Some((idx, overlap));
                    }
                }
                idx += 1;
            }

            match best {
                Some((chosen, _)) => buckets[chosen].push(word.clone()),
                None => debug!(
                    "Dropped word with no voice overlap: '{}' [{:.2}-{:.2}]",
                    word.text, word.start, word.end
                ),
            }
        }

        Some(buckets)
    }

    /// Greedily append words to the current segment while the gap and
    /// character-budget rules both hold.
    fn greedy_partition(
        &self,
        words: &[TimedWord],
        cancel: &AtomicBool,
    ) -> Option<Vec<CandidateSegment>> {
        let mut segments = Vec::new();
        let mut current: Vec<TimedWord> = Vec::new();
        let mut current_text = String::new();

        for word in words {
            if cancel.load(Ordering::SeqCst) {
                return None;
            }

            let gap_exceeded = current
                .last()
                .is_some_and(|last| word.start - last.end > self.options.max_gap);

            let over_budget = if current.is_empty() {
                // A single word may exceed the budget; there is no split point.
                false
            } else {
                let mut prospective = current_text.clone();
                prospective.push_str(&word.text);
                prospective.trim().chars().count() > self.options.max_chars
            };

            if gap_exceeded || over_budget {
                if let Some(segment) = CandidateSegment::from_words(std::mem::take(&mut current)) {
                    segments.push(segment);
                }
                current_text.clear();
            }

            current_text.push_str(&word.text);
            current.push(word.clone());
        }

        if let Some(segment) = CandidateSegment::from_words(current) {
            segments.push(segment);
        }

        Some(segments)
    }

    /// Merge adjacent word-bearing segments whose gap and combined text
    /// still fit the limits. Silent segments never coalesce.
    fn coalesce(&self, segments: Vec<CandidateSegment>) -> Vec<CandidateSegment> {
        let mut merged: Vec<CandidateSegment> = Vec::with_capacity(segments.len());

        for segment in segments {
            if let Some(last) = merged.last_mut() {
                let gap = segment.start - last.end;
                if !last.words.is_empty()
                    && !segment.words.is_empty()
                    && gap <= self.options.max_gap
                {
                    let joined = format!("{} {}", last.text, segment.text);
                    if joined.chars().count() <= self.options.max_chars {
                        last.end = segment.end;
                        last.text = joined;
                        last.words.extend(segment.words);
                        continue;
                    }
                }
            }
            merged.push(segment);
        }

        merged
    }

    /// Drop noise segments and guarantee ordered, non-overlapping output.
    fn enforce_output_invariants(&self, mut segments: Vec<CandidateSegment>) -> Vec<CandidateSegment> {
        segments.sort_by(|a, b| a.start.partial_cmp(&b.start).unwrap_or(std::cmp::Ordering::Equal));

        let mut result: Vec<CandidateSegment> = Vec::with_capacity(segments.len());
        for mut segment in segments {
            if let Some(previous) = result.last() {
                if segment.start < previous.end {
                    // Overlapping words violate the input assumption; clamp
                    // rather than abort the run.
                    warn!(
                        "Clamping overlapping segment at {:.3}s to previous end {:.3}s",
                        segment.start, previous.end
                    );
                    segment.start = previous.end;
                }
            }

            if segment.end <= segment.start {
                debug!("Dropping empty-range segment at {:.3}s", segment.start);
                continue;
            }
            if segment.duration() < self.options.min_duration {
                debug!(
                    "Dropping segment shorter than {:.2}s: '{}'",
                    self.options.min_duration, segment.text
                );
                continue;
            }

            result.push(segment);
        }

        result
    }
}
