/*!
 * Pipeline orchestrator coordinating the stages of one processing run.
 *
 * A run moves through three stages:
 * 1. Merge: align transcript words with voice-activity intervals
 * 2. Correct: optional sentence cleanup against a local completion service
 * 3. Transform: register, vocabulary and layout passes producing the entries
 *
 * Correction never fails a run: an unreachable service or a garbled
 * reply keeps the merged text verbatim and the run still completes.
 */

use log::{info, warn};
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::correction::{
    correct_in_batches, SentenceCorrector, DEFAULT_BATCH_SIZE, DEFAULT_CONCURRENCY,
};
use crate::dictionary::DictionaryStore;
use crate::errors::PipelineError;
use crate::segment_merger::{CandidateSegment, MergeOptions, SegmentMerger, TimedWord, VoiceInterval};
use crate::style_processor::{StyleOptions, StyleProcessor};
use crate::subtitle::SubtitleEntry;
use crate::transcript::{TranscriptDocument, VadDocument};

use super::worker::{RunHandle, RunState};

// Progress checkpoints reported to the numeric callback (0-100).
const PROGRESS_MERGE_DONE: u8 = 30;
const PROGRESS_CORRECTION_DONE: u8 = 70;
const PROGRESS_TRANSFORM_DONE: u8 = 95;
const PROGRESS_DONE: u8 = 100;

/// Configuration for one processing pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Limits for the segment merge stage
    pub merge: MergeOptions,

    /// Text transform options
    pub style: StyleOptions,

    /// Sentences sent per correction request
    pub correction_batch_size: usize,

    /// Bound on in-flight correction requests
    pub correction_concurrency: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            merge: MergeOptions::default(),
            style: StyleOptions::default(),
            correction_batch_size: DEFAULT_BATCH_SIZE,
            correction_concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl PipelineConfig {
    /// Create a configuration from merge and style options.
    pub fn new(merge: MergeOptions, style: StyleOptions) -> Self {
        Self {
            merge,
            style,
            ..Default::default()
        }
    }

    /// Set custom merge options.
    pub fn with_merge(mut self, merge: MergeOptions) -> Self {
        self.merge = merge;
        self
    }

    /// Set custom style options.
    pub fn with_style(mut self, style: StyleOptions) -> Self {
        self.style = style;
        self
    }

    /// Set the correction batching parameters.
    pub fn with_correction_batching(mut self, batch_size: usize, concurrency: usize) -> Self {
        self.correction_batch_size = batch_size;
        self.correction_concurrency = concurrency;
        self
    }
}

/// Callbacks wired to an external progress/UI sink.
///
/// Both callbacks are optional; a run with no sink registered stays silent.
/// The numeric callback receives an overall percentage, the status callback
/// free-text sub-step messages independent of the percentage.
#[derive(Default)]
pub struct PipelineCallbacks {
    progress: Option<Box<dyn Fn(u8) + Send + Sync>>,
    status: Option<Box<dyn Fn(&str) + Send + Sync>>,
}

impl PipelineCallbacks {
    /// Create an empty callback set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the numeric progress callback (0-100).
    pub fn on_progress(mut self, callback: impl Fn(u8) + Send + Sync + 'static) -> Self {
        self.progress = Some(Box::new(callback));
        self
    }

    /// Register the free-text status callback.
    pub fn on_status(mut self, callback: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.status = Some(Box::new(callback));
        self
    }

    fn emit_progress(&self, percent: u8) {
        if let Some(callback) = &self.progress {
            callback(percent);
        }
    }

    fn emit_status(&self, message: &str) {
        if let Some(callback) = &self.status {
            callback(message);
        }
    }
}

impl std::fmt::Debug for PipelineCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineCallbacks")
            .field("progress", &self.progress.is_some())
            .field("status", &self.status.is_some())
            .finish()
    }
}

/// Input of one processing run.
#[derive(Debug, Clone, Default)]
pub struct PipelineInput {
    /// Transcript words grouped per recognizer segment
    pub word_groups: Vec<Vec<TimedWord>>,
    /// Voice-activity intervals in seconds
    pub intervals: Vec<VoiceInterval>,
}

impl PipelineInput {
    /// Create an input from word groups and voice intervals.
    pub fn new(word_groups: Vec<Vec<TimedWord>>, intervals: Vec<VoiceInterval>) -> Self {
        Self {
            word_groups,
            intervals,
        }
    }

    /// Assemble the input from loaded transcript and voice-activity documents.
    pub fn from_documents(transcript: &TranscriptDocument, vad: &VadDocument) -> Self {
        Self {
            word_groups: transcript.word_groups(),
            intervals: vad.intervals.clone(),
        }
    }
}

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Run id carried in log lines
    pub run_id: Uuid,

    /// Final subtitle entries, ordered by start time
    pub entries: Vec<SubtitleEntry>,

    /// Candidate segments produced by the merge stage
    pub merged_segments: usize,

    /// Sentences the correction service actually changed
    pub corrected_sentences: usize,

    /// Wall-clock duration of the run
    pub duration: Duration,
}

impl RunReport {
    /// One-line summary for logs.
    pub fn summary(&self) -> String {
        format!(
            "{} segments merged | {} sentences corrected | {} entries | {:.2}s",
            self.merged_segments,
            self.corrected_sentences,
            self.entries.len(),
            self.duration.as_secs_f32()
        )
    }
}

/// The processing pipeline for one input file.
#[derive(Debug)]
pub struct SubtitlePipeline {
    config: PipelineConfig,
    merger: SegmentMerger,
    processor: StyleProcessor,
}

impl SubtitlePipeline {
    /// Create a pipeline from a configuration and a loaded dictionary.
    pub fn new(config: PipelineConfig, dictionary: DictionaryStore) -> Self {
        let merger = SegmentMerger::new(config.merge.clone());
        let processor = StyleProcessor::new(config.style.clone(), dictionary);
        Self {
            config,
            merger,
            processor,
        }
    }

    /// Create a pipeline with default options and the built-in dictionary.
    pub fn with_defaults() -> Self {
        Self::new(PipelineConfig::default(), DictionaryStore::builtin())
    }

    /// Get the pipeline configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Execute one run against the given handle.
    ///
    /// Advances the handle's state as stages complete. A corrector of `None`
    /// skips the correction stage. Once cancellation is observed the run
    /// stops, emits no further progress and yields `PipelineError::Cancelled`.
    pub async fn run(
        &self,
        input: PipelineInput,
        corrector: Option<&dyn SentenceCorrector>,
        handle: &RunHandle,
        callbacks: &PipelineCallbacks,
    ) -> Result<RunReport, PipelineError> {
        let started = Instant::now();
        let run_id = handle.id();

        if handle.is_cancelled() {
            return Self::cancelled(handle);
        }

        info!(
            "Run {}: starting with {} transcript groups and {} voice intervals",
            run_id,
            input.word_groups.len(),
            input.intervals.len()
        );
        callbacks.emit_status("Merging transcript with voice activity");

        let Some(segments) =
            self.merger
                .merge_cancellable(&input.word_groups, &input.intervals, handle.cancel_flag())
        else {
            return Self::cancelled(handle);
        };
        let merged_segments = segments.len();
        handle.set_state(RunState::Merged);
        callbacks.emit_progress(PROGRESS_MERGE_DONE);
        callbacks.emit_status(&format!("Merged into {} segments", merged_segments));

        if handle.is_cancelled() {
            return Self::cancelled(handle);
        }

        let (segments, corrected_sentences) = match corrector {
            Some(corrector) => match corrector.check_connection().await {
                Ok(()) => {
                    handle.set_state(RunState::Correcting);
                    callbacks.emit_status("Correcting merged segments");
                    let Some(outcome) = self
                        .correct_segments(corrector, segments, handle, callbacks)
                        .await
                    else {
                        return Self::cancelled(handle);
                    };
                    handle.set_state(RunState::Corrected);
                    outcome
                }
                Err(e) => {
                    warn!(
                        "Run {}: correction service unavailable, keeping original text: {}",
                        run_id, e
                    );
                    handle.set_state(RunState::CorrectionSkipped);
                    callbacks.emit_status("Correction unavailable, keeping original text");
                    (segments, 0)
                }
            },
            None => {
                handle.set_state(RunState::CorrectionSkipped);
                (segments, 0)
            }
        };
        callbacks.emit_progress(PROGRESS_CORRECTION_DONE);

        if handle.is_cancelled() {
            return Self::cancelled(handle);
        }

        callbacks.emit_status("Applying text transforms");
        let Some(entries) = self
            .processor
            .transform_segments(&segments, handle.cancel_flag())
        else {
            return Self::cancelled(handle);
        };
        handle.set_state(RunState::Transformed);
        callbacks.emit_progress(PROGRESS_TRANSFORM_DONE);
        callbacks.emit_status(&format!("Rendered {} subtitle entries", entries.len()));

        handle.set_state(RunState::Done);
        callbacks.emit_progress(PROGRESS_DONE);

        let report = RunReport {
            run_id,
            entries,
            merged_segments,
            corrected_sentences,
            duration: started.elapsed(),
        };
        info!("Run {}: {}", run_id, report.summary());
        Ok(report)
    }

    /// Send the non-empty segment texts through the corrector in batches and
    /// write the replies back in place.
    async fn correct_segments(
        &self,
        corrector: &dyn SentenceCorrector,
        mut segments: Vec<CandidateSegment>,
        handle: &RunHandle,
        callbacks: &PipelineCallbacks,
    ) -> Option<(Vec<CandidateSegment>, usize)> {
        // Kept silent intervals carry no text and are not sent out.
        let indexed: Vec<usize> = segments
            .iter()
            .enumerate()
            .filter(|(_, segment)| !segment.text.trim().is_empty())
            .map(|(index, _)| index)
            .collect();
        let texts: Vec<String> = indexed
            .iter()
            .map(|&index| segments[index].text.clone())
            .collect();

        let corrected = correct_in_batches(
            corrector,
            &texts,
            self.config.correction_batch_size,
            self.config.correction_concurrency,
            handle.cancel_flag(),
            |done, total| {
                callbacks.emit_progress(correction_progress(done, total));
                callbacks.emit_status(&format!("Corrected batch {} of {}", done, total));
            },
        )
        .await?;

        let mut changed = 0;
        for (&index, text) in indexed.iter().zip(corrected) {
            if segments[index].text != text {
                changed += 1;
            }
            segments[index].text = text;
        }
        Some((segments, changed))
    }

    fn cancelled(handle: &RunHandle) -> Result<RunReport, PipelineError> {
        handle.set_state(RunState::Cancelled);
        info!("Run {}: cancelled, no entries emitted", handle.id());
        Err(PipelineError::Cancelled)
    }
}

fn correction_progress(done: usize, total: usize) -> u8 {
    let span = (PROGRESS_CORRECTION_DONE - PROGRESS_MERGE_DONE) as usize;
    PROGRESS_MERGE_DONE + (span * done / total.max(1)) as u8
}
