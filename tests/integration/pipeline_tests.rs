/*!
 * Integration tests for the end-to-end subtitle pipeline
 */

use std::fs;
use std::sync::Arc;

use cantosub::correction::mock::{MockCorrector, MockCorrectorBehavior};
use cantosub::dictionary::DictionaryStore;
use cantosub::errors::PipelineError;
use cantosub::pipeline::{
    PipelineCallbacks, PipelineConfig, PipelineInput, PipelineWorker, RunState, SubtitlePipeline,
};
use cantosub::segment_merger::{MergeOptions, TimedWord};
use cantosub::style_processor::{RegisterStyle, StyleOptions};
use cantosub::subtitle::SubtitleCollection;
use cantosub::transcript::{TranscriptDocument, VadDocument};

use crate::common;

fn default_worker() -> PipelineWorker {
    let config = PipelineConfig::new(MergeOptions::default(), StyleOptions::default());
    PipelineWorker::new(SubtitlePipeline::new(config, DictionaryStore::builtin()))
}

fn written_worker() -> PipelineWorker {
    let style = StyleOptions {
        style: RegisterStyle::Written,
        ..StyleOptions::default()
    };
    let config = PipelineConfig::new(MergeOptions::default(), style);
    PipelineWorker::new(SubtitlePipeline::new(config, DictionaryStore::builtin()))
}

/// Test the complete flow from recognizer documents to an SRT file on disk
#[test]
fn test_endToEnd_withDocuments_shouldProduceSrtFile() {
    // 1. Parse the recognizer transcript and the voice activity document
    let transcript = TranscriptDocument::from_json(common::sample_transcript_json())
        .expect("Sample transcript should parse");
    let vad = VadDocument::from_json(common::sample_vad_json()).expect("Sample VAD should parse");
    assert_eq!(transcript.segments.len(), 2);
    assert_eq!(vad.intervals.len(), 2);

    // 2. Run the pipeline without a corrector
    let worker = default_worker();
    let input = PipelineInput::from_documents(&transcript, &vad);
    let report = tokio_test::block_on(async {
        worker.process(input, None, &PipelineCallbacks::new()).await
    })
    .expect("Pipeline run should succeed");

    // 3. Verify the report numbers
    assert_eq!(report.merged_segments, 2);
    assert_eq!(report.corrected_sentences, 0);
    assert_eq!(report.entries.len(), 2);
    assert_eq!(report.entries[0].colloquial, "你好呀");
    assert_eq!(report.entries[1].colloquial, "今日去邊度");
    assert!(report.entries[0].formal.is_none());

    // 4. Export the entries and verify the SRT content on disk
    let temp_dir = common::create_temp_dir().expect("Temp dir should be created");
    let srt_path = temp_dir.path().join("episode.srt");
    SubtitleCollection::new(report.entries)
        .write_to_srt(&srt_path)
        .expect("SRT export should succeed");

    let content = fs::read_to_string(&srt_path).expect("SRT file should be readable");
    assert!(content.starts_with("1\n00:00:00,000 --> 00:00:01,400\n你好呀\n"));
    assert!(content.contains("2\n00:00:02,500 --> 00:00:03,700\n今日去邊度\n"));
}

/// Test that a working corrector feeds changed text into the transform stage
#[tokio::test]
async fn test_endToEnd_withWrittenStyleAndCorrector_shouldCorrectAndConvert() {
    // 1. Build a written-style worker and a corrector that marks every sentence
    let worker = written_worker();
    let corrector = MockCorrector::suffixing("嘛");
    let transcript = TranscriptDocument::from_json(common::sample_transcript_json()).unwrap();
    let vad = VadDocument::from_json(common::sample_vad_json()).unwrap();
    let input = PipelineInput::from_documents(&transcript, &vad);

    // 2. Run with the corrector attached
    let report = worker
        .process(input, Some(&corrector), &PipelineCallbacks::new())
        .await
        .expect("Pipeline run should succeed");

    // 3. Both sentences were changed by the corrector
    assert_eq!(report.corrected_sentences, 2);
    assert!(corrector.call_count() >= 1);

    // 4. The corrected text flows through register conversion
    assert_eq!(report.entries[0].colloquial, "你好呀嘛");
    assert_eq!(report.entries[1].colloquial, "今日去邊度嘛");
    assert_eq!(report.entries[1].formal.as_deref(), Some("今天去哪裡嘛"));
}

/// Test that an unreachable correction service degrades to the original text
#[tokio::test]
async fn test_endToEnd_withUnreachableCorrector_shouldFallBackToOriginals() {
    // 1. Capture status messages to observe the fallback
    let statuses: Arc<parking_lot::Mutex<Vec<String>>> =
        Arc::new(parking_lot::Mutex::new(Vec::new()));
    let sink = Arc::clone(&statuses);
    let callbacks =
        PipelineCallbacks::new().on_status(move |message| sink.lock().push(message.to_string()));

    // 2. Run with a corrector whose connection probe fails
    let worker = default_worker();
    let corrector = MockCorrector::unreachable_service();
    let transcript = TranscriptDocument::from_json(common::sample_transcript_json()).unwrap();
    let vad = VadDocument::from_json(common::sample_vad_json()).unwrap();
    let input = PipelineInput::from_documents(&transcript, &vad);

    let report = worker
        .process(input, Some(&corrector), &callbacks)
        .await
        .expect("Pipeline run should succeed despite the dead service");

    // 3. Output matches the uncorrected run and the probe was the only contact
    assert_eq!(report.corrected_sentences, 0);
    assert_eq!(report.entries[0].colloquial, "你好呀");
    assert_eq!(corrector.call_count(), 0, "correct() must not be called");
    assert!(statuses
        .lock()
        .iter()
        .any(|s| s == "Correction unavailable, keeping original text"));
}

/// Test that a run without correction emits exactly the stage checkpoints
#[tokio::test]
async fn test_endToEnd_withoutCorrector_shouldEmitCheckpointProgress() {
    // 1. Capture every progress emission
    let progress: Arc<parking_lot::Mutex<Vec<u8>>> = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let sink = Arc::clone(&progress);
    let callbacks = PipelineCallbacks::new().on_progress(move |percent| sink.lock().push(percent));

    // 2. Run the pipeline
    let worker = default_worker();
    let transcript = TranscriptDocument::from_json(common::sample_transcript_json()).unwrap();
    let vad = VadDocument::from_json(common::sample_vad_json()).unwrap();
    let input = PipelineInput::from_documents(&transcript, &vad);

    worker
        .process(input, None, &callbacks)
        .await
        .expect("Pipeline run should succeed");

    // 3. Merge, correction window close, transform, done
    assert_eq!(*progress.lock(), vec![30, 70, 95, 100]);
}

/// Test that cancelling a run mid-correction yields a cancelled error and state
#[tokio::test]
async fn test_worker_cancelActiveDuringRun_shouldYieldCancelled() {
    // 1. A corrector slow enough for the cancel to land mid-run
    let worker = Arc::new(default_worker());
    let corrector = MockCorrector::new(MockCorrectorBehavior::DelayedEcho {
        delays_ms: vec![500],
    });
    let transcript = TranscriptDocument::from_json(common::sample_transcript_json()).unwrap();
    let vad = VadDocument::from_json(common::sample_vad_json()).unwrap();
    let input = PipelineInput::from_documents(&transcript, &vad);

    // 2. Start the run in a separate task
    let task_worker = Arc::clone(&worker);
    let run = tokio::spawn(async move {
        task_worker
            .process(input, Some(&corrector), &PipelineCallbacks::new())
            .await
    });

    // 3. Cancel while the correction batch is still sleeping
    tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
    assert!(worker.cancel_active(), "An active run should be cancellable");

    // 4. The run ends cancelled with no entries
    let result = run.await.expect("Run task should not panic");
    assert!(matches!(result, Err(PipelineError::Cancelled)));

    let handle = worker.active_run().expect("Handle should remain installed");
    assert_eq!(handle.state(), RunState::Cancelled);
    // A terminal run can no longer be cancelled
    assert!(!worker.cancel_active());
}

/// Test that config knobs reach the merge and transform stages
#[tokio::test]
async fn test_endToEnd_withSplitLongEnabled_shouldSplitOverlongEntries() {
    // 1. A tight split threshold and one overlong merged segment
    let style = StyleOptions {
        split_long: true,
        split_threshold: 6,
        ..StyleOptions::default()
    };
    let config = PipelineConfig::new(MergeOptions::default(), style);
    let worker = PipelineWorker::new(SubtitlePipeline::new(config, DictionaryStore::builtin()));

    let groups = vec![vec![
        TimedWord::new("今日好攰，", 0.0, 0.8),
        TimedWord::new("想早啲返屋企", 0.9, 1.8),
    ]];
    let input = PipelineInput::new(groups, common::intervals(&[(0.0, 2.0)]));

    // 2. Run and check that the eleven-character entry was split at the comma
    let report = worker
        .process(input, None, &PipelineCallbacks::new())
        .await
        .expect("Pipeline run should succeed");

    assert_eq!(report.merged_segments, 1);
    assert_eq!(report.entries.len(), 2);
    assert_eq!(report.entries[0].colloquial, "今日好攰，");
    assert_eq!(report.entries[1].colloquial, "想早啲返屋企");
    assert_eq!(report.entries[0].end, report.entries[1].start);
}
