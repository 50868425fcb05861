/*!
 * Unit tests for the correction service layer
 */

use std::sync::atomic::{AtomicBool, Ordering};

use cantosub::correction::mock::{MockCorrector, MockCorrectorBehavior};
use cantosub::correction::ollama::OllamaCorrector;
use cantosub::correction::{correct_in_batches, SentenceCorrector};

fn texts(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Test that output order matches input order even when batches finish out of order
#[tokio::test]
async fn test_correctInBatches_withDelayedBatches_shouldPreserveInputOrder() {
    // First batch sleeps 200ms, second returns immediately
    let corrector = MockCorrector::new(MockCorrectorBehavior::DelayedEcho {
        delays_ms: vec![200, 0],
    });
    let input = texts(&["一號", "二號", "三號", "四號"]);
    let cancel = AtomicBool::new(false);

    let output = correct_in_batches(&corrector, &input, 2, 2, &cancel, |_, _| {}).await;

    assert_eq!(output, Some(input));
    assert_eq!(corrector.call_count(), 2);
}

/// Test that a batch reply with the wrong sentence count keeps that batch's originals
#[tokio::test]
async fn test_correctInBatches_withCountMismatch_shouldKeepBatchOriginals() {
    let corrector = MockCorrector::new(MockCorrectorBehavior::FixedSentences(vec![
        "唯一一句".to_string(),
    ]));
    let input = texts(&["甲", "乙", "丙", "丁"]);
    let cancel = AtomicBool::new(false);
    let progress = parking_lot::Mutex::new(Vec::new());

    let output = correct_in_batches(&corrector, &input, 2, 2, &cancel, |done, total| {
        progress.lock().push((done, total));
    })
    .await;

    // Both two-sentence batches mismatch the one-sentence reply
    assert_eq!(output, Some(input));

    let progress = progress.lock();
    assert_eq!(progress.len(), 2);
    assert!(progress.contains(&(2, 2)), "Final callback should report completion");
}

/// Test that corrections land on every sentence across batch boundaries
#[tokio::test]
async fn test_correctInBatches_withSuffixingCorrector_shouldCorrectEverySentence() {
    let corrector = MockCorrector::suffixing("✓");
    let input = texts(&["早晨", "你好", "再見"]);
    let cancel = AtomicBool::new(false);

    let output = correct_in_batches(&corrector, &input, 2, 2, &cancel, |_, _| {})
        .await
        .expect("Batching should complete");

    assert_eq!(output, vec!["早晨✓", "你好✓", "再見✓"]);
    // Three texts at batch size two means two requests
    assert_eq!(corrector.call_count(), 2);
}

/// Test that an already-set cancellation flag aborts before any output
#[tokio::test]
async fn test_correctInBatches_withPreSetCancel_shouldReturnNone() {
    let corrector = MockCorrector::echoing();
    let input = texts(&["一", "二"]);
    let cancel = AtomicBool::new(false);
    cancel.store(true, Ordering::SeqCst);

    let output = correct_in_batches(&corrector, &input, 2, 2, &cancel, |_, _| {}).await;

    assert!(output.is_none());
}

/// Test that empty input yields empty output without touching the service
#[tokio::test]
async fn test_correctInBatches_withEmptyInput_shouldNotCallService() {
    let corrector = MockCorrector::echoing();
    let cancel = AtomicBool::new(false);

    let output = correct_in_batches(&corrector, &[], 5, 2, &cancel, |_, _| {
        panic!("No batch callback expected for empty input");
    })
    .await;

    assert_eq!(output, Some(Vec::new()));
    assert_eq!(corrector.call_count(), 0);
}

/// Test that a zero batch size is clamped to one sentence per request
#[tokio::test]
async fn test_correctInBatches_withZeroBatchSize_shouldClampToOne() {
    let corrector = MockCorrector::echoing();
    let input = texts(&["一", "二"]);
    let cancel = AtomicBool::new(false);

    let output = correct_in_batches(&corrector, &input, 0, 0, &cancel, |_, _| {}).await;

    assert_eq!(output, Some(input));
    assert_eq!(corrector.call_count(), 2);
}

/// Test that the corrector contract holds through the trait object
#[tokio::test]
async fn test_sentenceCorrector_asTraitObject_shouldEchoThroughDynDispatch() {
    let corrector = MockCorrector::echoing();
    let as_dyn: &dyn SentenceCorrector = &corrector;

    let sentences = as_dyn.correct("單一句子").await;

    assert_eq!(sentences, vec!["單一句子"]);
    assert!(as_dyn.check_connection().await.is_ok());
}

/// Test that a trailing slash on the endpoint is tolerated
#[test]
fn test_ollamaCorrector_withTrailingSlash_shouldNormalizeEndpoint() {
    let corrector = OllamaCorrector::new("http://localhost:11434/", "qwen:14b");
    assert!(corrector.is_ok());
}

/// Test that non-standard loopback addresses are still refused
#[test]
fn test_ollamaCorrector_withNonStandardLoopback_shouldBeRefused() {
    // Only localhost, 127.0.0.1 and ::1 are accepted
    assert!(OllamaCorrector::new("http://127.0.0.2:11434", "qwen:14b").is_err());
}

/// Test that an unparsable endpoint is refused rather than deferred
#[test]
fn test_ollamaCorrector_withUnparsableEndpoint_shouldBeRefused() {
    assert!(OllamaCorrector::new("not a url", "qwen:14b").is_err());
}
