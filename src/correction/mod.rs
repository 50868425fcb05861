/*!
 * Optional correction pass against a local text-completion service.
 *
 * The adapter contract is failure-as-fallback: `correct` never raises, it
 * returns the original input as a one-element sequence on any transport or
 * parse failure. The Ollama client is one implementation; the mock exists so
 * the pipeline is testable without a running service.
 */

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use log::warn;
use serde_json::Value;
use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::errors::CorrectionError;

pub mod mock;
pub mod ollama;

/// Default number of sentences sent per correction request
pub const DEFAULT_BATCH_SIZE: usize = 5;

/// Default number of in-flight correction requests
pub const DEFAULT_CONCURRENCY: usize = 2;

/// Capability trait for the correction service
///
/// This trait defines the narrow interface the orchestrator depends on,
/// allowing a deterministic mock to stand in for the real service.
#[async_trait]
pub trait SentenceCorrector: Send + Sync + Debug {
    /// Correct one chunk of raw transcript text
    ///
    /// # Arguments
    /// * `raw_text` - Raw recognizer text, one sentence per line
    ///
    /// # Returns
    /// * `Vec<String>` - The corrected sentences; on any failure, a
    ///   one-element sequence containing the original input unchanged.
    ///   Empty input yields an empty sequence. This method never fails.
    async fn correct(&self, raw_text: &str) -> Vec<String>;

    /// Probe the backing service with a cheap request
    ///
    /// # Returns
    /// * `Result<(), CorrectionError>` - Ok if the service is reachable
    async fn check_connection(&self) -> Result<(), CorrectionError>;
}

/// Correct segment texts in fixed-size batches with a bounded number of
/// in-flight requests, preserving input order in the output.
///
/// A batch whose reply cannot be matched one-to-one to its input falls back
/// to that batch's original texts. `on_batch_done` receives the completed
/// and total batch counts after each reply. Returns `None` once the
/// cancellation flag is observed.
pub async fn correct_in_batches<C>(
    corrector: &C,
    texts: &[String],
    batch_size: usize,
    concurrency: usize,
    cancel: &AtomicBool,
    on_batch_done: impl Fn(usize, usize),
) -> Option<Vec<String>>
where
    C: SentenceCorrector + ?Sized,
{
    if texts.is_empty() {
        return Some(Vec::new());
    }

    let batch_size = batch_size.max(1);
    let concurrency = concurrency.max(1);

    let batches: Vec<(usize, Vec<String>)> = texts
        .chunks(batch_size)
        .map(<[String]>::to_vec)
        .enumerate()
        .collect();
    let batch_count = batches.len();

    let mut slots: Vec<Option<Vec<String>>> = vec![None; batch_count];
    let mut replies = stream::iter(batches.into_iter().map(|(index, batch)| async move {
        let raw = batch.join("\n");
        let sentences = corrector.correct(&raw).await;
        (index, batch, sentences)
    }))
    .buffer_unordered(concurrency);

    let mut completed = 0usize;
    while let Some((index, batch, sentences)) = replies.next().await {
        if cancel.load(Ordering::SeqCst) {
            return None;
        }
        if sentences.len() == batch.len() {
            slots[index] = Some(sentences);
        } else {
            warn!(
                "Correction batch {} returned {} sentences for {} inputs, keeping originals",
                index + 1,
                sentences.len(),
                batch.len()
            );
            slots[index] = Some(batch);
        }
        completed += 1;
        on_batch_done(completed, batch_count);
    }

    let mut corrected = Vec::with_capacity(texts.len());
    for slot in slots {
        corrected.extend(slot.unwrap_or_default());
    }
    Some(corrected)
}

/// Parse a service reply into a sentence list.
///
/// The reply must be a JSON array of strings, optionally wrapped in a fenced
/// code block which is stripped before parsing. Any other shape is a parse
/// failure.
pub fn parse_sentence_array(reply: &str) -> Result<Vec<String>, CorrectionError> {
    let stripped = strip_code_fences(reply);
    let value: Value = serde_json::from_str(stripped)
        .map_err(|e| CorrectionError::ParseError(e.to_string()))?;

    match value {
        Value::Array(items) => {
            let mut sentences = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::String(s) => sentences.push(s),
                    other => {
                        return Err(CorrectionError::ParseError(format!(
                            "Array element is not a string: {}",
                            other
                        )))
                    }
                }
            }
            Ok(sentences)
        }
        _ => Err(CorrectionError::ParseError(
            "Reply is valid JSON but not an array".to_string(),
        )),
    }
}

/// Strip a leading ```json / ``` fence pair if present.
fn strip_code_fences(reply: &str) -> &str {
    if let Some((_, rest)) = reply.split_once("```json") {
        return rest.split_once("```").map_or(rest, |(inner, _)| inner).trim();
    }
    if let Some((_, rest)) = reply.split_once("```") {
        return rest.split_once("```").map_or(rest, |(inner, _)| inner).trim();
    }
    reply.trim()
}
