/*!
 * Mock corrector implementations for testing.
 *
 * This module provides mock correctors that simulate different behaviors:
 * - `MockCorrector::echoing()` - Returns every input sentence unchanged
 * - `MockCorrector::suffixing(...)` - Marks every sentence it touches
 * - `MockCorrector::garbled()` - Simulates an unusable reply (fallback path)
 * - `MockCorrector::unreachable_service()` - Fails the connection probe
 */

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::correction::SentenceCorrector;
use crate::errors::CorrectionError;

/// Behavior mode for the mock corrector
#[derive(Debug, Clone, PartialEq)]
pub enum MockCorrectorBehavior {
    /// Returns every input line unchanged, one sentence per line
    Echo,
    /// Appends a marker to every input line
    Suffix(String),
    /// Returns a fixed sentence list regardless of input
    FixedSentences(Vec<String>),
    /// Echoes after a per-call delay, cycling through the list; makes
    /// concurrent batches complete out of order
    DelayedEcho { delays_ms: Vec<u64> },
    /// Simulates an unparsable reply: falls back to the original input
    Garbled,
    /// Connection probe fails; correct() falls back to the original input
    Unreachable,
}

/// Mock corrector for testing pipeline correction behavior
#[derive(Debug)]
pub struct MockCorrector {
    /// Behavior mode
    behavior: MockCorrectorBehavior,
    /// Call counter, shared across clones
    call_count: Arc<AtomicUsize>,
}

impl MockCorrector {
    /// Create a new mock corrector with the specified behavior
    pub fn new(behavior: MockCorrectorBehavior) -> Self {
        Self {
            behavior,
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a mock that returns every sentence unchanged
    pub fn echoing() -> Self {
        Self::new(MockCorrectorBehavior::Echo)
    }

    /// Create a mock that appends a marker to every sentence
    pub fn suffixing(marker: impl Into<String>) -> Self {
        Self::new(MockCorrectorBehavior::Suffix(marker.into()))
    }

    /// Create a mock that simulates an unusable reply
    pub fn garbled() -> Self {
        Self::new(MockCorrectorBehavior::Garbled)
    }

    /// Create a mock whose service cannot be reached
    pub fn unreachable_service() -> Self {
        Self::new(MockCorrectorBehavior::Unreachable)
    }

    /// Number of correct() calls made so far
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    fn lines_of(raw_text: &str) -> Vec<String> {
        raw_text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| line.trim().to_string())
            .collect()
    }
}

impl Clone for MockCorrector {
    fn clone(&self) -> Self {
        Self {
            behavior: self.behavior.clone(),
            call_count: Arc::clone(&self.call_count),
        }
    }
}

#[async_trait]
impl SentenceCorrector for MockCorrector {
    async fn correct(&self, raw_text: &str) -> Vec<String> {
        let count = self.call_count.fetch_add(1, Ordering::SeqCst);

        if raw_text.trim().is_empty() {
            return Vec::new();
        }

        match &self.behavior {
            MockCorrectorBehavior::Echo => Self::lines_of(raw_text),

            MockCorrectorBehavior::Suffix(marker) => Self::lines_of(raw_text)
                .into_iter()
                .map(|line| format!("{}{}", line, marker))
                .collect(),

            MockCorrectorBehavior::FixedSentences(sentences) => sentences.clone(),

            MockCorrectorBehavior::DelayedEcho { delays_ms } => {
                if !delays_ms.is_empty() {
                    let delay = delays_ms[count % delays_ms.len()];
                    tokio::time::sleep(tokio::time::Duration::from_millis(delay)).await;
                }
                Self::lines_of(raw_text)
            }

            // The adapter contract: unusable replies keep the original.
            MockCorrectorBehavior::Garbled => vec![raw_text.to_string()],

            MockCorrectorBehavior::Unreachable => vec![raw_text.to_string()],
        }
    }

    async fn check_connection(&self) -> Result<(), CorrectionError> {
        match self.behavior {
            MockCorrectorBehavior::Unreachable => Err(CorrectionError::ConnectionError(
                "Simulated unreachable correction service".to_string(),
            )),
            _ => Ok(()),
        }
    }
}
