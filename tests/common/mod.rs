/*!
 * Common test utilities for cantosub tests
 */

use anyhow::Result;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

use cantosub::segment_merger::{TimedWord, VoiceInterval};

/// Create a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    let temp_dir = TempDir::new()?;
    Ok(temp_dir)
}

/// Create a test file with the given content
pub fn create_test_file(dir: &PathBuf, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Build a word group from texts, spacing each word `step` seconds apart
pub fn words(texts: &[&str], start: f64, step: f64) -> Vec<TimedWord> {
    texts
        .iter()
        .enumerate()
        .map(|(i, text)| {
            let word_start = start + i as f64 * step;
            TimedWord::new(*text, word_start, word_start + step * 0.8)
        })
        .collect()
}

/// Build voice intervals from (start, end) pairs
pub fn intervals(spans: &[(f64, f64)]) -> Vec<VoiceInterval> {
    spans
        .iter()
        .map(|&(start, end)| VoiceInterval::new(start, end))
        .collect()
}

/// A small transcript document in the whisper-style JSON shape
pub fn sample_transcript_json() -> &'static str {
    r#"{
        "segments": [
            {
                "start": 0.0,
                "end": 1.5,
                "text": "你好呀",
                "words": [
                    {"text": "你", "start": 0.0, "end": 0.4},
                    {"text": "好", "start": 0.45, "end": 0.8},
                    {"text": "呀", "start": 1.0, "end": 1.4}
                ]
            },
            {
                "start": 2.5,
                "end": 3.7,
                "text": "今日去邊度",
                "words": [
                    {"text": "今日", "start": 2.5, "end": 3.0},
                    {"text": "去", "start": 3.05, "end": 3.3},
                    {"text": "邊度", "start": 3.35, "end": 3.7}
                ]
            }
        ]
    }"#
}

/// Voice activity intervals matching the sample transcript
pub fn sample_vad_json() -> &'static str {
    r#"{
        "intervals": [
            {"start": 0.0, "end": 1.5},
            {"start": 2.5, "end": 3.8}
        ]
    }"#
}
