/*!
 * Single-run processing pipeline.
 *
 * One run takes transcript word groups plus voice-activity intervals and
 * produces the final subtitle entries. The module is split in two:
 *
 * - `orchestrator`: stage coordination (merge, correct, transform) with
 *   progress/status fan-out and cooperative cancellation
 * - `worker`: the single-run-at-a-time context and the run state machine
 */

// Re-export main types for easier usage
pub use self::orchestrator::{
    PipelineCallbacks, PipelineConfig, PipelineInput, RunReport, SubtitlePipeline,
};
pub use self::worker::{PipelineWorker, RunHandle, RunState};

// Submodules
pub mod orchestrator;
pub mod worker;
