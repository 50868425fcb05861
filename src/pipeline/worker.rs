/*!
 * Worker context owning at most one pipeline run at a time.
 *
 * The worker installs a `RunHandle` per accepted run, refuses a second run
 * while one is in flight, and relays cooperative cancellation into the
 * pipeline. The embedding application keeps the handle to observe state and
 * to cancel.
 */

use log::{info, warn};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use crate::correction::SentenceCorrector;
use crate::errors::PipelineError;

use super::orchestrator::{PipelineCallbacks, PipelineInput, RunReport, SubtitlePipeline};

/// States a processing run moves through.
///
/// Correction forks the path: `Correcting -> Corrected` when the service is
/// reachable, `CorrectionSkipped` otherwise or when correction is disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Run accepted, nothing executed yet
    Pending,
    /// Transcript and voice activity merged into candidate segments
    Merged,
    /// Correction requests in flight
    Correcting,
    /// Correction replies applied to the merged segments
    Corrected,
    /// Correction disabled or unavailable, merged text kept verbatim
    CorrectionSkipped,
    /// Segments rendered into subtitle entries
    Transformed,
    /// Final entries emitted
    Done,
    /// Cancellation observed, no entries emitted
    Cancelled,
    /// Terminal failure
    Failed,
}

impl RunState {
    /// A terminal state frees the worker for the next run.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Done | RunState::Cancelled | RunState::Failed)
    }

    /// Get a human-readable state name.
    pub fn display_name(&self) -> &'static str {
        match self {
            RunState::Pending => "pending",
            RunState::Merged => "merged",
            RunState::Correcting => "correcting",
            RunState::Corrected => "corrected",
            RunState::CorrectionSkipped => "correction skipped",
            RunState::Transformed => "transformed",
            RunState::Done => "done",
            RunState::Cancelled => "cancelled",
            RunState::Failed => "failed",
        }
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Shared handle to one processing run.
///
/// The pipeline advances the state as stages complete; any thread holding
/// the handle may request cancellation, which the run observes at the next
/// stage or iteration boundary.
#[derive(Debug)]
pub struct RunHandle {
    /// Run id carried in log lines
    id: Uuid,
    /// Current state
    state: Mutex<RunState>,
    /// Cooperative cancellation flag
    cancel_flag: AtomicBool,
}

impl RunHandle {
    /// Create a fresh handle in the pending state.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            state: Mutex::new(RunState::Pending),
            cancel_flag: AtomicBool::new(false),
        }
    }

    /// The run id.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Current run state.
    pub fn state(&self) -> RunState {
        *self.state.lock()
    }

    pub(crate) fn set_state(&self, next: RunState) {
        *self.state.lock() = next;
    }

    /// Request cooperative cancellation.
    pub fn cancel(&self) {
        self.cancel_flag.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancel_flag.load(Ordering::SeqCst)
    }

    pub(crate) fn cancel_flag(&self) -> &AtomicBool {
        &self.cancel_flag
    }
}

impl Default for RunHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Worker executing pipeline runs one at a time.
#[derive(Debug)]
pub struct PipelineWorker {
    /// The pipeline this worker drives
    pipeline: SubtitlePipeline,
    /// Handle of the most recent run
    active: Mutex<Option<Arc<RunHandle>>>,
}

impl PipelineWorker {
    /// Create a worker around a pipeline.
    pub fn new(pipeline: SubtitlePipeline) -> Self {
        Self {
            pipeline,
            active: Mutex::new(None),
        }
    }

    /// Get the pipeline driven by this worker.
    pub fn pipeline(&self) -> &SubtitlePipeline {
        &self.pipeline
    }

    /// Handle of the most recent run, terminal or not.
    pub fn active_run(&self) -> Option<Arc<RunHandle>> {
        self.active.lock().clone()
    }

    /// Request cancellation of the in-flight run.
    ///
    /// Returns false when no run is in flight.
    pub fn cancel_active(&self) -> bool {
        let active = self.active.lock();
        match active.as_ref() {
            Some(run) if !run.state().is_terminal() => {
                warn!("Run {}: cancellation requested", run.id());
                run.cancel();
                true
            }
            _ => false,
        }
    }

    /// Execute one run, refusing to start while another is in flight.
    pub async fn process(
        &self,
        input: PipelineInput,
        corrector: Option<&dyn SentenceCorrector>,
        callbacks: &PipelineCallbacks,
    ) -> Result<RunReport, PipelineError> {
        let handle = self.install_run()?;
        info!("Run {}: accepted by worker", handle.id());

        let result = self.pipeline.run(input, corrector, &handle, callbacks).await;
        match &result {
            Ok(_) | Err(PipelineError::Cancelled) => {}
            Err(e) => {
                warn!("Run {}: failed: {}", handle.id(), e);
                handle.set_state(RunState::Failed);
            }
        }
        result
    }

    fn install_run(&self) -> Result<Arc<RunHandle>, PipelineError> {
        let mut active = self.active.lock();
        if let Some(run) = active.as_ref() {
            if !run.state().is_terminal() {
                return Err(PipelineError::InvariantViolated {
                    stage: "worker".to_string(),
                    message: format!("run {} is still in flight", run.id()),
                });
            }
        }
        let handle = Arc::new(RunHandle::new());
        *active = Some(Arc::clone(&handle));
        Ok(handle)
    }
}
