use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::path::PathBuf;

use crate::app_config::Config;
use crate::correction::ollama::OllamaCorrector;
use crate::correction::SentenceCorrector;
use crate::dictionary::DictionaryStore;
use crate::errors::PipelineError;
use crate::pipeline::{
    PipelineCallbacks, PipelineConfig, PipelineInput, PipelineWorker, SubtitlePipeline,
};
use crate::subtitle::SubtitleCollection;
use crate::transcript::{TranscriptDocument, VadDocument};

// @module: Application controller for subtitle generation

/// Main application controller for one processing run
pub struct Controller {
    // @field: App configuration
    config: Config,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        Ok(Self { config })
    }

    /// Run the main workflow: load the inputs, process them through the
    /// pipeline and export the resulting subtitles.
    pub async fn run(
        &self,
        transcript_path: PathBuf,
        vad_path: PathBuf,
        output_path: PathBuf,
        write_txt: bool,
    ) -> Result<()> {
        // Start timing the process
        let start_time = std::time::Instant::now();

        if !transcript_path.exists() {
            return Err(anyhow::anyhow!(
                "Transcript file does not exist: {:?}",
                transcript_path
            ));
        }
        if !vad_path.exists() {
            return Err(anyhow::anyhow!(
                "Voice activity file does not exist: {:?}",
                vad_path
            ));
        }

        let transcript = TranscriptDocument::load(&transcript_path)?;
        let vad = VadDocument::load(&vad_path)?;
        info!(
            "Loaded {} transcript segments and {} voice intervals",
            transcript.segments.len(),
            vad.intervals.len()
        );

        let dictionary = DictionaryStore::with_overrides(&self.config.dictionaries)
            .context("Failed to load dictionary overrides")?;

        let pipeline_config =
            PipelineConfig::new(self.config.merge.clone(), self.config.style.clone())
                .with_correction_batching(
                    self.config.correction.batch_size,
                    self.config.correction.concurrent_requests,
                );
        let worker = PipelineWorker::new(SubtitlePipeline::new(pipeline_config, dictionary));

        let corrector = self.build_corrector()?;
        let corrector_ref: Option<&dyn SentenceCorrector> = corrector
            .as_ref()
            .map(|corrector| corrector as &dyn SentenceCorrector);

        // Create a progress bar driven by the pipeline callbacks
        let progress_bar = ProgressBar::new(100);
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {percent}% {msg}")
            .or_else(|_| ProgressStyle::default_bar().template("[{bar:40}] {percent}% {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(template_result.progress_chars("█▓▒░"));
        progress_bar.set_message("Processing");

        let position_bar = progress_bar.clone();
        let message_bar = progress_bar.clone();
        let callbacks = PipelineCallbacks::new()
            .on_progress(move |percent| position_bar.set_position(percent as u64))
            .on_status(move |message| message_bar.set_message(message.to_string()));

        let input = PipelineInput::from_documents(&transcript, &vad);

        // An interrupt cancels cooperatively; the run stops at the next
        // stage or iteration boundary without partial output.
        let run = worker.process(input, corrector_ref, &callbacks);
        tokio::pin!(run);
        let result = tokio::select! {
            result = &mut run => result,
            _ = tokio::signal::ctrl_c() => {
                warn!("Interrupt received, cancelling run");
                worker.cancel_active();
                run.await
            }
        };

        progress_bar.finish_and_clear();

        let report = match result {
            Ok(report) => report,
            Err(PipelineError::Cancelled) => {
                info!("Run cancelled, no output written");
                return Ok(());
            }
            Err(e) => {
                return Err(anyhow::Error::from(e).context("Processing run failed"));
            }
        };

        if report.entries.is_empty() {
            warn!("No subtitle entries produced, writing empty output");
        }

        let collection = SubtitleCollection::new(report.entries);
        collection
            .write_to_srt(&output_path)
            .with_context(|| format!("Failed to write subtitles to {:?}", output_path))?;
        info!("Success: {}", output_path.display());

        if write_txt {
            let txt_path = output_path.with_extension("txt");
            collection
                .write_to_txt(&txt_path)
                .with_context(|| format!("Failed to write text output to {:?}", txt_path))?;
            info!("Success: {}", txt_path.display());
        }

        info!(
            "Processing completed in {}.",
            Self::format_duration(start_time.elapsed())
        );

        Ok(())
    }

    /// Build the corrector when the correction pass is enabled.
    ///
    /// A non-loopback endpoint is a hard error here, not a silent fallback.
    fn build_corrector(&self) -> Result<Option<OllamaCorrector>> {
        if !self.config.correction.enabled {
            return Ok(None);
        }

        let correction = &self.config.correction;
        let corrector = OllamaCorrector::new_with_config(
            correction.endpoint.as_str(),
            correction.model.as_str(),
            correction.timeout_secs,
            correction.retry_count,
            correction.retry_backoff_ms,
        )
        .context("Failed to set up the correction service")?;

        Ok(Some(corrector))
    }

    // Format duration in a human-readable format (HH:MM:SS)
    fn format_duration(duration: std::time::Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
