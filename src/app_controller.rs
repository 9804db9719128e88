use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};

use crate::app_config::Config;
use crate::cancellation::CancellationToken;
use crate::chunker;
use crate::events::{EventSink, ProgressEvent};
use crate::file_utils::FileManager;
use crate::progress_store::ProgressStore;
use crate::providers::gemini::Gemini;
use crate::reformat;
use crate::translation::{
    ChunkTranslator, GeminiTranslator, RunOutcome, TranslationPipeline,
};
use crate::writer::ReassemblyWriter;

// @module: Application controller for file translation runs

/// Main application controller for translating text files
pub struct Controller {
    // @field: App configuration
    config: Config,

    // @field: Subscriber for structured progress events
    events: EventSink,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        Ok(Self {
            config,
            events: EventSink::noop(),
        })
    }

    /// Attach a progress-event subscriber (CLI log panel, GUI, tests)
    pub fn with_events(mut self, events: EventSink) -> Self {
        self.events = events;
        self
    }

    /// Run a translation for one input file.
    ///
    /// Returns `Ok(None)` when the run was skipped because the output already
    /// exists with no resumable progress and `force_overwrite` is not set.
    pub async fn run(
        &self,
        input_file: PathBuf,
        output_file: Option<PathBuf>,
        force_overwrite: bool,
        token: CancellationToken,
    ) -> Result<Option<RunOutcome>> {
        let translator = self.build_translator()?;
        self.run_with_translator(translator, input_file, output_file, force_overwrite, token)
            .await
    }

    /// Run a translation through an explicit chunk translator.
    ///
    /// This is the seam the test suites use to drive full runs without a
    /// network provider.
    pub async fn run_with_translator(
        &self,
        translator: Arc<dyn ChunkTranslator>,
        input_file: PathBuf,
        output_file: Option<PathBuf>,
        force_overwrite: bool,
        token: CancellationToken,
    ) -> Result<Option<RunOutcome>> {
        let start_time = std::time::Instant::now();

        if !FileManager::file_exists(&input_file) {
            return Err(anyhow!("Input file does not exist: {:?}", input_file));
        }

        // A fresh run is only allowed to clear the stop flag; resumed state
        // comes solely from the progress record
        token.reset();

        let output_path =
            output_file.unwrap_or_else(|| FileManager::derive_output_path(&input_file));

        let store = ProgressStore::for_input(&input_file);
        let completed_chunks = store.load();

        // Never overwrite an existing output the user did not ask to replace.
        // A progress record means the file is ours to append to.
        if FileManager::file_exists(&output_path) && completed_chunks == 0 && !force_overwrite {
            warn!(
                "Skipping {:?}: output {:?} already exists (use -f to force overwrite)",
                input_file, output_path
            );
            return Ok(None);
        }

        let lines = FileManager::read_to_lines(&input_file)?;
        let chunks = chunker::split_into_chunks(&lines, self.config.effective_chunk_size());
        let total_chunks = chunks.len();

        // A shrunken input (or changed chunk size) can leave a stale record
        // claiming more progress than there are chunks
        let completed_chunks = completed_chunks.min(total_chunks);

        info!(
            "Translating {:?} -> {:?} ({} lines, {} chunks, {} already done)",
            input_file,
            output_path,
            lines.len(),
            total_chunks,
            completed_chunks
        );

        let resume = completed_chunks > 0;
        let sink = FileManager::open_output_sink(&output_path, resume)?;

        let bar = self.make_progress_bar(total_chunks, completed_chunks);
        let events = self.forwarding_sink(bar.clone());

        let pipeline = TranslationPipeline::new(
            translator,
            self.config.retry_policy(),
            self.config.effective_workers(),
            token.clone(),
            events.clone(),
        );
        let mut writer =
            ReassemblyWriter::new(sink, store, events.clone(), completed_chunks, total_chunks);

        let outcome = pipeline.run(chunks, completed_chunks, &mut writer).await?;
        bar.finish_and_clear();

        match &outcome {
            RunOutcome::Completed { chunks } => {
                if self.config.auto_reformat {
                    if let Err(e) = reformat::normalize_file(&output_path) {
                        warn!("Reformatting the output failed: {}", e);
                    }
                }
                events.emit(ProgressEvent::Finished {
                    output_path: output_path.clone(),
                });
                info!(
                    "Translation complete: {} chunk(s) in {}. Output: {:?}",
                    chunks,
                    Self::format_duration(start_time.elapsed()),
                    output_path
                );
            }
            RunOutcome::Interrupted { completed, total, reason } => {
                info!(
                    "Translation interrupted ({:?}) - resumable at {}/{} chunks",
                    reason, completed, total
                );
            }
        }

        Ok(Some(outcome))
    }

    /// Translate every `.txt` file under a directory
    pub async fn run_folder(
        &self,
        input_dir: PathBuf,
        force_overwrite: bool,
        token: CancellationToken,
    ) -> Result<()> {
        if !FileManager::dir_exists(&input_dir) {
            return Err(anyhow!("Input directory does not exist: {:?}", input_dir));
        }

        let files = FileManager::find_text_files(&input_dir)?;
        info!("Found {} text file(s) under {:?}", files.len(), input_dir);

        let mut processed = 0usize;
        for file in files {
            if token.is_cancelled() {
                warn!("Folder processing cancelled");
                break;
            }
            match self.run(file.clone(), None, force_overwrite, token.clone()).await {
                Ok(_) => processed += 1,
                Err(e) => error!("Error processing {:?}: {}", file, e),
            }
        }

        info!("Finished processing {} file(s)", processed);
        Ok(())
    }

    /// Build the Gemini-backed translator from the configuration
    fn build_translator(&self) -> Result<Arc<dyn ChunkTranslator>> {
        let api_key = self.config.resolve_api_key();
        let client = Gemini::new(api_key, self.config.endpoint.clone(), self.config.timeout_secs)
            .context("Failed to build Gemini client")?;

        Ok(Arc::new(GeminiTranslator::new(
            client,
            self.config.model.clone(),
            self.config.system_instruction.clone(),
            self.config.temperature,
            self.config.quota_detector(),
        )))
    }

    fn make_progress_bar(&self, total_chunks: usize, completed_chunks: usize) -> ProgressBar {
        let bar = ProgressBar::new(total_chunks as u64);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({eta})",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
        );
        bar.set_position(completed_chunks as u64);
        bar
    }

    /// Sink that drives the progress bar and forwards to the subscriber
    fn forwarding_sink(&self, bar: ProgressBar) -> EventSink {
        let user_events = self.events.clone();
        EventSink::new(move |event| {
            if let ProgressEvent::ChunkCompleted { completed, .. } = event {
                bar.set_position(*completed as u64);
            }
            user_events.emit(event.clone());
        })
    }

    // @returns: Human-readable duration like "2m 31s"
    fn format_duration(duration: Duration) -> String {
        let total_secs = duration.as_secs();
        let hours = total_secs / 3600;
        let minutes = (total_secs % 3600) / 60;
        let seconds = total_secs % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
