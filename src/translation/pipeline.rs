/*!
 * Bounded-concurrency dispatch of chunk translations.
 *
 * The dispatcher submits one retry-wrapped translation task per pending
 * chunk to a pool of at most `workers` concurrently active tasks, collects
 * completions in whatever order they finish, and routes them to the ordered
 * reassembly writer. Submission is gated on the cancellation token; tasks
 * already in flight run to completion (cooperative cancellation).
 */

use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use futures::stream::{self, StreamExt};
use log::{debug, error, info};

use crate::cancellation::CancellationToken;
use crate::chunker::Chunk;
use crate::events::{EventSink, ProgressEvent};
use crate::translation::adapter::ChunkTranslator;
use crate::translation::retry::{self, ResultDisposition, RetryPolicy};
use crate::writer::ReassemblyWriter;

/// Why a run stopped before translating every chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptReason {
    /// The caller requested cancellation
    Cancelled,
    /// The provider reported quota exhaustion
    QuotaExceeded,
}

/// Result of one pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every chunk reached the output sink; progress record removed
    Completed {
        chunks: usize,
    },

    /// The run stopped early; partial progress persisted and resumable
    Interrupted {
        completed: usize,
        total: usize,
        reason: InterruptReason,
    },
}

/// Concurrent translation dispatcher
pub struct TranslationPipeline {
    adapter: Arc<dyn ChunkTranslator>,
    policy: RetryPolicy,
    workers: usize,
    token: CancellationToken,
    events: EventSink,
}

impl TranslationPipeline {
    /// Build a pipeline over an adapter
    pub fn new(
        adapter: Arc<dyn ChunkTranslator>,
        policy: RetryPolicy,
        workers: usize,
        token: CancellationToken,
        events: EventSink,
    ) -> Self {
        Self {
            adapter,
            policy,
            workers: workers.max(1),
            token,
            events,
        }
    }

    /// Translate every chunk past `completed_chunks` and reassemble in order.
    ///
    /// Completion order across tasks is unspecified; output order is owned by
    /// the writer. I/O failures on the sink abort the run after cancelling
    /// outstanding submissions; the progress already flushed stays valid.
    pub async fn run<W: Write>(
        &self,
        chunks: Vec<Chunk>,
        completed_chunks: usize,
        writer: &mut ReassemblyWriter<W>,
    ) -> Result<RunOutcome> {
        let total = chunks.len();
        self.events.emit(ProgressEvent::Started {
            total_chunks: total,
            resumed_from: completed_chunks,
        });

        // Already done in a previous run: nothing to dispatch, no API calls
        if completed_chunks >= total {
            let completed = writer.finish()?;
            return Ok(RunOutcome::Completed { chunks: completed });
        }

        let pending_count = total - completed_chunks;
        info!(
            "Dispatching {} chunk(s) across up to {} worker(s)",
            pending_count, self.workers
        );

        // The submission gate: chunks are pulled lazily as worker slots free
        // up, so a cancelled token stops further submissions here while
        // in-flight tasks drain on their own
        let gate = self.token.clone();
        let tasks = chunks
            .into_iter()
            .skip(completed_chunks)
            .take_while(move |_| !gate.is_cancelled())
            .map(|chunk| {
                let adapter = Arc::clone(&self.adapter);
                let policy = self.policy.clone();
                let token = self.token.clone();
                async move { retry::translate_chunk(adapter.as_ref(), &chunk, &policy, &token).await }
            });

        let mut completions = stream::iter(tasks).buffer_unordered(self.workers);

        let mut quota_hit = false;
        while let Some(result) = completions.next().await {
            match result.disposition {
                ResultDisposition::Translated => {
                    // Calls in flight at cancellation time run to completion,
                    // but their results stay out of the sink; the chunks are
                    // re-translated on resume
                    if self.token.is_cancelled() {
                        debug!(
                            "Discarding chunk {} completed after cancellation",
                            result.index
                        );
                        continue;
                    }
                    if let Err(e) = writer.accept(result) {
                        // Sink failure is fatal; stop submitting and bail out
                        self.token.cancel();
                        return Err(e);
                    }
                }
                ResultDisposition::QuotaExhausted => {
                    if !quota_hit {
                        quota_hit = true;
                        error!("Translation quota exhausted, stopping the run");
                        self.token.cancel();
                        self.events.emit(ProgressEvent::QuotaExceeded);
                    }
                }
                ResultDisposition::Cancelled => {
                    debug!("Chunk {} observed cancellation before translating", result.index);
                }
            }
        }

        let completed = writer.finish()?;

        if writer.is_complete() {
            Ok(RunOutcome::Completed { chunks: total })
        } else {
            let reason = if quota_hit {
                InterruptReason::QuotaExceeded
            } else {
                InterruptReason::Cancelled
            };
            if reason == InterruptReason::Cancelled {
                self.events.emit(ProgressEvent::Cancelled { completed, total });
            }
            Ok(RunOutcome::Interrupted { completed, total, reason })
        }
    }
}
