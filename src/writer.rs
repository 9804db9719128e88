/*!
 * Ordered reassembly of out-of-order completions.
 *
 * Workers finish in arbitrary order; the writer buffers their results and
 * appends them to the output sink strictly in chunk-index order. Progress is
 * persisted only after a successful flush, so the sink and the progress
 * record can never disagree about how much has been written: a crash at any
 * point leaves persisted progress at or behind the sink, never ahead.
 *
 * The writer is the only component that touches the sink or the progress
 * store while a run executes.
 */

use std::collections::BTreeMap;
use std::io::Write;

use anyhow::{Context, Result};
use log::warn;

use crate::events::{EventSink, ProgressEvent};
use crate::progress_store::ProgressStore;
use crate::translation::retry::ChunkResult;

/// Buffers completions and flushes them to the sink in index order
pub struct ReassemblyWriter<W: Write> {
    sink: W,
    store: ProgressStore,
    events: EventSink,

    /// Completed results not yet eligible to flush, keyed by chunk index
    pending: BTreeMap<usize, ChunkResult>,

    /// Next chunk index the sink is waiting for
    next_expected: usize,

    /// Total chunk count for this run
    total_chunks: usize,
}

impl<W: Write> ReassemblyWriter<W> {
    /// Create a writer resuming at `completed_chunks`
    pub fn new(
        sink: W,
        store: ProgressStore,
        events: EventSink,
        completed_chunks: usize,
        total_chunks: usize,
    ) -> Self {
        Self {
            sink,
            store,
            events,
            pending: BTreeMap::new(),
            next_expected: completed_chunks,
            total_chunks,
        }
    }

    /// Chunks flushed so far (equals the persisted progress, modulo a failed save)
    pub fn completed(&self) -> usize {
        self.next_expected
    }

    /// True once every chunk has been flushed
    pub fn is_complete(&self) -> bool {
        self.next_expected >= self.total_chunks
    }

    /// Accept one completion and flush as far as contiguity allows.
    ///
    /// Only translated results are buffered; cancelled or quota-stopped
    /// results carry no text and must not reach the sink.
    pub fn accept(&mut self, result: ChunkResult) -> Result<()> {
        debug_assert!(result.is_translated(), "writer only accepts translated results");
        self.pending.insert(result.index, result);
        self.drain()
    }

    /// Flush the contiguous run starting at `next_expected`, if any
    fn drain(&mut self) -> Result<()> {
        while let Some(result) = self.pending.remove(&self.next_expected) {
            self.sink
                .write_all(result.text.as_bytes())
                .context("Failed to write chunk to output")?;
            if !result.text.ends_with('\n') {
                self.sink
                    .write_all(b"\n")
                    .context("Failed to write line terminator to output")?;
            }
            self.sink.flush().context("Failed to flush output")?;

            self.next_expected += 1;

            // Persisting progress is best-effort: losing it costs resumability,
            // not correctness
            if let Err(e) = self.store.save(self.next_expected) {
                warn!("Failed to persist progress ({} chunks done): {}", self.next_expected, e);
            }

            self.events.emit(ProgressEvent::ChunkCompleted {
                completed: self.next_expected,
                total: self.total_chunks,
            });
        }
        Ok(())
    }

    /// Final drain at run termination.
    ///
    /// Flushes whatever is still contiguous with `next_expected`; results
    /// beyond a gap are discarded rather than written out of order (they are
    /// re-translated on resume). Deletes the progress record when the run
    /// completed fully. Returns the final completed count.
    pub fn finish(&mut self) -> Result<usize> {
        self.drain()?;

        if !self.pending.is_empty() {
            let skipped: Vec<usize> = self.pending.keys().copied().collect();
            warn!(
                "Discarding {} non-contiguous buffered result(s) at shutdown: chunks {:?}",
                skipped.len(),
                skipped
            );
            self.pending.clear();
        }

        if self.is_complete() {
            if let Err(e) = self.store.clear() {
                warn!("Failed to remove progress file after completion: {}", e);
            }
        }

        Ok(self.next_expected)
    }
}
