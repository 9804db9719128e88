/*!
 * Structured progress events.
 *
 * The pipeline pushes events into an `EventSink` instead of printing; the
 * caller (CLI, tests, or a future GUI) subscribes by supplying a callback.
 */

use std::fmt;
use std::sync::Arc;
use std::path::PathBuf;

use parking_lot::Mutex;

/// Progress events emitted while a run is executing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// A run started: total chunk count and how many were already done
    Started {
        total_chunks: usize,
        resumed_from: usize,
    },

    /// A chunk was flushed to the output sink in order
    ChunkCompleted {
        completed: usize,
        total: usize,
    },

    /// The provider reported quota exhaustion; the run is stopping
    QuotaExceeded,

    /// The caller requested cancellation; partial progress persisted
    Cancelled {
        completed: usize,
        total: usize,
    },

    /// The run finished successfully; downstream hooks may consume the output
    Finished {
        output_path: PathBuf,
    },
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Started { total_chunks, resumed_from } => {
                write!(f, "started: {} chunks ({} already done)", total_chunks, resumed_from)
            }
            Self::ChunkCompleted { completed, total } => {
                write!(f, "chunk {}/{} completed", completed, total)
            }
            Self::QuotaExceeded => write!(f, "quota exceeded"),
            Self::Cancelled { completed, total } => {
                write!(f, "cancelled at {}/{} chunks", completed, total)
            }
            Self::Finished { output_path } => {
                write!(f, "run finished: {}", output_path.display())
            }
        }
    }
}

/// Cloneable subscriber handle for progress events
#[derive(Clone)]
pub struct EventSink {
    callback: Arc<dyn Fn(&ProgressEvent) + Send + Sync>,
}

impl EventSink {
    /// Build a sink from a callback
    pub fn new(callback: impl Fn(&ProgressEvent) + Send + Sync + 'static) -> Self {
        Self { callback: Arc::new(callback) }
    }

    /// A sink that discards every event
    pub fn noop() -> Self {
        Self::new(|_| {})
    }

    /// A sink that records every event, for tests and log panels
    pub fn capturing() -> (Self, Arc<Mutex<Vec<ProgressEvent>>>) {
        let captured: Arc<Mutex<Vec<ProgressEvent>>> = Arc::new(Mutex::new(Vec::new()));
        let buffer = Arc::clone(&captured);
        let sink = Self::new(move |event| buffer.lock().push(event.clone()));
        (sink, captured)
    }

    /// Push one event to the subscriber
    pub fn emit(&self, event: ProgressEvent) {
        (self.callback)(&event);
    }
}

impl fmt::Debug for EventSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSink").finish_non_exhaustive()
    }
}
