/*!
 * Bounded retries around the translation adapter.
 *
 * Two independent retry loops per chunk, outer to inner: safety-block
 * retries, and low-quality retries nested inside each safety attempt. Both
 * are capped with a fixed delay between attempts. Exhaustion never fails the
 * run: the last text (a diagnostic marker for safety blocks, the best
 * attempt plus an inline marker for low quality) becomes the chunk's output
 * so the caller keeps visibility instead of silence.
 */

use std::time::Duration;

use tokio::time::sleep;

use crate::cancellation::CancellationToken;
use crate::chunker::Chunk;
use crate::translation::adapter::ChunkTranslator;

/// Marker appended when the low-quality retry cap runs out
pub const COULD_NOT_IMPROVE_MARKER: &str = "[COULD NOT IMPROVE]";

/// How a chunk's final result came to be
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultDisposition {
    /// A translation (possibly degraded with an inline marker) to be flushed
    Translated,
    /// The worker observed cancellation before completing; nothing to flush
    Cancelled,
    /// The provider reported quota exhaustion; the run must stop
    QuotaExhausted,
}

/// Final outcome for one chunk after retries succeeded or were exhausted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkResult {
    /// Index of the chunk this result belongs to
    pub index: usize,

    /// Final text for the chunk
    pub text: String,

    /// Source lines covered, for progress accounting
    pub line_count: usize,

    /// Whether this result carries a translation at all
    pub disposition: ResultDisposition,
}

impl ChunkResult {
    fn translated(chunk: &Chunk, text: String) -> Self {
        Self {
            index: chunk.index,
            text,
            line_count: chunk.line_count(),
            disposition: ResultDisposition::Translated,
        }
    }

    fn cancelled(chunk: &Chunk) -> Self {
        Self {
            index: chunk.index,
            text: String::new(),
            line_count: chunk.line_count(),
            disposition: ResultDisposition::Cancelled,
        }
    }

    fn quota_exhausted(chunk: &Chunk, text: String) -> Self {
        Self {
            index: chunk.index,
            text,
            line_count: chunk.line_count(),
            disposition: ResultDisposition::QuotaExhausted,
        }
    }

    /// True when the writer may flush this result
    pub fn is_translated(&self) -> bool {
        self.disposition == ResultDisposition::Translated
    }
}

/// Retry caps and pacing
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempts allowed when every response is safety-blocked
    pub max_safety_retries: u32,

    /// Attempts allowed per safety cycle when responses are low quality
    pub max_quality_retries: u32,

    /// Fixed, non-busy wait between attempts
    pub retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_safety_retries: 5,
            max_quality_retries: 5,
            retry_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// A policy with no inter-attempt delay, for tests
    pub fn without_delay(max_safety_retries: u32, max_quality_retries: u32) -> Self {
        Self {
            max_safety_retries,
            max_quality_retries,
            retry_delay: Duration::ZERO,
        }
    }
}

/// Translate one chunk through the adapter, applying the retry policy.
///
/// Cancellation is checked before every API call; a cancelled chunk returns
/// immediately without consuming the adapter. Whitespace-only chunks bypass
/// the adapter entirely: no call, no retry, no cost.
pub async fn translate_chunk(
    adapter: &dyn ChunkTranslator,
    chunk: &Chunk,
    policy: &RetryPolicy,
    token: &CancellationToken,
) -> ChunkResult {
    let chunk_text = chunk.joined_text();
    if chunk_text.trim().is_empty() {
        return ChunkResult::translated(chunk, String::new());
    }

    let mut safety_retries = 0u32;
    loop {
        let mut quality_retries = 0u32;
        let blocked_outcome = loop {
            if token.is_cancelled() {
                return ChunkResult::cancelled(chunk);
            }

            let outcome = adapter.translate(&chunk_text).await;

            if outcome.quota_exceeded {
                // Retrying is pointless once the quota is gone
                return ChunkResult::quota_exhausted(chunk, outcome.text);
            }
            if outcome.safety_blocked {
                break outcome;
            }
            if !outcome.low_quality {
                return ChunkResult::translated(chunk, outcome.text);
            }

            quality_retries += 1;
            if quality_retries >= policy.max_quality_retries {
                let text = if outcome.text.is_empty() {
                    COULD_NOT_IMPROVE_MARKER.to_string()
                } else {
                    format!("{} {}", outcome.text, COULD_NOT_IMPROVE_MARKER)
                };
                return ChunkResult::translated(chunk, text);
            }
            sleep(policy.retry_delay).await;
        };

        safety_retries += 1;
        if safety_retries >= policy.max_safety_retries {
            // Surface the block reason inline rather than failing the run
            return ChunkResult::translated(chunk, blocked_outcome.text);
        }
        sleep(policy.retry_delay).await;
    }
}
