/*!
 * The chunk translation engine.
 *
 * This module contains the layers between raw chunks and the ordered output:
 * - `translation::adapter`: one classified provider call per attempt
 * - `translation::retry`: bounded safety/quality retry loops per chunk
 * - `translation::pipeline`: bounded-concurrency dispatch and collection
 */

pub mod adapter;
pub mod retry;
pub mod pipeline;

pub use adapter::{ChunkTranslator, GeminiTranslator, QuotaDetector, TranslationOutcome};
pub use pipeline::{InterruptReason, RunOutcome, TranslationPipeline};
pub use retry::{ChunkResult, ResultDisposition, RetryPolicy, COULD_NOT_IMPROVE_MARKER};
