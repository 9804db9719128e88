/*!
 * Mock chunk translator for testing.
 *
 * Behaviors cover the outcome classes the pipeline has to handle:
 * - `MockTranslator::working()` - always succeeds with translated text
 * - `MockTranslator::safety_blocked()` - every attempt is policy-blocked
 * - `MockTranslator::low_quality()` - every attempt is a refusal
 * - `MockTranslator::erroring()` - transport failure on every call
 * - `MockTranslator::quota_exhausted()` - quota signal on every call
 *
 * Per-call latency and per-chunk behavior can be scripted by chunk text so
 * tests can force reverse or random completion orders and targeted failures.
 */

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::Rng;

use crate::translation::adapter::{ChunkTranslator, TranslationOutcome};

/// Behavior mode for the mock translator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockBehavior {
    /// Always succeeds with a proper translation
    Working,
    /// Every attempt is rejected by the safety filter
    SafetyBlocked,
    /// Every attempt is an empty/refusal response
    LowQuality,
    /// Every call fails at the transport level
    Erroring,
    /// Every call reports quota exhaustion
    QuotaExhausted,
    /// Succeeds only from the given global attempt number on (1-based)
    SucceedAfter { attempts: usize },
}

/// Scripted chunk translator for the test suites
pub struct MockTranslator {
    behavior: MockBehavior,
    call_count: Arc<AtomicUsize>,
    /// Every chunk text received, in call order
    received: Mutex<Vec<String>>,
    /// Fixed latency applied to every call
    base_delay: Duration,
    /// Upper bound for random extra latency, 0 to disable
    jitter_ms: u64,
    /// Per-text latency overrides, keyed by the exact chunk text
    scripted_delays: Mutex<HashMap<String, Duration>>,
    /// Per-text behavior overrides, keyed by the exact chunk text
    scripted_behaviors: Mutex<HashMap<String, MockBehavior>>,
}

impl MockTranslator {
    /// Create a mock with the given behavior and no latency
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            call_count: Arc::new(AtomicUsize::new(0)),
            received: Mutex::new(Vec::new()),
            base_delay: Duration::ZERO,
            jitter_ms: 0,
            scripted_delays: Mutex::new(HashMap::new()),
            scripted_behaviors: Mutex::new(HashMap::new()),
        }
    }

    /// A mock that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// A mock whose every attempt is safety-blocked
    pub fn safety_blocked() -> Self {
        Self::new(MockBehavior::SafetyBlocked)
    }

    /// A mock whose every attempt is a refusal
    pub fn low_quality() -> Self {
        Self::new(MockBehavior::LowQuality)
    }

    /// A mock that fails at the transport level on every call
    pub fn erroring() -> Self {
        Self::new(MockBehavior::Erroring)
    }

    /// A mock that reports quota exhaustion on every call
    pub fn quota_exhausted() -> Self {
        Self::new(MockBehavior::QuotaExhausted)
    }

    /// Add a fixed latency to every call
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Add up to `jitter_ms` of random extra latency per call
    pub fn with_jitter(mut self, jitter_ms: u64) -> Self {
        self.jitter_ms = jitter_ms;
        self
    }

    /// Script the latency for calls whose chunk text equals `text`
    pub fn with_scripted_delay(self, text: impl Into<String>, delay: Duration) -> Self {
        self.scripted_delays.lock().insert(text.into(), delay);
        self
    }

    /// Script the behavior for calls whose chunk text equals `text`
    pub fn with_scripted_behavior(self, text: impl Into<String>, behavior: MockBehavior) -> Self {
        self.scripted_behaviors.lock().insert(text.into(), behavior);
        self
    }

    /// Number of translate calls made so far
    pub fn calls(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Chunk texts received so far, in call order
    pub fn received_texts(&self) -> Vec<String> {
        self.received.lock().clone()
    }

    async fn apply_latency(&self, chunk_text: &str) {
        let scripted = self.scripted_delays.lock().get(chunk_text).copied();
        let mut delay = scripted.unwrap_or(self.base_delay);
        if self.jitter_ms > 0 {
            let extra = rand::rng().random_range(0..=self.jitter_ms);
            delay += Duration::from_millis(extra);
        }
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl ChunkTranslator for MockTranslator {
    async fn translate(&self, chunk_text: &str) -> TranslationOutcome {
        let attempt = self.call_count.fetch_add(1, Ordering::SeqCst) + 1;
        self.received.lock().push(chunk_text.to_string());
        self.apply_latency(chunk_text).await;

        let behavior = self
            .scripted_behaviors
            .lock()
            .get(chunk_text)
            .copied()
            .unwrap_or(self.behavior);

        match behavior {
            MockBehavior::Working => {
                TranslationOutcome::success(format!("[TRANSLATED] {}", chunk_text))
            }
            MockBehavior::SafetyBlocked => TranslationOutcome::safety_blocked(
                "[TRANSLATION BLOCKED BY SAFETY FILTER: MOCK]".to_string(),
            ),
            MockBehavior::LowQuality => TranslationOutcome::low_quality(String::new()),
            MockBehavior::Erroring => TranslationOutcome::low_quality(
                "[API ERROR WHILE TRANSLATING CHUNK: mock transport failure]".to_string(),
            ),
            MockBehavior::QuotaExhausted => TranslationOutcome::quota_exceeded(
                "[API ERROR WHILE TRANSLATING CHUNK: 429 RESOURCE_EXHAUSTED quota]".to_string(),
            ),
            MockBehavior::SucceedAfter { attempts } => {
                if attempt >= attempts {
                    TranslationOutcome::success(format!("[TRANSLATED] {}", chunk_text))
                } else {
                    TranslationOutcome::low_quality(String::new())
                }
            }
        }
    }
}
