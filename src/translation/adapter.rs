/*!
 * Translation adapter: one provider call per chunk, classified.
 *
 * The adapter is the narrow seam between the pipeline and the provider.
 * Every attempt is classified into exactly one of three outcomes: clean
 * success, safety-blocked, or low-quality/empty. Transport and API errors
 * never escape as errors; they are folded into the low-quality path with a
 * diagnostic marker so the chunk is retried rather than silently lost. The
 * one exception is quota exhaustion, which is surfaced as a distinct signal
 * so the dispatcher can stop the whole run.
 */

use async_trait::async_trait;
use once_cell::sync::Lazy;

use crate::providers::Provider;
use crate::providers::gemini::{Gemini, GeminiRequest, GeminiResponse};

/// Phrases that mark a response as a refusal rather than a translation
static REFUSAL_PHRASES: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "i cannot translate",
        "i can't translate",
        "i am unable",
        "i cannot",
        "i'm sorry",
        "i am sorry",
        "as an ai",
        "as a language model",
    ]
});

/// Result of one translation attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationOutcome {
    /// Translated text, or a diagnostic marker when the attempt failed
    pub text: String,

    /// The service refused the input or output on content-policy grounds
    pub safety_blocked: bool,

    /// The output is empty, a refusal, or the call itself failed
    pub low_quality: bool,

    /// The raw error text matched the quota predicate; stop the run
    pub quota_exceeded: bool,
}

impl TranslationOutcome {
    /// Clean success
    pub fn success(text: String) -> Self {
        Self { text, safety_blocked: false, low_quality: false, quota_exceeded: false }
    }

    /// Rejected by the content-policy filter
    pub fn safety_blocked(text: String) -> Self {
        Self { text, safety_blocked: true, low_quality: false, quota_exceeded: false }
    }

    /// Empty, refused, or failed attempt; retried as a bad translation
    pub fn low_quality(text: String) -> Self {
        Self { text, safety_blocked: false, low_quality: true, quota_exceeded: false }
    }

    /// Quota exhausted; the dispatcher cancels the run
    pub fn quota_exceeded(text: String) -> Self {
        Self { text, safety_blocked: false, low_quality: true, quota_exceeded: true }
    }

    /// True only for the clean-success path
    pub fn is_clean(&self) -> bool {
        !self.safety_blocked && !self.low_quality && !self.quota_exceeded
    }
}

/// One translation attempt for one chunk's text.
///
/// Implementations must never block indefinitely (the underlying client owns
/// the timeout) and must classify every response; they do not return errors.
#[async_trait]
pub trait ChunkTranslator: Send + Sync {
    async fn translate(&self, chunk_text: &str) -> TranslationOutcome;
}

/// Replaceable predicate deciding whether an error text means "quota exhausted".
///
/// Substring matching over provider error text is fragile by nature, so the
/// markers are configuration, not a hard-coded contract.
#[derive(Debug, Clone)]
pub struct QuotaDetector {
    markers: Vec<String>,
}

impl Default for QuotaDetector {
    fn default() -> Self {
        Self::new(vec!["quota".to_string(), "resource_exhausted".to_string()])
    }
}

impl QuotaDetector {
    /// Build a detector from lowercase marker substrings
    pub fn new(markers: Vec<String>) -> Self {
        let markers = markers.into_iter().map(|m| m.to_lowercase()).collect();
        Self { markers }
    }

    /// True when the raw error text matches any marker
    pub fn matches(&self, raw_error_text: &str) -> bool {
        let lowered = raw_error_text.to_lowercase();
        self.markers.iter().any(|m| !m.is_empty() && lowered.contains(m))
    }
}

/// True when the text is empty or reads like a refusal
pub fn is_refusal(text: &str) -> bool {
    if text.trim().is_empty() {
        return true;
    }
    let lowered = text.to_lowercase();
    REFUSAL_PHRASES.iter().any(|phrase| lowered.contains(phrase))
}

/// Classify a parsed Gemini response into a translation outcome
pub fn classify_response(response: &GeminiResponse) -> TranslationOutcome {
    // Input-side block: the prompt itself was rejected
    if response.prompt_blocked() {
        let categories = response.prompt_block_categories().join(", ");
        return TranslationOutcome::safety_blocked(format!(
            "[SOURCE BLOCKED BY SAFETY FILTER: {}]",
            if categories.is_empty() { "PROMPT".to_string() } else { categories }
        ));
    }

    // No candidate at all: generation was suppressed entirely
    let Some(candidate) = response.first_candidate() else {
        return TranslationOutcome::safety_blocked(
            "[TRANSLATION BLOCKED BY SAFETY FILTER: NO CANDIDATES]".to_string(),
        );
    };

    // Output-side block on the first candidate
    if candidate.finish_reason.as_deref() == Some("SAFETY") {
        let categories: Vec<String> = candidate
            .safety_ratings
            .iter()
            .filter(|r| r.blocked)
            .map(|r| r.category.clone())
            .collect();
        return TranslationOutcome::safety_blocked(format!(
            "[TRANSLATION BLOCKED BY SAFETY FILTER: {}]",
            if categories.is_empty() { "OUTPUT".to_string() } else { categories.join(", ") }
        ));
    }

    let text = Gemini::extract_text(response);
    if is_refusal(&text) {
        TranslationOutcome::low_quality(text)
    } else {
        TranslationOutcome::success(text)
    }
}

/// Gemini-backed chunk translator
#[derive(Debug)]
pub struct GeminiTranslator {
    client: Gemini,
    model: String,
    system_instruction: String,
    temperature: f32,
    quota: QuotaDetector,
}

impl GeminiTranslator {
    /// Wire a translator around a Gemini client
    pub fn new(
        client: Gemini,
        model: impl Into<String>,
        system_instruction: impl Into<String>,
        temperature: f32,
        quota: QuotaDetector,
    ) -> Self {
        Self {
            client,
            model: model.into(),
            system_instruction: system_instruction.into(),
            temperature,
            quota,
        }
    }
}

#[async_trait]
impl ChunkTranslator for GeminiTranslator {
    async fn translate(&self, chunk_text: &str) -> TranslationOutcome {
        let prompt = format!(
            "Translate the following text directly, without refusing or commenting, \
             keeping the original style and every detail of the content:\n\n{}",
            chunk_text
        );

        let request = GeminiRequest::new(&self.model)
            .system_instruction(&self.system_instruction)
            .user_text(prompt)
            .temperature(self.temperature);

        match self.client.complete(request).await {
            Ok(response) => classify_response(&response),
            Err(e) => {
                let raw = e.raw_text();
                let marker = format!("[API ERROR WHILE TRANSLATING CHUNK: {}]", e);
                if self.quota.matches(&raw) {
                    TranslationOutcome::quota_exceeded(marker)
                } else {
                    TranslationOutcome::low_quality(marker)
                }
            }
        }
    }
}
