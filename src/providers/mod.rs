/*!
 * Provider implementations for the translation service.
 *
 * This module contains the client seam the translation pipeline talks
 * through:
 * - Gemini: Google Gemini generateContent API
 * - Mock: scripted provider used by the test suites
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::ProviderError;

/// Common trait for LLM providers
///
/// Defines the interface every provider client must follow so the
/// translation adapter can drive them interchangeably. All service-specific
/// response-shape parsing stays behind this boundary.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// The request type for this provider
    type Request: Send + Sync;

    /// The response type for this provider
    type Response: Send + Sync;

    /// Complete a request using this provider
    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError>;

    /// Test the connection to the provider
    async fn test_connection(&self) -> Result<(), ProviderError>;

    /// Extract the generated text from a provider response
    fn extract_text(response: &Self::Response) -> String;
}

pub mod gemini;
pub mod mock;
