//! Generation client for the hosted generative-language API.
//!
//! The [`Generator`] trait defines the one-request-per-prompt interface;
//! [`GeminiDriver`] implements it against the Google generative language
//! REST API. [`GenerationClient`] is the boundary the chat session talks
//! to: it converts every failure into a fixed fallback string, so callers
//! above it never see a typed error.

pub mod gemini;

pub use gemini::GeminiDriver;

use std::sync::Arc;

use thiserror::Error;
use tracing::error;

/// Connection and model settings for the generation endpoint.
#[derive(Debug, Clone)]
pub struct GenerationSettings {
    /// Base URL for the API (e.g., `https://generativelanguage.googleapis.com`).
    pub base_url: String,
    /// API key, embedded in the request URL per the Gemini REST convention.
    pub api_key: String,
    /// Model identifier (e.g., `gemini-1.5-flash`).
    pub model: String,
}

/// Failure of a single generation request.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Transport or HTTP-level failure.
    #[error("generation request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// The provider replied, but without an extractable text candidate.
    #[error("generation response carried no text candidate")]
    MalformedResponse,
}

/// Trait for one-shot text generation drivers.
#[async_trait::async_trait]
pub trait Generator: Send + Sync {
    /// Generate a reply for the prompt.
    ///
    /// # Errors
    ///
    /// Returns an error on any transport or API-level failure.
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// Reply substituted for any failed generation request.
pub const FALLBACK_REPLY: &str =
    "Sorry, I encountered an error while processing your request.";

/// Error-swallowing wrapper around a [`Generator`].
#[derive(Clone)]
pub struct GenerationClient {
    driver: Arc<dyn Generator>,
}

impl std::fmt::Debug for GenerationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationClient").finish()
    }
}

impl GenerationClient {
    /// Wrap a driver.
    #[must_use]
    pub fn new(driver: Arc<dyn Generator>) -> Self {
        Self { driver }
    }

    /// Generate a reply, substituting [`FALLBACK_REPLY`] on failure.
    pub async fn reply(&self, prompt: &str) -> String {
        match self.driver.generate(prompt).await {
            Ok(text) => text,
            Err(e) => {
                error!(
                    name: "llm.generate.failed",
                    error = %e,
                    "Generation request failed"
                );
                FALLBACK_REPLY.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;

    #[async_trait::async_trait]
    impl Generator for Failing {
        async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
            Err(GenerationError::MalformedResponse)
        }
    }

    #[tokio::test]
    async fn test_failure_becomes_fallback_reply() {
        let client = GenerationClient::new(Arc::new(Failing));
        assert_eq!(client.reply("hello").await, FALLBACK_REPLY);
    }
}
