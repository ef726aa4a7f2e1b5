//! Driver for the Google generative language REST API.

use super::{GenerationError, GenerationSettings, Generator};

/// Driver issuing one `generateContent` request per prompt.
#[derive(Clone)]
pub struct GeminiDriver {
    http: reqwest::Client,
    settings: GenerationSettings,
}

impl std::fmt::Debug for GeminiDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiDriver")
            .field("base_url", &self.settings.base_url)
            .field("model", &self.settings.model)
            .finish()
    }
}

impl GeminiDriver {
    /// Create a new driver with the given settings.
    #[must_use]
    pub fn new(settings: GenerationSettings) -> Self {
        Self {
            http: reqwest::Client::new(),
            settings,
        }
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.settings.base_url.trim_end_matches('/'),
            self.settings.model,
            self.settings.api_key
        )
    }
}

#[async_trait::async_trait]
impl Generator for GeminiDriver {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let body = serde_json::json!({
            "contents": [{
                "parts": [{ "text": prompt }]
            }]
        });

        let resp = self
            .http
            .post(self.generate_url())
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let v: serde_json::Value = resp.json().await?;
        extract_text(&v).ok_or(GenerationError::MalformedResponse)
    }
}

/// Pull the reply text out of a `generateContent` response.
fn extract_text(v: &serde_json::Value) -> Option<String> {
    v["candidates"][0]["content"]["parts"][0]["text"]
        .as_str()
        .map(ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_text() {
        let v = serde_json::json!({
            "candidates": [{
                "content": {
                    "parts": [{ "text": "hi there" }],
                    "role": "model"
                },
                "finishReason": "STOP"
            }]
        });
        assert_eq!(extract_text(&v).unwrap(), "hi there");
    }

    #[test]
    fn test_extract_text_missing_candidate() {
        assert!(extract_text(&serde_json::json!({})).is_none());
        assert!(extract_text(&serde_json::json!({"candidates": []})).is_none());
        assert!(
            extract_text(&serde_json::json!({
                "candidates": [{ "content": { "parts": [] } }]
            }))
            .is_none()
        );
    }

    #[test]
    fn test_generate_url() {
        let driver = GeminiDriver::new(GenerationSettings {
            base_url: "https://generativelanguage.googleapis.com/".to_string(),
            api_key: "k".to_string(),
            model: "gemini-1.5-flash".to_string(),
        });
        assert_eq!(
            driver.generate_url(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent?key=k"
        );
    }
}
