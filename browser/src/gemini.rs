//! HTTP summarizer backed by a hosted generative language model.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::DisplayRecord;
use crate::sampler::Summarizer;

/// Default API base URL.
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default model name.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Summarizer that asks a `generateContent` endpoint to describe a sample.
pub struct GeminiSummarizer {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl GeminiSummarizer {
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: api_key.into(),
        })
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }
}

#[async_trait]
impl Summarizer for GeminiSummarizer {
    async fn summarize(&self, sample: &[DisplayRecord], set_name: &str) -> Result<String> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(build_prompt(sample, set_name)?),
                }],
            }],
        };

        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::SummarizationFailed(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, body = %body, "summarization request rejected");
            return Err(Error::SummarizationFailed(format!(
                "model endpoint returned {}",
                status
            )));
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| Error::SummarizationFailed(format!("invalid response: {}", e)))?;
        body.text()
            .ok_or_else(|| Error::SummarizationFailed("response contained no text".to_string()))
    }
}

/// Builds the summarization prompt for a sample of `set_name`.
pub fn build_prompt(sample: &[DisplayRecord], set_name: &str) -> Result<String> {
    let bins: Vec<_> = sample.iter().map(|r| &r.bins).collect();
    let sample_json = serde_json::to_string_pretty(&bins)?;
    Ok(format!(
        "Analyze the following sample of JSON objects, which are records from a set named \"{set_name}\" \
         in a clustered key-value store.\n\
         Give a brief, user-friendly summary of the data schema in Markdown.\n\
         Describe the likely purpose of the most important bins (fields) and their data types.\n\
         Do not just list the fields; explain what the data represents as a whole.\n\n\
         Sample records:\n{sample_json}\n"
    ))
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl GenerateContentResponse {
    /// Concatenates the text parts of the first candidate.
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        (!text.is_empty()).then_some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn should_include_set_name_and_bins_in_prompt() {
        // given
        let sample = vec![DisplayRecord {
            key: "user_1".to_string(),
            bins: [("email".to_string(), json!("a@example.com"))]
                .into_iter()
                .collect(),
        }];

        // when
        let prompt = build_prompt(&sample, "profiles").unwrap();

        // then
        assert!(prompt.contains("\"profiles\""));
        assert!(prompt.contains("\"email\": \"a@example.com\""));
        assert!(!prompt.contains("user_1"));
    }

    #[test]
    fn should_join_text_parts_of_first_candidate() {
        // given
        let body = json!({
            "candidates": [
                {"content": {"parts": [{"text": "## Schema\n"}, {"text": "Users."}]}},
                {"content": {"parts": [{"text": "ignored"}]}}
            ]
        });

        // when
        let response: GenerateContentResponse = serde_json::from_value(body).unwrap();

        // then
        assert_eq!(response.text().as_deref(), Some("## Schema\nUsers."));
    }

    #[test]
    fn should_report_missing_text() {
        // given
        let response: GenerateContentResponse =
            serde_json::from_value(json!({"candidates": []})).unwrap();

        // then
        assert!(response.text().is_none());
    }

    #[test]
    fn should_build_generate_content_url() {
        // given
        let summarizer = GeminiSummarizer::new(
            "https://example.test/v1beta/",
            DEFAULT_MODEL,
            "key",
            Duration::from_secs(5),
        )
        .unwrap();

        // then
        assert_eq!(
            summarizer.url(),
            "https://example.test/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }
}
