//! Direct Gemini client for image analysis.
//!
//! This module provides a client that connects directly to Google's Gemini
//! generateContent API. Users provide their own Gemini API key.

use crate::analysis::Analysis;
use crate::capture::{CaptureArtifact, CaptureFormat};
use crate::error::AnalysisError;
use crate::pipeline::VisionAnalyzer;
use anyhow::Context;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info, instrument};
use zeroize::Zeroize;

/// Gemini API endpoint, completed with `{model}:generateContent`.
const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Upper bound for one analysis call, file read and upload included.
const ANALYSIS_TIMEOUT_SECS: u64 = 120;

/// Instruction that shapes the reply into the marker format the parser
/// in [`crate::analysis`] expects.
const SYSTEM_INSTRUCTION: &str = r#"Analyze this educational image and provide:

1. **Summary:** A brief, concise summary (2-3 sentences max) of the main concept shown.

2. **Multiple Choice Question:** Create a multiple choice question with 4 options (A, B, C, D) to test understanding. Mark the correct answer.

Format your response exactly as:
**Summary:**
[Your concise summary here]

**Question:**
[Your question here]
A) [Option A]
B) [Option B]
C) [Option C]
D) [Option D]

**Correct Answer:** [Letter]"#;

/// Client for direct Gemini generateContent API calls.
pub(crate) struct GeminiClient {
    api_key: String,
    model: String,
    client: reqwest::Client,
}

/// Request body for the Gemini generateContent API.
#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

/// One content block holding the prompt and the image.
#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

/// Part of a content block; the API accepts snake_case field names.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    InlineData { inline_data: Blob },
}

/// Base64-encoded image payload.
#[derive(Debug, Serialize)]
struct Blob {
    mime_type: String,
    data: String,
}

/// Response from the Gemini generateContent API.
///
/// Lenient on shape: a safety-blocked reply may carry no candidates at
/// all, which must surface as an analysis error, not a parse panic.
#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

fn build_prompt() -> String {
    format!(
        "{}\n\nPlease analyze this educational content image:",
        SYSTEM_INSTRUCTION
    )
}

fn mime_type(format: &CaptureFormat) -> String {
    match format {
        CaptureFormat::Png => "image/png".to_string(),
        CaptureFormat::Jpeg => "image/jpeg".to_string(),
        CaptureFormat::Other(ext) => format!("image/{}", ext),
    }
}

impl GeminiClient {
    /// Create a new Gemini client for the given key and model.
    pub(crate) fn new(api_key: String, model: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(ANALYSIS_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .context("Failed to create HTTP client for GeminiClient")?;

        Ok(Self {
            api_key,
            model: model.to_string(),
            client,
        })
    }

    /// One analysis attempt: read the capture, upload it, extract the
    /// reply text. No retries; the next hotkey press is the retry.
    async fn request_analysis(&self, artifact: &CaptureArtifact) -> Result<String, AnalysisError> {
        let bytes = tokio::fs::read(&artifact.path).await?;
        let request_body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text {
                        text: build_prompt(),
                    },
                    Part::InlineData {
                        inline_data: Blob {
                            mime_type: mime_type(&artifact.format),
                            data: STANDARD.encode(&bytes),
                        },
                    },
                ],
            }],
        };

        let url = format!("{}/{}:generateContent", GEMINI_API_BASE, self.model);
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(AnalysisError::ServerError { status, message });
        }

        let reply: GenerateContentResponse = response.json().await.map_err(|e| {
            AnalysisError::InvalidResponse(format!("Failed to parse Gemini response: {}", e))
        })?;

        Self::extract_text(&reply)
    }

    /// Extract the reply text from the Gemini response structure.
    fn extract_text(response: &GenerateContentResponse) -> Result<String, AnalysisError> {
        response
            .candidates
            .first()
            .map(|candidate| {
                candidate
                    .content
                    .parts
                    .iter()
                    .map(|part| part.text.as_str())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .filter(|text| !text.is_empty())
            .ok_or_else(|| {
                AnalysisError::InvalidResponse("No text content in Gemini response".into())
            })
    }
}

#[async_trait]
impl VisionAnalyzer for GeminiClient {
    /// Analyze a capture with the vision model.
    ///
    /// Never fails outward: timeouts, network faults, server errors, and
    /// unreadable files all fold into an [`Analysis`] with
    /// `success == false`, so one bad call cannot take the pipeline down.
    #[instrument(skip(self, artifact), fields(path = %artifact.path.display()))]
    async fn analyze(&self, artifact: &CaptureArtifact) -> Analysis {
        info!(model = %self.model, "Sending request to Gemini API...");
        let deadline = Duration::from_secs(ANALYSIS_TIMEOUT_SECS);
        let outcome = match tokio::time::timeout(deadline, self.request_analysis(artifact)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(AnalysisError::Timeout(ANALYSIS_TIMEOUT_SECS)),
        };

        match outcome {
            Ok(reply) => {
                info!("Gemini API response received.");
                Analysis::from_reply(&reply)
            }
            Err(e) => {
                error!("Gemini API error: {}", e);
                Analysis::failure(e)
            }
        }
    }
}

impl Drop for GeminiClient {
    fn drop(&mut self) {
        // Clear API key from memory
        self.api_key.zeroize();
    }
}
