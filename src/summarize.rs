use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::metadata::VideoMetadata;
use crate::{Error, Result, VideoId};

const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Transcript excerpt cutoff, in characters
pub const TRANSCRIPT_EXCERPT_CHARS: usize = 4000;

const API_KEY_HEADER: &str = "x-goog-api-key";

const TEMPERATURE: f64 = 0.8;
const TOP_P: f64 = 0.95;
const MAX_OUTPUT_TOKENS: u32 = 2048;

const UNKNOWN_TITLE: &str = "Unknown Title";
const UNKNOWN_CHANNEL: &str = "Unknown Channel";

/// How long the summary should be
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DetailLevel {
    Brief,
    #[default]
    Medium,
    Detailed,
}

impl DetailLevel {
    fn directive(self) -> &'static str {
        match self {
            DetailLevel::Brief => "Provide a 2-3 sentence summary explaining what this video teaches.",
            DetailLevel::Medium => {
                "Write a 2-3 paragraph summary covering main topics, what viewers learn, and who should watch."
            }
            DetailLevel::Detailed => {
                "Write a 4-5 paragraph comprehensive analysis including detailed concepts, takeaways, and target audience."
            }
        }
    }
}

impl std::fmt::Display for DetailLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DetailLevel::Brief => write!(f, "brief"),
            DetailLevel::Medium => write!(f, "medium"),
            DetailLevel::Detailed => write!(f, "detailed"),
        }
    }
}

impl std::str::FromStr for DetailLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "brief" => Ok(DetailLevel::Brief),
            "medium" => Ok(DetailLevel::Medium),
            "detailed" => Ok(DetailLevel::Detailed),
            other => Err(format!("unknown detail level '{other}' (expected brief, medium or detailed)")),
        }
    }
}

/// Generated summary text and how it was produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generated {
    pub text: String,
    pub fallback: bool,
}

/// A generative-text backend. Errors come back as `Error::GenerationFailed`.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Produces summaries, calling the backend when one is configured and
/// falling back to fixed templates when none is.
#[derive(Clone, Default)]
pub struct SummaryGenerator {
    backend: Option<Arc<dyn TextGenerator>>,
}

impl SummaryGenerator {
    pub fn new(backend: Option<Arc<dyn TextGenerator>>) -> Self {
        Self { backend }
    }

    pub fn is_configured(&self) -> bool {
        self.backend.is_some()
    }

    pub async fn summarize(
        &self,
        video_id: &VideoId,
        level: DetailLevel,
        metadata: Option<&VideoMetadata>,
        transcript: Option<&str>,
    ) -> Result<Generated> {
        let Some(backend) = &self.backend else {
            warn!("No generative-text API key configured, using fallback summary for {video_id}");
            return Ok(Generated {
                text: fallback_summary(level, metadata),
                fallback: true,
            });
        };

        let prompt = build_prompt(level, metadata, transcript);
        debug!("Generating {level} summary for {video_id} ({} prompt chars)", prompt.len());

        let text = backend.generate(&prompt).await?;
        info!("Summary received for {video_id}, length: {}", text.len());
        Ok(Generated { text, fallback: false })
    }
}

fn title_of(metadata: Option<&VideoMetadata>) -> &str {
    metadata.and_then(|m| m.title.as_deref()).unwrap_or(UNKNOWN_TITLE)
}

fn author_of(metadata: Option<&VideoMetadata>) -> &str {
    metadata.and_then(|m| m.author.as_deref()).unwrap_or(UNKNOWN_CHANNEL)
}

/// First `TRANSCRIPT_EXCERPT_CHARS` characters, cut without regard for word boundaries
pub fn transcript_excerpt(transcript: &str) -> &str {
    match transcript.char_indices().nth(TRANSCRIPT_EXCERPT_CHARS) {
        Some((idx, _)) => &transcript[..idx],
        None => transcript,
    }
}

/// Build the single instruction sent to the generative-text backend
pub fn build_prompt(level: DetailLevel, metadata: Option<&VideoMetadata>, transcript: Option<&str>) -> String {
    let excerpt = transcript
        .map(|t| format!("TRANSCRIPT EXCERPT: {}", transcript_excerpt(t)))
        .unwrap_or_default();

    format!(
        "Analyze this YouTube video:\n\n\
         TITLE: \"{title}\"\n\
         CHANNEL: \"{channel}\"\n\n\
         {excerpt}\n\n\
         {directive}\n\n\
         Be specific about content based on the title and transcript (if available). Write directly without preamble.",
        title = title_of(metadata),
        channel = author_of(metadata),
        directive = level.directive(),
    )
}

/// Deterministic summary used when no backend is configured
pub fn fallback_summary(level: DetailLevel, metadata: Option<&VideoMetadata>) -> String {
    let title = title_of(metadata);
    let channel = author_of(metadata);

    match level {
        DetailLevel::Brief => format!(
            "\"{title}\" by {channel} explains the topic in a clear, concise manner, covering the key concepts \
             and providing valuable insights for viewers."
        ),
        DetailLevel::Medium => format!(
            "\"{title}\" by {channel} provides comprehensive coverage of the subject. The video explores the main \
             concepts, explains important details, and offers practical knowledge that viewers can apply. This \
             content is valuable for anyone interested in learning more about this topic."
        ),
        DetailLevel::Detailed => format!(
            "\"{title}\" is a detailed video by {channel} that thoroughly explores the subject matter. The content \
             covers fundamental concepts, provides in-depth explanations, and offers practical insights that enhance \
             understanding. The presentation is structured to progressively build knowledge, making it accessible \
             for various skill levels. This video serves as a valuable resource for viewers seeking to deepen their \
             expertise in this area."
        ),
    }
}

/// Google Gemini `generateContent` backend
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    api_base: String,
}

impl GeminiClient {
    pub fn new(client: reqwest::Client, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_api_base(client, api_key, model, DEFAULT_API_BASE)
    }

    pub fn with_api_base(
        client: reqwest::Client,
        api_key: impl Into<String>,
        model: impl Into<String>,
        api_base: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
            api_base: api_base.into(),
        }
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        debug!("Calling Gemini API with model {}", self.model);

        let url = format!("{}/models/{}:generateContent", self.api_base, self.model);
        let body = serde_json::json!({
            "contents": [
                {
                    "parts": [{ "text": prompt }]
                }
            ],
            "generationConfig": {
                "temperature": TEMPERATURE,
                "maxOutputTokens": MAX_OUTPUT_TOKENS,
                "topP": TOP_P
            }
        });

        let resp = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::GenerationFailed(format!("Gemini API request failed: {e}")))?;

        let status = resp.status();
        debug!("Gemini API response status: {status}");

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let reason = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|json| extract_gemini_error(&json))
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string());
            return Err(Error::GenerationFailed(format!("Gemini API failed: {reason}")));
        }

        let json: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| Error::GenerationFailed(format!("Gemini API returned malformed JSON: {e}")))?;
        extract_gemini_text(&json)
    }
}

fn extract_gemini_text(json: &serde_json::Value) -> Result<String> {
    json.get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.get(0))
        .and_then(|p| p.get("text"))
        .and_then(|t| t.as_str())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .ok_or_else(|| Error::GenerationFailed("unexpected Gemini API response format".to_string()))
}

fn extract_gemini_error(json: &serde_json::Value) -> Option<String> {
    json.get("error")
        .and_then(|e| e.get("message"))
        .and_then(|m| m.as_str())
        .map(str::to_string)
}
