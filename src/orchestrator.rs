//! Request pipeline: URL validation, metadata and transcript enrichment,
//! summary generation and history bookkeeping.
//!
//! Only an invalid URL or a failed generation call ends a request in
//! `Failed`. Metadata and transcript lookups absorb their own failures.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use log::{debug, info, warn};
use serde::Serialize;
use tokio::sync::{mpsc, watch};

use crate::config::Config;
use crate::history::{HistoryEntry, HistoryStore};
use crate::metadata::{MetadataSource, OEmbedClient, VideoMetadata};
use crate::summarize::{DetailLevel, GeminiClient, SummaryGenerator, TextGenerator};
use crate::youtube::{CaptionSource, YouTubeCaptions};
use crate::{Error, Result, VideoId, extract_video_id};

const UNKNOWN_VIDEO: &str = "Unknown Video";

/// Where a request currently is
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Phase {
    #[default]
    Idle,
    Validating,
    FetchingMetadata,
    FetchingTranscript,
    Generating,
    Succeeded,
    Failed,
}

impl Phase {
    /// Human-readable progress for the phases that do network work
    pub fn label(self) -> Option<&'static str> {
        match self {
            Phase::FetchingMetadata => Some("Fetching video information..."),
            Phase::FetchingTranscript => Some("Fetching transcript..."),
            Phase::Generating => Some("Generating AI summary..."),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Succeeded | Phase::Failed)
    }
}

/// Snapshot published on every phase transition
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    pub phase: Phase,
    pub label: Option<&'static str>,
}

/// A finished summary and what went into it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryResult {
    pub video_id: VideoId,
    pub url: String,
    pub level: DetailLevel,
    pub metadata: Option<VideoMetadata>,
    pub text: String,
    pub used_transcript: bool,
    pub fallback: bool,
}

/// Working state of the latest request
#[derive(Debug, Clone, Default)]
pub struct RequestState {
    pub phase: Phase,
    pub error: Option<Error>,
    pub metadata: Option<VideoMetadata>,
    pub transcript: Option<String>,
    pub summary: Option<SummaryResult>,
}

impl RequestState {
    fn clear_display(&mut self) {
        self.metadata = None;
        self.transcript = None;
        self.summary = None;
    }
}

pub struct Orchestrator {
    metadata: Arc<dyn MetadataSource>,
    captions: Arc<dyn CaptionSource>,
    generator: SummaryGenerator,
    history: HistoryStore,
    state: RequestState,
    progress: watch::Sender<Progress>,
    listeners: Vec<mpsc::UnboundedSender<Progress>>,
    concurrent_fetch: bool,
}

impl Orchestrator {
    pub fn new(
        metadata: Arc<dyn MetadataSource>,
        captions: Arc<dyn CaptionSource>,
        generator: SummaryGenerator,
    ) -> Self {
        let (progress, _) = watch::channel(Progress::default());
        Self {
            metadata,
            captions,
            generator,
            history: HistoryStore::new(),
            state: RequestState::default(),
            progress,
            listeners: Vec::new(),
            concurrent_fetch: false,
        }
    }

    /// Wire up the production clients from configuration
    pub fn from_config(config: &Config) -> eyre::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs()))
            .build()?;

        let backend = config.gemini_api_key().map(|key| {
            info!("Gemini summarization enabled (model {})", config.gemini_model());
            Arc::new(GeminiClient::new(client.clone(), key, config.gemini_model())) as Arc<dyn TextGenerator>
        });
        if config.youtube_api_key().is_none() {
            info!("YouTube API key not configured, transcripts disabled");
        }

        let orchestrator = Self::new(
            Arc::new(OEmbedClient::new(client.clone())),
            Arc::new(YouTubeCaptions::new(client, config.youtube_api_key())),
            SummaryGenerator::new(backend),
        )
        .with_concurrent_fetch(config.concurrent_fetch.unwrap_or(false));
        Ok(orchestrator)
    }

    /// Fetch metadata and transcript together instead of one after the other
    pub fn with_concurrent_fetch(mut self, enabled: bool) -> Self {
        self.concurrent_fetch = enabled;
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<Progress> {
        self.progress.subscribe()
    }

    /// Every transition in order, including ones the watch channel would coalesce
    pub fn events(&mut self) -> mpsc::UnboundedReceiver<Progress> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.listeners.push(tx);
        rx
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn progress(&self) -> Progress {
        *self.progress.borrow()
    }

    pub fn state(&self) -> &RequestState {
        &self.state
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut HistoryStore {
        &mut self.history
    }

    pub fn generator(&self) -> &SummaryGenerator {
        &self.generator
    }

    fn transition(&mut self, phase: Phase) {
        debug!("Phase: {:?} -> {phase:?}", self.state.phase);
        self.state.phase = phase;
        let progress = Progress {
            phase,
            label: phase.label(),
        };
        self.listeners.retain(|tx| tx.send(progress).is_ok());
        self.progress.send_replace(progress);
    }

    fn fail(&mut self, error: Error) -> Result<SummaryResult> {
        warn!("Summarization failed: {error}");
        self.state.error = Some(error.clone());
        self.state.transcript = None;
        self.transition(Phase::Failed);
        Err(error)
    }

    /// Run one request end to end. Taking `&mut self` keeps a second
    /// submission from starting while this one is in flight.
    pub async fn summarize(&mut self, url: &str, level: DetailLevel) -> Result<SummaryResult> {
        self.state.error = None;
        self.transition(Phase::Idle);
        self.transition(Phase::Validating);

        let Some(video_id) = extract_video_id(url) else {
            return self.fail(Error::InvalidUrl {
                input: url.trim().to_string(),
            });
        };

        info!("Starting {level} summarization for video: {video_id}");
        self.state.clear_display();

        let (metadata, transcript) = if self.concurrent_fetch {
            self.transition(Phase::FetchingMetadata);
            self.transition(Phase::FetchingTranscript);
            tokio::join!(self.metadata.fetch(&video_id), self.captions.fetch(&video_id))
        } else {
            self.transition(Phase::FetchingMetadata);
            let metadata = self.metadata.fetch(&video_id).await;
            self.transition(Phase::FetchingTranscript);
            let transcript = self.captions.fetch(&video_id).await;
            (metadata, transcript)
        };
        debug!("Video info: {metadata:?}");
        debug!(
            "Transcript available: {}, length: {}",
            transcript.is_some(),
            transcript.as_ref().map_or(0, String::len)
        );
        self.state.metadata = metadata.clone();
        self.state.transcript = transcript;

        self.transition(Phase::Generating);
        let generated = match self
            .generator
            .summarize(&video_id, level, metadata.as_ref(), self.state.transcript.as_deref())
            .await
        {
            Ok(generated) => generated,
            Err(e) => return self.fail(e),
        };

        let used_transcript = self.state.transcript.take().is_some();
        let result = SummaryResult {
            video_id: video_id.clone(),
            url: url.to_string(),
            level,
            metadata: metadata.clone(),
            text: generated.text,
            used_transcript,
            fallback: generated.fallback,
        };

        self.history.append(HistoryEntry {
            video_id,
            url: url.to_string(),
            timestamp: Utc::now(),
            level,
            title: metadata
                .and_then(|m| m.title)
                .unwrap_or_else(|| UNKNOWN_VIDEO.to_string()),
            is_favorite: false,
        });

        self.state.summary = Some(result.clone());
        self.transition(Phase::Succeeded);
        info!("Summary ready for {}, length: {}", result.video_id, result.text.len());
        Ok(result)
    }
}
