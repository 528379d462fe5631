use async_trait::async_trait;
use eyre::Result;
use log::{debug, info, warn};
use serde::Deserialize;

use crate::VideoId;

const DEFAULT_API_BASE: &str = "https://www.googleapis.com/youtube/v3";

/// Transcripts shorter than this after trimming are treated as empty
pub const MIN_TRANSCRIPT_CHARS: usize = 10;

const PREFERRED_LANGUAGE: &str = "en";

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Transcript lookup that never fails: `None` covers every way of not getting one.
#[async_trait]
pub trait CaptionSource: Send + Sync {
    async fn fetch(&self, video_id: &VideoId) -> Option<String>;
}

#[derive(Debug, Deserialize)]
struct CaptionListResponse {
    #[serde(default)]
    items: Vec<CaptionTrack>,
}

#[derive(Debug, Deserialize)]
struct CaptionTrack {
    id: String,
    snippet: Option<CaptionSnippet>,
}

#[derive(Debug, Deserialize)]
struct CaptionSnippet {
    language: Option<String>,
}

impl CaptionTrack {
    fn language(&self) -> Option<&str> {
        self.snippet.as_ref()?.language.as_deref()
    }
}

/// Captions from the YouTube Data API, downloaded as SRT
pub struct YouTubeCaptions {
    client: reqwest::Client,
    api_key: Option<String>,
    api_base: String,
}

impl YouTubeCaptions {
    pub fn new(client: reqwest::Client, api_key: Option<String>) -> Self {
        Self::with_api_base(client, api_key, DEFAULT_API_BASE)
    }

    pub fn with_api_base(client: reqwest::Client, api_key: Option<String>, api_base: impl Into<String>) -> Self {
        Self {
            client,
            api_key,
            api_base: api_base.into(),
        }
    }

    async fn fetch_transcript(&self, video_id: &VideoId, api_key: &str) -> Result<Option<String>> {
        // Step 1: list the caption tracks
        let list_url = format!("{}/captions", self.api_base);
        debug!("Listing caption tracks for {video_id}");

        let list: CaptionListResponse = self
            .client
            .get(&list_url)
            .header(API_KEY_HEADER, api_key)
            .query(&[("part", "snippet"), ("videoId", video_id.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let Some(track) = select_track(&list.items) else {
            info!("No captions available for {video_id}");
            return Ok(None);
        };
        debug!(
            "Using caption track {} (lang={})",
            track.id,
            track.language().unwrap_or("?")
        );

        // Step 2: download the chosen track as SRT
        let download_url = format!("{}/captions/{}", self.api_base, track.id);
        let body = self
            .client
            .get(&download_url)
            .header(API_KEY_HEADER, api_key)
            .query(&[("tfmt", "srt")])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        if !is_usable(&body) {
            info!("Empty or invalid transcript for {video_id}");
            return Ok(None);
        }

        info!("Transcript fetched for {video_id}, length: {}", body.len());
        Ok(Some(body))
    }
}

#[async_trait]
impl CaptionSource for YouTubeCaptions {
    async fn fetch(&self, video_id: &VideoId) -> Option<String> {
        let Some(api_key) = self.api_key.as_deref() else {
            debug!("YouTube API key not configured, skipping transcript fetch");
            return None;
        };

        self.fetch_transcript(video_id, api_key)
            .await
            .map_err(|e| warn!("Transcript fetch failed for {video_id}: {e}"))
            .ok()
            .flatten()
    }
}

/// Prefer the English track, otherwise take the first one listed
fn select_track(tracks: &[CaptionTrack]) -> Option<&CaptionTrack> {
    tracks
        .iter()
        .find(|t| t.language() == Some(PREFERRED_LANGUAGE))
        .or_else(|| tracks.first())
}

fn is_usable(transcript: &str) -> bool {
    transcript.trim().chars().count() >= MIN_TRANSCRIPT_CHARS
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preferred_track_id(list_json: &str) -> serde_json::Result<Option<String>> {
        let list: CaptionListResponse = serde_json::from_str(list_json)?;
        Ok(select_track(&list.items).map(|t| t.id.clone()))
    }

    #[test]
    fn test_prefers_english_track() {
        let json = r#"{"items":[
            {"id":"de1","snippet":{"language":"de"}},
            {"id":"en1","snippet":{"language":"en"}}
        ]}"#;
        assert_eq!(preferred_track_id(json).unwrap().as_deref(), Some("en1"));
    }

    #[test]
    fn test_falls_back_to_first_track() {
        let json = r#"{"items":[
            {"id":"fr1","snippet":{"language":"fr"}},
            {"id":"de1","snippet":{"language":"de"}}
        ]}"#;
        assert_eq!(preferred_track_id(json).unwrap().as_deref(), Some("fr1"));
    }

    #[test]
    fn test_language_match_is_exact() {
        let json = r#"{"items":[
            {"id":"gb","snippet":{"language":"en-GB"}},
            {"id":"en","snippet":{"language":"en"}}
        ]}"#;
        assert_eq!(preferred_track_id(json).unwrap().as_deref(), Some("en"));
    }

    #[test]
    fn test_track_without_snippet() {
        let json = r#"{"items":[{"id":"x1"}]}"#;
        assert_eq!(preferred_track_id(json).unwrap().as_deref(), Some("x1"));
    }

    #[test]
    fn test_no_tracks() {
        assert_eq!(preferred_track_id(r#"{"items":[]}"#).unwrap(), None);
        assert_eq!(preferred_track_id(r#"{"kind":"youtube#captionListResponse"}"#).unwrap(), None);
    }

    #[test]
    fn test_malformed_listing() {
        assert!(preferred_track_id("<html>").is_err());
    }

    #[test]
    fn test_is_usable() {
        assert!(!is_usable(""));
        assert!(!is_usable("   \n  "));
        assert!(!is_usable("  short  "));
        assert!(is_usable("1\n00:00:00,000 --> 00:00:01,000\nHello world\n"));
    }

    #[tokio::test]
    async fn test_missing_key_skips_network() {
        // Endpoint is unreachable; absence of a key must return before any request
        let captions = YouTubeCaptions::with_api_base(reqwest::Client::new(), None, "http://127.0.0.1:9");
        let id = crate::extract_video_id("https://youtu.be/dQw4w9WgXcQ").unwrap();
        assert!(captions.fetch(&id).await.is_none());
    }

    #[tokio::test]
    async fn test_transport_failure_yields_none() {
        let captions =
            YouTubeCaptions::with_api_base(reqwest::Client::new(), Some("key".to_string()), "http://127.0.0.1:9");
        let id = crate::extract_video_id("https://youtu.be/dQw4w9WgXcQ").unwrap();
        assert!(captions.fetch(&id).await.is_none());
    }

    #[tokio::test]
    async fn test_transport_error_does_not_expose_key() {
        let captions = YouTubeCaptions::with_api_base(
            reqwest::Client::new(),
            Some("SECRETKEY123".to_string()),
            "http://127.0.0.1:9",
        );
        let id = crate::extract_video_id("https://youtu.be/dQw4w9WgXcQ").unwrap();
        let err = captions.fetch_transcript(&id, "SECRETKEY123").await.unwrap_err();
        assert!(!format!("{err:?}").contains("SECRETKEY123"));
        assert!(!err.to_string().contains("SECRETKEY123"));
    }
}
