pub mod config;
pub mod error;
pub mod history;
pub mod metadata;
pub mod orchestrator;
pub mod output;
pub mod summarize;
pub mod youtube;

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

pub use error::{Error, Result};

/// Matches watch (`?v=`/`&v=`), `/v/`, `/e/`, `/embed/`, channel-style paths and `youtu.be` short links
static VIDEO_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:youtube\.com/(?:[^/]+/.+/|(?:v|e(?:mbed)?)/|.*[?&]v=)|youtu\.be/)([A-Za-z0-9_-]{11})")
        .expect("video URL pattern is valid")
});

/// Canonical 11-character YouTube video identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical watch URL for this video
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.0)
    }
}

impl std::fmt::Display for VideoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Extract video ID from the supported YouTube URL formats
pub fn extract_video_id(input: &str) -> Option<VideoId> {
    VIDEO_URL_RE
        .captures(input)
        .map(|caps| VideoId(caps[1].to_string()))
}
