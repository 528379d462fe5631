use async_trait::async_trait;
use eyre::Result;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::VideoId;

const DEFAULT_OEMBED_URL: &str = "https://noembed.com/embed";

/// Title and channel of a video, either of which may be missing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VideoMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
}

/// Advisory metadata lookup. `None` means nothing usable came back.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    async fn fetch(&self, video_id: &VideoId) -> Option<VideoMetadata>;
}

#[derive(Debug, Deserialize)]
struct OEmbedResponse {
    title: Option<String>,
    author_name: Option<String>,
}

/// oEmbed-style lookup keyed by the canonical watch URL
pub struct OEmbedClient {
    client: reqwest::Client,
    endpoint: String,
}

impl OEmbedClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_endpoint(client, DEFAULT_OEMBED_URL)
    }

    pub fn with_endpoint(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    async fn lookup(&self, video_id: &VideoId) -> Result<OEmbedResponse> {
        let watch_url = video_id.watch_url();
        debug!("Fetching oEmbed metadata for {watch_url}");

        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[("url", watch_url.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(resp)
    }
}

#[async_trait]
impl MetadataSource for OEmbedClient {
    async fn fetch(&self, video_id: &VideoId) -> Option<VideoMetadata> {
        match self.lookup(video_id).await {
            Ok(resp) => into_metadata(resp),
            Err(e) => {
                debug!("Metadata lookup failed for {video_id}: {e}");
                None
            }
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn into_metadata(resp: OEmbedResponse) -> Option<VideoMetadata> {
    let title = non_empty(resp.title);
    let author = non_empty(resp.author_name);
    if title.is_none() && author.is_none() {
        return None;
    }
    Some(VideoMetadata { title, author })
}
