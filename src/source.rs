//! Where feed documents come from.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::info;

use crate::error::{FeedError, Result};
use crate::http_client::{AsyncHttpClient, HttpClientConfig, redact_url};

/// Supplies the raw XML text of a channel's feed
#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn fetch(&self, channel: &str, limit: u32) -> Result<String>;
}

/// Reviews API endpoint
pub struct HttpDocumentSource {
    client: AsyncHttpClient,
    domain: String,
    api_key: String,
}

impl HttpDocumentSource {
    pub fn new(domain: impl Into<String>, api_key: impl Into<String>, config: HttpClientConfig) -> Result<Self> {
        Ok(Self {
            client: AsyncHttpClient::new(config)?,
            domain: domain.into(),
            api_key: api_key.into(),
        })
    }

    /// `http://api.{domain}/api/v2/reviews/browse?api_key=..&channel=..[&limit=..]`
    ///
    /// A limit of 0 means no limit and leaves the parameter out.
    pub fn feed_url(&self, channel: &str, limit: u32) -> String {
        let mut url = format!(
            "http://api.{}/api/v2/reviews/browse?api_key={}&channel={}",
            self.domain, self.api_key, channel
        );
        if limit > 0 {
            url.push_str(&format!("&limit={}", limit));
        }
        url
    }
}

#[async_trait]
impl DocumentSource for HttpDocumentSource {
    async fn fetch(&self, channel: &str, limit: u32) -> Result<String> {
        let url = self.feed_url(channel, limit);
        info!(channel, url = %redact_url(&url), "fetching feed");
        self.client.fetch_text(&url).await
    }
}

/// A local XML file, served for every channel
#[derive(Debug, Clone)]
pub struct FileDocumentSource {
    path: PathBuf,
}

impl FileDocumentSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DocumentSource for FileDocumentSource {
    async fn fetch(&self, channel: &str, _limit: u32) -> Result<String> {
        info!(channel, path = %self.path.display(), "reading feed file");
        tokio::fs::read_to_string(&self.path)
            .await
            .map_err(FeedError::Io)
    }
}
