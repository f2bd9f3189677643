use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use validate_feed::error::Result;
use validate_feed::{DocumentSource, FeedError};

/// Canned answer for one channel
#[derive(Clone, Debug)]
pub enum MockResponse {
    Document(String),
    HttpStatus(u16),
    Timeout,
}

/// Document source serving canned feeds per channel, recording every request
#[derive(Default)]
pub struct MockDocumentSource {
    responses: HashMap<String, MockResponse>,
    request_log: Arc<Mutex<Vec<(String, u32)>>>,
}

impl MockDocumentSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, channel: &str, text: &str) -> Self {
        self.responses
            .insert(channel.to_string(), MockResponse::Document(text.to_string()));
        self
    }

    pub fn with_status(mut self, channel: &str, status: u16) -> Self {
        self.responses
            .insert(channel.to_string(), MockResponse::HttpStatus(status));
        self
    }

    pub fn with_timeout(mut self, channel: &str) -> Self {
        self.responses
            .insert(channel.to_string(), MockResponse::Timeout);
        self
    }

    /// `(channel, limit)` pairs in request order
    pub fn requests(&self) -> Vec<(String, u32)> {
        self.request_log.lock().unwrap().clone()
    }

    fn url(channel: &str) -> String {
        format!("mock://{}", channel)
    }
}

#[async_trait]
impl DocumentSource for MockDocumentSource {
    async fn fetch(&self, channel: &str, limit: u32) -> Result<String> {
        self.request_log
            .lock()
            .unwrap()
            .push((channel.to_string(), limit));

        match self.responses.get(channel) {
            Some(MockResponse::Document(text)) => Ok(text.clone()),
            Some(MockResponse::HttpStatus(status)) => Err(FeedError::HttpStatus {
                url: Self::url(channel),
                status: *status,
                message: format!("HTTP {}", status),
            }),
            Some(MockResponse::Timeout) => Err(FeedError::Timeout {
                url: Self::url(channel),
                timeout_seconds: 30,
            }),
            None => Err(FeedError::HttpStatus {
                url: Self::url(channel),
                status: 404,
                message: "HTTP 404: Not Found".to_string(),
            }),
        }
    }
}
