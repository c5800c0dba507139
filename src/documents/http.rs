use super::{DocumentFetcher, FetchError};
use crate::utils::error_chain;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::redirect::Policy;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);
pub const MAX_REDIRECTS: usize = 20;

/// Downloads documents over HTTP(S).
///
/// A fresh client is built for every fetch and dropped before `fetch`
/// returns, so no connection outlives a single call.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    user_agent: String,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            timeout: DOWNLOAD_TIMEOUT,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl DocumentFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError> {
        let client = Client::builder()
            .user_agent(self.user_agent.as_str())
            .timeout(self.timeout)
            .redirect(Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|e| FetchError::Other(error_chain(&e)))?;

        let resp = client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| classify(e, url))?;

        let final_url = resp.url().to_string();
        let body = resp.bytes().await.map_err(|e| classify(e, url))?;
        debug!(url = %final_url, bytes = body.len(), "Document downloaded");
        Ok(body)
    }
}

fn classify(e: reqwest::Error, requested: &str) -> FetchError {
    if let Some(status) = e.status() {
        let url = e
            .url()
            .map(|u| u.to_string())
            .unwrap_or_else(|| requested.to_string());
        return FetchError::Status {
            status: status.as_u16(),
            url,
        };
    }
    if e.is_builder() {
        // Unparseable URL or unsupported scheme: nothing was sent.
        return FetchError::Other(error_chain(&e));
    }
    FetchError::Transport(error_chain(&e))
}
