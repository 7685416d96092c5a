//! reqwest-backed [`DocumentSource`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use super::{DocumentSource, FetchError, REQUEST_TIMEOUT};

/// HTTP GET client shared by every fetch of one collector.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Clone, Debug)]
pub struct HttpDocumentSource {
    client: Client,
}

impl HttpDocumentSource {
    /// Builds a client with the default [`REQUEST_TIMEOUT`].
    pub fn new() -> Result<Self, FetchError> {
        Self::with_timeout(REQUEST_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Transport {
                url: String::new(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self { client })
    }
}

#[async_trait]
impl DocumentSource for HttpDocumentSource {
    async fn get(&self, url: &str) -> Result<String, FetchError> {
        let transport = |e: reqwest::Error| FetchError::Transport {
            url: url.to_string(),
            reason: e.to_string(),
        };

        let resp = self.client.get(url).send().await.map_err(transport)?;

        let status = resp.status();
        if !status.is_success() {
            // The body still goes to the decoder; error pages end up in the
            // decode-retry path.
            tracing::debug!(url, %status, "non-success HTTP status");
        }

        resp.text().await.map_err(transport)
    }
}
