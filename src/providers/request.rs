use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::Client;

use crate::error::PipelineError;
use crate::providers::AudioFetcher;

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Option<Duration>) -> Result<Self, PipelineError> {
        let timeout = timeout.unwrap_or(Duration::from_secs(30));
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0 (compatible; RecipeCardsBot/1.0)")
            .build()
            .map_err(|e| PipelineError::UpstreamFetch {
                url: String::new(),
                reason: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self { client })
    }
}

#[async_trait]
impl AudioFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, PipelineError> {
        let fetch_error = |reason: String| PipelineError::UpstreamFetch {
            url: url.to_string(),
            reason,
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| fetch_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fetch_error(format!("HTTP {}", status)));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| fetch_error(e.to_string()))?;
        debug!("Fetched {} bytes from {}", bytes.len(), url);
        Ok(bytes.to_vec())
    }
}
