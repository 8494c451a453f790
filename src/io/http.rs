use async_trait::async_trait;
use reqwest::Client;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use super::ArchiveSource;
use crate::config::Config;
use crate::error::{Error, Result};

/// Downloads the whole archive with plain GET requests
pub struct HttpArchiveSource {
    client: Client,
    url: String,
    max_retry: u32,
}

impl HttpArchiveSource {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|source| Error::Network {
                url: config.url.clone(),
                source,
            })?;

        Ok(Self {
            client,
            url: config.url.clone(),
            max_retry: config.max_retry.max(1),
        })
    }

    fn network_error(&self, source: reqwest::Error) -> Error {
        Error::Network {
            url: self.url.clone(),
            source,
        }
    }

    /// Single download attempt, returns the number of bytes written
    async fn try_fetch(&self, destination: &Path) -> Result<u64> {
        let mut resp = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| self.network_error(e))?;

        if !resp.status().is_success() {
            return Err(Error::HttpStatus {
                url: self.url.clone(),
                status: resp.status(),
            });
        }

        let mut file = tokio::fs::File::create(destination).await?;
        let mut written = 0u64;
        while let Some(chunk) = resp.chunk().await.map_err(|e| self.network_error(e))? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        Ok(written)
    }
}

#[async_trait]
impl ArchiveSource for HttpArchiveSource {
    async fn fetch_to(&self, destination: &Path) -> Result<()> {
        let mut retry_count = 0;

        loop {
            match self.try_fetch(destination).await {
                Ok(written) => {
                    debug!(url = %self.url, bytes = written, "archive downloaded");
                    return Ok(());
                }
                Err(Error::Network { source, .. }) if source.is_timeout() || source.is_connect() => {
                    retry_count += 1;
                    if retry_count >= self.max_retry {
                        return Err(Error::RetriesExhausted {
                            url: self.url.clone(),
                            source,
                        });
                    }
                    warn!(
                        "Connection error, retry {}/{}: {}",
                        retry_count, self.max_retry, source
                    );
                    tokio::time::sleep(Duration::from_millis(500 * retry_count as u64)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}
