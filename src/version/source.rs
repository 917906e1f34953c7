//! Remote source of the plaintext version list

#[cfg(test)]
use mockall::automock;

use std::time::Duration;

use tracing::warn;

use crate::version::error::FetchError;

/// Trait for fetching the raw version list document
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait VersionSource: Send + Sync {
    /// Location the list is fetched from, for logging
    fn location(&self) -> String;

    /// Fetches the list body: one version literal per line
    ///
    /// # Returns
    /// * `Ok(String)` - The document body
    /// * `Err(FetchError)` - Transport failure or non-success status
    async fn fetch_list(&self) -> Result<String, FetchError>;
}

/// Fetches the version list with a plain unauthenticated GET
pub struct HttpVersionSource {
    client: reqwest::Client,
    url: String,
}

impl HttpVersionSource {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("azurefuncs/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl VersionSource for HttpVersionSource {
    fn location(&self) -> String {
        self.url.clone()
    }

    async fn fetch_list(&self) -> Result<String, FetchError> {
        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            warn!("Version source returned status {}: {}", status, self.url);
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: self.url.clone(),
            });
        }

        response.text().await.map_err(|e| {
            warn!("Failed to read version source response: {}", e);
            FetchError::Body(e.to_string())
        })
    }
}
