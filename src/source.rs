use crate::error::{Result, StatusError};
use reqwest::Client;
use std::future::Future;
use std::time::Duration;

/// Where the sampler gets its raw stub_status text from.
///
/// Implementations return the body of one report, or an error for any
/// failure to obtain it. Parsing is left to the caller.
pub trait StatusSource {
    fn fetch(&mut self) -> impl Future<Output = Result<String>> + Send;
}

pub struct HttpStatusSource {
    client: Client,
    url: String,
}

impl HttpStatusSource {
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl StatusSource for HttpStatusSource {
    async fn fetch(&mut self) -> Result<String> {
        tracing::trace!("GET {}", self.url);
        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(StatusError::HttpStatus(status.as_u16()));
        }

        Ok(response.text().await?)
    }
}
