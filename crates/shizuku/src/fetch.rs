use std::time::Duration;

use crate::{
    error::{ShizukuError, ShizukuResult},
    decode_manifest,
    util::http::HttpClient,
    Fetcher,
};

/// Fetches segments and playlists over HTTP.
///
/// Segment requests never time out on their own; the timeout only applies to
/// playlist requests.
#[derive(Clone, Default)]
pub struct HttpFetcher {
    client: HttpClient,
    manifest_timeout: Option<Duration>,
}

impl HttpFetcher {
    pub fn new(client: HttpClient) -> Self {
        Self {
            client,
            manifest_timeout: None,
        }
    }

    pub fn with_manifest_timeout(mut self, timeout: Duration) -> Self {
        self.manifest_timeout = Some(timeout);
        self
    }

    pub fn manifest_timeout(&self) -> Option<Duration> {
        self.manifest_timeout
    }

    pub fn client(&self) -> &HttpClient {
        &self.client
    }
}

async fn check_status(response: reqwest::Response) -> ShizukuResult<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    if let Ok(body) = response.text().await {
        tracing::warn!("Error body: {body}");
    }
    Err(ShizukuError::HttpError(status))
}

impl Fetcher for HttpFetcher {
    fn fetch_segment(
        &self,
        url: &str,
    ) -> impl std::future::Future<Output = ShizukuResult<bytes::Bytes>> + Send {
        let request = self.client.get(url);
        async move {
            let response = check_status(request.send().await?).await?;
            let bytes = response.bytes().await?;
            Ok(bytes)
        }
    }

    fn fetch_manifest(
        &self,
        url: &str,
    ) -> impl std::future::Future<Output = ShizukuResult<String>> + Send {
        let mut request = self.client.get(url);
        if let Some(timeout) = self.manifest_timeout {
            request = request.timeout(timeout);
        }
        let url = url.to_string();
        async move {
            let response = check_status(request.send().await?).await?;
            decode_manifest(&url, response.bytes().await?)
        }
    }
}
