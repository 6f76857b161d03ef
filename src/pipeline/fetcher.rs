//! HTTP fetcher implementation
//!
//! This module downloads one document per call:
//! - Building the HTTP client with the configured user agent and redirect limit
//! - A single GET per URL (no retry)
//! - Content-Type / Content-Disposition checks before the body is read
//! - Writing the accepted body into the staging directory

use crate::config::HttpConfig;
use crate::pipeline::content::{attachment_filename, is_pdf_response, staged_filename, unique_path};
use crate::{FetchError, FetchFailure};
use reqwest::header::{HeaderMap, CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::{redirect::Policy, Client};
use std::path::{Path, PathBuf};
use url::Url;

/// Builds an HTTP client with proper configuration
///
/// Redirects are followed up to `max_redirects`; timeouts are left at the
/// transport defaults.
///
/// # Example
///
/// ```no_run
/// use pdf_harvest::config::HttpConfig;
/// use pdf_harvest::pipeline::build_http_client;
///
/// let client = build_http_client(&HttpConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .redirect(Policy::limited(config.max_redirects))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Downloads URLs and stages the ones that turn out to be PDFs
#[derive(Debug, Clone)]
pub struct DocumentFetcher {
    client: Client,
}

impl DocumentFetcher {
    /// Creates a fetcher with a client built from `config`
    pub fn new(config: &HttpConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::with_client(build_http_client(config)?))
    }

    /// Creates a fetcher around an existing client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Fetches `url` and writes it into `destination`
    ///
    /// # Arguments
    ///
    /// * `index` - Position of the URL in its batch, used for the fallback name
    /// * `url` - The URL to fetch
    /// * `destination` - Staging directory
    ///
    /// # Returns
    ///
    /// * `Ok(PathBuf)` - Path of the staged PDF; exactly one file was written
    /// * `Err(FetchError)` - Nothing was written
    pub async fn fetch(
        &self,
        index: usize,
        url: &str,
        destination: &Path,
    ) -> Result<PathBuf, FetchError> {
        let fail = |cause: FetchFailure| FetchError {
            url: url.to_string(),
            cause,
        };

        let parsed = Url::parse(url).map_err(|e| fail(e.into()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(fail(FetchFailure::UnsupportedScheme(
                parsed.scheme().to_string(),
            )));
        }

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| fail(e.into()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fail(FetchFailure::Status(status.as_u16())));
        }

        let content_type = header_value(response.headers(), CONTENT_TYPE);
        let filename_hint = header_value(response.headers(), CONTENT_DISPOSITION)
            .as_deref()
            .and_then(attachment_filename);

        if !is_pdf_response(content_type.as_deref(), filename_hint.as_deref()) {
            tracing::warn!("no pdf file at {}", url);
            return Err(fail(FetchFailure::NotExpectedFormat {
                content_type: content_type.unwrap_or_default(),
            }));
        }

        let body = response.bytes().await.map_err(|e| fail(e.into()))?;

        let filename = staged_filename(filename_hint.as_deref(), index);
        let output = unique_path(destination, &filename);
        if let Err(e) = tokio::fs::write(&output, &body).await {
            // Leave nothing half-written behind.
            let _ = tokio::fs::remove_file(&output).await;
            return Err(fail(e.into()));
        }

        tracing::info!("downloading {} from {}", filename, url);
        Ok(output)
    }
}

/// Reads a header as text; non-ASCII bytes are decoded lossily rather than dropped
fn header_value(headers: &HeaderMap, name: reqwest::header::HeaderName) -> Option<String> {
    headers.get(name).map(|v| match v.to_str() {
        Ok(text) => text.to_string(),
        Err(_) => String::from_utf8_lossy(v.as_bytes()).into_owned(),
    })
}
