//! Retrieval of candidate bytes.
//!
//! Repository files are first described by their provider: inline base64 content is decoded
//! directly, otherwise the file's download URL is fetched. Release assets are always downloaded.
//! Downloads are streamed and abandoned as soon as they exceed their size ceiling. Empty content
//! is treated as not obtained. Every attempt, successful or not, is followed by a courtesy pause.

use super::descriptor::RepositoryDescriptor;
use super::provider::Provider;
use super::request_tracker::{RequestTracker, TrackedTopic};
use super::tree::{Candidate, FileSource, TreeEntry};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use core::time::Duration;
use futures_util::StreamExt;
use ohno::{IntoAppError, bail};
use reqwest::StatusCode;
use url::Url;

const LOG_TARGET: &str = "     fetch";
const USER_AGENT: &str = concat!("repo-hound/", env!("CARGO_PKG_VERSION"));

/// Bytes of one candidate, labelled with where they came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedContent {
    /// `owner/repo/path` or `owner/repo/releases/asset`
    pub source_label: String,
    pub bytes: Vec<u8>,
}

/// Timeouts, ceilings, and pacing for content retrieval.
#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub file_timeout: Duration,
    pub asset_timeout: Duration,
    pub max_file_size: u64,
    pub max_asset_size: u64,
    pub fetch_pause: Duration,
}

#[derive(Debug, Clone)]
pub struct ContentFetcher {
    client: reqwest::Client,
    settings: FetchSettings,
    tracker: RequestTracker,
}

impl ContentFetcher {
    pub fn new(settings: FetchSettings, tracker: RequestTracker) -> crate::Result<Self> {
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { client, settings, tracker })
    }

    /// Retrieve the bytes of `candidate`, or `None` if they could not be obtained or are empty.
    pub async fn fetch(&self, provider: &dyn Provider, repo: &RepositoryDescriptor, candidate: &Candidate) -> Option<FetchedContent> {
        let source_label = format!("{}/{}", repo.label(), candidate.relative_label());

        let bytes = match candidate {
            Candidate::File(entry) => self.fetch_file(provider, repo, entry).await,
            Candidate::Asset(asset) => {
                self.download(&asset.download_url, self.settings.asset_timeout, self.settings.max_asset_size)
                    .await
            }
        };

        tokio::time::sleep(self.settings.fetch_pause).await;

        match bytes {
            Some(bytes) if !bytes.is_empty() => Some(FetchedContent { source_label, bytes }),
            Some(_) => {
                log::debug!(target: LOG_TARGET, "Skipping empty '{source_label}'");
                None
            }
            None => {
                log::debug!(target: LOG_TARGET, "Skipping '{source_label}'");
                None
            }
        }
    }

    async fn fetch_file(&self, provider: &dyn Provider, repo: &RepositoryDescriptor, entry: &TreeEntry) -> Option<Vec<u8>> {
        let FileSource {
            inline_base64,
            download_url,
        } = provider.describe_file(repo, &entry.path).await?;

        if let Some(encoded) = inline_base64 {
            match decode_inline(&encoded, self.settings.max_file_size) {
                Ok(bytes) => return Some(bytes),
                Err(e) => log::debug!(target: LOG_TARGET, "Could not decode inline content of '{}': {e}", entry.path),
            }
        }

        let url = download_url?;
        self.download(&url, self.settings.file_timeout, self.settings.max_file_size).await
    }

    /// Download `url`, giving up after `timeout` or once more than `ceiling` bytes arrive.
    pub async fn download(&self, url: &Url, timeout: Duration, ceiling: u64) -> Option<Vec<u8>> {
        self.tracker.add_request(TrackedTopic::Download);
        match self.try_download(url, timeout, ceiling).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                self.tracker.fail_request(TrackedTopic::Download);
                log::debug!(target: LOG_TARGET, "Could not download '{url}': {e:#}");
                None
            }
        }
    }

    async fn try_download(&self, url: &Url, timeout: Duration, ceiling: u64) -> crate::Result<Vec<u8>> {
        let response = self
            .client
            .get(url.clone())
            .timeout(timeout)
            .send()
            .await
            .into_app_err("could not send HTTP request")?;

        if response.status() != StatusCode::OK {
            bail!("HTTP {}", response.status());
        }

        if let Some(len) = response.content_length()
            && len > ceiling
        {
            bail!("declared length {len} exceeds the {ceiling} byte ceiling");
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.into_app_err("could not read response body")?;
            if (bytes.len() + chunk.len()) as u64 > ceiling {
                bail!("body exceeds the {ceiling} byte ceiling");
            }
            bytes.extend_from_slice(&chunk);
        }

        Ok(bytes)
    }
}

/// Decode base64 content that may contain embedded line breaks.
fn decode_inline(encoded: &str, ceiling: u64) -> crate::Result<Vec<u8>> {
    let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = STANDARD.decode(compact.as_bytes()).into_app_err("invalid base64 content")?;
    if bytes.len() as u64 > ceiling {
        bail!("inline content exceeds the {ceiling} byte ceiling");
    }
    Ok(bytes)
}
