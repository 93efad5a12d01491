//! Asset fetch backends
//!
//! The composition core is decoupled from transport: it asks an
//! [`AssetFetch`] for the raw bytes behind a resolved path and nothing else.
//! Shipped adapters cover an on-disk asset root and an HTTP asset server;
//! tests substitute their own implementations.

use crate::config::settings::FetchBackend;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

#[async_trait]
pub trait AssetFetch: Send + Sync {
    /// Fetch the raw bytes behind a resolved relative path.
    async fn fetch_bytes(&self, path: &str) -> Result<Bytes>;
}

/// Reads assets from a directory tree rooted at `root`.
#[derive(Debug, Clone)]
pub struct FileFetcher {
    root: PathBuf,
}

impl FileFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl AssetFetch for FileFetcher {
    async fn fetch_bytes(&self, path: &str) -> Result<Bytes> {
        let full = self.root.join(path);
        let data = tokio::fs::read(&full)
            .await
            .with_context(|| format!("reading asset file {}", full.display()))?;
        Ok(Bytes::from(data))
    }
}

/// Fetches assets from an HTTP server, `{base_url}/{path}`.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    base_url: String,
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl AssetFetch for HttpFetcher {
    async fn fetch_bytes(&self, path: &str) -> Result<Bytes> {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), path);
        debug!(url = url.as_str(), "requesting asset");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("requesting asset {url}"))?;

        let status = response.status();
        if !status.is_success() {
            bail!("asset server returned {} for {}", status.as_u16(), url);
        }

        let bytes = response
            .bytes()
            .await
            .with_context(|| format!("reading asset body from {url}"))?;
        Ok(bytes)
    }
}

/// Build the fetcher an asset-source setting describes.
pub fn backend_fetcher(backend: &FetchBackend) -> Arc<dyn AssetFetch> {
    match backend {
        FetchBackend::Files { root } => Arc::new(FileFetcher::new(root.clone())),
        FetchBackend::Http { base_url } => Arc::new(HttpFetcher::new(base_url.clone())),
    }
}
