//! Markdown image extraction and analysis.
//!
//! Issue descriptions embed screenshots as `![alt](url "title")`. The
//! scanner pulls those URLs out in source order and hands each one to an
//! [`ImageAnalyzer`]. Attachments are filtered by file extension instead.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use futures::future::join_all;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, warn};

static MARKDOWN_IMAGE: Lazy<Regex> = Lazy::new(|| {
    // Destinations may hold one level of balanced parentheses.
    Regex::new(r#"!\[[^\]]*\]\(\s*<?((?:[^()\s<>]|\([^()\s<>]*\))+)>?(?:\s+"[^"]*")?\s*\)"#)
        .expect("markdown image pattern is valid")
});

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "svg", "bmp"];

/// Upper bound for inlined image bytes.
const DEFAULT_MAX_INLINE_BYTES: usize = 5 * 1024 * 1024;

/// An image reference and what the analyzer made of it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageReference {
    pub url: String,
    pub analysis: String,
}

/// URLs of every markdown image in `text`, in source order.
pub fn extract_image_urls(text: &str) -> Vec<String> {
    MARKDOWN_IMAGE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Whether the URL path ends in a known image extension.
pub fn is_image_url(url: &str) -> bool {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.rsplit_once('.')
        .map(|(_, ext)| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

fn mime_from_extension(url: &str) -> Option<&'static str> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let (_, ext) = path.rsplit_once('.')?;
    match ext.to_ascii_lowercase().as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "svg" => Some("image/svg+xml"),
        "bmp" => Some("image/bmp"),
        _ => None,
    }
}

/// Produces an analysis text for an image URL.
///
/// Implementations never fail: problems are reported inside the returned
/// text so one bad image does not sink the whole tool call.
#[async_trait]
pub trait ImageAnalyzer: Send + Sync {
    async fn analyze(&self, url: &str) -> String;
}

/// Analyzer that performs no I/O and returns a fixed note.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderAnalyzer;

pub const PLACEHOLDER_ANALYSIS: &str =
    "Image analysis is not available; open the URL to inspect the image.";

#[async_trait]
impl ImageAnalyzer for PlaceholderAnalyzer {
    async fn analyze(&self, _url: &str) -> String {
        PLACEHOLDER_ANALYSIS.to_string()
    }
}

/// Analyzer that downloads the image and returns it as a `data:` URI so a
/// multimodal agent can look at it directly.
pub struct InlineImageAnalyzer {
    client: reqwest::Client,
    max_bytes: usize,
    /// `(host, Authorization value)` pairs for hosts that need credentials.
    host_authorization: Vec<(String, String)>,
}

impl InlineImageAnalyzer {
    pub fn new() -> Self {
        Self::with_max_bytes(DEFAULT_MAX_INLINE_BYTES)
    }

    pub fn with_max_bytes(max_bytes: usize) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("linear-bridge")
                .timeout(Duration::from_secs(30))
                .build()
                .expect("Failed to create HTTP client"),
            max_bytes,
            host_authorization: Vec::new(),
        }
    }

    /// Send `authorization` with every download from `host`.
    pub fn with_host_authorization(
        mut self,
        host: impl Into<String>,
        authorization: impl Into<String>,
    ) -> Self {
        self.host_authorization
            .push((host.into(), authorization.into()));
        self
    }

    fn authorization_for(&self, url: &str) -> Option<&str> {
        let parsed = reqwest::Url::parse(url).ok()?;
        let host = parsed.host_str()?;
        self.host_authorization
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(host))
            .map(|(_, value)| value.as_str())
    }

    fn too_large(&self, size: u64) -> String {
        format!(
            "image is {} bytes, larger than the {} byte inline limit",
            size, self.max_bytes
        )
    }

    async fn fetch(&self, url: &str) -> Result<String, String> {
        let mut request = self.client.get(url);
        if let Some(authorization) = self.authorization_for(url) {
            request = request.header(reqwest::header::AUTHORIZATION, authorization);
        }

        let mut response = request
            .send()
            .await
            .map_err(|e| format!("request failed: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("HTTP {}", status.as_u16()));
        }

        if let Some(length) = response.content_length() {
            if length > self.max_bytes as u64 {
                return Err(self.too_large(length));
            }
        }

        let mime = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_string())
            .filter(|v| v.starts_with("image/"))
            .or_else(|| mime_from_extension(url).map(String::from))
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let mut bytes = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| format!("failed to read body: {}", e))?
        {
            if bytes.len() + chunk.len() > self.max_bytes {
                return Err(format!(
                    "image is larger than the {} byte inline limit",
                    self.max_bytes
                ));
            }
            bytes.extend_from_slice(&chunk);
        }

        let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);
        Ok(format!("data:{};base64,{}", mime, encoded))
    }
}

impl Default for InlineImageAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageAnalyzer for InlineImageAnalyzer {
    async fn analyze(&self, url: &str) -> String {
        debug!(url = url, "Inlining image");
        match self.fetch(url).await {
            Ok(data_uri) => data_uri,
            Err(reason) => {
                warn!(url = url, reason = reason, "Image fetch failed");
                format!("Image could not be fetched: {}", reason)
            }
        }
    }
}

/// Analyze every URL concurrently, preserving input order.
pub async fn analyze_all(analyzer: &dyn ImageAnalyzer, urls: Vec<String>) -> Vec<ImageReference> {
    let analyses = join_all(urls.iter().map(|url| analyzer.analyze(url))).await;
    urls.into_iter()
        .zip(analyses)
        .map(|(url, analysis)| ImageReference { url, analysis })
        .collect()
}
