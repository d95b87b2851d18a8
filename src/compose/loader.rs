//! Layer image loading: fetch, verified decode, retry, shared cache.
//!
//! `ImageLoader` handles all asset-fetching concerns so the compositor
//! session stays a pure orchestrator with no HTTP knowledge. Sources are
//! pluggable behind [`ImageSource`]; production uses [`HttpImageSource`],
//! tests inject deterministic fakes.
//!
//! Every load goes through the verified-decode protocol: fetch the bytes,
//! decode them, and verify non-zero pixel dimensions before the image is
//! accepted. A fetch or decode failure is retried with exponential backoff;
//! only after the whole schedule is exhausted does the load report failure,
//! and the caller decides whether that drops a single layer or fails the
//! composite.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use image::DynamicImage;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::MaquetaError;

/// Retry schedule for asset fetches.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub attempts: u32,
    /// Backoff before the second attempt; doubles each retry.
    pub base_delay: Duration,
    /// Ceiling for the doubled backoff.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Backoff before retry number `retry` (0-based): base · 2^retry,
    /// capped at `max_delay`.
    pub fn delay(&self, retry: u32) -> Duration {
        let exp = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(retry));
        exp.min(self.max_delay)
    }
}

/// Raw byte source for images, keyed by URL.
#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, MaquetaError>;
}

/// HTTP-backed image source.
pub struct HttpImageSource {
    client: reqwest::Client,
}

impl HttpImageSource {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("maqueta/0.1")
                .build()
                .expect("failed to build HTTP client"),
        }
    }
}

impl Default for HttpImageSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageSource for HttpImageSource {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, MaquetaError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| MaquetaError::Asset(format!("Failed to download {}: {}", url, e)))?;
        if !response.status().is_success() {
            return Err(MaquetaError::Asset(format!(
                "Failed to download {}: HTTP {}",
                url,
                response.status()
            )));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| MaquetaError::Asset(format!("Failed to read image data: {}", e)))?;
        Ok(bytes.to_vec())
    }
}

/// A decoded image in the shared cache.
struct CachedImage {
    image: DynamicImage,
    last_used: Instant,
}

impl CachedImage {
    fn new(image: DynamicImage) -> Self {
        Self {
            image,
            last_used: Instant::now(),
        }
    }

    fn touch(&mut self) {
        self.last_used = Instant::now();
    }
}

/// Image loader with verified decode, retry and a shared decode cache.
pub struct ImageLoader {
    source: Arc<dyn ImageSource>,
    cache: Arc<RwLock<HashMap<String, CachedImage>>>,
    retry: RetryPolicy,
}

impl ImageLoader {
    pub fn new(source: Arc<dyn ImageSource>) -> Self {
        Self::with_retry(source, RetryPolicy::default())
    }

    pub fn with_retry(source: Arc<dyn ImageSource>, retry: RetryPolicy) -> Self {
        Self {
            source,
            cache: Arc::new(RwLock::new(HashMap::new())),
            retry,
        }
    }

    /// HTTP-backed loader with the default retry schedule.
    pub fn over_http() -> Self {
        Self::new(Arc::new(HttpImageSource::new()))
    }

    /// Cached decode for `url`, if present.
    pub async fn cached(&self, url: &str) -> Option<DynamicImage> {
        let mut cache = self.cache.write().await;
        cache.get_mut(url).map(|entry| {
            entry.touch();
            entry.image.clone()
        })
    }

    /// Drop cache entries unused for longer than `max_idle`.
    pub async fn evict_idle(&self, max_idle: Duration) {
        let now = Instant::now();
        self.cache
            .write()
            .await
            .retain(|_, entry| now.duration_since(entry.last_used) < max_idle);
    }

    /// Load and decode an image, retrying per the policy.
    pub async fn load(&self, url: &str) -> Result<DynamicImage, MaquetaError> {
        if let Some(image) = self.cached(url).await {
            return Ok(image);
        }

        let mut last_err = MaquetaError::Asset(format!("no fetch attempted for {}", url));
        for attempt in 0..self.retry.attempts {
            if attempt > 0 {
                let delay = self.retry.delay(attempt - 1);
                debug!(url, attempt, delay_ms = delay.as_millis() as u64, "retrying image fetch");
                tokio::time::sleep(delay).await;
            }
            match self.fetch_verified(url).await {
                Ok(image) => {
                    self.cache
                        .write()
                        .await
                        .insert(url.to_string(), CachedImage::new(image.clone()));
                    return Ok(image);
                }
                Err(e) => {
                    warn!(url, attempt, error = %e, "image fetch attempt failed");
                    last_err = e;
                }
            }
        }
        Err(last_err)
    }

    /// One fetch → decode → non-zero-dimension verification pass.
    async fn fetch_verified(&self, url: &str) -> Result<DynamicImage, MaquetaError> {
        let bytes = self.source.fetch(url).await?;
        let image = image::load_from_memory(&bytes)
            .map_err(|e| MaquetaError::Image(format!("Failed to decode {}: {}", url, e)))?;
        if image.width() == 0 || image.height() == 0 {
            return Err(MaquetaError::Image(format!(
                "{} decoded to zero pixel dimensions",
                url
            )));
        }
        Ok(image)
    }
}
