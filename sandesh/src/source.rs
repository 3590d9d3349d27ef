use anyhow::{Context, Result};
use async_trait::async_trait;
use common::Article;
use reqwest::Client;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Where the published article list comes from.
#[async_trait]
pub trait ArticleSource: Send + Sync {
    /// Fetch the full list. `cache_bust` is appended to HTTP requests so a
    /// stale copy is never served from an intermediate cache.
    async fn fetch(&self, cache_bust: Option<i64>) -> Result<Vec<Article>>;

    /// Human readable location, used in logs
    fn location(&self) -> String;
}

/// The published `news-data.json` served over HTTP.
pub struct HttpSource {
    client: Client,
    url: Url,
}

impl HttpSource {
    pub fn new(url: &str, timeout_secs: u64) -> Result<Self> {
        let url = Url::parse(url).with_context(|| format!("invalid news data URL: {}", url))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent("Sandesh/0.1.0")
            .build()
            .context("failed to build reqwest client")?;
        Ok(Self { client, url })
    }

    /// Request URL with the cache-busting stamp added as a bare query value
    pub fn request_url(&self, cache_bust: Option<i64>) -> Url {
        let mut url = self.url.clone();
        if let Some(stamp) = cache_bust {
            let query = match url.query() {
                Some(q) if !q.is_empty() => format!("{}&{}", q, stamp),
                _ => stamp.to_string(),
            };
            url.set_query(Some(&query));
        }
        url
    }
}

#[async_trait]
impl ArticleSource for HttpSource {
    async fn fetch(&self, cache_bust: Option<i64>) -> Result<Vec<Article>> {
        let url = self.request_url(cache_bust);
        debug!(%url, "fetching news data");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("failed to fetch news data")?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow::anyhow!("news data fetch failed with status: {}", status));
        }

        let bytes = response.bytes().await.context("failed to read response body")?;
        let articles: Vec<Article> =
            serde_json::from_slice(&bytes).context("failed to parse news data")?;
        Ok(articles)
    }

    fn location(&self) -> String {
        self.url.to_string()
    }
}

/// The published file read straight from disk, e.g. a checked-out static site.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ArticleSource for FileSource {
    async fn fetch(&self, _cache_bust: Option<i64>) -> Result<Vec<Article>> {
        let data = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("failed to read news data: {}", self.path.display()))?;
        let articles: Vec<Article> =
            serde_json::from_str(&data).context("failed to parse news data")?;
        Ok(articles)
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// Pick an HTTP or file source depending on what the configured location looks like.
pub fn from_config(cfg: &common::SourceConfig) -> Result<Box<dyn ArticleSource>> {
    if cfg.url.starts_with("http://") || cfg.url.starts_with("https://") {
        Ok(Box::new(HttpSource::new(&cfg.url, cfg.timeout_seconds)?))
    } else {
        Ok(Box::new(FileSource::new(&cfg.url)))
    }
}
