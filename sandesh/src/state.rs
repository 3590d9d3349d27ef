use anyhow::{Context, Result};
use common::store::NEWS_KEY;
use common::{Article, LocalStore};
use tracing::debug;

/// The in-memory article list shared by a page's operations.
///
/// Newest first: new articles are prepended. Every editor and renderer owns
/// one of these instead of reaching for a global.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewsState {
    articles: Vec<Article>,
}

impl NewsState {
    pub fn new(articles: Vec<Article>) -> Self {
        Self { articles }
    }

    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }

    pub fn find(&self, id: i64) -> Option<&Article> {
        self.articles.iter().find(|a| a.id == id)
    }

    pub fn find_mut(&mut self, id: i64) -> Option<&mut Article> {
        self.articles.iter_mut().find(|a| a.id == id)
    }

    pub fn prepend(&mut self, article: Article) {
        self.articles.insert(0, article);
    }

    /// Remove every article with `id`; returns how many were dropped
    pub fn remove(&mut self, id: i64) -> usize {
        let before = self.articles.len();
        self.articles.retain(|a| a.id != id);
        before - self.articles.len()
    }

    /// Swap in a whole new list
    pub fn replace(&mut self, articles: Vec<Article>) {
        self.articles = articles;
    }

    /// Pretty JSON with two-space indentation, the format of `news-data.json`
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.articles).context("failed to serialize article list")
    }

    pub fn from_json(data: &str) -> Result<Self> {
        let articles: Vec<Article> = serde_json::from_str(data).context("failed to parse article list")?;
        Ok(Self::new(articles))
    }

    /// Read the cached copy from the local store, if there is one
    pub fn from_store(store: &LocalStore) -> Result<Option<Self>> {
        match store.get(NEWS_KEY) {
            Some(raw) => {
                let state = Self::from_json(raw).context("cached article list is corrupt")?;
                debug!(count = state.len(), "loaded cached article list");
                Ok(Some(state))
            }
            None => Ok(None),
        }
    }

    /// Write the compact list to the local store
    pub fn save_to_store(&self, store: &mut LocalStore) -> Result<()> {
        let raw = serde_json::to_string(&self.articles).context("failed to serialize article list")?;
        store.set(NEWS_KEY, raw)
    }
}
