use anyhow::Result;
use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use common::format::{format_clock_date, format_clock_time};
use common::{Article, Category, LocalStore, SiteConfig, Theme};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::render::{self, Document, BREAKING_NEWS_TEXT, CURRENT_DATE, CURRENT_TIME, FEATURED_NEWS, TEMPERATURE};
use crate::source::ArticleSource;
use crate::state::NewsState;

/// The current list split into what each part of the page shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sections<'a> {
    /// Every featured article, whatever its category
    pub featured: Vec<&'a Article>,
    /// One entry per [`Category::ALL`], featured articles excluded
    pub categories: Vec<(Category, Vec<&'a Article>)>,
    /// First breaking article in list order
    pub breaking: Option<&'a Article>,
}

impl<'a> Sections<'a> {
    pub fn partition(articles: &'a [Article]) -> Self {
        let featured = articles.iter().filter(|a| a.is_featured).collect();
        let categories = Category::ALL
            .iter()
            .map(|&category| {
                let items = articles
                    .iter()
                    .filter(|a| a.category == category.as_str() && !a.is_featured)
                    .collect();
                (category, items)
            })
            .collect();
        let breaking = articles.iter().find(|a| a.is_breaking);
        Self {
            featured,
            categories,
            breaking,
        }
    }

    pub fn category(&self, category: Category) -> &[&'a Article] {
        self.categories
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, items)| items.as_slice())
            .unwrap_or_default()
    }
}

/// What a call to [`PublicRenderer::load`] ended up showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The published file was longer than what we had and replaced it
    Fetched,
    /// The published file was not longer; the cached or previous list stays
    Kept,
    /// Something failed and the sample article is shown
    Sample,
}

/// The single article shown when nothing can be loaded
pub fn sample_articles(site: &SiteConfig, now: DateTime<Utc>) -> Vec<Article> {
    vec![Article {
        id: 1,
        title: format!("Welcome to {}", site.name),
        category: "featured".to_string(),
        excerpt: "Your trusted news portal for latest updates from Rupandehi and beyond.".to_string(),
        content: format!(
            "{} is your premier source for news, updates, and stories from Rupandehi and surrounding areas. \
             We are committed to delivering accurate, timely, and relevant news to our readers.",
            site.name
        ),
        image: "https://via.placeholder.com/400x200?text=Rupandehi+Sandesh".to_string(),
        date: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        author: "Editor".to_string(),
        is_breaking: true,
        is_featured: true,
    }]
}

/// Reader-facing page: loads the article list and draws it into a [`Document`].
pub struct PublicRenderer {
    state: NewsState,
    store: LocalStore,
    source: Arc<dyn ArticleSource>,
    site: SiteConfig,
    document: Document,
}

impl PublicRenderer {
    pub fn new(store: LocalStore, source: Arc<dyn ArticleSource>, site: SiteConfig) -> Self {
        let mut document = Document::public(&site.name);
        document.set_theme(Theme::load(&store, site.preferred_theme));
        Self {
            state: NewsState::default(),
            store,
            source,
            site,
            document,
        }
    }

    pub fn state(&self) -> &NewsState {
        &self.state
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Show the local-store copy right away, then take the published file if
    /// it holds more articles. Any failure swaps in the sample article.
    pub async fn load(&mut self) -> LoadOutcome {
        match self.try_load().await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(error = %e, "error loading news, showing sample data");
                self.state.replace(sample_articles(&self.site, Utc::now()));
                self.render_or_log();
                LoadOutcome::Sample
            }
        }
    }

    async fn try_load(&mut self) -> Result<LoadOutcome> {
        self.store.reload()?;
        if let Some(cached) = NewsState::from_store(&self.store)? {
            self.state = cached;
            self.render()?;
        }

        let stamp = Utc::now().timestamp_millis();
        let fetched = self.source.fetch(Some(stamp)).await?;
        debug!(
            source = %self.source.location(),
            fetched = fetched.len(),
            current = self.state.len(),
            "published news loaded"
        );

        // Longer list wins; deletions and edits in the file are not detected.
        if fetched.len() > self.state.len() {
            info!(count = fetched.len(), "published news is newer, replacing list");
            self.state.replace(fetched);
            self.render()?;
            Ok(LoadOutcome::Fetched)
        } else {
            Ok(LoadOutcome::Kept)
        }
    }

    fn render_or_log(&mut self) {
        if let Err(e) = self.render() {
            error!(error = %e, "failed to render news");
        }
    }

    pub fn sections(&self) -> Sections<'_> {
        Sections::partition(self.state.articles())
    }

    /// Redraw the featured carousel, each category grid and the ticker
    pub fn render(&mut self) -> Result<()> {
        let placeholder = self.site.placeholder_image.as_str();
        let sections = Sections::partition(self.state.articles());

        let featured = if sections.featured.is_empty() {
            render::placeholder_message("No featured news available.")
        } else {
            sections
                .featured
                .iter()
                .map(|a| render::featured_item(a, placeholder))
                .collect::<Vec<_>>()
                .join("\n")
        };

        let mut grids = Vec::with_capacity(sections.categories.len());
        for (category, items) in &sections.categories {
            let html = if items.is_empty() {
                render::placeholder_message(&format!("No {} news available.", category))
            } else {
                items
                    .iter()
                    .map(|a| render::news_card(a, placeholder))
                    .collect::<Vec<_>>()
                    .join("\n")
            };
            grids.push((category.container_id(), html));
        }

        let breaking = sections.breaking.map(|a| format!("BREAKING: {}", a.title));

        self.document.set_html(FEATURED_NEWS, featured)?;
        for (id, html) in grids {
            self.document.set_html(&id, html)?;
        }
        if let Some(text) = breaking {
            self.document.set_text(BREAKING_NEWS_TEXT, &text)?;
        }
        Ok(())
    }

    /// Header clock
    pub fn update_clock<Tz>(&mut self, now: &DateTime<Tz>) -> Result<()>
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        self.document.set_text(CURRENT_DATE, &format_clock_date(now))?;
        self.document.set_text(CURRENT_TIME, &format_clock_time(now))
    }

    pub fn update_temperature(&mut self, banner: &str) -> Result<()> {
        self.document.set_text(TEMPERATURE, banner)
    }

    /// Re-read the theme flag, e.g. after the operator toggled it
    pub fn refresh_theme(&mut self) {
        self.document
            .set_theme(Theme::load(&self.store, self.site.preferred_theme));
    }
}
