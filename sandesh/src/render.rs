//! HTML fragments for articles and the page `Document` they are written into.
//!
//! A `Document` declares the element ids a page owns. Writing to an id the
//! page does not declare is an error, so a renderer and its layout cannot
//! drift apart silently.

use anyhow::{anyhow, Context, Result};
use common::format::format_date;
use common::{Article, Category, Theme};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

pub const CURRENT_DATE: &str = "current-date";
pub const CURRENT_TIME: &str = "current-time";
pub const TEMPERATURE: &str = "temperature";
pub const BREAKING_NEWS_TEXT: &str = "breaking-news-text";
pub const FEATURED_NEWS: &str = "featured-news";
pub const NEWS_LIST_CONTAINER: &str = "news-list-container";

/// Escape text for use in element content and quoted attribute values
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// `<p>` shown in a container with nothing to list
pub fn placeholder_message(text: &str) -> String {
    format!("<p>{}</p>", escape_html(text))
}

fn article_block(class: &str, article: &Article, placeholder: &str) -> String {
    format!(
        r#"<div class="{class}">
    <img src="{image}" alt="{title}" class="news-image" onerror="this.src='{placeholder}'">
    <div class="news-content">
        <h3 class="news-title">{title}</h3>
        <div class="news-meta">
            <span>{date}</span> •
            <span>{author}</span>
        </div>
        <p class="news-excerpt">{excerpt}</p>
    </div>
</div>"#,
        class = class,
        image = escape_html(&article.image),
        title = escape_html(&article.title),
        placeholder = escape_html(placeholder),
        date = escape_html(&format_date(&article.date)),
        author = escape_html(&article.author),
        excerpt = escape_html(&article.excerpt),
    )
}

/// One slide of the featured carousel
pub fn featured_item(article: &Article, placeholder: &str) -> String {
    article_block("featured-item", article, placeholder)
}

/// A card in a category grid
pub fn news_card(article: &Article, placeholder: &str) -> String {
    article_block("news-card", article, placeholder)
}

/// A row of the admin article list, with edit and delete actions
pub fn admin_item(article: &Article) -> String {
    let mut meta = format!(
        "{} • {} • {}",
        escape_html(&format_date(&article.date)),
        escape_html(&article.author),
        escape_html(&article.category)
    );
    if article.is_breaking {
        meta.push_str(r#" • <span style="color: red;">BREAKING</span>"#);
    }
    if article.is_featured {
        meta.push_str(r#" • <span style="color: orange;">FEATURED</span>"#);
    }

    format!(
        r#"<div class="news-item" data-id="{id}">
    <div class="news-item-header">
        <div>
            <div class="news-item-title">{title}</div>
            <div class="news-item-meta">{meta}</div>
        </div>
        <div class="news-item-actions">
            <button data-action="edit" data-id="{id}" class="btn btn-secondary btn-sm">
                <i class="fas fa-edit"></i> Edit
            </button>
            <button data-action="delete" data-id="{id}" class="btn btn-danger btn-sm">
                <i class="fas fa-trash"></i> Delete
            </button>
        </div>
    </div>
    <p>{excerpt}</p>
</div>"#,
        id = article.id,
        title = escape_html(&article.title),
        meta = meta,
        excerpt = escape_html(&article.excerpt),
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Public,
    Admin,
}

/// A page as a set of addressable element slots holding HTML.
#[derive(Debug, Clone)]
pub struct Document {
    kind: PageKind,
    site_name: String,
    theme: Theme,
    slots: BTreeMap<String, String>,
}

impl Document {
    /// The reader-facing page: clock, ticker, featured carousel and one
    /// container per category
    pub fn public(site_name: &str) -> Self {
        let mut slots = BTreeMap::new();
        slots.insert(CURRENT_DATE.to_string(), String::new());
        slots.insert(CURRENT_TIME.to_string(), String::new());
        slots.insert(TEMPERATURE.to_string(), String::new());
        slots.insert(
            BREAKING_NEWS_TEXT.to_string(),
            escape_html(&format!("Welcome to {}", site_name)),
        );
        slots.insert(FEATURED_NEWS.to_string(), placeholder_message("Loading news..."));
        for category in Category::ALL {
            slots.insert(category.container_id(), placeholder_message("Loading news..."));
        }
        Self {
            kind: PageKind::Public,
            site_name: site_name.to_string(),
            theme: Theme::default(),
            slots,
        }
    }

    /// The operator page listing every article
    pub fn admin(site_name: &str) -> Self {
        let mut slots = BTreeMap::new();
        slots.insert(CURRENT_DATE.to_string(), String::new());
        slots.insert(CURRENT_TIME.to_string(), String::new());
        slots.insert(NEWS_LIST_CONTAINER.to_string(), String::new());
        Self {
            kind: PageKind::Admin,
            site_name: site_name.to_string(),
            theme: Theme::default(),
            slots,
        }
    }

    pub fn kind(&self) -> PageKind {
        self.kind
    }

    pub fn has(&self, id: &str) -> bool {
        self.slots.contains_key(id)
    }

    pub fn slot(&self, id: &str) -> Option<&str> {
        self.slots.get(id).map(String::as_str)
    }

    /// Replace the inner HTML of element `id`
    pub fn set_html(&mut self, id: &str, html: String) -> Result<()> {
        let slot = self
            .slots
            .get_mut(id)
            .ok_or_else(|| anyhow!("page has no element with id `{}`", id))?;
        *slot = html;
        Ok(())
    }

    /// Replace the text content of element `id`
    pub fn set_text(&mut self, id: &str, text: &str) -> Result<()> {
        self.set_html(id, escape_html(text))
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
    }

    fn slot_or_empty(&self, id: &str) -> &str {
        self.slot(id).unwrap_or_default()
    }

    /// Assemble the complete HTML document
    pub fn to_html(&self) -> String {
        let name = escape_html(&self.site_name);
        let mut html = String::new();
        let _ = write!(
            html,
            r#"<!DOCTYPE html>
<html lang="en" data-theme="{theme}">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
</head>
<body>
<header>
<div class="top-bar">
<span id="{date_id}">{date}</span>
<span id="{time_id}">{time}</span>
"#,
            theme = self.theme,
            title = match self.kind {
                PageKind::Public => name.clone(),
                PageKind::Admin => format!("{} - Admin", name),
            },
            date_id = CURRENT_DATE,
            date = self.slot_or_empty(CURRENT_DATE),
            time_id = CURRENT_TIME,
            time = self.slot_or_empty(CURRENT_TIME),
        );
        if self.kind == PageKind::Public {
            let _ = writeln!(
                html,
                r#"<span id="{}">{}</span>"#,
                TEMPERATURE,
                self.slot_or_empty(TEMPERATURE)
            );
        }
        let _ = write!(
            html,
            r#"<button id="theme-toggle"><i class="{icon}"></i></button>
</div>
<h1 class="logo">{name}</h1>
</header>
<main>
"#,
            icon = self.theme.icon_class(),
            name = name,
        );

        match self.kind {
            PageKind::Public => {
                let _ = write!(
                    html,
                    r#"<div class="breaking-news"><span id="{}">{}</span></div>
<section class="featured"><h2>Featured</h2>
<div id="{}" class="featured-carousel">
{}
</div>
</section>
"#,
                    BREAKING_NEWS_TEXT,
                    self.slot_or_empty(BREAKING_NEWS_TEXT),
                    FEATURED_NEWS,
                    self.slot_or_empty(FEATURED_NEWS),
                );
                for category in Category::ALL {
                    let id = category.container_id();
                    let _ = write!(
                        html,
                        r#"<section id="{cat}" class="category-section"><h2>{cat}</h2>
<div id="{id}" class="news-grid">
{body}
</div>
</section>
"#,
                        cat = category,
                        id = id,
                        body = self.slot_or_empty(&id),
                    );
                }
            }
            PageKind::Admin => {
                let _ = write!(
                    html,
                    r#"<section class="news-list"><h2>Articles</h2>
<div id="{}">
{}
</div>
</section>
"#,
                    NEWS_LIST_CONTAINER,
                    self.slot_or_empty(NEWS_LIST_CONTAINER),
                );
            }
        }

        html.push_str("</main>\n</body>\n</html>\n");
        html
    }

    /// Write the assembled page, creating parent directories as needed
    pub async fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create output directory: {}", parent.display()))?;
        }
        tokio::fs::write(path, self.to_html())
            .await
            .with_context(|| format!("failed to write page: {}", path.display()))?;
        Ok(())
    }
}
