use anyhow::{anyhow, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Image shown when an article has none or its image fails to load
pub const PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/400x200?text=News+Image";

/// A single news item as stored in the local store and in `news-data.json`.
///
/// Field names are camelCase on the wire so files written by older admin
/// pages still load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Article {
    /// Creation timestamp in milliseconds, unique within a list
    pub id: i64,
    pub title: String,
    pub excerpt: String,
    pub content: String,
    /// Free-form so unknown categories survive a round trip; see [`Category`]
    pub category: String,
    pub author: String,
    pub image: String,
    /// RFC 3339 creation time, never touched by edits
    pub date: String,
    pub is_breaking: bool,
    pub is_featured: bool,
}

impl Article {
    /// Pick an id for a new article: the creation timestamp, bumped past the
    /// largest existing id when two articles land in the same millisecond.
    /// When the largest id is `i64::MAX`, the first unused id at or below the
    /// timestamp is taken instead.
    pub fn fresh_id(existing: &[Article], now: DateTime<Utc>) -> i64 {
        let stamp = now.timestamp_millis();
        match existing.iter().map(|a| a.id).max() {
            Some(max) if stamp <= max => max.checked_add(1).unwrap_or_else(|| {
                let used: HashSet<i64> = existing.iter().map(|a| a.id).collect();
                (i64::MIN..=stamp)
                    .rev()
                    .find(|id| !used.contains(id))
                    .unwrap_or(stamp)
            }),
            _ => stamp,
        }
    }

    /// Displayed section this article belongs to, if any
    pub fn section(&self) -> Option<Category> {
        self.category.parse().ok()
    }
}

/// The fixed set of category sections on the public page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Politics,
    Business,
    Sports,
    Entertainment,
    Technology,
}

impl Category {
    /// Section order on the page
    pub const ALL: [Category; 5] = [
        Category::Politics,
        Category::Business,
        Category::Sports,
        Category::Entertainment,
        Category::Technology,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Politics => "politics",
            Category::Business => "business",
            Category::Sports => "sports",
            Category::Entertainment => "entertainment",
            Category::Technology => "technology",
        }
    }

    /// Element id of the section container, e.g. `sports-news`
    pub fn container_id(&self) -> String {
        format!("{}-news", self.as_str())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| anyhow!("unknown category: {}", s))
    }
}

/// Editable fields of the admin news form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleForm {
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub category: String,
    pub author: String,
    pub image: String,
    pub is_breaking: bool,
    pub is_featured: bool,
}

impl ArticleForm {
    /// Fill the form from an existing article (the edit path)
    pub fn from_article(article: &Article) -> Self {
        Self {
            title: article.title.clone(),
            excerpt: article.excerpt.clone(),
            content: article.content.clone(),
            category: article.category.clone(),
            author: article.author.clone(),
            image: article.image.clone(),
            is_breaking: article.is_breaking,
            is_featured: article.is_featured,
        }
    }

    /// Required-field check, the equivalent of the form's `required` attributes.
    /// The image is optional.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("title", &self.title),
            ("excerpt", &self.excerpt),
            ("content", &self.content),
            ("category", &self.category),
            ("author", &self.author),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(anyhow!("field `{}` is required", name));
            }
        }
        Ok(())
    }

    /// Build a new article from the form fields
    pub fn to_article(&self, id: i64, created: DateTime<Utc>, placeholder: &str) -> Article {
        let mut article = Article {
            id,
            date: created.to_rfc3339_opts(SecondsFormat::Millis, true),
            ..Article::default()
        };
        self.apply_to(&mut article, placeholder);
        article
    }

    /// Overwrite the editable fields of `article`, leaving `id` and `date` alone
    pub fn apply_to(&self, article: &mut Article, placeholder: &str) {
        article.title = self.title.clone();
        article.excerpt = self.excerpt.clone();
        article.content = self.content.clone();
        article.category = self.category.clone();
        article.author = self.author.clone();
        article.image = if self.image.trim().is_empty() {
            placeholder.to_string()
        } else {
            self.image.clone()
        };
        article.is_breaking = self.is_breaking;
        article.is_featured = self.is_featured;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn form() -> ArticleForm {
        ArticleForm {
            title: "Market rally".into(),
            excerpt: "Stocks up".into(),
            content: "Long story".into(),
            category: "business".into(),
            author: "Desk".into(),
            image: String::new(),
            is_breaking: true,
            is_featured: false,
        }
    }

    #[test]
    fn wire_format_is_camel_case() {
        let json = r#"{
            "id": 1700000000000,
            "title": "T",
            "excerpt": "E",
            "content": "C",
            "category": "sports",
            "author": "A",
            "image": "img.png",
            "date": "2024-01-01T00:00:00.000Z",
            "isBreaking": true,
            "isFeatured": false
        }"#;
        let article: Article = serde_json::from_str(json).expect("parse article");
        assert!(article.is_breaking);
        assert!(!article.is_featured);
        assert_eq!(article.section(), Some(Category::Sports));

        let back = serde_json::to_value(&article).expect("serialize");
        assert_eq!(back["isBreaking"], true);
        assert_eq!(back["id"], 1700000000000i64);
    }

    #[test]
    fn missing_fields_default() {
        let article: Article = serde_json::from_str(r#"{"id": 3, "title": "Only"}"#).expect("parse");
        assert_eq!(article.title, "Only");
        assert!(article.category.is_empty());
        assert!(!article.is_featured);
    }

    #[test]
    fn fresh_id_avoids_collisions() {
        let now = Utc.timestamp_millis_opt(1_000).unwrap();
        assert_eq!(Article::fresh_id(&[], now), 1_000);

        let existing = vec![Article { id: 1_000, ..Article::default() }];
        assert_eq!(Article::fresh_id(&existing, now), 1_001);

        let older = vec![Article { id: 10, ..Article::default() }];
        assert_eq!(Article::fresh_id(&older, now), 1_000);
    }

    #[test]
    fn fresh_id_at_max_id_does_not_overflow() {
        let list: Vec<Article> =
            serde_json::from_str(r#"[{"id": 9223372036854775807, "title": "x"}]"#).expect("parse");
        let now = Utc.timestamp_millis_opt(1_000).unwrap();
        assert_eq!(Article::fresh_id(&list, now), 1_000);

        let crowded = vec![
            Article { id: i64::MAX, ..Article::default() },
            Article { id: 1_000, ..Article::default() },
            Article { id: 999, ..Article::default() },
        ];
        assert_eq!(Article::fresh_id(&crowded, now), 998);

        let id = Article::fresh_id(&list, Utc::now());
        assert!(list.iter().all(|a| a.id != id));
    }

    #[test]
    fn empty_image_uses_placeholder() {
        let created = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
        let article = form().to_article(42, created, PLACEHOLDER_IMAGE);
        assert_eq!(article.image, PLACEHOLDER_IMAGE);
        assert_eq!(article.date, "2024-05-01T09:30:00.000Z");
        assert_eq!(ArticleForm::from_article(&article).title, "Market rally");
    }

    #[test]
    fn validate_rejects_blank_required_fields() {
        assert!(form().validate().is_ok());
        let mut missing = form();
        missing.author = "   ".into();
        let err = missing.validate().unwrap_err();
        assert!(err.to_string().contains("author"));
    }

    #[test]
    fn category_parsing() {
        assert_eq!("technology".parse::<Category>().unwrap(), Category::Technology);
        assert!("featured".parse::<Category>().is_err());
        assert_eq!(Category::Politics.container_id(), "politics-news");
    }
}
