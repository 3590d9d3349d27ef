use common::store::NEWS_KEY;
use common::{Article, Category, LocalStore, SiteConfig};
use mockito::Matcher;
use sandesh::public::{LoadOutcome, PublicRenderer};
use sandesh::render::{BREAKING_NEWS_TEXT, FEATURED_NEWS};
use sandesh::source::{FileSource, HttpSource};
use std::collections::HashSet;
use std::sync::Arc;

fn article(id: i64, category: &str, featured: bool, breaking: bool) -> Article {
    Article {
        id,
        title: format!("Story {}", id),
        excerpt: format!("Excerpt {}", id),
        content: "Body".to_string(),
        category: category.to_string(),
        author: "Desk".to_string(),
        image: "story.jpg".to_string(),
        date: "2024-03-01T08:00:00.000Z".to_string(),
        is_breaking: breaking,
        is_featured: featured,
    }
}

fn cached_store(articles: &[Article]) -> LocalStore {
    let mut store = LocalStore::in_memory();
    store
        .set(NEWS_KEY, serde_json::to_string(articles).expect("serialize"))
        .expect("seed store");
    store
}

async fn mock_news(server: &mut mockito::ServerGuard, status: usize, body: String) -> mockito::Mock {
    server
        .mock("GET", "/news-data.json")
        .match_query(Matcher::Regex(r"^\d+$".to_string()))
        .with_status(status)
        .with_header("content-type", "application/json")
        .with_body(body)
        .create_async()
        .await
}

#[tokio::test]
async fn longer_published_file_replaces_cache() {
    let mut server = mockito::Server::new_async().await;
    let published = vec![
        article(3, "politics", false, false),
        article(2, "business", false, true),
        article(1, "sports", false, false),
    ];
    let mock = mock_news(&mut server, 200, serde_json::to_string(&published).unwrap()).await;

    let source = HttpSource::new(&format!("{}/news-data.json", server.url()), 5).expect("source");
    let store = cached_store(&[article(1, "sports", false, false)]);
    let mut renderer = PublicRenderer::new(store, Arc::new(source), SiteConfig::default());

    assert_eq!(renderer.load().await, LoadOutcome::Fetched);
    assert_eq!(renderer.state().articles(), published.as_slice());
    assert_eq!(
        renderer.document().slot(BREAKING_NEWS_TEXT),
        Some("BREAKING: Story 2")
    );

    mock.assert_async().await;
}

#[tokio::test]
async fn shorter_published_file_keeps_cache() {
    let mut server = mockito::Server::new_async().await;
    let mock = mock_news(
        &mut server,
        200,
        serde_json::to_string(&vec![article(9, "sports", false, false)]).unwrap(),
    )
    .await;

    let cached = vec![article(2, "politics", false, false), article(1, "politics", false, false)];
    let source = HttpSource::new(&format!("{}/news-data.json", server.url()), 5).expect("source");
    let mut renderer = PublicRenderer::new(cached_store(&cached), Arc::new(source), SiteConfig::default());

    assert_eq!(renderer.load().await, LoadOutcome::Kept);
    assert_eq!(renderer.state().articles(), cached.as_slice());
    let politics = renderer
        .document()
        .slot(&Category::Politics.container_id())
        .unwrap_or_default();
    assert!(politics.contains("Story 2") && politics.contains("Story 1"));

    mock.assert_async().await;
}

#[tokio::test]
async fn fetch_failure_shows_sample() {
    let mut server = mockito::Server::new_async().await;
    let _mock = mock_news(&mut server, 500, "oops".to_string()).await;

    let source = HttpSource::new(&format!("{}/news-data.json", server.url()), 5).expect("source");
    let mut renderer = PublicRenderer::new(LocalStore::in_memory(), Arc::new(source), SiteConfig::default());

    assert_eq!(renderer.load().await, LoadOutcome::Sample);
    assert_eq!(renderer.state().len(), 1);
    assert_eq!(renderer.state().articles()[0].id, 1);
    assert!(renderer
        .document()
        .slot(FEATURED_NEWS)
        .unwrap_or_default()
        .contains("Welcome to Rupandehi Sandesh"));
    assert_eq!(
        renderer.document().slot(BREAKING_NEWS_TEXT),
        Some("BREAKING: Welcome to Rupandehi Sandesh")
    );
}

#[tokio::test]
async fn malformed_json_shows_sample() {
    let mut server = mockito::Server::new_async().await;
    let _mock = mock_news(&mut server, 200, "{\"not\": \"a list\"}".to_string()).await;

    let source = HttpSource::new(&format!("{}/news-data.json", server.url()), 5).expect("source");
    let mut renderer = PublicRenderer::new(LocalStore::in_memory(), Arc::new(source), SiteConfig::default());
    assert_eq!(renderer.load().await, LoadOutcome::Sample);
}

#[tokio::test]
async fn featured_and_sports_scenario() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("news-data.json");
    let list = vec![article(1, "sports", true, false), article(2, "sports", false, false)];
    std::fs::write(&path, serde_json::to_string(&list).unwrap()).expect("write");

    let mut renderer = PublicRenderer::new(
        LocalStore::in_memory(),
        Arc::new(FileSource::new(&path)),
        SiteConfig::default(),
    );
    assert_eq!(renderer.load().await, LoadOutcome::Fetched);

    let featured = renderer.document().slot(FEATURED_NEWS).unwrap_or_default();
    assert!(featured.contains("Story 1"));
    assert!(!featured.contains("Story 2"));

    let sports = renderer
        .document()
        .slot(&Category::Sports.container_id())
        .unwrap_or_default();
    assert!(sports.contains("Story 2"));
    assert!(!sports.contains("Story 1"));

    let politics = renderer
        .document()
        .slot(&Category::Politics.container_id())
        .unwrap_or_default();
    assert_eq!(politics, "<p>No politics news available.</p>");
}

#[tokio::test]
async fn section_sets_match_filters() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("news-data.json");
    let list = vec![
        article(8, "technology", false, false),
        article(7, "technology", true, true),
        article(6, "business", false, false),
        article(5, "entertainment", false, true),
        article(4, "featured", true, false),
        article(3, "unknown", false, false),
        article(2, "technology", false, false),
    ];
    std::fs::write(&path, serde_json::to_string(&list).unwrap()).expect("write");

    let mut renderer = PublicRenderer::new(
        LocalStore::in_memory(),
        Arc::new(FileSource::new(&path)),
        SiteConfig::default(),
    );
    renderer.load().await;
    let sections = renderer.sections();

    for category in Category::ALL {
        let got: HashSet<i64> = sections.category(category).iter().map(|a| a.id).collect();
        let want: HashSet<i64> = list
            .iter()
            .filter(|a| a.category == category.as_str() && !a.is_featured)
            .map(|a| a.id)
            .collect();
        assert_eq!(got, want, "category {}", category);
    }

    let featured: HashSet<i64> = sections.featured.iter().map(|a| a.id).collect();
    assert_eq!(featured, HashSet::from([7, 4]));
    assert_eq!(sections.breaking.map(|a| a.id), Some(7));
}

#[tokio::test]
async fn breaking_text_unchanged_without_breaking_article() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("news-data.json");
    let mut renderer = PublicRenderer::new(
        LocalStore::in_memory(),
        Arc::new(FileSource::new(&path)),
        SiteConfig::default(),
    );

    std::fs::write(
        &path,
        serde_json::to_string(&vec![article(1, "politics", false, true)]).unwrap(),
    )
    .expect("write");
    renderer.load().await;
    assert_eq!(
        renderer.document().slot(BREAKING_NEWS_TEXT),
        Some("BREAKING: Story 1")
    );

    std::fs::write(
        &path,
        serde_json::to_string(&vec![
            article(3, "sports", false, false),
            article(2, "sports", false, false),
        ])
        .unwrap(),
    )
    .expect("write");
    assert_eq!(renderer.load().await, LoadOutcome::Fetched);
    assert_eq!(
        renderer.document().slot(BREAKING_NEWS_TEXT),
        Some("BREAKING: Story 1")
    );
}
