use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use common::format::{format_clock_date, format_clock_time};
use common::store::{write_atomic, LAST_UPDATE_KEY};
use common::{Article, ArticleForm, LocalStore, SiteConfig, Theme};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::render::{self, Document, CURRENT_DATE, CURRENT_TIME, NEWS_LIST_CONTAINER};
use crate::source::ArticleSource;
use crate::state::NewsState;

/// Asks the operator before a destructive action.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

/// Prompt shown before an article is deleted
pub const DELETE_PROMPT: &str = "Are you sure you want to delete this article?";

/// Says yes without asking (`--yes`, tests)
pub struct AlwaysConfirm;

impl Confirm for AlwaysConfirm {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

/// An answer collected ahead of time, e.g. by [`confirm_blocking`]
pub struct Answer(pub bool);

impl Confirm for Answer {
    fn confirm(&self, _prompt: &str) -> bool {
        self.0
    }
}

/// Run a blocking confirmation (such as [`StdinConfirm`]) on the blocking
/// pool so it does not stall the runtime's workers.
pub async fn confirm_blocking<C>(confirm: C, prompt: &'static str) -> Result<bool>
where
    C: Confirm + Send + 'static,
{
    tokio::task::spawn_blocking(move || confirm.confirm(prompt))
        .await
        .context("confirmation task failed")
}

/// Prompts on stdout and reads `y`/`yes` from stdin
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        print!("{} [y/N] ", prompt);
        if std::io::stdout().flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        match std::io::stdin().lock().read_line(&mut answer) {
            Ok(_) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
            Err(e) => {
                warn!(error = %e, "could not read confirmation");
                false
            }
        }
    }
}

/// Operator-side editor: owns the article list, the news form and the admin page.
pub struct AdminEditor {
    state: NewsState,
    store: LocalStore,
    source: Arc<dyn ArticleSource>,
    site: SiteConfig,
    export_path: PathBuf,
    form: ArticleForm,
    /// Article currently loaded into the form for editing
    editing: Option<i64>,
    document: Document,
}

impl AdminEditor {
    pub fn new(
        store: LocalStore,
        source: Arc<dyn ArticleSource>,
        site: SiteConfig,
        export_path: impl Into<PathBuf>,
    ) -> Self {
        let mut document = Document::admin(&site.name);
        document.set_theme(Theme::load(&store, site.preferred_theme));
        Self {
            state: NewsState::default(),
            store,
            source,
            site,
            export_path: export_path.into(),
            form: ArticleForm::default(),
            editing: None,
            document,
        }
    }

    pub fn state(&self) -> &NewsState {
        &self.state
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn form(&self) -> &ArticleForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut ArticleForm {
        &mut self.form
    }

    pub fn editing(&self) -> Option<i64> {
        self.editing
    }

    pub fn export_path(&self) -> &Path {
        &self.export_path
    }

    /// Fetch the published file. On any failure the list starts empty.
    pub async fn load(&mut self) {
        match self.source.fetch(None).await {
            Ok(articles) => {
                info!(count = articles.len(), source = %self.source.location(), "loaded news");
                self.state.replace(articles);
            }
            Err(e) => {
                error!(error = %e, source = %self.source.location(), "error loading news");
                self.state.replace(Vec::new());
            }
        }
        if let Some(id) = self.editing {
            if self.state.find(id).is_none() {
                warn!(id, "article being edited is gone after reload, form kept as a new article");
                self.editing = None;
            }
        }
        self.render_or_log();
    }

    /// Add the form contents as a new article, or apply them to the article
    /// being edited. Returns the id of the saved article.
    pub fn submit(&mut self, form: ArticleForm) -> Result<i64> {
        form.validate()?;

        let previous = self.state.clone();
        let id = match self.editing {
            Some(id) => {
                self.apply_update(id, &form)?;
                id
            }
            None => {
                let now = Utc::now();
                let id = Article::fresh_id(self.state.articles(), now);
                let article = form.to_article(id, now, &self.site.placeholder_image);
                self.state.prepend(article);
                id
            }
        };

        self.commit(previous)?;
        info!(id, editing = self.editing.is_some(), "article saved");
        self.render()?;
        self.clear_form();
        Ok(id)
    }

    /// Copy an article into the form. The article stays in the list; the next
    /// [`submit`](Self::submit) replaces it in place. Returns false for an
    /// unknown id.
    pub fn edit(&mut self, id: i64) -> bool {
        match self.state.find(id) {
            Some(article) => {
                self.form = ArticleForm::from_article(article);
                self.editing = Some(id);
                info!(id, "article loaded for editing");
                true
            }
            None => {
                warn!(id, "no article to edit");
                false
            }
        }
    }

    /// Drop a pending edit and reset the form; the article is untouched
    pub fn cancel_edit(&mut self) {
        self.clear_form();
    }

    /// In-place update keyed by id, keeping the article's id, date and position
    pub fn update(&mut self, id: i64, form: ArticleForm) -> Result<()> {
        form.validate()?;
        let previous = self.state.clone();
        self.apply_update(id, &form)?;
        self.commit(previous)?;
        self.render()?;
        if self.editing == Some(id) {
            self.clear_form();
        }
        info!(id, "article updated");
        Ok(())
    }

    fn apply_update(&mut self, id: i64, form: &ArticleForm) -> Result<()> {
        let placeholder = self.site.placeholder_image.clone();
        let article = self
            .state
            .find_mut(id)
            .ok_or_else(|| anyhow!("no article with id {}", id))?;
        form.apply_to(article, &placeholder);
        Ok(())
    }

    /// Remove an article once the operator confirms. Returns whether anything
    /// was removed.
    pub fn delete(&mut self, id: i64, confirm: &dyn Confirm) -> Result<bool> {
        if !confirm.confirm(DELETE_PROMPT) {
            info!(id, "delete cancelled");
            return Ok(false);
        }
        let previous = self.state.clone();
        let removed = self.state.remove(id);
        if removed == 0 {
            warn!(id, "no article to delete");
            return Ok(false);
        }
        self.commit(previous)?;
        if self.editing == Some(id) {
            self.clear_form();
        }
        self.render()?;
        info!(id, "article deleted");
        Ok(true)
    }

    pub fn clear_form(&mut self) {
        self.form.reset();
        self.editing = None;
    }

    /// Persist the current list; if that fails, put `previous` back so the
    /// in-memory list never runs ahead of what was saved.
    fn commit(&mut self, previous: NewsState) -> Result<()> {
        if let Err(e) = self.persist() {
            self.state = previous;
            if let Err(restore) = self.state.save_to_store(&mut self.store) {
                error!(error = %restore, "failed to restore cached article list");
            }
            return Err(e);
        }
        Ok(())
    }

    /// Save the list to the local store and write the downloadable
    /// `news-data.json` the operator publishes. Returns the notice shown to
    /// the operator.
    pub fn persist(&mut self) -> Result<String> {
        self.state.save_to_store(&mut self.store)?;
        self.store
            .set(LAST_UPDATE_KEY, Utc::now().timestamp_millis().to_string())?;
        let path = self.export()?;
        Ok(format!(
            "News saved! Publish {} to the site for the main website to update.",
            path.display()
        ))
    }

    /// Write the pretty-printed list to the export path
    pub fn export(&self) -> Result<PathBuf> {
        let json = self.state.to_json_pretty()?;
        write_atomic(&self.export_path, json.as_bytes())
            .with_context(|| format!("failed to write export: {}", self.export_path.display()))?;
        info!(path = %self.export_path.display(), count = self.state.len(), "news data exported");
        Ok(self.export_path.clone())
    }

    fn render_or_log(&mut self) {
        if let Err(e) = self.render() {
            error!(error = %e, "failed to render news list");
        }
    }

    /// Redraw the article list
    pub fn render(&mut self) -> Result<()> {
        let html = if self.state.is_empty() {
            render::placeholder_message("No news articles found. Add your first article above.")
        } else {
            self.state
                .articles()
                .iter()
                .map(render::admin_item)
                .collect::<Vec<_>>()
                .join("\n")
        };
        self.document.set_html(NEWS_LIST_CONTAINER, html)
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::FileSource;

    fn form(title: &str) -> ArticleForm {
        ArticleForm {
            title: title.into(),
            excerpt: "Short".into(),
            content: "Body".into(),
            category: "politics".into(),
            author: "Desk".into(),
            image: String::new(),
            is_breaking: false,
            is_featured: false,
        }
    }

    fn editor(dir: &Path) -> AdminEditor {
        AdminEditor::new(
            LocalStore::in_memory(),
            Arc::new(FileSource::new(dir.join("published.json"))),
            SiteConfig::default(),
            dir.join("export").join("news-data.json"),
        )
    }

    #[tokio::test]
    async fn load_failure_yields_empty_list() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut editor = editor(dir.path());
        editor.load().await;
        assert!(editor.state().is_empty());
        assert!(editor
            .document()
            .slot(NEWS_LIST_CONTAINER)
            .unwrap_or_default()
            .contains("No news articles found"));
    }

    #[test]
    fn submit_prepends_and_resets_form() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut editor = editor(dir.path());
        editor.form_mut().title = "typing".into();

        let first = editor.submit(form("First")).expect("submit");
        let second = editor.submit(form("Second")).expect("submit");
        assert_ne!(first, second);
        assert_eq!(editor.state().articles()[0].title, "Second");
        assert_eq!(editor.state().articles()[0].image, common::PLACEHOLDER_IMAGE);
        assert_eq!(editor.form(), &ArticleForm::default());
        assert!(editor.export_path().exists());
    }

    #[test]
    fn submit_rejects_missing_fields() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut editor = editor(dir.path());
        let mut bad = form("x");
        bad.title.clear();
        assert!(editor.submit(bad).is_err());
        assert!(editor.state().is_empty());
    }

    #[test]
    fn edit_then_submit_updates_in_place() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut editor = editor(dir.path());
        let old = editor.submit(form("Old")).expect("submit");
        let newer = editor.submit(form("Newer")).expect("submit");
        let date = editor.state().find(old).expect("old").date.clone();

        assert!(editor.edit(old));
        assert_eq!(editor.form().title, "Old");
        assert_eq!(editor.state().len(), 2, "article stays listed while editing");

        let mut changed = editor.form().clone();
        changed.title = "Old, revised".into();
        assert_eq!(editor.submit(changed).expect("submit"), old);

        let ids: Vec<i64> = editor.state().articles().iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![newer, old]);
        let updated = editor.state().find(old).expect("updated");
        assert_eq!(updated.title, "Old, revised");
        assert_eq!(updated.date, date);
        assert!(editor.editing().is_none());
    }

    #[test]
    fn cancel_edit_keeps_article() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut editor = editor(dir.path());
        let id = editor.submit(form("Keep me")).expect("submit");
        assert!(editor.edit(id));
        editor.cancel_edit();
        assert!(editor.editing().is_none());
        assert_eq!(editor.state().find(id).map(|a| a.title.as_str()), Some("Keep me"));
        assert!(!editor.edit(id + 1000));
    }

    #[test]
    fn delete_respects_confirmation() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut editor = editor(dir.path());
        let id = editor.submit(form("Doomed")).expect("submit");

        assert!(!editor.delete(id, &Answer(false)).expect("declined"));
        assert_eq!(editor.state().len(), 1);

        assert!(!editor.delete(id + 1, &AlwaysConfirm).expect("absent"));
        assert_eq!(editor.state().len(), 1);

        assert!(editor.delete(id, &AlwaysConfirm).expect("delete"));
        assert!(editor.state().is_empty());
    }

    #[test]
    fn persist_returns_notice() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut editor = editor(dir.path());
        let notice = editor.persist().expect("persist");
        assert!(notice.starts_with("News saved!"));
        assert!(notice.contains("news-data.json"));
    }

    #[test]
    fn failed_persist_leaves_list_unchanged() {
        let dir = tempfile::tempdir().expect("tempdir");
        let export = dir.path().join("export-is-a-dir");
        std::fs::create_dir(&export).expect("mkdir");
        let mut editor = AdminEditor::new(
            LocalStore::in_memory(),
            Arc::new(FileSource::new(dir.path().join("published.json"))),
            SiteConfig::default(),
            &export,
        );

        assert!(editor.submit(form("Lost?")).is_err());
        assert!(editor.state().is_empty());
        assert!(editor.submit(form("Lost?")).is_err());
        assert!(editor.state().is_empty(), "retry does not stack duplicates");
    }

    #[tokio::test]
    async fn reload_drops_edit_of_vanished_article() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut editor = editor(dir.path());
        let id = editor.submit(form("Short lived")).expect("submit");
        assert!(editor.edit(id));

        // published.json does not exist, so the reload comes back empty
        editor.load().await;
        assert!(editor.editing().is_none());
        assert_eq!(editor.form().title, "Short lived");

        let new_id = editor.submit(editor.form().clone()).expect("submit after reload");
        assert_eq!(editor.state().articles()[0].id, new_id);
    }

    #[tokio::test]
    async fn confirmation_runs_off_the_runtime() {
        assert!(confirm_blocking(AlwaysConfirm, DELETE_PROMPT).await.expect("confirm"));
        assert!(!confirm_blocking(Answer(false), DELETE_PROMPT).await.expect("confirm"));

        let dir = tempfile::tempdir().expect("tempdir");
        let mut editor = editor(dir.path());
        let id = editor.submit(form("Kept")).expect("submit");
        assert!(!editor.delete(id, &Answer(false)).expect("declined"));
        assert!(editor.delete(id, &Answer(true)).expect("confirmed"));
    }

    #[test]
    fn update_unknown_id_errors() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut editor = editor(dir.path());
        assert!(editor.update(42, form("Ghost")).is_err());
    }
}
