/*
sandesh - main.rs
Command line entry point: renders the public page (once or on a refresh loop),
and drives the admin editor against the local store and the exported news file.
*/

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Args as ClapArgs, Parser, Subcommand};
use common::format::{format_clock_date, format_clock_time};
use common::{ArticleForm, Category, Config, LocalStore, Theme};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::Notify;
use tokio::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use sandesh::admin::{confirm_blocking, AdminEditor, Answer, StdinConfirm, DELETE_PROMPT};
use sandesh::public::PublicRenderer;
use sandesh::refresh::{run_auto_refresh, RefreshOptions, TEMPERATURE_EVERY};
use sandesh::{source, weather};

#[derive(Parser, Debug)]
#[command(name = "sandesh", about = "Rupandehi Sandesh news site: public page renderer and admin editor")]
struct Args {
    /// Path to config.toml
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Override log level (info, debug, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load the news once and write the public page
    Render,
    /// Keep the public page fresh; press Enter to reload immediately
    Watch,
    /// Add, edit, delete and export articles
    #[command(subcommand)]
    Admin(AdminCommand),
    /// Show or flip the light/dark theme
    #[command(subcommand)]
    Theme(ThemeCommand),
    /// Print the header clock and temperature banner
    Clock,
}

#[derive(Subcommand, Debug)]
enum AdminCommand {
    /// List articles, newest first
    List,
    /// Add a new article
    Add(NewArticle),
    /// Change fields of an existing article in place
    Edit(EditArticle),
    /// Delete an article
    Delete {
        #[arg(long)]
        id: i64,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Write news-data.json for publishing
    Export,
}

fn parse_category(s: &str) -> Result<String, String> {
    s.parse::<Category>()
        .map(|c| c.as_str().to_string())
        .map_err(|e| e.to_string())
}

#[derive(ClapArgs, Debug)]
struct NewArticle {
    #[arg(long)]
    title: String,
    #[arg(long)]
    excerpt: String,
    #[arg(long)]
    content: String,
    #[arg(long, value_parser = parse_category)]
    category: String,
    #[arg(long)]
    author: String,
    /// Image URL; the placeholder is used when omitted
    #[arg(long, default_value = "")]
    image: String,
    #[arg(long)]
    breaking: bool,
    #[arg(long)]
    featured: bool,
}

impl From<NewArticle> for ArticleForm {
    fn from(a: NewArticle) -> Self {
        ArticleForm {
            title: a.title,
            excerpt: a.excerpt,
            content: a.content,
            category: a.category,
            author: a.author,
            image: a.image,
            is_breaking: a.breaking,
            is_featured: a.featured,
        }
    }
}

#[derive(ClapArgs, Debug)]
struct EditArticle {
    #[arg(long)]
    id: i64,
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    excerpt: Option<String>,
    #[arg(long)]
    content: Option<String>,
    #[arg(long, value_parser = parse_category)]
    category: Option<String>,
    #[arg(long)]
    author: Option<String>,
    #[arg(long)]
    image: Option<String>,
    #[arg(long)]
    breaking: Option<bool>,
    #[arg(long)]
    featured: Option<bool>,
}

impl EditArticle {
    fn apply(self, form: &mut ArticleForm) {
        if let Some(v) = self.title {
            form.title = v;
        }
        if let Some(v) = self.excerpt {
            form.excerpt = v;
        }
        if let Some(v) = self.content {
            form.content = v;
        }
        if let Some(v) = self.category {
            form.category = v;
        }
        if let Some(v) = self.author {
            form.author = v;
        }
        if let Some(v) = self.image {
            form.image = v;
        }
        if let Some(v) = self.breaking {
            form.is_breaking = v;
        }
        if let Some(v) = self.featured {
            form.is_featured = v;
        }
    }
}

#[derive(Subcommand, Debug)]
enum ThemeCommand {
    Show,
    Toggle,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI args
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    // Resolve config paths
    let default_path = PathBuf::from("config.default.toml");

    let override_path = if let Some(p) = args.config {
        if !p.exists() {
            error!(path = ?p, "specified config file not found");
            return Err(anyhow::anyhow!("Config file not found: {}", p.display()));
        }
        Some(p)
    } else {
        let p = PathBuf::from("config.toml");
        if p.exists() { Some(p) } else { None }
    };

    let config = match Config::load_with_defaults(
        if default_path.exists() { Some(&default_path) } else { None },
        override_path.as_deref(),
    )
    .await
    {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(%e, "failed to load configuration");
            return Err(e);
        }
    };
    info!(default = ?default_path, override = ?override_path, "configuration loaded");

    let store = LocalStore::open(&config.storage.local_store_path)?;
    let output_dir = PathBuf::from(&config.output.dir);

    match args.command {
        Command::Render => {
            let mut renderer = public_renderer(&config, store)?;
            let outcome = renderer.load().await;
            renderer.update_clock(&Local::now())?;
            renderer.update_temperature(&weather::sample_temperature(&mut rand::thread_rng()))?;
            let page = output_dir.join("index.html");
            renderer.document().write_to(&page).await?;
            info!(?outcome, articles = renderer.state().len(), page = %page.display(), "public page written");
        }
        Command::Watch => {
            let mut renderer = public_renderer(&config, store)?;
            watch(&mut renderer, &config, &output_dir).await?;
        }
        Command::Admin(cmd) => {
            admin(cmd, &config, store, &output_dir).await?;
        }
        Command::Theme(cmd) => {
            let mut store = store;
            let theme = match cmd {
                ThemeCommand::Show => Theme::load(&store, config.site.preferred_theme),
                ThemeCommand::Toggle => Theme::toggle(&mut store, config.site.preferred_theme)?,
            };
            println!("{} ({})", theme, theme.icon_class());
        }
        Command::Clock => {
            let now = Local::now();
            println!("{}", format_clock_date(&now));
            println!("{}", format_clock_time(&now));
            println!("{}", weather::sample_temperature(&mut rand::thread_rng()));
        }
    }

    Ok(())
}

fn public_renderer(config: &Config, store: LocalStore) -> Result<PublicRenderer> {
    let source = source::from_config(&config.source)?;
    Ok(PublicRenderer::new(store, Arc::from(source), config.site.clone()))
}

async fn watch(renderer: &mut PublicRenderer, config: &Config, output_dir: &Path) -> Result<()> {
    let visible = Arc::new(Notify::new());
    let shutdown = Arc::new(Notify::new());

    // Enter on stdin stands in for the page becoming visible again
    let v = visible.clone();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(_)) = lines.next_line().await {
            v.notify_one();
        }
    });

    let s = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received, stopping auto refresh");
            s.notify_one();
        }
    });

    let options = RefreshOptions {
        every: Duration::from_secs(config.refresh.interval_seconds.max(1)),
        temperature_every: TEMPERATURE_EVERY,
        output: output_dir.join("index.html"),
    };
    let loads = run_auto_refresh(renderer, options, visible, shutdown).await?;
    info!(loads, "auto refresh finished");
    Ok(())
}

async fn admin(cmd: AdminCommand, config: &Config, store: LocalStore, output_dir: &Path) -> Result<()> {
    let source = source::from_config(&config.source)?;
    let mut editor = AdminEditor::new(
        store,
        Arc::from(source),
        config.site.clone(),
        &config.storage.export_path,
    );
    editor.load().await;

    match cmd {
        AdminCommand::List => {
            for a in editor.state().articles() {
                let mut flags = Vec::new();
                if a.is_breaking {
                    flags.push("BREAKING");
                }
                if a.is_featured {
                    flags.push("FEATURED");
                }
                println!(
                    "{}  {}  [{}] {} {}",
                    a.id,
                    common::format::format_date(&a.date),
                    a.category,
                    a.title,
                    flags.join(" ")
                );
            }
        }
        AdminCommand::Add(new) => {
            let id = editor.submit(new.into())?;
            println!(
                "News added successfully (id {}). Publish {} for the main website to update.",
                id,
                editor.export_path().display()
            );
        }
        AdminCommand::Edit(fields) => {
            let id = fields.id;
            if !editor.edit(id) {
                anyhow::bail!("no article with id {}", id);
            }
            let mut form = editor.form().clone();
            fields.apply(&mut form);
            editor.submit(form).with_context(|| format!("failed to update article {}", id))?;
            println!("Article {} updated.", id);
        }
        AdminCommand::Delete { id, yes } => {
            let confirmed = yes || confirm_blocking(StdinConfirm, DELETE_PROMPT).await?;
            if editor.delete(id, &Answer(confirmed))? {
                println!("Article deleted successfully!");
            } else {
                println!("Nothing deleted.");
            }
        }
        AdminCommand::Export => {
            let path = editor.export()?;
            println!("Exported {} articles to {}", editor.state().len(), path.display());
        }
    }

    editor.update_clock(&Local::now())?;
    let page = output_dir.join("admin.html");
    editor.document().write_to(&page).await?;
    Ok(())
}
