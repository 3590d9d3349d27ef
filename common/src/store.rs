use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Key holding the cached article list (a JSON array string)
pub const NEWS_KEY: &str = "rupandehi-sandesh-news";
/// Key holding the light/dark flag
pub const THEME_KEY: &str = "theme";
/// Millisecond timestamp of the last admin save. Written, never read.
pub const LAST_UPDATE_KEY: &str = "lastNewsUpdate";

/// String key/value store persisted as one JSON object on disk.
///
/// This plays the part of the browser's local storage: the admin editor and
/// the public renderer both open the same file, and values are plain strings.
#[derive(Debug, Clone, Default)]
pub struct LocalStore {
    path: Option<PathBuf>,
    entries: BTreeMap<String, String>,
}

impl LocalStore {
    /// Open the store at `path`. A missing file is an empty store.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = match std::fs::read_to_string(&path) {
            Ok(data) if data.trim().is_empty() => BTreeMap::new(),
            Ok(data) => serde_json::from_str(&data)
                .with_context(|| format!("Failed to parse local store: {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "local store not found, starting empty");
                BTreeMap::new()
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read local store: {}", path.display()))
            }
        };
        Ok(Self { path: Some(path), entries })
    }

    /// Re-read the file so writes from another process become visible
    pub fn reload(&mut self) -> Result<()> {
        if let Some(path) = self.path.clone() {
            *self = Self::open(path)?;
        }
        Ok(())
    }

    /// A store that never touches the filesystem
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) -> Result<()> {
        self.entries.insert(key.to_string(), value.into());
        self.flush()
    }

    pub fn remove(&mut self, key: &str) -> Result<Option<String>> {
        let old = self.entries.remove(key);
        self.flush()?;
        Ok(old)
    }

    fn flush(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let data = serde_json::to_string_pretty(&self.entries).context("Failed to serialize local store")?;
        write_atomic(path, data.as_bytes())
            .with_context(|| format!("Failed to write local store: {}", path.display()))
    }
}

/// Replace `path` with `data` so readers see either the old or the new
/// contents, never a partial write. Parent directories are created.
pub fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
            parent
        }
        None => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
    tmp.write_all(data).context("Failed to write temp file")?;
    tmp.as_file().sync_all().context("Failed to sync temp file")?;
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to move temp file onto {}", path.display()))?;
    Ok(())
}
