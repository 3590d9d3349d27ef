use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

use crate::store::{LocalStore, THEME_KEY};

/// Light/dark flag written to the document's `data-theme` attribute
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    /// Icon on the toggle button: a sun offers the way back to light
    pub fn icon_class(&self) -> &'static str {
        match self {
            Theme::Dark => "fas fa-sun",
            Theme::Light => "fas fa-moon",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    /// Saved theme, or `preferred` when nothing usable is stored
    pub fn load(store: &LocalStore, preferred: Theme) -> Self {
        match store.get(THEME_KEY) {
            Some(raw) => Theme::parse(raw).unwrap_or_else(|| {
                warn!(value = raw, "ignoring unknown stored theme");
                preferred
            }),
            None => preferred,
        }
    }

    pub fn save(&self, store: &mut LocalStore) -> Result<()> {
        store.set(THEME_KEY, self.as_str())
    }

    /// Flip the stored theme and return the new one
    pub fn toggle(store: &mut LocalStore, preferred: Theme) -> Result<Self> {
        let next = Theme::load(store, preferred).toggled();
        next.save(store)?;
        debug!(theme = next.as_str(), "theme toggled");
        Ok(next)
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_persists() {
        let mut store = LocalStore::in_memory();
        assert_eq!(Theme::load(&store, Theme::Light), Theme::Light);

        let next = Theme::toggle(&mut store, Theme::Light).expect("toggle");
        assert_eq!(next, Theme::Dark);
        assert_eq!(store.get(THEME_KEY), Some("dark"));
        assert_eq!(next.icon_class(), "fas fa-sun");

        let back = Theme::toggle(&mut store, Theme::Light).expect("toggle");
        assert_eq!(back, Theme::Light);
        assert_eq!(back.icon_class(), "fas fa-moon");
    }

    #[test]
    fn preferred_scheme_when_unset_or_garbage() {
        let mut store = LocalStore::in_memory();
        assert_eq!(Theme::load(&store, Theme::Dark), Theme::Dark);
        store.set(THEME_KEY, "sepia").expect("set");
        assert_eq!(Theme::load(&store, Theme::Dark), Theme::Dark);
    }
}
