//! Key-value persistence for reader preferences.

use std::cell::RefCell;
use std::collections::HashMap;

use anyhow::Context as _;
use folio_core::Theme;

pub const THEME_KEY: &str = "theme";
pub const PAGE_VIEWS_KEY: &str = "pageViews";

/// A string key-value store local to the browser profile.
pub trait Backend {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Backend for MemoryBackend {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

impl<B: Backend + ?Sized> Backend for std::rc::Rc<B> {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        (**self).set(key, value)
    }
}

pub struct Storage {
    backend: Box<dyn Backend>,
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage").finish_non_exhaustive()
    }
}

impl Storage {
    pub fn new(backend: impl Backend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::new())
    }

    /// Stored theme, or `None` when nothing valid was saved.
    pub fn load_theme(&self) -> anyhow::Result<Option<Theme>> {
        let raw = self.backend.get(THEME_KEY).context("read theme")?;
        Ok(raw.and_then(|value| value.parse::<Theme>().ok()))
    }

    pub fn save_theme(&self, theme: Theme) -> anyhow::Result<()> {
        self.backend
            .set(THEME_KEY, theme.as_str())
            .context("write theme")
    }

    pub fn page_views(&self) -> anyhow::Result<u64> {
        let raw = self.backend.get(PAGE_VIEWS_KEY).context("read page views")?;
        Ok(raw
            .and_then(|value| value.trim().parse::<u64>().ok())
            .unwrap_or(0))
    }

    /// Increments the stored view counter and returns the new value.
    pub fn record_page_view(&self) -> anyhow::Result<u64> {
        let views = self.page_views()?.saturating_add(1);
        self.backend
            .set(PAGE_VIEWS_KEY, &views.to_string())
            .context("write page views")?;
        Ok(views)
    }
}
