//! `localStorage` persistence for theme and view count.

use anyhow::Context as _;
use folio_storage::Backend;
use web_sys::Window;

use crate::js_error;

/// `window.localStorage` as a storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorageBackend {
    storage: web_sys::Storage,
}

impl LocalStorageBackend {
    pub fn open(window: &Window) -> anyhow::Result<Self> {
        let storage = window
            .local_storage()
            .map_err(js_error)
            .context("access localStorage")?
            .context("localStorage not supported by this browser")?;
        Ok(Self { storage })
    }
}

impl Backend for LocalStorageBackend {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        self.storage
            .get_item(key)
            .map_err(js_error)
            .with_context(|| format!("localStorage.getItem({key})"))
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.storage
            .set_item(key, value)
            .map_err(js_error)
            .with_context(|| format!("localStorage.setItem({key})"))
    }
}
