//! Typed settings facade.
//!
//! [`SettingsCache`] is the only way the rest of CLASSIC reads or writes
//! configuration. Build one per installation and pass it by reference (or in
//! an `Arc`) to whatever needs settings:
//!
//! ```no_run
//! use classic_settings::{GameIdentity, SettingsCache, Store};
//!
//! let settings = SettingsCache::new(".", GameIdentity::default());
//! let fcx: Option<bool> = settings.classic_setting("FCX Mode")?;
//! let hints: Vec<String> =
//!     settings.get_setting_or(Store::Settings, "Hints.Shown", Vec::new())?;
//! settings.set_setting(Store::Settings, "FCX Mode", &true)?;
//! # Ok::<(), classic_settings::Error>(())
//! ```
//!
//! ## Reads
//!
//! `get_setting` returns `Ok(None)` when the key is absent (or null). A value
//! that exists but has the wrong shape is [`Error::Coercion`].
//!
//! ## Writes
//!
//! `set_setting` always overwrites. `get_setting_or` writes its fallback only
//! when the key is absent and otherwise leaves the stored value alone. Both
//! refuse `Main` and `Game` with [`Error::ReadOnlyStore`] before any file is
//! touched.
//!
//! ## Game changes
//!
//! `Game` and `GameLocal` documents stay cached after the game identity
//! changes. Call [`SettingsCache::reload_store`] for both after switching games.

use crate::cache::{CachedDocument, DocumentCache};
use crate::document::{Node, SettingValue, navigate};
use crate::game::GameIdentitySource;
use crate::store::Store;
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Typed get/set access to every settings store.
#[derive(Debug)]
pub struct SettingsCache {
    documents: DocumentCache,
}

impl SettingsCache {
    /// Create a cache for the installation at `root`.
    pub fn new(root: impl Into<PathBuf>, game: impl GameIdentitySource + 'static) -> Self {
        Self::with_game_source(root, Arc::new(game))
    }

    /// Create a cache reading game identity from an already shared source.
    pub fn with_game_source(root: impl Into<PathBuf>, game: Arc<dyn GameIdentitySource>) -> Self {
        Self {
            documents: DocumentCache::new(root, game),
        }
    }

    /// The installation root.
    pub fn root(&self) -> &Path {
        self.documents.root_dir()
    }

    /// Read the value at `path` in `store`.
    pub fn get_setting<T: SettingValue>(&self, store: Store, path: &str) -> Result<Option<T>> {
        let node = self
            .documents
            .read(store, |root| navigate::get(root, path).map(|n| n.cloned()))??;
        match node {
            Some(node) => decode(store, path, &node),
            None => Ok(None),
        }
    }

    /// Read the value at `path`, storing `fallback` there first if it is absent.
    ///
    /// An existing value is returned unchanged even when it differs from
    /// `fallback`. Always fails on read-only stores, whether or not the value
    /// exists.
    pub fn get_setting_or<T: SettingValue>(&self, store: Store, path: &str, fallback: T) -> Result<T> {
        ensure_writable(store)?;
        navigate::segments(path)?;

        self.documents.with_document(store, |doc| {
            if let Some(node) = navigate::get(doc.root(), path)? {
                if let Some(value) = decode(store, path, node)? {
                    return Ok(value);
                }
            }

            let encoded = encode(store, path, &fallback)?;
            doc.edit(|root| navigate::set(root, path, encoded))?;
            tracing::debug!(store = %store, path, "stored default setting");
            Ok(fallback)
        })
    }

    /// Write `value` at `path` in `store`, replacing whatever was there.
    pub fn set_setting<T: SettingValue>(&self, store: Store, path: &str, value: &T) -> Result<()> {
        ensure_writable(store)?;
        navigate::segments(path)?;
        let encoded = encode(store, path, value)?;

        self.documents
            .with_document(store, |doc| doc.edit(|root| navigate::set(root, path, encoded)))
    }

    /// Read a user preference from the `Settings` store.
    pub fn classic_setting<T: SettingValue>(&self, key: &str) -> Result<Option<T>> {
        self.get_setting(Store::Settings, key)
    }

    /// Forget the cached copy of `store`; the next access re-reads its file.
    pub fn reload_store(&self, store: Store) {
        self.documents.invalidate(store);
    }

    /// Forget every cached store.
    pub fn reload_all(&self) {
        self.documents.invalidate_all();
    }

    /// Backing file of `store`, relative to the installation root.
    pub fn path_for(&self, store: Store) -> PathBuf {
        self.documents.relative_path(store)
    }

    /// Backing file of `store` under the installation root.
    pub fn file_for(&self, store: Store) -> PathBuf {
        self.documents.absolute_path(store)
    }

    /// Snapshot of the resident document for `store`, without loading it.
    pub fn cached_document(&self, store: Store) -> Option<CachedDocument> {
        self.documents.cached(store)
    }
}

fn ensure_writable(store: Store) -> Result<()> {
    if store.is_mutable() {
        Ok(())
    } else {
        tracing::warn!(store = %store, "rejected write to read-only settings store");
        Err(Error::ReadOnlyStore { store })
    }
}

fn decode<T: SettingValue>(store: Store, path: &str, node: &Node) -> Result<Option<T>> {
    T::decode(node).map_err(|source| Error::Coercion {
        store,
        path: path.to_string(),
        source,
    })
}

fn encode<T: SettingValue>(store: Store, path: &str, value: &T) -> Result<Node> {
    value.encode().map_err(|source| Error::Coercion {
        store,
        path: path.to_string(),
        source,
    })
}
