//! Lazy per-store document cache.
//!
//! Each store has its own slot guarded by its own mutex. The first access to a
//! store resolves its path, reads and parses the file, and keeps the parsed
//! tree resident until [`DocumentCache::invalidate`] is called. Everything a
//! caller does with a store (load-or-create, read, edit-and-persist) happens
//! while holding that store's lock, so:
//!
//! - two threads that both find `Settings` missing materialize it once
//! - no reader ever sees a half-applied edit
//!
//! Stores backed by different files never share a lock. `Test` and `Settings`
//! are backed by the same file and therefore share one slot, so a write
//! through either is seen by both. The only nested acquisition is
//! `Settings` -> `Main` during template materialization; `Main` never waits on
//! another store.
//!
//! ## Missing files
//!
//! | Store | File absent |
//! |---|---|
//! | `Main`, `Game` | [`Error::MissingImmutableStore`] |
//! | `Settings` | materialized from the template in `Main` (see [`template`]) |
//! | `Ignore`, `GameLocal`, `Test` | empty document; file created on first write |

pub mod template;

use crate::document::{Mapping, Node};
use crate::game::GameIdentitySource;
use crate::store::Store;
use crate::store::paths::StorePaths;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tempfile::NamedTempFile;

/// A store's parsed document, as held in the cache.
#[derive(Debug, Clone)]
pub struct CachedDocument {
    /// Root mapping node
    root: Node,
    /// Absolute path the document was loaded from
    path: PathBuf,
    /// When the document was read (or created)
    loaded_at: DateTime<Utc>,
    /// Whether the backing file exists
    on_disk: bool,
}

impl CachedDocument {
    fn new(root: Node, path: PathBuf) -> Self {
        Self {
            root,
            path,
            loaded_at: Utc::now(),
            on_disk: true,
        }
    }

    /// An empty document for a file that has not been written yet.
    fn unsaved(path: PathBuf) -> Self {
        Self {
            on_disk: false,
            ..Self::new(Node::Mapping(Mapping::new()), path)
        }
    }

    /// The root node.
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// The file this document was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// When the document entered the cache.
    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    /// Whether the backing file exists. False until the first write for a
    /// store that started empty.
    pub fn on_disk(&self) -> bool {
        self.on_disk
    }
}

/// Locked access to one store's document.
///
/// Obtained through [`DocumentCache::with_document`]. Edits go through
/// [`DocumentHandle::edit`], which persists before touching the cached tree.
pub struct DocumentHandle<'a> {
    store: Store,
    document: &'a mut CachedDocument,
}

impl DocumentHandle<'_> {
    /// The store this handle belongs to.
    pub fn store(&self) -> Store {
        self.store
    }

    /// The current root node.
    pub fn root(&self) -> &Node {
        &self.document.root
    }

    /// The backing file path.
    pub fn path(&self) -> &Path {
        &self.document.path
    }

    /// Apply `f` to a copy of the tree, write the result to disk, then make it
    /// the cached tree.
    ///
    /// If `f` or the write fails, neither the file nor the cached tree changes.
    pub fn edit<R>(&mut self, f: impl FnOnce(&mut Node) -> Result<R>) -> Result<R> {
        if !self.store.is_mutable() {
            return Err(Error::ReadOnlyStore { store: self.store });
        }

        let mut updated = self.document.root.clone();
        let result = f(&mut updated)?;

        let text = serde_yaml::to_string(&updated)?;
        write_atomic(&self.document.path, &text)?;
        self.document.root = updated;
        self.document.on_disk = true;

        tracing::debug!(
            store = %self.store,
            path = %self.document.path.display(),
            "persisted settings document"
        );
        Ok(result)
    }
}

/// Cache of parsed store documents under one installation root.
pub struct DocumentCache {
    root_dir: PathBuf,
    game: Arc<dyn GameIdentitySource>,
    slots: [Mutex<Option<CachedDocument>>; Store::SLOT_COUNT],
}

impl DocumentCache {
    /// Create an empty cache. Nothing is read until a store is first used.
    pub fn new(root_dir: impl Into<PathBuf>, game: Arc<dyn GameIdentitySource>) -> Self {
        Self {
            root_dir: root_dir.into(),
            game,
            slots: Default::default(),
        }
    }

    /// The installation root all store paths are relative to.
    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// A store's backing file relative to the root, for the current game.
    pub fn relative_path(&self, store: Store) -> PathBuf {
        StorePaths::resolve(store, &self.game.current())
    }

    /// A store's backing file under the root, for the current game.
    pub fn absolute_path(&self, store: Store) -> PathBuf {
        self.root_dir.join(self.relative_path(store))
    }

    /// Run `f` with the store's document, loading it first if needed.
    ///
    /// The store's lock is held for the whole call.
    pub fn with_document<R>(
        &self,
        store: Store,
        f: impl FnOnce(&mut DocumentHandle<'_>) -> Result<R>,
    ) -> Result<R> {
        let mut slot = self.lock(store);
        let document = match slot.take() {
            // `Test` found no file; `Settings` must still build it from the template.
            Some(document) if store == Store::Settings && !document.on_disk => self.load(store)?,
            Some(document) => {
                tracing::trace!(store = %store, "settings cache hit");
                document
            }
            None => self.load(store)?,
        };
        let document = slot.insert(document);
        let mut handle = DocumentHandle { store, document };
        f(&mut handle)
    }

    /// Run `f` with the store's root node, loading it first if needed.
    pub fn read<R>(&self, store: Store, f: impl FnOnce(&Node) -> R) -> Result<R> {
        self.with_document(store, |doc| Ok(f(doc.root())))
    }

    /// Drop the cached document for `store`; the next access re-reads the file.
    ///
    /// `Test` and `Settings` share a slot, so invalidating one drops both.
    pub fn invalidate(&self, store: Store) {
        if self.lock(store).take().is_some() {
            tracing::debug!(store = %store, "settings document invalidated");
        }
    }

    /// Drop every cached document.
    pub fn invalidate_all(&self) {
        for store in Store::ALL {
            self.invalidate(store);
        }
    }

    /// Whether `store` currently has a resident document.
    pub fn is_cached(&self, store: Store) -> bool {
        self.lock(store).is_some()
    }

    /// A copy of the resident document for `store`, if any. Never loads.
    pub fn cached(&self, store: Store) -> Option<CachedDocument> {
        self.lock(store).clone()
    }

    /// Lock a store's slot.
    ///
    /// A panic while holding the lock may have left the slot mid-update, so a
    /// poisoned slot is emptied and reloaded from disk on next use.
    fn lock(&self, store: Store) -> MutexGuard<'_, Option<CachedDocument>> {
        let slot = &self.slots[store.slot()];
        match slot.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!(store = %store, "settings lock poisoned, discarding cached document");
                let mut guard = poisoned.into_inner();
                *guard = None;
                slot.clear_poison();
                guard
            }
        }
    }

    /// Read a store from disk, creating it where the store allows.
    fn load(&self, store: Store) -> Result<CachedDocument> {
        let path = self.absolute_path(store);

        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return self.create_missing(store, path);
            }
            Err(e) => return Err(Error::io(path, e)),
        };

        let root = parse_document(&text, &path)?;
        tracing::debug!(store = %store, path = %path.display(), "loaded settings document");
        Ok(CachedDocument::new(root, path))
    }

    fn create_missing(&self, store: Store, path: PathBuf) -> Result<CachedDocument> {
        match store {
            Store::Main | Store::Game => Err(Error::MissingImmutableStore { store, path }),
            Store::Settings => {
                let defaults = self.read(Store::Main, template::render_defaults)??;
                write_atomic(&path, &defaults)?;
                tracing::info!(path = %path.display(), "created settings file from defaults");

                let text = fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
                let root = parse_document(&text, &path)?;
                Ok(CachedDocument::new(root, path))
            }
            Store::Ignore | Store::GameLocal | Store::Test => {
                tracing::debug!(store = %store, path = %path.display(), "no settings file yet, starting empty");
                Ok(CachedDocument::unsaved(path))
            }
        }
    }
}

impl std::fmt::Debug for DocumentCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentCache")
            .field("root_dir", &self.root_dir)
            .field("game", &self.game.current())
            .finish_non_exhaustive()
    }
}

/// Parse document text into a root mapping.
///
/// An empty file is an empty mapping.
pub fn parse_document(text: &str, path: &Path) -> Result<Node> {
    let node: Node = serde_yaml::from_str(text).map_err(|source| Error::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    match node {
        Node::Null => Ok(Node::Mapping(Mapping::new())),
        Node::Mapping(_) => Ok(node),
        _ => Err(Error::RootNotMapping {
            path: path.to_path_buf(),
        }),
    }
}

/// Replace `path` with `contents` in one step.
///
/// Writes to a temporary file next to the target and renames it into place,
/// so readers see either the old or the new file, never a partial one.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;

    let mut file = NamedTempFile::new_in(parent).map_err(|e| Error::io(parent, e))?;
    file.write_all(contents.as_bytes())
        .map_err(|e| Error::io(file.path(), e))?;
    file.as_file()
        .sync_all()
        .map_err(|e| Error::io(file.path(), e))?;
    file.persist(path).map_err(|e| Error::io(path, e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::navigate;
    use crate::game::GameIdentity;
    use crate::test_utils::TestEnv;

    fn cache_for(env: &TestEnv) -> DocumentCache {
        DocumentCache::new(env.path(), Arc::new(env.game.clone()))
    }

    #[test]
    fn test_load_is_lazy_and_cached() {
        let env = TestEnv::new();
        env.write_store(Store::Ignore, "list:\n  - a\n");
        let cache = cache_for(&env);

        assert!(!cache.is_cached(Store::Ignore));
        let len = cache
            .read(Store::Ignore, |root| root.as_mapping().map(|m| m.len()))
            .unwrap();
        assert_eq!(len, Some(1));
        assert!(cache.is_cached(Store::Ignore));

        // Out-of-band edits are not seen until invalidated
        env.write_store(Store::Ignore, "list: []\nother: 1\n");
        let len = cache
            .read(Store::Ignore, |root| root.as_mapping().map(|m| m.len()))
            .unwrap();
        assert_eq!(len, Some(1));

        cache.invalidate(Store::Ignore);
        let len = cache
            .read(Store::Ignore, |root| root.as_mapping().map(|m| m.len()))
            .unwrap();
        assert_eq!(len, Some(2));
    }

    #[test]
    fn test_missing_immutable_store_is_fatal() {
        let env = TestEnv::new();
        let cache = cache_for(&env);

        for store in [Store::Main, Store::Game] {
            let err = cache.read(store, |_| ()).unwrap_err();
            assert!(matches!(err, Error::MissingImmutableStore { store: s, .. } if s == store));
            assert!(err.is_fatal());
            assert!(!cache.is_cached(store));
        }
    }

    #[test]
    fn test_missing_mutable_store_starts_empty_without_file() {
        let env = TestEnv::new();
        let cache = cache_for(&env);

        for store in [Store::Ignore, Store::GameLocal, Store::Test] {
            let is_empty = cache
                .read(store, |root| root.as_mapping().is_some_and(|m| m.is_empty()))
                .unwrap();
            assert!(is_empty);
            assert!(!env.store_path(store).exists());
        }
    }

    #[test]
    fn test_empty_file_is_empty_mapping() {
        let env = TestEnv::new();
        env.write_store(Store::Ignore, "");
        let cache = cache_for(&env);
        assert!(cache.read(Store::Ignore, |root| root.is_mapping()).unwrap());
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let env = TestEnv::new();
        env.write_store(Store::Ignore, "key: [unclosed\n");
        let cache = cache_for(&env);

        let err = cache.read(Store::Ignore, |_| ()).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
        assert!(err.to_string().contains("CLASSIC Ignore.yaml"));
    }

    #[test]
    fn test_scalar_root_is_rejected() {
        let env = TestEnv::new();
        env.write_store(Store::Ignore, "just text\n");
        let cache = cache_for(&env);

        let err = cache.read(Store::Ignore, |_| ()).unwrap_err();
        assert!(matches!(err, Error::RootNotMapping { .. }));
    }

    #[test]
    fn test_edit_persists_and_updates_memory() {
        let env = TestEnv::new();
        let cache = cache_for(&env);

        cache
            .with_document(Store::GameLocal, |doc| {
                doc.edit(|root| navigate::set(root, "Game_Info.Root_Folder", Node::from("C:/Games")))
            })
            .unwrap();

        let on_disk = parse_document(&env.read_store(Store::GameLocal), Path::new("x")).unwrap();
        assert_eq!(
            navigate::get(&on_disk, "Game_Info.Root_Folder").unwrap(),
            Some(&Node::from("C:/Games"))
        );

        let in_memory = cache
            .read(Store::GameLocal, |root| {
                navigate::get(root, "Game_Info.Root_Folder").unwrap().cloned()
            })
            .unwrap();
        assert_eq!(in_memory, Some(Node::from("C:/Games")));
    }

    #[test]
    fn test_failed_edit_changes_nothing() {
        let env = TestEnv::new();
        env.write_store(Store::Ignore, "a: plain\n");
        let cache = cache_for(&env);

        let err = cache
            .with_document(Store::Ignore, |doc| {
                doc.edit(|root| navigate::set(root, "a.b", Node::from(1)))
            })
            .unwrap_err();
        assert!(matches!(err, Error::PathConflict { .. }));
        assert_eq!(env.read_store(Store::Ignore), "a: plain\n");
    }

    #[test]
    fn test_edit_rejects_immutable_store() {
        let env = TestEnv::new();
        env.write_store(Store::Main, "a: 1\n");
        let cache = cache_for(&env);

        let err = cache
            .with_document(Store::Main, |doc| {
                doc.edit(|root| navigate::set(root, "a", Node::from(2)))
            })
            .unwrap_err();
        assert!(matches!(err, Error::ReadOnlyStore { store: Store::Main }));
        assert_eq!(env.read_store(Store::Main), "a: 1\n");
    }

    #[test]
    fn test_invalidate_only_affects_one_store() {
        let env = TestEnv::new();
        env.write_store(Store::Main, "a: 1\n");
        env.write_store(Store::Ignore, "b: 2\n");
        let cache = cache_for(&env);

        cache.read(Store::Main, |_| ()).unwrap();
        cache.read(Store::Ignore, |_| ()).unwrap();
        cache.invalidate(Store::Ignore);

        assert!(cache.is_cached(Store::Main));
        assert!(!cache.is_cached(Store::Ignore));
    }

    #[test]
    fn test_game_path_follows_identity() {
        let env = TestEnv::new();
        let cache = cache_for(&env);

        env.game.set(GameIdentity::new("Skyrim", true));
        assert_eq!(
            cache.relative_path(Store::Game),
            PathBuf::from("CLASSIC Data/databases/CLASSIC SkyrimVR.yaml")
        );
    }

    #[test]
    fn test_cached_document_metadata() {
        let env = TestEnv::new();
        env.write_store(Store::Ignore, "a: 1\n");
        let cache = cache_for(&env);

        assert!(cache.cached(Store::Ignore).is_none());
        let before = Utc::now();
        cache.read(Store::Ignore, |_| ()).unwrap();

        let doc = cache.cached(Store::Ignore).unwrap();
        assert_eq!(doc.path(), env.store_path(Store::Ignore));
        assert!(doc.loaded_at() >= before);
    }

    #[test]
    fn test_test_and_settings_share_one_document() {
        let env = TestEnv::new();
        env.write_store(Store::Settings, "a: 1\n");
        let cache = cache_for(&env);

        cache.read(Store::Settings, |_| ()).unwrap();
        cache
            .with_document(Store::Test, |doc| {
                doc.edit(|root| navigate::set(root, "b", Node::from(2)))
            })
            .unwrap();

        let b = cache
            .read(Store::Settings, |root| navigate::get(root, "b").unwrap().cloned())
            .unwrap();
        assert_eq!(b, Some(Node::from(2)));

        cache.invalidate(Store::Test);
        assert!(!cache.is_cached(Store::Settings));
    }

    #[test]
    fn test_settings_materializes_after_test_found_no_file() {
        let env = TestEnv::new();
        env.write_store(
            Store::Main,
            "CLASSIC_Info:\n  default_settings: |\n    CLASSIC_Settings:\n      Test_Setting: default\n",
        );
        let cache = cache_for(&env);

        let empty = cache
            .read(Store::Test, |root| root.as_mapping().is_some_and(|m| m.is_empty()))
            .unwrap();
        assert!(empty);
        assert!(!env.store_path(Store::Settings).exists());

        let value = cache
            .read(Store::Settings, |root| navigate::get(root, "Test_Setting").unwrap().cloned())
            .unwrap();
        assert_eq!(value, Some(Node::from("default")));
        assert!(env.store_path(Store::Settings).exists());
        assert!(cache.cached(Store::Test).unwrap().on_disk());
    }

    #[test]
    fn test_poisoned_slot_reloads_from_disk() {
        let env = TestEnv::new();
        env.write_store(Store::Ignore, "value: before\n");
        let cache = cache_for(&env);
        cache.read(Store::Ignore, |_| ()).unwrap();

        let panicked = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ = cache.with_document(Store::Ignore, |_| -> Result<()> {
                panic!("failure while holding the settings lock")
            });
        }));
        assert!(panicked.is_err());

        env.write_store(Store::Ignore, "value: after\n");
        let value = cache
            .read(Store::Ignore, |root| navigate::get(root, "value").unwrap().cloned())
            .unwrap();
        assert_eq!(value, Some(Node::from("after")));

        // The lock is usable again afterwards
        assert!(cache.is_cached(Store::Ignore));
    }

    #[test]
    fn test_write_atomic_creates_parents() {
        let env = TestEnv::new();
        let target = env.path().join("nested/dir/file.yaml");
        write_atomic(&target, "x: 1\n").unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "x: 1\n");

        write_atomic(&target, "x: 2\n").unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "x: 2\n");
    }
}
