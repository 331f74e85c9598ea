//! Backing file locations for each store.
//!
//! Paths are relative to the CLASSIC installation root. Resolution is a pure
//! table lookup; nothing here touches the filesystem.

use crate::game::GameIdentity;
use crate::store::Store;
use std::path::PathBuf;

/// Directory holding CLASSIC's bundled data.
pub const DATA_DIR: &str = "CLASSIC Data";

/// Directory holding the bundled databases.
pub const DATABASES_DIR: &str = "CLASSIC Data/databases";

/// Maps stores to their backing files.
#[derive(Debug, Clone, Copy, Default)]
pub struct StorePaths;

impl StorePaths {
    /// Resolve a store's backing file, relative to the installation root.
    ///
    /// `Test` shares the `Settings` file name; tests point the cache at a
    /// scratch root so the two never collide with a real installation.
    pub fn resolve(store: Store, identity: &GameIdentity) -> PathBuf {
        match store {
            Store::Main => PathBuf::from(format!("{}/CLASSIC Main.yaml", DATABASES_DIR)),
            Store::Settings | Store::Test => PathBuf::from("CLASSIC Settings.yaml"),
            Store::Ignore => PathBuf::from("CLASSIC Ignore.yaml"),
            Store::Game => PathBuf::from(format!(
                "{}/CLASSIC {}.yaml",
                DATABASES_DIR,
                identity.identifier()
            )),
            Store::GameLocal => PathBuf::from(format!(
                "{}/CLASSIC {} Local.yaml",
                DATA_DIR,
                identity.identifier()
            )),
        }
    }
}
