//! Common test utilities for classic integration tests.
//!
//! Provides `TestEnv`, a throwaway CLASSIC installation folder, so tests never
//! touch a real installation or each other's files.

#![allow(dead_code)]

use assert_cmd::Command;
use classic_settings::store::paths::StorePaths;
use classic_settings::{GameIdentity, SettingsCache, SharedGameIdentity, Store};
use std::fs;
use std::path::{Path, PathBuf};
pub use tempfile::TempDir;

/// `Main` document with a settings template, as shipped with CLASSIC.
pub const MAIN_YAML: &str = r#"CLASSIC_Info:
  version: CLASSIC v7.35.0
  default_settings: |
    CLASSIC_Settings:
      Test_Setting: "default value"
      Another_Setting: 123
      FCX Mode: false
      Show FormID Values: false
exclude_log_records:
  - "(Main*)"
  - "(size_t)"
"#;

/// A test installation folder.
pub struct TestEnv {
    pub root: TempDir,
    pub game: SharedGameIdentity,
}

impl TestEnv {
    /// Create an empty installation with the default game.
    pub fn new() -> Self {
        Self {
            root: TempDir::new().unwrap(),
            game: SharedGameIdentity::new(GameIdentity::default()),
        }
    }

    /// Create an installation with the standard `Main` document.
    pub fn with_main() -> Self {
        let env = Self::new();
        env.write_store(Store::Main, MAIN_YAML);
        env
    }

    /// Get the installation root.
    pub fn path(&self) -> &Path {
        self.root.path()
    }

    /// Absolute path of a store's file for the current game.
    pub fn store_path(&self, store: Store) -> PathBuf {
        self.path().join(StorePaths::resolve(store, &self.game.snapshot()))
    }

    /// Write a store's file.
    pub fn write_store(&self, store: Store, contents: &str) {
        let path = self.store_path(store);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(path, contents).expect("Failed to write store file");
    }

    /// Read a store's file.
    pub fn read_store(&self, store: Store) -> String {
        fs::read_to_string(self.store_path(store)).expect("Failed to read store file")
    }

    /// A fresh settings cache over this installation.
    pub fn cache(&self) -> SettingsCache {
        SettingsCache::new(self.path(), self.game.clone())
    }

    /// Get a Command for the classic binary rooted at this installation.
    ///
    /// Sets `CLASSIC_ROOT` per-command for parallel safety.
    pub fn classic(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_classic"));
        cmd.current_dir(self.path());
        cmd.env("CLASSIC_ROOT", self.path());
        cmd.env_remove("CLASSIC_GAME");
        cmd.env_remove("CLASSIC_VR");
        cmd
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}
