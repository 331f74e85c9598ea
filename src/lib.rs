//! CLASSIC settings - the configuration layer of the CLASSIC crash log analyzer.
//!
//! This library provides the multi-store settings cache that every other
//! CLASSIC component reads its configuration through, and the core of the
//! `classic` CLI tool:
//!
//! - [`store`] - the closed set of settings stores and their backing paths
//! - [`game`] - current game identity, used to pick per-game stores
//! - [`document`] - dotted-path navigation and typed coercion of YAML nodes
//! - [`cache`] - lazy loading, persistence and template bootstrap per store
//! - [`settings`] - the typed get/set facade handed to collaborators
//! - [`scan_options`] - crash-scan options read through the facade

pub mod cache;
pub mod cli;
pub mod commands;
pub mod document;
pub mod game;
pub mod scan_options;
pub mod settings;
pub mod store;

pub use document::{CoercionError, DirPath, FilePath, Node, SettingValue, Structured};
pub use game::{GameIdentity, GameIdentitySource, SharedGameIdentity};
pub use settings::SettingsCache;
pub use store::Store;

use std::path::PathBuf;


/// Library-level error type for settings operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Required data file for store {store} is missing: {}", path.display())]
    MissingImmutableStore { store: Store, path: PathBuf },

    #[error("Store {store} is read-only and cannot be modified")]
    ReadOnlyStore { store: Store },

    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("{}: document root is not a mapping", path.display())]
    RootNotMapping { path: PathBuf },

    #[error("Default settings template not found at {key}")]
    MissingTemplate { key: String },

    #[error("{store} setting '{path}': {source}")]
    Coercion {
        store: Store,
        path: String,
        #[source]
        source: CoercionError,
    },

    #[error("Cannot write '{path}': segment '{segment}' holds a non-mapping value")]
    PathConflict { path: String, segment: String },

    #[error("Invalid setting path: {0:?}")]
    InvalidPath(String),

    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML serialization error: {0}")]
    Serialize(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Whether this error means the installation itself is broken.
    ///
    /// Fatal errors are never retried; they are reported to the user as-is.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::MissingImmutableStore { .. }
                | Error::Parse { .. }
                | Error::RootNotMapping { .. }
                | Error::MissingTemplate { .. }
        )
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for settings operations.
pub type Result<T> = std::result::Result<T, Error>;
