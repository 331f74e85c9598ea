//! Semi-structured settings documents.
//!
//! Every store is a YAML document whose root is a mapping. This module
//! provides the two operations the cache needs on such trees:
//!
//! - [`navigate`] - read and write values addressed by a dotted path
//!   (`CLASSIC_Info.default_settings`)
//! - [`coerce`] - convert loosely typed nodes to and from concrete Rust types

pub mod coerce;
pub mod navigate;

pub use coerce::{CoercionError, DirPath, FilePath, SettingValue, Structured};

/// A node in a settings document.
pub type Node = serde_yaml::Value;

/// A mapping node's contents.
pub type Mapping = serde_yaml::Mapping;
