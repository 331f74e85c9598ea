//! Command implementations for the `classic` CLI.
//!
//! Each command takes the shared [`SettingsCache`] and returns a result type
//! implementing [`CommandResult`], so `main` can print it as JSON or text.

use crate::cli::ValueType;
use crate::document::{DirPath, FilePath, Node, SettingValue};
use crate::scan_options::{OverrideReport, ScanOptions, ScanOverrides};
use crate::settings::SettingsCache;
use crate::store::Store;
use crate::{Error, Result};
use serde::Serialize;

/// Command results that can be serialized to JSON or formatted for humans.
pub trait CommandResult {
    /// Serialize to JSON string.
    fn to_json(&self) -> String;

    /// Format for human-readable output.
    fn to_human(&self) -> String;
}

fn json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| format!(r#"{{"error": "{}"}}"#, e))
}

/// Result of `classic path`.
#[derive(Debug, Serialize)]
pub struct StorePathResult {
    pub store: Store,
    pub path: String,
    pub absolute: String,
    pub exists: bool,
    pub mutable: bool,
}

impl CommandResult for StorePathResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let mut lines = vec![format!("{}: {}", self.store, self.path)];
        lines.push(format!("  location: {}", self.absolute));
        if !self.exists {
            lines.push("  (file does not exist yet)".to_string());
        }
        if !self.mutable {
            lines.push("  (read-only)".to_string());
        }
        lines.join("\n")
    }
}

/// Resolve a store's backing file.
pub fn store_path(settings: &SettingsCache, store: Store) -> StorePathResult {
    let absolute = settings.file_for(store);
    StorePathResult {
        store,
        path: settings.path_for(store).to_string_lossy().into_owned(),
        exists: absolute.exists(),
        absolute: absolute.to_string_lossy().into_owned(),
        mutable: store.is_mutable(),
    }
}

/// Result of `classic get`.
#[derive(Debug, Serialize)]
pub struct GetResult {
    pub store: Store,
    pub key: String,
    pub found: bool,
    pub value: Option<serde_json::Value>,
}

impl CommandResult for GetResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        match &self.value {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join("\n"),
            Some(value) => match serde_yaml::to_string(value) {
                Ok(text) => text.trim_end().to_string(),
                Err(_) => value.to_string(),
            },
            None => format!("{}: {} is not set", self.store, self.key),
        }
    }
}

/// Read a setting as the requested type, optionally storing a default.
pub fn get_setting(
    settings: &SettingsCache,
    store: Store,
    key: &str,
    value_type: ValueType,
    default: Option<&str>,
) -> Result<GetResult> {
    let node = match value_type {
        ValueType::String => read_as::<String>(settings, store, key, value_type, default)?,
        ValueType::Int => read_as::<i64>(settings, store, key, value_type, default)?,
        ValueType::Bool => read_as::<bool>(settings, store, key, value_type, default)?,
        ValueType::List => read_as::<Vec<String>>(settings, store, key, value_type, default)?,
        ValueType::File => read_as::<FilePath>(settings, store, key, value_type, default)?,
        ValueType::Dir => read_as::<DirPath>(settings, store, key, value_type, default)?,
        ValueType::Raw => read_as::<Node>(settings, store, key, value_type, default)?,
    };

    let value = node.map(|n| serde_json::to_value(&n)).transpose()?;
    Ok(GetResult {
        store,
        key: key.to_string(),
        found: value.is_some(),
        value,
    })
}

fn read_as<T: SettingValue>(
    settings: &SettingsCache,
    store: Store,
    key: &str,
    value_type: ValueType,
    default: Option<&str>,
) -> Result<Option<Node>> {
    let value = match default {
        Some(text) => {
            if !store.is_mutable() {
                return Err(Error::ReadOnlyStore { store });
            }
            let fallback: T = parse_value(text, value_type)?;
            Some(settings.get_setting_or(store, key, fallback)?)
        }
        None => settings.get_setting::<T>(store, key)?,
    };
    value
        .map(|v| v.encode())
        .transpose()
        .map_err(|source| Error::Coercion {
            store,
            path: key.to_string(),
            source,
        })
}

/// Parse command-line text into a typed value.
///
/// Lists are comma-separated, raw values are YAML, everything else goes
/// through the same coercion as values read from a file.
pub fn parse_value<T: SettingValue>(text: &str, value_type: ValueType) -> Result<T> {
    let node = match value_type {
        ValueType::List => Node::Sequence(
            text.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(|item| Node::String(item.to_string()))
                .collect(),
        ),
        ValueType::Raw => serde_yaml::from_str(text)
            .map_err(|e| Error::InvalidInput(format!("not valid YAML: {}", e)))?,
        _ => Node::String(text.to_string()),
    };

    match T::decode(&node) {
        Ok(Some(value)) => Ok(value),
        Ok(None) => Err(Error::InvalidInput(format!(
            "empty value is not a valid {}",
            T::EXPECTED
        ))),
        Err(e) => Err(Error::InvalidInput(format!("{:?}: {}", text, e))),
    }
}

/// Result of `classic set`.
#[derive(Debug, Serialize)]
pub struct SetResult {
    pub store: Store,
    pub key: String,
    pub value: serde_json::Value,
}

impl CommandResult for SetResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        format!("Set {}: {} = {}", self.store, self.key, self.value)
    }
}

/// Write a setting.
pub fn set_setting(
    settings: &SettingsCache,
    store: Store,
    key: &str,
    text: &str,
    value_type: ValueType,
) -> Result<SetResult> {
    let node = match value_type {
        ValueType::String => write_as::<String>(settings, store, key, text, value_type)?,
        ValueType::Int => write_as::<i64>(settings, store, key, text, value_type)?,
        ValueType::Bool => write_as::<bool>(settings, store, key, text, value_type)?,
        ValueType::List => write_as::<Vec<String>>(settings, store, key, text, value_type)?,
        ValueType::File => write_as::<FilePath>(settings, store, key, text, value_type)?,
        ValueType::Dir => write_as::<DirPath>(settings, store, key, text, value_type)?,
        ValueType::Raw => write_as::<Node>(settings, store, key, text, value_type)?,
    };

    Ok(SetResult {
        store,
        key: key.to_string(),
        value: serde_json::to_value(&node)?,
    })
}

fn write_as<T: SettingValue>(
    settings: &SettingsCache,
    store: Store,
    key: &str,
    text: &str,
    value_type: ValueType,
) -> Result<Node> {
    // Check before parsing so a bad value never masks the read-only error.
    if !store.is_mutable() {
        return Err(Error::ReadOnlyStore { store });
    }
    let value: T = parse_value(text, value_type)?;
    settings.set_setting(store, key, &value)?;
    value.encode().map_err(|source| Error::Coercion {
        store,
        path: key.to_string(),
        source,
    })
}

impl CommandResult for ScanOptions {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        fn folder(dir: &Option<DirPath>) -> String {
            dir.as_ref()
                .map(|d| d.to_string())
                .unwrap_or_else(|| "(not set)".to_string())
        }

        [
            format!("FCX Mode: {}", self.fcx_mode),
            format!("Show FormID Values: {}", self.show_formid_values),
            format!("Move Unsolved Logs: {}", self.move_unsolved_logs),
            format!("Simplify Logs: {}", self.simplify_logs),
            format!("INI Folder Path: {}", folder(&self.ini_folder)),
            format!("SCAN Custom Path: {}", folder(&self.scan_custom_path)),
            format!("MODS Folder Path: {}", folder(&self.mods_folder)),
            format!("Excluded log records: {}", self.exclude_log_records.len()),
        ]
        .join("\n")
    }
}

/// Load the crash scanner's options.
pub fn scan_options(settings: &SettingsCache) -> Result<ScanOptions> {
    ScanOptions::load(settings)
}

impl CommandResult for OverrideReport {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let mut lines = Vec::new();
        if self.changed.is_empty() {
            lines.push("Settings already up to date".to_string());
        } else {
            lines.push(format!("Updated {} setting(s):", self.changed.len()));
            lines.extend(self.changed.iter().map(|key| format!("  {}", key)));
        }
        lines.extend(self.warnings.iter().map(|w| format!("Warning: {}", w)));
        lines.join("\n")
    }
}

/// Save command-line scan options into `Settings`.
pub fn sync_scan_args(settings: &SettingsCache, overrides: &ScanOverrides) -> Result<OverrideReport> {
    overrides.apply(settings)
}
