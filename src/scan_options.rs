//! Crash-log scan options.
//!
//! The crash scanner reads its switches from the `Settings` store and its
//! record filter from `Main`. Command-line overrides are written back to
//! `Settings` so the next run (GUI or CLI) sees them too.

use crate::document::DirPath;
use crate::settings::SettingsCache;
use crate::store::Store;
use crate::Result;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// `Settings` keys read by the crash scanner.
pub mod keys {
    pub const FCX_MODE: &str = "FCX Mode";
    pub const SHOW_FORMID_VALUES: &str = "Show FormID Values";
    pub const MOVE_UNSOLVED_LOGS: &str = "Move Unsolved Logs";
    pub const SIMPLIFY_LOGS: &str = "Simplify Logs";
    pub const INI_FOLDER_PATH: &str = "INI Folder Path";
    pub const SCAN_CUSTOM_PATH: &str = "SCAN Custom Path";
    pub const MODS_FOLDER_PATH: &str = "MODS Folder Path";

    /// Lines dropped from crash logs before scanning (in `Main`).
    pub const EXCLUDE_LOG_RECORDS: &str = "exclude_log_records";
}

/// Folder under the installation root where CLASSIC keeps collected crash logs.
pub const CRASH_LOGS_DIR: &str = "Crash Logs";

/// Options the crash scanner runs with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanOptions {
    pub fcx_mode: bool,
    pub show_formid_values: bool,
    pub move_unsolved_logs: bool,
    pub simplify_logs: bool,
    pub ini_folder: Option<DirPath>,
    pub scan_custom_path: Option<DirPath>,
    pub mods_folder: Option<DirPath>,
    /// Record prefixes removed while reformatting logs
    pub exclude_log_records: Vec<String>,
}

impl ScanOptions {
    /// Load the options. Unset switches are off; unset folders are `None`.
    pub fn load(settings: &SettingsCache) -> Result<Self> {
        let flag = |key: &str| -> Result<bool> {
            Ok(settings.classic_setting::<bool>(key)?.unwrap_or(false))
        };

        Ok(Self {
            fcx_mode: flag(keys::FCX_MODE)?,
            show_formid_values: flag(keys::SHOW_FORMID_VALUES)?,
            move_unsolved_logs: flag(keys::MOVE_UNSOLVED_LOGS)?,
            simplify_logs: flag(keys::SIMPLIFY_LOGS)?,
            ini_folder: settings.classic_setting(keys::INI_FOLDER_PATH)?,
            scan_custom_path: settings.classic_setting(keys::SCAN_CUSTOM_PATH)?,
            mods_folder: settings.classic_setting(keys::MODS_FOLDER_PATH)?,
            exclude_log_records: settings
                .get_setting(Store::Main, keys::EXCLUDE_LOG_RECORDS)?
                .unwrap_or_default(),
        })
    }
}

/// Scan options given on the command line.
///
/// `None` leaves the stored setting alone.
#[derive(Debug, Clone, Default)]
pub struct ScanOverrides {
    pub fcx_mode: Option<bool>,
    pub show_formid_values: Option<bool>,
    pub move_unsolved_logs: Option<bool>,
    pub simplify_logs: Option<bool>,
    pub ini_folder: Option<PathBuf>,
    pub scan_custom_path: Option<PathBuf>,
    pub mods_folder: Option<PathBuf>,
}

/// What [`ScanOverrides::apply`] changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OverrideReport {
    /// Settings keys that were written
    pub changed: Vec<String>,
    /// Overrides that were ignored or corrected, with the reason
    pub warnings: Vec<String>,
}

impl ScanOverrides {
    /// Write every override that differs from the stored value.
    ///
    /// Folder overrides must name an existing directory and are stored as
    /// absolute paths. A custom scan folder inside CLASSIC's own
    /// `Crash Logs` folder is refused and the stored custom path cleared.
    pub fn apply(&self, settings: &SettingsCache) -> Result<OverrideReport> {
        let mut report = OverrideReport::default();

        let flags = [
            (keys::FCX_MODE, self.fcx_mode),
            (keys::SHOW_FORMID_VALUES, self.show_formid_values),
            (keys::MOVE_UNSOLVED_LOGS, self.move_unsolved_logs),
            (keys::SIMPLIFY_LOGS, self.simplify_logs),
        ];
        for (key, wanted) in flags {
            if let Some(wanted) = wanted {
                if settings.classic_setting::<bool>(key)? != Some(wanted) {
                    settings.set_setting(Store::Settings, key, &wanted)?;
                    report.changed.push(key.to_string());
                }
            }
        }

        let folders = [
            (keys::INI_FOLDER_PATH, &self.ini_folder),
            (keys::MODS_FOLDER_PATH, &self.mods_folder),
        ];
        for (key, wanted) in folders {
            let Some(wanted) = wanted else { continue };
            match existing_dir(wanted) {
                Some(dir) => store_dir(settings, key, &dir, &mut report)?,
                None => report.warnings.push(format!(
                    "{}: {} is not a directory, ignored",
                    key,
                    wanted.display()
                )),
            }
        }

        if let Some(wanted) = &self.scan_custom_path {
            match existing_dir(wanted) {
                Some(dir) if is_inside_crash_logs(settings.root(), &dir) => {
                    report.warnings.push(format!(
                        "{}: the '{}' folder is managed by CLASSIC and cannot be a custom scan folder; custom scan path reset",
                        keys::SCAN_CUSTOM_PATH,
                        CRASH_LOGS_DIR
                    ));
                    if settings
                        .classic_setting::<DirPath>(keys::SCAN_CUSTOM_PATH)?
                        .is_some()
                    {
                        settings.set_setting(Store::Settings, keys::SCAN_CUSTOM_PATH, &String::new())?;
                        report.changed.push(keys::SCAN_CUSTOM_PATH.to_string());
                    }
                }
                Some(dir) => store_dir(settings, keys::SCAN_CUSTOM_PATH, &dir, &mut report)?,
                None => report.warnings.push(format!(
                    "{}: {} is not a directory, ignored",
                    keys::SCAN_CUSTOM_PATH,
                    wanted.display()
                )),
            }
        }

        for warning in &report.warnings {
            tracing::warn!("{}", warning);
        }
        Ok(report)
    }
}

fn store_dir(settings: &SettingsCache, key: &str, dir: &Path, report: &mut OverrideReport) -> Result<()> {
    let current = settings.classic_setting::<DirPath>(key)?;
    if current.as_ref().map(DirPath::as_path) != Some(dir) {
        settings.set_setting(Store::Settings, key, &DirPath::new(dir))?;
        report.changed.push(key.to_string());
    }
    Ok(())
}

/// Canonical form of `path` if it is an existing directory.
fn existing_dir(path: &Path) -> Option<PathBuf> {
    if path.is_dir() {
        fs::canonicalize(path).ok()
    } else {
        None
    }
}

/// Whether `dir` is CLASSIC's crash log folder or one of its subfolders.
fn is_inside_crash_logs(root: &Path, dir: &Path) -> bool {
    match fs::canonicalize(root.join(CRASH_LOGS_DIR)) {
        Ok(crash_logs) => dir.starts_with(crash_logs),
        Err(_) => false,
    }
}
