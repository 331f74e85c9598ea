//! CLI argument definitions for the `classic` tool.

use crate::store::Store;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// classic - inspect and edit CLASSIC's settings stores.
///
/// Stores: main, settings, ignore, game, game-local, test.
/// Main and Game are read-only.
#[derive(Parser, Debug)]
#[command(name = "classic")]
#[command(author, version, about = "Read and write CLASSIC crash log analyzer settings", long_about = None)]
pub struct Cli {
    /// Output in human-readable format instead of JSON
    #[arg(short = 'H', long = "human", global = true)]
    pub human_readable: bool,

    /// CLASSIC installation folder that store paths are relative to.
    /// Defaults to the current directory.
    #[arg(short = 'C', long = "root", global = true, env = "CLASSIC_ROOT")]
    pub root: Option<PathBuf>,

    /// Game whose per-game stores are used (e.g. Fallout4, Skyrim)
    #[arg(long, global = true, env = "CLASSIC_GAME", default_value = crate::game::DEFAULT_GAME)]
    pub game: String,

    /// Use the VR edition of the game
    #[arg(long, global = true, env = "CLASSIC_VR")]
    pub vr: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the backing file of a store
    Path {
        /// Store name
        store: Store,
    },

    /// Read a setting
    Get {
        /// Store name
        store: Store,
        /// Dotted key path (e.g. "CLASSIC_Info.version")
        key: String,
        /// Type to read the value as
        #[arg(long = "as", value_enum, default_value_t = ValueType::Raw)]
        value_type: ValueType,
        /// Store and return this value if the key is absent
        #[arg(long)]
        default: Option<String>,
    },

    /// Write a setting (overwrites any existing value)
    Set {
        /// Store name
        store: Store,
        /// Dotted key path
        key: String,
        /// New value. Lists are comma-separated; raw values are YAML.
        value: String,
        /// Type to store the value as
        #[arg(long = "as", value_enum, default_value_t = ValueType::String)]
        value_type: ValueType,
    },

    /// Show the options the crash scanner will run with
    Options,

    /// Save crash scanner command-line options into the settings file
    SyncScanArgs {
        /// Enable FCX mode
        #[arg(long, num_args = 0..=1, default_missing_value = "true")]
        fcx_mode: Option<bool>,

        /// Show FormID values
        #[arg(long, num_args = 0..=1, default_missing_value = "true")]
        show_fid_values: Option<bool>,

        /// Move unsolved logs
        #[arg(long, num_args = 0..=1, default_missing_value = "true")]
        move_unsolved: Option<bool>,

        /// Simplify the logs (may remove important information)
        #[arg(long, num_args = 0..=1, default_missing_value = "true")]
        simplify_logs: Option<bool>,

        /// Folder holding the game's INI files
        #[arg(long)]
        ini_path: Option<PathBuf>,

        /// Extra folder to scan for crash logs
        #[arg(long)]
        scan_path: Option<PathBuf>,

        /// Mod manager's mods folder
        #[arg(long)]
        mods_folder_path: Option<PathBuf>,
    },
}

/// Value shapes accepted by `get --as` and `set --as`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ValueType {
    String,
    Int,
    Bool,
    List,
    File,
    Dir,
    Raw,
}
