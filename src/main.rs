//! classic CLI - inspect and edit CLASSIC crash log analyzer settings.

use classic_settings::cli::{Cli, Commands};
use classic_settings::commands::{self, CommandResult};
use classic_settings::scan_options::ScanOverrides;
use classic_settings::{GameIdentity, SettingsCache};
use clap::Parser;
use std::env;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

/// Environment variable controlling log verbosity (tracing filter syntax).
const LOG_ENV: &str = "CLASSIC_LOG";

fn main() {
    let cli = Cli::parse();
    let human = cli.human_readable;

    init_logging();

    let root = resolve_root(cli.root, human);
    let settings = SettingsCache::new(root, GameIdentity::new(cli.game, cli.vr));

    if let Err(e) = run_command(cli.command, &settings, human) {
        if e.is_fatal() {
            tracing::error!(error = %e, "settings installation is damaged");
        }
        if human {
            eprintln!("Error: {}", e);
        } else {
            eprintln!("{}", serde_json::json!({ "error": e.to_string() }));
        }
        process::exit(1);
    }
}

/// Send library logs to stderr, filtered by `CLASSIC_LOG` (default: warnings).
fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Resolve the installation root: --root flag > CLASSIC_ROOT env > current directory.
fn resolve_root(explicit: Option<PathBuf>, human: bool) -> PathBuf {
    match explicit {
        Some(path) => {
            if !path.is_dir() {
                let message = format!("Specified root folder does not exist: {}", path.display());
                if human {
                    eprintln!("Error: {}", message);
                } else {
                    eprintln!("{}", serde_json::json!({ "error": message }));
                }
                process::exit(1);
            }
            path
        }
        None => env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

fn run_command(
    command: Commands,
    settings: &SettingsCache,
    human: bool,
) -> Result<(), classic_settings::Error> {
    match command {
        Commands::Path { store } => {
            output(&commands::store_path(settings, store), human);
        }
        Commands::Get {
            store,
            key,
            value_type,
            default,
        } => {
            let result = commands::get_setting(settings, store, &key, value_type, default.as_deref())?;
            output(&result, human);
        }
        Commands::Set {
            store,
            key,
            value,
            value_type,
        } => {
            let result = commands::set_setting(settings, store, &key, &value, value_type)?;
            output(&result, human);
        }
        Commands::Options => {
            output(&commands::scan_options(settings)?, human);
        }
        Commands::SyncScanArgs {
            fcx_mode,
            show_fid_values,
            move_unsolved,
            simplify_logs,
            ini_path,
            scan_path,
            mods_folder_path,
        } => {
            let overrides = ScanOverrides {
                fcx_mode,
                show_formid_values: show_fid_values,
                move_unsolved_logs: move_unsolved,
                simplify_logs,
                ini_folder: ini_path,
                scan_custom_path: scan_path,
                mods_folder: mods_folder_path,
            };
            output(&commands::sync_scan_args(settings, &overrides)?, human);
        }
    }
    Ok(())
}

fn output<T: CommandResult>(result: &T, human: bool) {
    if human {
        println!("{}", result.to_human());
    } else {
        println!("{}", result.to_json());
    }
}
