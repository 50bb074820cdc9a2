use chrono::Local;
use log::LevelFilter;
use std::path::{Path, PathBuf};
use std::sync::Once;

const LEVEL_VAR: &str = "FINIDENT_LOG_LEVEL";
const DIR_VAR: &str = "FINIDENT_LOG_DIR";
const DEFAULT_LOG_DIR: &str = "logs";

static INIT: Once = Once::new();

/// Where and how loudly `finident` logs.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LogSettings {
    level: LevelFilter,
    dir: Option<PathBuf>,
}

impl LogSettings {
    fn from_env() -> Self {
        let level_var = std::env::var(LEVEL_VAR).ok();
        let rust_log = std::env::var("RUST_LOG").ok();
        let dir_var = std::env::var(DIR_VAR).ok();
        LogSettings {
            level: resolve_level(level_var.as_deref(), rust_log.as_deref()),
            dir: resolve_log_dir(dir_var.as_deref()),
        }
    }
}

/// Installs the process-wide `fern` logger once; later calls are no-ops.
///
/// `FINIDENT_LOG_LEVEL` (or `RUST_LOG`) picks the level, `FINIDENT_LOG_DIR`
/// the directory for a dated log file (`off` disables it).
pub fn init_logging(app_name: &str) -> Result<(), String> {
    let mut outcome = Ok(());
    INIT.call_once(|| outcome = install(app_name, &LogSettings::from_env()));
    outcome
}

fn install(app_name: &str, settings: &LogSettings) -> Result<(), String> {
    let mut dispatch = fern::Dispatch::new()
        .level(settings.level)
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} | {:<5} | {} | {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.target(),
                message
            ))
        })
        .chain(std::io::stdout());

    if let Some(dir) = &settings.dir {
        std::fs::create_dir_all(dir).map_err(|err| err.to_string())?;
        let date = Local::now().format("%Y_%m_%d").to_string();
        let file = fern::log_file(log_file_path(dir, app_name, &date))
            .map_err(|err| err.to_string())?;
        dispatch = dispatch.chain(file);
    }

    dispatch.apply().map_err(|err| err.to_string())
}

/// `FINIDENT_LOG_LEVEL` wins over `RUST_LOG`; unset or unparsable means info.
fn resolve_level(own: Option<&str>, rust_log: Option<&str>) -> LevelFilter {
    own.or(rust_log).map_or(LevelFilter::Info, parse_level)
}

fn parse_level(value: &str) -> LevelFilter {
    value.trim().parse().unwrap_or(LevelFilter::Info)
}

fn resolve_log_dir(value: Option<&str>) -> Option<PathBuf> {
    match value.map(str::trim) {
        Some("off") | Some("none") | Some("") => None,
        Some(path) => Some(PathBuf::from(path)),
        None => Some(PathBuf::from(DEFAULT_LOG_DIR)),
    }
}

fn log_file_path(dir: &Path, app_name: &str, date: &str) -> PathBuf {
    dir.join(format!("{app_name}-{date}.log"))
}
