//! `codesync.json` discovery and persistence.
//!
//! # API pattern
//!
//! Every function takes an explicit path (`fn_at(path, …)`); the CLI
//! derives that path from `--config` or the current directory. Tests pass
//! `TempDir` paths.
//!
//! Saves are atomic: serialize → `codesync.json.tmp` sibling → `rename`.

use std::path::{Path, PathBuf};

use crate::error::{io_err, ConfigError};
use crate::types::{Lang, Scheme, SyncConfig};

/// File name searched for by [`find_config_at`].
pub const CONFIG_FILE_NAME: &str = "codesync.json";

// ---------------------------------------------------------------------------
// 1. Discovery
// ---------------------------------------------------------------------------

/// Walk from `start` towards the filesystem root and return the first
/// `codesync.json` found.
pub fn find_config_at(start: &Path) -> Result<PathBuf, ConfigError> {
    let mut dir = Some(start);
    while let Some(current) = dir {
        let candidate = current.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            return Ok(candidate);
        }
        dir = current.parent();
    }
    Err(ConfigError::NotFound {
        start: start.to_path_buf(),
    })
}

/// Directory that every relative path in the config is anchored to.
///
/// `<dir of codesync.json>/<srcDir>`
pub fn src_root(config_path: &Path, config: &SyncConfig) -> PathBuf {
    base_dir(config_path).join(&config.src_dir)
}

/// Directory containing the config file.
pub fn base_dir(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

// ---------------------------------------------------------------------------
// 2. Load / save
// ---------------------------------------------------------------------------

/// Load and parse the config at `path`.
///
/// Returns `ConfigError::NotFound` if absent and `ConfigError::Parse`
/// (with the file path) if malformed.
pub fn load_at(path: &Path) -> Result<SyncConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            start: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    serde_json::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Pretty JSON with a trailing newline, as written to disk.
pub fn to_json_string(config: &SyncConfig) -> Result<String, ConfigError> {
    let mut json = serde_json::to_string_pretty(config)?;
    json.push('\n');
    Ok(json)
}

/// Atomically save `config` to `path`.
pub fn save_at(path: &Path, config: &SyncConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    let json = to_json_string(config)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json).map_err(|e| io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// 3. Init
// ---------------------------------------------------------------------------

/// Settings chosen at `codesync init` time.
#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    pub src_dir: Option<String>,
    pub lang: Option<Lang>,
    pub scheme: Option<Scheme>,
}

/// Create `<dir>/codesync.json` with defaults.
///
/// Idempotent: if the file already exists, loads and returns it unchanged.
pub fn init_at(dir: &Path, opts: InitOptions) -> Result<(PathBuf, SyncConfig), ConfigError> {
    let path = dir.join(CONFIG_FILE_NAME);
    if path.exists() {
        let config = load_at(&path)?;
        return Ok((path, config));
    }

    let mut config = SyncConfig::default();
    if let Some(src_dir) = opts.src_dir {
        config.src_dir = src_dir;
    }
    config.code.lang = opts.lang.unwrap_or_default();
    config.code.scheme = opts.scheme.unwrap_or_default();

    save_at(&path, &config)?;
    Ok((path, config))
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
