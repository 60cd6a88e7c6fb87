use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

/// Filesystem layout for the server. The server follows the usual unix
/// split: system-wide paths when running as root (the packaged deployment),
/// per-user dotfile paths otherwise (development). Both can be overridden by
/// the `NEWSHUB_CONFIG`/`NEWSHUB_DATA` env vars or command line flags, which
/// are resolved before these defaults are consulted.
const SYSTEM_CONFIG_DIR: &str = "/etc/newshub";
const SYSTEM_DATA_DIR: &str = "/var/lib/newshub";

/// Creates a directory together with any missing parents. Does nothing when
/// the directory is already there.
pub fn ensure_dir_exists(path: &Path) -> Result<()> {
    if path.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(path).with_context(|| format!("create directory {}", path.display()))?;
    Ok(())
}

/// Default configuration directory.
pub fn config_dir() -> Result<PathBuf> {
    if is_root() {
        return Ok(PathBuf::from(SYSTEM_CONFIG_DIR));
    }
    Ok(home_dir()?.join(".config").join("newshub"))
}

/// Default data directory, holds the sqlite database and log files.
pub fn data_dir() -> Result<PathBuf> {
    if is_root() {
        return Ok(PathBuf::from(SYSTEM_DATA_DIR));
    }
    Ok(home_dir()?.join(".local").join("share").join("newshub"))
}

fn home_dir() -> Result<PathBuf> {
    match env::var_os("HOME") {
        Some(home) if !home.is_empty() => Ok(PathBuf::from(home)),
        _ => bail!("$HOME is not set, pass --config-dir and --data-dir explicitly"),
    }
}

fn is_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}
