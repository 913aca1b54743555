use std::env;
use std::path::{Path, PathBuf};

/// Env var naming an explicit config file.
pub const CONFIG_ENV: &str = "TESS_CONFIG";

/// Env var overriding the base directory.
pub const HOME_ENV: &str = "TESS_HOME";

/// Default base directory: `$TESS_HOME`, else `~/.tesseract`.
pub fn default_base_dir() -> PathBuf {
    env::var(HOME_ENV)
        .ok()
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| dirs_home().join(".tesseract"))
}

fn dirs_home() -> PathBuf {
    env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// Resolve which config file to read.
///
/// Priority chain:
/// 1. Explicit `--config` path
/// 2. `TESS_CONFIG`
/// 3. `<base dir>/config.toml`
pub fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    select_config_path(env::var(CONFIG_ENV).ok().as_deref(), &default_base_dir())
}

/// Pure half of [`resolve_config_path`] (no env access, unit-testable).
fn select_config_path(from_env: Option<&str>, base_dir: &Path) -> PathBuf {
    match from_env {
        Some(p) if !p.trim().is_empty() => PathBuf::from(p.trim()),
        _ => base_dir.join("config.toml"),
    }
}
