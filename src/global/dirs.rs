use std::path::PathBuf;
use anyhow::{anyhow, Result};
use directories::ProjectDirs;

/// Environment variable naming the runner's scratch root.
pub const RUNNER_TEMP: &str = "RUNNER_TEMP";
/// Environment variable naming the runner's persistent tool cache.
pub const RUNNER_TOOL_CACHE: &str = "RUNNER_TOOL_CACHE";

/// Scratch directory created below the temp root for each run.
pub const SCRATCH_DIR_NAME: &str = ".steamworks";

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("com", "setup-steamcmd", "setup-steamcmd")
        .ok_or_else(|| anyhow!("Could not get project directories"))
}

/// Per-user tool cache used when no runner tool cache is configured.
pub fn get_user_tool_cache_dir() -> Result<PathBuf> {
    Ok(project_dirs()?.cache_dir().join("tools"))
}

/// Resolves the temp root: `RUNNER_TEMP` if set, else the system temp dir.
pub fn default_temp_dir() -> PathBuf {
    std::env::var_os(RUNNER_TEMP)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(std::env::temp_dir)
}

/// Resolves the tool-cache root: `RUNNER_TOOL_CACHE` if set, else the per-user cache.
pub fn default_tool_cache_dir() -> Result<PathBuf> {
    match std::env::var_os(RUNNER_TOOL_CACHE).filter(|v| !v.is_empty()) {
        Some(dir) => Ok(PathBuf::from(dir)),
        None => get_user_tool_cache_dir(),
    }
}
