use std::cmp::Ordering;
use std::fmt;
use std::path::Path;
use regex::Regex;
use serde::{Serialize, Serializer};
use tracing::debug;
use crate::error::{ProvisionError, Result};
use crate::platform::Platform;
use crate::process::{ExecOptions, ProcessRunner};

const BANNER_PATTERN: &str =
    r"Steam Console Client \(c\) Valve Corporation - version (?<version>\d+)";

/// A cache key of the shape `major.minor.patch`.
///
/// Ordering is numeric per component, so `10.0.0` sorts after `9.0.0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ToolVersion(semver::Version);

impl ToolVersion {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        ToolVersion(semver::Version::new(major, minor, patch))
    }

    /// Parses a plain `major.minor.patch` string.
    ///
    /// Pre-release and build suffixes are rejected.
    pub fn parse(version: &str) -> Option<Self> {
        let parsed = semver::Version::parse(version).ok()?;
        if !parsed.pre.is_empty() || !parsed.build.is_empty() {
            return None;
        }
        Some(ToolVersion(parsed))
    }
}

impl Ord for ToolVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl PartialOrd for ToolVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Serialize for ToolVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl fmt::Display for ToolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Extracts `<n>.0.0` from the steamcmd startup banner, if present.
pub fn parse_banner(output: &str) -> Option<String> {
    let re = Regex::new(BANNER_PATTERN).ok()?;
    let captures = re.captures(output)?;
    Some(format!("{}.0.0", &captures["version"]))
}

/// Runs `tool +quit` and derives its version from the banner it prints.
///
/// The exit code is ignored on Windows only.
///
/// # Errors
/// Returns [`ProvisionError::VersionProbeFailed`] when the tool cannot be run,
/// exits non-zero where that is fatal, or prints no recognizable banner.
pub fn probe_version(
    runner: &dyn ProcessRunner,
    tool: &Path,
    platform: Platform,
    silent: bool,
) -> Result<ToolVersion> {
    let options = ExecOptions {
        ignore_return_code: platform.ignores_return_code(),
        silent,
    };
    let output = runner
        .exec(tool, &["+quit"], options)
        .map_err(|e| ProvisionError::VersionProbeFailed {
            tool: tool.to_path_buf(),
            reason: e.to_string(),
        })?;
    let raw = parse_banner(&output.stdout).ok_or_else(|| ProvisionError::VersionProbeFailed {
        tool: tool.to_path_buf(),
        reason: "no version banner in output".to_string(),
    })?;
    let version = ToolVersion::parse(&raw).ok_or_else(|| ProvisionError::VersionProbeFailed {
        tool: tool.to_path_buf(),
        reason: format!("malformed version '{raw}'"),
    })?;
    debug!("Found version: {}", version);
    Ok(version)
}
