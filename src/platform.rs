use std::fmt;
use std::path::PathBuf;
use crate::error::{ProvisionError, Result};

/// Name the tool is cached and invoked under.
pub const STEAMCMD: &str = "steamcmd";

const DOWNLOAD_BASE_URL: &str = "https://steamcdn-a.akamaihd.net/client/installer";

/// The operating system family the run executes on.
///
/// Computed once with [`Platform::current`] and passed to everything that
/// branches on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Linux,
    MacOs,
    Windows,
    Other,
}

/// Archive kinds steamcmd is distributed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Zip,
    TarGz,
}

/// Where to fetch the archive from and what to call it locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadCoordinates {
    pub url: String,
    pub archive_name: String,
    pub kind: ArchiveKind,
}

/// Post-extraction work required before the tool can be invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normalization {
    None,
    /// Mark the extracted tree executable.
    Executable,
    /// Mark the tree executable and add an unsuffixed indirection script.
    ExecutableWithShim,
}

impl Platform {
    pub fn current() -> Platform {
        Platform::from_os(std::env::consts::OS)
    }

    pub fn from_os(os: &str) -> Platform {
        match os {
            "linux" => Platform::Linux,
            "macos" => Platform::MacOs,
            "windows" => Platform::Windows,
            _ => Platform::Other,
        }
    }

    /// Returns the download URL and archive file name for this platform.
    ///
    /// # Errors
    /// Returns [`ProvisionError::UnsupportedPlatform`] for [`Platform::Other`].
    pub fn download_coordinates(self) -> Result<DownloadCoordinates> {
        let (archive_name, kind) = match self {
            Platform::Linux => ("steamcmd_linux.tar.gz", ArchiveKind::TarGz),
            Platform::MacOs => ("steamcmd_osx.tar.gz", ArchiveKind::TarGz),
            Platform::Windows => ("steamcmd.zip", ArchiveKind::Zip),
            Platform::Other => {
                return Err(ProvisionError::UnsupportedPlatform {
                    os: std::env::consts::OS.to_string(),
                });
            }
        };
        Ok(DownloadCoordinates {
            url: format!("{DOWNLOAD_BASE_URL}/{archive_name}"),
            archive_name: archive_name.to_string(),
            kind,
        })
    }

    /// Fixed steam data-home for hosted runners, if this platform has one.
    pub fn default_data_home(self) -> Option<PathBuf> {
        match self {
            Platform::Linux => Some(PathBuf::from("/home/runner/Steam")),
            Platform::MacOs => Some(PathBuf::from(
                "/Users/runner/Library/Application Support/Steam",
            )),
            Platform::Windows | Platform::Other => None,
        }
    }

    pub fn normalization(self) -> Normalization {
        match self {
            Platform::Linux => Normalization::ExecutableWithShim,
            Platform::MacOs => Normalization::Executable,
            Platform::Windows | Platform::Other => Normalization::None,
        }
    }

    pub fn requires_executable_normalization(self) -> bool {
        self.normalization() != Normalization::None
    }

    /// Suffix of the entry point shipped inside the archive.
    pub fn tool_extension(self) -> &'static str {
        match self {
            Platform::Windows => "exe",
            _ => "sh",
        }
    }

    /// File name of the archived entry point, e.g. `steamcmd.sh`.
    pub fn tool_file_name(self) -> String {
        format!("{STEAMCMD}.{}", self.tool_extension())
    }

    /// File name used to invoke the tool once it is on the PATH.
    pub fn invocable_file_name(self) -> String {
        match self.normalization() {
            Normalization::ExecutableWithShim => STEAMCMD.to_string(),
            _ => self.tool_file_name(),
        }
    }

    /// Whether a non-zero exit of steamcmd is expected and harmless.
    ///
    /// The Windows build exits non-zero after self-updating.
    pub fn ignores_return_code(self) -> bool {
        self == Platform::Windows
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Platform::Linux => "linux",
            Platform::MacOs => "macos",
            Platform::Windows => "windows",
            Platform::Other => std::env::consts::OS,
        };
        f.write_str(name)
    }
}

/// Architecture label used as the innermost tool-cache directory.
pub fn cache_arch() -> String {
    match std::env::consts::ARCH {
        "x86_64" => "x64".to_string(),
        "aarch64" => "arm64".to_string(),
        "x86" => "x86".to_string(),
        "arm" => "arm".to_string(),
        other => other.to_string(),
    }
}
