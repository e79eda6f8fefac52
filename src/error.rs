use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Terminal failures of a provisioning run.
///
/// Every variant aborts the run; nothing in the provisioning path retries.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// The running OS has no steamcmd distribution.
    #[error("Unsupported platform: {os}")]
    UnsupportedPlatform { os: String },

    #[error("Failed to download {url}")]
    DownloadFailed {
        url: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to extract {}", archive.display())]
    ExtractionFailed {
        archive: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The probed binary did not print a recognizable version banner.
    #[error("Failed to get version of {}: {reason}", tool.display())]
    VersionProbeFailed { tool: PathBuf, reason: String },

    #[error("Failed to cache version {version}")]
    CacheInsertFailed {
        version: String,
        #[source]
        source: io::Error,
    },

    #[error("Filesystem error at {}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ProvisionError {
    pub(crate) fn filesystem(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ProvisionError::Filesystem {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = ProvisionError> = std::result::Result<T, E>;
