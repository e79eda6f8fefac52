use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use crate::platform::cache_arch;
use crate::util::copy_dir;
use crate::version::ToolVersion;

/// Persistent store of extracted tool directories keyed by name and version.
pub trait ToolCache {
    /// Lists every complete cached version of `name`, in no particular order.
    fn find_all_versions(&self, name: &str) -> io::Result<Vec<ToolVersion>>;

    /// Locates the cached directory for an exact version.
    fn find(&self, name: &str, version: &ToolVersion) -> io::Result<Option<PathBuf>>;

    /// Copies `source` into the cache under `name`/`version` and returns the cached location.
    fn cache_dir(&self, source: &Path, name: &str, version: &ToolVersion) -> io::Result<PathBuf>;
}

/// On-disk tool cache using the runner layout
/// `<root>/<name>/<version>/<arch>/` with a sibling `<arch>.complete` marker.
#[derive(Debug, Clone)]
pub struct DirToolCache {
    root: PathBuf,
    arch: String,
}

impl DirToolCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirToolCache {
            root: root.into(),
            arch: cache_arch(),
        }
    }

    pub fn with_arch(root: impl Into<PathBuf>, arch: &str) -> Self {
        DirToolCache {
            root: root.into(),
            arch: arch.to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn slot(&self, name: &str, version: &str) -> PathBuf {
        self.root.join(name).join(version).join(&self.arch)
    }

    fn marker(slot: &Path) -> PathBuf {
        let mut marker = slot.as_os_str().to_owned();
        marker.push(".complete");
        PathBuf::from(marker)
    }
}

impl ToolCache for DirToolCache {
    fn find_all_versions(&self, name: &str) -> io::Result<Vec<ToolVersion>> {
        let tool_dir = self.root.join(name);
        if !tool_dir.is_dir() {
            return Ok(vec![]);
        }
        let mut versions = Vec::new();
        for entry in std::fs::read_dir(&tool_dir)? {
            let entry = entry?;
            let dir_name = entry.file_name();
            let Some(raw) = dir_name.to_str() else {
                continue;
            };
            let Some(version) = ToolVersion::parse(raw) else {
                debug!("Ignoring cache entry with invalid version: {}", raw);
                continue;
            };
            let slot = self.slot(name, raw);
            if slot.is_dir() && Self::marker(&slot).is_file() {
                versions.push(version);
            }
        }
        Ok(versions)
    }

    fn find(&self, name: &str, version: &ToolVersion) -> io::Result<Option<PathBuf>> {
        let slot = self.slot(name, &version.to_string());
        if slot.is_dir() && Self::marker(&slot).is_file() {
            debug!("Found tool in cache {} {} {}", name, version, self.arch);
            Ok(Some(slot))
        } else {
            debug!("Not found in cache: {} {} {}", name, version, self.arch);
            Ok(None)
        }
    }

    fn cache_dir(&self, source: &Path, name: &str, version: &ToolVersion) -> io::Result<PathBuf> {
        debug!("Caching tool {} {} {}", name, version, self.arch);
        debug!("source dir: {}", source.display());
        if !source.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} is not a directory", source.display()),
            ));
        }
        let slot = self.slot(name, &version.to_string());
        let marker = Self::marker(&slot);
        if marker.exists() {
            std::fs::remove_file(&marker)?;
        }
        if slot.exists() {
            std::fs::remove_dir_all(&slot)?;
        }
        copy_dir(source, &slot)?;
        std::fs::write(&marker, "")?;
        debug!("finished caching tool");
        Ok(slot)
    }
}
