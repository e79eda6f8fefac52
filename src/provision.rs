use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use crate::download::Downloader;
use crate::error::{ProvisionError, Result};
use crate::extract::ArchiveExtractor;
use crate::global::cache::ToolCache;
use crate::global::dirs::SCRATCH_DIR_NAME;
use crate::platform::{Platform, STEAMCMD};
use crate::process::ProcessRunner;
use crate::shims::normalize;
use crate::util::ensure_dir;
use crate::version::{probe_version, ToolVersion};

/// Inputs of a single provisioning run.
#[derive(Debug, Clone)]
pub struct ProvisionConfig {
    pub tool_name: String,
    pub platform: Platform,
    /// Root for the downloaded archive, the extraction and the scratch directory.
    pub temp_dir: PathBuf,
    /// Replaces the platform's data-home default when set.
    pub data_home: Option<PathBuf>,
    /// Suppress echoing the version probe's output.
    pub silent_probe: bool,
}

impl ProvisionConfig {
    pub fn new(platform: Platform, temp_dir: impl Into<PathBuf>) -> Self {
        ProvisionConfig {
            tool_name: STEAMCMD.to_string(),
            platform,
            temp_dir: temp_dir.into(),
            data_home: None,
            silent_probe: true,
        }
    }
}

/// Directories handed back to the caller after a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLocations {
    pub tool_directory: PathBuf,
    pub steam_root_directory: PathBuf,
    pub scratch_directory: PathBuf,
    pub version: ToolVersion,
}

/// Finds steamcmd in the tool cache or downloads, probes and caches it.
pub struct Provisioner<'a> {
    cache: &'a dyn ToolCache,
    downloader: &'a dyn Downloader,
    extractor: &'a dyn ArchiveExtractor,
    runner: &'a dyn ProcessRunner,
}

impl<'a> Provisioner<'a> {
    pub fn new(
        cache: &'a dyn ToolCache,
        downloader: &'a dyn Downloader,
        extractor: &'a dyn ArchiveExtractor,
        runner: &'a dyn ProcessRunner,
    ) -> Self {
        Provisioner {
            cache,
            downloader,
            extractor,
            runner,
        }
    }

    /// Resolves the tool, data-home and scratch directories for this run.
    ///
    /// A cache hit never touches the downloader, the extractor or the probe.
    ///
    /// # Errors
    /// Any failing step aborts the run with the matching [`ProvisionError`].
    pub fn provision(&self, config: &ProvisionConfig) -> Result<ResolvedLocations> {
        let (version, tool_directory) = match self.find_latest(&config.tool_name)? {
            Some(found) => found,
            None => self.download_and_cache(config)?,
        };

        let tool = tool_directory.join(config.platform.tool_file_name());
        std::fs::metadata(&tool).map_err(|e| ProvisionError::filesystem(&tool, e))?;
        debug!("Found {} in {}", tool.display(), tool_directory.display());

        let steam_root_directory =
            resolve_data_home(config, config.platform.default_data_home(), &tool_directory)?;

        let scratch_directory = config.temp_dir.join(SCRATCH_DIR_NAME);
        std::fs::create_dir_all(&scratch_directory)
            .map_err(|e| ProvisionError::filesystem(&scratch_directory, e))?;

        Ok(ResolvedLocations {
            tool_directory,
            steam_root_directory,
            scratch_directory,
            version,
        })
    }

    /// Looks up the numerically greatest cached version of `name`.
    pub fn find_latest(&self, name: &str) -> Result<Option<(ToolVersion, PathBuf)>> {
        let cache_root_error = |e: io::Error| ProvisionError::filesystem(name, e);
        let versions = self.cache.find_all_versions(name).map_err(cache_root_error)?;
        debug!(
            "Found versions: {}",
            versions.iter().map(ToString::to_string).collect::<Vec<_>>().join(",")
        );
        let Some(latest) = versions.into_iter().max() else {
            return Ok(None);
        };
        let found = self.cache.find(name, &latest).map_err(cache_root_error)?;
        Ok(found.map(|dir| (latest, dir)))
    }

    fn download_and_cache(&self, config: &ProvisionConfig) -> Result<(ToolVersion, PathBuf)> {
        let name = &config.tool_name;
        let coords = config.platform.download_coordinates()?;

        let archive_download_path = config.temp_dir.join(&coords.archive_name);
        debug!(
            "Attempting to download {} from {} to {}",
            name,
            coords.url,
            archive_download_path.display()
        );
        let archive = self
            .downloader
            .download(&coords.url, &archive_download_path)
            .map_err(|source| ProvisionError::DownloadFailed {
                url: coords.url.clone(),
                source,
            })?;
        debug!("Successfully downloaded {} to {}", name, archive.display());

        debug!("Extracting {} from {}", name, archive.display());
        let extraction_error = |source: io::Error| ProvisionError::ExtractionFailed {
            archive: archive.clone(),
            source,
        };
        let extracted = self
            .extractor
            .extract(coords.kind, &archive, &config.temp_dir.join(name))
            .map_err(extraction_error)?;
        if !extracted.is_dir() {
            return Err(extraction_error(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no directory at {}", extracted.display()),
            )));
        }

        normalize(
            &extracted,
            &config.platform.tool_file_name(),
            name,
            config.platform.normalization(),
        )
        .map_err(|e| ProvisionError::filesystem(&extracted, e))?;
        debug!("Successfully extracted {} to {}", name, extracted.display());

        let tool = extracted.join(config.platform.tool_file_name());
        let version = probe_version(self.runner, &tool, config.platform, config.silent_probe)?;

        debug!("Setting tool cache: {} | {} | {}", extracted.display(), name, version);
        let cached = self
            .cache
            .cache_dir(&extracted, name, &version)
            .map_err(|source| ProvisionError::CacheInsertFailed {
                version: version.to_string(),
                source,
            })?;
        Ok((version, cached))
    }
}

/// Picks the override, then `platform_default`, then the tool directory, and
/// makes sure the result exists.
fn resolve_data_home(
    config: &ProvisionConfig,
    platform_default: Option<PathBuf>,
    tool_directory: &Path,
) -> Result<PathBuf> {
    let data_home = config
        .data_home
        .clone()
        .or(platform_default)
        .unwrap_or_else(|| tool_directory.to_path_buf());
    ensure_dir(&data_home).map_err(|e| ProvisionError::filesystem(&data_home, e))?;
    debug!("Steam directory: {}", data_home.display());
    Ok(data_home)
}
