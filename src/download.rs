use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use reqwest::blocking::Client;
use tracing::debug;

/// Fetches a remote file to a local path.
pub trait Downloader {
    /// Downloads `url` to `dest` and returns the written path.
    fn download(&self, url: &str, dest: &Path) -> io::Result<PathBuf>;
}

/// Single-attempt blocking HTTP downloader.
#[derive(Debug, Default)]
pub struct HttpDownloader {
    client: Client,
}

impl HttpDownloader {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Downloader for HttpDownloader {
    fn download(&self, url: &str, dest: &Path) -> io::Result<PathBuf> {
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut response = self
            .client
            .get(url)
            .header("User-Agent", "setup-steamcmd")
            .send()
            .and_then(|resp| resp.error_for_status())
            .map_err(io::Error::other)?;

        let mut file = File::create(dest)?;
        let written = response.copy_to(&mut file).map_err(io::Error::other)?;
        debug!("Downloaded {} bytes to {}", written, dest.display());
        Ok(dest.to_path_buf())
    }
}
