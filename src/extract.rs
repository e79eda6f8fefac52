use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use flate2::read::GzDecoder;
use tar::Archive;
use tracing::debug;
use crate::platform::ArchiveKind;

/// Unpacks downloaded archives into a destination directory.
pub trait ArchiveExtractor {
    fn extract_zip(&self, archive: &Path, dest: &Path) -> io::Result<PathBuf>;
    fn extract_tar(&self, archive: &Path, dest: &Path) -> io::Result<PathBuf>;

    /// Dispatches on the archive kind.
    fn extract(&self, kind: ArchiveKind, archive: &Path, dest: &Path) -> io::Result<PathBuf> {
        match kind {
            ArchiveKind::Zip => self.extract_zip(archive, dest),
            ArchiveKind::TarGz => self.extract_tar(archive, dest),
        }
    }
}

/// Extractor for `.zip` and gzip-compressed tarballs.
#[derive(Debug, Default, Clone, Copy)]
pub struct ArchiveUnpacker;

impl ArchiveExtractor for ArchiveUnpacker {
    fn extract_zip(&self, archive: &Path, dest: &Path) -> io::Result<PathBuf> {
        debug!("Unzipping {} into {}", archive.display(), dest.display());
        std::fs::create_dir_all(dest)?;
        let file = File::open(archive)?;
        let mut zip = zip::ZipArchive::new(file).map_err(io::Error::other)?;
        zip.extract(dest).map_err(io::Error::other)?;
        Ok(dest.to_path_buf())
    }

    fn extract_tar(&self, archive: &Path, dest: &Path) -> io::Result<PathBuf> {
        debug!("Untarring {} into {}", archive.display(), dest.display());
        std::fs::create_dir_all(dest)?;
        let file = File::open(archive)?;
        let mut tar = Archive::new(GzDecoder::new(file));
        tar.set_preserve_permissions(true);
        tar.unpack(dest)?;
        Ok(dest.to_path_buf())
    }
}
