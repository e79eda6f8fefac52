use std::io;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

/// Outcome of probing a directory that should exist.
#[derive(Debug)]
pub enum DirAccess {
    NotFound,
    Other(io::Error),
}

impl From<io::Error> for DirAccess {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => DirAccess::NotFound,
            _ => DirAccess::Other(err),
        }
    }
}

/// Checks that `path` can be accessed.
pub fn access(path: &Path) -> Result<(), DirAccess> {
    std::fs::metadata(path).map(|_| ()).map_err(DirAccess::from)
}

/// Makes sure `path` exists, creating it only when it is missing.
///
/// Any access failure other than "not found" is returned untouched.
pub fn ensure_dir(path: &Path) -> io::Result<()> {
    match access(path) {
        Ok(()) => Ok(()),
        Err(DirAccess::NotFound) => {
            debug!("Creating directory: {}", path.display());
            std::fs::create_dir_all(path)
        }
        Err(DirAccess::Other(err)) => Err(err),
    }
}

/// Recursively copies the contents of `src` into `dest`.
pub fn copy_dir(src: &Path, dest: &Path) -> io::Result<()> {
    std::fs::create_dir_all(dest)?;
    for entry in WalkDir::new(src).min_depth(1) {
        let entry = entry.map_err(io::Error::other)?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(io::Error::other)?;
        let target = dest.join(relative);
        let file_type = entry.file_type();
        if file_type.is_dir() {
            std::fs::create_dir_all(&target)?;
        } else if file_type.is_symlink() {
            copy_symlink(entry.path(), &target)?;
        } else {
            std::fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn copy_symlink(src: &Path, target: &Path) -> io::Result<()> {
    let link = std::fs::read_link(src)?;
    std::os::unix::fs::symlink(link, target)
}

#[cfg(not(unix))]
fn copy_symlink(src: &Path, target: &Path) -> io::Result<()> {
    std::fs::copy(src, target).map(|_| ())
}

/// Checks if a given path is an executable file on Unix.
#[cfg(all(test, unix))]
pub(crate) fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}
