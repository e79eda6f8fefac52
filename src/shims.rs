use std::io;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;
use crate::platform::Normalization;

/// Creates an indirection script at `shim_path` that forwards execution to
/// `entry_point`, a file next to the shim.
///
/// The script resolves the entry point relative to its own location, so the
/// pair keeps working after the directory is copied into the tool cache.
///
/// # Errors
///
/// Returns an error if writing the script or setting its mode fails.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use setup_steamcmd::create_shim;
///
/// create_shim("steamcmd.sh", Path::new("/opt/steamcmd/steamcmd")).unwrap();
/// ```
pub fn create_shim(entry_point: &str, shim_path: &Path) -> io::Result<()> {
    let script = format!("#!/bin/bash\nexec \"$(dirname \"$0\")/{entry_point}\" \"$@\"\n");
    std::fs::write(shim_path, script)?;
    set_mode(shim_path, 0o755)
}

/// Adds execute permission to `root` and everything below it.
pub fn make_executable(root: &Path) -> io::Result<()> {
    for entry in WalkDir::new(root) {
        let entry = entry.map_err(io::Error::other)?;
        if entry.file_type().is_symlink() {
            continue;
        }
        add_exec_bits(entry.path())?;
    }
    Ok(())
}

/// Applies the platform's post-extraction normalization to an extracted tree.
pub fn normalize(extracted: &Path, tool_file_name: &str, shim_name: &str, normalization: Normalization) -> io::Result<()> {
    match normalization {
        Normalization::None => Ok(()),
        Normalization::Executable => make_executable(extracted),
        Normalization::ExecutableWithShim => {
            make_executable(extracted)?;
            let shim = extracted.join(shim_name);
            debug!("Creating shim {}", shim.display());
            create_shim(tool_file_name, &shim)
        }
    }
}

#[cfg(unix)]
fn add_exec_bits(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = std::fs::metadata(path)?.permissions();
    perms.set_mode(perms.mode() | 0o111);
    std::fs::set_permissions(path, perms)
}

#[cfg(not(unix))]
fn add_exec_bits(_path: &Path) -> io::Result<()> {
    Ok(())
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}
