//! File helpers: atomic replacement, modes and removal

use std::fs;
use std::io::Write;
use std::os::unix::fs::{PermissionsExt, symlink};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::error::{Error, Result};

/// Mode used for new files that have no previous version to inherit from
const DEFAULT_FILE_MODE: u32 = 0o644;

/// Replace `path` with `contents` through a temporary file in the same
/// directory and an atomic rename.
///
/// With `mode == None` the previous file's mode is kept (0644 for new
/// files) instead of the 0600 `NamedTempFile` creates.
pub fn write_atomic(path: &Path, contents: &[u8], mode: Option<u32>) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mode = match mode {
        Some(mode) => mode,
        None => fs::metadata(path)
            .map(|meta| meta.permissions().mode() & 0o7777)
            .unwrap_or(DEFAULT_FILE_MODE),
    };

    let mut staged = NamedTempFile::new_in(parent).map_err(|e| Error::io(parent, e))?;
    staged
        .write_all(contents)
        .map_err(|e| Error::io(staged.path(), e))?;
    staged
        .as_file()
        .sync_all()
        .map_err(|e| Error::io(staged.path(), e))?;
    fs::set_permissions(staged.path(), fs::Permissions::from_mode(mode))
        .map_err(|e| Error::io(staged.path(), e))?;

    staged.persist(path).map_err(|e| Error::Persist {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(())
}

/// Copy `src` over `dst` atomically, keeping the source's mode unless one
/// is given
pub fn copy_atomic(src: &Path, dst: &Path, mode: Option<u32>) -> Result<()> {
    let contents = fs::read(src).map_err(|e| Error::io(src, e))?;
    let mode = match mode {
        Some(mode) => mode,
        None => fs::metadata(src)
            .map(|meta| meta.permissions().mode() & 0o7777)
            .map_err(|e| Error::io(src, e))?,
    };
    write_atomic(dst, &contents, Some(mode))
}

/// Create a directory (and parents) and force its mode
pub fn create_dir_with_mode(path: &Path, mode: u32) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| Error::io(path, e))?;
    set_mode(path, mode)
}

pub fn set_mode(path: &Path, mode: u32) -> Result<()> {
    fs::set_permissions(path, fs::Permissions::from_mode(mode)).map_err(|e| Error::io(path, e))
}

/// Remove a file; returns whether something was removed
pub fn remove_file_if_exists(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(Error::io(path, e)),
    }
}

/// Remove a directory tree; returns whether something was removed
pub fn remove_dir_if_exists(path: &Path) -> Result<bool> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(Error::io(path, e)),
    }
}

/// Target of `path` when it is a symbolic link
pub fn symlink_target(path: &Path) -> Result<Option<PathBuf>> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_symlink() => {
            fs::read_link(path).map(Some).map_err(|e| Error::io(path, e))
        }
        Ok(_) => Ok(None),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::io(path, e)),
    }
}

/// Atomically replace whatever is at `path` with a link to `target`
pub fn replace_with_symlink(path: &Path, target: &Path) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let staged = parent.join(format!(".{name}.link-{}", std::process::id()));

    remove_file_if_exists(&staged)?;
    symlink(target, &staged).map_err(|e| Error::io(&staged, e))?;
    if let Err(e) = fs::rename(&staged, path) {
        let _ = fs::remove_file(&staged);
        return Err(Error::io(path, e));
    }
    Ok(())
}

/// Permission bits of `path`, if it exists
pub fn mode_of(path: &Path) -> Option<u32> {
    fs::metadata(path)
        .ok()
        .map(|meta| meta.permissions().mode() & 0o7777)
}
