//! One-time backups of the system files the installer mutates
//!
//! A backup is written at most once: a reinstall must never replace the
//! pre-installation copy with the proxy's own resolver settings.
//!
//! A protected file that is a symbolic link (`/etc/resolv.conf` under
//! systemd-resolved) also gets a `.link` record holding the link target;
//! restoring recreates the link instead of writing a regular file.

use std::ffi::OsString;
use std::fs;
use std::os::unix::ffi::{OsStrExt, OsStringExt};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::files;
use crate::error::{Error, Result};

/// Mode of the backup directory
const BACKUP_DIR_MODE: u32 = 0o700;

/// Result of [`ConfigBackupStore::backup_if_absent`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupOutcome {
    /// The source was copied to the backup path
    Created,
    /// A backup already existed and was left untouched
    AlreadyExists,
    /// The source does not exist; its absence is the original state
    SourceMissing,
}

/// Result of [`ConfigBackupStore::restore`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreOutcome {
    Restored,
    NoBackupAvailable,
}

/// A protected file and where its backup lives
#[derive(Debug, Clone, PartialEq)]
pub struct BackupRecord {
    pub source: PathBuf,
    pub backup: PathBuf,
}

impl BackupRecord {
    pub fn new(source: impl Into<PathBuf>, backup: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            backup: backup.into(),
        }
    }

    pub fn exists(&self) -> bool {
        self.backup.is_file() || link_record_path(&self.backup).is_file()
    }
}

/// Where the link target of a symlinked source is recorded
pub fn link_record_path(backup: &Path) -> PathBuf {
    let mut name = backup.as_os_str().to_owned();
    name.push(".link");
    PathBuf::from(name)
}

/// Owns the backup directory and its lifecycle
pub struct ConfigBackupStore {
    backup_dir: PathBuf,
}

impl ConfigBackupStore {
    pub fn new(backup_dir: impl Into<PathBuf>) -> Self {
        Self {
            backup_dir: backup_dir.into(),
        }
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Create the backup directory with owner-only access
    pub fn ensure_dir(&self) -> Result<()> {
        files::create_dir_with_mode(&self.backup_dir, BACKUP_DIR_MODE)
    }

    /// Copy `source` to `backup` unless a backup already exists
    pub fn backup_if_absent(&self, source: &Path, backup: &Path) -> Result<BackupOutcome> {
        let link_record = link_record_path(backup);
        if backup.exists() || link_record.is_file() {
            debug!(backup = %backup.display(), "backup already present, keeping it");
            return Ok(BackupOutcome::AlreadyExists);
        }
        let link_target = files::symlink_target(source)?;
        if link_target.is_none() && !source.is_file() {
            debug!(source = %source.display(), "nothing to back up");
            return Ok(BackupOutcome::SourceMissing);
        }

        if let Some(parent) = backup.parent() {
            files::create_dir_with_mode(parent, BACKUP_DIR_MODE)?;
        }
        // a dangling link has no content, only its target
        if source.is_file() {
            files::copy_atomic(source, backup, None)?;
        }
        if let Some(target) = &link_target {
            files::write_atomic(&link_record, target.as_os_str().as_bytes(), None)?;
            debug!(link = %target.display(), "symlink target recorded");
        }
        info!(
            source = %source.display(),
            backup = %backup.display(),
            "backup created"
        );
        Ok(BackupOutcome::Created)
    }

    /// Put `backup` back at `destination`; the backup is kept
    pub fn restore(&self, backup: &Path, destination: &Path) -> Result<RestoreOutcome> {
        let link_record = link_record_path(backup);
        if link_record.is_file() {
            let raw = fs::read(&link_record).map_err(|e| Error::io(&link_record, e))?;
            let target = PathBuf::from(OsString::from_vec(raw));
            files::replace_with_symlink(destination, &target)?;
            info!(
                destination = %destination.display(),
                link = %target.display(),
                "symlink restored"
            );
            return Ok(RestoreOutcome::Restored);
        }
        if !backup.is_file() {
            return Ok(RestoreOutcome::NoBackupAvailable);
        }

        files::copy_atomic(backup, destination, None)?;
        info!(
            backup = %backup.display(),
            destination = %destination.display(),
            "configuration restored from backup"
        );
        Ok(RestoreOutcome::Restored)
    }

    /// Write a safe default when there is nothing to restore
    pub fn fallback_restore(&self, destination: &Path, fallback_content: &str) -> Result<()> {
        files::write_atomic(destination, fallback_content.as_bytes(), None)?;
        info!(destination = %destination.display(), "fallback configuration written");
        Ok(())
    }

    /// Delete every backup; returns whether the directory existed
    pub fn purge(&self) -> Result<bool> {
        let removed = files::remove_dir_if_exists(&self.backup_dir)?;
        if removed {
            info!(dir = %self.backup_dir.display(), "backups purged");
        }
        Ok(removed)
    }
}
