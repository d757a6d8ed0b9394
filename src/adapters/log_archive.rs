//! Filesystem log archive adapter.
//!
//! Implements [`LogArchive`] over the rig's log directory.  Only
//! per-device logs are touched (see
//! [`is_device_log`](crate::step::kinds::logs::is_device_log)); the
//! application log and earlier archive copies are left alone.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::app::ports::LogArchive;
use crate::step::kinds::logs::{ARCHIVE_SEPARATOR, is_device_log};

pub struct FsLogArchive {
    dir: PathBuf,
}

impl FsLogArchive {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Regular files in the log directory that housekeeping may touch.
    fn device_logs(&self) -> io::Result<Vec<(String, PathBuf)>> {
        let mut logs = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if is_device_log(&name) && entry.file_type()?.is_file() {
                logs.push((name, entry.path()));
            }
        }
        logs.sort();
        Ok(logs)
    }
}

impl LogArchive for FsLogArchive {
    fn clear_logs(&self) -> io::Result<usize> {
        let mut removed = 0;
        for (name, path) in self.device_logs()? {
            match fs::remove_file(&path) {
                Ok(()) => {
                    debug!("Removed log {}", name);
                    removed += 1;
                }
                Err(e) => warn!("Could not remove log {}: {}", name, e),
            }
        }
        Ok(removed)
    }

    fn archive_logs(&self, brew_name: &str) -> io::Result<usize> {
        let mut copied = 0;
        for (name, path) in self.device_logs()? {
            let target = self.dir.join(format!("{brew_name}{ARCHIVE_SEPARATOR}{name}"));
            fs::copy(&path, &target)?;
            debug!("Archived {} -> {}", name, target.display());
            copied += 1;
        }
        Ok(copied)
    }
}
