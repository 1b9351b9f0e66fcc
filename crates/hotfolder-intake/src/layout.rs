// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The watch root and its three fixed sub-directories.

use std::path::{Path, PathBuf};

use hotfolder_core::error::{HotfolderError, Result};
use hotfolder_core::types::FileState;
use tracing::{debug, info, instrument};

/// A directory holding `upload/`, `printed/` and `failed/`.
///
/// Paths are made absolute (without resolving symlinks) on construction so
/// that paths reported by the poller and by filesystem notifications compare
/// equal.
#[derive(Debug, Clone)]
pub struct WatchRoot {
    root: PathBuf,
    upload: PathBuf,
    printed: PathBuf,
    failed: PathBuf,
}

impl WatchRoot {
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = std::path::absolute(root.as_ref())?;
        Ok(Self {
            upload: root.join(FileState::Pending.dir_name()),
            printed: root.join(FileState::Printed.dir_name()),
            failed: root.join(FileState::Failed.dir_name()),
            root,
        })
    }

    /// Create the three sub-directories if they are missing.
    ///
    /// Safe to call repeatedly; an existing layout is left untouched.
    #[instrument(skip(self), fields(root = %self.root.display()))]
    pub fn ensure(&self) -> Result<()> {
        for dir in [&self.upload, &self.printed, &self.failed] {
            if dir.is_dir() {
                debug!(dir = %dir.display(), "directory present");
                continue;
            }
            std::fs::create_dir_all(dir)?;
            info!(dir = %dir.display(), "created directory");
        }
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn upload(&self) -> &Path {
        &self.upload
    }

    pub fn printed(&self) -> &Path {
        &self.printed
    }

    pub fn failed(&self) -> &Path {
        &self.failed
    }

    /// Directory holding files in `state`.
    pub fn dir(&self, state: FileState) -> &Path {
        match state {
            FileState::Pending => &self.upload,
            FileState::Printed => &self.printed,
            FileState::Failed => &self.failed,
        }
    }

    /// Path of `path` relative to `upload/`.
    pub fn relative_to_upload<'p>(&self, path: &'p Path) -> Result<&'p Path> {
        path.strip_prefix(&self.upload)
            .ok()
            .filter(|rel| rel.file_name().is_some())
            .ok_or_else(|| HotfolderError::NotInUpload(path.to_path_buf()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_is_idempotent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = WatchRoot::new(dir.path().join("files")).expect("root");

        root.ensure().expect("first ensure");
        let marker = root.printed().join("2024-03-01_1_kept.pdf");
        std::fs::write(&marker, b"x").expect("write marker");

        root.ensure().expect("second ensure");
        assert!(root.upload().is_dir());
        assert!(root.printed().is_dir());
        assert!(root.failed().is_dir());
        assert!(marker.exists(), "existing content must survive");
    }

    #[test]
    fn relative_path_requires_upload_prefix() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = WatchRoot::new(dir.path()).expect("root");
        let nested = root.upload().join("team/a.pdf");
        assert_eq!(
            root.relative_to_upload(&nested).expect("inside"),
            Path::new("team/a.pdf")
        );
        assert!(root.relative_to_upload(&root.failed().join("a.pdf")).is_err());
        assert!(root.relative_to_upload(root.upload()).is_err());
    }
}
