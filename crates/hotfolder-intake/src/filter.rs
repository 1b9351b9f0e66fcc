// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Which files in `upload` are printable documents.

use std::path::Path;

/// Extensions accepted when no custom list is configured.
pub const DEFAULT_EXTENSIONS: [&str; 6] = ["pdf", "png", "jpg", "jpeg", "pwg", "pcl"];

/// Case-insensitive extension allow-list.
///
/// Rejected files are left where they are: anything that is not a document
/// is simply not the pipeline's concern.
#[derive(Debug, Clone)]
pub struct ExtensionFilter {
    allowed: Vec<String>,
}

impl Default for ExtensionFilter {
    fn default() -> Self {
        Self::new(DEFAULT_EXTENSIONS)
    }
}

impl ExtensionFilter {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            allowed: extensions
                .into_iter()
                .map(|ext| ext.as_ref().trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        }
    }

    /// Whether `path` names a printable document. Directories never are.
    pub fn accepts(&self, path: &Path) -> bool {
        if path.is_dir() {
            return false;
        }
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext = ext.to_ascii_lowercase();
                self.allowed.iter().any(|allowed| *allowed == ext)
            })
            .unwrap_or(false)
    }
}
