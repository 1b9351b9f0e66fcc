// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Hotfolder.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for all Hotfolder operations.
#[derive(Debug, Error)]
pub enum HotfolderError {
    // -- Print errors --
    #[error("IPP request failed: {0}")]
    IppRequest(String),

    #[error("invalid job attributes: {0}")]
    JobAttributes(String),

    // -- Document errors --
    #[error("unsupported document type: {0}")]
    UnsupportedDocument(String),

    #[error("PDF operation failed: {0}")]
    PdfError(String),

    // -- Intake / filesystem state machine --
    #[error("{} is not inside the upload directory", .0.display())]
    NotInUpload(PathBuf),

    #[error("failed to move {} to {}: {source}", .from.display(), .to.display())]
    Move {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("filesystem watch failed: {0}")]
    Watch(String),

    #[error("intake pipeline is shutting down")]
    Shutdown,

    // -- Configuration --
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, HotfolderError>;
