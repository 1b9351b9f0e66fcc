// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Hotfolder print daemon.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{HotfolderError, Result};

/// Job identifier assigned by the printer on a successful Print-Job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub i32);

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Correlation id for a single print attempt (log spans only, never persisted).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttemptId(pub Uuid);

impl AttemptId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AttemptId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AttemptId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a file sits in the intake state machine.
///
/// The directory a file lives in is the persisted form of this state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileState {
    /// Sitting in `upload`, waiting for (another) print attempt.
    Pending,
    /// Archived under `printed` after the printer accepted it.
    Printed,
    /// Archived under `failed` after submission failed.
    Failed,
}

impl FileState {
    /// Name of the sub-directory of the watch root holding files in this state.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Pending => "upload",
            Self::Printed => "printed",
            Self::Failed => "failed",
        }
    }
}

/// Printable input document types accepted by the intake pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentType {
    Pdf,
    Png,
    Jpeg,
    /// PWG Raster (rendered page images).
    PwgRaster,
    /// PCL (Printer Command Language).
    Pcl,
}

impl DocumentType {
    /// MIME type string for IPP `document-format`.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::PwgRaster => "image/pwg-raster",
            Self::Pcl => "application/vnd.hp-pcl",
        }
    }

    /// Infer document type from file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "pwg" => Some(Self::PwgRaster),
            "pcl" => Some(Self::Pcl),
            _ => None,
        }
    }

    /// Infer document type from a path's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Whether the format is paginated and can carry cover/trailer pages.
    pub fn is_paginated(&self) -> bool {
        matches!(self, Self::Pdf)
    }
}

/// Page size used when generating cover and trailer pages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PaperSize {
    A4,
    /// Arbitrary size, e.g. copied from a source document's MediaBox.
    Custom { width_mm: f32, height_mm: f32 },
}

impl PaperSize {
    /// Dimensions in millimetres (width, height).
    pub fn dimensions_mm(&self) -> (f32, f32) {
        match self {
            Self::A4 => (210.0, 297.0),
            Self::Custom {
                width_mm,
                height_mm,
            } => (*width_mm, *height_mm),
        }
    }

    /// Build a custom size from PDF points (1pt = 1/72 inch).
    pub fn from_points(width_pt: f32, height_pt: f32) -> Self {
        const MM_PER_PT: f32 = 25.4 / 72.0;
        Self::Custom {
            width_mm: width_pt * MM_PER_PT,
            height_mm: height_pt * MM_PER_PT,
        }
    }
}

/// Attribute key carrying the human-readable job name.
pub const JOB_NAME_KEY: &str = "job-name";

/// Opaque IPP job attributes (job name plus operator-supplied defaults).
///
/// Values are kept as JSON so the configured mapping passes through to the
/// protocol layer untouched; only [`JOB_NAME_KEY`] is ever written here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobAttributes(BTreeMap<String, Value>);

impl JobAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON object such as `{"copies": 2, "sides": "two-sided-long-edge"}`.
    pub fn from_json(raw: &str) -> Result<Self> {
        match serde_json::from_str::<Value>(raw)? {
            Value::Object(map) => Ok(Self(map.into_iter().collect())),
            other => Err(HotfolderError::JobAttributes(format!(
                "expected a JSON object, got {other}"
            ))),
        }
    }

    /// Copy of these attributes with the job name set from `name`.
    ///
    /// Every other key is carried over verbatim.
    pub fn with_job_name(&self, name: &str) -> Self {
        let mut merged = self.0.clone();
        merged.insert(JOB_NAME_KEY.to_string(), Value::String(name.to_string()));
        Self(merged)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// The job name, if one has been merged in.
    pub fn job_name(&self) -> Option<&str> {
        self.0.get(JOB_NAME_KEY).and_then(Value::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One unit of intake work: a candidate file that passed the filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrintAttempt {
    pub id: AttemptId,
    pub path: PathBuf,
    pub document_type: DocumentType,
    /// Base filename, used as the IPP job name.
    pub document_name: String,
    pub observed_at: DateTime<Utc>,
}

impl PrintAttempt {
    /// Start an attempt for `path`. Returns `None` for non-printable paths.
    pub fn new(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        let document_type = DocumentType::from_path(&path)?;
        let document_name = path.file_name()?.to_string_lossy().into_owned();
        Some(Self {
            id: AttemptId::new(),
            path,
            document_type,
            document_name,
            observed_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_lookup_is_case_insensitive() {
        assert_eq!(DocumentType::from_extension("PDF"), Some(DocumentType::Pdf));
        assert_eq!(DocumentType::from_extension("JpEg"), Some(DocumentType::Jpeg));
        assert_eq!(DocumentType::from_extension("pwg"), Some(DocumentType::PwgRaster));
        assert_eq!(DocumentType::from_extension("txt"), None);
    }

    #[test]
    fn job_name_overrides_only_its_own_key() {
        let defaults =
            JobAttributes::from_json(r#"{"copies": 2, "job-name": "stale"}"#).expect("parse");
        let merged = defaults.with_job_name("report.pdf");
        assert_eq!(merged.job_name(), Some("report.pdf"));
        assert_eq!(merged.get("copies"), Some(&Value::from(2)));
        // The defaults themselves are untouched.
        assert_eq!(defaults.job_name(), Some("stale"));
    }

    #[test]
    fn non_object_attributes_are_rejected() {
        assert!(JobAttributes::from_json("[1, 2]").is_err());
        assert!(JobAttributes::from_json("not json").is_err());
        assert!(JobAttributes::from_json("{}").expect("empty object").is_empty());
    }

    #[test]
    fn attempt_requires_printable_extension() {
        let attempt = PrintAttempt::new("/srv/files/upload/report.pdf").expect("pdf");
        assert_eq!(attempt.document_type, DocumentType::Pdf);
        assert_eq!(attempt.document_name, "report.pdf");
        assert!(PrintAttempt::new("/srv/files/upload/notes.txt").is_none());
    }

    #[test]
    fn points_convert_to_millimetres() {
        let (w, h) = PaperSize::from_points(595.0, 842.0).dimensions_mm();
        assert!((w - 209.9).abs() < 0.5);
        assert!((h - 297.0).abs() < 0.5);
    }
}
