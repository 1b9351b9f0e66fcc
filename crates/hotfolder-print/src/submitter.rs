// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document submission: read a file, optionally annotate it, send it.

use std::future::Future;
use std::path::Path;

use tracing::{debug, instrument};

use hotfolder_core::error::{HotfolderError, Result};
use hotfolder_core::types::{DocumentType, JobAttributes, JobId};
use hotfolder_document::{DocumentAnnotator, PrintInfo};

use crate::ipp_client::IppClient;

/// Sends one file to the printer and reports the job id it was given.
///
/// Implementations must not move or delete the file; routing it into
/// `printed/` or `failed/` is the intake pipeline's job.
pub trait PrintSubmitter: Send + Sync + 'static {
    fn submit(
        &self,
        path: &Path,
        attributes: &JobAttributes,
    ) -> impl Future<Output = Result<JobId>> + Send;
}

/// [`PrintSubmitter`] backed by an IPP print server.
pub struct IppSubmitter {
    client: IppClient,
    /// When set, PDFs get cover and trailer pages before submission.
    annotator: Option<DocumentAnnotator>,
}

impl IppSubmitter {
    pub fn new(client: IppClient) -> Self {
        Self {
            client,
            annotator: None,
        }
    }

    pub fn with_annotator(mut self, annotator: DocumentAnnotator) -> Self {
        self.annotator = Some(annotator);
        self
    }

    /// Produce the bytes actually sent to the printer.
    async fn prepare(
        &self,
        bytes: Vec<u8>,
        document_type: DocumentType,
        document_name: &str,
    ) -> Result<Vec<u8>> {
        let Some(annotator) = self.annotator else {
            return Ok(bytes);
        };
        if !document_type.is_paginated() {
            return Ok(bytes);
        }

        let info = PrintInfo::new(document_name);
        // PDF rewriting is CPU-bound; keep it off the async workers.
        tokio::task::spawn_blocking(move || annotator.annotate(&bytes, &info))
            .await
            .map_err(|e| HotfolderError::PdfError(format!("annotation task failed: {e}")))?
    }
}

impl PrintSubmitter for IppSubmitter {
    #[instrument(skip(self, attributes), fields(path = %path.display()))]
    async fn submit(&self, path: &Path, attributes: &JobAttributes) -> Result<JobId> {
        let document_type = DocumentType::from_path(path)
            .ok_or_else(|| HotfolderError::UnsupportedDocument(path.display().to_string()))?;
        let document_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| HotfolderError::UnsupportedDocument(path.display().to_string()))?;

        let raw = tokio::fs::read(path).await?;
        debug!(bytes = raw.len(), ?document_type, "document read");

        let payload = self.prepare(raw, document_type, &document_name).await?;
        let attributes = attributes.with_job_name(&document_name);

        self.client
            .print_job(payload, document_type, &attributes)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submitter() -> IppSubmitter {
        // Nothing listens on port 9; any request that gets this far fails fast.
        IppSubmitter::new(IppClient::new("ipp://127.0.0.1:9/printers/none").expect("uri"))
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = submitter()
            .submit(&dir.path().join("gone.pdf"), &JobAttributes::new())
            .await
            .expect_err("missing file");
        assert!(matches!(err, HotfolderError::Io(_)));
    }

    #[tokio::test]
    async fn unsupported_extension_is_rejected_before_reading() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "hello").expect("write");
        let err = submitter()
            .submit(&path, &JobAttributes::new())
            .await
            .expect_err("txt is not printable");
        assert!(matches!(err, HotfolderError::UnsupportedDocument(_)));
    }

    #[tokio::test]
    async fn corrupt_pdf_fails_annotation() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, "not really a pdf").expect("write");
        let err = submitter()
            .with_annotator(DocumentAnnotator::new())
            .submit(&path, &JobAttributes::new())
            .await
            .expect_err("annotation fails");
        assert!(matches!(err, HotfolderError::PdfError(_)));
    }
}
