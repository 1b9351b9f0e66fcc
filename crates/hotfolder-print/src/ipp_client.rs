// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Async IPP client for communicating with the print server.
//
// Uses the `ipp` crate's async API to send standard IPP operations:
//   - Get-Printer-Attributes  (RFC 8011 §4.2.5)
//   - Print-Job               (RFC 8011 §4.2.1)

use std::collections::HashMap;
use std::io::Cursor;

use ipp::prelude::*;
use tracing::{debug, error, info, instrument};

use hotfolder_core::error::{HotfolderError, Result};
use hotfolder_core::types::{DocumentType, JobAttributes, JobId};

use crate::attributes::job_attributes_to_ipp;

/// Attributes returned by a Get-Printer-Attributes response, flattened to
/// attribute-name → human-readable value.
pub type PrinterAttributes = HashMap<String, String>;

/// Async IPP client bound to a single printer URI.
///
/// All methods are async and require a Tokio runtime.
#[derive(Clone)]
pub struct IppClient {
    /// The target printer URI (ipp:// or ipps://).
    uri: Uri,
    /// HTTP basic auth credentials, if the server requires them.
    credentials: Option<(String, String)>,
}

impl IppClient {
    /// Create a new client targeting the given printer URI.
    pub fn new(uri: &str) -> Result<Self> {
        let parsed: Uri = uri
            .parse()
            .map_err(|e| HotfolderError::IppRequest(format!("invalid URI '{uri}': {e}")))?;
        Ok(Self {
            uri: parsed,
            credentials: None,
        })
    }

    /// Authenticate every request with HTTP basic auth.
    pub fn with_basic_auth(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some((user.into(), password.into()));
        self
    }

    /// Return the printer URI this client is targeting.
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    fn transport(&self) -> AsyncIppClient {
        let builder = AsyncIppClient::builder(self.uri.clone());
        match &self.credentials {
            Some((user, password)) => builder.basic_auth(user, password).build(),
            None => builder.build(),
        }
    }

    /// Query the printer for its capabilities and current state.
    #[instrument(skip(self), fields(uri = %self.uri))]
    pub async fn get_printer_attributes(&self) -> Result<PrinterAttributes> {
        let operation = IppOperationBuilder::get_printer_attributes(self.uri.clone()).build();

        debug!("sending Get-Printer-Attributes");
        let response = self
            .transport()
            .send(operation)
            .await
            .map_err(|e| HotfolderError::IppRequest(format!("Get-Printer-Attributes: {e}")))?;

        if !response.header().status_code().is_success() {
            let code = response.header().status_code();
            error!(status = ?code, "Get-Printer-Attributes failed");
            return Err(HotfolderError::IppRequest(format!(
                "Get-Printer-Attributes returned status {code:?}"
            )));
        }

        let attrs = flatten_attributes(response.attributes());
        debug!(count = attrs.len(), "received printer attributes");
        Ok(attrs)
    }

    /// Submit a document as a Print-Job and return the printer's job-id.
    ///
    /// The `job-name` entry of `attributes` becomes the job title; every other
    /// entry is sent as a job template attribute.
    #[instrument(skip(self, document_bytes, attributes), fields(uri = %self.uri, job_name))]
    pub async fn print_job(
        &self,
        document_bytes: Vec<u8>,
        document_type: DocumentType,
        attributes: &JobAttributes,
    ) -> Result<JobId> {
        let job_name = attributes.job_name().unwrap_or("untitled");
        tracing::Span::current().record("job_name", job_name);

        let payload = IppPayload::new(Cursor::new(document_bytes));
        let mut builder = IppOperationBuilder::print_job(self.uri.clone(), payload)
            .job_title(job_name)
            .document_format(document_type.mime_type());
        for attribute in job_attributes_to_ipp(attributes) {
            builder = builder.attribute(attribute);
        }
        let operation = builder.build();

        info!(mime = document_type.mime_type(), "sending Print-Job");
        let response = self
            .transport()
            .send(operation)
            .await
            .map_err(|e| HotfolderError::IppRequest(format!("Print-Job: {e}")))?;

        if !response.header().status_code().is_success() {
            let code = response.header().status_code();
            error!(status = ?code, "Print-Job failed");
            return Err(HotfolderError::IppRequest(format!(
                "Print-Job returned status {code:?}"
            )));
        }

        let job_id = extract_job_id(response.attributes()).ok_or_else(|| {
            HotfolderError::IppRequest("Print-Job response missing job-id attribute".into())
        })?;

        info!(job_id, "print job accepted by printer");
        Ok(JobId(job_id))
    }
}

// ---------------------------------------------------------------------------
// Helper functions for parsing IPP responses
// ---------------------------------------------------------------------------

/// Flatten all attribute groups in an IPP response into a single map.
fn flatten_attributes(attrs: &IppAttributes) -> PrinterAttributes {
    let mut map = HashMap::new();
    for group in attrs.groups() {
        for (name, attr) in group.attributes() {
            map.insert(name.clone(), format!("{}", attr.value()));
        }
    }
    map
}

/// Extract the `job-id` integer from a response's Job Attributes group.
fn extract_job_id(attrs: &IppAttributes) -> Option<i32> {
    for group in attrs.groups_of(DelimiterTag::JobAttributes) {
        if let Some(attr) = group.attributes().get("job-id")
            && let IppValue::Integer(id) = attr.value()
        {
            return Some(*id);
        }
    }
    None
}
