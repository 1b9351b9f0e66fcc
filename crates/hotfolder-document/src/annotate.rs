// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Cover and trailer pages for printed PDFs.

use chrono::{DateTime, Local};
use hotfolder_core::PaperSize;
use hotfolder_core::error::HotfolderError;
use tracing::{info, instrument};

use crate::pdf::{PdfReader, PdfWriter};

/// Metadata printed on the cover and trailer pages.
#[derive(Debug, Clone)]
pub struct PrintInfo {
    pub file_name: String,
    pub printed_at: DateTime<Local>,
}

impl PrintInfo {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            printed_at: Local::now(),
        }
    }

    fn render(&self, heading: &str, total_pages: usize) -> String {
        format!(
            "{heading}\n\nFilename: {}\nPrinted on: {}\nTotal pages: {}\n",
            self.file_name,
            self.printed_at.format("%Y-%m-%d %H:%M:%S"),
            total_pages
        )
    }
}

/// Produces a derived copy of a PDF with an extra first and last page.
///
/// The generated pages use the size of the source's first page, so
/// they come out of the same paper tray as the document itself. A source
/// without a readable MediaBox gets A4 pages.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentAnnotator;

impl DocumentAnnotator {
    pub fn new() -> Self {
        Self
    }

    /// Wrap `pdf` with cover and trailer pages describing `info`.
    #[instrument(skip(self, pdf), fields(file = %info.file_name, bytes_len = pdf.len()))]
    pub fn annotate(&self, pdf: &[u8], info: &PrintInfo) -> Result<Vec<u8>, HotfolderError> {
        let source = PdfReader::from_bytes(pdf)?;
        let total_pages = source.page_count();
        if total_pages == 0 {
            return Err(HotfolderError::PdfError(format!(
                "{} has no pages",
                info.file_name
            )));
        }

        let size = source.first_page_size().unwrap_or(PaperSize::A4);

        let mut writer = PdfWriter::new(size);
        writer.set_title(info.file_name.clone());
        writer.set_font_size(12.0);
        let cover = writer.create_from_text(&info.render("Print job", total_pages))?;
        let trailer = writer.create_from_text(&info.render("End of print job", total_pages))?;

        let output = source.splice_between(&cover, &trailer)?;
        info!(total_pages, output_bytes = output.len(), "document annotated");
        Ok(output)
    }
}
