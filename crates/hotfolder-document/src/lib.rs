// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// hotfolder-document: Document pre-processing for the Hotfolder print daemon.
//
// Wraps PDFs with a generated cover page and trailer page that carry the
// filename, print time, and page count, so printed stacks can be told apart
// in a shared output tray.

pub mod annotate;
pub mod pdf;

pub use annotate::{DocumentAnnotator, PrintInfo};
pub use pdf::reader::PdfReader;
pub use pdf::writer::PdfWriter;
