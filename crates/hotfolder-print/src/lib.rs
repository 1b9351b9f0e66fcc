// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Hotfolder Print: IPP client and the document submitter used by the intake
// pipeline. This crate bridges between the core domain types defined in
// `hotfolder-core` and the network print server.

pub mod attributes;
pub mod ipp_client;
pub mod submitter;

pub use ipp_client::IppClient;
pub use submitter::{IppSubmitter, PrintSubmitter};
