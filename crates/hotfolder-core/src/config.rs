// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Daemon configuration, read from the process environment.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{HotfolderError, Result};
use crate::types::JobAttributes;

/// How the daemon learns about new files in `upload`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntakeStrategy {
    /// Re-walk the upload tree on a fixed interval.
    Poll,
    /// Subscribe to filesystem change notifications.
    Watch,
}

impl FromStr for IntakeStrategy {
    type Err = HotfolderError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "poll" => Ok(Self::Poll),
            "watch" | "notify" => Ok(Self::Watch),
            other => Err(HotfolderError::Config(format!(
                "INTAKE_STRATEGY must be 'poll' or 'watch', got '{other}'"
            ))),
        }
    }
}

/// Daemon settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// IPP server host.
    pub printer_host: String,
    /// IPP server port (default 631).
    pub printer_port: u16,
    /// HTTP basic auth user; empty disables authentication.
    pub printer_user: String,
    pub printer_pass: String,
    /// Use `ipps://` instead of `ipp://`.
    pub printer_tls: bool,
    /// Queue name on the print server.
    pub printer_name: String,
    /// Default job attributes as a JSON object.
    pub job_attrs_json: String,
    /// Add cover and trailer pages to PDFs before printing.
    pub annotate: bool,
    /// Watch root holding `upload/`, `printed/` and `failed/`.
    pub file_root: PathBuf,
    pub strategy: IntakeStrategy,
    /// Narrows the printable extensions (pdf, png, jpg, jpeg, pwg, pcl);
    /// empty accepts all of them.
    pub extensions: Vec<String>,
    pub poll_interval_ms: u64,
    /// Delay before the first print attempt of a file, so copies can finish.
    pub settle_delay_ms: u64,
    /// Attempts per file left in `upload` before giving up; 0 retries forever.
    pub retry_max_attempts: u32,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            printer_host: "localhost".into(),
            printer_port: 631,
            printer_user: String::new(),
            printer_pass: String::new(),
            printer_tls: false,
            printer_name: "Printer".into(),
            job_attrs_json: "{}".into(),
            annotate: true,
            file_root: PathBuf::from("./files"),
            strategy: IntakeStrategy::Poll,
            extensions: Vec::new(),
            poll_interval_ms: 1_000,
            settle_delay_ms: 3_000,
            retry_max_attempts: 0,
        }
    }
}

impl DaemonConfig {
    /// Load from the process environment, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary variable lookup (tests pass a map here).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(v) = lookup("PRINTER_HOST") {
            cfg.printer_host = v;
        }
        if let Some(v) = lookup("PRINTER_PORT") {
            cfg.printer_port = parse_var("PRINTER_PORT", &v)?;
        }
        if let Some(v) = lookup("PRINTER_USER") {
            cfg.printer_user = v;
        }
        if let Some(v) = lookup("PRINTER_PASS") {
            cfg.printer_pass = v;
        }
        if let Some(v) = lookup("PRINTER_TLS") {
            cfg.printer_tls = parse_bool("PRINTER_TLS", &v)?;
        }
        if let Some(v) = lookup("PRINTER_NAME") {
            cfg.printer_name = v;
        }
        if let Some(v) = lookup("PRINTER_JOB_ATTRS") {
            cfg.job_attrs_json = v;
        }
        if let Some(v) = lookup("PRINTER_ANNOTATE") {
            cfg.annotate = parse_bool("PRINTER_ANNOTATE", &v)?;
        }
        if let Some(v) = lookup("FILE_ROOT_PATH") {
            cfg.file_root = PathBuf::from(v);
        }
        if let Some(v) = lookup("INTAKE_STRATEGY") {
            cfg.strategy = v.parse()?;
        }
        if let Some(v) = lookup("INTAKE_EXTENSIONS") {
            cfg.extensions = parse_list(&v);
        }
        if let Some(v) = lookup("POLL_INTERVAL_MS") {
            cfg.poll_interval_ms = parse_var("POLL_INTERVAL_MS", &v)?;
        }
        if let Some(v) = lookup("SETTLE_DELAY_MS") {
            cfg.settle_delay_ms = parse_var("SETTLE_DELAY_MS", &v)?;
        }
        if let Some(v) = lookup("RETRY_MAX_ATTEMPTS") {
            cfg.retry_max_attempts = parse_var("RETRY_MAX_ATTEMPTS", &v)?;
        }

        Ok(cfg)
    }

    /// Printer URI, CUPS style: `ipp[s]://host:port/printers/<name>`.
    pub fn printer_uri(&self) -> String {
        let scheme = if self.printer_tls { "ipps" } else { "ipp" };
        format!(
            "{scheme}://{}:{}/printers/{}",
            self.printer_host, self.printer_port, self.printer_name
        )
    }

    /// Basic auth credentials, if a user is configured.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        if self.printer_user.is_empty() {
            None
        } else {
            Some((self.printer_user.as_str(), self.printer_pass.as_str()))
        }
    }

    /// Parse the configured default job attributes.
    pub fn job_attributes(&self) -> Result<JobAttributes> {
        JobAttributes::from_json(&self.job_attrs_json)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

fn parse_var<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| HotfolderError::Config(format!("{key}='{raw}': {e}")))
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(HotfolderError::Config(format!(
            "{key}='{raw}' is not a boolean"
        ))),
    }
}

/// Comma-separated list; blank entries are dropped.
fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}
