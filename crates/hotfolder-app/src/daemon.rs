// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Daemon assembly: configuration in, running intake pipeline out.

use std::sync::Arc;

use hotfolder_core::error::Result;
use hotfolder_core::types::JobAttributes;
use hotfolder_core::{DaemonConfig, IntakeStrategy};
use hotfolder_document::DocumentAnnotator;
use hotfolder_intake::{
    EventWatcher, ExtensionFilter, FileStateMover, IntakeManager, Poller, RetryPolicy, WatchRoot,
};
use hotfolder_print::{IppClient, IppSubmitter};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Build every component from `config` and run the configured intake
/// strategy until `cancel` fires.
///
/// Startup problems (unusable watch root, bad printer URI, a watch that
/// cannot be opened) are returned as errors; an unreachable printer is not.
pub async fn run(config: DaemonConfig, cancel: CancellationToken) -> Result<()> {
    let root = WatchRoot::new(&config.file_root)?;
    root.ensure()?;
    info!(root = %root.root().display(), "watch root ready");

    let client = build_client(&config)?;
    report_printer(&client).await;

    let mut submitter = IppSubmitter::new(client);
    if config.annotate {
        submitter = submitter.with_annotator(DocumentAnnotator::new());
    }

    let manager = Arc::new(
        IntakeManager::new(submitter, FileStateMover::new(root), default_attributes(&config))
            .with_filter(build_filter(&config))
            .with_retry_policy(RetryPolicy::from_max_attempts(config.retry_max_attempts)),
    );

    match config.strategy {
        IntakeStrategy::Poll => {
            Poller::new(manager)
                .with_interval(config.poll_interval())
                .with_settle_delay(config.settle_delay())
                .run(cancel)
                .await
        }
        IntakeStrategy::Watch => {
            EventWatcher::new(manager)
                .with_settle_delay(config.settle_delay())
                .run(cancel)
                .await
        }
    }
}

fn build_client(config: &DaemonConfig) -> Result<IppClient> {
    let client = IppClient::new(&config.printer_uri())?;
    Ok(match config.credentials() {
        Some((user, password)) => client.with_basic_auth(user, password),
        None => client,
    })
}

fn build_filter(config: &DaemonConfig) -> ExtensionFilter {
    if config.extensions.is_empty() {
        ExtensionFilter::default()
    } else {
        ExtensionFilter::new(&config.extensions)
    }
}

/// Job attributes sent with every job; malformed JSON means none.
fn default_attributes(config: &DaemonConfig) -> JobAttributes {
    match config.job_attributes() {
        Ok(attributes) => attributes,
        Err(e) => {
            warn!(error = %e, "ignoring PRINTER_JOB_ATTRS");
            JobAttributes::new()
        }
    }
}

/// Log what the printer reports about itself. Failure is only a warning: the
/// printer may simply not be up yet.
async fn report_printer(client: &IppClient) {
    match client.get_printer_attributes().await {
        Ok(attrs) => {
            let field = |name: &str| attrs.get(name).map(String::as_str).unwrap_or("unknown");
            info!(
                uri = %client.uri(),
                state = field("printer-state"),
                make = field("printer-make-and-model"),
                "printer reachable"
            );
        }
        Err(e) => warn!(uri = %client.uri(), error = %e, "printer not reachable yet"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::Path;

    fn config_from(vars: &[(&str, &str)]) -> DaemonConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        DaemonConfig::from_lookup(|key| vars.get(key).cloned()).expect("config")
    }

    #[test]
    fn malformed_job_attributes_fall_back_to_empty() {
        let config = config_from(&[("PRINTER_JOB_ATTRS", "{not json")]);
        assert!(default_attributes(&config).is_empty());

        let config = config_from(&[("PRINTER_JOB_ATTRS", r#"{"copies": 2}"#)]);
        assert_eq!(default_attributes(&config).len(), 1);
    }

    #[test]
    fn client_targets_configured_queue() {
        let config = config_from(&[
            ("PRINTER_HOST", "print.local"),
            ("PRINTER_PORT", "8631"),
            ("PRINTER_NAME", "Office"),
        ]);
        let client = build_client(&config).expect("client");
        assert_eq!(client.uri().to_string(), "ipp://print.local:8631/printers/Office");
    }

    #[test]
    fn extension_list_narrows_the_filter() {
        let filter = build_filter(&config_from(&[("INTAKE_EXTENSIONS", "pdf")]));
        assert!(filter.accepts(Path::new("a.pdf")));
        assert!(!filter.accepts(Path::new("a.png")));

        let filter = build_filter(&config_from(&[]));
        assert!(filter.accepts(Path::new("a.png")));
    }

    #[tokio::test]
    async fn cancelled_daemon_still_prepares_watch_root() {
        let dir = tempfile::tempdir().expect("tempdir");
        let files = dir.path().join("files");
        let config = DaemonConfig {
            // Nothing listens here; the attribute query fails and is only logged.
            printer_host: "127.0.0.1".into(),
            printer_port: 9,
            file_root: files.clone(),
            settle_delay_ms: 0,
            ..DaemonConfig::default()
        };
        let cancel = CancellationToken::new();
        cancel.cancel();

        run(config, cancel).await.expect("clean shutdown");
        for sub in ["upload", "printed", "failed"] {
            assert!(files.join(sub).is_dir(), "{sub} missing");
        }
    }
}
