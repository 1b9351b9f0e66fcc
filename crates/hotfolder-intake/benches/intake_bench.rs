// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the per-file checks in the hotfolder-intake crate.
// Both run for every notification or poll hit, before any I/O.

use std::path::PathBuf;

use chrono::NaiveDate;
use criterion::{Criterion, black_box, criterion_group, criterion_main};

use hotfolder_core::types::JobId;
use hotfolder_intake::ExtensionFilter;
use hotfolder_intake::mover::destination_name;

/// Benchmark the extension allow-list over a mixed batch of names.
fn bench_filter(c: &mut Criterion) {
    let filter = ExtensionFilter::default();
    let names: Vec<PathBuf> = (0..256)
        .map(|i| {
            let ext = ["pdf", "PNG", "txt", "jpeg", "docx", "pcl", "tmp", "Jpg"][i % 8];
            PathBuf::from(format!("/srv/files/upload/batch/document-{i}.{ext}"))
        })
        .collect();

    c.bench_function("extension filter (256 names)", |b| {
        b.iter(|| {
            let accepted = names
                .iter()
                .filter(|path| filter.accepts(black_box(path)))
                .count();
            black_box(accepted);
        });
    });
}

/// Benchmark building the archive name of a printed file.
fn bench_destination_name(c: &mut Criterion) {
    let date = NaiveDate::from_ymd_opt(2024, 3, 1).expect("valid date");

    c.bench_function("destination name (printed)", |b| {
        b.iter(|| {
            black_box(destination_name(
                black_box(date),
                black_box(Some(JobId(1234))),
                black_box("quarterly-report-final.pdf"),
            ))
        });
    });
}

criterion_group!(benches, bench_filter, bench_destination_name);
criterion_main!(benches);
