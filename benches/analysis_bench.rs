//! Performance benchmarks for the offline analyzer and insight computation.
//!
//! Run with: cargo bench

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use daybook::analysis::fallback;
use daybook::journal::{date_key, Entry};
use daybook::ops::compute_insights;

const SAMPLE: &str = "Woke up anxious about the presentation at work. My partner called \
    and we talked for a while, which helped. In the evening I went for a walk and felt \
    calmer, though I'm still tired and a bit nervous about tomorrow's meeting. ";

/// Benchmark the keyword fallback at several entry lengths.
fn bench_fallback(c: &mut Criterion) {
    let mut group = c.benchmark_group("fallback_analyze");

    for repeats in [1usize, 10, 100] {
        let text = SAMPLE.repeat(repeats);
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(repeats), &text, |b, text| {
            b.iter(|| black_box(fallback::analyze(black_box(text))));
        });
    }

    group.finish();
}

/// Benchmark insight computation over a year of entries.
fn bench_insights(c: &mut Criterion) {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
    let entries: Vec<Entry> = (0..365)
        .map(|day| {
            let now = start + Duration::days(day);
            let mut entry = Entry::new(&date_key(now.date_naive()), now);
            entry.append_user_message(SAMPLE, now);
            entry.apply_analysis(&fallback::analyze(SAMPLE), now);
            entry
        })
        .collect();
    let today = NaiveDate::from_ymd_opt(2024, 12, 30).unwrap();

    c.bench_function("insights_365_days", |b| {
        b.iter(|| black_box(compute_insights(black_box(&entries), today)));
    });
}

criterion_group!(benches, bench_fallback, bench_insights);
criterion_main!(benches);
