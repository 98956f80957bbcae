use chrono::{DateTime, Duration, TimeZone, Utc};
use daybook::ai::CompletionBackend;
use daybook::app::AppContext;
use daybook::config::Config;
use daybook::constants::{KEY_ANALYSIS_COUNTERS, KEY_API_KEY, KEY_AUTO_ANALYSIS_CHARS};
use daybook::errors::AppResult;
use daybook::scheduler::clock::{Clock, ManualClock};
use daybook::scheduler::{AnalysisCounters, TickDecision};
use daybook::storage::{read_json, BlobStore, FileBlobStore, MemoryBlobStore};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::tempdir;

struct CountingBackend {
    calls: AtomicUsize,
}

impl CompletionBackend for CountingBackend {
    fn complete(&self, _prompt: &str, _max_tokens: u32) -> AppResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(r#"{"title": "Garden work", "summary": "Planted tomatoes.", "emotions": ["content"], "themes": ["routine"]}"#.to_string())
    }
}

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 21, 0, 0).unwrap()
}

fn open(blobs: Arc<dyn BlobStore>, backend: Arc<CountingBackend>, now: DateTime<Utc>) -> AppContext {
    AppContext::open(Config::default(), blobs, now).with_backend(backend)
}

fn counting_backend() -> Arc<CountingBackend> {
    Arc::new(CountingBackend {
        calls: AtomicUsize::new(0),
    })
}

/// Runs one tick and, if it triggers, the analysis it requested.
fn tick_and_run(ctx: &mut AppContext, now: DateTime<Utc>) -> TickDecision {
    let outcome = ctx.analysis_tick(now);
    if let Some(request) = outcome.request {
        let result = ctx.engine().analyze(&request);
        ctx.apply_analysis(&request, result, now).unwrap();
    }
    outcome.decision
}

#[test]
fn test_time_threshold_triggers_once_per_window() {
    let blobs: Arc<dyn BlobStore> = Arc::new(MemoryBlobStore::new());
    blobs.set(KEY_API_KEY, "sk-test").unwrap();
    let backend = counting_backend();
    let clock = ManualClock::new(start());
    let mut ctx = open(blobs, backend.clone(), clock.now());

    ctx.append_message("Short note", clock.now());

    for _ in 0..19 {
        clock.advance(Duration::seconds(30));
        tick_and_run(&mut ctx, clock.now());
    }
    assert_eq!(backend.calls.load(Ordering::SeqCst), 0);

    // 600 seconds after the counters started.
    clock.advance(Duration::seconds(30));
    assert!(matches!(
        tick_and_run(&mut ctx, clock.now()),
        TickDecision::Trigger(_)
    ));
    assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    assert_eq!(ctx.current().title(), "Garden work");

    clock.advance(Duration::seconds(30));
    assert!(matches!(
        tick_and_run(&mut ctx, clock.now()),
        TickDecision::Waiting(_)
    ));
    assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_char_threshold_reads_setting_each_tick() {
    let blobs: Arc<dyn BlobStore> = Arc::new(MemoryBlobStore::new());
    blobs.set(KEY_API_KEY, "sk-test").unwrap();
    let backend = counting_backend();
    let mut ctx = open(blobs.clone(), backend.clone(), start());

    ctx.append_message(&"x".repeat(300), start());
    assert!(matches!(
        tick_and_run(&mut ctx, start()),
        TickDecision::Waiting(_)
    ));

    blobs.set(KEY_AUTO_ANALYSIS_CHARS, "300").unwrap();
    assert!(matches!(
        tick_and_run(&mut ctx, start()),
        TickDecision::Trigger(_)
    ));
    assert_eq!(backend.calls.load(Ordering::SeqCst), 1);

    let counters: AnalysisCounters = read_json(blobs.as_ref(), KEY_ANALYSIS_COUNTERS)
        .unwrap()
        .unwrap();
    assert_eq!(counters.last_analysis_char_count, 300);
}

#[test]
fn test_corrupt_counters_are_reset_on_load() {
    let blobs: Arc<dyn BlobStore> = Arc::new(MemoryBlobStore::new());
    blobs
        .set(
            KEY_ANALYSIS_COUNTERS,
            r#"{"lastAnalysisTime": "2030-01-01T00:00:00Z", "lastAnalysisCharCount": 5}"#,
        )
        .unwrap();

    let ctx = open(blobs, counting_backend(), start());
    assert_eq!(ctx.scheduler().counters(), AnalysisCounters::fresh(start()));
}

#[test]
fn test_state_survives_restart_on_disk() {
    let dir = tempdir().unwrap();
    let backend = counting_backend();
    {
        let blobs: Arc<dyn BlobStore> = Arc::new(FileBlobStore::open(dir.path()).unwrap());
        blobs.set(KEY_API_KEY, "sk-test").unwrap();
        let mut ctx = open(blobs, backend.clone(), start());
        ctx.append_message(&"word ".repeat(200), start());
        tick_and_run(&mut ctx, start() + Duration::seconds(30));
        ctx.shutdown(start() + Duration::seconds(31));
    }

    let blobs: Arc<dyn BlobStore> = Arc::new(FileBlobStore::open(dir.path()).unwrap());
    let later = start() + Duration::minutes(5);
    let mut ctx = open(blobs, backend.clone(), later);

    assert_eq!(ctx.current().title(), "Garden work");
    assert_eq!(ctx.current().user_message_count(), 1);
    assert_eq!(ctx.scheduler().counters().last_analysis_char_count, 999);
    // Nothing new was written and the time window has not elapsed.
    assert!(matches!(
        tick_and_run(&mut ctx, later),
        TickDecision::Waiting(_)
    ));
    assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_midnight_rollover_finalizes_previous_day() {
    let blobs: Arc<dyn BlobStore> = Arc::new(MemoryBlobStore::new());
    blobs.set(KEY_API_KEY, "sk-test").unwrap();
    let backend = counting_backend();
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 1, 23, 58, 0).unwrap());
    let mut ctx = open(blobs, backend.clone(), clock.now());

    ctx.append_message("Late watering of the garden", clock.now());
    clock.advance(Duration::seconds(60));
    assert!(ctx.check_rollover(clock.now()).is_none());

    clock.advance(Duration::seconds(60));
    let report = ctx.check_rollover(clock.now()).unwrap();
    assert_eq!(report.rollover.current, "2024-06-02");
    let request = report.final_request.unwrap();

    // Write into the new day while the final analysis runs.
    ctx.append_message("New day, new seeds", clock.now());
    let result = ctx.engine().analyze(&request);
    ctx.apply_analysis(&request, result, clock.now()).unwrap();

    let previous = ctx.store().find("2024-06-01").unwrap();
    assert_eq!(previous.title(), "Garden work");
    assert_eq!(ctx.current().date(), "2024-06-02");
    assert!(!ctx.current().has_summary());
    assert_eq!(ctx.current().user_message_count(), 1);
    assert_eq!(
        ctx.scheduler().counters(),
        AnalysisCounters::fresh(clock.now())
    );
}
