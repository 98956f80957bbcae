/*!
# Daybook - A Journaling Client with Automatic Analysis

Daybook keeps one journal entry per calendar day. Text is appended as
messages, and each entry is periodically analyzed into a title, a summary and
emotion and theme tags, either by an OpenAI-compatible model or, when the
remote call fails, by an offline keyword analyzer.

## Usage

```
daybook [OPTIONS] [COMMAND]

Commands:
  session       Start an interactive writing session for today (default)
  write         Append a message to today's entry
  analyze       Analyze today's entry now, ignoring the thresholds
  status        Show progress toward the next automatic analysis
  history       List past entries, newest first
  show          Show one entry in full
  insights      Show statistics and habit signals
  suggest       Get suggestions based on the last week
  key           Manage the API key
  settings      View or change analysis settings
  export-debug  Write a diagnostic snapshot as JSON
  clear         Delete every entry (diagnostic mode only)
```

## Configuration

- `DAYBOOK_DIR`: Where entries and settings are stored (defaults to `~/.daybook`)
- `DAYBOOK_API_BASE`: Base URL of the OpenAI-compatible API
- `DAYBOOK_MODEL`: Chat model name
- `DAYBOOK_LOG_FORMAT`: `text` (default) or `json`
- `DAYBOOK_LOG_LEVEL`: Log level when `RUST_LOG` is unset (defaults to `info`)
*/

use chrono::{DateTime, Utc};
use daybook::ai::OpenAiClient;
use daybook::app::AppContext;
use daybook::cli::{CliArgs, Command, KeyAction};
use daybook::config::Config;
use daybook::constants::{TRACING_ROOT_SPAN_NAME, TRACING_SERVICE_NAME};
use daybook::errors::{AppError, AppResult};
use daybook::journal::{date_key, parse_date};
use daybook::logging::{init_logging, LogSettings};
use daybook::ops::insights::mood_label;
use daybook::ops::{compute_insights, export_debug, history_line, render_entry, suggest};
use daybook::scheduler::clock::SystemClock;
use daybook::session::{format_status, run_loop, write_outcome, Session};
use daybook::storage::{BlobStore, FileBlobStore};
use std::env;
use std::io::{self, Write};
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, info_span};
use uuid::Uuid;

/// The main entry point for the daybook application.
///
/// Parses arguments, installs logging, and runs the selected command inside a
/// root span carrying a per-invocation correlation id. Errors are logged once
/// here and reported on stderr with a non-zero exit code.
fn main() {
    let args = CliArgs::parse();

    let log_settings = match LogSettings::from_env(args.verbose) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };
    if let Err(e) = init_logging(&log_settings) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    let correlation_id = Uuid::new_v4();
    let root_span = info_span!(
        TRACING_ROOT_SPAN_NAME,
        service_name = TRACING_SERVICE_NAME,
        correlation_id = %correlation_id
    );
    let _guard = root_span.enter();
    debug!("CLI arguments: {:?}", args);

    if let Err(e) = run(&args) {
        error!("{}", e);
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(args: &CliArgs) -> AppResult<()> {
    let config = Config::load()?;
    let blobs: Arc<dyn BlobStore> = Arc::new(FileBlobStore::open(&config.data_dir)?);
    let now = Utc::now();
    let mut ctx = AppContext::open(config, blobs, now);
    let mut out = io::stdout();

    match args.command() {
        Command::Session => run_session(ctx, now),
        Command::Write { text } => write_message(&mut ctx, &text.join(" "), now, &mut out),
        Command::Analyze => analyze_now(&mut ctx, now, &mut out),
        Command::Status => show_status(&ctx, now, &mut out),
        Command::History { search } => {
            let entries = match search {
                Some(query) => ctx.store().search(query),
                None => ctx.store().history(),
            };
            if entries.is_empty() {
                writeln!(out, "No entries yet.")?;
            }
            for entry in entries {
                writeln!(out, "{}", history_line(entry))?;
            }
            Ok(())
        }
        Command::Show { date } => {
            let date = parse_date(date)
                .map_err(|e| AppError::Journal(format!("Invalid date format: {}", e)))?;
            let key = date_key(date);
            let entry = ctx
                .store()
                .find(&key)
                .ok_or_else(|| AppError::Journal(format!("No entry for {}", key)))?;
            write!(out, "{}", render_entry(entry))?;
            Ok(())
        }
        Command::Insights => {
            let insights = compute_insights(ctx.store().entries(), now.date_naive());
            writeln!(out, "{}", insights)?;
            Ok(())
        }
        Command::Suggest => {
            let backend = ctx.completion_backend();
            for suggestion in suggest(backend.as_deref(), ctx.store().entries(), now.date_naive())
            {
                writeln!(out, "{}", suggestion)?;
            }
            Ok(())
        }
        Command::Key { action } => manage_key(&mut ctx, action, &mut out),
        Command::Settings {
            chars,
            time,
            test_mode,
        } => {
            let (settings, blobs) = ctx.settings_mut();
            if chars.is_some() || time.is_some() {
                settings.set_thresholds(blobs, *chars, *time)?;
            }
            if let Some(enabled) = test_mode {
                settings.set_test_mode(blobs, *enabled)?;
            }
            let settings = ctx.settings();
            writeln!(
                out,
                "Analyze after {} new characters or {} seconds.",
                settings.analysis.char_threshold,
                settings.analysis.time_threshold.num_seconds()
            )?;
            writeln!(
                out,
                "Test mode: {}",
                if settings.test_mode { "on" } else { "off" }
            )?;
            Ok(())
        }
        Command::ExportDebug { dir } => {
            let dir = match dir {
                Some(dir) => dir.clone(),
                None => env::current_dir()?,
            };
            let path = export_debug(&ctx, &dir, now)?;
            writeln!(out, "Debug snapshot written to {}", path.display())?;
            Ok(())
        }
        Command::Clear { yes } => {
            if !yes {
                return Err(AppError::Config(
                    "Refusing to delete entries without --yes".to_string(),
                ));
            }
            ctx.clear_all(now)?;
            writeln!(out, "All entries deleted.")?;
            Ok(())
        }
    }
}

fn run_session(ctx: AppContext, now: DateTime<Utc>) -> AppResult<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let mut session = Session::new(ctx, now);
    let mut out = io::stdout();
    let result = runtime.block_on(run_loop(
        &mut session,
        Arc::new(SystemClock),
        tokio::io::stdin(),
        &mut out,
    ));
    // Do not wait for an analysis still running on the blocking pool.
    runtime.shutdown_timeout(Duration::from_millis(500));
    result
}

/// Appends a message, saves, and runs an analysis if a threshold is reached.
fn write_message<W: Write>(
    ctx: &mut AppContext,
    text: &str,
    now: DateTime<Utc>,
    out: &mut W,
) -> AppResult<()> {
    if !ctx.append_message(text, now) {
        return Err(AppError::Journal("Nothing to write".to_string()));
    }
    ctx.save(now);
    info!("Appended message to {}", ctx.current().date());

    if let Some(request) = ctx.analysis_tick(now).request {
        let result = ctx.engine().analyze(&request);
        match ctx.apply_analysis(&request, result, Utc::now()) {
            Ok(outcome) => write_outcome(out, &outcome)?,
            Err(e) => writeln!(out, "Analysis failed: {}", e)?,
        }
    }
    ctx.shutdown(Utc::now());
    Ok(())
}

fn analyze_now<W: Write>(ctx: &mut AppContext, now: DateTime<Utc>, out: &mut W) -> AppResult<()> {
    match ctx.run_analysis(now) {
        Ok(outcome) => {
            write_outcome(out, &outcome)?;
            Ok(())
        }
        Err(e) if e.is_benign() => {
            writeln!(out, "{}", e)?;
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn show_status<W: Write>(ctx: &AppContext, now: DateTime<Utc>, out: &mut W) -> AppResult<()> {
    let current = ctx.current();
    writeln!(out, "Today: {}", current.date())?;
    writeln!(
        out,
        "Messages: {} ({} characters)",
        current.user_message_count(),
        current.total_user_chars()
    )?;
    if current.has_summary() {
        writeln!(out, "Title: {}", current.title())?;
        writeln!(out, "Summary: {}", current.summary())?;
        writeln!(out, "Emotions: {}", current.emotions().join(", "))?;
        writeln!(out, "Themes: {}", current.themes().join(", "))?;
        if let Some(dominant) = current.emotions().first() {
            writeln!(out, "Mood: {}", mood_label(dominant))?;
        }
    }
    match ctx.settings().masked_api_key() {
        Some(masked) => writeln!(out, "API key: {}", masked)?,
        None => writeln!(out, "API key: not configured")?,
    }
    writeln!(
        out,
        "{}",
        format_status(&ctx.progress(now), ctx.skip_reason())
    )?;
    Ok(())
}

fn manage_key<W: Write>(ctx: &mut AppContext, action: &KeyAction, out: &mut W) -> AppResult<()> {
    match action {
        KeyAction::Set { value } => {
            let key = match value {
                Some(value) => value.clone(),
                None => rpassword::prompt_password("OpenAI API key: ")?,
            };
            let (settings, blobs) = ctx.settings_mut();
            settings.set_api_key(blobs, &key)?;
            if let Some(masked) = ctx.settings().masked_api_key() {
                writeln!(out, "API key saved ({}).", masked)?;
            }
        }
        KeyAction::Clear => {
            let (settings, blobs) = ctx.settings_mut();
            settings.clear_api_key(blobs)?;
            writeln!(out, "API key removed.")?;
        }
        KeyAction::Check => {
            let key = ctx
                .settings()
                .api_key()
                .ok_or_else(|| AppError::Config("No API key configured".to_string()))?;
            let config = ctx.config();
            let client = OpenAiClient::new(config.api_base.clone(), key, config.model.clone());
            if client.validate_key()? {
                writeln!(out, "API key is valid.")?;
            } else {
                writeln!(out, "API key was rejected.")?;
            }
        }
    }
    Ok(())
}
