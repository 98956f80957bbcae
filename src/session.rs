//! The interactive writing session.
//!
//! A session reads lines from an input stream and appends them to today's
//! entry. Lines starting with `/` are commands. A single one-second heartbeat
//! drives the periodic tasks (progress refresh, analysis trigger, save sweep,
//! day rollover) against an injectable [`Clock`]. Analyses run on the blocking
//! pool and report back over a channel, so typing is never blocked by the
//! network.
//!
//! [`Session`] holds the synchronous state machine; [`run_loop`] wires it to
//! tokio. Tests drive [`Session`] directly with a manual clock.

use crate::analysis::{AnalysisEngine, AnalysisOutcome, AnalysisRequest, AnalysisSource};
use crate::app::{AppContext, ANALYZING_INDICATOR};
use crate::constants::RESUME_GAP_SECS;
use crate::errors::{AnalysisError, AppResult};
use crate::scheduler::clock::Clock;
use crate::scheduler::tasks::{PeriodicTasks, Task};
use crate::scheduler::{Progress, SkipReason};
use chrono::{DateTime, Duration, Utc};
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tokio_stream::wrappers::LinesStream;
use tokio_stream::StreamExt;
use tracing::{debug, info, warn};

const HELP: &str = "Commands:
  /analyze  analyze today's entry now
  /status   show progress toward the next automatic analysis
  /help     show this help
  /quit     save and exit (Ctrl-D works too)";

/// Whether the session should keep reading input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

/// An analysis result delivered back to the session.
pub type AnalysisResult = (AnalysisRequest, Result<AnalysisOutcome, AnalysisError>);

/// State of a running session.
pub struct Session {
    ctx: AppContext,
    tasks: PeriodicTasks,
    last_input: DateTime<Utc>,
    progress: Option<Progress>,
}

impl Session {
    pub fn new(ctx: AppContext, now: DateTime<Utc>) -> Self {
        Self {
            ctx,
            tasks: PeriodicTasks::new(now),
            last_input: now,
            progress: None,
        }
    }

    pub fn context(&self) -> &AppContext {
        &self.ctx
    }

    pub fn into_context(self) -> AppContext {
        self.ctx
    }

    /// Prints the greeting and runs the startup checks.
    pub fn start<W: Write>(
        &mut self,
        now: DateTime<Utc>,
        out: &mut W,
    ) -> AppResult<Vec<AnalysisRequest>> {
        let current = self.ctx.current();
        writeln!(out, "Writing in {}. Type /help for commands.", current.date())?;
        if current.has_messages() {
            writeln!(
                out,
                "Continuing today's entry ({} messages so far).",
                current.user_message_count()
            )?;
        }
        if !self.ctx.settings().has_api_key() {
            writeln!(
                out,
                "No API key configured: automatic analysis is off. Run `daybook key set` to enable it."
            )?;
        }
        self.resume(now, out)
    }

    /// Runs every periodic task that is due.
    pub fn heartbeat<W: Write>(
        &mut self,
        now: DateTime<Utc>,
        out: &mut W,
    ) -> AppResult<Vec<AnalysisRequest>> {
        let mut requests = Vec::new();
        for task in self.tasks.due(now) {
            self.run_task(task, now, out, &mut requests)?;
        }
        Ok(requests)
    }

    /// Handles one line of input.
    ///
    /// A line arriving after a long pause first runs the rollover and
    /// analysis checks, so text typed after midnight lands in the new day.
    pub fn handle_line<W: Write>(
        &mut self,
        line: &str,
        now: DateTime<Utc>,
        out: &mut W,
    ) -> AppResult<(Control, Vec<AnalysisRequest>)> {
        let mut requests = Vec::new();
        if now - self.last_input > Duration::seconds(RESUME_GAP_SECS) {
            debug!("Resuming after {}s idle", (now - self.last_input).num_seconds());
            requests.extend(self.resume(now, out)?);
        }
        self.last_input = now;

        let line = line.trim();
        let control = match line {
            "" => Control::Continue,
            "/quit" | "/exit" => Control::Quit,
            "/help" => {
                writeln!(out, "{}", HELP)?;
                Control::Continue
            }
            "/status" => {
                let progress = self.progress.unwrap_or_else(|| self.ctx.progress(now));
                writeln!(out, "{}", format_status(&progress, self.ctx.skip_reason()))?;
                Control::Continue
            }
            "/analyze" => {
                match self.ctx.prepare_analysis(now) {
                    Ok(Some(request)) => requests.push(request),
                    Ok(None) => writeln!(out, "An analysis is already running.")?,
                    Err(e) => writeln!(out, "{}", e)?,
                }
                Control::Continue
            }
            command if command.starts_with('/') => {
                writeln!(out, "Unknown command {}. Type /help for commands.", command)?;
                Control::Continue
            }
            text => {
                self.ctx.append_message(text, now);
                Control::Continue
            }
        };

        self.announce(&requests, now, out)?;
        Ok((control, requests))
    }

    /// Applies a finished analysis and reports it.
    pub fn finish_analysis<W: Write>(
        &mut self,
        request: &AnalysisRequest,
        result: Result<AnalysisOutcome, AnalysisError>,
        now: DateTime<Utc>,
        out: &mut W,
    ) -> AppResult<()> {
        match self.ctx.apply_analysis(request, result, now) {
            Ok(outcome) => {
                if request.date != self.ctx.current().date() {
                    writeln!(out, "Analysis of {} finished:", request.date)?;
                }
                write_outcome(out, &outcome)?;
            }
            Err(e) if e.is_benign() => writeln!(out, "{}", e)?,
            Err(e) => writeln!(out, "Analysis failed: {}", e)?,
        }
        Ok(())
    }

    /// Saves everything before exit. An analysis still running is abandoned.
    pub fn shutdown(&mut self, now: DateTime<Utc>) {
        if self.ctx.scheduler().is_in_flight() {
            info!("Exiting with an analysis in flight; its result is discarded");
        }
        self.ctx.shutdown(now);
    }

    fn resume<W: Write>(
        &mut self,
        now: DateTime<Utc>,
        out: &mut W,
    ) -> AppResult<Vec<AnalysisRequest>> {
        let mut requests = Vec::new();
        self.run_task(Task::RolloverCheck, now, out, &mut requests)?;
        self.run_task(Task::AnalysisTick, now, out, &mut requests)?;
        Ok(requests)
    }

    fn run_task<W: Write>(
        &mut self,
        task: Task,
        now: DateTime<Utc>,
        out: &mut W,
        requests: &mut Vec<AnalysisRequest>,
    ) -> AppResult<()> {
        match task {
            Task::DisplayRefresh => {
                self.progress = Some(self.ctx.progress(now));
            }
            Task::SaveSweep => {
                self.ctx.save_sweep(now);
            }
            Task::AnalysisTick => {
                if let Some(request) = self.ctx.analysis_tick(now).request {
                    self.announce(std::slice::from_ref(&request), now, out)?;
                    requests.push(request);
                }
            }
            Task::RolloverCheck => {
                if let Some(report) = self.ctx.check_rollover(now) {
                    writeln!(
                        out,
                        "A new day has started ({}). {} is saved.",
                        report.rollover.current, report.rollover.previous
                    )?;
                    if let Some(request) = report.final_request {
                        writeln!(out, "Running a final analysis of {}...", request.date)?;
                        requests.push(request);
                    }
                    self.progress = None;
                }
            }
        }
        Ok(())
    }

    fn announce<W: Write>(
        &mut self,
        requests: &[AnalysisRequest],
        now: DateTime<Utc>,
        out: &mut W,
    ) -> AppResult<()> {
        let current_date = self.ctx.current().date().to_string();
        if requests.iter().any(|r| r.date == current_date) {
            self.ctx.show_analyzing(now);
            writeln!(out, "{}", ANALYZING_INDICATOR)?;
        }
        Ok(())
    }
}

/// Prints an analysis the way the session and the `analyze` command show it.
pub fn write_outcome<W: Write>(out: &mut W, outcome: &AnalysisOutcome) -> std::io::Result<()> {
    let analysis = &outcome.analysis;
    match outcome.source {
        AnalysisSource::Remote => writeln!(out, "{}", analysis.title)?,
        AnalysisSource::Fallback => writeln!(out, "{} (offline analysis)", analysis.title)?,
    }
    writeln!(out, "  {}", analysis.summary)?;
    writeln!(out, "  Emotions: {}", analysis.emotions.join(", "))?;
    writeln!(out, "  Themes:   {}", analysis.themes.join(", "))
}

/// Human-readable progress toward the next automatic analysis.
pub fn format_status(progress: &Progress, skip: Option<SkipReason>) -> String {
    match skip {
        Some(SkipReason::NoCredential) => {
            "Automatic analysis is off: no API key configured.".to_string()
        }
        Some(SkipReason::NoContent) => "Nothing written today yet.".to_string(),
        None if progress.ready => format!(
            "{} new characters, {}s since the last analysis. Analysis is due.",
            progress.new_chars,
            progress.elapsed.num_seconds()
        ),
        None => format!(
            "{} new characters ({} until next analysis), {}s since the last analysis ({}s until next).",
            progress.new_chars,
            progress.chars_until_next,
            progress.elapsed.num_seconds(),
            progress.time_until_next.num_seconds()
        ),
    }
}

fn dispatch(
    engine: &AnalysisEngine,
    requests: Vec<AnalysisRequest>,
    results: &mpsc::UnboundedSender<AnalysisResult>,
) {
    for request in requests {
        let engine = engine.clone();
        let results = results.clone();
        tokio::task::spawn_blocking(move || {
            let result = engine.analyze(&request);
            if results.send((request, result)).is_err() {
                debug!("Session ended before the analysis finished");
            }
        });
    }
}

/// Runs a session until end of input, `/quit` or Ctrl-C.
///
/// # Arguments
///
/// * `session` - The session state
/// * `clock` - Time source for every periodic decision
/// * `input` - Line-oriented user input, usually stdin
/// * `out` - Where prompts and results are written, usually stdout
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub async fn run_loop<R, W>(
    session: &mut Session,
    clock: Arc<dyn Clock>,
    input: R,
    out: &mut W,
) -> AppResult<()>
where
    R: AsyncRead + Unpin,
    W: Write,
{
    let (results_tx, mut results_rx) = mpsc::unbounded_channel::<AnalysisResult>();
    let mut lines = LinesStream::new(BufReader::new(input).lines());
    let mut heartbeat = interval(std::time::Duration::from_secs(1));
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let requests = session.start(clock.now(), out)?;
    dispatch(&session.context().engine(), requests, &results_tx);
    out.flush()?;

    loop {
        tokio::select! {
            _ = heartbeat.tick() => {
                let requests = session.heartbeat(clock.now(), out)?;
                dispatch(&session.context().engine(), requests, &results_tx);
            }
            line = lines.next() => match line {
                Some(Ok(line)) => {
                    let (control, requests) = session.handle_line(&line, clock.now(), out)?;
                    dispatch(&session.context().engine(), requests, &results_tx);
                    if control == Control::Quit {
                        break;
                    }
                }
                Some(Err(e)) => {
                    warn!("Failed to read input: {}", e);
                    break;
                }
                None => {
                    debug!("End of input");
                    break;
                }
            },
            Some((request, result)) = results_rx.recv() => {
                session.finish_analysis(&request, result, clock.now(), out)?;
            }
            _ = &mut ctrl_c => {
                writeln!(out)?;
                break;
            }
        }
        out.flush()?;
    }

    session.shutdown(clock.now());
    writeln!(out, "Saved. See you tomorrow.")?;
    out.flush()?;
    Ok(())
}
