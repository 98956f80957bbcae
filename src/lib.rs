/*!
# Daybook

Daybook is a journaling client that keeps one entry per calendar day and
analyzes it automatically. An entry is a list of messages; analysis derives a
title, a short summary, and up to four emotion and four theme tags from closed
vocabularies.

## Core Features

- Append messages to today's entry from the command line or an interactive session
- Automatic analysis once enough new text is written or enough time has passed
- Remote analysis through an OpenAI-compatible API, with an offline keyword fallback
- Day rollover with a final analysis of the previous day's entry
- History, search, insights and personalized suggestions
- Diagnostic JSON export with the API key masked

## Architecture

- `storage`: key/value blob persistence (file-backed and in-memory)
- `journal`: the `Entry` model and the `EntryStore`
- `analysis`: vocabularies, fallback analyzer, response cleanup and the engine
- `ai`: the OpenAI-compatible client and prompt builders
- `scheduler`: analysis counters, trigger decisions, periodic tasks and clocks
- `rollover`: calendar-day change detection
- `app`: the `AppContext` tying everything together
- `session`: the interactive tokio loop
- `ops`: history rendering, insights, suggestions and debug export
- `cli`, `config`, `logging`, `errors`, `constants`: ambient plumbing

## Usage Example

```rust,no_run
use chrono::Utc;
use daybook::app::AppContext;
use daybook::storage::{BlobStore, FileBlobStore};
use daybook::Config;
use std::sync::Arc;

fn main() -> daybook::AppResult<()> {
    let config = Config::load()?;
    let blobs: Arc<dyn BlobStore> = Arc::new(FileBlobStore::open(&config.data_dir)?);
    let mut ctx = AppContext::open(config, blobs, Utc::now());

    ctx.append_message("Walked to the lighthouse this morning.", Utc::now());
    ctx.save(Utc::now());
    Ok(())
}
```
*/

/// OpenAI-compatible client and prompts
pub mod ai;
/// Entry analysis
pub mod analysis;
/// Application context
pub mod app;
/// Command-line interface for parsing and handling user arguments
pub mod cli;
/// Configuration loading and management
pub mod config;
/// Application-wide constants
pub mod constants;
/// Error types and utilities for error handling
pub mod errors;
/// Entry model and storage
pub mod journal;
/// Tracing subscriber setup
pub mod logging;
/// Read-side operations
pub mod ops;
/// Day boundary detection
pub mod rollover;
/// Automatic analysis scheduling
pub mod scheduler;
/// Interactive session loop
pub mod session;
/// Blob persistence
pub mod storage;

// Re-export important types for convenience
pub use app::AppContext;
pub use cli::CliArgs;
pub use config::{Config, Settings};
pub use errors::{AppError, AppResult};
pub use journal::{Entry, EntryStore};
