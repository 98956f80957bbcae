//! Constants used throughout the application.
//!
//! This module contains all constants used in the Daybook application, organized
//! into logical groups. Having constants centralized makes them easier to find,
//! modify, and reference consistently.

// Application Metadata
/// The name of the application.
pub const APP_NAME: &str = "daybook";
/// The description of the application used in CLI help text.
pub const APP_DESCRIPTION: &str = "A journaling client with automatic mood and theme analysis";

// Logging
/// Log format identifier for plain text.
pub const LOG_FORMAT_TEXT: &str = "text";
/// Log format identifier for JSON.
pub const LOG_FORMAT_JSON: &str = "json";
/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";
/// Service name used in tracing spans and structured logs.
pub const TRACING_SERVICE_NAME: &str = "daybook";
/// Name for the root tracing span covering an application invocation.
pub const TRACING_ROOT_SPAN_NAME: &str = "app_invocation";

// Environment Variables
/// Environment variable for the data directory holding the blob store.
pub const ENV_VAR_DAYBOOK_DIR: &str = "DAYBOOK_DIR";
/// Environment variable overriding the OpenAI-compatible API base URL.
pub const ENV_VAR_DAYBOOK_API_BASE: &str = "DAYBOOK_API_BASE";
/// Environment variable overriding the chat model.
pub const ENV_VAR_DAYBOOK_MODEL: &str = "DAYBOOK_MODEL";
/// Environment variable selecting the log format (`text` or `json`).
pub const ENV_VAR_DAYBOOK_LOG_FORMAT: &str = "DAYBOOK_LOG_FORMAT";
/// Environment variable selecting the log level when `RUST_LOG` is unset.
pub const ENV_VAR_DAYBOOK_LOG_LEVEL: &str = "DAYBOOK_LOG_LEVEL";
/// Standard environment variable for the user's home directory.
pub const ENV_VAR_HOME: &str = "HOME";
/// Default data directory, relative to the home directory.
pub const DEFAULT_DATA_SUBDIR: &str = ".daybook";
/// Placeholder string for redacted information in debug output.
pub const REDACTED_PLACEHOLDER: &str = "[REDACTED]";

// Blob Store Keys
/// Blob holding the JSON mapping of date key to entry.
pub const KEY_DIARY_ENTRIES: &str = "diary_entries";
/// Blob holding the API credential.
pub const KEY_API_KEY: &str = "openai_api_key";
/// Blob holding the character threshold for automatic analysis.
pub const KEY_AUTO_ANALYSIS_CHARS: &str = "auto_analysis_chars";
/// Blob holding the time threshold for automatic analysis, in seconds.
pub const KEY_AUTO_ANALYSIS_TIME: &str = "auto_analysis_time";
/// Blob holding the diagnostic mode flag.
pub const KEY_TEST_MODE: &str = "test_mode";
/// Blob holding the persisted analysis counters.
pub const KEY_ANALYSIS_COUNTERS: &str = "analysis_counters";

// Analysis Thresholds
/// Default number of new characters that triggers an analysis.
pub const DEFAULT_CHAR_THRESHOLD: usize = 750;
/// Default number of seconds since the last analysis that triggers one.
pub const DEFAULT_TIME_THRESHOLD_SECS: i64 = 600;
/// Counters older than this (or in the future) are treated as corrupted.
pub const MAX_COUNTER_AGE_MS: i64 = 24 * 60 * 60 * 1000;
/// Maximum number of emotion or theme tags on an entry.
pub const MAX_TAGS: usize = 4;

// Periodic Tasks
/// Period of the analysis trigger check.
pub const ANALYSIS_TICK_SECS: i64 = 30;
/// Period of the unsaved-changes sweep.
pub const SAVE_SWEEP_SECS: i64 = 30;
/// Period of the calendar-day rollover check.
pub const ROLLOVER_CHECK_SECS: i64 = 60;
/// Period of the display-only progress refresh.
pub const DISPLAY_REFRESH_SECS: i64 = 1;
/// An input pause longer than this is treated as the application regaining focus.
pub const RESUME_GAP_SECS: i64 = 300;

// Remote API
/// Default base URL for the OpenAI-compatible API.
pub const DEFAULT_API_BASE_URL: &str = "https://api.openai.com";
/// Default chat model.
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o";
/// Token budget for an entry analysis.
pub const ANALYSIS_MAX_TOKENS: u32 = 500;
/// Token budget for suggestion generation.
pub const SUGGESTION_MAX_TOKENS: u32 = 400;
/// Sampling temperature for all completions.
pub const COMPLETION_TEMPERATURE: f32 = 0.7;
/// Timeout for a single HTTP request.
pub const HTTP_TIMEOUT_SECS: u64 = 60;
/// Number of characters of the credential kept when masking it.
pub const API_KEY_MASK_PREFIX_LEN: usize = 10;

// Date/Time Logic
/// Date format string for ISO date format (YYYY-MM-DD).
pub const DATE_FORMAT_ISO: &str = "%Y-%m-%d";
/// Date format string for compact date format (YYYYMMDD).
pub const DATE_FORMAT_COMPACT: &str = "%Y%m%d";
/// Number of days covered by trend and suggestion windows.
pub const RECENT_WINDOW_DAYS: i64 = 7;
/// File name prefix of the diagnostic export.
pub const DEBUG_EXPORT_PREFIX: &str = "daybook-debug-";
