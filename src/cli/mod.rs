//! Command-line interface definitions.

use crate::constants::{APP_DESCRIPTION, APP_NAME};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments of the `daybook` binary.
#[derive(Parser, Debug)]
#[command(name = APP_NAME, author, version, about = APP_DESCRIPTION, long_about = None)]
pub struct CliArgs {
    /// Print debug logs to stderr
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Top-level commands. Without a command, an interactive session starts.
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Start an interactive writing session for today
    Session,
    /// Append a message to today's entry
    Write {
        /// Text to append; words are joined with spaces
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Analyze today's entry now, ignoring the thresholds
    Analyze,
    /// Show progress toward the next automatic analysis
    Status,
    /// List past entries, newest first
    History {
        /// Only show entries containing this text
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Show one entry in full
    Show {
        /// Date of the entry (YYYY-MM-DD or YYYYMMDD)
        date: String,
    },
    /// Show statistics and habit signals
    Insights,
    /// Get suggestions based on the last week
    Suggest,
    /// Manage the API key
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },
    /// View or change analysis settings
    Settings {
        /// New-character threshold for automatic analysis
        #[arg(long)]
        chars: Option<usize>,
        /// Time threshold for automatic analysis, in seconds
        #[arg(long)]
        time: Option<u64>,
        /// Enable or disable diagnostic mode
        #[arg(long)]
        test_mode: Option<bool>,
    },
    /// Write a diagnostic snapshot as JSON
    ExportDebug {
        /// Directory to write into (defaults to the current directory)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
    /// Delete every entry (diagnostic mode only)
    Clear {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum KeyAction {
    /// Store an API key (prompts when no value is given)
    Set {
        /// The key; avoid passing it on the command line where shell history is kept
        #[arg(long)]
        value: Option<String>,
    },
    /// Remove the stored API key
    Clear,
    /// Check the stored key against the API
    Check,
}

impl CliArgs {
    /// Parse command-line arguments
    pub fn parse() -> Self {
        <CliArgs as Parser>::parse()
    }

    /// The command to run; an interactive session when none was given.
    pub fn command(&self) -> &Command {
        self.command.as_ref().unwrap_or(&Command::Session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_session() {
        let args = CliArgs::parse_from(["daybook"]);
        assert!(!args.verbose);
        assert_eq!(args.command(), &Command::Session);
    }

    #[test]
    fn test_write_joins_words() {
        let args = CliArgs::parse_from(["daybook", "write", "hello", "there"]);
        assert_eq!(
            args.command(),
            &Command::Write {
                text: vec!["hello".to_string(), "there".to_string()]
            }
        );
        assert!(CliArgs::try_parse_from(["daybook", "write"]).is_err());
    }

    #[test]
    fn test_verbose_is_global() {
        let args = CliArgs::parse_from(["daybook", "status", "-v"]);
        assert!(args.verbose);
        let args = CliArgs::parse_from(["daybook", "--verbose", "insights"]);
        assert!(args.verbose);
        assert_eq!(args.command(), &Command::Insights);
    }

    #[test]
    fn test_settings_flags() {
        let args = CliArgs::parse_from([
            "daybook",
            "settings",
            "--chars",
            "500",
            "--test-mode",
            "true",
        ]);
        assert_eq!(
            args.command(),
            &Command::Settings {
                chars: Some(500),
                time: None,
                test_mode: Some(true)
            }
        );
        assert!(CliArgs::try_parse_from(["daybook", "settings", "--chars", "-3"]).is_err());
    }

    #[test]
    fn test_key_and_history() {
        let args = CliArgs::parse_from(["daybook", "key", "set", "--value", "sk-x"]);
        assert_eq!(
            args.command(),
            &Command::Key {
                action: KeyAction::Set {
                    value: Some("sk-x".to_string())
                }
            }
        );
        let args = CliArgs::parse_from(["daybook", "history", "-s", "beach"]);
        assert_eq!(
            args.command(),
            &Command::History {
                search: Some("beach".to_string())
            }
        );
        let args = CliArgs::parse_from(["daybook", "export-debug", "--dir", "/tmp"]);
        assert_eq!(
            args.command(),
            &Command::ExportDebug {
                dir: Some(PathBuf::from("/tmp"))
            }
        );
    }

    #[test]
    fn test_name_and_about_from_constants() {
        let cmd = <CliArgs as clap::CommandFactory>::command();
        assert_eq!(cmd.get_name(), APP_NAME);
        assert_eq!(
            cmd.get_about().map(|about| about.to_string()),
            Some(APP_DESCRIPTION.to_string())
        );
    }
}
