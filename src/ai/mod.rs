//! Remote language-model access.
//!
//! # Module Structure
//!
//! - `openai`: HTTP client for OpenAI-compatible chat completion APIs
//! - `prompts`: prompt builders for analysis and suggestions
//!
//! # Example
//!
//! ```no_run
//! use daybook::ai::{CompletionBackend, OpenAiClient};
//!
//! let client = OpenAiClient::new("https://api.openai.com", "sk-...", "gpt-4o");
//! let reply = client.complete("Say hello", 50)?;
//! # Ok::<(), daybook::AppError>(())
//! ```

pub mod openai;
pub mod prompts;

pub use openai::{ChatMessage, CompletionBackend, OpenAiClient};
pub use prompts::{analysis_prompt, suggestion_prompt};
