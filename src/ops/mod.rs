//! User-facing operations over stored entries.
//!
//! These are the read-side features of daybook: rendering history, computing
//! insights, generating suggestions and exporting a diagnostic snapshot.

pub mod debug_export;
pub mod history;
pub mod insights;
pub mod suggest;

pub use debug_export::{debug_snapshot, export_debug};
pub use history::{history_line, render_entry};
pub use insights::{compute as compute_insights, Insights};
pub use suggest::{suggest, Suggestion};
