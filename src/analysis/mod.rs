//! Entry analysis: title, summary and tags derived from an entry's text.
//!
//! - `vocabulary`: the closed emotion and theme tag lists
//! - `fallback`: deterministic keyword analyzer
//! - `response`: cleanup of raw model output
//! - `engine`: remote call with sanitization and fallback

pub mod engine;
pub mod fallback;
pub mod response;
pub mod vocabulary;

pub use engine::{AnalysisEngine, AnalysisOutcome, AnalysisRequest, AnalysisSource};

use crate::constants::MAX_TAGS;
use crate::errors::AnalysisError;
use serde::{Deserialize, Serialize};

/// Derived fields written into an entry by a completed analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analysis {
    pub title: String,
    pub summary: String,
    pub emotions: Vec<String>,
    pub themes: Vec<String>,
}

impl Analysis {
    /// Checks the invariants an analysis must satisfy before it is applied.
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::AnalysisFailed` if the title is empty, a tag list
    /// holds more than four tags, or a tag is outside its vocabulary.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.title.trim().is_empty() {
            return Err(AnalysisError::AnalysisFailed("empty title".to_string()));
        }
        if self.emotions.len() > MAX_TAGS || self.themes.len() > MAX_TAGS {
            return Err(AnalysisError::AnalysisFailed(format!(
                "too many tags ({} emotions, {} themes)",
                self.emotions.len(),
                self.themes.len()
            )));
        }
        if let Some(tag) = self.emotions.iter().find(|t| !vocabulary::is_emotion(t)) {
            return Err(AnalysisError::AnalysisFailed(format!(
                "unknown emotion tag '{}'",
                tag
            )));
        }
        if let Some(tag) = self.themes.iter().find(|t| !vocabulary::is_theme(t)) {
            return Err(AnalysisError::AnalysisFailed(format!(
                "unknown theme tag '{}'",
                tag
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Analysis {
        Analysis {
            title: "Calm day".to_string(),
            summary: "A quiet day.".to_string(),
            emotions: vec!["calm".to_string()],
            themes: vec!["routine".to_string()],
        }
    }

    #[test]
    fn test_validate_accepts_vocabulary_tags() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_title() {
        let analysis = Analysis {
            title: "  ".to_string(),
            ..sample()
        };
        assert!(matches!(
            analysis.validate(),
            Err(AnalysisError::AnalysisFailed(_))
        ));
    }

    #[test]
    fn test_validate_rejects_unknown_tags() {
        let analysis = Analysis {
            emotions: vec!["ecstatic".to_string()],
            ..sample()
        };
        assert_eq!(
            analysis.validate(),
            Err(AnalysisError::AnalysisFailed(
                "unknown emotion tag 'ecstatic'".to_string()
            ))
        );
    }

    #[test]
    fn test_validate_rejects_too_many_tags() {
        let analysis = Analysis {
            themes: ["work", "time", "plans", "travel", "money"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            ..sample()
        };
        assert!(analysis.validate().is_err());
    }
}
