//! crates/authenticity_core/src/report.rs
//!
//! Display helpers shared by the result and history views.

use crate::domain::{AnalysisResult, SuspiciousSegment};

/// Rough word count, assuming five characters per word.
pub fn estimated_words(text_length: usize) -> usize {
    (text_length as f64 / 5.0).round() as usize
}

/// Segment score as a whole percentage.
pub fn segment_percent(segment: &SuspiciousSegment) -> u32 {
    (segment.score * 100.0).round() as u32
}

/// Plain-text summary the user can share from the results screen.
pub fn share_summary(result: &AnalysisResult) -> String {
    format!(
        "AI-Check Analysis Results:\n\
         Document: {}\n\
         Classification: {}\n\
         Confidence Score: {:.1}%\n\
         Date: {}\n",
        result.title,
        result.classification.display_label(),
        result.confidence_score,
        result.created_at.format("%b %-d, %Y"),
    )
}
