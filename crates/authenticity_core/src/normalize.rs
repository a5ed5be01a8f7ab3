//! crates/authenticity_core/src/normalize.rs
//!
//! Turns whatever a classifier returned into the canonical `AnalysisResult` shape.

use chrono::Utc;
use uuid::Uuid;

use crate::domain::{
    AnalysisResult, AnalysisSource, ClassifierOutput, SuspiciousSegment, UNTITLED_DOCUMENT,
};
use crate::ports::ProviderError;

/// Clamps scores and indices into their documented ranges.
///
/// A non-finite confidence cannot be repaired and is reported as a failed call.
pub fn normalize_output(
    output: ClassifierOutput,
    text_length: usize,
) -> Result<ClassifierOutput, ProviderError> {
    if !output.confidence_score.is_finite() {
        return Err(ProviderError::CallFailed(format!(
            "provider returned a non-finite confidence score ({})",
            output.confidence_score
        )));
    }

    let suspicious_segments = output
        .suspicious_segments
        .into_iter()
        .filter(|segment| segment.score.is_finite())
        .map(|segment| {
            let start_index = segment.start_index.min(text_length);
            let end_index = segment.end_index.clamp(start_index, text_length.max(start_index));
            SuspiciousSegment {
                text: segment.text,
                start_index,
                end_index,
                score: segment.score.clamp(0.0, 1.0),
            }
        })
        .collect();

    let reasoning = output
        .reasoning
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty());

    Ok(ClassifierOutput {
        classification: output.classification,
        confidence_score: output.confidence_score.clamp(0.0, 100.0),
        reasoning,
        suspicious_segments,
    })
}

pub fn resolve_title(title: Option<&str>) -> String {
    match title.map(str::trim) {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => UNTITLED_DOCUMENT.to_string(),
    }
}

/// Stamps a normalized output with a fresh id and completion time.
pub fn into_result(
    output: ClassifierOutput,
    title: String,
    text_length: usize,
    source: AnalysisSource,
) -> AnalysisResult {
    AnalysisResult {
        id: Uuid::new_v4().to_string(),
        title,
        created_at: Utc::now(),
        classification: output.classification,
        confidence_score: output.confidence_score,
        text_length,
        reasoning: output.reasoning,
        suspicious_segments: output.suspicious_segments,
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Classification;

    fn output(confidence: f64, segments: Vec<SuspiciousSegment>) -> ClassifierOutput {
        ClassifierOutput {
            classification: Classification::Ai,
            confidence_score: confidence,
            reasoning: Some("  ".to_string()),
            suspicious_segments: segments,
        }
    }

    fn seg(start: usize, end: usize, score: f64) -> SuspiciousSegment {
        SuspiciousSegment {
            text: "x".to_string(),
            start_index: start,
            end_index: end,
            score,
        }
    }

    #[test]
    fn clamps_out_of_range_values() {
        let normalized = normalize_output(
            output(140.0, vec![seg(20, 5, 1.7), seg(0, 500, -0.2), seg(1, 2, f64::NAN)]),
            50,
        )
        .unwrap();

        assert_eq!(normalized.confidence_score, 100.0);
        assert_eq!(normalized.reasoning, None);
        assert_eq!(normalized.suspicious_segments.len(), 2);

        let first = &normalized.suspicious_segments[0];
        assert_eq!((first.start_index, first.end_index), (20, 20));
        assert_eq!(first.score, 1.0);

        let second = &normalized.suspicious_segments[1];
        assert_eq!((second.start_index, second.end_index), (0, 50));
        assert_eq!(second.score, 0.0);
    }

    #[test]
    fn rejects_non_finite_confidence() {
        let err = normalize_output(output(f64::INFINITY, vec![]), 10).unwrap_err();
        assert!(matches!(err, ProviderError::CallFailed(_)));
    }

    #[test]
    fn blank_title_becomes_placeholder() {
        assert_eq!(resolve_title(None), UNTITLED_DOCUMENT);
        assert_eq!(resolve_title(Some("   ")), UNTITLED_DOCUMENT);
        assert_eq!(resolve_title(Some(" Essay ")), "Essay");
    }

    #[test]
    fn fresh_results_get_distinct_ids() {
        let a = into_result(output(80.0, vec![]), "a".into(), 3, AnalysisSource::Provider);
        let b = into_result(output(80.0, vec![]), "b".into(), 3, AnalysisSource::Provider);
        assert_ne!(a.id, b.id);
    }
}
