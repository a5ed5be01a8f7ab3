//! crates/authenticity_core/src/mock.rs
//!
//! The local stand-in used whenever the classification provider is unavailable.
//! Results are random within fixed per-class ranges and always carry
//! `MOCK_REASONING` so they can be told apart from real provider output.

use rand::Rng;
use std::time::Duration;

use crate::domain::{Classification, ClassifierOutput, SuspiciousSegment};

pub const MOCK_REASONING: &str =
    "Mock analysis - the classification service is unavailable, this result was generated locally for demonstration only";

/// Number of leading characters covered by the single mock segment.
const SEGMENT_CHARS: usize = 100;

pub const DEFAULT_MOCK_DELAY: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone)]
pub struct MockGenerator {
    delay: Duration,
}

impl Default for MockGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_MOCK_DELAY)
    }
}

impl MockGenerator {
    /// Creates a generator that waits `delay` before answering, to mimic a network call.
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn instant() -> Self {
        Self::new(Duration::ZERO)
    }

    pub async fn generate(&self, text: &str) -> ClassifierOutput {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        sample(text, &mut rand::thread_rng())
    }
}

fn confidence_range(classification: Classification) -> std::ops::Range<f64> {
    match classification {
        Classification::Human => 70.0..95.0,
        Classification::Ai => 75.0..95.0,
        Classification::Mixed => 60.0..90.0,
    }
}

/// Draws one mock result for `text` from `rng`.
pub fn sample<R: Rng + ?Sized>(text: &str, rng: &mut R) -> ClassifierOutput {
    let classification = Classification::ALL[rng.gen_range(0..Classification::ALL.len())];
    let confidence_score = rng.gen_range(confidence_range(classification));

    let suspicious_segments = if classification == Classification::Human {
        Vec::new()
    } else {
        let char_count = text.chars().count();
        let head: String = text.chars().take(SEGMENT_CHARS).collect();
        let text = if char_count > SEGMENT_CHARS {
            format!("{head}...")
        } else {
            head
        };
        vec![SuspiciousSegment {
            text,
            start_index: 0,
            end_index: char_count.min(SEGMENT_CHARS),
            score: rng.gen_range(0.70..0.95),
        }]
    };

    ClassifierOutput {
        classification,
        confidence_score,
        reasoning: Some(MOCK_REASONING.to_string()),
        suspicious_segments,
    }
}
