//! crates/authenticity_core/src/seed.rs
//!
//! Demo data written on first start, so a fresh install has something to show.

use chrono::{DateTime, TimeZone, Utc};

use crate::domain::{
    AnalysisResult, AnalysisSource, ChecksRemaining, Classification, Subscription,
    SuspiciousSegment, UserProfile,
};
use crate::plans::PlanId;

fn day(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

fn segment(text: &str, start_index: usize, end_index: usize, score: f64) -> SuspiciousSegment {
    SuspiciousSegment {
        text: text.to_string(),
        start_index,
        end_index,
        score,
    }
}

/// The history shown before the user has run any check, most recent first.
pub fn demo_history() -> Vec<AnalysisResult> {
    vec![
        AnalysisResult {
            id: "1".to_string(),
            title: "Project Proposal".to_string(),
            created_at: day(2025, 8, 1),
            classification: Classification::Human,
            confidence_score: 92.0,
            text_length: 2450,
            reasoning: None,
            suspicious_segments: vec![segment(
                "The implementation of this strategy will undoubtedly lead to significant improvements in overall performance metrics.",
                1200,
                1300,
                0.65,
            )],
            source: AnalysisSource::Demo,
        },
        AnalysisResult {
            id: "2".to_string(),
            title: "Marketing Copy".to_string(),
            created_at: day(2025, 7, 28),
            classification: Classification::Ai,
            confidence_score: 88.0,
            text_length: 1200,
            reasoning: None,
            suspicious_segments: vec![
                segment(
                    "Our revolutionary product transforms the way you interact with technology, providing unparalleled efficiency and seamless integration.",
                    100,
                    200,
                    0.92,
                ),
                segment(
                    "By leveraging cutting-edge algorithms and proprietary methodologies, we've created a solution that stands head and shoulders above the competition.",
                    500,
                    600,
                    0.89,
                ),
            ],
            source: AnalysisSource::Demo,
        },
        AnalysisResult {
            id: "3".to_string(),
            title: "Research Summary".to_string(),
            created_at: day(2025, 7, 25),
            classification: Classification::Mixed,
            confidence_score: 76.0,
            text_length: 3200,
            reasoning: None,
            suspicious_segments: vec![segment(
                "The data conclusively demonstrates a correlation between the variables, with statistical significance at p<0.05 across all test conditions.",
                1500,
                1600,
                0.78,
            )],
            source: AnalysisSource::Demo,
        },
    ]
}

pub fn demo_profile() -> UserProfile {
    UserProfile {
        id: "user123".to_string(),
        name: "Alex Johnson".to_string(),
        email: "alex.johnson@example.com".to_string(),
        subscription: Subscription {
            plan: PlanId::Basic,
            expires_at: day(2025, 9, 3),
            checks_remaining: ChecksRemaining::Remaining(42),
        },
    }
}
