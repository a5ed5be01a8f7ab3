mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use authenticity_core::mock::MOCK_REASONING;
use authenticity_core::seed::demo_history;
use authenticity_core::{
    AnalysisResult, AnalysisSource, AnalysisStore, Classification, ClassifierOutput,
    KeyValueStore, MockGenerator, StoreError, SuspiciousSegment, HISTORY_KEY,
};
use common::{FlakyStore, Script, ScriptedProvider, UnconfiguredProvider};

fn store_over(storage: Arc<FlakyStore>) -> AnalysisStore {
    AnalysisStore::new(storage).with_mock(MockGenerator::instant())
}

async fn persisted_history(storage: &FlakyStore) -> Vec<AnalysisResult> {
    let raw = storage.raw(HISTORY_KEY).await.expect("history persisted");
    serde_json::from_str(&raw).unwrap()
}

fn provider_answer() -> ClassifierOutput {
    ClassifierOutput {
        classification: Classification::Ai,
        confidence_score: 87.5,
        reasoning: Some("Uniform sentence rhythm.".into()),
        suspicious_segments: vec![SuspiciousSegment {
            text: "Our revolutionary product".into(),
            start_index: 0,
            end_index: 25,
            score: 0.91,
        }],
    }
}

#[tokio::test]
async fn initialize_seeds_and_persists_demo_history_once() {
    let storage = Arc::new(FlakyStore::new());
    let store = store_over(storage.clone());

    store.initialize().await.unwrap();
    assert_eq!(store.history(), demo_history());
    assert_eq!(persisted_history(&storage).await, demo_history());

    store.initialize().await.unwrap();
    assert_eq!(store.history().len(), demo_history().len());
    assert_eq!(storage.writes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn initialize_loads_existing_history() {
    let storage = Arc::new(FlakyStore::new());
    let stored = vec![demo_history().remove(2)];
    storage
        .set(HISTORY_KEY, &serde_json::to_string(&stored).unwrap())
        .await
        .unwrap();

    let store = store_over(storage.clone());
    store.initialize().await.unwrap();
    assert_eq!(store.history(), stored);
}

#[tokio::test]
async fn corrupt_history_is_reported_and_left_alone() {
    let storage = Arc::new(FlakyStore::new());
    storage.set(HISTORY_KEY, "{not json").await.unwrap();

    let store = store_over(storage.clone());
    let err = store.initialize().await.unwrap_err();
    assert!(matches!(err, StoreError::Corrupt { .. }));
    assert!(store.error().is_some());
    assert_eq!(storage.raw(HISTORY_KEY).await.as_deref(), Some("{not json"));
}

#[tokio::test]
async fn unreadable_storage_surfaces_persistence_error() {
    let storage = Arc::new(FlakyStore::new());
    storage.fail_reads.store(true, Ordering::SeqCst);

    let store = store_over(storage);
    let err = store.initialize().await.unwrap_err();
    assert!(matches!(err, StoreError::Persistence(_)));
    assert!(store.history().is_empty());
}

#[tokio::test]
async fn empty_text_is_rejected_without_touching_history() {
    let store = store_over(Arc::new(FlakyStore::new()));
    store.initialize().await.unwrap();

    for text in ["", "   \n\t"] {
        let err = store.analyze_text(text, None).await.unwrap_err();
        assert!(matches!(err, StoreError::EmptyInput));
    }
    assert_eq!(store.history(), demo_history());
    assert!(!store.is_analyzing());
    assert!(store.error().is_some());
}

#[tokio::test]
async fn falls_back_to_mock_without_provider() {
    let storage = Arc::new(FlakyStore::new());
    let store = store_over(storage.clone());
    store.initialize().await.unwrap();

    let text = "It was a bright cold day in April, and the clocks were striking thirteen.";
    let result = store.analyze_text(text, Some("Opening line")).await.unwrap();

    assert_eq!(result.source, AnalysisSource::FallbackNotConfigured);
    assert_eq!(result.reasoning.as_deref(), Some(MOCK_REASONING));
    assert_eq!(result.title, "Opening line");
    assert_eq!(result.text_length, text.chars().count());
    assert!((0.0..=100.0).contains(&result.confidence_score));
    match result.classification {
        Classification::Human => assert!(result.suspicious_segments.is_empty()),
        _ => {
            assert_eq!(result.suspicious_segments.len(), 1);
            let score = result.suspicious_segments[0].score;
            assert!((0.0..1.0).contains(&score));
        }
    }

    let history = store.history();
    assert_eq!(history.len(), demo_history().len() + 1);
    assert_eq!(history[0], result);
    assert_eq!(persisted_history(&storage).await, history);
    assert_eq!(store.current(), Some(result));
}

#[tokio::test]
async fn unconfigured_provider_is_never_called() {
    let store = store_over(Arc::new(FlakyStore::new())).with_provider(Arc::new(UnconfiguredProvider));
    assert!(!store.provider_configured());

    let result = store.analyze_text("Some text", None).await.unwrap();
    assert_eq!(result.source, AnalysisSource::FallbackNotConfigured);
}

#[tokio::test]
async fn uses_and_normalizes_provider_output() {
    let mut answer = provider_answer();
    answer.confidence_score = 130.0;
    answer.suspicious_segments[0].end_index = 10_000;

    let provider = Arc::new(ScriptedProvider::new(Script::Answer(answer)));
    let store = store_over(Arc::new(FlakyStore::new())).with_provider(provider.clone());
    assert!(store.provider_configured());

    let text = "Our revolutionary product transforms everything.";
    let result = store.analyze_text(text, None).await.unwrap();

    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    assert_eq!(result.source, AnalysisSource::Provider);
    assert_eq!(result.classification, Classification::Ai);
    assert_eq!(result.confidence_score, 100.0);
    assert_eq!(result.suspicious_segments[0].end_index, text.chars().count());
    assert_eq!(result.title, "Untitled Document");
    assert_eq!(result.reasoning.as_deref(), Some("Uniform sentence rhythm."));
}

#[tokio::test]
async fn provider_failure_falls_back_and_is_marked() {
    let provider = Arc::new(ScriptedProvider::new(Script::Fail));
    let store = store_over(Arc::new(FlakyStore::new())).with_provider(provider.clone());

    let result = store.analyze_text("Text to check", None).await.unwrap();
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    assert_eq!(result.source, AnalysisSource::FallbackAfterError);
    assert_eq!(result.reasoning.as_deref(), Some(MOCK_REASONING));
    assert!(store.error().is_none());
}

#[tokio::test]
async fn provider_reporting_not_configured_is_kept_apart_from_failure() {
    let provider = Arc::new(ScriptedProvider::new(Script::NotConfigured));
    let store = store_over(Arc::new(FlakyStore::new())).with_provider(provider);

    let result = store.analyze_text("Text to check", None).await.unwrap();
    assert_eq!(result.source, AnalysisSource::FallbackNotConfigured);
}

#[tokio::test]
async fn history_grows_most_recent_first() {
    let store = store_over(Arc::new(FlakyStore::new()));
    store.initialize().await.unwrap();
    let initial = store.history().len();

    let mut produced = Vec::new();
    for i in 0..4 {
        produced.push(store.analyze_text(&format!("document {i}"), None).await.unwrap());
    }

    let history = store.history();
    assert_eq!(history.len(), initial + 4);
    for (i, result) in produced.iter().rev().enumerate() {
        assert_eq!(&history[i], result);
    }
}

#[tokio::test]
async fn get_by_id_finds_produced_results_only() {
    let store = store_over(Arc::new(FlakyStore::new()));
    store.initialize().await.unwrap();

    let result = store.analyze_text("Findable text", Some("Find me")).await.unwrap();
    assert_eq!(store.get_by_id(&result.id), Some(result));
    assert_eq!(store.get_by_id("2").map(|r| r.title), Some("Marketing Copy".to_string()));
    assert_eq!(store.get_by_id("never-produced"), None);
}

#[tokio::test]
async fn analyze_without_initialize_keeps_stored_history() {
    let storage = Arc::new(FlakyStore::new());
    let stored = demo_history();
    storage
        .set(HISTORY_KEY, &serde_json::to_string(&stored).unwrap())
        .await
        .unwrap();

    let store = store_over(storage.clone());
    store.analyze_text("first check", None).await.unwrap();
    assert_eq!(persisted_history(&storage).await.len(), stored.len() + 1);
}

#[tokio::test]
async fn failed_persist_leaves_history_intact() {
    let storage = Arc::new(FlakyStore::new());
    let store = store_over(storage.clone());
    store.initialize().await.unwrap();

    storage.fail_writes.store(true, Ordering::SeqCst);
    let err = store.analyze_text("will not be saved", None).await.unwrap_err();

    assert!(matches!(err, StoreError::Persistence(_)));
    assert_eq!(store.history(), demo_history());
    assert_eq!(store.current(), None);
    assert!(!store.is_analyzing());
    assert_eq!(
        store.error().as_deref(),
        Some("Failed to analyze text. Please try again.")
    );
}

#[tokio::test]
async fn clear_current_keeps_history() {
    let store = store_over(Arc::new(FlakyStore::new()));
    let result = store.analyze_text("Some text", None).await.unwrap();
    assert_eq!(store.current(), Some(result.clone()));

    store.clear_current();
    assert_eq!(store.current(), None);
    assert_eq!(store.history()[0], result);
}

#[tokio::test]
async fn overlapping_analyses_do_not_lose_updates() {
    let storage = Arc::new(FlakyStore::new());
    let provider = Arc::new(
        ScriptedProvider::new(Script::Answer(provider_answer()))
            .with_delay(Duration::from_millis(20)),
    );
    let store = Arc::new(store_over(storage.clone()).with_provider(provider));
    store.initialize().await.unwrap();

    let (a, b, c) = tokio::join!(
        store.analyze_text("first", None),
        store.analyze_text("second", None),
        store.analyze_text("third", None),
    );
    let ids = [a.unwrap().id, b.unwrap().id, c.unwrap().id];

    let history = store.history();
    assert_eq!(history.len(), demo_history().len() + 3);
    for id in &ids {
        assert!(store.get_by_id(id).is_some());
    }
    assert_eq!(persisted_history(&storage).await, history);
    assert!(!store.is_analyzing());
}

#[tokio::test]
async fn in_progress_flag_is_visible_while_classifying() {
    let provider = Arc::new(
        ScriptedProvider::new(Script::Answer(provider_answer()))
            .with_delay(Duration::from_millis(50)),
    );
    let store = Arc::new(store_over(Arc::new(FlakyStore::new())).with_provider(provider));

    let worker = {
        let store = store.clone();
        tokio::spawn(async move { store.analyze_text("slow text", None).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(store.is_analyzing());
    assert!(store.snapshot().is_analyzing);

    worker.await.unwrap().unwrap();
    assert!(!store.is_analyzing());
}
