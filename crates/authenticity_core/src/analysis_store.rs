//! crates/authenticity_core/src/analysis_store.rs
//!
//! The Analysis Store: turns raw text into a persisted, retrievable `AnalysisResult`.
//!
//! History is kept most-recent-first and is rewritten as a whole on every
//! change. Read-modify-persist sequences are serialized by `writes`, so
//! overlapping `analyze_text` calls cannot lose each other's results.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::blob;
use crate::domain::{AnalysisResult, AnalysisSource, ClassifierOutput};
use crate::error::{StoreError, StoreResult};
use crate::mock::MockGenerator;
use crate::normalize::{into_result, normalize_output, resolve_title};
use crate::ports::{ClassificationProvider, KeyValueStore, ProviderError};
use crate::seed::demo_history;

/// Storage key of the serialized history.
pub const HISTORY_KEY: &str = "analysisHistory";

const ANALYZE_FAILED: &str = "Failed to analyze text. Please try again.";
const LOAD_FAILED: &str = "Failed to load analysis history.";

//=========================================================================================
// State
//=========================================================================================

#[derive(Debug, Default)]
struct AnalysisState {
    history: Vec<AnalysisResult>,
    current: Option<AnalysisResult>,
    in_flight: usize,
    error: Option<String>,
    loaded: bool,
}

/// A point-in-time copy of the store, for presentation.
#[derive(Debug, Clone, Default, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSnapshot {
    pub history: Vec<AnalysisResult>,
    pub current: Option<AnalysisResult>,
    pub is_analyzing: bool,
    pub error: Option<String>,
}

//=========================================================================================
// The Store
//=========================================================================================

pub struct AnalysisStore {
    storage: Arc<dyn KeyValueStore>,
    provider: Option<Arc<dyn ClassificationProvider>>,
    mock: MockGenerator,
    state: RwLock<AnalysisState>,
    writes: Mutex<()>,
}

impl AnalysisStore {
    /// Creates a store with no classification provider; every analysis uses the mock generator.
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            storage,
            provider: None,
            mock: MockGenerator::default(),
            state: RwLock::new(AnalysisState::default()),
            writes: Mutex::new(()),
        }
    }

    pub fn with_provider(mut self, provider: Arc<dyn ClassificationProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_mock(mut self, mock: MockGenerator) -> Self {
        self.mock = mock;
        self
    }

    /// Whether a real classification provider will be tried before the mock.
    pub fn provider_configured(&self) -> bool {
        self.provider.as_ref().is_some_and(|p| p.is_configured())
    }

    /// Loads the history from storage, seeding the demo history when nothing is stored.
    /// Calling it again after a successful load does nothing.
    pub async fn initialize(&self) -> StoreResult<()> {
        let _write = self.writes.lock().await;
        self.ensure_loaded().await
    }

    /// Classifies `text`, prepends the result to the history and persists it.
    ///
    /// Provider problems never surface here: an unconfigured or failing provider
    /// is replaced by the mock generator and the result's `source` says so.
    pub async fn analyze_text(
        &self,
        text: &str,
        title: Option<&str>,
    ) -> StoreResult<AnalysisResult> {
        if text.trim().is_empty() {
            self.state_mut().error = Some(StoreError::EmptyInput.to_string());
            return Err(StoreError::EmptyInput);
        }

        let _in_flight = InFlight::begin(&self.state);
        let text_length = text.chars().count();
        let (output, source) = self.classify(text, text_length).await;
        let result = into_result(output, resolve_title(title), text_length, source);

        let _write = self.writes.lock().await;
        self.ensure_loaded().await?;

        let mut history = Vec::with_capacity(self.state().history.len() + 1);
        history.push(result.clone());
        history.extend(self.state().history.iter().cloned());

        if let Err(e) = blob::save(self.storage.as_ref(), HISTORY_KEY, &history).await {
            error!(error = %e, "Failed to persist analysis history");
            self.state_mut().error = Some(ANALYZE_FAILED.to_string());
            return Err(e);
        }

        {
            let mut state = self.state_mut();
            state.history = history;
            state.current = Some(result.clone());
        }
        info!(
            id = %result.id,
            classification = ?result.classification,
            source = ?result.source,
            "Analysis completed"
        );
        Ok(result)
    }

    /// Looks up a result in the in-memory history.
    pub fn get_by_id(&self, id: &str) -> Option<AnalysisResult> {
        self.state().history.iter().find(|r| r.id == id).cloned()
    }

    pub fn history(&self) -> Vec<AnalysisResult> {
        self.state().history.clone()
    }

    /// The result of the most recent `analyze_text` call, until cleared.
    pub fn current(&self) -> Option<AnalysisResult> {
        self.state().current.clone()
    }

    /// Forgets the most recent result. The history is untouched.
    pub fn clear_current(&self) {
        self.state_mut().current = None;
    }

    pub fn is_analyzing(&self) -> bool {
        self.state().in_flight > 0
    }

    pub fn error(&self) -> Option<String> {
        self.state().error.clone()
    }

    pub fn snapshot(&self) -> AnalysisSnapshot {
        let state = self.state();
        AnalysisSnapshot {
            history: state.history.clone(),
            current: state.current.clone(),
            is_analyzing: state.in_flight > 0,
            error: state.error.clone(),
        }
    }

    //=====================================================================================
    // Internals
    //=====================================================================================

    /// Must be called with `writes` held.
    async fn ensure_loaded(&self) -> StoreResult<()> {
        if self.state().loaded {
            return Ok(());
        }

        match blob::load::<Vec<AnalysisResult>>(self.storage.as_ref(), HISTORY_KEY).await {
            Ok(Some(history)) => {
                info!(entries = history.len(), "Loaded analysis history");
                let mut state = self.state_mut();
                state.history = history;
                state.loaded = true;
                Ok(())
            }
            Ok(None) => {
                let seed = demo_history();
                info!(entries = seed.len(), "No stored history, seeding demo data");
                {
                    let mut state = self.state_mut();
                    state.history = seed.clone();
                    state.loaded = true;
                }
                blob::save(self.storage.as_ref(), HISTORY_KEY, &seed)
                    .await
                    .inspect_err(|e| {
                        error!(error = %e, "Failed to persist seeded history");
                        self.state_mut().error = Some(LOAD_FAILED.to_string());
                    })
            }
            Err(e) => {
                error!(error = %e, "Failed to initialize analysis history");
                self.state_mut().error = Some(LOAD_FAILED.to_string());
                Err(e)
            }
        }
    }

    async fn classify(&self, text: &str, text_length: usize) -> (ClassifierOutput, AnalysisSource) {
        let provider = match &self.provider {
            Some(p) if p.is_configured() => p,
            _ => {
                info!("Classification provider not configured, using mock analysis");
                return (self.mock.generate(text).await, AnalysisSource::FallbackNotConfigured);
            }
        };

        let outcome = provider
            .classify(text)
            .await
            .and_then(|output| normalize_output(output, text_length));

        match outcome {
            Ok(output) => (output, AnalysisSource::Provider),
            Err(ProviderError::NotConfigured) => {
                info!("Classification provider reported it is not configured, using mock analysis");
                (self.mock.generate(text).await, AnalysisSource::FallbackNotConfigured)
            }
            Err(e) => {
                warn!(error = %e, "Classification provider failed, falling back to mock analysis");
                (self.mock.generate(text).await, AnalysisSource::FallbackAfterError)
            }
        }
    }

    fn state(&self) -> RwLockReadGuard<'_, AnalysisState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn state_mut(&self) -> RwLockWriteGuard<'_, AnalysisState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Marks an analysis as running for as long as it is alive.
struct InFlight<'a>(&'a RwLock<AnalysisState>);

impl<'a> InFlight<'a> {
    fn begin(state: &'a RwLock<AnalysisState>) -> Self {
        {
            let mut s = state.write().unwrap_or_else(PoisonError::into_inner);
            s.in_flight += 1;
            s.error = None;
        }
        Self(state)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut s = self.0.write().unwrap_or_else(PoisonError::into_inner);
        s.in_flight = s.in_flight.saturating_sub(1);
    }
}
