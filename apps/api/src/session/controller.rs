use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::insights::models::InsightSnapshot;
use crate::profile::folding::RemediationError;
use crate::profile::models::UserProfile;
use crate::rejections::extraction::{ExtractionError, Extractor};
use crate::rejections::models::RejectionRecord;
use crate::session::state::{ProfileUpdate, SessionState};
use crate::storage::BlobStore;

/// The single key the whole session is persisted under.
pub const SESSION_KEY: &str = "rebound:session";

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("an extraction is already in progress")]
    InFlight,

    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}

#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub record: RejectionRecord,
    pub insights: InsightSnapshot,
}

/// Owns the one `SessionState`. Every change goes through a pure reducer on
/// `SessionState` followed by a full write of the blob, both under the state
/// lock, so there is exactly one writer.
pub struct SessionController {
    state: Mutex<SessionState>,
    store: Arc<dyn BlobStore>,
    extractor: Arc<dyn Extractor>,
    /// Held for the duration of one extraction call.
    submission: Mutex<()>,
}

impl SessionController {
    /// Loads the persisted session. A missing or unreadable blob starts empty;
    /// stored insights are ignored and recomputed from the history.
    pub async fn load(store: Arc<dyn BlobStore>, extractor: Arc<dyn Extractor>) -> Self {
        let state = match store.get(SESSION_KEY).await {
            Ok(Some(blob)) => match serde_json::from_str::<SessionState>(&blob) {
                Ok(state) => {
                    info!(
                        "Loaded session with {} rejections, {} skill gaps",
                        state.rejections.len(),
                        state.profile.skill_gaps.len()
                    );
                    state.with_fresh_insights()
                }
                Err(e) => {
                    warn!("Persisted session is unreadable, starting empty: {e}");
                    SessionState::default().with_fresh_insights()
                }
            },
            Ok(None) => {
                info!("No persisted session, starting empty");
                SessionState::default().with_fresh_insights()
            }
            Err(e) => {
                warn!("Failed to read persisted session, starting empty: {e}");
                SessionState::default().with_fresh_insights()
            }
        };

        Self {
            state: Mutex::new(state),
            store,
            extractor,
            submission: Mutex::new(()),
        }
    }

    pub async fn snapshot(&self) -> SessionState {
        self.state.lock().await.clone()
    }

    /// Extracts a record from `text` and appends it. Only one extraction may be
    /// outstanding; the network call runs outside the state lock.
    pub async fn submit_feedback(&self, text: &str) -> Result<SubmitOutcome, SubmitError> {
        let _in_flight = self
            .submission
            .try_lock()
            .map_err(|_| SubmitError::InFlight)?;

        let record = self.extractor.extract(text).await?;

        let next = self
            .commit(|state| Ok::<_, SubmitError>(state.with_record(record.clone())))
            .await?;

        Ok(SubmitOutcome {
            record,
            insights: next.insights,
        })
    }

    pub async fn start_remediation(&self, area: &str) -> Result<UserProfile, RemediationError> {
        let next = self
            .commit(|state| state.with_remediation_started(area, Utc::now()))
            .await?;
        info!("Started remediation for '{area}'");
        Ok(next.profile)
    }

    pub async fn update_profile(&self, update: ProfileUpdate) -> UserProfile {
        let result = self
            .commit(|state| Ok::<_, std::convert::Infallible>(state.with_profile_update(update)))
            .await;
        match result {
            Ok(next) => next.profile,
            Err(never) => match never {},
        }
    }

    async fn commit<E>(
        &self,
        reducer: impl FnOnce(SessionState) -> Result<SessionState, E>,
    ) -> Result<SessionState, E> {
        let mut guard = self.state.lock().await;
        let next = reducer(guard.clone())?;
        *guard = next.clone();
        self.persist(&next).await;
        Ok(next)
    }

    /// Write failures are logged and swallowed; in-memory state stays authoritative.
    async fn persist(&self, state: &SessionState) {
        let blob = match serde_json::to_string(state) {
            Ok(blob) => blob,
            Err(e) => {
                error!("Failed to serialize session: {e}");
                return;
            }
        };
        if let Err(e) = self.store.set(SESSION_KEY, &blob).await {
            error!("Failed to persist session: {e}");
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::time::Duration;

    use crate::llm_client::LlmError;
    use crate::rejections::extraction::RawExtraction;
    use crate::storage::{MemoryBlobStore, PersistenceError};

    /// Extracts a record with the given stage/reason regardless of input.
    pub(crate) struct CannedExtractor {
        pub stage: &'static str,
        pub reason: &'static str,
        pub delay: Duration,
    }

    impl CannedExtractor {
        pub(crate) fn new(stage: &'static str, reason: &'static str) -> Self {
            Self {
                stage,
                reason,
                delay: Duration::ZERO,
            }
        }
    }

    #[async_trait]
    impl Extractor for CannedExtractor {
        async fn extract(&self, text: &str) -> Result<RejectionRecord, ExtractionError> {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            RawExtraction {
                stage: Some(self.stage.to_string()),
                explicit_reason: Some(self.reason.to_string()),
                ..Default::default()
            }
            .into_record(text, Utc::now())
        }
    }

    pub(crate) struct FailingExtractor;

    #[async_trait]
    impl Extractor for FailingExtractor {
        async fn extract(&self, _text: &str) -> Result<RejectionRecord, ExtractionError> {
            Err(ExtractionError::Service(LlmError::Api {
                status: 529,
                message: "Overloaded".to_string(),
            }))
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl BlobStore for BrokenStore {
        async fn get(&self, _key: &str) -> Result<Option<String>, PersistenceError> {
            Err(PersistenceError::Io(std::io::Error::other("disk gone")))
        }

        async fn set(&self, _key: &str, _value: &str) -> Result<(), PersistenceError> {
            Err(PersistenceError::Io(std::io::Error::other("disk gone")))
        }
    }

    #[tokio::test]
    async fn test_submit_persists_and_reloads() {
        let store = Arc::new(MemoryBlobStore::default());
        let extractor = Arc::new(CannedExtractor::new("technical", "system design"));

        let controller = SessionController::load(store.clone(), extractor.clone()).await;
        controller.submit_feedback("first").await.unwrap();
        let outcome = controller.submit_feedback("second").await.unwrap();
        assert_eq!(outcome.record.raw_text, "second");
        assert_eq!(outcome.insights.total_rejections, 2);

        let reloaded = SessionController::load(store.clone(), extractor).await;
        assert_eq!(reloaded.snapshot().await, controller.snapshot().await);
        assert!(store.get(SESSION_KEY).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_failed_extraction_leaves_state_unchanged() {
        let store = Arc::new(MemoryBlobStore::default());
        let controller = SessionController::load(store.clone(), Arc::new(FailingExtractor)).await;

        let err = controller.submit_feedback("text").await.unwrap_err();
        assert!(matches!(err, SubmitError::Extraction(_)));
        assert!(controller.snapshot().await.rejections.is_empty());
        assert_eq!(store.get(SESSION_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_corrupt_blob_starts_empty() {
        let store = Arc::new(MemoryBlobStore::default());
        store.set(SESSION_KEY, "{not json").await.unwrap();

        let controller =
            SessionController::load(store, Arc::new(CannedExtractor::new("phone", "x"))).await;
        let state = controller.snapshot().await;
        assert!(state.rejections.is_empty());
        assert_eq!(state.insights.next_actions.len(), 1);
    }

    #[tokio::test]
    async fn test_reload_survives_outdated_insights() {
        let store = Arc::new(MemoryBlobStore::default());
        let extractor = Arc::new(CannedExtractor::new("technical", "system design"));
        let controller = SessionController::load(store.clone(), extractor.clone()).await;
        controller.submit_feedback("first").await.unwrap();
        controller.submit_feedback("second").await.unwrap();

        let blob = store.get(SESSION_KEY).await.unwrap().unwrap();
        let mut json: serde_json::Value = serde_json::from_str(&blob).unwrap();
        json["insights"]
            .as_object_mut()
            .unwrap()
            .remove("topReasons");
        store.set(SESSION_KEY, &json.to_string()).await.unwrap();

        let reloaded = SessionController::load(store.clone(), extractor.clone()).await;
        let state = reloaded.snapshot().await;
        assert_eq!(state.rejections.len(), 2);
        assert_eq!(state.insights.total_rejections, 2);
        assert_eq!(state.insights.top_reasons[0].reason, "system design");

        // No insights at all is just as readable.
        json.as_object_mut().unwrap().remove("insights");
        store.set(SESSION_KEY, &json.to_string()).await.unwrap();
        let reloaded = SessionController::load(store, extractor).await;
        assert_eq!(reloaded.snapshot().await, controller.snapshot().await);
    }

    #[tokio::test]
    async fn test_storage_failures_are_not_fatal() {
        let controller = SessionController::load(
            Arc::new(BrokenStore),
            Arc::new(CannedExtractor::new("phone", "communication")),
        )
        .await;

        let outcome = controller.submit_feedback("text").await.unwrap();
        assert_eq!(outcome.insights.total_rejections, 1);
        assert_eq!(controller.snapshot().await.rejections.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_submission_is_rejected() {
        let controller = Arc::new(
            SessionController::load(
                Arc::new(MemoryBlobStore::default()),
                Arc::new(CannedExtractor {
                    delay: Duration::from_millis(200),
                    ..CannedExtractor::new("phone", "communication")
                }),
            )
            .await,
        );

        let first = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.submit_feedback("slow").await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        let second = controller.submit_feedback("impatient").await;
        assert!(matches!(second, Err(SubmitError::InFlight)));

        first.await.unwrap().unwrap();
        assert_eq!(controller.snapshot().await.rejections.len(), 1);
    }

    #[tokio::test]
    async fn test_start_remediation_persists() {
        let store = Arc::new(MemoryBlobStore::default());
        let extractor = Arc::new(CannedExtractor::new("final", "system design"));
        let controller = SessionController::load(store.clone(), extractor.clone()).await;
        controller.submit_feedback("text").await.unwrap();

        let profile = controller.start_remediation("system design").await.unwrap();
        assert_eq!(profile.improvement_tracking.len(), 1);

        let again = controller.start_remediation("system design").await;
        assert!(matches!(again, Err(RemediationError::AlreadyStarted { .. })));

        let reloaded = SessionController::load(store, extractor).await;
        assert_eq!(reloaded.snapshot().await.profile.improvement_tracking.len(), 1);
    }

    #[tokio::test]
    async fn test_update_profile() {
        let controller = SessionController::load(
            Arc::new(MemoryBlobStore::default()),
            Arc::new(CannedExtractor::new("phone", "x")),
        )
        .await;
        let profile = controller
            .update_profile(ProfileUpdate {
                name: Some("Riley".to_string()),
                target_role: Some("Staff Engineer".to_string()),
            })
            .await;
        assert_eq!(profile.name, "Riley");
        assert_eq!(profile.target_role, "Staff Engineer");
    }
}
