//! Conversation pipeline.
//!
//! One turn: the user message is logged, the extraction service is called,
//! and on success the extracted facts are merged into a draft, persisted,
//! committed, and published. On failure a fixed fallback reply is logged and
//! the workspace is not touched.
//!
//! Only one turn is in flight at a time. Turns run on a spawned task so a
//! caller that stops waiting does not cancel the merge or the write.

use ideaforge_core::broadcast::{AutoPopulateData, WorkspaceEvent};
use ideaforge_core::config::{DEFAULT_PAGE_CONTEXT, WorkspaceConfig};
use ideaforge_core::conversation::ConversationMessage;
use ideaforge_core::error::IdeaforgeError;
use ideaforge_core::evolution::EvolutionTracker;
use ideaforge_core::extraction::{ExtractionError, ExtractionRequest, ExtractionService};
use ideaforge_core::readiness::{ActionCatalog, ReadinessReport, StageReadinessGate};
use ideaforge_core::workspace::FeatureStatus;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::merge::merge_extraction;
use crate::workspace_store::WorkspaceStore;

/// Assistant reply logged when extraction fails.
pub const FALLBACK_MESSAGE: &str =
    "I'm having trouble processing that right now. Could you try rephrasing your idea?";

/// Assistant reply logged when the workspace could not be saved.
pub const PERSISTENCE_FAILURE_MESSAGE: &str =
    "I understood your idea, but I couldn't save it to your workspace. Please try again.";

/// Where the pipeline is within a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Sending,
    Merging,
    Failed,
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("A message is already being processed")]
    Busy,

    #[error("Cannot send an empty message")]
    EmptyInput,

    #[error("Failed to save workspace: {0}")]
    Persistence(#[source] IdeaforgeError),

    #[error("Feature not found: {0}")]
    FeatureNotFound(String),

    #[error("Conversation turn aborted: {0}")]
    TaskJoin(String),
}

impl PipelineError {
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Busy)
    }

    pub fn is_persistence(&self) -> bool {
        matches!(self, Self::Persistence(_))
    }
}

/// Result of a completed turn.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// Extraction succeeded and the workspace was saved.
    Merged {
        reply: String,
        changes: AutoPopulateData,
    },
    /// Extraction failed; the fallback reply was logged.
    Fallback { error: ExtractionError },
}

impl TurnOutcome {
    /// The assistant reply that was appended for this turn.
    pub fn reply(&self) -> &str {
        match self {
            Self::Merged { reply, .. } => reply,
            Self::Fallback { .. } => FALLBACK_MESSAGE,
        }
    }
}

pub struct ConversationPipeline {
    store: Arc<WorkspaceStore>,
    extractor: Arc<dyn ExtractionService>,
    tracker: EvolutionTracker,
    gate: StageReadinessGate,
    page_context: String,
    conversation: RwLock<Vec<ConversationMessage>>,
    in_flight: AtomicBool,
    state: Mutex<PipelineState>,
    last_hint: Mutex<Option<String>>,
}

impl ConversationPipeline {
    pub fn new(store: Arc<WorkspaceStore>, extractor: Arc<dyn ExtractionService>) -> Self {
        Self {
            store,
            extractor,
            tracker: EvolutionTracker::default(),
            gate: StageReadinessGate::default(),
            page_context: DEFAULT_PAGE_CONTEXT.to_string(),
            conversation: RwLock::new(Vec::new()),
            in_flight: AtomicBool::new(false),
            state: Mutex::new(PipelineState::Idle),
            last_hint: Mutex::new(None),
        }
    }

    /// Applies the `[workspace]` settings: trigger bound, validation
    /// threshold, and page context.
    pub fn with_config(mut self, config: &WorkspaceConfig) -> Self {
        self.tracker = EvolutionTracker::new(config.trigger_max_chars);
        self.gate = StageReadinessGate::new(ActionCatalog::default(), config.validation_threshold);
        self.page_context = config.page_context.clone();
        self
    }

    pub fn store(&self) -> &Arc<WorkspaceStore> {
        &self.store
    }

    pub fn state(&self) -> PipelineState {
        *self.lock_state()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Copy of the conversation log, oldest first.
    pub async fn conversation(&self) -> Vec<ConversationMessage> {
        self.conversation.read().await.clone()
    }

    /// Stage action suggested by the latest assistant reply, if any.
    pub fn last_action_hint(&self) -> Option<String> {
        self.last_hint
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Readiness of each stage action for the current workspace.
    pub fn readiness(&self) -> ReadinessReport {
        let hint = self.last_action_hint();
        self.store
            .with_state(|state| self.gate.evaluate(state, hint.as_deref()))
    }

    /// Sends one user message and waits for the turn to finish.
    ///
    /// Rejected with [`PipelineError::Busy`] while another turn is in flight
    /// and with [`PipelineError::EmptyInput`] for blank text; neither touches
    /// the conversation log.
    pub async fn send(self: &Arc<Self>, text: impl Into<String>) -> Result<TurnOutcome, PipelineError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(PipelineError::EmptyInput);
        }
        let guard = InFlightGuard::acquire(self)?;

        let pipeline = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let outcome = pipeline.run_turn(&text).await;
            drop(guard);
            outcome
        });

        handle
            .await
            .map_err(|e| PipelineError::TaskJoin(e.to_string()))?
    }

    /// Changes a feature's review status and publishes `feature_reviewed`.
    pub fn review_feature(
        self: &Arc<Self>,
        feature_id: &str,
        status: FeatureStatus,
    ) -> Result<(), PipelineError> {
        let _guard = InFlightGuard::acquire(self)?;

        let mut draft = self.store.snapshot();
        draft
            .set_feature_status(feature_id, status)
            .map_err(|e| {
                if e.is_not_found() {
                    PipelineError::FeatureNotFound(feature_id.to_string())
                } else {
                    PipelineError::Persistence(e)
                }
            })?;

        let event = WorkspaceEvent::FeatureReviewed {
            feature_id: feature_id.to_string(),
            status,
        };
        self.store
            .commit(draft, Some(event))
            .map_err(PipelineError::Persistence)?;

        tracing::info!(
            "[ConversationPipeline] Feature {} marked {}",
            feature_id,
            status
        );
        Ok(())
    }

    async fn run_turn(&self, text: &str) -> Result<TurnOutcome, PipelineError> {
        self.conversation
            .write()
            .await
            .push(ConversationMessage::user(text));
        self.set_state(PipelineState::Sending);

        let started = Instant::now();
        tracing::info!(
            "[ConversationPipeline] Dispatching turn ({} chars, page={})",
            text.chars().count(),
            self.page_context
        );

        let request = ExtractionRequest::new(text, &self.page_context);
        let response = match self.extractor.extract(request).await {
            Ok(response) => response,
            Err(error) => {
                self.set_state(PipelineState::Failed);
                tracing::warn!(
                    "[ConversationPipeline] Extraction failed after {:?}: {}",
                    started.elapsed(),
                    error
                );
                self.set_hint(None);
                self.push_assistant(FALLBACK_MESSAGE).await;
                return Ok(TurnOutcome::Fallback { error });
            }
        };

        self.set_state(PipelineState::Merging);
        let mut draft = self.store.snapshot();
        let changes = merge_extraction(&mut draft, &response, &self.tracker, text);
        let event = (!changes.is_empty()).then(|| WorkspaceEvent::AutoPopulate(changes.clone()));

        if let Err(e) = self.store.commit(draft, event) {
            self.set_state(PipelineState::Failed);
            tracing::error!(
                "[ConversationPipeline] Turn discarded, workspace not saved: {}",
                e
            );
            self.push_assistant(PERSISTENCE_FAILURE_MESSAGE).await;
            return Err(PipelineError::Persistence(e));
        }

        let hint = self
            .gate
            .catalog()
            .detect_hint(&response.response)
            .map(str::to_string);
        self.set_hint(hint);
        self.push_assistant(&response.response).await;

        tracing::info!(
            "[ConversationPipeline] Turn merged in {:?} (changed: {})",
            started.elapsed(),
            !changes.is_empty()
        );
        Ok(TurnOutcome::Merged {
            reply: response.response,
            changes,
        })
    }

    async fn push_assistant(&self, content: &str) {
        self.conversation
            .write()
            .await
            .push(ConversationMessage::assistant(content));
    }

    fn set_hint(&self, hint: Option<String>) {
        *self
            .last_hint
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = hint;
    }

    fn set_state(&self, state: PipelineState) {
        *self.lock_state() = state;
    }

    fn lock_state(&self) -> MutexGuard<'_, PipelineState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for ConversationPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationPipeline")
            .field("page_context", &self.page_context)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

/// Holds the single-flight flag; releasing it returns the pipeline to idle.
struct InFlightGuard {
    pipeline: Arc<ConversationPipeline>,
}

impl InFlightGuard {
    fn acquire(pipeline: &Arc<ConversationPipeline>) -> Result<Self, PipelineError> {
        pipeline
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| PipelineError::Busy)?;
        Ok(Self {
            pipeline: Arc::clone(pipeline),
        })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.pipeline.set_state(PipelineState::Idle);
        self.pipeline.in_flight.store(false, Ordering::Release);
    }
}
