use async_trait::async_trait;
use ideaforge_application::{
    ConversationPipeline, FALLBACK_MESSAGE, PERSISTENCE_FAILURE_MESSAGE, PipelineError,
    PipelineState, TurnOutcome, WorkspaceStore,
};
use ideaforge_core::broadcast::{BroadcastBus, Subscription};
use ideaforge_core::conversation::MessageRole;
use ideaforge_core::error::{IdeaforgeError, Result as CoreResult};
use ideaforge_core::extraction::{
    ExtractionError, ExtractionRequest, ExtractionResponse, ExtractionService,
};
use ideaforge_core::persistence::SnapshotTier;
use ideaforge_core::readiness::{ActionStatus, FEATURE_PLANNING_ACTION, VALIDATION_ACTION};
use ideaforge_core::workspace::FeatureStatus;
use ideaforge_infrastructure::{FileTier, MemoryTier, TieredSnapshotStore};
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::Notify;

const KEY: &str = "ideaforge.workspace";

// Mock ExtractionService that replays a fixed script
struct ScriptedExtractor {
    script: Mutex<VecDeque<Result<ExtractionResponse, ExtractionError>>>,
    requests: Mutex<Vec<ExtractionRequest>>,
    gate: Option<Gate>,
}

#[derive(Clone)]
struct Gate {
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

impl ScriptedExtractor {
    fn new(script: Vec<Result<ExtractionResponse, ExtractionError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    fn gated(script: Vec<Result<ExtractionResponse, ExtractionError>>, gate: Gate) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new(script)
        }
    }
}

#[async_trait]
impl ExtractionService for ScriptedExtractor {
    async fn extract(
        &self,
        request: ExtractionRequest,
    ) -> Result<ExtractionResponse, ExtractionError> {
        self.requests.lock().unwrap().push(request);
        if let Some(gate) = &self.gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(ExtractionResponse::reply_only("ok")))
    }
}

// Mock SnapshotTier whose every operation fails
struct FailingTier;

impl SnapshotTier for FailingTier {
    fn name(&self) -> &str {
        "failing"
    }

    fn get(&self, _key: &str) -> CoreResult<Option<String>> {
        Err(IdeaforgeError::storage("unavailable"))
    }

    fn set(&self, _key: &str, _value: &str) -> CoreResult<()> {
        Err(IdeaforgeError::storage("quota exceeded"))
    }

    fn remove(&self, _key: &str) -> CoreResult<()> {
        Err(IdeaforgeError::storage("unavailable"))
    }
}

struct Harness {
    pipeline: Arc<ConversationPipeline>,
    extractor: Arc<ScriptedExtractor>,
    session: Arc<dyn SnapshotTier>,
    local: Arc<dyn SnapshotTier>,
    events: Arc<Mutex<Vec<Value>>>,
    _subscription: Subscription,
    _temp_dir: TempDir,
}

impl Harness {
    fn new(extractor: ScriptedExtractor) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let local: Arc<dyn SnapshotTier> = Arc::new(FileTier::with_dir(temp_dir.path()));
        Self::with_tiers(extractor, Arc::new(MemoryTier::session()), local, temp_dir)
    }

    fn with_tiers(
        extractor: ScriptedExtractor,
        session: Arc<dyn SnapshotTier>,
        local: Arc<dyn SnapshotTier>,
        temp_dir: TempDir,
    ) -> Self {
        let persistence = TieredSnapshotStore::new(KEY, session.clone(), local.clone());
        let store = Arc::new(WorkspaceStore::new(persistence, BroadcastBus::new()));

        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let subscription = store.subscribe(move |event| sink.lock().unwrap().push(event.to_json()));

        let extractor = Arc::new(extractor);
        let pipeline = Arc::new(ConversationPipeline::new(store, extractor.clone()));

        Self {
            pipeline,
            extractor,
            session,
            local,
            events,
            _subscription: subscription,
            _temp_dir: temp_dir,
        }
    }

    fn events(&self) -> Vec<Value> {
        self.events.lock().unwrap().clone()
    }
}

fn concept(reply: &str, concept: &str) -> Result<ExtractionResponse, ExtractionError> {
    Ok(ExtractionResponse {
        business_concept: Some(concept.to_string()),
        ..ExtractionResponse::reply_only(reply)
    })
}

#[tokio::test]
async fn test_scenario_a_concept_is_merged_published_and_persisted() {
    let harness = Harness::new(ScriptedExtractor::new(vec![concept(
        "Great idea!",
        "A marketplace for used books",
    )]));

    let outcome = harness
        .pipeline
        .send("I want to build a marketplace for used books")
        .await
        .unwrap();

    assert_eq!(outcome.reply(), "Great idea!");
    let state = harness.pipeline.store().snapshot();
    assert_eq!(state.dream_statement(), Some("A marketplace for used books"));
    assert_eq!(state.idea_evolution().len(), 1);
    let entry = state.idea_evolution().last().unwrap();
    assert_eq!(entry.concept(), "A marketplace for used books");
    assert_eq!(entry.trigger(), "I want to build a marketplace for used books");

    assert_eq!(
        harness.events(),
        vec![json!({
            "type": "auto_populate",
            "data": { "businessConcept": "A marketplace for used books" }
        })]
    );

    assert!(harness.session.get(KEY).unwrap().is_some());
    assert!(harness.local.get(KEY).unwrap().is_some());

    let requests = harness.extractor.requests.lock().unwrap();
    assert_eq!(requests[0].page_context, "dream");
}

#[tokio::test]
async fn test_scenario_b_timeout_leaves_workspace_untouched() {
    let harness = Harness::new(ScriptedExtractor::new(vec![
        concept("Nice", "Books"),
        Err(ExtractionError::Timeout(30_000)),
    ]));
    harness.pipeline.send("Books").await.unwrap();

    let before = harness.pipeline.store().snapshot();
    let session_before = harness.session.get(KEY).unwrap();
    let local_before = harness.local.get(KEY).unwrap();

    let outcome = harness.pipeline.send("Actually, bikes").await.unwrap();

    assert!(matches!(
        outcome,
        TurnOutcome::Fallback {
            error: ExtractionError::Timeout(_)
        }
    ));
    assert_eq!(harness.pipeline.store().snapshot(), before);
    assert_eq!(harness.session.get(KEY).unwrap(), session_before);
    assert_eq!(harness.local.get(KEY).unwrap(), local_before);
    assert_eq!(harness.events().len(), 1);

    let conversation = harness.pipeline.conversation().await;
    assert_eq!(conversation.last().unwrap().content, FALLBACK_MESSAGE);
    assert_eq!(
        conversation
            .iter()
            .filter(|m| m.content == FALLBACK_MESSAGE)
            .count(),
        1
    );
}

#[tokio::test]
async fn test_scenario_d_entries_append_in_order() {
    let harness = Harness::new(ScriptedExtractor::new(vec![
        concept("ok", "A"),
        concept("ok", "B"),
        concept("ok", "C"),
    ]));

    for text in ["first", "second", "third"] {
        harness.pipeline.send(text).await.unwrap();
    }

    let state = harness.pipeline.store().snapshot();
    let concepts: Vec<&str> = state.idea_evolution().iter().map(|e| e.concept()).collect();
    assert_eq!(concepts, ["A", "B", "C"]);
    let triggers: Vec<&str> = state.idea_evolution().iter().map(|e| e.trigger()).collect();
    assert_eq!(triggers, ["first", "second", "third"]);
}

#[tokio::test]
async fn test_scenario_e_late_subscriber_reads_persisted_state() {
    let harness = Harness::new(ScriptedExtractor::new(vec![concept("ok", "Books")]));
    harness.pipeline.send("Books").await.unwrap();

    let late = Arc::new(Mutex::new(0usize));
    let late_clone = late.clone();
    let _late_sub = harness
        .pipeline
        .store()
        .subscribe(move |_| *late_clone.lock().unwrap() += 1);

    assert_eq!(*late.lock().unwrap(), 0);
    let restored = harness.pipeline.store().read_persisted();
    assert_eq!(restored, harness.pipeline.store().snapshot());
    assert_eq!(restored.dream_statement(), Some("Books"));
}

#[tokio::test]
async fn test_conversation_alternates_user_and_assistant() {
    let harness = Harness::new(ScriptedExtractor::new(vec![
        concept("one", "A"),
        Err(ExtractionError::Schema("missing field `response`".into())),
        Ok(ExtractionResponse::reply_only("three")),
    ]));

    for text in ["a", "b", "c"] {
        harness.pipeline.send(text).await.unwrap();
    }

    let conversation = harness.pipeline.conversation().await;
    assert_eq!(conversation.len(), 6);
    for (i, message) in conversation.iter().enumerate() {
        let expected = if i % 2 == 0 {
            MessageRole::User
        } else {
            MessageRole::Assistant
        };
        assert_eq!(message.role, expected);
    }
    let contents: Vec<&str> = conversation.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, ["a", "one", "b", FALLBACK_MESSAGE, "c", "three"]);
}

#[tokio::test]
async fn test_send_while_in_flight_is_rejected() {
    let gate = Gate {
        entered: Arc::new(Notify::new()),
        release: Arc::new(Notify::new()),
    };
    let harness = Harness::new(ScriptedExtractor::gated(
        vec![concept("ok", "Books")],
        gate.clone(),
    ));

    let pipeline = harness.pipeline.clone();
    let first = tokio::spawn(async move { pipeline.send("Books").await });
    gate.entered.notified().await;

    assert!(harness.pipeline.is_busy());
    assert_eq!(harness.pipeline.state(), PipelineState::Sending);
    let err = harness.pipeline.send("Bikes").await.unwrap_err();
    assert!(err.is_busy());
    assert_eq!(harness.pipeline.conversation().await.len(), 1);

    gate.release.notify_one();
    first.await.unwrap().unwrap();

    assert!(!harness.pipeline.is_busy());
    assert_eq!(harness.pipeline.state(), PipelineState::Idle);
    assert_eq!(harness.pipeline.conversation().await.len(), 2);
}

#[tokio::test]
async fn test_dropped_caller_does_not_cancel_turn() {
    let gate = Gate {
        entered: Arc::new(Notify::new()),
        release: Arc::new(Notify::new()),
    };
    let harness = Harness::new(ScriptedExtractor::gated(
        vec![concept("ok", "Books")],
        gate.clone(),
    ));

    tokio::select! {
        _ = harness.pipeline.send("Books") => panic!("turn should still be waiting"),
        _ = gate.entered.notified() => {}
    }
    gate.release.notify_one();

    for _ in 0..200 {
        if !harness.pipeline.is_busy() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    assert!(!harness.pipeline.is_busy());
    assert_eq!(
        harness.pipeline.store().read_persisted().dream_statement(),
        Some("Books")
    );
    assert_eq!(harness.pipeline.conversation().await.len(), 2);
}

#[tokio::test]
async fn test_blank_input_is_rejected() {
    let harness = Harness::new(ScriptedExtractor::new(vec![]));
    let err = harness.pipeline.send("   ").await.unwrap_err();
    assert!(matches!(err, PipelineError::EmptyInput));
    assert!(harness.pipeline.conversation().await.is_empty());
}

#[tokio::test]
async fn test_session_tier_failure_is_surfaced_and_discards_merge() {
    let temp_dir = TempDir::new().unwrap();
    let local: Arc<dyn SnapshotTier> = Arc::new(FileTier::with_dir(temp_dir.path()));
    let harness = Harness::with_tiers(
        ScriptedExtractor::new(vec![concept("ok", "Books")]),
        Arc::new(FailingTier),
        local,
        temp_dir,
    );

    let err = harness.pipeline.send("Books").await.unwrap_err();

    assert!(err.is_persistence());
    assert!(harness.pipeline.store().snapshot().is_empty());
    assert!(harness.events().is_empty());
    assert!(harness.local.get(KEY).unwrap().is_none());

    let conversation = harness.pipeline.conversation().await;
    assert_eq!(conversation.len(), 2);
    assert_eq!(conversation[1].content, PERSISTENCE_FAILURE_MESSAGE);
    assert!(!harness.pipeline.is_busy());
}

#[tokio::test]
async fn test_local_tier_failure_is_swallowed() {
    let harness = Harness::with_tiers(
        ScriptedExtractor::new(vec![concept("ok", "Books")]),
        Arc::new(MemoryTier::session()),
        Arc::new(FailingTier),
        TempDir::new().unwrap(),
    );

    let outcome = harness.pipeline.send("Books").await.unwrap();

    assert!(matches!(outcome, TurnOutcome::Merged { .. }));
    assert_eq!(
        harness.pipeline.store().snapshot().dream_statement(),
        Some("Books")
    );
    assert_eq!(harness.events().len(), 1);
    assert!(harness.session.get(KEY).unwrap().is_some());
}

#[tokio::test]
async fn test_unchanged_merge_publishes_nothing() {
    let harness = Harness::new(ScriptedExtractor::new(vec![
        concept("ok", "Books"),
        concept("still ok", "Books"),
    ]));

    harness.pipeline.send("Books").await.unwrap();
    harness.pipeline.send("Books again").await.unwrap();

    assert_eq!(harness.events().len(), 1);
    assert_eq!(harness.pipeline.store().snapshot().idea_evolution().len(), 1);
}

#[tokio::test]
async fn test_review_feature_publishes_and_unlocks_planning() {
    let harness = Harness::new(ScriptedExtractor::new(vec![Ok(ExtractionResponse {
        key_features: Some(vec!["Search".to_string()]),
        ..ExtractionResponse::reply_only("ok")
    })]));
    harness.pipeline.send("It needs search").await.unwrap();

    let feature_id = harness.pipeline.store().snapshot().features()[0].id.clone();
    assert_eq!(
        harness.pipeline.readiness().status_of(FEATURE_PLANNING_ACTION),
        Some(ActionStatus::Neutral)
    );

    harness
        .pipeline
        .review_feature(&feature_id, FeatureStatus::Approved)
        .unwrap();

    assert_eq!(
        harness.events().last().unwrap(),
        &json!({
            "type": "feature_reviewed",
            "data": { "featureId": feature_id, "status": "approved" }
        })
    );
    assert_eq!(
        harness.pipeline.readiness().status_of(FEATURE_PLANNING_ACTION),
        Some(ActionStatus::Ready)
    );

    let err = harness
        .pipeline
        .review_feature("missing", FeatureStatus::Rejected)
        .unwrap_err();
    assert!(matches!(err, PipelineError::FeatureNotFound(id) if id == "missing"));
}

#[tokio::test]
async fn test_reply_hint_marks_action_needed() {
    let harness = Harness::new(ScriptedExtractor::new(vec![
        Ok(ExtractionResponse {
            key_features: Some(vec!["Search".to_string()]),
            ..ExtractionResponse::reply_only("Time to validate this with real users.")
        }),
        Err(ExtractionError::Transport("connection reset".into())),
    ]));

    harness.pipeline.send("Search matters").await.unwrap();
    assert_eq!(
        harness.pipeline.last_action_hint().as_deref(),
        Some(VALIDATION_ACTION)
    );
    let report = harness.pipeline.readiness();
    assert!(!report.is_ready_for_validation);
    assert_eq!(report.status_of(VALIDATION_ACTION), Some(ActionStatus::Needed));

    harness.pipeline.send("hello?").await.unwrap();
    assert!(harness.pipeline.last_action_hint().is_none());
    assert_eq!(
        harness.pipeline.readiness().status_of(VALIDATION_ACTION),
        Some(ActionStatus::Neutral)
    );
}

#[tokio::test]
async fn test_panicking_subscriber_keeps_turns_whole() {
    let harness = Harness::new(ScriptedExtractor::new(vec![
        concept("one", "Books"),
        concept("two", "Bikes"),
    ]));
    let _broken = harness
        .pipeline
        .store()
        .subscribe(|_| panic!("view failed"));

    let first = harness.pipeline.send("Books").await.unwrap();
    let second = harness.pipeline.send("Bikes").await.unwrap();
    assert_eq!(first.reply(), "one");
    assert_eq!(second.reply(), "two");

    let conversation = harness.pipeline.conversation().await;
    let roles: Vec<MessageRole> = conversation.iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        [
            MessageRole::User,
            MessageRole::Assistant,
            MessageRole::User,
            MessageRole::Assistant
        ]
    );

    // Subscribers registered before the broken one still receive events.
    assert_eq!(harness.events().len(), 2);
    assert_eq!(
        harness.pipeline.store().read_persisted().dream_statement(),
        Some("Bikes")
    );
    assert!(!harness.pipeline.is_busy());
}

#[tokio::test]
async fn test_persisted_workspace_restores_after_mixed_turns() {
    let harness = Harness::new(ScriptedExtractor::new(vec![
        Ok(ExtractionResponse {
            business_concept: Some("Marketplace for used books".to_string()),
            target_market: Some("University students".to_string()),
            key_features: Some(vec!["Search".to_string(), "Price alerts".to_string()]),
            next_steps: Some(vec!["Interview ten students".to_string()]),
            ..ExtractionResponse::reply_only("Sounds promising.")
        }),
        Err(ExtractionError::Http {
            status: 503,
            message: "UNAVAILABLE: overloaded".to_string(),
        }),
        Ok(ExtractionResponse {
            business_concept: Some("Campus textbook exchange".to_string()),
            key_features: Some(vec!["Campus pickup".to_string(), "search".to_string()]),
            next_steps: Some(vec![
                "Interview ten students".to_string(),
                "Build a landing page".to_string(),
            ]),
            ..ExtractionResponse::reply_only("Narrowing it down.")
        }),
    ]));

    harness.pipeline.send("Used books for students").await.unwrap();
    let failed = harness.pipeline.send("What about e-books?").await.unwrap();
    assert!(matches!(failed, TurnOutcome::Fallback { .. }));
    harness.pipeline.send("Focus on one campus").await.unwrap();

    let features = harness.pipeline.store().snapshot().features().to_vec();
    assert_eq!(features.len(), 3);
    harness
        .pipeline
        .review_feature(&features[0].id, FeatureStatus::Approved)
        .unwrap();
    harness
        .pipeline
        .review_feature(&features[1].id, FeatureStatus::Rejected)
        .unwrap();

    let live = harness.pipeline.store().snapshot();
    let summary = live.session_summary();
    assert!(summary.dream_elements > 0);
    assert!(summary.user_personas > 0);
    assert!(summary.general_ideas > 0);
    assert_eq!(live.idea_evolution().len(), 2);
    assert_eq!(live.feature(&features[1].id).unwrap().status, FeatureStatus::Rejected);

    // A fresh process: empty session tier, same local directory.
    let persistence = TieredSnapshotStore::new(
        KEY,
        Arc::new(MemoryTier::session()),
        harness.local.clone(),
    );
    let restored = WorkspaceStore::restore(persistence, BroadcastBus::new()).snapshot();

    assert_eq!(restored, live);
    assert_eq!(restored.session_summary(), summary);
    assert_eq!(harness.pipeline.store().read_persisted(), live);
}
