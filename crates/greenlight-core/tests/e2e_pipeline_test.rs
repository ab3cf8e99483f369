//! E2E Test: Governed Pipeline
//!
//! Tests the full governed path from content generation through gate
//! approval, boundary authorization, and execution to verified completion.

use greenlight_core::mocks::{CountingAction, StaticGenerator, StaticReviewer, VetoInterceptor};
use greenlight_core::{
    require_authorization, BatchGuard, CompletionState, CompletionVerifier, ErrorKind,
    EvidenceStore, ExecutionRequest, FreezeControl, GateConfig, GateStatus, LayerBoundary,
    OverrideSignals, QualityGate, ReviewerRole, RevisionController, RulesSnapshot, StatusRecord,
    TaskDescriptor,
};

/// A five-role panel with one fixed score per role
fn panel(scores: [f64; 5]) -> QualityGate {
    let mut gate = QualityGate::new(GateConfig::default());
    for (role, score) in ReviewerRole::all().into_iter().zip(scores) {
        gate.add_reviewer(Box::new(StaticReviewer::approving(role, score)));
    }
    gate
}

fn boundary_with(gate: QualityGate, signals: &OverrideSignals) -> LayerBoundary {
    LayerBoundary::new(gate, BatchGuard::new(signals), FreezeControl::new(signals))
}

fn items(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("posts/batch/item_{i}")).collect()
}

/// E2E test: the governed path end to end
///
/// This test validates:
/// 1. Revision loop settles on an approved verdict
/// 2. The verdict mints exactly one execution token
/// 3. The action runs once behind the boundary
/// 4. Evidence records reconcile to a verified completion
#[tokio::test]
async fn e2e_governed_path_to_verified_completion() {
    // 1. A panel that approves on the first attempt
    let gate = panel([95.0, 90.0, 85.0, 92.0, 88.0]);
    let signals = OverrideSignals::denied();
    let mut boundary = boundary_with(gate, &signals);
    let controller = RevisionController::new(Box::new(StaticGenerator::new(
        "reheat leftovers until steaming hot throughout",
    )));

    let outcome = controller
        .run(&mut boundary, "art_reheat_guide")
        .await
        .expect("loop should settle");

    assert!(outcome.approved());
    assert_eq!(outcome.attempts(), 1);
    let verdict = outcome.final_result().expect("terminal verdict");
    assert_eq!(verdict.consensus_score, 90.0);
    assert_eq!(verdict.status, GateStatus::Approved);

    // 2. Authorization mints a token bound to the judged version
    let token = boundary.authorize(verdict).expect("approved result authorizes");
    assert_eq!(token.artifact_id(), "art_reheat_guide");
    assert_eq!(token.fingerprint(), outcome.content.fingerprint);

    // 3. The destructive call runs exactly once
    let action = CountingAction::new();
    let request = ExecutionRequest::for_content(&outcome.content, "external_publish")
        .with_items(items(3));
    let receipt = boundary
        .execute(token, &request, &action)
        .await
        .expect("cleared call should run");
    assert_eq!(action.runs(), 1);
    assert_eq!(receipt.action_class, "external_publish");

    // 4. Evidence written by three independent steps verifies as complete
    let dir = tempfile::tempdir().unwrap();
    let store = EvidenceStore::open(dir.path()).await.unwrap();
    let work_id = "art_reheat_guide";
    store
        .record_rules_snapshot(&RulesSnapshot::capture(
            work_id,
            "2025-06",
            "no health claims; allergens always declared",
        ))
        .await
        .unwrap();
    store
        .record_task_descriptor(&TaskDescriptor::declare(
            work_id,
            "posts/reheat-guide",
            "food_safety",
            "caption and publish receipt",
        ))
        .await
        .unwrap();
    store
        .record_status(
            &StatusRecord::new(work_id)
                .with_validation_passed(true)
                .with_system_of_record_updated(true)
                .with_notification_sent(true)
                .mark_completed(),
        )
        .await
        .unwrap();

    let verifier = CompletionVerifier::new(store);
    let report = verifier.assess(work_id).await.unwrap();
    assert_eq!(report.state, CompletionState::Complete);
    assert!(verifier.is_truly_completed(work_id).await.unwrap());
}

/// E2E test: rejected content cannot cross the boundary
///
/// Validates that one blocking review rejects despite a passing consensus,
/// carries the blocking issue on the verdict, and denies authorization.
#[tokio::test]
async fn e2e_rejected_content_cannot_cross_the_boundary() {
    let mut gate = panel([95.0, 90.0, 85.0, 92.0, 88.0]);
    gate.add_reviewer(Box::new(StaticReviewer::blocking(
        ReviewerRole::SafetyChecker,
        90.0,
        "policy violation",
    )));
    let signals = OverrideSignals::denied();
    let mut boundary = boundary_with(gate, &signals);
    let controller = RevisionController::new(Box::new(StaticGenerator::new(
        "cures the common cold in one sip",
    )));

    let outcome = controller.run(&mut boundary, "art_cold_cure").await.unwrap();

    assert!(!outcome.approved());
    assert_eq!(outcome.attempts(), 1);
    let verdict = outcome.final_result().unwrap();
    assert_eq!(verdict.status, GateStatus::Rejected);
    assert_eq!(verdict.blocking_issues, vec!["policy violation".to_string()]);

    let err = boundary.authorize(verdict).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationFailed);
}

/// E2E test: execution tokens are single use
///
/// Validates that a replayed token is denied and the underlying action does
/// not run a second time.
#[tokio::test]
async fn e2e_execution_token_is_single_use() {
    let gate = panel([90.0; 5]);
    let signals = OverrideSignals::denied();
    let mut boundary = boundary_with(gate, &signals);
    let controller = RevisionController::new(Box::new(StaticGenerator::new("repeatable post")));

    let outcome = controller.run(&mut boundary, "art_replay").await.unwrap();
    let token = boundary.authorize(outcome.final_result().unwrap()).unwrap();
    let action = CountingAction::new();
    let request = ExecutionRequest::for_content(&outcome.content, "external_publish");

    boundary
        .execute(token.clone(), &request, &action)
        .await
        .expect("first presentation runs");

    let err = boundary.execute(token, &request, &action).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PermissionDenied);
    assert_eq!(action.runs(), 1, "replay must not re-run the action");
}

/// E2E test: batch ceiling at the boundary
///
/// Validates that 21 items are blocked with the overage reported, 20 items
/// pass, and a token refused by a pre-check is not spent.
#[tokio::test]
async fn e2e_batch_ceiling_blocks_oversized_calls() {
    let gate = panel([90.0; 5]);
    let signals = OverrideSignals::denied();
    let mut boundary = boundary_with(gate, &signals);
    let controller = RevisionController::new(Box::new(StaticGenerator::new("bulk captions")));

    let outcome = controller.run(&mut boundary, "art_bulk").await.unwrap();
    let token = boundary.authorize(outcome.final_result().unwrap()).unwrap();
    let action = CountingAction::new();

    let oversized = ExecutionRequest::for_content(&outcome.content, "spreadsheet_sync")
        .with_items(items(21));
    let err = boundary
        .execute(token.clone(), &oversized, &action)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ExecutionBlocked);
    let details = err.details().expect("blocked call carries details");
    assert_eq!(details.get("submitted").map(String::as_str), Some("21"));
    assert_eq!(details.get("overage").map(String::as_str), Some("1"));
    assert_eq!(action.runs(), 0);

    // The token was never spent; the corrected call may reuse it
    let within = ExecutionRequest::for_content(&outcome.content, "spreadsheet_sync")
        .with_items(items(20));
    boundary
        .execute(token, &within, &action)
        .await
        .expect("20 items are within the ceiling");
    assert_eq!(action.runs(), 1);
}

/// E2E test: explicit batch override flag
///
/// Validates that the per-call override flag admits an oversized batch.
#[tokio::test]
async fn e2e_batch_override_flag_admits_oversized_call() {
    let gate = panel([90.0; 5]);
    let signals = OverrideSignals::denied();
    let mut boundary = boundary_with(gate, &signals);
    let controller = RevisionController::new(Box::new(StaticGenerator::new(
        "allergen labeling reminders for the fall menu",
    )));

    let outcome = controller.run(&mut boundary, "art_allergens").await.unwrap();
    let token = boundary.authorize(outcome.final_result().unwrap()).unwrap();
    let action = CountingAction::new();

    let oversized = ExecutionRequest::for_content(&outcome.content, "spreadsheet_sync")
        .with_items(items(25))
        .with_batch_override();
    boundary
        .execute(token, &oversized, &action)
        .await
        .expect("explicit override admits the oversized batch");
    assert_eq!(action.runs(), 1);
}

/// E2E test: frozen action class
///
/// Validates that a freeze flag blocks execution for its class without
/// spending the token, and that lifting the flag lets the call through.
#[tokio::test]
async fn e2e_frozen_action_class_blocks_execution() {
    let gate = panel([90.0; 5]);
    let signals = OverrideSignals::denied();
    let mut boundary = boundary_with(gate, &signals);
    let controller = RevisionController::new(Box::new(StaticGenerator::new(
        "chill cooked rice within an hour",
    )));

    let outcome = controller.run(&mut boundary, "art_chill").await.unwrap();
    let token = boundary.authorize(outcome.final_result().unwrap()).unwrap();
    let action = CountingAction::new();
    let request = ExecutionRequest::for_content(&outcome.content, "external_publish");

    boundary
        .freeze_mut()
        .freeze("external_publish", "publishing incident under review");
    let err = boundary
        .execute(token.clone(), &request, &action)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ExecutionBlocked);
    assert_eq!(action.runs(), 0);

    boundary.freeze_mut().lift("external_publish");
    boundary
        .execute(token, &request, &action)
        .await
        .expect("lifted freeze admits the call");
    assert_eq!(action.runs(), 1);
}

/// E2E test: unfreeze signal is scoped
///
/// Validates that an unfreeze signal admits exactly its named class and no
/// other frozen class.
#[tokio::test]
async fn e2e_unfreeze_signal_is_scoped_to_one_class() {
    let gate = panel([90.0; 5]);
    let signals = OverrideSignals::denied().with_unfreeze_class("external_publish");
    let mut boundary = boundary_with(gate, &signals);
    let controller = RevisionController::new(Box::new(StaticGenerator::new(
        "recall notice for lot 8 dressings",
    )));

    let outcome = controller.run(&mut boundary, "art_recall").await.unwrap();
    boundary.freeze_mut().freeze("external_publish", "incident");
    boundary.freeze_mut().freeze("spreadsheet_sync", "incident");

    let action = CountingAction::new();
    let verdict = outcome.final_result().unwrap().clone();

    let publish_token = boundary.authorize(&verdict).unwrap();
    let publish = ExecutionRequest::for_content(&outcome.content, "external_publish");
    boundary
        .execute(publish_token, &publish, &action)
        .await
        .expect("named class is unfrozen by the signal");

    let sync_token = boundary.authorize(&verdict).unwrap();
    let sync = ExecutionRequest::for_content(&outcome.content, "spreadsheet_sync");
    let err = boundary.execute(sync_token, &sync, &action).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ExecutionBlocked);
    assert_eq!(action.runs(), 1);
}

/// E2E test: automated interceptor veto
///
/// Validates that a vetoing interceptor blocks the call before it runs.
#[tokio::test]
async fn e2e_interceptor_veto_blocks_execution() {
    let gate = panel([90.0; 5]);
    let signals = OverrideSignals::denied();
    let mut boundary = boundary_with(gate, &signals).with_interceptor(Box::new(
        VetoInterceptor::new("pii_scan", "unredacted customer name in caption"),
    ));
    let controller = RevisionController::new(Box::new(StaticGenerator::new(
        "thanks to Maria R. for the recipe",
    )));

    let outcome = controller.run(&mut boundary, "art_pii").await.unwrap();
    let token = boundary.authorize(outcome.final_result().unwrap()).unwrap();
    let action = CountingAction::new();
    let request = ExecutionRequest::for_content(&outcome.content, "external_publish");

    let err = boundary.execute(token, &request, &action).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AutoBlocked);
    assert_eq!(action.runs(), 0);
}

/// E2E test: pipeline-wide authorization stop
///
/// Validates that the hard pre-flight stop denies by default and passes only
/// under the explicit signal.
#[tokio::test]
async fn e2e_pipeline_requires_explicit_authorization() {
    let err = require_authorization(&OverrideSignals::denied()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PermissionDenied);

    let granted = OverrideSignals::denied().with_pipeline_authorization();
    require_authorization(&granted).expect("explicit signal authorizes the pipeline");
}

/// E2E test: completion requires every record
///
/// Validates that omitting any one of the three evidence records leaves the
/// work unit unverified, and only the full set verifies.
#[tokio::test]
async fn e2e_completion_requires_every_record() {
    let work_id = "work_omission";

    for omit in ["rules", "task", "status"] {
        let dir = tempfile::tempdir().unwrap();
        let store = EvidenceStore::open(dir.path()).await.unwrap();

        if omit != "rules" {
            store
                .record_rules_snapshot(&RulesSnapshot::capture(work_id, "2025-06", "rules"))
                .await
                .unwrap();
        }
        if omit != "task" {
            store
                .record_task_descriptor(&TaskDescriptor::declare(
                    work_id, "posts/x", "food_safety", "caption",
                ))
                .await
                .unwrap();
        }
        if omit != "status" {
            store
                .record_status(
                    &StatusRecord::new(work_id)
                        .with_validation_passed(true)
                        .with_system_of_record_updated(true)
                        .with_notification_sent(true)
                        .mark_completed(),
                )
                .await
                .unwrap();
        }

        let verifier = CompletionVerifier::new(store);
        let report = verifier.assess(work_id).await.unwrap();
        assert_eq!(
            report.state,
            CompletionState::InProgress,
            "omitting the {omit} record must leave the unit unverified"
        );
        assert_eq!(report.missing.len(), 1);
        assert!(!verifier.is_truly_completed(work_id).await.unwrap());
    }

    // Full set verifies
    let dir = tempfile::tempdir().unwrap();
    let store = EvidenceStore::open(dir.path()).await.unwrap();
    store
        .record_rules_snapshot(&RulesSnapshot::capture(work_id, "2025-06", "rules"))
        .await
        .unwrap();
    store
        .record_task_descriptor(&TaskDescriptor::declare(
            work_id, "posts/x", "food_safety", "caption",
        ))
        .await
        .unwrap();
    store
        .record_status(
            &StatusRecord::new(work_id)
                .with_validation_passed(true)
                .with_system_of_record_updated(true)
                .with_notification_sent(true)
                .mark_completed(),
        )
        .await
        .unwrap();
    let verifier = CompletionVerifier::new(store);
    assert!(verifier.is_truly_completed(work_id).await.unwrap());
}
