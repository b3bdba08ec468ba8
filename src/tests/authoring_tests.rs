use super::*;
use crate::domain::services::{ManualClock, SequentialIds};
use crate::domain::{ContentLimits, DirectiveState, NotificationKind, TimestampUtc};
use tempfile::TempDir;

struct Harness {
    service: AuthoringService,
    _dir: TempDir,
}

fn harness() -> Harness {
    let dir = TempDir::new().expect("temp dir");
    let store = FileEventStore::new(
        dir.path().join("events.jsonl"),
        dir.path().join("snapshots"),
        50,
    );
    let services = DirectiveServices::new(
        Arc::new(ManualClock::new(TimestampUtc::now())),
        Arc::new(SequentialIds::new("id")),
        ContentLimits::default(),
    );
    Harness {
        service: AuthoringService::new(store, services),
        _dir: dir,
    }
}

fn id(s: &str) -> DirectiveId {
    DirectiveId::parse(s).unwrap()
}

fn step_contents(workflow: &Workflow) -> Vec<&str> {
    workflow.steps().iter().map(|s| s.content()).collect()
}

async fn with_steps(service: &AuthoringService, contents: &[&str]) -> DirectiveId {
    let workflow = service
        .draft("Release checklist", "Cutting a release", None)
        .await
        .unwrap();
    let mut after: Option<String> = None;
    for content in contents {
        let step = service
            .add_step(workflow.id(), content, after.as_deref())
            .await
            .unwrap();
        after = Some(step.id().to_string());
    }
    workflow.id().clone()
}

fn directive_error(err: &anyhow::Error) -> &DirectiveError {
    err.downcast_ref::<DirectiveError>()
        .expect("expected a DirectiveError in the chain")
}

// ============================================================================
// Drafting and reading
// ============================================================================

#[tokio::test]
async fn draft_derives_id_from_name() {
    let h = harness();

    let workflow = h
        .service
        .draft("Release Checklist", "Cutting a release", None)
        .await
        .unwrap();

    assert_eq!(workflow.id().as_str(), "release-checklist");
    assert_eq!(workflow.state(), DirectiveState::Draft);
}

#[tokio::test]
async fn draft_twice_fails() {
    let h = harness();
    h.service
        .draft("Release", "Cutting a release", Some("release"))
        .await
        .unwrap();

    let err = h
        .service
        .draft("Release again", "Again", Some("release"))
        .await
        .unwrap_err();

    assert_eq!(
        directive_error(&err),
        &DirectiveError::AlreadyDrafted {
            id: "release".to_string()
        }
    );
}

#[tokio::test]
async fn load_unknown_workflow_fails() {
    let h = harness();

    let result = h.service.load(&id("missing")).await;

    assert_eq!(result.unwrap_err(), DirectiveError::NotInitialized);
}

#[tokio::test]
async fn list_returns_every_workflow() {
    let h = harness();
    h.service.draft("Alpha", "First", None).await.unwrap();
    h.service.draft("Beta", "Second", None).await.unwrap();
    h.service.add_step(&id("alpha"), "Go", None).await.unwrap();

    let views = h.service.list().await.unwrap();

    assert_eq!(views.len(), 2);
    assert_eq!(views[0].name(), Some("Alpha"));
    assert_eq!(views[0].step_count(), 1);
    assert_eq!(views[1].name(), Some("Beta"));
}

// ============================================================================
// Steps
// ============================================================================

#[tokio::test]
async fn add_step_returns_the_inserted_step() {
    let h = harness();
    let wf = with_steps(&h.service, &["S1", "S2", "S3"]).await;

    let step = h.service.add_step(&wf, "S1.5", Some("1")).await.unwrap();

    assert_eq!(step.content(), "S1.5");
    assert_eq!(step.position().get(), 2);
    let workflow = h.service.load(&wf).await.unwrap();
    assert_eq!(step_contents(&workflow), vec!["S1", "S1.5", "S2", "S3"]);
}

#[tokio::test]
async fn move_step_by_position() {
    let h = harness();
    let wf = with_steps(&h.service, &["S1", "S2", "S3", "S4"]).await;

    let workflow = h.service.move_step(&wf, "1", Some("3")).await.unwrap();

    assert_eq!(step_contents(&workflow), vec!["S2", "S3", "S1", "S4"]);
    let positions: Vec<u32> = workflow.steps().iter().map(|s| s.position().get()).collect();
    assert_eq!(positions, vec![1, 2, 3, 4]);
}

#[tokio::test]
async fn remove_step_by_id_closes_gap() {
    let h = harness();
    let wf = with_steps(&h.service, &["S1", "S2", "S3"]).await;
    let second = h.service.load(&wf).await.unwrap().steps().as_slice()[1]
        .id()
        .to_string();

    let workflow = h.service.remove_step(&wf, &second).await.unwrap();

    assert_eq!(step_contents(&workflow), vec!["S1", "S3"]);
    assert_eq!(workflow.steps().as_slice()[1].position().get(), 2);
}

#[tokio::test]
async fn edit_step_keeps_position() {
    let h = harness();
    let wf = with_steps(&h.service, &["S1", "S2"]).await;

    let workflow = h.service.update_step(&wf, "2", "Second").await.unwrap();

    assert_eq!(step_contents(&workflow), vec!["S1", "Second"]);
}

#[tokio::test]
async fn unknown_step_id_is_foreign() {
    let h = harness();
    let wf = with_steps(&h.service, &["S1"]).await;

    let err = h.service.remove_step(&wf, "nope").await.unwrap_err();

    assert_eq!(
        directive_error(&err),
        &DirectiveError::ForeignStepReference {
            step_id: "nope".to_string()
        }
    );
}

#[tokio::test]
async fn position_past_the_end_is_rejected() {
    let h = harness();
    let wf = with_steps(&h.service, &["S1"]).await;

    let err = h.service.move_step(&wf, "5", None).await.unwrap_err();

    assert!(matches!(
        directive_error(&err),
        DirectiveError::Validation { field: "step position", .. }
    ));
}

// ============================================================================
// Notifications and lifecycle
// ============================================================================

#[tokio::test]
async fn execute_reports_one_notification() {
    let h = harness();
    let wf = with_steps(&h.service, &["S1", "S2"]).await;

    let outcome = h
        .service
        .execute(&wf, WorkflowCommand::Publish)
        .await
        .unwrap();

    assert_eq!(outcome.notifications.len(), 1);
    assert_eq!(outcome.notifications[0].kind, NotificationKind::Published);
    assert_eq!(outcome.view.state(), Some(DirectiveState::Published));
}

#[tokio::test]
async fn no_op_move_reports_nothing() {
    let h = harness();
    let wf = with_steps(&h.service, &["S1", "S2"]).await;
    let workflow = h.service.load(&wf).await.unwrap();
    let first = workflow.steps().as_slice()[0].id().clone();

    let outcome = h
        .service
        .execute(
            &wf,
            WorkflowCommand::MoveStepAfter {
                step_id: first.clone(),
                after: Some(first),
            },
        )
        .await
        .unwrap();

    assert!(outcome.notifications.is_empty());
    assert_eq!(h.service.load(&wf).await.unwrap().updated_at(), workflow.updated_at());
}

#[tokio::test]
async fn archived_workflow_rejects_edits() {
    let h = harness();
    let wf = with_steps(&h.service, &["S1"]).await;
    h.service.archive(&wf).await.unwrap();

    let err = h.service.add_step(&wf, "Late", None).await.unwrap_err();

    assert!(matches!(
        directive_error(&err),
        DirectiveError::DirectiveArchived { .. }
    ));
}

#[tokio::test]
async fn content_can_be_set_and_cleared() {
    let h = harness();
    let wf = with_steps(&h.service, &[]).await;

    let workflow = h.service.update_content(&wf, Some("Body")).await.unwrap();
    assert_eq!(workflow.content(), Some("Body"));

    let workflow = h.service.update_content(&wf, None).await.unwrap();
    assert_eq!(workflow.content(), None);
}

// ============================================================================
// Examples
// ============================================================================

#[tokio::test]
async fn example_round_trip_through_store() {
    let h = harness();
    let wf = with_steps(&h.service, &[]).await;

    let example = h
        .service
        .add_example(&wf, ExampleFields::new("Hotfix", "patch", "ship"))
        .await
        .unwrap();
    let workflow = h
        .service
        .update_example(
            &wf,
            example.id().as_str(),
            ExampleFields::new("Hotfix", "patch", "ship today"),
        )
        .await
        .unwrap();
    assert_eq!(workflow.examples()[0].output(), "ship today");

    let workflow = h
        .service
        .remove_example(&wf, example.id().as_str())
        .await
        .unwrap();
    assert!(workflow.examples().is_empty());
}

// ============================================================================
// Logging and error mapping
// ============================================================================

#[tokio::test]
async fn logger_records_commands_and_notifications() {
    let h = harness();
    let logs = TempDir::new().unwrap();
    let logger = Arc::new(StructuredLogger::new("s1", logs.path()).unwrap());
    let service = AuthoringService::new(h.service.store().clone(), DirectiveServices::default())
        .with_logger(logger.clone());

    service.draft("Logged", "Has a log", None).await.unwrap();
    service.publish(&id("logged")).await.unwrap();
    let _ = service.publish(&id("logged")).await;

    let content = std::fs::read_to_string(logger.path()).unwrap();
    let types: Vec<String> = content
        .lines()
        .map(|line| {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            value["event"]["type"].as_str().unwrap().to_string()
        })
        .collect();
    assert_eq!(
        types,
        vec![
            "WorkflowCommand",
            "WorkflowCommand",
            "DirectiveNotification",
            "WorkflowCommand",
            "CommandFailed",
        ]
    );
}

#[test]
fn resolve_step_passes_ids_through() {
    let services = DirectiveServices::default();
    let workflow = Workflow::draft(id("w"), "W", "d", &services).unwrap();

    assert_eq!(
        resolve_step(&workflow, "abc-123").unwrap(),
        StepId::from("abc-123")
    );
    assert!(resolve_step(&workflow, "1").is_err());
}

#[test]
fn aggregate_errors_map_to_domain_errors() {
    assert_eq!(
        map_aggregate_error(AggregateError::UserError(DirectiveError::NotInitialized)),
        DirectiveError::NotInitialized
    );
    assert!(matches!(
        map_aggregate_error(AggregateError::AggregateConflict),
        DirectiveError::ConcurrencyConflict { .. }
    ));
    let io = std::io::Error::other("disk gone");
    assert!(matches!(
        map_aggregate_error(AggregateError::UnexpectedError(Box::new(io))),
        DirectiveError::StorageFailure { .. }
    ));
}
