//! Tests for WorkflowView, the summary projection.

use super::*;
use crate::domain::example::ExampleFields;
use crate::domain::types::{ExampleId, StepId};

fn drafted_event(at: TimestampUtc) -> WorkflowEvent {
    WorkflowEvent::WorkflowDrafted {
        id: DirectiveId::parse("triage").unwrap(),
        name: "Triage".to_string(),
        description: "Sort incoming issues".to_string(),
        drafted_at: at,
    }
}

fn step_added(id: &str, at: TimestampUtc) -> WorkflowEvent {
    WorkflowEvent::StepAdded {
        step_id: StepId::from(id),
        content: format!("do {}", id),
        after: None,
        added_at: at,
    }
}

#[test]
fn drafted_event_populates_summary() {
    let at = TimestampUtc::now();
    let mut view = WorkflowView::default();

    view.apply_event("triage", &drafted_event(at), 1);

    assert_eq!(view.directive_id().unwrap().as_str(), "triage");
    assert_eq!(view.name(), Some("Triage"));
    assert_eq!(view.state(), Some(DirectiveState::Draft));
    assert_eq!(view.created_at(), Some(at));
    assert_eq!(view.updated_at(), Some(at));
    assert_eq!(view.last_event_sequence(), 1);
}

#[test]
fn counts_follow_adds_and_removes() {
    let at = TimestampUtc::now();
    let mut view = WorkflowView::default();
    view.apply_event("triage", &drafted_event(at), 1);
    view.apply_event("triage", &step_added("a", at), 2);
    view.apply_event("triage", &step_added("b", at), 3);
    view.apply_event(
        "triage",
        &WorkflowEvent::StepRemoved {
            step_id: StepId::from("a"),
            removed_at: at,
        },
        4,
    );
    view.apply_event(
        "triage",
        &WorkflowEvent::ExampleAdded {
            example_id: ExampleId::from("e1"),
            fields: ExampleFields::new("bug", "crash log", "label: bug"),
            added_at: at,
        },
        5,
    );

    assert_eq!(view.step_count(), 1);
    assert_eq!(view.example_count(), 1);
    assert_eq!(view.last_event_sequence(), 5);
}

#[test]
fn lifecycle_events_update_state_and_timestamp() {
    let start = TimestampUtc::now();
    let later = TimestampUtc(start.0 + chrono::Duration::seconds(60));
    let mut view = WorkflowView::default();
    view.apply_event("triage", &drafted_event(start), 1);

    view.apply_event(
        "triage",
        &WorkflowEvent::WorkflowPublished {
            published_at: later,
        },
        2,
    );

    assert_eq!(view.state(), Some(DirectiveState::Published));
    assert_eq!(view.created_at(), Some(start));
    assert_eq!(view.updated_at(), Some(later));
}

#[test]
fn content_flag_tracks_clearing() {
    let at = TimestampUtc::now();
    let mut view = WorkflowView::default();
    view.apply_event("triage", &drafted_event(at), 1);

    view.apply_event(
        "triage",
        &WorkflowEvent::ContentUpdated {
            content: Some("Body".to_string()),
            updated_at: at,
        },
        2,
    );
    assert!(view.has_content());

    view.apply_event(
        "triage",
        &WorkflowEvent::ContentUpdated {
            content: None,
            updated_at: at,
        },
        3,
    );
    assert!(!view.has_content());
}

#[test]
fn invalid_aggregate_id_keeps_previous_id() {
    let at = TimestampUtc::now();
    let mut view = WorkflowView::default();
    view.apply_event("triage", &drafted_event(at), 1);

    view.apply_event("Not Kebab", &step_added("a", at), 2);

    assert_eq!(view.directive_id().unwrap().as_str(), "triage");
    assert_eq!(view.last_event_sequence(), 2);
}
