use super::*;
use proptest::prelude::*;

fn ts() -> TimestampUtc {
    TimestampUtc::now()
}

/// Builds [s1@1, s2@2, ..., sN@N].
fn sequence_of(n: usize) -> StepSequence {
    let mut seq = StepSequence::new();
    let mut last: Option<StepId> = None;
    for i in 1..=n {
        let step = seq
            .insert(
                StepId(format!("s{}", i)),
                format!("step {}", i),
                last.as_ref(),
                ts(),
            )
            .unwrap();
        last = Some(step.id().clone());
    }
    seq
}

fn layout(seq: &StepSequence) -> Vec<(String, u32)> {
    seq.iter()
        .map(|s| (s.id().to_string(), s.position().get()))
        .collect()
}

fn ids(seq: &StepSequence) -> Vec<String> {
    seq.iter().map(|s| s.id().to_string()).collect()
}

fn id(s: &str) -> StepId {
    StepId::from(s)
}

fn assert_dense(seq: &StepSequence) {
    let positions: Vec<u32> = seq.iter().map(|s| s.position().get()).collect();
    let expected: Vec<u32> = (1..=seq.len() as u32).collect();
    assert_eq!(positions, expected);
}

// ============================================================================
// Insert
// ============================================================================

#[test]
fn insert_into_empty_sequence_lands_at_one() {
    let mut seq = StepSequence::new();
    let step = seq.insert(id("x"), "x".into(), None, ts()).unwrap();
    assert_eq!(step.position(), StepPosition(1));
    assert_eq!(seq.len(), 1);
}

#[test]
fn insert_without_anchor_prepends_and_shifts_everything() {
    let mut seq = sequence_of(3);
    let step = seq.insert(id("new"), "new".into(), None, ts()).unwrap();
    assert_eq!(step.position(), StepPosition(1));
    assert_eq!(
        layout(&seq),
        vec![
            ("new".to_string(), 1),
            ("s1".to_string(), 2),
            ("s2".to_string(), 3),
            ("s3".to_string(), 4),
        ]
    );
}

#[test]
fn insert_after_step_takes_next_slot() {
    let mut seq = sequence_of(3);
    let step = seq
        .insert(id("new"), "new".into(), Some(&id("s1")), ts())
        .unwrap();
    assert_eq!(step.position(), StepPosition(2));
    assert_eq!(ids(&seq), vec!["s1", "new", "s2", "s3"]);
    assert_dense(&seq);
}

#[test]
fn insert_after_last_appends() {
    let mut seq = sequence_of(3);
    seq.insert(id("new"), "new".into(), Some(&id("s3")), ts())
        .unwrap();
    assert_eq!(ids(&seq), vec!["s1", "s2", "s3", "new"]);
}

#[test]
fn insert_after_foreign_step_fails_without_change() {
    let mut seq = sequence_of(2);
    let before = seq.clone();
    let err = seq
        .insert(id("new"), "new".into(), Some(&id("elsewhere")), ts())
        .unwrap_err();
    assert_eq!(
        err,
        DirectiveError::ForeignStepReference {
            step_id: "elsewhere".to_string()
        }
    );
    assert_eq!(seq, before);
}

#[test]
fn insert_rejects_duplicate_id() {
    let mut seq = sequence_of(2);
    assert!(matches!(
        seq.insert(id("s1"), "again".into(), None, ts()),
        Err(DirectiveError::Validation { .. })
    ));
    assert_eq!(seq.len(), 2);
}

#[test]
fn shifted_steps_are_restamped_and_others_are_not() {
    let start = ts();
    let mut seq = StepSequence::new();
    seq.insert(id("a"), "a".into(), None, start).unwrap();
    seq.insert(id("b"), "b".into(), Some(&id("a")), start)
        .unwrap();

    let later = TimestampUtc(start.0 + chrono::Duration::seconds(5));
    seq.insert(id("c"), "c".into(), Some(&id("a")), later)
        .unwrap();

    assert_eq!(seq.get(&id("a")).unwrap().updated_at(), start);
    assert_eq!(seq.get(&id("b")).unwrap().updated_at(), later);
}

// ============================================================================
// Remove
// ============================================================================

#[test]
fn remove_closes_the_gap() {
    let mut seq = sequence_of(4);
    let removed = seq.remove(&id("s2"), ts()).unwrap();
    assert_eq!(removed.position(), StepPosition(2));
    assert_eq!(
        layout(&seq),
        vec![
            ("s1".to_string(), 1),
            ("s3".to_string(), 2),
            ("s4".to_string(), 3),
        ]
    );
}

#[test]
fn remove_last_remaining_step_leaves_empty_sequence() {
    let mut seq = StepSequence::new();
    seq.insert(id("x"), "x".into(), None, ts()).unwrap();
    seq.remove(&id("x"), ts()).unwrap();
    assert!(seq.is_empty());
}

#[test]
fn remove_foreign_step_fails() {
    let mut seq = sequence_of(2);
    assert!(matches!(
        seq.remove(&id("nope"), ts()),
        Err(DirectiveError::ForeignStepReference { .. })
    ));
    assert_eq!(seq.len(), 2);
}

// ============================================================================
// Move
// ============================================================================

#[test]
fn move_first_after_last() {
    let mut seq = sequence_of(3);
    let outcome = seq.move_after(&id("s1"), Some(&id("s3")), ts()).unwrap();
    assert_eq!(
        outcome,
        MoveOutcome::Moved {
            from: StepPosition(1),
            to: StepPosition(3)
        }
    );
    assert_eq!(
        layout(&seq),
        vec![
            ("s2".to_string(), 1),
            ("s3".to_string(), 2),
            ("s1".to_string(), 3),
        ]
    );
}

#[test]
fn move_to_front() {
    let mut seq = sequence_of(3);
    seq.move_after(&id("s1"), Some(&id("s3")), ts()).unwrap();
    seq.move_after(&id("s3"), None, ts()).unwrap();
    assert_eq!(
        layout(&seq),
        vec![
            ("s3".to_string(), 1),
            ("s2".to_string(), 2),
            ("s1".to_string(), 3),
        ]
    );
}

#[test]
fn move_forward_into_the_middle() {
    let mut seq = sequence_of(5);
    seq.move_after(&id("s2"), Some(&id("s4")), ts()).unwrap();
    assert_eq!(ids(&seq), vec!["s1", "s3", "s4", "s2", "s5"]);
    assert_dense(&seq);
}

#[test]
fn move_backward_into_the_middle() {
    let mut seq = sequence_of(5);
    seq.move_after(&id("s5"), Some(&id("s2")), ts()).unwrap();
    assert_eq!(ids(&seq), vec!["s1", "s2", "s5", "s3", "s4"]);
    assert_dense(&seq);
}

#[test]
fn move_after_itself_is_a_no_op() {
    let mut seq = sequence_of(3);
    let before = seq.clone();
    let outcome = seq.move_after(&id("s2"), Some(&id("s2")), ts()).unwrap();
    assert_eq!(outcome, MoveOutcome::Unchanged);
    assert_eq!(seq, before);
}

#[test]
fn move_after_current_predecessor_is_a_no_op() {
    let mut seq = sequence_of(3);
    let before = seq.clone();
    assert_eq!(
        seq.move_after(&id("s3"), Some(&id("s2")), ts()).unwrap(),
        MoveOutcome::Unchanged
    );
    assert_eq!(
        seq.move_after(&id("s1"), None, ts()).unwrap(),
        MoveOutcome::Unchanged
    );
    assert_eq!(seq, before);
}

#[test]
fn move_with_foreign_references_fails() {
    let mut seq = sequence_of(3);
    assert!(matches!(
        seq.move_after(&id("ghost"), None, ts()),
        Err(DirectiveError::ForeignStepReference { .. })
    ));
    assert!(matches!(
        seq.move_after(&id("s1"), Some(&id("ghost")), ts()),
        Err(DirectiveError::ForeignStepReference { .. })
    ));
    assert_eq!(ids(&seq), vec!["s1", "s2", "s3"]);
}

#[test]
fn move_round_trip_restores_order() {
    let mut seq = sequence_of(4);
    let original = layout(&seq);
    seq.move_after(&id("s2"), Some(&id("s4")), ts()).unwrap();
    seq.move_after(&id("s2"), Some(&id("s1")), ts()).unwrap();
    assert_eq!(layout(&seq), original);
}

// ============================================================================
// Content and loading
// ============================================================================

#[test]
fn replace_content_keeps_positions() {
    let mut seq = sequence_of(3);
    let updated = seq
        .replace_content(&id("s2"), "rewritten".into(), ts())
        .unwrap();
    assert_eq!(updated.content(), "rewritten");
    assert_eq!(updated.position(), StepPosition(2));
    assert_eq!(ids(&seq), vec!["s1", "s2", "s3"]);
}

#[test]
fn at_looks_up_by_position() {
    let seq = sequence_of(3);
    assert_eq!(seq.at(StepPosition(2)).unwrap().id(), &id("s2"));
    assert!(seq.at(StepPosition(0)).is_none());
    assert!(seq.at(StepPosition(4)).is_none());
}

#[test]
fn from_steps_sorts_persisted_steps() {
    let seq = sequence_of(3);
    let mut steps: Vec<OrderedStep> = seq.clone().into();
    steps.reverse();
    assert_eq!(StepSequence::from_steps(steps).unwrap(), seq);
}

#[test]
fn from_steps_rejects_gaps_and_duplicates() {
    let at = ts();
    let gap = vec![
        OrderedStep::new(id("a"), "a".into(), StepPosition(1), at),
        OrderedStep::new(id("b"), "b".into(), StepPosition(3), at),
    ];
    assert!(matches!(
        StepSequence::from_steps(gap),
        Err(DirectiveError::InconsistentSequence { .. })
    ));

    let duplicate_position = vec![
        OrderedStep::new(id("a"), "a".into(), StepPosition(1), at),
        OrderedStep::new(id("b"), "b".into(), StepPosition(1), at),
    ];
    assert!(StepSequence::from_steps(duplicate_position).is_err());

    let zero = vec![OrderedStep::new(id("a"), "a".into(), StepPosition(0), at)];
    assert!(StepSequence::from_steps(zero).is_err());

    let duplicate_id = vec![
        OrderedStep::new(id("a"), "a".into(), StepPosition(1), at),
        OrderedStep::new(id("a"), "b".into(), StepPosition(2), at),
    ];
    assert!(StepSequence::from_steps(duplicate_id).is_err());
}

#[test]
fn deserializing_a_gapped_list_fails() {
    let seq = sequence_of(2);
    let mut json = serde_json::to_value(&seq).unwrap();
    json[1]["position"] = serde_json::json!(5);
    assert!(serde_json::from_value::<StepSequence>(json).is_err());
}

// ============================================================================
// Properties
// ============================================================================

#[derive(Debug, Clone)]
enum Op {
    Insert { after: Option<usize> },
    Remove { pick: usize },
    Move { pick: usize, after: Option<usize> },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        proptest::option::of(0usize..16).prop_map(|after| Op::Insert { after }),
        (0usize..16).prop_map(|pick| Op::Remove { pick }),
        (0usize..16, proptest::option::of(0usize..16))
            .prop_map(|(pick, after)| Op::Move { pick, after }),
    ]
}

fn pick(seq: &StepSequence, index: usize) -> Option<StepId> {
    if seq.is_empty() {
        return None;
    }
    seq.as_slice()
        .get(index % seq.len())
        .map(|s| s.id().clone())
}

proptest! {
    #[test]
    fn positions_stay_dense(ops in proptest::collection::vec(op_strategy(), 0..60)) {
        let mut seq = StepSequence::new();
        let mut counter = 0;
        for op in ops {
            match op {
                Op::Insert { after } => {
                    counter += 1;
                    let anchor = after.and_then(|i| pick(&seq, i));
                    seq.insert(StepId(format!("p{}", counter)), "x".into(), anchor.as_ref(), ts())
                        .unwrap();
                }
                Op::Remove { pick: i } => {
                    if let Some(target) = pick(&seq, i) {
                        seq.remove(&target, ts()).unwrap();
                    }
                }
                Op::Move { pick: i, after } => {
                    if let Some(target) = pick(&seq, i) {
                        let anchor = after.and_then(|a| pick(&seq, a));
                        seq.move_after(&target, anchor.as_ref(), ts()).unwrap();
                    }
                }
            }
            let positions: Vec<u32> = seq.iter().map(|s| s.position().get()).collect();
            let expected: Vec<u32> = (1..=seq.len() as u32).collect();
            prop_assert_eq!(positions, expected);
        }
    }

    #[test]
    fn move_then_move_back_restores_permutation(n in 3usize..10, a in 0usize..10, b in 0usize..10) {
        let mut seq = sequence_of(n);
        let original = layout(&seq);
        let moving = pick(&seq, a).unwrap();
        let anchor = pick(&seq, b).unwrap();
        let predecessor = seq
            .get(&moving)
            .map(|s| s.position())
            .filter(|p| p.get() > 1)
            .and_then(|p| seq.at(StepPosition(p.get() - 1)))
            .map(|s| s.id().clone());

        seq.move_after(&moving, Some(&anchor), ts()).unwrap();
        seq.move_after(&moving, predecessor.as_ref(), ts()).unwrap();

        prop_assert_eq!(layout(&seq), original);
    }

    #[test]
    fn move_matches_remove_then_reinsert_order(n in 2usize..10, a in 0usize..10, b in proptest::option::of(0usize..10)) {
        let mut seq = sequence_of(n);
        let moving = pick(&seq, a).unwrap();
        let anchor = b.and_then(|i| pick(&seq, i));

        let mut expected = ids(&seq);
        if anchor.as_ref() != Some(&moving) {
            let from = expected.iter().position(|s| s == moving.as_str()).unwrap();
            let item = expected.remove(from);
            let slot = match &anchor {
                Some(anchor) => expected.iter().position(|s| s == anchor.as_str()).unwrap() + 1,
                None => 0,
            };
            expected.insert(slot, item);
        }

        seq.move_after(&moving, anchor.as_ref(), ts()).unwrap();
        prop_assert_eq!(ids(&seq), expected);
    }
}
