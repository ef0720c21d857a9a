//! Custom Test Assertions
//!
//! Assertion helpers for cases that give more meaningful failure messages
//! than comparing whole structs.

use domain_cases::{Case, FinalDecision, Handler};

/// Asserts that `after` keeps every history entry of `before` and adds at least one
///
/// # Panics
///
/// Panics if history shrank, did not grow, or an earlier entry changed
pub fn assert_history_extends(before: &Case, after: &Case) {
    let old = before.action_history.entries();
    let new = after.action_history.entries();
    assert!(
        new.len() > old.len(),
        "History of {} did not grow: before={}, after={}",
        after.lot_id,
        old.len(),
        new.len()
    );
    assert_eq!(
        &new[..old.len()],
        old,
        "History of {} was rewritten instead of appended to",
        after.lot_id
    );
}

/// Asserts that a case is closed with the given decision
pub fn assert_closed_with(case: &Case, decision: FinalDecision) {
    assert!(
        case.is_closed(),
        "Expected {} to be closed, status is {}",
        case.lot_id,
        case.status
    );
    assert_eq!(case.final_decision, Some(decision), "Wrong decision on {}", case.lot_id);
    assert_eq!(case.current_handler, Handler::Completed, "Closed case {} still has a handler", case.lot_id);
}

/// Asserts that `cases` contains no case for `lot_id`
pub fn assert_lot_absent(cases: &[Case], lot_id: &str) {
    assert!(
        cases.iter().all(|c| c.lot_id != lot_id),
        "Did not expect {} in {:?}",
        lot_id,
        cases.iter().map(|c| c.lot_id.as_str()).collect::<Vec<_>>()
    );
}

/// Asserts that the cases are in non-decreasing creation order
pub fn assert_creation_order(cases: &[Case]) {
    for pair in cases.windows(2) {
        assert!(
            pair[0].created_at <= pair[1].created_at,
            "Cases out of order: {} at {} before {} at {}",
            pair[0].lot_id,
            pair[0].created_at,
            pair[1].lot_id,
            pair[1].created_at
        );
    }
}
