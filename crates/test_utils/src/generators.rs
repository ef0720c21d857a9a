//! Property-Based Test Generators
//!
//! proptest strategies for lots, notes and departments that stay within
//! what the store accepts.

use domain_cases::{Department, FinalDecision};
use proptest::prelude::*;

/// Strategy for lot identifiers such as `LOT-2026-0042`
pub fn lot_id_strategy() -> impl Strategy<Value = String> {
    (2020u32..2030, 0u32..10_000).prop_map(|(year, n)| format!("LOT-{}-{:04}", year, n))
}

/// Strategy for free-text notes, including separators and commas
pub fn note_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[A-Za-z0-9 ,.:;'-]{1,60}",
        "[a-z ]{1,20}\\|\\|[a-z ]{1,20}",
        "[a-z ]{1,20}\n[a-z ]{1,20}",
        Just("quoted \"value\", with comma".to_string()),
    ]
    .prop_filter("notes are non-blank", |s| !s.trim().is_empty())
}

/// Strategy for the default steel-mill departments
pub fn department_strategy() -> impl Strategy<Value = Department> {
    prop_oneof![Just("QC"), Just("QA"), Just("MCS")]
        .prop_map(|label| Department::new(label).expect("non-empty label"))
}

/// Strategy for investigating departments only
pub fn investigator_strategy() -> impl Strategy<Value = Department> {
    prop_oneof![Just("QC"), Just("QA")]
        .prop_map(|label| Department::new(label).expect("non-empty label"))
}

pub fn final_decision_strategy() -> impl Strategy<Value = FinalDecision> {
    prop_oneof![
        Just(FinalDecision::Approve),
        Just(FinalDecision::Compromise),
        Just(FinalDecision::Reject),
    ]
}
