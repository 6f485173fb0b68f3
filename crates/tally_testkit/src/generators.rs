//! Property-based test generators using proptest.
//!
//! Provides strategies for random ledger data that respects the
//! domain's invariants (valid dates, 2-decimal amounts, bounded
//! strings).

use chrono::NaiveDate;
use proptest::prelude::*;
use tally_core::{Money, ReconcilePair, ReconcileState};

/// Strategy for calendar dates between 2000 and 2035.
pub fn date_strategy() -> impl Strategy<Value = NaiveDate> {
    // Days from the common era; 730_120 is 2000-01-01.
    (730_120i32..743_000).prop_map(|days| {
        NaiveDate::from_num_days_from_ce_opt(days).expect("range holds valid dates")
    })
}

/// Strategy for signed amounts up to ten thousand currency units.
pub fn money_strategy() -> impl Strategy<Value = Money> {
    (-1_000_000i64..1_000_000).prop_map(Money::from_cents)
}

/// Strategy for entity names.
pub fn name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Z][a-z]{2,9}( [A-Z][a-z]{2,9})?").expect("valid regex")
}

/// Strategy for payee and description strings.
pub fn payee_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Za-z0-9 .'-]{1,24}").expect("valid regex")
}

/// Strategy for a single reconciliation state.
pub fn reconcile_state_strategy() -> impl Strategy<Value = ReconcileState> {
    prop_oneof![
        Just(ReconcileState::NotReconciled),
        Just(ReconcileState::Pending),
        Just(ReconcileState::Reconciled),
    ]
}

/// Strategy for a source/target reconciliation pair.
pub fn reconcile_pair_strategy() -> impl Strategy<Value = ReconcilePair> {
    (reconcile_state_strategy(), reconcile_state_strategy())
        .prop_map(|(source, target)| ReconcilePair { source, target })
}
