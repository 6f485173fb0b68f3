//! Cross-crate invariant checks: ordering, projection equivalence,
//! and whole-file codec round-trips.

use crate::fixtures::LedgerFixture;
use crate::generators::{date_strategy, money_strategy, payee_strategy, reconcile_pair_strategy};
use chrono::NaiveDate;
use proptest::prelude::*;
use tally_core::{
    InvestAction, Investment, Ledger, LotMethod, Money, Quantity, ReconcilePair, Split,
    Transaction,
};

/// Declarative transaction shape, materialized against the entity
/// fixture. Every optional wire field can be present or absent.
#[derive(Debug, Clone)]
pub struct TxnShape {
    /// Transaction date.
    pub date: NaiveDate,
    /// Transaction amount.
    pub amount: Money,
    /// Payee string.
    pub payee: String,
    /// Optional memo.
    pub memo: Option<String>,
    /// Optional check number.
    pub number: Option<String>,
    /// Attach the fixture's expense category.
    pub with_category: bool,
    /// Attach the fixture's savings account as transfer target.
    pub with_transfer: bool,
    /// Attach the fixture's security.
    pub with_security: bool,
    /// Attach the fixture's security as replacement security.
    pub with_new_security: bool,
    /// Optional investment block.
    pub invest: Option<Investment>,
    /// Split legs: (description, amount, target selector 0..3).
    pub splits: Vec<(String, Money, u8)>,
    /// Reconciliation states.
    pub reconcile: ReconcilePair,
}

/// Strategy for an investment block.
pub fn investment_strategy() -> impl Strategy<Value = Investment> {
    (
        -500_000i64..500_000,
        -500_000i64..500_000,
        0i64..10_000_000,
        0i64..100_000,
        0u8..8,
        0u8..3,
    )
        .prop_map(|(shares, new_shares, price, commission, action, lot)| Investment {
            shares: Quantity::from_ten_thousandths(shares),
            new_shares: Quantity::from_ten_thousandths(new_shares),
            price: Money::from_cents(price),
            commission: Money::from_cents(commission),
            action: InvestAction::from_byte(action).expect("range is valid"),
            lot_method: LotMethod::from_byte(lot).expect("range is valid"),
        })
}

/// Strategy for a full transaction shape.
pub fn txn_shape_strategy() -> impl Strategy<Value = TxnShape> {
    let split = (payee_strategy(), money_strategy(), 0u8..3);
    (
        (
            date_strategy(),
            money_strategy(),
            payee_strategy(),
            prop::option::of(payee_strategy()),
            prop::option::of(prop::string::string_regex("[0-9]{1,5}").expect("valid regex")),
        ),
        (any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>()),
        prop::option::of(investment_strategy()),
        prop::collection::vec(split, 0..4),
        reconcile_pair_strategy(),
    )
        .prop_map(
            |(
                (date, amount, payee, memo, number),
                (with_category, with_transfer, with_security, with_new_security),
                invest,
                splits,
                reconcile,
            )| TxnShape {
                date,
                amount,
                payee,
                memo,
                number,
                with_category,
                with_transfer,
                with_security,
                with_new_security,
                invest,
                splits,
                reconcile,
            },
        )
}

/// Materializes a shape against the fixture's entities.
pub fn build_txn(fixture: &LedgerFixture, shape: &TxnShape) -> Transaction {
    let mut txn = Transaction::new(shape.date, fixture.checking, shape.amount, shape.payee.clone());
    txn.memo = shape.memo.clone();
    txn.number = shape.number.clone();
    txn.reconcile = shape.reconcile;
    if shape.with_category {
        txn.category = Some(fixture.groceries);
    }
    if shape.with_transfer {
        txn.transfer = Some(fixture.savings);
    }
    if shape.with_security {
        txn.security = Some(fixture.fund);
    }
    if shape.with_new_security {
        txn.new_security = Some(fixture.fund);
    }
    txn.invest = shape.invest;
    txn.splits = shape
        .splits
        .iter()
        .map(|(description, amount, target)| {
            let mut split = Split {
                description: description.clone(),
                account: None,
                category: None,
                amount: *amount,
                reconcile: tally_core::ReconcileState::NotReconciled,
            };
            match target {
                1 => split.category = Some(fixture.groceries),
                2 => split.account = Some(fixture.savings),
                _ => {}
            }
            split
        })
        .collect();
    txn
}

/// Asserts two transactions carry identical field values. Runtime
/// identities are excluded; they are reassigned on reload.
pub fn assert_same_transaction(a: &Transaction, b: &Transaction) {
    assert_eq!(a.date, b.date);
    assert_eq!(a.account, b.account);
    assert_eq!(a.transfer, b.transfer);
    assert_eq!(a.category, b.category);
    assert_eq!(a.security, b.security);
    assert_eq!(a.new_security, b.new_security);
    assert_eq!(a.amount, b.amount);
    assert_eq!(a.payee, b.payee);
    assert_eq!(a.memo, b.memo);
    assert_eq!(a.number, b.number);
    assert_eq!(a.reconcile, b.reconcile);
    assert_eq!(a.invest, b.invest);
    assert_eq!(a.splits, b.splits);
}

/// Asserts a register matches a from-scratch rebuild for the same
/// account.
pub fn assert_projection_matches_rebuild(
    ledger: &Ledger,
    register: &tally_core::Register,
) {
    let rebuilt = tally_core::Register::build(ledger, register.account());
    assert_eq!(register.rows(), rebuilt.rows());
}
