//! Per-account balance projection.
//!
//! A [`Register`] is the ordered subsequence of transactions that touch
//! one account - as owner, as transfer target, or via a split leg -
//! each row paired with the running balance up to and including it.
//!
//! The projection is maintained incrementally as the transaction book
//! mutates. The contract is equivalence: after any sequence of
//! [`Register::insert`] and [`Register::remove`] calls, every row's
//! balance equals what [`Register::build`] computes from scratch.

use crate::book::transaction::Transaction;
use crate::ledger::Ledger;
use crate::types::{AccountId, Money, TxnId};
use chrono::NaiveDate;

/// One projected row: a transaction's contribution to the account and
/// the running balance through it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterRow {
    /// The transaction behind this row.
    pub txn: TxnId,
    /// The transaction's date.
    pub date: NaiveDate,
    /// Signed contribution to this account.
    pub contribution: Money,
    /// Cumulative balance through this row.
    pub balance: Money,
}

/// The balance projection for one account.
#[derive(Debug, Clone)]
pub struct Register {
    account: AccountId,
    rows: Vec<RegisterRow>,
}

impl Register {
    /// Creates an empty projection for an account.
    pub fn new(account: AccountId) -> Self {
        Self {
            account,
            rows: Vec::new(),
        }
    }

    /// Builds the projection from scratch over the ledger's
    /// transaction book.
    ///
    /// This is the reference computation that the incremental
    /// operations must reproduce exactly.
    pub fn build(ledger: &Ledger, account: AccountId) -> Self {
        let mut register = Self::new(account);
        let mut balance = Money::ZERO;
        for txn in ledger.transactions().iter() {
            if let Some(contribution) = txn.contribution_for(account) {
                balance += contribution;
                register.rows.push(RegisterRow {
                    txn: txn.id(),
                    date: txn.date,
                    contribution,
                    balance,
                });
            }
        }
        register
    }

    /// The account this projection is for.
    pub fn account(&self) -> AccountId {
        self.account
    }

    /// The projected rows in date order.
    pub fn rows(&self) -> &[RegisterRow] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the projection has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The balance after the last row.
    pub fn closing_balance(&self) -> Money {
        self.rows.last().map_or(Money::ZERO, |row| row.balance)
    }

    /// Inserts a transaction's row and returns its index, or `None` if
    /// the transaction does not touch this account.
    ///
    /// `at` is the row index when the caller already knows it (for
    /// instance from tracking the book's own insertion); `None` makes
    /// the register find the position itself with an upper-bound
    /// search by date. Every row after the insertion point is
    /// re-derived by re-applying its own contribution to the running
    /// total - contributions are type-dependent, so a flat delta-add
    /// would be wrong.
    pub fn insert(&mut self, at: Option<usize>, txn: &Transaction) -> Option<usize> {
        let contribution = txn.contribution_for(self.account)?;
        let at = at.unwrap_or_else(|| self.rows.partition_point(|row| row.date <= txn.date));
        self.rows.insert(
            at,
            RegisterRow {
                txn: txn.id(),
                date: txn.date,
                contribution,
                balance: Money::ZERO,
            },
        );
        self.reflow_from(at);
        Some(at)
    }

    /// Removes a transaction's row and returns the index it held, or
    /// `None` if no row matches.
    ///
    /// Every following row is re-derived from the predecessor's
    /// balance.
    pub fn remove(&mut self, txn: TxnId) -> Option<usize> {
        let at = self.rows.iter().position(|row| row.txn == txn)?;
        self.rows.remove(at);
        self.reflow_from(at);
        Some(at)
    }

    /// Re-derives balances from row `start` to the end, seeding the
    /// running total with the predecessor's balance.
    fn reflow_from(&mut self, start: usize) {
        let mut running = if start == 0 {
            Money::ZERO
        } else {
            self.rows[start - 1].balance
        };
        for row in &mut self.rows[start..] {
            running += row.contribution;
            row.balance = running;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::transaction::Split;
    use crate::element::{Account, AccountKind};

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn ledger_with_account() -> (Ledger, AccountId) {
        let mut ledger = Ledger::new();
        let account = ledger
            .add_account(Account::new("Checking", AccountKind::Bank))
            .unwrap();
        (ledger, account)
    }

    #[test]
    fn out_of_order_inserts_running_balance() {
        // +100.00 on 03-01, then -30.00 on 01-01, then +50.00 on
        // 02-01; balances come out -30.00, 20.00, 120.00.
        let (mut ledger, account) = ledger_with_account();
        ledger
            .insert_transaction(Transaction::new(
                day(3, 1),
                account,
                Money::from_cents(10_000),
                "a",
            ))
            .unwrap();
        ledger
            .insert_transaction(Transaction::new(
                day(1, 1),
                account,
                Money::from_cents(-3_000),
                "b",
            ))
            .unwrap();
        ledger
            .insert_transaction(Transaction::new(
                day(2, 1),
                account,
                Money::from_cents(5_000),
                "c",
            ))
            .unwrap();

        let register = ledger.register(account);
        let balances: Vec<i64> = register.rows().iter().map(|r| r.balance.cents()).collect();
        assert_eq!(balances, vec![-3_000, 2_000, 12_000]);
    }

    #[test]
    fn incremental_insert_matches_build() {
        let (mut ledger, account) = ledger_with_account();
        let mut register = Register::new(account);

        for (m, d, cents) in [(3, 1, 10_000), (1, 1, -3_000), (2, 1, 5_000), (2, 1, 700)] {
            let (id, _) = ledger
                .insert_transaction(Transaction::new(
                    day(m, d),
                    account,
                    Money::from_cents(cents),
                    "t",
                ))
                .unwrap();
            let txn = ledger.transactions().get(id).unwrap().clone();
            register.insert(None, &txn);

            let rebuilt = Register::build(&ledger, account);
            assert_eq!(register.rows(), rebuilt.rows());
        }
    }

    #[test]
    fn incremental_remove_matches_build() {
        let (mut ledger, account) = ledger_with_account();
        let mut ids = Vec::new();
        for (m, d, cents) in [(1, 5, 100), (1, 5, 200), (2, 10, -50), (3, 1, 75)] {
            let (id, _) = ledger
                .insert_transaction(Transaction::new(
                    day(m, d),
                    account,
                    Money::from_cents(cents),
                    "t",
                ))
                .unwrap();
            ids.push(id);
        }
        let mut register = Register::build(&ledger, account);

        // Remove from the middle, then the front, checking against a
        // rebuild each time.
        for id in [ids[1], ids[0], ids[3]] {
            ledger.remove_transaction(id).unwrap();
            register.remove(id).unwrap();
            let rebuilt = Register::build(&ledger, account);
            assert_eq!(register.rows(), rebuilt.rows());
        }
    }

    #[test]
    fn insert_with_known_position() {
        let (mut ledger, account) = ledger_with_account();
        let (id, _) = ledger
            .insert_transaction(Transaction::new(
                day(1, 1),
                account,
                Money::from_cents(100),
                "t",
            ))
            .unwrap();
        let txn = ledger.transactions().get(id).unwrap().clone();

        let mut register = Register::new(account);
        assert_eq!(register.insert(Some(0), &txn), Some(0));
        assert_eq!(register.closing_balance(), Money::from_cents(100));
    }

    #[test]
    fn foreign_transaction_yields_no_row() {
        let (mut ledger, account) = ledger_with_account();
        let other = ledger
            .add_account(Account::new("Savings", AccountKind::Bank))
            .unwrap();
        let (id, _) = ledger
            .insert_transaction(Transaction::new(
                day(1, 1),
                other,
                Money::from_cents(100),
                "t",
            ))
            .unwrap();
        let txn = ledger.transactions().get(id).unwrap().clone();

        let mut register = Register::new(account);
        assert_eq!(register.insert(None, &txn), None);
        assert!(register.is_empty());
        assert_eq!(register.remove(id), None);
    }

    #[test]
    fn split_projection_three_views() {
        // A +100.00 transaction on the source, split 40/60 to two
        // target accounts: the source shows +100.00, the targets show
        // -40.00 and -60.00.
        let mut ledger = Ledger::new();
        let source = ledger
            .add_account(Account::new("Checking", AccountKind::Bank))
            .unwrap();
        let target_a = ledger
            .add_account(Account::new("Savings", AccountKind::Bank))
            .unwrap();
        let target_b = ledger
            .add_account(Account::new("Vacation", AccountKind::Bank))
            .unwrap();

        ledger
            .insert_transaction(
                Transaction::new(day(4, 1), source, Money::from_cents(10_000), "move").with_splits(
                    vec![
                        Split::to_account("a", target_a, Money::from_cents(4_000)),
                        Split::to_account("b", target_b, Money::from_cents(6_000)),
                    ],
                ),
            )
            .unwrap();

        assert_eq!(
            ledger.register(source).closing_balance(),
            Money::from_cents(10_000)
        );
        assert_eq!(
            ledger.register(target_a).closing_balance(),
            Money::from_cents(-4_000)
        );
        assert_eq!(
            ledger.register(target_b).closing_balance(),
            Money::from_cents(-6_000)
        );
    }
}
