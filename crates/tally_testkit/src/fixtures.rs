//! Ledger fixtures and temp-file helpers.

use chrono::NaiveDate;
use std::path::PathBuf;
use tally_core::{
    Account, AccountId, AccountKind, Category, CategoryId, CategoryKind, Ledger, Money,
    ScheduleKind, ScheduleRecord, Security, SecurityId, Split, Transaction,
};
use tempfile::TempDir;

/// A populated ledger with handles to every entity it contains.
pub struct LedgerFixture {
    /// The ledger.
    pub ledger: Ledger,
    /// A checking account.
    pub checking: AccountId,
    /// A savings account.
    pub savings: AccountId,
    /// A loan account linked to `checking`.
    pub loan: AccountId,
    /// An expense category.
    pub groceries: CategoryId,
    /// An income category.
    pub salary: CategoryId,
    /// A security with a ticker symbol.
    pub fund: SecurityId,
}

impl LedgerFixture {
    /// Entities only: three accounts (one linked), two categories, one
    /// security, empty books.
    pub fn entities() -> Self {
        let mut ledger = Ledger::new();
        let checking = ledger
            .add_account(Account::new("Checking", AccountKind::Bank))
            .expect("fresh ledger accepts account");
        let savings = ledger
            .add_account(Account::new("Savings", AccountKind::Bank))
            .expect("unique name");
        let loan = ledger
            .add_account(Account::new("Car Loan", AccountKind::Loan).with_number("L-2209"))
            .expect("unique name");
        ledger
            .set_account_link(loan, Some(checking))
            .expect("both accounts live");
        let groceries = ledger
            .add_category(Category::new("Groceries", CategoryKind::Expense))
            .expect("unique name");
        let salary = ledger
            .add_category(Category::new("Salary", CategoryKind::Income))
            .expect("unique name");
        let fund = ledger
            .add_security(Security::new("Index Fund").with_symbol("IDX"))
            .expect("unique name");
        Self {
            ledger,
            checking,
            savings,
            loan,
            groceries,
            salary,
            fund,
        }
    }

    /// The entities fixture plus a few transactions and one schedule.
    pub fn standard() -> Self {
        let mut fixture = Self::entities();
        let checking = fixture.checking;
        let savings = fixture.savings;
        let groceries = fixture.groceries;
        let salary = fixture.salary;

        fixture
            .ledger
            .insert_transaction(
                Transaction::new(day(2024, 1, 5), checking, Money::from_cents(250_000), "Payroll")
                    .with_category(salary),
            )
            .expect("references resolve");
        fixture
            .ledger
            .insert_transaction(
                Transaction::new(day(2024, 1, 12), checking, Money::from_cents(-6_450), "Market")
                    .with_category(groceries)
                    .with_memo("week 2"),
            )
            .expect("references resolve");
        fixture
            .ledger
            .insert_transaction(
                Transaction::new(
                    day(2024, 1, 31),
                    checking,
                    Money::from_cents(-50_000),
                    "Transfer to savings",
                )
                .with_transfer(savings),
            )
            .expect("references resolve");
        fixture
            .ledger
            .insert_transaction(
                Transaction::new(day(2024, 2, 3), checking, Money::from_cents(-12_000), "Errands")
                    .with_splits(vec![
                        Split::to_category("food", groceries, Money::from_cents(-8_000)),
                        Split::to_account("stash", savings, Money::from_cents(-4_000)),
                    ]),
            )
            .expect("references resolve");
        fixture
            .ledger
            .insert_schedule(
                ScheduleRecord::new(
                    ScheduleKind::Monthly,
                    day(2024, 3, 1),
                    checking,
                    Money::from_cents(-120_000),
                    "Rent",
                )
                .with_category(groceries),
            )
            .expect("references resolve");
        fixture
    }
}

/// Builds a date.
pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid calendar date")
}

/// A temp directory holding a ledger file path, kept alive for the
/// test's duration.
pub struct TempLedgerFile {
    /// Path to use for save/load.
    pub path: PathBuf,
    _dir: TempDir,
}

impl TempLedgerFile {
    /// Creates a fresh temp path named `ledger.tly`.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("create temp dir");
        Self {
            path: dir.path().join("ledger.tly"),
            _dir: dir,
        }
    }
}

impl Default for TempLedgerFile {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs a test against a standard fixture saved to and reloaded from
/// disk.
pub fn with_reloaded_ledger<F, R>(f: F) -> R
where
    F: FnOnce(&LedgerFixture, &Ledger) -> R,
{
    let mut fixture = LedgerFixture::standard();
    let file = TempLedgerFile::new();
    fixture.ledger.save(&file.path).expect("save fixture");
    let mut reloaded = Ledger::new();
    reloaded.load(&file.path).expect("reload fixture");
    f(&fixture, &reloaded)
}
