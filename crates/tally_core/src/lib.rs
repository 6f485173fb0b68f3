//! # Tally Core
//!
//! The ledger engine: accounts, categories, securities, dated
//! transactions with multi-leg splits, scheduled template transactions,
//! per-account running-balance projections, and the tagged binary file
//! format that persists it all.
//!
//! ## Structure
//!
//! - [`element`] - reference-counted, name-ordered entity registries
//! - [`book`] - the date-ordered transaction and schedule collections
//! - [`register`] - the per-account balance projection
//! - [`wire`] - record tags and the on-disk record layouts
//! - [`Ledger`] - the aggregate that owns the five collections and
//!   drives load/save
//!
//! ## Ownership Model
//!
//! The five top-level collections are the sole owners of their
//! elements. Every other pointer (a transaction's account, a split's
//! category) is an integer ID whose validity is guaranteed by reference
//! counting: the [`Ledger`] acquires one reference per ID when a value
//! enters a collection and releases them exactly once when it leaves.
//! Removing an entity that is still referenced fails with
//! [`IntegrityError`] and changes nothing.
//!
//! ## Example
//!
//! ```rust
//! use tally_core::{Account, AccountKind, Ledger, Money, Transaction};
//! use chrono::NaiveDate;
//!
//! let mut ledger = Ledger::new();
//! let checking = ledger
//!     .add_account(Account::new("Checking", AccountKind::Bank))
//!     .unwrap();
//!
//! let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
//! let txn = Transaction::new(date, checking, Money::from_cents(10_000), "Payroll");
//! ledger.insert_transaction(txn).unwrap();
//!
//! let register = ledger.register(checking);
//! assert_eq!(register.closing_balance(), Money::from_cents(10_000));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod book;
pub mod element;
mod error;
mod ledger;
pub mod register;
pub mod types;
pub mod wire;

pub use book::schedule::{ScheduleBook, ScheduleKind, ScheduleRecord};
pub use book::transaction::{
    Investment, InvestAction, Leg, LegTarget, LotMethod, ReconcilePair, ReconcileState, Split,
    Transaction, TransactionBook,
};
pub use element::{Account, AccountKind, Category, CategoryKind, Registry, Security};
pub use error::{DbError, DbResult, IntegrityError};
pub use ledger::{Ledger, LoadReport};
pub use register::{Register, RegisterRow};
pub use types::{AccountId, CategoryId, Money, Quantity, ScheduleId, SecurityId, TxnId};

// Re-exported so downstream crates match error types without naming the
// leaf crates directly.
pub use tally_codec::DecodeError;
pub use tally_framing::FramingError;
