//! Scheduled template transactions.

use super::{insertion_index, Dated};
use crate::book::transaction::Split;
use crate::types::{AccountId, CategoryId, Money, ScheduleId};
use chrono::NaiveDate;

/// How often a template recurs. Pure metadata for the external
/// materializer; this core only stores and orders templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScheduleKind {
    /// Fires once.
    #[default]
    Single,
    /// Every week.
    Weekly,
    /// Every two weeks.
    Biweekly,
    /// Every month.
    Monthly,
}

impl ScheduleKind {
    /// Decodes a kind from its wire byte.
    #[must_use]
    pub const fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(Self::Single),
            1 => Some(Self::Weekly),
            2 => Some(Self::Biweekly),
            3 => Some(Self::Monthly),
            _ => None,
        }
    }

    /// Returns the wire byte.
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        match self {
            Self::Single => 0,
            Self::Weekly => 1,
            Self::Biweekly => 2,
            Self::Monthly => 3,
        }
    }
}

/// A template transaction.
///
/// Carries the identity fields of a transaction minus reconciliation,
/// security, and investment state. Splits in a template carry no
/// reconciled state either.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleRecord {
    pub(crate) id: ScheduleId,
    /// Recurrence tag.
    pub kind: ScheduleKind,
    /// Next due date; orders the book.
    pub date: NaiveDate,
    /// Owning account. Always referenced.
    pub account: AccountId,
    /// Transfer target account.
    pub transfer: Option<AccountId>,
    /// Category.
    pub category: Option<CategoryId>,
    /// Signed amount relative to the owning account.
    pub amount: Money,
    /// Payee or description.
    pub payee: String,
    /// Free-form memo.
    pub memo: Option<String>,
    /// Check number or similar reference.
    pub number: Option<String>,
    /// Split legs.
    pub splits: Vec<Split>,
}

impl ScheduleRecord {
    /// Creates a template with the mandatory fields.
    pub fn new(
        kind: ScheduleKind,
        date: NaiveDate,
        account: AccountId,
        amount: Money,
        payee: impl Into<String>,
    ) -> Self {
        Self {
            id: ScheduleId::new(0),
            kind,
            date,
            account,
            transfer: None,
            category: None,
            amount,
            payee: payee.into(),
            memo: None,
            number: None,
            splits: Vec::new(),
        }
    }

    /// Sets the category.
    #[must_use]
    pub fn with_category(mut self, category: CategoryId) -> Self {
        self.category = Some(category);
        self
    }

    /// Sets the transfer target account.
    #[must_use]
    pub fn with_transfer(mut self, transfer: AccountId) -> Self {
        self.transfer = Some(transfer);
        self
    }

    /// Sets the memo.
    #[must_use]
    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }

    /// Sets the check number.
    #[must_use]
    pub fn with_number(mut self, number: impl Into<String>) -> Self {
        self.number = Some(number.into());
        self
    }

    /// Sets the split legs.
    #[must_use]
    pub fn with_splits(mut self, splits: Vec<Split>) -> Self {
        self.splits = splits;
        self
    }

    /// Runtime identity, assigned when the template enters the book.
    pub fn id(&self) -> ScheduleId {
        self.id
    }
}

impl Dated for ScheduleRecord {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

/// The date-ordered schedule collection. Same ordering discipline as
/// the transaction book, disjoint contents.
#[derive(Debug, Clone)]
pub struct ScheduleBook {
    items: Vec<ScheduleRecord>,
    next_id: u64,
}

impl ScheduleBook {
    /// Creates an empty book.
    pub(crate) fn new() -> Self {
        Self {
            items: Vec::new(),
            next_id: 1,
        }
    }

    /// Number of templates.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the book is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The templates in date order.
    pub fn as_slice(&self) -> &[ScheduleRecord] {
        &self.items
    }

    /// Iterates templates in date order.
    pub fn iter(&self) -> std::slice::Iter<'_, ScheduleRecord> {
        self.items.iter()
    }

    /// Looks up a template by its runtime identity.
    pub fn get(&self, id: ScheduleId) -> Option<&ScheduleRecord> {
        self.items.iter().find(|s| s.id == id)
    }

    /// Book index of a template.
    pub fn position_of(&self, id: ScheduleId) -> Option<usize> {
        self.items.iter().position(|s| s.id == id)
    }

    /// Inserts a template, assigning a fresh identity.
    pub(crate) fn insert(&mut self, mut record: ScheduleRecord) -> (ScheduleId, usize) {
        let id = ScheduleId::new(self.next_id);
        self.next_id += 1;
        record.id = id;
        let at = insertion_index(&self.items, record.date);
        self.items.insert(at, record);
        (id, at)
    }

    /// Removes and returns the template at a book index.
    pub(crate) fn remove_at(&mut self, index: usize) -> ScheduleRecord {
        self.items.remove(index)
    }
}
