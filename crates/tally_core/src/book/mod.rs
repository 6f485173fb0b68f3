//! Date-ordered collections of transactions and schedule templates.
//!
//! Both books share one ordering discipline: ascending by calendar
//! date, with entries sharing a date kept in insertion order. The
//! insertion search is an upper bound - on a date tie it continues
//! rightward to the true boundary, so a new entry always lands after
//! every existing entry of the same date.

pub mod schedule;
pub mod transaction;

use chrono::NaiveDate;

/// An entry ordered by calendar date.
pub trait Dated {
    /// The entry's date. Only the calendar date participates in
    /// ordering; there is no time-of-day component.
    fn date(&self) -> NaiveDate;
}

/// Index at which an entry dated `date` is inserted.
///
/// Upper-bound binary search: O(log n) comparisons against dates only,
/// landing after all entries with a date less than or equal to `date`.
pub(crate) fn insertion_index<T: Dated>(items: &[T], date: NaiveDate) -> usize {
    items.partition_point(|item| item.date() <= date)
}
