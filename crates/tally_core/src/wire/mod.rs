//! On-disk record layouts.
//!
//! Each record type owns one reserved outer tag; the decoder peeks it
//! to dispatch and rejects anything else. Within a record, mandatory
//! fields sit in a fixed order and each optional field is introduced
//! by a context tag, detected by peeking the next byte. Optional tags
//! are checked in a fixed, version-stable order - new optional fields
//! extend the order, existing tags never move.
//!
//! Encoding runs through the reverse-append
//! [`RecordWriter`](tally_codec::RecordWriter): fields are emitted
//! from the end of the record toward the outer tag, so every length
//! prefix follows the data it describes and no length is computed up
//! front.

mod element;
mod txn;

pub(crate) use element::{apply_account, apply_category, apply_security};
pub(crate) use element::{encode_account, encode_category, encode_security};
pub(crate) use txn::{apply_schedule, apply_transaction, encode_schedule, encode_transaction};

use crate::ledger::Ledger;
use chrono::{Datelike, NaiveDate};
use tally_codec::{DecodeError, DecodeResult, RecordReader};

/// Outer tag of an account record.
pub const REC_ACCOUNT: u8 = b'A';
/// Outer tag of a category record.
pub const REC_CATEGORY: u8 = b'C';
/// Outer tag of a security record.
pub const REC_SECURITY: u8 = b'S';
/// Outer tag of a transaction record.
pub const REC_TRANSACTION: u8 = b'T';
/// Outer tag of a schedule record.
pub const REC_SCHEDULE: u8 = b'R';

/// The outer tag of an encoded record, if the body is non-empty.
pub fn record_tag(bytes: &[u8]) -> Option<u8> {
    bytes.first().copied()
}

/// Decodes one record and applies it to the ledger.
///
/// Entities are restored under their persisted identity; transactions
/// and schedules resolve their foreign keys against the live
/// registries and acquire references as they enter the books.
pub(crate) fn apply_record(ledger: &mut Ledger, bytes: &[u8]) -> DecodeResult<()> {
    let mut reader = RecordReader::new(bytes);
    let tag = reader.take_u8()?;
    match tag {
        REC_ACCOUNT => apply_account(ledger, reader),
        REC_CATEGORY => apply_category(ledger, reader),
        REC_SECURITY => apply_security(ledger, reader),
        REC_TRANSACTION => apply_transaction(ledger, reader),
        REC_SCHEDULE => apply_schedule(ledger, reader),
        tag => Err(DecodeError::UnknownRecordTag { tag }),
    }
}

/// Encodes a date as days from the common era.
pub(crate) fn date_to_wire(date: NaiveDate) -> i32 {
    date.num_days_from_ce()
}

/// Decodes a days-from-common-era value.
pub(crate) fn date_from_wire(days: i32) -> DecodeResult<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days)
        .ok_or_else(|| DecodeError::invalid_value("date", days))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Ledger;

    #[test]
    fn date_wire_roundtrip() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(date_from_wire(date_to_wire(date)).unwrap(), date);
    }

    #[test]
    fn unknown_outer_tag_rejected() {
        let mut ledger = Ledger::new();
        let err = apply_record(&mut ledger, &[0xEE]).unwrap_err();
        assert_eq!(err, DecodeError::UnknownRecordTag { tag: 0xEE });
    }

    #[test]
    fn empty_record_rejected() {
        let mut ledger = Ledger::new();
        let err = apply_record(&mut ledger, &[]).unwrap_err();
        assert_eq!(err, DecodeError::UnexpectedEof);
    }
}
