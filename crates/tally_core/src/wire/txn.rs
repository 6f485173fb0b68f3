//! Transaction and schedule record layouts.

use super::{date_from_wire, date_to_wire, REC_SCHEDULE, REC_TRANSACTION};
use crate::book::schedule::{ScheduleKind, ScheduleRecord};
use crate::book::transaction::{
    InvestAction, Investment, LotMethod, ReconcilePair, ReconcileState, Split, Transaction,
};
use crate::ledger::Ledger;
use crate::types::{AccountId, CategoryId, Money, Quantity, SecurityId};
use tally_codec::{DecodeError, DecodeResult, RecordReader, RecordWriter};

/// Optional transaction field tags, in their fixed decode order.
const TXN_MEMO: u8 = 0x01;
const TXN_NUMBER: u8 = 0x02;
const TXN_CATEGORY: u8 = 0x03;
const TXN_TRANSFER: u8 = 0x04;
const TXN_SECURITY: u8 = 0x05;
const TXN_NEW_SECURITY: u8 = 0x06;
const TXN_INVEST: u8 = 0x07;
const TXN_SPLITS: u8 = 0x08;

/// Optional schedule field tags, in their fixed decode order.
const SCH_MEMO: u8 = 0x01;
const SCH_NUMBER: u8 = 0x02;
const SCH_CATEGORY: u8 = 0x03;
const SCH_TRANSFER: u8 = 0x04;
const SCH_SPLITS: u8 = 0x05;

/// Tag opening each split entry inside a splits field.
const SPL_ENTRY: u8 = 0x10;
/// Optional split field: category ID (u32).
const SPL_CATEGORY: u8 = 0x01;
/// Optional split field: target account ID (u32).
const SPL_ACCOUNT: u8 = 0x02;

/// Transaction layout: date i32, account u32, amount i64, reconcile
/// state u8, payee str, then the optional fields `[TXN_MEMO str]`
/// `[TXN_NUMBER str]` `[TXN_CATEGORY u32]` `[TXN_TRANSFER u32]`
/// `[TXN_SECURITY u32]` `[TXN_NEW_SECURITY u32]` `[TXN_INVEST shares
/// i64, new-shares i64, price i64, commission i64, action u8, lot u8]`
/// `[TXN_SPLITS count u16, entries]`.
pub(crate) fn encode_transaction(txn: &Transaction) -> Vec<u8> {
    let mut w = RecordWriter::with_capacity(64);
    if !txn.splits.is_empty() {
        encode_splits(&mut w, &txn.splits, true);
        w.put_u8(TXN_SPLITS);
    }
    if let Some(invest) = &txn.invest {
        w.put_u8(invest.lot_method.as_byte());
        w.put_u8(invest.action.as_byte());
        w.put_i64(invest.commission.cents());
        w.put_i64(invest.price.cents());
        w.put_i64(invest.new_shares.ten_thousandths());
        w.put_i64(invest.shares.ten_thousandths());
        w.put_u8(TXN_INVEST);
    }
    if let Some(id) = txn.new_security {
        w.put_u32(id.as_u32());
        w.put_u8(TXN_NEW_SECURITY);
    }
    if let Some(id) = txn.security {
        w.put_u32(id.as_u32());
        w.put_u8(TXN_SECURITY);
    }
    if let Some(id) = txn.transfer {
        w.put_u32(id.as_u32());
        w.put_u8(TXN_TRANSFER);
    }
    if let Some(id) = txn.category {
        w.put_u32(id.as_u32());
        w.put_u8(TXN_CATEGORY);
    }
    if let Some(number) = &txn.number {
        w.put_str(number);
        w.put_u8(TXN_NUMBER);
    }
    if let Some(memo) = &txn.memo {
        w.put_str(memo);
        w.put_u8(TXN_MEMO);
    }
    w.put_str(&txn.payee);
    w.put_u8(txn.reconcile.as_byte());
    w.put_i64(txn.amount.cents());
    w.put_u32(txn.account.as_u32());
    w.put_i32(date_to_wire(txn.date));
    w.put_u8(REC_TRANSACTION);
    w.finish()
}

pub(crate) fn apply_transaction(ledger: &mut Ledger, mut r: RecordReader<'_>) -> DecodeResult<()> {
    let date = date_from_wire(r.take_i32()?)?;
    let account = AccountId::new(r.take_u32()?);
    let amount = Money::from_cents(r.take_i64()?);
    let state = r.take_u8()?;
    let reconcile = ReconcilePair::from_byte(state)
        .ok_or_else(|| DecodeError::invalid_value("reconcile state", state))?;
    let payee = r.take_str()?;

    let mut txn = Transaction::new(date, account, amount, payee);
    txn.reconcile = reconcile;
    if r.take_optional_tag(TXN_MEMO)? {
        txn.memo = Some(r.take_str()?);
    }
    if r.take_optional_tag(TXN_NUMBER)? {
        txn.number = Some(r.take_str()?);
    }
    if r.take_optional_tag(TXN_CATEGORY)? {
        txn.category = Some(CategoryId::new(r.take_u32()?));
    }
    if r.take_optional_tag(TXN_TRANSFER)? {
        txn.transfer = Some(AccountId::new(r.take_u32()?));
    }
    if r.take_optional_tag(TXN_SECURITY)? {
        txn.security = Some(SecurityId::new(r.take_u32()?));
    }
    if r.take_optional_tag(TXN_NEW_SECURITY)? {
        txn.new_security = Some(SecurityId::new(r.take_u32()?));
    }
    if r.take_optional_tag(TXN_INVEST)? {
        let shares = Quantity::from_ten_thousandths(r.take_i64()?);
        let new_shares = Quantity::from_ten_thousandths(r.take_i64()?);
        let price = Money::from_cents(r.take_i64()?);
        let commission = Money::from_cents(r.take_i64()?);
        let action_byte = r.take_u8()?;
        let action = InvestAction::from_byte(action_byte)
            .ok_or_else(|| DecodeError::invalid_value("investment action", action_byte))?;
        let lot_byte = r.take_u8()?;
        let lot_method = LotMethod::from_byte(lot_byte)
            .ok_or_else(|| DecodeError::invalid_value("lot method", lot_byte))?;
        txn.invest = Some(Investment {
            shares,
            new_shares,
            price,
            commission,
            action,
            lot_method,
        });
    }
    if r.take_optional_tag(TXN_SPLITS)? {
        txn.splits = decode_splits(&mut r, true)?;
    }
    r.finish()?;

    if let Some((kind, id)) = ledger.missing_transaction_ref(&txn) {
        return Err(DecodeError::unknown_reference(kind, id));
    }
    ledger.insert_transaction_unchecked(txn);
    Ok(())
}

/// Schedule layout: kind u8, date i32, account u32, amount i64, payee
/// str, then `[SCH_MEMO str]` `[SCH_NUMBER str]` `[SCH_CATEGORY u32]`
/// `[SCH_TRANSFER u32]` `[SCH_SPLITS count u16, entries]`. Schedule
/// splits carry no reconciled state.
pub(crate) fn encode_schedule(record: &ScheduleRecord) -> Vec<u8> {
    let mut w = RecordWriter::with_capacity(48);
    if !record.splits.is_empty() {
        encode_splits(&mut w, &record.splits, false);
        w.put_u8(SCH_SPLITS);
    }
    if let Some(id) = record.transfer {
        w.put_u32(id.as_u32());
        w.put_u8(SCH_TRANSFER);
    }
    if let Some(id) = record.category {
        w.put_u32(id.as_u32());
        w.put_u8(SCH_CATEGORY);
    }
    if let Some(number) = &record.number {
        w.put_str(number);
        w.put_u8(SCH_NUMBER);
    }
    if let Some(memo) = &record.memo {
        w.put_str(memo);
        w.put_u8(SCH_MEMO);
    }
    w.put_str(&record.payee);
    w.put_i64(record.amount.cents());
    w.put_u32(record.account.as_u32());
    w.put_i32(date_to_wire(record.date));
    w.put_u8(record.kind.as_byte());
    w.put_u8(REC_SCHEDULE);
    w.finish()
}

pub(crate) fn apply_schedule(ledger: &mut Ledger, mut r: RecordReader<'_>) -> DecodeResult<()> {
    let kind_byte = r.take_u8()?;
    let kind = ScheduleKind::from_byte(kind_byte)
        .ok_or_else(|| DecodeError::invalid_value("schedule kind", kind_byte))?;
    let date = date_from_wire(r.take_i32()?)?;
    let account = AccountId::new(r.take_u32()?);
    let amount = Money::from_cents(r.take_i64()?);
    let payee = r.take_str()?;

    let mut record = ScheduleRecord::new(kind, date, account, amount, payee);
    if r.take_optional_tag(SCH_MEMO)? {
        record.memo = Some(r.take_str()?);
    }
    if r.take_optional_tag(SCH_NUMBER)? {
        record.number = Some(r.take_str()?);
    }
    if r.take_optional_tag(SCH_CATEGORY)? {
        record.category = Some(CategoryId::new(r.take_u32()?));
    }
    if r.take_optional_tag(SCH_TRANSFER)? {
        record.transfer = Some(AccountId::new(r.take_u32()?));
    }
    if r.take_optional_tag(SCH_SPLITS)? {
        record.splits = decode_splits(&mut r, false)?;
    }
    r.finish()?;

    if let Some((kind, id)) = ledger.missing_schedule_ref(&record) {
        return Err(DecodeError::unknown_reference(kind, id));
    }
    ledger.insert_schedule_unchecked(record);
    Ok(())
}

/// Splits field body: count u16, then per split: `SPL_ENTRY`,
/// description str, amount i64, reconcile bits u8 (transactions only),
/// `[SPL_CATEGORY u32]` `[SPL_ACCOUNT u32]`.
fn encode_splits(w: &mut RecordWriter, splits: &[Split], with_state: bool) {
    for split in splits.iter().rev() {
        if let Some(id) = split.account {
            w.put_u32(id.as_u32());
            w.put_u8(SPL_ACCOUNT);
        }
        if let Some(id) = split.category {
            w.put_u32(id.as_u32());
            w.put_u8(SPL_CATEGORY);
        }
        if with_state {
            w.put_u8(split.reconcile.as_bits());
        }
        w.put_i64(split.amount.cents());
        w.put_str(&split.description);
        w.put_u8(SPL_ENTRY);
    }
    w.put_u16(splits.len() as u16);
}

fn decode_splits(r: &mut RecordReader<'_>, with_state: bool) -> DecodeResult<Vec<Split>> {
    let count = r.take_u16()? as usize;
    let mut splits = Vec::with_capacity(count);
    for _ in 0..count {
        r.take_expected_tag(SPL_ENTRY)?;
        let description = r.take_str()?;
        let amount = Money::from_cents(r.take_i64()?);
        let reconcile = if with_state {
            let bits = r.take_u8()?;
            ReconcileState::from_bits(bits)
                .ok_or_else(|| DecodeError::invalid_value("split reconcile state", bits))?
        } else {
            ReconcileState::NotReconciled
        };
        let mut split = Split {
            description,
            account: None,
            category: None,
            amount,
            reconcile,
        };
        if r.take_optional_tag(SPL_CATEGORY)? {
            split.category = Some(CategoryId::new(r.take_u32()?));
        }
        if r.take_optional_tag(SPL_ACCOUNT)? {
            split.account = Some(AccountId::new(r.take_u32()?));
        }
        splits.push(split);
    }
    Ok(splits)
}
