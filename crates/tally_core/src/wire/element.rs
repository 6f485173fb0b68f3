//! Account, category, and security record layouts.

use super::{REC_ACCOUNT, REC_CATEGORY, REC_SECURITY};
use crate::element::{Account, AccountKind, Category, CategoryKind, Security};
use crate::ledger::Ledger;
use crate::types::{AccountId, CategoryId, SecurityId};
use tally_codec::{DecodeError, DecodeResult, RecordReader, RecordWriter};

/// Optional account field: institution account number (string).
const ACC_NUMBER: u8 = 0x01;
/// Optional account field: link-target account ID (u32).
const ACC_LINK: u8 = 0x02;
/// Optional security field: ticker symbol (string).
const SEC_SYMBOL: u8 = 0x01;

/// Account layout: id u32, name str, kind u8, hidden bool,
/// `[ACC_NUMBER str]`, `[ACC_LINK u32]`.
pub(crate) fn encode_account(account: &Account) -> Vec<u8> {
    let mut w = RecordWriter::new();
    if let Some(link) = account.linked_account() {
        w.put_u32(link.as_u32());
        w.put_u8(ACC_LINK);
    }
    if let Some(number) = account.number() {
        w.put_str(number);
        w.put_u8(ACC_NUMBER);
    }
    w.put_bool(account.is_hidden());
    w.put_u8(account.kind().as_byte());
    w.put_str(account.name());
    w.put_u32(account.id().as_u32());
    w.put_u8(REC_ACCOUNT);
    w.finish()
}

pub(crate) fn apply_account(ledger: &mut Ledger, mut r: RecordReader<'_>) -> DecodeResult<()> {
    let raw = r.take_u32()?;
    let name = r.take_str()?;
    let kind_byte = r.take_u8()?;
    let kind = AccountKind::from_byte(kind_byte)
        .ok_or_else(|| DecodeError::invalid_value("account kind", kind_byte))?;
    let hidden = r.take_bool()?;

    let mut account = Account::new(name, kind);
    account.set_hidden(hidden);
    if r.take_optional_tag(ACC_NUMBER)? {
        account.number = Some(r.take_str()?);
    }
    let mut link = None;
    if r.take_optional_tag(ACC_LINK)? {
        link = Some(AccountId::new(r.take_u32()?));
    }
    r.finish()?;

    let id = AccountId::new(raw);
    if ledger.accounts().contains(id) {
        return Err(DecodeError::invalid_value("duplicate account id", raw));
    }
    if let Some(target) = link {
        // The link target must already have been decoded; the writer
        // emits targets before linkers, so a single pass resolves it.
        // A self-link resolves against the record being restored.
        if target != id && !ledger.accounts().contains(target) {
            return Err(DecodeError::unknown_reference("account", target.as_u32()));
        }
    }
    ledger.restore_account(id, account, link);
    Ok(())
}

/// Category layout: id u32, name str, kind u8, hidden bool. No
/// optional fields.
pub(crate) fn encode_category(category: &Category) -> Vec<u8> {
    let mut w = RecordWriter::new();
    w.put_bool(category.is_hidden());
    w.put_u8(category.kind().as_byte());
    w.put_str(category.name());
    w.put_u32(category.id().as_u32());
    w.put_u8(REC_CATEGORY);
    w.finish()
}

pub(crate) fn apply_category(ledger: &mut Ledger, mut r: RecordReader<'_>) -> DecodeResult<()> {
    let raw = r.take_u32()?;
    let name = r.take_str()?;
    let kind_byte = r.take_u8()?;
    let kind = CategoryKind::from_byte(kind_byte)
        .ok_or_else(|| DecodeError::invalid_value("category kind", kind_byte))?;
    let hidden = r.take_bool()?;
    r.finish()?;

    let id = CategoryId::new(raw);
    if ledger.categories().contains(id) {
        return Err(DecodeError::invalid_value("duplicate category id", raw));
    }
    let mut category = Category::new(name, kind);
    category.set_hidden(hidden);
    ledger.restore_category(id, category);
    Ok(())
}

/// Security layout: id u32, name str, hidden bool,
/// `[SEC_SYMBOL str]`.
pub(crate) fn encode_security(security: &Security) -> Vec<u8> {
    let mut w = RecordWriter::new();
    if let Some(symbol) = security.symbol() {
        w.put_str(symbol);
        w.put_u8(SEC_SYMBOL);
    }
    w.put_bool(security.is_hidden());
    w.put_str(security.name());
    w.put_u32(security.id().as_u32());
    w.put_u8(REC_SECURITY);
    w.finish()
}

pub(crate) fn apply_security(ledger: &mut Ledger, mut r: RecordReader<'_>) -> DecodeResult<()> {
    let raw = r.take_u32()?;
    let name = r.take_str()?;
    let hidden = r.take_bool()?;
    let mut security = Security::new(name);
    security.set_hidden(hidden);
    if r.take_optional_tag(SEC_SYMBOL)? {
        security.symbol = Some(r.take_str()?);
    }
    r.finish()?;

    let id = SecurityId::new(raw);
    if ledger.securities().contains(id) {
        return Err(DecodeError::invalid_value("duplicate security id", raw));
    }
    ledger.restore_security(id, security);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::apply_record;

    #[test]
    fn account_roundtrip_minimal() {
        let mut ledger = Ledger::new();
        let id = ledger
            .add_account(Account::new("Checking", AccountKind::Bank))
            .unwrap();
        let bytes = encode_account(ledger.accounts().get(id).unwrap());

        let mut reloaded = Ledger::new();
        apply_record(&mut reloaded, &bytes).unwrap();
        let account = reloaded.accounts().get(id).unwrap();
        assert_eq!(account.name(), "Checking");
        assert_eq!(account.kind(), AccountKind::Bank);
        assert!(!account.is_hidden());
        assert_eq!(account.number(), None);
        assert_eq!(account.linked_account(), None);
    }

    #[test]
    fn account_roundtrip_all_optionals() {
        let mut ledger = Ledger::new();
        let bank = ledger
            .add_account(Account::new("Bank", AccountKind::Bank))
            .unwrap();
        let loan = ledger
            .add_account(Account::new("Loan", AccountKind::Loan).with_number("8812-4"))
            .unwrap();
        ledger.set_account_link(loan, Some(bank)).unwrap();

        let mut reloaded = Ledger::new();
        apply_record(
            &mut reloaded,
            &encode_account(ledger.accounts().get(bank).unwrap()),
        )
        .unwrap();
        apply_record(
            &mut reloaded,
            &encode_account(ledger.accounts().get(loan).unwrap()),
        )
        .unwrap();

        let loan_account = reloaded.accounts().get(loan).unwrap();
        assert_eq!(loan_account.number(), Some("8812-4"));
        assert_eq!(loan_account.linked_account(), Some(bank));
        assert_eq!(reloaded.accounts().get(bank).unwrap().link_count(), 1);
    }

    #[test]
    fn account_link_to_missing_target_fails() {
        let mut ledger = Ledger::new();
        let bank = ledger
            .add_account(Account::new("Bank", AccountKind::Bank))
            .unwrap();
        let loan = ledger
            .add_account(Account::new("Loan", AccountKind::Loan))
            .unwrap();
        ledger.set_account_link(loan, Some(bank)).unwrap();
        let bytes = encode_account(ledger.accounts().get(loan).unwrap());

        // Decode the linker without its target present.
        let mut reloaded = Ledger::new();
        let err = apply_record(&mut reloaded, &bytes).unwrap_err();
        assert_eq!(
            err,
            DecodeError::unknown_reference("account", bank.as_u32())
        );
        assert_eq!(reloaded.accounts().len(), 0);
    }

    #[test]
    fn category_roundtrip() {
        let mut ledger = Ledger::new();
        let id = ledger
            .add_category(Category::new("Salary", CategoryKind::Income))
            .unwrap();
        let bytes = encode_category(ledger.categories().get(id).unwrap());

        let mut reloaded = Ledger::new();
        apply_record(&mut reloaded, &bytes).unwrap();
        let category = reloaded.categories().get(id).unwrap();
        assert_eq!(category.name(), "Salary");
        assert_eq!(category.kind(), CategoryKind::Income);
    }

    #[test]
    fn security_roundtrip_with_and_without_symbol() {
        let mut ledger = Ledger::new();
        let plain = ledger.add_security(Security::new("Money Market")).unwrap();
        let ticker = ledger
            .add_security(Security::new("Index Fund").with_symbol("VTSAX"))
            .unwrap();

        let mut reloaded = Ledger::new();
        apply_record(
            &mut reloaded,
            &encode_security(ledger.securities().get(plain).unwrap()),
        )
        .unwrap();
        apply_record(
            &mut reloaded,
            &encode_security(ledger.securities().get(ticker).unwrap()),
        )
        .unwrap();

        assert_eq!(reloaded.securities().get(plain).unwrap().symbol(), None);
        assert_eq!(
            reloaded.securities().get(ticker).unwrap().symbol(),
            Some("VTSAX")
        );
    }

    #[test]
    fn trailing_bytes_rejected() {
        let mut ledger = Ledger::new();
        let id = ledger
            .add_category(Category::new("Food", CategoryKind::Expense))
            .unwrap();
        let mut bytes = encode_category(ledger.categories().get(id).unwrap());
        bytes.push(0x00);

        let mut reloaded = Ledger::new();
        let err = apply_record(&mut reloaded, &bytes).unwrap_err();
        assert_eq!(err, DecodeError::TrailingBytes { remaining: 1 });
        assert_eq!(reloaded.categories().len(), 0);
    }

    #[test]
    fn duplicate_entity_id_rejected() {
        let mut ledger = Ledger::new();
        let id = ledger
            .add_category(Category::new("Food", CategoryKind::Expense))
            .unwrap();
        let bytes = encode_category(ledger.categories().get(id).unwrap());

        let mut reloaded = Ledger::new();
        apply_record(&mut reloaded, &bytes).unwrap();
        let err = apply_record(&mut reloaded, &bytes).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidValue { .. }));
        // First copy survives; the name was not suffixed twice.
        assert_eq!(reloaded.categories().len(), 1);
    }
}
