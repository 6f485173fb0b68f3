//! The ledger aggregate and its persistence.

use crate::book::schedule::{ScheduleBook, ScheduleRecord};
use crate::book::transaction::{ReconcilePair, Transaction, TransactionBook};
use crate::element::{Account, Category, Registry, Security};
use crate::error::{DbError, IntegrityError};
use crate::register::Register;
use crate::types::{AccountId, CategoryId, Money, ScheduleId, SecurityId, TxnId};
use crate::wire;
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tally_codec::DecodeError;
use tally_framing::{FrameReader, FrameWriter, FramingError};

/// Outcome of scanning a ledger stream record by record.
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Number of records applied.
    pub loaded: usize,
    /// Zero-based record indices that failed to decode, with the
    /// error each one produced.
    pub skipped: Vec<(usize, DecodeError)>,
}

/// The ledger: five owner collections and a modified flag.
///
/// All mutation happens on the thread that issues it; load and save
/// are never interleaved with each other or with edits. Constructed
/// once and passed by reference - there are no process-wide
/// singletons.
#[derive(Debug)]
pub struct Ledger {
    accounts: Registry<Account>,
    categories: Registry<Category>,
    securities: Registry<Security>,
    transactions: TransactionBook,
    schedules: ScheduleBook,
    modified: bool,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self {
            accounts: Registry::new(),
            categories: Registry::new(),
            securities: Registry::new(),
            transactions: TransactionBook::new(),
            schedules: ScheduleBook::new(),
            modified: false,
        }
    }

    /// The account registry.
    pub fn accounts(&self) -> &Registry<Account> {
        &self.accounts
    }

    /// The category registry.
    pub fn categories(&self) -> &Registry<Category> {
        &self.categories
    }

    /// The security registry.
    pub fn securities(&self) -> &Registry<Security> {
        &self.securities
    }

    /// The transaction book.
    pub fn transactions(&self) -> &TransactionBook {
        &self.transactions
    }

    /// The schedule book.
    pub fn schedules(&self) -> &ScheduleBook {
        &self.schedules
    }

    /// Whether the ledger has unsaved changes.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    // ----- entity operations -------------------------------------------

    /// Adds an account. Rejects duplicate names.
    pub fn add_account(&mut self, account: Account) -> Result<AccountId, IntegrityError> {
        let id = self.accounts.create(account)?;
        self.modified = true;
        Ok(id)
    }

    /// Adds a category. Rejects duplicate names.
    pub fn add_category(&mut self, category: Category) -> Result<CategoryId, IntegrityError> {
        let id = self.categories.create(category)?;
        self.modified = true;
        Ok(id)
    }

    /// Adds a security. Rejects duplicate names.
    pub fn add_security(&mut self, security: Security) -> Result<SecurityId, IntegrityError> {
        let id = self.securities.create(security)?;
        self.modified = true;
        Ok(id)
    }

    /// Removes an account.
    ///
    /// Fails while the account is referenced by any transaction,
    /// split, or schedule, or while another account links to it.
    /// Releases the removed account's own link on its target.
    pub fn remove_account(&mut self, id: AccountId) -> Result<Account, IntegrityError> {
        let account = self
            .accounts
            .get(id)
            .ok_or_else(|| IntegrityError::unknown("account", id.as_u32()))?;
        if account.is_link_target() {
            return Err(IntegrityError::StillLinked {
                name: account.name().to_string(),
                links: account.link_count(),
            });
        }
        let removed = self.accounts.remove(id)?;
        if let Some(target) = removed.linked_account() {
            self.drop_link_on(target);
        }
        self.modified = true;
        Ok(removed)
    }

    /// Removes a category. Fails while referenced.
    pub fn remove_category(&mut self, id: CategoryId) -> Result<Category, IntegrityError> {
        let removed = self.categories.remove(id)?;
        self.modified = true;
        Ok(removed)
    }

    /// Removes a security. Fails while referenced.
    pub fn remove_security(&mut self, id: SecurityId) -> Result<Security, IntegrityError> {
        let removed = self.securities.remove(id)?;
        self.modified = true;
        Ok(removed)
    }

    /// Renames an account, re-sorting the registry.
    pub fn rename_account(
        &mut self,
        id: AccountId,
        name: impl Into<String>,
    ) -> Result<(), IntegrityError> {
        self.accounts.rename(id, name)?;
        self.modified = true;
        Ok(())
    }

    /// Renames a category, re-sorting the registry.
    pub fn rename_category(
        &mut self,
        id: CategoryId,
        name: impl Into<String>,
    ) -> Result<(), IntegrityError> {
        self.categories.rename(id, name)?;
        self.modified = true;
        Ok(())
    }

    /// Renames a security, re-sorting the registry.
    pub fn rename_security(
        &mut self,
        id: SecurityId,
        name: impl Into<String>,
    ) -> Result<(), IntegrityError> {
        self.securities.rename(id, name)?;
        self.modified = true;
        Ok(())
    }

    /// Points `id` at a new link target, releasing the old link and
    /// acquiring the new one in one step.
    pub fn set_account_link(
        &mut self,
        id: AccountId,
        target: Option<AccountId>,
    ) -> Result<(), IntegrityError> {
        if !self.accounts.contains(id) {
            return Err(IntegrityError::unknown("account", id.as_u32()));
        }
        if let Some(target) = target {
            if !self.accounts.contains(target) {
                return Err(IntegrityError::unknown("account", target.as_u32()));
            }
        }
        let old = {
            let account = self.accounts.get_mut(id).ok_or_else(|| {
                IntegrityError::unknown("account", id.as_u32())
            })?;
            let old = account.linked;
            account.linked = target;
            old
        };
        if let Some(old) = old {
            self.drop_link_on(old);
        }
        if let Some(target) = target {
            if let Some(account) = self.accounts.get_mut(target) {
                account.link_count += 1;
            }
        }
        self.modified = true;
        Ok(())
    }

    /// Sets an account's hidden flag.
    pub fn set_account_hidden(&mut self, id: AccountId, hidden: bool) -> Result<(), IntegrityError> {
        let account = self
            .accounts
            .get_mut(id)
            .ok_or_else(|| IntegrityError::unknown("account", id.as_u32()))?;
        account.set_hidden(hidden);
        self.modified = true;
        Ok(())
    }

    /// Sets a category's hidden flag.
    pub fn set_category_hidden(
        &mut self,
        id: CategoryId,
        hidden: bool,
    ) -> Result<(), IntegrityError> {
        let category = self
            .categories
            .get_mut(id)
            .ok_or_else(|| IntegrityError::unknown("category", id.as_u32()))?;
        category.set_hidden(hidden);
        self.modified = true;
        Ok(())
    }

    /// Sets a security's hidden flag.
    pub fn set_security_hidden(
        &mut self,
        id: SecurityId,
        hidden: bool,
    ) -> Result<(), IntegrityError> {
        let security = self
            .securities
            .get_mut(id)
            .ok_or_else(|| IntegrityError::unknown("security", id.as_u32()))?;
        security.set_hidden(hidden);
        self.modified = true;
        Ok(())
    }

    /// Restores a decoded account under its persisted identity and
    /// wires up its link. The wire layer validates the identity and
    /// link target before calling.
    pub(crate) fn restore_account(
        &mut self,
        id: AccountId,
        mut account: Account,
        link: Option<AccountId>,
    ) {
        account.linked = link;
        self.accounts.restore(id, account);
        if let Some(target) = link {
            if let Some(target_account) = self.accounts.get_mut(target) {
                target_account.link_count += 1;
            }
        }
    }

    /// Restores a decoded category under its persisted identity.
    pub(crate) fn restore_category(&mut self, id: CategoryId, category: Category) {
        self.categories.restore(id, category);
    }

    /// Restores a decoded security under its persisted identity.
    pub(crate) fn restore_security(&mut self, id: SecurityId, security: Security) {
        self.securities.restore(id, security);
    }

    fn drop_link_on(&mut self, target: AccountId) {
        if let Some(account) = self.accounts.get_mut(target) {
            debug_assert!(account.link_count > 0, "link count underflow");
            account.link_count = account.link_count.saturating_sub(1);
        }
    }

    // ----- transaction operations --------------------------------------

    /// Inserts a transaction, acquiring one reference per entity it
    /// points to. Returns the assigned identity and the book index.
    ///
    /// # Errors
    ///
    /// [`IntegrityError::UnknownElement`] if any referenced ID is not
    /// live; nothing is acquired or inserted.
    pub fn insert_transaction(
        &mut self,
        txn: Transaction,
    ) -> Result<(TxnId, usize), IntegrityError> {
        if let Some((kind, id)) = self.missing_transaction_ref(&txn) {
            return Err(IntegrityError::unknown(kind, id));
        }
        Ok(self.insert_transaction_unchecked(txn))
    }

    /// Inserts a transaction whose references are known to resolve.
    pub(crate) fn insert_transaction_unchecked(&mut self, txn: Transaction) -> (TxnId, usize) {
        self.acquire_transaction_refs(&txn);
        let placed = self.transactions.insert(txn);
        self.modified = true;
        placed
    }

    /// Removes a transaction, releasing every reference it held.
    ///
    /// The release runs exactly once: the value is moved out of the
    /// book before its references are cleared, so no second release
    /// can observe it.
    pub fn remove_transaction(&mut self, id: TxnId) -> Result<Transaction, IntegrityError> {
        let at = self
            .transactions
            .position_of(id)
            .ok_or_else(|| IntegrityError::unknown("transaction", id.as_u64()))?;
        let txn = self.transactions.remove_at(at);
        self.release_transaction_refs(&txn);
        self.modified = true;
        Ok(txn)
    }

    /// Duplicates a transaction: copies the scalar fields and
    /// re-acquires a reference for every entity pointer in the same
    /// step, so the copy never under-counts.
    pub fn duplicate_transaction(&mut self, id: TxnId) -> Result<(TxnId, usize), IntegrityError> {
        let copy = self
            .transactions
            .get(id)
            .cloned()
            .ok_or_else(|| IntegrityError::unknown("transaction", id.as_u64()))?;
        Ok(self.insert_transaction_unchecked(copy))
    }

    /// Re-targets a transaction's category, releasing the old
    /// reference and acquiring the new one as one step.
    pub fn set_transaction_category(
        &mut self,
        id: TxnId,
        category: Option<CategoryId>,
    ) -> Result<(), IntegrityError> {
        if let Some(category) = category {
            if !self.categories.contains(category) {
                return Err(IntegrityError::unknown("category", category.as_u32()));
            }
        }
        let old = {
            let txn = self
                .transactions
                .get_mut(id)
                .ok_or_else(|| IntegrityError::unknown("transaction", id.as_u64()))?;
            let old = txn.category;
            txn.category = category;
            old
        };
        if let Some(old) = old {
            self.categories.release_ref(old);
        }
        if let Some(new) = category {
            self.categories.add_ref(new);
        }
        self.modified = true;
        Ok(())
    }

    /// Re-targets a transaction's transfer account, swapping the
    /// references as one step.
    pub fn set_transaction_transfer(
        &mut self,
        id: TxnId,
        transfer: Option<AccountId>,
    ) -> Result<(), IntegrityError> {
        if let Some(transfer) = transfer {
            if !self.accounts.contains(transfer) {
                return Err(IntegrityError::unknown("account", transfer.as_u32()));
            }
        }
        let old = {
            let txn = self
                .transactions
                .get_mut(id)
                .ok_or_else(|| IntegrityError::unknown("transaction", id.as_u64()))?;
            let old = txn.transfer;
            txn.transfer = transfer;
            old
        };
        if let Some(old) = old {
            self.accounts.release_ref(old);
        }
        if let Some(new) = transfer {
            self.accounts.add_ref(new);
        }
        self.modified = true;
        Ok(())
    }

    /// Sets both reconciliation machines of a transaction.
    pub fn set_reconcile(&mut self, id: TxnId, state: ReconcilePair) -> Result<(), IntegrityError> {
        let txn = self
            .transactions
            .get_mut(id)
            .ok_or_else(|| IntegrityError::unknown("transaction", id.as_u64()))?;
        txn.reconcile = state;
        self.modified = true;
        Ok(())
    }

    /// Moves a transaction to a new date, re-inserting it at the
    /// ordered position. References are untouched. Returns the new
    /// book index.
    pub fn set_transaction_date(
        &mut self,
        id: TxnId,
        date: NaiveDate,
    ) -> Result<usize, IntegrityError> {
        let at = self
            .transactions
            .position_of(id)
            .ok_or_else(|| IntegrityError::unknown("transaction", id.as_u64()))?;
        let mut txn = self.transactions.remove_at(at);
        txn.date = date;
        let at = self.transactions.insert_preserving_id(txn);
        self.modified = true;
        Ok(at)
    }

    /// First unresolved entity reference of a transaction, as
    /// (kind, raw ID).
    pub(crate) fn missing_transaction_ref(&self, txn: &Transaction) -> Option<(&'static str, u32)> {
        if !self.accounts.contains(txn.account) {
            return Some(("account", txn.account.as_u32()));
        }
        if let Some(id) = txn.transfer {
            if !self.accounts.contains(id) {
                return Some(("account", id.as_u32()));
            }
        }
        if let Some(id) = txn.category {
            if !self.categories.contains(id) {
                return Some(("category", id.as_u32()));
            }
        }
        for id in [txn.security, txn.new_security].into_iter().flatten() {
            if !self.securities.contains(id) {
                return Some(("security", id.as_u32()));
            }
        }
        self.missing_split_ref(&txn.splits)
    }

    fn missing_split_ref(
        &self,
        splits: &[crate::book::transaction::Split],
    ) -> Option<(&'static str, u32)> {
        for split in splits {
            if let Some(id) = split.account {
                if !self.accounts.contains(id) {
                    return Some(("account", id.as_u32()));
                }
            }
            if let Some(id) = split.category {
                if !self.categories.contains(id) {
                    return Some(("category", id.as_u32()));
                }
            }
        }
        None
    }

    fn acquire_transaction_refs(&mut self, txn: &Transaction) {
        self.accounts.add_ref(txn.account);
        if let Some(id) = txn.transfer {
            self.accounts.add_ref(id);
        }
        if let Some(id) = txn.category {
            self.categories.add_ref(id);
        }
        for id in [txn.security, txn.new_security].into_iter().flatten() {
            self.securities.add_ref(id);
        }
        for split in &txn.splits {
            if let Some(id) = split.account {
                self.accounts.add_ref(id);
            }
            if let Some(id) = split.category {
                self.categories.add_ref(id);
            }
        }
    }

    fn release_transaction_refs(&mut self, txn: &Transaction) {
        self.accounts.release_ref(txn.account);
        if let Some(id) = txn.transfer {
            self.accounts.release_ref(id);
        }
        if let Some(id) = txn.category {
            self.categories.release_ref(id);
        }
        for id in [txn.security, txn.new_security].into_iter().flatten() {
            self.securities.release_ref(id);
        }
        for split in &txn.splits {
            if let Some(id) = split.account {
                self.accounts.release_ref(id);
            }
            if let Some(id) = split.category {
                self.categories.release_ref(id);
            }
        }
    }

    // ----- schedule operations -----------------------------------------

    /// Inserts a schedule template, acquiring references like a
    /// transaction insert.
    pub fn insert_schedule(
        &mut self,
        record: ScheduleRecord,
    ) -> Result<(ScheduleId, usize), IntegrityError> {
        if let Some((kind, id)) = self.missing_schedule_ref(&record) {
            return Err(IntegrityError::unknown(kind, id));
        }
        Ok(self.insert_schedule_unchecked(record))
    }

    /// Inserts a schedule whose references are known to resolve.
    pub(crate) fn insert_schedule_unchecked(
        &mut self,
        record: ScheduleRecord,
    ) -> (ScheduleId, usize) {
        self.acquire_schedule_refs(&record);
        let placed = self.schedules.insert(record);
        self.modified = true;
        placed
    }

    /// Removes a schedule template, releasing its references.
    pub fn remove_schedule(&mut self, id: ScheduleId) -> Result<ScheduleRecord, IntegrityError> {
        let at = self
            .schedules
            .position_of(id)
            .ok_or_else(|| IntegrityError::unknown("schedule", id.as_u64()))?;
        let record = self.schedules.remove_at(at);
        self.release_schedule_refs(&record);
        self.modified = true;
        Ok(record)
    }

    /// First unresolved entity reference of a schedule.
    pub(crate) fn missing_schedule_ref(&self, record: &ScheduleRecord) -> Option<(&'static str, u32)> {
        if !self.accounts.contains(record.account) {
            return Some(("account", record.account.as_u32()));
        }
        if let Some(id) = record.transfer {
            if !self.accounts.contains(id) {
                return Some(("account", id.as_u32()));
            }
        }
        if let Some(id) = record.category {
            if !self.categories.contains(id) {
                return Some(("category", id.as_u32()));
            }
        }
        self.missing_split_ref(&record.splits)
    }

    fn acquire_schedule_refs(&mut self, record: &ScheduleRecord) {
        self.accounts.add_ref(record.account);
        if let Some(id) = record.transfer {
            self.accounts.add_ref(id);
        }
        if let Some(id) = record.category {
            self.categories.add_ref(id);
        }
        for split in &record.splits {
            if let Some(id) = split.account {
                self.accounts.add_ref(id);
            }
            if let Some(id) = split.category {
                self.categories.add_ref(id);
            }
        }
    }

    fn release_schedule_refs(&mut self, record: &ScheduleRecord) {
        self.accounts.release_ref(record.account);
        if let Some(id) = record.transfer {
            self.accounts.release_ref(id);
        }
        if let Some(id) = record.category {
            self.categories.release_ref(id);
        }
        for split in &record.splits {
            if let Some(id) = split.account {
                self.accounts.release_ref(id);
            }
            if let Some(id) = split.category {
                self.categories.release_ref(id);
            }
        }
    }

    // ----- derived views -----------------------------------------------

    /// Builds the balance projection for an account.
    pub fn register(&self, account: AccountId) -> Register {
        Register::build(self, account)
    }

    /// The (date, balance) points of an account's register, for
    /// charting surfaces. Plain values only; no ledger entities leak
    /// out.
    pub fn balance_series(&self, account: AccountId) -> Vec<(NaiveDate, Money)> {
        self.register(account)
            .rows()
            .iter()
            .map(|row| (row.date, row.balance))
            .collect()
    }

    /// Per-category leg totals over a date range (inclusive), in
    /// category name order, for reporting surfaces.
    pub fn category_totals(&self, from: NaiveDate, to: NaiveDate) -> Vec<(String, Money)> {
        let mut sums: HashMap<CategoryId, Money> = HashMap::new();
        for txn in self.transactions.iter() {
            if txn.date < from || txn.date > to {
                continue;
            }
            for leg in txn.legs() {
                if let crate::book::transaction::LegTarget::Category(id) = leg.target {
                    *sums.entry(id).or_insert(Money::ZERO) += leg.amount;
                }
            }
        }
        self.categories
            .iter()
            .filter_map(|category| {
                sums.get(&category.id())
                    .map(|&total| (category.name().to_string(), total))
            })
            .collect()
    }

    // ----- persistence --------------------------------------------------

    /// Loads a ledger file, replacing the in-memory state.
    ///
    /// A malformed record is logged and skipped and the reloaded
    /// ledger is marked modified, so the caller re-saves a clean
    /// file. A framing failure aborts the whole load: the method
    /// returns the error and `self` keeps its previous state.
    pub fn load(&mut self, path: &Path) -> Result<(), DbError> {
        let file = File::open(path)?;
        let (mut fresh, report) = Self::read_stream(file)?;
        fresh.modified = !report.skipped.is_empty();
        tracing::debug!(
            path = %path.display(),
            loaded = report.loaded,
            skipped = report.skipped.len(),
            "ledger loaded"
        );
        *self = fresh;
        Ok(())
    }

    /// Scans a ledger file and reports per-record decode results
    /// without touching any in-memory ledger.
    pub fn scan(path: &Path) -> Result<LoadReport, DbError> {
        let file = File::open(path)?;
        let (_, report) = Self::read_stream(file)?;
        Ok(report)
    }

    /// Decodes a whole stream into a fresh ledger.
    fn read_stream<R: Read>(reader: R) -> Result<(Ledger, LoadReport), DbError> {
        let mut frames = FrameReader::new(reader);
        let mut ledger = Ledger::new();
        let mut report = LoadReport::default();
        let mut index = 0usize;
        while let Some(frame) = frames.read_frame()? {
            match wire::apply_record(&mut ledger, &frame) {
                Ok(()) => report.loaded += 1,
                Err(err) => {
                    tracing::warn!(record = index, error = %err, "skipping malformed record");
                    report.skipped.push((index, err));
                }
            }
            index += 1;
        }
        Ok((ledger, report))
    }

    /// Saves the whole ledger and clears the modified flag.
    ///
    /// Crash-safe: the complete file is written to a sibling
    /// temporary, flushed and synced, then renamed over the
    /// destination. Any failure before the rename discards the
    /// temporary and leaves the original untouched.
    pub fn save(&mut self, path: &Path) -> io::Result<()> {
        self.write_atomically(path, None, true)?;
        self.modified = false;
        tracing::debug!(path = %path.display(), "ledger saved");
        Ok(())
    }

    /// Saves the entities plus an explicit transaction subset,
    /// omitting schedules. Used for date-range archival exports; the
    /// modified flag is untouched.
    pub fn save_subset(&self, path: &Path, txns: &[TxnId]) -> io::Result<()> {
        let subset: HashSet<TxnId> = txns.iter().copied().collect();
        self.write_atomically(path, Some(&subset), false)
    }

    fn write_atomically(
        &self,
        path: &Path,
        subset: Option<&HashSet<TxnId>>,
        include_schedules: bool,
    ) -> io::Result<()> {
        let tmp = temp_sibling(path);
        let result = self.write_to_file(&tmp, subset, include_schedules);
        match result {
            Ok(()) => fs::rename(&tmp, path).map_err(|err| {
                let _ = fs::remove_file(&tmp);
                err
            }),
            Err(err) => {
                let _ = fs::remove_file(&tmp);
                Err(err)
            }
        }
    }

    fn write_to_file(
        &self,
        tmp: &Path,
        subset: Option<&HashSet<TxnId>>,
        include_schedules: bool,
    ) -> io::Result<()> {
        let file = File::create(tmp)?;
        let mut writer = FrameWriter::new(BufWriter::new(file));
        self.write_records(&mut writer, subset, include_schedules)
            .map_err(framing_to_io)?;
        writer.flush().map_err(framing_to_io)?;
        let file = writer
            .into_inner()
            .into_inner()
            .map_err(|err| err.into_error())?;
        file.sync_all()
    }

    fn write_records<W: Write>(
        &self,
        writer: &mut FrameWriter<W>,
        subset: Option<&HashSet<TxnId>>,
        include_schedules: bool,
    ) -> Result<(), FramingError> {
        // Accounts first, each link target before the account linking
        // to it, so a single decode pass resolves every link.
        let mut written: HashSet<u32> = HashSet::new();
        for account in self.accounts.iter() {
            self.write_account_chain(account, writer, &mut written)?;
        }
        for category in self.categories.iter() {
            writer.write_frame(&wire::encode_category(category))?;
        }
        for security in self.securities.iter() {
            writer.write_frame(&wire::encode_security(security))?;
        }
        for txn in self.transactions.iter() {
            if subset.is_some_and(|ids| !ids.contains(&txn.id())) {
                continue;
            }
            writer.write_frame(&wire::encode_transaction(txn))?;
        }
        if include_schedules {
            for record in self.schedules.iter() {
                writer.write_frame(&wire::encode_schedule(record))?;
            }
        }
        Ok(())
    }

    fn write_account_chain<W: Write>(
        &self,
        account: &Account,
        writer: &mut FrameWriter<W>,
        written: &mut HashSet<u32>,
    ) -> Result<(), FramingError> {
        if !written.insert(account.id().as_u32()) {
            return Ok(());
        }
        if let Some(target) = account.linked_account() {
            if let Some(target_account) = self.accounts.get(target) {
                self.write_account_chain(target_account, writer, written)?;
            }
        }
        writer.write_frame(&wire::encode_account(account))
    }

    /// Copies the three entity registries into a ledger with empty
    /// books. Decode tests seed a receiving ledger with it.
    #[cfg(test)]
    pub(crate) fn clone_entities_only(&self) -> Ledger {
        Ledger {
            accounts: self.accounts.clone(),
            categories: self.categories.clone(),
            securities: self.securities.clone(),
            transactions: TransactionBook::new(),
            schedules: ScheduleBook::new(),
            modified: false,
        }
    }
}

/// Sibling temporary path: the destination name with ".tmp" appended.
fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

fn framing_to_io(err: FramingError) -> io::Error {
    match err {
        FramingError::Io(err) => err,
        other => io::Error::new(io::ErrorKind::InvalidData, other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::transaction::Split;
    use crate::element::{AccountKind, CategoryKind};
    use tempfile::tempdir;

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn sample_ledger() -> Ledger {
        let mut ledger = Ledger::new();
        let checking = ledger
            .add_account(Account::new("Checking", AccountKind::Bank))
            .unwrap();
        let groceries = ledger
            .add_category(Category::new("Groceries", CategoryKind::Expense))
            .unwrap();
        ledger
            .insert_transaction(
                Transaction::new(day(1, 15), checking, Money::from_cents(-4_250), "Market")
                    .with_category(groceries),
            )
            .unwrap();
        ledger
    }

    #[test]
    fn reference_lifecycle_blocks_then_allows_removal() {
        let mut ledger = sample_ledger();
        let category = ledger.categories().by_name("Groceries").unwrap().id();
        let txn = ledger.transactions().as_slice()[0].id();

        let err = ledger.remove_category(category).unwrap_err();
        assert!(matches!(err, IntegrityError::StillReferenced { .. }));
        assert_eq!(ledger.categories().len(), 1);

        ledger.remove_transaction(txn).unwrap();
        ledger.remove_category(category).unwrap();
        assert_eq!(ledger.categories().len(), 0);
    }

    #[test]
    fn linked_account_blocks_removal() {
        let mut ledger = Ledger::new();
        let bank = ledger
            .add_account(Account::new("Bank", AccountKind::Bank))
            .unwrap();
        let loan = ledger
            .add_account(Account::new("Loan", AccountKind::Loan))
            .unwrap();
        ledger.set_account_link(loan, Some(bank)).unwrap();

        let err = ledger.remove_account(bank).unwrap_err();
        assert!(matches!(err, IntegrityError::StillLinked { links: 1, .. }));

        // Unlink, then removal works.
        ledger.set_account_link(loan, None).unwrap();
        ledger.remove_account(bank).unwrap();
    }

    #[test]
    fn removing_linker_releases_target() {
        let mut ledger = Ledger::new();
        let bank = ledger
            .add_account(Account::new("Bank", AccountKind::Bank))
            .unwrap();
        let loan = ledger
            .add_account(Account::new("Loan", AccountKind::Loan))
            .unwrap();
        ledger.set_account_link(loan, Some(bank)).unwrap();

        ledger.remove_account(loan).unwrap();
        assert_eq!(ledger.accounts().get(bank).unwrap().link_count(), 0);
        ledger.remove_account(bank).unwrap();
    }

    #[test]
    fn split_refs_counted_per_leg() {
        let mut ledger = Ledger::new();
        let checking = ledger
            .add_account(Account::new("Checking", AccountKind::Bank))
            .unwrap();
        let savings = ledger
            .add_account(Account::new("Savings", AccountKind::Bank))
            .unwrap();
        let groceries = ledger
            .add_category(Category::new("Groceries", CategoryKind::Expense))
            .unwrap();

        let (id, _) = ledger
            .insert_transaction(
                Transaction::new(day(2, 1), checking, Money::from_cents(-9_000), "Split")
                    .with_splits(vec![
                        Split::to_category("food", groceries, Money::from_cents(-5_000)),
                        Split::to_account("save", savings, Money::from_cents(-4_000)),
                    ]),
            )
            .unwrap();

        assert_eq!(ledger.accounts().ref_count(checking), 1);
        assert_eq!(ledger.accounts().ref_count(savings), 1);
        assert_eq!(ledger.categories().ref_count(groceries), 1);

        ledger.remove_transaction(id).unwrap();
        assert_eq!(ledger.accounts().ref_count(checking), 0);
        assert_eq!(ledger.accounts().ref_count(savings), 0);
        assert_eq!(ledger.categories().ref_count(groceries), 0);
    }

    #[test]
    fn duplicate_bumps_references() {
        let mut ledger = sample_ledger();
        let category = ledger.categories().by_name("Groceries").unwrap().id();
        let original = ledger.transactions().as_slice()[0].id();

        let (copy, _) = ledger.duplicate_transaction(original).unwrap();
        assert_ne!(copy, original);
        assert_eq!(ledger.categories().ref_count(category), 2);
        assert_eq!(ledger.transactions().len(), 2);
    }

    #[test]
    fn category_swap_is_atomic() {
        let mut ledger = sample_ledger();
        let groceries = ledger.categories().by_name("Groceries").unwrap().id();
        let dining = ledger
            .add_category(Category::new("Dining", CategoryKind::Expense))
            .unwrap();
        let txn = ledger.transactions().as_slice()[0].id();

        ledger.set_transaction_category(txn, Some(dining)).unwrap();
        assert_eq!(ledger.categories().ref_count(groceries), 0);
        assert_eq!(ledger.categories().ref_count(dining), 1);

        ledger.set_transaction_category(txn, None).unwrap();
        assert_eq!(ledger.categories().ref_count(dining), 0);
    }

    #[test]
    fn swap_to_unknown_category_changes_nothing() {
        let mut ledger = sample_ledger();
        let groceries = ledger.categories().by_name("Groceries").unwrap().id();
        let txn = ledger.transactions().as_slice()[0].id();

        let err = ledger
            .set_transaction_category(txn, Some(CategoryId::new(404)))
            .unwrap_err();
        assert!(matches!(err, IntegrityError::UnknownElement { .. }));
        assert_eq!(
            ledger.transactions().get(txn).unwrap().category,
            Some(groceries)
        );
        assert_eq!(ledger.categories().ref_count(groceries), 1);
    }

    #[test]
    fn date_change_reorders_without_touching_refs() {
        let mut ledger = sample_ledger();
        let checking = ledger.accounts().by_name("Checking").unwrap().id();
        let first = ledger.transactions().as_slice()[0].id();
        let (second, _) = ledger
            .insert_transaction(Transaction::new(
                day(3, 1),
                checking,
                Money::from_cents(100),
                "later",
            ))
            .unwrap();

        ledger.set_transaction_date(first, day(4, 1)).unwrap();
        let order: Vec<TxnId> = ledger.transactions().iter().map(|t| t.id()).collect();
        assert_eq!(order, vec![second, first]);
        assert_eq!(ledger.accounts().ref_count(checking), 2);
    }

    #[test]
    fn save_load_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.tly");

        let mut ledger = Ledger::new();
        let bank = ledger
            .add_account(Account::new("Bank", AccountKind::Bank))
            .unwrap();
        let loan = ledger
            .add_account(Account::new("Loan", AccountKind::Loan))
            .unwrap();
        ledger.set_account_link(loan, Some(bank)).unwrap();
        let groceries = ledger
            .add_category(Category::new("Groceries", CategoryKind::Expense))
            .unwrap();
        let fund = ledger
            .add_security(Security::new("Fund").with_symbol("FND"))
            .unwrap();
        ledger
            .insert_transaction(
                Transaction::new(day(1, 10), bank, Money::from_cents(-2_000), "Store")
                    .with_category(groceries),
            )
            .unwrap();
        ledger
            .insert_schedule(ScheduleRecord::new(
                crate::book::schedule::ScheduleKind::Monthly,
                day(2, 1),
                bank,
                Money::from_cents(-80_000),
                "Rent",
            ))
            .unwrap();
        ledger.save(&path).unwrap();
        assert!(!ledger.is_modified());

        let mut reloaded = Ledger::new();
        reloaded.load(&path).unwrap();
        assert!(!reloaded.is_modified());
        assert_eq!(reloaded.accounts().len(), 2);
        assert_eq!(reloaded.categories().len(), 1);
        assert_eq!(reloaded.securities().len(), 1);
        assert_eq!(reloaded.transactions().len(), 1);
        assert_eq!(reloaded.schedules().len(), 1);
        assert_eq!(
            reloaded.accounts().get(loan).unwrap().linked_account(),
            Some(bank)
        );
        assert_eq!(reloaded.accounts().get(bank).unwrap().link_count(), 1);
        assert_eq!(reloaded.securities().get(fund).unwrap().symbol(), Some("FND"));
        // Counts reconstructed from decode, not persisted.
        assert_eq!(reloaded.accounts().ref_count(bank), 1);
        assert_eq!(reloaded.categories().ref_count(groceries), 1);
    }

    #[test]
    fn linker_written_after_target_regardless_of_creation_order() {
        // Create the linking account first so name order would put it
        // first; the writer must still emit the target before it.
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.tly");

        let mut ledger = Ledger::new();
        let loan = ledger
            .add_account(Account::new("Aardvark Loan", AccountKind::Loan))
            .unwrap();
        let bank = ledger
            .add_account(Account::new("Zenith Bank", AccountKind::Bank))
            .unwrap();
        ledger.set_account_link(loan, Some(bank)).unwrap();
        ledger.save(&path).unwrap();

        // Single-pass reload resolves the link.
        let mut reloaded = Ledger::new();
        reloaded.load(&path).unwrap();
        assert!(!reloaded.is_modified());
        assert_eq!(
            reloaded.accounts().get(loan).unwrap().linked_account(),
            Some(bank)
        );

        // And the raw stream really holds the target first.
        let bytes = fs::read(&path).unwrap();
        let mut reader = FrameReader::new(bytes.as_slice());
        let first = reader.read_frame().unwrap().unwrap();
        let mut r = tally_codec::RecordReader::new(&first);
        assert_eq!(r.take_u8().unwrap(), wire::REC_ACCOUNT);
        assert_eq!(r.take_u32().unwrap(), bank.as_u32());
    }

    #[test]
    fn corrupted_record_is_skipped_and_flags_modified() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.tly");

        let mut ledger = sample_ledger();
        ledger.save(&path).unwrap();

        // Append a framed record with an unknown tag.
        let mut bytes = fs::read(&path).unwrap();
        bytes.extend_from_slice(&2u32.to_be_bytes());
        bytes.extend_from_slice(&[0xEE, 0x00]);
        fs::write(&path, &bytes).unwrap();

        let mut reloaded = Ledger::new();
        reloaded.load(&path).unwrap();
        assert!(reloaded.is_modified());
        assert_eq!(reloaded.accounts().len(), 1);
        assert_eq!(reloaded.transactions().len(), 1);

        let report = Ledger::scan(&path).unwrap();
        assert_eq!(report.loaded, 3);
        assert_eq!(report.skipped.len(), 1);
    }

    #[test]
    fn truncated_stream_aborts_load_and_keeps_state() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.tly");

        let mut ledger = sample_ledger();
        ledger.save(&path).unwrap();

        // Cut the file mid-record.
        let bytes = fs::read(&path).unwrap();
        fs::write(&path, &bytes[..bytes.len() - 3]).unwrap();

        let mut receiver = Ledger::new();
        receiver
            .add_account(Account::new("Keep Me", AccountKind::Cash))
            .unwrap();
        let err = receiver.load(&path).unwrap_err();
        assert!(matches!(err, DbError::Framing(FramingError::Truncated { .. })));
        // Previous in-memory state untouched.
        assert_eq!(receiver.accounts().len(), 1);
        assert!(receiver.accounts().by_name("Keep Me").is_some());
    }

    #[test]
    fn save_subset_omits_schedules_and_other_transactions() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("archive.tly");

        let mut ledger = Ledger::new();
        let checking = ledger
            .add_account(Account::new("Checking", AccountKind::Bank))
            .unwrap();
        let (keep, _) = ledger
            .insert_transaction(Transaction::new(
                day(1, 1),
                checking,
                Money::from_cents(100),
                "keep",
            ))
            .unwrap();
        ledger
            .insert_transaction(Transaction::new(
                day(6, 1),
                checking,
                Money::from_cents(200),
                "drop",
            ))
            .unwrap();
        ledger
            .insert_schedule(ScheduleRecord::new(
                crate::book::schedule::ScheduleKind::Weekly,
                day(1, 1),
                checking,
                Money::from_cents(-1),
                "sched",
            ))
            .unwrap();

        ledger.save_subset(&path, &[keep]).unwrap();
        assert!(ledger.is_modified());

        let mut archived = Ledger::new();
        archived.load(&path).unwrap();
        assert_eq!(archived.transactions().len(), 1);
        assert_eq!(archived.transactions().as_slice()[0].payee, "keep");
        assert!(archived.schedules().is_empty());
    }

    #[test]
    fn failed_save_leaves_original_untouched() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.tly");

        let mut ledger = sample_ledger();
        ledger.save(&path).unwrap();
        let original = fs::read(&path).unwrap();

        // Saving over a path whose parent does not exist fails before
        // the rename.
        let bad = dir.path().join("missing").join("ledger.tly");
        assert!(ledger.save(&bad).is_err());

        assert_eq!(fs::read(&path).unwrap(), original);
        assert!(!temp_sibling(&path).exists());
    }

    #[test]
    fn category_totals_in_name_order() {
        let mut ledger = Ledger::new();
        let checking = ledger
            .add_account(Account::new("Checking", AccountKind::Bank))
            .unwrap();
        let rent = ledger
            .add_category(Category::new("Rent", CategoryKind::Expense))
            .unwrap();
        let auto = ledger
            .add_category(Category::new("Auto", CategoryKind::Expense))
            .unwrap();
        ledger
            .insert_transaction(
                Transaction::new(day(1, 1), checking, Money::from_cents(-120_000), "rent")
                    .with_category(rent),
            )
            .unwrap();
        ledger
            .insert_transaction(
                Transaction::new(day(1, 5), checking, Money::from_cents(-7_000), "gas")
                    .with_category(auto),
            )
            .unwrap();
        ledger
            .insert_transaction(
                Transaction::new(day(1, 20), checking, Money::from_cents(-3_000), "gas")
                    .with_category(auto),
            )
            .unwrap();

        let totals = ledger.category_totals(day(1, 1), day(1, 31));
        assert_eq!(
            totals,
            vec![
                ("Auto".to_string(), Money::from_cents(-10_000)),
                ("Rent".to_string(), Money::from_cents(-120_000)),
            ]
        );
    }

    #[test]
    fn balance_series_is_plain_pairs() {
        let mut ledger = sample_ledger();
        let checking = ledger.accounts().by_name("Checking").unwrap().id();
        ledger
            .insert_transaction(Transaction::new(
                day(2, 1),
                checking,
                Money::from_cents(10_000),
                "deposit",
            ))
            .unwrap();

        let series = ledger.balance_series(checking);
        assert_eq!(
            series,
            vec![
                (day(1, 15), Money::from_cents(-4_250)),
                (day(2, 1), Money::from_cents(5_750)),
            ]
        );
    }
}
