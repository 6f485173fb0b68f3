//! Transactions, splits, and reconciliation state.

use super::{insertion_index, Dated};
use crate::types::{AccountId, CategoryId, Money, Quantity, SecurityId, TxnId};
use chrono::NaiveDate;

/// Per-side reconciliation state.
///
/// Each side of a transfer is confirmed against a different external
/// statement, so the two sides advance independently. The machine only
/// moves forward; going back to [`ReconcileState::NotReconciled`] is an
/// explicit [`ReconcileState::reset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReconcileState {
    /// Not yet matched against a statement.
    #[default]
    NotReconciled,
    /// Matched provisionally, statement not yet closed.
    Pending,
    /// Confirmed against a closed statement.
    Reconciled,
}

impl ReconcileState {
    /// Advances one step; `Reconciled` stays put.
    #[must_use]
    pub const fn advance(self) -> Self {
        match self {
            Self::NotReconciled => Self::Pending,
            Self::Pending | Self::Reconciled => Self::Reconciled,
        }
    }

    /// Returns to the unreconciled state.
    #[must_use]
    pub const fn reset(self) -> Self {
        Self::NotReconciled
    }

    /// Whether the state is `Reconciled`.
    #[must_use]
    pub const fn is_reconciled(self) -> bool {
        matches!(self, Self::Reconciled)
    }

    /// Encodes the state as two bits: pending = bit 0, reconciled =
    /// bit 1.
    #[must_use]
    pub const fn as_bits(self) -> u8 {
        match self {
            Self::NotReconciled => 0,
            Self::Pending => 0b01,
            Self::Reconciled => 0b10,
        }
    }

    /// Decodes two bits; both bits set is invalid.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(Self::NotReconciled),
            0b01 => Some(Self::Pending),
            0b10 => Some(Self::Reconciled),
            _ => None,
        }
    }
}

/// The source-side and target-side reconciliation states of a
/// transaction, packed into four bits on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReconcilePair {
    /// State on the owning account's side.
    pub source: ReconcileState,
    /// State on the transfer account's side.
    pub target: ReconcileState,
}

impl ReconcilePair {
    /// Encodes both sides: source in bits 0-1, target in bits 2-3.
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        self.source.as_bits() | (self.target.as_bits() << 2)
    }

    /// Decodes the packed byte; invalid bit combinations yield `None`.
    #[must_use]
    pub const fn from_byte(b: u8) -> Option<Self> {
        if b & 0xF0 != 0 {
            return None;
        }
        let source = match ReconcileState::from_bits(b & 0b11) {
            Some(s) => s,
            None => return None,
        };
        let target = match ReconcileState::from_bits((b >> 2) & 0b11) {
            Some(s) => s,
            None => return None,
        };
        Some(Self { source, target })
    }
}

/// Investment action recorded on a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvestAction {
    /// Purchase of shares.
    Buy,
    /// Sale of shares.
    Sell,
    /// Cash dividend.
    Dividend,
    /// Dividend reinvested into shares.
    Reinvest,
    /// Shares added without a cash leg.
    AddShares,
    /// Shares removed without a cash leg.
    RemoveShares,
    /// Stock split; `new_shares` holds the post-split count.
    StockSplit,
    /// Corporate action exchanging one security for another.
    Exchange,
}

impl InvestAction {
    /// Decodes an action from its wire byte.
    #[must_use]
    pub const fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(Self::Buy),
            1 => Some(Self::Sell),
            2 => Some(Self::Dividend),
            3 => Some(Self::Reinvest),
            4 => Some(Self::AddShares),
            5 => Some(Self::RemoveShares),
            6 => Some(Self::StockSplit),
            7 => Some(Self::Exchange),
            _ => None,
        }
    }

    /// Returns the wire byte.
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        match self {
            Self::Buy => 0,
            Self::Sell => 1,
            Self::Dividend => 2,
            Self::Reinvest => 3,
            Self::AddShares => 4,
            Self::RemoveShares => 5,
            Self::StockSplit => 6,
            Self::Exchange => 7,
        }
    }
}

/// Lot-accounting method for a sale. Stored by the ledger, evaluated
/// by an external capital-gains calculator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LotMethod {
    /// First in, first out.
    #[default]
    Fifo,
    /// Last in, first out.
    Lifo,
    /// Average cost basis.
    AverageCost,
}

impl LotMethod {
    /// Decodes a method from its wire byte.
    #[must_use]
    pub const fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(Self::Fifo),
            1 => Some(Self::Lifo),
            2 => Some(Self::AverageCost),
            _ => None,
        }
    }

    /// Returns the wire byte.
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        match self {
            Self::Fifo => 0,
            Self::Lifo => 1,
            Self::AverageCost => 2,
        }
    }
}

/// Investment fields of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Investment {
    /// Shares bought, sold, or moved.
    pub shares: Quantity,
    /// Post-action share count for splits and exchanges.
    pub new_shares: Quantity,
    /// Price per share.
    pub price: Money,
    /// Commission paid.
    pub commission: Money,
    /// What happened.
    pub action: InvestAction,
    /// Lot-accounting tag for sales.
    pub lot_method: LotMethod,
}

/// One leg of a multi-way transaction.
///
/// Split amounts are stored from the owning account's perspective; the
/// set of a transaction's splits sums to the transaction amount. A
/// split carries only a target-side reconciliation state, since the
/// source side belongs to the parent transaction's account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    /// Leg description.
    pub description: String,
    /// Target account, for transfer legs.
    pub account: Option<AccountId>,
    /// Target category, for categorized legs.
    pub category: Option<CategoryId>,
    /// Signed amount from the owning account's perspective.
    pub amount: Money,
    /// Target-side reconciliation state.
    pub reconcile: ReconcileState,
}

impl Split {
    /// Creates a categorized split leg.
    pub fn to_category(
        description: impl Into<String>,
        category: CategoryId,
        amount: Money,
    ) -> Self {
        Self {
            description: description.into(),
            account: None,
            category: Some(category),
            amount,
            reconcile: ReconcileState::NotReconciled,
        }
    }

    /// Creates a transfer split leg.
    pub fn to_account(description: impl Into<String>, account: AccountId, amount: Money) -> Self {
        Self {
            description: description.into(),
            account: Some(account),
            category: None,
            amount,
            reconcile: ReconcileState::NotReconciled,
        }
    }
}

/// Where a transaction leg sends its money.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegTarget {
    /// Uncategorized.
    None,
    /// A category.
    Category(CategoryId),
    /// Another account.
    Account(AccountId),
}

/// One (amount, destination) pair of a transaction.
///
/// Consumers must branch on split presence rather than assume one
/// shape: a transaction without splits yields a single leg; one with
/// splits yields a leg per split, and those are the authoritative
/// decomposition of the amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Leg {
    /// Signed amount from the owning account's perspective.
    pub amount: Money,
    /// The destination.
    pub target: LegTarget,
}

/// A dated ledger transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub(crate) id: TxnId,
    /// Calendar date; the only component that orders the book.
    pub date: NaiveDate,
    /// Owning account. Always referenced.
    pub account: AccountId,
    /// Transfer target account.
    pub transfer: Option<AccountId>,
    /// Category.
    pub category: Option<CategoryId>,
    /// Security acted on.
    pub security: Option<SecurityId>,
    /// Replacement security for corporate actions.
    pub new_security: Option<SecurityId>,
    /// Signed amount relative to the owning account.
    pub amount: Money,
    /// Payee or description.
    pub payee: String,
    /// Free-form memo.
    pub memo: Option<String>,
    /// Check number or similar reference.
    pub number: Option<String>,
    /// Source- and target-side reconciliation.
    pub reconcile: ReconcilePair,
    /// Investment fields.
    pub invest: Option<Investment>,
    /// Split legs; when non-empty they are the authoritative
    /// decomposition of `amount`.
    pub splits: Vec<Split>,
}

impl Transaction {
    /// Creates a transaction with the mandatory fields.
    pub fn new(
        date: NaiveDate,
        account: AccountId,
        amount: Money,
        payee: impl Into<String>,
    ) -> Self {
        Self {
            id: TxnId::new(0),
            date,
            account,
            transfer: None,
            category: None,
            security: None,
            new_security: None,
            amount,
            payee: payee.into(),
            memo: None,
            number: None,
            reconcile: ReconcilePair::default(),
            invest: None,
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

    /// Sets the security.
    #[must_use]
    pub fn with_security(mut self, security: SecurityId) -> Self {
        self.security = Some(security);
        self
    }

    /// Sets the replacement security.
    #[must_use]
    pub fn with_new_security(mut self, security: SecurityId) -> Self {
        self.new_security = Some(security);
        self
    }

    /// Sets the investment fields.
    #[must_use]
    pub fn with_investment(mut self, invest: Investment) -> Self {
        self.invest = Some(invest);
        self
    }

    /// Sets the split legs.
    #[must_use]
    pub fn with_splits(mut self, splits: Vec<Split>) -> Self {
        self.splits = splits;
        self
    }

    /// Runtime identity, assigned when the transaction enters a book.
    pub fn id(&self) -> TxnId {
        self.id
    }

    /// Whether the transaction is decomposed into splits.
    pub fn has_splits(&self) -> bool {
        !self.splits.is_empty()
    }

    /// Iterates the transaction's legs.
    ///
    /// Without splits: one leg holding the full amount and the
    /// transfer-or-category destination. With splits: one leg per
    /// split.
    pub fn legs(&self) -> impl Iterator<Item = Leg> + '_ {
        let single = if self.splits.is_empty() {
            let target = match (self.transfer, self.category) {
                (Some(account), _) => LegTarget::Account(account),
                (None, Some(category)) => LegTarget::Category(category),
                (None, None) => LegTarget::None,
            };
            Some(Leg {
                amount: self.amount,
                target,
            })
        } else {
            None
        };
        single.into_iter().chain(self.splits.iter().map(|split| {
            let target = match (split.account, split.category) {
                (Some(account), _) => LegTarget::Account(account),
                (None, Some(category)) => LegTarget::Category(category),
                (None, None) => LegTarget::None,
            };
            Leg {
                amount: split.amount,
                target,
            }
        }))
    }

    /// Signed contribution of this transaction to `account`'s balance.
    ///
    /// `+amount` if `account` owns the transaction, `-amount` if it is
    /// the transfer target, `-split.amount` for the first split leg
    /// targeting it, `None` if the transaction does not touch it.
    pub fn contribution_for(&self, account: AccountId) -> Option<Money> {
        if self.account == account {
            return Some(self.amount);
        }
        if self.transfer == Some(account) {
            return Some(-self.amount);
        }
        self.splits
            .iter()
            .find(|split| split.account == Some(account))
            .map(|split| -split.amount)
    }
}

impl Dated for Transaction {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

/// The date-ordered transaction collection.
///
/// Sole owner of its transactions. Mutation goes through the
/// [`Ledger`](crate::Ledger) so reference counts stay in step.
#[derive(Debug, Clone)]
pub struct TransactionBook {
    items: Vec<Transaction>,
    next_id: u64,
}

impl TransactionBook {
    /// Creates an empty book.
    pub(crate) fn new() -> Self {
        Self {
            items: Vec::new(),
            next_id: 1,
        }
    }

    /// Number of transactions.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the book is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The transactions in date order.
    pub fn as_slice(&self) -> &[Transaction] {
        &self.items
    }

    /// Iterates transactions in date order.
    pub fn iter(&self) -> std::slice::Iter<'_, Transaction> {
        self.items.iter()
    }

    /// Looks up a transaction by its runtime identity.
    pub fn get(&self, id: TxnId) -> Option<&Transaction> {
        self.items.iter().find(|txn| txn.id == id)
    }

    /// The transaction at a book index.
    pub fn get_at(&self, index: usize) -> Option<&Transaction> {
        self.items.get(index)
    }

    /// Book index of a transaction.
    pub fn position_of(&self, id: TxnId) -> Option<usize> {
        self.items.iter().position(|txn| txn.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: TxnId) -> Option<&mut Transaction> {
        self.items.iter_mut().find(|txn| txn.id == id)
    }

    /// Inserts a transaction, assigning a fresh identity. Returns the
    /// identity and the book index it landed at.
    pub(crate) fn insert(&mut self, mut txn: Transaction) -> (TxnId, usize) {
        let id = TxnId::new(self.next_id);
        self.next_id += 1;
        txn.id = id;
        let at = insertion_index(&self.items, txn.date);
        self.items.insert(at, txn);
        (id, at)
    }

    /// Re-inserts a transaction that already carries an identity.
    pub(crate) fn insert_preserving_id(&mut self, txn: Transaction) -> usize {
        debug_assert!(txn.id.as_u64() != 0, "insert_preserving_id without id");
        self.next_id = self.next_id.max(txn.id.as_u64() + 1);
        let at = insertion_index(&self.items, txn.date);
        self.items.insert(at, txn);
        at
    }

    /// Removes and returns the transaction at a book index.
    pub(crate) fn remove_at(&mut self, index: usize) -> Transaction {
        self.items.remove(index)
    }
}
