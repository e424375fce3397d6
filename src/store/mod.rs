//! In-memory persistence for the ledger.
//!
//! Every record type lives in its own versioned [`Table`]. Writers never touch
//! tables directly: they open an [`AtomicGroup`] with [`Store::begin`], stage
//! reads and writes there, and [`AtomicGroup::commit`] makes the whole group
//! visible at once or not at all.

use std::{
    collections::HashMap,
    fmt,
    hash::Hash,
    sync::{PoisonError, RwLock, RwLockWriteGuard},
};

use crate::domain::{
    BankAccount, BankTransfer, Client, DailyTransaction, EntityKind, LedgerEntry, LedgerEntryId,
    LoadRecord, OpeningCash, Operator, Recharge, TransactionId, WalletNumber,
};

mod group;

pub use group::{AtomicGroup, Changes, Staged};

/// A persisted record type, keyed by its business identifier.
pub trait Record: Clone {
    type Key: Clone + Eq + Hash + Ord + fmt::Display;
    const KIND: EntityKind;

    fn key(&self) -> Self::Key;

    #[doc(hidden)]
    fn table(tables: &Tables) -> &Table<Self>;
    #[doc(hidden)]
    fn table_mut(tables: &mut Tables) -> &mut Table<Self>;
    #[doc(hidden)]
    fn staged(changes: &mut Changes) -> &mut Staged<Self>;
}

macro_rules! record {
    ($ty:ty, $key:ty, $kind:expr, $field:ident, |$record:ident| $key_expr:expr) => {
        impl Record for $ty {
            type Key = $key;
            const KIND: EntityKind = $kind;

            fn key(&self) -> Self::Key {
                let $record = self;
                $key_expr
            }
            fn table(tables: &Tables) -> &Table<Self> {
                &tables.$field
            }
            fn table_mut(tables: &mut Tables) -> &mut Table<Self> {
                &mut tables.$field
            }
            fn staged(changes: &mut Changes) -> &mut Staged<Self> {
                &mut changes.$field
            }
        }
    };
}

record!(BankAccount, crate::domain::AccountNumber, EntityKind::BankAccount, bank_accounts, |r| r.account_number.clone());
record!(WalletNumber, crate::domain::WalletId, EntityKind::Wallet, wallets, |r| r.id);
record!(Operator, crate::domain::OperatorNumber, EntityKind::Operator, operators, |r| r.number.clone());
record!(Client, crate::domain::ClientId, EntityKind::Client, clients, |r| r.id);
record!(BankTransfer, TransactionId, EntityKind::BankTransfer, transfers, |r| r.id);
record!(Recharge, TransactionId, EntityKind::Recharge, recharges, |r| r.id);
record!(LoadRecord, TransactionId, EntityKind::LoadRecord, loads, |r| r.id);
record!(DailyTransaction, TransactionId, EntityKind::DailyTransaction, daily, |r| r.id);
record!(LedgerEntry, LedgerEntryId, EntityKind::LedgerEntry, ledger, |r| r.id);
record!(OpeningCash, chrono::NaiveDate, EntityKind::OpeningCash, opening_cash, |r| r.date);

#[derive(Debug)]
struct Row<T> {
    version: u64,
    value: T,
}

/// Committed rows of one record type.
#[derive(Debug)]
pub struct Table<T: Record> {
    rows: HashMap<T::Key, Row<T>>,
}

impl<T: Record> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: HashMap::new(),
        }
    }
}

impl<T: Record> Table<T> {
    pub fn get(&self, key: &T::Key) -> Option<&T> {
        self.rows.get(key).map(|row| &row.value)
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.rows.values().map(|row| &row.value)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn version(&self, key: &T::Key) -> Option<u64> {
        self.rows.get(key).map(|row| row.version)
    }

    fn upsert(&mut self, value: T, version: u64) {
        self.rows.insert(value.key(), Row { version, value });
    }

    fn remove(&mut self, key: &T::Key) -> Option<T> {
        self.rows.remove(key).map(|row| row.value)
    }
}

/// Snapshot of everything committed so far.
#[derive(Debug, Default)]
pub struct Tables {
    /// Bumped once per commit; rows written by a commit carry its value.
    sequence: u64,
    bank_accounts: Table<BankAccount>,
    wallets: Table<WalletNumber>,
    operators: Table<Operator>,
    clients: Table<Client>,
    transfers: Table<BankTransfer>,
    recharges: Table<Recharge>,
    loads: Table<LoadRecord>,
    daily: Table<DailyTransaction>,
    ledger: Table<LedgerEntry>,
    opening_cash: Table<OpeningCash>,
    ledger_by_origin: HashMap<TransactionId, LedgerEntryId>,
}

impl Tables {
    pub fn table<T: Record>(&self) -> &Table<T> {
        T::table(self)
    }

    pub fn get<T: Record>(&self, key: &T::Key) -> Option<&T> {
        T::table(self).get(key)
    }

    pub fn all<'a, T: Record + 'a>(&'a self) -> impl Iterator<Item = &'a T> {
        T::table(self).values()
    }

    /// The ledger entry whose back-reference names `origin`.
    pub fn ledger_entry_for(&self, origin: TransactionId) -> Option<&LedgerEntry> {
        self.ledger_by_origin
            .get(&origin)
            .and_then(|id| self.ledger.get(id))
    }
}

#[derive(Debug, Default)]
pub struct Store {
    tables: RwLock<Tables>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens an atomic group. Nothing it stages is visible until commit.
    pub fn begin(&self) -> AtomicGroup<'_> {
        AtomicGroup::new(self)
    }

    /// Runs `f` against the committed state.
    pub fn read<R>(&self, f: impl FnOnce(&Tables) -> R) -> R {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        f(&tables)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner)
    }
}
