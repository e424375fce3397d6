//! Optimistic atomic groups.
//!
//! A group remembers the version of every committed record it read. Commit
//! re-checks those versions under the write lock: if any record changed or
//! vanished in the meantime the group aborts with
//! [`EngineError::ConflictAbort`] and none of its writes are applied. Two
//! writers racing on the same balance therefore cannot both win.

use std::collections::HashMap;

use tracing::debug;

use crate::{
    domain::{
        BankAccount, BankTransfer, Client, DailyTransaction, LedgerEntry, LoadRecord, OpeningCash,
        Operator, Recharge, TransactionId, WalletNumber,
    },
    engine::errors::EngineError,
    store::{Record, Store, Tables},
};

/// Reads and writes of one record type inside a group.
#[derive(Debug)]
pub struct Staged<T: Record> {
    /// Version seen at first read; `None` when the record did not exist.
    reads: HashMap<T::Key, Option<u64>>,
    /// `None` stages a delete.
    writes: HashMap<T::Key, Option<T>>,
}

impl<T: Record> Default for Staged<T> {
    fn default() -> Self {
        Self {
            reads: HashMap::new(),
            writes: HashMap::new(),
        }
    }
}

impl<T: Record> Staged<T> {
    fn validate(&self, tables: &Tables) -> Result<(), EngineError> {
        let table = T::table(tables);
        for (key, seen) in &self.reads {
            if table.version(key) != *seen {
                return Err(EngineError::ConflictAbort {
                    kind: T::KIND,
                    key: key.to_string(),
                });
            }
        }
        Ok(())
    }

    fn apply(self, tables: &mut Tables, version: u64) -> usize {
        let table = T::table_mut(tables);
        let count = self.writes.len();
        for (key, write) in self.writes {
            match write {
                Some(record) => table.upsert(record, version),
                None => {
                    table.remove(&key);
                }
            }
        }
        count
    }
}

/// Everything a group has staged, one [`Staged`] per record type.
#[derive(Debug, Default)]
pub struct Changes {
    pub(super) bank_accounts: Staged<BankAccount>,
    pub(super) wallets: Staged<WalletNumber>,
    pub(super) operators: Staged<Operator>,
    pub(super) clients: Staged<Client>,
    pub(super) transfers: Staged<BankTransfer>,
    pub(super) recharges: Staged<Recharge>,
    pub(super) loads: Staged<LoadRecord>,
    pub(super) daily: Staged<DailyTransaction>,
    pub(super) ledger: Staged<LedgerEntry>,
    pub(super) opening_cash: Staged<OpeningCash>,
}

impl Changes {
    fn validate(&self, tables: &Tables) -> Result<(), EngineError> {
        self.bank_accounts.validate(tables)?;
        self.wallets.validate(tables)?;
        self.operators.validate(tables)?;
        self.clients.validate(tables)?;
        self.transfers.validate(tables)?;
        self.recharges.validate(tables)?;
        self.loads.validate(tables)?;
        self.daily.validate(tables)?;
        self.ledger.validate(tables)?;
        self.opening_cash.validate(tables)
    }

    fn apply(self, tables: &mut Tables) -> usize {
        tables.sequence += 1;
        let version = tables.sequence;

        for (key, write) in &self.ledger.writes {
            if let Some(origin) = tables.ledger.get(key).and_then(LedgerEntry::origin) {
                tables.ledger_by_origin.remove(&origin);
            }
            if let Some(entry) = write
                && let Some(origin) = entry.origin()
            {
                tables.ledger_by_origin.insert(origin, entry.id);
            }
        }

        self.bank_accounts.apply(tables, version)
            + self.wallets.apply(tables, version)
            + self.operators.apply(tables, version)
            + self.clients.apply(tables, version)
            + self.transfers.apply(tables, version)
            + self.recharges.apply(tables, version)
            + self.loads.apply(tables, version)
            + self.daily.apply(tables, version)
            + self.ledger.apply(tables, version)
            + self.opening_cash.apply(tables, version)
    }
}

/// A unit of work against the [`Store`]. Dropping it without committing
/// discards everything staged.
pub struct AtomicGroup<'s> {
    store: &'s Store,
    changes: Changes,
}

impl<'s> AtomicGroup<'s> {
    pub(super) fn new(store: &'s Store) -> Self {
        Self {
            store,
            changes: Changes::default(),
        }
    }

    /// Current value of a record as seen by this group.
    pub fn get<T: Record>(&mut self, key: &T::Key) -> Option<T> {
        if let Some(staged) = T::staged(&mut self.changes).writes.get(key) {
            return staged.clone();
        }
        let (value, version) = self.store.read(|tables| {
            let table = T::table(tables);
            (table.get(key).cloned(), table.version(key))
        });
        T::staged(&mut self.changes)
            .reads
            .entry(key.clone())
            .or_insert(version);
        value
    }

    /// Like [`get`](Self::get) but a miss is a `NotFound` error.
    pub fn fetch<T: Record>(&mut self, key: &T::Key) -> Result<T, EngineError> {
        self.get(key).ok_or_else(|| EngineError::NotFound {
            kind: T::KIND,
            key: key.to_string(),
        })
    }

    /// First record matching `predicate`, staged writes taking precedence.
    pub fn find<T: Record>(&mut self, predicate: impl Fn(&T) -> bool) -> Option<T> {
        let staged = T::staged(&mut self.changes);
        if let Some(found) = staged.writes.values().flatten().find(|r| predicate(r)) {
            return Some(found.clone());
        }
        let found = self.store.read(|tables| {
            tables
                .all::<T>()
                .filter(|record| !staged.writes.contains_key(&record.key()))
                .find(|record| predicate(record))
                .cloned()
        })?;
        // Re-read through `get` so the match joins the read set.
        self.get::<T>(&found.key())
    }

    pub fn put<T: Record>(&mut self, record: T) {
        T::staged(&mut self.changes)
            .writes
            .insert(record.key(), Some(record));
    }

    pub fn remove<T: Record>(&mut self, key: &T::Key) {
        T::staged(&mut self.changes)
            .writes
            .insert(key.clone(), None);
    }

    /// The ledger entry mirroring the domain transaction `origin`.
    pub fn ledger_entry_for(&mut self, origin: TransactionId) -> Option<LedgerEntry> {
        if let Some(entry) = self
            .changes
            .ledger
            .writes
            .values()
            .flatten()
            .find(|entry| entry.origin() == Some(origin))
        {
            return Some(entry.clone());
        }
        let id = self
            .store
            .read(|tables| tables.ledger_by_origin.get(&origin).copied())?;
        self.get::<LedgerEntry>(&id)
    }

    /// Validates the read set and publishes every staged write.
    pub fn commit(self) -> Result<(), EngineError> {
        let mut tables = self.store.write();
        self.changes.validate(&tables)?;
        let written = self.changes.apply(&mut tables);
        debug!(sequence = tables.sequence, written, "Committed atomic group");
        Ok(())
    }
}
