//! Core domain types: balance-bearing entities, domain transactions, the
//! ledger feed, and the pure rules turning transactions into balance effects.

use std::fmt;

pub mod delta;
mod entities;
mod ids;
mod ledger;
mod transactions;

pub use delta::{BalanceEffects, Effect, Flow, Target, compute_delta};
pub use entities::{
    BalanceHolder, BankAccount, Client, Denomination, OpeningCash, Operator, WalletKind,
    WalletNumber,
};
pub use ids::{AccountNumber, ClientId, LedgerEntryId, OperatorNumber, TransactionId, WalletId};
pub use ledger::{EntryKind, LedgerEntry, META_ACCOUNT, META_SOURCE, META_TXN_ID};
pub use transactions::{
    BankTransfer, DailyKind, DailyTransaction, LoadRecord, Recharge, TransferKind,
};

/// Every kind of record the ledger persists. Used to say precisely what was
/// missing, short or contended when an operation fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    BankAccount,
    Wallet,
    Operator,
    Client,
    BankTransfer,
    Recharge,
    LoadRecord,
    DailyTransaction,
    LedgerEntry,
    OpeningCash,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::BankAccount => "bank account",
            Self::Wallet => "wallet",
            Self::Operator => "operator",
            Self::Client => "client",
            Self::BankTransfer => "bank transfer",
            Self::Recharge => "recharge",
            Self::LoadRecord => "load record",
            Self::DailyTransaction => "daily transaction",
            Self::LedgerEntry => "ledger entry",
            Self::OpeningCash => "opening cash",
        };
        f.write_str(label)
    }
}

/// A type string that names no known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {family} type `{value}`")]
pub struct UnknownKind {
    pub family: EntityKind,
    pub value: String,
}

impl UnknownKind {
    pub fn new(family: EntityKind, value: &str) -> Self {
        Self {
            family,
            value: value.to_owned(),
        }
    }
}
