//! Normalized ledger feed used for reporting.

use std::{collections::BTreeMap, fmt};

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{ClientId, DailyKind, LedgerEntryId, TransactionId, TransferKind};

/// Meta key holding the id of the domain transaction an entry mirrors.
pub const META_TXN_ID: &str = "txn_id";
/// Meta key naming the transaction family an entry came from.
pub const META_SOURCE: &str = "source";
/// Meta key holding the bank account number a transfer entry belongs to.
pub const META_ACCOUNT: &str = "account";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    BankSend,
    BankReceive,
    Recharge,
    OperatorLoad,
    CashIn,
    CashOut,
    SendMoney,
    ReceiveMoney,
    Bill,
    DuePayment,
}

impl EntryKind {
    /// Balance bookkeeping that is not a sale and stays out of sale totals.
    pub fn is_housekeeping(self) -> bool {
        matches!(
            self,
            Self::BankSend | Self::BankReceive | Self::OperatorLoad | Self::DuePayment
        )
    }
}

impl From<TransferKind> for EntryKind {
    fn from(kind: TransferKind) -> Self {
        match kind {
            TransferKind::Send => Self::BankSend,
            TransferKind::Receive => Self::BankReceive,
        }
    }
}

impl From<DailyKind> for EntryKind {
    fn from(kind: DailyKind) -> Self {
        match kind {
            DailyKind::CashIn => Self::CashIn,
            DailyKind::CashOut => Self::CashOut,
            DailyKind::SendMoney => Self::SendMoney,
            DailyKind::ReceiveMoney => Self::ReceiveMoney,
            DailyKind::Bill => Self::Bill,
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::BankSend => "bank send",
            Self::BankReceive => "bank receive",
            Self::Recharge => "recharge",
            Self::OperatorLoad => "operator load",
            Self::CashIn => "cash in",
            Self::CashOut => "cash out",
            Self::SendMoney => "send money",
            Self::ReceiveMoney => "receive money",
            Self::Bill => "bill",
            Self::DuePayment => "due payment",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: LedgerEntryId,
    pub kind: EntryKind,
    pub client: Option<ClientId>,
    pub client_phone: Option<String>,
    pub amount: Decimal,
    pub profit: Decimal,
    pub due: Decimal,
    pub note: String,
    pub meta: BTreeMap<String, String>,
    /// Business day the entry is reported under.
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Entry mirroring the domain transaction `origin`.
    pub fn mirror(
        kind: EntryKind,
        origin: TransactionId,
        source: &str,
        amount: Decimal,
        note: String,
        date: NaiveDate,
        created_at: DateTime<Utc>,
    ) -> Self {
        let mut meta = BTreeMap::new();
        meta.insert(META_TXN_ID.to_owned(), origin.to_string());
        meta.insert(META_SOURCE.to_owned(), source.to_owned());
        Self {
            id: LedgerEntryId::generate(),
            kind,
            client: None,
            client_phone: None,
            amount,
            profit: Decimal::ZERO,
            due: Decimal::ZERO,
            note,
            meta,
            date,
            created_at,
        }
    }

    /// The domain transaction this entry mirrors, if any.
    pub fn origin(&self) -> Option<TransactionId> {
        self.meta
            .get(META_TXN_ID)
            .and_then(|id| TransactionId::parse(id))
    }
}
