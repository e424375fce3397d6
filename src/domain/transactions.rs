//! Domain transactions. Each one belongs to exactly one family and is owned
//! (by business key) by the entity whose balance it explains.

use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{
    AccountNumber, ClientId, EntityKind, LedgerEntryId, OperatorNumber, TransactionId, UnknownKind,
    WalletId,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferKind {
    Send,
    Receive,
}

impl FromStr for TransferKind {
    type Err = UnknownKind;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "send" => Ok(Self::Send),
            "receive" => Ok(Self::Receive),
            _ => Err(UnknownKind::new(EntityKind::BankTransfer, value)),
        }
    }
}

impl fmt::Display for TransferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Send => f.write_str("send"),
            Self::Receive => f.write_str("receive"),
        }
    }
}

/// Money moved in or out of one of the shop's bank accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankTransfer {
    pub id: TransactionId,
    pub account: AccountNumber,
    pub kind: TransferKind,
    /// Snapshot of the owning account's bank and branch labels.
    pub bank: String,
    pub branch: String,
    pub counterparty_name: String,
    pub counterparty_account: Option<String>,
    pub amount: Decimal,
    pub fee: Option<Decimal>,
    /// Total actually debited or credited, overriding `amount` and `fee`.
    pub pay: Option<Decimal>,
    pub date: NaiveDate,
    pub time: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Airtime sold out of an operator float.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recharge {
    pub id: TransactionId,
    pub operator: OperatorNumber,
    pub sender_number: String,
    pub receiver_number: String,
    pub amount: Decimal,
    /// Operator balance right after this recharge was (re)applied.
    pub balance_after: Decimal,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Manual injection (positive) or withdrawal (negative) of operator float.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadRecord {
    pub id: TransactionId,
    pub operator: OperatorNumber,
    pub amount: Decimal,
    pub new_balance: Decimal,
    pub ledger_entry: Option<LedgerEntryId>,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DailyKind {
    CashIn,
    CashOut,
    SendMoney,
    ReceiveMoney,
    /// Over-the-counter cash sale such as a utility bill payment.
    Bill,
}

impl DailyKind {
    pub fn is_outgoing(self) -> bool {
        matches!(self, Self::CashOut | Self::SendMoney)
    }

    pub fn is_incoming(self) -> bool {
        matches!(self, Self::CashIn | Self::ReceiveMoney)
    }
}

impl FromStr for DailyKind {
    type Err = UnknownKind;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized: String = value
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "cashin" => Ok(Self::CashIn),
            "cashout" => Ok(Self::CashOut),
            "sendmoney" => Ok(Self::SendMoney),
            "receivemoney" => Ok(Self::ReceiveMoney),
            "cash" | "bill" => Ok(Self::Bill),
            _ => Err(UnknownKind::new(EntityKind::DailyTransaction, value)),
        }
    }
}

impl fmt::Display for DailyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::CashIn => "Cash In",
            Self::CashOut => "Cash Out",
            Self::SendMoney => "Send Money",
            Self::ReceiveMoney => "Receive Money",
            Self::Bill => "Bill",
        };
        f.write_str(label)
    }
}

/// One counter transaction of the day, optionally moving a wallet balance
/// and optionally booking a credit sale against a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyTransaction {
    pub id: TransactionId,
    pub date: NaiveDate,
    pub channel: String,
    pub wallet: Option<WalletId>,
    pub client: Option<ClientId>,
    pub client_name: Option<String>,
    pub number: Option<String>,
    pub kind: DailyKind,
    pub amount: Decimal,
    pub fee: Decimal,
    pub cost: Decimal,
    pub total: Option<Decimal>,
    pub profit: Decimal,
    pub refund: Decimal,
    pub due: Decimal,
    pub note: Option<String>,
    pub bill_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl DailyTransaction {
    /// What the customer was charged; falls back to the face amount.
    pub fn charged_total(&self) -> Decimal {
        self.total
            .filter(|total| !total.is_zero())
            .unwrap_or(self.amount)
    }
}
