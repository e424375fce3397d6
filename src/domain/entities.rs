//! Balance-bearing entities and the per-day opening cash record.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{AccountNumber, ClientId, EntityKind, OperatorNumber, WalletId};

/// Anything with a running balance the engine shifts on behalf of transactions.
pub trait BalanceHolder {
    fn balance(&self) -> Decimal;
    fn set_balance(&mut self, balance: Decimal);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankAccount {
    pub account_number: AccountNumber,
    pub bank: String,
    pub branch: String,
    pub routing_no: Option<String>,
    pub account_name: String,
    pub balance: Decimal,
}

impl BalanceHolder for BankAccount {
    fn balance(&self) -> Decimal {
        self.balance
    }
    fn set_balance(&mut self, balance: Decimal) {
        self.balance = balance;
    }
}

/// Whether a wallet is an agent till or a personal account. Agent wallets
/// report raw amounts, personal wallets report the charged total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalletKind {
    Agent,
    Personal,
}

impl std::str::FromStr for WalletKind {
    type Err = crate::domain::UnknownKind;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "agent" => Ok(Self::Agent),
            "personal" => Ok(Self::Personal),
            _ => Err(crate::domain::UnknownKind::new(EntityKind::Wallet, value)),
        }
    }
}

/// A mobile-wallet number (bKash, Nagad, ...) held by the shop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletNumber {
    pub id: WalletId,
    pub label: String,
    pub number: String,
    pub channel: String,
    pub kind: WalletKind,
    pub balance: Decimal,
}

impl BalanceHolder for WalletNumber {
    fn balance(&self) -> Decimal {
        self.balance
    }
    fn set_balance(&mut self, balance: Decimal) {
        self.balance = balance;
    }
}

/// Mobile-operator recharge float.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operator {
    pub number: OperatorNumber,
    pub name: String,
    pub balance: Decimal,
}

impl BalanceHolder for Operator {
    fn balance(&self) -> Decimal {
        self.balance
    }
    fn set_balance(&mut self, balance: Decimal) {
        self.balance = balance;
    }
}

/// A customer buying on credit. Invariant: `due == total_sale - paid`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub name: String,
    pub phone: String,
    pub total_sale: Decimal,
    pub paid: Decimal,
    pub due: Decimal,
}

impl Client {
    /// Books a credit sale of `total` of which `due` is left unpaid.
    pub fn record_sale(&mut self, total: Decimal, due: Decimal) {
        self.total_sale += total;
        self.paid += total - due;
        self.due += due;
    }

    pub fn reverse_sale(&mut self, total: Decimal, due: Decimal) {
        self.total_sale -= total;
        self.paid -= total - due;
        self.due -= due;
    }

    /// Settles part of the outstanding due. Once nothing is left owing the
    /// sale record is cleared entirely rather than kept as a paid-off pair.
    pub fn apply_payment(&mut self, amount: Decimal) {
        self.paid += amount;
        let due = self.total_sale - self.paid;
        if due <= Decimal::ZERO {
            self.total_sale = Decimal::ZERO;
            self.paid = Decimal::ZERO;
            self.due = Decimal::ZERO;
        } else {
            self.due = due;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Denomination {
    pub value: Decimal,
    pub count: u32,
    pub enabled: bool,
    pub custom: bool,
}

/// Cash in the drawer at the start of a business day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningCash {
    pub date: NaiveDate,
    pub amount: Decimal,
    pub denominations: Vec<Denomination>,
}

impl OpeningCash {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            amount: Decimal::ZERO,
            denominations: Vec::new(),
        }
    }
}
