#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use rust_decimal::Decimal;

use cashbook::{
    clock::FixedClock,
    domain::{BankAccount, Client, Operator, WalletKind, WalletNumber},
    engine::{LedgerConfig, LedgerEngine, NewBankAccount, NewClient, NewOperator, NewWallet},
    notify::{Notifier, NotifyError},
};

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
}

pub fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
}

pub fn engine() -> LedgerEngine {
    LedgerEngine::new(LedgerConfig::default()).with_clock(Arc::new(FixedClock::new(today())))
}

pub fn bank(engine: &LedgerEngine, number: &str, balance: Decimal) -> BankAccount {
    engine
        .open_bank_account(NewBankAccount {
            account_number: number.into(),
            bank: "City Bank".to_owned(),
            branch: "Motijheel".to_owned(),
            routing_no: None,
            account_name: format!("Account {number}"),
            balance: Some(balance),
        })
        .unwrap()
}

pub fn wallet(engine: &LedgerEngine, number: &str, kind: WalletKind, balance: Decimal) -> WalletNumber {
    engine
        .open_wallet(NewWallet {
            label: format!("bKash {number}"),
            number: number.to_owned(),
            channel: "bKash".to_owned(),
            kind,
            balance: Some(balance),
        })
        .unwrap()
}

pub fn operator(engine: &LedgerEngine, number: &str, balance: Decimal) -> Operator {
    engine
        .open_operator(NewOperator {
            number: number.into(),
            name: "Grameenphone".to_owned(),
            balance: Some(balance),
        })
        .unwrap()
}

pub fn client(engine: &LedgerEngine, name: &str, phone: &str) -> Client {
    engine
        .open_client(NewClient {
            name: name.to_owned(),
            phone: phone.to_owned(),
            total_sale: None,
            paid: None,
        })
        .unwrap()
}

/// Keeps every message it was asked to send.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(String, String)>>,
}

impl Notifier for RecordingNotifier {
    fn send(&self, phone: &str, text: &str) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .unwrap()
            .push((phone.to_owned(), text.to_owned()));
        Ok(())
    }
}

/// An SMS gateway that is always down.
#[derive(Debug, Default)]
pub struct FailingNotifier;

impl Notifier for FailingNotifier {
    fn send(&self, phone: &str, _text: &str) -> Result<(), NotifyError> {
        Err(NotifyError::Failed {
            phone: phone.to_owned(),
            reason: "gateway unreachable".to_owned(),
        })
    }
}
