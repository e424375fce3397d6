//! Balance adjustment engine.
//!
//! The only code path that moves entity balances in response to domain
//! transactions and keeps their ledger entries in lockstep.
//!
//! Every mutating operation comes in two shapes. `*_in` stages the work on a
//! caller-supplied [`AtomicGroup`] and commits nothing. The plain method opens
//! a group, stages, commits, and only after a successful commit dispatches any
//! notification. Lookup misses, overdrafts and validation failures return
//! before commit, so a failed operation leaves no trace.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::warn;

use crate::{
    clock::{Clock, SystemClock},
    engine::errors::EngineError,
    notify::{Delivery, LogNotifier, Notifier},
    store::{AtomicGroup, Store},
};

pub mod adjust;
mod bank;
mod client;
mod daily;
pub mod errors;
mod load;
mod mirror;
mod notes;
mod opening_cash;
mod recharge;
mod registry;

pub use bank::{TransferEdit, TransferOutcome, TransferPatch, TransferRequest};
pub use client::PaymentOutcome;
pub use daily::{DailyEdit, DailyOutcome, DailyPatch, DailyRequest, DailyReversal, Notification};
pub use load::{LoadOutcome, LoadPatch, LoadRequest};
pub use opening_cash::counted_total;
pub use recharge::{RechargeEdit, RechargeOutcome, RechargePatch, RechargeRequest};
pub use registry::{BankAccountPatch, NewBankAccount, NewClient, NewOperator, NewWallet, WalletPatch};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Currency label used in generated note text.
    pub currency: String,
    /// Attempts [`with_conflict_retry`] callers should allow per operation.
    pub max_conflict_retries: usize,
    /// Master switch for SMS notifications on daily transactions.
    pub notifications: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            currency: "Tk".to_owned(),
            max_conflict_retries: 3,
            notifications: true,
        }
    }
}

/// Restored state of the owning entity after a transaction was deleted.
#[derive(Debug, Clone, PartialEq)]
pub struct Reversal<E> {
    pub entity: E,
    /// Signed amount the reversal applied to the entity's balance.
    pub reversed: Decimal,
}

pub struct LedgerEngine {
    store: Store,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn Notifier>,
    config: LedgerConfig,
}

impl Default for LedgerEngine {
    fn default() -> Self {
        Self::new(LedgerConfig::default())
    }
}

impl LedgerEngine {
    pub fn new(config: LedgerConfig) -> Self {
        Self {
            store: Store::new(),
            clock: Arc::new(SystemClock),
            notifier: Arc::new(LogNotifier),
            config,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Opens an atomic group for composing `*_in` operations.
    pub fn begin(&self) -> AtomicGroup<'_> {
        self.store.begin()
    }

    /// Best-effort send. Failures are logged and returned, never raised.
    fn dispatch(&self, phone: &str, text: &str) -> Delivery {
        match self.notifier.send(phone, text) {
            Ok(()) => Delivery::Sent,
            Err(e) => {
                warn!(phone, error = %e, "Notification failed; ledger change stays committed");
                Delivery::Failed(e)
            }
        }
    }
}

/// Runs `op` up to `attempts` times while it fails with a write conflict.
/// Any other error, and the last conflict, is returned unchanged.
pub fn with_conflict_retry<T>(
    attempts: usize,
    mut op: impl FnMut() -> Result<T, EngineError>,
) -> Result<T, EngineError> {
    let mut attempt = 1;
    loop {
        match op() {
            Err(e) if e.is_conflict() && attempt < attempts => {
                warn!(attempt, error = %e, "Retrying after write conflict");
                attempt += 1;
            }
            result => return result,
        }
    }
}

fn positive(field: &'static str, amount: Decimal) -> Result<Decimal, EngineError> {
    if amount <= Decimal::ZERO {
        return Err(EngineError::validation(field, "must be greater than zero"));
    }
    Ok(amount)
}

fn non_negative(
    field: &'static str,
    amount: Option<Decimal>,
) -> Result<Option<Decimal>, EngineError> {
    match amount {
        Some(amount) if amount.is_sign_negative() && !amount.is_zero() => {
            Err(EngineError::validation(field, "must not be negative"))
        }
        _ => Ok(amount),
    }
}

fn required(field: &'static str, value: &str) -> Result<String, EngineError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(EngineError::validation(field, "is required"));
    }
    Ok(value.to_owned())
}
