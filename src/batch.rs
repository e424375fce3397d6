//! Replays a journal of [`Command`]s against a [`LedgerEngine`].
//!
//! Each command is one engine operation, retried on write conflicts up to the
//! configured limit. A failing command is logged and skipped; the journal
//! keeps going.

use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::{
    auth::{AccessError, AuthContext, require_admin},
    domain::{ClientId, TransactionId, WalletId},
    engine::{LedgerEngine, errors::EngineError, with_conflict_retry},
    parsing::Command,
};

#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("unknown {family} reference `{reference}`")]
    UnknownReference {
        family: &'static str,
        reference: String,
    },
}

/// What a journal run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub applied: usize,
    pub failed: usize,
    /// Earliest and latest business day touched by an applied command.
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

impl BatchSummary {
    fn record(&mut self, date: NaiveDate) {
        self.applied += 1;
        self.first_date = Some(self.first_date.map_or(date, |first| first.min(date)));
        self.last_date = Some(self.last_date.map_or(date, |last| last.max(date)));
    }
}

pub struct BatchRunner<'e> {
    engine: &'e LedgerEngine,
    wallets: HashMap<String, WalletId>,
    clients: HashMap<String, ClientId>,
    transactions: HashMap<String, TransactionId>,
}

fn lookup<T: Copy>(
    refs: &HashMap<String, T>,
    family: &'static str,
    reference: &str,
) -> Result<T, BatchError> {
    refs.get(reference)
        .copied()
        .ok_or_else(|| BatchError::UnknownReference {
            family,
            reference: reference.to_owned(),
        })
}

fn lookup_opt<T: Copy>(
    refs: &HashMap<String, T>,
    family: &'static str,
    reference: Option<&str>,
) -> Result<Option<T>, BatchError> {
    reference
        .map(|reference| lookup(refs, family, reference))
        .transpose()
}

impl<'e> BatchRunner<'e> {
    pub fn new(engine: &'e LedgerEngine) -> Self {
        Self {
            engine,
            wallets: HashMap::new(),
            clients: HashMap::new(),
            transactions: HashMap::new(),
        }
    }

    pub fn wallet(&self, reference: &str) -> Option<WalletId> {
        self.wallets.get(reference).copied()
    }

    pub fn client(&self, reference: &str) -> Option<ClientId> {
        self.clients.get(reference).copied()
    }

    pub fn transaction(&self, reference: &str) -> Option<TransactionId> {
        self.transactions.get(reference).copied()
    }

    /// Runs every command after checking that the caller may modify the ledger.
    pub fn run(
        &mut self,
        auth: &dyn AuthContext,
        commands: impl IntoIterator<Item = Command>,
    ) -> Result<BatchSummary, AccessError> {
        let user = require_admin(auth)?;
        info!(user = %user.id, "Running journal");

        let mut summary = BatchSummary::default();
        for (row, command) in commands.into_iter().enumerate() {
            let date = command.date().unwrap_or_else(|| self.engine.today());
            match self.execute(command) {
                Ok(()) => summary.record(date),
                Err(e) => {
                    warn!(row = row + 1, error = %e, "Journal command failed");
                    summary.failed += 1;
                }
            }
        }
        info!(
            applied = summary.applied,
            failed = summary.failed,
            "Journal finished"
        );
        Ok(summary)
    }

    fn execute(&mut self, command: Command) -> Result<(), BatchError> {
        let engine = self.engine;
        let attempts = engine.config().max_conflict_retries;

        match command {
            Command::OpenBank(account) => {
                with_conflict_retry(attempts, || engine.open_bank_account(account.clone()))?;
            }
            Command::OpenWallet { reference, wallet } => {
                let opened = with_conflict_retry(attempts, || engine.open_wallet(wallet.clone()))?;
                self.wallets.insert(reference, opened.id);
            }
            Command::OpenOperator(operator) => {
                with_conflict_retry(attempts, || engine.open_operator(operator.clone()))?;
            }
            Command::OpenClient { reference, client } => {
                let opened = with_conflict_retry(attempts, || engine.open_client(client.clone()))?;
                self.clients.insert(reference, opened.id);
            }
            Command::AdjustBank { account, amount } => {
                with_conflict_retry(attempts, || engine.adjust_bank_balance(&account, amount))?;
            }
            Command::AdjustWallet { wallet, amount } => {
                let wallet = lookup(&self.wallets, "wallet", &wallet)?;
                with_conflict_retry(attempts, || engine.adjust_wallet_balance(wallet, amount))?;
            }
            Command::Transfer { reference, request } => {
                let outcome =
                    with_conflict_retry(attempts, || engine.create_transfer(request.clone()))?;
                self.remember(reference, outcome.transfer.id);
            }
            Command::EditTransfer { reference, patch } => {
                let id = lookup(&self.transactions, "transaction", &reference)?;
                with_conflict_retry(attempts, || engine.edit_transfer(id, patch.clone()))?;
            }
            Command::DeleteTransfer { reference } => {
                let id = lookup(&self.transactions, "transaction", &reference)?;
                with_conflict_retry(attempts, || engine.delete_transfer(id))?;
            }
            Command::Recharge { reference, request } => {
                let outcome =
                    with_conflict_retry(attempts, || engine.create_recharge(request.clone()))?;
                self.remember(reference, outcome.recharge.id);
            }
            Command::EditRecharge { reference, patch } => {
                let id = lookup(&self.transactions, "transaction", &reference)?;
                with_conflict_retry(attempts, || engine.edit_recharge(id, patch.clone()))?;
            }
            Command::DeleteRecharge { reference } => {
                let id = lookup(&self.transactions, "transaction", &reference)?;
                with_conflict_retry(attempts, || engine.delete_recharge(id))?;
            }
            Command::Load { reference, request } => {
                let outcome =
                    with_conflict_retry(attempts, || engine.adjust_operator_load(request.clone()))?;
                self.remember(reference, outcome.record.id);
            }
            Command::EditLoad { reference, patch } => {
                let id = lookup(&self.transactions, "transaction", &reference)?;
                with_conflict_retry(attempts, || engine.edit_load(id, patch.clone()))?;
            }
            Command::DeleteLoad { reference } => {
                let id = lookup(&self.transactions, "transaction", &reference)?;
                with_conflict_retry(attempts, || engine.delete_load(id))?;
            }
            Command::Daily {
                reference,
                wallet,
                client,
                mut request,
            } => {
                request.wallet = lookup_opt(&self.wallets, "wallet", wallet.as_deref())?;
                request.client = lookup_opt(&self.clients, "client", client.as_deref())?;
                let outcome =
                    with_conflict_retry(attempts, || engine.create_daily_txn(request.clone()))?;
                self.remember(reference, outcome.txn.id);
            }
            Command::EditDaily {
                reference,
                wallet,
                client,
                mut patch,
            } => {
                let id = lookup(&self.transactions, "transaction", &reference)?;
                patch.wallet = lookup_opt(&self.wallets, "wallet", wallet.as_deref())?.map(Some);
                patch.client = lookup_opt(&self.clients, "client", client.as_deref())?.map(Some);
                with_conflict_retry(attempts, || engine.edit_daily_txn(id, patch.clone()))?;
            }
            Command::DeleteDaily { reference } => {
                let id = lookup(&self.transactions, "transaction", &reference)?;
                with_conflict_retry(attempts, || engine.delete_daily_txn(id))?;
            }
            Command::Payment { client, amount } => {
                let client = lookup(&self.clients, "client", &client)?;
                with_conflict_retry(attempts, || engine.adjust_client_payment(client, amount))?;
            }
            Command::OpeningCash { date, amount } => {
                with_conflict_retry(attempts, || {
                    engine.set_opening_cash(date, Some(amount), Vec::new())
                })?;
            }
        }
        Ok(())
    }

    fn remember(&mut self, reference: Option<String>, id: TransactionId) {
        if let Some(reference) = reference {
            self.transactions.insert(reference, id);
        }
    }
}
