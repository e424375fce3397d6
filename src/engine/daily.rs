//! Daily counter transactions: wallet cash-in/out, send/receive money, and
//! cash bills, optionally sold on credit to a client.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::info;

use crate::{
    domain::{
        BalanceEffects, Client, ClientId, DailyKind, DailyTransaction, LedgerEntry, TransactionId,
        WalletId, WalletNumber,
    },
    engine::{
        LedgerEngine, adjust, errors::EngineError, mirror, non_negative, notes, positive, required,
    },
    notify::Delivery,
    store::AtomicGroup,
};

const SOURCE: &str = "daily_transaction";

#[derive(Debug, Clone, PartialEq)]
pub struct DailyRequest {
    pub date: Option<NaiveDate>,
    pub channel: String,
    pub wallet: Option<WalletId>,
    pub client: Option<ClientId>,
    pub client_name: Option<String>,
    pub number: Option<String>,
    pub kind: DailyKind,
    pub amount: Decimal,
    pub fee: Option<Decimal>,
    pub cost: Option<Decimal>,
    pub total: Option<Decimal>,
    pub profit: Option<Decimal>,
    pub refund: Option<Decimal>,
    pub due: Option<Decimal>,
    pub note: Option<String>,
    pub bill_type: Option<String>,
    /// Text the client's phone with the custom `message` or the note.
    pub send_message: bool,
    pub message: Option<String>,
}

impl DailyRequest {
    pub fn new(kind: DailyKind, channel: impl Into<String>, amount: Decimal) -> Self {
        Self {
            date: None,
            channel: channel.into(),
            wallet: None,
            client: None,
            client_name: None,
            number: None,
            kind,
            amount,
            fee: None,
            cost: None,
            total: None,
            profit: None,
            refund: None,
            due: None,
            note: None,
            bill_type: None,
            send_message: false,
            message: None,
        }
    }

    pub fn with_wallet(mut self, wallet: WalletId) -> Self {
        self.wallet = Some(wallet);
        self
    }

    pub fn with_client(mut self, client: ClientId) -> Self {
        self.client = Some(client);
        self
    }

    pub fn with_total(mut self, total: Decimal) -> Self {
        self.total = Some(total);
        self
    }

    pub fn with_profit(mut self, profit: Decimal) -> Self {
        self.profit = Some(profit);
        self
    }

    pub fn with_due(mut self, due: Decimal) -> Self {
        self.due = Some(due);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn with_bill_type(mut self, bill_type: impl Into<String>) -> Self {
        self.bill_type = Some(bill_type.into());
        self
    }

    pub fn notify(mut self, message: Option<String>) -> Self {
        self.send_message = true;
        self.message = message;
        self
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }
}

/// Fields to change on a daily transaction. `wallet` and `client` are
/// `Some(None)` to detach, `Some(Some(id))` to move, `None` to keep.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailyPatch {
    pub date: Option<NaiveDate>,
    pub channel: Option<String>,
    pub wallet: Option<Option<WalletId>>,
    pub client: Option<Option<ClientId>>,
    pub client_name: Option<String>,
    pub number: Option<String>,
    pub kind: Option<DailyKind>,
    pub amount: Option<Decimal>,
    pub fee: Option<Decimal>,
    pub cost: Option<Decimal>,
    pub total: Option<Decimal>,
    pub profit: Option<Decimal>,
    pub refund: Option<Decimal>,
    pub due: Option<Decimal>,
    pub note: Option<String>,
    pub bill_type: Option<String>,
}

/// SMS queued for dispatch once the group commits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub phone: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyOutcome {
    pub txn: DailyTransaction,
    pub wallet: Option<WalletNumber>,
    pub client: Option<Client>,
    pub entry: LedgerEntry,
    pub notification: Option<Notification>,
    pub delivery: Delivery,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyEdit {
    pub txn: DailyTransaction,
    pub wallet: Option<WalletNumber>,
    pub client: Option<Client>,
    pub previous_wallet: Option<WalletNumber>,
    pub previous_client: Option<Client>,
    pub entry: LedgerEntry,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyReversal {
    pub wallet: Option<WalletNumber>,
    pub client: Option<Client>,
    /// Signed amount the reversal applied to the wallet balance.
    pub reversed: Decimal,
}

fn zero_if_unset(field: &'static str, amount: Option<Decimal>) -> Result<Decimal, EngineError> {
    Ok(non_negative(field, amount)?.unwrap_or(Decimal::ZERO))
}

fn check(txn: &DailyTransaction) -> Result<(), EngineError> {
    positive("amount", txn.amount)?;
    if txn.client.is_some() && txn.due > txn.charged_total() {
        return Err(EngineError::validation(
            "due",
            format!(
                "{} exceeds the charged total {}",
                txn.due,
                txn.charged_total()
            ),
        ));
    }
    Ok(())
}

impl LedgerEngine {
    pub fn create_daily_txn(&self, request: DailyRequest) -> Result<DailyOutcome, EngineError> {
        let mut group = self.begin();
        let mut outcome = self.create_daily_txn_in(&mut group, request)?;
        group.commit()?;
        info!(
            txn = %outcome.txn.id,
            kind = %outcome.txn.kind,
            channel = %outcome.txn.channel,
            amount = %outcome.txn.amount,
            "Daily transaction recorded"
        );
        if let Some(notification) = &outcome.notification {
            outcome.delivery = self.dispatch(&notification.phone, &notification.text);
        }
        Ok(outcome)
    }

    pub fn create_daily_txn_in(
        &self,
        group: &mut AtomicGroup<'_>,
        request: DailyRequest,
    ) -> Result<DailyOutcome, EngineError> {
        let txn = DailyTransaction {
            id: TransactionId::generate(),
            date: request.date.unwrap_or_else(|| self.today()),
            channel: required("channel", &request.channel)?,
            wallet: request.wallet,
            client: request.client,
            client_name: request.client_name,
            number: request.number,
            kind: request.kind,
            amount: request.amount,
            fee: zero_if_unset("fee", request.fee)?,
            cost: zero_if_unset("cost", request.cost)?,
            total: non_negative("total", request.total)?,
            profit: zero_if_unset("profit", request.profit)?,
            refund: zero_if_unset("refund", request.refund)?,
            due: zero_if_unset("due", request.due)?,
            note: request.note,
            bill_type: request.bill_type,
            created_at: self.now(),
        };
        check(&txn)?;

        let (txn, wallet, client, entry) = self.stage_daily(group, txn)?;

        let notification = match &client {
            Some(client) if request.send_message && self.config.notifications => {
                let text = request
                    .message
                    .filter(|message| !message.trim().is_empty())
                    .unwrap_or_else(|| entry.note.clone());
                Some(Notification {
                    phone: client.phone.clone(),
                    text,
                })
            }
            _ => None,
        };

        Ok(DailyOutcome {
            txn,
            wallet,
            client,
            entry,
            notification,
            delivery: Delivery::NotRequested,
        })
    }

    pub fn edit_daily_txn(
        &self,
        id: TransactionId,
        patch: DailyPatch,
    ) -> Result<DailyEdit, EngineError> {
        let mut group = self.begin();
        let edit = self.edit_daily_txn_in(&mut group, id, patch)?;
        group.commit()?;
        info!(
            txn = %id,
            kind = %edit.txn.kind,
            amount = %edit.txn.amount,
            moved_wallet = edit.previous_wallet.is_some(),
            moved_client = edit.previous_client.is_some(),
            "Daily transaction edited"
        );
        Ok(edit)
    }

    pub fn edit_daily_txn_in(
        &self,
        group: &mut AtomicGroup<'_>,
        id: TransactionId,
        patch: DailyPatch,
    ) -> Result<DailyEdit, EngineError> {
        let original = group.fetch::<DailyTransaction>(&id)?;
        let client = patch.client.unwrap_or(original.client);
        let client_name = match patch.client_name {
            Some(name) => Some(name),
            None if client == original.client => original.client_name.clone(),
            None => None,
        };
        let updated = DailyTransaction {
            date: patch.date.unwrap_or(original.date),
            channel: match patch.channel {
                Some(channel) => required("channel", &channel)?,
                None => original.channel.clone(),
            },
            wallet: patch.wallet.unwrap_or(original.wallet),
            client,
            client_name,
            number: patch.number.or_else(|| original.number.clone()),
            kind: patch.kind.unwrap_or(original.kind),
            amount: patch.amount.unwrap_or(original.amount),
            fee: zero_if_unset("fee", patch.fee.or(Some(original.fee)))?,
            cost: zero_if_unset("cost", patch.cost.or(Some(original.cost)))?,
            total: non_negative("total", patch.total.or(original.total))?,
            profit: zero_if_unset("profit", patch.profit.or(Some(original.profit)))?,
            refund: zero_if_unset("refund", patch.refund.or(Some(original.refund)))?,
            due: zero_if_unset("due", patch.due.or(Some(original.due)))?,
            note: patch.note.or_else(|| original.note.clone()),
            bill_type: patch.bill_type.or_else(|| original.bill_type.clone()),
            ..original.clone()
        };
        check(&updated)?;

        adjust::reverse(group, &original.effects())?;
        let (txn, wallet, client, entry) = self.stage_daily(group, updated)?;

        let previous_wallet = match original.wallet {
            Some(previous) if txn.wallet != Some(previous) => {
                Some(group.fetch::<WalletNumber>(&previous)?)
            }
            _ => None,
        };
        let previous_client = match original.client {
            Some(previous) if txn.client != Some(previous) => {
                Some(group.fetch::<Client>(&previous)?)
            }
            _ => None,
        };

        Ok(DailyEdit {
            txn,
            wallet,
            client,
            previous_wallet,
            previous_client,
            entry,
        })
    }

    pub fn delete_daily_txn(&self, id: TransactionId) -> Result<DailyReversal, EngineError> {
        let mut group = self.begin();
        let reversal = self.delete_daily_txn_in(&mut group, id)?;
        group.commit()?;
        info!(txn = %id, reversed = %reversal.reversed, "Daily transaction deleted");
        Ok(reversal)
    }

    pub fn delete_daily_txn_in(
        &self,
        group: &mut AtomicGroup<'_>,
        id: TransactionId,
    ) -> Result<DailyReversal, EngineError> {
        let txn = group.fetch::<DailyTransaction>(&id)?;
        let effects = txn.effects();
        adjust::reverse(group, &effects)?;
        mirror::remove(group, id);
        group.remove::<DailyTransaction>(&id);
        Ok(DailyReversal {
            wallet: txn
                .wallet
                .map(|wallet| group.fetch::<WalletNumber>(&wallet))
                .transpose()?,
            client: txn
                .client
                .map(|client| group.fetch::<Client>(&client))
                .transpose()?,
            reversed: adjust::reversed_amount(&effects),
        })
    }

    /// Applies `txn`'s effects, resolves its wallet and client, and stages the
    /// transaction with its ledger mirror.
    fn stage_daily(
        &self,
        group: &mut AtomicGroup<'_>,
        mut txn: DailyTransaction,
    ) -> Result<(DailyTransaction, Option<WalletNumber>, Option<Client>, LedgerEntry), EngineError>
    {
        adjust::apply(group, &txn.effects())?;
        let wallet = txn
            .wallet
            .map(|wallet| group.fetch::<WalletNumber>(&wallet))
            .transpose()?;
        let client = txn
            .client
            .map(|client| group.fetch::<Client>(&client))
            .transpose()?;
        if txn.client_name.is_none() {
            txn.client_name = client.as_ref().map(|client| client.name.clone());
        }

        let entry = mirror::upsert(
            group,
            txn.id,
            self.daily_entry(&txn, wallet.as_ref(), client.as_ref()),
        );
        group.put(txn.clone());
        Ok((txn, wallet, client, entry))
    }

    fn daily_entry(
        &self,
        txn: &DailyTransaction,
        wallet: Option<&WalletNumber>,
        client: Option<&Client>,
    ) -> LedgerEntry {
        let amount = match txn.kind {
            DailyKind::CashIn => txn.charged_total(),
            _ => txn.amount,
        };
        let note = notes::daily(
            &self.config.currency,
            txn,
            wallet.map(|wallet| wallet.number.as_str()),
            client.map(|client| client.phone.as_str()),
        );
        let mut entry = LedgerEntry::mirror(
            txn.kind.into(),
            txn.id,
            SOURCE,
            amount,
            note,
            txn.date,
            self.now(),
        );
        entry.client = txn.client;
        entry.client_phone = client.map(|client| client.phone.clone());
        entry.profit = txn.profit;
        entry.due = txn.due;
        entry.meta.insert("channel".to_owned(), txn.channel.clone());
        if let Some(wallet) = wallet {
            entry.meta.insert("wallet".to_owned(), wallet.number.clone());
        }
        entry
    }
}
