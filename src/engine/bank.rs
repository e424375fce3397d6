//! Bank transfers: money sent from or received into one of the shop's accounts.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::info;

use crate::{
    domain::{
        AccountNumber, BalanceEffects, BankAccount, BankTransfer, LedgerEntry, META_ACCOUNT,
        TransactionId, TransferKind,
    },
    engine::{
        LedgerEngine, Reversal, adjust, errors::EngineError, mirror, non_negative, notes,
        positive, required,
    },
    store::AtomicGroup,
};

const SOURCE: &str = "bank_transfer";

#[derive(Debug, Clone, PartialEq)]
pub struct TransferRequest {
    pub account: AccountNumber,
    pub kind: TransferKind,
    pub counterparty_name: String,
    pub counterparty_account: Option<String>,
    pub amount: Decimal,
    pub fee: Option<Decimal>,
    pub pay: Option<Decimal>,
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
}

impl TransferRequest {
    pub fn new(
        account: impl Into<AccountNumber>,
        kind: TransferKind,
        counterparty_name: impl Into<String>,
        amount: Decimal,
    ) -> Self {
        Self {
            account: account.into(),
            kind,
            counterparty_name: counterparty_name.into(),
            counterparty_account: None,
            amount,
            fee: None,
            pay: None,
            date: None,
            time: None,
        }
    }

    pub fn with_fee(mut self, fee: Decimal) -> Self {
        self.fee = Some(fee);
        self
    }

    pub fn with_pay(mut self, pay: Decimal) -> Self {
        self.pay = Some(pay);
        self
    }

    pub fn with_counterparty_account(mut self, account: impl Into<String>) -> Self {
        self.counterparty_account = Some(account.into());
        self
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }
}

/// Fields to change on an existing transfer. `account` moves it to another
/// bank account.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransferPatch {
    pub account: Option<AccountNumber>,
    pub kind: Option<TransferKind>,
    pub counterparty_name: Option<String>,
    pub counterparty_account: Option<String>,
    pub amount: Option<Decimal>,
    pub fee: Option<Decimal>,
    pub pay: Option<Decimal>,
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransferOutcome {
    pub transfer: BankTransfer,
    pub account: BankAccount,
    pub entry: LedgerEntry,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransferEdit {
    pub transfer: BankTransfer,
    pub account: BankAccount,
    /// The account the transfer was moved away from, if it moved.
    pub previous_account: Option<BankAccount>,
    pub entry: LedgerEntry,
}

/// Without a `pay` override a receive is credited `amount - fee`, which must
/// stay positive.
fn check_receive_fee(transfer: &BankTransfer) -> Result<(), EngineError> {
    let overridden = transfer.pay.is_some_and(|pay| !pay.is_zero());
    if transfer.kind == TransferKind::Receive
        && !overridden
        && let Some(fee) = transfer.fee
        && fee >= transfer.amount
    {
        return Err(EngineError::validation(
            "fee",
            format!("{fee} leaves nothing of the received {}", transfer.amount),
        ));
    }
    Ok(())
}

impl LedgerEngine {
    pub fn create_transfer(&self, request: TransferRequest) -> Result<TransferOutcome, EngineError> {
        let mut group = self.begin();
        let outcome = self.create_transfer_in(&mut group, request)?;
        group.commit()?;
        info!(
            txn = %outcome.transfer.id,
            account = %outcome.account.account_number,
            kind = %outcome.transfer.kind,
            amount = %outcome.transfer.amount,
            balance = %outcome.account.balance,
            "Bank transfer recorded"
        );
        Ok(outcome)
    }

    pub fn create_transfer_in(
        &self,
        group: &mut AtomicGroup<'_>,
        request: TransferRequest,
    ) -> Result<TransferOutcome, EngineError> {
        let amount = positive("amount", request.amount)?;
        let fee = non_negative("fee", request.fee)?;
        let pay = non_negative("pay", request.pay)?;
        let counterparty_name = required("counterparty name", &request.counterparty_name)?;

        let owner = group.fetch::<BankAccount>(&request.account)?;
        let transfer = BankTransfer {
            id: TransactionId::generate(),
            account: request.account,
            kind: request.kind,
            bank: owner.bank,
            branch: owner.branch,
            counterparty_name,
            counterparty_account: request.counterparty_account,
            amount,
            fee,
            pay,
            date: request.date.unwrap_or_else(|| self.today()),
            time: request.time,
            created_at: self.now(),
        };
        check_receive_fee(&transfer)?;

        adjust::apply(group, &transfer.effects())?;
        let entry = mirror::upsert(group, transfer.id, self.transfer_entry(&transfer));
        group.put(transfer.clone());
        let account = group.fetch::<BankAccount>(&transfer.account)?;

        Ok(TransferOutcome {
            transfer,
            account,
            entry,
        })
    }

    pub fn edit_transfer(
        &self,
        id: TransactionId,
        patch: TransferPatch,
    ) -> Result<TransferEdit, EngineError> {
        let mut group = self.begin();
        let edit = self.edit_transfer_in(&mut group, id, patch)?;
        group.commit()?;
        info!(
            txn = %id,
            account = %edit.account.account_number,
            moved = edit.previous_account.is_some(),
            balance = %edit.account.balance,
            "Bank transfer edited"
        );
        Ok(edit)
    }

    pub fn edit_transfer_in(
        &self,
        group: &mut AtomicGroup<'_>,
        id: TransactionId,
        patch: TransferPatch,
    ) -> Result<TransferEdit, EngineError> {
        let original = group.fetch::<BankTransfer>(&id)?;
        let mut updated = BankTransfer {
            account: patch.account.unwrap_or_else(|| original.account.clone()),
            kind: patch.kind.unwrap_or(original.kind),
            counterparty_name: match patch.counterparty_name {
                Some(name) => required("counterparty name", &name)?,
                None => original.counterparty_name.clone(),
            },
            counterparty_account: patch
                .counterparty_account
                .or_else(|| original.counterparty_account.clone()),
            amount: positive("amount", patch.amount.unwrap_or(original.amount))?,
            fee: non_negative("fee", patch.fee.or(original.fee))?,
            pay: non_negative("pay", patch.pay.or(original.pay))?,
            date: patch.date.unwrap_or(original.date),
            time: patch.time.or_else(|| original.time.clone()),
            ..original.clone()
        };
        check_receive_fee(&updated)?;

        adjust::reverse(group, &original.effects())?;
        let owner = group.fetch::<BankAccount>(&updated.account)?;
        updated.bank = owner.bank;
        updated.branch = owner.branch;
        adjust::apply(group, &updated.effects())?;

        let entry = mirror::upsert(group, id, self.transfer_entry(&updated));
        group.put(updated.clone());
        let account = group.fetch::<BankAccount>(&updated.account)?;
        let previous_account = if original.account == updated.account {
            None
        } else {
            Some(group.fetch::<BankAccount>(&original.account)?)
        };

        Ok(TransferEdit {
            transfer: updated,
            account,
            previous_account,
            entry,
        })
    }

    pub fn delete_transfer(&self, id: TransactionId) -> Result<Reversal<BankAccount>, EngineError> {
        let mut group = self.begin();
        let reversal = self.delete_transfer_in(&mut group, id)?;
        group.commit()?;
        info!(
            txn = %id,
            account = %reversal.entity.account_number,
            reversed = %reversal.reversed,
            balance = %reversal.entity.balance,
            "Bank transfer deleted"
        );
        Ok(reversal)
    }

    pub fn delete_transfer_in(
        &self,
        group: &mut AtomicGroup<'_>,
        id: TransactionId,
    ) -> Result<Reversal<BankAccount>, EngineError> {
        let transfer = group.fetch::<BankTransfer>(&id)?;
        let effects = transfer.effects();
        adjust::reverse(group, &effects)?;
        mirror::remove(group, id);
        group.remove::<BankTransfer>(&id);
        Ok(Reversal {
            entity: group.fetch::<BankAccount>(&transfer.account)?,
            reversed: adjust::reversed_amount(&effects),
        })
    }

    fn transfer_entry(&self, transfer: &BankTransfer) -> LedgerEntry {
        let mut entry = LedgerEntry::mirror(
            transfer.kind.into(),
            transfer.id,
            SOURCE,
            transfer.amount,
            notes::transfer(&self.config.currency, transfer),
            transfer.date,
            self.now(),
        );
        entry
            .meta
            .insert(META_ACCOUNT.to_owned(), transfer.account.to_string());
        entry
    }
}
