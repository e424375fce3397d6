//! Mobile recharges sold out of an operator's float.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::info;

use crate::{
    domain::{
        BalanceEffects, EntryKind, LedgerEntry, Operator, OperatorNumber, Recharge, TransactionId,
    },
    engine::{LedgerEngine, Reversal, adjust, errors::EngineError, mirror, notes, positive, required},
    store::AtomicGroup,
};

const SOURCE: &str = "recharge";

#[derive(Debug, Clone, PartialEq)]
pub struct RechargeRequest {
    pub operator: OperatorNumber,
    pub receiver_number: String,
    pub amount: Decimal,
    pub date: Option<NaiveDate>,
}

impl RechargeRequest {
    pub fn new(
        operator: impl Into<OperatorNumber>,
        receiver_number: impl Into<String>,
        amount: Decimal,
    ) -> Self {
        Self {
            operator: operator.into(),
            receiver_number: receiver_number.into(),
            amount,
            date: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RechargePatch {
    pub operator: Option<OperatorNumber>,
    pub receiver_number: Option<String>,
    pub amount: Option<Decimal>,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RechargeOutcome {
    pub recharge: Recharge,
    pub operator: Operator,
    pub entry: LedgerEntry,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RechargeEdit {
    pub recharge: Recharge,
    pub operator: Operator,
    pub previous_operator: Option<Operator>,
    pub entry: LedgerEntry,
}

impl LedgerEngine {
    pub fn create_recharge(&self, request: RechargeRequest) -> Result<RechargeOutcome, EngineError> {
        let mut group = self.begin();
        let outcome = self.create_recharge_in(&mut group, request)?;
        group.commit()?;
        info!(
            txn = %outcome.recharge.id,
            operator = %outcome.operator.number,
            receiver = %outcome.recharge.receiver_number,
            amount = %outcome.recharge.amount,
            balance = %outcome.operator.balance,
            "Recharge recorded"
        );
        Ok(outcome)
    }

    pub fn create_recharge_in(
        &self,
        group: &mut AtomicGroup<'_>,
        request: RechargeRequest,
    ) -> Result<RechargeOutcome, EngineError> {
        let amount = positive("amount", request.amount)?;
        let receiver_number = required("receiver number", &request.receiver_number)?;

        let mut recharge = Recharge {
            id: TransactionId::generate(),
            sender_number: request.operator.to_string(),
            operator: request.operator,
            receiver_number,
            amount,
            balance_after: Decimal::ZERO,
            date: request.date.unwrap_or_else(|| self.today()),
            created_at: self.now(),
        };

        adjust::apply(group, &recharge.effects())?;
        let operator = group.fetch::<Operator>(&recharge.operator)?;
        recharge.balance_after = operator.balance;

        let entry = mirror::upsert(group, recharge.id, self.recharge_entry(&recharge));
        group.put(recharge.clone());

        Ok(RechargeOutcome {
            recharge,
            operator,
            entry,
        })
    }

    pub fn edit_recharge(
        &self,
        id: TransactionId,
        patch: RechargePatch,
    ) -> Result<RechargeEdit, EngineError> {
        let mut group = self.begin();
        let edit = self.edit_recharge_in(&mut group, id, patch)?;
        group.commit()?;
        info!(
            txn = %id,
            operator = %edit.operator.number,
            moved = edit.previous_operator.is_some(),
            balance = %edit.operator.balance,
            "Recharge edited"
        );
        Ok(edit)
    }

    pub fn edit_recharge_in(
        &self,
        group: &mut AtomicGroup<'_>,
        id: TransactionId,
        patch: RechargePatch,
    ) -> Result<RechargeEdit, EngineError> {
        let original = group.fetch::<Recharge>(&id)?;
        let operator = patch.operator.unwrap_or_else(|| original.operator.clone());
        let mut updated = Recharge {
            sender_number: operator.to_string(),
            operator,
            receiver_number: match patch.receiver_number {
                Some(number) => required("receiver number", &number)?,
                None => original.receiver_number.clone(),
            },
            amount: positive("amount", patch.amount.unwrap_or(original.amount))?,
            date: patch.date.unwrap_or(original.date),
            ..original.clone()
        };

        adjust::reverse(group, &original.effects())?;
        adjust::apply(group, &updated.effects())?;
        let operator = group.fetch::<Operator>(&updated.operator)?;
        updated.balance_after = operator.balance;

        let entry = mirror::upsert(group, id, self.recharge_entry(&updated));
        group.put(updated.clone());
        let previous_operator = if original.operator == updated.operator {
            None
        } else {
            Some(group.fetch::<Operator>(&original.operator)?)
        };

        Ok(RechargeEdit {
            recharge: updated,
            operator,
            previous_operator,
            entry,
        })
    }

    pub fn delete_recharge(&self, id: TransactionId) -> Result<Reversal<Operator>, EngineError> {
        let mut group = self.begin();
        let reversal = self.delete_recharge_in(&mut group, id)?;
        group.commit()?;
        info!(
            txn = %id,
            operator = %reversal.entity.number,
            reversed = %reversal.reversed,
            balance = %reversal.entity.balance,
            "Recharge deleted"
        );
        Ok(reversal)
    }

    pub fn delete_recharge_in(
        &self,
        group: &mut AtomicGroup<'_>,
        id: TransactionId,
    ) -> Result<Reversal<Operator>, EngineError> {
        let recharge = group.fetch::<Recharge>(&id)?;
        let effects = recharge.effects();
        adjust::reverse(group, &effects)?;
        mirror::remove(group, id);
        group.remove::<Recharge>(&id);
        Ok(Reversal {
            entity: group.fetch::<Operator>(&recharge.operator)?,
            reversed: adjust::reversed_amount(&effects),
        })
    }

    fn recharge_entry(&self, recharge: &Recharge) -> LedgerEntry {
        let mut entry = LedgerEntry::mirror(
            EntryKind::Recharge,
            recharge.id,
            SOURCE,
            recharge.amount,
            notes::recharge(&self.config.currency, recharge),
            recharge.date,
            self.now(),
        );
        entry
            .meta
            .insert("receiver".to_owned(), recharge.receiver_number.clone());
        entry
    }
}
