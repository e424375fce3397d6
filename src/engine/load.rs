//! Operator load history: manual injections and withdrawals of operator float.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::info;

use crate::{
    domain::{
        BalanceEffects, EntryKind, LedgerEntry, LoadRecord, Operator, OperatorNumber,
        TransactionId,
    },
    engine::{LedgerEngine, Reversal, adjust, errors::EngineError, mirror, notes},
    store::AtomicGroup,
};

const SOURCE: &str = "operator_load";

#[derive(Debug, Clone, PartialEq)]
pub struct LoadRequest {
    pub operator: OperatorNumber,
    /// Positive loads float onto the operator, negative takes it off.
    pub amount: Decimal,
    /// Also mirror the load into the ledger feed.
    pub record_in_ledger: bool,
    pub date: Option<NaiveDate>,
}

impl LoadRequest {
    pub fn new(operator: impl Into<OperatorNumber>, amount: Decimal) -> Self {
        Self {
            operator: operator.into(),
            amount,
            record_in_ledger: false,
            date: None,
        }
    }

    pub fn recorded(mut self) -> Self {
        self.record_in_ledger = true;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadPatch {
    pub operator: Option<OperatorNumber>,
    pub amount: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadOutcome {
    pub record: LoadRecord,
    pub operator: Operator,
    /// Operator the load was moved away from by an edit.
    pub previous_operator: Option<Operator>,
    pub entry: Option<LedgerEntry>,
}

fn nonzero(amount: Decimal) -> Result<Decimal, EngineError> {
    if amount.is_zero() {
        return Err(EngineError::validation("amount", "must not be zero"));
    }
    Ok(amount)
}

impl LedgerEngine {
    pub fn adjust_operator_load(&self, request: LoadRequest) -> Result<LoadOutcome, EngineError> {
        let mut group = self.begin();
        let outcome = self.adjust_operator_load_in(&mut group, request)?;
        group.commit()?;
        info!(
            txn = %outcome.record.id,
            operator = %outcome.operator.number,
            amount = %outcome.record.amount,
            balance = %outcome.operator.balance,
            "Operator load recorded"
        );
        Ok(outcome)
    }

    pub fn adjust_operator_load_in(
        &self,
        group: &mut AtomicGroup<'_>,
        request: LoadRequest,
    ) -> Result<LoadOutcome, EngineError> {
        let mut record = LoadRecord {
            id: TransactionId::generate(),
            operator: request.operator,
            amount: nonzero(request.amount)?,
            new_balance: Decimal::ZERO,
            ledger_entry: None,
            date: request.date.unwrap_or_else(|| self.today()),
            created_at: self.now(),
        };

        adjust::apply(group, &record.effects())?;
        let operator = group.fetch::<Operator>(&record.operator)?;
        record.new_balance = operator.balance;

        let entry = request.record_in_ledger.then(|| {
            mirror::upsert(group, record.id, self.load_entry(&record, &operator))
        });
        record.ledger_entry = entry.as_ref().map(|entry| entry.id);
        group.put(record.clone());

        Ok(LoadOutcome {
            record,
            operator,
            previous_operator: None,
            entry,
        })
    }

    pub fn edit_load(&self, id: TransactionId, patch: LoadPatch) -> Result<LoadOutcome, EngineError> {
        let mut group = self.begin();
        let outcome = self.edit_load_in(&mut group, id, patch)?;
        group.commit()?;
        info!(
            txn = %id,
            operator = %outcome.operator.number,
            moved = outcome.previous_operator.is_some(),
            balance = %outcome.operator.balance,
            "Operator load edited"
        );
        Ok(outcome)
    }

    pub fn edit_load_in(
        &self,
        group: &mut AtomicGroup<'_>,
        id: TransactionId,
        patch: LoadPatch,
    ) -> Result<LoadOutcome, EngineError> {
        let original = group.fetch::<LoadRecord>(&id)?;
        let mut updated = LoadRecord {
            operator: patch.operator.unwrap_or_else(|| original.operator.clone()),
            amount: nonzero(patch.amount.unwrap_or(original.amount))?,
            ..original.clone()
        };

        adjust::reverse(group, &original.effects())?;
        adjust::apply(group, &updated.effects())?;
        let operator = group.fetch::<Operator>(&updated.operator)?;
        updated.new_balance = operator.balance;

        let entry = match updated.ledger_entry {
            Some(_) => Some(mirror::upsert(
                group,
                id,
                self.load_entry(&updated, &operator),
            )),
            None => None,
        };
        updated.ledger_entry = entry.as_ref().map(|entry| entry.id);
        group.put(updated.clone());
        let previous_operator = if original.operator == updated.operator {
            None
        } else {
            Some(group.fetch::<Operator>(&original.operator)?)
        };

        Ok(LoadOutcome {
            record: updated,
            operator,
            previous_operator,
            entry,
        })
    }

    pub fn delete_load(&self, id: TransactionId) -> Result<Reversal<Operator>, EngineError> {
        let mut group = self.begin();
        let reversal = self.delete_load_in(&mut group, id)?;
        group.commit()?;
        info!(
            txn = %id,
            operator = %reversal.entity.number,
            reversed = %reversal.reversed,
            balance = %reversal.entity.balance,
            "Operator load deleted"
        );
        Ok(reversal)
    }

    pub fn delete_load_in(
        &self,
        group: &mut AtomicGroup<'_>,
        id: TransactionId,
    ) -> Result<Reversal<Operator>, EngineError> {
        let record = group.fetch::<LoadRecord>(&id)?;
        let effects = record.effects();
        adjust::reverse(group, &effects)?;
        if record.ledger_entry.is_some() {
            mirror::remove(group, id);
        }
        group.remove::<LoadRecord>(&id);
        Ok(Reversal {
            entity: group.fetch::<Operator>(&record.operator)?,
            reversed: adjust::reversed_amount(&effects),
        })
    }

    fn load_entry(&self, record: &LoadRecord, operator: &Operator) -> LedgerEntry {
        let mut entry = LedgerEntry::mirror(
            EntryKind::OperatorLoad,
            record.id,
            SOURCE,
            record.amount,
            notes::load(&self.config.currency, operator, record.amount),
            record.date,
            self.now(),
        );
        entry
            .meta
            .insert("operator".to_owned(), record.operator.to_string());
        entry
    }
}
