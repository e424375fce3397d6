//! Cash in the drawer at the start of each business day.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::{
    domain::{Denomination, OpeningCash},
    engine::{LedgerEngine, errors::EngineError, non_negative, positive, with_conflict_retry},
};

/// Drawer total counted from the enabled denominations.
pub fn counted_total(denominations: &[Denomination]) -> Decimal {
    denominations
        .iter()
        .filter(|denomination| denomination.enabled)
        .map(|denomination| denomination.value * Decimal::from(denomination.count))
        .sum()
}

impl LedgerEngine {
    /// Upserts the opening cash of `date` (today when unset). Without an
    /// explicit amount the enabled denominations are counted instead.
    pub fn set_opening_cash(
        &self,
        date: Option<NaiveDate>,
        amount: Option<Decimal>,
        denominations: Vec<Denomination>,
    ) -> Result<OpeningCash, EngineError> {
        for denomination in &denominations {
            positive("denomination", denomination.value)?;
        }
        let amount = match non_negative("amount", amount)? {
            Some(amount) => amount,
            None if !denominations.is_empty() => counted_total(&denominations),
            None => return Err(EngineError::validation("amount", "is required")),
        };
        let record = OpeningCash {
            date: date.unwrap_or_else(|| self.today()),
            amount,
            denominations,
        };

        let mut group = self.begin();
        // Joins the read set so a concurrent upsert of the same day conflicts.
        group.get::<OpeningCash>(&record.date);
        group.put(record.clone());
        group.commit()?;
        info!(date = %record.date, amount = %record.amount, "Opening cash set");
        Ok(record)
    }

    /// Opening cash of `date`. The first read of a day stores a zero record.
    pub fn opening_cash(&self, date: NaiveDate) -> Result<OpeningCash, EngineError> {
        if let Some(existing) = self
            .store
            .read(|tables| tables.get::<OpeningCash>(&date).cloned())
        {
            return Ok(existing);
        }
        with_conflict_retry(self.config.max_conflict_retries, || {
            let mut group = self.begin();
            if let Some(existing) = group.get::<OpeningCash>(&date) {
                return Ok(existing);
            }
            let record = OpeningCash::empty(date);
            group.put(record.clone());
            group.commit()?;
            debug!(%date, "Opening cash initialised to zero");
            Ok(record)
        })
    }

    pub fn today_opening_cash(&self) -> Result<OpeningCash, EngineError> {
        self.opening_cash(self.today())
    }
}
