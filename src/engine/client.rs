//! Due collection from credit clients.

use rust_decimal::Decimal;
use tracing::info;

use crate::{
    domain::{Client, ClientId, EntryKind, LedgerEntry, LedgerEntryId},
    engine::{LedgerEngine, errors::EngineError, notes, positive},
    store::AtomicGroup,
};

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentOutcome {
    pub client: Client,
    pub entry: LedgerEntry,
}

impl LedgerEngine {
    /// Records `amount` paid towards the client's outstanding due.
    pub fn adjust_client_payment(
        &self,
        client: ClientId,
        amount: Decimal,
    ) -> Result<PaymentOutcome, EngineError> {
        let mut group = self.begin();
        let outcome = self.adjust_client_payment_in(&mut group, client, amount)?;
        group.commit()?;
        info!(
            client = %outcome.client.id,
            amount = %amount,
            due = %outcome.client.due,
            "Client payment recorded"
        );
        Ok(outcome)
    }

    pub fn adjust_client_payment_in(
        &self,
        group: &mut AtomicGroup<'_>,
        client: ClientId,
        amount: Decimal,
    ) -> Result<PaymentOutcome, EngineError> {
        let amount = positive("amount", amount)?;
        let mut client = group.fetch::<Client>(&client)?;
        client.apply_payment(amount);
        group.put(client.clone());

        let mut entry = LedgerEntry {
            id: LedgerEntryId::generate(),
            kind: EntryKind::DuePayment,
            client: Some(client.id),
            client_phone: Some(client.phone.clone()),
            amount,
            profit: Decimal::ZERO,
            due: client.due,
            note: notes::payment(&self.config.currency, &client, amount),
            meta: Default::default(),
            date: self.today(),
            created_at: self.now(),
        };
        entry
            .meta
            .insert("client_id".to_owned(), client.id.to_string());
        group.put(entry.clone());

        Ok(PaymentOutcome { client, entry })
    }
}
