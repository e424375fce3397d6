//! Applying and reversing balance effects inside an atomic group.
//!
//! Edits are a reversal of the stored effects followed by an application of the
//! new ones in the same group. Because the group reads its own staged writes,
//! an edit on the same entity sees the reversed balance before re-deducting,
//! and an edit that moves a transaction touches each entity once.

use rust_decimal::Decimal;
use tracing::debug;

use crate::{
    domain::{BalanceHolder, BankAccount, Client, Effect, Operator, Target, WalletNumber},
    engine::errors::EngineError,
    store::{AtomicGroup, Record},
};

pub fn apply(group: &mut AtomicGroup<'_>, effects: &[Effect]) -> Result<(), EngineError> {
    for effect in effects {
        match effect {
            Effect::Balance {
                target,
                delta,
                required,
            } => shift_target(group, target, *delta, *required)?,
            Effect::Sale { client, total, due } => {
                let mut client = group.fetch::<Client>(client)?;
                client.record_sale(*total, *due);
                group.put(client);
            }
        }
    }
    Ok(())
}

/// Applies the exact inverse of `effects`. Never subject to the overdraft check,
/// but a credit sale can only be taken back while its due is still owed.
pub fn reverse(group: &mut AtomicGroup<'_>, effects: &[Effect]) -> Result<(), EngineError> {
    for effect in effects {
        match effect {
            Effect::Balance { target, delta, .. } => {
                shift_target(group, target, -*delta, Decimal::ZERO)?
            }
            Effect::Sale { client, total, due } => {
                let mut client = group.fetch::<Client>(client)?;
                // A payment may have cleared the sale; never drive the record negative.
                if client.due < *due
                    || client.total_sale < *total
                    || client.paid < *total - *due
                {
                    return Err(EngineError::validation(
                        "due",
                        format!(
                            "client `{}` owes {}, less than the {} this sale booked",
                            client.id, client.due, due
                        ),
                    ));
                }
                client.reverse_sale(*total, *due);
                group.put(client);
            }
        }
    }
    Ok(())
}

/// Net amount a reversal of `effects` moves balances by.
pub fn reversed_amount(effects: &[Effect]) -> Decimal {
    effects
        .iter()
        .map(|effect| match effect {
            Effect::Balance { delta, .. } => -*delta,
            Effect::Sale { .. } => Decimal::ZERO,
        })
        .sum()
}

fn shift_target(
    group: &mut AtomicGroup<'_>,
    target: &Target,
    delta: Decimal,
    required: Decimal,
) -> Result<(), EngineError> {
    match target {
        Target::Bank(number) => shift::<BankAccount>(group, number, delta, required).map(drop),
        Target::Wallet(id) => shift::<WalletNumber>(group, id, delta, required).map(drop),
        Target::Operator(number) => shift::<Operator>(group, number, delta, required).map(drop),
    }
}

/// Moves the balance of one entity by `delta` after checking that it holds at
/// least `required`.
pub fn shift<T: Record + BalanceHolder>(
    group: &mut AtomicGroup<'_>,
    key: &T::Key,
    delta: Decimal,
    required: Decimal,
) -> Result<T, EngineError> {
    let mut entity = group.fetch::<T>(key)?;
    let available = entity.balance();
    if required > Decimal::ZERO && available < required {
        return Err(EngineError::InsufficientBalance {
            kind: T::KIND,
            key: key.to_string(),
            available,
            required,
        });
    }
    entity.set_balance(available + delta);
    debug!(kind = %T::KIND, %key, %available, %delta, "Shifted balance");
    group.put(entity.clone());
    Ok(entity)
}
