//! Signed balance effects of domain transactions.
//!
//! Everything here is pure: a transaction is turned into a list of [`Effect`]s
//! which the engine applies to (or reverses on) the owning entities.

use rust_decimal::Decimal;

use crate::domain::{
    AccountNumber, BankTransfer, ClientId, DailyTransaction, LoadRecord, OperatorNumber, Recharge,
    TransferKind, WalletId,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Outgoing,
    Incoming,
}

impl From<TransferKind> for Flow {
    fn from(kind: TransferKind) -> Self {
        match kind {
            TransferKind::Send => Self::Outgoing,
            TransferKind::Receive => Self::Incoming,
        }
    }
}

/// Signed change for a movement of `amount` with an optional fee and an
/// optional `pay` override.
///
/// `pay` wins when set and non-zero. Otherwise a non-zero fee is added to an
/// outgoing amount (the sender bears it) and subtracted from an incoming one.
pub fn compute_delta(
    flow: Flow,
    amount: Decimal,
    fee: Option<Decimal>,
    pay: Option<Decimal>,
) -> Decimal {
    let pay = pay.filter(|pay| !pay.is_zero());
    let fee = fee.filter(|fee| !fee.is_zero());
    match flow {
        Flow::Outgoing => -pay.or(fee.map(|fee| amount + fee)).unwrap_or(amount),
        Flow::Incoming => pay.or(fee.map(|fee| amount - fee)).unwrap_or(amount),
    }
}

/// Which balance an effect lands on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Bank(AccountNumber),
    Wallet(WalletId),
    Operator(OperatorNumber),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Shift a running balance by `delta`. On apply the balance must hold at
    /// least `required` first; reversals skip that check.
    Balance {
        target: Target,
        delta: Decimal,
        required: Decimal,
    },
    /// Book a credit sale on a client.
    Sale {
        client: ClientId,
        total: Decimal,
        due: Decimal,
    },
}

impl Effect {
    fn balance(target: Target, delta: Decimal) -> Self {
        let required = if delta.is_sign_negative() {
            -delta
        } else {
            Decimal::ZERO
        };
        Self::Balance {
            target,
            delta,
            required,
        }
    }
}

/// Transactions that move entity balances.
pub trait BalanceEffects {
    fn effects(&self) -> Vec<Effect>;
}

impl BalanceEffects for BankTransfer {
    fn effects(&self) -> Vec<Effect> {
        let delta = compute_delta(self.kind.into(), self.amount, self.fee, self.pay);
        vec![Effect::balance(Target::Bank(self.account.clone()), delta)]
    }
}

impl BalanceEffects for Recharge {
    fn effects(&self) -> Vec<Effect> {
        let delta = compute_delta(Flow::Outgoing, self.amount, None, None);
        vec![Effect::balance(Target::Operator(self.operator.clone()), delta)]
    }
}

impl BalanceEffects for LoadRecord {
    fn effects(&self) -> Vec<Effect> {
        vec![Effect::balance(
            Target::Operator(self.operator.clone()),
            self.amount,
        )]
    }
}

impl BalanceEffects for DailyTransaction {
    fn effects(&self) -> Vec<Effect> {
        let mut effects = Vec::with_capacity(2);
        if let Some(wallet) = self.wallet {
            let target = Target::Wallet(wallet);
            if self.kind.is_outgoing() {
                // The wallet pays out the amount, then the commission lands back on it.
                effects.push(Effect::Balance {
                    target,
                    delta: -self.amount + self.profit,
                    required: self.amount,
                });
            } else if self.kind.is_incoming() {
                effects.push(Effect::balance(target, self.charged_total()));
            }
        }
        if let Some(client) = self.client
            && self.due > Decimal::ZERO
        {
            effects.push(Effect::Sale {
                client,
                total: self.charged_total(),
                due: self.due,
            });
        }
        effects
    }
}
