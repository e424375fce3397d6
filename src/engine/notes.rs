//! Note text for ledger entries and SMS messages.

use rust_decimal::Decimal;

use crate::domain::{BankTransfer, Client, DailyKind, DailyTransaction, Operator, Recharge, TransferKind};

pub(crate) fn transfer(currency: &str, transfer: &BankTransfer) -> String {
    let amount = transfer.amount.normalize();
    let counterparty = match &transfer.counterparty_account {
        Some(account) => format!("{} ({account})", transfer.counterparty_name),
        None => transfer.counterparty_name.clone(),
    };
    match transfer.kind {
        TransferKind::Send => format!("{amount} {currency} sent to {counterparty}"),
        TransferKind::Receive => format!("{amount} {currency} received from {counterparty}"),
    }
}

pub(crate) fn recharge(currency: &str, recharge: &Recharge) -> String {
    format!(
        "{} {currency} recharged to {}",
        recharge.amount.normalize(),
        recharge.receiver_number
    )
}

pub(crate) fn load(currency: &str, operator: &Operator, amount: Decimal) -> String {
    if amount.is_sign_negative() {
        format!(
            "{} {currency} withdrawn from {} ({})",
            amount.abs().normalize(),
            operator.name,
            operator.number
        )
    } else {
        format!(
            "{} {currency} loaded to {} ({})",
            amount.normalize(),
            operator.name,
            operator.number
        )
    }
}

pub(crate) fn daily(
    currency: &str,
    txn: &DailyTransaction,
    wallet_number: Option<&str>,
    client_phone: Option<&str>,
) -> String {
    if let Some(note) = txn.note.as_deref().filter(|note| !note.trim().is_empty()) {
        return note.to_owned();
    }
    let total = txn.charged_total().normalize();
    if let Some(bill_type) = txn.bill_type.as_deref().filter(|bill| !bill.trim().is_empty()) {
        return format!("{total} {currency} {bill_type} paid");
    }
    match (txn.kind, wallet_number, client_phone) {
        (DailyKind::CashOut, Some(wallet), _) => {
            format!("{} {currency} Cash Out to number {wallet}", txn.amount.normalize())
        }
        (DailyKind::CashOut, None, _) => {
            format!("{} {currency} Cash Out", txn.amount.normalize())
        }
        (kind, _, Some(phone)) => format!("{total} {currency} {kind} to number {phone}"),
        (kind, _, None) => format!("{total} {currency} {kind}"),
    }
}

pub(crate) fn payment(currency: &str, client: &Client, amount: Decimal) -> String {
    format!("{} {currency} due paid by {}", amount.normalize(), client.name)
}
