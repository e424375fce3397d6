//! Serializes final ledger state to CSV.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::{engine::LedgerEngine, reporting::Report};

/// One balance-bearing entity per row. Sale columns are only filled for
/// clients, whose `balance` is their outstanding due.
#[derive(Debug, Serialize)]
struct BalanceCsv<'a> {
    entity: &'static str,
    key: &'a str,
    name: &'a str,
    balance: Decimal,
    total_sale: Option<Decimal>,
    paid: Option<Decimal>,
    due: Option<Decimal>,
}

#[derive(Debug, Serialize)]
struct ReportCsv {
    date: String,
    amount: Decimal,
    profit: Decimal,
    due: Decimal,
    count: usize,
}

/// Prints bank accounts, wallets (keyed by number), operators and clients
/// (keyed by phone), each group in a stable order.
pub fn print_balances(engine: &LedgerEngine, writer: impl std::io::Write) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for account in engine.bank_accounts() {
        wtr.serialize(BalanceCsv {
            entity: "bank",
            key: account.account_number.as_str(),
            name: &account.account_name,
            balance: account.balance,
            total_sale: None,
            paid: None,
            due: None,
        })?;
    }
    for wallet in engine.wallets() {
        wtr.serialize(BalanceCsv {
            entity: "wallet",
            key: &wallet.number,
            name: &wallet.label,
            balance: wallet.balance,
            total_sale: None,
            paid: None,
            due: None,
        })?;
    }
    for operator in engine.operators() {
        wtr.serialize(BalanceCsv {
            entity: "operator",
            key: operator.number.as_str(),
            name: &operator.name,
            balance: operator.balance,
            total_sale: None,
            paid: None,
            due: None,
        })?;
    }
    for client in engine.clients() {
        wtr.serialize(BalanceCsv {
            entity: "client",
            key: &client.phone,
            name: &client.name,
            balance: client.due,
            total_sale: Some(client.total_sale),
            paid: Some(client.paid),
            due: Some(client.due),
        })?;
    }
    wtr.flush()?;
    Ok(())
}

/// Prints one row per reported day followed by a `total` row.
pub fn print_report(report: &Report, writer: impl std::io::Write) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for day in &report.days {
        wtr.serialize(ReportCsv {
            date: day.date.to_string(),
            amount: day.totals.amount,
            profit: day.totals.profit,
            due: day.totals.due,
            count: day.totals.count,
        })?;
    }
    wtr.serialize(ReportCsv {
        date: "total".to_owned(),
        amount: report.totals.amount,
        profit: report.totals.profit,
        due: report.totals.due,
        count: report.totals.count,
    })?;
    wtr.flush()?;
    Ok(())
}
