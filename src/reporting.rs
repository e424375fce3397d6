//! Read-only rollups over committed state.
//!
//! Reports read one committed snapshot and never write, so they are safe to
//! run next to writers.

use std::collections::BTreeMap;

use chrono::{Datelike, Days, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::{
    domain::{
        BankAccount, BankTransfer, Client, ClientId, DailyTransaction, LedgerEntry, LoadRecord,
        Operator, Recharge, WalletKind, WalletNumber,
    },
    engine::{LedgerEngine, errors::EngineError},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub amount: Decimal,
    pub profit: Decimal,
    pub due: Decimal,
    pub count: usize,
}

impl Totals {
    fn add(&mut self, entry: &LedgerEntry) {
        self.amount += entry.amount;
        self.profit += entry.profit;
        self.due += entry.due;
        self.count += 1;
    }

    fn rounded(self) -> Self {
        Self {
            amount: self.amount.round_dp(2),
            profit: self.profit.round_dp(2),
            due: self.due.round_dp(2),
            count: self.count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayTotals {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub totals: Totals,
}

/// Sale totals for an inclusive date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub totals: Totals,
    /// Days with at least one counted entry, oldest first.
    pub days: Vec<DayTotals>,
}

/// Counter activity of one wallet on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WalletActivity {
    pub wallet: WalletNumber,
    pub txn_count: usize,
    pub total: Decimal,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BalanceTotals {
    pub bank: Decimal,
    pub wallet: Decimal,
    pub operator: Decimal,
    /// Outstanding client receivables.
    pub client_due: Decimal,
}

/// Aggregates `entries` dated within `from..=to`, skipping housekeeping kinds.
pub fn summarize<'a>(
    from: NaiveDate,
    to: NaiveDate,
    entries: impl IntoIterator<Item = &'a LedgerEntry>,
) -> Report {
    let mut days: BTreeMap<NaiveDate, Totals> = BTreeMap::new();
    let mut totals = Totals::default();
    for entry in entries {
        if entry.kind.is_housekeeping() || entry.date < from || entry.date > to {
            continue;
        }
        totals.add(entry);
        days.entry(entry.date).or_default().add(entry);
    }
    Report {
        from,
        to,
        totals: totals.rounded(),
        days: days
            .into_iter()
            .map(|(date, totals)| DayTotals {
                date,
                totals: totals.rounded(),
            })
            .collect(),
    }
}

/// Newest first; entries of one day ordered by creation time.
fn newest_first(entries: &mut [LedgerEntry]) {
    entries.sort_by(|a, b| (b.date, b.created_at).cmp(&(a.date, a.created_at)));
}

impl LedgerEngine {
    pub fn report(&self, from: NaiveDate, to: NaiveDate) -> Result<Report, EngineError> {
        if from > to {
            return Err(EngineError::validation(
                "from",
                format!("{from} is after {to}"),
            ));
        }
        Ok(self.store().read(|tables| summarize(from, to, tables.all::<LedgerEntry>())))
    }

    pub fn today_report(&self) -> Report {
        let today = self.today();
        self.store().read(|tables| summarize(today, today, tables.all::<LedgerEntry>()))
    }

    /// From the first of the current month through today.
    pub fn running_month_report(&self) -> Report {
        let today = self.today();
        let first = today.with_day(1).unwrap_or(today);
        self.store().read(|tables| summarize(first, today, tables.all::<LedgerEntry>()))
    }

    /// The 30 calendar days ending today, today included.
    pub fn last_30_days_report(&self) -> Report {
        let today = self.today();
        let from = today.checked_sub_days(Days::new(29)).unwrap_or(today);
        self.store().read(|tables| summarize(from, today, tables.all::<LedgerEntry>()))
    }

    /// Per-wallet count and volume of the daily transactions on `date`.
    /// Agent wallets count the raw amount, personal wallets the charged total.
    pub fn wallet_report(&self, date: NaiveDate) -> Vec<WalletActivity> {
        self.store().read(|tables| {
            let mut activity: BTreeMap<_, WalletActivity> = BTreeMap::new();
            let txns = tables
                .all::<DailyTransaction>()
                .filter(|txn| txn.date == date);
            for txn in txns {
                let Some(wallet) = txn.wallet.and_then(|id| tables.get::<WalletNumber>(&id))
                else {
                    continue;
                };
                let row = activity
                    .entry((wallet.label.clone(), wallet.number.clone(), wallet.id))
                    .or_insert_with(|| WalletActivity {
                        wallet: wallet.clone(),
                        txn_count: 0,
                        total: Decimal::ZERO,
                    });
                row.txn_count += 1;
                row.total += match wallet.kind {
                    WalletKind::Agent => txn.amount,
                    WalletKind::Personal => txn.charged_total(),
                };
            }
            activity.into_values().collect()
        })
    }

    pub fn balance_totals(&self) -> BalanceTotals {
        self.store().read(|tables| BalanceTotals {
            bank: tables.all::<BankAccount>().map(|a| a.balance).sum(),
            wallet: tables.all::<WalletNumber>().map(|w| w.balance).sum(),
            operator: tables.all::<Operator>().map(|o| o.balance).sum(),
            client_due: tables.all::<Client>().map(|c| c.due).sum(),
        })
    }

    /// The whole ledger feed, newest first, at most `limit` entries.
    pub fn ledger_feed(&self, limit: Option<usize>) -> Vec<LedgerEntry> {
        let mut entries: Vec<_> = self
            .store()
            .read(|tables| tables.all::<LedgerEntry>().cloned().collect());
        newest_first(&mut entries);
        if let Some(limit) = limit {
            entries.truncate(limit);
        }
        entries
    }

    /// Ledger entries that reference `client`, newest first.
    pub fn client_ledger(&self, client: ClientId) -> Vec<LedgerEntry> {
        let mut entries: Vec<_> = self.store().read(|tables| {
            tables
                .all::<LedgerEntry>()
                .filter(|entry| entry.client == Some(client))
                .cloned()
                .collect()
        });
        newest_first(&mut entries);
        entries
    }

    pub fn bank_transfers(&self) -> Vec<BankTransfer> {
        let mut transfers: Vec<_> = self
            .store()
            .read(|tables| tables.all::<BankTransfer>().cloned().collect());
        transfers.sort_by(|a, b| (b.date, b.created_at).cmp(&(a.date, a.created_at)));
        transfers
    }

    pub fn recharges(&self) -> Vec<Recharge> {
        let mut recharges: Vec<_> = self
            .store()
            .read(|tables| tables.all::<Recharge>().cloned().collect());
        recharges.sort_by(|a, b| (b.date, b.created_at).cmp(&(a.date, a.created_at)));
        recharges
    }

    pub fn load_records(&self) -> Vec<LoadRecord> {
        let mut loads: Vec<_> = self
            .store()
            .read(|tables| tables.all::<LoadRecord>().cloned().collect());
        loads.sort_by(|a, b| (b.date, b.created_at).cmp(&(a.date, a.created_at)));
        loads
    }

    pub fn daily_transactions(&self, date: Option<NaiveDate>) -> Vec<DailyTransaction> {
        let mut txns: Vec<_> = self.store().read(|tables| {
            tables
                .all::<DailyTransaction>()
                .filter(|txn| date.is_none_or(|date| txn.date == date))
                .cloned()
                .collect()
        });
        txns.sort_by(|a, b| (b.date, b.created_at).cmp(&(a.date, a.created_at)));
        txns
    }
}
