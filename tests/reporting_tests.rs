mod common;

use common::{bank, client, day, engine, operator, today, wallet};
use cashbook::{
    domain::{DailyKind, TransferKind, WalletKind},
    engine::{DailyRequest, LoadRequest, RechargeRequest, TransferRequest, errors::EngineError},
    reporting::{DayTotals, Totals},
};
use rust_decimal::dec;

/// Sales are summed per day and housekeeping entries are left out.
#[test]
fn report_groups_by_day_and_skips_housekeeping() -> anyhow::Result<()> {
    let engine = engine();
    bank(&engine, "A", dec!(10000));
    operator(&engine, "017", dec!(1000));
    let w = wallet(&engine, "0171", WalletKind::Agent, dec!(10000));
    let c = client(&engine, "Rahim", "0191");

    engine.create_transfer(TransferRequest::new("A", TransferKind::Send, "X", dec!(999)).on(day(14)))?;
    engine.adjust_operator_load(LoadRequest::new("017", dec!(500)).recorded())?;
    engine.create_recharge(RechargeRequest {
        date: Some(day(14)),
        ..RechargeRequest::new("017", "018", dec!(100))
    })?;
    engine.create_daily_txn(
        DailyRequest::new(DailyKind::CashOut, "bKash", dec!(1000))
            .with_wallet(w.id)
            .with_profit(dec!(18.506))
            .on(day(15)),
    )?;
    engine.create_daily_txn(
        DailyRequest::new(DailyKind::Bill, "cash", dec!(300))
            .with_client(c.id)
            .with_due(dec!(120))
            .on(day(15)),
    )?;
    engine.adjust_client_payment(c.id, dec!(20))?;

    let report = engine.report(day(14), day(15))?;

    assert_eq!(
        report.days,
        vec![
            DayTotals {
                date: day(14),
                totals: Totals {
                    amount: dec!(100),
                    profit: dec!(0),
                    due: dec!(0),
                    count: 1,
                },
            },
            DayTotals {
                date: day(15),
                totals: Totals {
                    amount: dec!(1300),
                    profit: dec!(18.51),
                    due: dec!(120),
                    count: 2,
                },
            },
        ]
    );
    assert_eq!(report.totals.amount, dec!(1400));
    assert_eq!(report.totals.count, 3);
    Ok(())
}

#[test]
fn period_reports_cover_their_windows() -> anyhow::Result<()> {
    let engine = engine();
    operator(&engine, "017", dec!(10000));
    for (date, amount) in [
        (day(15), dec!(10)),
        (day(1), dec!(20)),
        (chrono::NaiveDate::from_ymd_opt(2024, 2, 20).unwrap(), dec!(40)),
        (chrono::NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(), dec!(80)),
    ] {
        engine.create_recharge(RechargeRequest {
            date: Some(date),
            ..RechargeRequest::new("017", "018", amount)
        })?;
    }

    assert_eq!(engine.today_report().totals.amount, dec!(10));
    assert_eq!(engine.running_month_report().totals.amount, dec!(30));
    let last_30 = engine.last_30_days_report();
    assert_eq!(last_30.from, chrono::NaiveDate::from_ymd_opt(2024, 2, 15).unwrap());
    assert_eq!(last_30.to, today());
    assert_eq!(last_30.totals.amount, dec!(70));
    Ok(())
}

#[test]
fn inverted_range_is_rejected() {
    let engine = engine();

    assert!(matches!(
        engine.report(day(15), day(14)),
        Err(EngineError::Validation { field: "from", .. })
    ));
}

/// Agent wallets count raw amounts, personal wallets the charged total.
#[test]
fn wallet_report_uses_wallet_kind() -> anyhow::Result<()> {
    let engine = engine();
    let agent = wallet(&engine, "0171", WalletKind::Agent, dec!(5000));
    let personal = wallet(&engine, "0181", WalletKind::Personal, dec!(5000));
    for id in [agent.id, personal.id] {
        engine.create_daily_txn(
            DailyRequest::new(DailyKind::CashIn, "bKash", dec!(500))
                .with_wallet(id)
                .with_total(dec!(510)),
        )?;
        engine.create_daily_txn(
            DailyRequest::new(DailyKind::CashOut, "bKash", dec!(200)).with_wallet(id),
        )?;
    }
    engine.create_daily_txn(
        DailyRequest::new(DailyKind::CashOut, "bKash", dec!(999))
            .with_wallet(agent.id)
            .on(day(14)),
    )?;

    let report = engine.wallet_report(today());

    assert_eq!(report.len(), 2);
    assert_eq!(report[0].wallet.id, agent.id);
    assert_eq!((report[0].txn_count, report[0].total), (2, dec!(700)));
    assert_eq!(report[1].wallet.id, personal.id);
    assert_eq!((report[1].txn_count, report[1].total), (2, dec!(710)));
    Ok(())
}

#[test]
fn balance_totals_sum_each_family() -> anyhow::Result<()> {
    let engine = engine();
    bank(&engine, "A", dec!(100));
    bank(&engine, "B", dec!(250.25));
    wallet(&engine, "0171", WalletKind::Agent, dec!(40));
    operator(&engine, "017", dec!(60));

    let totals = engine.balance_totals();

    assert_eq!(totals.bank, dec!(350.25));
    assert_eq!(totals.wallet, dec!(40));
    assert_eq!(totals.operator, dec!(60));
    assert_eq!(totals.client_due, dec!(0));
    Ok(())
}

/// The feed lists later business days first and honours the limit.
#[test]
fn ledger_feed_is_newest_first() -> anyhow::Result<()> {
    let engine = engine();
    operator(&engine, "017", dec!(1000));
    for d in [13, 15, 14] {
        engine.create_recharge(RechargeRequest {
            date: Some(day(d)),
            ..RechargeRequest::new("017", "018", dec!(1))
        })?;
    }

    let dates: Vec<_> = engine.ledger_feed(Some(2)).into_iter().map(|e| e.date).collect();

    assert_eq!(dates, vec![day(15), day(14)]);
    Ok(())
}
