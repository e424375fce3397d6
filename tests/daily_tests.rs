mod common;

use std::sync::Arc;

use common::{FailingNotifier, RecordingNotifier, client, engine, wallet};
use cashbook::{
    domain::{DailyKind, EntityKind, EntryKind, WalletKind},
    engine::{DailyPatch, DailyRequest, LedgerConfig, LedgerEngine, errors::EngineError},
    notify::{Delivery, NotifyError},
};
use rust_decimal::dec;

/// A cash out pays the amount from the wallet and credits the commission back.
#[test]
fn cash_out_deducts_amount_and_credits_profit() -> anyhow::Result<()> {
    let engine = engine();
    let w = wallet(&engine, "01711000000", WalletKind::Agent, dec!(5000));

    let outcome = engine.create_daily_txn(
        DailyRequest::new(DailyKind::CashOut, "bKash", dec!(1000))
            .with_wallet(w.id)
            .with_profit(dec!(20)),
    )?;

    assert_eq!(outcome.wallet.map(|w| w.balance), Some(dec!(4020)));
    assert_eq!(outcome.entry.kind, EntryKind::CashOut);
    assert_eq!(outcome.entry.amount, dec!(1000));
    assert_eq!(outcome.entry.profit, dec!(20));
    assert_eq!(outcome.entry.note, "1000 Tk Cash Out to number 01711000000");
    assert_eq!(outcome.delivery, Delivery::NotRequested);
    Ok(())
}

/// A cash in credits the charged total, and the entry reports it too.
#[test]
fn cash_in_credits_charged_total() -> anyhow::Result<()> {
    let engine = engine();
    let w = wallet(&engine, "01711000000", WalletKind::Personal, dec!(100));

    let outcome = engine.create_daily_txn(
        DailyRequest::new(DailyKind::CashIn, "bKash", dec!(500))
            .with_wallet(w.id)
            .with_total(dec!(510)),
    )?;

    assert_eq!(outcome.wallet.map(|w| w.balance), Some(dec!(610)));
    assert_eq!(outcome.entry.amount, dec!(510));
    assert_eq!(outcome.entry.meta.get("wallet"), Some(&"01711000000".to_owned()));
    Ok(())
}

#[test]
fn cash_out_beyond_wallet_balance_is_rejected() {
    let engine = engine();
    let w = wallet(&engine, "0171", WalletKind::Agent, dec!(999));

    let result = engine.create_daily_txn(
        DailyRequest::new(DailyKind::SendMoney, "bKash", dec!(1000)).with_wallet(w.id),
    );

    assert_eq!(
        result,
        Err(EngineError::InsufficientBalance {
            kind: EntityKind::Wallet,
            key: w.id.to_string(),
            available: dec!(999),
            required: dec!(1000),
        })
    );
    assert_eq!(engine.wallet(w.id).unwrap().balance, dec!(999));
    assert!(engine.daily_transactions(None).is_empty());
}

/// A bill sold on credit books the sale on the client and leaves wallets alone.
#[test]
fn bill_on_credit_books_client_sale() -> anyhow::Result<()> {
    let engine = engine();
    let c = client(&engine, "Rahim", "01900000000");

    let outcome = engine.create_daily_txn(
        DailyRequest::new(DailyKind::Bill, "cash", dec!(800))
            .with_client(c.id)
            .with_due(dec!(300))
            .with_bill_type("Electricity"),
    )?;

    let c = outcome.client.expect("client is resolved");
    assert_eq!((c.total_sale, c.paid, c.due), (dec!(800), dec!(500), dec!(300)));
    assert_eq!(outcome.wallet, None);
    assert_eq!(outcome.txn.client_name.as_deref(), Some("Rahim"));
    assert_eq!(outcome.entry.client_phone.as_deref(), Some("01900000000"));
    assert_eq!(outcome.entry.due, dec!(300));
    assert_eq!(outcome.entry.note, "800 Tk Electricity paid");
    Ok(())
}

#[test]
fn due_above_charged_total_is_rejected() {
    let engine = engine();
    let c = client(&engine, "Rahim", "01900000000");

    let result = engine.create_daily_txn(
        DailyRequest::new(DailyKind::Bill, "cash", dec!(100))
            .with_client(c.id)
            .with_due(dec!(101)),
    );

    assert!(matches!(
        result,
        Err(EngineError::Validation { field: "due", .. })
    ));
}

/// The client is texted the note once the transaction has committed.
#[test]
fn notification_is_sent_after_commit() -> anyhow::Result<()> {
    let notifier = Arc::new(RecordingNotifier::default());
    let engine = engine().with_notifier(notifier.clone());
    let c = client(&engine, "Rahim", "01900000000");

    let outcome = engine.create_daily_txn(
        DailyRequest::new(DailyKind::CashIn, "bKash", dec!(250))
            .with_client(c.id)
            .with_due(dec!(250))
            .notify(None),
    )?;

    assert_eq!(outcome.delivery, Delivery::Sent);
    assert_eq!(
        *notifier.sent.lock().unwrap(),
        vec![(
            "01900000000".to_owned(),
            "250 Tk Cash In to number 01900000000".to_owned()
        )]
    );
    Ok(())
}

/// A gateway failure is reported but the ledger change stays.
#[test]
fn failed_notification_does_not_roll_back() -> anyhow::Result<()> {
    let engine = engine().with_notifier(Arc::new(FailingNotifier));
    let w = wallet(&engine, "0171", WalletKind::Agent, dec!(0));
    let c = client(&engine, "Rahim", "01900000000");

    let outcome = engine.create_daily_txn(
        DailyRequest::new(DailyKind::ReceiveMoney, "bKash", dec!(400))
            .with_wallet(w.id)
            .with_client(c.id)
            .notify(Some("Thanks for your payment".to_owned())),
    )?;

    assert_eq!(
        outcome.delivery,
        Delivery::Failed(NotifyError::Failed {
            phone: "01900000000".to_owned(),
            reason: "gateway unreachable".to_owned(),
        })
    );
    assert_eq!(engine.wallet(w.id).unwrap().balance, dec!(400));
    assert_eq!(engine.daily_transactions(None), vec![outcome.txn]);
    Ok(())
}

#[test]
fn disabled_notifications_are_never_queued() -> anyhow::Result<()> {
    let notifier = Arc::new(RecordingNotifier::default());
    let engine = LedgerEngine::new(LedgerConfig {
        notifications: false,
        ..LedgerConfig::default()
    })
    .with_notifier(notifier.clone());
    let c = client(&engine, "Rahim", "01900000000");

    let outcome = engine.create_daily_txn(
        DailyRequest::new(DailyKind::Bill, "cash", dec!(50))
            .with_client(c.id)
            .notify(None),
    )?;

    assert_eq!(outcome.notification, None);
    assert_eq!(outcome.delivery, Delivery::NotRequested);
    assert!(notifier.sent.lock().unwrap().is_empty());
    Ok(())
}

/// Editing moves both the wallet effect and the client sale.
#[test]
fn edit_moves_wallet_and_client() -> anyhow::Result<()> {
    let engine = engine();
    let first = wallet(&engine, "0171", WalletKind::Agent, dec!(1000));
    let second = wallet(&engine, "0181", WalletKind::Agent, dec!(1000));
    let rahim = client(&engine, "Rahim", "0191");
    let karim = client(&engine, "Karim", "0192");
    let created = engine.create_daily_txn(
        DailyRequest::new(DailyKind::CashOut, "bKash", dec!(300))
            .with_wallet(first.id)
            .with_client(rahim.id)
            .with_profit(dec!(6))
            .with_due(dec!(100)),
    )?;
    assert_eq!(created.wallet.map(|w| w.balance), Some(dec!(706)));

    let edit = engine.edit_daily_txn(
        created.txn.id,
        DailyPatch {
            wallet: Some(Some(second.id)),
            client: Some(Some(karim.id)),
            client_name: Some("Karim".to_owned()),
            ..DailyPatch::default()
        },
    )?;

    assert_eq!(edit.wallet.map(|w| w.balance), Some(dec!(706)));
    assert_eq!(edit.previous_wallet.map(|w| w.balance), Some(dec!(1000)));
    let previous = edit.previous_client.expect("client moved");
    assert_eq!((previous.total_sale, previous.paid, previous.due), (dec!(0), dec!(0), dec!(0)));
    let current = edit.client.expect("client resolved");
    assert_eq!((current.total_sale, current.paid, current.due), (dec!(300), dec!(200), dec!(100)));
    assert_eq!(edit.entry.id, created.entry.id);
    assert_eq!(edit.entry.client, Some(karim.id));
    Ok(())
}

#[test]
fn delete_reverses_wallet_and_client() -> anyhow::Result<()> {
    let engine = engine();
    let w = wallet(&engine, "0171", WalletKind::Agent, dec!(1000));
    let c = client(&engine, "Rahim", "0191");
    let created = engine.create_daily_txn(
        DailyRequest::new(DailyKind::CashOut, "bKash", dec!(300))
            .with_wallet(w.id)
            .with_client(c.id)
            .with_profit(dec!(6))
            .with_due(dec!(100)),
    )?;

    let reversal = engine.delete_daily_txn(created.txn.id)?;

    assert_eq!(reversal.wallet.map(|w| w.balance), Some(dec!(1000)));
    assert_eq!(reversal.reversed, dec!(294));
    let c = reversal.client.expect("client resolved");
    assert_eq!((c.total_sale, c.paid, c.due), (dec!(0), dec!(0), dec!(0)));
    assert!(engine.ledger_feed(None).is_empty());
    Ok(())
}

/// Detaching restores the old wallet and client and drops the client snapshot.
#[test]
fn edit_can_detach_wallet_and_client() -> anyhow::Result<()> {
    let engine = engine();
    let w = wallet(&engine, "0171", WalletKind::Agent, dec!(1000));
    let c = client(&engine, "Rahim", "0191");
    let created = engine.create_daily_txn(
        DailyRequest::new(DailyKind::CashOut, "bKash", dec!(300))
            .with_wallet(w.id)
            .with_client(c.id)
            .with_profit(dec!(6))
            .with_due(dec!(100)),
    )?;

    let edit = engine.edit_daily_txn(
        created.txn.id,
        DailyPatch {
            wallet: Some(None),
            client: Some(None),
            ..DailyPatch::default()
        },
    )?;

    assert_eq!(edit.wallet, None);
    assert_eq!(edit.client, None);
    assert_eq!(edit.txn.client_name, None);
    assert_eq!(edit.entry.client, None);
    assert_eq!(engine.wallet(w.id).unwrap().balance, dec!(1000));
    let c = engine.client(c.id).unwrap();
    assert_eq!((c.total_sale, c.paid, c.due), (dec!(0), dec!(0), dec!(0)));
    Ok(())
}

/// Once a payment has cleared a credit sale, taking the sale back would leave
/// the client owing a negative amount, so delete and edit are refused.
#[test]
fn settled_credit_sale_cannot_be_reversed() -> anyhow::Result<()> {
    let engine = engine();
    let c = client(&engine, "Rahim", "0191");
    let created = engine.create_daily_txn(
        DailyRequest::new(DailyKind::Bill, "cash", dec!(500))
            .with_client(c.id)
            .with_due(dec!(200)),
    )?;
    engine.adjust_client_payment(c.id, dec!(200))?;

    let deleted = engine.delete_daily_txn(created.txn.id);
    let edited = engine.edit_daily_txn(
        created.txn.id,
        DailyPatch {
            amount: Some(dec!(400)),
            ..DailyPatch::default()
        },
    );

    assert!(matches!(deleted, Err(EngineError::Validation { field: "due", .. })));
    assert!(matches!(edited, Err(EngineError::Validation { field: "due", .. })));
    let c = engine.client(c.id).unwrap();
    assert_eq!((c.total_sale, c.paid, c.due), (dec!(0), dec!(0), dec!(0)));
    assert_eq!(engine.daily_transactions(None).len(), 1);
    Ok(())
}

/// A partly paid sale cannot be reversed either.
#[test]
fn partly_paid_credit_sale_cannot_be_deleted() -> anyhow::Result<()> {
    let engine = engine();
    let c = client(&engine, "Rahim", "0191");
    let created = engine.create_daily_txn(
        DailyRequest::new(DailyKind::Bill, "cash", dec!(500))
            .with_client(c.id)
            .with_due(dec!(200)),
    )?;
    engine.adjust_client_payment(c.id, dec!(50))?;

    let deleted = engine.delete_daily_txn(created.txn.id);

    assert!(matches!(deleted, Err(EngineError::Validation { field: "due", .. })));
    let c = engine.client(c.id).unwrap();
    assert_eq!((c.total_sale, c.paid, c.due), (dec!(500), dec!(350), dec!(150)));
    Ok(())
}

#[test]
fn kind_strings_parse_leniently_and_reject_unknowns() {
    assert_eq!("Cash In".parse::<DailyKind>(), Ok(DailyKind::CashIn));
    assert_eq!("cash_out".parse::<DailyKind>(), Ok(DailyKind::CashOut));
    assert_eq!("Cash".parse::<DailyKind>(), Ok(DailyKind::Bill));
    assert!("refund".parse::<DailyKind>().is_err());
}
