mod common;

use common::{bank, engine};
use cashbook::{
    domain::{EntityKind, EntryKind, TransferKind},
    engine::{TransferPatch, TransferRequest, errors::EngineError},
};
use rust_decimal::dec;

/// Sending 200 with a 10 fee from an account holding 1000 leaves 790 and
/// writes one mirrored ledger entry.
#[test]
fn send_with_fee_deducts_amount_and_fee() -> anyhow::Result<()> {
    let engine = engine();
    bank(&engine, "A", dec!(1000));

    let outcome = engine.create_transfer(
        TransferRequest::new("A", TransferKind::Send, "Rahim", dec!(200)).with_fee(dec!(10)),
    )?;

    assert_eq!(outcome.account.balance, dec!(790));
    assert_eq!(outcome.entry.kind, EntryKind::BankSend);
    assert_eq!(outcome.entry.amount, dec!(200));
    assert_eq!(outcome.entry.origin(), Some(outcome.transfer.id));
    assert_eq!(outcome.entry.note, "200 Tk sent to Rahim");
    assert_eq!(engine.ledger_feed(None), vec![outcome.entry]);
    Ok(())
}

#[test]
fn receive_credits_amount_net_of_fee() -> anyhow::Result<()> {
    let engine = engine();
    bank(&engine, "A", dec!(100));

    let outcome = engine.create_transfer(
        TransferRequest::new("A", TransferKind::Receive, "Karim", dec!(500))
            .with_fee(dec!(5))
            .with_counterparty_account("0011"),
    )?;

    assert_eq!(outcome.account.balance, dec!(595));
    assert_eq!(outcome.entry.note, "500 Tk received from Karim (0011)");
    Ok(())
}

/// A receive whose fee eats the whole amount would debit the account instead.
#[test]
fn receive_fee_must_stay_below_amount() -> anyhow::Result<()> {
    let engine = engine();
    bank(&engine, "A", dec!(1000));
    bank(&engine, "Z", dec!(0));

    let on_a = engine.create_transfer(
        TransferRequest::new("A", TransferKind::Receive, "Karim", dec!(100)).with_fee(dec!(150)),
    );
    let on_z = engine.create_transfer(
        TransferRequest::new("Z", TransferKind::Receive, "Karim", dec!(100)).with_fee(dec!(100)),
    );

    assert!(matches!(on_a, Err(EngineError::Validation { field: "fee", .. })));
    assert!(matches!(on_z, Err(EngineError::Validation { field: "fee", .. })));
    assert_eq!(engine.bank_account(&"A".into()).unwrap().balance, dec!(1000));
    assert!(engine.bank_transfers().is_empty());

    // An explicit pay amount takes precedence over the fee.
    let outcome = engine.create_transfer(
        TransferRequest::new("A", TransferKind::Receive, "Karim", dec!(100))
            .with_fee(dec!(150))
            .with_pay(dec!(90)),
    )?;
    assert_eq!(outcome.account.balance, dec!(1090));

    let edit = engine.edit_transfer(
        outcome.transfer.id,
        TransferPatch {
            pay: Some(dec!(0)),
            ..TransferPatch::default()
        },
    );

    assert!(matches!(edit, Err(EngineError::Validation { field: "fee", .. })));
    assert_eq!(engine.bank_account(&"A".into()).unwrap().balance, dec!(1090));
    Ok(())
}

/// An overdraft is refused and nothing changes.
#[test]
fn send_beyond_balance_is_rejected_without_side_effects() {
    let engine = engine();
    bank(&engine, "A", dec!(100));

    let result = engine.create_transfer(
        TransferRequest::new("A", TransferKind::Send, "Rahim", dec!(95)).with_fee(dec!(10)),
    );

    assert_eq!(
        result,
        Err(EngineError::InsufficientBalance {
            kind: EntityKind::BankAccount,
            key: "A".to_owned(),
            available: dec!(100),
            required: dec!(105),
        })
    );
    assert_eq!(engine.bank_account(&"A".into()).unwrap().balance, dec!(100));
    assert!(engine.ledger_feed(None).is_empty());
    assert!(engine.bank_transfers().is_empty());
}

#[test]
fn transfer_on_unknown_account_is_not_found() {
    let engine = engine();

    let result =
        engine.create_transfer(TransferRequest::new("missing", TransferKind::Send, "X", dec!(1)));

    assert_eq!(
        result,
        Err(EngineError::NotFound {
            kind: EntityKind::BankAccount,
            key: "missing".to_owned(),
        })
    );
}

/// Moving a send of 100 from A to D credits A back and debits D.
#[test]
fn edit_moves_transfer_to_another_account() -> anyhow::Result<()> {
    let engine = engine();
    bank(&engine, "A", dec!(500));
    bank(&engine, "D", dec!(300));
    let created =
        engine.create_transfer(TransferRequest::new("A", TransferKind::Send, "Rahim", dec!(100)))?;
    assert_eq!(created.account.balance, dec!(400));

    let edit = engine.edit_transfer(
        created.transfer.id,
        TransferPatch {
            account: Some("D".into()),
            ..TransferPatch::default()
        },
    )?;

    assert_eq!(edit.account.balance, dec!(200));
    assert_eq!(edit.previous_account.map(|a| a.balance), Some(dec!(500)));
    assert_eq!(engine.bank_account(&"A".into()).unwrap().balance, dec!(500));
    assert_eq!(engine.bank_account(&"D".into()).unwrap().balance, dec!(200));
    assert_eq!(edit.entry.id, created.entry.id);
    assert_eq!(edit.entry.meta.get("account"), Some(&"D".to_owned()));
    assert_eq!(engine.ledger_feed(None).len(), 1);
    Ok(())
}

/// Editing on the same account sees the reversed balance before re-deducting.
#[test]
fn edit_on_same_account_may_use_the_reversed_amount() -> anyhow::Result<()> {
    let engine = engine();
    bank(&engine, "A", dec!(300));
    let created =
        engine.create_transfer(TransferRequest::new("A", TransferKind::Send, "Rahim", dec!(250)))?;

    let edit = engine.edit_transfer(
        created.transfer.id,
        TransferPatch {
            amount: Some(dec!(290)),
            ..TransferPatch::default()
        },
    )?;

    assert_eq!(edit.account.balance, dec!(10));
    assert_eq!(edit.previous_account, None);
    Ok(())
}

/// A failing edit leaves the original transfer and balances untouched.
#[test]
fn failed_edit_changes_nothing() -> anyhow::Result<()> {
    let engine = engine();
    bank(&engine, "A", dec!(500));
    bank(&engine, "D", dec!(50));
    let created =
        engine.create_transfer(TransferRequest::new("A", TransferKind::Send, "Rahim", dec!(100)))?;

    let result = engine.edit_transfer(
        created.transfer.id,
        TransferPatch {
            account: Some("D".into()),
            ..TransferPatch::default()
        },
    );

    assert!(matches!(result, Err(EngineError::InsufficientBalance { .. })));
    assert_eq!(engine.bank_account(&"A".into()).unwrap().balance, dec!(400));
    assert_eq!(engine.bank_account(&"D".into()).unwrap().balance, dec!(50));
    assert_eq!(engine.bank_transfers(), vec![created.transfer]);
    Ok(())
}

/// `edit(t, p)` ends in the same balances as `delete(t)` then `create(t + p)`.
#[test]
fn edit_matches_delete_then_recreate() -> anyhow::Result<()> {
    let edited = engine();
    let recreated = engine();
    for engine in [&edited, &recreated] {
        bank(engine, "A", dec!(1000));
        bank(engine, "D", dec!(1000));
    }

    let original = TransferRequest::new("A", TransferKind::Send, "Rahim", dec!(200)).with_fee(dec!(10));
    let t = edited.create_transfer(original.clone())?;
    edited.edit_transfer(
        t.transfer.id,
        TransferPatch {
            account: Some("D".into()),
            kind: Some(TransferKind::Receive),
            amount: Some(dec!(150)),
            ..TransferPatch::default()
        },
    )?;

    let t = recreated.create_transfer(original)?;
    recreated.delete_transfer(t.transfer.id)?;
    recreated.create_transfer(
        TransferRequest::new("D", TransferKind::Receive, "Rahim", dec!(150)).with_fee(dec!(10)),
    )?;

    assert_eq!(edited.bank_accounts(), recreated.bank_accounts());
    Ok(())
}

/// Deleting restores the balance exactly and removes the mirror.
#[test]
fn delete_restores_balance_and_removes_entry() -> anyhow::Result<()> {
    let engine = engine();
    bank(&engine, "A", dec!(1000));
    let created = engine.create_transfer(
        TransferRequest::new("A", TransferKind::Send, "Rahim", dec!(200)).with_pay(dec!(203.75)),
    )?;
    assert_eq!(created.account.balance, dec!(796.25));

    let reversal = engine.delete_transfer(created.transfer.id)?;

    assert_eq!(reversal.entity.balance, dec!(1000));
    assert_eq!(reversal.reversed, dec!(203.75));
    assert!(engine.ledger_feed(None).is_empty());
    assert!(engine.bank_transfers().is_empty());
    Ok(())
}

/// Reversing a receive is never blocked by the overdraft check.
#[test]
fn deleting_a_receive_may_drive_the_balance_negative() -> anyhow::Result<()> {
    let engine = engine();
    bank(&engine, "A", dec!(0));
    let received =
        engine.create_transfer(TransferRequest::new("A", TransferKind::Receive, "Karim", dec!(100)))?;
    engine.create_transfer(TransferRequest::new("A", TransferKind::Send, "Rahim", dec!(80)))?;

    let reversal = engine.delete_transfer(received.transfer.id)?;

    assert_eq!(reversal.entity.balance, dec!(-80));
    Ok(())
}

#[test]
fn non_positive_amount_is_a_validation_error() {
    let engine = engine();
    bank(&engine, "A", dec!(1000));

    let result =
        engine.create_transfer(TransferRequest::new("A", TransferKind::Send, "Rahim", dec!(0)));

    assert!(matches!(
        result,
        Err(EngineError::Validation { field: "amount", .. })
    ));
}
