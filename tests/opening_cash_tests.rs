mod common;

use common::{day, engine, today};
use cashbook::{domain::Denomination, engine::errors::EngineError};
use rust_decimal::dec;

fn note(value: rust_decimal::Decimal, count: u32, enabled: bool) -> Denomination {
    Denomination {
        value,
        count,
        enabled,
        custom: false,
    }
}

/// The first read of a day stores a zero record that later reads return.
#[test]
fn first_read_creates_zero_record() -> anyhow::Result<()> {
    let engine = engine();

    let opening = engine.today_opening_cash()?;

    assert_eq!(opening.date, today());
    assert_eq!(opening.amount, dec!(0));
    assert!(opening.denominations.is_empty());
    assert_eq!(engine.opening_cash(today())?, opening);
    Ok(())
}

#[test]
fn set_upserts_by_date() -> anyhow::Result<()> {
    let engine = engine();

    engine.set_opening_cash(None, Some(dec!(1500)), Vec::new())?;
    engine.set_opening_cash(None, Some(dec!(2000)), Vec::new())?;
    engine.set_opening_cash(Some(day(14)), Some(dec!(700)), Vec::new())?;

    assert_eq!(engine.today_opening_cash()?.amount, dec!(2000));
    assert_eq!(engine.opening_cash(day(14))?.amount, dec!(700));
    Ok(())
}

/// Without an amount the enabled denominations are counted.
#[test]
fn amount_defaults_to_counted_denominations() -> anyhow::Result<()> {
    let engine = engine();
    let denominations = vec![
        note(dec!(1000), 2, true),
        note(dec!(500), 3, true),
        note(dec!(100), 9, false),
    ];

    let opening = engine.set_opening_cash(None, None, denominations.clone())?;

    assert_eq!(opening.amount, dec!(3500));
    assert_eq!(opening.denominations, denominations);
    Ok(())
}

#[test]
fn negative_amount_is_rejected() {
    let engine = engine();

    assert!(matches!(
        engine.set_opening_cash(None, Some(dec!(-1)), Vec::new()),
        Err(EngineError::Validation { field: "amount", .. })
    ));
    assert!(matches!(
        engine.set_opening_cash(None, None, Vec::new()),
        Err(EngineError::Validation { field: "amount", .. })
    ));
}
