use cashbook::domain::{Flow, compute_delta};
use rust_decimal::dec;

/// Sending with a fee deducts amount and fee together.
#[test]
fn outgoing_with_fee_deducts_both() {
    assert_eq!(
        compute_delta(Flow::Outgoing, dec!(200), Some(dec!(10)), None),
        dec!(-210)
    );
}

/// A received amount is credited net of its fee.
#[test]
fn incoming_with_fee_credits_net() {
    assert_eq!(
        compute_delta(Flow::Incoming, dec!(200), Some(dec!(10)), None),
        dec!(190)
    );
}

#[test]
fn without_fee_the_amount_moves_unchanged() {
    assert_eq!(compute_delta(Flow::Outgoing, dec!(75.5), None, None), dec!(-75.5));
    assert_eq!(compute_delta(Flow::Incoming, dec!(75.5), None, None), dec!(75.5));
}

/// `pay` overrides amount and fee in both directions.
#[test]
fn pay_overrides_amount_and_fee() {
    assert_eq!(
        compute_delta(Flow::Outgoing, dec!(200), Some(dec!(10)), Some(dec!(205))),
        dec!(-205)
    );
    assert_eq!(
        compute_delta(Flow::Incoming, dec!(200), Some(dec!(10)), Some(dec!(198))),
        dec!(198)
    );
}

/// Zero fee and zero pay count as absent.
#[test]
fn zero_fee_and_pay_are_ignored() {
    assert_eq!(
        compute_delta(Flow::Outgoing, dec!(100), Some(dec!(0)), Some(dec!(0))),
        dec!(-100)
    );
}
