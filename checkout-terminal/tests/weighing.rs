// Produce weighing: PLU lookup, scale reading, half-up pricing

mod support;

use std::str::FromStr;
use std::time::Duration;

use checkout_terminal::{CartError, Severity, TerminalError, WeighError};
use rust_decimal::Decimal;
use serde_json::json;
use support::{FakeBackend, harness, produce};

fn d(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn apples() -> std::sync::Arc<FakeBackend> {
    FakeBackend::new().with_produce(vec![produce("apple", "P1", 50_000)])
}

#[tokio::test]
async fn test_weighed_price_and_grams() {
    let h = harness(apples());
    h.bridge.set_weight(json!(0.350));

    let line = h.terminal.add_by_plu("P1").await.unwrap();

    assert_eq!(line.unit_price, 17_500);
    assert_eq!(line.weight_grams, Some(d("350")));
    assert_eq!(line.weight_kg, Some(d("0.35")));
    assert_eq!(line.quantity, 1);
    assert!(line.is_weighted);
    assert_eq!(line.plu_code.as_deref(), Some("P1"));
    assert_eq!(h.terminal.total_amount(), 17_500);
}

#[tokio::test]
async fn test_price_rounds_half_up() {
    let h = harness(FakeBackend::new().with_produce(vec![produce("herb", "H1", 25)]));
    h.bridge.set_weight(json!("0.5"));

    let line = h.terminal.add_by_plu("H1").await.unwrap();
    assert_eq!(line.unit_price, 13);
}

#[tokio::test]
async fn test_missing_code_makes_no_requests() {
    let h = harness(apples());
    let mut notices = h.terminal.subscribe();

    let err = h.terminal.add_by_plu("   ").await.unwrap_err();
    assert!(matches!(err, TerminalError::Weigh(WeighError::MissingCode)));
    assert_eq!(h.bridge.weighs(), 0);
    assert_eq!(h.backend.produce_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    assert_eq!(notices.try_recv().unwrap().severity, Severity::Warning);
}

#[tokio::test]
async fn test_unknown_code_never_weighs() {
    let h = harness(apples());

    let err = h.terminal.add_by_plu("P9").await.unwrap_err();
    assert!(matches!(err, TerminalError::Weigh(WeighError::UnknownCode(code)) if code == "P9"));
    assert_eq!(h.bridge.weighs(), 0);
    assert!(h.terminal.cart_lines().is_empty());
}

#[tokio::test]
async fn test_invalid_weights_are_rejected() {
    let h = harness(apples());

    for weight in [json!(0), json!(-0.2), json!("heavy"), json!(null)] {
        h.bridge.set_weight(weight);
        let err = h.terminal.add_by_plu("P1").await.unwrap_err();
        assert!(matches!(err, TerminalError::Weigh(WeighError::InvalidWeight)));
    }
    assert!(h.terminal.cart_lines().is_empty());
}

#[tokio::test]
async fn test_each_weighing_is_a_separate_fixed_line() {
    let h = harness(apples());
    h.bridge.set_weight(json!(0.35));
    let first = h.terminal.add_by_plu("P1").await.unwrap();
    h.bridge.set_weight(json!(1.2));
    let second = h.terminal.add_by_plu("P1").await.unwrap();

    assert_ne!(first.line_id, second.line_id);
    assert_eq!(h.terminal.cart_lines().len(), 2);
    assert_eq!(h.terminal.total_amount(), 17_500 + 60_000);
    assert_eq!(h.terminal.total_quantity(), 2);

    let err = h.terminal.adjust_line(&first.line_id, 1).unwrap_err();
    assert!(matches!(err, TerminalError::Cart(CartError::WeighedLineFixed(_))));

    assert_eq!(h.terminal.adjust_line(&first.line_id, -1).unwrap(), None);
    assert_eq!(h.terminal.cart_lines().len(), 1);
}

#[tokio::test]
async fn test_weigh_then_commit() {
    let h = harness(apples());
    h.bridge.set_weight(json!("1.5"));

    h.terminal.select_plu("P1");
    let reading = h.terminal.weigh().await.unwrap();
    assert_eq!(reading.weight_kg, d("1.5"));
    assert!(h.terminal.cart_lines().is_empty());

    let line = h.terminal.commit_weighed().unwrap();
    assert_eq!(line.unit_price, 75_000);

    // reading is consumed
    let err = h.terminal.commit_weighed().unwrap_err();
    assert!(matches!(err, TerminalError::Weigh(WeighError::NoReading)));
}

#[tokio::test(start_paused = true)]
async fn test_reading_after_leaving_plu_mode_is_discarded() {
    let h = harness(apples());
    h.bridge.set_weight(json!(0.35));
    h.bridge.set_weigh_delay(Duration::from_millis(500));

    h.terminal.select_plu("P1");
    let (result, ()) = tokio::join!(h.terminal.weigh(), async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        h.terminal.leave_plu();
    });

    assert!(matches!(result, Err(TerminalError::Weigh(WeighError::Superseded))));
    assert_eq!(h.bridge.weighs(), 1);
    assert!(matches!(
        h.terminal.commit_weighed(),
        Err(TerminalError::Weigh(WeighError::NoReading))
    ));
    assert!(h.terminal.cart_lines().is_empty());
}
