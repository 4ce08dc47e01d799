//! Scan field timer tests
//!
//! Runs the idle auto-submit timer under tokio's paused clock so the
//! idle window elapses instantly and deterministically.

use tokio::time::{advance, timeout, Duration};

use pos_retail_client::ScanField;
use shared::SubmitReason;

#[tokio::test(start_paused = true)]
async fn burst_auto_submits_exactly_once() {
    let (mut field, mut rx) = ScanField::new();
    for c in "ABC123".chars() {
        field.keystroke(c);
    }

    let signal = timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("idle timer should fire")
        .expect("channel open");
    assert_eq!(signal.token.code, "ABC123");
    assert_eq!(signal.token.qty, None);
    assert_eq!(signal.reason, SubmitReason::Idle);
    assert_eq!(field.value(), "");

    // The burst drained the buffer, so nothing fires again
    assert!(timeout(Duration::from_millis(500), rx.recv()).await.is_err());
}

#[tokio::test(start_paused = true)]
async fn short_value_never_auto_submits() {
    let (mut field, mut rx) = ScanField::new();
    for c in "ABC12".chars() {
        field.keystroke(c);
    }

    assert!(timeout(Duration::from_secs(2), rx.recv()).await.is_err());
    assert_eq!(field.value(), "ABC12");

    // Enter still submits the short value
    field.enter();
    let signal = timeout(Duration::from_millis(10), rx.recv())
        .await
        .expect("enter should submit")
        .expect("channel open");
    assert_eq!(signal.token.code, "ABC12");
    assert_eq!(signal.reason, SubmitReason::Enter);
}

#[tokio::test(start_paused = true)]
async fn keystroke_inside_window_defers_the_submission() {
    let (mut field, mut rx) = ScanField::new();
    for c in "ABC123".chars() {
        field.keystroke(c);
    }

    // Another key lands before the idle window elapses
    advance(Duration::from_millis(50)).await;
    field.keystroke('4');

    let signal = timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("idle timer should fire")
        .expect("channel open");
    assert_eq!(signal.token.code, "ABC1234");
    assert_eq!(signal.reason, SubmitReason::Idle);
}

#[tokio::test(start_paused = true)]
async fn enter_splits_the_multiplier() {
    let (mut field, mut rx) = ScanField::new();
    field.set_value("SKU-100*2");
    field.enter();

    let signal = timeout(Duration::from_millis(10), rx.recv())
        .await
        .expect("enter should submit")
        .expect("channel open");
    assert_eq!(signal.token.code, "SKU-100");
    assert_eq!(signal.token.qty, Some(2));
    assert_eq!(signal.reason, SubmitReason::Enter);

    // Enter cancelled the armed idle timer; no second submission
    assert!(timeout(Duration::from_secs(1), rx.recv()).await.is_err());
}

#[tokio::test(start_paused = true)]
async fn blank_enter_emits_nothing() {
    let (mut field, mut rx) = ScanField::new();
    field.enter();
    field.set_value("   ");
    field.enter();

    assert!(timeout(Duration::from_millis(500), rx.recv()).await.is_err());
}

#[tokio::test(start_paused = true)]
async fn clear_disarms_the_timer() {
    let (mut field, mut rx) = ScanField::new();
    field.set_value("ABC123");
    field.clear();

    assert_eq!(field.value(), "");
    assert!(timeout(Duration::from_secs(1), rx.recv()).await.is_err());
}
