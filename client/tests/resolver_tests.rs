//! Variant resolver tests
//!
//! Debounce cancellation, stale-result rejection via the generation
//! counter, and the single-slot pending selection's precedence in the
//! submit path.

use tokio::time::{timeout, Duration};
use uuid::Uuid;

use pos_retail_client::{ClientError, VariantResolver};
use shared::{ScanToken, Variant, SEARCH_RESULT_LIMIT};

fn variant(sku: &str) -> Variant {
    Variant {
        id: Uuid::new_v4(),
        sku: sku.to_string(),
        barcode: None,
        product_name: format!("Product {}", sku),
    }
}

#[tokio::test(start_paused = true)]
async fn debounce_sends_only_the_latest_query() {
    let (mut resolver, mut rx) = VariantResolver::new(None);
    resolver.on_query_input("sh");
    resolver.on_query_input("shi");
    resolver.on_query_input("shirt");

    let request = timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("debounce should fire")
        .expect("channel open");
    assert_eq!(request.query, "shirt");
    assert_eq!(request.limit, SEARCH_RESULT_LIMIT);

    // The superseded queries were cancelled, not queued
    assert!(timeout(Duration::from_secs(1), rx.recv()).await.is_err());
}

#[tokio::test(start_paused = true)]
async fn empty_query_clears_candidates_without_searching() {
    let (mut resolver, mut rx) = VariantResolver::new(None);
    resolver.on_query_input("shirt");
    let request = timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("debounce should fire")
        .expect("channel open");
    assert!(resolver.deliver_results(request.generation, vec![variant("SKU-100")]));
    assert_eq!(resolver.candidates().len(), 1);

    resolver.on_query_input("   ");
    assert!(resolver.candidates().is_empty());
    assert!(timeout(Duration::from_secs(1), rx.recv()).await.is_err());
}

#[tokio::test(start_paused = true)]
async fn stale_results_are_dropped() {
    let (mut resolver, mut rx) = VariantResolver::new(None);
    resolver.on_query_input("shirt");
    let first = timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("debounce should fire")
        .expect("channel open");

    resolver.on_query_input("shorts");
    let second = timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("debounce should fire")
        .expect("channel open");
    assert!(second.generation > first.generation);

    // Results for the superseded query arrive late and change nothing
    assert!(!resolver.deliver_results(first.generation, vec![variant("SKU-100")]));
    assert!(resolver.candidates().is_empty());

    assert!(resolver.deliver_results(second.generation, vec![variant("SKU-200")]));
    assert_eq!(resolver.candidates()[0].sku, "SKU-200");
}

#[tokio::test(start_paused = true)]
async fn selection_wins_over_stale_field_text() {
    let (mut resolver, _rx) = VariantResolver::new(None);
    let chosen = Uuid::new_v4();
    resolver.select(chosen);
    assert_eq!(resolver.pending(), Some(chosen));

    // Stale token and SKU text are still sitting in the form fields
    let token = ScanToken::parse("OTHER-99*5").unwrap();
    let request = resolver
        .take_submission(Some(&token), "STALE-SKU", Some(3), None)
        .unwrap();
    assert_eq!(request.variant_id, Some(chosen));
    assert_eq!(request.barcode, None);
    assert_eq!(request.sku, None);
    assert_eq!(request.qty, Some(3));
}

#[tokio::test(start_paused = true)]
async fn selection_is_consumed_exactly_once() {
    let (mut resolver, _rx) = VariantResolver::new(None);
    resolver.select(Uuid::new_v4());

    let first = resolver.take_submission(None, "SKU-100", None, None).unwrap();
    assert!(first.variant_id.is_some());
    assert_eq!(resolver.pending(), None);

    // The next submit falls through to the SKU text
    let second = resolver.take_submission(None, "SKU-100", None, None).unwrap();
    assert_eq!(second.variant_id, None);
    assert_eq!(second.sku.as_deref(), Some("SKU-100"));
}

#[tokio::test(start_paused = true)]
async fn embedded_multiplier_overrides_the_qty_field() {
    let (mut resolver, _rx) = VariantResolver::new(None);

    let token = ScanToken::parse("8801234*5").unwrap();
    let request = resolver
        .take_submission(Some(&token), "", Some(2), None)
        .unwrap();
    assert_eq!(request.barcode.as_deref(), Some("8801234"));
    assert_eq!(request.qty, Some(5));

    let plain = ScanToken::parse("8801234").unwrap();
    let request = resolver
        .take_submission(Some(&plain), "", Some(2), None)
        .unwrap();
    assert_eq!(request.qty, Some(2));
}

#[tokio::test(start_paused = true)]
async fn nothing_to_submit_is_an_error() {
    let (mut resolver, _rx) = VariantResolver::new(None);
    let result = resolver.take_submission(None, "   ", Some(1), None);
    assert!(matches!(result, Err(ClientError::MissingIdentifier)));
}

#[tokio::test(start_paused = true)]
async fn selection_cancels_the_armed_debounce() {
    let (mut resolver, mut rx) = VariantResolver::new(None);
    resolver.on_query_input("shirt");
    resolver.select(Uuid::new_v4());

    // No search fires once the user has picked a candidate
    assert!(timeout(Duration::from_secs(1), rx.recv()).await.is_err());
}
