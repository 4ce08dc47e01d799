//! Finalize reconciliation tests
//!
//! Reconciliation is a deterministic fold over the session's lines:
//! delta = counted - expected (unknown expected counts as 0), only
//! nonzero deltas become adjustments, and the summary partitions every
//! line into adjusted or zero.

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use uuid::Uuid;

use shared::{CountLine, CountMethod, CountSession, SessionStatus};

fn line(expected: Option<i64>, counted: i64) -> CountLine {
    let n = Uuid::new_v4();
    CountLine {
        id: Uuid::new_v4(),
        variant_id: n,
        sku: format!("SKU-{}", n.simple()),
        product_name: "Test Product".to_string(),
        expected_qty: expected,
        counted_qty: counted,
        method: CountMethod::Scan,
        location: None,
    }
}

fn session_with(lines: Vec<CountLine>) -> CountSession {
    CountSession {
        id: Uuid::new_v4(),
        code: "CNT-D4E5F6".to_string(),
        status: SessionStatus::InProgress,
        note: None,
        store_id: Uuid::new_v4(),
        store_code: "MAIN".to_string(),
        store_name: "Main Street".to_string(),
        created_at: Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap(),
        started_at: Some(Utc.with_ymd_and_hms(2024, 1, 15, 9, 5, 0).unwrap()),
        finalized_at: None,
        lines,
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// A matched line produces no adjustment; a surplus produces one
    #[test]
    fn test_mixed_match_and_surplus() {
        let matched = line(Some(10), 10);
        let surplus = line(Some(5), 8);
        let surplus_variant = surplus.variant_id;
        let session = session_with(vec![matched, surplus]);

        let (adjustments, summary) = session.reconcile();
        assert_eq!(summary.adjusted, 1);
        assert_eq!(summary.zero, 1);
        assert_eq!(adjustments.len(), 1);
        assert_eq!(adjustments[0].variant_id, surplus_variant);
        assert_eq!(adjustments[0].qty_delta, 3);
    }

    /// An unknown expected snapshot reconciles as if it were zero
    #[test]
    fn test_unknown_expected_counts_as_zero() {
        let session = session_with(vec![line(None, 4)]);
        let (adjustments, _) = session.reconcile();
        assert_eq!(adjustments[0].qty_delta, 4);
    }

    /// Shrinkage yields a negative adjustment
    #[test]
    fn test_shrinkage_is_negative() {
        let session = session_with(vec![line(Some(7), 0)]);
        let (adjustments, summary) = session.reconcile();
        assert_eq!(summary.adjusted, 1);
        assert_eq!(adjustments[0].qty_delta, -7);
    }

    /// Reconcile never mutates the session
    #[test]
    fn test_reconcile_is_read_only() {
        let session = session_with(vec![line(Some(2), 9), line(None, 0)]);
        let before = session.clone();
        let _ = session.reconcile();
        assert_eq!(session, before);
    }

    /// A session with no lines finalizes cleanly with an empty summary
    #[test]
    fn test_zero_line_finalize() {
        let mut session = session_with(vec![]);
        let now = Utc::now();

        let (adjustments, summary) = session.finalize(now).unwrap();
        assert!(adjustments.is_empty());
        assert_eq!(summary.adjusted, 0);
        assert_eq!(summary.zero, 0);
        assert_eq!(session.status, SessionStatus::Finalized);
        assert_eq!(session.finalized_at, Some(now));
    }

    /// Finalize returns exactly what reconcile computed
    #[test]
    fn test_finalize_matches_reconcile() {
        let mut session = session_with(vec![
            line(Some(10), 10),
            line(Some(5), 8),
            line(None, 2),
            line(Some(3), 0),
        ]);

        let (expected_adjustments, expected_summary) = session.reconcile();
        let (adjustments, summary) = session.finalize(Utc::now()).unwrap();
        assert_eq!(adjustments, expected_adjustments);
        assert_eq!(summary, expected_summary);
    }
}

// ============================================================================
// Property Tests
// ============================================================================

mod property_tests {
    use super::*;

    fn arb_line() -> impl Strategy<Value = CountLine> {
        (prop::option::of(0i64..=1_000), 0i64..=1_000)
            .prop_map(|(expected, counted)| line(expected, counted))
    }

    proptest! {
        /// Every line lands in exactly one summary bucket
        #[test]
        fn prop_summary_partitions_lines(lines in prop::collection::vec(arb_line(), 0..40)) {
            let session = session_with(lines.clone());
            let (adjustments, summary) = session.reconcile();

            prop_assert_eq!(
                (summary.adjusted + summary.zero) as usize,
                lines.len()
            );
            prop_assert_eq!(adjustments.len(), summary.adjusted as usize);
        }

        /// Adjustments are exactly the nonzero line deltas
        #[test]
        fn prop_adjustments_are_nonzero_deltas(lines in prop::collection::vec(arb_line(), 0..40)) {
            let session = session_with(lines);
            let (adjustments, _) = session.reconcile();

            for adjustment in &adjustments {
                prop_assert_ne!(adjustment.qty_delta, 0);
                let source = session
                    .lines
                    .iter()
                    .find(|l| l.variant_id == adjustment.variant_id)
                    .unwrap();
                prop_assert_eq!(adjustment.qty_delta, source.delta());
            }
        }

        /// The net of all adjustments equals the net of all line deltas
        #[test]
        fn prop_net_adjustment_matches_net_delta(lines in prop::collection::vec(arb_line(), 0..40)) {
            let session = session_with(lines);
            let (adjustments, _) = session.reconcile();

            let net_adjusted: i64 = adjustments.iter().map(|a| a.qty_delta).sum();
            let net_delta: i64 = session.lines.iter().map(|l| l.delta()).sum();
            prop_assert_eq!(net_adjusted, net_delta);
        }

        /// Reconcile is deterministic
        #[test]
        fn prop_reconcile_deterministic(lines in prop::collection::vec(arb_line(), 0..40)) {
            let session = session_with(lines);
            prop_assert_eq!(session.reconcile(), session.reconcile());
        }
    }
}
