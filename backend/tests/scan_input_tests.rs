//! Scan-input interpretation tests
//!
//! Covers multiplier-token parsing and the burst-vs-typing classifier:
//! - embedded quantity multipliers (`ABC123*5`, `ABC123x5`)
//! - idle auto-submit for scanner bursts
//! - explicit Enter submission for manual typing

use proptest::prelude::*;

use shared::{ScanClassifier, ScanToken, IDLE_WINDOW_MS, MIN_AUTO_SUBMIT_LEN};

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Star separator splits code and quantity
    #[test]
    fn test_multiplier_star() {
        let token = ScanToken::parse("ABC123*5").unwrap();
        assert_eq!(token.code, "ABC123");
        assert_eq!(token.qty, Some(5));
    }

    /// Lowercase and uppercase x behave identically
    #[test]
    fn test_multiplier_x_both_cases() {
        let lower = ScanToken::parse("ABC123x5").unwrap();
        let upper = ScanToken::parse("ABC123X5").unwrap();
        assert_eq!(lower.code, "ABC123");
        assert_eq!(lower.qty, Some(5));
        assert_eq!(upper.code, "ABC123");
        assert_eq!(upper.qty, Some(5));
    }

    /// No separator: the token is the code, quantity falls back
    #[test]
    fn test_plain_token_falls_back_to_qty_field() {
        let token = ScanToken::parse("ABC123").unwrap();
        assert_eq!(token.code, "ABC123");
        assert_eq!(token.qty, None);
        assert_eq!(token.quantity_or(1), 1);
        assert_eq!(token.quantity_or(4), 4);
    }

    /// Multiplier digits are capped at three
    #[test]
    fn test_four_digit_suffix_is_not_a_multiplier() {
        let token = ScanToken::parse("ABC123*1234").unwrap();
        assert_eq!(token.code, "ABC123*1234");
        assert_eq!(token.qty, None);
    }

    /// A separator character inside the code is harmless
    #[test]
    fn test_separator_without_digit_suffix_is_verbatim() {
        let token = ScanToken::parse("AXLE-20").unwrap();
        assert_eq!(token.code, "AXLE-20");
        assert_eq!(token.qty, None);

        let token = ScanToken::parse("flexi").unwrap();
        assert_eq!(token.code, "flexi");
        assert_eq!(token.qty, None);
    }

    /// Embedded multiplier wins over the quantity field
    #[test]
    fn test_multiplier_overrides_fallback() {
        let token = ScanToken::parse("SKU-100*2").unwrap();
        assert_eq!(token.quantity_or(9), 2);
    }

    /// Blank input never produces a token
    #[test]
    fn test_blank_input_yields_nothing() {
        assert_eq!(ScanToken::parse(""), None);
        assert_eq!(ScanToken::parse("   "), None);
        assert_eq!(ScanToken::parse("\t\n"), None);
    }

    /// Surrounding whitespace is trimmed before parsing
    #[test]
    fn test_whitespace_trimmed() {
        let token = ScanToken::parse("  ABC123*3  ").unwrap();
        assert_eq!(token.code, "ABC123");
        assert_eq!(token.qty, Some(3));
    }

    /// A six-character burst auto-submits once the idle window elapses
    #[test]
    fn test_idle_auto_submit_fires_once() {
        let mut classifier = ScanClassifier::new();
        for (i, c) in "ABC123".chars().enumerate() {
            classifier.on_key(c, (i as u64) * 10);
        }
        // Last keystroke at 50ms; window has not elapsed yet
        assert_eq!(classifier.on_idle(60), None);
        assert_eq!(classifier.on_idle(149), None);
        // Window elapsed: exactly one submission
        assert_eq!(classifier.on_idle(150), Some("ABC123".to_string()));
        assert_eq!(classifier.on_idle(300), None);
        assert_eq!(classifier.value(), "");
    }

    /// Five characters never auto-submit, however long the idle
    #[test]
    fn test_short_value_never_auto_submits() {
        let mut classifier = ScanClassifier::new();
        for (i, c) in "ABC12".chars().enumerate() {
            classifier.on_key(c, (i as u64) * 10);
        }
        assert_eq!(classifier.on_idle(10_000), None);
        // But Enter still submits it
        assert_eq!(classifier.on_enter(), Some("ABC12".to_string()));
    }

    /// Enter on a blank field does nothing
    #[test]
    fn test_enter_on_blank_field() {
        let mut classifier = ScanClassifier::new();
        assert_eq!(classifier.on_enter(), None);
        classifier.on_key(' ', 0);
        assert_eq!(classifier.on_enter(), None);
    }

    /// A whole-value edit behaves like typing
    #[test]
    fn test_set_value_then_idle() {
        let mut classifier = ScanClassifier::new();
        classifier.set_value("SKU-100*2", 40);
        assert_eq!(classifier.on_idle(139), None);
        assert_eq!(classifier.on_idle(140), Some("SKU-100*2".to_string()));
    }

    /// The deadline is only reported for auto-submit-eligible values
    #[test]
    fn test_idle_deadline() {
        let mut classifier = ScanClassifier::new();
        assert_eq!(classifier.idle_deadline(), None);
        classifier.set_value("ABC12", 50);
        assert_eq!(classifier.idle_deadline(), None);
        classifier.on_key('3', 70);
        assert_eq!(classifier.idle_deadline(), Some(70 + IDLE_WINDOW_MS));
    }
}

// ============================================================================
// Property Tests
// ============================================================================

mod property_tests {
    use super::*;

    proptest! {
        /// Any code + separator + 1-3 digits splits back into its parts
        #[test]
        fn prop_multiplier_roundtrip(
            code in "[A-Z0-9-]{1,12}",
            sep in prop::sample::select(vec!['x', 'X', '*']),
            qty in 1i64..=999,
        ) {
            let raw = format!("{}{}{}", code, sep, qty);
            let token = ScanToken::parse(&raw).unwrap();
            prop_assert_eq!(token.code, code);
            prop_assert_eq!(token.qty, Some(qty));
        }

        /// Tokens without separator characters parse verbatim
        #[test]
        fn prop_plain_tokens_verbatim(raw in "[a-wyz0-9-]{1,20}") {
            let token = ScanToken::parse(&raw).unwrap();
            prop_assert_eq!(token.code, raw);
            prop_assert_eq!(token.qty, None);
        }

        /// Eligible bursts submit exactly once, and the submission
        /// carries the full buffer
        #[test]
        fn prop_burst_submits_exactly_once(len in MIN_AUTO_SUBMIT_LEN..=20usize) {
            let value: String = std::iter::repeat('A').take(len).collect();
            let mut classifier = ScanClassifier::new();
            let mut last = 0u64;
            for (i, c) in value.chars().enumerate() {
                last = (i as u64) * 10;
                classifier.on_key(c, last);
                // Polling mid-burst never fires
                prop_assert_eq!(classifier.on_idle(last + IDLE_WINDOW_MS - 1), None);
            }

            let mut submissions = 0;
            for at in (last..last + 3 * IDLE_WINDOW_MS).step_by(10) {
                if classifier.on_idle(at).is_some() {
                    submissions += 1;
                }
            }
            prop_assert_eq!(submissions, 1);
        }

        /// Sub-threshold buffers never fire regardless of polling
        #[test]
        fn prop_short_bursts_never_fire(len in 1usize..MIN_AUTO_SUBMIT_LEN) {
            let value: String = std::iter::repeat('7').take(len).collect();
            let mut classifier = ScanClassifier::new();
            for (i, c) in value.chars().enumerate() {
                classifier.on_key(c, i as u64);
            }
            for at in 0..2_000u64 {
                prop_assert_eq!(classifier.on_idle(at), None);
            }
        }
    }
}
