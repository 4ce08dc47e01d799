//! Scan-input interpretation
//!
//! A single text field receives both hardware barcode-scanner bursts and
//! manual typing. The classifier decides which is which: a burst is a
//! value of at least [`MIN_AUTO_SUBMIT_LEN`] characters followed by
//! [`IDLE_WINDOW_MS`] of silence, and auto-submits; manual typing waits
//! for an explicit Enter. Scanned tokens may carry an embedded quantity
//! multiplier (`<code>x5`, `<code>X5`, `<code>*5`).
//!
//! Everything here is pure and idempotent; the timer that drives
//! [`ScanClassifier::on_idle`] lives in the client crate.

use serde::{Deserialize, Serialize};

/// Minimum field length for a burst to auto-submit
pub const MIN_AUTO_SUBMIT_LEN: usize = 6;

/// Idle window after the last keystroke before a burst auto-submits
pub const IDLE_WINDOW_MS: u64 = 100;

/// Separators recognized between code and quantity multiplier
pub const QTY_SEPARATORS: [char; 3] = ['x', 'X', '*'];

/// A submitted token split into lookup code and optional multiplier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanToken {
    pub code: String,
    /// Embedded quantity multiplier; None means fall back to the
    /// separately-entered quantity field (default 1)
    pub qty: Option<i64>,
}

impl ScanToken {
    /// Parse a submitted token. `<code>[x|X|*]<1-3 digits>` splits into
    /// code and quantity; anything else is used verbatim as the code.
    /// Empty or whitespace-only input yields None.
    pub fn parse(raw: &str) -> Option<ScanToken> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        if let Some(pos) = raw.rfind(&QTY_SEPARATORS[..]) {
            let (code, rest) = raw.split_at(pos);
            let digits = &rest[1..];
            if !code.is_empty()
                && (1..=3).contains(&digits.len())
                && digits.chars().all(|c| c.is_ascii_digit())
            {
                if let Ok(qty) = digits.parse::<i64>() {
                    return Some(ScanToken {
                        code: code.to_string(),
                        qty: Some(qty),
                    });
                }
            }
        }

        Some(ScanToken {
            code: raw.to_string(),
            qty: None,
        })
    }

    /// The effective quantity: the embedded multiplier when present,
    /// otherwise the caller's quantity-field value.
    pub fn quantity_or(&self, fallback: i64) -> i64 {
        self.qty.unwrap_or(fallback)
    }
}

/// Why a submission fired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitReason {
    /// Explicit Enter key; always submits, any length
    Enter,
    /// Scanner burst: long enough and idle for the full window
    Idle,
}

/// Pure burst-vs-typing state machine for one input field.
///
/// Feed it keystrokes with a caller-supplied millisecond clock and poll
/// [`on_idle`](Self::on_idle) when the idle deadline passes. At most one
/// auto-submit fires per burst because submission drains the buffer.
#[derive(Debug, Default, Clone)]
pub struct ScanClassifier {
    buffer: String,
    last_key_at: Option<u64>,
}

impl ScanClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a single keystroke at `at_ms`, resetting the idle window.
    pub fn on_key(&mut self, c: char, at_ms: u64) {
        self.buffer.push(c);
        self.last_key_at = Some(at_ms);
    }

    /// Replace the whole field value at `at_ms` (covers edits such as
    /// backspace, paste, or UI-level binding).
    pub fn set_value(&mut self, value: &str, at_ms: u64) {
        self.buffer.clear();
        self.buffer.push_str(value);
        self.last_key_at = Some(at_ms);
    }

    /// Explicit Enter: submits any non-blank value regardless of length
    /// or idle state.
    pub fn on_enter(&mut self) -> Option<String> {
        if self.buffer.trim().is_empty() {
            self.buffer.clear();
            self.last_key_at = None;
            return None;
        }
        self.last_key_at = None;
        Some(std::mem::take(&mut self.buffer))
    }

    /// Poll at `now_ms`. Fires the burst submission when the buffer is
    /// long enough and the idle window has elapsed; otherwise None.
    pub fn on_idle(&mut self, now_ms: u64) -> Option<String> {
        let last = self.last_key_at?;
        if self.buffer.trim().is_empty() {
            return None;
        }
        if self.buffer.chars().count() < MIN_AUTO_SUBMIT_LEN {
            return None;
        }
        if now_ms.saturating_sub(last) < IDLE_WINDOW_MS {
            return None;
        }
        self.last_key_at = None;
        Some(std::mem::take(&mut self.buffer))
    }

    /// When the next idle check should run, if the current value is
    /// eligible for auto-submit.
    pub fn idle_deadline(&self) -> Option<u64> {
        let last = self.last_key_at?;
        if self.buffer.trim().is_empty() || self.buffer.chars().count() < MIN_AUTO_SUBMIT_LEN {
            return None;
        }
        Some(last + IDLE_WINDOW_MS)
    }

    pub fn value(&self) -> &str {
        &self.buffer
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.last_key_at = None;
    }
}
