//! Timer driver for the scan-input classifier
//!
//! The pure burst-vs-typing rules live in `shared::scan`; this wraps
//! them with the actual idle timer. Every keystroke re-arms a
//! cancellable tokio timer; when the idle window elapses on an eligible
//! value, exactly one submission is emitted on the channel. Enter
//! bypasses the timer entirely.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Duration, Instant};

use shared::{ScanClassifier, ScanToken, SubmitReason};

/// One submission produced by the scan field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitSignal {
    pub token: ScanToken,
    pub reason: SubmitReason,
}

/// A scan input field with its idle auto-submit timer
pub struct ScanField {
    classifier: Arc<Mutex<ScanClassifier>>,
    tx: mpsc::UnboundedSender<SubmitSignal>,
    idle_task: Option<JoinHandle<()>>,
    origin: Instant,
}

impl ScanField {
    /// Create the field and the receiver its submissions arrive on
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SubmitSignal>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                classifier: Arc::new(Mutex::new(ScanClassifier::new())),
                tx,
                idle_task: None,
                origin: Instant::now(),
            },
            rx,
        )
    }

    /// Record a single keystroke, resetting the idle window
    pub fn keystroke(&mut self, c: char) {
        let now = self.now_ms();
        self.lock().on_key(c, now);
        self.rearm();
    }

    /// Replace the whole field value (edits, paste, UI binding)
    pub fn set_value(&mut self, value: &str) {
        let now = self.now_ms();
        self.lock().set_value(value, now);
        self.rearm();
    }

    /// Explicit Enter: submits any non-blank value immediately
    pub fn enter(&mut self) {
        self.cancel_idle();
        let submitted = self.lock().on_enter();
        if let Some(raw) = submitted {
            self.emit(&raw, SubmitReason::Enter);
        }
    }

    /// Current field value
    pub fn value(&self) -> String {
        self.lock().value().to_string()
    }

    /// Drop the current value without submitting
    pub fn clear(&mut self) {
        self.cancel_idle();
        self.lock().clear();
    }

    fn rearm(&mut self) {
        self.cancel_idle();

        let Some(deadline_ms) = self.lock().idle_deadline() else {
            return;
        };
        let classifier = Arc::clone(&self.classifier);
        let tx = self.tx.clone();
        let origin = self.origin;
        let deadline = origin + Duration::from_millis(deadline_ms);

        self.idle_task = Some(tokio::spawn(async move {
            sleep_until(deadline).await;
            let now_ms = origin.elapsed().as_millis() as u64;
            let submitted = classifier
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .on_idle(now_ms);
            if let Some(raw) = submitted {
                if let Some(token) = ScanToken::parse(&raw) {
                    let _ = tx.send(SubmitSignal {
                        token,
                        reason: SubmitReason::Idle,
                    });
                }
            }
        }));
    }

    fn emit(&self, raw: &str, reason: SubmitReason) {
        if let Some(token) = ScanToken::parse(raw) {
            let _ = self.tx.send(SubmitSignal { token, reason });
        }
    }

    fn cancel_idle(&mut self) {
        if let Some(handle) = self.idle_task.take() {
            handle.abort();
        }
    }

    fn lock(&self) -> MutexGuard<'_, ScanClassifier> {
        self.classifier.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

impl Drop for ScanField {
    fn drop(&mut self) {
        self.cancel_idle();
    }
}
