//! Variant resolution for the count form
//!
//! Bridges the asynchronous catalog search into the synchronous submit
//! path. The resolver owns a cancellable debounce timer for free-text
//! search, drops stale responses via a generation counter, and holds a
//! single-slot pending selection: picking a candidate records the
//! variant id synchronously, and the next submit consumes it exactly
//! once, winning over whatever stale text is still in the fields.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use uuid::Uuid;

use crate::api::CountApi;
use crate::error::{ClientError, ClientResult};
use shared::{ScanRequest, ScanToken, Variant, SEARCH_RESULT_LIMIT};

/// Debounce window for free-text catalog search
pub const SEARCH_DEBOUNCE_MS: u64 = 250;

/// A search the app layer should run against the API once the debounce
/// window has elapsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub store_id: Option<Uuid>,
    pub limit: u32,
    pub generation: u64,
}

/// Resolves user input to an authoritative variant reference
pub struct VariantResolver {
    store_id: Option<Uuid>,
    pending: Option<Uuid>,
    generation: u64,
    debounce: Option<JoinHandle<()>>,
    search_tx: mpsc::UnboundedSender<SearchRequest>,
    candidates: Vec<Variant>,
}

impl VariantResolver {
    /// Create a resolver scoped to the session's store (when known) and
    /// the receiver its debounced search requests arrive on
    pub fn new(store_id: Option<Uuid>) -> (Self, mpsc::UnboundedReceiver<SearchRequest>) {
        let (search_tx, search_rx) = mpsc::unbounded_channel();
        (
            Self {
                store_id,
                pending: None,
                generation: 0,
                debounce: None,
                search_tx,
                candidates: Vec::new(),
            },
            search_rx,
        )
    }

    /// Called on every edit of the free-text field. Cancels any armed
    /// debounce and arms a new one; only the latest query survives.
    pub fn on_query_input(&mut self, query: &str) {
        self.cancel_debounce();
        self.generation += 1;

        let query = query.trim().to_string();
        if query.is_empty() {
            self.candidates.clear();
            return;
        }

        let request = SearchRequest {
            query,
            store_id: self.store_id,
            limit: SEARCH_RESULT_LIMIT,
            generation: self.generation,
        };
        let tx = self.search_tx.clone();
        self.debounce = Some(tokio::spawn(async move {
            sleep(Duration::from_millis(SEARCH_DEBOUNCE_MS)).await;
            let _ = tx.send(request);
        }));
    }

    /// Deliver search results. Returns false (and changes nothing) when
    /// the results belong to a superseded query.
    pub fn deliver_results(&mut self, generation: u64, results: Vec<Variant>) -> bool {
        if generation != self.generation {
            return false;
        }
        self.candidates = results;
        true
    }

    /// Current search candidates
    pub fn candidates(&self) -> &[Variant] {
        &self.candidates
    }

    /// Record the user's candidate selection. Synchronous; takes
    /// priority over any later-arriving search results.
    pub fn select(&mut self, variant_id: Uuid) {
        self.pending = Some(variant_id);
        self.cancel_debounce();
    }

    /// The pending strong reference, if one is armed
    pub fn pending(&self) -> Option<Uuid> {
        self.pending
    }

    /// Build the scan submission. The pending selection is consumed
    /// exactly once, whether or not the resulting call succeeds.
    /// Precedence: pending variant id, then scanned barcode token, then
    /// SKU text; nothing at all fails with MissingIdentifier.
    pub fn take_submission(
        &mut self,
        scan_token: Option<&ScanToken>,
        sku_text: &str,
        qty_field: Option<i64>,
        location: Option<String>,
    ) -> ClientResult<ScanRequest> {
        let pending = self.pending.take();
        self.cancel_debounce();

        if let Some(variant_id) = pending {
            return Ok(ScanRequest {
                variant_id: Some(variant_id),
                qty: qty_field,
                location,
                ..Default::default()
            });
        }

        if let Some(token) = scan_token {
            if !token.code.trim().is_empty() {
                // An embedded multiplier overrides the quantity field
                return Ok(ScanRequest {
                    barcode: Some(token.code.clone()),
                    qty: token.qty.or(qty_field),
                    location,
                    ..Default::default()
                });
            }
        }

        let sku = sku_text.trim();
        if !sku.is_empty() {
            return Ok(ScanRequest {
                sku: Some(sku.to_string()),
                qty: qty_field,
                location,
                ..Default::default()
            });
        }

        Err(ClientError::MissingIdentifier)
    }

    fn cancel_debounce(&mut self) {
        if let Some(handle) = self.debounce.take() {
            handle.abort();
        }
    }
}

impl Drop for VariantResolver {
    fn drop(&mut self) {
        self.cancel_debounce();
    }
}

/// Drive queued search requests against the API, forwarding each result
/// set with its generation so the resolver can drop stale ones. Search
/// failures are logged and skipped; they never block the form.
pub async fn run_search_worker(
    api: Arc<CountApi>,
    mut requests: mpsc::UnboundedReceiver<SearchRequest>,
    results: mpsc::UnboundedSender<(u64, Vec<Variant>)>,
) {
    while let Some(request) = requests.recv().await {
        match api
            .search_variants(&request.query, request.store_id, Some(request.limit))
            .await
        {
            Ok(found) => {
                let _ = results.send((request.generation, found));
            }
            Err(err) => {
                tracing::warn!(query = %request.query, error = %err, "variant search failed");
            }
        }
    }
}
