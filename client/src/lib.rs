//! Count-terminal client library for the POS Retail Suite
//!
//! Client-side pieces of the cycle-count workflow: the HTTP API client,
//! the timer-driven scan-field classifier, and the variant resolver
//! with its debounced search and single-slot pending selection.
//!
//! The server's returned session snapshot is always the source of
//! truth: after any failed call the caller should re-fetch the session
//! instead of trusting local state, and scan calls must never be
//! auto-retried because each one is an add.

pub mod api;
pub mod classifier;
pub mod error;
pub mod resolver;

pub use api::CountApi;
pub use classifier::{ScanField, SubmitSignal};
pub use error::{ClientError, ClientResult};
pub use resolver::{run_search_worker, SearchRequest, VariantResolver};
