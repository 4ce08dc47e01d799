//! Shared types and domain logic for the POS Retail Suite
//!
//! This crate contains the cycle-count domain model and scan-input
//! interpretation shared between the backend server and the count
//! terminal client. Everything here is pure: no I/O, no async.

pub mod models;
pub mod scan;
pub mod types;

pub use models::*;
pub use scan::*;
pub use types::*;
