//! HTTP handlers for the POS Retail Suite

pub mod counts;
pub mod health;
pub mod stores;
pub mod variants;

pub use counts::*;
pub use health::*;
pub use stores::*;
pub use variants::*;
