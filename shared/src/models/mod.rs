//! Domain models for the cycle-count subsystem

pub mod count;
pub mod ledger;
pub mod store;
pub mod variant;

pub use count::*;
pub use ledger::*;
pub use store::*;
pub use variant::*;
