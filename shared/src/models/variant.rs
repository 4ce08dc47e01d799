//! Catalog variant reference
//!
//! Variants are owned by the catalog service; this subsystem only reads
//! them by id, SKU, or barcode.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Upper bound on catalog search candidates returned to the terminal
pub const SEARCH_RESULT_LIMIT: u32 = 8;

/// A specific purchasable unit of a product
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Variant {
    pub id: Uuid,
    pub sku: String,
    pub barcode: Option<String>,
    pub product_name: String,
}
