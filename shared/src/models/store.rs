//! Store reference data
//!
//! Stores are tenant-owned, immutable reference data. The count
//! subsystem looks them up and never mutates them.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A physical retail location
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Store {
    pub id: Uuid,
    pub code: String,
    pub name: String,
}
