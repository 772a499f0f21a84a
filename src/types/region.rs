//! Region reference data
//!
//! Read-only from the lifecycle engine's perspective. The region code is a
//! stable external identifier embedded in tracking ids.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Region {
    pub id: String,
    /// Stable external code, e.g. "2100"
    pub code: String,
    pub name: String,
}
