use serde::{Deserialize, Serialize};

/// Admin dashboard totals.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_students: i64,
    pub total_rooms: i64,
    /// Active allocations only.
    pub total_allocations: i64,
    /// Sum of the monthly rent of active allocations.
    pub total_revenue: f64,
}
