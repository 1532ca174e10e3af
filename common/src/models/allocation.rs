use crate::models::{string_enum, Room, RoomSummary, UserSummary};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllocationStatus {
    Active,
    Vacated,
    Suspended,
}

string_enum!(AllocationStatus, "allocation status", {
    Active => "active",
    Vacated => "vacated",
    Suspended => "suspended",
});

impl AllocationStatus {
    /// Whether an allocation in this status occupies a seat in its room.
    pub fn holds_seat(&self) -> bool {
        matches!(self, AllocationStatus::Active | AllocationStatus::Suspended)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Allocation {
    pub id: Uuid,
    pub student: UserSummary,
    pub room: RoomSummary,
    pub allocated_by: UserSummary,
    pub allocated_date: DateTime<Utc>,
    pub status: AllocationStatus,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    /// Rent agreed at allocation time; later room rent changes don't apply.
    pub monthly_rent: f64,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PartialEq for Allocation {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

/// A student's view of their own allocation.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MyAllocation {
    #[serde(flatten)]
    pub allocation: Allocation,
    pub room_details: Room,
    pub roommates: Vec<UserSummary>,
}
