use crate::models::{AllocationStatus, Amenity, Role, RoomType, User};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Self-service sign up; always creates a student.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Register {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub student_id: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    #[serde(default)]
    pub student_id: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Fields left out are kept as they are.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUser {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub student_id: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoom {
    pub room_number: String,
    pub floor: i32,
    pub capacity: i32,
    pub room_type: RoomType,
    #[serde(default)]
    pub amenities: Vec<Amenity>,
    pub monthly_rent: f64,
}

/// Blind replace of the given fields; occupancy and residents are never
/// touched.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRoom {
    #[serde(default)]
    pub room_number: Option<String>,
    #[serde(default)]
    pub floor: Option<i32>,
    #[serde(default)]
    pub capacity: Option<i32>,
    #[serde(default)]
    pub room_type: Option<RoomType>,
    #[serde(default)]
    pub amenities: Option<Vec<Amenity>>,
    #[serde(default)]
    pub monthly_rent: Option<f64>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAllocation {
    pub student_id: Uuid,
    pub room_id: Uuid,
    pub start_date: NaiveDate,
    pub monthly_rent: f64,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAllocation {
    pub status: AllocationStatus,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomFilter {
    #[serde(default)]
    pub available: Option<bool>,
    #[serde(default)]
    pub room_type: Option<RoomType>,
    #[serde(default)]
    pub floor: Option<i32>,
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AllocationFilter {
    #[serde(default)]
    pub status: Option<AllocationStatus>,
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UserFilter {
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
}
