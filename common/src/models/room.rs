use crate::models::{string_enum, UserSummary};
use chrono::{DateTime, Utc};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use uuid::Uuid;

pub const MIN_CAPACITY: i32 = 1;
pub const MAX_CAPACITY: i32 = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomType {
    Single,
    Double,
    Triple,
    Quad,
}

string_enum!(RoomType, "room type", {
    Single => "single",
    Double => "double",
    Triple => "triple",
    Quad => "quad",
});

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Amenity {
    #[serde(rename = "AC")]
    Ac,
    #[serde(rename = "WiFi")]
    WiFi,
    #[serde(rename = "Attached Bathroom")]
    AttachedBathroom,
    #[serde(rename = "Study Table")]
    StudyTable,
    #[serde(rename = "Wardrobe")]
    Wardrobe,
    #[serde(rename = "Fan")]
    Fan,
}

string_enum!(Amenity, "amenity", {
    Ac => "AC",
    WiFi => "WiFi",
    AttachedBathroom => "Attached Bathroom",
    StudyTable => "Study Table",
    Wardrobe => "Wardrobe",
    Fan => "Fan",
});

/// Serializes with the derived `isAvailable` and `availableSpots` fields;
/// both are ignored when deserializing.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: Uuid,
    pub room_number: String,
    pub floor: i32,
    pub capacity: i32,
    pub current_occupancy: i32,
    pub room_type: RoomType,
    pub amenities: Vec<Amenity>,
    pub monthly_rent: f64,
    pub is_active: bool,
    /// Users currently holding a seat in this room.
    #[serde(default)]
    pub residents: Vec<UserSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Room {
    pub fn new(
        room_number: String,
        floor: i32,
        capacity: i32,
        room_type: RoomType,
        amenities: Vec<Amenity>,
        monthly_rent: f64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            room_number,
            floor,
            capacity,
            current_occupancy: 0,
            room_type,
            amenities,
            monthly_rent,
            is_active: true,
            residents: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_available(&self) -> bool {
        self.current_occupancy < self.capacity
    }

    /// Free seats; zero when an update shrank capacity below occupancy.
    pub fn available_spots(&self) -> i32 {
        (self.capacity - self.current_occupancy).max(0)
    }
}

impl Serialize for Room {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Room", 14)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("roomNumber", &self.room_number)?;
        state.serialize_field("floor", &self.floor)?;
        state.serialize_field("capacity", &self.capacity)?;
        state.serialize_field("currentOccupancy", &self.current_occupancy)?;
        state.serialize_field("roomType", &self.room_type)?;
        state.serialize_field("amenities", &self.amenities)?;
        state.serialize_field("monthlyRent", &self.monthly_rent)?;
        state.serialize_field("isActive", &self.is_active)?;
        state.serialize_field("residents", &self.residents)?;
        state.serialize_field("isAvailable", &self.is_available())?;
        state.serialize_field("availableSpots", &self.available_spots())?;
        state.serialize_field("createdAt", &self.created_at)?;
        state.serialize_field("updatedAt", &self.updated_at)?;
        state.end()
    }
}

impl PartialEq for Room {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub id: Uuid,
    pub room_number: String,
    pub floor: i32,
    pub room_type: RoomType,
}

impl From<&Room> for RoomSummary {
    fn from(room: &Room) -> Self {
        Self {
            id: room.id,
            room_number: room.room_number.clone(),
            floor: room.floor,
            room_type: room.room_type,
        }
    }
}
