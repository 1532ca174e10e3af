use crate::reject;
use crate::services::is_unique_violation;
use crate::services::user::SummaryRow;
use crate::utils::Paging;
use chrono::{DateTime, Utc};
use common::errors::ApiError;
use common::payloads::RoomFilter;
use common::{Amenity, Room, UserSummary, MAX_CAPACITY, MIN_CAPACITY};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use uuid::Uuid;

const ROOM_COLUMNS: &str = "id, room_number, floor, capacity, current_occupancy, room_type, \
                            amenities, monthly_rent, is_active, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct RoomRow {
    id: Uuid,
    room_number: String,
    floor: i32,
    capacity: i32,
    current_occupancy: i32,
    room_type: String,
    amenities: String,
    monthly_rent: f64,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RoomRow {
    fn into_room(self, residents: Vec<UserSummary>) -> anyhow::Result<Room> {
        Ok(Room {
            id: self.id,
            room_number: self.room_number,
            floor: self.floor,
            capacity: self.capacity,
            current_occupancy: self.current_occupancy,
            room_type: self.room_type.parse()?,
            amenities: serde_json::from_str(&self.amenities)?,
            monthly_rent: self.monthly_rent,
            is_active: self.is_active,
            residents,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Checks the admin-editable fields and normalizes them in place.
///
/// Occupancy is not compared against capacity; an admin may
/// shrink a room below its current head count.
pub fn validate(room: &mut Room) -> Result<(), ApiError> {
    room.room_number = room.room_number.trim().to_string();

    let mut amenities: Vec<Amenity> = Vec::with_capacity(room.amenities.len());
    for amenity in room.amenities.drain(..) {
        if !amenities.contains(&amenity) {
            amenities.push(amenity);
        }
    }
    room.amenities = amenities;

    if room.room_number.is_empty() {
        return Err(ApiError::bad_request("Room number is required"));
    }
    if room.floor < 0 {
        return Err(ApiError::bad_request("Floor cannot be negative"));
    }
    if !(MIN_CAPACITY..=MAX_CAPACITY).contains(&room.capacity) {
        return Err(ApiError::bad_request(&format!(
            "Capacity must be between {} and {}",
            MIN_CAPACITY, MAX_CAPACITY
        )));
    }
    if !room.monthly_rent.is_finite() || room.monthly_rent < 0.0 {
        return Err(ApiError::bad_request(
            "Monthly rent must be a non-negative number",
        ));
    }
    Ok(())
}

pub async fn create(db: &mut SqliteConnection, mut room: Room) -> anyhow::Result<Room> {
    validate(&mut room)?;

    let result = sqlx::query(
        "
            insert into rooms(id, room_number, floor, capacity, current_occupancy, room_type,
                              amenities, monthly_rent, is_active, created_at, updated_at)
            values (?, ?, ?, ?, 0, ?, ?, ?, ?, ?, ?);
        ",
    )
    .bind(room.id)
    .bind(&room.room_number)
    .bind(room.floor)
    .bind(room.capacity)
    .bind(room.room_type.as_str())
    .bind(serde_json::to_string(&room.amenities)?)
    .bind(room.monthly_rent)
    .bind(room.is_active)
    .bind(room.created_at)
    .bind(room.updated_at)
    .execute(&mut *db)
    .await;

    match result {
        Ok(_) => {
            log::info!("created room {} on floor {}", room.room_number, room.floor);
            room.current_occupancy = 0;
            room.residents = Vec::new();
            Ok(room)
        }
        Err(e) if is_unique_violation(&e, "rooms.room_number") => {
            reject!("Room number already exists")
        }
        Err(e) => Err(anyhow::Error::from(e)),
    }
}

pub async fn get(db: &mut SqliteConnection, id: Uuid) -> anyhow::Result<Option<Room>> {
    let row = sqlx::query_as::<_, RoomRow>(&format!(
        "select {} from rooms where id = ?;",
        ROOM_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&mut *db)
    .await?;

    match row {
        Some(row) => {
            let residents = residents(&mut *db, row.id).await?;
            Ok(Some(row.into_room(residents)?))
        }
        None => Ok(None),
    }
}

pub async fn residents(db: &mut SqliteConnection, room: Uuid) -> anyhow::Result<Vec<UserSummary>> {
    let rows = sqlx::query_as::<_, SummaryRow>(
        "
            select u.id, u.name, u.email, u.student_id, u.phone
            from room_residents
                     join users u on u.id = room_residents.user_id
            where room_residents.room_id = ?
            order by room_residents.joined_at, u.name;
        ",
    )
    .bind(room)
    .fetch_all(db)
    .await?;

    Ok(rows.into_iter().map(UserSummary::from).collect())
}

fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, filter: &RoomFilter) {
    builder.push(" where is_active = 1");
    if filter.available == Some(true) {
        builder.push(" and current_occupancy < capacity");
    }
    if let Some(room_type) = filter.room_type {
        builder.push(" and room_type = ").push_bind(room_type.as_str());
    }
    if let Some(floor) = filter.floor {
        builder.push(" and floor = ").push_bind(floor);
    }
}

/// Active rooms matching `filter`, ordered by floor then room number.
pub async fn list(
    db: &mut SqliteConnection,
    filter: &RoomFilter,
    paging: Paging,
) -> anyhow::Result<(Vec<Room>, i64)> {
    let mut count = QueryBuilder::<Sqlite>::new("select count(*) from rooms");
    push_filters(&mut count, filter);
    let total = count.build_query_scalar::<i64>().fetch_one(&mut *db).await?;

    let mut query = QueryBuilder::<Sqlite>::new(format!("select {} from rooms", ROOM_COLUMNS));
    push_filters(&mut query, filter);
    query
        .push(" order by floor, room_number limit ")
        .push_bind(paging.limit)
        .push(" offset ")
        .push_bind(paging.offset());

    let rows = query.build_query_as::<RoomRow>().fetch_all(&mut *db).await?;

    let mut rooms = Vec::with_capacity(rows.len());
    for row in rows {
        let residents = residents(&mut *db, row.id).await?;
        rooms.push(row.into_room(residents)?);
    }

    Ok((rooms, total))
}

pub async fn count_active(db: &mut SqliteConnection) -> anyhow::Result<i64> {
    Ok(
        sqlx::query_scalar::<_, i64>("select count(*) from rooms where is_active = 1;")
            .fetch_one(db)
            .await?,
    )
}

/// Overwrites the admin-editable fields. Occupancy and residents are left
/// exactly as they are.
pub async fn update(db: &mut SqliteConnection, mut room: Room) -> anyhow::Result<Room> {
    validate(&mut room)?;

    let result = sqlx::query(
        "
            update rooms
            set room_number  = ?,
                floor        = ?,
                capacity     = ?,
                room_type    = ?,
                amenities    = ?,
                monthly_rent = ?,
                is_active    = ?,
                updated_at   = ?
            where id = ?;
        ",
    )
    .bind(&room.room_number)
    .bind(room.floor)
    .bind(room.capacity)
    .bind(room.room_type.as_str())
    .bind(serde_json::to_string(&room.amenities)?)
    .bind(room.monthly_rent)
    .bind(room.is_active)
    .bind(Utc::now())
    .bind(room.id)
    .execute(&mut *db)
    .await;

    match result {
        Ok(_) => {}
        Err(e) if is_unique_violation(&e, "rooms.room_number") => {
            reject!("Room number already exists")
        }
        Err(e) => return Err(anyhow::Error::from(e)),
    }

    get(db, room.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Room not found").into())
}

/// Takes one seat if the room is active and not full. Returns whether a
/// seat was taken.
pub async fn reserve_seat(db: &mut SqliteConnection, room: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query(
        "
            update rooms
            set current_occupancy = current_occupancy + 1,
                updated_at        = ?
            where id = ?
              and is_active = 1
              and current_occupancy < capacity;
        ",
    )
    .bind(Utc::now())
    .bind(room)
    .execute(db)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Gives one seat back. Returns false if occupancy was already zero.
pub async fn release_seat(db: &mut SqliteConnection, room: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query(
        "
            update rooms
            set current_occupancy = current_occupancy - 1,
                updated_at        = ?
            where id = ?
              and current_occupancy > 0;
        ",
    )
    .bind(Utc::now())
    .bind(room)
    .execute(db)
    .await?;

    Ok(result.rows_affected() == 1)
}

pub async fn add_resident(db: &mut SqliteConnection, room: Uuid, user: Uuid) -> anyhow::Result<()> {
    sqlx::query(
        "
            insert into room_residents(room_id, user_id, joined_at)
            values (?, ?, ?)
            on conflict do nothing;
        ",
    )
    .bind(room)
    .bind(user)
    .bind(Utc::now())
    .execute(db)
    .await?;

    Ok(())
}

pub async fn remove_resident(
    db: &mut SqliteConnection,
    room: Uuid,
    user: Uuid,
) -> anyhow::Result<bool> {
    let result = sqlx::query("delete from room_residents where room_id = ? and user_id = ?;")
        .bind(room)
        .bind(user)
        .execute(db)
        .await?;

    Ok(result.rows_affected() == 1)
}
