//! Allocation records and the workflow that keeps rooms and students in
//! step with them.
//!
//! Every function that writes expects to run inside a transaction (see
//! [`crate::utils::transaction`]); a rejected step returns `Err` so the
//! caller rolls back everything written before it.

use crate::reject;
use crate::services::{self, is_unique_violation, non_blank};
use crate::utils::Paging;
use chrono::{DateTime, NaiveDate, Utc};
use common::errors::ApiError;
use common::payloads::{CreateAllocation, UpdateAllocation};
use common::{Allocation, AllocationStatus, Role, RoomSummary, User, UserSummary};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use uuid::Uuid;

const SELECT_ALLOCATION: &str = "
select allocations.id,
       allocations.status,
       allocations.allocated_date,
       allocations.start_date,
       allocations.end_date,
       allocations.monthly_rent,
       allocations.notes,
       allocations.created_at,
       allocations.updated_at,
       s.id         as student_id,
       s.name       as student_name,
       s.email      as student_email,
       s.student_id as student_student_id,
       s.phone      as student_phone,
       r.id         as room_id,
       r.room_number,
       r.floor      as room_floor,
       r.room_type,
       b.id         as admin_id,
       b.name       as admin_name,
       b.email      as admin_email,
       b.student_id as admin_student_id,
       b.phone      as admin_phone
from allocations
         join users s on s.id = allocations.student_id
         join rooms r on r.id = allocations.room_id
         join users b on b.id = allocations.allocated_by";

#[derive(sqlx::FromRow)]
struct AllocationRow {
    id: Uuid,
    status: String,
    allocated_date: DateTime<Utc>,
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
    monthly_rent: f64,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    student_id: Uuid,
    student_name: String,
    student_email: String,
    student_student_id: Option<String>,
    student_phone: Option<String>,
    room_id: Uuid,
    room_number: String,
    room_floor: i32,
    room_type: String,
    admin_id: Uuid,
    admin_name: String,
    admin_email: String,
    admin_student_id: Option<String>,
    admin_phone: Option<String>,
}

impl TryFrom<AllocationRow> for Allocation {
    type Error = anyhow::Error;

    fn try_from(row: AllocationRow) -> anyhow::Result<Self> {
        Ok(Allocation {
            id: row.id,
            student: UserSummary {
                id: row.student_id,
                name: row.student_name,
                email: row.student_email,
                student_id: row.student_student_id,
                phone: row.student_phone,
            },
            room: RoomSummary {
                id: row.room_id,
                room_number: row.room_number,
                floor: row.room_floor,
                room_type: row.room_type.parse()?,
            },
            allocated_by: UserSummary {
                id: row.admin_id,
                name: row.admin_name,
                email: row.admin_email,
                student_id: row.admin_student_id,
                phone: row.admin_phone,
            },
            allocated_date: row.allocated_date,
            status: row.status.parse()?,
            start_date: row.start_date,
            end_date: row.end_date,
            monthly_rent: row.monthly_rent,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// What a status change does to the room and the student.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    /// Same status again: only notes and end date may change.
    Unchanged,
    /// Status changes but the seat stays taken.
    Hold,
    /// The seat is given back and the student leaves the room.
    Release,
}

pub fn plan_transition(
    from: AllocationStatus,
    to: AllocationStatus,
) -> Result<Transition, ApiError> {
    use common::AllocationStatus::{Active, Vacated};

    match (from, to) {
        (from, to) if from == to => Ok(Transition::Unchanged),
        (Vacated, _) | (_, Active) => Err(ApiError::bad_request(&format!(
            "Invalid status transition from {} to {}",
            from, to
        ))),
        (from, to) if from.holds_seat() && !to.holds_seat() => Ok(Transition::Release),
        _ => Ok(Transition::Hold),
    }
}

pub async fn get(db: &mut SqliteConnection, id: Uuid) -> anyhow::Result<Option<Allocation>> {
    let row = sqlx::query_as::<_, AllocationRow>(&format!(
        "{} where allocations.id = ?;",
        SELECT_ALLOCATION
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;

    row.map(Allocation::try_from).transpose()
}

pub async fn active_for_student(
    db: &mut SqliteConnection,
    student: Uuid,
) -> anyhow::Result<Option<Allocation>> {
    let row = sqlx::query_as::<_, AllocationRow>(&format!(
        "{} where allocations.student_id = ? and allocations.status = ?;",
        SELECT_ALLOCATION
    ))
    .bind(student)
    .bind(AllocationStatus::Active.as_str())
    .fetch_optional(db)
    .await?;

    row.map(Allocation::try_from).transpose()
}

/// Newest first.
pub async fn list(
    db: &mut SqliteConnection,
    status: Option<AllocationStatus>,
    paging: Paging,
) -> anyhow::Result<(Vec<Allocation>, i64)> {
    let mut count = QueryBuilder::<Sqlite>::new("select count(*) from allocations");
    if let Some(status) = status {
        count.push(" where status = ").push_bind(status.as_str());
    }
    let total = count.build_query_scalar::<i64>().fetch_one(&mut *db).await?;

    let mut query = QueryBuilder::<Sqlite>::new(SELECT_ALLOCATION);
    if let Some(status) = status {
        query
            .push(" where allocations.status = ")
            .push_bind(status.as_str());
    }
    query
        .push(" order by allocations.created_at desc, allocations.rowid desc limit ")
        .push_bind(paging.limit)
        .push(" offset ")
        .push_bind(paging.offset());

    let allocations = query
        .build_query_as::<AllocationRow>()
        .fetch_all(&mut *db)
        .await?
        .into_iter()
        .map(Allocation::try_from)
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok((allocations, total))
}

/// Number of active allocations and the sum of their rent.
pub async fn active_totals(db: &mut SqliteConnection) -> anyhow::Result<(i64, f64)> {
    Ok(sqlx::query_as::<_, (i64, f64)>(
        "
            select count(*), coalesce(sum(monthly_rent), 0.0)
            from allocations
            where status = ?;
        ",
    )
    .bind(AllocationStatus::Active.as_str())
    .fetch_one(db)
    .await?)
}

/// Allocates a student to a room.
///
/// Preconditions are checked in order and reject with no writes: the
/// student exists and is a student, the room exists and is active, the room
/// has a free seat, the student holds no room yet. The writes that follow
/// are each guarded again, so a request that lost a race to a concurrent one
/// still fails cleanly.
pub async fn create(
    db: &mut SqliteConnection,
    data: CreateAllocation,
    admin: &User,
) -> anyhow::Result<Allocation> {
    if !data.monthly_rent.is_finite() || data.monthly_rent < 0.0 {
        reject!("Monthly rent must be a non-negative number");
    }

    let student = match services::user::get(&mut *db, data.student_id).await? {
        Some(student) if student.role == Role::Student => student,
        _ => reject!("Invalid student"),
    };

    let room = match services::room::get(&mut *db, data.room_id).await? {
        Some(room) if room.is_active => room,
        _ => reject!("Invalid or inactive room"),
    };

    if room.current_occupancy >= room.capacity {
        reject!("Room is full");
    }

    if student.room_allocation.is_some() {
        reject!("Student already has a room allocation");
    }

    let now = Utc::now();
    let id = Uuid::new_v4();

    let inserted = sqlx::query(
        "
            insert into allocations(id, student_id, room_id, allocated_by, allocated_date, status,
                                    start_date, end_date, monthly_rent, notes, created_at,
                                    updated_at)
            values (?, ?, ?, ?, ?, ?, ?, null, ?, ?, ?, ?);
        ",
    )
    .bind(id)
    .bind(student.id)
    .bind(room.id)
    .bind(admin.id)
    .bind(now)
    .bind(AllocationStatus::Active.as_str())
    .bind(data.start_date)
    .bind(data.monthly_rent)
    .bind(non_blank(data.notes))
    .bind(now)
    .bind(now)
    .execute(&mut *db)
    .await;

    match inserted {
        Ok(_) => {}
        Err(e) if is_unique_violation(&e, "allocations.student_id") => {
            reject!("Student already has a room allocation")
        }
        Err(e) => return Err(anyhow::Error::from(e)),
    }

    if !services::room::reserve_seat(&mut *db, room.id).await? {
        reject!("Room is full");
    }
    services::room::add_resident(&mut *db, room.id, student.id).await?;
    if !services::user::set_room_allocation(&mut *db, student.id, room.id).await? {
        reject!("Student already has a room allocation");
    }

    log::info!(
        "{} allocated {} to room {}",
        admin.email,
        student.email,
        room.room_number
    );

    get(db, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("allocation {} missing right after insert", id))
}

/// Moves an allocation to `data.status`, applying the room and student side
/// effects of the transition. Returns `None` if there's no such allocation.
pub async fn update_status(
    db: &mut SqliteConnection,
    id: Uuid,
    data: UpdateAllocation,
) -> anyhow::Result<Option<Allocation>> {
    let current = match get(&mut *db, id).await? {
        Some(allocation) => allocation,
        None => return Ok(None),
    };

    let transition = plan_transition(current.status, data.status)?;

    let end_date = match transition {
        Transition::Release => Some(data.end_date.unwrap_or_else(|| Utc::now().date_naive())),
        Transition::Unchanged | Transition::Hold => data.end_date,
    };

    // conditional on the status read above, so two concurrent vacates can't
    // both release the seat
    let updated = sqlx::query(
        "
            update allocations
            set status     = ?,
                end_date   = coalesce(?, end_date),
                notes      = coalesce(?, notes),
                updated_at = ?
            where id = ?
              and status = ?;
        ",
    )
    .bind(data.status.as_str())
    .bind(end_date)
    .bind(non_blank(data.notes))
    .bind(Utc::now())
    .bind(id)
    .bind(current.status.as_str())
    .execute(&mut *db)
    .await?;

    if updated.rows_affected() != 1 {
        reject!("Allocation was changed by another request, please retry");
    }

    if transition == Transition::Release {
        let student = current.student.id;
        let room = current.room.id;

        if !services::room::release_seat(&mut *db, room).await? {
            log::warn!(
                "room {} already had no occupants when allocation {} was vacated",
                current.room.room_number,
                id
            );
        }
        services::room::remove_resident(&mut *db, room, student).await?;
        services::user::clear_room_allocation(&mut *db, student, room).await?;

        log::info!(
            "{} vacated room {} ({})",
            current.student.email,
            current.room.room_number,
            data.status
        );
    }

    get(db, id).await
}
