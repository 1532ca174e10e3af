use crate::config::AdminSeed;
use crate::reject;
use crate::services::{is_unique_violation, non_blank};
use crate::utils::Paging;
use chrono::{DateTime, Utc};
use common::errors::ApiError;
use common::{Role, User, UserSummary};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use uuid::Uuid;

pub const MIN_PASSWORD_LEN: usize = 6;

const USER_COLUMNS: &str =
    "id, name, email, password, role, student_id, phone, room_allocation, created_at";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    password: String,
    role: String,
    student_id: Option<String>,
    phone: Option<String>,
    room_allocation: Option<Uuid>,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = anyhow::Error;

    fn try_from(row: UserRow) -> anyhow::Result<Self> {
        Ok(User {
            id: row.id,
            name: row.name,
            email: row.email,
            role: row.role.parse()?,
            student_id: row.student_id,
            phone: row.phone,
            password: row.password,
            room_allocation: row.room_allocation,
            created_at: row.created_at,
        })
    }
}

/// Columns of a [`UserSummary`], selected by joins elsewhere.
#[derive(sqlx::FromRow)]
pub(crate) struct SummaryRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub student_id: Option<String>,
    pub phone: Option<String>,
}

impl From<SummaryRow> for UserSummary {
    fn from(row: SummaryRow) -> Self {
        UserSummary {
            id: row.id,
            name: row.name,
            email: row.email,
            student_id: row.student_id,
            phone: row.phone,
        }
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Checks and normalizes the editable profile fields in place.
pub fn validate_profile(user: &mut User) -> Result<(), ApiError> {
    user.name = user.name.trim().to_string();
    user.email = normalize_email(&user.email);
    user.student_id = non_blank(user.student_id.take());
    user.phone = non_blank(user.phone.take());

    if user.name.is_empty() {
        return Err(ApiError::bad_request("Name is required"));
    }
    let valid_email = match user.email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.'),
        None => false,
    };
    if !valid_email {
        return Err(ApiError::bad_request("Please provide a valid email"));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::bad_request(&format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

/// Inserts `user`, whose `password` must already be hashed.
pub async fn create(db: &mut SqliteConnection, mut user: User) -> anyhow::Result<User> {
    validate_profile(&mut user)?;

    let result = sqlx::query(
        "
            insert into users(id, name, email, password, role, student_id, phone, created_at)
            values (?, ?, ?, ?, ?, ?, ?, ?);
        ",
    )
    .bind(user.id)
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.password)
    .bind(user.role.as_str())
    .bind(&user.student_id)
    .bind(&user.phone)
    .bind(user.created_at)
    .execute(&mut *db)
    .await;

    match result {
        Ok(_) => {
            log::info!("created {} account {}", user.role, user.email);
            Ok(user)
        }
        Err(e) if is_unique_violation(&e, "users.email") => reject!("User already exists"),
        Err(e) => Err(anyhow::Error::from(e)),
    }
}

pub async fn get(db: &mut SqliteConnection, id: Uuid) -> anyhow::Result<Option<User>> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "select {} from users where id = ?;",
        USER_COLUMNS
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;

    row.map(User::try_from).transpose()
}

pub async fn get_by_email(db: &mut SqliteConnection, email: &str) -> anyhow::Result<Option<User>> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "select {} from users where email = ?;",
        USER_COLUMNS
    ))
    .bind(normalize_email(email))
    .fetch_optional(db)
    .await?;

    row.map(User::try_from).transpose()
}

fn push_role_filter(builder: &mut QueryBuilder<'_, Sqlite>, role: Option<Role>) {
    if let Some(role) = role {
        builder.push(" where role = ").push_bind(role.as_str());
    }
}

pub async fn list(
    db: &mut SqliteConnection,
    role: Option<Role>,
    paging: Paging,
) -> anyhow::Result<(Vec<User>, i64)> {
    let mut count = QueryBuilder::<Sqlite>::new("select count(*) from users");
    push_role_filter(&mut count, role);
    let total: i64 = count.build_query_scalar::<i64>().fetch_one(&mut *db).await?;

    let mut query = QueryBuilder::<Sqlite>::new(format!("select {} from users", USER_COLUMNS));
    push_role_filter(&mut query, role);
    query
        .push(" order by name, email limit ")
        .push_bind(paging.limit)
        .push(" offset ")
        .push_bind(paging.offset());

    let users = query
        .build_query_as::<UserRow>()
        .fetch_all(&mut *db)
        .await?
        .into_iter()
        .map(User::try_from)
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok((users, total))
}

pub async fn count_by_role(db: &mut SqliteConnection, role: Role) -> anyhow::Result<i64> {
    Ok(
        sqlx::query_scalar::<_, i64>("select count(*) from users where role = ?;")
            .bind(role.as_str())
            .fetch_one(db)
            .await?,
    )
}

/// Writes the profile fields. Role, password and room allocation are not
/// editable here.
pub async fn update(db: &mut SqliteConnection, mut user: User) -> anyhow::Result<User> {
    validate_profile(&mut user)?;

    let result = sqlx::query(
        "
            update users
            set name       = ?,
                email      = ?,
                student_id = ?,
                phone      = ?
            where id = ?;
        ",
    )
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.student_id)
    .bind(&user.phone)
    .bind(user.id)
    .execute(&mut *db)
    .await;

    match result {
        Ok(_) => {}
        Err(e) if is_unique_violation(&e, "users.email") => reject!("User already exists"),
        Err(e) => return Err(anyhow::Error::from(e)),
    }

    get(db, user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found").into())
}

/// Points the user at `room`, unless they already hold one.
pub async fn set_room_allocation(
    db: &mut SqliteConnection,
    user: Uuid,
    room: Uuid,
) -> anyhow::Result<bool> {
    let result = sqlx::query(
        "update users set room_allocation = ? where id = ? and room_allocation is null;",
    )
    .bind(room)
    .bind(user)
    .execute(db)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Clears the user's room, if it's still `room`.
pub async fn clear_room_allocation(
    db: &mut SqliteConnection,
    user: Uuid,
    room: Uuid,
) -> anyhow::Result<bool> {
    let result = sqlx::query(
        "update users set room_allocation = null where id = ? and room_allocation = ?;",
    )
    .bind(user)
    .bind(room)
    .execute(db)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Creates the configured admin account unless that email already exists.
pub async fn ensure_admin(
    db: &mut SqliteConnection,
    seed: &AdminSeed,
    bcrypt_cost: u32,
) -> anyhow::Result<User> {
    if let Some(existing) = get_by_email(&mut *db, &seed.email).await? {
        if !existing.is_admin() {
            log::warn!(
                "bootstrap admin {} exists as a {}; leaving it unchanged",
                existing.email,
                existing.role
            );
        }
        return Ok(existing);
    }

    validate_password(&seed.password)?;
    let password = bcrypt::hash(&seed.password, bcrypt_cost)?;
    let admin = User::new(seed.name.clone(), seed.email.clone(), password, Role::Admin);
    create(db, admin).await
}
