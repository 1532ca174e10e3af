use crate::services;
use common::{Role, Stats};
use sqlx::SqliteConnection;

pub async fn get(db: &mut SqliteConnection) -> anyhow::Result<Stats> {
    let total_students = services::user::count_by_role(&mut *db, Role::Student).await?;
    let total_rooms = services::room::count_active(&mut *db).await?;
    let (total_allocations, total_revenue) =
        services::allocation::active_totals(&mut *db).await?;

    Ok(Stats {
        total_students,
        total_rooms,
        total_allocations,
        total_revenue,
    })
}
