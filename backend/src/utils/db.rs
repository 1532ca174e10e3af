use crate::bail_if_err;
use futures::future::BoxFuture;
use sqlx::{Sqlite, SqlitePool};
use warp::reply::Response;
use warp::Rejection;

pub type Transaction = sqlx::Transaction<'static, Sqlite>;

/// Runs `callback` inside a transaction that commits on `Ok` and rolls back
/// on `Err`.
///
/// The transaction takes SQLite's write lock up front (`BEGIN IMMEDIATE`), so
/// concurrent writers queue on the connection's busy timeout and each one
/// reads the state the previous one committed.
pub fn transaction<F, R, E>(pool: SqlitePool, callback: F) -> BoxFuture<'static, Result<R, E>>
where
    for<'c> F: FnOnce(&'c mut Transaction) -> BoxFuture<'c, Result<R, E>> + 'static + Send + Sync,
    R: Send + 'static,
    E: From<sqlx::Error> + Send + 'static,
{
    Box::pin(async move {
        let mut transaction = pool.begin_with("BEGIN IMMEDIATE").await?;
        let ret = callback(&mut transaction).await;

        match ret {
            Ok(ret) => {
                transaction.commit().await?;

                Ok(ret)
            }
            Err(err) => {
                transaction.rollback().await?;

                Err(err)
            }
        }
    })
}

/// [`transaction`] for route handlers: errors are rendered as JSON replies.
pub async fn with_transaction<F>(pool: SqlitePool, callback: F) -> Result<Response, Rejection>
where
    for<'c> F:
        FnOnce(&'c mut Transaction) -> BoxFuture<'c, anyhow::Result<Response>> + 'static + Send + Sync,
{
    let ret = transaction(pool, callback).await;

    Ok(bail_if_err!(ret))
}
