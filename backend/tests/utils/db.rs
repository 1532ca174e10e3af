use backend::auth::AuthSettings;
use backend::{setup_database, AppState};
use futures::future::BoxFuture;

/// Lowest cost bcrypt accepts; keeps hashing out of the test runtime.
pub const TEST_BCRYPT_COST: u32 = 4;

pub async fn setup_test_state() -> anyhow::Result<AppState> {
    state_for("sqlite::memory:").await
}

async fn state_for(url: &str) -> anyhow::Result<AppState> {
    let pool = setup_database(url).await?;
    let auth = AuthSettings::new("test-secret", chrono::Duration::hours(1), TEST_BCRYPT_COST);

    Ok(AppState::new(pool, auth))
}

/// Like [`db`], but on a database file with a full connection pool, so
/// requests really run side by side.
pub async fn file_db<F>(callback: F)
where
    F: FnOnce(AppState) -> BoxFuture<'static, ()> + 'static + Send + Sync,
{
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let url = format!("sqlite://{}", dir.path().join("hostel.db").display());
    let state = state_for(&url)
        .await
        .expect("failed to set up test database");

    callback(state.clone()).await;

    state.pool.close().await;
}

/// Runs `callback` against a fresh, migrated in-memory database.
///
/// The pool has a single connection: release any connection you acquire
/// before sending a request through the api.
pub async fn db<F>(callback: F)
where
    F: FnOnce(AppState) -> BoxFuture<'static, ()> + 'static + Send + Sync,
{
    let state = setup_test_state()
        .await
        .expect("failed to set up test database");

    callback(state.clone()).await;

    state.pool.close().await;
}
