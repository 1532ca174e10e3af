pub mod auth;
pub mod config;
pub mod macros;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

pub use state::AppState;

use common::errors::ApiError;
use log::LevelFilter;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::convert::Infallible;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use utils::error_reply;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

pub fn setup_logger(level: LevelFilter, log_file: Option<&Path>) -> anyhow::Result<()> {
    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}][{}][{}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stdout());

    if let Some(path) = log_file {
        dispatch = dispatch.chain(fern::log_file(path)?);
    }

    dispatch.apply()?;
    Ok(())
}

/// How long a writer waits for another connection's transaction to finish.
const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

fn is_in_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

/// Connects to `url` and brings the schema up to date.
///
/// An in-memory database lives as long as its connection, so it gets a
/// pool of exactly one connection that is never recycled.
pub async fn setup_database(url: &str) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = if is_in_memory(url) {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?
    } else {
        SqlitePoolOptions::new()
            .connect_with(options.journal_mode(SqliteJournalMode::Wal))
            .await?
    };

    sqlx::migrate!().run(&pool).await?;

    Ok(pool)
}

/// Every endpoint under `/api`, with rejections rendered as JSON.
pub fn api(state: AppState) -> impl Filter<Extract = (Response,), Error = Infallible> + Clone {
    let health = warp::path!("api" / "health").and(warp::get()).map(|| {
        warp::reply::json(&serde_json::json!({ "message": "Hostel Management API is running!" }))
            .into_response()
    });

    health
        .or(auth::routes(state.clone()))
        .unify()
        .or(routes::room::routes(state.clone()))
        .unify()
        .or(routes::allocation::routes(state.clone()))
        .unify()
        .or(routes::user::routes(state.clone()))
        .unify()
        .or(routes::stats::routes(state))
        .unify()
        .recover(handle_rejection)
        .unify()
}

pub async fn handle_rejection(err: Rejection) -> Result<Response, Infallible> {
    if let Some(e) = err.find::<ApiError>() {
        return Ok(e.clone().into_response());
    }

    if err.is_not_found() {
        return Ok(error_reply(StatusCode::NOT_FOUND, "Route not found"));
    }

    let mut code = StatusCode::INTERNAL_SERVER_ERROR;
    let mut message = "Internal server error".to_string();

    // body and query problems come before MethodNotAllowed, which sibling
    // routes on the same path always contribute
    setup_rejection!(err code message
        warp::body::BodyDeserializeError, StatusCode::BAD_REQUEST;
        warp::reject::InvalidQuery, StatusCode::BAD_REQUEST;
        warp::reject::MissingHeader, StatusCode::BAD_REQUEST;
        warp::reject::InvalidHeader, StatusCode::BAD_REQUEST;
        warp::reject::LengthRequired, StatusCode::BAD_REQUEST;
        warp::reject::PayloadTooLarge, StatusCode::BAD_REQUEST;
        warp::reject::UnsupportedMediaType, StatusCode::BAD_REQUEST;
        warp::reject::MethodNotAllowed, StatusCode::METHOD_NOT_ALLOWED
    );

    if code == StatusCode::INTERNAL_SERVER_ERROR {
        log::error!("unhandled rejection: {:?}", err);
    }

    Ok(error_reply(code, &message))
}
