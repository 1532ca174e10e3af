use crate::auth::parse_token;
use crate::state::AppState;
use common::errors::ApiError;
use common::User;
use serde::Deserialize;
use warp::{Filter, Rejection};

pub fn json_body<T: for<'de> Deserialize<'de> + Send>(
) -> impl Filter<Extract = (T,), Error = Rejection> + Clone {
    // When accepting a body, we want a JSON body  (and to reject huge payloads)
    warp::body::content_length_limit(1024 * 16).and(warp::body::json())
}

pub fn with_state(
    state: AppState,
) -> impl Filter<Extract = (AppState,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || state.clone())
}

/// Accepts `Bearer <token>` as well as a bare token.
fn strip_bearer(header: &str) -> &str {
    let header = header.trim_start();
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
        .unwrap_or(header)
        .trim()
}

/// Resolves the `Authorization` header to the calling user.
pub fn ensure_authorized(
    state: AppState,
) -> impl Filter<Extract = (User,), Error = Rejection> + Clone {
    warp::header::optional::<String>("authorization")
        .and(with_state(state))
        .and_then(|header: Option<String>, state: AppState| async move {
            let token = match header.as_deref().map(strip_bearer) {
                Some(token) if !token.is_empty() => token.to_owned(),
                _ => {
                    return Err(
                        ApiError::unauthorized("No token, authorization denied").into_rejection()
                    )
                }
            };

            let mut conn = state.pool.acquire().await.map_err(|e| {
                log::error!("failed to acquire connection: {}", e);
                ApiError::server_error(e.to_string()).into_rejection()
            })?;

            let user = parse_token(&mut conn, &state.auth, &token)
                .await
                .map_err(|e| ApiError::server_error(format!("{:#}", e)).into_rejection())?;

            user.ok_or_else(|| ApiError::unauthorized("Invalid token").into_rejection())
        })
}

pub fn ensure_admin(state: AppState) -> impl Filter<Extract = (User,), Error = Rejection> + Clone {
    ensure_authorized(state).and_then(|user: User| async move {
        if user.is_admin() {
            Ok(user)
        } else {
            Err(ApiError::forbidden("Access denied. Admin only.").into_rejection())
        }
    })
}
