use crate::state::AppState;
use crate::utils::{ensure_admin, with_state};
use crate::{bail_if_err, services};
use common::User;
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

async fn get_stats(state: AppState, _: User) -> Result<Response, Rejection> {
    let mut conn = bail_if_err!(state.pool.acquire().await.map_err(anyhow::Error::from));
    let stats = bail_if_err!(services::stats::get(&mut conn).await);

    Ok(warp::reply::json(&stats).into_response())
}

pub fn routes(state: AppState) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path!("api" / "stats")
        .and(warp::get())
        .and(with_state(state.clone()))
        .and(ensure_admin(state))
        .and_then(get_stats)
}
