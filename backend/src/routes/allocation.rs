use crate::state::AppState;
use crate::utils::{
    ensure_admin, ensure_authorized, error_reply, json_body, json_with_status, with_state,
    with_transaction, Paging,
};
use crate::{bail_if_err, bail_if_err_or_404, services, value_or_404};
use common::payloads::{AllocationFilter, CreateAllocation, UpdateAllocation};
use common::{MyAllocation, Role, User};
use uuid::Uuid;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

async fn list_allocations(
    state: AppState,
    _: User,
    filter: AllocationFilter,
) -> Result<Response, Rejection> {
    let paging = bail_if_err!(Paging::new(filter.page, filter.limit).map_err(anyhow::Error::from));

    let mut conn = bail_if_err!(state.pool.acquire().await.map_err(anyhow::Error::from));
    let (allocations, total) =
        bail_if_err!(services::allocation::list(&mut conn, filter.status, paging).await);

    Ok(warp::reply::json(&paging.into_page(allocations, total)).into_response())
}

async fn create_allocation(
    state: AppState,
    admin: User,
    data: CreateAllocation,
) -> Result<Response, Rejection> {
    with_transaction(state.pool, move |conn| {
        Box::pin(async move {
            let allocation = services::allocation::create(&mut *conn, data, &admin).await?;

            Ok(json_with_status(StatusCode::CREATED, &allocation))
        })
    })
    .await
}

async fn update_allocation(
    allocation_id: Uuid,
    state: AppState,
    admin: User,
    data: UpdateAllocation,
) -> Result<Response, Rejection> {
    with_transaction(state.pool, move |conn| {
        Box::pin(async move {
            let status = data.status;
            let allocation = value_or_404!(
                services::allocation::update_status(&mut *conn, allocation_id, data).await?,
                "Allocation not found"
            );
            log::info!(
                "{} set allocation {} to {}",
                admin.email,
                allocation.id,
                status
            );

            Ok(warp::reply::json(&allocation).into_response())
        })
    })
    .await
}

async fn my_allocation(state: AppState, user: User) -> Result<Response, Rejection> {
    if user.role != Role::Student {
        return Ok(error_reply(StatusCode::FORBIDDEN, "Access denied"));
    }

    let mut conn = bail_if_err!(state.pool.acquire().await.map_err(anyhow::Error::from));

    let allocation = bail_if_err_or_404!(
        services::allocation::active_for_student(&mut conn, user.id).await,
        "No active allocation found"
    );
    let room_details = bail_if_err_or_404!(
        services::room::get(&mut conn, allocation.room.id).await,
        "Room not found"
    );
    let roommates = room_details
        .residents
        .iter()
        .filter(|resident| resident.id != user.id)
        .cloned()
        .collect();

    Ok(warp::reply::json(&MyAllocation {
        allocation,
        room_details,
        roommates,
    })
    .into_response())
}

pub fn routes(state: AppState) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    let list = warp::path!("api" / "allocations")
        .and(warp::get())
        .and(with_state(state.clone()))
        .and(ensure_admin(state.clone()))
        .and(warp::query::<AllocationFilter>())
        .and_then(list_allocations);

    let create = warp::path!("api" / "allocations")
        .and(warp::post())
        .and(with_state(state.clone()))
        .and(ensure_admin(state.clone()))
        .and(json_body::<CreateAllocation>())
        .and_then(create_allocation);

    let mine = warp::path!("api" / "allocations" / "my-allocation")
        .and(warp::get())
        .and(with_state(state.clone()))
        .and(ensure_authorized(state.clone()))
        .and_then(my_allocation);

    let update = warp::path!("api" / "allocations" / Uuid)
        .and(warp::put())
        .and(with_state(state.clone()))
        .and(ensure_admin(state))
        .and(json_body::<UpdateAllocation>())
        .and_then(update_allocation);

    list.or(create).unify().or(mine).unify().or(update).unify()
}
