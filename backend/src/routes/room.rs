use crate::state::AppState;
use crate::utils::{
    ensure_admin, ensure_authorized, json_body, json_with_status, with_state, with_transaction,
    Paging,
};
use crate::{bail_if_err, bail_if_err_or_404, services, update_fields, value_or_404};
use common::payloads::{CreateRoom, RoomFilter, UpdateRoom};
use common::{Room, User};
use uuid::Uuid;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

async fn list_rooms(state: AppState, _: User, filter: RoomFilter) -> Result<Response, Rejection> {
    let paging = bail_if_err!(Paging::new(filter.page, filter.limit).map_err(anyhow::Error::from));

    let mut conn = bail_if_err!(state.pool.acquire().await.map_err(anyhow::Error::from));
    let (rooms, total) = bail_if_err!(services::room::list(&mut conn, &filter, paging).await);

    Ok(warp::reply::json(&paging.into_page(rooms, total)).into_response())
}

async fn get_room(room_id: Uuid, state: AppState, _: User) -> Result<Response, Rejection> {
    let mut conn = bail_if_err!(state.pool.acquire().await.map_err(anyhow::Error::from));
    let room = bail_if_err_or_404!(services::room::get(&mut conn, room_id).await, "Room not found");

    Ok(warp::reply::json(&room).into_response())
}

async fn create_room(state: AppState, admin: User, data: CreateRoom) -> Result<Response, Rejection> {
    with_transaction(state.pool, move |conn| {
        Box::pin(async move {
            let room = Room::new(
                data.room_number,
                data.floor,
                data.capacity,
                data.room_type,
                data.amenities,
                data.monthly_rent,
            );
            let room = services::room::create(&mut *conn, room).await?;
            log::info!("{} created room {}", admin.email, room.room_number);

            Ok(json_with_status(StatusCode::CREATED, &room))
        })
    })
    .await
}

async fn update_room(
    room_id: Uuid,
    state: AppState,
    _: User,
    data: UpdateRoom,
) -> Result<Response, Rejection> {
    with_transaction(state.pool, move |conn| {
        Box::pin(async move {
            let mut room = value_or_404!(
                services::room::get(&mut *conn, room_id).await?,
                "Room not found"
            );

            update_fields!(room =>
                room_number = data.room_number,
                floor = data.floor,
                capacity = data.capacity,
                room_type = data.room_type,
                amenities = data.amenities,
                monthly_rent = data.monthly_rent,
                is_active = data.is_active,
            );

            let room = services::room::update(&mut *conn, room).await?;
            Ok(warp::reply::json(&room).into_response())
        })
    })
    .await
}

pub fn routes(state: AppState) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    let list = warp::path!("api" / "rooms")
        .and(warp::get())
        .and(with_state(state.clone()))
        .and(ensure_authorized(state.clone()))
        .and(warp::query::<RoomFilter>())
        .and_then(list_rooms);

    let create = warp::path!("api" / "rooms")
        .and(warp::post())
        .and(with_state(state.clone()))
        .and(ensure_admin(state.clone()))
        .and(json_body::<CreateRoom>())
        .and_then(create_room);

    let get = warp::path!("api" / "rooms" / Uuid)
        .and(warp::get())
        .and(with_state(state.clone()))
        .and(ensure_authorized(state.clone()))
        .and_then(get_room);

    let update = warp::path!("api" / "rooms" / Uuid)
        .and(warp::put())
        .and(with_state(state.clone()))
        .and(ensure_admin(state))
        .and(json_body::<UpdateRoom>())
        .and_then(update_room);

    list.or(create).unify().or(get).unify().or(update).unify()
}
