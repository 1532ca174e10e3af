use crate::auth::hash_password;
use crate::state::AppState;
use crate::utils::{
    ensure_admin, ensure_authorized, error_reply, json_body, json_with_status, with_state,
    with_transaction, Paging,
};
use crate::{bail_if_err, bail_if_err_or_404, services, update_fields, value_or_404};
use common::payloads::{CreateUser, UpdateUser, UserFilter};
use common::User;
use uuid::Uuid;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

async fn list_users(state: AppState, _: User, filter: UserFilter) -> Result<Response, Rejection> {
    let paging = bail_if_err!(Paging::new(filter.page, filter.limit).map_err(anyhow::Error::from));

    let mut conn = bail_if_err!(state.pool.acquire().await.map_err(anyhow::Error::from));
    let (users, total) = bail_if_err!(services::user::list(&mut conn, filter.role, paging).await);

    Ok(warp::reply::json(&paging.into_page(users, total)).into_response())
}

/// Admins can look anyone up; everyone else only themselves.
async fn get_user(user_id: Uuid, state: AppState, caller: User) -> Result<Response, Rejection> {
    if !caller.is_admin() && caller.id != user_id {
        return Ok(error_reply(StatusCode::FORBIDDEN, "Access denied"));
    }

    let mut conn = bail_if_err!(state.pool.acquire().await.map_err(anyhow::Error::from));
    let user = bail_if_err_or_404!(services::user::get(&mut conn, user_id).await, "User not found");

    Ok(warp::reply::json(&user).into_response())
}

async fn create_user(state: AppState, admin: User, data: CreateUser) -> Result<Response, Rejection> {
    bail_if_err!(services::user::validate_password(&data.password).map_err(anyhow::Error::from));
    let password = bail_if_err!(hash_password(&data.password, state.auth.bcrypt_cost));

    with_transaction(state.pool, move |conn| {
        Box::pin(async move {
            let mut user = User::new(data.name, data.email, password, data.role);
            user.student_id = data.student_id;
            user.phone = data.phone;

            let user = services::user::create(&mut *conn, user).await?;
            log::info!("{} added {} {}", admin.email, user.role, user.email);

            Ok(json_with_status(StatusCode::CREATED, &user))
        })
    })
    .await
}

async fn update_user(
    user_id: Uuid,
    state: AppState,
    _: User,
    data: UpdateUser,
) -> Result<Response, Rejection> {
    with_transaction(state.pool, move |conn| {
        Box::pin(async move {
            let mut user = value_or_404!(
                services::user::get(&mut *conn, user_id).await?,
                "User not found"
            );

            update_fields!(user =>
                name = data.name,
                email = data.email,
                student_id = data.student_id.map(Some),
                phone = data.phone.map(Some),
            );

            let user = services::user::update(&mut *conn, user).await?;
            Ok(warp::reply::json(&user).into_response())
        })
    })
    .await
}

pub fn routes(state: AppState) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    let list = warp::path!("api" / "users")
        .and(warp::get())
        .and(with_state(state.clone()))
        .and(ensure_admin(state.clone()))
        .and(warp::query::<UserFilter>())
        .and_then(list_users);

    let create = warp::path!("api" / "users")
        .and(warp::post())
        .and(with_state(state.clone()))
        .and(ensure_admin(state.clone()))
        .and(json_body::<CreateUser>())
        .and_then(create_user);

    let get = warp::path!("api" / "users" / Uuid)
        .and(warp::get())
        .and(with_state(state.clone()))
        .and(ensure_authorized(state.clone()))
        .and_then(get_user);

    let update = warp::path!("api" / "users" / Uuid)
        .and(warp::put())
        .and(with_state(state.clone()))
        .and(ensure_admin(state))
        .and(json_body::<UpdateUser>())
        .and_then(update_user);

    list.or(create).unify().or(get).unify().or(update).unify()
}
