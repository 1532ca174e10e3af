use crate::auth::{create_jwt, hash_password, verify_password};
use crate::state::AppState;
use crate::utils::{
    ensure_authorized, error_reply, json_body, json_with_status, with_state, with_transaction,
};
use crate::{bail_if_err, services};
use common::errors::ApiError;
use common::payloads::{AuthResponse, Credentials, Register};
use common::{Role, User};
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

const INVALID_CREDENTIALS: &str = "Invalid credentials";

async fn register(state: AppState, data: Register) -> Result<Response, Rejection> {
    if let Err(e) = services::user::validate_password(&data.password) {
        return Ok(e.into_response());
    }
    let password = bail_if_err!(hash_password(&data.password, state.auth.bcrypt_cost));
    let auth = state.auth.clone();

    with_transaction(state.pool, move |transaction| {
        Box::pin(async move {
            let mut user = User::new(data.name, data.email, password, Role::Student);
            user.student_id = data.student_id;
            user.phone = data.phone;

            let user = services::user::create(&mut *transaction, user).await?;
            let token = create_jwt(&auth, &user)?;

            Ok(json_with_status(
                StatusCode::CREATED,
                &AuthResponse { token, user },
            ))
        })
    })
    .await
}

async fn login(state: AppState, credentials: Credentials) -> Result<Response, Rejection> {
    let mut db = bail_if_err!(state.pool.acquire().await.map_err(anyhow::Error::from));

    let user = match bail_if_err!(services::user::get_by_email(&mut db, &credentials.email).await)
    {
        Some(user) => user,
        None => return Ok(error_reply(StatusCode::BAD_REQUEST, INVALID_CREDENTIALS)),
    };

    Ok(
        if bail_if_err!(verify_password(&credentials.password, &user.password)) {
            let token = bail_if_err!(create_jwt(&state.auth, &user));

            warp::reply::json(&AuthResponse { token, user }).into_response()
        } else {
            ApiError::bad_request(INVALID_CREDENTIALS).into_response()
        },
    )
}

async fn me(user: User) -> Result<Response, Rejection> {
    Ok(warp::reply::json(&user).into_response())
}

pub fn routes(state: AppState) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    let register_route = warp::path!("api" / "auth" / "register")
        .and(warp::post())
        .and(with_state(state.clone()))
        .and(json_body::<Register>())
        .and_then(register);

    let login_route = warp::path!("api" / "auth" / "login")
        .and(warp::post())
        .and(with_state(state.clone()))
        .and(json_body::<Credentials>())
        .and_then(login);

    let me_route = warp::path!("api" / "auth" / "me")
        .and(warp::get())
        .and(ensure_authorized(state))
        .and_then(me);

    register_route.or(login_route).unify().or(me_route).unify()
}
