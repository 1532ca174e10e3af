use crate::{allocate, create_authenticated_user, create_room, create_user, db, parse};
use common::errors::ApiError;
use common::payloads::{CreateUser, UpdateUser};
use common::{Page, Role, User};
use uuid::Uuid;
use warp::http::StatusCode;
use warp::test::request;

#[tokio::test]
async fn test_list_users() {
    db(|state| {
        Box::pin(async move {
            let (_, token) = create_authenticated_user(&state, "Admin", Role::Admin).await;
            for name in ["Chen", "Asha", "Bilal"] {
                create_user(&state, name, Role::Student).await;
            }
            let api = backend::api(state);

            let resp = request()
                .method("GET")
                .path("/api/users?role=student&limit=2")
                .header("authorization", &token)
                .reply(&api)
                .await;

            assert_eq!(resp.status(), StatusCode::OK);
            let page = parse::<Page<User>>(resp.body());
            assert_eq!(page.total, 3);
            assert_eq!(page.total_pages, 2);
            let names = page.items.iter().map(|user| user.name.as_str()).collect::<Vec<_>>();
            assert_eq!(names, ["Asha", "Bilal"]);

            let resp = request()
                .method("GET")
                .path("/api/users")
                .header("authorization", &token)
                .reply(&api)
                .await;

            assert_eq!(parse::<Page<User>>(resp.body()).total, 4);
        })
    })
    .await
}

#[tokio::test]
async fn test_list_users_as_student_should_403() {
    db(|state| {
        Box::pin(async move {
            let (_, token) = create_authenticated_user(&state, "Asha", Role::Student).await;
            let api = backend::api(state);

            let resp = request()
                .method("GET")
                .path("/api/users")
                .header("authorization", &token)
                .reply(&api)
                .await;

            assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        })
    })
    .await
}

#[tokio::test]
async fn test_get_user() {
    db(|state| {
        Box::pin(async move {
            let (_, admin_token) = create_authenticated_user(&state, "Admin", Role::Admin).await;
            let (student, token) = create_authenticated_user(&state, "Asha", Role::Student).await;
            let other = create_user(&state, "Bilal", Role::Student).await;
            let api = backend::api(state);

            let get = |id: Uuid, token: &str| {
                request()
                    .method("GET")
                    .path(&format!("/api/users/{}", id))
                    .header("authorization", token)
                    .reply(&api)
            };

            let resp = get(student.id, &token).await;
            assert_eq!(resp.status(), StatusCode::OK);
            assert_eq!(parse::<User>(resp.body()).email, student.email);

            let resp = get(other.id, &token).await;
            assert_eq!(resp.status(), StatusCode::FORBIDDEN);

            let resp = get(other.id, &admin_token).await;
            assert_eq!(resp.status(), StatusCode::OK);
            assert_eq!(parse::<User>(resp.body()).id, other.id);

            let resp = get(Uuid::new_v4(), &admin_token).await;
            assert_eq!(resp.status(), StatusCode::NOT_FOUND);
            assert_eq!(parse::<ApiError>(resp.body()).message, "User not found");
        })
    })
    .await
}

#[tokio::test]
async fn test_create_user() {
    db(|state| {
        Box::pin(async move {
            let (_, token) = create_authenticated_user(&state, "Admin", Role::Admin).await;
            let api = backend::api(state);

            let warden = CreateUser {
                name: "Warden".to_string(),
                email: "warden@hostel.test".to_string(),
                password: "warden-pass".to_string(),
                role: Role::Admin,
                student_id: None,
                phone: Some("+91 98765 43210".to_string()),
            };

            let resp = request()
                .method("POST")
                .path("/api/users")
                .header("authorization", &token)
                .json(&warden)
                .reply(&api)
                .await;

            assert_eq!(resp.status(), StatusCode::CREATED);
            let user = parse::<User>(resp.body());
            assert_eq!(user.role, Role::Admin);
            assert_eq!(user.phone.as_deref(), Some("+91 98765 43210"));

            let resp = request()
                .method("POST")
                .path("/api/users")
                .header("authorization", &token)
                .json(&warden)
                .reply(&api)
                .await;

            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
            assert_eq!(parse::<ApiError>(resp.body()).message, "User already exists");
        })
    })
    .await
}

#[tokio::test]
async fn test_update_user_keeps_room_allocation() {
    db(|state| {
        Box::pin(async move {
            let (admin, token) = create_authenticated_user(&state, "Admin", Role::Admin).await;
            let student = create_user(&state, "Asha", Role::Student).await;
            let room = create_room(&state, "A-101", 1, 2).await;
            allocate(&state, &admin, &student, &room).await;
            let api = backend::api(state);

            let resp = request()
                .method("PUT")
                .path(&format!("/api/users/{}", student.id))
                .header("authorization", &token)
                .json(&UpdateUser {
                    name: Some("Asha Rao".to_string()),
                    student_id: Some("ME-2023-044".to_string()),
                    ..Default::default()
                })
                .reply(&api)
                .await;

            assert_eq!(resp.status(), StatusCode::OK);
            let user = parse::<User>(resp.body());
            assert_eq!(user.name, "Asha Rao");
            assert_eq!(user.student_id.as_deref(), Some("ME-2023-044"));
            assert_eq!(user.email, student.email);
            assert_eq!(user.role, Role::Student);
            assert_eq!(user.room_allocation, Some(room.id));

            let resp = request()
                .method("PUT")
                .path(&format!("/api/users/{}", Uuid::new_v4()))
                .header("authorization", &token)
                .json(&UpdateUser::default())
                .reply(&api)
                .await;

            assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        })
    })
    .await
}
