use crate::{allocate, create_authenticated_user, create_room, create_user, db, parse};
use common::{Role, Stats};
use warp::http::StatusCode;
use warp::test::request;

#[tokio::test]
async fn test_stats_count_active_allocations() {
    db(|state| {
        Box::pin(async move {
            let (admin, token) = create_authenticated_user(&state, "Admin", Role::Admin).await;
            let a = create_user(&state, "Asha", Role::Student).await;
            create_user(&state, "Bilal", Role::Student).await;
            let room = create_room(&state, "A-101", 1, 2).await;
            create_room(&state, "A-102", 1, 2).await;
            allocate(&state, &admin, &a, &room).await;
            let api = backend::api(state);

            let resp = request()
                .method("GET")
                .path("/api/stats")
                .header("authorization", &token)
                .reply(&api)
                .await;

            assert_eq!(resp.status(), StatusCode::OK);
            assert_eq!(
                parse::<Stats>(resp.body()),
                Stats {
                    total_students: 2,
                    total_rooms: 2,
                    total_allocations: 1,
                    total_revenue: room.monthly_rent,
                }
            );
        })
    })
    .await
}

#[tokio::test]
async fn test_stats_as_student_should_403() {
    db(|state| {
        Box::pin(async move {
            let (_, token) = create_authenticated_user(&state, "Asha", Role::Student).await;
            let api = backend::api(state);

            let resp = request()
                .method("GET")
                .path("/api/stats")
                .header("authorization", &token)
                .reply(&api)
                .await;

            assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        })
    })
    .await
}
