use crate::{allocate, create_authenticated_user, create_room, create_user, db, parse};
use common::errors::ApiError;
use common::payloads::{CreateRoom, UpdateRoom};
use common::{Amenity, Page, Role, Room, RoomType};
use uuid::Uuid;
use warp::http::StatusCode;
use warp::test::request;

fn new_room(number: &str, capacity: i32) -> CreateRoom {
    CreateRoom {
        room_number: number.to_string(),
        floor: 1,
        capacity,
        room_type: RoomType::Double,
        amenities: vec![Amenity::Ac, Amenity::WiFi],
        monthly_rent: 6500.0,
    }
}

#[tokio::test]
async fn test_create_room() {
    db(|state| {
        Box::pin(async move {
            let (_, token) = create_authenticated_user(&state, "Admin", Role::Admin).await;
            let api = backend::api(state);

            let resp = request()
                .method("POST")
                .path("/api/rooms")
                .header("authorization", &token)
                .json(&new_room("A-101", 2))
                .reply(&api)
                .await;

            assert_eq!(resp.status(), StatusCode::CREATED);
            let body = parse::<serde_json::Value>(resp.body());
            assert_eq!(body["roomNumber"], "A-101");
            assert_eq!(body["currentOccupancy"], 0);
            assert_eq!(body["isActive"], true);
            assert_eq!(body["isAvailable"], true);
            assert_eq!(body["availableSpots"], 2);
            assert_eq!(body["amenities"], serde_json::json!(["AC", "WiFi"]));
            assert_eq!(body["residents"], serde_json::json!([]));
        })
    })
    .await
}

#[tokio::test]
async fn test_create_duplicate_room_should_400() {
    db(|state| {
        Box::pin(async move {
            let (_, token) = create_authenticated_user(&state, "Admin", Role::Admin).await;
            create_room(&state, "A-101", 1, 2).await;
            let api = backend::api(state);

            let resp = request()
                .method("POST")
                .path("/api/rooms")
                .header("authorization", &token)
                .json(&new_room("A-101", 2))
                .reply(&api)
                .await;

            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
            assert_eq!(parse::<ApiError>(resp.body()).message, "Room number already exists");
        })
    })
    .await
}

#[tokio::test]
async fn test_create_room_out_of_range_should_400() {
    db(|state| {
        Box::pin(async move {
            let (_, token) = create_authenticated_user(&state, "Admin", Role::Admin).await;
            let api = backend::api(state);

            for room in [
                new_room("A-101", 5),
                new_room("A-102", 0),
                CreateRoom {
                    monthly_rent: -1.0,
                    ..new_room("A-103", 2)
                },
                CreateRoom {
                    floor: -1,
                    ..new_room("A-104", 2)
                },
                new_room("   ", 2),
            ] {
                let resp = request()
                    .method("POST")
                    .path("/api/rooms")
                    .header("authorization", &token)
                    .json(&room)
                    .reply(&api)
                    .await;

                assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{:?}", room);
            }
        })
    })
    .await
}

#[tokio::test]
async fn test_create_room_as_student_should_403() {
    db(|state| {
        Box::pin(async move {
            let (_, token) = create_authenticated_user(&state, "Meera", Role::Student).await;
            let api = backend::api(state);

            let resp = request()
                .method("POST")
                .path("/api/rooms")
                .header("authorization", &token)
                .json(&new_room("A-101", 2))
                .reply(&api)
                .await;

            assert_eq!(resp.status(), StatusCode::FORBIDDEN);
            assert_eq!(parse::<ApiError>(resp.body()).message, "Access denied. Admin only.");
        })
    })
    .await
}

#[tokio::test]
async fn test_list_rooms_without_token_should_401() {
    db(|state| {
        Box::pin(async move {
            let api = backend::api(state);

            let resp = request()
                .method("GET")
                .path("/api/rooms")
                .reply(&api)
                .await;

            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        })
    })
    .await
}

#[tokio::test]
async fn test_list_rooms_filters() {
    db(|state| {
        Box::pin(async move {
            let admin = create_user(&state, "Admin", Role::Admin).await;
            let (student, token) = create_authenticated_user(&state, "Meera", Role::Student).await;

            let full = create_room(&state, "A-101", 1, 1).await;
            create_room(&state, "A-102", 1, 2).await;
            create_room(&state, "B-201", 2, 3).await;
            allocate(&state, &admin, &student, &full).await;

            let api = backend::api(state);

            let list = |query: &'static str| {
                request()
                    .method("GET")
                    .path(&format!("/api/rooms{}", query))
                    .header("authorization", &token)
                    .reply(&api)
            };

            let resp = list("").await;
            assert_eq!(resp.status(), StatusCode::OK);
            let page = parse::<Page<Room>>(resp.body());
            let numbers = page
                .items
                .iter()
                .map(|room| room.room_number.as_str())
                .collect::<Vec<_>>();
            assert_eq!(numbers, ["A-101", "A-102", "B-201"]);
            assert_eq!(page.items[0].residents.len(), 1);
            assert_eq!(page.items[0].residents[0].id, student.id);

            let page = parse::<Page<Room>>(list("?available=true").await.body());
            assert_eq!(page.total, 2);
            assert!(page.items.iter().all(|room| room.id != full.id));

            let page = parse::<Page<Room>>(list("?roomType=triple").await.body());
            assert_eq!(page.total, 1);
            assert_eq!(page.items[0].room_number, "B-201");

            let page = parse::<Page<Room>>(list("?floor=1&available=true").await.body());
            assert_eq!(page.total, 1);
            assert_eq!(page.items[0].room_number, "A-102");

            let page = parse::<Page<Room>>(list("?page=2&limit=2").await.body());
            assert_eq!(page.total, 3);
            assert_eq!(page.total_pages, 2);
            assert_eq!(page.current_page, 2);
            assert_eq!(page.items.len(), 1);

            assert_eq!(list("?limit=0").await.status(), StatusCode::BAD_REQUEST);
            assert_eq!(list("?page=0").await.status(), StatusCode::BAD_REQUEST);
            assert_eq!(list("?roomType=penthouse").await.status(), StatusCode::BAD_REQUEST);
        })
    })
    .await
}

#[tokio::test]
async fn test_inactive_rooms_are_not_listed() {
    db(|state| {
        Box::pin(async move {
            let (_, token) = create_authenticated_user(&state, "Admin", Role::Admin).await;
            let room = create_room(&state, "A-101", 1, 2).await;
            create_room(&state, "A-102", 1, 2).await;
            let api = backend::api(state);

            let resp = request()
                .method("PUT")
                .path(&format!("/api/rooms/{}", room.id))
                .header("authorization", &token)
                .json(&UpdateRoom {
                    is_active: Some(false),
                    ..Default::default()
                })
                .reply(&api)
                .await;
            assert_eq!(resp.status(), StatusCode::OK);

            let resp = request()
                .method("GET")
                .path("/api/rooms")
                .header("authorization", &token)
                .reply(&api)
                .await;

            let page = parse::<Page<Room>>(resp.body());
            assert_eq!(page.total, 1);
            assert_eq!(page.items[0].room_number, "A-102");
        })
    })
    .await
}

#[tokio::test]
async fn test_get_room_with_residents() {
    db(|state| {
        Box::pin(async move {
            let admin = create_user(&state, "Admin", Role::Admin).await;
            let (student, token) = create_authenticated_user(&state, "Meera", Role::Student).await;
            let room = create_room(&state, "A-101", 1, 2).await;
            allocate(&state, &admin, &student, &room).await;
            let api = backend::api(state);

            let resp = request()
                .method("GET")
                .path(&format!("/api/rooms/{}", room.id))
                .header("authorization", &token)
                .reply(&api)
                .await;

            assert_eq!(resp.status(), StatusCode::OK);
            let body = parse::<Room>(resp.body());
            assert_eq!(body.id, room.id);
            assert_eq!(body.current_occupancy, 1);
            assert_eq!(body.residents.len(), 1);
            assert_eq!(body.residents[0].email, student.email);
        })
    })
    .await
}

#[tokio::test]
async fn test_get_non_existent_room_should_404() {
    db(|state| {
        Box::pin(async move {
            let (_, token) = create_authenticated_user(&state, "Meera", Role::Student).await;
            let api = backend::api(state);

            let resp = request()
                .method("GET")
                .path(&format!("/api/rooms/{}", Uuid::new_v4()))
                .header("authorization", &token)
                .reply(&api)
                .await;

            assert_eq!(resp.status(), StatusCode::NOT_FOUND);
            assert_eq!(parse::<ApiError>(resp.body()).message, "Room not found");
        })
    })
    .await
}

#[tokio::test]
async fn test_update_room() {
    db(|state| {
        Box::pin(async move {
            let (_, token) = create_authenticated_user(&state, "Admin", Role::Admin).await;
            let room = create_room(&state, "A-101", 1, 2).await;
            let api = backend::api(state);

            let resp = request()
                .method("PUT")
                .path(&format!("/api/rooms/{}", room.id))
                .header("authorization", &token)
                .json(&UpdateRoom {
                    monthly_rent: Some(7200.0),
                    amenities: Some(vec![Amenity::Fan]),
                    ..Default::default()
                })
                .reply(&api)
                .await;

            assert_eq!(resp.status(), StatusCode::OK);
            let body = parse::<Room>(resp.body());
            assert_eq!(body.monthly_rent, 7200.0);
            assert_eq!(body.amenities, vec![Amenity::Fan]);
            assert_eq!(body.room_number, "A-101");
            assert_eq!(body.capacity, 2);

            let resp = request()
                .method("PUT")
                .path(&format!("/api/rooms/{}", Uuid::new_v4()))
                .header("authorization", &token)
                .json(&UpdateRoom::default())
                .reply(&api)
                .await;

            assert_eq!(resp.status(), StatusCode::NOT_FOUND);

            let resp = request()
                .method("PUT")
                .path(&format!("/api/rooms/{}", room.id))
                .header("authorization", &token)
                .json(&UpdateRoom {
                    capacity: Some(9),
                    ..Default::default()
                })
                .reply(&api)
                .await;

            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        })
    })
    .await
}

#[tokio::test]
async fn test_shrinking_an_occupied_room_keeps_its_residents() {
    db(|state| {
        Box::pin(async move {
            let (admin, token) = create_authenticated_user(&state, "Admin", Role::Admin).await;
            let a = create_user(&state, "Asha", Role::Student).await;
            let b = create_user(&state, "Bilal", Role::Student).await;
            let room = create_room(&state, "A-101", 1, 3).await;
            allocate(&state, &admin, &a, &room).await;
            allocate(&state, &admin, &b, &room).await;
            let api = backend::api(state);

            let resp = request()
                .method("PUT")
                .path(&format!("/api/rooms/{}", room.id))
                .header("authorization", &token)
                .json(&UpdateRoom {
                    capacity: Some(1),
                    ..Default::default()
                })
                .reply(&api)
                .await;

            assert_eq!(resp.status(), StatusCode::OK);
            let body = parse::<Room>(resp.body());
            assert_eq!(body.capacity, 1);
            assert_eq!(body.current_occupancy, 2);
            assert_eq!(body.residents.len(), 2);
            assert_eq!(body.available_spots(), 0);
            assert!(!body.is_available());

            let resp = request()
                .path(&format!("/api/rooms/{}", room.id))
                .header("authorization", &token)
                .reply(&api)
                .await;

            assert_eq!(resp.status(), StatusCode::OK);
            let json = parse::<serde_json::Value>(resp.body());
            assert_eq!(json["capacity"], 1);
            assert_eq!(json["currentOccupancy"], 2);
            assert_eq!(json["availableSpots"], 0);
            assert_eq!(json["isAvailable"], false);
            assert_eq!(json["residents"].as_array().map(Vec::len), Some(2));
        })
    })
    .await
}

#[tokio::test]
async fn test_auth_is_checked_before_the_body() {
    db(|state| {
        Box::pin(async move {
            let (_, student) = create_authenticated_user(&state, "Student", Role::Student).await;
            let api = backend::api(state);
            let malformed = serde_json::json!({ "roomNumber": 5 });

            let resp = request()
                .method("POST")
                .path("/api/rooms")
                .json(&malformed)
                .reply(&api)
                .await;

            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
            assert_eq!(
                parse::<ApiError>(resp.body()).message,
                "No token, authorization denied"
            );

            let resp = request()
                .method("POST")
                .path("/api/rooms")
                .header("authorization", "Bearer not-a-token")
                .json(&malformed)
                .reply(&api)
                .await;

            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
            assert_eq!(parse::<ApiError>(resp.body()).message, "Invalid token");

            let resp = request()
                .method("POST")
                .path("/api/rooms")
                .header("authorization", &student)
                .json(&malformed)
                .reply(&api)
                .await;

            assert_eq!(resp.status(), StatusCode::FORBIDDEN);
            assert_eq!(
                parse::<ApiError>(resp.body()).message,
                "Access denied. Admin only."
            );

            let resp = request()
                .method("PUT")
                .path(&format!("/api/users/{}", Uuid::new_v4()))
                .json(&malformed)
                .reply(&api)
                .await;

            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        })
    })
    .await
}
