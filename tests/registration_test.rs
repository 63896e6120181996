use reqwest::{Client, Method};
use serde_json::json;

mod common;
use common::helpers::{json_body, login, make_authenticated_request, register_user, TEST_PASSWORD};
use common::utils::spawn_app;

#[tokio::test]
async fn register_returns_201_and_leaves_account_pending() {
    let test_app = spawn_app().await;

    let response = register_user(&test_app, "newcoach").await;

    assert_eq!(201, response.status().as_u16());
    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "pending");

    let (role, status): (String, String) = sqlx::query_as(
        "SELECT p.role, p.status FROM user_profiles p JOIN users u ON u.id = p.user_id WHERE u.username = $1",
    )
    .bind("newcoach")
    .fetch_one(&test_app.db_pool)
    .await
    .expect("Failed to fetch saved profile.");
    assert_eq!(role, "player");
    assert_eq!(status, "pending");
}

#[tokio::test]
async fn register_rejects_duplicate_username() {
    let test_app = spawn_app().await;

    assert_eq!(201, register_user(&test_app, "taken").await.status().as_u16());
    let response = register_user(&test_app, "taken").await;

    assert_eq!(409, response.status().as_u16());
    let body = json_body(response).await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn register_rejects_invalid_input() {
    let test_app = spawn_app().await;
    let client = Client::new();

    let cases = vec![
        (json!({"username": "", "password": TEST_PASSWORD, "email": "a@example.com"}), "empty username"),
        (json!({"username": "bad name", "password": TEST_PASSWORD, "email": "a@example.com"}), "space in username"),
        (json!({"username": "someone", "password": TEST_PASSWORD, "email": "not-an-email"}), "invalid email"),
        (
            json!({"username": "sneaky", "password": TEST_PASSWORD, "email": "a@example.com", "role": "admin"}),
            "admin role requested",
        ),
    ];

    for (body, description) in cases {
        let response = client
            .post(&test_app.url("/register_user"))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request.");
        assert_eq!(400, response.status().as_u16(), "Expected 400 for {}", description);
    }
}

#[tokio::test]
async fn pending_user_can_log_in_but_sees_no_club_data() {
    let test_app = spawn_app().await;
    let client = Client::new();
    register_user(&test_app, "waiting").await;

    let response = login(&test_app, "waiting", TEST_PASSWORD).await;
    assert_eq!(200, response.status().as_u16());
    let body = json_body(response).await;
    assert_eq!(body["status"], "pending");
    let token = body["token"].as_str().expect("No token in response").to_string();

    let me = make_authenticated_request(&client, Method::GET, &test_app.url("/me"), &token, None).await;
    assert_eq!(200, me.status().as_u16());
    let me = json_body(me).await;
    assert_eq!(me["data"]["username"], "waiting");
    assert_eq!(me["data"]["first_name"], "Test");

    let teams = make_authenticated_request(&client, Method::GET, &test_app.url("/teams"), &token, None).await;
    assert_eq!(403, teams.status().as_u16());
}

#[tokio::test]
async fn login_with_wrong_password_is_rejected() {
    let test_app = spawn_app().await;
    register_user(&test_app, "forgetful").await;

    let response = login(&test_app, "forgetful", "not-the-password").await;
    assert_eq!(401, response.status().as_u16());

    let response = login(&test_app, "nobody", TEST_PASSWORD).await;
    assert_eq!(401, response.status().as_u16());
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let test_app = spawn_app().await;

    let response = Client::new()
        .get(&test_app.url("/teams"))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(401, response.status().as_u16());
}
