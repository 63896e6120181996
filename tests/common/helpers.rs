use reqwest::{Client, Method, Response};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::common::utils::TestApp;

pub const TEST_PASSWORD: &str = "password123";

pub struct TestUser {
    pub user_id: Uuid,
    pub username: String,
    pub token: String,
}

pub async fn make_authenticated_request(
    client: &Client,
    method: Method,
    url: &str,
    token: &str,
    body: Option<Value>,
) -> Response {
    let mut request = client.request(method, url).bearer_auth(token);
    if let Some(body) = body {
        request = request.json(&body);
    }
    request.send().await.expect("Failed to execute request.")
}

pub async fn register_user(app: &TestApp, username: &str) -> Response {
    Client::new()
        .post(app.url("/register_user"))
        .json(&json!({
            "username": username,
            "password": TEST_PASSWORD,
            "email": format!("{}@example.com", username),
            "first_name": "Test",
            "last_name": "User"
        }))
        .send()
        .await
        .expect("Failed to register user.")
}

pub async fn login(app: &TestApp, username: &str, password: &str) -> Response {
    Client::new()
        .post(app.url("/login"))
        .json(&json!({ "username": username, "password": password }))
        .send()
        .await
        .expect("Failed to execute login request.")
}

async fn login_token(app: &TestApp, username: &str) -> (Uuid, String) {
    let response = login(app, username, TEST_PASSWORD).await;
    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.expect("Failed to parse login response");
    let token = body["token"].as_str().expect("No token in response").to_string();
    let user_id = body["user_id"].as_str().and_then(|id| Uuid::parse_str(id).ok()).expect("No user id");
    (user_id, token)
}

/// Register, set role and status straight in the database, then log in so the
/// token carries them.
pub async fn create_user_with_role(app: &TestApp, role: &str, status: &str) -> TestUser {
    let username = format!("{}{}", role, Uuid::new_v4().simple());
    let response = register_user(app, &username).await;
    assert_eq!(201, response.status().as_u16());

    sqlx::query(
        "UPDATE user_profiles SET role = $2, status = $3
         WHERE user_id = (SELECT id FROM users WHERE username = $1)",
    )
    .bind(&username)
    .bind(role)
    .bind(status)
    .execute(&app.db_pool)
    .await
    .expect("Failed to update profile");

    let (user_id, token) = login_token(app, &username).await;
    TestUser { user_id, username, token }
}

pub async fn create_coach(app: &TestApp) -> TestUser {
    create_user_with_role(app, "coach", "approved").await
}

pub async fn create_admin(app: &TestApp) -> TestUser {
    create_user_with_role(app, "admin", "approved").await
}

pub async fn create_approved_player(app: &TestApp) -> TestUser {
    create_user_with_role(app, "player", "approved").await
}

/// `data.id` of a successful create.
async fn created_id(response: Response) -> Uuid {
    assert_eq!(201, response.status().as_u16());
    let body: Value = response.json().await.expect("Failed to parse response");
    body["data"]["id"]
        .as_str()
        .and_then(|id| Uuid::parse_str(id).ok())
        .expect("No id in response")
}

pub async fn create_team(app: &TestApp, token: &str, name: &str) -> Uuid {
    let response = make_authenticated_request(
        &Client::new(),
        Method::POST,
        &app.url("/teams"),
        token,
        Some(json!({ "name": name })),
    )
    .await;
    created_id(response).await
}

pub async fn create_player(app: &TestApp, token: &str, first_name: &str, last_name: &str) -> Uuid {
    let response = make_authenticated_request(
        &Client::new(),
        Method::POST,
        &app.url("/players"),
        token,
        Some(json!({ "first_name": first_name, "last_name": last_name })),
    )
    .await;
    created_id(response).await
}

pub async fn create_players(app: &TestApp, token: &str, count: usize) -> Vec<Uuid> {
    let mut ids = Vec::with_capacity(count);
    for i in 0..count {
        ids.push(create_player(app, token, &format!("Player{:02}", i), "Test").await);
    }
    ids
}

pub async fn create_match(app: &TestApp, token: &str, team_id: Uuid, opponent: &str, match_date: &str) -> Uuid {
    let response = make_authenticated_request(
        &Client::new(),
        Method::POST,
        &app.url("/matches"),
        token,
        Some(json!({
            "smoras_team_id": team_id,
            "opponent_name": opponent,
            "match_date": match_date,
            "location_type": "Home",
            "match_type": "League"
        })),
    )
    .await;
    created_id(response).await
}

pub async fn set_match_players(app: &TestApp, token: &str, match_id: Uuid, team_id: Uuid, player_ids: &[Uuid]) {
    let response = make_authenticated_request(
        &Client::new(),
        Method::PUT,
        &app.url(&format!("/matches/{}/players", match_id)),
        token,
        Some(json!({ "team_id": team_id, "player_ids": player_ids })),
    )
    .await;
    assert_eq!(200, response.status().as_u16());
}

pub async fn json_body(response: Response) -> Value {
    response.json().await.expect("Failed to parse response body")
}
