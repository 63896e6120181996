use reqwest::{Client, Method};
use serde_json::json;

mod common;
use common::helpers::{
    create_admin, create_approved_player, create_coach, create_players, create_team, json_body, login,
    make_authenticated_request, register_user, TEST_PASSWORD,
};
use common::utils::spawn_app;

#[tokio::test]
async fn non_admins_cannot_reach_admin_routes() {
    let test_app = spawn_app().await;
    let client = Client::new();
    let coach = create_coach(&test_app).await;

    let response =
        make_authenticated_request(&client, Method::GET, &test_app.url("/admin/users"), &coach.token, None).await;
    assert_eq!(403, response.status().as_u16());

    let response = client
        .get(&test_app.url("/admin/users"))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(401, response.status().as_u16());
}

#[tokio::test]
async fn admin_lists_users_filtered_by_status() {
    let test_app = spawn_app().await;
    let client = Client::new();
    let admin = create_admin(&test_app).await;
    register_user(&test_app, "waiting1").await;
    register_user(&test_app, "waiting2").await;

    let response = make_authenticated_request(
        &client,
        Method::GET,
        &test_app.url("/admin/users?status=pending"),
        &admin.token,
        None,
    )
    .await;

    assert_eq!(200, response.status().as_u16());
    let body = json_body(response).await;
    let users = body["data"].as_array().expect("data should be an array");
    assert_eq!(users.len(), 2);
    assert!(users.iter().all(|u| u["status"] == "pending"));

    let response =
        make_authenticated_request(&client, Method::GET, &test_app.url("/admin/users"), &admin.token, None).await;
    let body = json_body(response).await;
    assert_eq!(body["data"].as_array().map(|a| a.len()), Some(3));
}

#[tokio::test]
async fn admin_approval_unlocks_club_data() {
    let test_app = spawn_app().await;
    let client = Client::new();
    let admin = create_admin(&test_app).await;

    let registered = json_body(register_user(&test_app, "newbie").await).await;
    let user_id = registered["data"]["user_id"].as_str().expect("No user id").to_string();

    let response = make_authenticated_request(
        &client,
        Method::PATCH,
        &test_app.url(&format!("/admin/users/{}", user_id)),
        &admin.token,
        Some(json!({ "status": "approved", "role": "coach" })),
    )
    .await;
    assert_eq!(200, response.status().as_u16());
    let body = json_body(response).await;
    assert_eq!(body["data"]["status"], "approved");
    assert_eq!(body["data"]["role"], "coach");

    // A fresh token carries the new status
    let login_body = json_body(login(&test_app, "newbie", TEST_PASSWORD).await).await;
    let token = login_body["token"].as_str().expect("No token").to_string();
    let response = make_authenticated_request(&client, Method::GET, &test_app.url("/teams"), &token, None).await;
    assert_eq!(200, response.status().as_u16());
}

#[tokio::test]
async fn admin_cannot_change_own_status() {
    let test_app = spawn_app().await;
    let admin = create_admin(&test_app).await;

    let response = make_authenticated_request(
        &Client::new(),
        Method::PATCH,
        &test_app.url(&format!("/admin/users/{}", admin.user_id)),
        &admin.token,
        Some(json!({ "status": "rejected" })),
    )
    .await;

    assert_eq!(400, response.status().as_u16());
}

#[tokio::test]
async fn updating_unknown_user_returns_404() {
    let test_app = spawn_app().await;
    let admin = create_admin(&test_app).await;

    let response = make_authenticated_request(
        &Client::new(),
        Method::PATCH,
        &test_app.url(&format!("/admin/users/{}", uuid::Uuid::new_v4())),
        &admin.token,
        Some(json!({ "status": "approved" })),
    )
    .await;

    assert_eq!(404, response.status().as_u16());
}

#[tokio::test]
async fn linking_account_to_unknown_player_is_rejected() {
    let test_app = spawn_app().await;
    let admin = create_admin(&test_app).await;
    let player = create_approved_player(&test_app).await;

    let response = make_authenticated_request(
        &Client::new(),
        Method::PATCH,
        &test_app.url(&format!("/admin/users/{}", player.user_id)),
        &admin.token,
        Some(json!({ "player_id": uuid::Uuid::new_v4() })),
    )
    .await;

    assert_eq!(400, response.status().as_u16());
}

#[tokio::test]
async fn database_status_counts_club_data() {
    let test_app = spawn_app().await;
    let client = Client::new();
    let admin = create_admin(&test_app).await;
    create_team(&test_app, &admin.token, "U12").await;
    create_players(&test_app, &admin.token, 3).await;

    let response = make_authenticated_request(
        &client,
        Method::GET,
        &test_app.url("/admin/database/status"),
        &admin.token,
        None,
    )
    .await;

    assert_eq!(200, response.status().as_u16());
    let body = json_body(response).await;
    assert_eq!(body["data"]["teams"], 1);
    assert_eq!(body["data"]["players"], 3);
    assert_eq!(body["data"]["users"], 1);
}

#[tokio::test]
async fn admin_creates_and_lists_backups() {
    let test_app = spawn_app().await;
    let client = Client::new();
    let admin = create_admin(&test_app).await;
    create_team(&test_app, &admin.token, "U12").await;
    create_players(&test_app, &admin.token, 5).await;

    let response = make_authenticated_request(
        &client,
        Method::POST,
        &test_app.url("/admin/backups"),
        &admin.token,
        Some(json!({ "label": "before_season" })),
    )
    .await;
    assert_eq!(201, response.status().as_u16());
    let body = json_body(response).await;
    assert_eq!(body["data"]["backup"]["label"], "before_season");
    assert_eq!(body["data"]["verdict"]["teams"], 1);
    assert_eq!(body["data"]["verdict"]["players"], 5);
    assert_eq!(body["data"]["verdict"]["problems"].as_array().map(|p| p.len()), Some(0));

    let response = make_authenticated_request(
        &client,
        Method::POST,
        &test_app.url("/admin/backups"),
        &admin.token,
        Some(json!({ "label": "Not Allowed!" })),
    )
    .await;
    assert_eq!(400, response.status().as_u16());

    let response =
        make_authenticated_request(&client, Method::GET, &test_app.url("/admin/backups"), &admin.token, None).await;
    assert_eq!(200, response.status().as_u16());
    let body = json_body(response).await;
    assert_eq!(body["data"]["persistent"].as_array().map(|b| b.len()), Some(1));
    assert_eq!(body["data"]["deployment"].as_array().map(|b| b.len()), Some(0));
}
