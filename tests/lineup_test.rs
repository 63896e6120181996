use reqwest::{Client, Method};
use serde_json::{json, Value};
use uuid::Uuid;

mod common;
use common::helpers::{
    create_coach, create_match, create_players, create_team, json_body, make_authenticated_request,
    set_match_players,
};
use common::utils::{spawn_app, TestApp};

async fn send(app: &TestApp, method: Method, token: &str, path: &str, body: Option<Value>) -> reqwest::Response {
    make_authenticated_request(&Client::new(), method, &app.url(path), token, body).await
}

async fn create_formation(app: &TestApp, token: &str, player_count: i32, structure: &str) -> reqwest::Response {
    send(
        app,
        Method::POST,
        token,
        "/formations",
        Some(json!({
            "name": format!("{}-a-side {}", player_count, structure),
            "player_count": player_count,
            "formation_structure": structure
        })),
    )
    .await
}

#[tokio::test]
async fn default_positions_are_only_added_once() {
    let test_app = spawn_app().await;
    let coach = create_coach(&test_app).await;

    let response = send(&test_app, Method::POST, &coach.token, "/lineup-positions/defaults", None).await;
    assert_eq!(200, response.status().as_u16());
    let body = json_body(response).await;
    assert_eq!(body["data"]["added"], 12);

    let response = send(&test_app, Method::POST, &coach.token, "/lineup-positions/defaults", None).await;
    let body = json_body(response).await;
    assert_eq!(body["data"]["added"], 0);

    let response = send(&test_app, Method::GET, &coach.token, "/lineup-positions", None).await;
    let body = json_body(response).await;
    assert_eq!(body["data"].as_array().map(|p| p.len()), Some(12));
}

#[tokio::test]
async fn formations_must_fit_the_team_size() {
    let test_app = spawn_app().await;
    let coach = create_coach(&test_app).await;

    let response = create_formation(&test_app, &coach.token, 7, "2-3-1").await;
    assert_eq!(201, response.status().as_u16());
    let body = json_body(response).await;
    assert_eq!(body["data"]["player_count"], 7);
    assert_eq!(
        body["data"]["position_counts"],
        json!({"goalkeepers": 1, "defenders": 2, "midfielders": 3, "forwards": 1})
    );

    let path = format!("/formations/{}", body["data"]["id"].as_str().expect("Formation id missing"));
    let response = send(&test_app, Method::GET, &coach.token, &path, None).await;
    let body = json_body(response).await;
    assert_eq!(body["data"]["position_counts"]["defenders"], 2);

    for (player_count, structure) in [
        (7, "3-3-1"),
        (6, "2-2-1"),
        (7, "2-x-1"),
        (11, "4-0-6"),
        (11, "4294967295-2"),
        (11, "4294967295-11"),
    ] {
        let response = create_formation(&test_app, &coach.token, player_count, structure).await;
        assert_eq!(
            400,
            response.status().as_u16(),
            "Expected 400 for {}-a-side {}",
            player_count,
            structure
        );
    }
}

#[tokio::test]
async fn lineup_for_a_match_is_seeded_from_its_squad() {
    let test_app = spawn_app().await;
    let coach = create_coach(&test_app).await;
    let token = &coach.token;
    let team_id = create_team(&test_app, token, "Smørås").await;
    let match_id = create_match(&test_app, token, team_id, "Fana", "2025-05-03T10:00:00Z").await;
    let players = create_players(&test_app, token, 9).await;
    set_match_players(&test_app, token, match_id, team_id, &players).await;
    send(&test_app, Method::POST, token, "/lineup-positions/defaults", None).await;
    let formation = json_body(create_formation(&test_app, token, 7, "2-3-1").await).await;

    let response = send(
        &test_app,
        Method::POST,
        token,
        "/lineups",
        Some(json!({
            "name": "Fana away",
            "team_id": team_id,
            "match_id": match_id,
            "formation_id": formation["data"]["id"]
        })),
    )
    .await;

    assert_eq!(201, response.status().as_u16());
    let body = json_body(response).await;
    let starters = body["data"]["starters"].as_array().expect("starters should be an array");
    let substitutes = body["data"]["substitutes"].as_array().expect("substitutes should be an array");
    assert_eq!(starters.len(), 7);
    assert_eq!(substitutes.len(), 2);
    assert_eq!(body["data"]["formation"]["formation_structure"], "2-3-1");
    assert_eq!(body["data"]["direction"], "first_period");

    let keeper = starters
        .iter()
        .find(|s| s["player_id"] == players[0].to_string())
        .expect("first player should start");
    assert_eq!(keeper["position_short_name"], "GK");
    assert_eq!(keeper["jersey_number"], 1);
}

#[tokio::test]
async fn lineup_requires_known_team_and_match() {
    let test_app = spawn_app().await;
    let coach = create_coach(&test_app).await;
    let team_id = create_team(&test_app, &coach.token, "Smørås").await;

    let response = send(
        &test_app,
        Method::POST,
        &coach.token,
        "/lineups",
        Some(json!({ "name": "Nowhere", "team_id": Uuid::new_v4() })),
    )
    .await;
    assert_eq!(404, response.status().as_u16());

    let response = send(
        &test_app,
        Method::POST,
        &coach.token,
        "/lineups",
        Some(json!({ "name": "Ghost match", "team_id": team_id, "match_id": Uuid::new_v4() })),
    )
    .await;
    assert_eq!(404, response.status().as_u16());

    let response = send(
        &test_app,
        Method::POST,
        &coach.token,
        "/lineups",
        Some(json!({ "name": "", "team_id": team_id })),
    )
    .await;
    assert_eq!(400, response.status().as_u16());
}

#[tokio::test]
async fn saving_positions_replaces_the_placements() {
    let test_app = spawn_app().await;
    let coach = create_coach(&test_app).await;
    let token = &coach.token;
    let team_id = create_team(&test_app, token, "Smørås").await;
    let players = create_players(&test_app, token, 3).await;

    let lineup = json_body(
        send(&test_app, Method::POST, token, "/lineups", Some(json!({ "name": "Training", "team_id": team_id }))).await,
    )
    .await;
    let lineup_id = lineup["data"]["id"].as_str().expect("No lineup id").to_string();

    let response = send(
        &test_app,
        Method::POST,
        token,
        &format!("/lineups/{}/positions", lineup_id),
        Some(json!({
            "positions": [
                { "player_id": players[0], "x": 50.0, "y": 90.0, "jersey_number": 1 },
                { "player_id": players[1], "x": 30.0, "y": 60.0 },
                { "player_id": players[2], "x": 1.0, "y": 10.0, "is_starter": false }
            ],
            "direction": "second_period"
        })),
    )
    .await;
    assert_eq!(200, response.status().as_u16());
    let body = json_body(response).await;
    assert_eq!(body["message"], "Saved 3 player positions");
    assert_eq!(body["data"]["starters"].as_array().map(|s| s.len()), Some(2));
    assert_eq!(body["data"]["substitutes"].as_array().map(|s| s.len()), Some(1));
    assert_eq!(body["data"]["direction"], "second_period");

    let response = send(
        &test_app,
        Method::POST,
        token,
        &format!("/lineups/{}/positions", lineup_id),
        Some(json!({ "positions": [{ "player_id": players[1], "x": 40.0, "y": 55.0 }] })),
    )
    .await;
    let body = json_body(response).await;
    let starters = body["data"]["starters"].as_array().expect("starters should be an array");
    assert_eq!(starters.len(), 1);
    assert_eq!(starters[0]["x_coordinate"], 40.0);
    assert_eq!(body["data"]["substitutes"].as_array().map(|s| s.len()), Some(0));
    assert_eq!(body["data"]["direction"], "second_period");

    let response = send(
        &test_app,
        Method::POST,
        token,
        &format!("/lineups/{}/positions", lineup_id),
        Some(json!({ "positions": [{ "player_id": Uuid::new_v4(), "x": 1.0, "y": 1.0 }] })),
    )
    .await;
    assert_eq!(400, response.status().as_u16());
}

#[tokio::test]
async fn lineups_can_be_duplicated_and_trimmed() {
    let test_app = spawn_app().await;
    let coach = create_coach(&test_app).await;
    let token = &coach.token;
    let team_id = create_team(&test_app, token, "Smørås").await;
    let players = create_players(&test_app, token, 2).await;

    let lineup = json_body(
        send(&test_app, Method::POST, token, "/lineups", Some(json!({ "name": "Cup final", "team_id": team_id }))).await,
    )
    .await;
    let lineup_id = lineup["data"]["id"].as_str().expect("No lineup id").to_string();
    send(
        &test_app,
        Method::POST,
        token,
        &format!("/lineups/{}/positions", lineup_id),
        Some(json!({
            "positions": [
                { "player_id": players[0], "x": 50.0, "y": 90.0 },
                { "player_id": players[1], "x": 30.0, "y": 60.0 }
            ]
        })),
    )
    .await;

    let response = send(&test_app, Method::POST, token, &format!("/lineups/{}/duplicate", lineup_id), None).await;
    assert_eq!(201, response.status().as_u16());
    let copy = json_body(response).await;
    assert_eq!(copy["data"]["name"], "Cup final (Copy)");
    assert_ne!(copy["data"]["id"], lineup["data"]["id"]);
    assert_eq!(copy["data"]["starters"].as_array().map(|s| s.len()), Some(2));
    let copy_id = copy["data"]["id"].as_str().expect("No copy id").to_string();

    let response = send(
        &test_app,
        Method::DELETE,
        token,
        &format!("/lineups/{}/players/{}", copy_id, players[0]),
        None,
    )
    .await;
    assert_eq!(200, response.status().as_u16());

    let response = send(
        &test_app,
        Method::DELETE,
        token,
        &format!("/lineups/{}/players/{}", copy_id, players[0]),
        None,
    )
    .await;
    assert_eq!(404, response.status().as_u16());

    // The original keeps both players
    let original = json_body(send(&test_app, Method::GET, token, &format!("/lineups/{}", lineup_id), None).await).await;
    assert_eq!(original["data"]["starters"].as_array().map(|s| s.len()), Some(2));

    let response = send(&test_app, Method::GET, token, &format!("/lineups?team_id={}", team_id), None).await;
    let body = json_body(response).await;
    assert_eq!(body["data"].as_array().map(|l| l.len()), Some(2));
}

#[tokio::test]
async fn template_lineup_placements_are_copied() {
    let test_app = spawn_app().await;
    let coach = create_coach(&test_app).await;
    let token = &coach.token;
    let team_id = create_team(&test_app, token, "Smørås").await;
    let players = create_players(&test_app, token, 2).await;

    let template = json_body(
        send(
            &test_app,
            Method::POST,
            token,
            "/lineups",
            Some(json!({ "name": "Base 2-3-1", "team_id": team_id, "is_template": true })),
        )
        .await,
    )
    .await;
    let template_id = template["data"]["id"].as_str().expect("No template id").to_string();
    send(
        &test_app,
        Method::POST,
        token,
        &format!("/lineups/{}/positions", template_id),
        Some(json!({
            "positions": [
                { "player_id": players[0], "x": 50.0, "y": 90.0 },
                { "player_id": players[1], "x": 1.0, "y": 10.0, "is_starter": false }
            ]
        })),
    )
    .await;

    let response = send(
        &test_app,
        Method::POST,
        token,
        "/lineups",
        Some(json!({ "name": "Saturday", "team_id": team_id, "template_id": template_id })),
    )
    .await;

    assert_eq!(201, response.status().as_u16());
    let body = json_body(response).await;
    assert_eq!(body["data"]["is_template"], false);
    assert_eq!(body["data"]["starters"].as_array().map(|s| s.len()), Some(1));
    assert_eq!(body["data"]["substitutes"].as_array().map(|s| s.len()), Some(1));
    assert_eq!(body["data"]["starters"][0]["y_coordinate"], 90.0);
}
