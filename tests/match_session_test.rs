use reqwest::{Client, Method};
use serde_json::{json, Value};
use uuid::Uuid;

mod common;
use common::helpers::{
    create_coach, create_match, create_players, create_team, json_body, make_authenticated_request,
    set_match_players, TestUser,
};
use common::utils::{spawn_app, TestApp};

struct Fixture {
    coach: TestUser,
    team_id: Uuid,
    match_id: Uuid,
    players: Vec<Uuid>,
}

/// A team with `squad` players all listed on one match.
async fn match_with_squad(app: &TestApp, squad: usize) -> Fixture {
    let coach = create_coach(app).await;
    let team_id = create_team(app, &coach.token, "Smørås G2014").await;
    let match_id = create_match(app, &coach.token, team_id, "Fana", "2025-05-03T10:00:00Z").await;
    let players = create_players(app, &coach.token, squad).await;
    set_match_players(app, &coach.token, match_id, team_id, &players).await;
    Fixture { coach, team_id, match_id, players }
}

async fn create_session(app: &TestApp, token: &str, match_id: Uuid) -> Value {
    let response = make_authenticated_request(
        &Client::new(),
        Method::POST,
        &app.url("/match-sessions"),
        token,
        Some(json!({ "match_id": match_id })),
    )
    .await;
    assert_eq!(201, response.status().as_u16());
    json_body(response).await["data"].clone()
}

async fn post(app: &TestApp, token: &str, path: &str, body: Option<Value>) -> reqwest::Response {
    make_authenticated_request(&Client::new(), Method::POST, &app.url(path), token, body).await
}

async fn get(app: &TestApp, token: &str, path: &str) -> reqwest::Response {
    make_authenticated_request(&Client::new(), Method::GET, &app.url(path), token, None).await
}

fn ids(players: &Value) -> Vec<Uuid> {
    players
        .as_array()
        .expect("expected an array of players")
        .iter()
        .filter_map(|p| p["player_id"].as_str().and_then(|id| Uuid::parse_str(id).ok()))
        .collect()
}

/// Move the running clock and every on-pitch stint `minutes` into the past.
async fn rewind(app: &TestApp, session_id: &str, minutes: i32) {
    let session_id = Uuid::parse_str(session_id).expect("Invalid session id");
    sqlx::query(
        "UPDATE match_sessions SET start_time = start_time - make_interval(mins => $2),
                last_substitution = last_substitution - make_interval(mins => $2)
         WHERE id = $1",
    )
    .bind(session_id)
    .bind(minutes)
    .execute(&app.db_pool)
    .await
    .expect("Failed to rewind session");
    sqlx::query(
        "UPDATE playing_times SET last_substitution_time = last_substitution_time - make_interval(mins => $2)
         WHERE match_session_id = $1 AND is_on_pitch",
    )
    .bind(session_id)
    .bind(minutes)
    .execute(&app.db_pool)
    .await
    .expect("Failed to rewind stints");
}

#[tokio::test]
async fn new_session_uses_defaults_and_imports_match_players() {
    let test_app = spawn_app().await;
    let fixture = match_with_squad(&test_app, 9).await;

    let session = create_session(&test_app, &fixture.coach.token, fixture.match_id).await;

    assert_eq!(session["name"], "Smørås G2014 vs Fana");
    assert_eq!(session["periods"], 2);
    assert_eq!(session["period_length"], 25);
    assert_eq!(session["substitution_interval"], 5);
    assert_eq!(session["is_active"], false);

    let session_id = session["id"].as_str().expect("No session id");
    let detail = json_body(get(&test_app, &fixture.coach.token, &format!("/match-sessions/{}", session_id)).await).await;
    assert_eq!(detail["data"]["players_on_pitch"].as_array().map(|p| p.len()), Some(7));
    assert_eq!(detail["data"]["players_on_bench"].as_array().map(|p| p.len()), Some(2));
    assert!(detail["data"]["current_game_time"].is_null());
}

#[tokio::test]
async fn session_for_unknown_match_is_404() {
    let test_app = spawn_app().await;
    let coach = create_coach(&test_app).await;

    let response = post(
        &test_app,
        &coach.token,
        "/match-sessions",
        Some(json!({ "match_id": Uuid::new_v4() })),
    )
    .await;

    assert_eq!(404, response.status().as_u16());
}

#[tokio::test]
async fn session_settings_are_validated() {
    let test_app = spawn_app().await;
    let fixture = match_with_squad(&test_app, 5).await;

    let response = post(
        &test_app,
        &fixture.coach.token,
        "/match-sessions",
        Some(json!({ "match_id": fixture.match_id, "periods": 0 })),
    )
    .await;

    assert_eq!(400, response.status().as_u16());
}

#[tokio::test]
async fn starting_requires_enough_players_and_cannot_repeat() {
    let test_app = spawn_app().await;
    let fixture = match_with_squad(&test_app, 8).await;
    let token = &fixture.coach.token;
    let session = create_session(&test_app, token, fixture.match_id).await;
    let session_id = session["id"].as_str().expect("No session id");

    let response = make_authenticated_request(
        &Client::new(),
        Method::PUT,
        &test_app.url(&format!("/match-sessions/{}/players", session_id)),
        token,
        Some(json!({ "player_ids": fixture.players, "starter_ids": &fixture.players[..3] })),
    )
    .await;
    assert_eq!(200, response.status().as_u16());

    let response = post(&test_app, token, &format!("/match-sessions/{}/start", session_id), None).await;
    assert_eq!(400, response.status().as_u16());

    let response = make_authenticated_request(
        &Client::new(),
        Method::PUT,
        &test_app.url(&format!("/match-sessions/{}/players", session_id)),
        token,
        Some(json!({ "player_ids": fixture.players, "starter_ids": &fixture.players[..7] })),
    )
    .await;
    assert_eq!(200, response.status().as_u16());

    let response = post(&test_app, token, &format!("/match-sessions/{}/start", session_id), None).await;
    assert_eq!(200, response.status().as_u16());
    let body = json_body(response).await;
    assert_eq!(body["data"]["is_active"], true);
    assert_eq!(body["data"]["current_period"], 1);

    let response = post(&test_app, token, &format!("/match-sessions/{}/start", session_id), None).await;
    assert_eq!(409, response.status().as_u16());
}

#[tokio::test]
async fn starters_must_be_in_the_squad() {
    let test_app = spawn_app().await;
    let fixture = match_with_squad(&test_app, 6).await;
    let session = create_session(&test_app, &fixture.coach.token, fixture.match_id).await;
    let session_id = session["id"].as_str().expect("No session id");

    let response = make_authenticated_request(
        &Client::new(),
        Method::PUT,
        &test_app.url(&format!("/match-sessions/{}/players", session_id)),
        &fixture.coach.token,
        Some(json!({ "player_ids": &fixture.players[..2], "starter_ids": [fixture.players[4]] })),
    )
    .await;

    assert_eq!(400, response.status().as_u16());
}

#[tokio::test]
async fn substitutions_swap_players_and_are_recorded() {
    let test_app = spawn_app().await;
    let fixture = match_with_squad(&test_app, 9).await;
    let token = &fixture.coach.token;
    let session = create_session(&test_app, token, fixture.match_id).await;
    let session_id = session["id"].as_str().expect("No session id");

    let detail = json_body(get(&test_app, token, &format!("/match-sessions/{}", session_id)).await).await;
    let on_pitch = ids(&detail["data"]["players_on_pitch"]);
    let on_bench = ids(&detail["data"]["players_on_bench"]);

    // Substitutions need a running clock
    let response = post(
        &test_app,
        token,
        &format!("/match-sessions/{}/substitutions", session_id),
        Some(json!({ "player_in_id": on_bench[0], "player_out_id": on_pitch[0] })),
    )
    .await;
    assert_eq!(400, response.status().as_u16());

    let response = post(&test_app, token, &format!("/match-sessions/{}/start", session_id), None).await;
    assert_eq!(200, response.status().as_u16());
    rewind(&test_app, session_id, 6).await;

    let response = post(
        &test_app,
        token,
        &format!("/match-sessions/{}/substitutions", session_id),
        Some(json!({ "player_in_id": on_bench[0], "player_out_id": on_pitch[0] })),
    )
    .await;
    assert_eq!(201, response.status().as_u16());
    let body = json_body(response).await;
    assert_eq!(body["data"]["minute"], 6);
    assert_eq!(body["data"]["period"], 1);

    // The player who came off is now on the bench, so cannot come off again
    let response = post(
        &test_app,
        token,
        &format!("/match-sessions/{}/substitutions", session_id),
        Some(json!({ "player_in_id": on_bench[1], "player_out_id": on_pitch[0] })),
    )
    .await;
    assert_eq!(400, response.status().as_u16());

    let response = post(
        &test_app,
        token,
        &format!("/match-sessions/{}/quick-sub", session_id),
        Some(json!({ "player_in": on_pitch[0], "player_out": on_bench[0] })),
    )
    .await;
    assert_eq!(200, response.status().as_u16());

    let detail = json_body(get(&test_app, token, &format!("/match-sessions/{}", session_id)).await).await;
    assert_eq!(detail["data"]["substitutions"].as_array().map(|s| s.len()), Some(2));
    assert!(ids(&detail["data"]["players_on_pitch"]).contains(&on_pitch[0]));
    assert!(ids(&detail["data"]["players_on_bench"]).contains(&on_bench[0]));

    let minutes: i32 = sqlx::query_scalar(
        "SELECT minutes_played FROM playing_times WHERE match_session_id = $1 AND player_id = $2",
    )
    .bind(Uuid::parse_str(session_id).expect("Invalid session id"))
    .bind(on_pitch[0])
    .fetch_one(&test_app.db_pool)
    .await
    .expect("Failed to fetch playing time");
    assert_eq!(minutes, 6);
}

#[tokio::test]
async fn recommendations_bring_on_the_least_played_bench_player() {
    let test_app = spawn_app().await;
    let fixture = match_with_squad(&test_app, 8).await;
    let token = &fixture.coach.token;
    let session = create_session(&test_app, token, fixture.match_id).await;
    let session_id = session["id"].as_str().expect("No session id");

    let response = get(&test_app, token, &format!("/match-sessions/{}/recommendations", session_id)).await;
    assert_eq!(400, response.status().as_u16());

    post(&test_app, token, &format!("/match-sessions/{}/start", session_id), None).await;
    rewind(&test_app, session_id, 10).await;

    let response = get(&test_app, token, &format!("/match-sessions/{}/recommendations", session_id)).await;
    assert_eq!(200, response.status().as_u16());
    let body = json_body(response).await;
    let recommendations = body["data"]["recommendations"].as_array().expect("recommendations should be an array");
    assert_eq!(recommendations.len(), 7);
    assert_eq!(recommendations[0]["player_out_minutes"], 10);
    assert_eq!(recommendations[0]["player_in_minutes"], 0);
    assert_eq!(body["data"]["match_info"]["period"], 1);
    assert_eq!(body["data"]["match_info"]["total_periods"], 2);

    let response = get(&test_app, token, &format!("/match-sessions/{}/playing-times", session_id)).await;
    assert_eq!(200, response.status().as_u16());
    let body = json_body(response).await;
    assert_eq!(body["data"]["minute_in_match"], 10);
    assert_eq!(body["data"]["playing_times"].as_array().map(|p| p.len()), Some(8));
}

#[tokio::test]
async fn stopping_banks_minutes_into_match_appearances() {
    let test_app = spawn_app().await;
    let fixture = match_with_squad(&test_app, 8).await;
    let token = &fixture.coach.token;
    let session = create_session(&test_app, token, fixture.match_id).await;
    let session_id = session["id"].as_str().expect("No session id");

    let response = post(&test_app, token, &format!("/match-sessions/{}/stop", session_id), None).await;
    assert_eq!(400, response.status().as_u16());

    post(&test_app, token, &format!("/match-sessions/{}/start", session_id), None).await;
    rewind(&test_app, session_id, 12).await;

    let response = post(&test_app, token, &format!("/match-sessions/{}/stop", session_id), None).await;
    assert_eq!(200, response.status().as_u16());
    let body = json_body(response).await;
    assert_eq!(body["data"]["is_active"], false);
    assert_eq!(body["data"]["match_complete"], false);
    assert_eq!(body["data"]["current_period"], 1);

    let minutes: Vec<(Option<i32>,)> = sqlx::query_as(
        "SELECT minutes_played FROM match_appearances WHERE match_id = $1 AND team_id = $2 ORDER BY minutes_played DESC",
    )
    .bind(fixture.match_id)
    .bind(fixture.team_id)
    .fetch_all(&test_app.db_pool)
    .await
    .expect("Failed to fetch appearances");
    let minutes: Vec<Option<i32>> = minutes.into_iter().map(|(m,)| m).collect();
    assert_eq!(minutes.len(), 8);
    assert_eq!(minutes.iter().filter(|m| **m == Some(12)).count(), 7);
    assert_eq!(minutes.iter().filter(|m| **m == Some(0)).count(), 1);
}

#[tokio::test]
async fn period_can_be_set_within_range() {
    let test_app = spawn_app().await;
    let fixture = match_with_squad(&test_app, 7).await;
    let token = &fixture.coach.token;
    let session = create_session(&test_app, token, fixture.match_id).await;
    let session_id = session["id"].as_str().expect("No session id");

    let response = post(
        &test_app,
        token,
        &format!("/match-sessions/{}/period", session_id),
        Some(json!({ "period": 3 })),
    )
    .await;
    assert_eq!(400, response.status().as_u16());

    let response = post(
        &test_app,
        token,
        &format!("/match-sessions/{}/period", session_id),
        Some(json!({ "period": 2 })),
    )
    .await;
    assert_eq!(200, response.status().as_u16());
    let body = json_body(response).await;
    assert_eq!(body["data"]["current_period"], 2);
    assert_eq!(body["data"]["elapsed_time"], 25 * 60);
}

#[tokio::test]
async fn pitch_view_is_available_before_kickoff() {
    let test_app = spawn_app().await;
    let fixture = match_with_squad(&test_app, 9).await;
    let token = &fixture.coach.token;
    let session = create_session(&test_app, token, fixture.match_id).await;
    let session_id = session["id"].as_str().expect("No session id");

    let response = get(&test_app, token, &format!("/match-sessions/{}/pitch", session_id)).await;

    assert_eq!(200, response.status().as_u16());
    let body = json_body(response).await;
    assert_eq!(body["data"]["is_active"], false);
    assert!(body["data"]["current_game_time"].is_null());
    assert_eq!(body["data"]["on_pitch"].as_array().map(|p| p.len()), Some(7));
    assert_eq!(body["data"]["on_bench"].as_array().map(|p| p.len()), Some(2));
}

#[tokio::test]
async fn sessions_are_listed_and_deleted() {
    let test_app = spawn_app().await;
    let fixture = match_with_squad(&test_app, 5).await;
    let token = &fixture.coach.token;
    let session = create_session(&test_app, token, fixture.match_id).await;
    let session_id = session["id"].as_str().expect("No session id");

    let response = get(&test_app, token, "/match-sessions").await;
    assert_eq!(200, response.status().as_u16());
    let body = json_body(response).await;
    let listed = body["data"]["upcoming"].as_array().map(|s| s.len()).unwrap_or(0)
        + body["data"]["past"].as_array().map(|s| s.len()).unwrap_or(0);
    assert_eq!(listed, 1);

    let response = make_authenticated_request(
        &Client::new(),
        Method::DELETE,
        &test_app.url(&format!("/match-sessions/{}", session_id)),
        token,
        None,
    )
    .await;
    assert_eq!(200, response.status().as_u16());

    let response = get(&test_app, token, &format!("/match-sessions/{}", session_id)).await;
    assert_eq!(404, response.status().as_u16());
}

#[tokio::test]
async fn resetting_match_time_banks_minutes_and_restarts_stints() {
    let test_app = spawn_app().await;
    let fixture = match_with_squad(&test_app, 8).await;
    let token = &fixture.coach.token;
    let session = create_session(&test_app, token, fixture.match_id).await;
    let session_id = session["id"].as_str().expect("No session id");

    // Allowed before kickoff, nothing to bank yet
    let response = post(&test_app, token, &format!("/match-sessions/{}/reset-time", session_id), None).await;
    assert_eq!(200, response.status().as_u16());

    post(&test_app, token, &format!("/match-sessions/{}/start", session_id), None).await;
    rewind(&test_app, session_id, 8).await;

    let response = post(&test_app, token, &format!("/match-sessions/{}/reset-time", session_id), None).await;
    assert_eq!(200, response.status().as_u16());
    let body = json_body(response).await;
    assert_eq!(body["data"]["is_active"], true);

    let banked: Vec<(i32, bool)> = sqlx::query_as(
        "SELECT minutes_played, is_on_pitch FROM playing_times WHERE match_session_id = $1",
    )
    .bind(Uuid::parse_str(session_id).expect("Invalid session id"))
    .fetch_all(&test_app.db_pool)
    .await
    .expect("Failed to fetch playing times");
    assert_eq!(banked.iter().filter(|(m, on)| *on && *m == 8).count(), 7);
    assert_eq!(banked.iter().filter(|(m, on)| !*on && *m == 0).count(), 1);

    let body = json_body(get(&test_app, token, &format!("/match-sessions/{}/pitch", session_id)).await).await;
    assert_eq!(body["data"]["current_game_time"], 0);

    // Banked minutes are not counted twice by the live view
    let body = json_body(get(&test_app, token, &format!("/match-sessions/{}/playing-times", session_id)).await).await;
    let most = body["data"]["playing_times"]
        .as_array()
        .expect("playing_times should be an array")
        .iter()
        .filter_map(|p| p["minutes"].as_i64())
        .max();
    assert_eq!(most, Some(8));
}

#[tokio::test]
async fn substitution_timer_can_be_restarted_without_touching_the_clock() {
    let test_app = spawn_app().await;
    let fixture = match_with_squad(&test_app, 8).await;
    let token = &fixture.coach.token;
    let session = create_session(&test_app, token, fixture.match_id).await;
    let session_id = session["id"].as_str().expect("No session id");

    post(&test_app, token, &format!("/match-sessions/{}/start", session_id), None).await;
    rewind(&test_app, session_id, 4).await;

    let body = json_body(get(&test_app, token, &format!("/match-sessions/{}/pitch", session_id)).await).await;
    assert_eq!(body["data"]["next_sub_countdown"]["value"], 1);
    assert_eq!(body["data"]["next_sub_countdown"]["unit"], "min");

    let response = post(
        &test_app,
        token,
        &format!("/match-sessions/{}/reset-substitution-timer", session_id),
        None,
    )
    .await;
    assert_eq!(200, response.status().as_u16());

    let body = json_body(get(&test_app, token, &format!("/match-sessions/{}/pitch", session_id)).await).await;
    assert_eq!(body["data"]["next_sub_countdown"]["value"], 5);
    assert_eq!(body["data"]["next_sub_countdown"]["critical"], false);
    assert_eq!(body["data"]["current_game_time"], 4);

    let response = post(
        &test_app,
        token,
        &format!("/match-sessions/{}/reset-substitution-timer", Uuid::new_v4()),
        None,
    )
    .await;
    assert_eq!(404, response.status().as_u16());
}

#[tokio::test]
async fn import_prefers_the_saved_lineup_over_the_match_squad() {
    let test_app = spawn_app().await;
    let fixture = match_with_squad(&test_app, 9).await;
    let token = &fixture.coach.token;
    let players = &fixture.players;

    let response = post(
        &test_app,
        token,
        "/lineups",
        Some(json!({ "name": "Fana away", "team_id": fixture.team_id, "match_id": fixture.match_id })),
    )
    .await;
    assert_eq!(201, response.status().as_u16());
    let lineup_id = json_body(response).await["data"]["id"].as_str().expect("No lineup id").to_string();

    let response = post(
        &test_app,
        token,
        &format!("/lineups/{}/positions", lineup_id),
        Some(json!({
            "positions": [
                { "player_id": players[0], "x": 10.0, "y": 50.0, "is_starter": true },
                { "player_id": players[1], "x": 30.0, "y": 40.0, "is_starter": true },
                { "player_id": players[2], "x": 1.0, "y": 10.0, "is_starter": false }
            ]
        })),
    )
    .await;
    assert_eq!(200, response.status().as_u16());

    let session = create_session(&test_app, token, fixture.match_id).await;
    let session_id = session["id"].as_str().expect("No session id");

    let response = post(&test_app, token, &format!("/match-sessions/{}/import", session_id), None).await;
    assert_eq!(200, response.status().as_u16());
    let body = json_body(response).await;
    assert_eq!(body["message"], "Imported 9 players");
    assert_eq!(body["data"]["starters"], 2);
    assert_eq!(body["data"]["bench"], 7);

    let detail = json_body(get(&test_app, token, &format!("/match-sessions/{}", session_id)).await).await;
    let mut on_pitch = ids(&detail["data"]["players_on_pitch"]);
    on_pitch.sort();
    let mut expected = vec![players[0], players[1]];
    expected.sort();
    assert_eq!(on_pitch, expected);
    let on_bench = ids(&detail["data"]["players_on_bench"]);
    assert_eq!(on_bench.len(), 7);
    assert!(on_bench.contains(&players[2]));
    assert!(on_bench.contains(&players[8]));
}
