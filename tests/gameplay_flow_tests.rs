use axum::{
    body::Body,
    http::{Request, StatusCode},
    routing::{get, post},
    Router,
};
use chrono::{Duration, Utc};
use cortexbench::{games, leaderboard, population, scores, AppState, MemoryBackend};
use std::sync::Arc;
use tower::ServiceExt; // for `oneshot`

const ADMIN_SECRET: &str = "integration-secret";

fn build_app(backend: MemoryBackend) -> (Router, AppState) {
    let mut state = AppState::new(
        Arc::new(backend.clone()),
        Arc::new(backend.clone()),
        Arc::new(backend),
    );
    state.admin_secret = ADMIN_SECRET.to_string();

    let router = Router::new()
        .route("/api/health", get(|| async { "ok" }))
        .route("/api/games", get(games::handlers::list_games))
        .route("/api/scores", post(scores::handlers::submit_score))
        .route(
            "/api/leaderboards/:game_slug",
            get(leaderboard::handlers::get_leaderboard),
        )
        .route(
            "/api/population/summary",
            get(population::handlers::population_summary),
        )
        .route(
            "/api/admin/recompute-population",
            post(population::handlers::recompute_population),
        )
        .with_state(state.clone());
    (router, state)
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_score(game_slug: &str, value: f64, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/scores")
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder
        .body(Body::from(
            serde_json::json!({ "gameSlug": game_slug, "value": value }).to_string(),
        ))
        .unwrap()
}

#[tokio::test]
async fn health_and_game_catalog_are_served() {
    let (app, _) = build_app(MemoryBackend::new());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/games")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let games = json_body(response).await;
    assert_eq!(games.as_array().unwrap().len(), 11);
}

#[tokio::test]
async fn authenticated_submissions_flow_into_the_leaderboard() {
    let backend = MemoryBackend::new();
    let alice = backend.register_user("alice", "UTC");
    let bob = backend.register_user("bob", "UTC");
    let (app, state) = build_app(backend);

    let alice_token = state.token_config.create_token(alice).unwrap();
    let bob_token = state.token_config.create_token(bob).unwrap();

    // Lower is better for reaction-time, so bob's 210ms should lead.
    for (value, token) in [
        (250.0, &alice_token),
        (230.0, &alice_token),
        (210.0, &bob_token),
    ] {
        let response = app
            .clone()
            .oneshot(post_score("reaction-time", value, Some(token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/leaderboards/reaction-time")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let board = json_body(response).await;
    let entries = board["leaderboard"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["displayName"], "bob");
    assert_eq!(entries[0]["score"], 210.0);
    assert_eq!(entries[0]["rank"], 1);
    assert_eq!(entries[1]["displayName"], "alice");
    assert_eq!(entries[1]["score"], 230.0);
}

#[tokio::test]
async fn streak_and_badges_surface_in_submission_response() {
    let backend = MemoryBackend::new();
    let user = backend.register_user("steady", "UTC");
    let now = Utc::now();
    backend.seed_result(Some(user), "chimp-test", 8.0, now - Duration::days(2));
    backend.seed_result(Some(user), "chimp-test", 8.0, now - Duration::days(1));
    let (app, state) = build_app(backend);
    let token = state.token_config.create_token(user).unwrap();

    let response = app
        .oneshot(post_score("chimp-test", 9.0, Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = json_body(response).await;
    let badges: Vec<&str> = body["newBadges"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b.as_str().unwrap())
        .collect();
    assert!(badges.contains(&"first_game"));
    assert!(badges.contains(&"streak_3"));
}

#[tokio::test]
async fn population_recompute_then_summary_reflects_submissions() {
    let backend = MemoryBackend::new();
    let (app, _) = build_app(backend);

    for value in [200.0, 300.0, 400.0] {
        let response = app
            .clone()
            .oneshot(post_score("reaction-time", value, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/admin/recompute-population")
                .header("x-admin-secret", ADMIN_SECRET)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["processed"], 1);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/population/summary")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let summaries = json_body(response).await;
    let reaction = summaries
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["gameSlug"] == "reaction-time")
        .unwrap()
        .clone();
    assert_eq!(reaction["hasData"], true);
    assert_eq!(reaction["plays"], 3);
    assert_eq!(reaction["mean"], 300.0);
    assert_eq!(reaction["p50"], 300.0);

    let chimp = summaries
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["gameSlug"] == "chimp-test")
        .unwrap()
        .clone();
    assert_eq!(chimp["hasData"], false);
    assert_eq!(chimp["plays"], 0);
}

#[tokio::test]
async fn recompute_without_secret_is_rejected() {
    let (app, _) = build_app(MemoryBackend::new());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/admin/recompute-population")
                .header("x-admin-secret", "wrong")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
