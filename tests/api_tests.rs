//! End-to-end API tests: the router runs against real in-memory state, and
//! grading calls go to a local mock of the generative-language endpoint.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use designgym_backend::grader::Grader;
use designgym_backend::routes::build_router;
use designgym_backend::state::AppState;

/// Spawn a catch-all HTTP server that answers every request with a Gemini
/// style envelope wrapping `reply_text`. Returns its base URL.
async fn spawn_mock_grading_endpoint(reply_text: &str) -> String {
    let reply = json!({
        "candidates": [
            {"content": {"parts": [{"text": reply_text}]}}
        ]
    });
    let app = Router::new().fallback(move || {
        let reply = reply.clone();
        async move { axum::Json(reply) }
    });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock endpoint");
    let addr = listener.local_addr().expect("mock addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve mock endpoint");
    });
    format!("http://{addr}")
}

/// App with grading wired to a mock endpoint.
async fn create_app_with_grader(reply_text: &str) -> Router {
    let base_url = spawn_mock_grading_endpoint(reply_text).await;
    let mut state = AppState::new().await;
    state.grader = Some(Grader {
        client: reqwest::Client::new(),
        api_key: "test-key".into(),
        base_url,
        model: "mock-model".into(),
    });
    build_router(Arc::new(state))
}

/// App with no grading backend at all.
async fn create_app_without_grader() -> Router {
    let mut state = AppState::new().await;
    state.grader = None;
    build_router(Arc::new(state))
}

fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
        builder = builder.header("authorization", format!("Bearer {t}"));
    }
    match body {
        Some(v) => builder
            .header("content-type", "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn body_json(res: Response) -> Value {
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn send(app: &Router, req: Request<Body>) -> Response {
    app.clone().oneshot(req).await.unwrap()
}

/// Seed the sample bank and open a session; returns (token, parking lot id).
async fn seeded_session(app: &Router) -> (String, String) {
    let res = send(app, request("POST", "/api/v1/seed", None, None)).await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = send(
        app,
        request(
            "POST",
            "/api/v1/auth/signup",
            None,
            Some(json!({"email": "dev@example.com", "password": "secret1", "username": "dev"})),
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = send(
        app,
        request(
            "POST",
            "/api/v1/auth/login",
            None,
            Some(json!({"email": "dev@example.com", "password": "secret1"})),
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let session = body_json(res).await;
    let token = session["token"].as_str().unwrap().to_string();

    let res = send(app, request("GET", "/api/v1/problems", None, None)).await;
    let problems = body_json(res).await;
    let parking_id = problems
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["title"] == "Parking Lot System")
        .expect("parking lot seeded")["id"]
        .as_str()
        .unwrap()
        .to_string();

    (token, parking_id)
}

#[tokio::test]
async fn health_endpoint_answers() {
    let app = create_app_without_grader().await;
    let res = send(&app, request("GET", "/api/v1/health", None, None)).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await, json!({"ok": true}));
}

#[tokio::test]
async fn signup_validation_happens_before_account_creation() {
    let app = create_app_without_grader().await;

    let res = send(
        &app,
        request(
            "POST",
            "/api/v1/auth/signup",
            None,
            Some(json!({"email": "a@b.c", "password": "short", "username": "u"})),
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = body_json(res).await;
    assert!(body["message"].as_str().unwrap().contains("at least 6 characters"));

    let res = send(
        &app,
        request(
            "POST",
            "/api/v1/auth/signup",
            None,
            Some(json!({"email": "not-an-email", "password": "longenough", "username": "u"})),
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn seeding_is_idempotent_and_catalog_is_ordered_by_title() {
    let app = create_app_without_grader().await;

    let res = send(&app, request("POST", "/api/v1/seed", None, None)).await;
    assert_eq!(
        body_json(res).await,
        json!({"problems_added": 5, "levels_added": 21})
    );
    let res = send(&app, request("POST", "/api/v1/seed", None, None)).await;
    assert_eq!(
        body_json(res).await,
        json!({"problems_added": 0, "levels_added": 0})
    );

    let res = send(&app, request("GET", "/api/v1/problems", None, None)).await;
    let titles: Vec<String> = body_json(res)
        .await
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["title"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(
        titles,
        vec![
            "Coffee Vending Machine",
            "Hotel Booking System",
            "Library Management System",
            "Parking Lot System",
            "Ride-Sharing Service",
        ]
    );
}

#[tokio::test]
async fn problem_detail_lists_levels_in_order() {
    let app = create_app_without_grader().await;
    let (_, parking_id) = seeded_session(&app).await;

    let res = send(
        &app,
        request("GET", &format!("/api/v1/problems/{parking_id}"), None, None),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let detail = body_json(res).await;
    assert_eq!(detail["problem"]["difficulty"], "Medium");
    let numbers: Vec<u64> = detail["levels"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["level_number"].as_u64().unwrap())
        .collect();
    assert_eq!(numbers, vec![1, 2, 3, 4]);
}

#[tokio::test]
async fn submitting_requires_a_session_and_a_grading_backend() {
    let app = create_app_without_grader().await;
    let (token, parking_id) = seeded_session(&app).await;

    let res = send(
        &app,
        request(
            "POST",
            &format!("/api/v1/problems/{parking_id}/submit"),
            None,
            Some(json!({"diagram_json": {}})),
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = send(
        &app,
        request(
            "POST",
            &format!("/api/v1/problems/{parking_id}/submit"),
            Some(&token),
            Some(json!({"diagram_json": {}})),
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    let body = body_json(res).await;
    assert!(body["feedback"].as_str().unwrap().contains("not configured"));
}

#[tokio::test]
async fn gated_progression_end_to_end() {
    // The mock grader scores every design 65: enough to record, not enough
    // to unlock.
    let app = create_app_with_grader(
        "```json\n{\"score\": 65, \"feedback\": \"Missing payment handling.\"}\n```",
    )
    .await;
    let (token, parking_id) = seeded_session(&app).await;
    let level_uri = format!("/api/v1/problems/{parking_id}/level");

    // Fresh session: moving off level 1 needs confirmation.
    let res = send(
        &app,
        request("POST", &level_uri, Some(&token), Some(json!({"targetIndex": 1}))),
    )
    .await;
    let body = body_json(res).await;
    assert_eq!(body["requiresConfirmation"], true);
    assert_eq!(body["currentIndex"], 0);

    // Confirming forces the move to index 1 (level_number 2).
    let res = send(
        &app,
        request(
            "POST",
            &level_uri,
            Some(&token),
            Some(json!({"targetIndex": 1, "confirm": true})),
        ),
    )
    .await;
    let body = body_json(res).await;
    assert_eq!(body["moved"], true);
    assert_eq!(body["currentIndex"], 1);

    // Submit a diagram; the mock endpoint grades it 65.
    let res = send(
        &app,
        request(
            "POST",
            &format!("/api/v1/problems/{parking_id}/submit"),
            Some(&token),
            Some(json!({"diagram_json": {"nodes": [{"label": "ParkingLot"}]}})),
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let verdict = body_json(res).await;
    assert_eq!(verdict["score"], 65);
    assert_eq!(verdict["feedback"], "Missing payment handling.");

    // 65 < 70: jumping to index 3 is withheld.
    let res = send(
        &app,
        request("POST", &level_uri, Some(&token), Some(json!({"targetIndex": 3}))),
    )
    .await;
    let body = body_json(res).await;
    assert_eq!(body["requiresConfirmation"], true);
    assert_eq!(body["currentIndex"], 1);

    // Confirming moves anyway and clears the pending result display.
    let res = send(
        &app,
        request(
            "POST",
            &level_uri,
            Some(&token),
            Some(json!({"targetIndex": 3, "confirm": true})),
        ),
    )
    .await;
    let body = body_json(res).await;
    assert_eq!(body["moved"], true);
    assert_eq!(body["currentIndex"], 3);
    assert_eq!(body["lastResult"], Value::Null);

    // The recorded submission resolves to level 2 of the parking problem.
    let res = send(
        &app,
        request(
            "GET",
            &format!("/api/v1/problems/{parking_id}/submissions"),
            Some(&token),
            None,
        ),
    )
    .await;
    let rows = body_json(res).await;
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["score"], 65);
    assert_eq!(rows[0]["level_number"], 2);
    assert_eq!(rows[0]["problem_title"], "Parking Lot System");

    // Level filter matches on the resolved level number, exactly.
    let res = send(
        &app,
        request(
            "GET",
            &format!("/api/v1/problems/{parking_id}/submissions?level=2"),
            Some(&token),
            None,
        ),
    )
    .await;
    assert_eq!(body_json(res).await.as_array().unwrap().len(), 1);
    let res = send(
        &app,
        request(
            "GET",
            &format!("/api/v1/problems/{parking_id}/submissions?level=3"),
            Some(&token),
            None,
        ),
    )
    .await;
    assert_eq!(body_json(res).await.as_array().unwrap().len(), 0);

    let res = send(
        &app,
        request(
            "GET",
            &format!("/api/v1/problems/{parking_id}/submissions/count"),
            Some(&token),
            None,
        ),
    )
    .await;
    assert_eq!(body_json(res).await, json!({"count": 1}));
}

#[tokio::test]
async fn a_passing_score_unlocks_the_next_level_without_confirmation() {
    let app = create_app_with_grader("{\"score\": 90, \"feedback\": \"Excellent layering.\"}").await;
    let (token, parking_id) = seeded_session(&app).await;

    let res = send(
        &app,
        request(
            "POST",
            &format!("/api/v1/problems/{parking_id}/submit"),
            Some(&token),
            Some(json!({"diagram_json": {"nodes": []}})),
        ),
    )
    .await;
    assert_eq!(body_json(res).await["score"], 90);

    let res = send(
        &app,
        request(
            "POST",
            &format!("/api/v1/problems/{parking_id}/level"),
            Some(&token),
            Some(json!({"targetIndex": 1})),
        ),
    )
    .await;
    let body = body_json(res).await;
    assert_eq!(body["moved"], true);
    assert_eq!(body["requiresConfirmation"], false);
    assert_eq!(body["currentIndex"], 1);
}

#[tokio::test]
async fn unparseable_grading_reply_degrades_instead_of_failing() {
    let app = create_app_with_grader("I refuse to answer in JSON today.").await;
    let (token, parking_id) = seeded_session(&app).await;

    let res = send(
        &app,
        request(
            "POST",
            &format!("/api/v1/problems/{parking_id}/submit"),
            Some(&token),
            Some(json!({"diagram_json": {}})),
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let verdict = body_json(res).await;
    assert_eq!(verdict["score"], 50);
    assert!(verdict["feedback"]
        .as_str()
        .unwrap()
        .contains("I refuse to answer in JSON today."));
}
