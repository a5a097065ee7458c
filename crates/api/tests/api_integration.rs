//! Integration tests for the API server.

use std::sync::{Arc, OnceLock};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::NaiveDate;
use domain::FixedClock;
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{Value, json};
use store::MemoryStore;
use tower::ServiceExt;

use api::routes::AppState;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Fresh app over an in-memory store, with the calendar pinned to
/// 2021-06-20 so rent dates and fees are predictable.
fn setup() -> (axum::Router, FixedClock) {
    let store = MemoryStore::new();
    let clock = FixedClock::new(date(2021, 6, 20));
    let state = Arc::new(AppState::with_clock(store, Arc::new(clock.clone())));
    (api::create_app(state, get_metrics_handle()), clock)
}

/// Sends one request and decodes the response body as JSON (Null when
/// the body is empty).
async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

/// Seeds one category, one game (1500 cents/day), and one customer;
/// returns (game_id, customer_id).
async fn seed_catalog(app: &axum::Router, stock_total: i64) -> (String, String) {
    let (status, category) = send(
        app,
        "POST",
        "/categories",
        Some(json!({ "name": "Strategy" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, game) = send(
        app,
        "POST",
        "/games",
        Some(json!({
            "name": "Banco Imobiliário",
            "image": "https://example.com/banco.jpg",
            "stockTotal": stock_total,
            "categoryId": category["id"],
            "pricePerDay": 1500
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, customer) = send(
        app,
        "POST",
        "/customers",
        Some(json!({
            "name": "Joana Silva",
            "phone": "21998899222",
            "cpf": "01234567890",
            "birthday": "1990-05-14"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    (
        game["id"].as_str().unwrap().to_string(),
        customer["id"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn test_health_check() {
    let (app, _) = setup();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_create_and_list_categories() {
    let (app, _) = setup();

    let (status, created) = send(
        &app,
        "POST",
        "/categories",
        Some(json!({ "name": "Euro Games" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["name"], "Euro Games");
    assert!(created["id"].as_str().is_some());

    let (status, listed) = send(&app, "GET", "/categories", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["name"], "Euro Games");
}

#[tokio::test]
async fn test_category_name_rules() {
    let (app, _) = setup();

    let (status, body) = send(&app, "POST", "/categories", Some(json!({ "name": "  " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().is_some());

    let (status, _) = send(&app, "POST", "/categories", Some(json!({ "name": "Duel" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = send(&app, "POST", "/categories", Some(json!({ "name": "Duel" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_create_game_and_filter_by_name() {
    let (app, _) = setup();
    seed_catalog(&app, 3).await;

    let (status, games) = send(&app, "GET", "/games", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(games.as_array().unwrap().len(), 1);
    assert_eq!(games[0]["name"], "Banco Imobiliário");
    assert_eq!(games[0]["stockTotal"], 3);
    assert_eq!(games[0]["pricePerDay"], 1500);
    assert_eq!(games[0]["categoryName"], "Strategy");

    // Prefix match is case-insensitive; non-matching prefixes drop out.
    let (status, games) = send(&app, "GET", "/games?name=ban", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(games.as_array().unwrap().len(), 1);

    let (status, games) = send(&app, "GET", "/games?name=zzz", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(games.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_create_game_with_unknown_category() {
    let (app, _) = setup();
    let missing = uuid::Uuid::new_v4();

    let (status, body) = send(
        &app,
        "POST",
        "/games",
        Some(json!({
            "name": "Orphan",
            "image": "https://example.com/orphan.jpg",
            "stockTotal": 1,
            "categoryId": missing,
            "pricePerDay": 1000
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("category"));
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let (app, _) = setup();

    // Wrong shape: required fields missing.
    let (status, _) = send(&app, "POST", "/customers", Some(json!({ "name": "Ana" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Not JSON at all.
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/categories")
                .header("content-type", "application/json")
                .body(Body::from("not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_customer_roundtrip_and_update() {
    let (app, _) = setup();
    let (_, customer_id) = seed_catalog(&app, 1).await;

    let (status, fetched) = send(&app, "GET", &format!("/customers/{customer_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["name"], "Joana Silva");
    assert_eq!(fetched["cpf"], "01234567890");
    assert_eq!(fetched["birthday"], "1990-05-14");

    let (status, updated) = send(
        &app,
        "PUT",
        &format!("/customers/{customer_id}"),
        Some(json!({
            "name": "Joana S. Silva",
            "phone": "21998899222",
            "cpf": "01234567890",
            "birthday": "1990-05-14"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Joana S. Silva");

    let (status, filtered) = send(&app, "GET", "/customers?cpf=0123", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(filtered.as_array().unwrap().len(), 1);
    assert_eq!(filtered[0]["name"], "Joana S. Silva");

    let (status, filtered) = send(&app, "GET", "/customers?cpf=999", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(filtered.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_duplicate_cpf_is_conflict() {
    let (app, _) = setup();
    seed_catalog(&app, 1).await;

    let (status, _) = send(
        &app,
        "POST",
        "/customers",
        Some(json!({
            "name": "Impostora",
            "phone": "11911112222",
            "cpf": "01234567890",
            "birthday": "1985-01-01"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_get_nonexistent_customer() {
    let (app, _) = setup();
    let fake_id = uuid::Uuid::new_v4();

    let (status, _) = send(&app, "GET", &format!("/customers/{fake_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_id_format() {
    let (app, _) = setup();

    let (status, _) = send(&app, "GET", "/customers/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "POST", "/rentals/not-a-uuid/return", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_rental_lifecycle_with_late_fee() {
    let (app, clock) = setup();
    let (game_id, customer_id) = seed_catalog(&app, 1).await;

    let (status, rental) = send(
        &app,
        "POST",
        "/rentals",
        Some(json!({
            "customerId": customer_id,
            "gameId": game_id,
            "daysRented": 3
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(rental["rentDate"], "2021-06-20");
    assert_eq!(rental["daysRented"], 3);
    assert_eq!(rental["originalPrice"], 4500);
    assert_eq!(rental["returnDate"], Value::Null);
    assert_eq!(rental["delayFee"], Value::Null);
    let rental_id = rental["id"].as_str().unwrap();

    // Due 2021-06-23, returned 2021-06-25: two days late.
    clock.set(date(2021, 6, 25));
    let (status, closed) = send(
        &app,
        "POST",
        &format!("/rentals/{rental_id}/return"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(closed["returnDate"], "2021-06-25");
    assert_eq!(closed["delayFee"], 3000);
    assert_eq!(closed["originalPrice"], 4500);

    // A closed rental cannot be returned again or deleted.
    let (status, _) = send(
        &app,
        "POST",
        &format!("/rentals/{rental_id}/return"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(&app, "DELETE", &format!("/rentals/{rental_id}"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_on_time_return_has_zero_fee() {
    let (app, clock) = setup();
    let (game_id, customer_id) = seed_catalog(&app, 1).await;

    let (_, rental) = send(
        &app,
        "POST",
        "/rentals",
        Some(json!({
            "customerId": customer_id,
            "gameId": game_id,
            "daysRented": 3
        })),
    )
    .await;
    let rental_id = rental["id"].as_str().unwrap();

    clock.set(date(2021, 6, 23));
    let (status, closed) = send(
        &app,
        "POST",
        &format!("/rentals/{rental_id}/return"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(closed["delayFee"], 0);
}

#[tokio::test]
async fn test_rental_requires_stock_and_positive_days() {
    let (app, _) = setup();
    let (game_id, customer_id) = seed_catalog(&app, 1).await;
    let new_rental = json!({
        "customerId": customer_id,
        "gameId": game_id,
        "daysRented": 3
    });

    let (status, _) = send(
        &app,
        "POST",
        "/rentals",
        Some(json!({
            "customerId": customer_id,
            "gameId": game_id,
            "daysRented": 0
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "POST", "/rentals", Some(new_rental.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    // Single copy already out.
    let (status, body) = send(&app, "POST", "/rentals", Some(new_rental)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("available"));
}

#[tokio::test]
async fn test_delete_open_rental_frees_the_copy() {
    let (app, _) = setup();
    let (game_id, customer_id) = seed_catalog(&app, 1).await;
    let new_rental = json!({
        "customerId": customer_id,
        "gameId": game_id,
        "daysRented": 2
    });

    let (_, rental) = send(&app, "POST", "/rentals", Some(new_rental.clone())).await;
    let rental_id = rental["id"].as_str().unwrap();

    let (status, body) = send(&app, "DELETE", &format!("/rentals/{rental_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::Null);

    let (status, rentals) = send(&app, "GET", "/rentals", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(rentals.as_array().unwrap().is_empty());

    // Deleting again is a 404; the copy is rentable again.
    let (status, _) = send(&app, "DELETE", &format!("/rentals/{rental_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "POST", "/rentals", Some(new_rental)).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_list_rentals_shapes_and_filters() {
    let (app, clock) = setup();
    let (game_id, customer_id) = seed_catalog(&app, 2).await;

    let (_, other_customer) = send(
        &app,
        "POST",
        "/customers",
        Some(json!({
            "name": "Bruno Costa",
            "phone": "11933334444",
            "cpf": "98765432100",
            "birthday": "1988-03-02"
        })),
    )
    .await;
    let other_id = other_customer["id"].as_str().unwrap();

    let (_, first) = send(
        &app,
        "POST",
        "/rentals",
        Some(json!({ "customerId": customer_id, "gameId": game_id, "daysRented": 3 })),
    )
    .await;
    send(
        &app,
        "POST",
        "/rentals",
        Some(json!({ "customerId": other_id, "gameId": game_id, "daysRented": 1 })),
    )
    .await;

    // The listing nests customer and game display fields. Both rentals
    // opened the same day, so assert on the set, not the order.
    let (status, rentals) = send(&app, "GET", "/rentals", None).await;
    assert_eq!(status, StatusCode::OK);
    let rows = rentals.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    for row in rows {
        assert_eq!(row["game"]["name"], "Banco Imobiliário");
        assert_eq!(row["game"]["categoryName"], "Strategy");
    }
    let names: Vec<&str> = rows
        .iter()
        .map(|r| r["customer"]["name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"Joana Silva"));
    assert!(names.contains(&"Bruno Costa"));

    let (_, by_customer) = send(&app, "GET", &format!("/rentals?customerId={other_id}"), None).await;
    assert_eq!(by_customer.as_array().unwrap().len(), 1);
    assert_eq!(by_customer[0]["customer"]["name"], "Bruno Costa");

    // Close the first rental, then split by status.
    clock.set(date(2021, 6, 22));
    let first_id = first["id"].as_str().unwrap();
    send(&app, "POST", &format!("/rentals/{first_id}/return"), None).await;

    let (_, open) = send(&app, "GET", "/rentals?status=open", None).await;
    assert_eq!(open.as_array().unwrap().len(), 1);
    assert_eq!(open[0]["customer"]["name"], "Bruno Costa");

    let (_, closed) = send(
        &app,
        "GET",
        &format!("/rentals?gameId={game_id}&status=closed"),
        None,
    )
    .await;
    assert_eq!(closed.as_array().unwrap().len(), 1);
    assert_eq!(closed[0]["id"], first["id"]);
}

#[tokio::test]
async fn test_metrics_endpoint_reports_rental_counters() {
    let (app, _) = setup();
    let (game_id, customer_id) = seed_catalog(&app, 1).await;

    send(
        &app,
        "POST",
        "/rentals",
        Some(json!({ "customerId": customer_id, "gameId": game_id, "daysRented": 1 })),
    )
    .await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("rentals_opened_total"));
}
