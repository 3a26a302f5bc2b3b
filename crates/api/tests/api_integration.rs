//! Integration tests for the API server.

use std::sync::OnceLock;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use catalog::InMemoryCatalog;
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{Value, json};
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            metrics_exporter_prometheus::PrometheusBuilder::new()
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn setup() -> axum::Router {
    api::create_app(
        api::AppState::new(InMemoryCatalog::new()),
        get_metrics_handle(),
    )
}

async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

async fn post(app: &axum::Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, "POST", uri, Some(body)).await
}

async fn get(app: &axum::Router, uri: &str) -> (StatusCode, Value) {
    send(app, "GET", uri, None).await
}

async fn create_donor(app: &axum::Router, name: &str, group: &str, organ: bool) -> i64 {
    let (status, body) = post(
        app,
        "/api/donors",
        json!({"full_name": name, "blood_group": group, "organ_eligible": organ}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_i64().unwrap()
}

async fn create_staff(app: &axum::Router, username: &str) -> i64 {
    let (status, body) = post(
        app,
        "/api/staff",
        json!({
            "full_name": "Nurse Joy",
            "role": "Nurse",
            "username": username,
            "password": "s3cret-pass"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_i64().unwrap()
}

async fn create_hospital(app: &axum::Router) -> i64 {
    let (status, body) = post(
        app,
        "/api/hospitals",
        json!({"name": "St. Mary", "contact": "+1 555 0100"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_i64().unwrap()
}

async fn donate_blood(app: &axum::Router, donor_id: i64, units: i64) -> Value {
    let (status, body) = post(
        app,
        "/api/donations",
        json!({"donor_id": donor_id, "date": "2024-03-01", "type": "Blood", "quantity": units}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body
}

async fn request_blood(app: &axum::Router, hospital_id: i64, group: &str, units: i64) -> i64 {
    let (status, body) = post(
        app,
        "/api/requests",
        json!({
            "hospital_id": hospital_id,
            "request_type": "Blood",
            "blood_group": group,
            "quantity": units
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_i64().unwrap()
}

fn blood_stock(inventory: &Value, group: &str) -> Option<u64> {
    inventory["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|row| row["category"]["key"] == group)
        .and_then(|row| row["quantity"].as_u64())
}

#[tokio::test]
async fn test_health_check() {
    let app = setup();
    let (status, body) = get(&app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_register_and_list_donors() {
    let app = setup();
    let first = create_donor(&app, "Ada", "A+", false).await;
    let second = create_donor(&app, "Grace", "O-", true).await;

    let (status, body) = get(&app, "/api/donors").await;
    assert_eq!(status, StatusCode::OK);

    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["id"], second);
    assert_eq!(rows[0]["donation_status"], "Organs");
    assert_eq!(rows[1]["id"], first);
    assert_eq!(rows[1]["donation_status"], "Blood");
    assert_eq!(rows[1]["total_donations"], 0);
}

#[tokio::test]
async fn test_donor_validation_errors() {
    let app = setup();

    let (status, body) = post(
        &app,
        "/api/donors",
        json!({"full_name": "", "blood_group": "A+"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = post(
        &app,
        "/api/donors",
        json!({"full_name": "Ada", "blood_group": "Z+"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = setup();
    let request = Request::builder()
        .method("POST")
        .uri("/api/donors")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_donation_credits_inventory() {
    let app = setup();
    let donor = create_donor(&app, "Ada", "B+", false).await;

    let body = donate_blood(&app, donor, 3).await;
    assert_eq!(body["stock"], 3);
    assert_eq!(body["category"]["key"], "B+");

    let (status, inventory) = get(&app, "/api/inventory").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(blood_stock(&inventory, "B+"), Some(3));

    let (_, donors) = get(&app, "/api/donors").await;
    assert_eq!(donors["data"][0]["total_donations"], 1);
    assert_eq!(donors["data"][0]["last_donation"], "2024-03-01");
}

#[tokio::test]
async fn test_organ_donation_and_inventory() {
    let app = setup();
    let donor = create_donor(&app, "Linus", "AB+", true).await;

    let (status, body) = post(
        &app,
        "/api/donations",
        json!({"donor_id": donor.to_string(), "date": "2024-03-02", "type": "Organ", "organ_type": "Kidney"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    let (status, inventory) = get(&app, "/api/inventory?type=Organ_Inventory").await;
    assert_eq!(status, StatusCode::OK);
    let rows = inventory["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["category"]["key"], "Kidney");
    assert_eq!(rows[0]["quantity"], 1);
}

#[tokio::test]
async fn test_donation_rejects_bad_input() {
    let app = setup();

    let (status, body) = post(
        &app,
        "/api/donations",
        json!({"donor_id": "abc", "date": "2024-03-01", "type": "Blood"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Donor ID must be numeric");

    let (status, _) = post(
        &app,
        "/api/donations",
        json!({"donor_id": 999, "date": "2024-03-01", "type": "Blood"}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let donor = create_donor(&app, "Ada", "A-", false).await;
    let (status, _) = post(
        &app,
        "/api/donations",
        json!({"donor_id": donor, "date": "2024-02-30", "type": "Blood"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_donation_without_type_records_blood() {
    let app = setup();
    let donor = create_donor(&app, "Ada", "AB-", false).await;

    let (status, body) = post(
        &app,
        "/api/donations",
        json!({"donor_id": donor, "date": "2024-05-01", "qty": 2}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["category"]["type"], "Blood");
    assert_eq!(body["stock"], 2);

    let (_, inventory) = get(&app, "/api/inventory").await;
    assert_eq!(blood_stock(&inventory, "AB-"), Some(2));
}

#[tokio::test]
async fn test_fulfill_request_once() {
    let app = setup();
    let donor = create_donor(&app, "Ada", "O+", false).await;
    let staff = create_staff(&app, "nurse_joy").await;
    let hospital = create_hospital(&app).await;
    donate_blood(&app, donor, 5).await;
    let request = request_blood(&app, hospital, "O+", 2).await;

    let (status, pending) = get(&app, "/api/requests/pending").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pending["data"].as_array().unwrap().len(), 1);
    assert_eq!(pending["data"][0]["requestor_name"], "St. Mary");

    let (status, body) = post(
        &app,
        "/api/requests/fulfill",
        json!({"request_id": request, "staff_id": staff.to_string()}),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["message"], format!("Request {request} fulfilled"));
    assert_eq!(body["request"]["status"], "Fulfilled");
    assert_eq!(body["request"]["fulfilled_by"], staff);

    let (_, inventory) = get(&app, "/api/inventory?type=Blood_Inventory").await;
    assert_eq!(blood_stock(&inventory, "O+"), Some(3));

    let (status, body) = post(
        &app,
        "/api/requests/fulfill",
        json!({"request_id": request, "staff_id": staff}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].is_string());

    let (_, inventory) = get(&app, "/api/inventory").await;
    assert_eq!(blood_stock(&inventory, "O+"), Some(3));

    let (_, pending) = get(&app, "/api/requests/pending").await;
    assert!(pending["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_fulfill_with_insufficient_stock() {
    let app = setup();
    let donor = create_donor(&app, "Ada", "A+", false).await;
    let staff = create_staff(&app, "tech_one").await;
    let hospital = create_hospital(&app).await;
    donate_blood(&app, donor, 1).await;
    let request = request_blood(&app, hospital, "A+", 4).await;

    let (status, _) = post(
        &app,
        "/api/requests/fulfill",
        json!({"request_id": request, "staff_id": staff}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, inventory) = get(&app, "/api/inventory").await;
    assert_eq!(blood_stock(&inventory, "A+"), Some(1));

    let (_, pending) = get(&app, "/api/requests/pending").await;
    assert_eq!(pending["data"][0]["status"], "Pending");
}

#[tokio::test]
async fn test_fulfill_rejects_non_numeric_ids() {
    let app = setup();

    let (status, body) = post(
        &app,
        "/api/requests/fulfill",
        json!({"request_id": "one", "staff_id": 1}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Enter numeric Request ID and Staff ID");
}

#[tokio::test]
async fn test_fulfill_unknown_request_or_staff() {
    let app = setup();
    let staff = create_staff(&app, "clerk").await;

    let (status, _) = post(
        &app,
        "/api/requests/fulfill",
        json!({"request_id": 4242, "staff_id": staff}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = post(
        &app,
        "/api/requests/fulfill",
        json!({"request_id": 1, "staff_id": 4242}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_request_requires_a_requestor() {
    let app = setup();

    let (status, body) = post(
        &app,
        "/api/requests",
        json!({"type": "Blood", "blood_group": "O+", "quantity": 1}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Recipient ID or Hospital ID required");

    let (status, _) = post(
        &app,
        "/api/requests",
        json!({"recipient_id": 77, "type": "Blood", "blood_group": "O+"}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_recipient_organ_request() {
    let app = setup();
    let (status, body) = post(
        &app,
        "/api/recipients",
        json!({"full_name": "Bob", "required_organ": "Liver", "email": "bob@example.com"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let recipient = body["id"].as_i64().unwrap();

    let (status, body) = post(
        &app,
        "/api/requests",
        json!({
            "recipient_id": recipient,
            "request_type": "Organ",
            "organ_type": "Liver",
            "quantity": 3,
            "request_date": "2024-04-01"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    let (_, pending) = get(&app, "/api/requests/pending").await;
    let row = &pending["data"][0];
    assert_eq!(row["quantity"], 1);
    assert_eq!(row["requestor_name"], "Bob");
    assert_eq!(row["requested_on"], "2024-04-01");
}

#[tokio::test]
async fn test_inventory_rejects_unknown_ledger() {
    let app = setup();
    let (status, body) = get(&app, "/api/inventory?type=Plasma_Inventory").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Plasma_Inventory"));
}

#[tokio::test]
async fn test_staff_login() {
    let app = setup();
    create_staff(&app, "dr_who").await;

    let (status, body) = post(
        &app,
        "/api/login",
        json!({"username": "dr_who", "password": "s3cret-pass"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Login successful");
    assert_eq!(body["user"]["username"], "dr_who");
    assert!(body["user"].get("password_hash").is_none());

    let (status, _) = post(
        &app,
        "/api/login",
        json!({"username": "dr_who", "password": "wrong"}),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = post(
        &app,
        "/api/login",
        json!({"username": "nobody", "password": "s3cret-pass"}),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = post(&app, "/api/login", json!({"username": "dr_who"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_staff_duplicate_username_and_listing() {
    let app = setup();
    create_staff(&app, "first").await;
    let second = create_staff(&app, "second").await;

    let (status, _) = post(
        &app,
        "/api/staff",
        json!({"full_name": "Copy", "role": "Nurse", "username": "first", "password": "pw"}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = get(&app, "/api/staff").await;
    assert_eq!(status, StatusCode::OK);
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["id"], second);
    assert!(rows.iter().all(|row| row.get("password_hash").is_none()));
}

#[tokio::test]
async fn test_donation_stats_type_distribution() {
    let app = setup();
    let donor = create_donor(&app, "Ada", "O-", true).await;
    donate_blood(&app, donor, 2).await;
    post(
        &app,
        "/api/donations",
        json!({"donor_id": donor, "date": "2024-03-05", "type": "Organ", "organ_type": "Kidney"}),
    )
    .await;

    let (status, body) = get(&app, "/api/donations/stats").await;
    assert_eq!(status, StatusCode::OK);

    let distribution = body["data"]["type_distribution"].as_array().unwrap();
    assert!(distribution.contains(&json!({"type": "Blood", "count": 1})));
    assert!(distribution.contains(&json!({"type": "Kidney", "count": 1})));
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = setup();
    let donor = create_donor(&app, "Ada", "O+", false).await;
    let staff = create_staff(&app, "metrics_nurse").await;
    let hospital = create_hospital(&app).await;
    donate_blood(&app, donor, 1).await;
    let request = request_blood(&app, hospital, "O+", 1).await;
    post(
        &app,
        "/api/requests/fulfill",
        json!({"request_id": request, "staff_id": staff}),
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
    assert!(text.contains("fulfillments_total"));
    assert!(text.contains("donations_recorded_total"));
}
