use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{Datelike, Duration, NaiveDate, Utc, Weekday};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::router::appointment_routes;
use shared_utils::test_utils::{JwtTestUtils, MockDbResponses, TestConfig, TestUser};

fn create_test_app(config: &TestConfig) -> Router {
    appointment_routes(Arc::new(config.to_app_config()))
}

/// First weekday at least two days out; with a 14:00 slot that is always
/// comfortably past the 24-hour lead.
fn next_weekday() -> NaiveDate {
    let mut date = Utc::now().date_naive() + Duration::days(2);
    while matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
        date += Duration::days(1);
    }
    date
}

fn authorized_post(uri: &str, token: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn response_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn schedule_appointment_succeeds_on_free_slot() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_database_url(&mock_server.uri());
    let app = create_test_app(&config);

    let patient = TestUser::patient("paciente@exemplo.com");
    let token = JwtTestUtils::create_test_token(&patient, &config.jwt_secret, None);

    let professional_id = Uuid::new_v4().to_string();
    let date = next_weekday();
    let slot = format!("{}T14:00:00Z", date.format("%Y-%m-%d"));

    Mock::given(method("GET"))
        .and(path("/rest/v1/professionals"))
        .and(query_param("full_name", "ilike.Dra. Ana Souza"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockDbResponses::professional_row(
                &professional_id,
                "ana@clinic.com",
                "Dra. Ana Souza",
                "Cardiology",
            )
        ])))
        .mount(&mock_server)
        .await;

    // Free slot: the conflict query must exclude cancelled rows.
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("professional_id", format!("eq.{}", professional_id)))
        .and(query_param("scheduled_at", format!("eq.{}", slot)))
        .and(query_param("status", "neq.cancelled"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockDbResponses::appointment_row(
                &Uuid::new_v4().to_string(),
                &patient.id,
                &professional_id,
                &slot,
                "scheduled",
            )
        ])))
        .mount(&mock_server)
        .await;

    let request = authorized_post(
        "/",
        &token,
        json!({
            "professional_name": "Dra. Ana Souza",
            "date": date.format("%Y-%m-%d").to_string(),
            "time": "14:00",
            "notes": "Routine check",
        }),
    );

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = response_json(response).await;
    assert_eq!(body["message"], "Appointment scheduled successfully");
    assert_eq!(body["status"], "scheduled");
}

#[tokio::test]
async fn schedule_appointment_rejects_occupied_slot() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_database_url(&mock_server.uri());
    let app = create_test_app(&config);

    let patient = TestUser::patient("paciente@exemplo.com");
    let token = JwtTestUtils::create_test_token(&patient, &config.jwt_secret, None);

    let professional_id = Uuid::new_v4().to_string();
    let date = next_weekday();
    let slot = format!("{}T14:00:00Z", date.format("%Y-%m-%d"));

    Mock::given(method("GET"))
        .and(path("/rest/v1/professionals"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockDbResponses::professional_row(
                &professional_id,
                "ana@clinic.com",
                "Dra. Ana Souza",
                "Cardiology",
            )
        ])))
        .mount(&mock_server)
        .await;

    // Another patient already holds the minute.
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("status", "neq.cancelled"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockDbResponses::appointment_row(
                &Uuid::new_v4().to_string(),
                &Uuid::new_v4().to_string(),
                &professional_id,
                &slot,
                "scheduled",
            )
        ])))
        .mount(&mock_server)
        .await;

    let request = authorized_post(
        "/",
        &token,
        json!({
            "professional_name": "Dra. Ana Souza",
            "date": date.format("%Y-%m-%d").to_string(),
            "time": "14:00",
            "notes": null,
        }),
    );

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = response_json(response).await;
    assert_eq!(body["message"], "Time slot is already taken");
}

#[tokio::test]
async fn schedule_appointment_maps_unknown_professional_to_404() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_database_url(&mock_server.uri());
    let app = create_test_app(&config);

    let patient = TestUser::patient("paciente@exemplo.com");
    let token = JwtTestUtils::create_test_token(&patient, &config.jwt_secret, None);

    Mock::given(method("GET"))
        .and(path("/rest/v1/professionals"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let date = next_weekday();
    let request = authorized_post(
        "/",
        &token,
        json!({
            "professional_name": "Dr. Nobody",
            "date": date.format("%Y-%m-%d").to_string(),
            "time": "10:00",
            "notes": null,
        }),
    );

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn schedule_appointment_reports_field_errors_without_touching_store() {
    // No mocks mounted: any database call would fail the request with 500,
    // so a 422 here proves validation short-circuits persistence.
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_database_url(&mock_server.uri());
    let app = create_test_app(&config);

    let patient = TestUser::patient("paciente@exemplo.com");
    let token = JwtTestUtils::create_test_token(&patient, &config.jwt_secret, None);

    let request = authorized_post(
        "/",
        &token,
        json!({
            "professional_name": "Dra. Ana Souza",
            "date": "2023-13-32",
            "time": "25:61",
            "notes": null,
        }),
    );

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = response_json(response).await;
    assert!(body["errors"]["date"].is_array());
    assert!(body["errors"]["time"].is_array());
}

#[tokio::test]
async fn schedule_appointment_requires_patient_role() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_database_url(&mock_server.uri());
    let app = create_test_app(&config);

    let professional = TestUser::professional("ana@clinic.com");
    let token = JwtTestUtils::create_test_token(&professional, &config.jwt_secret, None);

    let date = next_weekday();
    let request = authorized_post(
        "/",
        &token,
        json!({
            "professional_name": "Dra. Ana Souza",
            "date": date.format("%Y-%m-%d").to_string(),
            "time": "10:00",
            "notes": null,
        }),
    );

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn schedule_appointment_rejects_missing_token() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_database_url(&mock_server.uri());
    let app = create_test_app(&config);

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("content-type", "application/json")
        .body(Body::from(json!({}).to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn cancel_appointment_transitions_and_appends_note() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_database_url(&mock_server.uri());
    let app = create_test_app(&config);

    let patient = TestUser::patient("paciente@exemplo.com");
    let token = JwtTestUtils::create_test_token(&patient, &config.jwt_secret, None);

    let appointment_id = Uuid::new_v4().to_string();
    let professional_id = Uuid::new_v4().to_string();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", appointment_id)))
        .and(query_param("patient_id", format!("eq.{}", patient.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockDbResponses::appointment_row(
                &appointment_id,
                &patient.id,
                &professional_id,
                "2025-06-02T14:00:00Z",
                "scheduled",
            )
        ])))
        .mount(&mock_server)
        .await;

    let mut cancelled_row = MockDbResponses::appointment_row(
        &appointment_id,
        &patient.id,
        &professional_id,
        "2025-06-02T14:00:00Z",
        "cancelled",
    );
    cancelled_row["notes"] =
        json!("Routine check\nCancelled by patient at 2025-06-01T10:00:00Z");

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", appointment_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([cancelled_row])))
        .mount(&mock_server)
        .await;

    let request = authorized_post(
        &format!("/{}/cancel", appointment_id),
        &token,
        json!({}),
    );

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["message"], "Appointment cancelled successfully");
    assert_eq!(body["appointment"]["status"], "cancelled");
    assert!(body["appointment"]["notes"]
        .as_str()
        .unwrap()
        .contains("Cancelled by patient at"));
}

#[tokio::test]
async fn cancelling_twice_returns_already_cancelled_error() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_database_url(&mock_server.uri());
    let app = create_test_app(&config);

    let patient = TestUser::patient("paciente@exemplo.com");
    let token = JwtTestUtils::create_test_token(&patient, &config.jwt_secret, None);

    let appointment_id = Uuid::new_v4().to_string();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", appointment_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockDbResponses::appointment_row(
                &appointment_id,
                &patient.id,
                &Uuid::new_v4().to_string(),
                "2025-06-02T14:00:00Z",
                "cancelled",
            )
        ])))
        .mount(&mock_server)
        .await;

    let request = authorized_post(
        &format!("/{}/cancel", appointment_id),
        &token,
        json!({}),
    );

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = response_json(response).await;
    assert_eq!(body["message"], "Appointment is already cancelled");
}

#[tokio::test]
async fn cancelling_someone_elses_appointment_reads_as_missing() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_database_url(&mock_server.uri());
    let app = create_test_app(&config);

    let patient = TestUser::patient("paciente@exemplo.com");
    let token = JwtTestUtils::create_test_token(&patient, &config.jwt_secret, None);

    // Filtered on (id, patient_id), the store has nothing for this caller.
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let request = authorized_post(
        &format!("/{}/cancel", Uuid::new_v4()),
        &token,
        json!({}),
    );

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn patient_listing_renders_history_with_professional_names() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_database_url(&mock_server.uri());
    let app = create_test_app(&config);

    let patient = TestUser::patient("paciente@exemplo.com");
    let token = JwtTestUtils::create_test_token(&patient, &config.jwt_secret, None);

    let professional_id = Uuid::new_v4().to_string();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("patient_id", format!("eq.{}", patient.id)))
        .and(query_param("order", "scheduled_at.desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockDbResponses::appointment_row(
                &Uuid::new_v4().to_string(),
                &patient.id,
                &professional_id,
                "2025-06-02T14:00:00Z",
                "scheduled",
            ),
            MockDbResponses::appointment_row(
                &Uuid::new_v4().to_string(),
                &patient.id,
                &professional_id,
                "2025-05-12T09:30:00Z",
                "cancelled",
            ),
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/professionals"))
        .and(query_param("select", "id,full_name"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": professional_id, "full_name": "Dra. Ana Souza" }
        ])))
        .mount(&mock_server)
        .await;

    let request = Request::builder()
        .method("GET")
        .uri("/")
        .header("Authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["total"], 2);
    assert_eq!(body["appointments"][0]["date"], "02/06/2025");
    assert_eq!(body["appointments"][0]["time"], "14:00");
    assert_eq!(body["appointments"][0]["professional"], "Dra. Ana Souza");
    assert_eq!(body["appointments"][1]["status"], "cancelled");
}

#[tokio::test]
async fn professional_listing_renders_agenda_with_patient_names() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_database_url(&mock_server.uri());
    let app = create_test_app(&config);

    let professional = TestUser::professional("ana@clinic.com");
    let token = JwtTestUtils::create_test_token(&professional, &config.jwt_secret, None);

    let patient_id = Uuid::new_v4().to_string();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("professional_id", format!("eq.{}", professional.id)))
        .and(query_param("order", "scheduled_at.asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockDbResponses::appointment_row(
                &Uuid::new_v4().to_string(),
                &patient_id,
                &professional.id,
                "2025-06-02T14:00:00Z",
                "scheduled",
            ),
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .and(query_param("select", "id,full_name"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": patient_id, "full_name": "Maria Oliveira" }
        ])))
        .mount(&mock_server)
        .await;

    let request = Request::builder()
        .method("GET")
        .uri("/")
        .header("Authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["appointments"][0]["patient"], "Maria Oliveira");
}
