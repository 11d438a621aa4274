//! Tests for student HTTP handlers.

use std::str::FromStr;
use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::http::header;
use actix_web::{App, test as actix_test, web};
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use pagination::Slice;
use rstest::rstest;
use serde_json::{Value, json};

use super::*;
use crate::domain::ports::{
    FixtureStudentFileRepository, MockStudentRepository, StaticTokenVerifier,
    StudentRepositoryError,
};
use crate::domain::{ErrorCode, StudentService};

const TOKEN: &str = "sesame";

fn fixed_instant() -> DateTime<Utc> {
    "2026-02-01T11:00:00Z".parse().expect("fixed instant")
}

fn sample_wallet(student_id: i32) -> Wallet {
    Wallet {
        id: 11,
        version: 0,
        balance: BigDecimal::from_str("25.50").expect("balance"),
        auto_reload: true,
        reload_threshold: BigDecimal::from_str("10.00").expect("threshold"),
        reload_amount: BigDecimal::from_str("20.00").expect("amount"),
        last_reloaded_at: None,
        student_id,
    }
}

fn sample_transaction(student_id: i32) -> Transaction {
    Transaction {
        id: 21,
        amount: BigDecimal::from_str("-3.20").expect("amount"),
        kind: TransactionKind::Spend,
        reference: Some("canteen".to_owned()),
        location: None,
        recorded_at: fixed_instant(),
        student_id,
    }
}

fn sample_student(id: i32, version: i32) -> Student {
    Student {
        id,
        version,
        matriculation_number: "85625".to_owned(),
        first_name: "Alex".to_owned(),
        last_name: "Muster".to_owned(),
        email: "alex.muster@campus.example".to_owned(),
        semester: 3,
        created_at: fixed_instant(),
        updated_at: fixed_instant(),
        wallet: Some(sample_wallet(id)),
        transactions: vec![sample_transaction(id)],
    }
}

fn sample_create_body() -> Value {
    json!({
        "matriculationNumber": "85625",
        "firstName": "Alex",
        "lastName": "Muster",
        "email": "alex.muster@campus.example",
        "semester": 3,
        "wallet": {
            "balance": "25.50",
            "autoReload": true,
            "reloadThreshold": "10.00",
            "reloadAmount": "20.00"
        },
        "transactions": [
            {"amount": "-3.20", "type": "SPEND", "reference": "canteen"}
        ]
    })
}

fn test_app(
    repo: MockStudentRepository,
) -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let service = StudentService::new(Arc::new(repo), Arc::new(FixtureStudentFileRepository));
    let state = HttpState::new(Arc::new(service), Arc::new(StaticTokenVerifier::new(TOKEN)));
    App::new().app_data(web::Data::new(state)).service(
        web::scope("/api/v1")
            .service(list_students)
            .service(get_student)
            .service(create_student)
            .service(update_student)
            .service(delete_student),
    )
}

fn bearer() -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {TOKEN}"))
}

#[rstest]
fn create_payloads_parse_into_domain_shapes() {
    let payload: CreateStudentRequest =
        serde_json::from_value(sample_create_body()).expect("payload deserialises");
    let create = parse_create_request(payload).expect("payload is valid");

    assert_eq!(create.matriculation_number, "85625");
    let wallet = create.wallet.expect("wallet supplied");
    assert_eq!(wallet.balance.to_string(), "25.50");
    assert_eq!(create.transactions.len(), 1);
    assert_eq!(create.transactions[0].kind, TransactionKind::Spend);
}

#[rstest]
fn update_payloads_validate_supplied_fields_only() {
    let patch = parse_update_request(UpdateStudentRequest {
        semester: Some(4),
        ..UpdateStudentRequest::default()
    })
    .expect("sparse payload is valid");
    assert_eq!(patch.semester, Some(4));
    assert!(patch.email.is_none());

    let error = parse_update_request(UpdateStudentRequest {
        email: Some("not-an-email".to_owned()),
        ..UpdateStudentRequest::default()
    })
    .expect_err("bad email");
    assert_eq!(error.code(), ErrorCode::InvalidRequest);
}

#[actix_web::test]
async fn listing_returns_items_and_the_total() {
    let mut repo = MockStudentRepository::new();
    repo.expect_find_page()
        .withf(|filter, page| {
            filter.semester == Some(3) && page.page() == 0 && page.size() == 20
        })
        .times(1)
        .return_once(|_, _| Ok(Slice::new(vec![sample_student(7, 2)], 1)));

    let app = actix_test::init_service(test_app(repo)).await;
    let request = actix_test::TestRequest::get()
        .uri("/api/v1/students?semester=3")
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body.get("total"), Some(&json!(1)));
    assert_eq!(body.get("page"), Some(&json!(0)));
    let items = body.get("items").and_then(Value::as_array).expect("items");
    assert_eq!(items.len(), 1);
    assert_eq!(
        items[0].get("matriculationNumber").and_then(Value::as_str),
        Some("85625")
    );
    assert_eq!(
        items[0]
            .get("wallet")
            .and_then(|wallet| wallet.get("balance"))
            .and_then(Value::as_str),
        Some("25.50")
    );
    assert_eq!(
        items[0]
            .get("transactions")
            .and_then(Value::as_array)
            .and_then(|transactions| transactions[0].get("type"))
            .and_then(Value::as_str),
        Some("SPEND")
    );
}

#[actix_web::test]
async fn listing_with_unknown_parameters_is_not_found() {
    let mut repo = MockStudentRepository::new();
    repo.expect_find_page().times(0);

    let app = actix_test::init_service(test_app(repo)).await;
    let request = actix_test::TestRequest::get()
        .uri("/api/v1/students?name=alex")
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn listing_rejects_out_of_range_page_sizes() {
    let mut repo = MockStudentRepository::new();
    repo.expect_find_page().times(0);

    let app = actix_test::init_service(test_app(repo)).await;
    let request = actix_test::TestRequest::get()
        .uri("/api/v1/students?size=0")
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn count_mode_ignores_filters() {
    let mut repo = MockStudentRepository::new();
    repo.expect_count().times(1).return_once(|| Ok(5));
    repo.expect_find_page().times(0);

    let app = actix_test::init_service(test_app(repo)).await;
    let request = actix_test::TestRequest::get()
        .uri("/api/v1/students?only=count&semester=3")
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body, json!({ "count": 5 }));
}

#[actix_web::test]
async fn fetching_sets_the_version_entity_tag() {
    let mut repo = MockStudentRepository::new();
    repo.expect_find_by_id()
        .times(1)
        .return_once(|_| Ok(Some(sample_student(7, 2))));

    let app = actix_test::init_service(test_app(repo)).await;
    let request = actix_test::TestRequest::get()
        .uri("/api/v1/students/7")
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::ETAG)
            .and_then(|value| value.to_str().ok()),
        Some("\"2\"")
    );
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body.get("version"), Some(&json!(2)));
    assert_eq!(
        body.get("createdAt").and_then(Value::as_str),
        Some("2026-02-01T11:00:00+00:00")
    );
}

#[actix_web::test]
async fn fetching_honours_if_none_match() {
    let mut repo = MockStudentRepository::new();
    repo.expect_find_by_id()
        .times(1)
        .return_once(|_| Ok(Some(sample_student(7, 2))));

    let app = actix_test::init_service(test_app(repo)).await;
    let request = actix_test::TestRequest::get()
        .uri("/api/v1/students/7")
        .insert_header((header::IF_NONE_MATCH, "\"2\""))
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
    let body = actix_test::read_body(response).await;
    assert!(body.is_empty());
}

#[actix_web::test]
async fn fetching_a_missing_student_is_not_found() {
    let mut repo = MockStudentRepository::new();
    repo.expect_find_by_id().times(1).return_once(|_| Ok(None));

    let app = actix_test::init_service(test_app(repo)).await;
    let request = actix_test::TestRequest::get()
        .uri("/api/v1/students/7")
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body.get("code").and_then(Value::as_str), Some("not_found"));
}

#[actix_web::test]
async fn creating_returns_the_aggregate_with_location() {
    let mut repo = MockStudentRepository::new();
    repo.expect_matriculation_number_exists()
        .times(1)
        .return_once(|_| Ok(false));
    repo.expect_email_exists()
        .times(1)
        .return_once(|_| Ok(false));
    repo.expect_create().times(1).return_once(|_| Ok(97));
    repo.expect_find_by_id()
        .times(1)
        .return_once(|_| Ok(Some(sample_student(97, 0))));

    let app = actix_test::init_service(test_app(repo)).await;
    let request = actix_test::TestRequest::post()
        .uri("/api/v1/students")
        .insert_header(bearer())
        .set_json(sample_create_body())
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(
        response
            .headers()
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok()),
        Some("/api/v1/students/97")
    );
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body.get("id"), Some(&json!(97)));
    assert_eq!(body.get("version"), Some(&json!(0)));
}

#[actix_web::test]
async fn creating_without_a_token_is_unauthorised() {
    let repo = MockStudentRepository::new();

    let app = actix_test::init_service(test_app(repo)).await;
    let request = actix_test::TestRequest::post()
        .uri("/api/v1/students")
        .set_json(sample_create_body())
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn creating_with_a_taken_matriculation_number_is_unprocessable() {
    let mut repo = MockStudentRepository::new();
    repo.expect_matriculation_number_exists()
        .times(1)
        .return_once(|_| Ok(true));
    repo.expect_create().times(0);

    let app = actix_test::init_service(test_app(repo)).await;
    let request = actix_test::TestRequest::post()
        .uri("/api/v1/students")
        .insert_header(bearer())
        .set_json(sample_create_body())
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(
        body.get("code").and_then(Value::as_str),
        Some("matriculation_exists")
    );
}

#[actix_web::test]
async fn creating_with_invalid_fields_lists_every_violation() {
    let repo = MockStudentRepository::new();

    let mut payload = sample_create_body();
    payload["wallet"]["balance"] = json!("-5.00");
    payload["transactions"][0]["amount"] = json!("0");

    let app = actix_test::init_service(test_app(repo)).await;
    let request = actix_test::TestRequest::post()
        .uri("/api/v1/students")
        .insert_header(bearer())
        .set_json(payload)
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(response).await;
    let violations = body
        .get("details")
        .and_then(|details| details.get("violations"))
        .and_then(Value::as_array)
        .expect("violations array");
    let fields: Vec<&str> = violations
        .iter()
        .filter_map(|violation| violation.get("field").and_then(Value::as_str))
        .collect();
    assert_eq!(fields, vec!["wallet.balance", "transactions[0].amount"]);
}

#[actix_web::test]
async fn updating_requires_if_match() {
    let repo = MockStudentRepository::new();

    let app = actix_test::init_service(test_app(repo)).await;
    let request = actix_test::TestRequest::put()
        .uri("/api/v1/students/7")
        .insert_header(bearer())
        .set_json(json!({ "semester": 4 }))
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::PRECONDITION_REQUIRED);
}

#[actix_web::test]
async fn updating_with_a_malformed_token_is_bad_request() {
    let repo = MockStudentRepository::new();

    let app = actix_test::init_service(test_app(repo)).await;
    let request = actix_test::TestRequest::put()
        .uri("/api/v1/students/7")
        .insert_header(bearer())
        .insert_header((header::IF_MATCH, "3"))
        .set_json(json!({ "semester": 4 }))
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(
        body.get("code").and_then(Value::as_str),
        Some("version_invalid")
    );
}

#[actix_web::test]
async fn updating_with_a_stale_token_is_precondition_failed() {
    let mut repo = MockStudentRepository::new();
    repo.expect_find_by_id()
        .times(1)
        .return_once(|_| Ok(Some(sample_student(7, 5))));
    repo.expect_update().times(0);

    let app = actix_test::init_service(test_app(repo)).await;
    let request = actix_test::TestRequest::put()
        .uri("/api/v1/students/7")
        .insert_header(bearer())
        .insert_header((header::IF_MATCH, "\"3\""))
        .set_json(json!({ "semester": 4 }))
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::PRECONDITION_FAILED);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(
        body.get("details")
            .and_then(|details| details.get("suppliedVersion")),
        Some(&json!(3))
    );
}

#[actix_web::test]
async fn updating_advances_the_entity_tag() {
    let mut repo = MockStudentRepository::new();
    repo.expect_find_by_id()
        .times(1)
        .return_once(|_| Ok(Some(sample_student(7, 0))));
    repo.expect_update()
        .withf(|id, patch, expected_version| {
            *id == 7 && patch.semester == Some(4) && *expected_version == 0
        })
        .times(1)
        .return_once(|_, _, _| Ok(1));

    let app = actix_test::init_service(test_app(repo)).await;
    let request = actix_test::TestRequest::put()
        .uri("/api/v1/students/7")
        .insert_header(bearer())
        .insert_header((header::IF_MATCH, "\"0\""))
        .set_json(json!({ "semester": 4 }))
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(
        response
            .headers()
            .get(header::ETAG)
            .and_then(|value| value.to_str().ok()),
        Some("\"1\"")
    );
}

#[actix_web::test]
async fn updating_maps_raced_writes_to_precondition_failed() {
    let mut repo = MockStudentRepository::new();
    repo.expect_find_by_id()
        .times(1)
        .return_once(|_| Ok(Some(sample_student(7, 0))));
    repo.expect_update()
        .times(1)
        .return_once(|_, _, _| Err(StudentRepositoryError::version_conflict(0_i32, 1_i32)));

    let app = actix_test::init_service(test_app(repo)).await;
    let request = actix_test::TestRequest::put()
        .uri("/api/v1/students/7")
        .insert_header(bearer())
        .insert_header((header::IF_MATCH, "\"0\""))
        .set_json(json!({ "semester": 4 }))
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::PRECONDITION_FAILED);
}

#[actix_web::test]
async fn deleting_returns_no_content() {
    let mut repo = MockStudentRepository::new();
    repo.expect_find_by_id()
        .times(1)
        .return_once(|_| Ok(Some(sample_student(7, 0))));
    repo.expect_delete().times(1).return_once(|_| Ok(true));

    let app = actix_test::init_service(test_app(repo)).await;
    let request = actix_test::TestRequest::delete()
        .uri("/api/v1/students/7")
        .insert_header(bearer())
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[actix_web::test]
async fn deleting_a_missing_student_is_not_found() {
    let mut repo = MockStudentRepository::new();
    repo.expect_find_by_id().times(1).return_once(|_| Ok(None));
    repo.expect_delete().times(0);

    let app = actix_test::init_service(test_app(repo)).await;
    let request = actix_test::TestRequest::delete()
        .uri("/api/v1/students/7")
        .insert_header(bearer())
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
