//! Student HTTP handlers.
//!
//! ```text
//! GET    /api/v1/students            search / paginate (only=count for totals)
//! GET    /api/v1/students/{id}       one aggregate, ETag + If-None-Match
//! POST   /api/v1/students            create aggregate (bearer)
//! PUT    /api/v1/students/{id}       update scalars under If-Match (bearer)
//! DELETE /api/v1/students/{id}       cascade delete (bearer)
//! ```

use std::collections::HashMap;

use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse, delete, get, post, put, web};
use pagination::{DEFAULT_PAGE_SIZE, PageRequest};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

use crate::domain::{
    CreateStudent, CreateTransaction, CreateWallet, Error, Student, StudentPatch, Transaction,
    TransactionKind, Wallet,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::BearerAuth;
use crate::inbound::http::preconditions::{
    etag_for_version, none_match_satisfied, require_if_match,
};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    Violations, check_email, check_matriculation_number, check_non_negative, check_non_zero,
    check_required, check_semester, parse_kind, parse_money, parse_timestamp,
};

/// Request payload for creating a student aggregate.
///
/// Monetary amounts travel as decimal strings so the cent scale survives the
/// wire, e.g. `"25.50"`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateStudentRequest {
    pub matriculation_number: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub semester: i32,
    pub wallet: Option<CreateWalletRequest>,
    #[serde(default)]
    pub transactions: Vec<CreateTransactionRequest>,
}

/// Wallet part of a create payload.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateWalletRequest {
    pub balance: String,
    #[serde(default)]
    pub auto_reload: bool,
    pub reload_threshold: String,
    pub reload_amount: String,
    pub last_reloaded_at: Option<String>,
}

/// Transaction part of a create payload.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionRequest {
    pub amount: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub reference: Option<String>,
    pub location: Option<String>,
    pub recorded_at: Option<String>,
}

/// Request payload for updating student scalars; absent fields keep their
/// persisted values.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStudentRequest {
    pub matriculation_number: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub semester: Option<i32>,
}

/// One student aggregate as served over HTTP.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudentResponse {
    pub id: i32,
    pub version: i32,
    pub matriculation_number: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub semester: i32,
    pub created_at: String,
    pub updated_at: String,
    pub wallet: Option<WalletResponse>,
    pub transactions: Vec<TransactionResponse>,
}

/// Wallet representation inside a [`StudentResponse`].
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WalletResponse {
    pub id: i32,
    pub version: i32,
    pub balance: String,
    pub auto_reload: bool,
    pub reload_threshold: String,
    pub reload_amount: String,
    pub last_reloaded_at: Option<String>,
    pub student_id: i32,
}

/// Transaction representation inside a [`StudentResponse`].
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    pub id: i32,
    pub amount: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub reference: Option<String>,
    pub location: Option<String>,
    pub recorded_at: String,
    pub student_id: i32,
}

/// One page of students plus the total matching count.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudentPageResponse {
    pub items: Vec<StudentResponse>,
    pub total: u64,
    pub page: u32,
    pub size: u32,
}

/// Bare student count, returned for `only=count`.
#[derive(Debug, Serialize, ToSchema)]
pub struct CountResponse {
    pub count: u64,
}

/// Query parameters recognised by the student search.
#[derive(Debug, IntoParams)]
#[into_params(parameter_in = Query)]
#[expect(dead_code, reason = "fields document the query contract for OpenAPI")]
pub struct StudentSearchParams {
    /// Exact student id.
    id: Option<i32>,
    /// Substring match on the matriculation number.
    matriculation_number: Option<String>,
    /// Case-insensitive substring match on the first name.
    first_name: Option<String>,
    /// Case-insensitive substring match on the last name.
    last_name: Option<String>,
    /// Case-insensitive substring match on the email address.
    email: Option<String>,
    /// Exact semester.
    semester: Option<i32>,
    /// Only students with a transaction of this kind (LOAD, SPEND, REFUND).
    art: Option<String>,
    /// Zero-based page index, defaults to 0.
    page: Option<u32>,
    /// Page size between 1 and 100, defaults to 20.
    size: Option<u32>,
    /// Set to `count` for an unfiltered total instead of a page.
    only: Option<String>,
}

impl From<Student> for StudentResponse {
    fn from(value: Student) -> Self {
        Self {
            id: value.id,
            version: value.version,
            matriculation_number: value.matriculation_number,
            first_name: value.first_name,
            last_name: value.last_name,
            email: value.email,
            semester: value.semester,
            created_at: value.created_at.to_rfc3339(),
            updated_at: value.updated_at.to_rfc3339(),
            wallet: value.wallet.map(WalletResponse::from),
            transactions: value
                .transactions
                .into_iter()
                .map(TransactionResponse::from)
                .collect(),
        }
    }
}

impl From<Wallet> for WalletResponse {
    fn from(value: Wallet) -> Self {
        Self {
            id: value.id,
            version: value.version,
            balance: value.balance.to_string(),
            auto_reload: value.auto_reload,
            reload_threshold: value.reload_threshold.to_string(),
            reload_amount: value.reload_amount.to_string(),
            last_reloaded_at: value.last_reloaded_at.map(|at| at.to_rfc3339()),
            student_id: value.student_id,
        }
    }
}

impl From<Transaction> for TransactionResponse {
    fn from(value: Transaction) -> Self {
        Self {
            id: value.id,
            amount: value.amount.to_string(),
            kind: value.kind,
            reference: value.reference,
            location: value.location,
            recorded_at: value.recorded_at.to_rfc3339(),
            student_id: value.student_id,
        }
    }
}

fn take_u32(
    params: &mut HashMap<String, String>,
    name: &str,
    default: u32,
) -> Result<u32, Error> {
    match params.remove(name) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|_| {
            Error::invalid_request(format!("{name} must be a non-negative integer"))
                .with_details(json!({ "field": name, "value": raw }))
        }),
    }
}

fn take_page_request(params: &mut HashMap<String, String>) -> Result<PageRequest, Error> {
    let page = take_u32(params, "page", 0)?;
    let size = take_u32(params, "size", DEFAULT_PAGE_SIZE)?;
    PageRequest::new(page, size)
        .map_err(|error| Error::invalid_request(error.to_string()).with_details(json!({
            "field": "size",
            "value": size,
        })))
}

fn parse_wallet(violations: &mut Violations, wallet: CreateWalletRequest) -> CreateWallet {
    let balance = parse_money(violations, "wallet.balance", &wallet.balance);
    check_non_negative(violations, "wallet.balance", &balance);
    let reload_threshold =
        parse_money(violations, "wallet.reloadThreshold", &wallet.reload_threshold);
    check_non_negative(violations, "wallet.reloadThreshold", &reload_threshold);
    let reload_amount = parse_money(violations, "wallet.reloadAmount", &wallet.reload_amount);
    check_non_negative(violations, "wallet.reloadAmount", &reload_amount);
    let last_reloaded_at = wallet
        .last_reloaded_at
        .map(|raw| parse_timestamp(violations, "wallet.lastReloadedAt", &raw));

    CreateWallet {
        balance,
        auto_reload: wallet.auto_reload,
        reload_threshold,
        reload_amount,
        last_reloaded_at,
    }
}

fn parse_transaction(
    violations: &mut Violations,
    index: usize,
    transaction: CreateTransactionRequest,
) -> CreateTransaction {
    let amount = parse_money(
        violations,
        &format!("transactions[{index}].amount"),
        &transaction.amount,
    );
    check_non_zero(violations, &format!("transactions[{index}].amount"), &amount);
    let kind = parse_kind(
        violations,
        &format!("transactions[{index}].type"),
        &transaction.kind,
    );
    let recorded_at = transaction.recorded_at.map(|raw| {
        parse_timestamp(
            violations,
            &format!("transactions[{index}].recordedAt"),
            &raw,
        )
    });

    CreateTransaction {
        amount,
        kind,
        reference: transaction.reference,
        location: transaction.location,
        recorded_at,
    }
}

fn parse_create_request(payload: CreateStudentRequest) -> Result<CreateStudent, Error> {
    let mut violations = Violations::new();
    check_matriculation_number(
        &mut violations,
        "matriculationNumber",
        &payload.matriculation_number,
    );
    check_required(&mut violations, "firstName", &payload.first_name);
    check_required(&mut violations, "lastName", &payload.last_name);
    check_email(&mut violations, "email", &payload.email);
    check_semester(&mut violations, "semester", payload.semester);

    let wallet = payload
        .wallet
        .map(|wallet| parse_wallet(&mut violations, wallet));
    let transactions = payload
        .transactions
        .into_iter()
        .enumerate()
        .map(|(index, transaction)| parse_transaction(&mut violations, index, transaction))
        .collect();

    violations.into_result()?;
    Ok(CreateStudent {
        matriculation_number: payload.matriculation_number,
        first_name: payload.first_name,
        last_name: payload.last_name,
        email: payload.email,
        semester: payload.semester,
        wallet,
        transactions,
    })
}

fn parse_update_request(payload: UpdateStudentRequest) -> Result<StudentPatch, Error> {
    let mut violations = Violations::new();
    if let Some(value) = &payload.matriculation_number {
        check_matriculation_number(&mut violations, "matriculationNumber", value);
    }
    if let Some(value) = &payload.first_name {
        check_required(&mut violations, "firstName", value);
    }
    if let Some(value) = &payload.last_name {
        check_required(&mut violations, "lastName", value);
    }
    if let Some(value) = &payload.email {
        check_email(&mut violations, "email", value);
    }
    if let Some(value) = payload.semester {
        check_semester(&mut violations, "semester", value);
    }

    violations.into_result()?;
    Ok(StudentPatch {
        matriculation_number: payload.matriculation_number,
        first_name: payload.first_name,
        last_name: payload.last_name,
        email: payload.email,
        semester: payload.semester,
    })
}

/// Search students or, with `only=count`, return the unfiltered total.
#[utoipa::path(
    get,
    path = "/api/v1/students",
    description = "Search students by filter parameters, one page at a time.",
    params(StudentSearchParams),
    responses(
        (status = 200, description = "One page of students", body = StudentPageResponse),
        (status = 400, description = "Invalid paging parameters", body = Error),
        (status = 404, description = "No students match", body = Error),
        (status = 503, description = "Database unavailable", body = Error)
    ),
    security([]),
    tags = ["students"],
    operation_id = "listStudents"
)]
#[get("/students")]
pub async fn list_students(
    state: web::Data<HttpState>,
    query: web::Query<HashMap<String, String>>,
) -> ApiResult<HttpResponse> {
    let mut params = query.into_inner();

    if let Some(only) = params.remove("only") {
        if only != "count" {
            return Err(Error::invalid_request("only supports the value count")
                .with_details(json!({ "field": "only", "value": only })));
        }
        let count = state.students.count().await?;
        return Ok(HttpResponse::Ok().json(CountResponse { count }));
    }

    let page = take_page_request(&mut params)?;
    let slice = state.students.find(&params, page).await?;
    Ok(HttpResponse::Ok().json(StudentPageResponse {
        total: slice.total,
        page: page.page(),
        size: page.size(),
        items: slice.items.into_iter().map(StudentResponse::from).collect(),
    }))
}

/// Fetch one student aggregate.
#[utoipa::path(
    get,
    path = "/api/v1/students/{id}",
    description = "Fetch one student with wallet and transactions.",
    params(
        ("id" = i32, Path, description = "Student id"),
        ("If-None-Match" = Option<String>, Header, description = "Entity tag of a cached representation")
    ),
    responses(
        (
            status = 200,
            description = "The student aggregate",
            headers(("ETag" = String, description = "Version entity tag")),
            body = StudentResponse
        ),
        (status = 304, description = "Cached representation is still fresh"),
        (status = 404, description = "No such student", body = Error)
    ),
    security([]),
    tags = ["students"],
    operation_id = "getStudent"
)]
#[get("/students/{id}")]
pub async fn get_student(
    state: web::Data<HttpState>,
    path: web::Path<i32>,
    req: HttpRequest,
) -> ApiResult<HttpResponse> {
    let id = path.into_inner();
    let student = state.students.fetch(id).await?;
    let etag = etag_for_version(student.version);
    if none_match_satisfied(&req, &etag) {
        return Ok(HttpResponse::NotModified()
            .insert_header((header::ETAG, etag))
            .finish());
    }
    Ok(HttpResponse::Ok()
        .insert_header((header::ETAG, etag))
        .json(StudentResponse::from(student)))
}

/// Create a student aggregate.
#[utoipa::path(
    post,
    path = "/api/v1/students",
    description = "Create a student with optional wallet and transactions in one transaction.",
    request_body = CreateStudentRequest,
    responses(
        (
            status = 201,
            description = "Student created",
            headers(
                ("Location" = String, description = "URL of the created student"),
                ("ETag" = String, description = "Version entity tag")
            ),
            body = StudentResponse
        ),
        (status = 400, description = "Validation violations", body = Error),
        (status = 401, description = "Missing or invalid bearer token", body = Error),
        (status = 409, description = "Email address already registered", body = Error),
        (status = 422, description = "Matriculation number already registered", body = Error)
    ),
    security(("bearer" = [])),
    tags = ["students"],
    operation_id = "createStudent"
)]
#[post("/students")]
pub async fn create_student(
    state: web::Data<HttpState>,
    _auth: BearerAuth,
    payload: web::Json<CreateStudentRequest>,
) -> ApiResult<HttpResponse> {
    let create = parse_create_request(payload.into_inner())?;
    let id = state.students.create(&create).await?;
    let student = state.students.fetch(id).await?;
    let etag = etag_for_version(student.version);
    Ok(HttpResponse::Created()
        .insert_header((header::LOCATION, format!("/api/v1/students/{id}")))
        .insert_header((header::ETAG, etag))
        .json(StudentResponse::from(student)))
}

/// Update student scalars under optimistic concurrency.
#[utoipa::path(
    put,
    path = "/api/v1/students/{id}",
    description = "Update student fields; requires the current version in If-Match.",
    request_body = UpdateStudentRequest,
    params(
        ("id" = i32, Path, description = "Student id"),
        ("If-Match" = String, Header, description = "Version entity tag from the last read")
    ),
    responses(
        (
            status = 204,
            description = "Student updated",
            headers(("ETag" = String, description = "New version entity tag"))
        ),
        (status = 400, description = "Malformed version token or payload", body = Error),
        (status = 401, description = "Missing or invalid bearer token", body = Error),
        (status = 404, description = "No such student", body = Error),
        (status = 412, description = "Supplied version is stale", body = Error),
        (status = 428, description = "If-Match header is missing", body = Error)
    ),
    security(("bearer" = [])),
    tags = ["students"],
    operation_id = "updateStudent"
)]
#[put("/students/{id}")]
pub async fn update_student(
    state: web::Data<HttpState>,
    _auth: BearerAuth,
    path: web::Path<i32>,
    req: HttpRequest,
    payload: web::Json<UpdateStudentRequest>,
) -> ApiResult<HttpResponse> {
    let id = path.into_inner();
    let token = require_if_match(&req)?;
    let patch = parse_update_request(payload.into_inner())?;
    let version = state.students.update(id, &patch, &token).await?;
    Ok(HttpResponse::NoContent()
        .insert_header((header::ETAG, etag_for_version(version)))
        .finish())
}

/// Delete a student aggregate.
#[utoipa::path(
    delete,
    path = "/api/v1/students/{id}",
    description = "Delete a student; the wallet, transactions, and file cascade.",
    params(("id" = i32, Path, description = "Student id")),
    responses(
        (status = 204, description = "Student deleted"),
        (status = 401, description = "Missing or invalid bearer token", body = Error),
        (status = 404, description = "No such student", body = Error)
    ),
    security(("bearer" = [])),
    tags = ["students"],
    operation_id = "deleteStudent"
)]
#[delete("/students/{id}")]
pub async fn delete_student(
    state: web::Data<HttpState>,
    _auth: BearerAuth,
    path: web::Path<i32>,
) -> ApiResult<HttpResponse> {
    let id = path.into_inner();
    if state.students.delete(id).await? {
        Ok(HttpResponse::NoContent().finish())
    } else {
        Err(Error::not_found(format!("student {id} not found")))
    }
}

#[cfg(test)]
#[path = "students_tests.rs"]
mod tests;
