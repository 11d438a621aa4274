//! Student file HTTP handlers.
//!
//! ```text
//! PUT /api/v1/students/{id}/file     raw body upload, replaces any previous file (bearer)
//! GET /api/v1/students/{id}/file     serves the stored bytes
//! ```

use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{HttpRequest, HttpResponse, get, put, web};

use crate::domain::Error;
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::BearerAuth;
use crate::inbound::http::state::HttpState;

/// Header carrying the client's filename for an upload.
pub const FILENAME_HEADER: &str = "X-Filename";

const DEFAULT_FILENAME: &str = "upload.bin";

fn filename_from(req: &HttpRequest) -> Result<String, Error> {
    match req.headers().get(FILENAME_HEADER) {
        None => Ok(DEFAULT_FILENAME.to_owned()),
        Some(value) => {
            let name = value
                .to_str()
                .map_err(|_| Error::invalid_request("X-Filename must be valid UTF-8"))?
                .trim();
            if name.is_empty() {
                Ok(DEFAULT_FILENAME.to_owned())
            } else {
                Ok(name.to_owned())
            }
        }
    }
}

/// Store the request body as the student's file.
///
/// The media type is sniffed from the content server-side; any previously
/// stored file is replaced.
#[utoipa::path(
    put,
    path = "/api/v1/students/{id}/file",
    description = "Upload a file for a student, replacing any previous one.",
    request_body(content = Vec<u8>, content_type = "application/octet-stream"),
    params(
        ("id" = i32, Path, description = "Student id"),
        ("X-Filename" = Option<String>, Header, description = "Filename to store, defaults to upload.bin")
    ),
    responses(
        (status = 204, description = "File stored"),
        (status = 400, description = "File exceeds the size ceiling", body = Error),
        (status = 401, description = "Missing or invalid bearer token", body = Error),
        (status = 404, description = "No such student", body = Error)
    ),
    security(("bearer" = [])),
    tags = ["student-files"],
    operation_id = "uploadStudentFile"
)]
#[put("/students/{id}/file")]
pub async fn upload_student_file(
    state: web::Data<HttpState>,
    _auth: BearerAuth,
    path: web::Path<i32>,
    req: HttpRequest,
    body: web::Bytes,
) -> ApiResult<HttpResponse> {
    let id = path.into_inner();
    let filename = filename_from(&req)?;
    state.students.store_file(id, &filename, body.to_vec()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Serve the student's stored file.
#[utoipa::path(
    get,
    path = "/api/v1/students/{id}/file",
    description = "Download the student's stored file.",
    params(("id" = i32, Path, description = "Student id")),
    responses(
        (
            status = 200,
            description = "The stored bytes",
            headers(
                ("Content-Type" = String, description = "Sniffed media type"),
                ("Content-Disposition" = String, description = "Attachment with the stored filename")
            )
        ),
        (status = 404, description = "No such student or no file stored", body = Error)
    ),
    security([]),
    tags = ["student-files"],
    operation_id = "downloadStudentFile"
)]
#[get("/students/{id}/file")]
pub async fn download_student_file(
    state: web::Data<HttpState>,
    path: web::Path<i32>,
) -> ApiResult<HttpResponse> {
    let id = path.into_inner();
    let file = state.students.fetch_file(id).await?;
    let disposition = ContentDisposition {
        disposition: DispositionType::Attachment,
        parameters: vec![DispositionParam::Filename(file.filename)],
    };
    Ok(HttpResponse::Ok()
        .content_type(file.media_type)
        .insert_header(disposition)
        .body(file.content))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::http::StatusCode;
    use actix_web::http::header;
    use actix_web::{App, test as actix_test};
    use chrono::Utc;
    use serde_json::Value;

    use super::*;
    use crate::domain::ports::{
        FixtureStudentRepository, MockStudentFileRepository, StaticTokenVerifier,
    };
    use crate::domain::{StudentFile, StudentService};

    const TOKEN: &str = "sesame";

    fn test_app(
        files: MockStudentFileRepository,
        max_file_bytes: Option<usize>,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        let mut service =
            StudentService::new(Arc::new(FixtureStudentRepository), Arc::new(files));
        if let Some(max) = max_file_bytes {
            service = service.with_max_file_bytes(max);
        }
        let state = HttpState::new(Arc::new(service), Arc::new(StaticTokenVerifier::new(TOKEN)));
        App::new().app_data(web::Data::new(state)).service(
            web::scope("/api/v1")
                .service(upload_student_file)
                .service(download_student_file),
        )
    }

    fn bearer() -> (header::HeaderName, String) {
        (header::AUTHORIZATION, format!("Bearer {TOKEN}"))
    }

    #[actix_web::test]
    async fn uploads_store_the_sniffed_media_type() {
        let mut files = MockStudentFileRepository::new();
        files
            .expect_replace()
            .withf(|file| {
                file.student_id == 7
                    && file.filename == "enrolment.pdf"
                    && file.media_type == "application/pdf"
            })
            .times(1)
            .return_once(|_| Ok(()));

        let app = actix_test::init_service(test_app(files, None)).await;
        let request = actix_test::TestRequest::put()
            .uri("/api/v1/students/7/file")
            .insert_header(bearer())
            .insert_header((FILENAME_HEADER, "enrolment.pdf"))
            .set_payload(&b"%PDF-1.7 content"[..])
            .to_request();
        let response = actix_test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[actix_web::test]
    async fn uploads_default_the_filename() {
        let mut files = MockStudentFileRepository::new();
        files
            .expect_replace()
            .withf(|file| file.filename == "upload.bin")
            .times(1)
            .return_once(|_| Ok(()));

        let app = actix_test::init_service(test_app(files, None)).await;
        let request = actix_test::TestRequest::put()
            .uri("/api/v1/students/7/file")
            .insert_header(bearer())
            .set_payload(&b"anything"[..])
            .to_request();
        let response = actix_test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[actix_web::test]
    async fn uploads_without_a_token_are_unauthorised() {
        let files = MockStudentFileRepository::new();

        let app = actix_test::init_service(test_app(files, None)).await;
        let request = actix_test::TestRequest::put()
            .uri("/api/v1/students/7/file")
            .set_payload(&b"anything"[..])
            .to_request();
        let response = actix_test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn oversized_uploads_are_rejected_before_persistence() {
        let mut files = MockStudentFileRepository::new();
        files.expect_replace().times(0);

        let app = actix_test::init_service(test_app(files, Some(8))).await;
        let request = actix_test::TestRequest::put()
            .uri("/api/v1/students/7/file")
            .insert_header(bearer())
            .set_payload(vec![0_u8; 9])
            .to_request();
        let response = actix_test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(
            body.get("code").and_then(Value::as_str),
            Some("invalid_request")
        );
    }

    #[actix_web::test]
    async fn downloads_serve_stored_bytes_with_headers() {
        let mut files = MockStudentFileRepository::new();
        files.expect_find_by_student_id().times(1).return_once(|_| {
            Ok(Some(StudentFile {
                student_id: 7,
                filename: "enrolment.pdf".to_owned(),
                media_type: "application/pdf".to_owned(),
                content: b"%PDF-1.7 content".to_vec(),
                uploaded_at: Utc::now(),
            }))
        });

        let app = actix_test::init_service(test_app(files, None)).await;
        let request = actix_test::TestRequest::get()
            .uri("/api/v1/students/7/file")
            .to_request();
        let response = actix_test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|value| value.to_str().ok()),
            Some("application/pdf")
        );
        let disposition = response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .expect("content disposition");
        assert!(disposition.contains("attachment"));
        assert!(disposition.contains("enrolment.pdf"));
        let body = actix_test::read_body(response).await;
        assert_eq!(&body[..], b"%PDF-1.7 content");
    }

    #[actix_web::test]
    async fn downloads_for_missing_files_are_not_found() {
        let mut files = MockStudentFileRepository::new();
        files
            .expect_find_by_student_id()
            .times(1)
            .return_once(|_| Ok(None));

        let app = actix_test::init_service(test_app(files, None)).await;
        let request = actix_test::TestRequest::get()
            .uri("/api/v1/students/7/file")
            .to_request();
        let response = actix_test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
