//! Student domain service.
//!
//! Coordinates the student and file repositories and enforces the write
//! protocol: uniqueness pre-checks on create, optimistic concurrency on
//! update, existence checks on delete, and the size ceiling plus media type
//! sniffing on file upload.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use pagination::{PageRequest, Slice};
use serde_json::json;

use crate::domain::error::Error;
use crate::domain::filter::StudentFilter;
use crate::domain::ports::{
    StudentFileRepository, StudentFileRepositoryError, StudentRepository, StudentRepositoryError,
};
use crate::domain::student::{
    CreateStudent, NewStudentFile, Student, StudentFile, StudentPatch, TransactionKind,
};

/// Upper bound on uploaded file sizes unless configured otherwise.
pub const DEFAULT_MAX_FILE_BYTES: usize = 8 * 1024 * 1024;

/// Magic-byte prefixes checked during upload, most specific first.
const MEDIA_SIGNATURES: &[(&[u8], &str)] = &[
    (b"%PDF-", "application/pdf"),
    (
        &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A],
        "image/png",
    ),
    (&[0xFF, 0xD8, 0xFF], "image/jpeg"),
    (b"GIF87a", "image/gif"),
    (b"GIF89a", "image/gif"),
    (b"PK\x03\x04", "application/zip"),
];

/// Determine the media type from the leading bytes of `content`.
///
/// Headers supplied by the client play no part here; unknown content falls
/// back to `application/octet-stream`.
pub fn sniff_media_type(content: &[u8]) -> &'static str {
    for (signature, media_type) in MEDIA_SIGNATURES {
        if content.starts_with(signature) {
            return media_type;
        }
    }
    if content.len() >= 12 && content.starts_with(b"RIFF") && &content[8..12] == b"WEBP" {
        return "image/webp";
    }
    "application/octet-stream"
}

/// Parse an optimistic concurrency token of the quoted-integer form `"3"`.
///
/// Fails with [`crate::domain::ErrorCode::VersionInvalid`] when the token is
/// not a quoted non-negative integer. Weak validators (`W/"3"`) are not
/// accepted.
pub fn parse_version_token(token: &str) -> Result<i32, Error> {
    let invalid = || {
        Error::version_invalid(format!("malformed version token: {token}"))
            .with_details(json!({ "token": token }))
    };
    let inner = token
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .ok_or_else(invalid)?;
    if inner.is_empty() || !inner.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(invalid());
    }
    inner.parse::<i32>().map_err(|_| invalid())
}

fn stale_version_error(supplied: i32, persisted: i32) -> Error {
    Error::version_outdated("student version is stale").with_details(json!({
        "suppliedVersion": supplied,
        "persistedVersion": persisted,
    }))
}

fn student_not_found(id: i32) -> Error {
    Error::not_found(format!("student {id} not found"))
}

fn map_student_error(error: StudentRepositoryError) -> Error {
    match error {
        StudentRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("student repository unavailable: {message}"))
        }
        StudentRepositoryError::Query { message } => {
            Error::internal(format!("student repository error: {message}"))
        }
        StudentRepositoryError::UniqueViolation { field } => {
            Error::conflict("value already taken").with_details(json!({ "field": field }))
        }
        StudentRepositoryError::VersionConflict { expected, actual } => {
            stale_version_error(expected, actual)
        }
        StudentRepositoryError::Missing { id } => student_not_found(id),
    }
}

fn map_file_error(error: StudentFileRepositoryError) -> Error {
    match error {
        StudentFileRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("student file repository unavailable: {message}"))
        }
        StudentFileRepositoryError::Query { message } => {
            Error::internal(format!("student file repository error: {message}"))
        }
        StudentFileRepositoryError::MissingStudent { id } => student_not_found(id),
    }
}

/// Student domain service over the persistence ports.
#[derive(Clone)]
pub struct StudentService {
    students: Arc<dyn StudentRepository>,
    files: Arc<dyn StudentFileRepository>,
    max_file_bytes: usize,
}

impl StudentService {
    /// Create a new service over the given repositories.
    pub fn new(students: Arc<dyn StudentRepository>, files: Arc<dyn StudentFileRepository>) -> Self {
        Self {
            students,
            files,
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
        }
    }

    /// Override the upload size ceiling.
    pub fn with_max_file_bytes(mut self, max_file_bytes: usize) -> Self {
        self.max_file_bytes = max_file_bytes;
        self
    }

    /// Fetch one student aggregate.
    pub async fn fetch(&self, id: i32) -> Result<Student, Error> {
        self.students
            .find_by_id(id)
            .await
            .map_err(map_student_error)?
            .ok_or_else(|| student_not_found(id))
    }

    /// Search students by raw query parameters, one page at a time.
    ///
    /// Unknown parameter names and unknown `art` values fail with `NotFound`,
    /// as does an empty result page. Unparseable values for the typed
    /// parameters (`id`, `semester`) merely widen the filter; see
    /// [`StudentFilter::from_params`].
    pub async fn find(
        &self,
        params: &HashMap<String, String>,
        page: PageRequest,
    ) -> Result<Slice<Student>, Error> {
        for name in params.keys() {
            if !StudentFilter::recognises(name) {
                return Err(Error::not_found(format!(
                    "unknown search parameter: {name}"
                )));
            }
        }
        if let Some(raw) = params.get("art") {
            TransactionKind::from_str(raw)
                .map_err(|_| Error::not_found(format!("unknown transaction kind: {raw}")))?;
        }

        let filter = StudentFilter::from_params(params);
        let slice = self
            .students
            .find_page(&filter, page)
            .await
            .map_err(map_student_error)?;
        if slice.is_empty() {
            return Err(Error::not_found("no students match the query"));
        }
        Ok(slice)
    }

    /// Count all students, ignoring any search parameters.
    pub async fn count(&self) -> Result<u64, Error> {
        self.students.count().await.map_err(map_student_error)
    }

    /// Create a student aggregate and return the generated id.
    ///
    /// The matriculation number and email address are pre-checked for
    /// uniqueness; the database constraints remain the backstop for writes
    /// racing past the checks.
    pub async fn create(&self, student: &CreateStudent) -> Result<i32, Error> {
        if self
            .students
            .matriculation_number_exists(&student.matriculation_number)
            .await
            .map_err(map_student_error)?
        {
            return Err(Error::matriculation_exists(format!(
                "matriculation number {} already registered",
                student.matriculation_number
            )));
        }
        if self
            .students
            .email_exists(&student.email)
            .await
            .map_err(map_student_error)?
        {
            return Err(Error::conflict("email address already registered")
                .with_details(json!({ "field": "email" })));
        }
        self.students
            .create(student)
            .await
            .map_err(map_student_error)
    }

    /// Apply `patch` under optimistic concurrency and return the new version.
    ///
    /// `version_token` is the quoted-integer token from the client. A token
    /// older than the persisted version fails with `VersionOutdated`; a token
    /// at or ahead of it is accepted, and the write itself remains
    /// conditional on the version read here.
    pub async fn update(
        &self,
        id: i32,
        patch: &StudentPatch,
        version_token: &str,
    ) -> Result<i32, Error> {
        let supplied = parse_version_token(version_token)?;
        let current = self.fetch(id).await?;
        if supplied < current.version {
            return Err(stale_version_error(supplied, current.version));
        }
        self.students
            .update(id, patch, current.version)
            .await
            .map_err(map_student_error)
    }

    /// Delete a student aggregate; returns whether a row existed.
    pub async fn delete(&self, id: i32) -> Result<bool, Error> {
        let existing = self
            .students
            .find_by_id(id)
            .await
            .map_err(map_student_error)?;
        if existing.is_none() {
            return Ok(false);
        }
        self.students.delete(id).await.map_err(map_student_error)
    }

    /// Store `content` as the student's file, replacing any previous one.
    ///
    /// The media type is sniffed from the content; oversized uploads fail
    /// with `InvalidRequest` before any repository work starts.
    pub async fn store_file(
        &self,
        student_id: i32,
        filename: &str,
        content: Vec<u8>,
    ) -> Result<(), Error> {
        if content.len() > self.max_file_bytes {
            return Err(
                Error::invalid_request("file exceeds the size ceiling").with_details(json!({
                    "sizeBytes": content.len(),
                    "maxBytes": self.max_file_bytes,
                })),
            );
        }
        let file = NewStudentFile {
            student_id,
            filename: filename.to_owned(),
            media_type: sniff_media_type(&content).to_owned(),
            content,
        };
        self.files.replace(&file).await.map_err(map_file_error)
    }

    /// Fetch the student's stored file.
    pub async fn fetch_file(&self, student_id: i32) -> Result<StudentFile, Error> {
        self.files
            .find_by_student_id(student_id)
            .await
            .map_err(map_file_error)?
            .ok_or_else(|| Error::not_found(format!("no file stored for student {student_id}")))
    }
}
