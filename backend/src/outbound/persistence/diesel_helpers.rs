//! Shared helpers for the Diesel repository implementations.
//!
//! Error classification and pattern handling common to the student and
//! student-file repositories. Each repository maps the classified failures
//! onto its own port error type.

use tracing::debug;

use super::pool::PoolError;

/// Extract a readable message from a pool error.
pub fn pool_error_message(error: PoolError) -> String {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    }
}

/// Broad classification of a Diesel failure.
#[derive(Debug)]
pub enum DieselFailure {
    /// The connection to the database is gone.
    Connection(String),
    /// A unique constraint rejected the write.
    UniqueViolation { constraint: Option<String> },
    /// Anything else; the message is generic and safe to surface.
    Query(String),
}

/// Classify a Diesel error and emit debug context for diagnosis.
pub fn classify_diesel_error(error: diesel::result::Error) -> DieselFailure {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => DieselFailure::Query("record not found".to_owned()),
        DieselError::QueryBuilderError(_) => {
            DieselFailure::Query("database query error".to_owned())
        }
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            DieselFailure::UniqueViolation {
                constraint: info.constraint_name().map(str::to_owned),
            }
        }
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            DieselFailure::Connection("database connection error".to_owned())
        }
        DieselError::DatabaseError(_, _) => DieselFailure::Query("database error".to_owned()),
        _ => DieselFailure::Query("database error".to_owned()),
    }
}

/// Resolve a unique-constraint name to the request field it guards.
pub fn unique_violation_field(constraint: Option<&str>) -> &'static str {
    match constraint {
        Some("students_matriculation_number_key") => "matriculationNumber",
        Some("students_email_key") => "email",
        _ => "unknown",
    }
}

/// Escape `ILIKE` metacharacters in a needle and wrap it in wildcards.
///
/// Postgres treats `%`, `_`, and `\` specially inside a pattern, so a
/// literal occurrence in the search term must be backslash-escaped: "50%"
/// then matches the text "50%" rather than anything starting with "50".
pub fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

/// Cast a Postgres `COUNT` result to the domain's unsigned total.
pub fn cast_count(count: i64) -> u64 {
    u64::try_from(count).unwrap_or_default()
}
