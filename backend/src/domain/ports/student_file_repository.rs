//! Port for student file persistence.
//!
//! Each student stores at most one binary document. Uploading again replaces
//! the previous file; adapters perform the swap inside one transaction.

use async_trait::async_trait;

use crate::domain::student::{NewStudentFile, StudentFile};

use super::define_port_error;

define_port_error! {
    /// Errors raised by student file repository adapters.
    pub enum StudentFileRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "student file repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "student file repository query failed: {message}",
        /// No student row exists for the supplied identifier.
        MissingStudent { id: i32 } =>
            "student {id} not found",
    }
}

/// Port for storing and retrieving a student's single file.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StudentFileRepository: Send + Sync {
    /// Replace the student's stored file inside one transaction.
    ///
    /// Fails with [`StudentFileRepositoryError::MissingStudent`] when no
    /// student row exists for `file.student_id`.
    async fn replace(&self, file: &NewStudentFile) -> Result<(), StudentFileRepositoryError>;

    /// Fetch the student's stored file, if any.
    async fn find_by_student_id(
        &self,
        student_id: i32,
    ) -> Result<Option<StudentFile>, StudentFileRepositoryError>;
}

/// Fixture implementation for testing without a real database.
///
/// Lookups return `None` and stored files are discarded.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureStudentFileRepository;

#[async_trait]
impl StudentFileRepository for FixtureStudentFileRepository {
    async fn replace(&self, _file: &NewStudentFile) -> Result<(), StudentFileRepositoryError> {
        Ok(())
    }

    async fn find_by_student_id(
        &self,
        _student_id: i32,
    ) -> Result<Option<StudentFile>, StudentFileRepositoryError> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixture_lookup_returns_none() {
        let repo = FixtureStudentFileRepository;
        let result = repo
            .find_by_student_id(7)
            .await
            .expect("fixture lookup succeeds");
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn fixture_accepts_replacements() {
        let repo = FixtureStudentFileRepository;
        let file = NewStudentFile {
            student_id: 7,
            filename: "enrolment.pdf".to_owned(),
            media_type: "application/pdf".to_owned(),
            content: b"%PDF-1.7".to_vec(),
        };
        repo.replace(&file).await.expect("fixture replace succeeds");
    }

    #[test]
    fn missing_student_error_names_the_id() {
        let error = StudentFileRepositoryError::missing_student(7_i32);
        assert_eq!(error.to_string(), "student 7 not found");
    }
}
