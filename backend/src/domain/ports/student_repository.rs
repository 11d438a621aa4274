//! Port for student aggregate persistence.
//!
//! The [`StudentRepository`] trait defines the contract for storing and
//! retrieving students together with their wallet and transactions. Adapters
//! implement it over durable storage (e.g. PostgreSQL) with optimistic
//! concurrency on the student row's version column.

use async_trait::async_trait;
use pagination::{PageRequest, Slice};

use crate::domain::filter::StudentFilter;
use crate::domain::student::{CreateStudent, Student, StudentPatch};

use super::define_port_error;

define_port_error! {
    /// Errors raised by student repository adapters.
    pub enum StudentRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "student repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "student repository query failed: {message}",
        /// A unique column already holds the supplied value.
        UniqueViolation { field: String } =>
            "value already taken for {field}",
        /// Optimistic concurrency check failed.
        VersionConflict { expected: i32, actual: i32 } =>
            "version conflict: expected {expected}, found {actual}",
        /// No student row exists for the supplied identifier.
        Missing { id: i32 } =>
            "student {id} not found",
    }
}

/// Port for student aggregate storage and retrieval.
///
/// # Version semantics
///
/// - New students start at version 0.
/// - [`StudentRepository::update`] only writes when the persisted version
///   still equals `expected_version`, bumping it by one on success.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StudentRepository: Send + Sync {
    /// Fetch one student with wallet and transactions.
    ///
    /// Returns `None` when no row exists for `id`.
    async fn find_by_id(&self, id: i32) -> Result<Option<Student>, StudentRepositoryError>;

    /// Fetch one page of students matching `filter`, wallets included.
    ///
    /// The slice total counts every matching row, not just this page.
    async fn find_page(
        &self,
        filter: &StudentFilter,
        page: PageRequest,
    ) -> Result<Slice<Student>, StudentRepositoryError>;

    /// Count all student rows, unfiltered.
    async fn count(&self) -> Result<u64, StudentRepositoryError>;

    /// True when a student already uses this matriculation number.
    async fn matriculation_number_exists(
        &self,
        matriculation_number: &str,
    ) -> Result<bool, StudentRepositoryError>;

    /// True when a student already uses this email address.
    async fn email_exists(&self, email: &str) -> Result<bool, StudentRepositoryError>;

    /// Insert the aggregate in one transaction and return the generated id.
    async fn create(&self, student: &CreateStudent) -> Result<i32, StudentRepositoryError>;

    /// Apply `patch` if the persisted version still equals `expected_version`.
    ///
    /// Returns the incremented version on success. Fails with
    /// [`StudentRepositoryError::VersionConflict`] when another writer got
    /// there first, or [`StudentRepositoryError::Missing`] when the row is
    /// gone.
    async fn update(
        &self,
        id: i32,
        patch: &StudentPatch,
        expected_version: i32,
    ) -> Result<i32, StudentRepositoryError>;

    /// Delete the aggregate; returns whether a row existed.
    async fn delete(&self, id: i32) -> Result<bool, StudentRepositoryError>;
}

/// Fixture implementation for testing without a real database.
///
/// Lookups return `None`, empty pages, or zero counts, and writes are
/// discarded. Use it in tests where persistence behaviour is not under test.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureStudentRepository;

#[async_trait]
impl StudentRepository for FixtureStudentRepository {
    async fn find_by_id(&self, _id: i32) -> Result<Option<Student>, StudentRepositoryError> {
        Ok(None)
    }

    async fn find_page(
        &self,
        _filter: &StudentFilter,
        _page: PageRequest,
    ) -> Result<Slice<Student>, StudentRepositoryError> {
        Ok(Slice::new(Vec::new(), 0))
    }

    async fn count(&self) -> Result<u64, StudentRepositoryError> {
        Ok(0)
    }

    async fn matriculation_number_exists(
        &self,
        _matriculation_number: &str,
    ) -> Result<bool, StudentRepositoryError> {
        Ok(false)
    }

    async fn email_exists(&self, _email: &str) -> Result<bool, StudentRepositoryError> {
        Ok(false)
    }

    async fn create(&self, _student: &CreateStudent) -> Result<i32, StudentRepositoryError> {
        Ok(1)
    }

    async fn update(
        &self,
        _id: i32,
        _patch: &StudentPatch,
        expected_version: i32,
    ) -> Result<i32, StudentRepositoryError> {
        Ok(expected_version + 1)
    }

    async fn delete(&self, _id: i32) -> Result<bool, StudentRepositoryError> {
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[tokio::test]
    async fn fixture_lookup_returns_none() {
        let repo = FixtureStudentRepository;
        let result = repo.find_by_id(7).await.expect("fixture lookup succeeds");
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn fixture_page_is_empty() {
        let repo = FixtureStudentRepository;
        let slice = repo
            .find_page(&StudentFilter::default(), PageRequest::default())
            .await
            .expect("fixture page succeeds");
        assert!(slice.is_empty());
        assert_eq!(slice.total, 0);
    }

    #[tokio::test]
    async fn fixture_update_bumps_the_supplied_version() {
        let repo = FixtureStudentRepository;
        let version = repo
            .update(7, &StudentPatch::default(), 4)
            .await
            .expect("fixture update succeeds");
        assert_eq!(version, 5);
    }

    #[rstest]
    fn version_conflict_error_names_both_versions() {
        let error = StudentRepositoryError::version_conflict(2_i32, 5_i32);
        let message = error.to_string();

        assert!(message.contains("expected 2"));
        assert!(message.contains("found 5"));
    }

    #[rstest]
    fn unique_violation_error_names_the_field() {
        let error = StudentRepositoryError::unique_violation("matriculationNumber");
        assert_eq!(
            error.to_string(),
            "value already taken for matriculationNumber"
        );
    }
}
