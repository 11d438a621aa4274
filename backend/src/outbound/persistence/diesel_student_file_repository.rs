//! PostgreSQL-backed `StudentFileRepository` implementation using Diesel ORM.
//!
//! Stores at most one binary document per student. Replacing a file checks
//! that the student still exists, removes any previous row, and inserts the
//! new one, all inside a single transaction so readers never observe two
//! files for one student.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::AsyncConnection as _;
use diesel_async::RunQueryDsl;
use diesel_async::scoped_futures::ScopedFutureExt as _;

use crate::domain::ports::{StudentFileRepository, StudentFileRepositoryError};
use crate::domain::{NewStudentFile, StudentFile};

use super::diesel_helpers::{DieselFailure, classify_diesel_error, pool_error_message};
use super::models::{NewStudentFileRow, StudentFileRow};
use super::pool::{DbPool, PoolError};
use super::schema::{student_files, students};

/// Diesel-backed implementation of the `StudentFileRepository` port.
#[derive(Clone)]
pub struct DieselStudentFileRepository {
    pool: DbPool,
}

impl DieselStudentFileRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Map pool errors to domain student file repository errors.
fn map_pool_error(error: PoolError) -> StudentFileRepositoryError {
    StudentFileRepositoryError::connection(pool_error_message(error))
}

/// Map Diesel errors to domain student file repository errors.
fn map_diesel_error(error: diesel::result::Error) -> StudentFileRepositoryError {
    match classify_diesel_error(error) {
        DieselFailure::Connection(message) => StudentFileRepositoryError::connection(message),
        DieselFailure::UniqueViolation { .. } => {
            StudentFileRepositoryError::query("duplicate student file")
        }
        DieselFailure::Query(message) => StudentFileRepositoryError::query(message),
    }
}

fn row_to_file(row: StudentFileRow) -> StudentFile {
    StudentFile {
        student_id: row.student_id,
        filename: row.filename,
        media_type: row.media_type,
        content: row.content,
        uploaded_at: row.uploaded_at,
    }
}

#[async_trait]
impl StudentFileRepository for DieselStudentFileRepository {
    async fn replace(&self, file: &NewStudentFile) -> Result<(), StudentFileRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let stored = conn
            .transaction(|conn| {
                async move {
                    let student_exists: bool = diesel::select(diesel::dsl::exists(
                        students::table.filter(students::id.eq(file.student_id)),
                    ))
                    .get_result(conn)
                    .await?;
                    if !student_exists {
                        return Ok(false);
                    }

                    diesel::delete(
                        student_files::table
                            .filter(student_files::student_id.eq(file.student_id)),
                    )
                    .execute(conn)
                    .await?;

                    diesel::insert_into(student_files::table)
                        .values(&NewStudentFileRow {
                            student_id: file.student_id,
                            filename: file.filename.clone(),
                            media_type: file.media_type.clone(),
                            content: file.content.clone(),
                            uploaded_at: Utc::now(),
                        })
                        .execute(conn)
                        .await?;

                    Ok::<_, diesel::result::Error>(true)
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;

        if !stored {
            return Err(StudentFileRepositoryError::missing_student(file.student_id));
        }
        Ok(())
    }

    async fn find_by_student_id(
        &self,
        student_id: i32,
    ) -> Result<Option<StudentFile>, StudentFileRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<StudentFileRow> = student_files::table
            .filter(student_files::student_id.eq(student_id))
            .select(StudentFileRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(row_to_file))
    }
}
