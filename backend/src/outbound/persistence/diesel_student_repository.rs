//! PostgreSQL-backed `StudentRepository` implementation using Diesel ORM.
//!
//! This adapter persists the student aggregate across three tables: the
//! student row itself, its optional wallet, and its transaction history.
//! Aggregate creation runs in a single database transaction, and updates use
//! a conditional `UPDATE` on the version column for optimistic concurrency.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::AsyncConnection as _;
use diesel_async::RunQueryDsl;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use pagination::{PageRequest, Slice};

use crate::domain::ports::{StudentRepository, StudentRepositoryError};
use crate::domain::{
    CreateStudent, Student, StudentFilter, StudentPatch, Transaction, TransactionKind, Wallet,
};

use super::diesel_helpers::{
    DieselFailure, cast_count, classify_diesel_error, contains_pattern, pool_error_message,
    unique_violation_field,
};
use super::models::{
    NewStudentRow, NewTransactionRow, NewWalletRow, StudentChangeset, StudentRow, TransactionRow,
    WalletRow,
};
use super::pool::{DbPool, PoolError};
use super::schema::{students, transactions, wallets};

/// Diesel-backed implementation of the `StudentRepository` port.
///
/// Reads assemble the full aggregate from its three tables; list queries
/// batch-load wallets and transactions for the whole page to avoid per-row
/// round trips.
#[derive(Clone)]
pub struct DieselStudentRepository {
    pool: DbPool,
}

impl DieselStudentRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Map pool errors to domain student repository errors.
fn map_pool_error(error: PoolError) -> StudentRepositoryError {
    StudentRepositoryError::connection(pool_error_message(error))
}

/// Map Diesel errors to domain student repository errors.
fn map_diesel_error(error: diesel::result::Error) -> StudentRepositoryError {
    match classify_diesel_error(error) {
        DieselFailure::Connection(message) => StudentRepositoryError::connection(message),
        DieselFailure::UniqueViolation { constraint } => {
            StudentRepositoryError::unique_violation(unique_violation_field(constraint.as_deref()))
        }
        DieselFailure::Query(message) => StudentRepositoryError::query(message),
    }
}

fn row_to_wallet(row: WalletRow) -> Wallet {
    Wallet {
        id: row.id,
        version: row.version,
        balance: row.balance,
        auto_reload: row.auto_reload,
        reload_threshold: row.reload_threshold,
        reload_amount: row.reload_amount,
        last_reloaded_at: row.last_reloaded_at,
        student_id: row.student_id,
    }
}

fn row_to_transaction(row: TransactionRow) -> Result<Transaction, StudentRepositoryError> {
    let kind = row.kind.parse::<TransactionKind>().map_err(|_| {
        StudentRepositoryError::query(format!(
            "unrecognised transaction kind {:?} in row {}",
            row.kind, row.id
        ))
    })?;
    Ok(Transaction {
        id: row.id,
        amount: row.amount,
        kind,
        reference: row.reference,
        location: row.location,
        recorded_at: row.recorded_at,
        student_id: row.student_id,
    })
}

fn row_to_student(row: StudentRow, wallet: Option<Wallet>, transactions: Vec<Transaction>) -> Student {
    Student {
        id: row.id,
        version: row.version,
        matriculation_number: row.matriculation_number,
        first_name: row.first_name,
        last_name: row.last_name,
        email: row.email,
        semester: row.semester,
        created_at: row.created_at,
        updated_at: row.updated_at,
        wallet,
        transactions,
    }
}

/// Apply the query filter to a boxed students query.
///
/// Text fields match case-insensitively on substrings; `id` and `semester`
/// match exactly. The transaction-kind filter keeps students that have at
/// least one transaction of that kind.
fn apply_filter<'a>(
    mut query: students::BoxedQuery<'a, diesel::pg::Pg>,
    filter: &StudentFilter,
) -> students::BoxedQuery<'a, diesel::pg::Pg> {
    if let Some(id) = filter.id {
        query = query.filter(students::id.eq(id));
    }
    if let Some(ref needle) = filter.matriculation_number {
        query = query.filter(students::matriculation_number.ilike(contains_pattern(needle)));
    }
    if let Some(ref needle) = filter.first_name {
        query = query.filter(students::first_name.ilike(contains_pattern(needle)));
    }
    if let Some(ref needle) = filter.last_name {
        query = query.filter(students::last_name.ilike(contains_pattern(needle)));
    }
    if let Some(ref needle) = filter.email {
        query = query.filter(students::email.ilike(contains_pattern(needle)));
    }
    if let Some(semester) = filter.semester {
        query = query.filter(students::semester.eq(semester));
    }
    if let Some(kind) = filter.kind {
        let with_kind = transactions::table
            .filter(transactions::kind.eq(kind.as_str()))
            .select(transactions::student_id);
        query = query.filter(students::id.eq_any(with_kind));
    }
    query
}

/// Load wallets and transactions for a page of student rows.
async fn load_aggregates<C>(
    conn: &mut C,
    rows: Vec<StudentRow>,
) -> Result<Vec<Student>, StudentRepositoryError>
where
    C: diesel_async::AsyncConnection<Backend = diesel::pg::Pg> + Send,
{
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<i32> = rows.iter().map(|row| row.id).collect();

    let wallet_rows: Vec<WalletRow> = wallets::table
        .filter(wallets::student_id.eq_any(&ids))
        .select(WalletRow::as_select())
        .load(conn)
        .await
        .map_err(map_diesel_error)?;
    let mut wallets_by_student: HashMap<i32, WalletRow> = wallet_rows
        .into_iter()
        .map(|row| (row.student_id, row))
        .collect();

    let transaction_rows: Vec<TransactionRow> = transactions::table
        .filter(transactions::student_id.eq_any(&ids))
        .order((transactions::recorded_at.asc(), transactions::id.asc()))
        .select(TransactionRow::as_select())
        .load(conn)
        .await
        .map_err(map_diesel_error)?;
    let mut transactions_by_student: HashMap<i32, Vec<Transaction>> = HashMap::new();
    for row in transaction_rows {
        let transaction = row_to_transaction(row)?;
        transactions_by_student
            .entry(transaction.student_id)
            .or_default()
            .push(transaction);
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let wallet = wallets_by_student.remove(&row.id).map(row_to_wallet);
            let transactions = transactions_by_student.remove(&row.id).unwrap_or_default();
            row_to_student(row, wallet, transactions)
        })
        .collect())
}

/// Work out why a conditional update wrote nothing.
///
/// Re-reads the current version to distinguish a concurrent write from a
/// deleted row.
async fn resolve_update_failure<C>(
    conn: &mut C,
    id: i32,
    expected_version: i32,
) -> StudentRepositoryError
where
    C: diesel_async::AsyncConnection<Backend = diesel::pg::Pg> + Send,
{
    let current = students::table
        .find(id)
        .select(students::version)
        .first::<i32>(conn)
        .await
        .optional();

    match current {
        Ok(Some(actual)) => StudentRepositoryError::version_conflict(expected_version, actual),
        Ok(None) => StudentRepositoryError::missing(id),
        Err(error) => map_diesel_error(error),
    }
}

#[async_trait]
impl StudentRepository for DieselStudentRepository {
    async fn find_by_id(&self, id: i32) -> Result<Option<Student>, StudentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<StudentRow> = students::table
            .find(id)
            .select(StudentRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        let Some(row) = row else {
            return Ok(None);
        };

        let wallet: Option<WalletRow> = wallets::table
            .filter(wallets::student_id.eq(id))
            .select(WalletRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        let transaction_rows: Vec<TransactionRow> = transactions::table
            .filter(transactions::student_id.eq(id))
            .order((transactions::recorded_at.asc(), transactions::id.asc()))
            .select(TransactionRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let transactions = transaction_rows
            .into_iter()
            .map(row_to_transaction)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some(row_to_student(
            row,
            wallet.map(row_to_wallet),
            transactions,
        )))
    }

    async fn find_page(
        &self,
        filter: &StudentFilter,
        page: PageRequest,
    ) -> Result<Slice<Student>, StudentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let total: i64 = apply_filter(students::table.into_boxed(), filter)
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let rows: Vec<StudentRow> = apply_filter(students::table.into_boxed(), filter)
            .select(StudentRow::as_select())
            .order(students::id.asc())
            .offset(page.offset())
            .limit(page.limit())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let students = load_aggregates(&mut conn, rows).await?;
        Ok(Slice::new(students, cast_count(total)))
    }

    async fn count(&self) -> Result<u64, StudentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let total: i64 = students::table
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(cast_count(total))
    }

    async fn matriculation_number_exists(
        &self,
        matriculation_number: &str,
    ) -> Result<bool, StudentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::select(diesel::dsl::exists(
            students::table.filter(students::matriculation_number.eq(matriculation_number)),
        ))
        .get_result(&mut conn)
        .await
        .map_err(map_diesel_error)
    }

    async fn email_exists(&self, email: &str) -> Result<bool, StudentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::select(diesel::dsl::exists(
            students::table.filter(students::email.eq(email)),
        ))
        .get_result(&mut conn)
        .await
        .map_err(map_diesel_error)
    }

    async fn create(&self, student: &CreateStudent) -> Result<i32, StudentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let created_id = conn
            .transaction(|conn| {
                async move {
                    let student_id: i32 = diesel::insert_into(students::table)
                        .values(&NewStudentRow {
                            matriculation_number: student.matriculation_number.clone(),
                            first_name: student.first_name.clone(),
                            last_name: student.last_name.clone(),
                            email: student.email.clone(),
                            semester: student.semester,
                        })
                        .returning(students::id)
                        .get_result(conn)
                        .await?;

                    if let Some(ref wallet) = student.wallet {
                        diesel::insert_into(wallets::table)
                            .values(&NewWalletRow {
                                balance: wallet.balance.clone(),
                                auto_reload: wallet.auto_reload,
                                reload_threshold: wallet.reload_threshold.clone(),
                                reload_amount: wallet.reload_amount.clone(),
                                last_reloaded_at: wallet.last_reloaded_at,
                                student_id,
                            })
                            .execute(conn)
                            .await?;
                    }

                    let now = Utc::now();
                    let transaction_rows: Vec<NewTransactionRow> = student
                        .transactions
                        .iter()
                        .map(|transaction| NewTransactionRow {
                            amount: transaction.amount.clone(),
                            kind: transaction.kind.as_str().to_owned(),
                            reference: transaction.reference.clone(),
                            location: transaction.location.clone(),
                            recorded_at: transaction.recorded_at.unwrap_or(now),
                            student_id,
                        })
                        .collect();
                    if !transaction_rows.is_empty() {
                        diesel::insert_into(transactions::table)
                            .values(&transaction_rows)
                            .execute(conn)
                            .await?;
                    }

                    Ok::<_, diesel::result::Error>(student_id)
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;

        Ok(created_id)
    }

    async fn update(
        &self,
        id: i32,
        patch: &StudentPatch,
        expected_version: i32,
    ) -> Result<i32, StudentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let next_version = expected_version + 1;

        let updated_rows = diesel::update(students::table)
            .filter(students::id.eq(id).and(students::version.eq(expected_version)))
            .set(StudentChangeset {
                matriculation_number: patch.matriculation_number.clone(),
                first_name: patch.first_name.clone(),
                last_name: patch.last_name.clone(),
                email: patch.email.clone(),
                semester: patch.semester,
                version: next_version,
                updated_at: Utc::now(),
            })
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        if updated_rows == 0 {
            return Err(resolve_update_failure(&mut conn, id, expected_version).await);
        }
        Ok(next_version)
    }

    async fn delete(&self, id: i32) -> Result<bool, StudentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        // Wallet, transactions, and any stored file go with the student row
        // via ON DELETE CASCADE.
        let deleted_rows = diesel::delete(students::table.find(id))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(deleted_rows > 0)
    }
}
