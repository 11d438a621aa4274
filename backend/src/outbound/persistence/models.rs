//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. They exist solely to satisfy Diesel's
//! type requirements for queries and mutations.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

use super::schema::{student_files, students, transactions, wallets};

/// Row struct for reading from the students table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = students)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct StudentRow {
    pub id: i32,
    pub version: i32,
    pub matriculation_number: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub semester: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row struct for reading from the wallets table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = wallets)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct WalletRow {
    pub id: i32,
    pub version: i32,
    pub balance: BigDecimal,
    pub auto_reload: bool,
    pub reload_threshold: BigDecimal,
    pub reload_amount: BigDecimal,
    pub last_reloaded_at: Option<DateTime<Utc>>,
    pub student_id: i32,
}

/// Row struct for reading from the transactions table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = transactions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct TransactionRow {
    pub id: i32,
    pub amount: BigDecimal,
    pub kind: String,
    pub reference: Option<String>,
    pub location: Option<String>,
    pub recorded_at: DateTime<Utc>,
    pub student_id: i32,
}

/// Row struct for reading from the student_files table.
///
/// The surrogate `id` column is not selected; the domain addresses files by
/// their owning student.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = student_files)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct StudentFileRow {
    pub student_id: i32,
    pub filename: String,
    pub media_type: String,
    pub content: Vec<u8>,
    pub uploaded_at: DateTime<Utc>,
}

/// Insertable struct for creating student records.
///
/// `version` and the audit timestamps come from column defaults.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = students)]
pub(crate) struct NewStudentRow {
    pub matriculation_number: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub semester: i32,
}

/// Insertable struct for creating wallet records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = wallets)]
pub(crate) struct NewWalletRow {
    pub balance: BigDecimal,
    pub auto_reload: bool,
    pub reload_threshold: BigDecimal,
    pub reload_amount: BigDecimal,
    pub last_reloaded_at: Option<DateTime<Utc>>,
    pub student_id: i32,
}

/// Insertable struct for creating transaction records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = transactions)]
pub(crate) struct NewTransactionRow {
    pub amount: BigDecimal,
    pub kind: String,
    pub reference: Option<String>,
    pub location: Option<String>,
    pub recorded_at: DateTime<Utc>,
    pub student_id: i32,
}

/// Insertable struct for storing an uploaded file.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = student_files)]
pub(crate) struct NewStudentFileRow {
    pub student_id: i32,
    pub filename: String,
    pub media_type: String,
    pub content: Vec<u8>,
    pub uploaded_at: DateTime<Utc>,
}

/// Changeset for partial student updates; `None` fields are left untouched.
///
/// `version` and `updated_at` are always written so every successful update
/// advances the optimistic-lock counter.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = students)]
pub(crate) struct StudentChangeset {
    pub matriculation_number: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub semester: Option<i32>,
    pub version: i32,
    pub updated_at: DateTime<Utc>,
}
