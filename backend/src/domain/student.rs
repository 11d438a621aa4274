//! Student aggregate entities and write payloads.
//!
//! A [`Student`] owns at most one [`Wallet`] and any number of
//! [`Transaction`]s. The aggregate is read and written as a whole: creating a
//! student persists its nested wallet and transactions in the same database
//! transaction, and deleting a student removes them with it.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Category of a wallet transaction.
///
/// Stored as text and exchanged over the wire under the JSON key `type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionKind {
    /// Money added to the wallet.
    Load,
    /// Money spent from the wallet.
    Spend,
    /// Money returned to the wallet.
    Refund,
}

impl TransactionKind {
    /// Canonical label as stored in the database.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Load => "LOAD",
            Self::Spend => "SPEND",
            Self::Refund => "REFUND",
        }
    }
}

/// Error returned when a transaction kind label is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown transaction kind: {0}")]
pub struct UnknownTransactionKind(pub String);

impl std::str::FromStr for TransactionKind {
    type Err = UnknownTransactionKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LOAD" => Ok(Self::Load),
            "SPEND" => Ok(Self::Spend),
            "REFUND" => Ok(Self::Refund),
            other => Err(UnknownTransactionKind(other.to_owned())),
        }
    }
}

/// A student enrolled at the campus, with their payment aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: i32,
    /// Optimistic concurrency version; starts at 0 and increments on update.
    pub version: i32,
    pub matriculation_number: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Current semester, 1-based.
    pub semester: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// The student's wallet, when one has been opened.
    pub wallet: Option<Wallet>,
    /// Payment history, oldest entry first.
    pub transactions: Vec<Transaction>,
}

/// Prepaid wallet owned by exactly one student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    pub id: i32,
    pub version: i32,
    /// Current balance in euros; never negative.
    pub balance: BigDecimal,
    /// Whether the wallet tops itself up when the balance drops.
    pub auto_reload: bool,
    /// Balance at or below which an automatic reload would trigger.
    pub reload_threshold: BigDecimal,
    /// Amount credited by an automatic reload.
    pub reload_amount: BigDecimal,
    pub last_reloaded_at: Option<DateTime<Utc>>,
    pub student_id: i32,
}

/// A single wallet movement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: i32,
    /// Amount in euros; never zero.
    pub amount: BigDecimal,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    /// Free-text booking reference, e.g. a till receipt number.
    pub reference: Option<String>,
    pub location: Option<String>,
    pub recorded_at: DateTime<Utc>,
    pub student_id: i32,
}

/// Binary document stored for a student, e.g. a scanned enrolment form.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentFile {
    pub student_id: i32,
    pub filename: String,
    /// Media type sniffed from the leading bytes at upload time.
    pub media_type: String,
    pub content: Vec<u8>,
    pub uploaded_at: DateTime<Utc>,
}

/// Replacement file content for a student.
#[derive(Debug, Clone, PartialEq)]
pub struct NewStudentFile {
    pub student_id: i32,
    pub filename: String,
    pub media_type: String,
    pub content: Vec<u8>,
}

/// Payload to create a student together with an optional wallet and initial
/// transactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStudent {
    pub matriculation_number: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub semester: i32,
    pub wallet: Option<CreateWallet>,
    pub transactions: Vec<CreateTransaction>,
}

/// Wallet fields accepted on student creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWallet {
    pub balance: BigDecimal,
    pub auto_reload: bool,
    pub reload_threshold: BigDecimal,
    pub reload_amount: BigDecimal,
    pub last_reloaded_at: Option<DateTime<Utc>>,
}

/// Transaction fields accepted on student creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransaction {
    pub amount: BigDecimal,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub reference: Option<String>,
    pub location: Option<String>,
    /// Defaults to the insertion time when absent.
    pub recorded_at: Option<DateTime<Utc>>,
}

/// Partial update for the student row itself.
///
/// `None` fields keep their persisted values. Wallet and transaction rows are
/// never touched by an update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentPatch {
    pub matriculation_number: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub semester: Option<i32>,
}
