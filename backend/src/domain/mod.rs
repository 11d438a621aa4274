//! Domain model and services.
//!
//! Purpose: define the student aggregate, its search filter, the shared API
//! error payload, and the ports the service drives. The HTTP and persistence
//! layers depend on this module, never the other way around.
//!
//! Public surface:
//! - `Error` / `ErrorCode` — API error payload and stable error identifiers.
//! - `Student`, `Wallet`, `Transaction`, `StudentFile` — the aggregate
//!   served over HTTP, plus the `Create*`/`StudentPatch` write shapes.
//! - `StudentFilter` — typed search filter built from raw query parameters.
//! - `StudentService` — use cases over the repository ports.

pub mod error;
pub mod filter;
pub mod ports;
pub mod student;
pub mod student_service;

pub use self::error::{Error, ErrorCode, TRACE_ID_HEADER};
pub use self::filter::StudentFilter;
pub use self::student::{
    CreateStudent, CreateTransaction, CreateWallet, NewStudentFile, Student, StudentFile,
    StudentPatch, Transaction, TransactionKind, UnknownTransactionKind, Wallet,
};
pub use self::student_service::{
    DEFAULT_MAX_FILE_BYTES, StudentService, parse_version_token, sniff_media_type,
};
