//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the domain repository ports, backed by
//! PostgreSQL via `diesel-async` with `bb8` connection pooling. The adapters
//! stay thin: they translate between Diesel row structs and domain types and
//! map database failures onto the port error types, nothing more. Row structs
//! (`models.rs`) and table definitions (`schema.rs`) never leave this module.
//!
//! # Example
//!
//! ```ignore
//! use campuspay::outbound::persistence::{DbPool, DieselStudentRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/campuspay")).await?;
//! let students = DieselStudentRepository::new(pool);
//! ```

pub(crate) mod diesel_helpers;
mod diesel_student_file_repository;
mod diesel_student_repository;
mod models;
mod pool;
mod schema;

pub use diesel_student_file_repository::DieselStudentFileRepository;
pub use diesel_student_repository::DieselStudentRepository;
pub use pool::{DbPool, PoolConfig, PoolError};
