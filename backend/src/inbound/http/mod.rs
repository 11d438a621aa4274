//! HTTP inbound adapter exposing REST endpoints.

pub mod auth;
pub mod error;
pub mod health;
pub mod preconditions;
pub mod state;
pub mod student_files;
pub mod students;
pub mod validation;

pub use error::ApiResult;
