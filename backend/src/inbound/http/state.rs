//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on the domain service and ports and remain testable without I/O.

use std::sync::Arc;

use crate::domain::StudentService;
use crate::domain::ports::TokenVerifier;

/// Dependency bundle for HTTP handlers.
///
/// # Examples
/// ```
/// use std::sync::Arc;
///
/// use campuspay::domain::StudentService;
/// use campuspay::domain::ports::{
///     FixtureStudentFileRepository, FixtureStudentRepository, StaticTokenVerifier,
/// };
/// use campuspay::inbound::http::state::HttpState;
///
/// let service = StudentService::new(
///     Arc::new(FixtureStudentRepository),
///     Arc::new(FixtureStudentFileRepository),
/// );
/// let state = HttpState::new(
///     Arc::new(service),
///     Arc::new(StaticTokenVerifier::new("secret")),
/// );
/// let _students = state.students.clone();
/// ```
#[derive(Clone)]
pub struct HttpState {
    pub students: Arc<StudentService>,
    pub tokens: Arc<dyn TokenVerifier>,
}

impl HttpState {
    /// Construct state from the domain service and token verifier.
    pub fn new(students: Arc<StudentService>, tokens: Arc<dyn TokenVerifier>) -> Self {
        Self { students, tokens }
    }
}
