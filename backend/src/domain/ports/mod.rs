//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod student_file_repository;
mod student_repository;
mod token_verifier;

#[cfg(test)]
pub use student_file_repository::MockStudentFileRepository;
pub use student_file_repository::{
    FixtureStudentFileRepository, StudentFileRepository, StudentFileRepositoryError,
};
#[cfg(test)]
pub use student_repository::MockStudentRepository;
pub use student_repository::{FixtureStudentRepository, StudentRepository, StudentRepositoryError};
#[cfg(test)]
pub use token_verifier::MockTokenVerifier;
pub use token_verifier::{
    FixtureTokenVerifier, StaticTokenVerifier, TokenVerifier, TokenVerifierError,
};
