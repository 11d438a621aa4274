//! Backend library modules.
//!
//! Layout follows the hexagonal architecture: `domain` holds the student
//! aggregate, its services, and the ports they drive; `inbound::http` and
//! `outbound::persistence` implement the HTTP and PostgreSQL adapters;
//! `server` wires everything into a runnable Actix application.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod server;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
/// Request tracing middleware applied to every route.
pub use middleware::Trace;
