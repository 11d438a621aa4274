//! Server construction and middleware wiring.
//!
//! `create_server` assembles the Diesel-backed repositories, the student
//! service, and the bearer-token verifier into an HTTP server; `build_app`
//! wires the route tree so integration tests can drive the exact production
//! configuration in memory.

mod config;

pub use config::{BuildMode, ConfigError, ServerConfig};

use std::sync::Arc;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

#[cfg(debug_assertions)]
use crate::doc::ApiDoc;
use crate::domain::ports::{StaticTokenVerifier, TokenVerifier};
use crate::domain::{Error, StudentService};
use crate::inbound::http::health::{HealthState, live, ready};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::student_files::{download_student_file, upload_student_file};
use crate::inbound::http::students::{
    create_student, delete_student, get_student, list_students, update_student,
};
use crate::middleware::Trace;
use crate::outbound::persistence::{DbPool, DieselStudentFileRepository, DieselStudentRepository};

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    max_file_bytes: usize,
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
        max_file_bytes,
    } = deps;

    // Bodies up to twice the upload ceiling reach the service, which rejects
    // them with a structured 400; anything larger is cut off by actix.
    let payload_config = web::PayloadConfig::new(max_file_bytes.saturating_mul(2).max(1024));
    let json_config = web::JsonConfig::default()
        .error_handler(|err, _req| Error::invalid_request(err.to_string()).into());

    let api = web::scope("/api/v1")
        .service(list_students)
        .service(get_student)
        .service(create_student)
        .service(update_student)
        .service(delete_student)
        .service(upload_student_file)
        .service(download_student_file);

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .app_data(payload_config)
        .app_data(json_config)
        .wrap(Trace)
        .service(api)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));
    #[cfg(not(debug_assertions))]
    let app = app;

    app
}

/// Construct an Actix HTTP server over the given pool and configuration.
///
/// # Parameters
/// - `config`: pre-validated [`ServerConfig`] with binding, token, and limits.
/// - `pool`: connection pool shared by both repositories.
/// - `health_state`: shared readiness state, marked ready once the listener
///   is bound.
///
/// # Returns
/// A spawned [`Server`] that must be awaited to drive the listener.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(
    config: ServerConfig,
    pool: DbPool,
    health_state: web::Data<HealthState>,
) -> std::io::Result<Server> {
    let students = Arc::new(DieselStudentRepository::new(pool.clone()));
    let files = Arc::new(DieselStudentFileRepository::new(pool));
    let service =
        StudentService::new(students, files).with_max_file_bytes(config.max_file_bytes());
    let tokens: Arc<dyn TokenVerifier> = Arc::new(StaticTokenVerifier::new(config.api_token()));
    let http_state = web::Data::new(HttpState::new(Arc::new(service), tokens));

    let server_health_state = health_state.clone();
    let max_file_bytes = config.max_file_bytes();

    let server = HttpServer::new(move || {
        build_app(AppDependencies {
            health_state: server_health_state.clone(),
            http_state: http_state.clone(),
            max_file_bytes,
        })
    })
    .bind(config.bind_addr())?
    .run();

    health_state.mark_ready();
    Ok(server)
}
