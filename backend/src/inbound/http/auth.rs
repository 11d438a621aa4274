//! Bearer authentication for HTTP handlers.
//!
//! Keep the HTTP modules focused on request/response mapping by concentrating
//! credential extraction and verification here. Handlers opt in by taking a
//! [`BearerAuth`] argument; extraction fails with `401 Unauthorized` before
//! the handler body runs.

use actix_web::http::header::{self, HeaderValue};
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures_util::future::LocalBoxFuture;

use crate::domain::Error;
use crate::domain::ports::TokenVerifierError;
use crate::inbound::http::state::HttpState;

/// Marker extractor proving the request carried a valid bearer token.
#[derive(Debug, Clone, Copy)]
pub struct BearerAuth;

fn bearer_token(header: Option<&HeaderValue>) -> Result<String, Error> {
    let value = header.ok_or_else(|| Error::unauthorized("missing bearer token"))?;
    let value = value
        .to_str()
        .map_err(|_| Error::unauthorized("malformed authorization header"))?;
    let token = value
        .strip_prefix("Bearer ")
        .ok_or_else(|| Error::unauthorized("authorization scheme must be Bearer"))?
        .trim();
    if token.is_empty() {
        return Err(Error::unauthorized("missing bearer token"));
    }
    Ok(token.to_owned())
}

fn map_verifier_error(error: TokenVerifierError) -> Error {
    match error {
        TokenVerifierError::Rejected { message } => {
            Error::unauthorized(format!("invalid bearer token: {message}"))
        }
        TokenVerifierError::Unavailable { message } => {
            Error::service_unavailable(format!("token verifier unavailable: {message}"))
        }
    }
}

impl FromRequest for BearerAuth {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<HttpState>>().cloned();
        let authorization = req.headers().get(header::AUTHORIZATION).cloned();
        Box::pin(async move {
            let state =
                state.ok_or_else(|| Error::internal("HTTP state is not configured"))?;
            let token = bearer_token(authorization.as_ref())?;
            state
                .tokens
                .verify(&token)
                .await
                .map_err(map_verifier_error)?;
            Ok(Self)
        })
    }
}
