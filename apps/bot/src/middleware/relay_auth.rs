//! Shared-secret check for the relay-facing API.
//!
//! The relay process that holds the platform connection forwards events
//! with an `x-relay-token` header. When `RELAY_SHARED_SECRET` is unset the
//! check is skipped, which is how local dry runs are usually started.
//! A missing or wrong token short-circuits with a 401 problem response.

use actix_web::body::EitherBody;
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{web, Error, ResponseError};
use futures_util::future::{ready, LocalBoxFuture, Ready};
use tracing::warn;

use crate::error::AppError;
use crate::state::app_state::AppState;

pub const RELAY_TOKEN_HEADER: &str = "x-relay-token";

pub struct RelayAuth;

impl<S, B> Transform<S, ServiceRequest> for RelayAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RelayAuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RelayAuthMiddleware { service }))
    }
}

pub struct RelayAuthMiddleware<S> {
    service: S,
}

/// Compare without bailing out at the first differing byte.
fn same_secret(given: &[u8], expected: &[u8]) -> bool {
    given.len() == expected.len()
        && given
            .iter()
            .zip(expected)
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

impl<S, B> Service<ServiceRequest> for RelayAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let expected = req
            .app_data::<web::Data<AppState>>()
            .and_then(|state| state.config.relay_secret.clone());

        let allowed = match expected {
            None => true,
            Some(secret) => req
                .headers()
                .get(RELAY_TOKEN_HEADER)
                .is_some_and(|v| same_secret(v.as_bytes(), secret.as_bytes())),
        };

        if !allowed {
            warn!(path = %req.path(), "relay token missing or wrong");
            // Rendered inside the future so the body carries the request's trace id.
            return Box::pin(async move {
                let response = AppError::unauthorized().error_response();
                Ok(req.into_response(response).map_into_right_body())
            });
        }

        let fut = self.service.call(req);
        Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
    }
}
