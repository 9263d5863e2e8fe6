//! One structured line per relay call.
//!
//! Each line names the surface the relay hit (`events`, `commands`, ...)
//! so gateway chatter can be filtered apart from moderator traffic. Health
//! checks and chat-message forwarding are the bulk of the volume and are
//! logged at debug; failures always surface at warn or error.

use std::future::{ready, Ready};
use std::time::Instant;

use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::StatusCode;
use actix_web::{Error as ActixError, HttpMessage};
use futures_util::future::LocalBoxFuture;
use tracing::{debug, error, info, warn, Level};

/// The route group a path belongs to: the segment after `/api`, or
/// `health` for liveness checks.
pub fn relay_surface(path: &str) -> &'static str {
    let mut segments = path.trim_start_matches('/').split('/');
    match (segments.next(), segments.next()) {
        (Some("health"), _) => "health",
        (Some("api"), Some("events")) => "events",
        (Some("api"), Some("interactions")) => "interactions",
        (Some("api"), Some("commands")) => "commands",
        (Some("api"), Some("games")) => "games",
        (Some("api"), Some("guard")) => "guard",
        _ => "other",
    }
}

/// Level for a completed call. Rejected relay credentials are an operator
/// problem and log at error alongside server faults.
pub fn completion_level(status: StatusCode, surface: &str, path: &str) -> Level {
    if status.is_server_error() || status == StatusCode::UNAUTHORIZED {
        Level::ERROR
    } else if status.is_client_error() {
        Level::WARN
    } else if surface == "health" || path.ends_with("/events/message") {
        Level::DEBUG
    } else {
        Level::INFO
    }
}

pub struct StructuredLogger;

impl<S, B> Transform<S, ServiceRequest> for StructuredLogger
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = ActixError>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = ActixError;
    type InitError = ();
    type Transform = StructuredLoggerMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(StructuredLoggerMiddleware { service }))
    }
}

pub struct StructuredLoggerMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for StructuredLoggerMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = ActixError>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = ActixError;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let started = Instant::now();
        let method = req.method().clone();
        let path = req.path().to_string();
        let surface = relay_surface(&path);
        let trace_id = req
            .extensions()
            .get::<String>()
            .cloned()
            .unwrap_or_default();

        let fut = self.service.call(req);

        Box::pin(async move {
            let result = fut.await;
            let status = match &result {
                Ok(res) => res.status(),
                Err(err) => err.as_response_error().status_code(),
            };
            let elapsed_ms = started.elapsed().as_millis() as u64;
            let level = completion_level(status, surface, &path);
            let status = status.as_u16();

            macro_rules! completed {
                ($log:ident) => {
                    $log!(
                        relay.surface = surface,
                        http.method = %method,
                        url.path = %path,
                        http.status = status,
                        elapsed_ms,
                        trace_id = %trace_id,
                        "relay call completed"
                    )
                };
            }
            if level == Level::ERROR {
                completed!(error);
            } else if level == Level::WARN {
                completed!(warn);
            } else if level == Level::INFO {
                completed!(info);
            } else {
                completed!(debug);
            }

            result
        })
    }
}
