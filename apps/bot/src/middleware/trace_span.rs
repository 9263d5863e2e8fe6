//! Wraps each relay call in a `relay_call` span.
//!
//! Service logs emitted while handling the call inherit `trace_id` and the
//! relay surface. Guard routes carry the community in the path, so it is
//! attached up front; other surfaces leave it to the handler's own fields.
//!
//! Reads the trace id that `RequestTrace` stored, so it sits outside it:
//!
//! App::new()
//!     .wrap(TraceSpan)
//!     .wrap(StructuredLogger)
//!     .wrap(RequestTrace)

use std::future::{ready, Ready};

use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{Error, HttpMessage};
use futures_util::future::LocalBoxFuture;
use tracing::{field, info_span, Instrument};

use super::structured_logger::relay_surface;

/// Community id embedded in a guard route, e.g. `/api/guard/500/stats`.
pub fn community_in_path(path: &str) -> Option<u64> {
    path.strip_prefix("/api/guard/")?
        .split('/')
        .next()?
        .parse()
        .ok()
}

#[derive(Clone, Default)]
pub struct TraceSpan;

impl<S, B> Transform<S, ServiceRequest> for TraceSpan
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = TraceSpanMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(TraceSpanMiddleware { service }))
    }
}

pub struct TraceSpanMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for TraceSpanMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let trace_id = req.extensions().get::<String>().cloned();
        let path = req.path();

        let span = info_span!(
            "relay_call",
            trace_id = trace_id.as_deref().unwrap_or("untraced"),
            relay.surface = relay_surface(path),
            http.method = %req.method(),
            url.path = %path,
            community = field::Empty,
        );
        if let Some(community) = community_in_path(path) {
            span.record("community", community);
        }

        Box::pin(self.service.call(req).instrument(span))
    }
}
