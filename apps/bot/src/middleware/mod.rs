pub mod relay_auth;
pub mod request_trace;
pub mod structured_logger;

pub use relay_auth::RelayAuth;
pub use request_trace::RequestTrace;
pub use structured_logger::StructuredLogger;

pub mod trace_span;
pub use trace_span::TraceSpan;
