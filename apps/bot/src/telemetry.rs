//! Log subscriber setup.
//!
//! JSON lines by default, one object per event with the active
//! `relay_call` span attached. `BOT_LOG_FORMAT=pretty` switches to
//! human-readable output for local runs. `RUST_LOG` overrides the filter.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Quiet the HTTP client stack; platform calls are already logged by the
/// gateway with their route.
pub const DEFAULT_FILTER: &str = "info,cafebot=info,actix_server=warn,reqwest=warn,hyper=warn,rustls=warn";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    pub fn from_env_value(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("pretty") => LogFormat::Pretty,
            _ => LogFormat::Json,
        }
    }
}

pub fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let format = LogFormat::from_env_value(std::env::var("BOT_LOG_FORMAT").ok().as_deref());

    let registry = tracing_subscriber::registry().with(env_filter);
    match format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(false)
                    .with_target(false)
                    .with_ansi(false),
            )
            .init(),
        LogFormat::Pretty => registry
            .with(fmt::layer().compact().with_target(true))
            .init(),
    }
}
