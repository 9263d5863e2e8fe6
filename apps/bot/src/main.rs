use actix_web::{web, App, HttpServer};
use cafebot::config::BotConfig;
use cafebot::infra::state::build_state;
use cafebot::middleware::{RequestTrace, StructuredLogger, TraceSpan};
use cafebot::routes;
use tracing::info;

mod telemetry;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    telemetry::init_tracing();

    // Environment variables must be set by the runtime environment
    // (docker --env-file, or `set -a; . ./.env; set +a` locally).
    let config = match BotConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {e}");
            std::process::exit(1);
        }
    };
    let (host, port) = (config.http.host.clone(), config.http.port);

    let app_state = match build_state().with_config(config).build() {
        Ok(state) => state,
        Err(e) => {
            eprintln!("❌ Failed to build application state: {e}");
            std::process::exit(1);
        }
    };

    let housekeeping = app_state.start_housekeeping();
    let broadcasts = app_state.broadcast.start();
    info!(host = %host, port, dry_run = app_state.config.dry_run, "cafebot listening");

    let data = web::Data::new(app_state);

    let served = HttpServer::new(move || {
        App::new()
            .wrap(TraceSpan)
            .wrap(StructuredLogger)
            .wrap(RequestTrace)
            .app_data(data.clone())
            .configure(routes::configure)
    })
    .bind((host.as_str(), port))?
    .run()
    .await;

    housekeeping.abort();
    for timer in broadcasts {
        timer.abort();
    }
    served
}
