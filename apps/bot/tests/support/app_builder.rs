use std::sync::Arc;

use actix_http::Request;
use actix_web::body::BoxBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::{test, web, App, Error};
use cafebot::config::BotConfig;
use cafebot::gateway::MemoryGateway;
use cafebot::middleware::{RequestTrace, StructuredLogger, TraceSpan};
use cafebot::{build_state, routes, AppState};

use super::fixtures::{community, LOG_CHANNEL, WELCOME_CHANNEL};

/// Deterministic, quiet configuration: seeded RNG, human always opens,
/// welcome and audit channels set.
pub fn test_config() -> BotConfig {
    let mut config = BotConfig::default();
    config.welcome.channel = Some(WELCOME_CHANNEL);
    config.guard.log_channel = Some(LOG_CHANNEL);
    config.games.rng_seed = Some(7);
    config.games.computer_first_chance = 0.0;
    config
}

/// Builder for creating test Actix service instances over a `MemoryGateway`.
pub struct TestAppBuilder {
    config: BotConfig,
    gateway: Arc<MemoryGateway>,
}

impl Default for TestAppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestAppBuilder {
    pub fn new() -> Self {
        Self {
            config: test_config(),
            gateway: Arc::new(
                MemoryGateway::new()
                    .with_channel(community(), "general", cafebot::gateway::ChannelKind::Text)
                    .with_channel(community(), "voice", cafebot::gateway::ChannelKind::Voice),
            ),
        }
    }

    pub fn with_relay_secret(mut self, secret: &str) -> Self {
        self.config.relay_secret = Some(secret.to_string());
        self
    }

    pub fn with_gateway(mut self, gateway: MemoryGateway) -> Self {
        self.gateway = Arc::new(gateway);
        self
    }

    /// Build the service with the production route table and middleware
    /// stack. Returns the state and gateway for assertions.
    pub async fn build(
        self,
    ) -> (
        impl Service<Request, Response = ServiceResponse<BoxBody>, Error = Error>,
        AppState,
        Arc<MemoryGateway>,
    ) {
        let state = build_state()
            .with_config(self.config)
            .with_gateway(self.gateway.clone())
            .build()
            .expect("test state should build");

        let service = test::init_service(
            App::new()
                .wrap(TraceSpan)
                .wrap(StructuredLogger)
                .wrap(RequestTrace)
                .app_data(web::Data::new(state.clone()))
                .configure(routes::configure),
        )
        .await;

        (service, state, self.gateway)
    }
}
