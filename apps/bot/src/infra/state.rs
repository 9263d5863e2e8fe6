use std::sync::Arc;

use tracing::info;

use crate::config::BotConfig;
use crate::error::AppError;
use crate::gateway::{DiscordRest, Gateway, MemoryGateway};
use crate::state::app_state::AppState;

/// Builder for creating AppState instances (used in both tests and main)
pub struct StateBuilder {
    config: BotConfig,
    gateway: Option<Arc<dyn Gateway>>,
}

impl StateBuilder {
    pub fn new() -> Self {
        Self {
            config: BotConfig::default(),
            gateway: None,
        }
    }

    pub fn with_config(mut self, config: BotConfig) -> Self {
        self.config = config;
        self
    }

    /// Use `gateway` instead of the one derived from the config.
    pub fn with_gateway(mut self, gateway: Arc<dyn Gateway>) -> Self {
        self.gateway = Some(gateway);
        self
    }

    /// Dry runs talk to an in-memory gateway that only logs; everything
    /// else needs a token for the REST client.
    pub fn build(self) -> Result<AppState, AppError> {
        let gateway = match self.gateway {
            Some(gateway) => gateway,
            None if self.config.dry_run => {
                info!("dry run: outbound platform calls are logged, not sent");
                Arc::new(MemoryGateway::echoing())
            }
            None => {
                let token = self
                    .config
                    .token
                    .clone()
                    .ok_or_else(|| AppError::config("DISCORD_TOKEN is required outside dry run"))?;
                let rest = DiscordRest::new(&self.config.api_base, token)
                    .map_err(|e| AppError::config(format!("cannot build platform client: {e}")))?;
                Arc::new(rest)
            }
        };
        Ok(AppState::new(self.config, gateway))
    }
}

impl Default for StateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn build_state() -> StateBuilder {
    StateBuilder::new()
}
