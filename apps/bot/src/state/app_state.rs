use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::config::BotConfig;
use crate::gateway::Gateway;
use crate::infra::scheduler::schedule_every;
use crate::services::{
    AuditLog, BroadcastService, ChatterService, GameService, GuardService, InfoService,
    MemberEvents, PurgeService,
};

/// How often in-memory bookkeeping is pruned.
pub const HOUSEKEEPING_PERIOD: Duration = Duration::from_secs(60);

/// Application state shared by every handler.
///
/// All services hold the same gateway, so a test can swap the whole
/// outbound side by building the state over a `MemoryGateway`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<BotConfig>,
    pub gateway: Arc<dyn Gateway>,
    pub audit: Arc<AuditLog>,
    pub guard: Arc<GuardService>,
    pub members: Arc<MemberEvents>,
    pub games: Arc<GameService>,
    pub chatter: Arc<ChatterService>,
    pub info: Arc<InfoService>,
    pub purge: Arc<PurgeService>,
    pub broadcast: Arc<BroadcastService>,
}

impl AppState {
    /// Wire the services over `gateway`.
    pub fn new(config: BotConfig, gateway: Arc<dyn Gateway>) -> Self {
        let audit = Arc::new(AuditLog::new(gateway.clone(), config.guard.log_channel));
        let guard = GuardService::new(config.guard.clone(), gateway.clone(), audit.clone());
        let members = Arc::new(MemberEvents::new(
            guard.clone(),
            gateway.clone(),
            audit.clone(),
            config.welcome.clone(),
        ));
        let games = GameService::new(config.games.clone(), gateway.clone());
        let chatter = Arc::new(ChatterService::new(config.games.rng_seed));
        let info = Arc::new(InfoService::new(gateway.clone()));
        let purge = Arc::new(PurgeService::new(gateway.clone(), audit.clone()));
        let broadcast = BroadcastService::new(
            config.broadcast.clone(),
            gateway.clone(),
            config.games.rng_seed,
        );

        Self {
            config: Arc::new(config),
            gateway,
            audit,
            guard,
            members,
            games,
            chatter,
            info,
            purge,
            broadcast,
        }
    }

    /// Prune drained join windows and expired chat cooldowns.
    pub fn sweep(&self) {
        let dropped = self.guard.sweep();
        self.chatter.sweep(tokio::time::Instant::now().into_std());
        debug!(dropped_windows = dropped, "housekeeping sweep");
    }

    /// Run [`AppState::sweep`] every [`HOUSEKEEPING_PERIOD`] until the handle is aborted.
    pub fn start_housekeeping(&self) -> JoinHandle<()> {
        let state = self.clone();
        schedule_every(HOUSEKEEPING_PERIOD, "housekeeping", move || {
            let state = state.clone();
            async move { state.sweep() }
        })
    }
}
