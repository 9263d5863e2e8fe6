//! Scheduled posts to the broadcast channel.
//!
//! Four fixed daily slots plus up to two random daytime posts, planned at
//! startup and again at every midnight slot. Wall-clock time is derived
//! from the tokio clock and an origin captured at construction, so a
//! paused test runtime drives whole days deterministically.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use rand::prelude::*;
use time::{Date, OffsetDateTime};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::config::BroadcastSettings;
use crate::domain::broadcast::{
    broadcast_lines, plan_daytime, until_next, BroadcastKind, DAILY_SLOTS, DAY,
};
use crate::gateway::Gateway;
use crate::infra::scheduler::{schedule_after, schedule_every_after};

pub struct BroadcastService {
    settings: BroadcastSettings,
    gateway: Arc<dyn Gateway>,
    rng: Mutex<StdRng>,
    planned_day: Mutex<Option<Date>>,
    started: AtomicBool,
    origin: OffsetDateTime,
    origin_tick: Instant,
    me: Weak<BroadcastService>,
}

impl BroadcastService {
    pub fn new(
        settings: BroadcastSettings,
        gateway: Arc<dyn Gateway>,
        seed: Option<u64>,
    ) -> Arc<Self> {
        Self::with_origin(settings, gateway, seed, OffsetDateTime::now_utc())
    }

    /// `origin` is the wall-clock time matching the tokio clock right now.
    pub fn with_origin(
        settings: BroadcastSettings,
        gateway: Arc<dyn Gateway>,
        seed: Option<u64>,
        origin: OffsetDateTime,
    ) -> Arc<Self> {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_os_rng(),
        };
        Arc::new_cyclic(|me| Self {
            settings,
            gateway,
            rng: Mutex::new(rng),
            planned_day: Mutex::new(None),
            started: AtomicBool::new(false),
            origin,
            origin_tick: Instant::now(),
            me: me.clone(),
        })
    }

    /// Current wall-clock time in the configured offset.
    pub fn now(&self) -> OffsetDateTime {
        let elapsed = Instant::now().duration_since(self.origin_tick);
        (self.origin + elapsed).to_offset(self.settings.utc_offset)
    }

    /// Arm the daily slots and plan today's daytime posts. Returns the
    /// timer handles so the caller can stop them; empty when no channel is
    /// configured or the schedule is already running.
    pub fn start(&self) -> Vec<JoinHandle<()>> {
        let Some(channel) = self.settings.channel else {
            info!("no broadcast channel configured; scheduled posts disabled");
            return Vec::new();
        };
        if self.started.swap(true, Ordering::SeqCst) {
            return Vec::new();
        }

        let now = self.now();
        let mut handles: Vec<JoinHandle<()>> = DAILY_SLOTS
            .iter()
            .map(|&(kind, at)| {
                let me = self.me.clone();
                schedule_every_after(until_next(now, at), DAY, kind.label(), move || {
                    let me = me.clone();
                    async move {
                        let Some(service) = me.upgrade() else {
                            return;
                        };
                        service.post(kind).await;
                        if kind == BroadcastKind::Midnight {
                            service.plan_day();
                        }
                    }
                })
            })
            .collect();
        handles.extend(self.plan_day());
        info!(channel = %channel, offset = %self.settings.utc_offset, "broadcast schedule armed");
        handles
    }

    /// Schedule the random daytime posts for the current date. A date is
    /// planned once; later calls the same day return nothing.
    pub fn plan_day(&self) -> Vec<JoinHandle<()>> {
        let now = self.now();
        {
            let mut planned = self.planned_day.lock();
            if *planned == Some(now.date()) {
                return Vec::new();
            }
            *planned = Some(now.date());
        }
        let delays = plan_daytime(now, &mut *self.rng.lock());
        debug!(date = %now.date(), posts = delays.len(), "daytime broadcasts planned");
        delays
            .into_iter()
            .map(|delay| {
                let me = self.me.clone();
                schedule_after(delay, BroadcastKind::Daytime.label(), async move {
                    if let Some(service) = me.upgrade() {
                        service.post(BroadcastKind::Daytime).await;
                    }
                })
            })
            .collect()
    }

    /// Post one line of `kind`. Failures are logged and dropped.
    pub async fn post(&self, kind: BroadcastKind) {
        let Some(channel) = self.settings.channel else {
            return;
        };
        let line = broadcast_lines(kind)
            .choose(&mut *self.rng.lock())
            .copied()
            .unwrap_or_default();
        if line.is_empty() {
            return;
        }
        match self.gateway.send_message(channel, line).await {
            Ok(()) => debug!(channel = %channel, kind = kind.label(), "broadcast posted"),
            Err(e) => debug!(channel = %channel, kind = kind.label(), error = %e, "broadcast not posted"),
        }
    }
}
