//! Fire-and-forget timers on the tokio runtime.
//!
//! Tasks must capture identifiers, never live platform objects: whatever a
//! task needs is re-resolved when it fires.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep_until, Instant, MissedTickBehavior};
use tracing::debug;

/// Run `task` once, `delay` after this call.
pub fn schedule_after<F>(delay: Duration, label: &'static str, task: F) -> JoinHandle<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let deadline = Instant::now() + delay;
    tokio::spawn(async move {
        sleep_until(deadline).await;
        debug!(task = label, "scheduled task firing");
        task.await;
    })
}

/// Run `make()` every `period`, first firing one period from now.
/// Missed ticks are skipped rather than replayed in a burst.
pub fn schedule_every<M, F>(period: Duration, label: &'static str, make: M) -> JoinHandle<()>
where
    M: FnMut() -> F + Send + 'static,
    F: Future<Output = ()> + Send + 'static,
{
    schedule_every_after(period, period, label, make)
}

/// Like [`schedule_every`], but the first run is `first` from now. Daily
/// posts use it to line up with a wall-clock time.
pub fn schedule_every_after<M, F>(
    first: Duration,
    period: Duration,
    label: &'static str,
    mut make: M,
) -> JoinHandle<()>
where
    M: FnMut() -> F + Send + 'static,
    F: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + first, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            debug!(task = label, "periodic task firing");
            make().await;
        }
    })
}
