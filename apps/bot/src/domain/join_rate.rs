//! Sliding-window join counter used to detect raids.
//!
//! Pure bookkeeping: the caller supplies `now`, so the detector never reads a
//! clock and tests can move time freely.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use super::ids::CommunityId;

pub const DEFAULT_JOIN_THRESHOLD: usize = 5;
pub const DEFAULT_JOIN_WINDOW: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinRateSettings {
    pub threshold: usize,
    pub window: Duration,
}

impl Default for JoinRateSettings {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_JOIN_THRESHOLD,
            window: DEFAULT_JOIN_WINDOW,
        }
    }
}

/// Result of recording one join, taken under the same borrow as the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinCheck {
    /// Joins in the window, this one included.
    pub recent_joins: usize,
    pub threshold: usize,
}

impl JoinCheck {
    pub fn is_raid(&self) -> bool {
        self.recent_joins >= self.threshold
    }

    /// True only for the join that brought the window up to the threshold.
    pub fn crossed_threshold(&self) -> bool {
        self.recent_joins == self.threshold
    }
}

#[derive(Debug, Default)]
pub struct JoinRateDetector {
    settings: JoinRateSettings,
    joins: HashMap<CommunityId, VecDeque<Instant>>,
}

impl JoinRateDetector {
    pub fn new(settings: JoinRateSettings) -> Self {
        Self {
            settings,
            joins: HashMap::new(),
        }
    }

    pub fn settings(&self) -> JoinRateSettings {
        self.settings
    }

    /// Record a join at `now`. Timestamps older than the window are pruned
    /// first so the list stays bounded by the join rate.
    pub fn record_join(&mut self, community: CommunityId, now: Instant) {
        let window = self.settings.window;
        let entries = self.joins.entry(community).or_default();
        prune(entries, now, window);
        entries.push_back(now);
    }

    /// Whether at least `threshold` joins fall inside the window ending at `now`.
    pub fn is_raid_in_progress(&mut self, community: CommunityId, now: Instant) -> bool {
        self.recent_joins(community, now) >= self.settings.threshold
    }

    /// Record and evaluate in one step. The joining member counts.
    pub fn record_join_and_check(&mut self, community: CommunityId, now: Instant) -> JoinCheck {
        self.record_join(community, now);
        JoinCheck {
            recent_joins: self.recent_joins(community, now),
            threshold: self.settings.threshold,
        }
    }

    /// Joins within the window ending at `now`.
    pub fn recent_joins(&mut self, community: CommunityId, now: Instant) -> usize {
        let window = self.settings.window;
        match self.joins.get_mut(&community) {
            Some(entries) => {
                prune(entries, now, window);
                let count = entries.len();
                if count == 0 {
                    self.joins.remove(&community);
                }
                count
            }
            None => 0,
        }
    }

    /// Drop every community whose window has drained. Returns how many were dropped.
    pub fn sweep(&mut self, now: Instant) -> usize {
        let window = self.settings.window;
        let before = self.joins.len();
        self.joins.retain(|_, entries| {
            prune(entries, now, window);
            !entries.is_empty()
        });
        before - self.joins.len()
    }

    pub fn tracked_communities(&self) -> usize {
        self.joins.len()
    }
}

// A join exactly `window` old still counts.
fn prune(entries: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(&oldest) = entries.front() {
        if now.saturating_duration_since(oldest) > window {
            entries.pop_front();
        } else {
            break;
        }
    }
}
