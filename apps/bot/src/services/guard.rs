//! Join-rate guard: raid detection, quarantine and timed release.
//!
//! The detector and the quarantine marks live in memory only; a restart
//! forgets both, and any role left on a member must be removed by hand.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, warn};

use super::audit::{AuditEvent, AuditLog, QuarantineReason};
use crate::config::GuardSettings;
use crate::domain::{CommunityId, JoinCheck, JoinRateDetector, MemberId, RoleId};
use crate::errors::domain::DomainError;
use crate::gateway::{Gateway, Permissions, RoleSpec};
use crate::infra::scheduler::schedule_after;

pub const QUARANTINE_ROLE_NAME: &str = "🔒 Quarantine";
const QUARANTINE_ROLE_COLOR: u32 = 0x7f8c8d;

#[derive(Debug, Clone, Copy)]
struct QuarantineMark {
    role: RoleId,
    reason: QuarantineReason,
    expires_at: Instant,
    generation: u64,
}

impl QuarantineMark {
    fn left(&self, at: Instant) -> Option<Duration> {
        let left = self.expires_at.saturating_duration_since(at);
        (!left.is_zero()).then_some(left)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum QuarantineOutcome {
    Quarantined { release_in_secs: u64 },
    /// Already marked; the original expiry stands.
    AlreadyQuarantined { release_in_secs: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuardStats {
    pub recent_joins: usize,
    pub threshold: usize,
    pub window_secs: u64,
    pub raid_in_progress: bool,
    pub quarantined: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberGuardState {
    pub quarantined: bool,
    pub reason: Option<QuarantineReason>,
    pub release_in_secs: Option<u64>,
}

fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

pub struct GuardService {
    settings: GuardSettings,
    detector: Mutex<JoinRateDetector>,
    marks: DashMap<(CommunityId, MemberId), QuarantineMark>,
    /// Serializes resolve-or-create of the quarantine role per community.
    role_locks: DashMap<CommunityId, Arc<AsyncMutex<()>>>,
    generation: AtomicU64,
    gateway: Arc<dyn Gateway>,
    audit: Arc<AuditLog>,
    me: Weak<GuardService>,
}

impl GuardService {
    pub fn new(settings: GuardSettings, gateway: Arc<dyn Gateway>, audit: Arc<AuditLog>) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            detector: Mutex::new(JoinRateDetector::new(settings.join_rate)),
            settings,
            marks: DashMap::new(),
            role_locks: DashMap::new(),
            generation: AtomicU64::new(0),
            gateway,
            audit,
            me: me.clone(),
        })
    }

    pub fn settings(&self) -> &GuardSettings {
        &self.settings
    }

    pub fn record_join(&self, community: CommunityId, at: Instant) {
        self.detector.lock().record_join(community, at);
    }

    pub fn is_raid_in_progress(&self, community: CommunityId, at: Instant) -> bool {
        self.detector.lock().is_raid_in_progress(community, at)
    }

    /// Record and evaluate under one lock so concurrent joins cannot both
    /// miss the threshold.
    pub fn record_join_and_check(&self, community: CommunityId, at: Instant) -> JoinCheck {
        self.detector.lock().record_join_and_check(community, at)
    }

    /// Marks past their expiry count as absent even if the timer has not run yet.
    pub fn is_quarantined(&self, member: MemberId) -> bool {
        let at = now();
        self.marks
            .iter()
            .any(|e| e.key().1 == member && e.value().left(at).is_some())
    }

    pub fn is_quarantined_in(&self, community: CommunityId, member: MemberId) -> bool {
        self.remaining(community, member).is_some()
    }

    pub fn member_state(&self, community: CommunityId, member: MemberId) -> MemberGuardState {
        let live = self
            .marks
            .get(&(community, member))
            .and_then(|m| m.left(now()).map(|left| (m.reason, left)));
        match live {
            Some((reason, left)) => MemberGuardState {
                quarantined: true,
                reason: Some(reason),
                release_in_secs: Some(left.as_secs()),
            },
            None => MemberGuardState {
                quarantined: false,
                reason: None,
                release_in_secs: None,
            },
        }
    }

    pub fn stats(&self, community: CommunityId) -> GuardStats {
        let at = now();
        let mut detector = self.detector.lock();
        let recent_joins = detector.recent_joins(community, at);
        let settings = detector.settings();
        GuardStats {
            recent_joins,
            threshold: settings.threshold,
            window_secs: settings.window.as_secs(),
            raid_in_progress: recent_joins >= settings.threshold,
            quarantined: self
                .marks
                .iter()
                .filter(|e| e.key().0 == community && e.value().left(at).is_some())
                .count(),
        }
    }

    /// Housekeeping for the periodic sweep.
    pub fn sweep(&self) -> usize {
        self.detector.lock().sweep(now())
    }

    /// Isolate `member` behind the quarantine role and schedule its release.
    ///
    /// Fails with a capability error, and changes nothing, when the bot may
    /// not manage roles in `community`.
    pub async fn quarantine(
        &self,
        community: CommunityId,
        member: MemberId,
        reason: QuarantineReason,
    ) -> Result<QuarantineOutcome, DomainError> {
        if let Some(existing) = self.remaining(community, member) {
            return Ok(QuarantineOutcome::AlreadyQuarantined {
                release_in_secs: existing.as_secs(),
            });
        }
        if !self.gateway.can_manage_roles(community).await? {
            warn!(community = %community, member = %member, "cannot quarantine: missing manage-roles");
            return Err(DomainError::capability("the bot cannot manage roles in this community"));
        }

        let role = self.ensure_quarantine_role(community).await?;
        self.gateway
            .add_role(community, member, role, "Automatic quarantine")
            .await?;

        let duration = self.settings.quarantine_for;
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let mark = QuarantineMark {
            role,
            reason,
            expires_at: now() + duration,
            generation,
        };
        match self.marks.entry((community, member)) {
            Entry::Occupied(mut existing) => {
                if let Some(left) = existing.get().left(now()) {
                    return Ok(QuarantineOutcome::AlreadyQuarantined {
                        release_in_secs: left.as_secs(),
                    });
                }
                // Expired leftover; its timer no longer matches the new generation.
                existing.insert(mark);
            }
            Entry::Vacant(slot) => {
                slot.insert(mark);
            }
        }

        let me = self.me.clone();
        schedule_after(duration, "quarantine-release", async move {
            if let Some(guard) = me.upgrade() {
                guard.expire(community, member, generation).await;
            }
        });

        info!(community = %community, member = %member, ?reason, "member quarantined");
        self.audit
            .record(
                community,
                AuditEvent::MemberQuarantined {
                    member,
                    reason,
                    duration,
                },
            )
            .await;

        Ok(QuarantineOutcome::Quarantined {
            release_in_secs: duration.as_secs(),
        })
    }

    fn remaining(&self, community: CommunityId, member: MemberId) -> Option<Duration> {
        self.marks
            .get(&(community, member))
            .and_then(|m| m.left(now()))
    }

    async fn ensure_quarantine_role(&self, community: CommunityId) -> Result<RoleId, DomainError> {
        let lock = self.role_locks.entry(community).or_default().clone();
        let _resolving = lock.lock().await;

        if let Some(role) = self
            .gateway
            .find_role_by_name(community, QUARANTINE_ROLE_NAME)
            .await?
        {
            return Ok(role);
        }

        let spec = RoleSpec {
            name: QUARANTINE_ROLE_NAME.to_string(),
            color: QUARANTINE_ROLE_COLOR,
            reason: "Anti-raid quarantine role".to_string(),
        };
        let role = self.gateway.create_role(community, &spec).await?;
        info!(community = %community, role = %role, "created quarantine role");

        // Per-channel failures are skipped; the role still isolates wherever it could be applied.
        for channel in self.gateway.list_channels(community).await? {
            if !channel.accepts_overrides() {
                continue;
            }
            if let Err(e) = self
                .gateway
                .deny_channel_permissions(channel.id, role, Permissions::QUARANTINE_DENY)
                .await
            {
                warn!(channel = %channel.id, error = %e, "could not restrict channel for quarantine");
            }
        }
        Ok(role)
    }

    /// Timer callback. Only the mark written with `generation` may be released.
    pub(crate) async fn expire(&self, community: CommunityId, member: MemberId, generation: u64) {
        let Some(mark) = self
            .marks
            .get(&(community, member))
            .map(|m| *m)
            .filter(|m| m.generation == generation)
        else {
            debug!(community = %community, member = %member, "stale quarantine timer ignored");
            return;
        };

        match self.gateway.member_present(community, member).await {
            Ok(false) => {
                self.marks.remove_if(&(community, member), |_, m| m.generation == generation);
                debug!(community = %community, member = %member, "quarantined member left; mark cleared");
                return;
            }
            Ok(true) => {}
            Err(e) => {
                warn!(community = %community, member = %member, error = %e, "presence check failed; attempting release anyway");
            }
        }

        let lifted = self
            .gateway
            .remove_role(community, member, mark.role, "Quarantine expired")
            .await;
        // The mark goes either way so a later join can quarantine again.
        self.marks.remove_if(&(community, member), |_, m| m.generation == generation);
        if let Err(e) = lifted {
            warn!(community = %community, member = %member, role = %mark.role, error = %e, "failed to lift quarantine; role must be removed by hand");
            return;
        }
        info!(community = %community, member = %member, "quarantine expired");
        self.audit
            .record(
                community,
                AuditEvent::QuarantineReleased {
                    member,
                    manual: false,
                },
            )
            .await;
    }

    /// Whether `member` currently wears the quarantine role on the platform,
    /// regardless of what this process remembers.
    pub async fn holds_quarantine_role(
        &self,
        community: CommunityId,
        member: MemberId,
    ) -> Result<bool, DomainError> {
        let Some(role) = self
            .gateway
            .find_role_by_name(community, QUARANTINE_ROLE_NAME)
            .await?
        else {
            return Ok(false);
        };
        Ok(self.gateway.member_has_role(community, member, role).await?)
    }

    /// Lift a quarantine early. Returns `false` when the member does not hold
    /// the quarantine role. Any in-process mark is dropped either way, so a
    /// pending timer becomes a no-op.
    pub async fn release_manually(
        &self,
        community: CommunityId,
        member: MemberId,
    ) -> Result<bool, DomainError> {
        let Some(role) = self
            .gateway
            .find_role_by_name(community, QUARANTINE_ROLE_NAME)
            .await?
        else {
            self.marks.remove(&(community, member));
            return Ok(false);
        };
        if !self.gateway.member_has_role(community, member, role).await? {
            self.marks.remove(&(community, member));
            return Ok(false);
        }
        self.gateway
            .remove_role(community, member, role, "Released by a moderator")
            .await?;
        self.marks.remove(&(community, member));
        self.audit
            .record(
                community,
                AuditEvent::QuarantineReleased {
                    member,
                    manual: true,
                },
            )
            .await;
        Ok(true)
    }
}
