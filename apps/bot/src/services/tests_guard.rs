//! Guard service against the in-memory gateway on a paused clock.

use std::sync::Arc;
use std::time::Duration;

use time::OffsetDateTime;
use tokio::time::{advance, sleep};

use crate::config::{GuardSettings, WelcomeSettings};
use crate::domain::{ChannelId, CommunityId, MemberId, RoleId};
use crate::errors::domain::DomainError;
use crate::gateway::memory::MemoryGateway;
use crate::gateway::{ChannelKind, Permissions};
use crate::services::audit::{AuditLog, QuarantineReason};
use crate::services::guard::{GuardService, QuarantineOutcome, QUARANTINE_ROLE_NAME};
use crate::services::members::{JoinOutcome, MemberEvents, MemberJoined};

const GUILD: CommunityId = CommunityId(500);
const LOG: ChannelId = ChannelId(501);
const WELCOME: ChannelId = ChannelId(502);
const NEWBIE: MemberId = MemberId(77);

fn gateway() -> Arc<MemoryGateway> {
    Arc::new(
        MemoryGateway::new()
            .with_channel(GUILD, "general", ChannelKind::Text)
            .with_channel(GUILD, "voice", ChannelKind::Voice)
            .with_channel(GUILD, "Lounge", ChannelKind::Category)
            .with_channel(GUILD, "thread", ChannelKind::Thread),
    )
}

fn guard_on(gateway: &Arc<MemoryGateway>) -> Arc<GuardService> {
    let audit = Arc::new(AuditLog::new(gateway.clone(), Some(LOG)));
    GuardService::new(GuardSettings::default(), gateway.clone(), audit)
}

fn now() -> std::time::Instant {
    tokio::time::Instant::now().into_std()
}

async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn quarantine_then_timed_release() {
    let gateway = gateway();
    let guard = guard_on(&gateway);

    let outcome = guard
        .quarantine(GUILD, NEWBIE, QuarantineReason::RaidDetected)
        .await
        .unwrap();
    assert_eq!(
        outcome,
        QuarantineOutcome::Quarantined {
            release_in_secs: 600
        }
    );

    let role = gateway.role_named(GUILD, QUARANTINE_ROLE_NAME).unwrap();
    assert!(gateway.roles_of(GUILD, NEWBIE).contains(&role));
    assert!(guard.is_quarantined(NEWBIE));
    assert!(guard.is_quarantined_in(GUILD, NEWBIE));

    // Overrides only on channels that take them.
    let overrides = gateway.overrides();
    assert_eq!(overrides.len(), 2);
    assert!(overrides.iter().all(|o| o.deny == Permissions::QUARANTINE_DENY));

    sleep(Duration::from_secs(599)).await;
    settle().await;
    assert!(guard.is_quarantined(NEWBIE));

    sleep(Duration::from_secs(2)).await;
    settle().await;
    assert!(!guard.is_quarantined(NEWBIE));
    assert!(gateway.roles_of(GUILD, NEWBIE).is_empty());

    let log = gateway.messages_to(LOG);
    assert_eq!(log.len(), 2);
    assert!(log[0].contains("quarantined"));
    assert!(log[1].contains("released"));
}

#[tokio::test(start_paused = true)]
async fn role_is_created_once_and_reused() {
    let gateway = gateway();
    let guard = guard_on(&gateway);

    guard
        .quarantine(GUILD, MemberId(1), QuarantineReason::RaidDetected)
        .await
        .unwrap();
    guard
        .quarantine(GUILD, MemberId(2), QuarantineReason::RaidDetected)
        .await
        .unwrap();
    assert_eq!(gateway.roles_created(), 1);
}

#[tokio::test(start_paused = true)]
async fn failing_channel_override_does_not_abort() {
    let gateway = gateway();
    let first_text = gateway.channels_of(GUILD)[0].id;
    gateway.fail_overrides_on(first_text);
    let guard = guard_on(&gateway);

    guard
        .quarantine(GUILD, NEWBIE, QuarantineReason::NewAccount)
        .await
        .unwrap();
    assert_eq!(gateway.overrides().len(), 1);
    assert!(guard.is_quarantined(NEWBIE));
}

#[tokio::test(start_paused = true)]
async fn missing_capability_has_no_side_effects() {
    let gateway = gateway();
    gateway.deny_role_management(GUILD);
    let guard = guard_on(&gateway);

    let err = guard
        .quarantine(GUILD, NEWBIE, QuarantineReason::RaidDetected)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Capability(_)));
    assert_eq!(gateway.roles_created(), 0);
    assert!(gateway.overrides().is_empty());
    assert!(!guard.is_quarantined(NEWBIE));
}

#[tokio::test(start_paused = true)]
async fn requarantine_keeps_original_expiry() {
    let gateway = gateway();
    let guard = guard_on(&gateway);
    guard
        .quarantine(GUILD, NEWBIE, QuarantineReason::RaidDetected)
        .await
        .unwrap();

    advance(Duration::from_secs(300)).await;
    let again = guard
        .quarantine(GUILD, NEWBIE, QuarantineReason::RaidDetected)
        .await
        .unwrap();
    assert_eq!(
        again,
        QuarantineOutcome::AlreadyQuarantined {
            release_in_secs: 300
        }
    );

    sleep(Duration::from_secs(301)).await;
    settle().await;
    assert!(!guard.is_quarantined(NEWBIE));
    assert_eq!(gateway.role_removals(), 1);
}

#[tokio::test(start_paused = true)]
async fn departed_member_is_cleared_without_role_call() {
    let gateway = gateway();
    let guard = guard_on(&gateway);
    guard
        .quarantine(GUILD, NEWBIE, QuarantineReason::RaidDetected)
        .await
        .unwrap();
    gateway.remove_member(GUILD, NEWBIE);

    sleep(Duration::from_secs(601)).await;
    settle().await;
    assert!(!guard.is_quarantined(NEWBIE));
    assert_eq!(gateway.role_removals(), 0);
}

#[tokio::test(start_paused = true)]
async fn manual_release_disarms_the_timer() {
    let gateway = gateway();
    let guard = guard_on(&gateway);
    guard
        .quarantine(GUILD, NEWBIE, QuarantineReason::RaidDetected)
        .await
        .unwrap();

    assert!(guard.release_manually(GUILD, NEWBIE).await.unwrap());
    assert!(!guard.is_quarantined(NEWBIE));
    assert!(!guard.release_manually(GUILD, NEWBIE).await.unwrap());

    sleep(Duration::from_secs(601)).await;
    settle().await;
    assert_eq!(gateway.role_removals(), 1);
}

#[tokio::test(start_paused = true)]
async fn failed_lift_at_expiry_still_allows_requarantine() {
    let gateway = gateway();
    let guard = guard_on(&gateway);
    guard
        .quarantine(GUILD, NEWBIE, QuarantineReason::RaidDetected)
        .await
        .unwrap();
    let role = gateway.role_named(GUILD, QUARANTINE_ROLE_NAME).unwrap();
    gateway.fail_role_removal();

    sleep(Duration::from_secs(601)).await;
    settle().await;
    assert!(!guard.is_quarantined(NEWBIE));
    assert!(gateway.roles_of(GUILD, NEWBIE).contains(&role));
    assert_eq!(gateway.messages_to(LOG).len(), 1);

    gateway.strip_role(GUILD, NEWBIE, role);
    advance(Duration::from_secs(3600)).await;
    let again = guard
        .quarantine(GUILD, NEWBIE, QuarantineReason::RaidDetected)
        .await
        .unwrap();
    assert_eq!(
        again,
        QuarantineOutcome::Quarantined {
            release_in_secs: 600
        }
    );
    assert!(gateway.roles_of(GUILD, NEWBIE).contains(&role));
    assert!(guard.is_quarantined_in(GUILD, NEWBIE));
}

#[tokio::test(start_paused = true)]
async fn release_after_role_stripped_by_hand_drops_the_mark() {
    let gateway = gateway();
    let guard = guard_on(&gateway);
    guard
        .quarantine(GUILD, NEWBIE, QuarantineReason::NewAccount)
        .await
        .unwrap();
    let role = gateway.role_named(GUILD, QUARANTINE_ROLE_NAME).unwrap();
    gateway.strip_role(GUILD, NEWBIE, role);

    assert!(!guard.release_manually(GUILD, NEWBIE).await.unwrap());
    assert!(!guard.is_quarantined(NEWBIE));
    assert_eq!(guard.stats(GUILD).quarantined, 0);

    let again = guard
        .quarantine(GUILD, NEWBIE, QuarantineReason::NewAccount)
        .await
        .unwrap();
    assert!(matches!(again, QuarantineOutcome::Quarantined { .. }));
}

#[tokio::test(start_paused = true)]
async fn concurrent_quarantines_share_one_role() {
    let gateway = gateway();
    gateway.slow_role_lookups();
    let guard = guard_on(&gateway);

    let (first, second) = tokio::join!(
        guard.quarantine(GUILD, MemberId(1), QuarantineReason::RaidDetected),
        guard.quarantine(GUILD, MemberId(2), QuarantineReason::RaidDetected),
    );
    first.unwrap();
    second.unwrap();

    assert_eq!(gateway.roles_created(), 1);
    assert_eq!(gateway.overrides().len(), 2);
    let role = gateway.role_named(GUILD, QUARANTINE_ROLE_NAME).unwrap();
    assert!(gateway.roles_of(GUILD, MemberId(1)).contains(&role));
    assert!(gateway.roles_of(GUILD, MemberId(2)).contains(&role));
}

#[tokio::test(start_paused = true)]
async fn release_without_role_reports_false() {
    let gateway = gateway();
    let guard = guard_on(&gateway);
    assert!(!guard.release_manually(GUILD, NEWBIE).await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn stats_follow_the_window() {
    let gateway = gateway();
    let guard = guard_on(&gateway);
    for _ in 0..5 {
        guard.record_join(GUILD, now());
    }
    let stats = guard.stats(GUILD);
    assert_eq!(stats.recent_joins, 5);
    assert!(stats.raid_in_progress);

    advance(Duration::from_secs(301)).await;
    assert_eq!(guard.sweep(), 1);
    assert!(!guard.is_raid_in_progress(GUILD, now()));
}

fn joined(member: u64, created_hours_ago: i64) -> MemberJoined {
    MemberJoined {
        community_id: GUILD,
        member_id: MemberId(member),
        username: format!("user{member}"),
        account_created_at: OffsetDateTime::now_utc() - time::Duration::hours(created_hours_ago),
        member_count: Some(120 + member),
        is_bot: false,
    }
}

fn member_events(gateway: &Arc<MemoryGateway>, guard: &Arc<GuardService>) -> MemberEvents {
    let audit = Arc::new(AuditLog::new(gateway.clone(), Some(LOG)));
    MemberEvents::new(
        guard.clone(),
        gateway.clone(),
        audit,
        WelcomeSettings {
            channel: Some(WELCOME),
            auto_role: Some(RoleId(900)),
        },
    )
}

#[tokio::test(start_paused = true)]
async fn established_member_is_welcomed_with_auto_role() {
    let gateway = Arc::new(
        MemoryGateway::new().with_role(GUILD, RoleId(900), "Regulars"),
    );
    let guard = guard_on(&gateway);
    let events = member_events(&gateway, &guard);

    let outcome = events.on_member_joined(&joined(1, 24 * 30), now()).await;
    assert_eq!(outcome, JoinOutcome::Welcomed);
    assert!(gateway.roles_of(GUILD, MemberId(1)).contains(&RoleId(900)));
    let welcome = gateway.messages_to(WELCOME);
    assert_eq!(welcome.len(), 1);
    assert!(welcome[0].contains("<@1>"));
    assert!(welcome[0].contains("#121"));
}

#[tokio::test(start_paused = true)]
async fn missing_auto_role_still_welcomes() {
    let gateway = gateway();
    let guard = guard_on(&gateway);
    let events = member_events(&gateway, &guard);

    let outcome = events.on_member_joined(&joined(1, 24 * 30), now()).await;
    assert_eq!(outcome, JoinOutcome::Welcomed);
    assert_eq!(gateway.messages_to(WELCOME).len(), 1);
}

#[tokio::test(start_paused = true)]
async fn young_account_is_held_without_welcome() {
    let gateway = gateway();
    let guard = guard_on(&gateway);
    let events = member_events(&gateway, &guard);

    let outcome = events.on_member_joined(&joined(1, 2), now()).await;
    assert_eq!(
        outcome,
        JoinOutcome::Quarantined {
            reason: QuarantineReason::NewAccount
        }
    );
    assert!(gateway.messages_to(WELCOME).is_empty());
    assert!(guard.is_quarantined(MemberId(1)));
}

#[tokio::test(start_paused = true)]
async fn fifth_join_in_window_is_quarantined_as_raid() {
    let gateway = gateway();
    let guard = guard_on(&gateway);
    let events = member_events(&gateway, &guard);

    for member in 1..=4 {
        let outcome = events.on_member_joined(&joined(member, 24 * 30), now()).await;
        assert_eq!(outcome, JoinOutcome::Welcomed);
        advance(Duration::from_secs(10)).await;
    }
    let outcome = events.on_member_joined(&joined(5, 24 * 30), now()).await;
    assert_eq!(
        outcome,
        JoinOutcome::Quarantined {
            reason: QuarantineReason::RaidDetected
        }
    );
    assert_eq!(gateway.messages_to(WELCOME).len(), 4);
    assert!(gateway.messages_to(LOG)[0].contains("Raid detected"));
}

#[tokio::test(start_paused = true)]
async fn flagged_member_without_capability_is_not_welcomed() {
    let gateway = gateway();
    gateway.deny_role_management(GUILD);
    let guard = guard_on(&gateway);
    let events = member_events(&gateway, &guard);

    let outcome = events.on_member_joined(&joined(1, 1), now()).await;
    assert!(matches!(
        outcome,
        JoinOutcome::Flagged {
            reason: QuarantineReason::NewAccount,
            ..
        }
    ));
    assert!(gateway.messages_to(WELCOME).is_empty());
}

#[tokio::test(start_paused = true)]
async fn raid_is_announced_once_even_when_threshold_join_is_young() {
    let gateway = gateway();
    let guard = guard_on(&gateway);
    let events = member_events(&gateway, &guard);

    for member in 1..=4 {
        events.on_member_joined(&joined(member, 24 * 30), now()).await;
    }
    let outcome = events.on_member_joined(&joined(5, 1), now()).await;
    assert_eq!(
        outcome,
        JoinOutcome::Quarantined {
            reason: QuarantineReason::NewAccount
        }
    );
    let outcome = events.on_member_joined(&joined(6, 24 * 30), now()).await;
    assert_eq!(
        outcome,
        JoinOutcome::Quarantined {
            reason: QuarantineReason::RaidDetected
        }
    );

    let announcements = gateway
        .messages_to(LOG)
        .iter()
        .filter(|m| m.contains("Raid detected"))
        .count();
    assert_eq!(announcements, 1);
}
