//! Broadcast schedule driven through whole days on a paused clock.

use std::sync::Arc;
use std::time::Duration;

use time::macros::{datetime, offset};
use tokio::time::sleep;

use crate::config::BroadcastSettings;
use crate::domain::broadcast::{broadcast_lines, BroadcastKind};
use crate::domain::ChannelId;
use crate::gateway::memory::MemoryGateway;
use crate::services::broadcast::BroadcastService;

const BROADCAST: ChannelId = ChannelId(900);
const HOUR: Duration = Duration::from_secs(60 * 60);
const MINUTE: Duration = Duration::from_secs(60);

fn settings() -> BroadcastSettings {
    BroadcastSettings {
        channel: Some(BROADCAST),
        utc_offset: offset!(-3),
    }
}

async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

fn is_line_of(kind: BroadcastKind, text: &str) -> bool {
    broadcast_lines(kind).contains(&text)
}

#[tokio::test(start_paused = true)]
async fn a_day_of_posts_from_early_morning() {
    let gateway = Arc::new(MemoryGateway::new());
    let service = BroadcastService::with_origin(
        settings(),
        gateway.clone(),
        Some(7),
        datetime!(2024-05-10 05:00 -3),
    );
    let handles = service.start();
    // Four daily slots plus two daytime posts for today.
    assert_eq!(handles.len(), 6);

    sleep(HOUR + MINUTE).await;
    settle().await;
    let posted = gateway.messages_to(BROADCAST);
    assert_eq!(posted.len(), 1);
    assert!(is_line_of(BroadcastKind::Morning, &posted[0]));

    // 17:31: both daytime posts are out.
    sleep(11 * HOUR + 30 * MINUTE).await;
    settle().await;
    let posted = gateway.messages_to(BROADCAST);
    assert_eq!(posted.len(), 3);
    assert!(posted[1..]
        .iter()
        .all(|text| is_line_of(BroadcastKind::Daytime, text)));

    // 00:01 next day: evening, night and midnight.
    sleep(6 * HOUR + 30 * MINUTE).await;
    settle().await;
    let posted = gateway.messages_to(BROADCAST);
    assert_eq!(posted.len(), 6);
    assert!(is_line_of(BroadcastKind::Evening, &posted[3]));
    assert!(is_line_of(BroadcastKind::Night, &posted[4]));
    assert!(is_line_of(BroadcastKind::Midnight, &posted[5]));

    // 17:31 next day: morning plus the daytime posts planned at midnight.
    sleep(17 * HOUR + 30 * MINUTE).await;
    settle().await;
    assert_eq!(gateway.messages_to(BROADCAST).len(), 9);

    for handle in handles {
        handle.abort();
    }
}

#[tokio::test(start_paused = true)]
async fn late_start_plans_one_daytime_post() {
    let gateway = Arc::new(MemoryGateway::new());
    let service = BroadcastService::with_origin(
        settings(),
        gateway.clone(),
        Some(11),
        datetime!(2024-05-10 14:00 -3),
    );
    let handles = service.start();
    assert_eq!(handles.len(), 5);

    sleep(3 * HOUR + 31 * MINUTE).await;
    settle().await;
    let posted = gateway.messages_to(BROADCAST);
    assert_eq!(posted.len(), 1);
    assert!(is_line_of(BroadcastKind::Daytime, &posted[0]));

    for handle in handles {
        handle.abort();
    }
}

#[tokio::test(start_paused = true)]
async fn start_is_idempotent_and_a_day_is_planned_once() {
    let gateway = Arc::new(MemoryGateway::new());
    let service = BroadcastService::with_origin(
        settings(),
        gateway.clone(),
        Some(3),
        datetime!(2024-05-10 07:00 -3),
    );
    let handles = service.start();
    assert!(!handles.is_empty());
    assert!(service.start().is_empty());
    assert!(service.plan_day().is_empty());

    for handle in handles {
        handle.abort();
    }
}

#[tokio::test(start_paused = true)]
async fn no_channel_means_no_schedule() {
    let gateway = Arc::new(MemoryGateway::new());
    let service = BroadcastService::with_origin(
        BroadcastSettings::default(),
        gateway.clone(),
        Some(3),
        datetime!(2024-05-10 05:00 -3),
    );
    assert!(service.start().is_empty());

    sleep(24 * HOUR).await;
    settle().await;
    assert!(gateway.sent_messages().is_empty());
}

#[tokio::test(start_paused = true)]
async fn clock_follows_the_runtime_in_the_configured_offset() {
    let gateway = Arc::new(MemoryGateway::new());
    let service = BroadcastService::with_origin(
        settings(),
        gateway,
        None,
        datetime!(2024-05-10 12:00 UTC),
    );
    assert_eq!(service.now(), datetime!(2024-05-10 09:00 -3));
    sleep(2 * HOUR).await;
    assert_eq!(service.now(), datetime!(2024-05-10 11:00 -3));
}
