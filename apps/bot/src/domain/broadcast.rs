//! Daily broadcast calendar: four fixed posts plus up to two random
//! daytime posts.
//!
//! Times are wall-clock times in the community's offset. Callers pass `now`
//! and the RNG; nothing here reads a clock.

use std::time::Duration;

use rand::Rng;
use time::macros::time;
use time::{OffsetDateTime, Time};

pub const DAY: Duration = Duration::from_secs(24 * 60 * 60);

pub const DAYTIME_START: Time = time!(8:00);
/// Ends before the evening post so the two never collide.
pub const DAYTIME_END: Time = time!(17:30);
pub const DAYTIME_MIN_GAP: Duration = Duration::from_secs(5 * 60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BroadcastKind {
    Morning,
    Evening,
    Night,
    /// Also the moment the next daytime posts are planned.
    Midnight,
    Daytime,
}

impl BroadcastKind {
    pub fn label(self) -> &'static str {
        match self {
            BroadcastKind::Morning => "morning-broadcast",
            BroadcastKind::Evening => "evening-broadcast",
            BroadcastKind::Night => "night-broadcast",
            BroadcastKind::Midnight => "midnight-broadcast",
            BroadcastKind::Daytime => "daytime-broadcast",
        }
    }
}

/// The fixed posts, repeated every day.
pub const DAILY_SLOTS: [(BroadcastKind, Time); 4] = [
    (BroadcastKind::Morning, time!(6:00)),
    (BroadcastKind::Evening, time!(18:00)),
    (BroadcastKind::Night, time!(23:00)),
    (BroadcastKind::Midnight, time!(0:00)),
];

/// Delay until the next occurrence of `at`. A slot that is due right now
/// counts as tomorrow's.
pub fn until_next(now: OffsetDateTime, at: Time) -> Duration {
    let mut target = now.replace_time(at);
    if target <= now {
        target += time::Duration::DAY;
    }
    (target - now).unsigned_abs()
}

/// Delays for today's random daytime posts.
///
/// The window runs from `max(now, 08:00)` to 17:30. When at least five
/// hours remain, two posts are drawn at least five hours apart; otherwise
/// one. Past 17:30 nothing is planned.
pub fn plan_daytime<R: Rng + ?Sized>(now: OffsetDateTime, rng: &mut R) -> Vec<Duration> {
    let end = now.replace_time(DAYTIME_END);
    if now >= end {
        return Vec::new();
    }
    let start = now.replace_time(DAYTIME_START).max(now);

    let ms_from_now = |t: OffsetDateTime| (t - now).whole_milliseconds() as i64;
    let (from, to) = (ms_from_now(start), ms_from_now(end));
    let gap = DAYTIME_MIN_GAP.as_millis() as i64;

    let picks = if to - from >= gap {
        let first = rng.random_range(from..=to - gap);
        let second = rng.random_range(first + gap..=to);
        vec![first, second]
    } else {
        vec![rng.random_range(from..=to)]
    };

    picks
        .into_iter()
        .filter(|&ms| ms > 0)
        .map(|ms| Duration::from_millis(ms as u64))
        .collect()
}

pub fn broadcast_lines(kind: BroadcastKind) -> &'static [&'static str] {
    match kind {
        BroadcastKind::Morning => &[
            "☀️ Bom dia, café! A primeira xícara já está passando.",
            "🌅 Good morning, everyone! Who's up with a coffee?",
            "☕ Bom dia! Bora começar o dia com calma e café forte.",
        ],
        BroadcastKind::Evening => &[
            "🌆 Boa noite, pessoal! Chegando do dia? Senta aí e conta.",
            "🍵 Good evening! Time for something warm and a chat.",
        ],
        BroadcastKind::Night => &[
            "🌙 Boa noite! Hora de desligar as telas e descansar.",
            "💤 Good night, café. See you all tomorrow.",
        ],
        BroadcastKind::Midnight => &[
            "🕛 Meia-noite! Quem ainda está acordado?",
            "🌌 Midnight check-in: the night owls' shift starts now.",
        ],
        BroadcastKind::Daytime => &[
            "💡 Pausa para o café: o que você está aprendendo hoje?",
            "🎵 What's playing in your headphones right now?",
            "🍪 Lembrete: água, alongamento e um biscoito.",
            "📚 Drop a recommendation: book, show or game.",
        ],
    }
}
