//! Greeting classification and mention escalation.
//!
//! Both responders are pure state machines driven by caller-supplied
//! instants; the service layer owns the maps, the clock and the RNG.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use lazy_regex::regex_is_match;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use super::ids::MemberId;

pub const GREETING_COOLDOWN: Duration = Duration::from_secs(2 * 60);
pub const MENTION_IDLE_RESET: Duration = Duration::from_secs(30 * 60);
pub const MENTION_SILENCE: Duration = Duration::from_secs(15 * 60);
pub const IRRITATION_AT: u32 = 5;
pub const SILENCE_AT: u32 = 7;

/// Lowercase, decompose and drop combining marks so "Boa Manhã" and
/// "boa manha" look the same to the patterns.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

/// True when nothing but user mentions and whitespace remain.
pub fn is_bare_mention(raw: &str) -> bool {
    lazy_regex::regex!(r"<@!?\d+>")
        .replace_all(raw, "")
        .trim()
        .is_empty()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Greeting {
    Morning,
    Afternoon,
    Night,
    LateNight,
    Casual,
    /// Morning greeting addressed to the bot.
    LoudMorning,
    /// Night greeting addressed to the bot.
    LoudNight,
}

fn is_morning(text: &str) -> bool {
    regex_is_match!(r"\b(bom dia|good morning|morning|otimo dia)\b", text)
}

fn is_afternoon(text: &str) -> bool {
    regex_is_match!(r"\b(boa\s*tarde|good afternoon)\b", text)
}

fn is_night(text: &str) -> bool {
    regex_is_match!(r"\b(boa noite|good night|good evening)\b", text)
}

fn is_late_night(text: &str) -> bool {
    regex_is_match!(r"\b(boa madrugada|madrugada)\b", text)
}

fn is_casual(text: &str) -> bool {
    regex_is_match!(
        r"\b(oi|ola|hello|hey|e\s*ai|salve|tudo bem|como vai|ajuda|help|qual a boa)\b",
        text
    )
}

/// Pick the greeting category for an already normalized message.
///
/// A message that mentions the bot only gets an answer here when it also
/// carries a morning or night greeting; anything else addressed to the bot
/// belongs to the mention responder.
pub fn classify(normalized: &str, mentions_bot: bool) -> Option<Greeting> {
    let morning = is_morning(normalized);
    let night = is_night(normalized);

    if mentions_bot {
        return match (morning, night) {
            (true, _) => Some(Greeting::LoudMorning),
            (false, true) => Some(Greeting::LoudNight),
            _ => None,
        };
    }
    if morning {
        Some(Greeting::Morning)
    } else if is_afternoon(normalized) {
        Some(Greeting::Afternoon)
    } else if night {
        Some(Greeting::Night)
    } else if is_late_night(normalized) {
        Some(Greeting::LateNight)
    } else if is_casual(normalized) {
        Some(Greeting::Casual)
    } else {
        None
    }
}

/// Reply templates. `{name}` is replaced with the author's display name.
pub fn greeting_replies(kind: Greeting) -> &'static [&'static str] {
    match kind {
        Greeting::Morning => &[
            "☀️ Bom dia, {name}! Que o café esteja forte hoje.",
            "🌼 Good morning, {name}! What's on the plan today?",
            "☕ Bom dia! Primeira xícara já foi, {name}?",
        ],
        Greeting::LoudMorning => &[
            "☀️☕ BOM DIA, {name}!!! BORA QUE HOJE O DIA É NOSSO! 🚀",
            "🔥 GOOD MORNING, {name}! FULL ENERGY TODAY!",
        ],
        Greeting::Afternoon => &[
            "🌤️ Boa tarde, {name}! Como está indo o dia?",
            "🍪 Good afternoon, {name}. Coffee break?",
        ],
        Greeting::Night => &[
            "🌙 Boa noite, {name}! Descansa bem.",
            "✨ Good night, {name}. See you tomorrow.",
        ],
        Greeting::LoudNight => &[
            "🌙✨ BOA NOITE, {name}!!! DORME BEM E SONHA COM CAFÉ! 💤",
            "🌌 GOOD NIGHT, {name}! TOMORROW WE GO AGAIN!",
        ],
        Greeting::LateNight => &[
            "🌌 Boa madrugada, {name}! Não esquece de dormir.",
            "🕯️ Up late, {name}? Take care of yourself.",
        ],
        Greeting::Casual => &[
            "👋 E aí, {name}! Tudo certo por aí?",
            "☕ Hey {name}! How can I help?",
            "💡 {name}, conta uma curiosidade do dia!",
            "🎵 {name}, what are you listening to right now?",
        ],
    }
}

/// Per-author cooldown for greeting replies.
#[derive(Debug, Default)]
pub struct GreetingCooldown {
    last_reply: HashMap<MemberId, Instant>,
}

impl GreetingCooldown {
    pub fn is_cooling(&self, author: MemberId, now: Instant) -> bool {
        self.last_reply
            .get(&author)
            .is_some_and(|at| now.saturating_duration_since(*at) < GREETING_COOLDOWN)
    }

    pub fn mark_replied(&mut self, author: MemberId, now: Instant) {
        self.last_reply.insert(author, now);
    }

    pub fn sweep(&mut self, now: Instant) {
        self.last_reply
            .retain(|_, at| now.saturating_duration_since(*at) < GREETING_COOLDOWN);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MentionTier {
    Friendly,
    Curious,
    Irritated,
    Firm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MentionReaction {
    /// The author is silenced; say nothing.
    Ignore,
    Reply(MentionTier),
    /// Announce the silence that just started.
    SilenceNotice,
}

#[derive(Debug, Clone, Copy)]
struct MentionStreak {
    count: u32,
    last_seen: Instant,
    silenced_until: Option<Instant>,
}

/// Escalating replies to repeated bare mentions.
#[derive(Debug, Default)]
pub struct MentionTracker {
    streaks: HashMap<MemberId, MentionStreak>,
}

impl MentionTracker {
    pub fn register(&mut self, author: MemberId, now: Instant) -> MentionReaction {
        if let Some(streak) = self.streaks.get(&author) {
            match streak.silenced_until {
                Some(until) if now < until => return MentionReaction::Ignore,
                // A served silence starts a fresh streak.
                Some(_) => {
                    self.streaks.remove(&author);
                }
                None => {}
            }
        }

        let streak = self
            .streaks
            .entry(author)
            .and_modify(|s| {
                if now.saturating_duration_since(s.last_seen) > MENTION_IDLE_RESET {
                    s.count = 1;
                } else {
                    s.count += 1;
                }
                s.last_seen = now;
            })
            .or_insert(MentionStreak {
                count: 1,
                last_seen: now,
                silenced_until: None,
            });

        match streak.count {
            n if n >= SILENCE_AT => {
                streak.silenced_until = Some(now + MENTION_SILENCE);
                MentionReaction::SilenceNotice
            }
            1 | 2 => MentionReaction::Reply(MentionTier::Friendly),
            3 | 4 => MentionReaction::Reply(MentionTier::Curious),
            IRRITATION_AT => MentionReaction::Reply(MentionTier::Irritated),
            _ => MentionReaction::Reply(MentionTier::Firm),
        }
    }

    pub fn sweep(&mut self, now: Instant) {
        self.streaks.retain(|_, s| match s.silenced_until {
            Some(until) => now < until,
            None => now.saturating_duration_since(s.last_seen) <= MENTION_IDLE_RESET,
        });
    }
}

pub fn mention_replies(tier: MentionTier) -> &'static [&'static str] {
    match tier {
        MentionTier::Friendly => &[
            "☕ Opa! Chamou? Diz aí no que posso ajudar.",
            "😊 I'm here! Tell me what you need.",
        ],
        MentionTier::Curious => &[
            "🙂 De novo por aqui! Conta mais do que você precisa.",
            "🔎 Looking for something specific? Describe it and I'll try.",
        ],
        MentionTier::Irritated => &[
            "😤 Ei, tá me chamando demais. Fala direto o que precisa.",
            "🚫 Getting close to my limit here. Only ping me when you need me.",
        ],
        MentionTier::Firm => &[
            "⚠️ Muitas menções. Manda a pergunta completa, por favor.",
            "⏳ Easy there. A clear question gets a better answer.",
        ],
    }
}

pub const SILENCE_REPLIES: &[&str] = &[
    "🔇 Ok, vou te ignorar por 15 minutos. Até já.",
    "🛑 That's enough for now. Back in 15 minutes.",
];
