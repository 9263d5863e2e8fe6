//! Greeting and mention replies for ordinary chat messages.

use std::time::Instant;

use parking_lot::Mutex;
use rand::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::chatter::{
    classify, greeting_replies, is_bare_mention, mention_replies, normalize, GreetingCooldown,
    MentionReaction, MentionTracker, SILENCE_REPLIES,
};
use crate::domain::{ChannelId, CommunityId, MemberId};

/// A chat message forwarded by the relay.
#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    #[serde(default)]
    pub community_id: Option<CommunityId>,
    pub channel_id: ChannelId,
    pub author_id: MemberId,
    pub author_name: String,
    #[serde(default)]
    pub author_is_bot: bool,
    pub content: String,
    #[serde(default)]
    pub mentions_bot: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyKind {
    Greeting,
    Mention,
    Silence,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatReply {
    pub kind: ReplyKind,
    pub channel_id: ChannelId,
    pub content: String,
}

pub struct ChatterService {
    cooldown: Mutex<GreetingCooldown>,
    mentions: Mutex<MentionTracker>,
    rng: Mutex<StdRng>,
}

impl Default for ChatterService {
    fn default() -> Self {
        Self::new(None)
    }
}

impl ChatterService {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_os_rng(),
        };
        Self {
            cooldown: Mutex::new(GreetingCooldown::default()),
            mentions: Mutex::new(MentionTracker::default()),
            rng: Mutex::new(rng),
        }
    }

    fn pick(&self, options: &[&str]) -> String {
        options
            .choose(&mut *self.rng.lock())
            .map(|s| s.to_string())
            .unwrap_or_default()
    }

    /// Decide whether the bot answers `message`, and with what.
    ///
    /// A bare mention of the bot goes to the escalation tracker; anything
    /// else is checked for greetings.
    pub fn on_message(&self, message: &IncomingMessage, at: Instant) -> Option<ChatReply> {
        if message.author_is_bot {
            return None;
        }
        if message.mentions_bot && is_bare_mention(&message.content) {
            return self.on_bare_mention(message, at);
        }
        self.on_greeting(message, at)
    }

    fn on_bare_mention(&self, message: &IncomingMessage, at: Instant) -> Option<ChatReply> {
        let reaction = self.mentions.lock().register(message.author_id, at);
        let (kind, text) = match reaction {
            MentionReaction::Ignore => return None,
            MentionReaction::Reply(tier) => (ReplyKind::Mention, self.pick(mention_replies(tier))),
            MentionReaction::SilenceNotice => (ReplyKind::Silence, self.pick(SILENCE_REPLIES)),
        };
        Some(ChatReply {
            kind,
            channel_id: message.channel_id,
            content: format!("<@{}> {text}", message.author_id),
        })
    }

    fn on_greeting(&self, message: &IncomingMessage, at: Instant) -> Option<ChatReply> {
        let mut cooldown = self.cooldown.lock();
        if cooldown.is_cooling(message.author_id, at) {
            return None;
        }
        let category = classify(&normalize(&message.content), message.mentions_bot)?;
        cooldown.mark_replied(message.author_id, at);
        drop(cooldown);

        let text = self
            .pick(greeting_replies(category))
            .replace("{name}", &message.author_name);
        Some(ChatReply {
            kind: ReplyKind::Greeting,
            channel_id: message.channel_id,
            content: format!("<@{}> {text}", message.author_id),
        })
    }

    pub fn sweep(&self, at: Instant) {
        self.cooldown.lock().sweep(at);
        self.mentions.lock().sweep(at);
    }
}
