pub mod bot;

pub use bot::{
    BotConfig, BroadcastSettings, GameSettings, GuardSettings, HttpSettings, WelcomeSettings,
};
