use std::env;
use std::str::FromStr;
use std::time::Duration;

use time::macros::offset;
use time::UtcOffset;

use crate::domain::join_rate::{DEFAULT_JOIN_THRESHOLD, DEFAULT_JOIN_WINDOW};
use crate::domain::{ChannelId, JoinRateSettings, RoleId};
use crate::error::AppError;

pub const DEFAULT_API_BASE: &str = "https://discord.com/api/v10";

/// Listener address for the relay-facing HTTP surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpSettings {
    pub host: String,
    pub port: u16,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WelcomeSettings {
    pub channel: Option<ChannelId>,
    pub auto_role: Option<RoleId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GuardSettings {
    pub join_rate: JoinRateSettings,
    pub quarantine_for: Duration,
    pub min_account_age: Duration,
    pub log_channel: Option<ChannelId>,
}

impl Default for GuardSettings {
    fn default() -> Self {
        Self {
            join_rate: JoinRateSettings::default(),
            quarantine_for: Duration::from_secs(10 * 60),
            min_account_age: Duration::from_secs(48 * 60 * 60),
            log_channel: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameSettings {
    pub computer_delay: Duration,
    pub computer_first_delay: Duration,
    /// Probability that the computer opens a human-vs-computer game.
    pub computer_first_chance: f64,
    pub rng_seed: Option<u64>,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            computer_delay: Duration::from_millis(1500),
            computer_first_delay: Duration::from_millis(1000),
            computer_first_chance: 0.5,
            rng_seed: None,
        }
    }
}

/// Scheduled posts. Disabled while `channel` is unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastSettings {
    pub channel: Option<ChannelId>,
    /// Offset the daily slots are read in.
    pub utc_offset: UtcOffset,
}

/// Must agree with `BroadcastSettings::default`.
pub const DEFAULT_BROADCAST_OFFSET_HOURS: i8 = -3;

impl Default for BroadcastSettings {
    fn default() -> Self {
        Self {
            channel: None,
            utc_offset: offset!(-3),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BotConfig {
    pub token: Option<String>,
    pub api_base: String,
    pub dry_run: bool,
    pub http: HttpSettings,
    pub relay_secret: Option<String>,
    pub welcome: WelcomeSettings,
    pub guard: GuardSettings,
    pub games: GameSettings,
    pub broadcast: BroadcastSettings,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_base: DEFAULT_API_BASE.to_string(),
            dry_run: true,
            http: HttpSettings::default(),
            relay_secret: None,
            welcome: WelcomeSettings::default(),
            guard: GuardSettings::default(),
            games: GameSettings::default(),
            broadcast: BroadcastSettings::default(),
        }
    }
}

impl BotConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Read configuration through `lookup`; unset and blank values count as absent.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let dry_run = parse_or(&var, "BOT_DRY_RUN", false)?;
        let token = if dry_run {
            var("DISCORD_TOKEN")
        } else {
            Some(must_var(&var, "DISCORD_TOKEN")?)
        };

        let defaults = BotConfig::default();
        let http = HttpSettings {
            host: var("BOT_HOST").unwrap_or(defaults.http.host),
            port: parse_or(&var, "BOT_PORT", defaults.http.port)?,
        };

        let welcome = WelcomeSettings {
            channel: parse_opt(&var, "WELCOME_CHANNEL_ID")?,
            auto_role: parse_opt(&var, "AUTO_ROLE_ID")?,
        };

        let threshold = parse_or(&var, "RAID_JOIN_THRESHOLD", DEFAULT_JOIN_THRESHOLD)?;
        if threshold == 0 {
            return Err(AppError::config("RAID_JOIN_THRESHOLD must be at least 1"));
        }
        let min_age_hours: u64 = parse_or(&var, "MIN_ACCOUNT_AGE_HOURS", 48)?;
        let min_account_age = min_age_hours
            .checked_mul(60 * 60)
            .map(Duration::from_secs)
            .ok_or_else(|| {
                AppError::config(format!("MIN_ACCOUNT_AGE_HOURS is out of range: {min_age_hours}"))
            })?;
        let guard = GuardSettings {
            join_rate: JoinRateSettings {
                threshold,
                window: secs_or(&var, "RAID_WINDOW_SECS", DEFAULT_JOIN_WINDOW)?,
            },
            quarantine_for: secs_or(&var, "QUARANTINE_SECS", defaults.guard.quarantine_for)?,
            min_account_age,
            log_channel: parse_opt(&var, "ANTIRAID_LOG_CHANNEL_ID")?,
        };

        let chance = parse_or(
            &var,
            "GAME_COMPUTER_FIRST_CHANCE",
            defaults.games.computer_first_chance,
        )?;
        if !(0.0..=1.0).contains(&chance) {
            return Err(AppError::config(format!(
                "GAME_COMPUTER_FIRST_CHANCE must be within 0..=1, got {chance}"
            )));
        }
        let games = GameSettings {
            computer_delay: millis_or(&var, "GAME_COMPUTER_DELAY_MS", defaults.games.computer_delay)?,
            computer_first_delay: millis_or(
                &var,
                "GAME_COMPUTER_FIRST_DELAY_MS",
                defaults.games.computer_first_delay,
            )?,
            computer_first_chance: chance,
            rng_seed: parse_opt(&var, "GAME_RNG_SEED")?,
        };

        let offset_hours: i8 = parse_or(
            &var,
            "BROADCAST_UTC_OFFSET_HOURS",
            DEFAULT_BROADCAST_OFFSET_HOURS,
        )?;
        let utc_offset = UtcOffset::from_hms(offset_hours, 0, 0).map_err(|e| {
            AppError::config(format!("BROADCAST_UTC_OFFSET_HOURS out of range: {e}"))
        })?;
        let broadcast = BroadcastSettings {
            channel: parse_opt(&var, "BROADCAST_CHANNEL_ID")?,
            utc_offset,
        };

        Ok(Self {
            token,
            api_base: var("DISCORD_API_BASE").unwrap_or(defaults.api_base),
            dry_run,
            http,
            relay_secret: var("RELAY_SHARED_SECRET"),
            welcome,
            guard,
            games,
            broadcast,
        })
    }
}

/// Get required environment variable or return error
fn must_var(var: &impl Fn(&str) -> Option<String>, name: &str) -> Result<String, AppError> {
    var(name).ok_or_else(|| AppError::config(format!("Missing required environment variable: {name}")))
}

fn parse_opt<T>(var: &impl Fn(&str) -> Option<String>, name: &str) -> Result<Option<T>, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    var(name)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| AppError::config(format!("{name}: cannot parse '{raw}': {e}")))
        })
        .transpose()
}

fn parse_or<T>(var: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    Ok(parse_opt(var, name)?.unwrap_or(default))
}

fn secs_or(
    var: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: Duration,
) -> Result<Duration, AppError> {
    Ok(parse_opt::<u64>(var, name)?
        .map(Duration::from_secs)
        .unwrap_or(default))
}

fn millis_or(
    var: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: Duration,
) -> Result<Duration, AppError> {
    Ok(parse_opt::<u64>(var, name)?
        .map(Duration::from_millis)
        .unwrap_or(default))
}
