//! Identifier newtypes.
//!
//! Platform entities are 64-bit snowflakes. The relay sends them as JSON
//! strings (JavaScript cannot hold a u64), but numbers are accepted too so
//! hand-written test payloads stay readable. They always serialize as strings.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use time::OffsetDateTime;
use ulid::Ulid;

/// Milliseconds between the Unix epoch and the first platform snowflake.
pub const SNOWFLAKE_EPOCH_MS: i64 = 1_420_070_400_000;

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSnowflake {
    Number(u64),
    Text(String),
}

macro_rules! snowflake_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u64);

        impl $name {
            pub const fn get(self) -> u64 {
                self.0
            }

            /// Creation time encoded in the upper 42 bits.
            pub fn created_at(self) -> OffsetDateTime {
                let ms = (self.0 >> 22) as i64 + SNOWFLAKE_EPOCH_MS;
                OffsetDateTime::UNIX_EPOCH + time::Duration::milliseconds(ms)
            }

            /// Smallest id the platform could have minted at `at`.
            pub fn minted_at(at: OffsetDateTime) -> Self {
                let ms = (at - OffsetDateTime::UNIX_EPOCH).whole_milliseconds() as i64;
                $name(((ms - SNOWFLAKE_EPOCH_MS).max(0) as u64) << 22)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse::<u64>().map($name)
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                $name(raw)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(&self.0)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                match RawSnowflake::deserialize(deserializer)? {
                    RawSnowflake::Number(n) => Ok($name(n)),
                    RawSnowflake::Text(s) => s.parse().map_err(de::Error::custom),
                }
            }
        }
    };
}

snowflake_id!(
    /// A guild.
    CommunityId
);
snowflake_id!(
    /// A user, human or bot.
    MemberId
);
snowflake_id!(ChannelId);
snowflake_id!(RoleId);
snowflake_id!(MessageId);

/// Identifier of a game session. ULIDs keep ids short enough to embed in
/// button tokens and sort by creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Ulid);

impl SessionId {
    pub fn generate() -> Self {
        SessionId(Ulid::new())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ulid::from_string(s).map(SessionId)
    }
}

impl Serialize for SessionId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for SessionId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}
