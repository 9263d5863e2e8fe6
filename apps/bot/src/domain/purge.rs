//! Moderated bulk delete: amount rules, the age limit and the
//! confirm/cancel button token.
//!
//! Wire form of a token: `purge:<request-ulid>:<confirm|cancel>`.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use time::OffsetDateTime;
use ulid::Ulid;

use super::ids::MessageId;
use crate::errors::domain::{DomainError, ValidationKind};

pub const PURGE_PREFIX: &str = "purge";
pub const DEFAULT_PURGE_AMOUNT: u8 = 10;
pub const MAX_PURGE_AMOUNT: u8 = 100;
/// The platform refuses to bulk delete anything older.
pub const PURGE_MAX_AGE: time::Duration = time::Duration::days(14);
/// How long the requester has to press a button.
pub const PURGE_CONFIRM_WINDOW: Duration = Duration::from_secs(30);

/// Resolve the requested amount: default 10, valid range 1..=100.
pub fn purge_amount(requested: Option<i64>) -> Result<u8, DomainError> {
    let Some(amount) = requested else {
        return Ok(DEFAULT_PURGE_AMOUNT);
    };
    u8::try_from(amount)
        .ok()
        .filter(|n| (1..=MAX_PURGE_AMOUNT).contains(n))
        .ok_or_else(|| {
            DomainError::validation(
                ValidationKind::InvalidAmount,
                format!("amount must be between 1 and {MAX_PURGE_AMOUNT}, got {amount}"),
            )
        })
}

/// Messages strictly younger than the age limit.
pub fn deletable(messages: &[MessageId], now: OffsetDateTime) -> Vec<MessageId> {
    messages
        .iter()
        .copied()
        .filter(|id| now - id.created_at() < PURGE_MAX_AGE)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PurgeId(Ulid);

impl PurgeId {
    pub fn generate() -> Self {
        PurgeId(Ulid::new())
    }
}

impl fmt::Display for PurgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurgeChoice {
    Confirm,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurgeToken {
    pub request: PurgeId,
    pub choice: PurgeChoice,
}

impl PurgeToken {
    pub fn new(request: PurgeId, choice: PurgeChoice) -> Self {
        Self { request, choice }
    }

    /// Cheap routing check; parsing may still fail.
    pub fn matches(raw: &str) -> bool {
        raw.strip_prefix(PURGE_PREFIX)
            .is_some_and(|rest| rest.starts_with(':'))
    }
}

impl fmt::Display for PurgeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let choice = match self.choice {
            PurgeChoice::Confirm => "confirm",
            PurgeChoice::Cancel => "cancel",
        };
        write!(f, "{PURGE_PREFIX}:{}:{choice}", self.request)
    }
}

impl FromStr for PurgeToken {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || {
            DomainError::validation(
                ValidationKind::InvalidActionToken,
                format!("unrecognised button token: {s}"),
            )
        };
        let mut parts = s.split(':');
        if parts.next() != Some(PURGE_PREFIX) {
            return Err(invalid());
        }
        let request = parts
            .next()
            .and_then(|id| Ulid::from_string(id).ok())
            .map(PurgeId)
            .ok_or_else(invalid)?;
        let choice = match parts.next() {
            Some("confirm") => PurgeChoice::Confirm,
            Some("cancel") => PurgeChoice::Cancel,
            _ => return Err(invalid()),
        };
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(PurgeToken { request, choice })
    }
}
