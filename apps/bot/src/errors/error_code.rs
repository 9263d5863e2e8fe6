//! Error codes for the cafebot API.
//!
//! This module defines all error codes used throughout the application.
//! Add new codes here; never pass ad-hoc strings as error codes.
//!
//! All error codes are SCREAMING_SNAKE_CASE and map 1:1 to the strings
//! that appear in HTTP responses.

use core::fmt;

/// Centralized error codes for the cafebot API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Authentication & Authorization
    /// Relay shared secret missing or wrong
    Unauthorized,
    /// Acting user lacks the required permission
    Forbidden,
    /// The bot lacks a privilege on the community (role management)
    MissingCapability,

    // Request Validation
    /// Cell index outside 0..=8
    InvalidCell,
    /// Cell already holds a mark
    CellOccupied,
    /// Actor does not own the mark to move
    NotYourTurn,
    /// Session is finished
    SessionInactive,
    /// Session still waits for an invitation answer
    InvitePending,
    /// Player challenged themselves
    SelfChallenge,
    /// Player challenged a bot account
    NonHumanOpponent,
    /// Button token could not be decoded
    InvalidActionToken,
    /// Bulk delete amount outside 1..=100
    InvalidAmount,
    /// General validation error
    ValidationError,
    /// General bad request error
    BadRequest,

    // Resource Not Found
    /// Game session not found
    SessionNotFound,
    /// Member not found in the community
    MemberNotFound,
    /// Role not found
    RoleNotFound,
    /// Channel not found
    ChannelNotFound,
    /// Member holds no quarantine to lift
    NotQuarantined,
    /// General not found error
    NotFound,

    // System Errors
    /// Outbound gateway call failed
    GatewayError,
    /// Outbound gateway call timed out
    GatewayTimeout,
    /// Internal server error
    Internal,
    /// Configuration error
    ConfigError,
}

impl ErrorCode {
    /// Returns the canonical SCREAMING_SNAKE_CASE string for this error code.
    ///
    /// This is the exact string that appears in HTTP responses.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::MissingCapability => "MISSING_CAPABILITY",

            Self::InvalidCell => "INVALID_CELL",
            Self::CellOccupied => "CELL_OCCUPIED",
            Self::NotYourTurn => "NOT_YOUR_TURN",
            Self::SessionInactive => "SESSION_INACTIVE",
            Self::InvitePending => "INVITE_PENDING",
            Self::SelfChallenge => "SELF_CHALLENGE",
            Self::NonHumanOpponent => "NON_HUMAN_OPPONENT",
            Self::InvalidActionToken => "INVALID_ACTION_TOKEN",
            Self::InvalidAmount => "INVALID_AMOUNT",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::BadRequest => "BAD_REQUEST",

            Self::SessionNotFound => "SESSION_NOT_FOUND",
            Self::MemberNotFound => "MEMBER_NOT_FOUND",
            Self::RoleNotFound => "ROLE_NOT_FOUND",
            Self::ChannelNotFound => "CHANNEL_NOT_FOUND",
            Self::NotQuarantined => "NOT_QUARANTINED",
            Self::NotFound => "NOT_FOUND",

            Self::GatewayError => "GATEWAY_ERROR",
            Self::GatewayTimeout => "GATEWAY_TIMEOUT",
            Self::Internal => "INTERNAL",
            Self::ConfigError => "CONFIG_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
