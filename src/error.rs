use std::fmt;

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why verification did not produce an [`Identity`](crate::Identity).
///
/// Exactly one variant is produced per failed attempt. The `Display` text is
/// for internal logs only; clients see [`public_message`](Self::public_message)
/// and [`error_code`](Self::error_code).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum AuthFailure {
    /// No token in the header or the session cookie
    #[error("no bearer token supplied")]
    TokenMissing,
    /// The string is not a token at all
    #[error("token could not be parsed")]
    TokenMalformed,
    /// The token is past its expiry (and past the grace window, if any)
    #[error("token expired")]
    TokenExpired,
    /// Bad signature, or the subject is not a live, active user
    #[error("token rejected")]
    TokenInvalid,
    /// Account is inactive. Not emitted by the verifier; see `TokenInvalid`.
    #[error("user account is inactive")]
    UserInactive,
    /// Subject unknown. Not emitted by the verifier; see `TokenInvalid`.
    #[error("user not found")]
    UserNotFound,
}

impl AuthFailure {
    /// All variants, for exhaustive tests.
    pub const ALL: [AuthFailure; 6] = [
        AuthFailure::TokenMissing,
        AuthFailure::TokenMalformed,
        AuthFailure::TokenExpired,
        AuthFailure::TokenInvalid,
        AuthFailure::UserInactive,
        AuthFailure::UserNotFound,
    ];

    /// Machine-readable code sent to clients.
    ///
    /// Several internal causes share `TOKEN_INVALID` so that the endpoint
    /// cannot be used to probe whether an account exists or is disabled.
    pub fn error_code(self) -> ErrorCode {
        match self {
            AuthFailure::TokenMissing => ErrorCode::TokenMissing,
            AuthFailure::TokenExpired => ErrorCode::TokenExpired,
            AuthFailure::TokenMalformed
            | AuthFailure::TokenInvalid
            | AuthFailure::UserInactive
            | AuthFailure::UserNotFound => ErrorCode::TokenInvalid,
        }
    }

    /// Human-readable message sent to clients.
    pub fn public_message(self) -> &'static str {
        match self.error_code() {
            ErrorCode::TokenMissing => "Authentication required",
            ErrorCode::TokenExpired => "Your session has expired. Please log in again.",
            ErrorCode::TokenInvalid => "Invalid token",
        }
    }

    /// HTTP status for every failure. Granularity lives in the body only.
    pub fn status(self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }
}

/// Stable error codes of the JSON error envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// `TOKEN_MISSING`
    TokenMissing,
    /// `TOKEN_EXPIRED`
    TokenExpired,
    /// `TOKEN_INVALID`
    TokenInvalid,
}

impl ErrorCode {
    /// The wire spelling of the code.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::TokenMissing => "TOKEN_MISSING",
            ErrorCode::TokenExpired => "TOKEN_EXPIRED",
            ErrorCode::TokenInvalid => "TOKEN_INVALID",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Invalid authentication configuration.
#[derive(Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// An environment value could not be parsed
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue {
        /// The variable name
        key: &'static str,
        /// The raw value that failed to parse
        value: String,
    },
    /// The session cookie name is empty
    #[error("session cookie name must not be empty")]
    EmptyCookieName,
    /// The user lookup timeout is zero
    #[error("user lookup timeout must be greater than zero")]
    ZeroLookupTimeout,
    /// The clearing cookie would expire a different cookie than the session one
    #[error("clear_cookie.name {clear_name:?} does not match cookie_name {cookie_name:?}")]
    ClearCookieNameMismatch {
        /// The configured session cookie name
        cookie_name: String,
        /// The name the clearing cookie would use
        clear_name: String,
    },
}
