//! Token extraction from request headers and cookies.
//!
//! Precedence is fixed:
//!
//! ```text
//! Authorization: Bearer <token>   (well-formed header wins, even over a valid cookie)
//!   ↓ missing or malformed
//! Cookie: <cookie_name>=<token>   (first non-empty value)
//!   ↓ missing or empty
//! not found
//! ```
//!
//! A malformed `Authorization` header (wrong scheme, missing token, extra
//! whitespace) falls through to the cookie. It never rejects on its own.

use cookie::Cookie;
use http::header::{AUTHORIZATION, COOKIE};
use http::HeaderMap;

use crate::token::BearerToken;

/// Default name of the session cookie carrying the token.
pub const DEFAULT_COOKIE_NAME: &str = "auth_token";

const BEARER_PREFIX: &str = "Bearer ";

/// Where a token was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    /// `Authorization: Bearer <token>`
    Header,
    /// The configured session cookie
    Cookie,
}

impl TokenSource {
    /// Short label used in log fields and audit events.
    pub fn as_str(self) -> &'static str {
        match self {
            TokenSource::Header => "header",
            TokenSource::Cookie => "cookie",
        }
    }
}

/// A candidate token and the place it came from.
#[derive(Debug)]
pub struct ExtractedToken {
    /// The candidate token (not yet verified)
    pub token: BearerToken,
    /// Header or cookie
    pub source: TokenSource,
}

/// Pulls a candidate bearer token out of a request's headers.
///
/// Pure function of its inputs; returns `None` when neither a well-formed
/// header nor a non-empty cookie named `cookie_name` is present.
///
/// # Examples
///
/// ```
/// use http::HeaderMap;
/// use venue_authn::extract::{extract_token, TokenSource, DEFAULT_COOKIE_NAME};
///
/// let mut headers = HeaderMap::new();
/// headers.insert("authorization", "Basic dXNlcjpwYXNz".parse().unwrap());
/// headers.insert("cookie", "theme=dark; auth_token=abc123".parse().unwrap());
///
/// let found = extract_token(&headers, DEFAULT_COOKIE_NAME).expect("cookie fallback");
/// assert_eq!(found.source, TokenSource::Cookie);
/// assert_eq!(found.token.expose_secret(), "abc123");
/// ```
pub fn extract_token(headers: &HeaderMap, cookie_name: &str) -> Option<ExtractedToken> {
    if let Some(token) = bearer_from_header(headers) {
        return Some(ExtractedToken {
            token,
            source: TokenSource::Header,
        });
    }

    token_from_cookie(headers, cookie_name).map(|token| ExtractedToken {
        token,
        source: TokenSource::Cookie,
    })
}

/// Returns the token from an `Authorization` header of the exact form
/// `"Bearer " + <non-empty, no whitespace>`.
fn bearer_from_header(headers: &HeaderMap) -> Option<BearerToken> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let rest = value.strip_prefix(BEARER_PREFIX)?;

    if rest.is_empty() || rest.chars().any(char::is_whitespace) {
        return None;
    }

    BearerToken::new(rest)
}

/// Returns the first non-empty value of the named cookie across all
/// `Cookie` headers. Unparseable cookie pairs are skipped.
fn token_from_cookie(headers: &HeaderMap, cookie_name: &str) -> Option<BearerToken> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .filter(|cookie| cookie.name() == cookie_name)
        .find_map(|cookie| BearerToken::new(cookie.value()))
}
