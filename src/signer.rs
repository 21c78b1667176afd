//! Token signing and decoding.
//!
//! The pipeline only depends on the [`Signer`] trait. [`HmacSigner`] is the
//! HS256 implementation the API ships with.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use crate::claims::Claims;
use crate::clock::{Clock, SystemClock};
use crate::store::UserId;

/// Why a token could not be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The string does not parse as a token at all
    #[error("token is not structurally valid")]
    Malformed,
    /// The string parses, but its signature or claims were rejected
    #[error("token signature or claims rejected")]
    BadSignature,
}

/// Why a token could not be issued.
#[derive(Debug, Error)]
pub enum IssueError {
    /// The underlying encoder failed
    #[error("failed to encode token: {0}")]
    Encode(#[from] jsonwebtoken::errors::Error),
}

/// Creates and checks bearer tokens.
///
/// `decode` checks signature and structure only. Expiry is deliberately left
/// to the [`IdentityVerifier`](crate::IdentityVerifier), which owns the
/// grace-period rules.
pub trait Signer: Send + Sync {
    /// Decodes a raw token into claims after checking its signature.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Malformed`] if the string is not a token, and
    /// [`DecodeError::BadSignature`] if it is one but fails verification.
    fn decode(&self, token: &str) -> Result<Claims, DecodeError>;

    /// Issues a fresh token for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns [`IssueError`] if the token cannot be encoded.
    fn issue(&self, user_id: UserId) -> Result<String, IssueError>;
}

/// HS256 signer with a shared secret.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use venue_authn::{HmacSigner, Signer};
///
/// let signer = HmacSigner::new(b"change-me", Duration::from_secs(3600));
/// let token = signer.issue(42).unwrap();
/// let claims = signer.decode(&token).unwrap();
/// assert_eq!(claims.sub, "42");
/// ```
pub struct HmacSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl HmacSigner {
    /// Creates a signer using the system clock.
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self::with_clock(secret, ttl, Arc::new(SystemClock))
    }

    /// Creates a signer that stamps `iat`/`exp` from `clock`.
    pub fn with_clock(secret: &[u8], ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.required_spec_claims = ["sub", "exp"]
            .into_iter()
            .map(String::from)
            .collect::<HashSet<_>>();

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
            clock,
        }
    }

    /// Lifetime of issued tokens.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl std::fmt::Debug for HmacSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacSigner")
            .field("algorithm", &"HS256")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl Signer for HmacSigner {
    fn decode(&self, token: &str) -> Result<Claims, DecodeError> {
        // An unreadable header means the string is not a token at all.
        jsonwebtoken::decode_header(token).map_err(|_| DecodeError::Malformed)?;

        jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|err| classify(err.kind()))
    }

    fn issue(&self, user_id: UserId) -> Result<String, IssueError> {
        let iat = self.clock.now().timestamp();
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = Claims {
            sub: user_id.to_string(),
            iat,
            exp: iat.saturating_add(ttl),
        };

        Ok(jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding,
        )?)
    }
}

/// Classifies a failure once the header has parsed. Claims are only
/// deserialized after the signature check, so `Json`/`Utf8` here mean a
/// signed token with claims we do not accept.
fn classify(kind: &ErrorKind) -> DecodeError {
    match kind {
        ErrorKind::InvalidToken | ErrorKind::Base64(_) => DecodeError::Malformed,
        _ => DecodeError::BadSignature,
    }
}
